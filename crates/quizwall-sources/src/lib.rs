//! quizwall-sources — Question pool sources and configuration.
//!
//! Implements the `PoolSource` trait for HTTP servers and local directories,
//! and loads the `quizwall.toml` configuration that selects between them.

pub mod config;
pub mod dir;
pub mod http;

pub use config::{create_pool_source, load_config, load_config_from, PoolConfig, QuizwallConfig};
pub use dir::DirPoolSource;
pub use http::HttpPoolSource;
