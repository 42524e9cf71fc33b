//! quizwall-core — Attempt engine, scoring, and progress model.
//!
//! This crate defines the question pool model, the seeded attempt builder,
//! the attempt state machine, and the persisted progress store that the
//! rest of quizwall builds on.

pub mod attempt;
pub mod builder;
pub mod driver;
pub mod error;
pub mod model;
pub mod parser;
pub mod progress;
pub mod report;
pub mod scoring;
pub mod settings;
pub mod shuffle;
pub mod statistics;
pub mod store;
pub mod time;
pub mod traits;
