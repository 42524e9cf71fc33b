//! Core trait definitions for pool sources.
//!
//! The `PoolSource` trait is implemented by the `quizwall-sources` crate for
//! HTTP and directory-backed pools; [`MemoryPoolSource`] serves tests and
//! embedded use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::error::PoolLoadError;
use crate::model::Pool;
use crate::parser::check_pool;

/// Where question pools come from.
///
/// Implementations must return current content on every call: pools can be
/// revised between attempts, and reproducibility comes from the seed, not
/// from caching.
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch and validate the pool for `module_id`.
    async fn fetch_pool(&self, module_id: &str) -> Result<Pool, PoolLoadError>;
}

/// An in-memory pool source.
pub struct MemoryPoolSource {
    pools: HashMap<String, Pool>,
    fetch_count: AtomicU32,
}

impl MemoryPoolSource {
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Register `pool` under `module_id`.
    pub fn with_pool(mut self, module_id: &str, pool: Pool) -> Self {
        self.pools.insert(module_id.to_string(), pool);
        self
    }

    /// Number of fetches served, including failed ones.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

impl Default for MemoryPoolSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoolSource for MemoryPoolSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_pool(&self, module_id: &str) -> Result<Pool, PoolLoadError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        let pool = self
            .pools
            .get(module_id)
            .cloned()
            .ok_or_else(|| PoolLoadError::NotFound(module_id.to_string()))?;
        check_pool(&pool, module_id)?;
        Ok(pool)
    }
}
