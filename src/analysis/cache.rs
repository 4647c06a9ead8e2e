//! Memoized moments
//!
//! The cache belongs to one selection run and is keyed by a name the caller
//! chooses, in practice the pair id. Entries outlive their dataset, so the
//! owner clears the table before each run.

use dashmap::DashMap;

use super::{mean_and_std_dev, AnalysisError, Moments};
use crate::data::DateSeries;

/// Identity of a cached dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn named(name: impl Into<String>) -> Self {
        CacheKey(name.into())
    }
}

/// Thread-safe mean/std-dev memo table
#[derive(Debug, Default)]
pub struct StatisticsCache {
    entries: DashMap<CacheKey, Moments>,
}

impl StatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached moments for `key`, computing them from `data` on a miss
    pub fn get_or_compute(&self, key: CacheKey, data: &DateSeries) -> Result<Moments, AnalysisError> {
        if let Some(moments) = self.entries.get(&key) {
            return Ok(*moments);
        }
        let moments = mean_and_std_dev(data)?;
        self.entries.insert(key, moments);
        Ok(moments)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Moments> {
        self.entries.get(key).map(|m| *m)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
