use std::collections::HashMap;

use crate::foundation::error::{MontageError, MontageResult};

/// Maps a clip identifier to its play duration in seconds.
///
/// Plans call `resolve` once per unresolved clip, in sequence order, and never concurrently.
/// Implementations may probe media, consult a cache, or return canned values in tests.
/// Any `FnMut(&str) -> MontageResult<f64>` closure is a resolver.
pub trait DurationResolver {
    /// Duration of `identifier` in seconds, or [`MontageError::DurationUnavailable`].
    fn resolve(&mut self, identifier: &str) -> MontageResult<f64>;
}

impl<F> DurationResolver for F
where
    F: FnMut(&str) -> MontageResult<f64>,
{
    fn resolve(&mut self, identifier: &str) -> MontageResult<f64> {
        self(identifier)
    }
}

/// Deterministic resolver backed by a fixed table.
///
/// Every lookup is recorded, which makes resolution order and call counts observable in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    durations: HashMap<String, f64>,
    lookups: Vec<String>,
}

impl StaticResolver {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `identifier` with `duration` seconds.
    pub fn with(mut self, identifier: impl Into<String>, duration: f64) -> Self {
        self.insert(identifier, duration);
        self
    }

    /// Register or replace an entry.
    pub fn insert(&mut self, identifier: impl Into<String>, duration: f64) {
        self.durations.insert(identifier.into(), duration);
    }

    /// Identifiers passed to `resolve`, in call order.
    pub fn lookups(&self) -> &[String] {
        &self.lookups
    }
}

impl DurationResolver for StaticResolver {
    fn resolve(&mut self, identifier: &str) -> MontageResult<f64> {
        self.lookups.push(identifier.to_string());
        self.durations.get(identifier).copied().ok_or_else(|| {
            MontageError::duration_unavailable(identifier, "no duration registered")
        })
    }
}

/// Memoizing wrapper: each distinct identifier reaches the inner resolver at most once.
#[derive(Debug)]
pub struct CachingResolver<R> {
    inner: R,
    cache: HashMap<String, f64>,
    misses: usize,
}

impl<R: DurationResolver> CachingResolver<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            misses: 0,
        }
    }

    /// Number of lookups forwarded to the inner resolver.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Unwrap the inner resolver.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: DurationResolver> DurationResolver for CachingResolver<R> {
    fn resolve(&mut self, identifier: &str) -> MontageResult<f64> {
        if let Some(d) = self.cache.get(identifier) {
            return Ok(*d);
        }
        self.misses += 1;
        let d = self.inner.resolve(identifier)?;
        self.cache.insert(identifier.to_string(), d);
        Ok(d)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/resolver.rs"]
mod tests;
