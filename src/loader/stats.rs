use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Resolution counters of one loader.
///
/// Counters only ever grow. They are updated with relaxed atomics, so a [`StatsSnapshot`]
/// taken while other threads resolve classes is not necessarily consistent across fields.
#[derive(Debug, Default)]
pub struct LoaderStats {
    cache_hits: AtomicUsize,
    intercepted: AtomicUsize,
    transformed: AtomicUsize,
    unmodified: AtomicUsize,
    deferred: AtomicUsize,
    not_found: AtomicUsize,
}

/// Point-in-time copy of [`LoaderStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests answered from the defined-class cache
    pub cache_hits: usize,
    /// Requests resolved by an interceptor
    pub intercepted: usize,
    /// Classes defined after running the transformer chain
    pub transformed: usize,
    /// Classes defined without transformation
    pub unmodified: usize,
    /// Requests resolved by the deferred loader
    pub deferred: usize,
    /// Requests that failed with class not found
    pub not_found: usize,
}

impl StatsSnapshot {
    /// Number of classes this loader defined.
    #[must_use]
    pub fn defined(&self) -> usize {
        self.transformed + self.unmodified
    }
}

impl LoaderStats {
    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn record_intercepted(&self) {
        self.intercepted.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn record_defined(&self, transformed: bool) {
        if transformed {
            self.transformed.fetch_add(1, AtomicOrdering::Relaxed);
        } else {
            self.unmodified.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    pub(crate) fn record_deferred(&self) {
        self.deferred.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn record_not_found(&self) {
        self.not_found.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(AtomicOrdering::Relaxed),
            intercepted: self.intercepted.load(AtomicOrdering::Relaxed),
            transformed: self.transformed.load(AtomicOrdering::Relaxed),
            unmodified: self.unmodified.load(AtomicOrdering::Relaxed),
            deferred: self.deferred.load(AtomicOrdering::Relaxed),
            not_found: self.not_found.load(AtomicOrdering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters() {
        let stats = LoaderStats::default();
        stats.record_cache_hit();
        stats.record_defined(true);
        stats.record_defined(false);
        stats.record_defined(false);
        stats.record_deferred();
        stats.record_not_found();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.transformed, 1);
        assert_eq!(snapshot.unmodified, 2);
        assert_eq!(snapshot.defined(), 3);
        assert_eq!(snapshot.deferred, 1);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.intercepted, 0);
    }
}
