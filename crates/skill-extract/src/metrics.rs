//! Counters for which path served each extraction.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::extractor::FallbackReason;

#[derive(Debug, Default)]
pub struct ExtractorMetrics {
    pub ranked: AtomicU64,
    pub fallback_no_embedder: AtomicU64,
    pub fallback_no_index: AtomicU64,
    pub fallback_incompatible: AtomicU64,
    pub fallback_error: AtomicU64,
    pub fallback_timeout: AtomicU64,
    pub fallback_busy: AtomicU64,
    /// Index loads whose dimension did not match the model
    pub incompatible_loads: AtomicU64,
}

impl ExtractorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ranked(&self) {
        self.ranked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self, reason: &FallbackReason) {
        let counter = match reason {
            FallbackReason::NoEmbedder => &self.fallback_no_embedder,
            FallbackReason::NoIndex | FallbackReason::EmptyIndex => &self.fallback_no_index,
            FallbackReason::Incompatible { .. } => &self.fallback_incompatible,
            FallbackReason::RankFailed(_) | FallbackReason::TaskFailed(_) => &self.fallback_error,
            FallbackReason::Timeout => &self.fallback_timeout,
            FallbackReason::Busy => &self.fallback_busy,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_incompatible_load(&self) {
        self.incompatible_loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counts as a snapshot.
    pub fn snapshot(&self) -> ExtractorMetricsSnapshot {
        ExtractorMetricsSnapshot {
            ranked: self.ranked.load(Ordering::Relaxed),
            fallback_no_embedder: self.fallback_no_embedder.load(Ordering::Relaxed),
            fallback_no_index: self.fallback_no_index.load(Ordering::Relaxed),
            fallback_incompatible: self.fallback_incompatible.load(Ordering::Relaxed),
            fallback_error: self.fallback_error.load(Ordering::Relaxed),
            fallback_timeout: self.fallback_timeout.load(Ordering::Relaxed),
            fallback_busy: self.fallback_busy.load(Ordering::Relaxed),
            incompatible_loads: self.incompatible_loads.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of extractor metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorMetricsSnapshot {
    pub ranked: u64,
    pub fallback_no_embedder: u64,
    pub fallback_no_index: u64,
    pub fallback_incompatible: u64,
    pub fallback_error: u64,
    pub fallback_timeout: u64,
    pub fallback_busy: u64,
    pub incompatible_loads: u64,
}

impl ExtractorMetricsSnapshot {
    pub fn total_fallback(&self) -> u64 {
        self.fallback_no_embedder
            + self.fallback_no_index
            + self.fallback_incompatible
            + self.fallback_error
            + self.fallback_timeout
            + self.fallback_busy
    }

    pub fn total(&self) -> u64 {
        self.ranked + self.total_fallback()
    }
}
