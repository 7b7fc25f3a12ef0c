//! Per-session processing statistics.
//!
//! Workers increment shared atomic counters; the immutable
//! `ProcessingStatistics` aggregate is snapshotted once at session end.

use std::sync::atomic::{AtomicU64, Ordering};

use fundscout_registry::SessionTotals;

/// Live counters shared by the worker pool.
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub total_results: AtomicU64,
    pub spam_tld_filtered: AtomicU64,
    pub blacklisted_skipped: AtomicU64,
    pub duplicates_skipped: AtomicU64,
    pub high_confidence_created: AtomicU64,
    pub low_confidence_created: AtomicU64,
    pub invalid_urls_skipped: AtomicU64,
    pub failed_transient: AtomicU64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProcessingStatistics {
        ProcessingStatistics {
            total_results: self.total_results.load(Ordering::Relaxed),
            spam_tld_filtered: self.spam_tld_filtered.load(Ordering::Relaxed),
            blacklisted_skipped: self.blacklisted_skipped.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            high_confidence_created: self.high_confidence_created.load(Ordering::Relaxed),
            low_confidence_created: self.low_confidence_created.load(Ordering::Relaxed),
            invalid_urls_skipped: self.invalid_urls_skipped.load(Ordering::Relaxed),
            failed_transient: self.failed_transient.load(Ordering::Relaxed),
        }
    }
}

/// Increment helper; counters only ever go up.
pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Immutable end-of-session summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStatistics {
    pub total_results: u64,
    pub spam_tld_filtered: u64,
    pub blacklisted_skipped: u64,
    pub duplicates_skipped: u64,
    pub high_confidence_created: u64,
    pub low_confidence_created: u64,
    pub invalid_urls_skipped: u64,
    pub failed_transient: u64,
}

impl ProcessingStatistics {
    pub fn total_candidates_created(&self) -> u64 {
        self.high_confidence_created + self.low_confidence_created
    }

    /// Sum of all terminal outcomes this session accounted for.
    pub fn total_processed(&self) -> u64 {
        self.spam_tld_filtered
            + self.blacklisted_skipped
            + self.duplicates_skipped
            + self.high_confidence_created
            + self.low_confidence_created
            + self.invalid_urls_skipped
            + self.failed_transient
    }

    pub fn to_totals(&self) -> SessionTotals {
        SessionTotals {
            total_results: self.total_results as i64,
            spam_tld_filtered: self.spam_tld_filtered as i64,
            blacklisted_skipped: self.blacklisted_skipped as i64,
            duplicates_skipped: self.duplicates_skipped as i64,
            high_confidence_created: self.high_confidence_created as i64,
            low_confidence_created: self.low_confidence_created as i64,
            invalid_urls_skipped: self.invalid_urls_skipped as i64,
            failed_transient: self.failed_transient as i64,
        }
    }
}

impl std::fmt::Display for ProcessingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Discovery Session Complete ===")?;
        writeln!(f, "Results seen:        {}", self.total_results)?;
        writeln!(f, "Candidates created:  {}", self.high_confidence_created)?;
        writeln!(f, "Low confidence:      {}", self.low_confidence_created)?;
        writeln!(f, "Spam TLD filtered:   {}", self.spam_tld_filtered)?;
        writeln!(f, "Blacklisted:         {}", self.blacklisted_skipped)?;
        writeln!(f, "Session duplicates:  {}", self.duplicates_skipped)?;
        writeln!(f, "Invalid URLs:        {}", self.invalid_urls_skipped)?;
        writeln!(f, "Transient failures:  {}", self.failed_transient)?;
        Ok(())
    }
}
