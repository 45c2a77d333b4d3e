//! LITEKV - Store Metrics & Observability
//! Atomic counters for store operations, updated lock-free with
//! `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for a LiteKv store.
///
/// All counters use `Ordering::Relaxed`; they are read for reporting only.
#[derive(Debug)]
pub struct StoreMetrics {
    /// Total number of `set`/`setex` writes (including derived writes).
    pub sets: AtomicU64,
    /// Total number of `get` calls.
    pub gets: AtomicU64,
    /// Reads that returned a value.
    pub hits: AtomicU64,
    /// Reads that found nothing (missing, expired or consumed).
    pub misses: AtomicU64,
    /// Explicit `delete` calls that removed a row.
    pub deletes: AtomicU64,
    /// Rows removed because their expiry had passed.
    pub expirations: AtomicU64,
    /// One-time rows removed after their single read.
    pub one_time_reads: AtomicU64,
    /// Transactions committed (implicit and explicit).
    pub commits: AtomicU64,
    /// Total bytes written (keys + encoded values).
    pub bytes_written: AtomicU64,
    /// Total bytes read (encoded values returned by get).
    pub bytes_read: AtomicU64,
    /// When the store was opened.
    opened_at: Instant,
}

impl StoreMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            sets: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            one_time_reads: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            opened_at: Instant::now(),
        }
    }

    pub fn record_set(&self, key_size: usize, value_size: usize) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add((key_size + value_size) as u64, Ordering::Relaxed);
    }

    /// Record a get; `None` is a miss.
    pub fn record_get(&self, value_size: Option<usize>) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        match value_size {
            Some(size) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.bytes_read.fetch_add(size as u64, Ordering::Relaxed);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_one_time_read(&self) {
        self.one_time_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> f64 {
        self.opened_at.elapsed().as_secs_f64()
    }

    /// Get total number of operations (sets + gets + deletes).
    pub fn total_ops(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
            + self.gets.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
    }

    /// Fraction of reads that returned a value, 0.0 before any read.
    pub fn hit_ratio(&self) -> f64 {
        let gets = self.gets.load(Ordering::Relaxed);
        if gets == 0 {
            return 0.0;
        }
        self.hits.load(Ordering::Relaxed) as f64 / gets as f64
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ LITEKV Store Metrics ═══\n\
             Operations:\n\
               sets:      {}\n\
               gets:      {} (hit ratio {:.2})\n\
               deletes:   {}\n\
               commits:   {}\n\
             Lifecycle:\n\
               expired:   {}\n\
               one-time:  {}\n\
             I/O:\n\
               written:   {} bytes\n\
               read:      {} bytes\n\
             Uptime: {:.2}s",
            self.sets.load(Ordering::Relaxed),
            self.gets.load(Ordering::Relaxed),
            self.hit_ratio(),
            self.deletes.load(Ordering::Relaxed),
            self.commits.load(Ordering::Relaxed),
            self.expirations.load(Ordering::Relaxed),
            self.one_time_reads.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_operations() {
        let m = StoreMetrics::new();

        m.record_set(5, 10);
        m.record_set(3, 7);
        m.record_get(Some(10));
        m.record_get(None);
        m.record_delete();
        m.record_expirations(2);
        m.record_one_time_read();
        m.record_commit();

        assert_eq!(m.sets.load(Ordering::Relaxed), 2);
        assert_eq!(m.gets.load(Ordering::Relaxed), 2);
        assert_eq!(m.hits.load(Ordering::Relaxed), 1);
        assert_eq!(m.misses.load(Ordering::Relaxed), 1);
        assert_eq!(m.deletes.load(Ordering::Relaxed), 1);
        assert_eq!(m.expirations.load(Ordering::Relaxed), 2);
        assert_eq!(m.one_time_reads.load(Ordering::Relaxed), 1);
        assert_eq!(m.commits.load(Ordering::Relaxed), 1);
        assert_eq!(m.bytes_written.load(Ordering::Relaxed), 25);
        assert_eq!(m.bytes_read.load(Ordering::Relaxed), 10);
        assert_eq!(m.total_ops(), 5);
        assert!((m.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_format() {
        let m = StoreMetrics::new();
        m.record_set(10, 20);
        let report = m.report();
        assert!(report.contains("sets:"));
        assert!(report.contains("hit ratio"));
        assert!(report.contains("one-time:"));
    }

    #[test]
    fn test_default() {
        let m = StoreMetrics::default();
        assert_eq!(m.total_ops(), 0);
        assert_eq!(m.hit_ratio(), 0.0);
    }
}
