use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters for one search job
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Walk metrics
    folders_walked: Arc<AtomicU64>,
    entries_seen: Arc<AtomicU64>,
    errors_reported: Arc<AtomicU64>,

    // Content scan metrics
    mapped_scans: Arc<AtomicU64>,
    streamed_scans: Arc<AtomicU64>,
    bytes_scanned: Arc<AtomicU64>,
    oversize_skipped: Arc<AtomicU64>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            folders_walked: Arc::new(AtomicU64::new(0)),
            entries_seen: Arc::new(AtomicU64::new(0)),
            errors_reported: Arc::new(AtomicU64::new(0)),
            mapped_scans: Arc::new(AtomicU64::new(0)),
            streamed_scans: Arc::new(AtomicU64::new(0)),
            bytes_scanned: Arc::new(AtomicU64::new(0)),
            oversize_skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_folder(&self) {
        self.folders_walked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entry(&self) {
        self.entries_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_reported.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a content scan through a memory map
    pub fn record_mapped_scan(&self, bytes: u64) {
        self.mapped_scans.fetch_add(1, Ordering::Relaxed);
        let total = self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed) + bytes;
        debug!("Mapped {} bytes, total scanned: {} bytes", bytes, total);
    }

    /// Records a content scan through a read stream
    pub fn record_streamed_scan(&self, bytes: u64) {
        self.streamed_scans.fetch_add(1, Ordering::Relaxed);
        let total = self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed) + bytes;
        debug!("Streamed {} bytes, total scanned: {} bytes", bytes, total);
    }

    pub fn record_oversize(&self) {
        self.oversize_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            folders_walked: self.folders_walked.load(Ordering::Relaxed),
            entries_seen: self.entries_seen.load(Ordering::Relaxed),
            errors_reported: self.errors_reported.load(Ordering::Relaxed),
            mapped_scans: self.mapped_scans.load(Ordering::Relaxed),
            streamed_scans: self.streamed_scans.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            oversize_skipped: self.oversize_skipped.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Folders walked: {}\n\
             Entries seen: {}\n\
             Errors reported: {}\n\
             Content scans (mapped/streamed): {}/{}\n\
             Bytes scanned: {}\n\
             Skipped as too large: {}",
            stats.folders_walked,
            stats.entries_seen,
            stats.errors_reported,
            stats.mapped_scans,
            stats.streamed_scans,
            stats.bytes_scanned,
            stats.oversize_skipped
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub folders_walked: u64,
    pub entries_seen: u64,
    pub errors_reported: u64,
    pub mapped_scans: u64,
    pub streamed_scans: u64,
    pub bytes_scanned: u64,
    pub oversize_skipped: u64,
}
