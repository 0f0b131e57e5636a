use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

use super::control::Severity;
use super::matcher::PatternMatcher;
use super::SearchJob;
use crate::errors::SearchError;
use crate::filters::MatchContext;

/// Tests the content pattern against the whole file behind `ctx`.
///
/// Native files are memory-mapped, anything else is read through the job's
/// file system into a buffer; both end in the same `PatternMatcher::is_match`
/// call. Callers guarantee a non-empty regular file.
pub(crate) fn scan(ctx: &MatchContext<'_>) -> bool {
    let Some(matcher) = ctx.patterns().content.as_ref() else {
        return false;
    };
    let job = ctx.job();
    let path = ctx.path();
    let size = ctx.entry().size;

    if let Some(limit) = ctx.settings().max_scan_size {
        if size > limit {
            debug!(
                "Skipping content scan of {} ({} bytes, limit {})",
                path.display(),
                size,
                limit
            );
            job.metrics().record_oversize();
            return false;
        }
    }

    if job.file_system().is_native(path) {
        scan_mapped(job, path, matcher)
    } else {
        scan_streamed(job, path, size, matcher)
    }
}

/// Maps the file read-only and matches against the mapped bytes. The map and
/// the descriptor are released on return, whatever the outcome.
///
/// Unmapping and closing happen in `Drop`, which has no error channel, so a
/// failed release is never reported.
fn scan_mapped(job: &SearchJob, path: &Path, matcher: &PatternMatcher) -> bool {
    trace!("Using memory-mapped scan for: {}", path.display());

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            job.report(SearchError::open_file(path, e), Severity::Severe);
            return false;
        }
    };

    // The map is only read, and it is dropped before this function returns.
    let mmap = match unsafe { Mmap::map(&file) } {
        Ok(mmap) => mmap,
        Err(e) => {
            job.report(SearchError::map_file(path, e), Severity::Severe);
            return false;
        }
    };

    job.metrics().record_mapped_scan(mmap.len() as u64);
    matcher.is_match(&mmap)
}

/// Reads up to `size` bytes through the job's file system into one buffer and
/// matches against it.
fn scan_streamed(job: &SearchJob, path: &Path, size: u64, matcher: &PatternMatcher) -> bool {
    trace!("Using streamed scan for: {}", path.display());

    let reader = match job.file_system().open_read(path) {
        Ok(reader) => reader,
        Err(e) => {
            job.report(SearchError::open_file(path, e), Severity::Severe);
            return false;
        }
    };

    let mut buffer = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
    if let Err(e) = reader.take(size).read_to_end(&mut buffer) {
        job.report(SearchError::read_file(path, e), Severity::Severe);
        return false;
    }

    job.metrics().record_streamed_scan(buffer.len() as u64);
    matcher.is_match(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatchMode, SearchSettings};
    use crate::filters::RuleChain;
    use crate::fs::{EntryKind, EntryMetadata, LocalFs};
    use crate::search::control::ErrorAction;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn content_job(dir: &Path, pattern: &str, mode: MatchMode, case_sensitive: bool) -> SearchJob {
        let settings = SearchSettings {
            content_pattern: Some(pattern.to_string()),
            content_mode: mode,
            case_sensitive,
            ..SearchSettings::default()
        };
        SearchJob::new(RuleChain::new(), &[dir], &settings).unwrap()
    }

    #[test]
    fn test_mapped_and_streamed_scans_agree() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        let mut content = String::new();
        for i in 0..2000 {
            content.push_str(&format!("Line {} with pattern_{}\n", i, i * 7));
        }
        content.push_str("the END marker\n");
        fs::write(&path, &content).unwrap();

        let cases = [
            ("*END marker*", MatchMode::Glob, true, true),
            ("*end MARKER*", MatchMode::Glob, true, false),
            ("*end MARKER*", MatchMode::Glob, false, true),
            (r"pattern_\d{5}", MatchMode::Regex, true, true),
            (r"pattern_\d{6}", MatchMode::Regex, true, false),
            ("line 1999", MatchMode::Regex, false, true),
            ("*absent*", MatchMode::Glob, false, false),
        ];

        for (pattern, mode, case_sensitive, expected) in cases {
            let job = content_job(dir.path(), pattern, mode, case_sensitive);
            let matcher = job.patterns().content.clone().unwrap();
            let size = content.len() as u64;

            let mapped = scan_mapped(&job, &path, &matcher);
            let streamed = scan_streamed(&job, &path, size, &matcher);
            assert_eq!(mapped, expected, "mapped scan for {}", pattern);
            assert_eq!(streamed, mapped, "streamed scan for {}", pattern);
        }
    }

    #[test]
    fn test_scan_picks_strategy_by_native_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();
        let entry = EntryMetadata::new("a.txt", EntryKind::File, 11);

        let job = content_job(dir.path(), "*world*", MatchMode::Glob, true);
        assert!(scan(&MatchContext::new(&path, &entry, &job)));
        let stats = job.metrics().get_stats();
        assert_eq!((stats.mapped_scans, stats.streamed_scans), (1, 0));

        let job = content_job(dir.path(), "*world*", MatchMode::Glob, true)
            .with_file_system(LocalFs::streamed());
        assert!(scan(&MatchContext::new(&path, &entry, &job)));
        let stats = job.metrics().get_stats();
        assert_eq!((stats.mapped_scans, stats.streamed_scans), (0, 1));
        assert_eq!(stats.bytes_scanned, 11);
    }

    #[test]
    fn test_oversize_files_are_not_scanned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "needle in a haystack").unwrap();
        let entry = EntryMetadata::new("big.txt", EntryKind::File, 20);

        let settings = SearchSettings {
            content_pattern: Some("needle".to_string()),
            content_mode: MatchMode::Regex,
            max_scan_size: Some(10),
            ..SearchSettings::default()
        };
        let job = SearchJob::new(RuleChain::new(), &[dir.path()], &settings).unwrap();
        assert!(!scan(&MatchContext::new(&path, &entry, &job)));
        assert_eq!(job.metrics().get_stats().oversize_skipped, 1);

        let unbounded = SearchSettings {
            max_scan_size: None,
            ..settings
        };
        let job = SearchJob::new(RuleChain::new(), &[dir.path()], &unbounded).unwrap();
        assert!(scan(&MatchContext::new(&path, &entry, &job)));
    }

    #[test]
    fn test_unreadable_file_reports_severe_and_does_not_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vanished.txt");
        let entry = EntryMetadata::new("vanished.txt", EntryKind::File, 5);

        let reports = Arc::new(AtomicUsize::new(0));
        let seen = reports.clone();
        let job = content_job(dir.path(), "*", MatchMode::Glob, true).with_observer(
            move |err: &SearchError, severity: Severity| {
                assert_eq!(severity, Severity::Severe);
                assert!(matches!(err, SearchError::FileNotFound(_)));
                seen.fetch_add(1, Ordering::SeqCst);
                ErrorAction::Continue
            },
        );

        assert!(!scan(&MatchContext::new(&path, &entry, &job)));
        assert_eq!(reports.load(Ordering::SeqCst), 1);
        assert!(!job.is_cancelled());
    }
}
