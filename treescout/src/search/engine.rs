use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

use super::control::{CancellationToken, ErrorAction, ErrorPolicy, SearchObserver, Severity};
use super::matcher::CompiledPatterns;
use crate::config::SearchSettings;
use crate::errors::{unify_path, SearchError, SearchResult};
use crate::filters::{MatchContext, RuleChain};
use crate::fs::{EntryMetadata, FileSystem, LocalFs};
use crate::metrics::ScanMetrics;
use crate::results::{FileRecord, SearchResults, SearchSummary};

/// One search over a list of target folders.
///
/// The job owns its settings, rules and compiled patterns. The result list
/// and the cancellation flag are shared: grab handles with
/// [`results`](Self::results) and [`cancellation_token`](Self::cancellation_token)
/// before moving the job to a worker thread.
pub struct SearchJob {
    rules: RuleChain,
    targets: Vec<PathBuf>,
    settings: SearchSettings,
    patterns: CompiledPatterns,
    results: SearchResults,
    cancel: CancellationToken,
    observer: Box<dyn SearchObserver + Send + Sync>,
    fs: Box<dyn FileSystem + Send + Sync>,
    metrics: ScanMetrics,
}

impl SearchJob {
    /// Creates a job over `targets`, copying `settings` and compiling its
    /// patterns. Fails only when a pattern or the settings are invalid.
    pub fn new<P: AsRef<Path>>(
        rules: RuleChain,
        targets: &[P],
        settings: &SearchSettings,
    ) -> SearchResult<Self> {
        settings.validate()?;
        let patterns = CompiledPatterns::from_settings(settings)?;
        let targets = targets.iter().map(|p| unify_path(p.as_ref())).collect();

        Ok(Self {
            rules,
            targets,
            settings: settings.clone(),
            patterns,
            results: SearchResults::new(),
            cancel: CancellationToken::new(),
            observer: Box::new(ErrorPolicy::default()),
            fs: Box::new(LocalFs::new()),
            metrics: ScanMetrics::new(),
        })
    }

    /// Replaces the default observer (log and continue)
    pub fn with_observer(mut self, observer: impl SearchObserver + Send + Sync + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Replaces the local disk with another file system
    pub fn with_file_system(mut self, fs: impl FileSystem + Send + Sync + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// Shares an external cancellation token with this job
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn patterns(&self) -> &CompiledPatterns {
        &self.patterns
    }

    /// Target folders as resolved at construction
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    pub fn rules(&self) -> &RuleChain {
        &self.rules
    }

    /// Handle to the live result list
    pub fn results(&self) -> SearchResults {
        self.results.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    pub(crate) fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Hands `error` to the observer and returns its decision. An abort
    /// cancels the job.
    pub(crate) fn report(&self, error: SearchError, severity: Severity) -> ErrorAction {
        debug!("Reporting {:?} error: {}", severity, error);
        self.metrics.record_error();
        let action = self.observer.report(&error, severity);
        if action == ErrorAction::Abort {
            self.cancel();
        }
        action
    }

    /// Walks every target folder in order until done or cancelled.
    ///
    /// Failures go to the observer, never to the caller: whatever was found
    /// stays in [`results`](Self::results) even if the run was cut short.
    pub fn run(&self) -> SearchSummary {
        info!(
            "Starting search in {} folder(s) with rules {:?}",
            self.targets.len(),
            self.rules.names()
        );
        let started = Instant::now();

        for folder in &self.targets {
            if self.is_cancelled() {
                debug!("Search cancelled before {}", folder.display());
                break;
            }
            self.walk_folder(folder);
        }

        self.metrics.log_stats();
        let stats = self.metrics.get_stats();
        let summary = SearchSummary {
            matches: self.results.len(),
            folders_walked: stats.folders_walked,
            entries_seen: stats.entries_seen,
            errors_reported: stats.errors_reported,
            cancelled: self.is_cancelled(),
            elapsed: started.elapsed(),
        };

        info!(
            "Search {}. Found {} matches in {} folders",
            if summary.cancelled { "cancelled" } else { "complete" },
            summary.matches,
            summary.folders_walked
        );
        summary
    }

    fn walk_folder(&self, folder: &Path) {
        debug!("Walking folder: {}", folder.display());

        let mut listing = match self.fs.read_dir(folder) {
            Ok(listing) => listing,
            Err(e) => {
                self.report(SearchError::read_dir(folder, e), Severity::Severe);
                return;
            }
        };
        self.metrics.record_folder();

        let mut failure = None;
        while !self.is_cancelled() {
            match listing.next_entry() {
                None => break,
                Some(Err(e)) => {
                    failure = Some(e);
                    break;
                }
                Some(Ok(entry)) => self.visit_entry(folder, &entry),
            }
        }

        if let Some(e) = failure {
            self.report(SearchError::read_entry(folder, e), Severity::Severe);
        }
        if let Err(e) = listing.close() {
            self.report(SearchError::close_dir(folder, e), Severity::Mild);
        }
    }

    fn visit_entry(&self, folder: &Path, entry: &EntryMetadata) {
        self.metrics.record_entry();

        // Hidden entries are dropped along with their subtree
        if entry.hidden && !self.settings.show_hidden {
            trace!("Skipping hidden entry: {}", entry.display_name);
            return;
        }

        let path = folder.join(&entry.name);
        let ctx = MatchContext::new(&path, entry, self);
        if self.rules.evaluate(&ctx) {
            trace!("Matched: {}", path.display());
            let record = FileRecord::from_entry(&path, entry);
            self.results.push(record.clone());
            self.observer.entry_matched(&record);
        }

        if entry.is_dir() && self.settings.recursive {
            self.walk_folder(&path);
        }
    }
}

impl fmt::Debug for SearchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchJob")
            .field("targets", &self.targets)
            .field("rules", &self.rules)
            .field("settings", &self.settings)
            .field("matches", &self.results.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
