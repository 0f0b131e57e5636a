//! Error reporting and cancellation.
//!
//! Every failure during a walk is handed to the job's [`SearchObserver`]
//! exactly once, with a [`Severity`]. The observer answers with an
//! [`ErrorAction`]; `Abort` trips the job's [`CancellationToken`], and that
//! token is the only thing that stops a walk early. Nothing unwinds: the
//! engine checks the token before every entry it pulls and every target
//! folder it opens.
//!
//! # Severity
//!
//! - [`Severity::Severe`]: the failure cost a result (a folder could not be
//!   listed, a file could not be read).
//! - [`Severity::Mild`]: cleanup failed after the result was already known
//!   (a listing could not be closed).
//!
//! # Observers
//!
//! Any closure with the right shape is an observer:
//!
//! ```rust,ignore
//! let job = job.with_observer(|err: &SearchError, severity: Severity| {
//!     eprintln!("{:?}: {}", severity, err);
//!     ErrorAction::Continue
//! });
//! ```
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, warn};

use crate::errors::SearchError;
use crate::results::FileRecord;

/// How bad a reported failure is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Mild,
    Severe,
}

/// What the walk should do after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Continue,
    Abort,
}

/// Receives failures and progress from a running search
pub trait SearchObserver {
    /// Decides how the walk proceeds after `error`.
    fn report(&self, error: &SearchError, severity: Severity) -> ErrorAction;

    /// Called after each record is added to the results.
    fn entry_matched(&self, _record: &FileRecord) {}
}

impl<F> SearchObserver for F
where
    F: Fn(&SearchError, Severity) -> ErrorAction,
{
    fn report(&self, error: &SearchError, severity: Severity) -> ErrorAction {
        self(error, severity)
    }
}

/// Stock observers that log every failure and answer by a fixed rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Always continue
    #[default]
    Continue,
    /// Abort on the first severe failure, continue after mild ones
    AbortOnSevere,
    /// Abort on any failure
    Abort,
}

impl SearchObserver for ErrorPolicy {
    fn report(&self, err: &SearchError, severity: Severity) -> ErrorAction {
        let action = match (self, severity) {
            (ErrorPolicy::Continue, _) => ErrorAction::Continue,
            (ErrorPolicy::AbortOnSevere, Severity::Mild) => ErrorAction::Continue,
            (ErrorPolicy::AbortOnSevere, Severity::Severe) => ErrorAction::Abort,
            (ErrorPolicy::Abort, _) => ErrorAction::Abort,
        };
        match action {
            ErrorAction::Continue => warn!("{:?} error, continuing: {}", severity, err),
            ErrorAction::Abort => error!("{:?} error, aborting search: {}", severity, err),
        }
        action
    }
}

/// Shared stop flag for one search job
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
