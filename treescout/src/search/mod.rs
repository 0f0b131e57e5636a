//! The search job and the pieces it runs on.
//!
//! A [`SearchJob`] walks its target folders depth-first on the calling
//! thread. For every entry it builds a [`MatchContext`](crate::filters::MatchContext),
//! runs the job's [`RuleChain`](crate::filters::RuleChain) over it, appends a
//! record on a match and then descends into directories. Content rules reach
//! the file bytes through `processor`, which memory-maps local files and
//! streams everything else.
//!
//! Running a job in the background and polling it:
//!
//! ```rust,ignore
//! let job = SearchJob::new(RuleChain::standard(&settings), &["src"], &settings)?;
//! let results = job.results();
//! let cancel = job.cancellation_token();
//!
//! let worker = std::thread::spawn(move || job.run());
//! // ... later, from any thread:
//! cancel.cancel();
//! let summary = worker.join().unwrap();
//! println!("{} matches", results.len());
//! ```
pub mod control;
pub mod engine;
pub mod matcher;
pub(crate) mod processor;

pub use control::{CancellationToken, ErrorAction, ErrorPolicy, SearchObserver, Severity};
pub use engine::SearchJob;
pub use matcher::{CompiledPatterns, PatternMatcher};
