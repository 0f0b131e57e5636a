pub mod config;
pub mod errors;
pub mod filters;
pub mod fs;
pub mod metrics;
pub mod mime;
pub mod results;
pub mod search;

pub use config::{MatchMode, SearchSettings};
pub use errors::{SearchError, SearchResult};
pub use filters::{
    ContentRule, FnRule, MatchContext, MaximumSizeRule, MinimumSizeRule, NameRule, Rule, RuleChain,
    TypeRule,
};
pub use fs::{EntryKind, EntryMetadata, FileSystem, LocalFs};
pub use results::{FileRecord, SearchResults, SearchSummary};
pub use search::{CancellationToken, ErrorAction, ErrorPolicy, SearchJob, SearchObserver, Severity};
