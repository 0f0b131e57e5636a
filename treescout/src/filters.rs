//! Match rules and the rule chain.
//!
//! A [`Rule`] looks at one directory entry and says yes or no. A
//! [`RuleChain`] runs its rules in order and stops at the first no, so put
//! cheap rules (sizes, names) ahead of expensive ones (content):
//!
//! ```rust,ignore
//! let chain = RuleChain::new()
//!     .with(MinimumSizeRule)
//!     .with(NameRule)
//!     .with(ContentRule);
//! ```
//!
//! Rules never recurse or touch the result list; walking the tree is the
//! engine's business. A rule reads what it needs from the [`MatchContext`]:
//! the entry, its full path, the job's settings and its compiled patterns.
//!
//! Custom rules are plain closures:
//!
//! ```rust,ignore
//! let chain = RuleChain::new().with(FnRule::new(|ctx: &MatchContext<'_>| {
//!     ctx.path().extension().is_some_and(|ext| ext == "rs")
//! }));
//! ```
use std::fmt;
use std::path::Path;
use tracing::trace;

use crate::config::SearchSettings;
use crate::fs::EntryMetadata;
use crate::mime::{mime_type_of, same_mime_type};
use crate::search::matcher::CompiledPatterns;
use crate::search::processor;
use crate::search::SearchJob;

/// Everything a rule may look at for one entry
pub struct MatchContext<'a> {
    path: &'a Path,
    entry: &'a EntryMetadata,
    job: &'a SearchJob,
}

impl<'a> MatchContext<'a> {
    pub(crate) fn new(path: &'a Path, entry: &'a EntryMetadata, job: &'a SearchJob) -> Self {
        Self { path, entry, job }
    }

    /// Full path of the entry
    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn entry(&self) -> &EntryMetadata {
        self.entry
    }

    pub fn settings(&self) -> &SearchSettings {
        self.job.settings()
    }

    pub fn patterns(&self) -> &CompiledPatterns {
        self.job.patterns()
    }

    pub(crate) fn job(&self) -> &SearchJob {
        self.job
    }
}

/// A single yes/no test on a directory entry
pub trait Rule {
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool;

    /// Short label used in trace logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Display name against the compiled name pattern; passes when there is none
#[derive(Debug, Clone, Copy, Default)]
pub struct NameRule;

impl Rule for NameRule {
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        match &ctx.patterns().name {
            Some(matcher) => matcher.is_match_str(&ctx.entry().display_name),
            None => true,
        }
    }

    fn name(&self) -> &'static str {
        "name"
    }
}

/// File content against the compiled content pattern.
///
/// Only non-empty regular files can pass; directories and empty files never
/// do. With no content pattern configured the rule passes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRule;

impl Rule for ContentRule {
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        if ctx.patterns().content.is_none() {
            return true;
        }
        let entry = ctx.entry();
        if !entry.is_file() || entry.size == 0 {
            return false;
        }
        processor::scan(ctx)
    }

    fn name(&self) -> &'static str {
        "content"
    }
}

/// MIME type equality; passes when no type is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRule;

impl Rule for TypeRule {
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        match &ctx.settings().mime_type {
            Some(wanted) => same_mime_type(&mime_type_of(ctx.path(), ctx.entry()), wanted),
            None => true,
        }
    }

    fn name(&self) -> &'static str {
        "type"
    }
}

/// `size >= min_size` (inclusive); passes when the bound is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumSizeRule;

impl Rule for MinimumSizeRule {
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        ctx.settings()
            .min_size
            .map_or(true, |min| ctx.entry().size >= min)
    }

    fn name(&self) -> &'static str {
        "min-size"
    }
}

/// `size <= max_size` (inclusive); passes when the bound is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumSizeRule;

impl Rule for MaximumSizeRule {
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        ctx.settings()
            .max_size
            .map_or(true, |max| ctx.entry().size <= max)
    }

    fn name(&self) -> &'static str {
        "max-size"
    }
}

/// A rule backed by a closure; captured variables play the part of rule state
pub struct FnRule<F> {
    f: F,
}

impl<F> FnRule<F>
where
    F: Fn(&MatchContext<'_>) -> bool,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&MatchContext<'_>) -> bool,
{
    fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        (self.f)(ctx)
    }
}

/// Ordered rules combined with short-circuit AND
#[derive(Default)]
pub struct RuleChain {
    rules: Vec<Box<dyn Rule + Send + Sync>>,
}

impl RuleChain {
    /// An empty chain, which matches every entry
    pub fn new() -> Self {
        Self::default()
    }

    /// The usual chain for `settings`: only rules whose setting is present,
    /// cheapest first
    pub fn standard(settings: &SearchSettings) -> Self {
        let mut chain = Self::new();
        if settings.min_size.is_some() {
            chain.push(MinimumSizeRule);
        }
        if settings.max_size.is_some() {
            chain.push(MaximumSizeRule);
        }
        if settings.name_pattern.as_deref().is_some_and(|p| !p.is_empty()) {
            chain.push(NameRule);
        }
        if settings.mime_type.is_some() {
            chain.push(TypeRule);
        }
        if settings
            .content_pattern
            .as_deref()
            .is_some_and(|p| !p.is_empty())
        {
            chain.push(ContentRule);
        }
        chain
    }

    pub fn with(mut self, rule: impl Rule + Send + Sync + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl Rule + Send + Sync + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Labels of the rules, in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// True when every rule passes; stops at the first failure
    pub fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        for rule in &self.rules {
            if !rule.evaluate(ctx) {
                trace!("{} rejected by {} rule", ctx.path().display(), rule.name());
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleChain")
            .field("rules", &self.names())
            .finish()
    }
}

impl FromIterator<Box<dyn Rule + Send + Sync>> for RuleChain {
    fn from_iter<I: IntoIterator<Item = Box<dyn Rule + Send + Sync>>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
