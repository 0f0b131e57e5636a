use glob::{MatchOptions, Pattern};
use regex::bytes::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::{MatchMode, SearchSettings};
use crate::errors::{SearchError, SearchResult};

/// A compiled name or content pattern
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    /// Shell-style wildcard match over the whole subject
    Glob {
        pattern: Pattern,
        options: MatchOptions,
    },
    /// Unanchored regex search
    Regex(Regex),
}

impl PatternMatcher {
    /// Compiles `pattern` in the given mode, folding case unless
    /// `case_sensitive` is set
    pub fn compile(pattern: &str, mode: MatchMode, case_sensitive: bool) -> SearchResult<Self> {
        debug!(
            "Compiling {:?} pattern '{}' (case sensitive: {})",
            mode, pattern, case_sensitive
        );
        match mode {
            MatchMode::Glob => {
                let pattern = Pattern::new(&collapse_wildcard_runs(pattern))
                    .map_err(|e| SearchError::invalid_pattern(format!("{}: {}", pattern, e)))?;
                // Like fnmatch(3) without FNM_PATHNAME/FNM_PERIOD: `*` crosses
                // `/` and leading dots need no literal match.
                let options = MatchOptions {
                    case_sensitive,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                };
                Ok(Self::Glob { pattern, options })
            }
            MatchMode::Regex => RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map(Self::Regex)
                .map_err(|e| SearchError::invalid_pattern(e.to_string())),
        }
    }

    /// Tests the pattern against raw bytes. Glob patterns see the bytes
    /// decoded as UTF-8, with invalid sequences replaced.
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        match self {
            Self::Glob { pattern, options } => {
                pattern.matches_with(&String::from_utf8_lossy(haystack), *options)
            }
            Self::Regex(regex) => regex.is_match(haystack),
        }
    }

    pub fn is_match_str(&self, haystack: &str) -> bool {
        self.is_match(haystack.as_bytes())
    }
}

/// Folds every run of `*` outside a `[...]` class into a single `*`.
///
/// `glob` only accepts `**` as a whole path component, while `fnmatch(3)`
/// treats it as `*`. Without literal separators the two mean the same.
fn collapse_wildcard_runs(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    // Characters seen inside the open class, if any; a `]` right after `[` or
    // `[!` is a literal member
    let mut class: Option<usize> = None;

    for c in pattern.chars() {
        match class {
            Some(len) => {
                out.push(c);
                class = match c {
                    ']' if len > 0 => None,
                    '!' if len == 0 && out.ends_with("[!") => Some(0),
                    _ => Some(len + 1),
                };
            }
            None => match c {
                '[' => {
                    class = Some(0);
                    out.push(c);
                }
                '*' if out.ends_with('*') => {}
                _ => out.push(c),
            },
        }
    }
    out
}

/// Name and content patterns, compiled once per job
#[derive(Debug, Clone, Default)]
pub struct CompiledPatterns {
    pub name: Option<PatternMatcher>,
    pub content: Option<PatternMatcher>,
}

impl CompiledPatterns {
    /// Compiles whichever patterns the settings carry. Empty pattern strings
    /// count as absent.
    pub fn from_settings(settings: &SearchSettings) -> SearchResult<Self> {
        let compile = |pattern: &Option<String>, mode| {
            pattern
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| PatternMatcher::compile(p, mode, settings.case_sensitive))
                .transpose()
        };

        Ok(Self {
            name: compile(&settings.name_pattern, settings.name_mode)?,
            content: compile(&settings.content_pattern, settings.content_mode)?,
        })
    }
}
