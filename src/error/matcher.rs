//! Message matchers.
//!
//! A [`MessageMatcher`] votes on whether a response belongs to a rule. The
//! shipped [`RegexMatcher`] tests the response text against a set of patterns
//! with whole-string semantics; [`StatusCodeMatcher`] looks at the status code
//! only. Closures with the right signature are matchers too.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A predicate over a response message and status code.
///
/// Implementations must be total: internal failures turn into a `false`
/// vote and never escape.
pub trait MessageMatcher: Send + Sync {
    /// Returns true if the response belongs to this matcher's rule.
    fn vote(&self, message: Option<&str>, status_code: u16) -> bool;

    /// Whether the response body must be resolved before voting.
    ///
    /// When false, `vote` receives `None` unless some earlier matcher already
    /// resolved the body.
    fn requires_message(&self) -> bool {
        true
    }
}

impl<F> MessageMatcher for F
where
    F: Fn(Option<&str>, u16) -> bool + Send + Sync,
{
    fn vote(&self, message: Option<&str>, status_code: u16) -> bool {
        self(message, status_code)
    }
}

/// Errors raised while building a matcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatcherError {
    /// A regex matcher needs at least one pattern.
    #[error("regex matcher requires at least one pattern")]
    NoPatterns,
}

/// Options applied uniformly to every pattern of a [`RegexMatcher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexOption {
    /// Case-insensitive matching.
    IgnoreCase,
    /// `^` and `$` match at line boundaries.
    MultiLine,
    /// `.` also matches `\n`.
    DotMatchesNewLine,
    /// Whitespace and `#` comments in the pattern are ignored.
    IgnoreWhitespace,
    /// The pattern is matched as literal text.
    Literal,
}

impl RegexOption {
    /// The option set used when none is given.
    pub fn defaults() -> Vec<RegexOption> {
        vec![RegexOption::IgnoreCase]
    }
}

#[derive(Debug)]
struct CompiledPattern {
    source: String,
    regex: Result<Regex, regex::Error>,
}

impl CompiledPattern {
    fn compile(source: String, options: &[RegexOption]) -> Self {
        let body = if options.contains(&RegexOption::Literal) {
            regex::escape(&source)
        } else {
            source.clone()
        };

        // The pattern must be valid on its own before it is wrapped, or an
        // unbalanced group could close the wrapper early.
        let regex = build(&body, options).and_then(|_| {
            let verbose = options.contains(&RegexOption::IgnoreWhitespace);
            build(&anchor(&body, verbose), options).or_else(|error| {
                if verbose {
                    Err(error)
                } else {
                    // An inline `(?x)` comment swallowed the closing anchor.
                    build(&anchor(&body, true), options)
                }
            })
        });
        if let Err(error) = &regex {
            tracing::warn!(
                pattern = %source,
                %error,
                "pattern failed to compile and will never vote"
            );
        }

        Self { source, regex }
    }

    fn is_full_match(&self, message: &str) -> bool {
        match &self.regex {
            Ok(regex) => regex.is_match(message),
            Err(error) => {
                // The only place in the engine where a fault is absorbed.
                tracing::error!(
                    pattern = %self.source,
                    error_kind = error_kind(error),
                    %error,
                    input = %message,
                    "error parsing pattern"
                );
                false
            }
        }
    }
}

/// Anchors `body` on the whole input; `^`/`$` would follow line boundaries
/// under MultiLine. In verbose mode the newline ends a trailing `#` comment.
fn anchor(body: &str, verbose: bool) -> String {
    if verbose {
        format!("\\A(?:{}\n)\\z", body)
    } else {
        format!("\\A(?:{})\\z", body)
    }
}

fn build(pattern: &str, options: &[RegexOption]) -> Result<Regex, regex::Error> {
    let mut builder = RegexBuilder::new(pattern);
    for option in options {
        match option {
            RegexOption::IgnoreCase => builder.case_insensitive(true),
            RegexOption::MultiLine => builder.multi_line(true),
            RegexOption::DotMatchesNewLine => builder.dot_matches_new_line(true),
            RegexOption::IgnoreWhitespace => builder.ignore_whitespace(true),
            RegexOption::Literal => &mut builder,
        };
    }
    builder.build()
}

fn error_kind(error: &regex::Error) -> &'static str {
    match error {
        regex::Error::Syntax(_) => "syntax",
        regex::Error::CompiledTooBig(_) => "compiled_too_big",
        _ => "unknown",
    }
}

/// Matches response text against a set of regular expressions.
///
/// A pattern votes only if it matches the entire message; wrap it in `.*`
/// for substring behavior. The matcher votes true if any pattern votes.
#[derive(Debug)]
pub struct RegexMatcher {
    patterns: Vec<CompiledPattern>,
    options: Vec<RegexOption>,
    absent_message_vote: bool,
}

impl RegexMatcher {
    /// Creates a matcher with the default options (case-insensitive).
    ///
    /// # Errors
    /// Returns [`MatcherError::NoPatterns`] if `patterns` is empty.
    pub fn new<I, S>(patterns: I) -> Result<Self, MatcherError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_options(patterns, RegexOption::defaults())
    }

    /// Creates a matcher with an explicit option set.
    ///
    /// Patterns that fail to compile are kept and never vote.
    ///
    /// # Errors
    /// Returns [`MatcherError::NoPatterns`] if `patterns` is empty.
    pub fn with_options<I, S>(patterns: I, options: Vec<RegexOption>) -> Result<Self, MatcherError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matcher = Self::compile(patterns, options);
        if matcher.patterns.is_empty() {
            return Err(MatcherError::NoPatterns);
        }
        Ok(matcher)
    }

    /// Builds a matcher from patterns known to be non-empty.
    pub(crate) fn from_static(patterns: &[&str]) -> Self {
        debug_assert!(!patterns.is_empty());
        Self::compile(patterns.iter().copied(), RegexOption::defaults())
    }

    fn compile<I, S>(patterns: I, options: Vec<RegexOption>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| CompiledPattern::compile(pattern.into(), &options))
            .collect();
        Self {
            patterns,
            options,
            absent_message_vote: false,
        }
    }

    /// Sets the vote returned when the message is absent.
    pub fn absent_message_vote(mut self, vote: bool) -> Self {
        self.absent_message_vote = vote;
        self
    }

    /// Returns the pattern sources, in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|pattern| pattern.source.as_str())
    }

    /// Returns the option set.
    pub fn options(&self) -> &[RegexOption] {
        &self.options
    }

    /// Returns the number of patterns that failed to compile.
    pub fn invalid_pattern_count(&self) -> usize {
        self.patterns
            .iter()
            .filter(|pattern| pattern.regex.is_err())
            .count()
    }
}

impl MessageMatcher for RegexMatcher {
    fn vote(&self, message: Option<&str>, _status_code: u16) -> bool {
        let Some(message) = message else {
            return self.absent_message_vote;
        };
        self.patterns
            .iter()
            .any(|pattern| pattern.is_full_match(message))
    }
}

/// Votes on the status code alone, without reading the body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusCodeMatcher {
    status_codes: Vec<u16>,
}

impl StatusCodeMatcher {
    /// Creates a matcher voting for any of the given status codes.
    pub fn new(status_codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            status_codes: status_codes.into_iter().collect(),
        }
    }
}

impl MessageMatcher for StatusCodeMatcher {
    fn vote(&self, _message: Option<&str>, status_code: u16) -> bool {
        self.status_codes.contains(&status_code)
    }

    fn requires_message(&self) -> bool {
        false
    }
}
