//! Removal of subtitle entries whose text matches one or more patterns.
//!
//! Patterns are plain regular expressions. User supplied expressions may
//! carry their flags either as `/pattern/flags` or as a leading `(?flags)`
//! group, both forms being merged into the compiled pattern.

use log::{debug, trace};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use thiserror::Error;

/// Error for pattern compilation.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A flag of the expression has no equivalent.
    #[error("Unknown flag '{flag}' in pattern '{expr}'")]
    UnknownFlag {
        /// The unsupported flag
        flag: char,
        /// Expression as given by the user
        expr: String,
    },

    /// The regular expression could not be compiled.
    #[error("Invalid pattern '{expr}'")]
    Regex {
        /// Expression as given by the user
        expr: String,
        /// Compilation error
        #[source]
        source: regex::Error,
    },
}

/// A compiled predicate matched against the whole text of an entry.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Wrap an already compiled regular expression.
    #[must_use]
    pub const fn new(regex: Regex) -> Self {
        Self(regex)
    }

    /// Pattern selecting texts wholly enclosed in `[...]` or `(...)`,
    /// usually sound cues and other non-verbal annotations.
    ///
    /// # Panics
    ///
    /// Panic if the Regex creation failed
    #[must_use]
    pub fn annotations() -> Self {
        static ANNOTATION: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?s)^(?:\[.+\]|\(.+\))$").unwrap());
        Self(ANNOTATION.clone())
    }

    /// Compile a user supplied expression.
    ///
    /// Supported flags are `i` (case insensitive), `m` (multi-line), `s` (dot
    /// matches new line) and `u` (unicode). `g` and `y` are accepted and have no effect.
    ///
    /// # Errors
    ///
    /// Will return `PatternError::UnknownFlag` for any other flag, and
    /// `PatternError::Regex` if the expression is not a valid regular expression.
    ///
    /// # Panics
    ///
    /// Panic if the Regex creation failed
    pub fn from_expression(expr: &str) -> Result<Self, PatternError> {
        static DELIMITED: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?s)^/(.*)/([a-z]*)$").unwrap());
        static INLINE_FLAGS: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^\(\?([a-z]+)\)").unwrap());

        let mut source = expr;
        let mut flags = String::new();
        if let Some(cap) = DELIMITED.captures(expr) {
            source = cap.get(1).map_or("", |m| m.as_str());
            flags.push_str(cap.get(2).map_or("", |m| m.as_str()));
        }
        if let Some(cap) = INLINE_FLAGS.captures(source) {
            flags.push_str(cap.get(1).map_or("", |m| m.as_str()));
            source = &source[cap.get(0).map_or(0, |m| m.end())..];
        }

        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'u' => {
                    builder.unicode(true);
                }
                'g' | 'y' => trace!("Ignoring flag '{flag}' of '{expr}'"),
                flag => {
                    return Err(PatternError::UnknownFlag {
                        flag,
                        expr: expr.into(),
                    })
                }
            }
        }

        let regex = builder.build().map_err(|source| PatternError::Regex {
            expr: expr.into(),
            source,
        })?;
        debug!("Compiled pattern '{expr}' as '{regex}'");
        Ok(Self(regex))
    }

    /// Check if the text is matched by the pattern.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// The underlying regular expression.
    #[must_use]
    pub const fn as_regex(&self) -> &Regex {
        &self.0
    }
}

impl From<Regex> for Pattern {
    fn from(value: Regex) -> Self {
        Self(value)
    }
}

/// A document whose entries can be removed according to their text.
pub trait Filterable {
    /// Type of the removed entries.
    type Entry;

    /// Remove every entry whose text satisfies `predicate`, keeping the
    /// relative order of the others.
    /// Return the removed entries, in document order.
    fn remove_matching<F>(&mut self, predicate: F) -> Vec<Self::Entry>
    where
        F: FnMut(&str) -> bool;

    /// Remove every entry whose text is matched by `pattern`.
    fn filter(&mut self, pattern: &Pattern) -> Vec<Self::Entry> {
        self.remove_matching(|text| pattern.is_match(text))
    }
}

/// A set of patterns applied together: an entry is removed if any of them matches.
#[derive(Debug, Default, Clone)]
pub struct Filter {
    patterns: Vec<Pattern>,
}

impl Filter {
    /// Create a filter without pattern, which removes nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Add a pattern to the filter.
    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    /// Builder style version of [`Self::push`].
    #[must_use]
    pub fn with(mut self, pattern: Pattern) -> Self {
        self.push(pattern);
        self
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the filter has no pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check if any pattern matches `text`.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }

    /// Remove from `doc` the entries matched by at least one pattern.
    /// Return the removed entries.
    pub fn apply<D: Filterable>(&self, doc: &mut D) -> Vec<D::Entry> {
        if self.is_empty() {
            return Vec::new();
        }
        let removed = doc.remove_matching(|text| self.matches(text));
        debug!("Filter removed {} entries", removed.len());
        removed
    }
}

impl FromIterator<Pattern> for Filter {
    fn from_iter<T: IntoIterator<Item = Pattern>>(iter: T) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}
