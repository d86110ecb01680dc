//! Class and package name patterns.

use std::fmt;

/// Wildcard marker inside a [`NamePattern`].
pub const WILDCARD: char = '*';

/// A pattern matched against fully qualified class names.
///
/// Three forms are recognised:
///
/// - **Wildcard** - the pattern contains `*`, which matches any run of characters
///   (including `.`). `*mytest*` matches every name containing `mytest`, `org.junit.*`
///   every name under `org.junit.`, `*Test` every name ending in `Test`.
/// - **Package prefix** - a pattern ending in `.` matches every name starting with it.
/// - **Exact** - otherwise the pattern matches the identical name, and also every class
///   inside the package the pattern names (`com.example` matches `com.example.Foo`).
///
/// # Examples
///
/// ```rust
/// use mockloader::policy::NamePattern;
///
/// assert!(NamePattern::new("*mytest*").matches("org.mytest.MyClass"));
/// assert!(NamePattern::new("org.junit.").matches("org.junit.Assert"));
/// assert!(NamePattern::new("com.example").matches("com.example.Target"));
/// assert!(NamePattern::new("com.example.Target").matches("com.example.Target"));
/// assert!(!NamePattern::new("com.example.Target").matches("com.example.Other"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PatternKind {
    Any,
    Exact,
    Prefix,
    Wildcard(Vec<String>),
}

impl NamePattern {
    /// Parses a pattern.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let raw = pattern.trim().to_string();
        let kind = if raw.chars().all(|c| c == WILDCARD) && !raw.is_empty() {
            PatternKind::Any
        } else if raw.contains(WILDCARD) {
            PatternKind::Wildcard(raw.split(WILDCARD).map(str::to_string).collect())
        } else if raw.ends_with('.') {
            PatternKind::Prefix
        } else {
            PatternKind::Exact
        };
        NamePattern { raw, kind }
    }

    /// The pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the pattern matches every name.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.kind == PatternKind::Any
    }

    /// Returns `true` if `name` matches this pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match &self.kind {
            PatternKind::Any => true,
            PatternKind::Prefix => name.starts_with(&self.raw),
            PatternKind::Exact => {
                name == self.raw
                    || (name.len() > self.raw.len()
                        && name.starts_with(&self.raw)
                        && name.as_bytes()[self.raw.len()] == b'.')
            }
            PatternKind::Wildcard(segments) => wildcard_match(segments, name),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for NamePattern {
    fn from(pattern: &str) -> Self {
        NamePattern::new(pattern)
    }
}

impl From<String> for NamePattern {
    fn from(pattern: String) -> Self {
        NamePattern::new(&pattern)
    }
}

/// Matches `name` against the literal segments between wildcards.
///
/// `segments` comes from splitting on `*`, so it has at least two elements; the first
/// anchors the start and the last anchors the end (either may be empty).
fn wildcard_match(segments: &[String], name: &str) -> bool {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return false;
    };
    if !name.starts_with(first.as_str()) {
        return false;
    }

    let mut rest = &name[first.len()..];
    for middle in &segments[1..segments.len() - 1] {
        match rest.find(middle.as_str()) {
            Some(index) => rest = &rest[index + middle.len()..],
            None => return false,
        }
    }
    rest.ends_with(last.as_str())
}

/// An ordered list of [`NamePattern`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternList {
    patterns: Vec<NamePattern>,
}

impl PatternList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pattern.
    pub fn push<P: Into<NamePattern>>(&mut self, pattern: P) {
        self.patterns.push(pattern.into());
    }

    /// Returns `true` if any pattern matches `name`.
    #[must_use]
    pub fn matches_any(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Returns `true` if the list holds a match-all pattern.
    #[must_use]
    pub fn has_match_all(&self) -> bool {
        self.patterns.iter().any(NamePattern::is_match_all)
    }

    /// Iterates the patterns in order.
    pub fn iter(&self) -> std::slice::Iter<'_, NamePattern> {
        self.patterns.iter()
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<P: Into<NamePattern>> FromIterator<P> for PatternList {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        PatternList {
            patterns: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PatternList {
    type Item = &'a NamePattern;
    type IntoIter = std::slice::Iter<'a, NamePattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}
