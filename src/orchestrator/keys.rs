//! Structured cache keys and invalidation patterns.
//!
//! A key is a namespace followed by ordered segments, rendered as
//! `namespace:seg1:seg2`. Segments are sanitized so they never contain the
//! `:` delimiter, which makes the rendered form splittable back into the
//! exact segment list.

use std::fmt;

/// Segment delimiter in rendered keys.
pub const KEY_DELIMITER: char = ':';

/// Pattern segment matching any single key segment.
pub const WILDCARD: &str = "*";

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// == Cache Key ==
/// A namespace plus sanitized segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    segments: Vec<String>,
}

impl CacheKey {
    /// Starts a key in `namespace`. The namespace is taken as-is.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            segments: Vec::new(),
        }
    }

    /// Appends one sanitized segment.
    #[must_use]
    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.segments.push(sanitize_segment(&part.to_string()));
        self
    }

    /// Appends several sanitized segments.
    #[must_use]
    pub fn with_all<I>(self, parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        parts.into_iter().fold(self, |key, part| key.with(part))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)?;
        for segment in &self.segments {
            write!(f, "{}{}", KEY_DELIMITER, segment)?;
        }
        Ok(())
    }
}

// == Key Pattern ==
#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Any,
}

/// Segment-prefix matcher over rendered keys.
///
/// `channel:single:42` matches `channel:single:42` and
/// `channel:single:42:members` but not `channel:single:420`. A `*` segment
/// matches exactly one key segment; trailing `*` segments are dropped, so
/// `message:channel:7:*` is the same pattern as `message:channel:7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    segments: Vec<PatternSegment>,
}

impl KeyPattern {
    /// Parses a rendered pattern. Literal segments are used verbatim, so
    /// callers building patterns from raw ids should go through
    /// `KeyPattern::from_key` or the invalidation templates instead.
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split(KEY_DELIMITER)
            .map(|segment| {
                if segment == WILDCARD {
                    PatternSegment::Any
                } else {
                    PatternSegment::Literal(segment.to_string())
                }
            })
            .collect();
        Self::trimmed(segments)
    }

    /// Pattern matching a key and everything nested under it.
    pub fn from_key(key: &CacheKey) -> Self {
        let segments = std::iter::once(key.namespace().to_string())
            .chain(key.segments().iter().cloned())
            .map(PatternSegment::Literal)
            .collect();
        Self::trimmed(segments)
    }

    pub(crate) fn from_parts(parts: Vec<Option<String>>) -> Self {
        let segments = parts
            .into_iter()
            .map(|part| match part {
                Some(literal) => PatternSegment::Literal(literal),
                None => PatternSegment::Any,
            })
            .collect();
        Self::trimmed(segments)
    }

    fn trimmed(mut segments: Vec<PatternSegment>) -> Self {
        while segments.last() == Some(&PatternSegment::Any) {
            segments.pop();
        }
        Self { segments }
    }

    /// Whether the rendered `key` falls under this pattern.
    pub fn matches(&self, key: &str) -> bool {
        if self.segments.is_empty() {
            return true;
        }
        let mut key_segments = key.split(KEY_DELIMITER);
        self.segments.iter().all(|expected| match key_segments.next() {
            Some(actual) => match expected {
                PatternSegment::Any => true,
                PatternSegment::Literal(literal) => literal == actual,
            },
            None => false,
        })
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", KEY_DELIMITER)?;
            }
            match segment {
                PatternSegment::Literal(literal) => f.write_str(literal)?,
                PatternSegment::Any => f.write_str(WILDCARD)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        KeyPattern::parse(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_rendering() {
        let key = CacheKey::new("message").with("channel").with("c1").with(20).with(0);
        assert_eq!(key.to_string(), "message:channel:c1:20:0");
    }

    #[test]
    fn test_key_without_parts_is_bare_namespace() {
        assert_eq!(CacheKey::new("user").to_string(), "user");
    }

    #[test]
    fn test_segments_are_sanitized() {
        let key = CacheKey::new("user").with("search").with("a:b c/é");
        assert_eq!(key.to_string(), "user:search:a_b_c__");
        assert_eq!(key.segments()[1], "a_b_c__");
    }

    #[test]
    fn test_empty_segment_kept() {
        let key = CacheKey::new("channel").with("search").with("q").with("");
        assert_eq!(key.to_string(), "channel:search:q:");
    }

    #[test]
    fn test_pattern_segment_prefix_match() {
        let pattern = KeyPattern::parse("user:1");
        assert!(pattern.matches("user:1"));
        assert!(pattern.matches("user:1:profile"));
        assert!(!pattern.matches("user:10:profile"));
        assert!(!pattern.matches("user:2:profile"));
        assert!(!pattern.matches("channel:1:info"));
        assert!(!pattern.matches("user"));
    }

    #[test]
    fn test_pattern_interior_wildcard() {
        let pattern = KeyPattern::parse("message:*:c1");
        assert!(pattern.matches("message:channel:c1:20:0"));
        assert!(pattern.matches("message:stats:c1:u1"));
        assert!(!pattern.matches("message:channel:c2"));
    }

    #[test]
    fn test_trailing_wildcards_dropped() {
        assert_eq!(
            KeyPattern::parse("notification:user:u1:*"),
            KeyPattern::parse("notification:user:u1")
        );
        assert_eq!(KeyPattern::parse("message:search:*").to_string(), "message:search");
    }

    #[test]
    fn test_pattern_from_key() {
        let key = CacheKey::new("channel").with("single").with("c#1");
        let pattern = KeyPattern::from_key(&key);
        assert!(pattern.matches("channel:single:c_1"));
        assert!(pattern.matches("channel:single:c_1:members"));
        assert!(!pattern.matches("channel:single:c_10"));
    }

    proptest! {
        #[test]
        fn prop_sanitized_segments_never_contain_delimiter(raw in ".{0,40}") {
            let clean = sanitize_segment(&raw);
            prop_assert!(!clean.contains(KEY_DELIMITER));
            prop_assert_eq!(clean.chars().count(), raw.chars().count());
        }

        #[test]
        fn prop_key_matches_its_own_pattern(
            ns in "[a-z]{1,8}",
            parts in prop::collection::vec(".{0,12}", 0..5),
            extra in "[a-z0-9]{1,6}",
        ) {
            let key = CacheKey::new(ns).with_all(parts.iter());
            let pattern = KeyPattern::from_key(&key);
            let nested = key.clone().with(extra);

            prop_assert!(pattern.matches(&key.to_string()));
            prop_assert!(pattern.matches(&nested.to_string()));
        }

        #[test]
        fn prop_distinct_ids_do_not_collide(a in "[a-z0-9]{1,8}", b in "[a-z0-9]{1,8}") {
            prop_assume!(a != b);
            let key_a = CacheKey::new("channel").with("single").with(&a);
            let pattern_b = KeyPattern::from_key(&CacheKey::new("channel").with("single").with(&b));
            prop_assert!(!pattern_b.matches(&key_a.to_string()));
        }
    }
}
