//! Declarative invalidation maps.
//!
//! Each use-case service lists, per mutation, the key pattern templates that
//! a successful mutation makes stale. Templates are colon-separated segments
//! where `{name}` is replaced by the sanitized parameter of that name and `*`
//! matches any one segment. A placeholder without a supplied parameter
//! renders as `*`.

use std::fmt::Debug;

use crate::orchestrator::keys::{sanitize_segment, KeyPattern, KEY_DELIMITER, WILDCARD};

/// Static `mutation -> [pattern template]` table for one service.
#[derive(Debug)]
pub struct InvalidationMap<M: 'static> {
    rules: &'static [(M, &'static [&'static str])],
}

impl<M> InvalidationMap<M>
where
    M: Copy + PartialEq + Debug + 'static,
{
    pub const fn new(rules: &'static [(M, &'static [&'static str])]) -> Self {
        Self { rules }
    }

    /// Raw templates registered for `mutation`, empty when none are.
    pub fn templates(&self, mutation: M) -> &'static [&'static str] {
        self.rules
            .iter()
            .find(|(m, _)| *m == mutation)
            .map(|(_, templates)| *templates)
            .unwrap_or(&[])
    }

    /// Every mutation that has at least one template.
    pub fn mutations(&self) -> impl Iterator<Item = M> + '_ {
        self.rules.iter().map(|(m, _)| *m)
    }

    /// Renders the patterns for `mutation` with the given parameters.
    pub fn patterns_for(&self, mutation: M, params: &[(&str, &str)]) -> Vec<KeyPattern> {
        self.templates(mutation)
            .iter()
            .map(|template| render_template(template, params))
            .collect()
    }
}

/// Renders one template into a pattern.
pub fn render_template(template: &str, params: &[(&str, &str)]) -> KeyPattern {
    let parts = template
        .split(KEY_DELIMITER)
        .map(|segment| {
            if segment == WILDCARD {
                return None;
            }
            match placeholder_name(segment) {
                Some(name) => params
                    .iter()
                    .find(|(param, _)| *param == name)
                    .map(|(_, value)| sanitize_segment(value)),
                None => Some(segment.to_string()),
            }
        })
        .collect();
    KeyPattern::from_parts(parts)
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::orchestrator::{CacheKey, CacheOrchestrator};
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Update,
        Delete,
        Untracked,
    }

    static MAP: InvalidationMap<Op> = InvalidationMap::new(&[
        (Op::Update, &["thing:single:{id}", "thing:list"]),
        (Op::Delete, &["thing:single:{id}", "thing:owner:{owner}:*", "thing:stats"]),
    ]);

    #[test]
    fn test_placeholders_substituted() {
        let patterns = MAP.patterns_for(Op::Update, &[("id", "42")]);
        let rendered: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["thing:single:42", "thing:list"]);
    }

    #[test]
    fn test_parameters_sanitized_like_keys() {
        let patterns = MAP.patterns_for(Op::Update, &[("id", "a:b")]);
        assert!(patterns[0].matches("thing:single:a_b"));
        assert!(!patterns[0].matches("thing:single:a"));
    }

    #[test]
    fn test_missing_parameter_becomes_wildcard() {
        let patterns = MAP.patterns_for(Op::Delete, &[("id", "1")]);
        assert_eq!(patterns[1].to_string(), "thing:owner");
        assert!(patterns[1].matches("thing:owner:anyone:10:0"));
    }

    #[test]
    fn test_unregistered_mutation_has_no_patterns() {
        assert!(MAP.patterns_for(Op::Untracked, &[]).is_empty());
        assert_eq!(MAP.mutations().count(), 2);
    }

    #[test]
    fn test_render_template_literal_only() {
        let pattern = render_template("real_time:*", &[]);
        assert!(pattern.matches("real_time:anything"));
        assert_eq!(pattern.to_string(), "real_time");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Invalidating one entity's views leaves every other entity's keys.
        #[test]
        fn prop_invalidation_stays_within_entity(
            target in "[a-z0-9]{1,6}",
            others in prop::collection::vec("[a-z0-9]{1,6}", 1..8),
        ) {
            let cache = CacheOrchestrator::new(MemoryBackend::new(100));
            let survivors: Vec<&String> = others.iter().filter(|id| **id != target).collect();

            tokio_test::block_on(async {
                for id in others.iter().chain(std::iter::once(&target)) {
                    let key = CacheKey::new("thing").with("single").with(id);
                    cache.set_cached(&key.to_string(), &true, 60).await;
                }
                let patterns = MAP.patterns_for(Op::Update, &[("id", target.as_str())]);
                cache.invalidate_patterns(&patterns).await;

                let keys = cache.get_cache_stats().await.keys;
                let invalidated = format!("thing:single:{}", target);
                prop_assert!(!keys.contains(&invalidated));
                for id in &survivors {
                    let expected = format!("thing:single:{}", id);
                    prop_assert!(keys.contains(&expected));
                }
                Ok(())
            })?;
        }
    }
}
