//! Property-based tests for the classify/reconcile core.
//!
//! These tests use proptest to generate random inventories and verify that
//! the partition invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    use crate::config::TriageConfig;
    use crate::inventory::{RawEntry, RawSnapshot};
    use crate::pipeline;
    use crate::reconcile::{reconcile, resolve, Disposition, PRECEDENCE};
    use crate::rules::{ClassificationResult, RuleEngine, Tag, TagSet};
    use crate::source::StaticSource;

    fn now() -> DateTime<Utc> {
        "2024-02-01T00:00:00Z".parse().unwrap()
    }

    fn arb_tags() -> impl Strategy<Value = TagSet> {
        proptest::collection::btree_set(proptest::sample::select(Tag::ALL.to_vec()), 0..=5)
    }

    fn arb_classification() -> impl Strategy<Value = ClassificationResult> {
        proptest::collection::btree_map("[a-z][a-z0-9-]{0,11}", arb_tags(), 0..40)
            .prop_map(|tags| tags.into_iter().collect::<ClassificationResult>())
    }

    fn arb_entry() -> impl Strategy<Value = (bool, String, i64)> {
        (
            any::<bool>(),
            proptest::sample::select(vec![
                "",
                "private",
                "short one",
                "An example of a sample app",
                "Production billing service for the shop",
            ])
            .prop_map(str::to_string),
            0i64..120,
        )
    }

    fn arb_snapshot() -> impl Strategy<Value = RawSnapshot> {
        proptest::collection::btree_map("[a-z][a-z0-9-]{0,11}", arb_entry(), 0..30).prop_map(
            |entries: BTreeMap<String, (bool, String, i64)>| {
                RawSnapshot::new(
                    entries
                        .into_iter()
                        .map(|(name, (is_fork, description, days))| RawEntry {
                            name: Some(name),
                            description: Some(description),
                            is_fork: Some(is_fork),
                            pushed_at: Some((now() - Duration::days(days)).to_rfc3339()),
                            ..RawEntry::default()
                        })
                        .collect(),
                )
            },
        )
    }

    proptest! {
        /// Property: every classified name lands in exactly one section
        #[test]
        fn reconcile_is_total_and_disjoint(classification in arb_classification()) {
            let partition = reconcile(&classification).unwrap();

            prop_assert_eq!(partition.len(), classification.len());
            let mut seen = BTreeSet::new();
            for name in partition.keep().iter().chain(partition.tiers().iter().flat_map(|g| g.repositories.iter())) {
                prop_assert!(seen.insert(name.clone()), "'{}' listed twice", name);
            }
            let expected: BTreeSet<String> = classification.names().map(str::to_string).collect();
            prop_assert_eq!(seen, expected);
        }

        /// Property: the allowlist tag always wins
        #[test]
        fn explicit_keep_always_keeps(mut tags in arb_tags()) {
            tags.insert(Tag::ExplicitKeep);
            prop_assert_eq!(resolve(&tags), Disposition::Keep);
        }

        /// Property: the resolved disposition is the first precedence entry present
        #[test]
        fn resolve_follows_precedence(tags in arb_tags()) {
            let expected = PRECEDENCE
                .iter()
                .find(|(tag, _)| tags.contains(tag))
                .map(|(_, disposition)| *disposition)
                .unwrap_or(Disposition::Keep);
            prop_assert_eq!(resolve(&tags), expected);
        }

        /// Property: the same snapshot and reference time give the same partition
        #[test]
        fn pipeline_is_idempotent(snapshot in arb_snapshot()) {
            let config = TriageConfig::default();
            let engine = RuleEngine::with_builtin_rules();
            let source = StaticSource::new(snapshot);

            let first = pipeline::run(&source, &config, &engine, Some(now())).unwrap();
            let second = pipeline::run(&source, &config, &engine, Some(now())).unwrap();
            prop_assert_eq!(&first.partition, &second.partition);
            prop_assert_eq!(first.report.render_text(&Default::default()), second.report.render_text(&Default::default()));
        }

        /// Property: snapshot order never changes the partition
        #[test]
        fn pipeline_ignores_snapshot_order(snapshot in arb_snapshot()) {
            let config = TriageConfig::default();
            let engine = RuleEngine::with_builtin_rules();

            let mut reversed = snapshot.clone();
            reversed.repositories.reverse();

            let forward = pipeline::run(&StaticSource::new(snapshot), &config, &engine, Some(now())).unwrap();
            let backward = pipeline::run(&StaticSource::new(reversed), &config, &engine, Some(now())).unwrap();
            prop_assert_eq!(forward.partition, backward.partition);
        }
    }
}
