//! Built-in classification rules.
//!
//! Each rule is registered once in [`builtin_rules`] and takes its parameters
//! from the [`TriageConfig`](crate::config::TriageConfig) carried by the
//! [`RuleContext`].

use super::{Rule, RuleContext, Tag};
use crate::inventory::RepositoryRecord;

/// The built-in rule table.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ExplicitKeepRule),
        Box::new(PatternRule),
        Box::new(ForkRule),
        Box::new(ActivityRule),
        Box::new(DescriptionQualityRule),
    ]
}

/// Tags `ExplicitKeep` when the name is on the allowlist (exact, case-sensitive).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitKeepRule;

impl Rule for ExplicitKeepRule {
    fn name(&self) -> &str {
        "allowlist"
    }

    fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Option<Tag> {
        ctx.config
            .is_allowlisted(&record.name)
            .then_some(Tag::ExplicitKeep)
    }
}

/// Tags `TemplateOrDemo` for scaffolding, template and demo repositories.
///
/// Fires when the name or description contains a keyword, when a topic equals
/// a keyword, or when the name matches a configured pattern. All comparisons
/// ignore case.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRule;

impl Rule for PatternRule {
    fn name(&self) -> &str {
        "template-pattern"
    }

    fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Option<Tag> {
        let keywords = ctx.config.template_keywords();
        let name = record.name.to_lowercase();
        let description = record.description.to_lowercase();

        let keyword_hit = keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()) || description.contains(keyword.as_str()));
        let topic_hit = record
            .topics
            .iter()
            .any(|topic| keywords.contains(&topic.to_lowercase()));
        let pattern_hit = ctx
            .config
            .template_name_patterns()
            .iter()
            .any(|pattern| pattern.is_match(&record.name));

        (keyword_hit || topic_hit || pattern_hit).then_some(Tag::TemplateOrDemo)
    }
}

/// Tags `Fork` for forks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkRule;

impl Rule for ForkRule {
    fn name(&self) -> &str {
        "fork"
    }

    fn evaluate(&self, record: &RepositoryRecord, _ctx: &RuleContext<'_>) -> Option<Tag> {
        record.is_fork.then_some(Tag::Fork)
    }
}

/// Tags `Inactive` when the last push is strictly older than the threshold.
///
/// A repository pushed exactly `threshold` ago is still active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityRule;

impl Rule for ActivityRule {
    fn name(&self) -> &str {
        "activity"
    }

    fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Option<Tag> {
        let idle = ctx.now.signed_duration_since(record.pushed_at);
        (idle > ctx.config.inactivity_threshold()).then_some(Tag::Inactive)
    }
}

/// Tags `PoorDescription` for empty, placeholder or too-short descriptions.
///
/// Length is counted in characters of the trimmed description.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionQualityRule;

impl Rule for DescriptionQualityRule {
    fn name(&self) -> &str {
        "description-quality"
    }

    fn evaluate(&self, record: &RepositoryRecord, ctx: &RuleContext<'_>) -> Option<Tag> {
        let description = record.description.trim();
        let poor = description.is_empty()
            || ctx
                .config
                .description_placeholders()
                .contains(&description.to_lowercase())
            || description.chars().count() < ctx.config.min_description_length();
        poor.then_some(Tag::PoorDescription)
    }
}
