//! The classification engine.
//!
//! Owns cascade ordering, flag derivation, and batch-level invariants.
//! Rules themselves live in [`crate::classify::rules`] as pure functions.

use std::collections::{BTreeMap, HashSet};

use crate::classify::rules::{
    self, definition_term, routing_matches, RouteMatch, RuleDecision,
};
use crate::config::Config;
use crate::core::{Assignment, CategoryId, Flag, Item, RuleId, RuleTier};
use crate::error::{LecternError, Result};

/// Batch-level contextual data used for flag derivation.
///
/// Holds the full item set so dependency discovery (frontload detection)
/// can see every other item.
pub struct BatchContext<'a> {
    items: &'a [Item],
}

impl<'a> BatchContext<'a> {
    /// Build context over a batch of items.
    pub fn new(items: &'a [Item]) -> Self {
        Self { items }
    }

    /// Whether any other item references a term this item defines.
    pub fn defines_depended_term(&self, item: &Item) -> bool {
        let Some(term) = definition_term(&item.text) else {
            return false;
        };
        let term_lower = term.to_lowercase();
        self.items
            .iter()
            .filter(|other| other.id != item.id)
            .any(|other| other.text.to_lowercase().contains(&term_lower))
    }
}

/// Result of classifying a full batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchOutcome {
    /// One assignment per input item, in input order.
    pub assignments: Vec<Assignment>,
    /// Items per category, every catalog category present.
    pub counts: BTreeMap<CategoryId, usize>,
    /// Categories below their minimum population, for reviewer attention.
    pub underpopulated: Vec<CategoryId>,
}

/// The rule-engine classifier.
///
/// All decisions are deterministic functions of the item text and the
/// injected configuration; re-running an unchanged batch yields identical
/// assignments and flags.
pub struct Classifier<'a> {
    config: &'a Config,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over a validated configuration.
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Classify a single item.
    ///
    /// Always terminates with exactly one category; the final tertiary
    /// rule is a forced choice.
    pub fn classify(&self, item: &Item, context: &BatchContext<'_>) -> Result<Assignment> {
        let matches = routing_matches(&item.text, &self.config.catalog);
        let (category, decided_by) = self.run_cascade(item, &matches)?;

        let mut assignment = Assignment::new(item.id, category.clone(), decided_by);

        // Flag derivation is independent of the category decision: tier
        // supports are computed without the cascade's short-circuiting.
        if context.defines_depended_term(item) {
            assignment.flags.push(Flag::Frontload);
        }

        let primary_support: Vec<CategoryId> =
            matches.iter().map(|m| m.category.clone()).collect();
        let secondary_support = self.secondary_supports(item);

        if let Some(runner_up) =
            self.cross_tier_runner_up(&category, &primary_support, &secondary_support)
        {
            let rationale = format!(
                "tie between '{}' and '{}' resolved by {}",
                category, runner_up, assignment.decided_by
            );
            assignment.flags.push(Flag::Ambiguous {
                runner_up,
                rationale,
            });
        }

        if let Some(other) = matches
            .iter()
            .map(|m| &m.category)
            .find(|c| **c != category)
        {
            if matches.len() >= 2 {
                assignment.flags.push(Flag::Xref {
                    other: other.clone(),
                });
            }
        }

        Ok(assignment)
    }

    /// Classify a whole batch, enforcing batch-level invariants.
    ///
    /// Any rule fault aborts the batch; partial assignments are never
    /// returned downstream.
    pub fn classify_batch(&self, items: &[Item]) -> Result<BatchOutcome> {
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.id) {
                return Err(LecternError::classification(
                    "batch/ingest",
                    format!("duplicate item id {}", item.id),
                ));
            }
        }

        let context = BatchContext::new(items);
        let assignments: Vec<Assignment> = items
            .iter()
            .map(|item| self.classify(item, &context))
            .collect::<Result<_>>()?;

        if assignments.len() != items.len() {
            return Err(LecternError::classification(
                "batch/coverage",
                format!(
                    "assigned {} of {} items",
                    assignments.len(),
                    items.len()
                ),
            ));
        }

        let mut counts: BTreeMap<CategoryId, usize> = self
            .config
            .catalog
            .categories
            .iter()
            .map(|c| (CategoryId::new(&c.id), 0))
            .collect();
        for assignment in &assignments {
            *counts.entry(assignment.category.clone()).or_insert(0) += 1;
        }

        let mut underpopulated = Vec::new();
        for spec in &self.config.catalog.categories {
            let id = CategoryId::new(&spec.id);
            let count = counts.get(&id).copied().unwrap_or(0);
            if count < spec.min_population {
                tracing::warn!(
                    category = %id,
                    count,
                    minimum = spec.min_population,
                    "category below minimum population"
                );
                underpopulated.push(id);
            }
        }

        Ok(BatchOutcome {
            assignments,
            counts,
            underpopulated,
        })
    }

    /// Run the ordered cascade; first decisive rule wins.
    fn run_cascade(&self, item: &Item, matches: &[RouteMatch]) -> Result<(CategoryId, RuleId)> {
        let catalog = &self.config.catalog;
        let h = &self.config.heuristics;

        // Tier targets must exist in the catalog; a mismatch is a rule
        // implementation fault and aborts the batch.
        for (name, target) in [
            ("technique-focus", &h.technique.category),
            ("period-focus", &h.period.category),
            ("population-focus", &h.population.category),
        ] {
            if !catalog.contains(target) {
                return Err(LecternError::classification(
                    format!("secondary/{}", name),
                    format!("target category '{}' is not in the catalog", target),
                ));
            }
        }

        let text = item.text.as_str();
        type RuleFn<'b> = Box<dyn Fn() -> RuleDecision + 'b>;
        let cascade: Vec<(RuleTier, &str, RuleFn<'_>)> = vec![
            (
                RuleTier::Primary,
                "routing-table",
                Box::new(move || rules::primary_routing(text, catalog)),
            ),
            (
                RuleTier::Secondary,
                "technique-focus",
                Box::new(move || rules::secondary_focus(text, &h.technique, false)),
            ),
            (
                RuleTier::Secondary,
                "period-focus",
                Box::new(move || rules::secondary_focus(text, &h.period, true)),
            ),
            (
                RuleTier::Secondary,
                "population-focus",
                Box::new(move || rules::secondary_focus(text, &h.population, false)),
            ),
            (
                RuleTier::Tertiary,
                "best-foundation",
                Box::new(move || rules::tertiary_best_foundation(matches)),
            ),
            (
                RuleTier::Tertiary,
                "dominance",
                Box::new(move || rules::tertiary_dominance(matches)),
            ),
            (
                RuleTier::Tertiary,
                "forced-choice",
                Box::new(move || {
                    rules::tertiary_forced_choice(
                        matches,
                        &self.secondary_supports(item),
                        catalog,
                    )
                }),
            ),
        ];

        // Declared order is the authoritative priority: the first decisive
        // rule wins and later tiers are never consulted.
        for (tier, name, eval) in &cascade {
            if let RuleDecision::Decided(category) = eval() {
                return Ok((category, RuleId::new(*tier, *name)));
            }
        }

        // Forced choice only yields NoMatch on an empty catalog, which
        // config validation rejects before a classifier can be built.
        Err(LecternError::classification(
            "tertiary/forced-choice",
            "empty category catalog",
        ))
    }

    /// Categories the secondary tier supports for this item, in catalog
    /// order, independent of cascade short-circuiting.
    fn secondary_supports(&self, item: &Item) -> Vec<CategoryId> {
        let h = &self.config.heuristics;
        let mut supported = HashSet::new();

        if rules::heuristic_hits(&item.text, &h.technique) {
            supported.insert(h.technique.category.clone());
        }
        if rules::heuristic_hits(&item.text, &h.period) || rules::contains_year(&item.text) {
            supported.insert(h.period.category.clone());
        }
        if rules::heuristic_hits(&item.text, &h.population) {
            supported.insert(h.population.category.clone());
        }

        self.config
            .catalog
            .categories
            .iter()
            .filter(|c| supported.contains(&c.id))
            .map(|c| CategoryId::new(&c.id))
            .collect()
    }

    /// The runner-up category when two tiers supported different
    /// categories, or `None` when there was no cross-tier disagreement.
    fn cross_tier_runner_up(
        &self,
        decided: &CategoryId,
        primary: &[CategoryId],
        secondary: &[CategoryId],
    ) -> Option<CategoryId> {
        let disagree = primary
            .iter()
            .any(|p| secondary.iter().any(|s| s != p))
            || secondary
                .iter()
                .any(|s| primary.iter().any(|p| p != s));
        if primary.is_empty() || secondary.is_empty() || !disagree {
            return None;
        }

        // First supported category in catalog order that lost the decision
        self.config
            .catalog
            .categories
            .iter()
            .map(|c| CategoryId::new(&c.id))
            .filter(|c| c != decided)
            .find(|c| primary.contains(c) || secondary.contains(c))
    }
}
