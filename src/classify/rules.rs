//! Pure rule evaluators for the classification cascade.
//!
//! Everything here is a deterministic function of an item's text and the
//! configured tables. The engine owns ordering and short-circuiting; these
//! functions own matching.

use crate::config::{CatalogConfig, FocusHeuristic};
use crate::core::CategoryId;

/// Outcome of evaluating one rule against one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleDecision {
    /// The rule yields a single category; evaluation stops.
    Decided(CategoryId),
    /// The rule supports several categories; not decisive.
    Candidates(Vec<CategoryId>),
    /// The rule has nothing to say about this item.
    NoMatch,
}

/// One category's routing-table match against an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The matched category.
    pub category: CategoryId,
    /// How many configured keywords matched.
    pub count: usize,
    /// Byte offset of the earliest keyword hit.
    pub first_pos: usize,
}

/// Match an item's text against the catalog routing table.
///
/// Returns one entry per category with at least one keyword hit, in
/// catalog order. Matching is case-insensitive substring.
pub fn routing_matches(text: &str, catalog: &CatalogConfig) -> Vec<RouteMatch> {
    let lower = text.to_lowercase();
    let mut matches = Vec::new();

    for spec in &catalog.categories {
        let mut count = 0;
        let mut first_pos = usize::MAX;
        for keyword in &spec.keywords {
            let kw = keyword.to_lowercase();
            if kw.is_empty() {
                continue;
            }
            if let Some(pos) = lower.find(&kw) {
                count += 1;
                first_pos = first_pos.min(pos);
            }
        }
        if count > 0 {
            matches.push(RouteMatch {
                category: CategoryId::new(&spec.id),
                count,
                first_pos,
            });
        }
    }

    matches
}

/// The primary routing-table rule.
///
/// Decisive iff exactly one category matches.
pub fn primary_routing(text: &str, catalog: &CatalogConfig) -> RuleDecision {
    let matches = routing_matches(text, catalog);
    match matches.len() {
        0 => RuleDecision::NoMatch,
        1 => RuleDecision::Decided(matches[0].category.clone()),
        _ => RuleDecision::Candidates(matches.into_iter().map(|m| m.category).collect()),
    }
}

/// Whether any heuristic term occurs in the text (case-insensitive).
pub fn heuristic_hits(text: &str, heuristic: &FocusHeuristic) -> bool {
    let lower = text.to_lowercase();
    heuristic
        .terms
        .iter()
        .any(|t| !t.is_empty() && lower.contains(&t.to_lowercase()))
}

/// Whether the text contains a plausible four-digit year (1000-2099).
pub fn contains_year(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|tok| tok.len() == 4)
        .filter_map(|tok| tok.parse::<u32>().ok())
        .any(|year| (1000..=2099).contains(&year))
}

/// A secondary focus heuristic: decisive for its target category when it
/// hits. The period heuristic additionally treats year tokens as hits.
pub fn secondary_focus(
    text: &str,
    heuristic: &FocusHeuristic,
    year_sensitive: bool,
) -> RuleDecision {
    let hit = heuristic_hits(text, heuristic) || (year_sensitive && contains_year(text));
    if hit {
        RuleDecision::Decided(CategoryId::new(&heuristic.category))
    } else {
        RuleDecision::NoMatch
    }
}

/// Tertiary best-foundation test: the category whose routing keyword
/// appears earliest in the text. Decisive only for a unique earliest hit.
pub fn tertiary_best_foundation(matches: &[RouteMatch]) -> RuleDecision {
    if matches.is_empty() {
        return RuleDecision::NoMatch;
    }
    let best = matches.iter().map(|m| m.first_pos).min().unwrap_or(usize::MAX);
    let earliest: Vec<&RouteMatch> = matches.iter().filter(|m| m.first_pos == best).collect();
    if earliest.len() == 1 {
        RuleDecision::Decided(earliest[0].category.clone())
    } else {
        RuleDecision::NoMatch
    }
}

/// Tertiary dominance test: the category with strictly the highest keyword
/// match count. Decisive only when one category dominates all others.
pub fn tertiary_dominance(matches: &[RouteMatch]) -> RuleDecision {
    if matches.is_empty() {
        return RuleDecision::NoMatch;
    }
    let top = matches.iter().map(|m| m.count).max().unwrap_or(0);
    let dominant: Vec<&RouteMatch> = matches.iter().filter(|m| m.count == top).collect();
    if dominant.len() == 1 {
        RuleDecision::Decided(dominant[0].category.clone())
    } else {
        RuleDecision::NoMatch
    }
}

/// Tertiary forced choice: always decides.
///
/// Takes the first routing candidate in catalog order, then the first
/// secondary support, then the first catalog entry. "No match" is not a
/// valid terminal state for classification.
pub fn tertiary_forced_choice(
    matches: &[RouteMatch],
    secondary_supports: &[CategoryId],
    catalog: &CatalogConfig,
) -> RuleDecision {
    if let Some(m) = matches.first() {
        return RuleDecision::Decided(m.category.clone());
    }
    for spec in &catalog.categories {
        if secondary_supports.iter().any(|c| c.as_str() == spec.id) {
            return RuleDecision::Decided(CategoryId::new(&spec.id));
        }
    }
    match catalog.categories.first() {
        Some(spec) => RuleDecision::Decided(CategoryId::new(&spec.id)),
        None => RuleDecision::NoMatch,
    }
}

/// Extract the term an item defines, if its text has a definition shape.
///
/// Recognized shapes: `<term> is/are/means ...` and `<term>: ...`, with a
/// term of at most four words.
pub fn definition_term(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if let Some(idx) = trimmed.find(':') {
        Some(&trimmed[..idx])
    } else {
        [" is ", " are ", " means "]
            .iter()
            .filter_map(|sep| trimmed.find(sep))
            .min()
            .map(|idx| &trimmed[..idx])
    };

    let term = candidate?.trim();
    let words = term.split_whitespace().count();
    if term.is_empty() || words > 4 {
        return None;
    }
    Some(term.to_string())
}
