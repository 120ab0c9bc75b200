//! Items, categories, and classification assignments.
//!
//! An `Item` is an atomic unit of source content. Classification maps each
//! item to exactly one category from the configured catalog and annotates
//! the decision with flags. Items are immutable once created.

use serde::{Deserialize, Serialize};

use crate::util::word_count;

/// Identifier of a category in the active catalog.
///
/// Categories are data, not code: the catalog lives in configuration and
/// rule logic only ever handles opaque identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    /// Create a new category identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An atomic unit of content to be classified.
///
/// The word count is always derived from the text, including on
/// deserialization, so a wire value can never drift from the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ItemWire")]
pub struct Item {
    /// Stable, unique, sequential identifier.
    pub id: u32,
    /// Raw text of the item.
    pub text: String,
    /// Whitespace-separated word count, derived at construction.
    pub word_count: usize,
}

/// Wire shape of an item; `word_count` is accepted but recomputed.
#[derive(Deserialize)]
struct ItemWire {
    id: u32,
    text: String,
    #[serde(default)]
    #[allow(dead_code)]
    word_count: usize,
}

impl From<ItemWire> for Item {
    fn from(wire: ItemWire) -> Self {
        Item::new(wire.id, wire.text)
    }
}

impl Item {
    /// Create a new item, deriving the word count from the text.
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = word_count(&text);
        Self {
            id,
            text,
            word_count,
        }
    }
}

/// The rule tier that produced a classification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    /// Coarse-grained routing-table match.
    Primary,
    /// Narrower heuristics (technique, period, population focus).
    Secondary,
    /// Explicit tie-breakers; the last one always decides.
    Tertiary,
}

impl std::fmt::Display for RuleTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuleTier::Primary => "primary",
            RuleTier::Secondary => "secondary",
            RuleTier::Tertiary => "tertiary",
        };
        f.write_str(s)
    }
}

/// Identifier of the rule that produced an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleId {
    /// Tier the rule belongs to.
    pub tier: RuleTier,
    /// Declared rule name, e.g. `"routing-table"`.
    pub name: String,
}

impl RuleId {
    /// Create a new rule identifier.
    pub fn new(tier: RuleTier, name: impl Into<String>) -> Self {
        Self {
            tier,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tier, self.name)
    }
}

/// Auxiliary annotation on an assignment.
///
/// Flags are metadata; they never change the primary category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Flag {
    /// The item defines a term another item depends on; it must be
    /// delivered before its dependents.
    Frontload,
    /// A tie between two or more categories was resolved. The rationale is
    /// mandatory and names the runner-up category.
    Ambiguous {
        runner_up: CategoryId,
        rationale: String,
    },
    /// The item has secondary relevance to another category. It is still
    /// taught exactly once, under the primary category.
    Xref { other: CategoryId },
}

impl Flag {
    /// Short tag for display output.
    pub fn tag(&self) -> &'static str {
        match self {
            Flag::Frontload => "FRONTLOAD",
            Flag::Ambiguous { .. } => "AMBIGUOUS",
            Flag::Xref { .. } => "XREF",
        }
    }
}

/// Maps one item to exactly one category.
///
/// Invariant: every item in a classified batch has exactly one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The item this assignment covers.
    pub item_id: u32,
    /// The category the item was assigned to.
    pub category: CategoryId,
    /// Auxiliary flags, in derivation order.
    pub flags: Vec<Flag>,
    /// The rule that produced the decision.
    pub decided_by: RuleId,
}

impl Assignment {
    /// Create a new assignment with no flags.
    pub fn new(item_id: u32, category: CategoryId, decided_by: RuleId) -> Self {
        Self {
            item_id,
            category,
            flags: Vec::new(),
            decided_by,
        }
    }

    /// Check whether the assignment carries a flag of the given tag.
    pub fn has_flag(&self, tag: &str) -> bool {
        self.flags.iter().any(|f| f.tag() == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_derives_word_count() {
        let item = Item::new(1, "Spaced repetition strengthens recall");
        assert_eq!(item.id, 1);
        assert_eq!(item.word_count, 4);
    }

    #[test]
    fn test_item_empty_text() {
        let item = Item::new(2, "");
        assert_eq!(item.word_count, 0);
    }

    #[test]
    fn test_category_id_display() {
        let id = CategoryId::new("foundations");
        assert_eq!(id.to_string(), "foundations");
        assert_eq!(id.as_str(), "foundations");
    }

    #[test]
    fn test_rule_id_display() {
        let id = RuleId::new(RuleTier::Secondary, "period-focus");
        assert_eq!(id.to_string(), "secondary/period-focus");
    }

    #[test]
    fn test_flag_tags() {
        assert_eq!(Flag::Frontload.tag(), "FRONTLOAD");
        assert_eq!(
            Flag::Ambiguous {
                runner_up: CategoryId::new("methods"),
                rationale: "also matched methods".to_string(),
            }
            .tag(),
            "AMBIGUOUS"
        );
        assert_eq!(
            Flag::Xref {
                other: CategoryId::new("history"),
            }
            .tag(),
            "XREF"
        );
    }

    #[test]
    fn test_assignment_has_flag() {
        let mut assignment = Assignment::new(
            1,
            CategoryId::new("foundations"),
            RuleId::new(RuleTier::Primary, "routing-table"),
        );
        assert!(!assignment.has_flag("FRONTLOAD"));

        assignment.flags.push(Flag::Frontload);
        assert!(assignment.has_flag("FRONTLOAD"));
        assert!(!assignment.has_flag("XREF"));
    }

    #[test]
    fn test_item_deserialization_recomputes_word_count() {
        let item: Item =
            serde_json::from_str(r#"{"id": 3, "text": "three short words"}"#).unwrap();
        assert_eq!(item.word_count, 3);

        // A stale wire value is ignored
        let item: Item =
            serde_json::from_str(r#"{"id": 3, "text": "three short words", "word_count": 99}"#)
                .unwrap();
        assert_eq!(item.word_count, 3);
    }

    #[test]
    fn test_flag_serde_roundtrip() {
        let flag = Flag::Ambiguous {
            runner_up: CategoryId::new("methods"),
            rationale: "matched both foundations and methods".to_string(),
        };
        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains("ambiguous"));
        let parsed: Flag = serde_json::from_str(&json).unwrap();
        assert_eq!(flag, parsed);
    }
}
