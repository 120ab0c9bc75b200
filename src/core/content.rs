//! Content units and validation findings.
//!
//! A `ContentUnit` is a generated artifact for one category, made of named
//! text fields. Validators measure its fields against the configured limits
//! table and report `Violation`s that carry both the measured value and the
//! limit, so messages are self-explanatory downstream.

use serde::{Deserialize, Serialize};

use crate::core::item::CategoryId;
use crate::util::word_count;

/// Declared type of a content unit, from a small fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Category-level overview.
    Overview,
    /// Single-concept teaching unit.
    Concept,
    /// Practice/drill unit.
    Drill,
    /// Category-level recap.
    Summary,
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnitType::Overview => "overview",
            UnitType::Concept => "concept",
            UnitType::Drill => "drill",
            UnitType::Summary => "summary",
        };
        f.write_str(s)
    }
}

/// One named text field of a content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentField {
    /// Field name, e.g. `"header"` or `"body"`.
    pub name: String,
    /// Raw lines of the field, including any blank lines.
    pub lines: Vec<String>,
}

impl ContentField {
    /// Create a field from a name and lines.
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lines,
        }
    }

    /// Create a field by splitting a text block on newlines.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, text.lines().map(|l| l.to_string()).collect())
    }

    /// Count of non-empty lines.
    ///
    /// Blank lines are layout, not content; limits apply to content lines.
    pub fn line_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.trim().is_empty()).count()
    }

    /// Total word count across all lines.
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| word_count(l)).sum()
    }

    /// The field joined back into one text block.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A generated artifact associated with one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Category the unit belongs to.
    pub category: CategoryId,
    /// Declared unit type.
    pub unit_type: UnitType,
    /// Named fields in declaration order.
    pub fields: Vec<ContentField>,
}

impl ContentUnit {
    /// Create a new content unit.
    pub fn new(category: CategoryId, unit_type: UnitType) -> Self {
        Self {
            category,
            unit_type,
            fields: Vec::new(),
        }
    }

    /// Add a field, builder style.
    pub fn with_field(mut self, field: ContentField) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&ContentField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Severity of a validation finding.
///
/// One enum threaded through every component: `Error` blocks acceptance,
/// `Warning` is advisory and only matters if it tips a weighted score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory; does not block acceptance on its own.
    #[default]
    Warning,
    /// Blocks acceptance.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        f.write_str(s)
    }
}

/// Identifies the check a violation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Field has more lines than the configured maximum.
    LineCount,
    /// A line exceeds the configured character maximum.
    LineLength,
    /// A required field is absent or empty.
    RequiredField,
    /// Field word count is outside the configured range.
    WordCount,
    /// A required marker token appears fewer times than the minimum.
    MarkerCount,
    /// Special-item count is below the band minimum.
    QuotaMinimum,
    /// Special-item count is outside the band target range.
    QuotaTarget,
    /// All special items share one sub-type.
    QuotaDiversity,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuleKind::LineCount => "line-count",
            RuleKind::LineLength => "line-length",
            RuleKind::RequiredField => "required-field",
            RuleKind::WordCount => "word-count",
            RuleKind::MarkerCount => "marker-count",
            RuleKind::QuotaMinimum => "quota-minimum",
            RuleKind::QuotaTarget => "quota-target",
            RuleKind::QuotaDiversity => "quota-diversity",
        };
        f.write_str(s)
    }
}

/// Result of a failed check against a content unit or collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Where the violation was found, e.g. `"concept/body"` or
    /// `"concept/body:9"` for a specific line.
    pub location: String,
    /// The check that produced the violation.
    pub rule: RuleKind,
    /// Severity of the finding.
    pub severity: Severity,
    /// Human-readable message embedding measured value and limit.
    pub message: String,
    /// Measured value, when numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<u64>,
    /// Configured limit, when numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Violation {
    /// Create an error-severity violation.
    pub fn error(location: impl Into<String>, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            rule,
            severity: Severity::Error,
            message: message.into(),
            measured: None,
            limit: None,
        }
    }

    /// Create a warning-severity violation.
    pub fn warning(
        location: impl Into<String>,
        rule: RuleKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            rule,
            severity: Severity::Warning,
            message: message.into(),
            measured: None,
            limit: None,
        }
    }

    /// Attach the measured value and the limit it was checked against.
    pub fn with_measured(mut self, measured: u64, limit: u64) -> Self {
        self.measured = Some(measured);
        self.limit = Some(limit);
        self
    }
}
