//! Weighted gate scoring.
//!
//! Dimensions carry a raw 0-100 score and a weight; the gate aggregates
//! them against configured thresholds. Automatic-fail conditions run
//! before the weighted total is trusted and force FAIL regardless of it.

use serde::{Deserialize, Serialize};

use crate::config::{GateConfig, PenaltyConfig};
use crate::core::{RuleKind, Severity, Violation};
use crate::error::{LecternError, Result};

/// Tolerance when checking that weights sum to 1.0.
const WEIGHT_EPSILON: f64 = 1e-6;

/// One weighted dimension of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCategory {
    /// Dimension identifier, matching the gate configuration.
    pub id: String,
    /// Raw score, 0-100.
    pub score: f64,
    /// Weight fraction; all weights in one evaluation sum to 1.0.
    pub weight: f64,
    /// Violations that contributed to the score.
    #[serde(default)]
    pub violations: Vec<Violation>,
}

impl ScoreCategory {
    /// Create a dimension record with no backing violations.
    pub fn new(id: impl Into<String>, score: f64, weight: f64) -> Self {
        Self {
            id: id.into(),
            score,
            weight,
            violations: Vec::new(),
        }
    }

    /// Attach the violations behind the score.
    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = violations;
        self
    }
}

/// Aggregate gate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Weighted total at or above the pass threshold, no automatic fails.
    Pass,
    /// Weighted total in the warn band, no automatic fails.
    Warn,
    /// Below the warn threshold, or any automatic fail triggered.
    Fail,
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateStatus::Pass => "PASS",
            GateStatus::Warn => "WARN",
            GateStatus::Fail => "FAIL",
        };
        f.write_str(s)
    }
}

/// A hard override that forces FAIL independent of the weighted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum AutoFail {
    /// A required structural element is entirely absent.
    RequiredElementMissing { element: String },
    /// A single dimension scored below its configured floor.
    DimensionBelowFloor {
        dimension: String,
        score: f64,
        floor: f64,
    },
}

impl std::fmt::Display for AutoFail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoFail::RequiredElementMissing { element } => {
                write!(f, "required element missing: {}", element)
            }
            AutoFail::DimensionBelowFloor {
                dimension,
                score,
                floor,
            } => write!(
                f,
                "dimension '{}' scored {:.1}, below its floor of {:.1}",
                dimension, score, floor
            ),
        }
    }
}

/// Aggregated result of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Final status after automatic-fail overrides.
    pub status: GateStatus,
    /// Weighted total, recorded even when an automatic fail overrode it.
    pub weighted_total: f64,
    /// The evaluated dimensions.
    pub dimensions: Vec<ScoreCategory>,
    /// Triggered automatic-fail conditions, in evaluation order.
    pub auto_fails: Vec<AutoFail>,
}

impl GateResult {
    /// Whether the gate blocks acceptance.
    pub fn is_blocking(&self) -> bool {
        self.status == GateStatus::Fail
    }
}

/// Deductive rubric: start at 100, subtract the configured penalty per
/// violation class, floor at 0.
pub fn rubric_score(violations: &[Violation], penalties: &PenaltyConfig) -> f64 {
    let deduction: f64 = violations
        .iter()
        .map(|v| match v.severity {
            Severity::Error => penalties.error,
            Severity::Warning => penalties.warning,
        })
        .sum();
    (100.0 - deduction).max(0.0)
}

/// Evaluate the gate over a set of scored dimensions.
///
/// Automatic-fail conditions are evaluated first; any trigger
/// short-circuits the status to FAIL with the conditions named in the
/// result. Weights must sum to 1.0 and scores must lie in 0-100.
pub fn score_gate(dimensions: Vec<ScoreCategory>, config: &GateConfig) -> Result<GateResult> {
    if dimensions.is_empty() {
        return Err(LecternError::config("gate evaluated with no dimensions"));
    }

    let weight_sum: f64 = dimensions.iter().map(|d| d.weight).sum();
    if (weight_sum - 1.0).abs() > WEIGHT_EPSILON {
        return Err(LecternError::config(format!(
            "gate weights must sum to 1.0, found {}",
            weight_sum
        )));
    }
    for dim in &dimensions {
        if !dim.score.is_finite() || !(0.0..=100.0).contains(&dim.score) {
            return Err(LecternError::invalid_state(format!(
                "dimension '{}' score {} is outside 0-100",
                dim.id, dim.score
            )));
        }
    }

    // Automatic fails run before the weighted computation is trusted.
    let mut auto_fails = Vec::new();
    for dim in &dimensions {
        for violation in &dim.violations {
            if violation.rule == RuleKind::RequiredField {
                auto_fails.push(AutoFail::RequiredElementMissing {
                    element: violation.location.clone(),
                });
            }
        }
    }
    for dim in &dimensions {
        if let Some(spec) = config.dimension(&dim.id) {
            if let Some(floor) = spec.floor {
                if dim.score < floor {
                    auto_fails.push(AutoFail::DimensionBelowFloor {
                        dimension: dim.id.clone(),
                        score: dim.score,
                        floor,
                    });
                }
            }
        }
    }

    let weighted_total: f64 = dimensions.iter().map(|d| d.score * d.weight).sum();

    let status = if !auto_fails.is_empty() {
        GateStatus::Fail
    } else if weighted_total >= config.pass_threshold {
        GateStatus::Pass
    } else if weighted_total >= config.warn_threshold {
        GateStatus::Warn
    } else {
        GateStatus::Fail
    };

    Ok(GateResult {
        status,
        weighted_total,
        dimensions,
        auto_fails,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Violation;

    fn config() -> GateConfig {
        GateConfig::default()
    }

    fn four_dims(scores: [f64; 4]) -> Vec<ScoreCategory> {
        vec![
            ScoreCategory::new("structure", scores[0], 0.35),
            ScoreCategory::new("clarity", scores[1], 0.25),
            ScoreCategory::new("coverage", scores[2], 0.25),
            ScoreCategory::new("pacing", scores[3], 0.15),
        ]
    }

    #[test]
    fn test_perfect_scores_pass() {
        let result = score_gate(four_dims([100.0; 4]), &config()).unwrap();
        assert_eq!(result.status, GateStatus::Pass);
        assert!((result.weighted_total - 100.0).abs() < 1e-9);
        assert!(result.auto_fails.is_empty());
        assert!(!result.is_blocking());
    }

    #[test]
    fn test_total_exactly_at_pass_threshold_passes() {
        // Uniform 85 gives a weighted total of exactly 85
        let result = score_gate(four_dims([85.0; 4]), &config()).unwrap();
        assert_eq!(result.status, GateStatus::Pass);
    }

    #[test]
    fn test_warn_band() {
        let result = score_gate(four_dims([75.0; 4]), &config()).unwrap();
        assert_eq!(result.status, GateStatus::Warn);

        // Exactly at the warn threshold still warns
        let result = score_gate(four_dims([70.0; 4]), &config()).unwrap();
        assert_eq!(result.status, GateStatus::Warn);
    }

    #[test]
    fn test_below_warn_fails() {
        let result = score_gate(four_dims([60.0; 4]), &config()).unwrap();
        assert_eq!(result.status, GateStatus::Fail);
        assert!(result.auto_fails.is_empty());
    }

    #[test]
    fn test_auto_fail_overrides_passing_total() {
        // Weighted total ~95, but a required element is missing
        let mut dims = four_dims([95.0; 4]);
        dims[0].violations.push(Violation::error(
            "concept/body",
            RuleKind::RequiredField,
            "required field 'body' is missing",
        ));

        let result = score_gate(dims, &config()).unwrap();
        assert_eq!(result.status, GateStatus::Fail);
        assert!(result.weighted_total >= 90.0);
        assert_eq!(result.auto_fails.len(), 1);
        assert!(matches!(
            result.auto_fails[0],
            AutoFail::RequiredElementMissing { .. }
        ));
        assert!(result.auto_fails[0].to_string().contains("concept/body"));
    }

    #[test]
    fn test_dimension_floor_auto_fail() {
        // structure floor is 40.0 in the default config; 35 trips it even
        // though the weighted total stays above the pass threshold
        let result = score_gate(four_dims([35.0, 100.0, 100.0, 100.0]), &config());
        let result = result.unwrap();
        assert_eq!(result.status, GateStatus::Fail);
        assert!(matches!(
            result.auto_fails[0],
            AutoFail::DimensionBelowFloor { .. }
        ));
        assert!(result.auto_fails[0].to_string().contains("structure"));
    }

    #[test]
    fn test_dimension_at_floor_is_not_auto_fail() {
        let result = score_gate(four_dims([40.0, 100.0, 100.0, 100.0]), &config()).unwrap();
        assert!(result.auto_fails.is_empty());
    }

    #[test]
    fn test_dimension_without_floor_never_floor_fails() {
        // clarity has no configured floor
        let result = score_gate(four_dims([100.0, 0.0, 100.0, 100.0]), &config()).unwrap();
        assert!(result.auto_fails.is_empty());
    }

    #[test]
    fn test_bad_weight_sum_rejected() {
        let dims = vec![
            ScoreCategory::new("structure", 90.0, 0.5),
            ScoreCategory::new("clarity", 90.0, 0.3),
        ];
        let err = score_gate(dims, &config()).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_empty_dimensions_rejected() {
        let err = score_gate(Vec::new(), &config()).unwrap_err();
        assert!(err.to_string().contains("no dimensions"));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let dims = vec![ScoreCategory::new("structure", 120.0, 1.0)];
        let err = score_gate(dims, &config()).unwrap_err();
        assert!(err.to_string().contains("outside 0-100"));
    }

    #[test]
    fn test_rubric_score_deductions() {
        let penalties = PenaltyConfig::default(); // error 15, warning 5
        let violations = vec![
            Violation::error("a", RuleKind::LineCount, "over"),
            Violation::warning("b", RuleKind::WordCount, "short"),
            Violation::warning("c", RuleKind::MarkerCount, "missing marker"),
        ];
        let score = rubric_score(&violations, &penalties);
        assert!((score - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_rubric_score_floors_at_zero() {
        let penalties = PenaltyConfig::default();
        let violations: Vec<Violation> = (0..10)
            .map(|i| Violation::error(format!("loc{}", i), RuleKind::LineCount, "over"))
            .collect();
        let score = rubric_score(&violations, &penalties);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_rubric_score_no_violations_is_perfect() {
        assert_eq!(rubric_score(&[], &PenaltyConfig::default()), 100.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: a triggered automatic fail always forces FAIL,
            // whatever the weighted total.
            #[test]
            fn prop_auto_fail_always_fails(scores in proptest::array::uniform4(0.0f64..=100.0)) {
                let config = GateConfig::default();
                let mut dims = four_dims(scores);
                dims[1].violations.push(Violation::error(
                    "unit/header",
                    RuleKind::RequiredField,
                    "required field 'header' is missing",
                ));

                let result = score_gate(dims, &config).unwrap();
                prop_assert_eq!(result.status, GateStatus::Fail);
                prop_assert!(!result.auto_fails.is_empty());
            }

            // Property: the rubric never goes negative.
            #[test]
            fn prop_rubric_never_negative(errors in 0usize..30, warnings in 0usize..30) {
                let penalties = PenaltyConfig::default();
                let mut violations = Vec::new();
                for i in 0..errors {
                    violations.push(Violation::error(format!("e{}", i), RuleKind::LineCount, "x"));
                }
                for i in 0..warnings {
                    violations.push(Violation::warning(format!("w{}", i), RuleKind::WordCount, "x"));
                }
                let score = rubric_score(&violations, &penalties);
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }
    }
}
