//! Table-driven structural validation of content units.
//!
//! Every limit is looked up from the injected [`LimitsTable`]; nothing
//! here duplicates a configured value. Violations carry the measured
//! value and the limit so messages stand on their own downstream.

use crate::config::{FieldLimits, LimitsTable};
use crate::core::{ContentField, ContentUnit, RuleKind, Violation};

/// Validate one content unit against the limits table.
///
/// Returns all violations found; an empty vector means the unit is clean.
/// A field exactly at a limit passes.
pub fn validate_unit(unit: &ContentUnit, limits: &LimitsTable) -> Vec<Violation> {
    let mut violations = Vec::new();

    for spec in &limits.fields {
        let location = format!("{}/{}", unit.unit_type, spec.name);

        match unit.field(&spec.name) {
            None => {
                if spec.required {
                    violations.push(Violation::error(
                        location,
                        RuleKind::RequiredField,
                        format!("required field '{}' is missing", spec.name),
                    ));
                }
            }
            Some(field) if field.line_count() == 0 => {
                // Present but empty counts as missing for presence checks
                if spec.required {
                    violations.push(Violation::error(
                        location,
                        RuleKind::RequiredField,
                        format!("required field '{}' is empty", spec.name),
                    ));
                }
            }
            Some(field) => {
                check_field(field, spec, &location, &mut violations);
            }
        }
    }

    violations
}

fn check_field(
    field: &ContentField,
    spec: &FieldLimits,
    location: &str,
    violations: &mut Vec<Violation>,
) {
    if let Some(max_lines) = spec.max_lines {
        let measured = field.line_count() as u64;
        let limit = max_lines as u64;
        if measured > limit {
            violations.push(
                Violation::error(
                    location,
                    RuleKind::LineCount,
                    format!(
                        "field '{}' has {} lines, maximum is {}",
                        spec.name, measured, limit
                    ),
                )
                .with_measured(measured, limit),
            );
        }
    }

    if let Some(max_chars) = spec.max_line_chars {
        let limit = max_chars as u64;
        for (idx, line) in field.lines.iter().enumerate() {
            let measured = line.chars().count() as u64;
            if measured > limit {
                violations.push(
                    Violation::error(
                        format!("{}:{}", location, idx + 1),
                        RuleKind::LineLength,
                        format!(
                            "line {} of field '{}' has {} characters, maximum is {}",
                            idx + 1,
                            spec.name,
                            measured,
                            limit
                        ),
                    )
                    .with_measured(measured, limit),
                );
            }
        }
    }

    let words = field.word_count() as u64;
    if let Some(min_words) = spec.min_words {
        let limit = min_words as u64;
        if words < limit {
            violations.push(
                Violation::warning(
                    location,
                    RuleKind::WordCount,
                    format!(
                        "field '{}' has {} words, below the minimum of {}",
                        spec.name, words, limit
                    ),
                )
                .with_measured(words, limit),
            );
        }
    }
    if let Some(max_words) = spec.max_words {
        let limit = max_words as u64;
        if words > limit {
            violations.push(
                Violation::warning(
                    location,
                    RuleKind::WordCount,
                    format!(
                        "field '{}' has {} words, above the maximum of {}",
                        spec.name, words, limit
                    ),
                )
                .with_measured(words, limit),
            );
        }
    }

    if let Some(marker) = &spec.marker {
        let measured = crate::util::marker_count(&field.text(), &marker.token) as u64;
        let limit = marker.min_count as u64;
        if measured < limit {
            violations.push(
                Violation::warning(
                    location,
                    RuleKind::MarkerCount,
                    format!(
                        "marker '{}' appears {} times in field '{}', minimum is {}",
                        marker.token, measured, spec.name, limit
                    ),
                )
                .with_measured(measured, limit),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsTable, MarkerRule};
    use crate::core::{CategoryId, Severity, UnitType};

    fn limits() -> LimitsTable {
        LimitsTable::default()
    }

    /// A unit that satisfies every default limit.
    fn clean_unit() -> ContentUnit {
        let body_lines: Vec<String> = (0..5)
            .map(|i| format!("line {} with a few words of content [pause]", i))
            .collect();
        ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Tone production".to_string()]))
            .with_field(ContentField::new("body", body_lines))
    }

    #[test]
    fn test_clean_unit_passes() {
        let violations = validate_unit(&clean_unit(), &limits());
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn test_field_exactly_at_line_limit_passes() {
        // Default body maximum is 8 lines; exactly 8 must pass
        let body_lines: Vec<String> = (0..8)
            .map(|i| format!("body line {} some words here [pause]", i))
            .collect();
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new("body", body_lines));

        let violations = validate_unit(&unit, &limits());
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn test_nine_lines_against_max_eight() {
        // One line over produces exactly one error citing 9 and 8
        let body_lines: Vec<String> = (0..9)
            .map(|i| format!("body line {} some words here [pause]", i))
            .collect();
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new("body", body_lines));

        let violations = validate_unit(&unit, &limits());
        let errors: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .collect();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, RuleKind::LineCount);
        assert_eq!(errors[0].measured, Some(9));
        assert_eq!(errors[0].limit, Some(8));
        assert!(errors[0].message.contains('9'));
        assert!(errors[0].message.contains('8'));
    }

    #[test]
    fn test_missing_required_field_is_error() {
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept);
        let violations = validate_unit(&unit, &limits());

        let required: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.rule == RuleKind::RequiredField)
            .collect();
        assert_eq!(required.len(), 2); // header and body
        assert!(required.iter().all(|v| v.severity == Severity::Error));
    }

    #[test]
    fn test_empty_required_field_is_error() {
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new(
                "body",
                vec!["".to_string(), "   ".to_string()],
            ));

        let violations = validate_unit(&unit, &limits());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleKind::RequiredField && v.message.contains("empty")));
    }

    #[test]
    fn test_missing_optional_field_passes() {
        // "notes" is optional in the default table
        let violations = validate_unit(&clean_unit(), &limits());
        assert!(!violations.iter().any(|v| v.location.contains("notes")));
    }

    #[test]
    fn test_line_length_violation_names_line() {
        let long_line = "x".repeat(121);
        let mut lines = vec!["short words filler content [pause] ok fine".to_string()];
        lines.push(long_line);
        lines.extend((0..3).map(|i| format!("line {} more words of body content", i)));

        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new("body", lines));

        let violations = validate_unit(&unit, &limits());
        let length: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.rule == RuleKind::LineLength)
            .collect();
        assert_eq!(length.len(), 1);
        assert_eq!(length[0].measured, Some(121));
        assert_eq!(length[0].limit, Some(120));
        assert!(length[0].location.ends_with(":2"));
    }

    #[test]
    fn test_word_count_below_minimum_distinct_message() {
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new(
                "body",
                vec!["too few words [pause]".to_string()],
            ));

        let violations = validate_unit(&unit, &limits());
        let word: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.rule == RuleKind::WordCount)
            .collect();
        assert_eq!(word.len(), 1);
        assert!(word[0].message.contains("below the minimum"));
        assert_eq!(word[0].limit, Some(20));
    }

    #[test]
    fn test_word_count_above_maximum_distinct_message() {
        let many_words = "word ".repeat(201);
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new(
                "body",
                vec![format!("{} [pause]", many_words.trim())],
            ));

        let violations = validate_unit(&unit, &limits());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleKind::WordCount && v.message.contains("above the maximum")));
    }

    #[test]
    fn test_marker_minimum_enforced() {
        let body_lines: Vec<String> = (0..5)
            .map(|i| format!("line {} with several words but no pacing marker", i))
            .collect();
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new("body", body_lines));

        let violations = validate_unit(&unit, &limits());
        let marker: Vec<&Violation> = violations
            .iter()
            .filter(|v| v.rule == RuleKind::MarkerCount)
            .collect();
        assert_eq!(marker.len(), 1);
        assert_eq!(marker[0].measured, Some(0));
        assert_eq!(marker[0].limit, Some(1));
        assert!(marker[0].message.contains("[pause]"));
    }

    #[test]
    fn test_limits_are_looked_up_not_hardcoded() {
        // Tightening the table changes the verdict without code changes
        let mut table = limits();
        let body = table.fields.iter_mut().find(|f| f.name == "body").unwrap();
        body.max_lines = Some(3);
        body.min_words = None;
        body.marker = None;

        let body_lines: Vec<String> = (0..4).map(|i| format!("line {}", i)).collect();
        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Concept)
            .with_field(ContentField::new("header", vec!["Header".to_string()]))
            .with_field(ContentField::new("body", body_lines));

        let violations = validate_unit(&unit, &table);
        let count = violations
            .iter()
            .find(|v| v.rule == RuleKind::LineCount)
            .unwrap();
        assert_eq!(count.measured, Some(4));
        assert_eq!(count.limit, Some(3));
    }

    #[test]
    fn test_marker_rule_from_custom_table() {
        let mut table = LimitsTable { fields: vec![] };
        table.fields.push(crate::config::FieldLimits {
            name: "script".to_string(),
            required: true,
            max_lines: None,
            max_line_chars: None,
            min_words: None,
            max_words: None,
            marker: Some(MarkerRule {
                token: "[beat]".to_string(),
                min_count: 2,
            }),
        });

        let unit = ContentUnit::new(CategoryId::new("foundations"), UnitType::Drill)
            .with_field(ContentField::new(
                "script",
                vec!["one [beat] here".to_string()],
            ));

        let violations = validate_unit(&unit, &table);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].measured, Some(1));
        assert_eq!(violations[0].limit, Some(2));
    }
}
