//! Section runner: parallel processing with persisted progress.
//!
//! Sections are independent of each other, so classification, validation,
//! and scoring run on a bounded worker pool. Workers never touch the
//! state store; they send results to the coordinating thread, which owns
//! every store mutation (single-writer discipline). A run stopped between
//! sections resumes from the last persisted state; unpersisted in-flight
//! results are recomputed, never assumed valid.

use std::collections::{HashSet, VecDeque};
use std::sync::mpsc;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::checks::{check_quota, validate_unit, QuotaResult};
use crate::classify::{BatchOutcome, Classifier};
use crate::config::{Config, GateConfig};
use crate::core::{
    ContentUnit, ErrorEntry, Item, RuleKind, RunStatus, SectionStatus, StateWriteRequest,
    Violation,
};
use crate::error::{LecternError, Result};
use crate::gate::{build_report, rubric_score, score_gate, GateResult, Report, ScoreCategory};
use crate::storage::StateStore;

/// Input for one pipeline section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section name, unique within the run.
    pub name: String,
    /// Items to classify.
    pub items: Vec<Item>,
    /// Generated content units to validate.
    pub units: Vec<ContentUnit>,
    /// Collection size for the quota check (e.g. slide count).
    pub collection_size: u32,
    /// Special-item count for the quota check.
    pub special_count: u32,
    /// Sub-type tags of the special items, for the diversity advisory.
    #[serde(default)]
    pub special_subtypes: Vec<String>,
}

/// Everything produced for one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    /// Section name.
    pub name: String,
    /// Classification outcome.
    pub batch: BatchOutcome,
    /// All violations from constraint and quota checks.
    pub violations: Vec<Violation>,
    /// Quota check result.
    pub quota: QuotaResult,
    /// Gate evaluation.
    pub gate: GateResult,
    /// Prioritized action items.
    pub report: Report,
}

impl SectionReport {
    /// Whether the section is accepted: the gate did not fail and no
    /// error-severity violation remains.
    pub fn accepted(&self) -> bool {
        !self.gate.is_blocking()
            && self
                .violations
                .iter()
                .all(|v| v.severity != crate::core::Severity::Error)
    }
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: String,
    /// Final run status.
    pub status: RunStatus,
    /// Reports for sections processed this invocation, in input order.
    pub sections: Vec<SectionReport>,
    /// Sections skipped because they were already completed.
    pub skipped: Vec<String>,
    /// Sections that failed, with the error message.
    pub failed: Vec<(String, String)>,
}

/// Rule kinds feeding each known gate dimension.
fn dimension_rules(id: &str) -> &'static [RuleKind] {
    match id {
        "structure" => &[
            RuleKind::LineCount,
            RuleKind::LineLength,
            RuleKind::RequiredField,
        ],
        "clarity" => &[RuleKind::WordCount],
        "coverage" => &[RuleKind::QuotaMinimum, RuleKind::QuotaTarget],
        "pacing" => &[RuleKind::MarkerCount, RuleKind::QuotaDiversity],
        _ => &[],
    }
}

/// Derive dimension scores from violations via the deductive rubric.
///
/// Each configured dimension scores the subset of violations its rule
/// kinds cover; a dimension whose kinds produced no findings scores 100.
pub fn derive_dimensions(violations: &[Violation], gate: &GateConfig) -> Vec<ScoreCategory> {
    gate.dimensions
        .iter()
        .map(|spec| {
            let rules = dimension_rules(&spec.id);
            let subset: Vec<Violation> = violations
                .iter()
                .filter(|v| rules.contains(&v.rule))
                .cloned()
                .collect();
            let score = rubric_score(&subset, &gate.penalties);
            ScoreCategory::new(&spec.id, score, spec.weight).with_violations(subset)
        })
        .collect()
}

/// Classify, validate, and score one section.
pub fn process_section(section: &Section, config: &Config) -> Result<SectionReport> {
    let classifier = Classifier::new(config);
    let batch = classifier.classify_batch(&section.items)?;

    let mut violations = Vec::new();
    for unit in &section.units {
        violations.extend(validate_unit(unit, &config.limits));
    }

    let quota = check_quota(
        section.collection_size,
        section.special_count,
        &section.special_subtypes,
        &config.quotas,
    )?;
    violations.extend(quota.violations.clone());

    let dimensions = derive_dimensions(&violations, &config.gate);
    let gate = score_gate(dimensions, &config.gate)?;
    let report = build_report(&violations);

    Ok(SectionReport {
        name: section.name.clone(),
        batch,
        violations,
        quota,
        gate,
        report,
    })
}

/// Run the pipeline over a set of sections with persisted progress.
///
/// Sections already marked completed in the persisted state are skipped.
/// Every store mutation happens on the calling thread.
pub fn run_pipeline<S: StateStore>(
    store: &S,
    config: &Config,
    run_id: &str,
    sections: &[Section],
) -> Result<RunSummary> {
    config.validate()?;

    for (i, section) in sections.iter().enumerate() {
        if sections[..i].iter().any(|s| s.name == section.name) {
            return Err(LecternError::invalid_state(format!(
                "duplicate section name '{}'",
                section.name
            )));
        }
    }

    let state = store.read(run_id)?;
    if state.status.is_terminal() {
        return Err(LecternError::invalid_state(format!(
            "run {} is already {}; recover from a checkpoint to rerun",
            run_id, state.status
        )));
    }

    let completed: HashSet<String> = state
        .sections
        .iter()
        .filter(|(_, status)| **status == SectionStatus::Completed)
        .map(|(name, _)| name.clone())
        .collect();

    let todo: Vec<&Section> = sections
        .iter()
        .filter(|s| !completed.contains(&s.name))
        .collect();
    let skipped: Vec<String> = sections
        .iter()
        .filter(|s| completed.contains(&s.name))
        .map(|s| s.name.clone())
        .collect();

    let mut request = StateWriteRequest::default()
        .status(RunStatus::InProgress)
        .step("sections");
    for section in &todo {
        request = request.section_status(&section.name, SectionStatus::Pending);
    }
    store.write(run_id, request)?;

    let worker_count = config.runner.max_workers.max(1).min(todo.len().max(1));
    let jobs: Mutex<VecDeque<&Section>> = Mutex::new(todo.iter().copied().collect());

    let mut reports: Vec<SectionReport> = Vec::new();
    let mut failed: Vec<(String, String)> = Vec::new();

    std::thread::scope(|scope| -> Result<()> {
        let (tx, rx) = mpsc::channel::<(String, Result<SectionReport>)>();

        for _ in 0..worker_count {
            let tx = tx.clone();
            let jobs = &jobs;
            scope.spawn(move || loop {
                let job = jobs.lock().expect("job queue lock poisoned").pop_front();
                let Some(section) = job else { break };
                let result = process_section(section, config);
                if tx.send((section.name.clone(), result)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        // Coordinator: the only writer to the store
        for (name, result) in rx {
            match result {
                Ok(report) => {
                    store.write(
                        run_id,
                        StateWriteRequest::default()
                            .section(&name)
                            .section_status(&name, SectionStatus::Completed),
                    )?;
                    reports.push(report);
                }
                Err(e) => {
                    let message = e.to_string();
                    store.write(
                        run_id,
                        StateWriteRequest::default()
                            .section(&name)
                            .section_status(&name, SectionStatus::Failed)
                            .error(ErrorEntry::new(&message).with_step("sections")),
                    )?;
                    failed.push((name, message));
                }
            }
        }

        Ok(())
    })?;

    // Preserve input order: workers finish in arbitrary order
    reports.sort_by_key(|r| {
        sections
            .iter()
            .position(|s| s.name == r.name)
            .unwrap_or(usize::MAX)
    });
    failed.sort_by_key(|(name, _)| {
        sections
            .iter()
            .position(|s| &s.name == name)
            .unwrap_or(usize::MAX)
    });

    let status = if failed.is_empty() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let state = store.write(
        run_id,
        StateWriteRequest::default().status(status).step("done"),
    )?;

    Ok(RunSummary {
        run_id: run_id.to_string(),
        status: state.status,
        sections: reports,
        skipped,
        failed,
    })
}
