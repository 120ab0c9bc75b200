//! Weighted quality gate and action-item reporting.

pub mod report;
pub mod score;

pub use report::{build_report, ActionItem, FindingCategory, Report, ReportSeverity};
pub use score::{rubric_score, score_gate, AutoFail, GateResult, GateStatus, ScoreCategory};
