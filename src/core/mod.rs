//! Core types for lectern.
//!
//! Items and assignments (classification side), content units and
//! violations (validation side), and the pipeline state record.

pub mod content;
pub mod item;
pub mod pipeline;

pub use content::{ContentField, ContentUnit, RuleKind, Severity, UnitType, Violation};
pub use item::{Assignment, CategoryId, Flag, Item, RuleId, RuleTier};
pub use pipeline::{
    Checkpoint, ErrorEntry, PipelineState, RunStatus, SectionStatus, StateWriteRequest,
    StoreHealth,
};
