//! Structural and distributional checks over generated content.

pub mod constraints;
pub mod quota;

pub use constraints::validate_unit;
pub use quota::{check_quota, QuotaResult, QuotaVerdict};
