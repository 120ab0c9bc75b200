//! Distributional quota checking over a collection's special items.
//!
//! The quota table maps collection-size bands to `(minimum, target_min,
//! target_max)` triples. Verdicts are monotonic in the special-item
//! count: raising the count at a fixed collection size never turns a
//! pass into a failure.

use serde::{Deserialize, Serialize};

use crate::config::{QuotaBand, QuotaTable};
use crate::core::{RuleKind, Violation};
use crate::error::{LecternError, Result};

/// Verdict of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum QuotaVerdict {
    /// Count is within the target range.
    Pass,
    /// Count meets the minimum but is outside the target range.
    Warn,
    /// Count is below the band minimum.
    Fail {
        /// How many special items are missing to reach the minimum.
        deficit: u32,
    },
}

impl QuotaVerdict {
    /// Whether the verdict blocks acceptance.
    pub fn is_blocking(&self) -> bool {
        matches!(self, QuotaVerdict::Fail { .. })
    }
}

/// Full result of a quota check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaResult {
    /// The verdict.
    pub verdict: QuotaVerdict,
    /// The band the collection size fell into.
    pub band: QuotaBand,
    /// Observed collection size.
    pub collection_size: u32,
    /// Observed special-item count.
    pub special_count: u32,
    /// Violations backing the verdict, plus any diversity advisory.
    pub violations: Vec<Violation>,
}

/// Check a collection's special-item count against the quota table.
///
/// `subtypes` carries the sub-type tag of each special item (its length
/// may differ from `special_count` when tags are unknown; diversity is
/// only assessed over the tags provided). A collection size not covered
/// by any band is a configuration error, never a silent pass.
pub fn check_quota(
    collection_size: u32,
    special_count: u32,
    subtypes: &[String],
    table: &QuotaTable,
) -> Result<QuotaResult> {
    let band = table.band_for(collection_size).ok_or_else(|| {
        LecternError::config(format!(
            "no quota band covers collection size {}",
            collection_size
        ))
    })?;

    let location = format!("collection[{}]", collection_size);
    let mut violations = Vec::new();

    let verdict = if special_count < band.minimum {
        let deficit = band.minimum - special_count;
        violations.push(
            Violation::error(
                &location,
                RuleKind::QuotaMinimum,
                format!(
                    "{} special items against a minimum of {} (deficit {})",
                    special_count, band.minimum, deficit
                ),
            )
            .with_measured(special_count as u64, band.minimum as u64),
        );
        QuotaVerdict::Fail { deficit }
    } else if special_count < band.target_min {
        violations.push(
            Violation::warning(
                &location,
                RuleKind::QuotaTarget,
                format!(
                    "{} special items is below the target range {}-{}",
                    special_count, band.target_min, band.target_max
                ),
            )
            .with_measured(special_count as u64, band.target_min as u64),
        );
        QuotaVerdict::Warn
    } else if special_count > band.target_max {
        violations.push(
            Violation::warning(
                &location,
                RuleKind::QuotaTarget,
                format!(
                    "{} special items is above the target range {}-{}",
                    special_count, band.target_min, band.target_max
                ),
            )
            .with_measured(special_count as u64, band.target_max as u64),
        );
        QuotaVerdict::Warn
    } else {
        QuotaVerdict::Pass
    };

    // Diversity advisory: all special items sharing one sub-type is worth
    // a look once there are more than two of them. Never a hard failure.
    if special_count > 2 && !subtypes.is_empty() {
        let first = &subtypes[0];
        if subtypes.iter().all(|s| s == first) {
            violations.push(Violation::warning(
                &location,
                RuleKind::QuotaDiversity,
                format!(
                    "all {} special items share sub-type '{}'",
                    subtypes.len(),
                    first
                ),
            ));
        }
    }

    Ok(QuotaResult {
        verdict,
        band: *band,
        collection_size,
        special_count,
        violations,
    })
}
