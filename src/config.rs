//! Configuration loading for lectern.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.lectern/config.toml`)
//! 3. User config (`~/.lectern/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! Every canonical constant of the pipeline lives here: the category
//! catalog, the limits table, the quota table, and the gate thresholds.
//! Components receive this struct by reference and look values up; no
//! limit that appears here is ever duplicated as a code constant.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LecternError, Result};

/// Main configuration struct for lectern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The active category catalog.
    pub catalog: CatalogConfig,
    /// Secondary-tier classification heuristics.
    pub heuristics: HeuristicsConfig,
    /// Per-field structural limits.
    pub limits: LimitsTable,
    /// Size-band quota table.
    pub quotas: QuotaTable,
    /// Gate weights, thresholds, and rubric penalties.
    pub gate: GateConfig,
    /// Worker pool sizing.
    pub runner: RunnerConfig,
}

/// One category in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpec {
    /// Stable identifier, e.g. `"foundations"`.
    pub id: String,
    /// Human label shown in output.
    pub label: String,
    /// Minimum item population; falling below is flagged for review.
    pub min_population: usize,
    /// Routing keywords for the primary classification tier.
    pub keywords: Vec<String>,
}

/// The active category catalog (ordered; order is the tertiary fallback).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Categories in declared order.
    pub categories: Vec<CategorySpec>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let spec = |id: &str, label: &str, keywords: &[&str]| CategorySpec {
            id: id.to_string(),
            label: label.to_string(),
            min_population: 3,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        Self {
            categories: vec![
                spec(
                    "foundations",
                    "Foundations",
                    &["definition", "principle", "concept", "theory", "term"],
                ),
                spec(
                    "techniques",
                    "Techniques",
                    &["technique", "method", "practice", "drill", "exercise"],
                ),
                spec(
                    "history",
                    "History & Context",
                    &["history", "origin", "tradition", "pioneer", "movement"],
                ),
                spec(
                    "applications",
                    "Applications",
                    &["application", "example", "case", "real-world", "everyday"],
                ),
            ],
        }
    }
}

impl CatalogConfig {
    /// Look up a category spec by identifier.
    pub fn get(&self, id: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Whether the catalog contains the identifier.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

/// One secondary-tier focus heuristic: term matches route to one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FocusHeuristic {
    /// Target category identifier.
    pub category: String,
    /// Terms whose presence triggers the heuristic (case-insensitive).
    pub terms: Vec<String>,
}

/// Secondary-tier heuristics, evaluated in struct-field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Technique-focus heuristic.
    pub technique: FocusHeuristic,
    /// Historical/period-focus heuristic. Four-digit year tokens also
    /// trigger it, independent of the term list.
    pub period: FocusHeuristic,
    /// Population-focus heuristic (audience terms).
    pub population: FocusHeuristic,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        let h = |category: &str, terms: &[&str]| FocusHeuristic {
            category: category.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        };
        Self {
            technique: h(
                "techniques",
                &["how to", "procedure", "step by step", "routine"],
            ),
            period: h("history", &["century", "era", "decade", "ancient", "medieval"]),
            population: h(
                "applications",
                &["beginner", "student", "learner", "practitioner", "audience"],
            ),
        }
    }
}

/// A marker-token requirement on a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerRule {
    /// The literal token, e.g. `"[pause]"`.
    pub token: String,
    /// Minimum number of occurrences in the field.
    pub min_count: u32,
}

/// Structural limits for one declared field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldLimits {
    /// Field name this entry governs.
    pub name: String,
    /// Whether absence of the field is an error.
    pub required: bool,
    /// Maximum non-empty line count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
    /// Maximum characters per line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_line_chars: Option<u32>,
    /// Minimum total word count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_words: Option<u32>,
    /// Maximum total word count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words: Option<u32>,
    /// Required marker token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerRule>,
}

/// The per-field limits table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsTable {
    /// Field limit entries; fields not listed are unconstrained.
    pub fields: Vec<FieldLimits>,
}

impl Default for LimitsTable {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldLimits {
                    name: "header".to_string(),
                    required: true,
                    max_lines: Some(2),
                    max_line_chars: Some(80),
                    min_words: Some(1),
                    max_words: Some(12),
                    marker: None,
                },
                FieldLimits {
                    name: "body".to_string(),
                    required: true,
                    max_lines: Some(8),
                    max_line_chars: Some(120),
                    min_words: Some(20),
                    max_words: Some(200),
                    marker: Some(MarkerRule {
                        token: "[pause]".to_string(),
                        min_count: 1,
                    }),
                },
                FieldLimits {
                    name: "notes".to_string(),
                    required: false,
                    max_lines: Some(12),
                    max_line_chars: Some(120),
                    min_words: None,
                    max_words: None,
                    marker: None,
                },
            ],
        }
    }
}

impl LimitsTable {
    /// Look up limits for a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldLimits> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One collection-size band of the quota table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuotaBand {
    /// Inclusive lower bound of the collection size.
    pub min_size: u32,
    /// Inclusive upper bound of the collection size.
    pub max_size: u32,
    /// Hard minimum special-item count; below this is a failure.
    pub minimum: u32,
    /// Lower edge of the target range.
    pub target_min: u32,
    /// Upper edge of the target range.
    pub target_max: u32,
}

impl QuotaBand {
    /// Whether the band covers a collection size.
    pub fn covers(&self, size: u32) -> bool {
        size >= self.min_size && size <= self.max_size
    }
}

/// Size-band quota table; bands must be contiguous and non-overlapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuotaTable {
    /// Bands in ascending size order.
    pub bands: Vec<QuotaBand>,
}

impl Default for QuotaTable {
    fn default() -> Self {
        let band = |min_size, max_size, minimum, target_min, target_max| QuotaBand {
            min_size,
            max_size,
            minimum,
            target_min,
            target_max,
        };
        Self {
            bands: vec![
                band(1, 7, 1, 1, 2),
                band(8, 11, 1, 2, 3),
                band(12, 15, 2, 3, 4),
                band(16, 24, 3, 4, 6),
                band(25, 40, 4, 6, 9),
            ],
        }
    }
}

impl QuotaTable {
    /// Select the band containing a collection size.
    pub fn band_for(&self, size: u32) -> Option<&QuotaBand> {
        self.bands.iter().find(|b| b.covers(size))
    }
}

/// One weighted scoring dimension of the gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionSpec {
    /// Dimension identifier, e.g. `"structure"`.
    pub id: String,
    /// Weight fraction; all weights must sum to 1.0.
    pub weight: f64,
    /// Individual floor; scoring below it is an automatic fail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
}

/// Per-violation-class rubric penalties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PenaltyConfig {
    /// Deduction per error-severity violation.
    pub error: f64,
    /// Deduction per warning-severity violation.
    pub warning: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            error: 15.0,
            warning: 5.0,
        }
    }
}

/// Gate weights, thresholds, and penalties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Weighted total at or above this passes.
    pub pass_threshold: f64,
    /// Weighted total at or above this (but below pass) warns.
    pub warn_threshold: f64,
    /// Scoring dimensions in declared order.
    pub dimensions: Vec<DimensionSpec>,
    /// Rubric penalties per violation class.
    pub penalties: PenaltyConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        let dim = |id: &str, weight: f64, floor: Option<f64>| DimensionSpec {
            id: id.to_string(),
            weight,
            floor,
        };
        Self {
            pass_threshold: 85.0,
            warn_threshold: 70.0,
            dimensions: vec![
                dim("structure", 0.35, Some(40.0)),
                dim("clarity", 0.25, None),
                dim("coverage", 0.25, Some(30.0)),
                dim("pacing", 0.15, None),
            ],
            penalties: PenaltyConfig::default(),
        }
    }
}

impl GateConfig {
    /// Check if a threshold value is valid (finite, within [0, 100]).
    pub fn is_valid_threshold(value: f64) -> bool {
        value.is_finite() && (0.0..=100.0).contains(&value)
    }

    /// Look up a dimension spec by identifier.
    pub fn dimension(&self, id: &str) -> Option<&DimensionSpec> {
        self.dimensions.iter().find(|d| d.id == id)
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum concurrent section workers.
    pub max_workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

/// Minimum valid worker count.
pub const MIN_WORKERS: usize = 1;

impl RunnerConfig {
    /// Check if a worker count is valid (must be >= 1).
    pub fn is_valid_workers(value: usize) -> bool {
        value >= MIN_WORKERS
    }
}

impl Config {
    /// Load configuration with the full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }
        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }
        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.lectern/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = lectern_home()?;
        let config_path = home.join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load project config from `.lectern/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = cwd.join(".lectern").join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| LecternError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| LecternError::config(e.to_string()))
    }

    /// Merge another config into this one; `other` takes precedence.
    ///
    /// Tables (catalog, heuristics, limits, quotas, gate dimensions) are
    /// replaced wholesale when customized — partial table merging would
    /// reintroduce the scattered-constant drift this struct exists to
    /// eliminate.
    fn merge(mut self, other: Config) -> Self {
        if other.catalog != CatalogConfig::default() {
            self.catalog = other.catalog;
        }
        if other.heuristics != HeuristicsConfig::default() {
            self.heuristics = other.heuristics;
        }
        if other.limits != LimitsTable::default() {
            self.limits = other.limits;
        }
        if other.quotas != QuotaTable::default() {
            self.quotas = other.quotas;
        }

        let default_gate = GateConfig::default();
        if other.gate.dimensions != default_gate.dimensions {
            self.gate.dimensions = other.gate.dimensions;
        }
        if other.gate.pass_threshold != default_gate.pass_threshold {
            self.gate.pass_threshold = other.gate.pass_threshold;
        }
        if other.gate.warn_threshold != default_gate.warn_threshold {
            self.gate.warn_threshold = other.gate.warn_threshold;
        }
        if other.gate.penalties != default_gate.penalties {
            self.gate.penalties = other.gate.penalties;
        }

        if other.runner.max_workers != RunnerConfig::default().max_workers {
            self.runner.max_workers = other.runner.max_workers;
        }

        self
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LECTERN_MAX_WORKERS") {
            match val.parse::<usize>() {
                Ok(n) if RunnerConfig::is_valid_workers(n) => self.runner.max_workers = n,
                Ok(n) => eprintln!(
                    "Warning: Invalid LECTERN_MAX_WORKERS value '{}'. \
                    Must be >= {}. Using default '{}'.",
                    n, MIN_WORKERS, self.runner.max_workers
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid LECTERN_MAX_WORKERS value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.runner.max_workers
                ),
            }
        }

        if let Ok(val) = env::var("LECTERN_PASS_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if GateConfig::is_valid_threshold(n) => self.gate.pass_threshold = n,
                Ok(n) => eprintln!(
                    "Warning: Invalid LECTERN_PASS_THRESHOLD value '{}'. \
                    Must be in range [0, 100]. Using default '{}'.",
                    n, self.gate.pass_threshold
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid LECTERN_PASS_THRESHOLD value '{}'. \
                    Expected a number. Using default '{}'.",
                    val, self.gate.pass_threshold
                ),
            }
        }

        if let Ok(val) = env::var("LECTERN_WARN_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if GateConfig::is_valid_threshold(n) => self.gate.warn_threshold = n,
                Ok(n) => eprintln!(
                    "Warning: Invalid LECTERN_WARN_THRESHOLD value '{}'. \
                    Must be in range [0, 100]. Using default '{}'.",
                    n, self.gate.warn_threshold
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid LECTERN_WARN_THRESHOLD value '{}'. \
                    Expected a number. Using default '{}'.",
                    val, self.gate.warn_threshold
                ),
            }
        }
    }

    /// Cross-table consistency check.
    ///
    /// Catches the drift and overlap mistakes a hand-edited config can
    /// introduce; every component assumes a validated config.
    pub fn validate(&self) -> Result<()> {
        // Catalog: 4-6 unique categories
        let n = self.catalog.categories.len();
        if !(4..=6).contains(&n) {
            return Err(LecternError::config(format!(
                "catalog must have 4-6 categories, found {}",
                n
            )));
        }
        for (i, cat) in self.catalog.categories.iter().enumerate() {
            if self.catalog.categories[..i].iter().any(|c| c.id == cat.id) {
                return Err(LecternError::config(format!(
                    "duplicate category id '{}'",
                    cat.id
                )));
            }
        }

        // Heuristic targets must exist in the catalog
        for (name, h) in [
            ("technique", &self.heuristics.technique),
            ("period", &self.heuristics.period),
            ("population", &self.heuristics.population),
        ] {
            if !self.catalog.contains(&h.category) {
                return Err(LecternError::config(format!(
                    "{} heuristic targets unknown category '{}'",
                    name, h.category
                )));
            }
        }

        // Gate: weights sum to 1.0, thresholds ordered
        let weight_sum: f64 = self.gate.dimensions.iter().map(|d| d.weight).sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(LecternError::config(format!(
                "gate dimension weights must sum to 1.0, found {}",
                weight_sum
            )));
        }
        if self.gate.warn_threshold > self.gate.pass_threshold {
            return Err(LecternError::config(format!(
                "warn threshold {} exceeds pass threshold {}",
                self.gate.warn_threshold, self.gate.pass_threshold
            )));
        }

        // Quota bands: ascending, contiguous, non-overlapping, sane triples
        let mut prev_max: Option<u32> = None;
        for band in &self.quotas.bands {
            if band.min_size > band.max_size {
                return Err(LecternError::config(format!(
                    "quota band {}-{} has min_size > max_size",
                    band.min_size, band.max_size
                )));
            }
            if let Some(pm) = prev_max {
                if band.min_size != pm + 1 {
                    return Err(LecternError::config(format!(
                        "quota bands must be contiguous; gap or overlap before {}-{}",
                        band.min_size, band.max_size
                    )));
                }
            }
            if !(band.minimum <= band.target_min && band.target_min <= band.target_max) {
                return Err(LecternError::config(format!(
                    "quota band {}-{} must satisfy minimum <= target_min <= target_max",
                    band.min_size, band.max_size
                )));
            }
            prev_max = Some(band.max_size);
        }

        Ok(())
    }

    /// Save configuration to the project config file.
    ///
    /// Writes to `.lectern/config.toml` under the given directory using an
    /// atomic write (temp file, sync, rename).
    pub fn save_project(&self, cwd: &Path) -> Result<()> {
        let dir = cwd.join(".lectern");
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| LecternError::storage(&dir, e))?;
        }

        let config_path = dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| LecternError::config(e.to_string()))?;

        let temp_path = dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| LecternError::storage(&temp_path, e))?;

        let file = fs::File::open(&temp_path).map_err(|e| LecternError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| LecternError::storage(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &config_path).map_err(|e| LecternError::storage(&config_path, e))?;

        Ok(())
    }
}

/// Get the lectern home directory.
///
/// Checks the `LECTERN_HOME` environment variable first, then falls back
/// to `~/.lectern`.
pub fn lectern_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("LECTERN_HOME") {
        if home.is_empty() {
            tracing::warn!("LECTERN_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("LECTERN_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".lectern"))
}

/// Get the runs directory: `<lectern_home>/runs/`.
pub fn runs_dir() -> Option<PathBuf> {
    lectern_home().map(|h| h.join("runs"))
}
