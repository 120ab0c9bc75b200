//! Classify command: assign a batch of items to categories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::config::Config;
use crate::core::{Assignment, CategoryId, Item};

/// Options for the classify command.
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// One item as supplied on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSpec {
    /// Stable item identifier.
    pub id: u32,
    /// Raw text.
    pub text: String,
}

/// Input for the classify command: a bare array of items or a wrapper
/// object with an `items` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClassifyInput {
    /// `[{"id": 1, "text": "..."}]`
    Bare(Vec<ItemSpec>),
    /// `{"items": [...]}`
    Wrapped { items: Vec<ItemSpec> },
}

impl ClassifyInput {
    fn into_items(self) -> Vec<Item> {
        let specs = match self {
            ClassifyInput::Bare(specs) => specs,
            ClassifyInput::Wrapped { items } => items,
        };
        specs.into_iter().map(|s| Item::new(s.id, s.text)).collect()
    }
}

/// Output of the classify command.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOutput {
    /// Whether classification completed.
    pub success: bool,
    /// Assignments in input order.
    pub assignments: Vec<Assignment>,
    /// Items per category.
    pub counts: BTreeMap<CategoryId, usize>,
    /// Categories below their minimum population.
    pub underpopulated: Vec<CategoryId>,
    /// Error message when classification aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassifyOutput {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            assignments: Vec::new(),
            counts: BTreeMap::new(),
            underpopulated: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The classify command implementation.
pub struct ClassifyCommand {
    config: Config,
}

impl ClassifyCommand {
    /// Create a new classify command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parse the input JSON and classify the batch.
    pub fn run(&self, input_json: &str, _options: &ClassifyOptions) -> ClassifyOutput {
        if let Err(e) = self.config.validate() {
            return ClassifyOutput::failure(e.to_string());
        }

        let input: ClassifyInput = match serde_json::from_str(input_json) {
            Ok(input) => input,
            Err(e) => return ClassifyOutput::failure(format!("invalid input: {}", e)),
        };
        let items = input.into_items();

        let classifier = Classifier::new(&self.config);
        match classifier.classify_batch(&items) {
            Ok(outcome) => ClassifyOutput {
                success: true,
                assignments: outcome.assignments,
                counts: outcome.counts,
                underpopulated: outcome.underpopulated,
                error: None,
            },
            Err(e) => ClassifyOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ClassifyOutput, options: &ClassifyOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_default();
        }

        if !output.success {
            return format!(
                "classification failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();
        lines.push(format!("{} items classified", output.assignments.len()));
        for (category, count) in &output.counts {
            lines.push(format!("  {}: {}", category, count));
        }
        for assignment in &output.assignments {
            let flags: Vec<&str> = assignment.flags.iter().map(|f| f.tag()).collect();
            let flag_str = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            lines.push(format!(
                "  #{} -> {} ({}){}",
                assignment.item_id, assignment.category, assignment.decided_by, flag_str
            ));
        }
        if !output.underpopulated.is_empty() {
            let names: Vec<&str> = output.underpopulated.iter().map(|c| c.as_str()).collect();
            lines.push(format!(
                "review needed: below minimum population: {}",
                names.join(", ")
            ));
        }
        lines.join("\n")
    }
}
