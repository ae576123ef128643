use serde_json::Value;

use crate::error::PageDiffError;
use crate::formatter::Formatter;
use crate::types::Changes;

/// Formatter for the "batches" output format
///
/// Each merge round becomes one compact JSON object on its own line, so the
/// output can be consumed as JSON Lines while the diff is still running.
#[derive(Default)]
pub struct BatchesFormatter;

impl BatchesFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for BatchesFormatter {
    fn format(&self, changes: &Changes<Value>) -> Result<String, PageDiffError> {
        serde_json::to_string(changes).map_err(|source| PageDiffError::Output { source })
    }
}
