use serde_json::Value;

use crate::error::PageDiffError;
use crate::formatter::Formatter;
use crate::types::Changes;

/// Formatter for the "changes" output format
///
/// This formatter outputs a JSON object with two arrays:
/// - add: Records present in source B but not in source A
/// - remove: Records present in source A but not in source B
pub struct ChangesFormatter {
    pretty: bool,
}

impl ChangesFormatter {
    /// Create a new ChangesFormatter with pretty printing enabled
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a ChangesFormatter with custom pretty printing setting
    pub fn with_pretty(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Default for ChangesFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for ChangesFormatter {
    fn format(&self, changes: &Changes<Value>) -> Result<String, PageDiffError> {
        let output = if self.pretty {
            serde_json::to_string_pretty(changes)
        } else {
            serde_json::to_string(changes)
        };
        output.map_err(|source| PageDiffError::Output { source })
    }
}
