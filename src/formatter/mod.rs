//! Formatter module for outputting diff results
//!
//! The default "changes" format prints the collected `{add, remove}` object
//! once the diff is complete. The "batches" format prints one compact JSON
//! line per merge round, as soon as the round finishes.

mod batches;
mod changes;

pub use batches::BatchesFormatter;
pub use changes::ChangesFormatter;

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::PageDiffError;
use crate::types::Changes;

/// Trait for formatting diff results
pub trait Formatter {
    /// Format a batch or a collected result
    fn format(&self, changes: &Changes<Value>) -> Result<String, PageDiffError>;
}

/// Factory function to create a formatter based on output format
pub fn create_formatter(format: OutputFormat, compact: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Changes => Box::new(ChangesFormatter::with_pretty(!compact)),
        OutputFormat::Batches => Box::new(BatchesFormatter::new()),
    }
}
