use clap::Parser;
use serde_json::Value;
use std::cmp::Ordering;
use std::time::Duration;

use crate::compare::{compare_numeric, compare_string};
use crate::diff::DEFAULT_BUFFER_SIZE;
use crate::error::PageDiffError;
use crate::loader::{LoadConfig, DEFAULT_MAX_FILE_SIZE};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[value(name = "changes")]
    Changes, // Default: one collected {add, remove} object

    #[value(name = "batches")]
    Batches, // One JSON line per merge round
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Changes => write!(f, "changes"),
            OutputFormat::Batches => write!(f, "batches"),
        }
    }
}

/// Record ordering used to merge the two sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CompareMode {
    #[value(name = "numeric")]
    Numeric,

    #[value(name = "string")]
    String,
}

impl CompareMode {
    pub fn comparator(self) -> fn(&Value, &Value) -> Ordering {
        match self {
            CompareMode::Numeric => compare_numeric,
            CompareMode::String => compare_string,
        }
    }
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareMode::Numeric => write!(f, "numeric"),
            CompareMode::String => write!(f, "string"),
        }
    }
}

/// Command-line arguments for pagediff
#[derive(Parser, Debug)]
#[command(name = "pagediff")]
#[command(version, about = "Diff two sorted, paginated record sources page by page")]
pub struct Args {
    /// Old source: .jsonl file (one page per line), .json file or inline JSON
    pub source_a: String,

    /// New source: .jsonl file (one page per line), .json file or inline JSON
    pub source_b: String,

    /// Ordering both sources are sorted by
    #[arg(short, long, default_value_t = CompareMode::Numeric)]
    pub compare: CompareMode,

    /// Output format (default: changes)
    #[arg(short, long, default_value_t = OutputFormat::Changes, hide_default_value = true)]
    pub format: OutputFormat,

    /// Queued records per source below which the next page is fetched
    #[arg(long, env = "PAGEDIFF_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Split flat JSON arrays into pages of this many records
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Simulated latency per page, in milliseconds, for in-memory inputs
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Maximum .json file size in bytes (default: 104857600, env: PAGEDIFF_MAX_FILE_SIZE)
    #[arg(long, env = "PAGEDIFF_MAX_FILE_SIZE", hide_env_values = true)]
    pub max_file_size: Option<u64>,

    /// Force both inputs to be treated as inline JSON
    #[arg(long)]
    pub inline: bool,

    /// Print the changes object on a single line
    #[arg(long)]
    pub compact: bool,

    /// Log every merge round to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validate command-line arguments
    pub fn validate(&self) -> Result<(), PageDiffError> {
        if self.buffer_size == 0 {
            return Err(PageDiffError::InvalidArgs {
                message: "--buffer-size must be at least 1".to_string(),
            });
        }

        if self.page_size == Some(0) {
            return Err(PageDiffError::InvalidArgs {
                message: "--page-size must be at least 1".to_string(),
            });
        }

        if self.max_file_size == Some(0) {
            return Err(PageDiffError::InvalidArgs {
                message: "--max-file-size must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Build the loader settings shared by both sources
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            max_file_size: self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
            page_size: self.page_size,
            delay: self.delay_ms.map(Duration::from_millis),
            force_inline: self.inline,
        }
    }
}
