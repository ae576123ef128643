use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::PageDiffError;
use crate::source::{JsonLinesPages, PageFetcher, VecPages};

/// Default limit for whole-file JSON inputs (100 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 104_857_600;

/// A boxed page source of JSON records, as built from a command-line input
pub type JsonSource = Box<dyn PageFetcher<Record = Value, Error = PageDiffError>>;

/// Settings for turning a command-line input into a page source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Largest `.json` file read into memory
    pub max_file_size: u64,
    /// Split flat record arrays into pages of this many records
    pub page_size: Option<usize>,
    /// Simulated latency per page for in-memory inputs
    pub delay: Option<Duration>,
    /// Treat every input as inline JSON, even if a file with that name exists
    pub force_inline: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            page_size: None,
            delay: None,
            force_inline: false,
        }
    }
}

/// Open a source given as a file path or an inline JSON string
///
/// `.jsonl` and `.ndjson` files are read lazily, one page per line. Any
/// other file, and inline input, must hold a JSON array of pages or a flat
/// array of records.
pub fn open_source(input: &str, config: &LoadConfig) -> Result<JsonSource, PageDiffError> {
    let path = Path::new(input);

    if !config.force_inline && path.is_file() {
        if is_json_lines(path) {
            debug!(path = %path.display(), "streaming pages from JSON Lines file");
            return Ok(Box::new(JsonLinesPages::new(path)));
        }

        let value = load_json_file(path, config.max_file_size)?;
        let pages = pages_from_value(value, config.page_size, input)?;
        debug!(path = %path.display(), pages = pages.len(), "loaded pages from file");
        return Ok(in_memory(pages, config));
    }

    if config.force_inline || looks_like_json(input) {
        let value: Value =
            serde_json::from_str(input).map_err(|source| PageDiffError::JsonParse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        let pages = pages_from_value(value, config.page_size, "<inline>")?;
        debug!(pages = pages.len(), "loaded inline pages");
        return Ok(in_memory(pages, config));
    }

    Err(PageDiffError::FileRead {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        ),
    })
}

/// Load and parse a JSON file, refusing files above `max_file_size`
pub fn load_json_file(path: &Path, max_file_size: u64) -> Result<Value, PageDiffError> {
    // Check if it's a file (not a directory)
    let metadata = fs::metadata(path).map_err(|source| PageDiffError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(PageDiffError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a file: {}", path.display()),
            ),
        });
    }

    if metadata.len() > max_file_size {
        return Err(PageDiffError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: max_file_size,
        });
    }

    let content = fs::read_to_string(path).map_err(|source| PageDiffError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| PageDiffError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Split a parsed JSON document into pages
///
/// An array whose elements are all arrays is taken as a list of pages. An
/// array of anything else is a flat list of records, cut into chunks of
/// `page_size` (one page when unset). Empty pages are dropped.
pub fn pages_from_value(
    value: Value,
    page_size: Option<usize>,
    input: &str,
) -> Result<Vec<Vec<Value>>, PageDiffError> {
    let Value::Array(items) = value else {
        return Err(PageDiffError::InvalidInput {
            input: input.to_string(),
            message: "expected a JSON array of pages or records".to_string(),
        });
    };

    let nested = items.iter().filter(|item| item.is_array()).count();

    if nested > 0 && nested == items.len() {
        let pages = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Array(records) if !records.is_empty() => Some(records),
                _ => None,
            })
            .collect();
        return Ok(pages);
    }

    if nested > 0 {
        return Err(PageDiffError::InvalidInput {
            input: input.to_string(),
            message: "cannot mix pages and records in one array".to_string(),
        });
    }

    if items.is_empty() {
        return Ok(Vec::new());
    }

    let pages = match page_size {
        Some(size) if size > 0 => items.chunks(size).map(<[Value]>::to_vec).collect(),
        _ => vec![items],
    };
    Ok(pages)
}

fn in_memory(pages: Vec<Vec<Value>>, config: &LoadConfig) -> JsonSource {
    let source = VecPages::<Value, PageDiffError>::new(pages);
    match config.delay {
        Some(delay) => Box::new(source.with_delay(delay)),
        None => Box::new(source),
    }
}

fn is_json_lines(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("jsonl") | Some("ndjson")
    )
}

fn looks_like_json(input: &str) -> bool {
    let trimmed = input.trim_start();
    trimmed.starts_with('[') || trimmed.starts_with('{')
}
