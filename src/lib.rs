//! pagediff - streaming diff of sorted, paginated data sources
//!
//! Computes which records exist only in source A (remove) and only in
//! source B (add) while fetching both sources page by page, without ever
//! holding either one in full.

pub use compare::{compare_numeric, compare_string};
pub use diff::{
    collect_results, BufferState, PaginationDiff, SourceBuffer, SourceConfig, DEFAULT_BUFFER_SIZE,
};
pub use error::PageDiffError;
pub use formatter::create_formatter;
pub use loader::{load_json_file, open_source, pages_from_value, JsonSource, LoadConfig};
pub use source::{page_fn, JsonLinesPages, PageFetcher, PageFn, PageFuture, VecPages};
pub use types::{Changes, Page, Side};

pub mod cli;
pub mod compare;
mod diff;
mod error;
pub mod formatter;
mod loader;
pub mod source;
pub mod types;
