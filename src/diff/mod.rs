//! Streaming diff of two sorted, paginated sources
//!
//! Each source is wrapped in a [`SourceBuffer`] that queues fetched records
//! and keeps at most one page request in flight. [`PaginationDiff`] drives
//! both buffers, merges their queues in comparator order and yields one
//! `{add, remove}` batch per round. [`collect_results`] folds the batches
//! into a single result.

mod buffer;
mod collect;
mod engine;

pub use buffer::{BufferState, SourceBuffer};
pub use collect::collect_results;
pub use engine::{PaginationDiff, SourceConfig, DEFAULT_BUFFER_SIZE};
