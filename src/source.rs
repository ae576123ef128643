//! Page sources feeding the diff engine
//!
//! A source hands out one page per call until it reports [`Page::End`]. The
//! engine never calls [`PageFetcher::next_page`] again while a previous call
//! is unresolved, so implementations can assume calls are sequential.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::PageDiffError;
use crate::types::Page;

/// Future returned by a page fetch; owned so it can run as its own task
pub type PageFuture<T, E> = BoxFuture<'static, Result<Page<T>, E>>;

/// An ordered, paginated provider of records
pub trait PageFetcher: Send {
    type Record;
    type Error;

    /// Start fetching the next page
    fn next_page(&mut self) -> PageFuture<Self::Record, Self::Error>;
}

impl<P: PageFetcher + ?Sized> PageFetcher for Box<P> {
    type Record = P::Record;
    type Error = P::Error;

    fn next_page(&mut self) -> PageFuture<Self::Record, Self::Error> {
        (**self).next_page()
    }
}

/// Adapts a closure returning a page future into a [`PageFetcher`]
#[derive(Clone)]
pub struct PageFn<F> {
    f: F,
}

/// Create a [`PageFetcher`] from `FnMut() -> impl Future<Output = Result<Page<T>, E>>`
pub fn page_fn<F>(f: F) -> PageFn<F> {
    PageFn { f }
}

impl<F, Fut, T, E> PageFetcher for PageFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Page<T>, E>> + Send + 'static,
{
    type Record = T;
    type Error = E;

    fn next_page(&mut self) -> PageFuture<T, E> {
        (self.f)().boxed()
    }
}

/// Serves a fixed list of pages, then end-of-stream
pub struct VecPages<T, E = PageDiffError> {
    pages: VecDeque<Vec<T>>,
    delay: Option<Duration>,
    _error: std::marker::PhantomData<fn() -> E>,
}

impl<T, E> VecPages<T, E> {
    pub fn new(pages: Vec<Vec<T>>) -> Self {
        Self {
            pages: pages.into(),
            delay: None,
            _error: std::marker::PhantomData,
        }
    }

    /// Wait `delay` before answering each fetch, to mimic a slow backend
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay).filter(|d| !d.is_zero());
        self
    }

    /// Number of pages not yet handed out
    pub fn remaining(&self) -> usize {
        self.pages.len()
    }
}

impl<T, E> PageFetcher for VecPages<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Record = T;
    type Error = E;

    fn next_page(&mut self) -> PageFuture<T, E> {
        let page = Page::from(self.pages.pop_front());
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(page)
        }
        .boxed()
    }
}

/// Reads a JSON Lines file lazily, one page per non-blank line
///
/// Each line must be a JSON array. Empty arrays and blank lines are skipped,
/// so every returned page holds at least one record.
pub struct JsonLinesPages {
    path: PathBuf,
    reader: Arc<Mutex<LineReader>>,
}

struct LineReader {
    lines: Option<Lines<BufReader<File>>>,
    line: usize,
    done: bool,
}

impl JsonLinesPages {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: Arc::new(Mutex::new(LineReader {
                lines: None,
                line: 0,
                done: false,
            })),
        }
    }
}

impl PageFetcher for JsonLinesPages {
    type Record = Value;
    type Error = PageDiffError;

    fn next_page(&mut self) -> PageFuture<Value, PageDiffError> {
        let path = self.path.clone();
        let reader = Arc::clone(&self.reader);
        async move {
            let mut reader = reader.lock().await;
            read_page(&path, &mut reader).await
        }
        .boxed()
    }
}

async fn read_page(path: &Path, reader: &mut LineReader) -> Result<Page<Value>, PageDiffError> {
    if reader.done {
        return Ok(Page::End);
    }

    if reader.lines.is_none() {
        let file = File::open(path)
            .await
            .map_err(|source| PageDiffError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        reader.lines = Some(BufReader::new(file).lines());
    }

    while let Some(lines) = reader.lines.as_mut() {
        let next = lines
            .next_line()
            .await
            .map_err(|source| PageDiffError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        reader.line += 1;

        let Some(text) = next else {
            reader.done = true;
            reader.lines = None;
            trace!(path = %path.display(), "reached end of page file");
            return Ok(Page::End);
        };

        if text.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| PageDiffError::InvalidPage {
            path: path.to_path_buf(),
            line: reader.line,
            message: e.to_string(),
        })?;
        let Value::Array(records) = value else {
            return Err(PageDiffError::InvalidPage {
                path: path.to_path_buf(),
                line: reader.line,
                message: "expected a JSON array of records".to_string(),
            });
        };

        if !records.is_empty() {
            return Ok(Page::Records(records));
        }
    }

    Ok(Page::End)
}
