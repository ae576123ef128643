use futures::FutureExt;
use std::collections::VecDeque;
use std::mem;
use tokio::task::{JoinError, JoinHandle};
use tracing::{trace, warn};

use crate::source::PageFetcher;
use crate::types::{Page, Side};

/// Observable state of a [`SourceBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Idle; a fetch may be started
    Ready,
    /// One fetch is in flight
    Fetching,
    /// The source signaled end-of-stream; terminal
    Empty,
    /// The source failed; terminal
    Failed,
}

enum FetchState<T, E> {
    Ready,
    Fetching(JoinHandle<Result<Page<T>, E>>),
    Empty,
    Failed,
}

/// Per-source queue of records not yet compared, plus its fetch state machine
///
/// At most one fetch is in flight at any time: the pending task lives inside
/// the `Fetching` state, so starting another requires leaving that state
/// first. Fetch failures are kept here until the engine takes them.
pub struct SourceBuffer<T, E> {
    side: Side,
    fetcher: Box<dyn PageFetcher<Record = T, Error = E>>,
    buffer_size: usize,
    records: VecDeque<T>,
    state: FetchState<T, E>,
    failure: Option<E>,
    pages_fetched: usize,
}

impl<T, E> SourceBuffer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new(
        side: Side,
        fetcher: Box<dyn PageFetcher<Record = T, Error = E>>,
        buffer_size: usize,
    ) -> Self {
        Self {
            side,
            fetcher,
            buffer_size,
            records: VecDeque::new(),
            state: FetchState::Ready,
            failure: None,
            pages_fetched: 0,
        }
    }

    /// Give the buffer a chance to fetch, waiting for the result
    ///
    /// Joins a fetch already in flight instead of starting another one. Does
    /// nothing when more than `buffer_size` records are queued or the source
    /// has ended or failed.
    pub async fn ensure_fetched(&mut self) {
        if !matches!(self.state, FetchState::Fetching(_)) {
            if self.records.len() > self.buffer_size || !matches!(self.state, FetchState::Ready) {
                return;
            }
            self.start_fetch();
        }

        if let FetchState::Fetching(handle) = &mut self.state {
            let outcome = handle.await;
            self.settle(outcome);
        }
    }

    /// Start a fetch under the same guards as [`Self::ensure_fetched`] without waiting for it
    pub fn prefetch(&mut self) {
        if matches!(self.state, FetchState::Ready) && self.records.len() <= self.buffer_size {
            self.start_fetch();
        }
    }

    /// Apply the outcome of an in-flight fetch if it has already completed
    pub fn poll_settled(&mut self) {
        if let FetchState::Fetching(handle) = &mut self.state {
            if let Some(outcome) = handle.now_or_never() {
                self.settle(outcome);
            }
        }
    }

    fn start_fetch(&mut self) {
        trace!(side = %self.side, queued = self.records.len(), "fetching page");
        let page = self.fetcher.next_page();
        self.state = FetchState::Fetching(tokio::spawn(page));
    }

    fn settle(&mut self, outcome: Result<Result<Page<T>, E>, JoinError>) {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // Drop takes the handle out of the state before aborting it
            Err(_) => unreachable!(
                "page fetch for source {} is only cancelled on drop",
                self.side
            ),
        };

        self.state = match outcome {
            Ok(Page::Records(records)) => {
                self.pages_fetched += 1;
                trace!(side = %self.side, count = records.len(), "fetched page");
                self.records.extend(records);
                FetchState::Ready
            }
            Ok(Page::End) => {
                trace!(side = %self.side, "source exhausted");
                FetchState::Empty
            }
            Err(err) => {
                warn!(side = %self.side, "page fetch failed");
                self.failure = Some(err);
                FetchState::Failed
            }
        };
    }

    pub fn state(&self) -> BufferState {
        match self.state {
            FetchState::Ready => BufferState::Ready,
            FetchState::Fetching(_) => BufferState::Fetching,
            FetchState::Empty => BufferState::Empty,
            FetchState::Failed => BufferState::Failed,
        }
    }
}

impl<T, E> SourceBuffer<T, E> {
    /// The source ended and every record it produced has been consumed
    pub fn is_finished(&self) -> bool {
        matches!(self.state, FetchState::Empty) && self.records.is_empty()
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Oldest record not yet consumed by the merge
    pub fn front(&self) -> Option<&T> {
        self.records.front()
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.records.pop_front()
    }

    /// Remove and return every queued record
    pub fn drain(&mut self) -> Vec<T> {
        self.records.drain(..).collect()
    }

    /// Take the captured fetch failure, if any
    pub fn take_failure(&mut self) -> Option<E> {
        self.failure.take()
    }
}

impl<T, E> Drop for SourceBuffer<T, E> {
    fn drop(&mut self) {
        if let FetchState::Fetching(handle) = mem::replace(&mut self.state, FetchState::Failed) {
            handle.abort();
        }
    }
}
