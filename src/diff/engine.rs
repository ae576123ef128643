use futures::future::join;
use futures::{stream, Stream};
use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::diff::buffer::SourceBuffer;
use crate::source::PageFetcher;
use crate::types::{Changes, Side};

/// Queue length below which a source is asked for its next page
pub const DEFAULT_BUFFER_SIZE: usize = 6;

/// How to read one side of the diff
pub struct SourceConfig<T, E> {
    pub fetcher: Box<dyn PageFetcher<Record = T, Error = E>>,
    pub buffer_size: usize,
}

impl<T, E> SourceConfig<T, E> {
    pub fn new<F>(fetcher: F, buffer_size: usize) -> Self
    where
        F: PageFetcher<Record = T, Error = E> + 'static,
    {
        Self::from_boxed(Box::new(fetcher), buffer_size)
    }

    /// Use an already boxed fetcher as-is
    pub fn from_boxed(
        fetcher: Box<dyn PageFetcher<Record = T, Error = E>>,
        buffer_size: usize,
    ) -> Self {
        Self {
            fetcher,
            buffer_size,
        }
    }

    /// Use [`DEFAULT_BUFFER_SIZE`]
    pub fn with_default_buffer<F>(fetcher: F) -> Self
    where
        F: PageFetcher<Record = T, Error = E> + 'static,
    {
        Self::new(fetcher, DEFAULT_BUFFER_SIZE)
    }
}

/// Streaming merge-diff over two sorted, paginated sources
///
/// Records only in source A are reported under `remove`, records only in
/// source B under `add`. Each call to [`PaginationDiff::next_batch`] runs one
/// round: fetch on both sides, start the next fetch ahead of need, then
/// compare queued records until one side runs dry. Neither source is ever
/// held in memory beyond its buffered pages.
pub struct PaginationDiff<T, E, C> {
    a: SourceBuffer<T, E>,
    b: SourceBuffer<T, E>,
    compare: C,
    rounds: usize,
    done: bool,
}

impl<T, E, C> PaginationDiff<T, E, C>
where
    T: Send + 'static,
    E: Send + 'static,
    C: Fn(&T, &T) -> Ordering,
{
    pub fn new(a: SourceConfig<T, E>, b: SourceConfig<T, E>, compare: C) -> Self {
        Self {
            a: SourceBuffer::new(Side::A, a.fetcher, a.buffer_size),
            b: SourceBuffer::new(Side::B, b.fetcher, b.buffer_size),
            compare,
            rounds: 0,
            done: false,
        }
    }

    /// Run one round and return its batch
    ///
    /// Returns `Ok(None)` once both sources are exhausted. A fetch failure on
    /// either side is returned as-is, after which the diff is over and every
    /// later call returns `Ok(None)`.
    pub async fn next_batch(&mut self) -> Result<Option<Changes<T>>, E> {
        if self.done {
            return Ok(None);
        }

        let result = self.round().await;
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    async fn round(&mut self) -> Result<Option<Changes<T>>, E> {
        // a speculative fetch from the previous round may have failed
        self.check_failure()?;

        if self.a.is_finished() && self.b.is_finished() {
            debug!(rounds = self.rounds, "diff complete");
            return Ok(None);
        }

        join(self.a.ensure_fetched(), self.b.ensure_fetched()).await;
        self.check_failure()?;

        self.a.prefetch();
        self.b.prefetch();

        self.rounds += 1;
        let batch = if self.a.is_finished() {
            Changes {
                add: self.b.drain(),
                remove: Vec::new(),
            }
        } else if self.b.is_finished() {
            Changes {
                add: Vec::new(),
                remove: self.a.drain(),
            }
        } else {
            self.merge()
        };

        debug!(
            round = self.rounds,
            added = batch.add.len(),
            removed = batch.remove.len(),
            queued_a = self.a.len(),
            queued_b = self.b.len(),
            state_a = ?self.a.state(),
            state_b = ?self.b.state(),
            "round complete"
        );

        Ok(Some(batch))
    }

    /// Compare queue fronts until either queue is empty
    ///
    /// A front record is only consumed once the comparison decides it; the
    /// other one stays queued, since its counterpart may still arrive.
    fn merge(&mut self) -> Changes<T> {
        let mut batch = Changes::new();

        while let (Some(a), Some(b)) = (self.a.front(), self.b.front()) {
            match (self.compare)(a, b) {
                Ordering::Equal => {
                    trace!("records match");
                    self.a.pop_front();
                    self.b.pop_front();
                }
                Ordering::Less => {
                    trace!("record only in A");
                    batch.remove.extend(self.a.pop_front());
                }
                Ordering::Greater => {
                    trace!("record only in B");
                    batch.add.extend(self.b.pop_front());
                }
            }
        }

        batch
    }

    fn check_failure(&mut self) -> Result<(), E> {
        self.a.poll_settled();
        self.b.poll_settled();

        match self.a.take_failure().or_else(|| self.b.take_failure()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Number of rounds that produced a batch so far
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Turn the diff into a lazy stream of batches
    ///
    /// Rounds only run while the stream is polled. The stream ends after the
    /// last batch or right after yielding an error; dropping it aborts any
    /// fetch still in flight.
    pub fn into_stream(self) -> impl Stream<Item = Result<Changes<T>, E>> {
        stream::unfold(self, |mut diff| async move {
            match diff.next_batch().await {
                Ok(Some(batch)) => Some((Ok(batch), diff)),
                Ok(None) => None,
                Err(err) => Some((Err(err), diff)),
            }
        })
    }
}
