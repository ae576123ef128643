use serde::{Deserialize, Serialize};
use std::fmt;

/// Records present in only one of the two sources
///
/// Used both for the batch emitted by a single merge round and for the
/// combined result of a whole diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes<T> {
    /// Records found only in source B
    pub add: Vec<T>,
    /// Records found only in source A
    pub remove: Vec<T>,
}

impl<T> Changes<T> {
    /// Create a new empty Changes container
    pub fn new() -> Self {
        Self {
            add: Vec::new(),
            remove: Vec::new(),
        }
    }

    /// Check if there are any changes
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Total number of added and removed records
    pub fn len(&self) -> usize {
        self.add.len() + self.remove.len()
    }

    /// Append another batch, keeping emission order on both sides
    pub fn extend(&mut self, other: Changes<T>) {
        self.add.extend(other.add);
        self.remove.extend(other.remove);
    }
}

impl<T> Default for Changes<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One response from a page-fetch function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page<T> {
    /// The next records of the source, in source order
    Records(Vec<T>),
    /// The source has no more records
    End,
}

impl<T> From<Option<Vec<T>>> for Page<T> {
    fn from(page: Option<Vec<T>>) -> Self {
        match page {
            Some(records) => Page::Records(records),
            None => Page::End,
        }
    }
}

/// Which of the two compared sources a buffer reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}
