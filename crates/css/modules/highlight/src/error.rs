//! Errors reported by the highlights map and the resolver.

use crate::entry::EntryId;
use dom::DocumentId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// `insert` was given an index past the end of the group.
    #[error("index {index} is out of bounds for highlight group {group:?} of length {len}")]
    IndexOutOfBounds {
        group: String,
        index: usize,
        len: usize,
    },
    /// A text run from another document was handed to the resolver.
    #[error("text run belongs to {found:?} but the highlights map belongs to {expected:?}")]
    DocumentMismatch {
        expected: DocumentId,
        found: DocumentId,
    },
    /// The entry handle was released or never came from this map.
    #[error("unknown highlight entry {0:?}")]
    UnknownEntry(EntryId),
}
