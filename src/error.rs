//! Validation errors for allocation snapshots.

use crate::Symbol;

/// Reasons a fetched or loaded snapshot is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// A record has an empty stock code.
    #[error("record {index} has an empty stock code")]
    EmptySymbol { index: usize },

    /// The same symbol appears more than once.
    #[error("duplicate symbol in snapshot: {0}")]
    DuplicateSymbol(Symbol),

    /// A record's ratio is NaN or infinite.
    #[error("non-finite total_ratio for {0}")]
    NonFiniteRatio(Symbol),
}
