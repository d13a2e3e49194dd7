//! Error types for the sparse Merkle tree and its path views

use thiserror::Error;

/// Errors raised by [`PathView`](crate::PathView) accessors.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PathError {
    /// A symbol index past the end of the view
    #[error("symbol index {index} out of range for path of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A sub-range that does not fit inside the view
    #[error("slice {begin}..{end} out of range for path of length {len}")]
    SliceOutOfRange {
        begin: usize,
        end: usize,
        len: usize,
    },
    /// A character that is not a symbol of the path radix
    #[error("invalid path symbol {0:?}")]
    InvalidSymbol(char),
}

/// Error type for tree operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum TreeError {
    /// The supplied digest does not span the full tree height
    #[error("data hash must be {expected} bytes but is {actual} bytes")]
    HashLength { expected: usize, actual: usize },
    /// Leaves must hold a non-empty payload
    #[error("data value must not be empty")]
    EmptyValue,
    /// The supplied path does not address a leaf slot
    #[error("data path must be {expected} nibbles but is {actual} nibbles")]
    PathLength { expected: usize, actual: usize },
    /// No leaf is stored under the requested key
    #[error("key not found in tree")]
    KeyNotFound,
    /// Invalid merkle proof
    #[error("invalid merkle proof")]
    InvalidMerkleProof,
    /// Path access failure
    #[error(transparent)]
    Path(#[from] PathError),
}

#[cfg(test)]
mod test {
    use super::{PathError, TreeError};

    #[test]
    fn test_error_display() {
        assert_eq!(
            TreeError::HashLength {
                expected: 32,
                actual: 3
            }
            .to_string(),
            "data hash must be 32 bytes but is 3 bytes"
        );
        assert_eq!(
            TreeError::from(PathError::IndexOutOfRange { index: 6, len: 6 }).to_string(),
            "symbol index 6 out of range for path of length 6"
        );
    }
}
