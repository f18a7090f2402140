//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised by matrix construction, algebra, closure and analysis.
///
/// Every check runs before any work starts, so an error never leaves a partial result behind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Operand shapes are incompatible for `op`.
    #[error("dimension mismatch in {op}: left is {}x{}, right is {}x{}", left.0, left.1, right.0, right.1)]
    Dimension {
        /// Operation name (`add`, `multiply`, ...).
        op: &'static str,
        /// Left operand as `(rows, cols)`.
        left: (usize, usize),
        /// Right operand as `(rows, cols)`.
        right: (usize, usize),
    },

    /// A square matrix was required.
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// A boolean grid row has a different length from the first row.
    #[error("ragged boolean grid: row {row} has length {got}, expected {expected}")]
    RaggedRow {
        /// Row index.
        row: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// A row (bit vector or integer) does not fit the declared column count.
    #[error("row {row} has width {got}, expected {expected}")]
    RowWidth {
        /// Row index.
        row: usize,
        /// Declared column count.
        expected: usize,
        /// Width of the supplied row.
        got: usize,
    },

    /// Encountered a non `0/1` character in a bit string.
    #[error("invalid character at ({row}, {col}): {ch:?} (expected '0' or '1')")]
    InvalidChar {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The invalid character.
        ch: char,
    },

    /// An operation needs at least one node.
    #[error("matrix is empty")]
    EmptyMatrix,

    /// Optimization mode string is not one of `none`, `soft`, `hard`.
    #[error("unknown optimize mode {0:?} (expected none, soft or hard)")]
    UnknownOptimizeMode(String),

    /// `X^0` has no multiplicative plan.
    #[error("exponent 0 has no multiplicative factorization")]
    ZeroExponent,

    /// Rounding the exponent upward left the `u64` range.
    #[error("exponent {0} cannot be rounded without overflow")]
    ExponentOverflow(u64),

    /// Integer multiplication overflowed its machine type.
    #[error("arithmetic overflow while multiplying")]
    ArithmeticOverflow,

    /// An edge names a node absent from the node list.
    #[error("edge references unknown node {0:?}")]
    UnknownNode(String),

    /// Node index outside `0..dim`.
    #[error("node {node} is out of range for dimension {dim}")]
    NodeIndex {
        /// Requested node.
        node: usize,
        /// Matrix dimension.
        dim: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
