//! # bitgraph
//!
//! Bit-packed binary adjacency matrices and the reachability questions asked of them.
//!
//! This crate provides:
//! - A [`BitMatrix`](matrix::BitMatrix) keeping row-major **and** column-major bit vectors in
//!   sync, with boolean `+`, `*` and transpose.
//! - Several strategies for the **transitive closure**: fixed-point iteration, retained power
//!   slides, and exponentiation driven by a power-of-two [`FactorPlan`](factor::FactorPlan).
//! - A [`ClosureAnalysis`](analysis::ClosureAnalysis) reading node classes, connectivity
//!   groups, paths and cycles off a closure.
//!
//! ## Quick Start
//!
//! ```
//! use bitgraph::prelude::*;
//!
//! let m = BitMatrix::from_bit_strings(&["010010", "001000", "010100", "010010", "000000", "000000"])?;
//! let result = closure_reflexive(&m, ClosureOptions { add_unit: false, full: false })?;
//! let analysis = ClosureAnalysis::new(&result)?;
//!
//! assert!(!analysis.is_connected_fully());
//! assert_eq!(analysis.nodes_lonely().into_iter().collect::<Vec<_>>(), vec![5]);
//!
//! let cycles = analysis.paths_cycle(0, DepthLimit::Full)?;
//! assert_eq!(cycles.cycles, vec![vec![1, 2], vec![1, 2, 3]]);
//! # Ok::<(), bitgraph::error::GraphError>(())
//! ```
//!
//! ## Factorized Powers
//!
//! ```
//! use bitgraph::prelude::*;
//!
//! // A path 0 -> 1 -> 2 -> 3: the closure is `(M + I)^3`, rounded up to `(M + I)^4`.
//! let m = BitMatrix::from_bit_strings(&["0100", "0010", "0001", "0000"])?;
//! let result = closure_reflexive_optimized(&m, OptimizeMode::Hard)?;
//! assert_eq!(result.closure.row_strings(), vec!["1111", "0111", "0011", "0001"]);
//!
//! let plan = FactorPlan::decompose(242, OptimizeMode::None)?;
//! assert_eq!(plan.count(), 8);
//! # Ok::<(), bitgraph::error::GraphError>(())
//! ```
//!
//! ## Validating Closures
//!
//! ```
//! use bitgraph::validate::validate_known_matrices;
//!
//! validate_known_matrices().expect("bundled matrices should validate");
//! ```
//!
//! ## Modules
//!
//! - [`bitrow`]: fixed-width bit vectors.
//! - [`matrix`]: the dual-representation matrix and its constructors.
//! - [`factor`]: exponent factorization and exponentiation plans.
//! - [`closure`]: closure strategies and connectivity depth.
//! - [`analysis`]: predicates, node classes, connectivity and path search on a closure.
//! - [`graph`]: labelled node/edge view and `0/1` text I/O.
//! - [`validate`]: cross-checks of every strategy against breadth-first search.
//!
//! ## Performance Notes
//!
//! - Rows are `u64` words; a product costs one OR per set bit of the left row.
//! - Products with many rows are sharded across a `rayon` pool.
//! - For maximum performance, compile with: `RUSTFLAGS="-C target-cpu=native" cargo build --release`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)] // Intentional for hot-path code
#![allow(clippy::many_single_char_names)] // Mathematical variable names
#![allow(clippy::needless_range_loop)] // Often clearer for matrix indexing
#![allow(clippy::doc_markdown)]
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod analysis;
pub mod bitrow;
pub mod closure;
pub mod error;
pub mod factor;
pub mod graph;
pub mod matrix;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::analysis::{ClosureAnalysis, Connectivity, DepthLimit};
    pub use crate::bitrow::BitRow;
    pub use crate::closure::{
        closure_matrix, closure_reflexive, closure_reflexive_optimized, closure_slides,
        compute_closure, connect, connect_nodes, ClosureOptions, ClosureResult, ClosureVariant,
    };
    pub use crate::error::GraphError;
    pub use crate::factor::{FactorPlan, Multiply, OptimizeMode};
    pub use crate::graph::{parse_adjacency_matrix, LabeledGraph};
    pub use crate::matrix::{BitMatrix, Diagonal, MatrixSource, RandomSpec};
    pub use crate::validate::cross_check_closures;
}
