//! Bit-packed boolean matrix with row and column duals.
//!
//! `rows[m]` holds the successors of node `m` and `cols[n]` its predecessors; `cols` is always
//! the exact transpose of `rows`. Matrices are immutable once built: every transform returns a
//! fresh value.

use crate::bitrow::{parse_bits, BitRow};
use crate::error::{GraphError, Result};
use crate::graph::LabeledGraph;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use std::fmt;
use std::io::{self, Write};

/// Row count from which [`BitMatrix::multiply`] shards output rows across the rayon pool.
pub const PARALLEL_ROWS: usize = 256;

// ============================================================================
// Construction parameters
// ============================================================================

/// What happens to the diagonal of a random matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Diagonal {
    /// No self loops (the non-reflexive default).
    #[default]
    Cleared,
    /// Every node loops on itself (reflexive mode).
    Filled,
    /// The diagonal is drawn like any other cell.
    Untouched,
}

/// Parameters for a random matrix.
#[derive(Clone, Debug)]
pub struct RandomSpec {
    /// Row count.
    pub dim_m: usize,
    /// Column count.
    pub dim_n: usize,
    /// Per-mille probability that a cell is set; values above 1000 are clamped to 1000.
    pub level: u32,
    /// Diagonal policy.
    pub diagonal: Diagonal,
    /// Seed for the `XorShiftRng` used by [`BitMatrix::build`].
    pub seed: u64,
}

impl Default for RandomSpec {
    fn default() -> Self {
        Self {
            dim_m: 16,
            dim_n: 16,
            level: 100,
            diagonal: Diagonal::Cleared,
            seed: 0xC0FFEE,
        }
    }
}

impl RandomSpec {
    /// Square `dim x dim` spec with the given density, other fields defaulted.
    pub fn square(dim: usize, level: u32) -> Self {
        Self {
            dim_m: dim,
            dim_n: dim,
            level,
            ..Self::default()
        }
    }
}

/// The ways a [`BitMatrix`] can be built.
#[derive(Clone, Debug)]
pub enum MatrixSource {
    /// All-zero `dim_m x dim_n` matrix.
    Empty {
        /// Row count.
        dim_m: usize,
        /// Column count.
        dim_n: usize,
    },
    /// Seeded random matrix.
    Random(RandomSpec),
    /// Rectangular grid of booleans.
    Boolean(Vec<Vec<bool>>),
    /// Ready-made rows of width `dim_n`.
    Matrix {
        /// Row bit vectors.
        rows: Vec<BitRow>,
        /// Column count every row must have.
        dim_n: usize,
    },
    /// Labelled nodes and directed edges; see [`LabeledGraph::from_nodes_edges`].
    NodesEdges {
        /// Node labels (may be empty to derive them from the edges).
        nodes: Vec<String>,
        /// Directed `(from, to)` edges.
        edges: Vec<(String, String)>,
    },
    /// Identity matrix of the given dimension.
    Unit(usize),
}

// ============================================================================
// BitMatrix
// ============================================================================

/// Boolean matrix stored as row and column bit vectors.
#[derive(Clone)]
pub struct BitMatrix {
    dim_m: usize,
    dim_n: usize,
    rows: Vec<BitRow>,
    cols: Vec<BitRow>,
}

impl BitMatrix {
    /// Builds a matrix from any [`MatrixSource`].
    ///
    /// # Errors
    /// Propagates the error of the selected constructor.
    pub fn build(source: MatrixSource) -> Result<Self> {
        match source {
            MatrixSource::Empty { dim_m, dim_n } => Ok(Self::empty(dim_m, dim_n)),
            MatrixSource::Random(spec) => {
                let mut rng = XorShiftRng::seed_from_u64(spec.seed);
                Ok(Self::random(&mut rng, &spec))
            }
            MatrixSource::Boolean(grid) => Self::from_bools(&grid),
            MatrixSource::Matrix { rows, dim_n } => Self::from_rows(rows, dim_n),
            MatrixSource::NodesEdges { nodes, edges } => {
                LabeledGraph::from_nodes_edges(&nodes, &edges).map(LabeledGraph::into_matrix)
            }
            MatrixSource::Unit(dim) => Ok(Self::unit(dim)),
        }
    }

    /// All-zero matrix.
    pub fn empty(dim_m: usize, dim_n: usize) -> Self {
        Self {
            dim_m,
            dim_n,
            rows: vec![BitRow::zeros(dim_n); dim_m],
            cols: vec![BitRow::zeros(dim_m); dim_n],
        }
    }

    /// Identity matrix.
    pub fn unit(dim: usize) -> Self {
        let rows = (0..dim).map(|i| BitRow::singleton(dim, i)).collect::<Vec<_>>();
        Self {
            dim_m: dim,
            dim_n: dim,
            cols: rows.clone(),
            rows,
        }
    }

    /// Random matrix: each cell is set with probability `min(level, 1000) / 1000`, then the
    /// diagonal policy is applied.
    pub fn random<R: Rng>(rng: &mut R, spec: &RandomSpec) -> Self {
        let level = spec.level.min(1000);
        let mut rows = Vec::with_capacity(spec.dim_m);
        for m in 0..spec.dim_m {
            let mut row = BitRow::zeros(spec.dim_n);
            for n in 0..spec.dim_n {
                if rng.random_range(0..1000) < level {
                    row.set(n);
                }
            }
            if m < spec.dim_n {
                match spec.diagonal {
                    Diagonal::Cleared => row.clear(m),
                    Diagonal::Filled => row.set(m),
                    Diagonal::Untouched => {}
                }
            }
            rows.push(row);
        }
        Self::from_rows_unchecked(rows, spec.dim_n)
    }

    /// Builds a matrix from rows of width `dim_n`.
    ///
    /// # Errors
    /// Returns [`GraphError::RowWidth`] if a row is not `dim_n` bits wide.
    pub fn from_rows(rows: Vec<BitRow>, dim_n: usize) -> Result<Self> {
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim_n) {
            return Err(GraphError::RowWidth {
                row,
                expected: dim_n,
                got: r.len(),
            });
        }
        Ok(Self::from_rows_unchecked(rows, dim_n))
    }

    /// Builds a matrix from a rectangular boolean grid.
    ///
    /// # Errors
    /// Returns [`GraphError::RaggedRow`] if rows have different lengths.
    pub fn from_bools(grid: &[Vec<bool>]) -> Result<Self> {
        let dim_n = grid.first().map_or(0, Vec::len);
        let mut rows = Vec::with_capacity(grid.len());
        for (m, cells) in grid.iter().enumerate() {
            if cells.len() != dim_n {
                return Err(GraphError::RaggedRow {
                    row: m,
                    expected: dim_n,
                    got: cells.len(),
                });
            }
            let mut row = BitRow::zeros(dim_n);
            for (n, &cell) in cells.iter().enumerate() {
                if cell {
                    row.set(n);
                }
            }
            rows.push(row);
        }
        Ok(Self::from_rows_unchecked(rows, dim_n))
    }

    /// Builds a matrix from `0/1` strings, character `n` of line `m` being cell `(m, n)`.
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidChar`] for characters other than `0`/`1` and
    /// [`GraphError::RaggedRow`] when lines differ in length.
    pub fn from_bit_strings<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let dim_n = lines.first().map_or(0, |l| l.as_ref().len());
        let mut rows = Vec::with_capacity(lines.len());
        for (m, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.len() != dim_n {
                return Err(GraphError::RaggedRow {
                    row: m,
                    expected: dim_n,
                    got: line.len(),
                });
            }
            rows.push(parse_bits(line, m)?);
        }
        Ok(Self::from_rows_unchecked(rows, dim_n))
    }

    /// Builds a matrix from big-endian row integers of width `dim_n`
    /// (`[1, 4, 2]` with width 5 is `00001, 00100, 00010`).
    ///
    /// # Errors
    /// Returns [`GraphError::RowWidth`] if a value needs more than `dim_n` bits.
    pub fn from_int_rows(values: &[u64], dim_n: usize) -> Result<Self> {
        let rows = values
            .iter()
            .enumerate()
            .map(|(m, &v)| {
                BitRow::from_u64(v, dim_n).map_err(|e| match e {
                    GraphError::RowWidth { expected, got, .. } => GraphError::RowWidth {
                        row: m,
                        expected,
                        got,
                    },
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_rows_unchecked(rows, dim_n))
    }

    pub(crate) fn from_rows_unchecked(rows: Vec<BitRow>, dim_n: usize) -> Self {
        let dim_m = rows.len();
        let cols = transpose_rows(&rows, dim_m, dim_n);
        Self {
            dim_m,
            dim_n,
            rows,
            cols,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Row count.
    #[inline(always)]
    pub fn dim_m(&self) -> usize {
        self.dim_m
    }

    /// Column count.
    #[inline(always)]
    pub fn dim_n(&self) -> usize {
        self.dim_n
    }

    /// `(rows, cols)`.
    #[inline(always)]
    pub fn dims(&self) -> (usize, usize) {
        (self.dim_m, self.dim_n)
    }

    /// Returns `true` for a square matrix.
    #[inline(always)]
    pub fn is_square(&self) -> bool {
        self.dim_m == self.dim_n
    }

    /// All rows.
    #[inline(always)]
    pub fn rows(&self) -> &[BitRow] {
        &self.rows
    }

    /// All columns.
    #[inline(always)]
    pub fn cols(&self) -> &[BitRow] {
        &self.cols
    }

    /// Row `m` (successors of node `m`).
    ///
    /// # Panics
    /// Panics if `m >= dim_m`.
    #[inline(always)]
    pub fn row(&self, m: usize) -> &BitRow {
        &self.rows[m]
    }

    /// Column `n` (predecessors of node `n`).
    ///
    /// # Panics
    /// Panics if `n >= dim_n`.
    #[inline(always)]
    pub fn col(&self, n: usize) -> &BitRow {
        &self.cols[n]
    }

    /// Cell `(m, n)`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    #[inline(always)]
    pub fn get(&self, m: usize, n: usize) -> bool {
        self.rows[m].get(n)
    }

    /// Number of set cells.
    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(BitRow::count_ones).sum()
    }

    /// Rows as `0/1` strings.
    pub fn row_strings(&self) -> Vec<String> {
        self.rows.iter().map(BitRow::to_bit_string).collect()
    }

    // ------------------------------------------------------------------------
    // Algebra
    // ------------------------------------------------------------------------

    /// Element-wise OR.
    ///
    /// # Errors
    /// Returns [`GraphError::Dimension`] unless both operands have the same shape.
    pub fn add(&self, other: &Self) -> Result<Self> {
        if self.dims() != other.dims() {
            return Err(GraphError::Dimension {
                op: "add",
                left: self.dims(),
                right: other.dims(),
            });
        }
        let rows = self.rows.iter().zip(&other.rows).map(|(a, b)| a.or(b)).collect();
        let cols = self.cols.iter().zip(&other.cols).map(|(a, b)| a.or(b)).collect();
        Ok(Self {
            dim_m: self.dim_m,
            dim_n: self.dim_n,
            rows,
            cols,
        })
    }

    /// Boolean product: cell `(m, n)` is set iff some `i` has `self[m][i]` and `other[i][n]`.
    ///
    /// Row `m` of the result is the OR of `other.rows[i]` over the set bits `i` of
    /// `self.rows[m]`. Output rows are independent and are computed on the rayon pool once
    /// the left operand has [`PARALLEL_ROWS`] rows.
    ///
    /// # Errors
    /// Returns [`GraphError::Dimension`] if `self.dim_n != other.dim_m`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.dim_n != other.dim_m {
            return Err(GraphError::Dimension {
                op: "multiply",
                left: self.dims(),
                right: other.dims(),
            });
        }
        let rows = other.product_of_rows(&self.rows);
        Ok(Self::from_rows_unchecked(rows, other.dim_n))
    }

    /// Rows of `left * self`, where `left` is given only by its rows (each `dim_m` bits wide).
    pub(crate) fn product_of_rows(&self, left: &[BitRow]) -> Vec<BitRow> {
        debug_assert!(left.iter().all(|r| r.len() == self.dim_m));
        if left.len() >= PARALLEL_ROWS {
            left.par_iter().map(|r| product_row(r, self)).collect()
        } else {
            left.iter().map(|r| product_row(r, self)).collect()
        }
    }

    /// Swaps rows and columns.
    pub fn transpose(&self) -> Self {
        Self {
            dim_m: self.dim_n,
            dim_n: self.dim_m,
            rows: self.cols.clone(),
            cols: self.rows.clone(),
        }
    }

    /// Adds every self loop (`M + I`).
    ///
    /// # Errors
    /// Returns [`GraphError::NotSquare`] for rectangular matrices.
    pub fn with_unit(&self) -> Result<Self> {
        self.require_square()?;
        let mut out = self.clone();
        for i in 0..self.dim_m {
            out.rows[i].set(i);
            out.cols[i].set(i);
        }
        Ok(out)
    }

    /// Removes every self loop.
    ///
    /// # Errors
    /// Returns [`GraphError::NotSquare`] for rectangular matrices.
    pub fn without_unit(&self) -> Result<Self> {
        self.require_square()?;
        let mut out = self.clone();
        for i in 0..self.dim_m {
            out.rows[i].clear(i);
            out.cols[i].clear(i);
        }
        Ok(out)
    }

    /// # Errors
    /// Returns [`GraphError::NotSquare`] for rectangular matrices.
    pub(crate) fn require_square(&self) -> Result<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(GraphError::NotSquare {
                rows: self.dim_m,
                cols: self.dim_n,
            })
        }
    }

    // ------------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------------

    /// Every edge has its reverse (`rows == cols`). Rectangular matrices are never symmetric.
    pub fn is_symmetric(&self) -> bool {
        self.is_square() && self.rows == self.cols
    }

    /// Every node with an outgoing edge has at least one successor that also points back.
    pub fn is_minimally_symmetric_predecessor(&self) -> bool {
        self.is_square()
            && self
                .rows
                .iter()
                .zip(&self.cols)
                .all(|(row, col)| row.is_zero() || row.intersects(col))
    }

    /// Every node with an incoming edge has at least one predecessor it also points to.
    pub fn is_minimally_symmetric_successor(&self) -> bool {
        self.is_square()
            && self
                .rows
                .iter()
                .zip(&self.cols)
                .all(|(row, col)| col.is_zero() || col.intersects(row))
    }

    /// Every node loops on itself.
    pub fn is_reflexive(&self) -> bool {
        self.is_square() && (0..self.dim_m).all(|i| self.rows[i].get(i))
    }

    // ------------------------------------------------------------------------
    // Exports
    // ------------------------------------------------------------------------

    /// Cells as `0/1` bytes, one vector per row.
    pub fn to_bool_grid(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| (0..self.dim_n).map(|n| u8::from(row.get(n))).collect())
            .collect()
    }

    /// Set cells as `(row, col)` pairs in row-major order.
    pub fn to_edge_list(&self) -> Vec<(usize, usize)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(m, row)| row.iter_ones().map(move |n| (m, n)))
            .collect()
    }

    /// Writes one `0/1` line per row.
    ///
    /// # Errors
    /// Propagates I/O errors from `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for row in &self.rows {
            writeln!(writer, "{row}")?;
        }
        Ok(())
    }
}

#[inline]
fn product_row(row: &BitRow, other: &BitMatrix) -> BitRow {
    let mut out = BitRow::zeros(other.dim_n);
    for i in row.iter_ones() {
        out.or_assign(&other.rows[i]);
    }
    out
}

fn transpose_rows(rows: &[BitRow], dim_m: usize, dim_n: usize) -> Vec<BitRow> {
    let mut cols = vec![BitRow::zeros(dim_m); dim_n];
    for (m, row) in rows.iter().enumerate() {
        for n in row.iter_ones() {
            cols[n].set(m);
        }
    }
    cols
}

impl PartialEq for BitMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.dim_m == other.dim_m && self.dim_n == other.dim_n && self.rows == other.rows
    }
}

impl Eq for BitMatrix {}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dim {},{}", self.dim_m, self.dim_n)?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.row_strings().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(lines: &[&str]) -> BitMatrix {
        BitMatrix::from_bit_strings(lines).unwrap()
    }

    /// Cell-by-cell product: `rows[m] & other.cols[n] != 0`.
    fn reference_product(a: &BitMatrix, b: &BitMatrix) -> BitMatrix {
        let grid: Vec<Vec<bool>> = (0..a.dim_m())
            .map(|i| (0..b.dim_n()).map(|j| a.row(i).intersects(b.col(j))).collect())
            .collect();
        BitMatrix::from_bools(&grid).unwrap()
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    #[test]
    fn int_rows_are_big_endian() {
        let a = BitMatrix::from_int_rows(&[1, 4, 2], 5).unwrap();
        assert_eq!(format!("{a:?}"), "00001,00100,00010");
        let col_values: Vec<u64> = a.cols().iter().map(|c| c.to_u64().unwrap()).collect();
        assert_eq!(col_values, vec![0, 0, 2, 1, 4]);
    }

    #[test]
    fn int_rows_reject_wide_values() {
        let err = BitMatrix::from_int_rows(&[1, 64], 5).unwrap_err();
        assert!(matches!(err, GraphError::RowWidth { row: 1, .. }));
    }

    #[test]
    fn ragged_inputs_are_dimension_errors() {
        let err = BitMatrix::from_bools(&[vec![true, false], vec![true]]).unwrap_err();
        assert!(matches!(err, GraphError::RaggedRow { row: 1, .. }));
        let err = BitMatrix::from_bit_strings(&["010", "01"]).unwrap_err();
        assert!(matches!(err, GraphError::RaggedRow { row: 1, .. }));
        let err = BitMatrix::from_rows(vec![BitRow::zeros(3), BitRow::zeros(4)], 3).unwrap_err();
        assert!(matches!(err, GraphError::RowWidth { row: 1, .. }));
    }

    #[test]
    fn build_dispatches_every_source() {
        assert_eq!(
            BitMatrix::build(MatrixSource::Empty { dim_m: 2, dim_n: 3 }).unwrap().dims(),
            (2, 3)
        );
        assert_eq!(
            BitMatrix::build(MatrixSource::Unit(3)).unwrap(),
            m(&["100", "010", "001"])
        );
        let grid = vec![vec![false, true], vec![true, false]];
        assert_eq!(
            BitMatrix::build(MatrixSource::Boolean(grid)).unwrap(),
            m(&["01", "10"])
        );
        let rows = vec![BitRow::from_bit_str("01").unwrap(); 2];
        assert_eq!(
            BitMatrix::build(MatrixSource::Matrix { rows, dim_n: 2 }).unwrap(),
            m(&["01", "01"])
        );
        let ne = MatrixSource::NodesEdges {
            nodes: vec![],
            edges: vec![("b".into(), "a".into())],
        };
        assert_eq!(BitMatrix::build(ne).unwrap(), m(&["00", "10"]));
        let spec = RandomSpec::square(8, 500);
        assert_eq!(
            BitMatrix::build(MatrixSource::Random(spec.clone())).unwrap(),
            BitMatrix::build(MatrixSource::Random(spec)).unwrap()
        );
    }

    #[test]
    fn random_honours_level_and_diagonal() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        let full = BitMatrix::random(
            &mut rng,
            &RandomSpec {
                level: 1000,
                ..RandomSpec::square(10, 0)
            },
        );
        assert_eq!(full.edge_count(), 90);
        assert!(full.without_unit().unwrap() == full);

        let reflexive = BitMatrix::random(
            &mut rng,
            &RandomSpec {
                diagonal: Diagonal::Filled,
                ..RandomSpec::square(10, 0)
            },
        );
        assert_eq!(reflexive, BitMatrix::unit(10));
    }

    #[test]
    fn random_level_is_clamped_to_certainty() {
        let mut rng = XorShiftRng::seed_from_u64(8);
        let spec = RandomSpec {
            diagonal: Diagonal::Untouched,
            ..RandomSpec::square(12, 5000)
        };
        let m = BitMatrix::random(&mut rng, &spec);
        assert!(m.rows().iter().all(BitRow::is_full));
        assert!(m.cols().iter().all(BitRow::is_full));
    }

    // -------------------------------------------------------------------------
    // Algebra
    // -------------------------------------------------------------------------

    #[test]
    fn add_is_or_and_checks_shape() {
        let a = m(&["100", "000"]);
        let b = m(&["001", "010"]);
        assert_eq!(a.add(&b).unwrap(), m(&["101", "010"]));
        let err = a.add(&BitMatrix::empty(3, 3)).unwrap_err();
        assert!(matches!(err, GraphError::Dimension { op: "add", .. }));
    }

    #[test]
    fn product_matches_reference_small() {
        let a = m(&["0000", "0010", "1001", "0101"]);
        let squared = a.multiply(&a).unwrap();
        assert_eq!(squared, m(&["0000", "1001", "0101", "0111"]));
        assert_eq!(squared, reference_product(&a, &a));
    }

    #[test]
    fn product_matches_reference_random_rectangular() {
        let mut rng = XorShiftRng::seed_from_u64(0xC0FFEE);
        for _ in 0..20 {
            let k = rng.random_range(1..90);
            let left = RandomSpec {
                dim_m: rng.random_range(1..90),
                dim_n: k,
                level: rng.random_range(0..400),
                diagonal: Diagonal::Untouched,
                seed: 0,
            };
            let right = RandomSpec {
                dim_m: k,
                dim_n: rng.random_range(1..90),
                level: rng.random_range(0..400),
                diagonal: Diagonal::Untouched,
                seed: 0,
            };
            let a = BitMatrix::random(&mut rng, &left);
            let b = BitMatrix::random(&mut rng, &right);
            assert_eq!(a.multiply(&b).unwrap(), reference_product(&a, &b));
        }
    }

    #[test]
    fn parallel_product_matches_reference() {
        let mut rng = XorShiftRng::seed_from_u64(0xBEEF);
        let a = BitMatrix::random(&mut rng, &RandomSpec::square(PARALLEL_ROWS + 44, 10));
        let product = a.multiply(&a).unwrap();
        assert_eq!(product, reference_product(&a, &a));
        assert_eq!(product.cols(), product.transpose().rows());
    }

    #[test]
    fn multiply_checks_inner_dimension() {
        let err = BitMatrix::empty(2, 3)
            .multiply(&BitMatrix::empty(2, 3))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::Dimension {
                op: "multiply",
                left: (2, 3),
                right: (2, 3)
            }
        );
    }

    #[test]
    fn transpose_is_an_involution() {
        let mut rng = XorShiftRng::seed_from_u64(11);
        for _ in 0..20 {
            let spec = RandomSpec {
                dim_m: rng.random_range(0..70),
                dim_n: rng.random_range(0..70),
                level: 300,
                diagonal: Diagonal::Untouched,
                seed: 0,
            };
            let a = BitMatrix::random(&mut rng, &spec);
            assert_eq!(a.transpose().transpose(), a);
            assert_eq!(a.transpose().rows(), a.cols());
        }
    }

    #[test]
    fn unit_round_trip_without_self_loops() {
        let mut rng = XorShiftRng::seed_from_u64(3);
        for dim in 1..40 {
            let a = BitMatrix::random(&mut rng, &RandomSpec::square(dim, 250));
            let with = a.with_unit().unwrap();
            assert!(with.is_reflexive());
            assert_eq!(with.without_unit().unwrap(), a);
        }
        assert!(matches!(
            BitMatrix::empty(2, 3).with_unit(),
            Err(GraphError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    // -------------------------------------------------------------------------
    // Predicates
    // -------------------------------------------------------------------------

    #[test]
    fn full_symmetry_implies_minimal_symmetries() {
        let mut rng = XorShiftRng::seed_from_u64(21);
        for dim in 1..30 {
            let a = BitMatrix::random(&mut rng, &RandomSpec::square(dim, 200));
            let sym = a.add(&a.transpose()).unwrap();
            assert!(sym.is_symmetric());
            assert!(sym.is_minimally_symmetric_predecessor());
            assert!(sym.is_minimally_symmetric_successor());
        }
    }

    #[test]
    fn minimal_symmetry_directions_differ() {
        // 0 -> 1, 1 -> 0, 2 -> 0: node 2 never gets an edge back.
        let a = m(&["010", "100", "100"]);
        assert!(!a.is_symmetric());
        assert!(!a.is_minimally_symmetric_predecessor());
        assert!(a.is_minimally_symmetric_successor());
        assert!(!a.transpose().is_minimally_symmetric_successor());
    }

    #[test]
    fn exports_and_display() {
        let a = m(&["01", "11"]);
        assert_eq!(a.to_bool_grid(), vec![vec![0, 1], vec![1, 1]]);
        assert_eq!(a.to_edge_list(), vec![(0, 1), (1, 0), (1, 1)]);
        assert_eq!(a.to_string(), "dim 2,2\n01\n11\n");
        let mut out = Vec::new();
        a.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "01\n11\n");
    }
}
