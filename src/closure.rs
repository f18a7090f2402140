//! Transitive closure of a square [`BitMatrix`].
//!
//! Three strategies compute the same relation:
//! - [`closure_reflexive`]: fixed-point iteration of a single running product.
//! - [`closure_matrix`] / [`closure_slides`]: keep every power `B^k` (as matrices or raw rows)
//!   and OR them together; the retained powers answer shortest-distance queries.
//! - [`closure_reflexive_optimized`]: `(M + I)^(dim - 1)` through a [`FactorPlan`].
//!
//! With `add_unit` the closure is reflexive: every node reaches itself in zero steps.
//! Without it, bit `(m, n)` is set only if `n` is reachable from `m` in at least one step.

use crate::bitrow::BitRow;
use crate::error::{GraphError, Result};
use crate::factor::{FactorPlan, OptimizeMode};
use crate::matrix::BitMatrix;
use tracing::debug;

// ============================================================================
// Configuration and results
// ============================================================================

/// Options shared by the iterative strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosureOptions {
    /// Augment the input with the identity (reflexive closure).
    pub add_unit: bool,
    /// Keep iterating to the rank limit instead of stopping at the first fixed point.
    pub full: bool,
}

impl Default for ClosureOptions {
    fn default() -> Self {
        Self {
            add_unit: true,
            full: false,
        }
    }
}

/// Closure strategy selector for [`compute_closure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosureVariant {
    /// Fixed-point iteration ([`closure_reflexive`]).
    Reflexive,
    /// Retained powers as matrices ([`closure_matrix`]).
    Matrices,
    /// Retained powers as raw rows ([`closure_slides`]).
    Slides,
    /// Factorized exponentiation ([`closure_reflexive_optimized`]).
    Optimized(OptimizeMode),
}

/// Powers `B^1, B^2, ...` retained by the slide strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intermediates {
    /// Full matrices.
    Matrices(Vec<BitMatrix>),
    /// Row vectors only.
    Slides(Vec<Vec<BitRow>>),
}

impl Intermediates {
    /// Number of retained powers.
    pub fn len(&self) -> usize {
        match self {
            Intermediates::Matrices(ms) => ms.len(),
            Intermediates::Slides(ss) => ss.len(),
        }
    }

    /// Returns `true` if nothing was retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `node` of the power at `index` (`index` 0 is `B^1`).
    pub fn row(&self, index: usize, node: usize) -> Option<&BitRow> {
        match self {
            Intermediates::Matrices(ms) => ms.get(index).and_then(|m| m.rows().get(node)),
            Intermediates::Slides(ss) => ss.get(index).and_then(|rows| rows.get(node)),
        }
    }

    /// The power at `index` as a matrix.
    pub fn matrix(&self, index: usize) -> Option<BitMatrix> {
        match self {
            Intermediates::Matrices(ms) => ms.get(index).cloned(),
            Intermediates::Slides(ss) => ss.get(index).map(|rows| {
                let dim_n = rows.first().map_or(0, BitRow::len);
                BitMatrix::from_rows_unchecked(rows.clone(), dim_n)
            }),
        }
    }

    /// Smallest `k` such that the retained power `B^k` links `start` to `end`.
    ///
    /// `k` counts applications of the base `B`. For reflexive slides `B = M + I`, so a node
    /// reaches itself at `k = 1` and `k` is an upper bound on the edge count of `M`.
    pub fn distance(&self, start: usize, end: usize) -> Option<usize> {
        (0..self.len())
            .find(|&k| {
                self.row(k, start)
                    .is_some_and(|row| end < row.len() && row.get(end))
            })
            .map(|k| k + 1)
    }
}

/// Outcome of a closure computation.
#[derive(Clone, Debug)]
pub struct ClosureResult {
    /// The input matrix.
    pub original: BitMatrix,
    /// The closure.
    pub closure: BitMatrix,
    /// Retained powers (slide strategies only).
    pub intermediates: Option<Intermediates>,
    /// Whether the closure counts zero-step reachability.
    pub reflexive: bool,
    /// Rank at which iteration stopped (iterative strategies only).
    pub deep: Option<usize>,
    /// Fold and raise operations of the factor plan (optimized strategy only).
    pub operations: Option<usize>,
    /// Strategy that produced this result.
    pub variant: ClosureVariant,
}

// ============================================================================
// Strategies
// ============================================================================

/// Computes the closure with the selected strategy.
///
/// `options` is ignored by [`ClosureVariant::Optimized`], which is always reflexive.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] or [`GraphError::NotSquare`] for unusable input.
pub fn compute_closure(
    m: &BitMatrix,
    variant: ClosureVariant,
    options: ClosureOptions,
) -> Result<ClosureResult> {
    match variant {
        ClosureVariant::Reflexive => closure_reflexive(m, options),
        ClosureVariant::Matrices => closure_matrix(m, options),
        ClosureVariant::Slides => closure_slides(m, options),
        ClosureVariant::Optimized(mode) => closure_reflexive_optimized(m, mode),
    }
}

/// Fixed-point iteration.
///
/// With `add_unit` it iterates `P <- P * (M + I)`; otherwise the running union
/// `C <- M + C * M`. Iteration stops when an iterate equals its predecessor (unless
/// `options.full`) or at the rank limit: `dim - 1` when reflexive, `dim` otherwise, since a
/// cycle through every node needs `dim` steps to return.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] or [`GraphError::NotSquare`] for unusable input.
pub fn closure_reflexive(m: &BitMatrix, options: ClosureOptions) -> Result<ClosureResult> {
    let base = prepare(m, options.add_unit)?;
    let limit = rank_limit(m.dim_m(), options.add_unit);

    let mut current = base.clone();
    let mut deep = 1;
    while deep < limit {
        let product = current.multiply(&base)?;
        let next = if options.add_unit {
            product
        } else {
            base.add(&product)?
        };
        if next == current && !options.full {
            break;
        }
        current = next;
        deep += 1;
    }
    debug!(dim = m.dim_m(), deep, reflexive = options.add_unit, "closure by iteration");

    Ok(ClosureResult {
        original: m.clone(),
        closure: current,
        intermediates: None,
        reflexive: options.add_unit,
        deep: Some(deep),
        operations: None,
        variant: ClosureVariant::Reflexive,
    })
}

/// Retains every power `B^k` as a [`BitMatrix`] and ORs them into the closure.
///
/// Stops as soon as a new power adds nothing to the running closure (unless `options.full`);
/// that power is not retained.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] or [`GraphError::NotSquare`] for unusable input.
pub fn closure_matrix(m: &BitMatrix, options: ClosureOptions) -> Result<ClosureResult> {
    let base = prepare(m, options.add_unit)?;
    let limit = rank_limit(m.dim_m(), options.add_unit);

    let mut closure = base.clone();
    let mut powers = vec![base.clone()];
    while powers.len() < limit {
        let Some(last) = powers.last() else { break };
        let next = last.multiply(&base)?;
        let grown = closure.add(&next)?;
        if grown == closure && !options.full {
            break;
        }
        closure = grown;
        powers.push(next);
    }
    let deep = powers.len();
    debug!(dim = m.dim_m(), deep, reflexive = options.add_unit, "closure by matrix slides");

    Ok(ClosureResult {
        original: m.clone(),
        closure,
        intermediates: Some(Intermediates::Matrices(powers)),
        reflexive: options.add_unit,
        deep: Some(deep),
        operations: None,
        variant: ClosureVariant::Matrices,
    })
}

/// Same iteration as [`closure_matrix`], but powers are kept as raw rows and no column
/// duals are built until the final closure.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] or [`GraphError::NotSquare`] for unusable input.
pub fn closure_slides(m: &BitMatrix, options: ClosureOptions) -> Result<ClosureResult> {
    let base = prepare(m, options.add_unit)?;
    let limit = rank_limit(m.dim_m(), options.add_unit);

    let mut closure: Vec<BitRow> = base.rows().to_vec();
    let mut slides = vec![base.rows().to_vec()];
    while slides.len() < limit {
        let Some(last) = slides.last() else { break };
        let next = base.product_of_rows(last);
        let mut changed = false;
        for (acc, row) in closure.iter_mut().zip(&next) {
            if !row.is_subset(acc) {
                acc.or_assign(row);
                changed = true;
            }
        }
        if !changed && !options.full {
            break;
        }
        slides.push(next);
    }
    let deep = slides.len();
    debug!(dim = m.dim_m(), deep, reflexive = options.add_unit, "closure by row slides");

    Ok(ClosureResult {
        original: m.clone(),
        closure: BitMatrix::from_rows_unchecked(closure, m.dim_n()),
        intermediates: Some(Intermediates::Slides(slides)),
        reflexive: options.add_unit,
        deep: Some(deep),
        operations: None,
        variant: ClosureVariant::Slides,
    })
}

/// `(M + I)^(dim - 1)` via [`FactorPlan`]. The exponent is rounded per `mode`; any exponent
/// at or past `dim - 1` gives the same reflexive closure.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] or [`GraphError::NotSquare`] for unusable input.
pub fn closure_reflexive_optimized(m: &BitMatrix, mode: OptimizeMode) -> Result<ClosureResult> {
    let base = prepare(m, true)?;
    let dim = m.dim_m();

    let (closure, operations) = if dim == 1 {
        (base, 0)
    } else {
        let plan = FactorPlan::decompose(dim as u64 - 1, mode)?;
        let outcome = plan.power(&base)?;
        debug!(
            dim,
            exponent = plan.exponent(),
            operations = outcome.operations,
            multiplications = outcome.multiplications,
            "closure by factorized power"
        );
        (outcome.result, outcome.operations)
    };

    Ok(ClosureResult {
        original: m.clone(),
        closure,
        intermediates: None,
        reflexive: true,
        deep: None,
        operations: Some(operations),
        variant: ClosureVariant::Optimized(mode),
    })
}

fn prepare(m: &BitMatrix, add_unit: bool) -> Result<BitMatrix> {
    m.require_square()?;
    if m.dim_m() == 0 {
        return Err(GraphError::EmptyMatrix);
    }
    if add_unit {
        m.with_unit()
    } else {
        Ok(m.clone())
    }
}

#[inline]
fn rank_limit(dim: usize, reflexive: bool) -> usize {
    if reflexive {
        dim.saturating_sub(1).max(1)
    } else {
        dim
    }
}

// ============================================================================
// Connectivity depth
// ============================================================================

/// Result of [`connect`] and [`connect_nodes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectReport {
    /// Whether the condition was met.
    pub connected: bool,
    /// Rank `k` of `(M + I)^k` at which iteration stopped.
    pub deep: usize,
    /// `(M + I)^deep`.
    pub matrix: BitMatrix,
}

/// Smallest rank `k <= dim` at which every row of `(M + I)^k` is full.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] or [`GraphError::NotSquare`] for unusable input.
pub fn connect(m: &BitMatrix) -> Result<ConnectReport> {
    let base = prepare(m, true)?;
    let all_full = |p: &BitMatrix| p.rows().iter().all(BitRow::is_full);
    iterate_until(&base, m.dim_m(), all_full)
}

/// Smallest rank `k <= dim` at which `from` reaches `to` in `(M + I)^k`.
///
/// # Errors
/// Returns [`GraphError::NodeIndex`] for out-of-range nodes, otherwise as [`connect`].
pub fn connect_nodes(m: &BitMatrix, from: usize, to: usize) -> Result<ConnectReport> {
    let base = prepare(m, true)?;
    let dim = m.dim_m();
    for node in [from, to] {
        if node >= dim {
            return Err(GraphError::NodeIndex { node, dim });
        }
    }
    iterate_until(&base, dim, |p| p.get(from, to))
}

fn iterate_until<F>(base: &BitMatrix, limit: usize, done: F) -> Result<ConnectReport>
where
    F: Fn(&BitMatrix) -> bool,
{
    let mut matrix = base.clone();
    let mut deep = 1;
    let mut connected = done(&matrix);
    while !connected && deep < limit {
        matrix = matrix.multiply(base)?;
        deep += 1;
        connected = done(&matrix);
    }
    Ok(ConnectReport {
        connected,
        deep,
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Diagonal, RandomSpec};
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    const MODES: [OptimizeMode; 3] = [OptimizeMode::None, OptimizeMode::Soft, OptimizeMode::Hard];

    fn m(lines: &[&str]) -> BitMatrix {
        BitMatrix::from_bit_strings(lines).unwrap()
    }

    fn options(add_unit: bool, full: bool) -> ClosureOptions {
        ClosureOptions { add_unit, full }
    }

    /// Breadth-first reachability, one node at a time.
    fn reachability(a: &BitMatrix, reflexive: bool) -> BitMatrix {
        let n = a.dim_m();
        let grid: Vec<Vec<bool>> = (0..n)
            .map(|s| {
                let mut seen = vec![false; n];
                let mut frontier: Vec<usize> = a.row(s).iter_ones().collect();
                while let Some(v) = frontier.pop() {
                    if !seen[v] {
                        seen[v] = true;
                        frontier.extend(a.row(v).iter_ones());
                    }
                }
                if reflexive {
                    seen[s] = true;
                }
                seen
            })
            .collect();
        BitMatrix::from_bools(&grid).unwrap()
    }

    // -------------------------------------------------------------------------
    // Worked examples
    // -------------------------------------------------------------------------

    #[test]
    fn reflexive_closure_of_chain_with_loop() {
        let a = m(&["00001", "00100", "00010", "00000", "01001"]);
        let expected = m(&["11111", "01110", "00110", "00010", "01111"]);
        let opts = ClosureOptions::default();
        assert_eq!(closure_reflexive(&a, opts).unwrap().closure, expected);
        assert_eq!(closure_matrix(&a, opts).unwrap().closure, expected);
        assert_eq!(closure_slides(&a, opts).unwrap().closure, expected);
        for mode in MODES {
            assert_eq!(closure_reflexive_optimized(&a, mode).unwrap().closure, expected);
        }
    }

    #[test]
    fn slides_retain_each_power() {
        let a = m(&["0000", "0010", "1001", "0101"]);
        let result = closure_matrix(&a, options(false, false)).unwrap();
        assert_eq!(result.closure, m(&["0000", "1111", "1111", "1111"]));
        assert_eq!(result.deep, Some(3));
        let Some(Intermediates::Matrices(powers)) = &result.intermediates else {
            panic!("matrix slides expected");
        };
        assert_eq!(powers[0], a);
        assert_eq!(powers[1], m(&["0000", "1001", "0101", "0111"]));
        assert_eq!(powers[2], m(&["0000", "0101", "0111", "1111"]));

        let slides = closure_slides(&a, options(false, false)).unwrap();
        let inter = slides.intermediates.as_ref().unwrap();
        assert_eq!(inter.len(), 3);
        assert_eq!(inter.matrix(1).unwrap(), powers[1]);
        assert_eq!(inter.distance(1, 2), Some(1));
        assert_eq!(inter.distance(1, 0), Some(2));
        assert_eq!(inter.distance(0, 1), None);
        assert_eq!(inter.distance(1, 1), Some(3));
    }

    #[test]
    fn distance_counts_applications_of_the_base() {
        let a = m(&["0000", "0010", "1001", "0101"]);
        let reflexive = closure_slides(&a, options(true, false)).unwrap();
        let inter = reflexive.intermediates.as_ref().unwrap();
        // B = M + I: every node is linked to itself by B^1.
        assert_eq!(inter.distance(0, 0), Some(1));
        assert_eq!(inter.distance(1, 1), Some(1));
        assert_eq!(inter.distance(1, 0), Some(2));
        assert_eq!(inter.distance(0, 1), None);
    }

    #[test]
    fn full_runs_to_rank_limit() {
        let a = m(&["0000", "0010", "1001", "0101"]);
        let result = closure_matrix(&a, options(false, true)).unwrap();
        assert_eq!(result.deep, Some(4));
        assert_eq!(result.intermediates.as_ref().unwrap().len(), 4);
        assert_eq!(result.closure, m(&["0000", "1111", "1111", "1111"]));
        let reflexive = closure_reflexive(&a, options(true, true)).unwrap();
        assert_eq!(reflexive.deep, Some(3));
    }

    #[test]
    fn full_cycle_needs_dim_steps_without_unit() {
        // 0 -> 1 -> 2 -> 3 -> 0
        let a = m(&["0100", "0010", "0001", "1000"]);
        let all = m(&["1111", "1111", "1111", "1111"]);
        assert_eq!(closure_reflexive(&a, options(false, false)).unwrap().closure, all);
        assert_eq!(closure_matrix(&a, options(false, false)).unwrap().closure, all);
        assert_eq!(closure_slides(&a, options(false, false)).unwrap().closure, all);
    }

    // -------------------------------------------------------------------------
    // Agreement and algebraic properties
    // -------------------------------------------------------------------------

    #[test]
    fn all_strategies_agree_on_random_graphs() {
        let mut rng = XorShiftRng::seed_from_u64(0xC0FFEE);
        for _ in 0..60 {
            let spec = RandomSpec {
                diagonal: Diagonal::Untouched,
                ..RandomSpec::square(rng.random_range(1..48), rng.random_range(0..120))
            };
            let a = BitMatrix::random(&mut rng, &spec);
            for add_unit in [true, false] {
                let expected = reachability(&a, add_unit);
                for full in [false, true] {
                    let opts = options(add_unit, full);
                    assert_eq!(closure_reflexive(&a, opts).unwrap().closure, expected);
                    assert_eq!(closure_matrix(&a, opts).unwrap().closure, expected);
                    assert_eq!(closure_slides(&a, opts).unwrap().closure, expected);
                }
            }
            let expected = reachability(&a, true);
            for mode in MODES {
                assert_eq!(closure_reflexive_optimized(&a, mode).unwrap().closure, expected);
            }
        }
    }

    #[test]
    fn closure_is_idempotent() {
        let mut rng = XorShiftRng::seed_from_u64(17);
        for dim in 1..30 {
            let a = BitMatrix::random(&mut rng, &RandomSpec::square(dim, 90));
            let once = closure_reflexive(&a, ClosureOptions::default()).unwrap();
            let twice = closure_reflexive(&once.closure, ClosureOptions::default()).unwrap();
            assert_eq!(twice.closure, once.closure);
            assert_eq!(twice.deep, Some(1));
        }
    }

    #[test]
    fn dispatch_tags_the_variant() {
        let a = m(&["01", "00"]);
        let opts = ClosureOptions::default();
        let optimized =
            compute_closure(&a, ClosureVariant::Optimized(OptimizeMode::Hard), opts).unwrap();
        assert_eq!(optimized.variant, ClosureVariant::Optimized(OptimizeMode::Hard));
        assert_eq!(optimized.deep, None);
        assert_eq!(optimized.operations, Some(0));
        assert!(optimized.reflexive);
        let slides = compute_closure(&a, ClosureVariant::Slides, opts).unwrap();
        assert!(matches!(slides.intermediates, Some(Intermediates::Slides(_))));
        assert_eq!(slides.closure, optimized.closure);
    }

    // -------------------------------------------------------------------------
    // Edge cases
    // -------------------------------------------------------------------------

    #[test]
    fn single_node_needs_no_iteration() {
        let lonely = m(&["0"]);
        assert_eq!(closure_reflexive(&lonely, options(true, false)).unwrap().closure, m(&["1"]));
        assert_eq!(closure_reflexive(&lonely, options(false, false)).unwrap().closure, lonely);
        let result = closure_reflexive_optimized(&lonely, OptimizeMode::None).unwrap();
        assert_eq!(result.closure, m(&["1"]));
        assert_eq!(result.operations, Some(0));
    }

    #[test]
    fn rejects_empty_and_rectangular_input() {
        let opts = ClosureOptions::default();
        assert_eq!(
            closure_reflexive(&BitMatrix::empty(0, 0), opts).unwrap_err(),
            GraphError::EmptyMatrix
        );
        assert_eq!(
            closure_matrix(&BitMatrix::empty(2, 3), opts).unwrap_err(),
            GraphError::NotSquare { rows: 2, cols: 3 }
        );
        assert!(closure_reflexive_optimized(&BitMatrix::empty(3, 2), OptimizeMode::Soft).is_err());
    }

    // -------------------------------------------------------------------------
    // Connectivity depth
    // -------------------------------------------------------------------------

    #[test]
    fn connect_reports_rank_and_failure() {
        let a = m(&["0000", "0010", "1001", "0101"]);
        let report = connect(&a).unwrap();
        assert!(!report.connected);
        assert_eq!(report.deep, 4);
        assert_eq!(report.matrix, m(&["1000", "1111", "1111", "1111"]));

        let b = m(&["0100", "0010", "1001", "0101"]);
        let report = connect(&b).unwrap();
        assert!(report.connected);
        assert_eq!(report.deep, 3);
    }

    #[test]
    fn connect_nodes_stops_when_reached() {
        let a = m(&["0000", "0010", "1001", "0101"]);
        let report = connect_nodes(&a, 1, 2).unwrap();
        assert!(report.connected);
        assert_eq!(report.deep, 1);
        assert_eq!(report.matrix, m(&["1000", "0110", "1011", "0101"]));

        let report = connect_nodes(&a, 1, 0).unwrap();
        assert_eq!(report.deep, 2);
        assert!(!connect_nodes(&a, 0, 3).unwrap().connected);
        assert_eq!(
            connect_nodes(&a, 0, 9).unwrap_err(),
            GraphError::NodeIndex { node: 9, dim: 4 }
        );
    }
}
