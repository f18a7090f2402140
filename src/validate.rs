//! Deterministic cross-checks: every closure strategy against an independent search.

use crate::analysis::ClosureAnalysis;
use crate::closure::{compute_closure, ClosureOptions, ClosureResult, ClosureVariant};
use crate::factor::OptimizeMode;
use crate::graph::parse_adjacency_matrix;
use crate::matrix::BitMatrix;

/// Strategies compared by [`cross_check_closures`]; the optimized ones only run reflexive.
const STRATEGIES: [ClosureVariant; 6] = [
    ClosureVariant::Reflexive,
    ClosureVariant::Matrices,
    ClosureVariant::Slides,
    ClosureVariant::Optimized(OptimizeMode::None),
    ClosureVariant::Optimized(OptimizeMode::Soft),
    ClosureVariant::Optimized(OptimizeMode::Hard),
];

// ============================================================================
// Public API
// ============================================================================

/// Validates the bundled matrices:
/// - `two_loops.txt`: two cycles through a shared node, one isolated node
/// - `fan.txt`: a source feeding a strongly connected core
/// - `ring.txt`: strongly connected
///
/// # Errors
/// Returns an error message if any bundled matrix fails validation.
pub fn validate_known_matrices() -> Result<(), String> {
    validate_case(include_str!("../data/two_loops.txt"), "two_loops.txt", false)?;
    validate_case(include_str!("../data/fan.txt"), "fan.txt", false)?;
    validate_case(include_str!("../data/ring.txt"), "ring.txt", true)?;
    Ok(())
}

/// Runs every strategy, reflexive and not, and compares each closure with breadth-first
/// reachability.
///
/// # Errors
/// Returns an error message naming the first strategy that disagrees.
pub fn cross_check_closures(m: &BitMatrix) -> Result<(), String> {
    for add_unit in [true, false] {
        let expected = reachability(m, add_unit)?;
        for variant in STRATEGIES {
            if matches!(variant, ClosureVariant::Optimized(_)) && !add_unit {
                continue;
            }
            let options = ClosureOptions {
                add_unit,
                full: false,
            };
            let result = compute_closure(m, variant, options).map_err(|e| e.to_string())?;
            check_result(&result, &expected)
                .map_err(|e| format!("{variant:?} (add_unit={add_unit}): {e}"))?;
        }
    }
    Ok(())
}

/// Reachability by breadth-first search from each node: cell `(s, t)` is set when a path of
/// at least one edge leads from `s` to `t`, or when `reflexive` and `s == t`.
///
/// # Errors
/// Returns an error message for non-square matrices.
pub fn reachability(m: &BitMatrix, reflexive: bool) -> Result<BitMatrix, String> {
    if !m.is_square() {
        return Err(format!("matrix is {}x{}, expected square", m.dim_m(), m.dim_n()));
    }
    let n = m.dim_m();
    let mut grid = Vec::with_capacity(n);
    for s in 0..n {
        let mut seen = vec![false; n];
        let mut frontier: Vec<usize> = m.row(s).iter_ones().collect();
        while let Some(v) = frontier.pop() {
            if !seen[v] {
                seen[v] = true;
                frontier.extend(m.row(v).iter_ones().filter(|&w| !seen[w]));
            }
        }
        if reflexive {
            seen[s] = true;
        }
        grid.push(seen);
    }
    BitMatrix::from_bools(&grid).map_err(|e| e.to_string())
}

// ============================================================================
// Internal
// ============================================================================

fn check_result(result: &ClosureResult, expected: &BitMatrix) -> Result<(), String> {
    if result.closure != *expected {
        let wrong = result
            .closure
            .rows()
            .iter()
            .zip(expected.rows())
            .position(|(got, want)| got != want)
            .unwrap_or(0);
        return Err(format!(
            "row {wrong} is {}, expected {}",
            result.closure.row(wrong),
            expected.row(wrong)
        ));
    }
    if result.closure.cols() != expected.cols() {
        return Err("column duals out of sync with rows".to_owned());
    }
    Ok(())
}

fn validate_case(text: &str, name: &str, connected_fully: bool) -> Result<(), String> {
    let m = parse_adjacency_matrix(text).map_err(|e| format!("{name}: {e}"))?;
    cross_check_closures(&m).map_err(|e| format!("{name}: {e}"))?;

    let result = compute_closure(&m, ClosureVariant::Reflexive, ClosureOptions::default())
        .map_err(|e| format!("{name}: {e}"))?;
    let analysis = ClosureAnalysis::new(&result).map_err(|e| format!("{name}: {e}"))?;
    if analysis.is_connected_fully() != connected_fully {
        return Err(format!(
            "{name}: expected connected_fully={connected_fully}, found {}",
            !connected_fully
        ));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
