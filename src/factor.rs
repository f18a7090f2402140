//! Exponent factorization for logarithmic powering of any associative product.
//!
//! An exponent `e` is split into its set bit positions `b` (`e = sum 2^b`), and each `b` is
//! itself split into its set bit positions (its *elementary* set, `b = sum 2^k`). Because
//! `X^(2^b)` is `X` squared `b` times, and `b` is a sum of powers of two, terms that share an
//! elementary bit `k` can share the final `2^k` squarings:
//!
//! ```text
//! X^(2^b1) * X^(2^b2) = (X^(2^(b1 - 2^k)) * X^(2^(b2 - 2^k)))^(2^(2^k))
//! ```
//!
//! [`FactorPlan::decompose`] builds that sharing as a tree of [`Factor`]s; [`FactorPlan::power`]
//! folds the tree with [`Multiply`].
//!
//! ## Example
//!
//! ```
//! use bitgraph::factor::{FactorPlan, OptimizeMode};
//! use num_bigint::BigUint;
//!
//! let plan = FactorPlan::decompose(242, OptimizeMode::None).unwrap();
//! let out = plan.power(&BigUint::from(2u32)).unwrap();
//! assert_eq!(out.result, BigUint::from(1u32) << 242usize);
//! assert_eq!(out.operations, plan.operations());
//! ```

use crate::error::{GraphError, Result};
use crate::matrix::BitMatrix;
use num_bigint::BigUint;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

// ============================================================================
// Optimize mode
// ============================================================================

/// How the requested exponent may be rounded upward before decomposition.
///
/// Rounding only makes sense for idempotent-at-the-limit products such as a reflexive
/// closure, where any exponent past the fixed point yields the same result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OptimizeMode {
    /// Use the exponent as given.
    #[default]
    None,
    /// Smallest exponent `>= e` with fewer set bits (carry the lowest run of ones until the
    /// bit count drops).
    Soft,
    /// Next power of two `>= e`.
    Hard,
}

impl OptimizeMode {
    /// Rounds `e` according to the mode. `0` and powers of two are returned unchanged.
    ///
    /// # Errors
    /// Returns [`GraphError::ExponentOverflow`] if the rounded value exceeds `u64`.
    pub fn round(self, e: u64) -> Result<u64> {
        if e == 0 || e.is_power_of_two() {
            return Ok(e);
        }
        match self {
            OptimizeMode::None => Ok(e),
            OptimizeMode::Hard => e
                .checked_next_power_of_two()
                .ok_or(GraphError::ExponentOverflow(e)),
            OptimizeMode::Soft => {
                let mut x = e;
                loop {
                    let low = x & x.wrapping_neg();
                    x = x.checked_add(low).ok_or(GraphError::ExponentOverflow(e))?;
                    if x.count_ones() < e.count_ones() {
                        return Ok(x);
                    }
                }
            }
        }
    }
}

impl FromStr for OptimizeMode {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(OptimizeMode::None),
            "soft" => Ok(OptimizeMode::Soft),
            "hard" => Ok(OptimizeMode::Hard),
            _ => Err(GraphError::UnknownOptimizeMode(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptimizeMode::None => "none",
            OptimizeMode::Soft => "soft",
            OptimizeMode::Hard => "hard",
        })
    }
}

// ============================================================================
// Multiply
// ============================================================================

/// An associative product. Implemented for matrices and integers.
pub trait Multiply: Sized {
    /// Returns `self * other`.
    ///
    /// # Errors
    /// Implementations report shape or overflow failures.
    fn multiply(&self, other: &Self) -> Result<Self>;
}

impl Multiply for BitMatrix {
    fn multiply(&self, other: &Self) -> Result<Self> {
        BitMatrix::multiply(self, other)
    }
}

impl Multiply for u64 {
    fn multiply(&self, other: &Self) -> Result<Self> {
        self.checked_mul(*other).ok_or(GraphError::ArithmeticOverflow)
    }
}

impl Multiply for u128 {
    fn multiply(&self, other: &Self) -> Result<Self> {
        self.checked_mul(*other).ok_or(GraphError::ArithmeticOverflow)
    }
}

impl Multiply for BigUint {
    fn multiply(&self, other: &Self) -> Result<Self> {
        Ok(self * other)
    }
}

// ============================================================================
// Plan tree
// ============================================================================

/// Node of a factorization tree over a base `X`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Factor {
    /// `X^(2^r)`, read from the squaring cache.
    Leaf(u32),
    /// `(product of children)^(2^(2^pivot))`.
    Group {
        /// Elementary bit shared by every child.
        pivot: u32,
        /// Factors whose product is raised.
        children: Vec<Factor>,
    },
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Leaf(r) => write!(f, "{r}"),
            Factor::Group { pivot, children } => {
                write!(f, "{{{pivot}: [")?;
                write_list(f, children)?;
                f.write_str("]}")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, factors: &[Factor]) -> fmt::Result {
    for (i, factor) in factors.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{factor}")?;
    }
    Ok(())
}

/// Result of [`FactorPlan::power`].
#[derive(Clone, Debug)]
pub struct PowerOutcome<T> {
    /// `X^exponent`.
    pub result: T,
    /// Fold and raise operations implied by the tree (same as [`FactorPlan::count`]).
    pub operations: usize,
    /// Actual `multiply` calls, squarings included.
    pub multiplications: usize,
}

/// A decomposed exponent, reusable across bases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactorPlan {
    requested: u64,
    exponent: u64,
    mode: OptimizeMode,
    exponents_of_two: Vec<u32>,
    elementaries: Vec<BTreeSet<u32>>,
    factors: Vec<Factor>,
    count: usize,
}

impl FactorPlan {
    /// Rounds `requested` per `mode` and builds the factorization tree.
    ///
    /// # Errors
    /// Returns [`GraphError::ExponentOverflow`] if rounding leaves the `u64` range.
    pub fn decompose(requested: u64, mode: OptimizeMode) -> Result<Self> {
        let exponent = mode.round(requested)?;
        let exponents_of_two = set_bits(exponent);
        let elementaries = exponents_of_two
            .iter()
            .map(|&b| set_bits(u64::from(b)).into_iter().collect())
            .collect();
        let factors = group_by_pivots(&exponents_of_two);
        let count = implied_operations(&factors);
        trace!(requested, exponent, %mode, count, "decomposed exponent");
        Ok(Self {
            requested,
            exponent,
            mode,
            exponents_of_two,
            elementaries,
            factors,
            count,
        })
    }

    /// Exponent as requested.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Exponent after rounding; the plan computes `X^exponent`.
    pub fn exponent(&self) -> u64 {
        self.exponent
    }

    /// Rounding mode used.
    pub fn mode(&self) -> OptimizeMode {
        self.mode
    }

    /// Set bit positions of the exponent, ascending.
    pub fn exponents_of_two(&self) -> &[u32] {
        &self.exponents_of_two
    }

    /// For each entry of [`exponents_of_two`](Self::exponents_of_two), its own set bit positions.
    pub fn elementaries(&self) -> &[BTreeSet<u32>] {
        &self.elementaries
    }

    /// Top-level factors; their product is `X^exponent`.
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Fold and raise operations implied by the tree.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Computes `base^exponent`.
    ///
    /// Squarings `X^(2^r)` are cached and extended on demand; identical subtrees are
    /// evaluated once.
    ///
    /// # Errors
    /// Returns [`GraphError::ZeroExponent`] for an empty plan and propagates `multiply` errors.
    pub fn power<T: Multiply + Clone>(&self, base: &T) -> Result<PowerOutcome<T>> {
        let mut folder = Powers {
            bases: vec![base.clone()],
            memo: HashMap::new(),
            multiplications: 0,
        };
        let result = evaluate(&mut folder, &self.factors)?.ok_or(GraphError::ZeroExponent)?;
        Ok(PowerOutcome {
            result,
            operations: self.count,
            multiplications: folder.multiplications,
        })
    }

    /// Dry run: counts fold and raise operations without any base object.
    pub fn operations(&self) -> usize {
        let mut counter = OpCounter(0);
        evaluate(&mut counter, &self.factors).map_or(0, |_| counter.0)
    }

    /// Folds the tree additively (`X^(2^r)` becomes `2^r`); equals [`exponent`](Self::exponent).
    ///
    /// # Errors
    /// Returns [`GraphError::ArithmeticOverflow`] if an intermediate leaves `u128`.
    pub fn evaluate_exponent(&self) -> Result<u128> {
        Ok(evaluate(&mut Exponents, &self.factors)?.unwrap_or(0))
    }
}

impl fmt::Display for FactorPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}): [",
            self.requested, self.exponent, self.mode
        )?;
        write_list(f, &self.factors)?;
        write!(f, "] ops={}", self.count)
    }
}

// ============================================================================
// Decomposition
// ============================================================================

fn set_bits(mut x: u64) -> Vec<u32> {
    let mut out = Vec::with_capacity(x.count_ones() as usize);
    while x != 0 {
        out.push(x.trailing_zeros());
        x &= x - 1;
    }
    out
}

fn leaves(sets: Vec<u64>) -> impl Iterator<Item = Factor> {
    sets.into_iter().map(|s| Factor::Leaf(s as u32))
}

/// One grouping level: residual sets (as bit masks) and the pivots still to try.
struct Level {
    pivot: Option<u32>,
    sets: Vec<u64>,
    pivots: Vec<u32>,
    next: usize,
    children: Vec<Factor>,
}

impl Level {
    fn new(pivot: Option<u32>, sets: Vec<u64>) -> Self {
        let union = sets.iter().fold(0u64, |acc, s| acc | s);
        let mut pivots = set_bits(union);
        pivots.reverse();
        Self {
            pivot,
            sets,
            pivots,
            next: 0,
            children: Vec::new(),
        }
    }
}

/// Groups the elementary sets of `exponents_of_two` under descending pivots.
///
/// The elementary set of bit position `b` is the bit mask `b` itself, so residual sets are
/// stored as masks and a leaf's residual is directly its squaring index.
fn group_by_pivots(exponents_of_two: &[u32]) -> Vec<Factor> {
    let sets: Vec<u64> = exponents_of_two.iter().map(|&b| u64::from(b)).collect();
    if sets.iter().all(|s| s.count_ones() <= 1) {
        return leaves(sets).collect();
    }

    let mut stack = vec![Level::new(None, sets)];
    while let Some(level) = stack.last_mut() {
        if let Some(&pivot) = level.pivots.get(level.next) {
            level.next += 1;
            let bit = 1u64 << pivot;
            let (contain, rest): (Vec<u64>, Vec<u64>) =
                level.sets.iter().copied().partition(|s| s & bit != 0);
            if contain.is_empty() {
                continue;
            }
            level.sets = rest;
            let stripped: Vec<u64> = contain.into_iter().map(|s| s & !bit).collect();
            if stripped.iter().all(|s| s.count_ones() <= 1) {
                level.children.push(Factor::Group {
                    pivot,
                    children: leaves(stripped).collect(),
                });
            } else {
                stack.push(Level::new(Some(pivot), stripped));
            }
            continue;
        }

        let Some(mut done) = stack.pop() else { break };
        let remaining = std::mem::take(&mut done.sets);
        done.children.extend(leaves(remaining));
        match (done.pivot, stack.last_mut()) {
            (Some(pivot), Some(parent)) => parent.children.push(Factor::Group {
                pivot,
                children: done.children,
            }),
            _ => return done.children,
        }
    }
    Vec::new()
}

/// `(len - 1)` folds per factor list plus one raise per group.
fn implied_operations(factors: &[Factor]) -> usize {
    let mut count = 0;
    let mut pending = vec![factors];
    while let Some(list) = pending.pop() {
        count += list.len().saturating_sub(1);
        for factor in list {
            if let Factor::Group { children, .. } = factor {
                count += 1;
                pending.push(children);
            }
        }
    }
    count
}

// ============================================================================
// Evaluation
// ============================================================================

/// Interpretation of the tree: what a leaf is, how two values fold, how a group raises.
trait Fold {
    type Value: Clone;

    fn leaf(&mut self, r: u32) -> Result<Self::Value>;
    fn fold(&mut self, acc: Self::Value, next: &Self::Value) -> Result<Self::Value>;
    fn raise(&mut self, value: Self::Value, pivot: u32) -> Result<Self::Value>;

    fn recall(&self, _node: &Factor) -> Option<Self::Value> {
        None
    }
    fn remember(&mut self, _node: &Factor, _value: &Self::Value) {}
}

enum Step<'a> {
    Enter(&'a Factor),
    Close {
        node: &'a Factor,
        pivot: u32,
        arity: usize,
    },
}

/// Post-order walk with an explicit stack. Returns `None` for an empty factor list.
fn evaluate<F: Fold>(folder: &mut F, factors: &[Factor]) -> Result<Option<F::Value>> {
    let mut values: Vec<F::Value> = Vec::new();
    let mut stack: Vec<Step<'_>> = factors.iter().rev().map(Step::Enter).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => match node {
                Factor::Leaf(r) => values.push(folder.leaf(*r)?),
                Factor::Group { pivot, children } => {
                    if let Some(value) = folder.recall(node) {
                        values.push(value);
                        continue;
                    }
                    stack.push(Step::Close {
                        node,
                        pivot: *pivot,
                        arity: children.len(),
                    });
                    stack.extend(children.iter().rev().map(Step::Enter));
                }
            },
            Step::Close { node, pivot, arity } => {
                let Some(inner) = fold_tail(folder, &mut values, arity)? else {
                    continue;
                };
                let raised = folder.raise(inner, pivot)?;
                folder.remember(node, &raised);
                values.push(raised);
            }
        }
    }
    fold_tail(folder, &mut values, factors.len())
}

fn fold_tail<F: Fold>(
    folder: &mut F,
    values: &mut Vec<F::Value>,
    arity: usize,
) -> Result<Option<F::Value>> {
    let start = values.len().saturating_sub(arity);
    let mut tail = values.split_off(start).into_iter();
    let Some(mut acc) = tail.next() else {
        return Ok(None);
    };
    for value in tail {
        acc = folder.fold(acc, &value)?;
    }
    Ok(Some(acc))
}

/// Real products with a squaring cache `bases[r] = X^(2^r)`.
struct Powers<T> {
    bases: Vec<T>,
    memo: HashMap<Factor, T>,
    multiplications: usize,
}

impl<T: Multiply + Clone> Fold for Powers<T> {
    type Value = T;

    fn leaf(&mut self, r: u32) -> Result<T> {
        let r = r as usize;
        while self.bases.len() <= r {
            let last = &self.bases[self.bases.len() - 1];
            let squared = last.multiply(last)?;
            self.multiplications += 1;
            self.bases.push(squared);
        }
        Ok(self.bases[r].clone())
    }

    fn fold(&mut self, acc: T, next: &T) -> Result<T> {
        self.multiplications += 1;
        acc.multiply(next)
    }

    fn raise(&mut self, mut value: T, pivot: u32) -> Result<T> {
        for _ in 0..(1u64 << pivot) {
            value = value.multiply(&value)?;
            self.multiplications += 1;
        }
        Ok(value)
    }

    fn recall(&self, node: &Factor) -> Option<T> {
        self.memo.get(node).cloned()
    }

    fn remember(&mut self, node: &Factor, value: &T) {
        self.memo.insert(node.clone(), value.clone());
    }
}

struct OpCounter(usize);

impl Fold for OpCounter {
    type Value = ();

    fn leaf(&mut self, _r: u32) -> Result<()> {
        Ok(())
    }

    fn fold(&mut self, _acc: (), _next: &()) -> Result<()> {
        self.0 += 1;
        Ok(())
    }

    fn raise(&mut self, _value: (), _pivot: u32) -> Result<()> {
        self.0 += 1;
        Ok(())
    }
}

/// Additive reading of the tree over exponents.
struct Exponents;

impl Fold for Exponents {
    type Value = u128;

    fn leaf(&mut self, r: u32) -> Result<u128> {
        1u128.checked_shl(r).ok_or(GraphError::ArithmeticOverflow)
    }

    fn fold(&mut self, acc: u128, next: &u128) -> Result<u128> {
        acc.checked_add(*next).ok_or(GraphError::ArithmeticOverflow)
    }

    fn raise(&mut self, value: u128, pivot: u32) -> Result<u128> {
        let shift = 1u32 << pivot;
        if value.leading_zeros() < shift {
            return Err(GraphError::ArithmeticOverflow);
        }
        Ok(value << shift)
    }
}
