//! Graph properties read off a computed closure.
//!
//! A [`ClosureAnalysis`] borrows a [`ClosureResult`] and never mutates it. Row `m` of the
//! closure is the set of nodes `m` reaches, column `m` the set of nodes reaching `m`.
//! In a reflexive closure the diagonal also records zero-step reachability, so it only
//! counts toward start, end and lonely classes when the node loops on itself.

use crate::bitrow::BitRow;
use crate::closure::ClosureResult;
use crate::error::{GraphError, Result};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Node set in ascending order.
pub type NodeSet = BTreeSet<usize>;

// ============================================================================
// Reports
// ============================================================================

/// How deep a path search may go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthLimit {
    /// Up to `dim` edges.
    #[default]
    Full,
    /// Up to the rank at which the closure stabilized (`dim` if unknown). Searches between
    /// two nodes also stop at the first depth where the target is hit.
    Shortest,
    /// Up to the given number of edges.
    Fixed(usize),
}

/// Connectivity classes of the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connectivity {
    /// Every node reaches every node.
    pub connected_fully: bool,
    /// Nodes with neither ancestors nor successors.
    pub lonely: NodeSet,
    /// Nodes without ancestors.
    pub start: NodeSet,
    /// Nodes without successors.
    pub end: NodeSet,
    /// Non-lonely nodes that share a mutual-reachability group with no other node.
    pub not_connected: NodeSet,
    /// Groups of at least two mutually reachable nodes, ordered by smallest member.
    pub groups: Vec<NodeSet>,
}

/// Cycles found from a start node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycles {
    /// One representative cycle per node set, in discovery order.
    pub cycles: Vec<Vec<usize>>,
    /// Nodes seen during the search, start included.
    pub nodes_reached: NodeSet,
}

/// Paths expanded from a start node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathsFrom {
    /// Paths still open when the depth limit was hit.
    pub paths_final: Vec<Vec<usize>>,
    /// Paths whose last node has no successor.
    pub paths_ended: Vec<Vec<usize>>,
    /// One representative cycle per node set.
    pub paths_cycle: Vec<Vec<usize>>,
    /// Nodes seen during the search, start included.
    pub nodes_reached: NodeSet,
}

/// Paths between two nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathsBetween {
    /// Successor visits performed, plus one for the start.
    pub count: usize,
    /// Intermediate nodes expanded, start included.
    pub nodes_reached: NodeSet,
    /// Simple paths ending at the target.
    pub paths: Vec<Vec<usize>>,
    /// Whether the target was hit.
    pub reached: bool,
}

/// Every predicate and node class of a closure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosureReport {
    /// Node count.
    pub dim: usize,
    /// Stabilization rank, if known.
    pub deep: Option<usize>,
    /// Every node reaches every node.
    pub connected_fully: bool,
    /// Closure rows equal closure columns.
    pub symmetric: bool,
    /// Every successor of a node is also one of its ancestors.
    pub minimally_symmetric: bool,
    /// Every node reaches itself.
    pub reflexive: bool,
    /// Nodes reached by every node.
    pub nodes_reached_fully: NodeSet,
    /// Nodes reached by every other node.
    pub nodes_reached_fully_wow: NodeSet,
    /// Nodes reaching every node.
    pub nodes_reaching_all: NodeSet,
    /// Nodes reaching every other node.
    pub nodes_reaching_all_wow: NodeSet,
    /// Nodes without ancestors.
    pub nodes_start: NodeSet,
    /// Nodes without successors.
    pub nodes_end: NodeSet,
    /// Nodes without ancestors or successors.
    pub nodes_lonely: NodeSet,
    /// Nodes on the closure diagonal.
    pub nodes_reflexive: NodeSet,
    /// Closure rows as `0/1` strings.
    pub closure: Vec<String>,
}

// ============================================================================
// ClosureAnalysis
// ============================================================================

/// Read-only queries over a [`ClosureResult`].
#[derive(Clone, Debug)]
pub struct ClosureAnalysis<'a> {
    result: &'a ClosureResult,
    dim: usize,
    full: BitRow,
    /// Successors in the original matrix, self loops excluded.
    successors: Vec<Vec<usize>>,
}

impl<'a> ClosureAnalysis<'a> {
    /// Wraps a closure result.
    ///
    /// # Errors
    /// Returns [`GraphError::NotSquare`], [`GraphError::Dimension`] or
    /// [`GraphError::EmptyMatrix`] if the result is not a closure of a square graph.
    pub fn new(result: &'a ClosureResult) -> Result<Self> {
        result.closure.require_square()?;
        if result.original.dims() != result.closure.dims() {
            return Err(GraphError::Dimension {
                op: "analysis",
                left: result.original.dims(),
                right: result.closure.dims(),
            });
        }
        let dim = result.closure.dim_m();
        if dim == 0 {
            return Err(GraphError::EmptyMatrix);
        }
        let successors = (0..dim)
            .map(|m| {
                result
                    .original
                    .row(m)
                    .iter_ones()
                    .filter(|&n| n != m)
                    .collect()
            })
            .collect();
        Ok(Self {
            result,
            dim,
            full: BitRow::ones(dim),
            successors,
        })
    }

    /// Node count.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Stabilization rank of the closure, if known.
    pub fn deep(&self) -> Option<usize> {
        self.result.deep
    }

    /// The analysed result.
    pub fn result(&self) -> &'a ClosureResult {
        self.result
    }

    fn check(&self, node: usize) -> Result<()> {
        if node < self.dim {
            Ok(())
        } else {
            Err(GraphError::NodeIndex {
                node,
                dim: self.dim,
            })
        }
    }

    #[inline]
    fn row(&self, node: usize) -> &BitRow {
        self.result.closure.row(node)
    }

    #[inline]
    fn col(&self, node: usize) -> &BitRow {
        self.result.closure.col(node)
    }

    /// `true` if `bits` (a closure row or column of `node`) holds no path of at least one edge.
    ///
    /// In a reflexive closure the diagonal bit only counts when `node` loops on itself.
    fn is_void(&self, bits: &BitRow, node: usize) -> bool {
        if self.result.reflexive {
            !self.result.original.get(node, node) && bits.iter_ones().all(|n| n == node)
        } else {
            bits.is_zero()
        }
    }

    fn nodes_where<F: Fn(usize) -> bool>(&self, keep: F) -> NodeSet {
        (0..self.dim).filter(|&i| keep(i)).collect()
    }

    // ------------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------------

    /// Every node reaches every node (itself included).
    pub fn is_connected_fully(&self) -> bool {
        (0..self.dim).all(|i| self.row(i).is_full())
    }

    /// Some node reaches every other node.
    pub fn is_connected(&self) -> bool {
        !self.nodes_reaching_all_wow().is_empty()
    }

    /// Every node reaches itself.
    pub fn is_reflexive(&self) -> bool {
        self.result.closure.is_reflexive()
    }

    /// Closure rows equal closure columns: reachability is mutual.
    pub fn is_symmetric(&self) -> bool {
        self.result.closure.is_symmetric()
    }

    /// Every node can get back from each node it reaches.
    pub fn is_minimally_symmetric(&self) -> bool {
        (0..self.dim).all(|i| self.row(i).is_subset(self.col(i)))
    }

    // ------------------------------------------------------------------------
    // Node classes
    // ------------------------------------------------------------------------

    /// Nodes without ancestors.
    pub fn nodes_start(&self) -> NodeSet {
        self.nodes_where(|i| self.is_void(self.col(i), i))
    }

    /// Nodes without successors.
    pub fn nodes_end(&self) -> NodeSet {
        self.nodes_where(|i| self.is_void(self.row(i), i))
    }

    /// Nodes without ancestors or successors.
    pub fn nodes_lonely(&self) -> NodeSet {
        self.nodes_where(|i| self.is_void(self.col(i), i) && self.is_void(self.row(i), i))
    }

    /// Nodes reached by every node, themselves included.
    pub fn nodes_reached_fully(&self) -> NodeSet {
        self.nodes_where(|i| self.col(i).is_full())
    }

    /// Nodes reached by every other node.
    pub fn nodes_reached_fully_wow(&self) -> NodeSet {
        self.nodes_where(|i| with_self(self.col(i), i).is_full())
    }

    /// Nodes reaching every node, themselves included.
    pub fn nodes_reaching_all(&self) -> NodeSet {
        self.nodes_where(|i| self.row(i).is_full())
    }

    /// Nodes reaching every other node.
    pub fn nodes_reaching_all_wow(&self) -> NodeSet {
        self.nodes_where(|i| with_self(self.row(i), i).is_full())
    }

    /// Nodes on the closure diagonal.
    pub fn nodes_reflexive(&self) -> NodeSet {
        self.nodes_where(|i| self.row(i).get(i))
    }

    /// Nodes reachable from `node`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn successors(&self, node: usize) -> Result<NodeSet> {
        Ok(self.successor_bits(node)?.iter_ones().collect())
    }

    /// Nodes reaching `node`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn ancestors(&self, node: usize) -> Result<NodeSet> {
        Ok(self.ancestor_bits(node)?.iter_ones().collect())
    }

    /// Closure row of `node`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn successor_bits(&self, node: usize) -> Result<&BitRow> {
        self.check(node)?;
        Ok(self.row(node))
    }

    /// Closure column of `node`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn ancestor_bits(&self, node: usize) -> Result<&BitRow> {
        self.check(node)?;
        Ok(self.col(node))
    }

    /// Closure row of `node` as a `0/1` string.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn successors_string(&self, node: usize) -> Result<String> {
        Ok(self.successor_bits(node)?.to_bit_string())
    }

    /// Closure column of `node` as a `0/1` string.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn ancestors_string(&self, node: usize) -> Result<String> {
        Ok(self.ancestor_bits(node)?.to_bit_string())
    }

    // ------------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------------

    /// Groups non-lonely nodes by the nodes they mutually reach (`row & col`).
    pub fn connectivity(&self) -> Connectivity {
        let lonely = self.nodes_lonely();
        let mut seen: HashSet<BitRow> = HashSet::new();
        let mut groups = Vec::new();
        let mut not_connected = NodeSet::new();
        for i in (0..self.dim).filter(|i| !lonely.contains(i)) {
            let signature = self.row(i).and(self.col(i));
            if signature.count_ones() < 2 {
                not_connected.insert(i);
            } else if !seen.contains(&signature) {
                groups.push(signature.iter_ones().collect::<NodeSet>());
                seen.insert(signature);
            }
        }
        Connectivity {
            connected_fully: self.is_connected_fully(),
            lonely,
            start: self.nodes_start(),
            end: self.nodes_end(),
            not_connected,
            groups,
        }
    }

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    fn depth_for(&self, limit: DepthLimit) -> usize {
        match limit {
            DepthLimit::Full => self.dim,
            DepthLimit::Shortest => self.result.deep.unwrap_or(self.dim),
            DepthLimit::Fixed(n) => n,
        }
    }

    /// `true` if `start` reaches nothing but possibly itself.
    fn is_dead_end(&self, start: usize) -> bool {
        self.row(start).iter_ones().all(|n| n == start)
    }

    /// Expands simple paths breadth first from `start` over the original edges.
    ///
    /// A successor already on the path closes a cycle; cycles are kept once per node set.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn paths_from(&self, start: usize, limit: DepthLimit) -> Result<PathsFrom> {
        self.check(start)?;
        let depth_final = self.depth_for(limit);
        let mut nodes_reached = NodeSet::from([start]);
        let mut paths_ended = Vec::new();
        let mut paths_cycle = Vec::new();
        let mut cycle_sets: HashSet<NodeSet> = HashSet::new();
        let mut paths = if self.is_dead_end(start) {
            Vec::new()
        } else {
            vec![vec![start]]
        };

        let mut depth = 0;
        while depth < depth_final && !paths.is_empty() {
            let mut next = Vec::new();
            for path in paths {
                let Some(&last) = path.last() else { continue };
                let successors = &self.successors[last];
                if successors.is_empty() {
                    paths_ended.push(path);
                    continue;
                }
                for &node in successors {
                    nodes_reached.insert(node);
                    match path.iter().position(|&p| p == node) {
                        Some(at) => {
                            let cycle = path[at..].to_vec();
                            if cycle_sets.insert(cycle.iter().copied().collect()) {
                                paths_cycle.push(cycle);
                            }
                        }
                        None => {
                            let mut extended = path.clone();
                            extended.push(node);
                            next.push(extended);
                        }
                    }
                }
            }
            paths = next;
            depth += 1;
        }

        Ok(PathsFrom {
            paths_final: paths,
            paths_ended,
            paths_cycle,
            nodes_reached,
        })
    }

    /// Cycles reachable from `start`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for an out-of-range node.
    pub fn paths_cycle(&self, start: usize, limit: DepthLimit) -> Result<Cycles> {
        let found = self.paths_from(start, limit)?;
        Ok(Cycles {
            cycles: found.paths_cycle,
            nodes_reached: found.nodes_reached,
        })
    }

    /// Cycles of the whole graph, one search per start node.
    ///
    /// When some node reaches every other node, its search covers the graph and is the only
    /// one run. Otherwise one search starts at the smallest node of each connectivity group.
    pub fn paths_cycle_all(&self, limit: DepthLimit) -> Vec<(usize, Cycles)> {
        let starts: Vec<usize> = match self.nodes_reaching_all_wow().first() {
            Some(&node) => vec![node],
            None => self
                .connectivity()
                .groups
                .iter()
                .filter_map(|group| group.first().copied())
                .collect(),
        };
        starts
            .into_iter()
            .filter_map(|start| {
                self.paths_cycle(start, limit)
                    .ok()
                    .map(|cycles| (start, cycles))
            })
            .collect()
    }

    /// Simple paths from `start` to `end`.
    ///
    /// Nothing is searched unless the closure says `end` is reachable. With
    /// [`DepthLimit::Shortest`] the search stops after the first depth that hits `end`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeIndex`] for out-of-range nodes.
    pub fn paths_from_to(&self, start: usize, end: usize, limit: DepthLimit) -> Result<PathsBetween> {
        self.check(start)?;
        self.check(end)?;
        let depth_final = self.depth_for(limit);
        let stop_on_reach = limit == DepthLimit::Shortest;
        let mut count = 1;
        let mut reached = false;
        let mut nodes_reached = NodeSet::from([start]);
        let mut found = Vec::new();
        let mut paths = if self.row(start).get(end) {
            vec![vec![start]]
        } else {
            Vec::new()
        };

        let mut depth = 0;
        while !(stop_on_reach && reached) && !paths.is_empty() && depth < depth_final {
            let mut next = Vec::new();
            for path in paths {
                let Some(&last) = path.last() else { continue };
                for &node in &self.successors[last] {
                    count += 1;
                    if node == end {
                        let mut hit = path.clone();
                        hit.push(node);
                        found.push(hit);
                        reached = true;
                    } else if !path.contains(&node) {
                        nodes_reached.insert(node);
                        let mut extended = path.clone();
                        extended.push(node);
                        next.push(extended);
                    }
                }
            }
            paths = next;
            depth += 1;
        }

        Ok(PathsBetween {
            count,
            nodes_reached,
            paths: found,
            reached,
        })
    }

    // ------------------------------------------------------------------------
    // Report
    // ------------------------------------------------------------------------

    /// Collects every predicate and node class.
    pub fn report(&self) -> ClosureReport {
        ClosureReport {
            dim: self.dim,
            deep: self.result.deep,
            connected_fully: self.is_connected_fully(),
            symmetric: self.is_symmetric(),
            minimally_symmetric: self.is_minimally_symmetric(),
            reflexive: self.is_reflexive(),
            nodes_reached_fully: self.nodes_reached_fully(),
            nodes_reached_fully_wow: self.nodes_reached_fully_wow(),
            nodes_reaching_all: self.nodes_reaching_all(),
            nodes_reaching_all_wow: self.nodes_reaching_all_wow(),
            nodes_start: self.nodes_start(),
            nodes_end: self.nodes_end(),
            nodes_lonely: self.nodes_lonely(),
            nodes_reflexive: self.nodes_reflexive(),
            closure: self.result.closure.row_strings(),
        }
    }
}

fn with_self(bits: &BitRow, node: usize) -> BitRow {
    let mut out = bits.clone();
    out.set(node);
    out
}

impl fmt::Display for ClosureAnalysis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result.deep {
            Some(deep) => writeln!(f, "dim={} deep={deep}", self.dim)?,
            None => writeln!(f, "dim={} deep=-", self.dim)?,
        }
        for row in self.result.closure.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
