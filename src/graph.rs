//! Labelled node/edge view over a [`BitMatrix`] and plain-text `0/1` matrix I/O.
//!
//! Renderers consume [`LabeledGraph::nodes`] and [`LabeledGraph::edges`]; the bit layout
//! stays private to [`crate::matrix`].

use crate::error::{GraphError, Result};
use crate::matrix::BitMatrix;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

// ============================================================================
// LabeledGraph
// ============================================================================

/// A directed graph whose nodes carry string labels.
///
/// Node `i` of the matrix is `nodes()[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledGraph {
    nodes: Vec<String>,
    matrix: BitMatrix,
}

impl LabeledGraph {
    /// Builds the adjacency matrix for labelled edges.
    ///
    /// With an empty `nodes` list the nodes are the sorted labels used by `edges`. Otherwise
    /// the list fixes node order and every edge endpoint must appear in it.
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownNode`] for an edge endpoint missing from `nodes`.
    pub fn from_nodes_edges<S: AsRef<str>>(nodes: &[S], edges: &[(S, S)]) -> Result<Self> {
        let nodes: Vec<String> = if nodes.is_empty() {
            edges
                .iter()
                .flat_map(|(a, b)| [a.as_ref(), b.as_ref()])
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_owned)
                .collect()
        } else {
            nodes.iter().map(|n| n.as_ref().to_owned()).collect()
        };

        let matrix = {
            let index: HashMap<&str, usize> = nodes
                .iter()
                .enumerate()
                .map(|(i, n)| (n.as_str(), i))
                .collect();
            let lookup = |label: &str| {
                index
                    .get(label)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownNode(label.to_owned()))
            };

            let dim = nodes.len();
            let mut grid = vec![vec![false; dim]; dim];
            for (from, to) in edges {
                grid[lookup(from.as_ref())?][lookup(to.as_ref())?] = true;
            }
            BitMatrix::from_bools(&grid)?
        };
        Ok(Self { nodes, matrix })
    }

    /// Labels the nodes of an existing square matrix `0, 1, 2, ...`.
    ///
    /// # Errors
    /// Returns [`GraphError::NotSquare`] for rectangular matrices.
    pub fn from_matrix(matrix: BitMatrix) -> Result<Self> {
        matrix.require_square()?;
        let nodes = (0..matrix.dim_m()).map(|i| i.to_string()).collect();
        Ok(Self { nodes, matrix })
    }

    /// Node labels in matrix order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Labelled edges in row-major order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.matrix
            .to_edge_list()
            .into_iter()
            .map(|(m, n)| (self.nodes[m].as_str(), self.nodes[n].as_str()))
            .collect()
    }

    /// Node index of a label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == label)
    }

    /// The adjacency matrix.
    pub fn matrix(&self) -> &BitMatrix {
        &self.matrix
    }

    /// Consumes the graph, keeping only the matrix.
    pub fn into_matrix(self) -> BitMatrix {
        self.matrix
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a square `0/1` adjacency matrix, one row per line.
///
/// Blank lines and surrounding whitespace are ignored. Self loops and asymmetric edges are
/// accepted: the matrix is a directed graph.
///
/// # Errors
/// Returns [`GraphError::EmptyMatrix`] for input without rows, [`GraphError::RowWidth`] for a
/// row whose length differs from the row count, and [`GraphError::InvalidChar`] for anything
/// other than `0`/`1`.
pub fn parse_adjacency_matrix(text: &str) -> Result<BitMatrix> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(GraphError::EmptyMatrix);
    }
    let n = lines.len();
    for (i, line) in lines.iter().enumerate() {
        let got = line.chars().count();
        if got != n {
            return Err(GraphError::RowWidth {
                row: i,
                expected: n,
                got,
            });
        }
    }
    BitMatrix::from_bit_strings(&lines)
}

/// Reads a file written by [`BitMatrix::write_to`] (or by hand) and parses it with
/// [`parse_adjacency_matrix`].
///
/// # Errors
/// Returns an I/O error if the file cannot be read, or `InvalidData` wrapping the parse error.
pub fn load_from_file(filename: impl AsRef<Path>) -> io::Result<BitMatrix> {
    let reader = BufReader::new(File::open(filename)?);
    let mut text = String::new();
    for line in reader.lines() {
        text.push_str(&line?);
        text.push('\n');
    }
    parse_adjacency_matrix(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes `matrix` to a file, one `0/1` row per line.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_to_file(matrix: &BitMatrix, filename: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(filename)?;
    matrix.write_to(file)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Diagonal, RandomSpec};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    // -------------------------------------------------------------------------
    // LabeledGraph
    // -------------------------------------------------------------------------

    #[test]
    fn nodes_follow_the_given_order() {
        let g = LabeledGraph::from_nodes_edges(&["c", "a", "b"], &[("a", "b"), ("c", "a")]).unwrap();
        assert_eq!(g.nodes(), ["c", "a", "b"]);
        assert_eq!(g.matrix().row_strings(), vec!["010", "001", "000"]);
        assert_eq!(g.edges(), vec![("c", "a"), ("a", "b")]);
        assert_eq!(g.index_of("b"), Some(2));
        assert_eq!(g.index_of("z"), None);
    }

    #[test]
    fn nodes_default_to_sorted_edge_labels() {
        let g = LabeledGraph::from_nodes_edges(&[] as &[&str], &[("y", "x"), ("x", "z")]).unwrap();
        assert_eq!(g.nodes(), ["x", "y", "z"]);
        assert_eq!(g.into_matrix().row_strings(), vec!["001", "100", "000"]);
    }

    #[test]
    fn unknown_edge_label_is_rejected() {
        let err = LabeledGraph::from_nodes_edges(&["a"], &[("a", "b")]).unwrap_err();
        assert_eq!(err, GraphError::UnknownNode("b".into()));
    }

    #[test]
    fn no_nodes_gives_an_empty_matrix() {
        let g = LabeledGraph::from_nodes_edges::<&str>(&[], &[]).unwrap();
        assert!(g.nodes().is_empty());
        assert_eq!(g.matrix().dims(), (0, 0));
    }

    #[test]
    fn from_matrix_numbers_nodes() {
        let m = BitMatrix::from_bit_strings(&["01", "10"]).unwrap();
        let g = LabeledGraph::from_matrix(m).unwrap();
        assert_eq!(g.nodes(), ["0", "1"]);
        assert_eq!(g.edges(), vec![("0", "1"), ("1", "0")]);

        let rect = BitMatrix::empty(2, 3);
        assert!(matches!(
            LabeledGraph::from_matrix(rect),
            Err(GraphError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    // -------------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn parse_accepts_directed_graphs_with_loops() {
        let m = parse_adjacency_matrix("  110\n\n001\n000 \n").unwrap();
        assert_eq!(m.row_strings(), vec!["110", "001", "000"]);
        assert!(m.get(0, 0));
        assert!(!m.is_symmetric());
    }

    #[test]
    fn parse_rejects_non_square() {
        let err = parse_adjacency_matrix("010\n10\n").unwrap_err();
        assert_eq!(
            err,
            GraphError::RowWidth {
                row: 0,
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn parse_rejects_invalid_char() {
        let err = parse_adjacency_matrix("0a\n00\n").unwrap_err();
        assert!(matches!(err, GraphError::InvalidChar { row: 0, col: 1, ch: 'a' }));
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(parse_adjacency_matrix("").unwrap_err(), GraphError::EmptyMatrix);
        assert_eq!(
            parse_adjacency_matrix("   \n\n  \n").unwrap_err(),
            GraphError::EmptyMatrix
        );
    }

    #[test]
    fn written_matrices_parse_back() {
        let mut rng = XorShiftRng::seed_from_u64(17);
        for dim in [1, 5, 64, 65, 130] {
            let spec = RandomSpec {
                diagonal: Diagonal::Untouched,
                ..RandomSpec::square(dim, 300)
            };
            let m = BitMatrix::random(&mut rng, &spec);
            let mut buf = Vec::new();
            m.write_to(&mut buf).unwrap();
            let text = String::from_utf8(buf).unwrap();
            assert_eq!(parse_adjacency_matrix(&text).unwrap(), m, "dim {dim}");
        }
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("bitgraph-{}.txt", std::process::id()));
        let m = BitMatrix::from_bit_strings(&["0110", "0001", "1000", "0000"]).unwrap();
        save_to_file(&m, &path).unwrap();
        let back = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn load_reports_malformed_files_as_invalid_data() {
        let path = std::env::temp_dir().join(format!("bitgraph-bad-{}.txt", std::process::id()));
        std::fs::write(&path, "01\n2\n").unwrap();
        let err = load_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
