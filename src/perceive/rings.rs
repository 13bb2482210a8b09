use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::MoleculeGraph;

/// The smallest ring through every ring bond of a molecule.
///
/// Each ring is stored as a closed walk of atoms, so consecutive atoms (and the
/// last and first) are bonded.
#[derive(Debug, Clone, Default)]
pub struct RingSet {
    rings: Vec<Vec<NodeIndex>>,
    bonds: BTreeSet<EdgeIndex>,
}

impl RingSet {
    pub fn perceive(graph: &MoleculeGraph) -> Self {
        let mut seen = BTreeSet::new();
        let mut rings = Vec::new();
        let mut bonds = BTreeSet::new();

        for edge in graph.edge_references() {
            let Some(path) = shortest_path_avoiding(graph, edge.source(), edge.target(), edge.id()) else {
                continue;
            };
            bonds.insert(edge.id());
            let mut key: Vec<usize> = path.iter().map(|node| node.index()).collect();
            key.sort_unstable();
            if seen.insert(key) {
                rings.push(path);
            }
        }

        rings.sort_by_key(Vec::len);
        Self { rings, bonds }
    }

    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn contains_atom(&self, node: NodeIndex) -> bool {
        self.rings.iter().any(|ring| ring.contains(&node))
    }

    pub fn contains_bond(&self, edge: EdgeIndex) -> bool {
        self.bonds.contains(&edge)
    }

    pub fn largest(&self) -> usize {
        self.rings.last().map_or(0, Vec::len)
    }

    /// Pairs of rings sharing exactly one bond, as in naphthalene or azulene.
    pub fn fused_pairs(&self, graph: &MoleculeGraph) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, first) in self.rings.iter().enumerate() {
            for (j, second) in self.rings.iter().enumerate().skip(i + 1) {
                let shared: Vec<NodeIndex> = first
                    .iter()
                    .filter(|node| second.contains(*node))
                    .copied()
                    .collect();
                if shared.len() == 2 && graph.find_edge(shared[0], shared[1]).is_some() {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Rings whose atoms are all flagged aromatic.
    pub fn aromatic_count(&self, graph: &MoleculeGraph) -> usize {
        self.rings
            .iter()
            .filter(|ring| ring.iter().all(|&node| graph[node].aromatic))
            .count()
    }

    /// Writes ring membership onto the atoms and bonds of the graph.
    pub fn mark(&self, graph: &mut MoleculeGraph) {
        let members: HashSet<NodeIndex> = self.rings.iter().flatten().copied().collect();
        for node in graph.node_indices() {
            graph[node].in_ring = members.contains(&node);
        }
        for edge in graph.edge_indices() {
            graph[edge].in_ring = self.bonds.contains(&edge);
        }
    }
}

/// Breadth-first search for the shortest path between two atoms that does not
/// use the given bond.
fn shortest_path_avoiding(
    graph: &MoleculeGraph,
    from: NodeIndex,
    to: NodeIndex,
    skip: EdgeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut visited = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);

    while let Some(node) = queue.pop_front() {
        if node == to {
            let mut path = vec![to];
            let mut current = to;
            while let Some(&before) = previous.get(&current) {
                path.push(before);
                current = before;
            }
            path.reverse();
            return Some(path);
        }
        for edge in graph.edges(node) {
            if edge.id() == skip {
                continue;
            }
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if visited.insert(next) {
                previous.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    #[test]
    fn test_chain_has_no_rings() {
        let molecule = parse_smiles("CCCCO").expect("Failed to parse SMILES");
        let rings = RingSet::perceive(molecule.graph());
        assert!(rings.is_empty());
        assert_eq!(rings.largest(), 0);
    }

    #[test]
    fn test_single_ring() {
        let mut molecule = parse_smiles("C1CCCCC1C").expect("Failed to parse SMILES");
        let rings = RingSet::perceive(molecule.graph());
        assert_eq!(rings.len(), 1);
        assert_eq!(rings.rings()[0].len(), 6);

        rings.mark(molecule.graph_mut());
        let in_ring: Vec<bool> = molecule.graph().node_weights().map(|atom| atom.in_ring).collect();
        assert_eq!(in_ring, vec![true, true, true, true, true, true, false]);
        let ring_bonds = molecule.graph().edge_weights().filter(|bond| bond.in_ring).count();
        assert_eq!(ring_bonds, 6);
    }

    #[test]
    fn test_fused_rings() {
        let molecule = parse_smiles("c1ccc2ccccc2c1").expect("Failed to parse SMILES");
        let rings = RingSet::perceive(molecule.graph());
        assert_eq!(rings.len(), 2);
        assert!(rings.rings().iter().all(|ring| ring.len() == 6));
        assert_eq!(rings.fused_pairs(molecule.graph()), vec![(0, 1)]);
        assert_eq!(rings.aromatic_count(molecule.graph()), 2);
    }

    #[test]
    fn test_spiro_rings_are_not_fused() {
        let molecule = parse_smiles("C1CCC2(C1)CCC2").expect("Failed to parse SMILES");
        let rings = RingSet::perceive(molecule.graph());
        assert_eq!(rings.len(), 2);
        assert!(rings.fused_pairs(molecule.graph()).is_empty());
        assert_eq!(rings.largest(), 5);
    }

    #[test]
    fn test_ring_walk_is_closed() {
        let molecule = parse_smiles("C1CCCCCCC1").expect("Failed to parse SMILES");
        let rings = RingSet::perceive(molecule.graph());
        let ring = &rings.rings()[0];
        assert_eq!(ring.len(), 8);
        for (i, &node) in ring.iter().enumerate() {
            let next = ring[(i + 1) % ring.len()];
            assert!(molecule.graph().find_edge(node, next).is_some());
        }
    }
}
