use std::collections::BTreeMap;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution of the bond to the valence of each endpoint.
    ///
    /// Aromatic bonds count as single bonds here; the extra pi bond of an
    /// aromatic atom is added during atom typing.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BondOrder::Single => '-',
            BondOrder::Double => '=',
            BondOrder::Triple => '#',
            BondOrder::Aromatic => ':',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hybridization {
    S,
    SP,
    SP2,
    SP3,
}

/// An atom of a molecule graph.
///
/// Atoms without an element are pseudo atoms (`R`, `*`, `A`, `Q`, ...) and are
/// identified by their label.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Option<Element>,
    pub label: String,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Hydrogen count written on a bracket atom. `None` means the count is implicit.
    pub hydrogens: Option<u8>,
    /// Implicit hydrogens assigned by atom typing.
    pub implicit_hydrogens: Option<u8>,
    pub hybridization: Option<Hybridization>,
    pub in_ring: bool,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element: Some(element),
            label: element.symbol().to_string(),
            aromatic: false,
            charge: 0,
            isotope: None,
            hydrogens: None,
            implicit_hydrogens: None,
            hybridization: None,
            in_ring: false,
        }
    }

    pub fn pseudo(label: &str) -> Self {
        Self {
            element: None,
            label: label.to_string(),
            aromatic: false,
            charge: 0,
            isotope: None,
            hydrogens: None,
            implicit_hydrogens: None,
            hybridization: None,
            in_ring: false,
        }
    }

    pub fn aromatic(mut self) -> Self {
        self.aromatic = true;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.label
    }

    /// Atomic number of the atom, zero for pseudo atoms.
    pub fn atomic_number(&self) -> u8 {
        self.element.map_or(0, Element::atomic_number)
    }

    pub fn is_pseudo(&self) -> bool {
        self.element.is_none()
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == Some(Element::H)
    }

    pub fn is_typed(&self) -> bool {
        self.implicit_hydrogens.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub order: BondOrder,
    pub aromatic: bool,
    pub in_ring: bool,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            aromatic: order == BondOrder::Aromatic,
            in_ring: false,
        }
    }

    pub fn is_aromatic(&self) -> bool {
        self.aromatic || self.order == BondOrder::Aromatic
    }

    /// Symbol used when writing the bond into a path string.
    pub fn symbol(&self) -> char {
        if self.is_aromatic() {
            BondOrder::Aromatic.symbol()
        } else {
            self.order.symbol()
        }
    }
}

pub type MoleculeGraph = UnGraph<Atom, Bond>;

/// A molecule read from an input record: its graph, an optional title and the
/// data items attached to the record.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: MoleculeGraph,
    title: Option<String>,
    properties: BTreeMap<String, String>,
}

impl Molecule {
    pub fn new(graph: MoleculeGraph) -> Self {
        Self {
            graph,
            title: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.set_title(Some(title.into()));
        self
    }

    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut MoleculeGraph {
        &mut self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|atom| !atom.is_hydrogen())
            .count()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the title. Blank titles are stored as absent.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn is_connected(&self) -> bool {
        connected_components(&self.graph) <= 1
    }

    pub fn fragment_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Splits the molecule into its connected components.
    ///
    /// Fragments are ordered by the index of their first atom and each one
    /// carries the title and properties of the whole molecule.
    pub fn fragments(&self) -> Vec<Molecule> {
        let mut sets = UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let labels = sets.into_labeling();

        let mut order = Vec::new();
        for label in &labels {
            if !order.contains(label) {
                order.push(*label);
            }
        }

        order
            .into_iter()
            .map(|label| {
                let graph = self.graph.filter_map(
                    |node, atom| (labels[node.index()] == label).then(|| atom.clone()),
                    |_, bond| Some(*bond),
                );
                Molecule {
                    graph,
                    title: self.title.clone(),
                    properties: self.properties.clone(),
                }
            })
            .collect()
    }

    /// Neighbors of the atom that are not hydrogens.
    pub fn heavy_degree(&self, node: NodeIndex) -> u8 {
        self.graph
            .neighbors(node)
            .filter(|&neighbor| !self.graph[neighbor].is_hydrogen())
            .count() as u8
    }

    /// Hydrogens on the atom: bracket count, implicit count and explicit
    /// hydrogen neighbors.
    pub fn total_hydrogens(&self, node: NodeIndex) -> u8 {
        let atom = &self.graph[node];
        let attached = self
            .graph
            .neighbors(node)
            .filter(|&neighbor| self.graph[neighbor].is_hydrogen())
            .count() as u8;
        atom.hydrogens.unwrap_or(0) + atom.implicit_hydrogens.unwrap_or(0) + attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(symbols: &[&str]) -> MoleculeGraph {
        let mut graph = MoleculeGraph::new_undirected();
        let mut previous = None;
        for symbol in symbols {
            let node = graph.add_node(Atom::new(Element::from_symbol(symbol).expect("element")));
            if let Some(previous) = previous {
                graph.add_edge(previous, node, Bond::new(BondOrder::Single));
            }
            previous = Some(node);
        }
        graph
    }

    #[test]
    fn test_fragments_are_ordered_and_keep_title() {
        let mut graph = chain(&["C", "C", "O"]);
        let sodium = graph.add_node(Atom::new(Element::from_symbol("Na").expect("sodium")));
        graph[sodium].charge = 1;
        let mut molecule = Molecule::new(graph).with_title("salt");
        molecule.set_property("ID", "42");

        assert!(!molecule.is_connected());
        assert_eq!(molecule.fragment_count(), 2);

        let fragments = molecule.fragments();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].atom_count(), 3);
        assert_eq!(fragments[0].bond_count(), 2);
        assert_eq!(fragments[1].atom_count(), 1);
        assert_eq!(fragments[1].graph()[NodeIndex::new(0)].charge, 1);
        for fragment in &fragments {
            assert_eq!(fragment.title(), Some("salt"));
            assert_eq!(fragment.property("ID"), Some("42"));
            assert!(fragment.is_connected());
        }
    }

    #[test]
    fn test_blank_title_is_absent() {
        let mut molecule = Molecule::new(chain(&["C"]));
        molecule.set_title(Some("   ".to_string()));
        assert_eq!(molecule.title(), None);
        molecule.set_title(Some(" methane ".to_string()));
        assert_eq!(molecule.title(), Some("methane"));
    }

    #[test]
    fn test_hydrogen_counts() {
        let mut graph = chain(&["C", "O", "H"]);
        graph[NodeIndex::new(0)].implicit_hydrogens = Some(3);
        let molecule = Molecule::new(graph);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(0)), 3);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(1)), 1);
        assert_eq!(molecule.heavy_degree(NodeIndex::new(1)), 1);
        assert_eq!(molecule.heavy_atom_count(), 2);
    }

    #[test]
    fn test_bond_symbols() {
        let mut bond = Bond::new(BondOrder::Double);
        assert_eq!(bond.symbol(), '=');
        bond.aromatic = true;
        assert_eq!(bond.symbol(), ':');
        assert!(Bond::new(BondOrder::Aromatic).is_aromatic());
        assert_eq!(BondOrder::Triple.valence(), 3);
    }
}
