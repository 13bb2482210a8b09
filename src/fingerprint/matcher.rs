use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::parse::{AtomExpr, BondExpr, Query, QueryGraph};
use crate::{Bond, BondOrder, Molecule};

impl AtomExpr {
    pub(crate) fn matches(&self, molecule: &Molecule, node: NodeIndex) -> bool {
        let atom = &molecule.graph()[node];
        match self {
            AtomExpr::Any => true,
            AtomExpr::Aromatic => atom.aromatic,
            AtomExpr::Aliphatic => !atom.aromatic && !atom.is_pseudo(),
            AtomExpr::Element { number, aromatic } => {
                atom.atomic_number() == *number && aromatic.map_or(true, |aromatic| aromatic == atom.aromatic)
            }
            AtomExpr::HydrogenCount(count) => molecule.total_hydrogens(node) == *count,
            AtomExpr::Degree(degree) => molecule.heavy_degree(node) == *degree,
            AtomExpr::Connectivity(connections) => {
                molecule.heavy_degree(node) + molecule.total_hydrogens(node) == *connections
            }
            AtomExpr::InRing(in_ring) => atom.in_ring == *in_ring,
            AtomExpr::Charge(charge) => atom.charge == *charge,
            AtomExpr::Not(expr) => !expr.matches(molecule, node),
            AtomExpr::And(terms) => terms.iter().all(|term| term.matches(molecule, node)),
            AtomExpr::Or(terms) => terms.iter().any(|term| term.matches(molecule, node)),
        }
    }
}

impl BondExpr {
    pub(crate) fn matches(&self, bond: &Bond) -> bool {
        match self {
            BondExpr::Any => true,
            BondExpr::Single => bond.order == BondOrder::Single && !bond.is_aromatic(),
            BondExpr::Double => bond.order == BondOrder::Double && !bond.is_aromatic(),
            BondExpr::Triple => bond.order == BondOrder::Triple,
            BondExpr::Aromatic => bond.is_aromatic(),
            BondExpr::Ring => bond.in_ring,
            BondExpr::Implicit => bond.is_aromatic() || bond.order == BondOrder::Single,
            BondExpr::Not(expr) => !expr.matches(bond),
            BondExpr::And(terms) => terms.iter().all(|term| term.matches(bond)),
            BondExpr::Or(terms) => terms.iter().any(|term| term.matches(bond)),
        }
    }
}

/// Backtracking search for embeddings of a query graph into a molecule.
struct Matcher<'a> {
    query: &'a QueryGraph,
    molecule: &'a Molecule,
    /// Query atoms in depth-first order, so every atom after the first of its
    /// component has an already mapped neighbor.
    order: Vec<NodeIndex>,
    mapping: Vec<Option<NodeIndex>>,
    used: Vec<bool>,
    found: BTreeSet<Vec<NodeIndex>>,
    limit: usize,
}

impl<'a> Matcher<'a> {
    fn new(query: &'a QueryGraph, molecule: &'a Molecule, limit: usize) -> Self {
        let mut order = Vec::with_capacity(query.node_count());
        let mut seen = vec![false; query.node_count()];
        for root in query.node_indices() {
            if seen[root.index()] {
                continue;
            }
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                if seen[node.index()] {
                    continue;
                }
                seen[node.index()] = true;
                order.push(node);
                stack.extend(query.neighbors(node).filter(|next| !seen[next.index()]));
            }
        }

        Self {
            query,
            molecule,
            order,
            mapping: vec![None; query.node_count()],
            used: vec![false; molecule.atom_count()],
            found: BTreeSet::new(),
            limit,
        }
    }

    fn search(&mut self, depth: usize) {
        if self.found.len() >= self.limit {
            return;
        }
        if depth == self.order.len() {
            let mut atoms: Vec<NodeIndex> = self.mapping.iter().flatten().copied().collect();
            atoms.sort();
            self.found.insert(atoms);
            return;
        }

        let node = self.order[depth];
        let graph = self.molecule.graph();
        let anchor = self
            .query
            .neighbors(node)
            .find_map(|neighbor| self.mapping[neighbor.index()]);
        let candidates: Vec<NodeIndex> = match anchor {
            Some(anchor) => graph.neighbors(anchor).collect(),
            None => graph.node_indices().collect(),
        };

        for candidate in candidates {
            if self.feasible(node, candidate) {
                self.mapping[node.index()] = Some(candidate);
                self.used[candidate.index()] = true;
                self.search(depth + 1);
                self.used[candidate.index()] = false;
                self.mapping[node.index()] = None;
            }
        }
    }

    fn feasible(&self, node: NodeIndex, candidate: NodeIndex) -> bool {
        let graph = self.molecule.graph();
        if self.used[candidate.index()] || graph[candidate].is_hydrogen() {
            return false;
        }
        if !self.query[node].matches(self.molecule, candidate) {
            return false;
        }
        for edge in self.query.edges(node) {
            let neighbor = if edge.source() == node { edge.target() } else { edge.source() };
            let Some(mapped) = self.mapping[neighbor.index()] else {
                continue;
            };
            match graph.find_edge(candidate, mapped) {
                Some(bond) if edge.weight().matches(&graph[bond]) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Counts the distinct atom sets the query maps onto, stopping at `limit`.
///
/// Mappings are injective and need not be induced: target bonds between
/// matched atoms that the query does not mention are ignored. Explicit
/// hydrogen atoms of the molecule are never matched.
pub fn count_matches(query: &Query, molecule: &Molecule, limit: usize) -> usize {
    if limit == 0 || query.atom_count() == 0 {
        return 0;
    }
    let mut matcher = Matcher::new(query.graph(), molecule, limit);
    matcher.search(0);
    matcher.found.len()
}

pub fn has_match(query: &Query, molecule: &Molecule) -> bool {
    count_matches(query, molecule, 1) > 0
}
