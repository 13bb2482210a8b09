use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use thiserror::Error;
use tracing::debug;

use crate::perceive::RingSet;
use crate::{BondOrder, Hybridization, Molecule};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AromaticityError {
    #[error("aromatic atom {atom} ({symbol}) is not in a ring")]
    OutsideRing { atom: usize, symbol: String },
    #[error("aromatic atom {atom} ({symbol}) is not in a ring with 4n+2 pi electrons")]
    NotHuckel { atom: usize, symbol: String },
}

/// Marks the atoms and bonds of Hückel rings aromatic.
///
/// Every ring from the ring set is tested, and so is the envelope of every
/// pair of rings fused through a single bond. Atoms that were aromatic on
/// input must end up in an aromatic ring.
///
/// Expects implicit hydrogens to be assigned already.
pub fn detect_aromaticity(molecule: &mut Molecule) -> Result<(), AromaticityError> {
    let rings = RingSet::perceive(molecule.graph());
    rings.mark(molecule.graph_mut());

    for node in molecule.graph().node_indices() {
        let atom = &molecule.graph()[node];
        if atom.aromatic && !atom.in_ring {
            return Err(AromaticityError::OutsideRing {
                atom: node.index() + 1,
                symbol: atom.symbol().to_string(),
            });
        }
    }

    let mut candidates: Vec<BTreeSet<NodeIndex>> = rings
        .rings()
        .iter()
        .map(|ring| ring.iter().copied().collect())
        .collect();
    for (first, second) in rings.fused_pairs(molecule.graph()) {
        candidates.push(
            rings.rings()[first]
                .iter()
                .chain(&rings.rings()[second])
                .copied()
                .collect(),
        );
    }

    let mut aromatic_atoms = BTreeSet::new();
    let mut aromatic_bonds = BTreeSet::new();
    for candidate in &candidates {
        let electrons: Option<u32> = candidate
            .iter()
            .map(|&node| pi_electrons(molecule, node).map(u32::from))
            .sum();
        let Some(electrons) = electrons else {
            continue;
        };
        if electrons % 4 != 2 {
            continue;
        }
        debug!("ring of {} atoms has {electrons} pi electrons", candidate.len());
        aromatic_atoms.extend(candidate.iter().copied());
        for edge in molecule.graph().edge_references() {
            if edge.weight().in_ring
                && candidate.contains(&edge.source())
                && candidate.contains(&edge.target())
            {
                aromatic_bonds.insert(edge.id());
            }
        }
    }

    for node in molecule.graph().node_indices() {
        let atom = &molecule.graph()[node];
        if atom.aromatic && !aromatic_atoms.contains(&node) {
            return Err(AromaticityError::NotHuckel {
                atom: node.index() + 1,
                symbol: atom.symbol().to_string(),
            });
        }
    }

    let graph = molecule.graph_mut();
    for node in aromatic_atoms {
        graph[node].aromatic = true;
        graph[node].hybridization = Some(Hybridization::SP2);
    }
    for edge in aromatic_bonds {
        graph[edge].aromatic = true;
    }
    Ok(())
}

/// Pi electrons an atom donates to a ring, or `None` when the atom cannot be
/// part of an aromatic ring.
fn pi_electrons(molecule: &Molecule, node: NodeIndex) -> Option<u8> {
    let graph = molecule.graph();
    let atom = &graph[node];
    let element = atom.element?;

    let mut ring_double = false;
    let mut exocyclic_double = false;
    for edge in graph.edges(node) {
        let bond = edge.weight();
        match bond.order {
            BondOrder::Triple => return None,
            BondOrder::Double if bond.in_ring => ring_double = true,
            BondOrder::Double => exocyclic_double = true,
            _ => {}
        }
    }
    if ring_double {
        return Some(1);
    }

    let number = element.atomic_number();
    if exocyclic_double {
        return (number == 6).then_some(0);
    }

    let connections = graph.neighbors(node).count() as u8
        + atom.hydrogens.unwrap_or(0)
        + atom.implicit_hydrogens.unwrap_or(0);
    match number {
        6 => match atom.charge {
            0 if atom.aromatic => Some(1),
            -1 => Some(2),
            1 => Some(0),
            _ => None,
        },
        7 | 15 => {
            if atom.charge == 1 {
                Some(1)
            } else if atom.charge == 0 && atom.aromatic && connections == 2 {
                Some(1)
            } else if atom.charge == 0 && connections == 3 {
                Some(2)
            } else {
                None
            }
        }
        8 | 16 | 34 | 52 => (atom.charge == 0 && connections == 2).then_some(2),
        5 => Some(0),
        _ => None,
    }
}
