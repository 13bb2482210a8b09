use petgraph::graph::NodeIndex;
use thiserror::Error;
use tracing::trace;

use crate::{BondOrder, Element, Hybridization, Molecule};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtomTypingError {
    #[error("atom {atom} ({symbol}) has no known atom type")]
    UnknownAtomType { atom: usize, symbol: String },
    #[error("atom {atom} ({symbol}) exceeds its maximum valence with {valence} bonds")]
    ValenceExceeded {
        atom: usize,
        symbol: String,
        valence: u8,
    },
}

/// Assigns implicit hydrogens and hybridization to every atom.
///
/// Bracket atoms keep the hydrogen count they were written with. Other atoms
/// get the smallest allowed valence that fits their bonds. Atom numbers in
/// errors are 1-based.
pub fn perceive_atom_types(molecule: &mut Molecule) -> Result<(), AtomTypingError> {
    let nodes: Vec<NodeIndex> = molecule.graph().node_indices().collect();
    for node in nodes {
        let (implicit, hybridization) = type_atom(molecule, node)?;
        let atom = &mut molecule.graph_mut()[node];
        trace!(
            "typed atom {} ({}) with {implicit} implicit hydrogens, {hybridization:?}",
            node.index() + 1,
            atom.symbol()
        );
        atom.implicit_hydrogens = Some(implicit);
        atom.hybridization = Some(hybridization);
    }
    Ok(())
}

fn type_atom(molecule: &Molecule, node: NodeIndex) -> Result<(u8, Hybridization), AtomTypingError> {
    let graph = molecule.graph();
    let atom = &graph[node];
    let element = atom.element.ok_or_else(|| AtomTypingError::UnknownAtomType {
        atom: node.index() + 1,
        symbol: atom.symbol().to_string(),
    })?;

    let mut used = 0u8;
    let (mut doubles, mut triples, mut aromatic_bonds) = (0, 0, 0);
    for edge in graph.edges(node) {
        let bond = edge.weight();
        used += bond.order.valence();
        match bond.order {
            BondOrder::Double => doubles += 1,
            BondOrder::Triple => triples += 1,
            BondOrder::Aromatic => aromatic_bonds += 1,
            BondOrder::Single => {}
        }
    }

    if atom.aromatic && aromatic_bonds > 0 && doubles == 0 && triples == 0 {
        let neighbors = graph.neighbors(node).count() as u8 + atom.hydrogens.unwrap_or(0);
        let pi_bond = match element.atomic_number() {
            6 => atom.charge == 0,
            7 | 15 | 33 => atom.charge == 1 || (atom.charge == 0 && neighbors == 2),
            _ => false,
        };
        if pi_bond {
            used += 1;
        }
    }

    let allowed = allowed_valences(element, atom.charge);
    let exceeded = |valence: u8| AtomTypingError::ValenceExceeded {
        atom: node.index() + 1,
        symbol: atom.symbol().to_string(),
        valence,
    };

    let implicit = match atom.hydrogens {
        Some(hydrogens) => {
            let valence = used + hydrogens;
            match allowed.iter().max() {
                Some(&max) if valence > max => return Err(exceeded(valence)),
                _ => 0,
            }
        }
        None if allowed.is_empty() => 0,
        None => allowed
            .iter()
            .find(|&&valence| valence >= used)
            .map(|valence| valence - used)
            .ok_or_else(|| exceeded(used))?,
    };

    let hybridization = if element == Element::H {
        Hybridization::S
    } else if triples > 0 || doubles >= 2 {
        Hybridization::SP
    } else if doubles == 1 || aromatic_bonds > 0 || atom.aromatic {
        Hybridization::SP2
    } else {
        Hybridization::SP3
    };

    Ok((implicit, hybridization))
}

/// Valences allowed for an element carrying a formal charge.
///
/// Charged atoms of groups 15 to 17 behave like their isoelectronic
/// neighbors, so N+ takes 4 bonds and O- takes 1. Charged carbon loses one
/// bond per unit of charge and B- takes 4.
fn allowed_valences(element: Element, charge: i8) -> Vec<u8> {
    let base = element.default_valences();
    if charge == 0 {
        return base.to_vec();
    }
    let shift = |delta: i16| -> Vec<u8> {
        base.iter()
            .filter_map(|&valence| u8::try_from(valence as i16 + delta).ok())
            .filter(|&valence| valence > 0)
            .collect()
    };
    match element.atomic_number() {
        7 | 8 | 9 | 15 | 16 | 17 | 33 | 34 | 35 | 52 | 53 => shift(charge as i16),
        6 | 14 | 32 | 50 | 82 => shift(-(charge.unsigned_abs() as i16)),
        5 => shift(-(charge as i16)),
        _ => base.to_vec(),
    }
}
