use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::fingerprint::{BitVector, FingerprintError, Fingerprinter};
use crate::{BondOrder, Molecule};

/// The 79 electrotopological-state atom types, in bit order.
///
/// A type name lists one letter per bond to a heavy atom (`t` triple, `d`
/// double, `a` aromatic, `s` single, in that order), then the element symbol
/// and the hydrogen count.
pub const ESTATE_KEYS: [&str; 79] = [
    "sLi", "ssBe", "ssssBe", "ssBH", "sssB", "ssssB", "sCH3", "dCH2", "ssCH2", "tCH", "dsCH",
    "aaCH", "sssCH", "ddC", "tsC", "dssC", "aasC", "aaaC", "ssssC", "sNH3", "sNH2", "ssNH2",
    "dNH", "ssNH", "aaNH", "tN", "sssNH", "dsN", "aaN", "sssN", "ddsN", "aasN", "ssssN", "sOH",
    "dO", "ssO", "aaO", "sF", "sSiH3", "ssSiH2", "sssSiH", "ssssSi", "sPH2", "ssPH", "sssP",
    "dsssP", "sssssP", "sSH", "dS", "ssS", "aaS", "dssS", "ddssS", "sCl", "sGeH3", "ssGeH2",
    "sssGeH", "ssssGe", "sAsH2", "ssAsH", "sssAs", "dsssAs", "sssssAs", "sSeH", "dSe", "ssSe",
    "aaSe", "dssSe", "ddssSe", "sBr", "sSnH3", "ssSnH2", "sssSnH", "ssssSn", "sI", "sPbH3",
    "ssPbH2", "sssPbH", "ssssPb",
];

pub fn estate_key_index(name: &str) -> Option<usize> {
    ESTATE_KEYS.iter().position(|&key| key == name)
}

/// Fingerprint with one bit per E-state atom type present in the molecule.
#[derive(Debug, Clone, Copy, Default)]
pub struct EStateFingerprinter;

impl Fingerprinter for EStateFingerprinter {
    fn size(&self) -> usize {
        ESTATE_KEYS.len()
    }

    fn fingerprint(&self, molecule: &Molecule) -> Result<BitVector, FingerprintError> {
        let mut bits = BitVector::new(ESTATE_KEYS.len());
        for node in molecule.graph().node_indices() {
            if molecule.graph()[node].is_hydrogen() {
                continue;
            }
            if let Some(index) = estate_key_index(&atom_type(molecule, node)) {
                bits.set(index);
            }
        }
        Ok(bits)
    }
}

fn atom_type(molecule: &Molecule, node: NodeIndex) -> String {
    let graph = molecule.graph();
    let mut letters: Vec<(u8, char)> = graph
        .edges(node)
        .filter(|edge| {
            let neighbor = if edge.source() == node { edge.target() } else { edge.source() };
            !graph[neighbor].is_hydrogen()
        })
        .map(|edge| {
            let bond = edge.weight();
            if bond.is_aromatic() {
                (2, 'a')
            } else {
                match bond.order {
                    BondOrder::Triple => (0, 't'),
                    BondOrder::Double => (1, 'd'),
                    _ => (3, 's'),
                }
            }
        })
        .collect();
    letters.sort();

    let mut name: String = letters.into_iter().map(|(_, letter)| letter).collect();
    name.push_str(graph[node].symbol());
    match molecule.total_hydrogens(node) {
        0 => {}
        1 => name.push('H'),
        count => name.push_str(&format!("H{count}")),
    }
    name
}
