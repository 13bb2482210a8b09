use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use crate::fingerprint::{BitVector, FingerprintError, Fingerprinter};
use crate::perceive::RingSet;
use crate::{Molecule, MoleculeGraph};

const PATH_BITS: usize = 1024;
const PATH_DEPTH: usize = 7;
const EXTENDED_FEATURE_BITS: usize = 25;

/// Hashed fingerprint of the linear paths of a molecule.
///
/// Every simple path of heavy atoms with up to `depth` bonds is written as a
/// string of element symbols and bond symbols, read in whichever direction
/// sorts first, and hashed onto one bit.
#[derive(Debug, Clone)]
pub struct PathFingerprinter {
    size: usize,
    depth: usize,
    bond_orders: bool,
}

impl PathFingerprinter {
    pub fn standard() -> Self {
        Self {
            size: PATH_BITS,
            depth: PATH_DEPTH,
            bond_orders: true,
        }
    }

    /// Paths that only record connectivity, with every bond written as `~`.
    pub fn graph_only() -> Self {
        Self {
            bond_orders: false,
            ..Self::standard()
        }
    }

    fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::standard()
        }
    }

    /// The distinct path strings of a molecule.
    pub fn paths(&self, molecule: &Molecule) -> BTreeSet<String> {
        let graph = molecule.graph();
        let mut paths = BTreeSet::new();
        let mut walk = Vec::with_capacity(self.depth + 1);
        for start in graph.node_indices() {
            if graph[start].is_hydrogen() {
                continue;
            }
            walk.push(start);
            self.extend(graph, &mut walk, &mut paths);
            walk.pop();
        }
        paths
    }

    fn extend(&self, graph: &MoleculeGraph, walk: &mut Vec<NodeIndex>, paths: &mut BTreeSet<String>) {
        paths.insert(self.encode(graph, walk));
        if walk.len() > self.depth {
            return;
        }
        let Some(&last) = walk.last() else {
            return;
        };
        for next in graph.neighbors(last) {
            if graph[next].is_hydrogen() || walk.contains(&next) {
                continue;
            }
            walk.push(next);
            self.extend(graph, walk, paths);
            walk.pop();
        }
    }

    fn encode(&self, graph: &MoleculeGraph, walk: &[NodeIndex]) -> String {
        let forward = self.write(graph, walk.iter().copied());
        let backward = self.write(graph, walk.iter().rev().copied());
        forward.min(backward)
    }

    fn write(&self, graph: &MoleculeGraph, walk: impl Iterator<Item = NodeIndex>) -> String {
        let mut text = String::new();
        let mut previous: Option<NodeIndex> = None;
        for node in walk {
            if let Some(previous) = previous {
                let bond = graph.find_edge(previous, node).map(|edge| graph[edge]);
                text.push(match bond {
                    Some(bond) if self.bond_orders => bond.symbol(),
                    _ => '~',
                });
            }
            text.push_str(graph[node].symbol());
            previous = Some(node);
        }
        text
    }

    fn fill(&self, molecule: &Molecule, bits: &mut BitVector) {
        for path in self.paths(molecule) {
            bits.set((fnv1a(&path) % self.size as u64) as usize);
        }
    }
}

impl Fingerprinter for PathFingerprinter {
    fn size(&self) -> usize {
        self.size
    }

    fn fingerprint(&self, molecule: &Molecule) -> Result<BitVector, FingerprintError> {
        let mut bits = BitVector::new(self.size);
        self.fill(molecule, &mut bits);
        Ok(bits)
    }
}

/// Path bits followed by ring and size features.
///
/// Feature bits, in order: ring sizes 3 to 8 and 9 or more, at least 1 to 4
/// rings, at least 1 to 3 aromatic rings, a fused ring pair, a ring
/// heteroatom, an aromatic heteroatom, and more than 5, 10, 15, 20, 30, 40, 60
/// and 80 heavy atoms.
#[derive(Debug, Clone)]
pub struct ExtendedFingerprinter {
    paths: PathFingerprinter,
}

impl ExtendedFingerprinter {
    pub fn new() -> Self {
        Self {
            paths: PathFingerprinter::with_size(PATH_BITS - EXTENDED_FEATURE_BITS),
        }
    }
}

impl Default for ExtendedFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter for ExtendedFingerprinter {
    fn size(&self) -> usize {
        PATH_BITS
    }

    fn fingerprint(&self, molecule: &Molecule) -> Result<BitVector, FingerprintError> {
        let mut bits = BitVector::new(PATH_BITS);
        self.paths.fill(molecule, &mut bits);

        let graph = molecule.graph();
        let rings = RingSet::perceive(graph);
        let mut features = [false; EXTENDED_FEATURE_BITS];

        for ring in rings.rings() {
            let slot = ring.len().clamp(3, 9) - 3;
            features[slot] = true;
        }
        for (offset, threshold) in (1..=4).enumerate() {
            features[7 + offset] = rings.len() >= threshold;
        }
        let aromatic = rings.aromatic_count(graph);
        for (offset, threshold) in (1..=3).enumerate() {
            features[11 + offset] = aromatic >= threshold;
        }
        features[14] = !rings.fused_pairs(graph).is_empty();
        features[15] = rings
            .rings()
            .iter()
            .flatten()
            .any(|&node| graph[node].atomic_number() != 6);
        features[16] = graph
            .node_weights()
            .any(|atom| atom.aromatic && atom.atomic_number() != 6);
        let heavy = molecule.heavy_atom_count();
        for (offset, threshold) in [5, 10, 15, 20, 30, 40, 60, 80].into_iter().enumerate() {
            features[17 + offset] = heavy > threshold;
        }

        let base = self.paths.size;
        for (offset, &set) in features.iter().enumerate() {
            if set {
                bits.set(base + offset);
            }
        }
        Ok(bits)
    }
}

/// 64-bit FNV-1a, stable across platforms and runs.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
