use lazy_static::lazy_static;

use crate::fingerprint::{count_matches, BitVector, FingerprintError, Fingerprinter};
use crate::parse::{parse_smarts, Query, SmartsError};
use crate::perceive::RingSet;
use crate::Molecule;

use super::maccs::MACCS_KEYS;
use super::substructure::FUNCTIONAL_GROUPS;

/// How one bit of a structural-key fingerprint is decided.
#[derive(Debug, Clone, Copy)]
pub(crate) enum KeyDefinition {
    /// Set when the pattern matches more than `threshold` distinct atom sets.
    Smarts(&'static str, usize),
    /// Any atom with an isotope label.
    Isotope,
    /// More than one aromatic ring.
    AromaticRings,
    /// A ring of eight or more atoms.
    LargeRing,
    /// More than one component.
    Fragments,
    /// Never set.
    Unused,
}

#[derive(Debug)]
enum Key {
    Query(Query, usize),
    Isotope,
    AromaticRings,
    LargeRing,
    Fragments,
    Unused,
}

type Dictionary = Result<Vec<Key>, SmartsError>;

fn compile(definitions: &[KeyDefinition]) -> Dictionary {
    definitions
        .iter()
        .map(|definition| {
            Ok(match *definition {
                KeyDefinition::Smarts(smarts, threshold) => Key::Query(parse_smarts(smarts)?, threshold),
                KeyDefinition::Isotope => Key::Isotope,
                KeyDefinition::AromaticRings => Key::AromaticRings,
                KeyDefinition::LargeRing => Key::LargeRing,
                KeyDefinition::Fragments => Key::Fragments,
                KeyDefinition::Unused => Key::Unused,
            })
        })
        .collect()
}

lazy_static! {
    static ref MACCS: Dictionary = compile(&MACCS_KEYS);
    static ref SUBSTRUCTURE: Dictionary = {
        let definitions: Vec<KeyDefinition> = FUNCTIONAL_GROUPS
            .iter()
            .map(|&(_, smarts)| KeyDefinition::Smarts(smarts, 0))
            .collect();
        compile(&definitions)
    };
}

/// Fingerprint with one bit per entry of a key dictionary.
///
/// Dictionaries are compiled once per process. A dictionary that fails to
/// compile makes every fingerprint fail with `FingerprintError::Dictionary`.
pub struct KeyFingerprinter {
    keys: &'static Dictionary,
    size: usize,
}

impl KeyFingerprinter {
    /// The 166 public MACCS keys.
    pub fn maccs() -> Self {
        Self {
            keys: &MACCS,
            size: MACCS_KEYS.len(),
        }
    }

    /// One key per functional group.
    pub fn substructure() -> Self {
        Self {
            keys: &SUBSTRUCTURE,
            size: FUNCTIONAL_GROUPS.len(),
        }
    }
}

impl Fingerprinter for KeyFingerprinter {
    fn size(&self) -> usize {
        self.size
    }

    fn fingerprint(&self, molecule: &Molecule) -> Result<BitVector, FingerprintError> {
        let keys = self.keys.as_ref().map_err(|e| FingerprintError::Dictionary(e.clone()))?;
        let rings = RingSet::perceive(molecule.graph());
        let mut bits = BitVector::new(self.size);
        for (index, key) in keys.iter().enumerate() {
            let set = match key {
                Key::Query(query, threshold) => {
                    count_matches(query, molecule, threshold.saturating_add(1)) > *threshold
                }
                Key::Isotope => molecule.graph().node_weights().any(|atom| atom.isotope.is_some()),
                Key::AromaticRings => rings.aromatic_count(molecule.graph()) > 1,
                Key::LargeRing => rings.largest() >= 8,
                Key::Fragments => molecule.fragment_count() > 1,
                Key::Unused => false,
            };
            if set {
                bits.set(index);
            }
        }
        Ok(bits)
    }
}
