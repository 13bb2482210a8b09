//! Fingerprint engine: turns a sanitized molecule into a fixed-length bit vector.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Deserialize;
use thiserror::Error;

use crate::parse::SmartsError;
use crate::Molecule;

mod bits;
pub use bits::BitVector;

mod matcher;
pub use matcher::{count_matches, has_match};

mod path;
pub use path::{ExtendedFingerprinter, PathFingerprinter};

mod estate;
pub use estate::{estate_key_index, EStateFingerprinter, ESTATE_KEYS};

mod keys;
pub use keys::KeyFingerprinter;

mod maccs;
mod substructure;
pub use substructure::{functional_group_index, FUNCTIONAL_GROUPS};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("molecule has no atoms")]
    EmptyMolecule,
    #[error("molecule is not connected ({fragments} components)")]
    Disconnected { fragments: usize },
    #[error("atom {atom} ({symbol}) has no atom type")]
    Untyped { atom: usize, symbol: String },
    #[error("key dictionary failed to compile: {0}")]
    Dictionary(#[from] SmartsError),
}

/// The fingerprint variants. Unknown names select `Substructure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum FingerprintKind {
    Standard,
    Extended,
    GraphOnly,
    EState,
    MACCS,
    #[default]
    Substructure,
}

impl FingerprintKind {
    pub const ALL: [FingerprintKind; 6] = [
        FingerprintKind::Standard,
        FingerprintKind::Extended,
        FingerprintKind::GraphOnly,
        FingerprintKind::EState,
        FingerprintKind::MACCS,
        FingerprintKind::Substructure,
    ];

    /// Maps a selector name to a kind. Matching is exact, and anything
    /// unrecognized falls back to `Substructure`.
    pub fn from_selector(name: &str) -> Self {
        match name.trim() {
            "Standard" => FingerprintKind::Standard,
            "Extended" => FingerprintKind::Extended,
            "Graph only" | "GraphOnly" => FingerprintKind::GraphOnly,
            "EState" => FingerprintKind::EState,
            "MACCS" => FingerprintKind::MACCS,
            _ => FingerprintKind::Substructure,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FingerprintKind::Standard => "Standard",
            FingerprintKind::Extended => "Extended",
            FingerprintKind::GraphOnly => "GraphOnly",
            FingerprintKind::EState => "EState",
            FingerprintKind::MACCS => "MACCS",
            FingerprintKind::Substructure => "Substructure",
        }
    }

    pub fn fingerprinter(self) -> Box<dyn Fingerprinter> {
        match self {
            FingerprintKind::Standard => Box::new(PathFingerprinter::standard()),
            FingerprintKind::Extended => Box::new(ExtendedFingerprinter::new()),
            FingerprintKind::GraphOnly => Box::new(PathFingerprinter::graph_only()),
            FingerprintKind::EState => Box::new(EStateFingerprinter),
            FingerprintKind::MACCS => Box::new(KeyFingerprinter::maccs()),
            FingerprintKind::Substructure => Box::new(KeyFingerprinter::substructure()),
        }
    }
}

impl From<&str> for FingerprintKind {
    fn from(name: &str) -> Self {
        FingerprintKind::from_selector(name)
    }
}

impl From<String> for FingerprintKind {
    fn from(name: String) -> Self {
        FingerprintKind::from_selector(&name)
    }
}

impl Display for FingerprintKind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.name())
    }
}

/// One fingerprint algorithm.
pub trait Fingerprinter: Send + Sync {
    /// Number of bits in every fingerprint this algorithm produces.
    fn size(&self) -> usize;

    /// Computes the fingerprint of a sanitized, connected molecule.
    fn fingerprint(&self, molecule: &Molecule) -> Result<BitVector, FingerprintError>;
}

/// Checks molecules and dispatches to the fingerprinter of one kind.
pub struct FingerprintEngine {
    kind: FingerprintKind,
    fingerprinter: Box<dyn Fingerprinter>,
}

impl FingerprintEngine {
    pub fn new(kind: FingerprintKind) -> Self {
        Self {
            kind,
            fingerprinter: kind.fingerprinter(),
        }
    }

    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.fingerprinter.size()
    }

    /// Computes the fingerprint of a sanitized molecule.
    ///
    /// The molecule must have atoms, be connected, and have every atom typed.
    /// The result always has `self.size()` bits.
    pub fn compute(&self, molecule: &Molecule) -> Result<BitVector, FingerprintError> {
        if molecule.atom_count() == 0 {
            return Err(FingerprintError::EmptyMolecule);
        }
        if !molecule.is_connected() {
            return Err(FingerprintError::Disconnected {
                fragments: molecule.fragment_count(),
            });
        }
        let graph = molecule.graph();
        if let Some(node) = graph.node_indices().find(|&node| !graph[node].is_typed()) {
            return Err(FingerprintError::Untyped {
                atom: node.index() + 1,
                symbol: graph[node].symbol().to_string(),
            });
        }
        self.fingerprinter.fingerprint(molecule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_smiles, sanitize};

    fn sanitized(smiles: &str) -> Molecule {
        sanitize(parse_smiles(smiles).expect("Failed to parse SMILES")).expect("Failed to sanitize")
    }

    #[test]
    fn test_selectors() {
        assert_eq!(FingerprintKind::from("Standard"), FingerprintKind::Standard);
        assert_eq!(FingerprintKind::from("Graph only"), FingerprintKind::GraphOnly);
        assert_eq!(FingerprintKind::from("MACCS"), FingerprintKind::MACCS);
        assert_eq!(FingerprintKind::from("EState"), FingerprintKind::EState);
        assert_eq!(FingerprintKind::from("Extended"), FingerprintKind::Extended);
        assert_eq!(FingerprintKind::from("maccs"), FingerprintKind::Substructure);
        assert_eq!(FingerprintKind::from("Bogus"), FingerprintKind::Substructure);
        assert_eq!(FingerprintKind::from(String::new()), FingerprintKind::Substructure);
        assert_eq!(FingerprintKind::default(), FingerprintKind::Substructure);
        assert_eq!(FingerprintKind::GraphOnly.to_string(), "GraphOnly");
    }

    #[test]
    fn test_sizes() {
        let sizes: Vec<usize> = FingerprintKind::ALL
            .iter()
            .map(|&kind| FingerprintEngine::new(kind).size())
            .collect();
        assert_eq!(sizes[..5], [1024, 1024, 1024, 79, 166]);
        assert_eq!(sizes[5], FUNCTIONAL_GROUPS.len());
    }

    #[test]
    fn test_every_kind_produces_its_size() {
        let molecules = [sanitized("CCO"), sanitized("c1ccccc1C(=O)O"), sanitized("[Na+].[Cl-]")];
        for kind in FingerprintKind::ALL {
            let engine = FingerprintEngine::new(kind);
            for molecule in &molecules {
                let bits = engine.compute(molecule).expect("Failed to fingerprint");
                assert_eq!(bits.len(), engine.size(), "{kind}");
                assert_eq!(bits.to_string().len(), engine.size(), "{kind}");
            }
        }
    }

    #[test]
    fn test_fingerprints_are_deterministic() {
        for kind in FingerprintKind::ALL {
            let engine = FingerprintEngine::new(kind);
            let first = engine.compute(&sanitized("CC(=O)Nc1ccc(O)cc1")).expect("Failed to fingerprint");
            let second = engine.compute(&sanitized("CC(=O)Nc1ccc(O)cc1")).expect("Failed to fingerprint");
            assert_eq!(first, second, "{kind}");
        }
    }

    #[test]
    fn test_invalid_molecules() {
        let engine = FingerprintEngine::new(FingerprintKind::Standard);
        assert_eq!(engine.compute(&Molecule::default()), Err(FingerprintError::EmptyMolecule));

        let mut disconnected = parse_smiles("C.C").expect("Failed to parse SMILES");
        crate::perceive::perceive_atom_types(&mut disconnected).expect("Failed to type atoms");
        assert_eq!(
            engine.compute(&disconnected),
            Err(FingerprintError::Disconnected { fragments: 2 })
        );

        let untyped = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert_eq!(
            engine.compute(&untyped),
            Err(FingerprintError::Untyped {
                atom: 1,
                symbol: "C".to_string()
            })
        );
    }
}
