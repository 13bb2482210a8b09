use thiserror::Error;
use tracing::debug;

use crate::perceive::{detect_aromaticity, perceive_atom_types, AromaticityError, AtomTypingError};
use crate::Molecule;

/// Label shared by every R-group pseudo atom.
pub const MARKUSH_LABEL: &str = "R";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("Skipping Markush structure")]
    MarkushStructure,
    #[error("More than 2 components ({0}). Skipped")]
    TooManyFragments(usize),
    #[error("Error in atom typing: {0}")]
    AtomTyping(#[from] AtomTypingError),
    #[error("Error in aromaticity detection: {0}")]
    Aromaticity(#[from] AromaticityError),
}

/// Whether any atom of the molecule is an R group.
pub fn is_markush(molecule: &Molecule) -> bool {
    molecule
        .graph()
        .node_weights()
        .any(|atom| atom.is_pseudo() && atom.label == MARKUSH_LABEL)
}

/// Drops the counter-ion of a two-component molecule.
///
/// The first component is kept only when it has strictly more atoms than the
/// second, so ties keep the second component. Single-component molecules are
/// returned unchanged.
pub fn strip_counter_ion(molecule: Molecule) -> Result<Molecule, SanitizationError> {
    let fragments = molecule.fragments();
    match fragments.len() {
        0 | 1 => Ok(molecule),
        2 => {
            let mut fragments = fragments.into_iter();
            let (first, second) = match (fragments.next(), fragments.next()) {
                (Some(first), Some(second)) => (first, second),
                _ => return Ok(molecule),
            };
            debug!(
                "keeping the larger of two components ({} and {} atoms)",
                first.atom_count(),
                second.atom_count()
            );
            if first.atom_count() > second.atom_count() {
                Ok(first)
            } else {
                Ok(second)
            }
        }
        count => Err(SanitizationError::TooManyFragments(count)),
    }
}

/// Prepares a molecule for fingerprinting.
///
/// Rejects Markush structures and molecules with more than two components,
/// strips the counter-ion, assigns atom types and implicit hydrogens, and
/// perceives aromaticity. The returned molecule is connected and keeps the
/// title and properties of the input.
pub fn sanitize(molecule: Molecule) -> Result<Molecule, SanitizationError> {
    if is_markush(&molecule) {
        return Err(SanitizationError::MarkushStructure);
    }
    let mut molecule = strip_counter_ion(molecule)?;
    perceive_atom_types(&mut molecule)?;
    detect_aromaticity(&mut molecule)?;
    Ok(molecule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    fn parse(smiles: &str) -> Molecule {
        parse_smiles(smiles).expect("Failed to parse SMILES")
    }

    #[test]
    fn test_sanitize_simple_molecule() {
        let molecule = sanitize(parse("c1ccccc1O").with_title("phenol")).expect("Failed to sanitize");
        assert_eq!(molecule.title(), Some("phenol"));
        assert!(molecule.graph().node_weights().all(|atom| atom.is_typed()));
        assert_eq!(molecule.graph().node_weights().filter(|atom| atom.aromatic).count(), 6);
    }

    #[test]
    fn test_markush_is_rejected() {
        assert_eq!(
            sanitize(parse("CCR")).map(|_| ()),
            Err(SanitizationError::MarkushStructure)
        );
        assert!(!is_markush(&parse("CC*")));
    }

    #[test]
    fn test_too_many_fragments() {
        assert_eq!(
            sanitize(parse("C.C.C")).map(|_| ()),
            Err(SanitizationError::TooManyFragments(3))
        );
    }

    #[test]
    fn test_counter_ion_is_stripped() {
        let molecule = sanitize(parse("[Na+].CC(=O)[O-]").with_title("sodium acetate"))
            .expect("Failed to sanitize");
        assert_eq!(molecule.atom_count(), 4);
        assert!(molecule.is_connected());
        assert_eq!(molecule.title(), Some("sodium acetate"));

        let molecule = sanitize(parse("CCCC[NH3+].[Cl-]")).expect("Failed to sanitize");
        assert_eq!(molecule.atom_count(), 5);
    }

    #[test]
    fn test_equal_fragments_keep_the_second() {
        let molecule = sanitize(parse("CO.CN")).expect("Failed to sanitize");
        let symbols: Vec<&str> = molecule.graph().node_weights().map(|atom| atom.symbol()).collect();
        assert_eq!(symbols, vec!["C", "N"]);
    }

    #[test]
    fn test_perception_errors_are_wrapped() {
        assert!(matches!(
            sanitize(parse("CC(C)(C)(C)C")),
            Err(SanitizationError::AtomTyping(AtomTypingError::ValenceExceeded { .. }))
        ));
        assert!(matches!(
            sanitize(parse("CC*")),
            Err(SanitizationError::AtomTyping(AtomTypingError::UnknownAtomType { .. }))
        ));
        assert!(matches!(
            sanitize(parse("c1cccc1")),
            Err(SanitizationError::Aromaticity(AromaticityError::NotHuckel { .. }))
        ));
    }
}
