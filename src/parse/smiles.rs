use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::{Atom, Bond, BondOrder, Element, Molecule, MoleculeGraph};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,
    #[error("Branch start '(' at position {0} without a current atom")]
    BranchNoCurrentAtom(usize),
    #[error("Branch end ')' at position {0} without a matching '('")]
    BranchEndNoStart(usize),
    #[error("Empty branch at position {0}")]
    EmptyBranch(usize),
    #[error("Unclosed branch '('")]
    UnclosedBranch,
    #[error("Ring closure {0} at position {1} without a current atom")]
    RingClosureNoCurrentAtom(u8, usize),
    #[error("Ring closure {0} is never closed")]
    UnclosedRing(u8),
    #[error("Ring closure {0} at position {1} has conflicting bond symbols")]
    RingBondMismatch(u8, usize),
    #[error("Incomplete ring closure after '%' at position {0}")]
    IncompleteRingLabel(usize),
    #[error("Unclosed bracket '[' at position {0}")]
    UnclosedBracket(usize),
    #[error("Invalid bracket atom '[{0}]'")]
    InvalidBracketAtom(String),
    #[error("Number out of range in bracket atom '[{0}]'")]
    BracketValueOutOfRange(String),
    #[error("Unknown element '{symbol}' at position {position}")]
    UnknownElement { symbol: String, position: usize },
    #[error("Bond at position {0} is not followed by an atom")]
    DanglingBond(usize),
}

/// Parses a SMILES string into a molecule.
///
/// Stereo markers are read and dropped. `R`, `R'`, `R''` and `*` become
/// pseudo atoms; `R` groups all share the label `R`.
///
/// # Arguments
///
/// * `smiles` - The SMILES string to parse, without a title.
///
/// # Returns
///
/// * `Result<Molecule, SmilesError>` - The parsed molecule or the first syntax error.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut graph = MoleculeGraph::new_undirected();
    let mut current_atom: Option<NodeIndex> = None;
    let mut bond_type: Option<(BondOrder, usize)> = None;
    let mut branch_stack: Vec<NodeIndex> = Vec::new();
    let mut ring_map: BTreeMap<u8, (NodeIndex, Option<BondOrder>)> = BTreeMap::new();

    let chars: Vec<char> = smiles.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' => {
                let atom = current_atom.ok_or(SmilesError::BranchNoCurrentAtom(i))?;
                if i > 0 && chars[i - 1] == '(' {
                    return Err(SmilesError::EmptyBranch(i - 1));
                }
                branch_stack.push(atom);
                i += 1;
            }
            ')' => {
                if i > 0 && chars[i - 1] == '(' {
                    return Err(SmilesError::EmptyBranch(i - 1));
                }
                if let Some((_, position)) = bond_type {
                    return Err(SmilesError::DanglingBond(position));
                }
                current_atom = Some(branch_stack.pop().ok_or(SmilesError::BranchEndNoStart(i))?);
                i += 1;
            }
            '-' | '=' | '#' | ':' | '/' | '\\' => {
                let order = match c {
                    '=' => BondOrder::Double,
                    '#' => BondOrder::Triple,
                    ':' => BondOrder::Aromatic,
                    // Directional bonds only carry stereo information.
                    _ => BondOrder::Single,
                };
                bond_type = Some((order, i));
                i += 1;
            }
            '%' => {
                if i + 2 >= chars.len() || !chars[i + 1..=i + 2].iter().all(char::is_ascii_digit) {
                    return Err(SmilesError::IncompleteRingLabel(i));
                }
                let ring_number = (chars[i + 1] as u8 - b'0') * 10 + (chars[i + 2] as u8 - b'0');
                close_ring(&mut graph, &mut ring_map, current_atom, bond_type.take(), ring_number, i)?;
                i += 3;
            }
            '0'..='9' => {
                let ring_number = c as u8 - b'0';
                close_ring(&mut graph, &mut ring_map, current_atom, bond_type.take(), ring_number, i)?;
                i += 1;
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&x| x == ']')
                    .map(|offset| i + offset)
                    .ok_or(SmilesError::UnclosedBracket(i))?;
                let content: String = chars[i + 1..end].iter().collect();
                let atom = parse_bracket_atom(&content)?;
                current_atom = Some(attach(&mut graph, current_atom, bond_type.take(), atom));
                i = end + 1;
            }
            '.' => {
                // The next atom starts a disconnected component.
                current_atom = None;
                i += 1;
            }
            'R' => {
                i += 1;
                while i < chars.len() && chars[i] == '\'' {
                    i += 1;
                }
                current_atom = Some(attach(&mut graph, current_atom, bond_type.take(), Atom::pseudo("R")));
            }
            '*' => {
                i += 1;
                current_atom = Some(attach(&mut graph, current_atom, bond_type.take(), Atom::pseudo("*")));
            }
            _ => {
                let (atom, width) = parse_organic_atom(&chars[i..]).ok_or_else(|| {
                    SmilesError::UnknownElement {
                        symbol: c.to_string(),
                        position: i,
                    }
                })?;
                current_atom = Some(attach(&mut graph, current_atom, bond_type.take(), atom));
                i += width;
            }
        }
    }

    if let Some((_, position)) = bond_type {
        return Err(SmilesError::DanglingBond(position));
    }
    if let Some(&ring_number) = ring_map.keys().next() {
        return Err(SmilesError::UnclosedRing(ring_number));
    }
    if !branch_stack.is_empty() {
        return Err(SmilesError::UnclosedBranch);
    }

    Ok(Molecule::new(graph))
}

/// Adds an atom and bonds it to the previous atom, if any.
///
/// Without an explicit bond symbol two aromatic atoms get an aromatic bond
/// and anything else gets a single bond.
fn attach(
    graph: &mut MoleculeGraph,
    previous: Option<NodeIndex>,
    bond_type: Option<(BondOrder, usize)>,
    atom: Atom,
) -> NodeIndex {
    let new_atom = graph.add_node(atom);
    if let Some(prev_atom) = previous {
        let order = bond_type
            .map(|(order, _)| order)
            .unwrap_or_else(|| implicit_order(graph, prev_atom, new_atom));
        graph.add_edge(prev_atom, new_atom, Bond::new(order));
    }
    new_atom
}

fn implicit_order(graph: &MoleculeGraph, a: NodeIndex, b: NodeIndex) -> BondOrder {
    if graph[a].aromatic && graph[b].aromatic {
        BondOrder::Aromatic
    } else {
        BondOrder::Single
    }
}

fn close_ring(
    graph: &mut MoleculeGraph,
    ring_map: &mut BTreeMap<u8, (NodeIndex, Option<BondOrder>)>,
    current_atom: Option<NodeIndex>,
    bond_type: Option<(BondOrder, usize)>,
    ring_number: u8,
    position: usize,
) -> Result<(), SmilesError> {
    let current = current_atom.ok_or(SmilesError::RingClosureNoCurrentAtom(ring_number, position))?;
    let bond_type = bond_type.map(|(order, _)| order);
    match ring_map.remove(&ring_number) {
        Some((_, Some(opening))) if bond_type.is_some_and(|closing| closing != opening) => {
            return Err(SmilesError::RingBondMismatch(ring_number, position));
        }
        Some((start_atom, opening_bond)) => {
            let order = bond_type
                .or(opening_bond)
                .unwrap_or_else(|| implicit_order(graph, start_atom, current));
            graph.add_edge(start_atom, current, Bond::new(order));
        }
        None => {
            ring_map.insert(ring_number, (current, bond_type));
        }
    }
    Ok(())
}

/// Reads an unbracketed atom from the organic subset.
///
/// Returns the atom and the number of characters consumed.
fn parse_organic_atom(chars: &[char]) -> Option<(Atom, usize)> {
    let first = *chars.first()?;
    if first.is_ascii_uppercase() {
        if let Some(&second) = chars.get(1) {
            let candidate: String = [first, second].iter().collect();
            if candidate == "Cl" || candidate == "Br" {
                return Element::from_symbol(&candidate).map(|element| (Atom::new(element), 2));
            }
        }
        let element = Element::from_symbol(&first.to_string())?;
        element.is_organic_subset().then(|| (Atom::new(element), 1))
    } else {
        let element = Element::from_aromatic_symbol(&first.to_string())?;
        Some((Atom::new(element).aromatic(), 1))
    }
}

/// Parses the inside of a bracket atom, e.g. `13CH4`, `nH`, `O-`, `NH4+`.
fn parse_bracket_atom(content: &str) -> Result<Atom, SmilesError> {
    let invalid = || SmilesError::InvalidBracketAtom(content.to_string());
    let out_of_range = || SmilesError::BracketValueOutOfRange(content.to_string());
    let chars: Vec<char> = content.chars().collect();
    let mut i = 0;

    let digits = |i: &mut usize| -> Result<Option<u32>, SmilesError> {
        let start = *i;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            *i += 1;
        }
        if start == *i {
            return Ok(None);
        }
        let text: String = chars[start..*i].iter().collect();
        text.parse().map(Some).map_err(|_| out_of_range())
    };

    let isotope = digits(&mut i)?
        .map(|mass| u16::try_from(mass).map_err(|_| out_of_range()))
        .transpose()?;

    let mut atom = match chars.get(i) {
        Some('*') => {
            i += 1;
            Atom::pseudo("*")
        }
        Some('R') if Element::from_symbol(&chars[i..(i + 2).min(chars.len())].iter().collect::<String>()).is_none() => {
            i += 1;
            Atom::pseudo("R")
        }
        Some(c) if c.is_ascii_uppercase() => {
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            if two.len() == 2 && Element::from_symbol(&two).is_some() {
                i += 2;
                Atom::new(Element::from_symbol(&two).ok_or_else(invalid)?)
            } else {
                let element = Element::from_symbol(&c.to_string()).ok_or_else(|| SmilesError::UnknownElement {
                    symbol: c.to_string(),
                    position: i,
                })?;
                i += 1;
                Atom::new(element)
            }
        }
        Some(c) if c.is_ascii_lowercase() => {
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            if let Some(element) = Element::from_aromatic_symbol(&two).filter(|_| two.len() == 2) {
                i += 2;
                Atom::new(element).aromatic()
            } else {
                let element = Element::from_aromatic_symbol(&c.to_string()).ok_or_else(|| {
                    SmilesError::UnknownElement {
                        symbol: c.to_string(),
                        position: i,
                    }
                })?;
                i += 1;
                Atom::new(element).aromatic()
            }
        }
        _ => return Err(invalid()),
    };
    atom.isotope = isotope;

    // Chirality is not represented.
    while chars.get(i) == Some(&'@') {
        i += 1;
    }

    let mut hydrogens = 0;
    if chars.get(i) == Some(&'H') {
        i += 1;
        hydrogens = u8::try_from(digits(&mut i)?.unwrap_or(1)).map_err(|_| out_of_range())?;
    }
    atom.hydrogens = Some(hydrogens);

    if let Some(&sign) = chars.get(i).filter(|c| **c == '+' || **c == '-') {
        let unit: i8 = if sign == '+' { 1 } else { -1 };
        i += 1;
        let magnitude = match digits(&mut i)? {
            Some(value) => i8::try_from(value).map_err(|_| out_of_range())?,
            None => {
                let mut magnitude: i8 = 1;
                while chars.get(i) == Some(&sign) {
                    magnitude = magnitude.checked_add(1).ok_or_else(out_of_range)?;
                    i += 1;
                }
                magnitude
            }
        };
        atom.charge = unit.checked_mul(magnitude).ok_or_else(out_of_range)?;
    }

    if chars.get(i) == Some(&':') {
        i += 1;
        digits(&mut i)?.ok_or_else(invalid)?;
    }

    if i != chars.len() {
        return Err(invalid());
    }
    Ok(atom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::visit::EdgeRef;

    fn symbols(molecule: &Molecule) -> Vec<String> {
        molecule
            .graph()
            .node_weights()
            .map(|atom| atom.symbol().to_string())
            .collect()
    }

    #[test]
    fn test_parse_ethanol() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert_eq!(symbols(&molecule), vec!["C", "C", "O"]);

        let edges: Vec<_> = molecule.graph().edge_references().collect();
        assert_eq!(edges.len(), 2);
        for edge in edges {
            assert_eq!(edge.weight().order, BondOrder::Single);
        }
        for atom in molecule.graph().node_weights() {
            assert_eq!(atom.hydrogens, None);
            assert!(!atom.aromatic);
        }
    }

    #[test]
    fn test_parse_cyclohexane() {
        let molecule = parse_smiles("C1CCCCC1").expect("Failed to parse SMILES");
        assert_eq!(molecule.atom_count(), 6);
        assert_eq!(molecule.bond_count(), 6);
        for node in molecule.graph().node_indices() {
            let degree = molecule.graph().edges(node).count();
            assert_eq!(degree, 2, "Node {} has degree {}", node.index(), degree);
        }
    }

    #[test]
    fn test_parse_benzene() {
        let molecule = parse_smiles("c1ccccc1").expect("Failed to parse SMILES");
        assert_eq!(molecule.bond_count(), 6);
        assert!(molecule.graph().node_weights().all(|atom| atom.aromatic));
        assert!(molecule
            .graph()
            .edge_weights()
            .all(|bond| bond.order == BondOrder::Aromatic));
    }

    #[test]
    fn test_ring_closure_bond_orders() {
        let molecule = parse_smiles("C=1CCCCC1").expect("Failed to parse SMILES");
        let doubles = molecule
            .graph()
            .edge_weights()
            .filter(|bond| bond.order == BondOrder::Double)
            .count();
        assert_eq!(doubles, 1);

        let molecule = parse_smiles("C%10CC%10").expect("Failed to parse SMILES");
        assert_eq!(molecule.bond_count(), 3);
    }

    #[test]
    fn test_parse_branches() {
        let molecule = parse_smiles("CC(C)(C)O").expect("Failed to parse SMILES");
        assert_eq!(molecule.atom_count(), 5);
        assert_eq!(molecule.graph().neighbors(NodeIndex::new(1)).count(), 4);
    }

    #[test]
    fn test_ciprofloxacin() {
        let molecule = parse_smiles("C1CNCCN1c(c2)c(F)cc3c2N(C4CC4)C=C(C3=O)C(=O)O")
            .expect("Failed to parse SMILES");
        assert_eq!(molecule.atom_count(), 24);
    }

    #[test]
    fn test_parse_bracket_atoms() {
        let molecule = parse_smiles("[13CH4]").expect("Failed to parse SMILES");
        let atom = &molecule.graph()[NodeIndex::new(0)];
        assert_eq!(atom.isotope, Some(13));
        assert_eq!(atom.hydrogens, Some(4));

        let molecule = parse_smiles("[NH4+].[Cl-]").expect("Failed to parse SMILES");
        assert_eq!(molecule.fragment_count(), 2);
        assert_eq!(molecule.graph()[NodeIndex::new(0)].charge, 1);
        assert_eq!(molecule.graph()[NodeIndex::new(1)].charge, -1);
        assert_eq!(molecule.graph()[NodeIndex::new(1)].symbol(), "Cl");

        let molecule = parse_smiles("c1cc[nH]c1").expect("Failed to parse SMILES");
        let nitrogen = &molecule.graph()[NodeIndex::new(3)];
        assert!(nitrogen.aromatic);
        assert_eq!(nitrogen.hydrogens, Some(1));

        let molecule = parse_smiles("[Fe++]").expect("Failed to parse SMILES");
        assert_eq!(molecule.graph()[NodeIndex::new(0)].charge, 2);

        let molecule = parse_smiles("N[C@@H](C)C(=O)O").expect("Failed to parse SMILES");
        assert_eq!(molecule.graph()[NodeIndex::new(1)].hydrogens, Some(1));

        let molecule = parse_smiles("[CH3:1]C").expect("Failed to parse SMILES");
        assert_eq!(molecule.graph()[NodeIndex::new(0)].hydrogens, Some(3));
    }

    #[test]
    fn test_parse_pseudo_atoms() {
        let molecule = parse_smiles("CCR").expect("Failed to parse SMILES");
        assert!(molecule.graph()[NodeIndex::new(2)].is_pseudo());
        assert_eq!(molecule.graph()[NodeIndex::new(2)].symbol(), "R");

        let molecule = parse_smiles("R'C(R'')*").expect("Failed to parse SMILES");
        assert_eq!(symbols(&molecule), vec!["R", "C", "R", "*"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_smiles(""), Err(SmilesError::Empty)));
        assert!(matches!(parse_smiles("C1CC"), Err(SmilesError::UnclosedRing(1))));
        assert!(matches!(parse_smiles("CC)C"), Err(SmilesError::BranchEndNoStart(2))));
        assert!(matches!(parse_smiles("C(C"), Err(SmilesError::UnclosedBranch)));
        assert!(matches!(parse_smiles("C[NH4"), Err(SmilesError::UnclosedBracket(1))));
        assert!(matches!(parse_smiles("CXC"), Err(SmilesError::UnknownElement { position: 1, .. })));
        assert!(matches!(parse_smiles("CC="), Err(SmilesError::DanglingBond(2))));
        assert!(matches!(parse_smiles("(C)"), Err(SmilesError::BranchNoCurrentAtom(0))));
        assert!(matches!(parse_smiles("[Xy]"), Err(SmilesError::UnknownElement { .. })));
        assert!(matches!(parse_smiles("C(=)C"), Err(SmilesError::DanglingBond(2))));
    }

    #[test]
    fn test_bracket_numbers_out_of_range() {
        for smiles in ["[C-128]", "[C+200]", "[CH300]", "[999999999C]", "[C+99999999999]"] {
            assert!(
                matches!(parse_smiles(smiles), Err(SmilesError::BracketValueOutOfRange(_))),
                "{smiles}"
            );
        }
        let many = format!("[C{}]", "+".repeat(128));
        assert!(matches!(parse_smiles(&many), Err(SmilesError::BracketValueOutOfRange(_))));

        let molecule = parse_smiles("[C-127]").expect("Failed to parse SMILES");
        assert_eq!(molecule.graph()[NodeIndex::new(0)].charge, -127);
        let molecule = parse_smiles(&format!("[C{}]", "-".repeat(127))).expect("Failed to parse SMILES");
        assert_eq!(molecule.graph()[NodeIndex::new(0)].charge, -127);
        let molecule = parse_smiles("[65535CH255]").expect("Failed to parse SMILES");
        assert_eq!(molecule.graph()[NodeIndex::new(0)].isotope, Some(65535));
        assert_eq!(molecule.graph()[NodeIndex::new(0)].hydrogens, Some(255));
    }

    #[test]
    fn test_branch_and_ring_bond_rules() {
        assert!(matches!(parse_smiles("C((C))"), Err(SmilesError::EmptyBranch(1))));
        assert!(matches!(parse_smiles("C()C"), Err(SmilesError::EmptyBranch(1))));
        assert!(matches!(parse_smiles("C-1CC=1"), Err(SmilesError::RingBondMismatch(1, 6))));
        assert!(parse_smiles("C(C)(C)C").is_ok());
        assert!(parse_smiles("C=1CC=1").is_ok());
        assert!(parse_smiles("C-1CC1").is_ok());
    }

    #[test]
    fn test_parse_aromatic_tellurium() {
        let molecule = parse_smiles("[te]1cccc1").expect("Failed to parse SMILES");
        let tellurium = &molecule.graph()[NodeIndex::new(0)];
        assert_eq!(tellurium.symbol(), "Te");
        assert!(tellurium.aromatic);
        assert_eq!(molecule.bond_count(), 5);
    }
}
