use std::ops::Range;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, i32, space1, u32},
    multi::count,
    sequence::{delimited, pair, preceded},
    IResult,
};
use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::{Atom, Bond, BondOrder, Element, Molecule, MoleculeGraph};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MolfileError {
    #[error("record ends before the counts line")]
    MissingCountsLine,
    #[error("V3000 connection tables are not supported")]
    UnsupportedVersion,
    #[error("invalid counts line '{0}'")]
    InvalidCountsLine(String),
    #[error("atom block ends early: expected {expected} atoms, found {found}")]
    TruncatedAtomBlock { expected: usize, found: usize },
    #[error("bond block ends early: expected {expected} bonds, found {found}")]
    TruncatedBondBlock { expected: usize, found: usize },
    #[error("invalid atom on line {line}: {details}")]
    InvalidAtom { line: usize, details: String },
    #[error("invalid bond on line {line}: {details}")]
    InvalidBond { line: usize, details: String },
    #[error("invalid property line '{0}'")]
    InvalidProperty(String),
}

/// Parses one V2000 molfile record, including any SD data items after `M  END`.
///
/// The first header line becomes the title. Bond type 4 marks the bond and
/// both of its atoms aromatic. Query bond types are rejected.
pub fn parse_molfile(record: &str) -> Result<Molecule, MolfileError> {
    let lines: Vec<&str> = record.lines().collect();
    let title = lines.first().copied().unwrap_or_default();
    let counts = lines.get(3).ok_or(MolfileError::MissingCountsLine)?;
    if counts.contains("V3000") {
        return Err(MolfileError::UnsupportedVersion);
    }
    let (atom_count, bond_count) = parse_counts_line(counts)?;

    let mut graph = MoleculeGraph::new_undirected();
    let atom_lines = lines
        .get(4..4 + atom_count)
        .ok_or(MolfileError::TruncatedAtomBlock {
            expected: atom_count,
            found: lines.len().saturating_sub(4),
        })?;
    for (offset, line) in atom_lines.iter().enumerate() {
        graph.add_node(parse_atom_line(line, 5 + offset)?);
    }

    let bond_start = 4 + atom_count;
    let bond_lines = lines
        .get(bond_start..bond_start + bond_count)
        .ok_or(MolfileError::TruncatedBondBlock {
            expected: bond_count,
            found: lines.len().saturating_sub(bond_start),
        })?;
    for (offset, line) in bond_lines.iter().enumerate() {
        let (first, second, order) = parse_bond_line(line, bond_start + offset + 1, atom_count)?;
        let (first, second) = (NodeIndex::new(first - 1), NodeIndex::new(second - 1));
        if order == BondOrder::Aromatic {
            graph[first].aromatic = true;
            graph[second].aromatic = true;
        }
        graph.add_edge(first, second, Bond::new(order));
    }

    let mut rest = lines[bond_start + bond_count..].iter();
    let mut charges_seen = false;
    let mut isotopes_seen = false;
    while let Some(line) = rest.next() {
        if line.starts_with("M  END") {
            break;
        }
        if !(line.starts_with("M  CHG") || line.starts_with("M  ISO")) {
            continue;
        }
        let invalid = || MolfileError::InvalidProperty(line.to_string());
        let (_, (kind, entries)) = atom_value_pairs(line).map_err(|_| invalid())?;
        // The first CHG or ISO line supersedes the values of the atom block.
        if kind == "CHG" && !charges_seen {
            charges_seen = true;
            graph.node_weights_mut().for_each(|atom| atom.charge = 0);
        }
        if kind == "ISO" && !isotopes_seen {
            isotopes_seen = true;
            graph.node_weights_mut().for_each(|atom| atom.isotope = None);
        }
        for (atom, value) in entries {
            if atom == 0 || (atom as usize) > atom_count {
                return Err(invalid());
            }
            let atom = &mut graph[NodeIndex::new(atom as usize - 1)];
            match kind {
                "CHG" => atom.charge = i8::try_from(value).map_err(|_| invalid())?,
                _ => atom.isotope = Some(u16::try_from(value).map_err(|_| invalid())?),
            }
        }
    }

    let mut molecule = Molecule::new(graph);
    molecule.set_title(Some(title.to_string()));

    while let Some(line) = rest.next() {
        if let Ok((_, name)) = data_header(line) {
            let mut value = Vec::new();
            for line in rest.by_ref() {
                if line.trim().is_empty() {
                    break;
                }
                value.push(line.trim_end());
            }
            molecule.set_property(name, value.join("\n"));
        }
    }

    Ok(molecule)
}

/// Returns a trimmed fixed-width column, or an empty string past the end of the line.
fn column(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    let start = range.start.min(end);
    line.get(start..end).unwrap_or_default().trim()
}

fn parse_counts_line(line: &str) -> Result<(usize, usize), MolfileError> {
    let fixed = (column(line, 0..3).parse(), column(line, 3..6).parse());
    if let (Ok(atoms), Ok(bonds)) = fixed {
        return Ok((atoms, bonds));
    }
    let mut tokens = line.split_whitespace().map(str::parse::<usize>);
    match (tokens.next(), tokens.next()) {
        (Some(Ok(atoms)), Some(Ok(bonds))) => Ok((atoms, bonds)),
        _ => Err(MolfileError::InvalidCountsLine(line.to_string())),
    }
}

fn parse_atom_line(line: &str, number: usize) -> Result<Atom, MolfileError> {
    let invalid = |details: String| MolfileError::InvalidAtom { line: number, details };

    let fixed_symbol = column(line, 31..34);
    let (symbol, charge_code) = if !fixed_symbol.is_empty()
        && fixed_symbol
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '#' || c == '*')
    {
        (fixed_symbol, column(line, 36..39))
    } else {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        (
            tokens.get(3).copied().unwrap_or_default(),
            tokens.get(5).copied().unwrap_or_default(),
        )
    };

    let mut atom = match symbol {
        "R" | "R#" => Atom::pseudo("R"),
        "A" | "Q" | "*" | "L" | "LP" => Atom::pseudo(symbol),
        "D" => {
            let mut atom = Atom::new(Element::H);
            atom.isotope = Some(2);
            atom
        }
        "T" => {
            let mut atom = Atom::new(Element::H);
            atom.isotope = Some(3);
            atom
        }
        "" => return Err(invalid("missing atom symbol".to_string())),
        symbol => Element::from_symbol(symbol)
            .map(Atom::new)
            .ok_or_else(|| invalid(format!("unknown atom symbol '{symbol}'")))?,
    };

    atom.charge = match charge_code {
        "" | "0" | "4" => 0,
        "1" => 3,
        "2" => 2,
        "3" => 1,
        "5" => -1,
        "6" => -2,
        "7" => -3,
        code => return Err(invalid(format!("unknown charge code '{code}'"))),
    };
    Ok(atom)
}

fn parse_bond_line(
    line: &str,
    number: usize,
    atom_count: usize,
) -> Result<(usize, usize, BondOrder), MolfileError> {
    let invalid = |details: String| MolfileError::InvalidBond { line: number, details };

    let fixed = (
        column(line, 0..3).parse::<usize>(),
        column(line, 3..6).parse::<usize>(),
        column(line, 6..9).parse::<u8>(),
    );
    let (first, second, kind) = match fixed {
        (Ok(first), Ok(second), Ok(kind)) => (first, second, kind),
        _ => {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let field = |index: usize| {
                tokens
                    .get(index)
                    .and_then(|token| token.parse::<usize>().ok())
                    .ok_or_else(|| invalid(format!("cannot read field {} of '{line}'", index + 1)))
            };
            (field(0)?, field(1)?, field(2)? as u8)
        }
    };

    for atom in [first, second] {
        if atom == 0 || atom > atom_count {
            return Err(invalid(format!("atom {atom} is out of range")));
        }
    }
    if first == second {
        return Err(invalid(format!("atom {first} is bonded to itself")));
    }

    let order = match kind {
        1 => BondOrder::Single,
        2 => BondOrder::Double,
        3 => BondOrder::Triple,
        4 => BondOrder::Aromatic,
        kind => return Err(invalid(format!("query bond type {kind}"))),
    };
    Ok((first, second, order))
}

/// Parses `M  CHG` and `M  ISO` lines into their atom/value pairs.
fn atom_value_pairs(input: &str) -> IResult<&str, (&str, Vec<(u32, i32)>)> {
    let (input, kind) = preceded(tag("M  "), alt((tag("CHG"), tag("ISO"))))(input)?;
    let (input, entries) = preceded(space1, u32)(input)?;
    let (input, pairs) = count(
        pair(preceded(space1, u32), preceded(space1, i32)),
        entries as usize,
    )(input)?;
    Ok((input, (kind, pairs)))
}

/// Parses an SD data header such as `>  <MELTING.POINT>` into the field name.
fn data_header(input: &str) -> IResult<&str, &str> {
    preceded(
        pair(char('>'), take_until("<")),
        delimited(char('<'), take_until(">"), char('>')),
    )(input)
}
