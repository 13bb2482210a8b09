//! A parser for the SMARTS subset used by the key dictionaries.
//!
//! Supported: element symbols, `#n`, `*`, `a`, `A`, `H`, `D`, `X`, `R`,
//! charges, the `!`, `&`, `,` and `;` operators, branches and ring closures.
//! Recursive SMARTS, chirality and ring-size primitives are not.

use std::collections::BTreeMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, digit1, satisfy},
    combinator::{all_consuming, map, map_opt, map_res, opt, value},
    error::{convert_error, VerboseError},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded},
    IResult,
};
use petgraph::graph::{NodeIndex, UnGraph};
use thiserror::Error;

use crate::Element;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmartsError {
    #[error("empty SMARTS pattern")]
    Empty,
    #[error("cannot parse SMARTS '{smarts}' at position {position}:\n{message}")]
    Syntax {
        smarts: String,
        position: usize,
        message: String,
    },
    #[error("SMARTS '{0}' has a bond without an atom on both sides")]
    DanglingBond(String),
    #[error("SMARTS '{0}' has unbalanced branches")]
    UnbalancedBranch(String),
    #[error("SMARTS '{smarts}' leaves ring closure {ring} open")]
    UnclosedRing { smarts: String, ring: u8 },
}

/// An atom predicate of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomExpr {
    Any,
    Aromatic,
    Aliphatic,
    /// Atomic number, optionally restricted to the aromatic or aliphatic form.
    Element { number: u8, aromatic: Option<bool> },
    /// Total hydrogen count.
    HydrogenCount(u8),
    /// Number of heavy-atom neighbors.
    Degree(u8),
    /// Heavy-atom neighbors plus hydrogens.
    Connectivity(u8),
    InRing(bool),
    Charge(i8),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
}

/// A bond predicate of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BondExpr {
    Any,
    Single,
    Double,
    Triple,
    Aromatic,
    Ring,
    /// The bond written without a symbol: single or aromatic.
    Implicit,
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

impl AtomExpr {
    fn all(mut terms: Vec<AtomExpr>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            AtomExpr::And(terms)
        }
    }

    fn any(mut terms: Vec<AtomExpr>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            AtomExpr::Or(terms)
        }
    }
}

impl BondExpr {
    fn all(mut terms: Vec<BondExpr>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            BondExpr::And(terms)
        }
    }

    fn any(mut terms: Vec<BondExpr>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            BondExpr::Or(terms)
        }
    }
}

pub type QueryGraph = UnGraph<AtomExpr, BondExpr>;

/// A compiled SMARTS pattern.
#[derive(Debug, Clone)]
pub struct Query {
    smarts: String,
    graph: QueryGraph,
}

impl Query {
    pub fn smarts(&self) -> &str {
        &self.smarts
    }

    pub fn graph(&self) -> &QueryGraph {
        &self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[derive(Debug, Clone)]
enum Token {
    Atom(AtomExpr),
    Bond(BondExpr),
    Open,
    Close,
    Ring(u8),
}

/// Compiles a SMARTS pattern into a query graph.
pub fn parse_smarts(smarts: &str) -> Result<Query, SmartsError> {
    if smarts.trim().is_empty() {
        return Err(SmartsError::Empty);
    }

    let tokens = match all_consuming(many0(token))(smarts) {
        Ok((_, tokens)) => tokens,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map_or(0, |(rest, _)| smarts.len() - rest.len());
            return Err(SmartsError::Syntax {
                smarts: smarts.to_string(),
                position,
                message: convert_error(smarts, e),
            });
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(SmartsError::Syntax {
                smarts: smarts.to_string(),
                position: smarts.len(),
                message: "incomplete input".to_string(),
            })
        }
    };

    let mut graph = QueryGraph::new_undirected();
    let mut current: Option<NodeIndex> = None;
    let mut pending: Option<BondExpr> = None;
    let mut branches = Vec::new();
    let mut rings: BTreeMap<u8, (NodeIndex, Option<BondExpr>)> = BTreeMap::new();

    for token in tokens {
        match token {
            Token::Atom(expr) => {
                let node = graph.add_node(expr);
                match current {
                    Some(previous) => {
                        let bond = pending.take().unwrap_or(BondExpr::Implicit);
                        graph.add_edge(previous, node, bond);
                    }
                    None if pending.is_some() => {
                        return Err(SmartsError::DanglingBond(smarts.to_string()))
                    }
                    None => {}
                }
                current = Some(node);
            }
            Token::Bond(expr) => {
                if current.is_none() || pending.is_some() {
                    return Err(SmartsError::DanglingBond(smarts.to_string()));
                }
                pending = Some(expr);
            }
            Token::Open => {
                let node = current.ok_or_else(|| SmartsError::UnbalancedBranch(smarts.to_string()))?;
                branches.push(node);
            }
            Token::Close => {
                if pending.is_some() {
                    return Err(SmartsError::DanglingBond(smarts.to_string()));
                }
                current = Some(
                    branches
                        .pop()
                        .ok_or_else(|| SmartsError::UnbalancedBranch(smarts.to_string()))?,
                );
            }
            Token::Ring(ring) => {
                let node = current.ok_or_else(|| SmartsError::DanglingBond(smarts.to_string()))?;
                match rings.remove(&ring) {
                    Some((start, opening)) => {
                        let bond = pending.take().or(opening).unwrap_or(BondExpr::Implicit);
                        graph.add_edge(start, node, bond);
                    }
                    None => {
                        rings.insert(ring, (node, pending.take()));
                    }
                }
            }
        }
    }

    if pending.is_some() {
        return Err(SmartsError::DanglingBond(smarts.to_string()));
    }
    if !branches.is_empty() {
        return Err(SmartsError::UnbalancedBranch(smarts.to_string()));
    }
    if let Some(&ring) = rings.keys().next() {
        return Err(SmartsError::UnclosedRing {
            smarts: smarts.to_string(),
            ring,
        });
    }

    Ok(Query {
        smarts: smarts.to_string(),
        graph,
    })
}

fn token(input: &str) -> Res<Token> {
    alt((
        map(delimited(char('['), atom_low, char(']')), Token::Atom),
        map(organic_atom, Token::Atom),
        map(bond_low, Token::Bond),
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        map(ring_label, Token::Ring),
    ))(input)
}

fn number(input: &str) -> Res<u8> {
    map_res(digit1, str::parse::<u8>)(input)
}

fn ring_label(input: &str) -> Res<u8> {
    alt((
        map_res(
            preceded(char('%'), take_while_m_n(2, 2, |c: char| c.is_ascii_digit())),
            str::parse::<u8>,
        ),
        map(satisfy(|c| c.is_ascii_digit()), |c| c as u8 - b'0'),
    ))(input)
}

fn element(symbol: &str, aromatic: bool) -> Option<AtomExpr> {
    let element = if aromatic {
        Element::from_aromatic_symbol(symbol)
    } else {
        Element::from_symbol(symbol)
    }?;
    Some(AtomExpr::Element {
        number: element.atomic_number(),
        aromatic: Some(aromatic),
    })
}

/// Atoms written outside brackets.
fn organic_atom(input: &str) -> Res<AtomExpr> {
    alt((
        value(AtomExpr::Any, char('*')),
        map_opt(
            alt((
                tag("Cl"),
                tag("Br"),
                tag("B"),
                tag("C"),
                tag("N"),
                tag("O"),
                tag("P"),
                tag("S"),
                tag("F"),
                tag("I"),
            )),
            |symbol| element(symbol, false),
        ),
        map_opt(
            alt((tag("c"), tag("n"), tag("o"), tag("s"), tag("p"), tag("b"))),
            |symbol| element(symbol, true),
        ),
        value(AtomExpr::Aromatic, char('a')),
        value(AtomExpr::Aliphatic, char('A')),
    ))(input)
}

fn atom_low(input: &str) -> Res<AtomExpr> {
    map(separated_list1(char(';'), atom_or), AtomExpr::all)(input)
}

fn atom_or(input: &str) -> Res<AtomExpr> {
    map(separated_list1(char(','), atom_high), AtomExpr::any)(input)
}

fn atom_high(input: &str) -> Res<AtomExpr> {
    map(many1(preceded(opt(char('&')), atom_unary)), AtomExpr::all)(input)
}

fn atom_unary(input: &str) -> Res<AtomExpr> {
    alt((
        map(preceded(char('!'), atom_unary), |expr| AtomExpr::Not(Box::new(expr))),
        atom_primitive,
    ))(input)
}

fn atom_primitive(input: &str) -> Res<AtomExpr> {
    alt((
        map(preceded(char('#'), number), |number| AtomExpr::Element {
            number,
            aromatic: None,
        }),
        bracket_symbol,
        value(AtomExpr::Any, char('*')),
        value(AtomExpr::Aromatic, char('a')),
        value(AtomExpr::Aliphatic, char('A')),
        map(preceded(char('H'), opt(number)), |n| AtomExpr::HydrogenCount(n.unwrap_or(1))),
        map(preceded(char('D'), opt(number)), |n| AtomExpr::Degree(n.unwrap_or(1))),
        map(preceded(char('X'), opt(number)), |n| AtomExpr::Connectivity(n.unwrap_or(1))),
        map(preceded(char('R'), opt(number)), |n| AtomExpr::InRing(n != Some(0))),
        map(preceded(char('+'), opt(number)), |n| AtomExpr::Charge(n.map_or(1, |n| n as i8))),
        map(preceded(char('-'), opt(number)), |n| AtomExpr::Charge(-n.map_or(1, |n| n as i8))),
    ))(input)
}

/// Element symbols inside brackets. Two-letter symbols win over one-letter
/// ones; `H` is read as a hydrogen count, so hydrogen is written `#1`.
fn bracket_symbol(input: &str) -> Res<AtomExpr> {
    alt((
        map_opt(
            take_while_m_n(2, 2, |c: char| c.is_ascii_alphabetic()),
            |symbol: &str| {
                let mut chars = symbol.chars();
                let (first, second) = (chars.next()?, chars.next()?);
                if first.is_ascii_uppercase() && second.is_ascii_lowercase() {
                    element(symbol, false)
                } else if symbol == "se" || symbol == "as" {
                    element(symbol, true)
                } else {
                    None
                }
            },
        ),
        map_opt(
            satisfy(|c| c.is_ascii_uppercase() && c != 'H'),
            |c| element(&c.to_string(), false),
        ),
        map_opt(
            satisfy(|c| matches!(c, 'c' | 'n' | 'o' | 's' | 'p' | 'b')),
            |c| element(&c.to_string(), true),
        ),
    ))(input)
}

fn bond_low(input: &str) -> Res<BondExpr> {
    map(separated_list1(char(';'), bond_or), BondExpr::all)(input)
}

fn bond_or(input: &str) -> Res<BondExpr> {
    map(separated_list1(char(','), bond_high), BondExpr::any)(input)
}

fn bond_high(input: &str) -> Res<BondExpr> {
    map(many1(preceded(opt(char('&')), bond_unary)), BondExpr::all)(input)
}

fn bond_unary(input: &str) -> Res<BondExpr> {
    alt((
        map(preceded(char('!'), bond_unary), |expr| BondExpr::Not(Box::new(expr))),
        value(BondExpr::Single, char('-')),
        value(BondExpr::Double, char('=')),
        value(BondExpr::Triple, char('#')),
        value(BondExpr::Aromatic, char(':')),
        value(BondExpr::Any, char('~')),
        value(BondExpr::Ring, char('@')),
    ))(input)
}
