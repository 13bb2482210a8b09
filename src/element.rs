use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use lazy_static::lazy_static;

/// Element symbols ordered by atomic number, starting at hydrogen.
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

lazy_static! {
    static ref SYMBOL_TABLE: HashMap<&'static str, Element> = SYMBOLS
        .iter()
        .enumerate()
        .map(|(index, symbol)| (*symbol, Element(index as u8 + 1)))
        .collect();
}

/// A chemical element, identified by its atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);

    pub fn from_atomic_number(number: u8) -> Option<Self> {
        (1..=SYMBOLS.len() as u8)
            .contains(&number)
            .then_some(Element(number))
    }

    /// Looks up an element by its capitalized symbol, e.g. `"Cl"`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        SYMBOL_TABLE.get(symbol).copied()
    }

    /// Looks up an element written in SMILES aromatic form, e.g. `"c"` or `"se"`.
    pub fn from_aromatic_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "b" => Some(Element::B),
            "c" => Some(Element::C),
            "n" => Some(Element::N),
            "o" => Some(Element::O),
            "p" => Some(Element::P),
            "s" => Some(Element::S),
            "se" => Element::from_symbol("Se"),
            "as" => Element::from_symbol("As"),
            "te" => Element::from_symbol("Te"),
            _ => None,
        }
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize - 1]
    }

    /// Valence states used to derive implicit hydrogens for a neutral atom.
    ///
    /// Elements outside this table never receive implicit hydrogens.
    pub fn default_valences(self) -> &'static [u8] {
        match self.0 {
            1 => &[1],
            5 => &[3],
            6 | 14 | 32 | 50 | 82 => &[4],
            7 => &[3, 5],
            8 => &[2],
            9 | 17 | 35 | 53 => &[1],
            15 | 33 => &[3, 5],
            16 | 34 | 52 => &[2, 4, 6],
            _ => &[],
        }
    }

    /// Whether the element may be written without brackets in SMILES.
    pub fn is_organic_subset(self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(Element::from_symbol("C"), Some(Element::C));
        assert_eq!(Element::from_symbol("Cl"), Some(Element::CL));
        assert_eq!(Element::from_symbol("Og").map(Element::atomic_number), Some(118));
        assert_eq!(Element::from_symbol("Xx"), None);
        assert_eq!(Element::from_symbol("cl"), None);
    }

    #[test]
    fn test_atomic_number_round_trip() {
        for number in 1..=118u8 {
            let element = Element::from_atomic_number(number).expect("valid atomic number");
            assert_eq!(Element::from_symbol(element.symbol()), Some(element));
        }
        assert_eq!(Element::from_atomic_number(0), None);
        assert_eq!(Element::from_atomic_number(119), None);
    }

    #[test]
    fn test_aromatic_symbols() {
        assert_eq!(Element::from_aromatic_symbol("c"), Some(Element::C));
        assert_eq!(Element::from_aromatic_symbol("se").map(|e| e.symbol()), Some("Se"));
        assert_eq!(Element::from_aromatic_symbol("te").map(|e| e.symbol()), Some("Te"));
        assert_eq!(Element::from_aromatic_symbol("C"), None);
    }

    #[test]
    fn test_default_valences() {
        assert_eq!(Element::C.default_valences(), &[4]);
        assert_eq!(Element::N.default_valences(), &[3, 5]);
        assert_eq!(Element::S.default_valences(), &[2, 4, 6]);
        assert!(Element::from_symbol("Fe").expect("iron").default_valences().is_empty());
        assert!(Element::BR.is_organic_subset());
        assert!(!Element::from_symbol("Na").expect("sodium").is_organic_subset());
    }
}
