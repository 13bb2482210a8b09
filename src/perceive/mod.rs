//! Chemical perception run on every molecule before fingerprinting.

mod rings;
pub use rings::RingSet;

mod typing;
pub use typing::{perceive_atom_types, AtomTypingError};

mod aromaticity;
pub use aromaticity::{detect_aromaticity, AromaticityError};
