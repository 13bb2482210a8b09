mod smiles;
pub use smiles::*;

mod molfile;
pub use molfile::*;

mod smarts;
pub use smarts::*;
