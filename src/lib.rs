//! Batch fingerprinting of chemical structure files.
//!
//! Structures are read from SMILES or MDL SD files, sanitized, and written
//! out as fixed-length bit strings, one line per molecule.

mod element;
pub use element::*;

mod molecule;
pub use molecule::*;

pub mod parse;
pub use parse::*;

pub mod perceive;

mod sanitize;
pub use sanitize::*;

pub mod fingerprint;
pub use fingerprint::{FingerprintEngine, FingerprintKind};

pub mod reader;
pub mod report;
pub mod config;
pub mod batch;

/// Installs a stderr `tracing` subscriber at the given level.
///
/// Unknown levels fall back to `info`. Calling this more than once is harmless.
pub fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
