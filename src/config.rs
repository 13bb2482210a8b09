use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::fingerprint::FingerprintKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Field separator of the report. Unknown names select `Space`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum Delimiter {
    #[default]
    Space,
    Tab,
    Comma,
}

impl Delimiter {
    pub fn from_selector(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tab" => Delimiter::Tab,
            "csv" | "comma" => Delimiter::Comma,
            _ => Delimiter::Space,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Space => b' ',
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Space => "space",
            Delimiter::Tab => "tab",
            Delimiter::Comma => "csv",
        }
    }
}

impl From<String> for Delimiter {
    fn from(name: String) -> Self {
        Delimiter::from_selector(&name)
    }
}

impl From<&str> for Delimiter {
    fn from(name: &str) -> Self {
        Delimiter::from_selector(name)
    }
}

/// Settings of one fingerprinting run.
///
/// Every field is optional in a settings file:
///
/// ```toml
/// fingerprint = "MACCS"
/// delimiter = "tab"
/// add_h = true
/// debug = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Fingerprint kind; unknown names select `Substructure`.
    pub fingerprint: FingerprintKind,
    #[serde(alias = "output_method")]
    pub delimiter: Delimiter,
    /// Whether explicit hydrogens should be added before fingerprinting.
    /// Recorded for completeness, the pipeline does not use it.
    pub add_h: bool,
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fingerprint: FingerprintKind::default(),
            delimiter: Delimiter::default(),
            add_h: true,
            debug: false,
        }
    }
}

impl Options {
    /// Reads options from a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The log level selected by the debug flag.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.fingerprint, FingerprintKind::Substructure);
        assert_eq!(options.delimiter, Delimiter::Space);
        assert!(options.add_h);
        assert!(!options.debug);
        assert_eq!(options.log_level(), "info");
        assert_eq!(Options::from_toml("").expect("Failed to parse empty settings"), options);
    }

    #[test]
    fn test_from_toml() {
        let options = Options::from_toml("fingerprint = \"Graph only\"\noutput_method = \"TAB\"\ndebug = true\n")
            .expect("Failed to parse settings");
        assert_eq!(options.fingerprint, FingerprintKind::GraphOnly);
        assert_eq!(options.delimiter, Delimiter::Tab);
        assert!(options.add_h);
        assert_eq!(options.log_level(), "debug");

        let options = Options::from_toml("fingerprint = \"Pharmacophore\"\ndelimiter = \"pipe\"\n")
            .expect("Failed to parse settings");
        assert_eq!(options.fingerprint, FingerprintKind::Substructure);
        assert_eq!(options.delimiter, Delimiter::Space);

        assert!(Options::from_toml("debug = \"yes\"").is_err());
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(Delimiter::from("csv"), Delimiter::Comma);
        assert_eq!(Delimiter::from("Comma").as_byte(), b',');
        assert_eq!(Delimiter::from("tab").as_byte(), b'\t');
        assert_eq!(Delimiter::from("spc"), Delimiter::Space);
        assert_eq!(Delimiter::Comma.name(), "csv");
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "fingerprint = \"EState\"").expect("Failed to write settings");
        let options = Options::load(file.path()).expect("Failed to load settings");
        assert_eq!(options.fingerprint, FingerprintKind::EState);

        assert!(matches!(
            Options::load("/nonexistent/settings.toml"),
            Err(ConfigError::Read { .. })
        ));

        let mut broken = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(broken, "fingerprint = ").expect("Failed to write settings");
        assert!(matches!(Options::load(broken.path()), Err(ConfigError::Parse { .. })));
    }
}
