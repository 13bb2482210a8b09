//! Lazy readers over SMILES and SD files.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::str::Utf8Error;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{parse_molfile, parse_smiles, Molecule};

/// Lines inspected when sniffing the input format.
const SNIFF_LINES: usize = 32;

const RECORD_SEPARATOR: &str = "$$$$";

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("record {index} is malformed: {details}")]
    Malformed { index: usize, details: String },
}

impl ReadError {
    pub fn from_io(source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The input dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// One SMILES string per line, optionally followed by a title.
    Smiles,
    /// V2000 molfiles separated by `$$$$`.
    Molfile,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::Smiles => "smiles",
            Format::Molfile => "molfile",
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Lines of raw bytes, without the `\n` or `\r\n` terminator.
///
/// Decoding is left to the caller so one bad byte only spoils its own record.
struct ByteLines<R> {
    reader: R,
}

impl<R: BufRead> ByteLines<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for ByteLines<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Decodes a line, keeping a lossy copy when it is not valid UTF-8.
fn decode(bytes: Vec<u8>) -> (String, Option<Utf8Error>) {
    match String::from_utf8(bytes) {
        Ok(line) => (line, None),
        Err(e) => {
            let error = e.utf8_error();
            (String::from_utf8_lossy(e.as_bytes()).into_owned(), Some(error))
        }
    }
}

fn is_mdl_marker(line: &str) -> bool {
    line.contains("V2000")
        || line.contains("V3000")
        || line.starts_with("M  END")
        || line.trim_end() == RECORD_SEPARATOR
}

fn is_smiles_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "[]()=#-+@/\\%.:*".contains(c)
}

fn looks_like_smiles(line: &str) -> bool {
    let Some(token) = line.split_whitespace().next() else {
        return false;
    };
    token.chars().all(is_smiles_char) && parse_smiles(token).is_ok()
}

/// Guesses the format of the input from its first lines.
///
/// Any MDL marker among the first lines means molfile. Otherwise the first
/// non-blank line must start with a parseable SMILES string. Returns `None`
/// when neither holds, including for empty input. Bytes that are not UTF-8
/// are replaced before inspection.
pub fn sniff<R: BufRead>(reader: R) -> io::Result<Option<Format>> {
    let mut first = None;
    for line in ByteLines::new(reader).take(SNIFF_LINES) {
        let (line, _) = decode(line?);
        if is_mdl_marker(&line) {
            return Ok(Some(Format::Molfile));
        }
        if first.is_none() && !line.trim().is_empty() {
            first = Some(line);
        }
    }
    Ok(first
        .filter(|line| looks_like_smiles(line))
        .map(|_| Format::Smiles))
}

pub fn detect_format(path: &Path) -> Result<Option<Format>, ReadError> {
    let file = File::open(path).map_err(|e| ReadError::from_io(e, path))?;
    let format = sniff(BufReader::new(file)).map_err(|e| ReadError::from_io(e, path))?;
    debug!("detected format {format:?} for {}", path.display());
    Ok(format)
}

/// Counts the records of a file without parsing them.
pub fn count_records(path: &Path, format: Format) -> Result<usize, ReadError> {
    let file = File::open(path).map_err(|e| ReadError::from_io(e, path))?;
    let mut count = 0;
    let mut pending = false;
    for line in ByteLines::new(BufReader::new(file)) {
        let (line, _) = decode(line.map_err(|e| ReadError::from_io(e, path))?);
        match format {
            Format::Smiles => {
                if !line.trim().is_empty() {
                    count += 1;
                }
            }
            Format::Molfile => {
                if line.trim_end() == RECORD_SEPARATOR {
                    if pending {
                        count += 1;
                    }
                    pending = false;
                } else if !line.trim().is_empty() {
                    pending = true;
                }
            }
        }
    }
    if pending {
        count += 1;
    }
    Ok(count)
}

/// A forward-only sequence of molecules read from one input.
///
/// Records that fail to parse, or that contain bytes which are not UTF-8, are
/// yielded as `ReadError::Malformed` and reading continues with the next
/// record. An I/O error is yielded once and
/// ends the sequence.
pub struct StructureReader<R> {
    lines: ByteLines<R>,
    format: Format,
    path: PathBuf,
    index: usize,
    finished: bool,
}

impl StructureReader<BufReader<File>> {
    pub fn open(path: &Path, format: Format) -> Result<Self, ReadError> {
        let file = File::open(path).map_err(|e| ReadError::from_io(e, path))?;
        Ok(Self::new(BufReader::new(file), format, path))
    }
}

impl<R: BufRead> StructureReader<R> {
    /// # Arguments
    /// * `reader` - The input
    /// * `format` - The dialect of the input
    /// * `path` - The path reported in I/O errors
    pub fn new(reader: R, format: Format, path: impl Into<PathBuf>) -> Self {
        Self {
            lines: ByteLines::new(reader),
            format,
            path: path.into(),
            index: 0,
            finished: false,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Records read so far, malformed ones included.
    pub fn index(&self) -> usize {
        self.index
    }

    fn next_line(&mut self) -> Option<Result<(String, Option<Utf8Error>), ReadError>> {
        match self.lines.next()? {
            Ok(bytes) => Some(Ok(decode(bytes))),
            Err(e) => {
                self.finished = true;
                Some(Err(ReadError::from_io(e, &self.path)))
            }
        }
    }

    fn next_smiles(&mut self) -> Option<Result<Molecule, ReadError>> {
        loop {
            let (line, undecodable) = match self.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.index += 1;
            if let Some(e) = undecodable {
                return Some(Err(self.undecodable(e)));
            }
            let (smiles, title) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            trace!("record {}: {smiles}", self.index);
            let result = parse_smiles(smiles)
                .map(|molecule| molecule.with_title(title))
                .map_err(|e| ReadError::Malformed {
                    index: self.index,
                    details: format!("{e} in '{smiles}'"),
                });
            return Some(result);
        }
    }

    fn next_molfile(&mut self) -> Option<Result<Molecule, ReadError>> {
        loop {
            let mut block = Vec::new();
            let mut separated = false;
            let mut undecodable = None;
            while let Some(line) = self.next_line() {
                let (line, error) = match line {
                    Ok(line) => line,
                    Err(e) => return Some(Err(e)),
                };
                undecodable = undecodable.or(error);
                if line.trim_end() == RECORD_SEPARATOR {
                    separated = true;
                    break;
                }
                block.push(line);
            }

            if block.iter().all(|line| line.trim().is_empty()) {
                if separated {
                    continue;
                }
                return None;
            }
            self.index += 1;
            if let Some(e) = undecodable {
                return Some(Err(self.undecodable(e)));
            }
            trace!("record {}: {} lines", self.index, block.len());
            let result = parse_molfile(&block.join("\n")).map_err(|e| ReadError::Malformed {
                index: self.index,
                details: e.to_string(),
            });
            return Some(result);
        }
    }

    fn undecodable(&self, error: Utf8Error) -> ReadError {
        ReadError::Malformed {
            index: self.index,
            details: format!("record is not valid UTF-8: {error}"),
        }
    }
}

impl<R: BufRead> Iterator for StructureReader<R> {
    type Item = Result<Molecule, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = match self.format {
            Format::Smiles => self.next_smiles(),
            Format::Molfile => self.next_molfile(),
        };
        if item.is_none() {
            self.finished = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};

    use super::*;

    const TWO_RECORDS: &str = "ethanol
  hand-written

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
> <ID>
E-1

$$$$
methane


  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
M  END
";

    fn reader(text: &str, format: Format) -> StructureReader<Cursor<Vec<u8>>> {
        StructureReader::new(Cursor::new(text.as_bytes().to_vec()), format, "input")
    }

    fn sniffed(text: &str) -> Option<Format> {
        sniff(Cursor::new(text)).expect("Failed to sniff")
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniffed("CCO ethanol\nc1ccccc1 benzene\n"), Some(Format::Smiles));
        assert_eq!(sniffed("\n\n  C[NH3+]\n"), Some(Format::Smiles));
        assert_eq!(sniffed(TWO_RECORDS), Some(Format::Molfile));
        assert_eq!(sniffed("$$$$\n"), Some(Format::Molfile));
        assert_eq!(sniffed(""), None);
        assert_eq!(sniffed("\n \n"), None);
        assert_eq!(sniffed("hello world\n"), None);
        assert_eq!(sniffed("{\"smiles\": \"CCO\"}\n"), None);
        assert_eq!(sniffed("12345 numbers\n"), None);
    }

    #[test]
    fn test_read_smiles() {
        let text = "CCO ethanol\n\n   \nc1ccccc1\nC1CC broken ring\nCN  methyl amine \n";
        let items: Vec<_> = reader(text, Format::Smiles).collect();
        assert_eq!(items.len(), 4);

        let ethanol = items[0].as_ref().expect("Failed to read ethanol");
        assert_eq!(ethanol.title(), Some("ethanol"));
        assert_eq!(ethanol.atom_count(), 3);

        let benzene = items[1].as_ref().expect("Failed to read benzene");
        assert_eq!(benzene.title(), None);

        assert!(matches!(items[2], Err(ReadError::Malformed { index: 3, .. })));

        let amine = items[3].as_ref().expect("Failed to read methylamine");
        assert_eq!(amine.title(), Some("methyl amine"));
    }

    #[test]
    fn test_read_sd_file() {
        let mut structures = reader(TWO_RECORDS, Format::Molfile);
        let ethanol = structures
            .next()
            .expect("Missing first record")
            .expect("Failed to read first record");
        assert_eq!(ethanol.title(), Some("ethanol"));
        assert_eq!(ethanol.bond_count(), 2);
        assert_eq!(ethanol.property("ID"), Some("E-1"));

        let methane = structures
            .next()
            .expect("Missing second record")
            .expect("Failed to read second record");
        assert_eq!(methane.title(), Some("methane"));
        assert_eq!(structures.index(), 2);
        assert!(structures.next().is_none());
        assert!(structures.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_spoils_only_its_record() {
        let bytes = b"CCO ethanol\nCCN caf\xE9ine\r\nCCC propane\n".to_vec();
        let items: Vec<_> = StructureReader::new(Cursor::new(bytes), Format::Smiles, "input").collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ReadError::Malformed { index: 2, .. })));
        let propane = items[2].as_ref().expect("Failed to read propane");
        assert_eq!(propane.title(), Some("propane"));

        let mut sdf = TWO_RECORDS.replacen("ethanol", "\u{0}", 1).into_bytes();
        sdf[0] = 0xFF;
        let items: Vec<_> = StructureReader::new(Cursor::new(sdf.clone()), Format::Molfile, "input").collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(ReadError::Malformed { index: 1, .. })));
        assert!(items[1].is_ok());

        assert_eq!(sniff(Cursor::new(sdf)).expect("Failed to sniff"), Some(Format::Molfile));
        let smiles = b"CCO caf\xE9ine\n".to_vec();
        assert_eq!(sniff(Cursor::new(smiles)).expect("Failed to sniff"), Some(Format::Smiles));
    }

    #[test]
    fn test_crlf_line_endings() {
        let items: Vec<_> = reader("CCO ethanol\r\nCCN\r\n", Format::Smiles).collect();
        let ethanol = items[0].as_ref().expect("Failed to read ethanol");
        assert_eq!(ethanol.title(), Some("ethanol"));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_malformed_molfile_is_skipped() {
        let text = format!("broken\n\n\n  x  y\nM  END\n$$$$\n\n$$$$\n{TWO_RECORDS}");
        let items: Vec<_> = reader(&text, Format::Molfile).collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Err(ReadError::Malformed { index: 1, .. })));
        assert!(items[1].is_ok() && items[2].is_ok());
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_io_error_ends_the_sequence() {
        let mut structures = StructureReader::new(BufReader::new(BrokenPipe), Format::Smiles, "pipe");
        assert!(matches!(structures.next(), Some(Err(ReadError::Io { .. }))));
        assert!(structures.next().is_none());
    }

    #[test]
    fn test_files() {
        let mut smiles = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(smiles, "CCO\n\nCCN\nC1CC\n").expect("Failed to write temp file");
        assert_eq!(detect_format(smiles.path()).expect("Failed to detect"), Some(Format::Smiles));
        assert_eq!(count_records(smiles.path(), Format::Smiles).expect("Failed to count"), 3);

        let mut latin1 = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        latin1
            .write_all(b"CCO caf\xE9ine\nCCN\n")
            .expect("Failed to write temp file");
        assert_eq!(detect_format(latin1.path()).expect("Failed to detect"), Some(Format::Smiles));
        assert_eq!(count_records(latin1.path(), Format::Smiles).expect("Failed to count"), 2);

        let mut sdf = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(sdf, "{TWO_RECORDS}").expect("Failed to write temp file");
        assert_eq!(detect_format(sdf.path()).expect("Failed to detect"), Some(Format::Molfile));
        assert_eq!(count_records(sdf.path(), Format::Molfile).expect("Failed to count"), 2);
        let read = StructureReader::open(sdf.path(), Format::Molfile)
            .expect("Failed to open")
            .filter(Result::is_ok)
            .count();
        assert_eq!(read, 2);

        let missing = Path::new("/nonexistent/input.smi");
        assert!(matches!(detect_format(missing), Err(ReadError::Io { .. })));
        assert!(matches!(
            StructureReader::open(missing, Format::Smiles).map(|_| ()),
            Err(ReadError::Io { .. })
        ));
    }
}
