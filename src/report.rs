use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::trace;

use crate::config::Delimiter;
use crate::fingerprint::{BitVector, FingerprintKind};

/// A successfully fingerprinted molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintResult {
    /// 1-based position of the molecule in the input.
    pub index: usize,
    pub title: String,
    pub bits: BitVector,
}

/// Line terminator of the report.
pub const LINE_END: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Writes the header and one line per result, flushing after every line.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

fn builder(delimiter: Delimiter) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(delimiter.as_byte())
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .has_headers(false)
        .terminator(if cfg!(windows) {
            Terminator::CRLF
        } else {
            Terminator::Any(b'\n')
        });
    builder
}

impl ReportWriter<File> {
    pub fn create(path: &Path, delimiter: Delimiter) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?, delimiter))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W, delimiter: Delimiter) -> Self {
        Self {
            writer: builder(delimiter).from_writer(inner),
        }
    }

    /// Writes `CDKDescUI <kind> <bits> bits`.
    pub fn write_header(&mut self, kind: FingerprintKind, bits: usize) -> csv::Result<()> {
        self.writer.write_record([format!("CDKDescUI {kind} {bits} bits")])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_result(&mut self, result: &FingerprintResult) -> csv::Result<()> {
        trace!("writing result for record {}", result.index);
        self.writer
            .write_record([result.title.as_str(), result.bits.to_string().as_str()])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> csv::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, title: &str, ones: &[usize], len: usize) -> FingerprintResult {
        let mut bits = BitVector::new(len);
        for &one in ones {
            bits.set(one);
        }
        FingerprintResult {
            index,
            title: title.to_string(),
            bits,
        }
    }

    fn written(delimiter: Delimiter, results: &[FingerprintResult]) -> String {
        let mut report = ReportWriter::new(Vec::new(), delimiter);
        report.write_header(FingerprintKind::MACCS, 4).expect("Failed to write header");
        for result in results {
            report.write_result(result).expect("Failed to write result");
        }
        String::from_utf8(report.into_inner().expect("Failed to finish report")).expect("Report is not UTF-8")
    }

    #[test]
    fn test_tab_report() {
        let text = written(
            Delimiter::Tab,
            &[result(1, "aspirin", &[1, 3], 4), result(2, "Mol2", &[], 4)],
        );
        let expected = ["CDKDescUI MACCS 4 bits", "aspirin\t0101", "Mol2\t0000", ""].join(LINE_END);
        assert_eq!(text, expected);
    }

    #[test]
    fn test_fields_are_never_quoted() {
        let text = written(Delimiter::Comma, &[result(1, "salt, sodium \"x\"", &[0], 4)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["CDKDescUI MACCS 4 bits", "salt, sodium \"x\",1000"]);

        let text = written(Delimiter::Space, &[result(1, "two words", &[2], 4)]);
        assert_eq!(text.lines().nth(1), Some("two words 0010"));
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failures_surface() {
        let mut report = ReportWriter::new(Full, Delimiter::Tab);
        assert!(report.write_header(FingerprintKind::Standard, 1024).is_err());
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("report.txt");
        let mut report = ReportWriter::create(&path, Delimiter::Space).expect("Failed to create report");
        report.write_header(FingerprintKind::EState, 79).expect("Failed to write header");
        drop(report);
        let text = std::fs::read_to_string(&path).expect("Failed to read report");
        assert_eq!(text, format!("CDKDescUI EState 79 bits{LINE_END}"));

        assert!(ReportWriter::create(&dir.path().join("missing/report.txt"), Delimiter::Space).is_err());
    }
}
