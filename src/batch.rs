//! Runs the reader, sanitizer, fingerprint engine and report writer over a
//! whole input file.
//!
//! A run moves through `Idle`, `Running` and one of `Done`, `Canceled` or
//! `Failed`. Molecules that fail to parse, sanitize or fingerprint become
//! [`ExceptionRecord`]s and the run continues; only I/O failures end it early.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Options;
use crate::fingerprint::{FingerprintEngine, FingerprintError};
use crate::reader::{count_records, detect_format, Format, ReadError, StructureReader};
use crate::report::{FingerprintResult, ReportWriter};
use crate::{sanitize, Molecule, SanitizationError};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("input file format of {} was not recognized, it should be SDF or SMILES", .path.display())]
    UnrecognizedFormat { path: PathBuf },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write report {}: {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("fingerprinting task panicked")]
    TaskPanicked,
}

/// Why a molecule produced no fingerprint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error(transparent)]
    Sanitization(#[from] SanitizationError),
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
}

/// A molecule that was visited but not written.
#[derive(Debug, Clone)]
pub struct ExceptionRecord {
    /// 1-based position of the record in the input.
    pub index: usize,
    /// The molecule as read, absent when the record could not be parsed.
    pub molecule: Option<Molecule>,
    pub reason: FailureReason,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunStatus {
    Idle,
    Running,
    Done,
    Canceled,
    Failed,
}

impl RunStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunStatus::Idle,
            1 => RunStatus::Running,
            2 => RunStatus::Done,
            3 => RunStatus::Canceled,
            _ => RunStatus::Failed,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, RunStatus::Done | RunStatus::Canceled | RunStatus::Failed)
    }
}

/// Cooperative cancellation flag shared between a run and its callers.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

const UNKNOWN_TOTAL: usize = usize::MAX;

/// Progress of a run, shared with the thread doing the work.
#[derive(Debug)]
pub struct RunState {
    status: AtomicU8,
    current: AtomicUsize,
    total: AtomicUsize,
    written: AtomicUsize,
    exceptions: Mutex<Vec<ExceptionRecord>>,
}

/// A snapshot of [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Records visited so far.
    pub current: usize,
    /// Records in the input, when known.
    pub total: Option<usize>,
    pub written: usize,
    pub status: RunStatus,
    pub done: bool,
    pub canceled: bool,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: RunStatus,
    pub visited: usize,
    pub written: usize,
    pub exceptions: Vec<ExceptionRecord>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            status: AtomicU8::new(RunStatus::Idle as u8),
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(UNKNOWN_TOTAL),
            written: AtomicUsize::new(0),
            exceptions: Mutex::new(Vec::new()),
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, status: RunStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    fn lock_exceptions(&self) -> MutexGuard<'_, Vec<ExceptionRecord>> {
        self.exceptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reset(&self) {
        self.set_status(RunStatus::Idle);
        self.current.store(0, Ordering::SeqCst);
        self.total.store(UNKNOWN_TOTAL, Ordering::SeqCst);
        self.written.store(0, Ordering::SeqCst);
        self.lock_exceptions().clear();
    }

    fn record(&self, exception: ExceptionRecord) {
        warn!("molecule {}: {}", exception.index, exception.reason);
        self.lock_exceptions().push(exception);
    }

    pub fn progress(&self) -> Progress {
        let status = self.status();
        let total = self.total.load(Ordering::SeqCst);
        Progress {
            current: self.current.load(Ordering::SeqCst),
            total: (total != UNKNOWN_TOTAL).then_some(total),
            written: self.written.load(Ordering::SeqCst),
            status,
            done: status == RunStatus::Done,
            canceled: status == RunStatus::Canceled,
        }
    }

    /// The exceptions recorded so far, in input order.
    pub fn exceptions(&self) -> Vec<ExceptionRecord> {
        self.lock_exceptions().clone()
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            status: self.status(),
            visited: self.current.load(Ordering::SeqCst),
            written: self.written.load(Ordering::SeqCst),
            exceptions: self.exceptions(),
        }
    }
}

/// Sanitizes and fingerprints one molecule.
fn fingerprint(
    molecule: Molecule,
    engine: &FingerprintEngine,
    index: usize,
) -> Result<FingerprintResult, ExceptionRecord> {
    let title = molecule
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Mol{index}"));
    let snapshot = molecule.clone();
    let failure = |reason: FailureReason, snapshot: Molecule, title: String| ExceptionRecord {
        index,
        molecule: Some(snapshot),
        reason,
        context: title,
    };

    let sanitized = match sanitize(molecule) {
        Ok(sanitized) => sanitized,
        Err(e) => return Err(failure(e.into(), snapshot, title)),
    };
    match engine.compute(&sanitized) {
        Ok(bits) => Ok(FingerprintResult { index, title, bits }),
        Err(e) => Err(failure(e.into(), snapshot, title)),
    }
}

/// Drives one run over already opened input and output.
///
/// The cancellation token is checked before every record is read. Returns
/// `Done` when the input is exhausted and `Canceled` when the token was set.
pub(crate) fn process<I, W>(
    records: I,
    report: &mut ReportWriter<W>,
    engine: &FingerprintEngine,
    state: &RunState,
    token: &CancellationToken,
    output: &Path,
) -> Result<RunStatus, BatchError>
where
    I: IntoIterator<Item = Result<Molecule, ReadError>>,
    W: Write,
{
    let report_error = |source: csv::Error| BatchError::Report {
        path: output.to_path_buf(),
        source,
    };
    report
        .write_header(engine.kind(), engine.size())
        .map_err(report_error)?;

    let mut records = records.into_iter();
    loop {
        if token.is_canceled() {
            info!("run canceled after {} molecules", state.current.load(Ordering::SeqCst));
            return Ok(RunStatus::Canceled);
        }
        let Some(record) = records.next() else {
            return Ok(RunStatus::Done);
        };
        let index = state.current.load(Ordering::SeqCst) + 1;

        match record {
            Ok(molecule) => {
                debug!("molecule {index}: {} atoms", molecule.atom_count());
                match fingerprint(molecule, engine, index) {
                    Ok(result) => {
                        report.write_result(&result).map_err(report_error)?;
                        state.written.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(exception) => state.record(exception),
                }
            }
            Err(ReadError::Malformed { details, .. }) => state.record(ExceptionRecord {
                index,
                molecule: None,
                reason: FailureReason::Malformed(details.clone()),
                context: details,
            }),
            Err(e) => return Err(e.into()),
        }
        state.current.store(index, Ordering::SeqCst);
    }
}

/// Fingerprints every molecule of an input file into a report file.
pub struct BatchRunner {
    input: PathBuf,
    output: PathBuf,
    options: Options,
    format: Format,
    state: Arc<RunState>,
    token: CancellationToken,
}

impl BatchRunner {
    /// Prepares a run, detecting the input format.
    ///
    /// # Arguments
    /// * `input` - A SMILES or SD file
    /// * `output` - The report to write
    /// * `options` - The fingerprint kind and report delimiter
    ///
    /// # Returns
    /// `BatchError::UnrecognizedFormat` when the input is neither SMILES nor
    /// SD, before any work starts.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: Options,
    ) -> Result<Self, BatchError> {
        let input = input.into();
        let format = detect_format(&input)?.ok_or_else(|| BatchError::UnrecognizedFormat {
            path: input.clone(),
        })?;
        Ok(Self {
            input,
            output: output.into(),
            options,
            format,
            state: Arc::new(RunState::new()),
            token: CancellationToken::new(),
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs to completion on the calling thread.
    pub fn run(&self) -> Result<RunSummary, BatchError> {
        self.state.reset();
        self.state.set_status(RunStatus::Running);
        info!(
            "fingerprinting {} ({}) into {} with {}",
            self.input.display(),
            self.format,
            self.output.display(),
            self.options.fingerprint
        );
        match count_records(&self.input, self.format) {
            Ok(total) => self.state.total.store(total, Ordering::SeqCst),
            Err(e) => warn!("cannot count input records: {e}"),
        }

        match self.execute() {
            Ok(status) => {
                self.state.set_status(status);
                let summary = self.state.summary();
                info!(
                    "run {:?}: {} visited, {} written, {} exceptions",
                    summary.status,
                    summary.visited,
                    summary.written,
                    summary.exceptions.len()
                );
                Ok(summary)
            }
            Err(e) => {
                self.state.set_status(RunStatus::Failed);
                error!("run failed: {e}");
                Err(e)
            }
        }
    }

    fn execute(&self) -> Result<RunStatus, BatchError> {
        let records = StructureReader::open(&self.input, self.format)?;
        let mut report =
            ReportWriter::create(&self.output, self.options.delimiter).map_err(|source| BatchError::Io {
                path: self.output.clone(),
                source,
            })?;
        let engine = FingerprintEngine::new(self.options.fingerprint);
        let status = process(records, &mut report, &engine, &self.state, &self.token, &self.output)?;
        report.into_inner().map_err(|source| BatchError::Report {
            path: self.output.clone(),
            source,
        })?;
        Ok(status)
    }

    /// Runs on a background thread.
    pub fn spawn(self) -> RunHandle {
        let state = self.state();
        let token = self.cancellation_token();
        let handle = thread::spawn(move || self.run());
        RunHandle {
            state,
            token,
            handle,
        }
    }
}

/// A run in progress on a background thread.
pub struct RunHandle {
    state: Arc<RunState>,
    token: CancellationToken,
    handle: JoinHandle<Result<RunSummary, BatchError>>,
}

impl RunHandle {
    pub fn progress(&self) -> Progress {
        self.state.progress()
    }

    pub fn exceptions(&self) -> Vec<ExceptionRecord> {
        self.state.exceptions()
    }

    /// Asks the run to stop before its next molecule.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<RunSummary, BatchError> {
        self.handle.join().map_err(|_| BatchError::TaskPanicked)?
    }
}
