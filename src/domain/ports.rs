use crate::domain::model::{Record, RecordFailure};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Supplies the three locations a batch run needs.
pub trait PathProvider {
    fn template_path(&self) -> PathBuf;
    fn input_path(&self) -> PathBuf;
    fn output_dir(&self) -> PathBuf;
}

/// Produces one finished document from a template and a record.
pub trait DocumentFiller {
    fn fill(&self, template: &Path, output: &Path, record: &Record) -> Result<()>;
}

/// Run states, reported to observers on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    ValidatingPaths,
    Failed,
    Extracting,
    Filling { row: usize },
    Reporting,
}

/// Receives progress as it happens, so failures can be shown per record
/// instead of only in the final report.
pub trait BatchObserver {
    fn phase_changed(&mut self, _phase: BatchPhase) {}
    fn record_written(&mut self, _row: usize, _path: &Path) {}
    fn record_failed(&mut self, _failure: &RecordFailure) {}
}

pub struct NoopObserver;

impl BatchObserver for NoopObserver {}
