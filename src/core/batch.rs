use crate::core::extractor::SpreadsheetExtractor;
use crate::domain::model::{BatchOutcome, BatchReport, RecordFailure};
use crate::domain::ports::{BatchObserver, BatchPhase, DocumentFiller, PathProvider};
use crate::utils::error::{FormsError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;

pub struct BatchEngine<F: DocumentFiller> {
    filler: F,
    extractor: SpreadsheetExtractor,
    dry_run: bool,
}

impl<F: DocumentFiller> BatchEngine<F> {
    pub fn new(filler: F, extractor: SpreadsheetExtractor) -> Self {
        Self {
            filler,
            extractor,
            dry_run: false,
        }
    }

    /// Validate and extract only; list the files a real run would write.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run<P>(&self, paths: &P, observer: &mut dyn BatchObserver) -> Result<BatchReport>
    where
        P: PathProvider + ?Sized,
    {
        let started_at = Utc::now();
        let template = paths.template_path();
        let input = paths.input_path();
        let output_dir = paths.output_dir();

        observer.phase_changed(BatchPhase::ValidatingPaths);
        if let Err(e) = validate_paths(&template, &input, &output_dir) {
            tracing::error!("❌ Precondition failed: {}", e);
            observer.phase_changed(BatchPhase::Failed);
            observer.phase_changed(BatchPhase::Idle);
            return Err(e);
        }

        observer.phase_changed(BatchPhase::Extracting);
        tracing::info!("📥 Reading records from {}", input.display());
        let records = match self.extractor.open(&input) {
            Ok(records) => records,
            Err(e) => {
                observer.phase_changed(BatchPhase::Failed);
                observer.phase_changed(BatchPhase::Idle);
                return Err(e);
            }
        };

        let mut report = BatchReport::new(started_at, self.dry_run);
        let mut seen_names = HashSet::new();

        for (index, record) in records.enumerate() {
            let row = index + 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    observer.phase_changed(BatchPhase::Failed);
                    observer.phase_changed(BatchPhase::Idle);
                    return Err(e);
                }
            };
            observer.phase_changed(BatchPhase::Filling { row });
            report.attempted += 1;

            let file_name = record.output_file_name();
            let output_path = output_dir.join(&file_name);
            if !seen_names.insert(file_name.clone()) {
                tracing::warn!(
                    "⚠️ Row {} reuses output file '{}'; the earlier document will be overwritten",
                    row,
                    file_name
                );
            }
            if leaves_output_dir(&file_name) {
                tracing::warn!(
                    "⚠️ Row {} output file '{}' contains a path separator; it is not written directly into {}",
                    row,
                    file_name,
                    output_dir.display()
                );
            }

            if self.dry_run {
                tracing::info!("🔍 Row {} would be written to {}", row, output_path.display());
                report.planned.push(output_path);
                report.succeeded += 1;
                continue;
            }

            tracing::debug!("Filling row {} into {}", row, output_path.display());
            match self.filler.fill(&template, &output_path, &record) {
                Ok(()) => {
                    tracing::info!("📄 Row {}: wrote {}", row, output_path.display());
                    observer.record_written(row, &output_path);
                    report.succeeded += 1;
                    report.written.push(output_path);
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Row {} (number {}): {}",
                        row,
                        record.external_number(),
                        e
                    );
                    let failure = RecordFailure {
                        row,
                        external_number: record.external_number().to_string(),
                        output_file: output_path,
                        message: e.to_string(),
                    };
                    observer.record_failed(&failure);
                    report.failed += 1;
                    report.failures.push(failure);
                }
            }
        }

        observer.phase_changed(BatchPhase::Reporting);
        report.outcome = if report.attempted > 0 {
            BatchOutcome::Success
        } else {
            BatchOutcome::NoData
        };
        report.finished_at = Utc::now();

        match report.outcome {
            BatchOutcome::Success => tracing::info!(
                "✅ Batch finished: {} attempted, {} succeeded, {} failed",
                report.attempted,
                report.succeeded,
                report.failed
            ),
            BatchOutcome::NoData => tracing::warn!("⚠️ No data rows in {}", input.display()),
        }

        observer.phase_changed(BatchPhase::Idle);
        Ok(report)
    }
}

/// A name built from record text that would not land directly in the output directory.
fn leaves_output_dir(file_name: &str) -> bool {
    file_name.contains('/') || file_name.contains('\\')
}

/// Checks the three locations in order and reports the first one missing.
pub fn validate_paths(template: &Path, input: &Path, output_dir: &Path) -> Result<()> {
    if !template.is_file() {
        return Err(FormsError::MissingTemplate {
            path: template.to_path_buf(),
        });
    }
    if !input.is_file() {
        return Err(FormsError::MissingInput {
            path: input.to_path_buf(),
        });
    }
    if !output_dir.is_dir() {
        return Err(FormsError::MissingOutputDir {
            path: output_dir.to_path_buf(),
        });
    }
    Ok(())
}
