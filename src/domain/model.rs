use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The nine positional columns of a shipment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    ExternalNumber,
    Reference,
    Remarks,
    SenderName,
    SenderEmail,
    SenderPhone,
    CustomsValue,
    CustomsCurrency,
    RecipientName,
}

impl RecordField {
    pub const ALL: [RecordField; 9] = [
        RecordField::ExternalNumber,
        RecordField::Reference,
        RecordField::Remarks,
        RecordField::SenderName,
        RecordField::SenderEmail,
        RecordField::SenderPhone,
        RecordField::CustomsValue,
        RecordField::CustomsCurrency,
        RecordField::RecipientName,
    ];

    pub fn column(self) -> usize {
        self as usize
    }

    /// Header label used by the source spreadsheets. Informational only;
    /// columns are matched by position.
    pub fn header(self) -> &'static str {
        match self {
            RecordField::ExternalNumber => "Numer zewnetrzny",
            RecordField::Reference => "Referencja",
            RecordField::Remarks => "Uwagi",
            RecordField::SenderName => "Nazwisko nadawcy",
            RecordField::SenderEmail => "Email Nadawcy",
            RecordField::SenderPhone => "Telefon Nadawcy",
            RecordField::CustomsValue => "Wartość Celna",
            RecordField::CustomsCurrency => "Waluta wartości celnej",
            RecordField::RecipientName => "Nazwisko odbiorcy",
        }
    }
}

/// One spreadsheet data row. The key set is fixed; each value may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: [Option<String>; 9],
}

impl Record {
    /// Builds a record from cells in column order. Missing trailing cells are
    /// absent values; cells past the ninth are ignored.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut values: [Option<String>; 9] = Default::default();
        for (slot, cell) in values.iter_mut().zip(cells) {
            *slot = cell;
        }
        Self { values }
    }

    pub fn get(&self, field: RecordField) -> Option<&str> {
        self.values[field.column()].as_deref()
    }

    /// The value as text, with an absent value rendered empty.
    pub fn text(&self, field: RecordField) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn external_number(&self) -> &str {
        self.text(RecordField::ExternalNumber)
    }

    pub fn recipient_name(&self) -> &str {
        self.text(RecordField::RecipientName)
    }

    /// `"{external_number} {recipient_name}.pdf"`, taken verbatim from the
    /// row. Separators in either value are kept, so the name may point into a
    /// subdirectory; the batch logs a warning when that happens.
    pub fn output_file_name(&self) -> String {
        format!("{} {}.pdf", self.external_number(), self.recipient_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    /// At least one record was attempted. Individual fills may still have failed.
    Success,
    NoData,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub external_number: String,
    pub output_file: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub written: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<PathBuf>,
    pub failures: Vec<RecordFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            outcome: BatchOutcome::NoData,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            dry_run,
            written: Vec::new(),
            planned: Vec::new(),
            failures: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == BatchOutcome::Success
    }

    pub fn all_succeeded(&self) -> bool {
        self.is_success() && self.failed == 0
    }

    /// One-line count for the operator. A dry run reports planned files only.
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "{} rows: {} files would be written",
                self.attempted,
                self.planned.len()
            )
        } else {
            format!(
                "{} rows: {} written, {} failed",
                self.attempted,
                self.written.len(),
                self.failed
            )
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    #[test]
    fn test_fields_map_to_columns_in_order() {
        let record = Record::from_cells(cells(&[
            "123", "FV/1", "books", "Jan", "jan@x.pl", "600", "10", "EUR", "Smith",
        ]));

        assert_eq!(record.get(RecordField::ExternalNumber), Some("123"));
        assert_eq!(record.get(RecordField::SenderPhone), Some("600"));
        assert_eq!(record.get(RecordField::RecipientName), Some("Smith"));
        assert_eq!(RecordField::CustomsCurrency.column(), 7);
    }

    #[test]
    fn test_short_row_leaves_remaining_fields_absent() {
        let record = Record::from_cells(cells(&["7", "ref"]));

        assert_eq!(record.get(RecordField::Reference), Some("ref"));
        assert_eq!(record.get(RecordField::Remarks), None);
        assert_eq!(record.text(RecordField::RecipientName), "");
    }

    #[test]
    fn test_output_file_name_is_deterministic() {
        let a = Record::from_cells(cells(&["123", "", "", "", "", "", "", "", "Smith"]));
        let b = Record::from_cells(cells(&["123", "other", "", "", "", "", "", "", "Smith"]));

        assert_eq!(a.output_file_name(), "123 Smith.pdf");
        assert_eq!(a.output_file_name(), b.output_file_name());
        assert_eq!(Record::default().output_file_name(), " .pdf");
    }

    #[test]
    fn test_report_serializes_outcome() {
        let mut report = BatchReport::new(Utc::now(), false);
        report.outcome = BatchOutcome::Success;
        report.attempted = 1;
        report.succeeded = 1;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "success");
        assert!(json.get("planned").is_none());
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_summary_separates_dry_run_from_written_files() {
        let mut report = BatchReport::new(Utc::now(), true);
        report.attempted = 2;
        report.succeeded = 2;
        report.planned = vec![PathBuf::from("1 A.pdf"), PathBuf::from("2 B.pdf")];
        assert_eq!(report.summary(), "2 rows: 2 files would be written");

        let mut report = BatchReport::new(Utc::now(), false);
        report.attempted = 2;
        report.succeeded = 1;
        report.failed = 1;
        report.written = vec![PathBuf::from("1 A.pdf")];
        assert_eq!(report.summary(), "2 rows: 1 written, 1 failed");
    }
}
