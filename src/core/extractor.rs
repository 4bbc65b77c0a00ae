use crate::domain::model::Record;
use crate::utils::encoding::decode_bytes;
use crate::utils::error::{FormsError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use encoding_rs::Encoding;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Number of positional columns read from every row.
pub const RECORD_COLUMNS: usize = 9;

#[derive(Debug, Clone, Copy)]
pub struct SpreadsheetExtractor {
    csv_encoding: &'static Encoding,
}

impl Default for SpreadsheetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetExtractor {
    pub fn new() -> Self {
        Self {
            csv_encoding: encoding_rs::UTF_8,
        }
    }

    /// Encoding used for delimited text input. Workbook formats ignore it.
    pub fn with_csv_encoding(encoding: &'static Encoding) -> Self {
        Self {
            csv_encoding: encoding,
        }
    }

    /// Opens the first worksheet (or the CSV file) and returns its data rows,
    /// header skipped, in row order.
    pub fn open(&self, path: &Path) -> Result<Records> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let rows = if is_csv {
            self.open_csv(path)?
        } else {
            Self::open_workbook(path)?
        };

        tracing::debug!("Opened {} for record extraction", path.display());
        Ok(Records {
            path: path.to_path_buf(),
            rows,
        })
    }

    fn open_workbook(path: &Path) -> Result<RowSource> {
        let mut workbook = open_workbook_auto(path).map_err(|e| read_error(path, e))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| read_error(path, "workbook has no worksheets"))?
            .map_err(|e| read_error(path, e))?;

        let last_row = range.end().map(|(row, _)| row);
        Ok(RowSource::Sheet {
            range,
            next_row: 1,
            last_row,
        })
    }

    fn open_csv(&self, path: &Path) -> Result<RowSource> {
        let bytes = std::fs::read(path).map_err(|e| read_error(path, e))?;
        let text = decode_bytes(&bytes, self.csv_encoding);

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(Cursor::new(text.into_bytes()));

        Ok(RowSource::Csv(Box::new(reader.into_records())))
    }
}

fn read_error(path: &Path, cause: impl std::fmt::Display) -> FormsError {
    FormsError::ReadError {
        path: path.to_path_buf(),
        message: cause.to_string(),
    }
}

enum RowSource {
    Sheet {
        range: Range<Data>,
        next_row: u32,
        last_row: Option<u32>,
    },
    Csv(Box<csv::StringRecordsIntoIter<Cursor<Vec<u8>>>>),
}

/// Lazily maps spreadsheet rows to records. Consumed once.
pub struct Records {
    path: PathBuf,
    rows: RowSource,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.rows {
            RowSource::Sheet {
                range,
                next_row,
                last_row,
            } => {
                let row = *next_row;
                if row > (*last_row)? {
                    return None;
                }
                *next_row += 1;

                let cells = (0..RECORD_COLUMNS as u32)
                    .map(|col| range.get_value((row, col)).and_then(cell_text));
                Some(Ok(Record::from_cells(cells)))
            }
            RowSource::Csv(records) => {
                let result = records.next()?;
                Some(
                    result
                        .map(|row| {
                            Record::from_cells((0..RECORD_COLUMNS).map(|col| {
                                row.get(col)
                                    .filter(|value| !value.is_empty())
                                    .map(str::to_string)
                            }))
                        })
                        .map_err(|e| read_error(&self.path, e)),
                )
            }
        }
    }
}

/// Renders a cell the way the operator sees it. Empty and error cells are absent.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(value) => Some(value.clone()),
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) => Some(format_number(*value)),
        Data::Bool(true) => Some("True".to_string()),
        Data::Bool(false) => Some("False".to_string()),
        Data::DateTime(value) => Some(
            value
                .as_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| format_number(value.as_f64())),
        ),
        Data::DateTimeIso(value) | Data::DurationIso(value) => Some(value.clone()),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
