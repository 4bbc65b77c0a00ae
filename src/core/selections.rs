use crate::domain::model::{Record, RecordField};
use std::collections::BTreeMap;

/// Choice-group selections every generated form carries, independent of the
/// record. Each group must exist in the template.
pub const DEFAULT_GROUP_SELECTIONS: [(&str, &str); 5] = [
    ("Group1", "Wybór2"),
    ("Group2", "Wybór3"),
    ("Group3", "Wybór7"),
    ("Group4", "Wybór18"),
    ("Group5", "Wybór16"),
];

/// Text fields filled from a record. Template fields that are missing are skipped.
pub fn text_field_values(record: &Record) -> Vec<(&'static str, String)> {
    vec![
        ("tracking number", record.text(RecordField::ExternalNumber).to_string()),
        ("numery faktur", record.text(RecordField::Reference).to_string()),
        ("opis towaru", record.text(RecordField::Remarks).to_string()),
        ("ilość faktur", "1".to_string()),
        (
            "imię i nazwisko wysyłającego",
            record.text(RecordField::SenderName).to_string(),
        ),
        (
            "dane kontaktowe",
            format!(
                "{} {}",
                record.text(RecordField::SenderPhone),
                record.text(RecordField::SenderEmail)
            ),
        ),
        (
            "waluta2",
            format!(
                "{} {}",
                record.text(RecordField::CustomsValue),
                record.text(RecordField::CustomsCurrency)
            ),
        ),
    ]
}

/// Ordered field-name to option mapping applied by the required fill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSelections {
    entries: Vec<(String, String)>,
}

impl Default for FormSelections {
    fn default() -> Self {
        Self {
            entries: DEFAULT_GROUP_SELECTIONS
                .iter()
                .map(|(field, option)| (field.to_string(), option.to_string()))
                .collect(),
        }
    }
}

impl FormSelections {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(field, option)| (field.as_str(), option.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for FormSelections {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}
