use crate::core::acroform::{
    dict_mut, integer_entry, resolve, string_entry, widget_rect, AcroForm, FieldKind, FormField,
    FLAG_MULTILINE,
};
use crate::core::appearance::{
    appearance_font, decode_text_string, encode_text_string, text_appearance, DefaultAppearance,
    TextLayout,
};
use crate::core::flatten::flatten_form;
use crate::core::selections::{text_field_values, FormSelections};
use crate::domain::model::Record;
use crate::domain::ports::DocumentFiller;
use crate::utils::error::{FormsError, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Fills the shipping template from one record and flattens the result.
#[derive(Debug, Clone, Default)]
pub struct PdfFormFiller {
    selections: FormSelections,
}

impl PdfFormFiller {
    pub fn new(selections: FormSelections) -> Self {
        Self { selections }
    }

    pub fn selections(&self) -> &FormSelections {
        &self.selections
    }

    /// Fills, then flattens, a loaded template in memory.
    pub fn fill_document(&self, doc: &mut Document, record: &Record) -> std::result::Result<(), PdfError> {
        let form = AcroForm::load(doc)?;
        tracing::trace!("Template fields: {}", form.names().collect::<Vec<_>>().join(", "));
        self.apply_values(doc, &form, record)?;
        let drawn = flatten_form(doc, &form)?;
        tracing::debug!("Flattened {} widget appearances", drawn);
        Ok(())
    }

    /// Runs both fill passes without flattening.
    pub fn apply_values(
        &self,
        doc: &mut Document,
        form: &AcroForm,
        record: &Record,
    ) -> std::result::Result<(), PdfError> {
        let mut writer = FieldWriter::default();
        let filled = self.fill_best_effort(doc, form, &mut writer, record)?;
        tracing::debug!("Filled {} text fields for {}", filled, record.external_number());
        self.fill_required(doc, form, &mut writer)
    }

    /// Fields the template lacks are skipped.
    fn fill_best_effort(
        &self,
        doc: &mut Document,
        form: &AcroForm,
        writer: &mut FieldWriter,
        record: &Record,
    ) -> std::result::Result<usize, PdfError> {
        let mut filled = 0;
        for (name, value) in text_field_values(record) {
            match form.field(name) {
                Some(field) => {
                    writer.set_value(doc, field, &value)?;
                    filled += 1;
                }
                None => tracing::debug!("Template has no field '{}', skipping", name),
            }
        }
        Ok(filled)
    }

    /// Every selection must find its field.
    fn fill_required(
        &self,
        doc: &mut Document,
        form: &AcroForm,
        writer: &mut FieldWriter,
    ) -> std::result::Result<(), PdfError> {
        for (name, option) in self.selections.iter() {
            let field = form
                .field(name)
                .ok_or_else(|| PdfError::MissingField(name.to_string()))?;
            writer.set_value(doc, field, option)?;
        }
        Ok(())
    }

    fn fill_file(
        &self,
        template: &Path,
        output: &Path,
        record: &Record,
    ) -> std::result::Result<(), PdfError> {
        let mut doc = Document::load(template)?;
        self.fill_document(&mut doc, record)?;
        doc.save(output)?;
        Ok(())
    }
}

impl DocumentFiller for PdfFormFiller {
    fn fill(&self, template: &Path, output: &Path, record: &Record) -> Result<()> {
        self.fill_file(template, output, record)
            .map_err(|source| FormsError::FillError {
                path: output.to_path_buf(),
                source,
            })
    }
}

/// Writes values into fields, creating the appearance font on first use.
#[derive(Default)]
struct FieldWriter {
    font_id: Option<ObjectId>,
}

impl FieldWriter {
    fn set_value(
        &mut self,
        doc: &mut Document,
        field: &FormField,
        value: &str,
    ) -> std::result::Result<(), PdfError> {
        match field.kind {
            FieldKind::Button => set_button_state(doc, field, value),
            _ => self.set_text(doc, field, value),
        }
    }

    fn set_text(
        &mut self,
        doc: &mut Document,
        field: &FormField,
        value: &str,
    ) -> std::result::Result<(), PdfError> {
        dict_mut(doc, field.id)?.set("V", encode_text_string(value));

        let field_appearance =
            DefaultAppearance::parse(field.default_appearance.as_deref().unwrap_or(""));
        let font_id = *self
            .font_id
            .get_or_insert_with(|| doc.add_object(appearance_font()));

        for widget_id in &field.widgets {
            let layout = {
                let widget = doc.get_object(*widget_id)?.as_dict()?;
                let rect = widget_rect(widget)?;
                TextLayout {
                    width: rect.width(),
                    height: rect.height(),
                    appearance: string_entry(widget, b"DA")
                        .map(|da| DefaultAppearance::parse(&da))
                        .unwrap_or_else(|| field_appearance.clone()),
                    quadding: integer_entry(widget, b"Q").unwrap_or(field.quadding),
                    multiline: field.flags & FLAG_MULTILINE != 0,
                }
            };

            let stream_id = doc.add_object(text_appearance(value, &layout, font_id));
            dict_mut(doc, *widget_id)?.set("AP", dictionary! { "N" => stream_id });
        }
        Ok(())
    }
}

/// Turns the widgets offering `option` on and every other widget off.
fn set_button_state(
    doc: &mut Document,
    field: &FormField,
    option: &str,
) -> std::result::Result<(), PdfError> {
    let mut chosen: Option<Vec<u8>> = None;

    for widget_id in &field.widgets {
        let state = {
            let widget = doc.get_object(*widget_id)?.as_dict()?;
            appearance_states(doc, widget)?
                .into_iter()
                .find(|state| state_matches(state, option))
        };

        let widget = dict_mut(doc, *widget_id)?;
        match state {
            Some(state) => {
                widget.set("AS", Object::Name(state.clone()));
                chosen.get_or_insert(state);
            }
            None => widget.set("AS", "Off"),
        }
    }

    if chosen.is_none() {
        tracing::warn!(
            "Field '{}' offers no option '{}'; value set without a visible selection",
            field.name,
            option
        );
    }

    let value = chosen.unwrap_or_else(|| option.as_bytes().to_vec());
    dict_mut(doc, field.id)?.set("V", Object::Name(value));
    Ok(())
}

/// Names of the normal appearance states of a widget, `/Off` excluded.
fn appearance_states(
    doc: &Document,
    widget: &Dictionary,
) -> std::result::Result<Vec<Vec<u8>>, PdfError> {
    let Ok(ap) = widget.get(b"AP") else {
        return Ok(Vec::new());
    };
    let Ok(normal) = resolve(doc, ap)?.as_dict()?.get(b"N") else {
        return Ok(Vec::new());
    };

    match resolve(doc, normal)? {
        Object::Dictionary(states) => Ok(states
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| name.as_slice() != b"Off")
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Appearance state names may be stored as UTF-8 or as single-byte text.
fn state_matches(state: &[u8], option: &str) -> bool {
    if state == option.as_bytes() {
        return true;
    }
    let latin1: Option<Vec<u8>> = option
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();
    latin1.as_deref() == Some(state) || decode_text_string(state) == option
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_matching_accepts_both_byte_forms() {
        assert!(state_matches("Wybór2".as_bytes(), "Wybór2"));
        assert!(state_matches(&[b'W', b'y', b'b', 0xF3, b'r', b'2'], "Wybór2"));
        assert!(!state_matches(b"Wybor2", "Wybór2"));
        assert!(!state_matches("Wybór20".as_bytes(), "Wybór2"));
    }

    #[test]
    fn test_missing_group_fails_required_pass() {
        let mut doc = Document::with_version("1.5");
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "AcroForm" => dictionary! { "Fields" => Vec::<Object>::new() },
        });
        doc.trailer.set("Root", catalog);

        let form = AcroForm::load(&doc).unwrap();
        let err = PdfFormFiller::default()
            .apply_values(&mut doc, &form, &Record::default())
            .unwrap_err();

        assert!(matches!(err, PdfError::MissingField(ref name) if name == "Group1"));
    }

    #[test]
    fn test_fill_wraps_errors_with_operation() {
        let dir = tempfile::TempDir::new().unwrap();
        let template = dir.path().join("Template.pdf");
        std::fs::write(&template, b"not a pdf").unwrap();

        let err = PdfFormFiller::default()
            .fill(&template, &dir.path().join("out.pdf"), &Record::default())
            .unwrap_err();

        assert!(matches!(err, FormsError::FillError { .. }));
        assert!(err.to_string().starts_with("error while filling PDF"));
    }
}
