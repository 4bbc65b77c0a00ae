//! Index of the interactive form fields in a PDF document.

use crate::core::appearance::decode_text_string;
use crate::utils::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Field flag: text field spans several lines.
pub const FLAG_MULTILINE: i64 = 1 << 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"Tx" => FieldKind::Text,
            b"Btn" => FieldKind::Button,
            b"Ch" => FieldKind::Choice,
            b"Sig" => FieldKind::Signature,
            _ => FieldKind::Unknown,
        }
    }
}

/// A terminal field and the widget annotations that display it.
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: ObjectId,
    pub name: String,
    pub kind: FieldKind,
    pub flags: i64,
    /// Default appearance, inherited from ancestors or the form when absent.
    pub default_appearance: Option<String>,
    pub quadding: i64,
    pub widgets: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct AcroForm {
    fields: Vec<FormField>,
}

#[derive(Clone)]
struct Inherited {
    name: Option<String>,
    kind: Option<FieldKind>,
    flags: i64,
    default_appearance: Option<String>,
    quadding: i64,
}

impl AcroForm {
    /// Reads the field tree. A document without a form yields an empty index.
    pub fn load(doc: &Document) -> Result<Self, PdfError> {
        let Some(form) = acroform_dict(doc)? else {
            return Ok(Self::default());
        };

        let root = Inherited {
            name: None,
            kind: None,
            flags: 0,
            default_appearance: string_entry(form, b"DA"),
            quadding: integer_entry(form, b"Q").unwrap_or(0),
        };

        let mut fields = Vec::new();
        let mut visited = HashSet::new();
        if let Ok(entries) = form.get(b"Fields") {
            for entry in resolve(doc, entries)?.as_array()? {
                if let Object::Reference(id) = entry {
                    visit(doc, *id, &root, &mut fields, &mut visited)?;
                }
            }
        }

        Ok(Self { fields })
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn widget_ids(&self) -> HashSet<ObjectId> {
        self.fields
            .iter()
            .flat_map(|f| f.widgets.iter().copied())
            .collect()
    }
}

fn visit(
    doc: &Document,
    id: ObjectId,
    parent: &Inherited,
    out: &mut Vec<FormField>,
    visited: &mut HashSet<ObjectId>,
) -> Result<(), PdfError> {
    if !visited.insert(id) {
        return Err(PdfError::Malformed(format!(
            "field tree revisits object {} {}",
            id.0, id.1
        )));
    }

    let dict = doc.get_object(id)?.as_dict()?;
    let partial = string_entry(dict, b"T");
    let name = match (&parent.name, partial) {
        (Some(prefix), Some(partial)) => Some(format!("{}.{}", prefix, partial)),
        (None, Some(partial)) => Some(partial),
        (prefix, None) => prefix.clone(),
    };

    let current = Inherited {
        name,
        kind: match dict.get(b"FT") {
            Ok(Object::Name(ft)) => Some(FieldKind::from_name(ft)),
            _ => parent.kind,
        },
        flags: integer_entry(dict, b"Ff").unwrap_or(parent.flags),
        default_appearance: string_entry(dict, b"DA").or_else(|| parent.default_appearance.clone()),
        quadding: integer_entry(dict, b"Q").unwrap_or(parent.quadding),
    };

    let mut child_fields = Vec::new();
    let mut widgets = Vec::new();
    if let Ok(kids) = dict.get(b"Kids") {
        for kid in resolve(doc, kids)?.as_array()? {
            let Object::Reference(kid_id) = kid else {
                continue;
            };
            if doc.get_object(*kid_id)?.as_dict()?.has(b"T") {
                child_fields.push(*kid_id);
            } else {
                widgets.push(*kid_id);
            }
        }
    }

    for kid_id in child_fields {
        visit(doc, kid_id, &current, out, visited)?;
    }

    if is_widget(dict) {
        widgets.insert(0, id);
    }

    // Nodes that only group other fields carry no value of their own.
    if !widgets.is_empty() || !dict.has(b"Kids") {
        if let Some(name) = current.name {
            out.push(FormField {
                id,
                name,
                kind: current.kind.unwrap_or(FieldKind::Unknown),
                flags: current.flags,
                default_appearance: current.default_appearance,
                quadding: current.quadding,
                widgets,
            });
        }
    }

    Ok(())
}

pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId, PdfError> {
    Ok(doc.trailer.get(b"Root")?.as_reference()?)
}

fn acroform_dict(doc: &Document) -> Result<Option<&Dictionary>, PdfError> {
    let catalog = doc.get_object(catalog_id(doc)?)?.as_dict()?;
    match catalog.get(b"AcroForm") {
        Ok(form) => Ok(Some(resolve(doc, form)?.as_dict()?)),
        Err(_) => Ok(None),
    }
}

/// Follows one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, PdfError> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

pub(crate) fn is_widget(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name.as_slice() == b"Widget")
}

pub(crate) fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

pub(crate) fn integer_entry(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key) {
        Ok(Object::Integer(value)) => Some(*value),
        _ => None,
    }
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Normalized annotation rectangle or bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    pub fn from_object(object: &Object) -> Option<Self> {
        let Object::Array(items) = object else {
            return None;
        };
        if items.len() != 4 {
            return None;
        }
        let v: Vec<f32> = items.iter().map(number).collect::<Option<_>>()?;
        Some(Self {
            x1: v[0].min(v[2]),
            y1: v[1].min(v[3]),
            x2: v[0].max(v[2]),
            y2: v[1].max(v[3]),
        })
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

pub(crate) fn widget_rect(widget: &Dictionary) -> Result<Rect, PdfError> {
    widget
        .get(b"Rect")
        .ok()
        .and_then(Rect::from_object)
        .ok_or_else(|| PdfError::Malformed("widget annotation without a valid /Rect".to_string()))
}

pub(crate) fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, PdfError> {
    Ok(doc.get_object_mut(id)?.as_dict_mut()?)
}

/// The current value of a field, decoded as text. Names are returned verbatim.
pub fn field_value(doc: &Document, field: &FormField) -> Option<String> {
    let dict = doc.get_object(field.id).ok()?.as_dict().ok()?;
    match dict.get(b"V").ok()? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::appearance::encode_text_string;
    use lopdf::dictionary;

    fn document_with_fields(build: impl FnOnce(&mut Document) -> Vec<Object>) -> Document {
        let mut doc = Document::with_version("1.5");
        let fields = build(&mut doc);
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "AcroForm" => dictionary! { "Fields" => fields, "DA" => Object::string_literal("/Helv 0 Tf 0 g") },
        });
        doc.trailer.set("Root", catalog);
        doc
    }

    #[test]
    fn test_document_without_form_is_empty() {
        let mut doc = Document::with_version("1.5");
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Root", catalog);

        let form = AcroForm::load(&doc).unwrap();
        assert!(form.fields().is_empty());
    }

    #[test]
    fn test_merged_widget_field_with_unicode_name() {
        let doc = document_with_fields(|doc| {
            let id = doc.add_object(dictionary! {
                "Subtype" => "Widget",
                "FT" => "Tx",
                "T" => encode_text_string("ilość faktur"),
                "Rect" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(100), Object::Integer(20)],
            });
            vec![id.into()]
        });

        let form = AcroForm::load(&doc).unwrap();
        let field = form.field("ilość faktur").unwrap();
        assert_eq!(field.kind, FieldKind::Text);
        assert_eq!(field.widgets, vec![field.id]);
        assert_eq!(field.default_appearance.as_deref(), Some("/Helv 0 Tf 0 g"));
    }

    #[test]
    fn test_radio_group_collects_widget_kids_and_nested_names() {
        let doc = document_with_fields(|doc| {
            let group_id = doc.new_object_id();
            let w1 = doc.add_object(dictionary! { "Subtype" => "Widget", "Parent" => group_id });
            let w2 = doc.add_object(dictionary! { "Subtype" => "Widget", "Parent" => group_id });
            doc.objects.insert(
                group_id,
                Object::Dictionary(dictionary! {
                    "FT" => "Btn",
                    "Ff" => 49152,
                    "T" => Object::string_literal("Group1"),
                    "Kids" => vec![Object::Reference(w1), Object::Reference(w2)],
                }),
            );

            let parent_id = doc.new_object_id();
            let child = doc.add_object(dictionary! {
                "Subtype" => "Widget",
                "T" => Object::string_literal("city"),
                "Parent" => parent_id,
            });
            doc.objects.insert(
                parent_id,
                Object::Dictionary(dictionary! {
                    "FT" => "Tx",
                    "T" => Object::string_literal("address"),
                    "Kids" => vec![Object::Reference(child)],
                }),
            );
            vec![group_id.into(), parent_id.into()]
        });

        let form = AcroForm::load(&doc).unwrap();
        let group = form.field("Group1").unwrap();
        assert_eq!(group.kind, FieldKind::Button);
        assert_eq!(group.widgets.len(), 2);

        let nested = form.field("address.city").unwrap();
        assert_eq!(nested.kind, FieldKind::Text);
        assert!(form.field("address").is_none());
        assert_eq!(form.widget_ids().len(), 3);
    }
}
