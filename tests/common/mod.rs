#![allow(dead_code)]

use anyhow::Result;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use rust_xlsxwriter::Workbook;
use shipping_forms::core::appearance::encode_text_string;
use shipping_forms::core::selections::DEFAULT_GROUP_SELECTIONS;
use shipping_forms::RecordField;
use std::path::{Path, PathBuf};

pub const TEXT_FIELDS: [&str; 7] = [
    "tracking number",
    "numery faktur",
    "opis towaru",
    "ilość faktur",
    "imię i nazwisko wysyłającego",
    "dane kontaktowe",
    "waluta2",
];

/// Fields and radio groups a generated template carries.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    pub text_fields: Vec<String>,
    pub groups: Vec<(String, Vec<String>)>,
}

impl TemplateLayout {
    /// Every text field, and each group offering its configured option plus one decoy.
    pub fn complete() -> Self {
        Self {
            text_fields: TEXT_FIELDS.iter().map(|s| s.to_string()).collect(),
            groups: DEFAULT_GROUP_SELECTIONS
                .iter()
                .map(|(group, option)| {
                    (
                        group.to_string(),
                        vec!["Wybór1".to_string(), option.to_string()],
                    )
                })
                .collect(),
        }
    }

    pub fn without_group(mut self, name: &str) -> Self {
        self.groups.retain(|(group, _)| group != name);
        self
    }

    pub fn without_text_field(mut self, name: &str) -> Self {
        self.text_fields.retain(|field| field != name);
        self
    }

    pub fn widget_count(&self) -> usize {
        self.text_fields.len() + self.groups.iter().map(|(_, o)| o.len()).sum::<usize>()
    }
}

fn rect(x1: i64, y1: i64, x2: i64, y2: i64) -> Object {
    Object::Array(vec![
        Object::Integer(x1),
        Object::Integer(y1),
        Object::Integer(x2),
        Object::Integer(y2),
    ])
}

fn check_box_stream(content: &[u8]) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => rect(0, 0, 12, 12),
        },
        content.to_vec(),
    )
}

pub fn build_template(layout: &TemplateLayout) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        b"BT /Helv 14 Tf 50 800 Td (Shipping form) Tj ET".to_vec(),
    ));

    let mut annots: Vec<Object> = Vec::new();
    let mut fields: Vec<Object> = Vec::new();

    let mut y = 760;
    for name in &layout.text_fields {
        let id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => encode_text_string(name),
            "Rect" => rect(50, y, 300, y + 18),
            "P" => Object::Reference(page_id),
        });
        annots.push(Object::Reference(id));
        fields.push(Object::Reference(id));
        y -= 24;
    }

    for (group, options) in &layout.groups {
        let group_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        let mut x = 50;
        for option in options {
            let on = doc.add_object(check_box_stream(b"0 g 2 2 8 8 re f"));
            let off = doc.add_object(check_box_stream(b""));
            let mut states = Dictionary::new();
            states.set(option.as_bytes().to_vec(), Object::Reference(on));
            states.set("Off", Object::Reference(off));

            let widget: ObjectId = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "Parent" => Object::Reference(group_id),
                "Rect" => rect(x, y, x + 12, y + 12),
                "AS" => "Off",
                "AP" => dictionary! { "N" => states },
                "P" => Object::Reference(page_id),
            });
            kids.push(Object::Reference(widget));
            annots.push(Object::Reference(widget));
            x += 40;
        }
        doc.objects.insert(
            group_id,
            Object::Dictionary(dictionary! {
                "FT" => "Btn",
                "Ff" => Object::Integer(49152),
                "T" => Object::string_literal(group.as_str()),
                "Kids" => kids,
            }),
        );
        fields.push(Object::Reference(group_id));
        y -= 24;
    }

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => rect(0, 0, 595, 842),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "Helv" => Object::Reference(font_id) },
            },
            "Annots" => annots,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );

    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => dictionary! {
            "Fields" => fields,
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "DR" => dictionary! {
                "Font" => dictionary! { "Helv" => Object::Reference(font_id) },
            },
        },
    });
    doc.trailer.set("Root", Object::Reference(catalog));
    doc
}

pub fn write_template(path: &Path, layout: &TemplateLayout) -> Result<PathBuf> {
    let mut doc = build_template(layout);
    doc.save(path)?;
    Ok(path.to_path_buf())
}

/// One shipment row; numeric strings are written as numbers, the way
/// spreadsheet users enter them.
pub fn shipment(external_number: &str, recipient: &str) -> Vec<String> {
    vec![
        external_number.to_string(),
        format!("FV/{}", external_number),
        "books".to_string(),
        "Jan Kowalski".to_string(),
        "jan@example.pl".to_string(),
        "600100200".to_string(),
        "10".to_string(),
        "EUR".to_string(),
        recipient.to_string(),
    ]
}

pub fn write_xlsx(path: &Path, rows: &[Vec<String>]) -> Result<PathBuf> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, field) in RecordField::ALL.iter().enumerate() {
        worksheet.write_string(0, col as u16, field.header())?;
    }
    for (index, row) in rows.iter().enumerate() {
        let row_number = index as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(number) => worksheet.write_number(row_number, col as u16, number)?,
                Err(_) => worksheet.write_string(row_number, col as u16, value)?,
            };
        }
    }

    workbook.save(path)?;
    Ok(path.to_path_buf())
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// True if some stream of the document contains `needle`.
pub fn any_stream_contains(doc: &Document, needle: &[u8]) -> bool {
    doc.objects.values().any(|object| match object {
        Object::Stream(stream) => contains_bytes(&stream.content, needle),
        _ => false,
    })
}

/// Asserts the PDF at `path` has no interactive form left.
pub fn assert_flattened(path: &Path) -> Result<Document> {
    let doc = Document::load(path)?;

    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_object(catalog_id)?.as_dict()?;
    assert!(
        !catalog.has(b"AcroForm"),
        "{} still has an AcroForm",
        path.display()
    );

    for page_id in doc.get_pages().into_values() {
        let page = doc.get_object(page_id)?.as_dict()?;
        if let Ok(Object::Array(annots)) = page.get(b"Annots") {
            for annot in annots {
                let dict = match annot {
                    Object::Reference(id) => doc.get_object(*id)?.as_dict()?,
                    Object::Dictionary(dict) => dict,
                    _ => continue,
                };
                assert!(
                    !matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name.as_slice() == b"Widget"),
                    "{} still has widget annotations",
                    path.display()
                );
            }
        }
    }

    Ok(doc)
}

pub fn output_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
