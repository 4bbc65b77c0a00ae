//! Burns widget appearances into page content and removes the interactive form.

use crate::core::acroform::{
    catalog_id, dict_mut, integer_entry, is_widget, resolve, AcroForm, Rect,
};
use crate::utils::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;

const FLAG_HIDDEN: i64 = 1 << 1;
const FLAG_NO_VIEW: i64 = 1 << 5;

struct Placement {
    stream_id: ObjectId,
    bbox: Rect,
    matrix: [f32; 6],
}

#[derive(Default)]
struct PagePlan {
    kept: Vec<Object>,
    removed: usize,
    placements: Vec<Placement>,
}

#[derive(Clone, Copy)]
enum Slot {
    Indirect(ObjectId),
    Inline,
    Missing,
}

/// Flattens every widget on every page. Returns the number of appearances drawn.
pub fn flatten_form(doc: &mut Document, form: &AcroForm) -> Result<usize, PdfError> {
    let form_widgets = form.widget_ids();
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut drawn = 0;

    for page_id in pages {
        let plan = plan_page(doc, page_id, &form_widgets)?;
        if plan.removed == 0 {
            continue;
        }

        let mut ops = Vec::new();
        let mut entries = Vec::new();
        for placement in &plan.placements {
            drawn += 1;
            let name = format!("FlatField{}", drawn);
            mark_form_xobject(doc, placement.stream_id, &placement.bbox)?;

            let [a, b, c, d, e, f] = placement.matrix;
            ops.extend_from_slice(
                format!(
                    "q {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} cm /{} Do Q\n",
                    a, b, c, d, e, f, name
                )
                .as_bytes(),
            );
            entries.push((name, placement.stream_id));
        }

        let page = dict_mut(doc, page_id)?;
        if plan.kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", plan.kept);
        }

        if !entries.is_empty() {
            register_xobjects(doc, page_id, &entries)?;
            wrap_contents(doc, page_id, ops)?;
        }
        tracing::debug!(
            "Page {:?}: removed {} widgets, drew {}",
            page_id,
            plan.removed,
            entries.len()
        );
    }

    let catalog = catalog_id(doc)?;
    dict_mut(doc, catalog)?.remove(b"AcroForm");
    doc.prune_objects();
    Ok(drawn)
}

fn plan_page(
    doc: &Document,
    page_id: ObjectId,
    form_widgets: &HashSet<ObjectId>,
) -> Result<PagePlan, PdfError> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let annots = match page.get(b"Annots") {
        Ok(annots) => resolve(doc, annots)?.as_array()?.clone(),
        Err(_) => return Ok(PagePlan::default()),
    };

    let mut plan = PagePlan::default();
    for annot in &annots {
        let (id, dict) = match annot {
            Object::Reference(id) => (Some(*id), doc.get_object(*id)?.as_dict()?),
            Object::Dictionary(dict) => (None, dict),
            _ => {
                plan.kept.push(annot.clone());
                continue;
            }
        };

        let in_form = id.map(|id| form_widgets.contains(&id)).unwrap_or(false);
        if !in_form && !is_widget(dict) {
            plan.kept.push(annot.clone());
            continue;
        }
        plan.removed += 1;

        let flags = integer_entry(dict, b"F").unwrap_or(0);
        if flags & (FLAG_HIDDEN | FLAG_NO_VIEW) != 0 {
            continue;
        }
        let Some(rect) = dict.get(b"Rect").ok().and_then(Rect::from_object) else {
            continue;
        };
        let Some(stream_id) = normal_appearance(doc, dict)? else {
            continue;
        };
        let Object::Stream(stream) = doc.get_object(stream_id)? else {
            continue;
        };

        let bbox = stream
            .dict
            .get(b"BBox")
            .ok()
            .and_then(Rect::from_object)
            .unwrap_or(Rect {
                x1: 0.0,
                y1: 0.0,
                x2: rect.width(),
                y2: rect.height(),
            });
        let matrix = placement_matrix(&bbox, form_matrix(&stream.dict), &rect);
        plan.placements.push(Placement {
            stream_id,
            bbox,
            matrix,
        });
    }

    Ok(plan)
}

/// The stream shown for the widget's current state, if any.
fn normal_appearance(doc: &Document, widget: &Dictionary) -> Result<Option<ObjectId>, PdfError> {
    let Ok(ap) = widget.get(b"AP") else {
        return Ok(None);
    };
    let Ok(normal) = resolve(doc, ap)?.as_dict()?.get(b"N") else {
        return Ok(None);
    };

    let states = match normal {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Stream(_) => return Ok(Some(*id)),
            Object::Dictionary(states) => states,
            _ => return Ok(None),
        },
        Object::Dictionary(states) => states,
        _ => return Ok(None),
    };

    let Ok(Object::Name(state)) = widget.get(b"AS") else {
        return Ok(None);
    };
    match states.get(state) {
        Ok(Object::Reference(id)) => Ok(Some(*id)),
        _ => Ok(None),
    }
}

fn form_matrix(dict: &Dictionary) -> [f32; 6] {
    let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let Ok(Object::Array(items)) = dict.get(b"Matrix") else {
        return identity;
    };
    let values: Option<Vec<f32>> = items.iter().map(crate::core::acroform::number).collect();
    match values {
        Some(v) if v.len() == 6 => [v[0], v[1], v[2], v[3], v[4], v[5]],
        _ => identity,
    }
}

/// Maps the transformed bounding box of an appearance onto the widget rectangle.
fn placement_matrix(bbox: &Rect, m: [f32; 6], rect: &Rect) -> [f32; 6] {
    let corners = [
        (bbox.x1, bbox.y1),
        (bbox.x2, bbox.y1),
        (bbox.x1, bbox.y2),
        (bbox.x2, bbox.y2),
    ];
    let transformed: Vec<(f32, f32)> = corners
        .iter()
        .map(|&(x, y)| (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5]))
        .collect();

    let min_x = transformed.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
    let max_x = transformed.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
    let min_y = transformed.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
    let max_y = transformed.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

    let sx = if max_x > min_x { rect.width() / (max_x - min_x) } else { 1.0 };
    let sy = if max_y > min_y { rect.height() / (max_y - min_y) } else { 1.0 };
    [sx, 0.0, 0.0, sy, rect.x1 - min_x * sx, rect.y1 - min_y * sy]
}

fn mark_form_xobject(doc: &mut Document, id: ObjectId, bbox: &Rect) -> Result<(), PdfError> {
    if let Object::Stream(stream) = doc.get_object_mut(id)? {
        stream.dict.set("Type", "XObject");
        stream.dict.set("Subtype", "Form");
        if !stream.dict.has(b"BBox") {
            stream.dict.set(
                "BBox",
                vec![
                    Object::Real(bbox.x1),
                    Object::Real(bbox.y1),
                    Object::Real(bbox.x2),
                    Object::Real(bbox.y2),
                ],
            );
        }
    }
    Ok(())
}

fn slot_of(dict: &Dictionary, key: &[u8]) -> Slot {
    match dict.get(key) {
        Ok(Object::Reference(id)) => Slot::Indirect(*id),
        Ok(Object::Dictionary(_)) => Slot::Inline,
        _ => Slot::Missing,
    }
}

/// Resources inherited from the page tree, copied so the page can extend them.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, PdfError> {
    let parent_of = |dict: &Dictionary| dict.get(b"Parent").ok().and_then(|p| p.as_reference().ok());

    let mut current = parent_of(doc.get_object(page_id)?.as_dict()?);
    let mut seen = HashSet::new();
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        let node = doc.get_object(id)?.as_dict()?;
        if let Ok(resources) = node.get(b"Resources") {
            return Ok(resolve(doc, resources)?.as_dict()?.clone());
        }
        current = parent_of(node);
    }
    Ok(Dictionary::new())
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    slot: Slot,
) -> Result<&mut Dictionary, PdfError> {
    match slot {
        Slot::Indirect(id) => dict_mut(doc, id),
        _ => Ok(dict_mut(doc, page_id)?
            .get_mut(b"Resources")?
            .as_dict_mut()?),
    }
}

fn register_xobjects(
    doc: &mut Document,
    page_id: ObjectId,
    entries: &[(String, ObjectId)],
) -> Result<(), PdfError> {
    let resources_slot = slot_of(doc.get_object(page_id)?.as_dict()?, b"Resources");
    if let Slot::Missing = resources_slot {
        let inherited = inherited_resources(doc, page_id)?;
        dict_mut(doc, page_id)?.set("Resources", inherited);
    }

    let xobject_slot = slot_of(resources_mut(doc, page_id, resources_slot)?, b"XObject");
    if let Slot::Missing = xobject_slot {
        resources_mut(doc, page_id, resources_slot)?.set("XObject", Dictionary::new());
    }

    let xobjects = match xobject_slot {
        Slot::Indirect(id) => dict_mut(doc, id)?,
        _ => resources_mut(doc, page_id, resources_slot)?
            .get_mut(b"XObject")?
            .as_dict_mut()?,
    };
    for (name, id) in entries {
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
    }
    Ok(())
}

/// Isolates the existing page content in `q`/`Q` and appends the drawing operators.
fn wrap_contents(doc: &mut Document, page_id: ObjectId, ops: Vec<u8>) -> Result<(), PdfError> {
    let existing: Vec<Object> = match doc.get_object(page_id)?.as_dict()?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut closing = b"Q\n".to_vec();
    closing.extend_from_slice(&ops);
    let close = doc.add_object(Stream::new(Dictionary::new(), closing));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend(existing);
    contents.push(Object::Reference(close));
    dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}
