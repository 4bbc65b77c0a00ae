//! Text strings and generated appearance streams for form widgets.

use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};

const DEFAULT_FONT: &str = "Helv";
const AUTO_FONT_SIZE: f32 = 10.0;
const MIN_FONT_SIZE: f32 = 4.0;
const PADDING: f32 = 2.0;
/// Rough Helvetica advance width, in em.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Glyphs of Windows-1250 above 0x7F, used as a font `/Differences` array so
/// Central European text renders with the standard Helvetica font.
const CP1250_GLYPHS: &[(u8, &str)] = &[
    (0x80, "Euro"), (0x82, "quotesinglbase"), (0x84, "quotedblbase"), (0x85, "ellipsis"),
    (0x86, "dagger"), (0x87, "daggerdbl"), (0x89, "perthousand"), (0x8A, "Scaron"),
    (0x8B, "guilsinglleft"), (0x8C, "Sacute"), (0x8D, "Tcaron"), (0x8E, "Zcaron"),
    (0x8F, "Zacute"), (0x91, "quoteleft"), (0x92, "quoteright"), (0x93, "quotedblleft"),
    (0x94, "quotedblright"), (0x95, "bullet"), (0x96, "endash"), (0x97, "emdash"),
    (0x99, "trademark"), (0x9A, "scaron"), (0x9B, "guilsinglright"), (0x9C, "sacute"),
    (0x9D, "tcaron"), (0x9E, "zcaron"), (0x9F, "zacute"), (0xA0, "space"),
    (0xA1, "caron"), (0xA2, "breve"), (0xA3, "Lslash"), (0xA4, "currency"),
    (0xA5, "Aogonek"), (0xA6, "brokenbar"), (0xA7, "section"), (0xA8, "dieresis"),
    (0xA9, "copyright"), (0xAA, "Scedilla"), (0xAB, "guillemotleft"), (0xAC, "logicalnot"),
    (0xAD, "hyphen"), (0xAE, "registered"), (0xAF, "Zdotaccent"), (0xB0, "degree"),
    (0xB1, "plusminus"), (0xB2, "ogonek"), (0xB3, "lslash"), (0xB4, "acute"),
    (0xB5, "mu"), (0xB6, "paragraph"), (0xB7, "periodcentered"), (0xB8, "cedilla"),
    (0xB9, "aogonek"), (0xBA, "scedilla"), (0xBB, "guillemotright"), (0xBC, "Lcaron"),
    (0xBD, "hungarumlaut"), (0xBE, "lcaron"), (0xBF, "zdotaccent"), (0xC0, "Racute"),
    (0xC1, "Aacute"), (0xC2, "Acircumflex"), (0xC3, "Abreve"), (0xC4, "Adieresis"),
    (0xC5, "Lacute"), (0xC6, "Cacute"), (0xC7, "Ccedilla"), (0xC8, "Ccaron"),
    (0xC9, "Eacute"), (0xCA, "Eogonek"), (0xCB, "Edieresis"), (0xCC, "Ecaron"),
    (0xCD, "Iacute"), (0xCE, "Icircumflex"), (0xCF, "Dcaron"), (0xD0, "Dcroat"),
    (0xD1, "Nacute"), (0xD2, "Ncaron"), (0xD3, "Oacute"), (0xD4, "Ocircumflex"),
    (0xD5, "Ohungarumlaut"), (0xD6, "Odieresis"), (0xD7, "multiply"), (0xD8, "Rcaron"),
    (0xD9, "Uring"), (0xDA, "Uacute"), (0xDB, "Uhungarumlaut"), (0xDC, "Udieresis"),
    (0xDD, "Yacute"), (0xDE, "Tcommaaccent"), (0xDF, "germandbls"), (0xE0, "racute"),
    (0xE1, "aacute"), (0xE2, "acircumflex"), (0xE3, "abreve"), (0xE4, "adieresis"),
    (0xE5, "lacute"), (0xE6, "cacute"), (0xE7, "ccedilla"), (0xE8, "ccaron"),
    (0xE9, "eacute"), (0xEA, "eogonek"), (0xEB, "edieresis"), (0xEC, "ecaron"),
    (0xED, "iacute"), (0xEE, "icircumflex"), (0xEF, "dcaron"), (0xF0, "dcroat"),
    (0xF1, "nacute"), (0xF2, "ncaron"), (0xF3, "oacute"), (0xF4, "ocircumflex"),
    (0xF5, "ohungarumlaut"), (0xF6, "odieresis"), (0xF7, "divide"), (0xF8, "rcaron"),
    (0xF9, "uring"), (0xFA, "uacute"), (0xFB, "uhungarumlaut"), (0xFC, "udieresis"),
    (0xFD, "yacute"), (0xFE, "tcommaaccent"), (0xFF, "dotaccent"),
];

/// Decodes a PDF text string: UTF-16BE or UTF-8 when marked by a BOM,
/// otherwise single-byte.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encodes a PDF text string, using UTF-16BE only when the text is not ASCII.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Single-byte Windows-1250 bytes for a content stream; unmappable characters
/// become `?`.
pub fn encode_cp1250(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1250.encode(ch.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.push(bytes[0]);
        }
    }
    out
}

/// Helvetica with a Windows-1250 encoding, shared by all generated appearances.
pub fn appearance_font() -> Dictionary {
    let mut differences = Vec::with_capacity(CP1250_GLYPHS.len() * 2);
    for (code, glyph) in CP1250_GLYPHS {
        differences.push(Object::Integer(i64::from(*code)));
        differences.push(Object::Name(glyph.as_bytes().to_vec()));
    }

    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => dictionary! {
            "Type" => "Encoding",
            "BaseEncoding" => "WinAnsiEncoding",
            "Differences" => differences,
        },
    }
}

/// The parts of a `/DA` default appearance string that matter for drawing text.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppearance {
    pub font: String,
    pub size: f32,
    pub color: String,
}

impl Default for DefaultAppearance {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            size: 0.0,
            color: "0 g".to_string(),
        }
    }
}

impl DefaultAppearance {
    pub fn parse(da: &str) -> Self {
        let mut result = Self::default();
        let mut operands: Vec<&str> = Vec::new();

        for token in da.split_whitespace() {
            match token {
                "Tf" if operands.len() >= 2 => {
                    let n = operands.len();
                    result.font = operands[n - 2].trim_start_matches('/').to_string();
                    result.size = operands[n - 1].parse().unwrap_or(0.0);
                    operands.clear();
                }
                "g" | "rg" | "k" => {
                    let arity = match token {
                        "g" => 1,
                        "rg" => 3,
                        _ => 4,
                    };
                    if operands.len() >= arity {
                        let args = &operands[operands.len() - arity..];
                        result.color = format!("{} {}", args.join(" "), token);
                    }
                    operands.clear();
                }
                op if op.chars().all(|c| c.is_ascii_alphabetic() || c == '*') => operands.clear(),
                operand => operands.push(operand),
            }
        }

        if result.font.is_empty() {
            result.font = DEFAULT_FONT.to_string();
        }
        result
    }
}

/// Layout of one text widget.
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub width: f32,
    pub height: f32,
    pub appearance: DefaultAppearance,
    /// 0 left, 1 centered, 2 right.
    pub quadding: i64,
    pub multiline: bool,
}

impl TextLayout {
    fn font_size(&self, lines: &[&str]) -> f32 {
        if self.appearance.size > 0.0 {
            return self.appearance.size;
        }

        let mut size = if self.multiline {
            AUTO_FONT_SIZE
        } else {
            AUTO_FONT_SIZE.min((self.height - 2.0 * PADDING).max(MIN_FONT_SIZE))
        };

        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f32;
        let available = self.width - 2.0 * PADDING;
        if longest > 0.0 && longest * AVG_GLYPH_WIDTH * size > available {
            size = (available / (longest * AVG_GLYPH_WIDTH)).max(MIN_FONT_SIZE);
        }
        size
    }
}

/// Builds a normal appearance stream showing `value` inside the widget box.
pub fn text_appearance(value: &str, layout: &TextLayout, font_id: ObjectId) -> Stream {
    let lines: Vec<&str> = if layout.multiline {
        value.lines().collect()
    } else {
        vec![value]
    };
    let size = layout.font_size(&lines);
    let leading = size * 1.15;

    let mut content: Vec<u8> = Vec::new();
    content.extend_from_slice(b"/Tx BMC\nq\n");
    content.extend_from_slice(
        format!(
            "{p} {p} {w:.2} {h:.2} re W n\nBT\n/{font} {size:.2} Tf {color}\n",
            p = PADDING / 2.0,
            w = (layout.width - PADDING).max(0.0),
            h = (layout.height - PADDING).max(0.0),
            font = layout.appearance.font,
            color = layout.appearance.color,
        )
        .as_bytes(),
    );

    let first_baseline = if layout.multiline {
        layout.height - PADDING - size
    } else {
        ((layout.height - size) / 2.0 + size * 0.22).max(PADDING / 2.0)
    };

    for (index, line) in lines.iter().enumerate() {
        let text_width = line.chars().count() as f32 * AVG_GLYPH_WIDTH * size;
        let x = match layout.quadding {
            1 => ((layout.width - text_width) / 2.0).max(PADDING),
            2 => (layout.width - PADDING - text_width).max(PADDING),
            _ => PADDING,
        };
        let y = first_baseline - leading * index as f32;

        content.extend_from_slice(format!("1 0 0 1 {:.2} {:.2} Tm\n", x, y).as_bytes());
        content.push(b'(');
        content.extend_from_slice(&escape_literal(&encode_cp1250(line)));
        content.extend_from_slice(b") Tj\n");
    }
    content.extend_from_slice(b"ET\nQ\nEMC\n");

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(layout.width),
            Object::Real(layout.height),
        ],
        "Resources" => dictionary! {
            "Font" => dictionary! {
                layout.appearance.font.as_str() => font_id,
            },
        },
    };
    Stream::new(dict, content)
}

fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out
}
