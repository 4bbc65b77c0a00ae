//! Text encodings for delimited input.
//!
//! Binary workbooks carry their own code page; plain CSV files do not, so the
//! operator names one up front (`windows-1250`, `cp1250` or just `1250`) and it
//! is resolved once before any file is opened.

use crate::utils::error::{FormsError, Result};
use encoding_rs::Encoding;

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();
    let numeric = trimmed
        .trim_start_matches("cp")
        .trim_start_matches("CP")
        .parse::<u16>()
        .ok();

    let encoding = match numeric {
        Some(code_page) => codepage::to_encoding(code_page),
        None => Encoding::for_label(trimmed.as_bytes()),
    };

    encoding.ok_or_else(|| FormsError::InvalidConfigValueError {
        field: "encoding".to_string(),
        value: label.to_string(),
        reason: "Unknown encoding label or code page".to_string(),
    })
}

/// Decodes raw bytes, letting a byte order mark override the configured encoding.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(
            "Input contained bytes not valid in {}; replaced with U+FFFD",
            actual.name()
        );
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_labels_and_code_pages() {
        assert_eq!(resolve_encoding("windows-1250").unwrap(), encoding_rs::WINDOWS_1250);
        assert_eq!(resolve_encoding("1250").unwrap(), encoding_rs::WINDOWS_1250);
        assert_eq!(resolve_encoding("cp1252").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(resolve_encoding("utf-8").unwrap(), encoding_rs::UTF_8);
        assert!(resolve_encoding("klingon").is_err());
    }

    #[test]
    fn test_decode_legacy_polish() {
        // "Łódź" in windows-1250
        let bytes = [0xA3, 0xF3, 0x64, 0x9F];
        assert_eq!(decode_bytes(&bytes, encoding_rs::WINDOWS_1250), "Łódź");
    }

    #[test]
    fn test_bom_wins_over_configured_encoding() {
        let bytes = [0xEF, 0xBB, 0xBF, b'a', 0xC5, 0x82];
        assert_eq!(decode_bytes(&bytes, encoding_rs::WINDOWS_1250), "ał");
    }
}
