use anyhow::{anyhow, Result};
use encoding_rs::{EUC_KR, WINDOWS_1252};
use std::borrow::Cow;
use std::fmt;

use super::write::UTF8_BOM;

/// Which tier of the decoding chain produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Korean legacy code page (CP949 / EUC-KR superset).
    Cp949,
    /// Last resort: single-byte Windows-1252 decoding, never fails.
    Windows1252Lossy,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::Windows1252Lossy => "windows-1252",
        };
        f.write_str(label)
    }
}

/// Decode `bytes` trying UTF-8, then CP949, then a permissive Windows-1252
/// decoding.
///
/// The last tier maps every byte, so this never fails.
pub fn decode_with_fallback(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return (Cow::Borrowed(text), TextEncoding::Utf8);
    }
    if let Some(text) = EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text, TextEncoding::Cp949);
    }
    let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text, TextEncoding::Windows1252Lossy)
}

/// Strict CP949 decoding; malformed input is an error.
pub fn decode_cp949(bytes: &[u8]) -> Result<Cow<'_, str>> {
    EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| anyhow!("input is not valid cp949 text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_with_bom_is_first_tier() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("admi_cty_no,amt\n".as_bytes());
        let (text, enc) = decode_with_fallback(&bytes);
        assert_eq!(enc, TextEncoding::Utf8);
        assert_eq!(text, "admi_cty_no,amt\n");
    }

    #[test]
    fn korean_legacy_bytes_fall_back_to_cp949() {
        let (encoded, _, unmappable) = EUC_KR.encode("수원시 장안구");
        assert!(!unmappable);
        assert!(std::str::from_utf8(&encoded).is_err());

        let (text, enc) = decode_with_fallback(&encoded);
        assert_eq!(enc, TextEncoding::Cp949);
        assert_eq!(text, "수원시 장안구");
    }

    #[test]
    fn undecodable_bytes_use_lossy_tier() {
        // 0xE9 followed by a newline is neither UTF-8 nor a valid CP949 pair
        let bytes = b"memo\ncaf\xE9\n";
        let (text, enc) = decode_with_fallback(bytes);
        assert_eq!(enc, TextEncoding::Windows1252Lossy);
        assert_eq!(text, "memo\ncafé\n");
    }

    #[test]
    fn tiers_are_labelled_by_codec() {
        let labels: Vec<String> = [
            TextEncoding::Utf8,
            TextEncoding::Cp949,
            TextEncoding::Windows1252Lossy,
        ]
        .iter()
        .map(|e| e.to_string())
        .collect();
        assert_eq!(labels, vec!["utf-8", "cp949", "windows-1252"]);
    }

    #[test]
    fn strict_cp949_rejects_garbage() {
        assert!(decode_cp949(b"ok\xFF\n").is_err());
        assert_eq!(decode_cp949(b"ADM_CD|ADM_SECT_NM").unwrap(), "ADM_CD|ADM_SECT_NM");
    }
}
