//! Byte-to-text decoding for 30917 files.
//!
//! Files arrive either as UTF-8 or in the legacy Windows-1251 code page. The
//! decoder never fails: bytes that cannot be mapped are dropped.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1251;
use tracing::debug;

const UNASSIGNED_1251: char = '\u{98}';

/// Which encoding produced the decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1251,
}

/// Decode `bytes` as UTF-8, falling back to Windows-1251.
pub fn decode(bytes: &[u8]) -> (Cow<'_, str>, SourceEncoding) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), SourceEncoding::Utf8);
    }

    // 0x98 is unassigned in code page 1251; the WHATWG table maps it to the
    // C1 control U+0098 instead of reporting an error.
    let (text, had_errors) = WINDOWS_1251.decode_without_bom_handling(bytes);
    if had_errors || text.contains(UNASSIGNED_1251) {
        debug!("dropping unmappable bytes during Windows-1251 fallback");
        let cleaned: String = text
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER && c != UNASSIGNED_1251)
            .collect();
        return (Cow::Owned(cleaned), SourceEncoding::Windows1251);
    }
    (text, SourceEncoding::Windows1251)
}

/// Split decoded text into lines.
///
/// Breaks on `\n`, `\r\n`, lone `\r` and the other Unicode line separators
/// (VT, FF, FS, GS, RS, NEL, U+2028, U+2029). A trailing break does not
/// produce a trailing empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
