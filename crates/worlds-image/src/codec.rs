//! Primitive encode/decode helpers for the memory image.
//!
//! All integers are little-endian `u32`. Strings map one character to one
//! byte (U+0000..=U+00FF); there is no length prefix and no terminator,
//! since record headers carry every field boundary.

use worlds_core::{CompileError, RecordKind};

/// Width of one header slot or reference word, in bytes.
pub const WORD: u32 = 4;

/// Byte position of header slot `i` relative to a record's start.
pub const fn slot(i: u32) -> u32 {
    i * WORD
}

// ── Writers ─────────────────────────────────────────────────────

/// Append a little-endian u32.
pub fn put_u32_le(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Overwrite four bytes at `pos` with a little-endian u32.
///
/// Returns `None` if `pos..pos + 4` is out of bounds.
pub fn write_u32_at(buf: &mut [u8], pos: usize, v: u32) -> Option<()> {
    let dst = buf.get_mut(pos..pos.checked_add(4)?)?;
    dst.copy_from_slice(&v.to_le_bytes());
    Some(())
}

// ── Readers ─────────────────────────────────────────────────────

/// Read a little-endian u32 at `pos`.
///
/// Returns `None` if `pos..pos + 4` is out of bounds.
pub fn read_u32_at(buf: &[u8], pos: usize) -> Option<u32> {
    let src = buf.get(pos..pos.checked_add(4)?)?;
    let mut word = [0u8; 4];
    word.copy_from_slice(src);
    Some(u32::from_le_bytes(word))
}

// ── Strings ─────────────────────────────────────────────────────

/// Encode a string field, one byte per character.
///
/// `record`, `name`, and `field` only feed the error if a character falls
/// outside the single-byte range.
pub fn encode_str(
    s: &str,
    record: RecordKind,
    name: &str,
    field: &'static str,
) -> Result<Vec<u8>, CompileError> {
    s.chars()
        .map(|ch| {
            u8::try_from(ch as u32).map_err(|_| CompileError::UnencodableString {
                record,
                name: name.to_string(),
                field,
                ch,
            })
        })
        .collect()
}

/// Decode bytes produced by [`encode_str`].
pub fn decode_str(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
