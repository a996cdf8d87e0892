//! Pure address arithmetic over an image buffer.
//!
//! These mirror, step for step, the loads the emitted narration code
//! performs at runtime: a field's absolute address is the record base plus
//! the relative offset stored in the field's header slot, and a reference
//! word is followed by loading it.

use worlds_core::Offset;

use crate::codec::{read_u32_at, slot};

/// Absolute address of header slot `slot_index`'s field in the record at
/// `base`: `base + mem[base + slot_index * 4]`.
///
/// Returns `None` if the header word is out of bounds or the sum overflows.
pub fn field_address(mem: &[u8], base: Offset, slot_index: u32) -> Option<Offset> {
    let hdr = base.checked_add(slot(slot_index))?;
    let rel = read_u32_at(mem, hdr.index())?;
    base.checked_add(rel)
}

/// Follow the reference word at `addr`.
///
/// Returns `None` if the word is out of bounds or still holds
/// [`Offset::UNSET`].
pub fn deref(mem: &[u8], addr: Offset) -> Option<Offset> {
    read_u32_at(mem, addr.index())
        .map(Offset)
        .filter(|o| !o.is_unset())
}
