//! Read-only, header-walking access to image bytes.
//!
//! An [`ImageView`] pairs a byte buffer with the record span table produced
//! by the layout. Field boundaries come from consecutive header offsets;
//! the last field of a record ends where the record ends. The view works on
//! any buffer with the same layout, including a copy mutated at runtime by
//! transfer stores.

use worlds_core::{Offset, RecordKind};

use crate::codec::{decode_str, read_u32_at, slot};
use crate::record::{animal, header_slots, instance, world};

/// Where one record lives in the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordSpan {
    /// Record category.
    pub kind: RecordKind,
    /// Starting offset.
    pub offset: Offset,
    /// Length in bytes.
    pub len: u32,
}

impl RecordSpan {
    /// One past the last byte of the record.
    pub fn end(&self) -> u32 {
        self.offset.get() + self.len
    }

    /// Whether `addr` falls inside this record.
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.offset.get() && addr < self.end()
    }
}

/// An animal record read back from the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedAnimal {
    /// Gene string.
    pub gene: String,
    /// Species name.
    pub name: String,
    /// Sound string.
    pub sound: String,
}

/// An instance record read back from the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstance {
    /// Instance name.
    pub name: String,
    /// Offset of the species record.
    pub species: Offset,
    /// Offset of the current world, or [`Offset::UNSET`].
    pub world: Offset,
}

/// A world record read back from the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedWorld {
    /// World name.
    pub name: String,
    /// Offsets of the contained instances.
    pub contains: Vec<Offset>,
}

/// Borrowed view over image bytes plus their record spans.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    bytes: &'a [u8],
    spans: &'a [RecordSpan],
}

impl<'a> ImageView<'a> {
    /// View `bytes` laid out according to `spans` (sorted by offset).
    pub fn new(bytes: &'a [u8], spans: &'a [RecordSpan]) -> Self {
        Self { bytes, spans }
    }

    /// The underlying bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Read the little-endian word at `addr`.
    pub fn word(&self, addr: Offset) -> Option<u32> {
        read_u32_at(self.bytes, addr.index())
    }

    /// The record starting exactly at `offset`.
    pub fn span_at(&self, offset: Offset) -> Option<RecordSpan> {
        self.spans
            .binary_search_by_key(&offset, |s| s.offset)
            .ok()
            .map(|i| self.spans[i])
    }

    /// The record containing `addr`.
    pub fn span_containing(&self, addr: Offset) -> Option<RecordSpan> {
        let i = self
            .spans
            .partition_point(|s| s.offset <= addr)
            .checked_sub(1)?;
        let span = self.spans[i];
        span.contains(addr.get()).then_some(span)
    }

    /// Bytes of header slot `slot_index` of the record at `base`.
    ///
    /// The field runs from its own header offset to the next slot's offset,
    /// or to the end of the record for the last slot.
    pub fn field(&self, base: Offset, slot_index: u32) -> Option<&'a [u8]> {
        let span = self.span_at(base)?;
        let slots = header_slots(span.kind);
        if slot_index >= slots {
            return None;
        }
        let start = self.word(base.checked_add(slot(slot_index))?)?;
        let end = if slot_index + 1 < slots {
            self.word(base.checked_add(slot(slot_index + 1))?)?
        } else {
            span.len
        };
        if start > end || end > span.len {
            return None;
        }
        let abs = base.index();
        self.bytes
            .get(abs + start as usize..abs + end as usize)
    }

    /// The record that ends exactly at `addr`.
    pub fn span_ending_at(&self, addr: Offset) -> Option<RecordSpan> {
        let i = self
            .spans
            .partition_point(|s| s.offset < addr)
            .checked_sub(1)?;
        let span = self.spans[i];
        (span.end() == addr.get()).then_some(span)
    }

    /// Bytes of the `kind` field in header slot `slot_index` that begins at
    /// absolute address `addr`.
    ///
    /// This is how a narration sink turns the addresses it is handed back
    /// into strings: the argument position says which field of which record
    /// kind an address names. An empty last field points one past its
    /// record, so the record ending at `addr` is tried as well.
    pub fn field_at(&self, addr: Offset, kind: RecordKind, slot_index: u32) -> Option<&'a [u8]> {
        let candidates = self
            .span_containing(addr)
            .into_iter()
            .chain(self.span_ending_at(addr));
        for span in candidates {
            if span.kind != kind {
                continue;
            }
            let rel = addr.get() - span.offset.get();
            let hdr = self.word(span.offset.checked_add(slot(slot_index))?)?;
            if hdr == rel {
                return self.field(span.offset, slot_index);
            }
        }
        None
    }

    /// String field at absolute address `addr`, decoded one byte per
    /// character. See [`field_at`](Self::field_at).
    pub fn str_at(&self, addr: Offset, kind: RecordKind, slot_index: u32) -> Option<String> {
        self.field_at(addr, kind, slot_index).map(decode_str)
    }

    /// Decode the animal record at `base`.
    pub fn animal(&self, base: Offset) -> Option<DecodedAnimal> {
        self.expect_kind(base, RecordKind::Animal)?;
        Some(DecodedAnimal {
            gene: decode_str(self.field(base, animal::GENE)?),
            name: decode_str(self.field(base, animal::NAME)?),
            sound: decode_str(self.field(base, animal::SOUND)?),
        })
    }

    /// Decode the instance record at `base`.
    pub fn instance(&self, base: Offset) -> Option<DecodedInstance> {
        self.expect_kind(base, RecordKind::Instance)?;
        Some(DecodedInstance {
            name: decode_str(self.field(base, instance::NAME)?),
            species: Offset(word_of(self.field(base, instance::SPECIES)?)?),
            world: Offset(word_of(self.field(base, instance::WORLD)?)?),
        })
    }

    /// Decode the world record at `base`.
    pub fn world(&self, base: Offset) -> Option<DecodedWorld> {
        self.expect_kind(base, RecordKind::World)?;
        let contains = self
            .field(base, world::CONTAINS)?
            .chunks_exact(4)
            .map(|c| word_of(c).map(Offset))
            .collect::<Option<Vec<_>>>()?;
        Some(DecodedWorld {
            name: decode_str(self.field(base, world::NAME)?),
            contains,
        })
    }

    fn expect_kind(&self, base: Offset, kind: RecordKind) -> Option<()> {
        (self.span_at(base)?.kind == kind).then_some(())
    }
}

fn word_of(bytes: &[u8]) -> Option<u32> {
    read_u32_at(bytes, 0).filter(|_| bytes.len() == 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::image::ImageBuilder;
    use worlds_core::Graph;

    fn image_of(graph: &Graph) -> crate::image::MemoryImage {
        ImageBuilder::new(graph, ImageConfig::default())
            .build()
            .unwrap()
    }

    #[test]
    fn field_at_resolves_each_animal_string() {
        let mut b = Graph::builder();
        b.animal("cat", "G1", "meow");
        let image = image_of(&b.build());
        let view = image.view();
        let a = RecordKind::Animal;

        assert_eq!(view.str_at(Offset(12), a, animal::GENE).as_deref(), Some("G1"));
        assert_eq!(view.str_at(Offset(14), a, animal::NAME).as_deref(), Some("cat"));
        assert_eq!(view.str_at(Offset(17), a, animal::SOUND).as_deref(), Some("meow"));
        // Middle of a string, or the wrong slot, is not a field start.
        assert_eq!(view.str_at(Offset(15), a, animal::NAME), None);
        assert_eq!(view.str_at(Offset(14), a, animal::SOUND), None);
    }

    #[test]
    fn empty_fields_resolve_by_slot() {
        let mut b = Graph::builder();
        b.animal("mute", "", "");
        b.animal("cat", "G1", "meow");
        let image = image_of(&b.build());
        let view = image.view();
        let a = RecordKind::Animal;

        // mute: header 12, gene 0, name 4, sound 0 → record is 16 bytes
        let mute = view.animal(Offset(0)).unwrap();
        assert_eq!(mute.gene, "");
        assert_eq!(mute.name, "mute");
        assert_eq!(mute.sound, "");
        assert_eq!(view.str_at(Offset(12), a, animal::GENE).as_deref(), Some(""));
        assert_eq!(view.str_at(Offset(12), a, animal::NAME).as_deref(), Some("mute"));
        // Sound points one past the record, at the start of "cat".
        assert_eq!(view.str_at(Offset(16), a, animal::SOUND).as_deref(), Some(""));
        assert_eq!(view.animal(Offset(16)).unwrap().name, "cat");
    }

    #[test]
    fn wrong_kind_decodes_to_none() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        b.instance("i1", cat);
        let image = image_of(&b.build());
        let view = image.view();

        assert!(view.instance(Offset(0)).is_none());
        assert!(view.animal(Offset(21)).is_none());
        assert!(view.animal(Offset(3)).is_none());
        assert_eq!(view.instance(Offset(21)).unwrap().name, "i1");
    }
}
