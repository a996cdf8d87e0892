//! Byte encoding of individual records.
//!
//! Each encoder builds the header first (one offset per field, relative to
//! the record's start) and then appends the field bytes in header order.
//! Cross-references are resolved against the offset tables of categories
//! that were laid out earlier; a miss is a hard
//! [`CompileError::ReferenceResolution`].

use smallvec::SmallVec;
use worlds_core::{Animal, CompileError, Graph, Instance, InstanceRef, Offset, RecordKind, World};

use crate::codec::{encode_str, put_u32_le, slot, WORD};
use crate::table::OffsetTable;

/// Header slot indices of an animal record.
pub mod animal {
    /// Gene string.
    pub const GENE: u32 = 0;
    /// Species name string.
    pub const NAME: u32 = 1;
    /// Sound string.
    pub const SOUND: u32 = 2;
    /// Number of header slots.
    pub const SLOTS: u32 = 3;
}

/// Header slot indices of an instance record.
pub mod instance {
    /// Current-world reference word (patched after layout).
    pub const WORLD: u32 = 0;
    /// Instance name string.
    pub const NAME: u32 = 1;
    /// Species reference word.
    pub const SPECIES: u32 = 2;
    /// Number of header slots.
    pub const SLOTS: u32 = 3;
}

/// Header slot indices of a world record.
pub mod world {
    /// World name string.
    pub const NAME: u32 = 0;
    /// Vector of contained-instance words.
    pub const CONTAINS: u32 = 1;
    /// Number of header slots.
    pub const SLOTS: u32 = 2;
}

/// Position of the world-reference word inside an instance record: directly
/// after the header.
pub const INSTANCE_WORLD_REF: u32 = slot(instance::SLOTS);

/// Number of header slots for records of `kind`.
pub fn header_slots(kind: RecordKind) -> u32 {
    match kind {
        RecordKind::Animal => animal::SLOTS,
        RecordKind::Instance => instance::SLOTS,
        RecordKind::World => world::SLOTS,
    }
}

/// One serialized record, not yet placed in the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedRecord {
    /// Record category.
    pub kind: RecordKind,
    /// Header offsets, relative to the record start.
    pub header: SmallVec<[u32; 4]>,
    /// Full record bytes, header included.
    pub bytes: Vec<u8>,
}

impl EncodedRecord {
    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Whether the record has no bytes (never true for a real record).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lay out `fields` behind a header of one offset per field.
    fn assemble(kind: RecordKind, fields: &[&[u8]]) -> Self {
        let mut header: SmallVec<[u32; 4]> = SmallVec::with_capacity(fields.len());
        let mut pos = slot(fields.len() as u32);
        for field in fields {
            header.push(pos);
            pos += field.len() as u32;
        }

        let mut bytes = Vec::with_capacity(pos as usize);
        for &rel in &header {
            put_u32_le(&mut bytes, rel);
        }
        for field in fields {
            bytes.extend_from_slice(field);
        }

        Self {
            kind,
            header,
            bytes,
        }
    }
}

/// Encode an animal: `[gene][name][sound]`.
pub fn encode_animal(a: &Animal) -> Result<EncodedRecord, CompileError> {
    let gene = encode_str(&a.gene, RecordKind::Animal, &a.name, "gene")?;
    let name = encode_str(&a.name, RecordKind::Animal, &a.name, "name")?;
    let sound = encode_str(&a.sound, RecordKind::Animal, &a.name, "sound")?;
    Ok(EncodedRecord::assemble(
        RecordKind::Animal,
        &[&gene[..], &name[..], &sound[..]],
    ))
}

/// Encode an instance: `[world-ref][name][species]`.
///
/// The world-reference word starts as [`Offset::UNSET`]; the image builder
/// patches it once world offsets are known.
pub fn encode_instance(
    graph: &Graph,
    inst: &Instance,
    animals: &OffsetTable,
) -> Result<EncodedRecord, CompileError> {
    let species = graph
        .animal(inst.species)
        .ok_or_else(|| CompileError::ReferenceResolution {
            record: RecordKind::Instance,
            name: inst.name.clone(),
            field: "species",
            target: inst.species.to_string(),
        })?;
    let species_off = animals
        .get(&species.name)
        .ok_or_else(|| CompileError::ReferenceResolution {
            record: RecordKind::Instance,
            name: inst.name.clone(),
            field: "species",
            target: format!("animal '{}' with no assigned offset", species.name),
        })?;

    let world_ref = Offset::UNSET.get().to_le_bytes();
    let name = encode_str(&inst.name, RecordKind::Instance, &inst.name, "name")?;
    let species_ref = species_off.get().to_le_bytes();
    Ok(EncodedRecord::assemble(
        RecordKind::Instance,
        &[&world_ref[..], &name[..], &species_ref[..]],
    ))
}

/// Encode a world: `[name][contains]`, where `contains` is one word per
/// instance offset.
pub fn encode_world(
    graph: &Graph,
    w: &World,
    instances: &OffsetTable,
) -> Result<EncodedRecord, CompileError> {
    let name = encode_str(&w.name, RecordKind::World, &w.name, "name")?;

    let mut contains = Vec::with_capacity(w.contains.len() * WORD as usize);
    for &r in &w.contains {
        let off = resolve_instance(graph, instances, r, &w.name)?;
        put_u32_le(&mut contains, off.get());
    }

    Ok(EncodedRecord::assemble(
        RecordKind::World,
        &[&name[..], &contains[..]],
    ))
}

/// Resolve one entry of a world's `contains` list to its instance offset.
pub(crate) fn resolve_instance(
    graph: &Graph,
    instances: &OffsetTable,
    r: InstanceRef,
    world_name: &str,
) -> Result<Offset, CompileError> {
    let inst = graph
        .instance(r)
        .ok_or_else(|| CompileError::ReferenceResolution {
            record: RecordKind::World,
            name: world_name.to_string(),
            field: "contains",
            target: r.to_string(),
        })?;
    instances
        .get(&inst.name)
        .ok_or_else(|| CompileError::ReferenceResolution {
            record: RecordKind::World,
            name: world_name.to_string(),
            field: "contains",
            target: format!("instance '{}' with no assigned offset", inst.name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::read_u32_at;
    use worlds_core::AnimalRef;

    fn cat() -> Animal {
        Animal {
            name: "cat".into(),
            gene: "G1".into(),
            sound: "meow".into(),
        }
    }

    #[test]
    fn animal_header_then_fields() {
        let rec = encode_animal(&cat()).unwrap();
        assert_eq!(rec.header.as_slice(), &[12, 14, 17]);
        assert_eq!(rec.len(), 12 + 2 + 3 + 4);
        assert_eq!(read_u32_at(&rec.bytes, 0), Some(12));
        assert_eq!(read_u32_at(&rec.bytes, 4), Some(14));
        assert_eq!(read_u32_at(&rec.bytes, 8), Some(17));
        assert_eq!(&rec.bytes[12..], b"G1catmeow");
    }

    #[test]
    fn empty_strings_produce_equal_offsets() {
        let rec = encode_animal(&Animal {
            name: "x".into(),
            gene: String::new(),
            sound: String::new(),
        })
        .unwrap();
        assert_eq!(rec.header.as_slice(), &[12, 12, 13]);
        assert_eq!(rec.len(), 13);
    }

    #[test]
    fn instance_reserves_unset_world_slot() {
        let mut b = Graph::builder();
        let c = b.animal("cat", "G1", "meow");
        b.instance("i1", c);
        let g = b.build();

        let mut animals = OffsetTable::new(RecordKind::Animal);
        animals.insert("cat", Offset(40)).unwrap();

        let rec = encode_instance(&g, &g.instances[0], &animals).unwrap();
        assert_eq!(rec.header.as_slice(), &[12, 16, 18]);
        assert_eq!(read_u32_at(&rec.bytes, INSTANCE_WORLD_REF as usize), Some(u32::MAX));
        assert_eq!(&rec.bytes[16..18], b"i1");
        assert_eq!(read_u32_at(&rec.bytes, 18), Some(40));
        assert_eq!(rec.len(), 22);
    }

    #[test]
    fn instance_with_dangling_species_fails() {
        let mut b = Graph::builder();
        b.instance("i1", AnimalRef(3));
        let g = b.build();
        let animals = OffsetTable::new(RecordKind::Animal);

        let err = encode_instance(&g, &g.instances[0], &animals).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ReferenceResolution {
                record: RecordKind::Instance,
                field: "species",
                ..
            }
        ));
    }

    #[test]
    fn instance_with_species_missing_from_table_fails() {
        let mut b = Graph::builder();
        let c = b.animal("cat", "G1", "meow");
        b.instance("i1", c);
        let g = b.build();
        let animals = OffsetTable::new(RecordKind::Animal);

        let err = encode_instance(&g, &g.instances[0], &animals).unwrap_err();
        assert!(err.to_string().contains("no assigned offset"), "{err}");
    }

    #[test]
    fn world_contains_vector() {
        let mut b = Graph::builder();
        let c = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", c);
        let i2 = b.instance("i2", c);
        b.world("w1", [i1, i2]);
        let g = b.build();

        let mut instances = OffsetTable::new(RecordKind::Instance);
        instances.insert("i1", Offset(21)).unwrap();
        instances.insert("i2", Offset(43)).unwrap();

        let rec = encode_world(&g, &g.worlds[0], &instances).unwrap();
        assert_eq!(rec.header.as_slice(), &[8, 10]);
        assert_eq!(&rec.bytes[8..10], b"w1");
        assert_eq!(read_u32_at(&rec.bytes, 10), Some(21));
        assert_eq!(read_u32_at(&rec.bytes, 14), Some(43));
        assert_eq!(rec.len(), 18);
    }

    #[test]
    fn world_with_unknown_instance_fails() {
        let mut b = Graph::builder();
        b.world("w1", [InstanceRef(0)]);
        let g = b.build();
        let instances = OffsetTable::new(RecordKind::Instance);

        let err = encode_world(&g, &g.worlds[0], &instances).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ReferenceResolution {
                record: RecordKind::World,
                field: "contains",
                ..
            }
        ));
    }
}
