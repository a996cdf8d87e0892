//! The assembled memory image and the builder that produces it.
//!
//! Building runs three passes over the graph:
//!
//! 1. **Allocate**: [`allocate`] assigns every record its offset.
//! 2. **Place**: each encoded blob is copied to its offset in a zeroed
//!    buffer of the final size.
//! 3. **Back-patch**: for every world, in declaration order, each contained
//!    instance gets the world's offset written into its world-reference
//!    word. An instance no world lists keeps [`Offset::UNSET`].

use std::collections::HashMap;

use tracing::{debug, info, warn};
use worlds_core::{CompileError, Graph, Offset, RecordKind};

use crate::codec::{read_u32_at, write_u32_at};
use crate::config::ImageConfig;
use crate::layout::{allocate, Layout};
use crate::record::{resolve_instance, INSTANCE_WORLD_REF};
use crate::table::OffsetTable;
use crate::view::{DecodedAnimal, DecodedInstance, DecodedWorld, ImageView, RecordSpan};

/// A finished memory image: the byte buffer plus the offset tables needed
/// to address into it.
#[derive(Clone, Debug)]
pub struct MemoryImage {
    bytes: Vec<u8>,
    animals: OffsetTable,
    instances: OffsetTable,
    worlds: OffsetTable,
    spans: Vec<RecordSpan>,
}

impl MemoryImage {
    /// The image bytes, ready to become a data segment at address 0.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the image, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Image size in bytes.
    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Whether the image is empty (only for an empty graph).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Animal name → offset.
    pub fn animals(&self) -> &OffsetTable {
        &self.animals
    }

    /// Instance name → offset.
    pub fn instances(&self) -> &OffsetTable {
        &self.instances
    }

    /// World name → offset.
    pub fn worlds(&self) -> &OffsetTable {
        &self.worlds
    }

    /// Every record's span, in layout order.
    pub fn spans(&self) -> &[RecordSpan] {
        &self.spans
    }

    /// A read-only view over the image bytes.
    pub fn view(&self) -> ImageView<'_> {
        ImageView::new(&self.bytes, &self.spans)
    }

    /// Read the little-endian word at `addr`.
    pub fn read_u32(&self, addr: Offset) -> Option<u32> {
        read_u32_at(&self.bytes, addr.index())
    }

    /// The world-reference word of the instance at `instance`.
    pub fn world_of(&self, instance: Offset) -> Option<Offset> {
        self.read_u32(instance.checked_add(INSTANCE_WORLD_REF)?)
            .map(Offset)
    }

    /// Decode the animal named `name`.
    pub fn decode_animal(&self, name: &str) -> Option<DecodedAnimal> {
        self.view().animal(self.animals.get(name)?)
    }

    /// Decode the instance named `name`.
    pub fn decode_instance(&self, name: &str) -> Option<DecodedInstance> {
        self.view().instance(self.instances.get(name)?)
    }

    /// Decode the world named `name`.
    pub fn decode_world(&self, name: &str) -> Option<DecodedWorld> {
        self.view().world(self.worlds.get(name)?)
    }
}

/// Builds a [`MemoryImage`] from a resolved graph.
pub struct ImageBuilder<'g> {
    graph: &'g Graph,
    config: ImageConfig,
}

impl<'g> ImageBuilder<'g> {
    /// Prepare to build an image of `graph`.
    pub fn new(graph: &'g Graph, config: ImageConfig) -> Self {
        Self { graph, config }
    }

    /// Run allocation, placement, and back-patching.
    ///
    /// # Errors
    ///
    /// Everything [`allocate`] reports, plus
    /// [`CompileError::DuplicatePlacement`] when
    /// [`ImageConfig::strict_placement`] is set and an instance is listed
    /// more than once.
    pub fn build(self) -> Result<MemoryImage, CompileError> {
        let Layout {
            animals,
            instances,
            worlds,
            records,
            total,
        } = allocate(self.graph, &self.config)?;

        let mut bytes = vec![0u8; total as usize];
        let mut spans = Vec::with_capacity(records.len());
        for placed in &records {
            let start = placed.offset.index();
            let end = start + placed.record.bytes.len();
            bytes[start..end].copy_from_slice(&placed.record.bytes);
            spans.push(RecordSpan {
                kind: placed.record.kind,
                offset: placed.offset,
                len: placed.record.len(),
            });
        }

        let world_offsets: Vec<Offset> = records
            .iter()
            .filter(|p| p.record.kind == RecordKind::World)
            .map(|p| p.offset)
            .collect();
        self.back_patch(&mut bytes, &instances, &world_offsets)?;

        info!(
            animals = animals.len(),
            instances = instances.len(),
            worlds = worlds.len(),
            bytes = total,
            "memory image built"
        );

        Ok(MemoryImage {
            bytes,
            animals,
            instances,
            worlds,
            spans,
        })
    }

    fn back_patch(
        &self,
        bytes: &mut [u8],
        instances: &OffsetTable,
        world_offsets: &[Offset],
    ) -> Result<(), CompileError> {
        // instance offset -> name of the world that last placed it
        let mut placed: HashMap<Offset, &str> = HashMap::new();

        for (w, &world_off) in self.graph.worlds.iter().zip(world_offsets) {
            let world_name = w.name.as_str();
            for &r in &w.contains {
                let inst_off = resolve_instance(self.graph, instances, r, world_name)?;

                if let Some(first) = placed.insert(inst_off, world_name) {
                    let inst_name = self.graph.instance(r).map_or("?", |i| i.name.as_str());
                    if self.config.strict_placement {
                        return Err(CompileError::DuplicatePlacement {
                            instance: inst_name.to_string(),
                            first: first.to_string(),
                            second: world_name.to_string(),
                        });
                    }
                    warn!(
                        instance = inst_name,
                        first,
                        second = world_name,
                        "instance placed twice, last world wins"
                    );
                }

                let at = inst_off.index() + INSTANCE_WORLD_REF as usize;
                write_u32_at(bytes, at, world_off.get()).ok_or_else(|| {
                    CompileError::ReferenceResolution {
                        record: RecordKind::World,
                        name: world_name.to_string(),
                        field: "contains",
                        target: format!("instance at {inst_off} outside the image"),
                    }
                })?;
                debug!(world = world_name, instance = %inst_off, "patched world reference");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Graph {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", cat);
        b.world("w1", [i1]);
        b.build()
    }

    #[test]
    fn builds_scenario_image() {
        let image = ImageBuilder::new(&scenario(), ImageConfig::default())
            .build()
            .unwrap();

        // cat 21 + i1 22 + w1 14
        assert_eq!(image.len(), 57);
        assert_eq!(image.animals().get("cat"), Some(Offset(0)));
        assert_eq!(image.instances().get("i1"), Some(Offset(21)));
        assert_eq!(image.worlds().get("w1"), Some(Offset(43)));
        assert_eq!(image.world_of(Offset(21)), Some(Offset(43)));

        let cat = image.decode_animal("cat").unwrap();
        assert_eq!((cat.gene.as_str(), cat.sound.as_str()), ("G1", "meow"));
        let i1 = image.decode_instance("i1").unwrap();
        assert_eq!(i1.species, Offset(0));
        assert_eq!(i1.world, Offset(43));
        let w1 = image.decode_world("w1").unwrap();
        assert_eq!(w1.contains, vec![Offset(21)]);
    }

    #[test]
    fn unplaced_instance_keeps_sentinel() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        b.instance("stray", cat);
        let image = ImageBuilder::new(&b.build(), ImageConfig::default())
            .build()
            .unwrap();
        assert_eq!(image.world_of(Offset(21)), Some(Offset::UNSET));
    }

    fn doubly_placed() -> Graph {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", cat);
        b.world("w1", [i1]);
        b.world("w2", [i1]);
        b.build()
    }

    #[test]
    fn duplicate_placement_last_world_wins() {
        let image = ImageBuilder::new(&doubly_placed(), ImageConfig::default())
            .build()
            .unwrap();
        let w2 = image.worlds().get("w2").unwrap();
        assert_eq!(image.decode_instance("i1").unwrap().world, w2);
    }

    #[test]
    fn duplicate_placement_rejected_when_strict() {
        let err = ImageBuilder::new(&doubly_placed(), ImageConfig::new().strict())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicatePlacement {
                instance: "i1".into(),
                first: "w1".into(),
                second: "w2".into(),
            }
        );
    }

    #[test]
    fn empty_graph_gives_empty_image() {
        let image = ImageBuilder::new(&Graph::new(), ImageConfig::default())
            .build()
            .unwrap();
        assert!(image.is_empty());
        assert!(image.spans().is_empty());
    }
}
