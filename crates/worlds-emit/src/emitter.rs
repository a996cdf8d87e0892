//! Lowering a memory image and its graph to an entry-function body.
//!
//! Transfers become constant-address stores into instance world-reference
//! words. Narration becomes, per instance, five address chains built from
//! the `base + load(base + slot)` field combinator. Before any instruction
//! is emitted, every chain is also resolved on a scratch copy of the memory
//! with all transfers applied, so a chain that would dereference an unset
//! or dangling word fails the compilation instead of narrating garbage.

use tracing::{debug, info};
use worlds_core::{CompileError, Graph, Offset, RecordKind, Transfer};
use worlds_image::codec::{read_u32_at, slot, write_u32_at};
use worlds_image::record::{self, INSTANCE_WORLD_REF};
use worlds_image::{deref, field_address, ImageView, MemoryImage};

use crate::config::EmitConfig;
use crate::instr::{Expr, Instruction};
use crate::program::{NarrationCall, Program, StoreOp};

/// Emit the program for `graph` over its finished `image`.
///
/// # Errors
///
/// - [`CompileError::ReferenceResolution`] if a transfer or instance has
///   no offset in the image tables.
/// - [`CompileError::Dereference`] if a narration chain cannot be
///   resolved, most often because an instance was never placed.
/// - [`CompileError::LayoutOverflow`] if the image needs more pages than
///   [`EmitConfig::max_pages`].
pub fn emit(
    graph: &Graph,
    image: &MemoryImage,
    config: &EmitConfig,
) -> Result<Program, CompileError> {
    Emitter::new(graph, image, config).emit()
}

/// Instruction emitter over one graph and its image.
pub struct Emitter<'a> {
    graph: &'a Graph,
    image: &'a MemoryImage,
    config: &'a EmitConfig,
}

impl<'a> Emitter<'a> {
    /// Prepare to emit `graph` over `image`.
    pub fn new(graph: &'a Graph, image: &'a MemoryImage, config: &'a EmitConfig) -> Self {
        Self {
            graph,
            image,
            config,
        }
    }

    /// Lower transfers and narration, then assemble the body.
    pub fn emit(self) -> Result<Program, CompileError> {
        let pages = self.check_pages()?;

        let stores = self
            .graph
            .transfers
            .iter()
            .enumerate()
            .map(|(position, t)| self.lower_transfer(position, t))
            .collect::<Result<Vec<_>, _>>()?;

        // Narration runs after every store, so resolve against that state.
        let mut scratch = self.image.bytes().to_vec();
        for op in &stores {
            write_u32_at(&mut scratch, op.target.index(), op.value.get()).ok_or_else(|| {
                CompileError::ReferenceResolution {
                    record: RecordKind::Instance,
                    name: op.instance.clone(),
                    field: "world",
                    target: format!("store target {} outside the image", op.target),
                }
            })?;
        }
        let view = ImageView::new(&scratch, self.image.spans());

        let mut resolved = Vec::with_capacity(self.graph.instances.len());
        for inst in &self.graph.instances {
            let base = self.image.instances().get(&inst.name).ok_or_else(|| {
                CompileError::ReferenceResolution {
                    record: RecordKind::Instance,
                    name: inst.name.clone(),
                    field: "name",
                    target: "no assigned offset".to_string(),
                }
            })?;
            let call = Chain {
                view,
                instance: &inst.name,
            }
            .resolve(base)?;
            debug!(instance = %inst.name, args = ?call.args(), "resolved narration");
            resolved.push((base, call));
        }

        let mut body = Vec::with_capacity(stores.len() + resolved.len() + 1);
        body.extend(stores.iter().map(store_instruction));
        body.extend(
            resolved
                .iter()
                .map(|&(base, _)| Instruction::Narrate(Box::new(narration_exprs(base)))),
        );
        body.push(Instruction::Return(Expr::Const(0)));
        let narrations: Vec<NarrationCall> = resolved.into_iter().map(|(_, call)| call).collect();

        info!(
            stores = stores.len(),
            narrations = narrations.len(),
            instructions = body.len(),
            pages = pages.0,
            "program emitted"
        );

        Ok(Program {
            image: self.image.clone(),
            stores,
            narrations,
            body,
            pages,
        })
    }

    fn check_pages(&self) -> Result<(u32, u32), CompileError> {
        let initial = self.config.pages_for(self.image.len());
        if initial > self.config.max_pages {
            return Err(CompileError::LayoutOverflow {
                required: u64::from(self.image.len()),
                limit: u64::from(self.config.max_pages) * u64::from(EmitConfig::PAGE_SIZE),
            });
        }
        Ok((initial, self.config.max_pages))
    }

    fn lower_transfer(&self, position: usize, t: &Transfer) -> Result<StoreOp, CompileError> {
        let unresolved = |field: &'static str, target: String| CompileError::ReferenceResolution {
            record: RecordKind::Instance,
            name: format!("transfer #{position}"),
            field,
            target,
        };

        let inst = self
            .graph
            .instance(t.instance)
            .ok_or_else(|| unresolved("instance", t.instance.to_string()))?;
        let world = self
            .graph
            .world(t.to)
            .ok_or_else(|| unresolved("to", t.to.to_string()))?;
        let inst_off = self
            .image
            .instances()
            .get(&inst.name)
            .ok_or_else(|| {
                unresolved("instance", format!("instance '{}' with no offset", inst.name))
            })?;
        let world_off = self
            .image
            .worlds()
            .get(&world.name)
            .ok_or_else(|| unresolved("to", format!("world '{}' with no offset", world.name)))?;
        let target = inst_off
            .checked_add(INSTANCE_WORLD_REF)
            .ok_or_else(|| unresolved("instance", format!("instance at {inst_off}")))?;

        debug!(
            instance = %inst.name,
            world = %world.name,
            target = target.get(),
            value = world_off.get(),
            "lowered transfer"
        );
        Ok(StoreOp {
            instance: inst.name.clone(),
            world: world.name.clone(),
            target,
            value: world_off,
        })
    }
}

/// `store offset=12 (const instance) (const world)`.
fn store_instruction(op: &StoreOp) -> Instruction {
    Instruction::Store {
        offset: INSTANCE_WORLD_REF,
        addr: Expr::offset(Offset(op.target.get() - INSTANCE_WORLD_REF)),
        value: Expr::offset(op.value),
    }
}

/// The five address expressions narrating the instance at `base`.
pub fn narration_exprs(base: Offset) -> [Expr; 5] {
    let inst = Expr::offset(base);
    let world = Expr::load(Expr::field(inst.clone(), slot(record::instance::WORLD)));
    let animal = Expr::load(Expr::field(inst.clone(), slot(record::instance::SPECIES)));
    [
        Expr::field(world, slot(record::world::NAME)),
        Expr::field(animal.clone(), slot(record::animal::GENE)),
        Expr::field(animal.clone(), slot(record::animal::NAME)),
        Expr::field(inst, slot(record::instance::NAME)),
        Expr::field(animal, slot(record::animal::SOUND)),
    ]
}

/// Compile-time walk of one instance's narration chain.
struct Chain<'v> {
    view: ImageView<'v>,
    instance: &'v str,
}

impl Chain<'_> {
    fn resolve(&self, inst: Offset) -> Result<NarrationCall, CompileError> {
        let world_ref = self.field(inst, record::instance::WORLD, "world-ref header")?;
        let world = self.follow(world_ref, RecordKind::World, "world-ref")?;
        let species_ref = self.field(inst, record::instance::SPECIES, "species header")?;
        let animal = self.follow(species_ref, RecordKind::Animal, "species")?;

        Ok(NarrationCall {
            instance: self.instance.to_string(),
            world_name: self.field(world, record::world::NAME, "world name")?,
            animal_gene: self.field(animal, record::animal::GENE, "animal gene")?,
            animal_name: self.field(animal, record::animal::NAME, "animal name")?,
            instance_name: self.field(inst, record::instance::NAME, "instance name")?,
            animal_sound: self.field(animal, record::animal::SOUND, "animal sound")?,
        })
    }

    fn fail(&self, step: &'static str, detail: String) -> CompileError {
        CompileError::Dereference {
            instance: self.instance.to_string(),
            step,
            detail,
        }
    }

    /// `base + mem[base + slot * 4]`, bounded by the image.
    fn field(
        &self,
        base: Offset,
        slot_index: u32,
        step: &'static str,
    ) -> Result<Offset, CompileError> {
        let addr = field_address(self.view.bytes(), base, slot_index).ok_or_else(|| {
            self.fail(step, format!("header slot {slot_index} of {base} unreadable"))
        })?;
        if addr.index() > self.view.bytes().len() {
            return Err(self.fail(step, format!("field address {addr} past end of image")));
        }
        Ok(addr)
    }

    /// Load the reference word at `addr` and check it names a `kind` record.
    fn follow(
        &self,
        addr: Offset,
        kind: RecordKind,
        step: &'static str,
    ) -> Result<Offset, CompileError> {
        let mem = self.view.bytes();
        let target = deref(mem, addr).ok_or_else(|| match read_u32_at(mem, addr.index()) {
            Some(_) => self.fail(step, "unset: no world placed or transferred it".to_string()),
            None => self.fail(step, format!("reference word at {addr} outside image")),
        })?;
        match self.view.span_at(target) {
            Some(span) if span.kind == kind => Ok(target),
            _ => Err(self.fail(step, format!("{target} is not the start of a {kind} record"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worlds_core::{AnimalRef, Instance, InstanceRef, WorldRef};
    use worlds_image::{ImageBuilder, ImageConfig};

    fn build(graph: &Graph) -> MemoryImage {
        ImageBuilder::new(graph, ImageConfig::default())
            .build()
            .unwrap()
    }

    fn scenario(transfer: bool) -> Graph {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", cat);
        b.world("w1", [i1]);
        let w2 = b.world("w2", Vec::new());
        if transfer {
            b.transfer(i1, w2);
        }
        b.build()
    }

    #[test]
    fn narration_addresses_for_scenario() {
        let graph = scenario(false);
        let image = build(&graph);
        let program = emit(&graph, &image, &EmitConfig::default()).unwrap();

        // cat@0 [12,14,17], i1@21 [12,16,18], w1@43 [8,10]
        let call = &program.narrations[0];
        assert_eq!(call.world_name, Offset(43 + 8));
        assert_eq!(call.animal_gene, Offset(12));
        assert_eq!(call.animal_name, Offset(14));
        assert_eq!(call.instance_name, Offset(21 + 16));
        assert_eq!(call.animal_sound, Offset(17));
        assert!(program.stores.is_empty());
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.pages, (1, 256));
    }

    #[test]
    fn transfer_lowered_to_store_and_redirects_narration() {
        let graph = scenario(true);
        let image = build(&graph);
        let program = emit(&graph, &image, &EmitConfig::default()).unwrap();

        let w2 = image.worlds().get("w2").unwrap();
        assert_eq!(
            program.stores,
            vec![StoreOp {
                instance: "i1".into(),
                world: "w2".into(),
                target: Offset(21 + INSTANCE_WORLD_REF),
                value: w2,
            }]
        );
        assert_eq!(program.narrations[0].world_name, Offset(w2.get() + 8));
        assert!(matches!(program.body[0], Instruction::Store { offset: 12, .. }));
        assert_eq!(program.body.last(), Some(&Instruction::Return(Expr::Const(0))));
    }

    #[test]
    fn one_narration_per_instance_at_its_own_base() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let i1 = b.instance("i1", cat);
        let i2 = b.instance("i2", cat);
        b.world("w1", [i1, i2]);
        let graph = b.build();
        let image = build(&graph);
        let program = emit(&graph, &image, &EmitConfig::default()).unwrap();

        let expected: Vec<_> = ["i1", "i2"]
            .iter()
            .map(|name| {
                let base = image.instances().get(name).unwrap();
                Instruction::Narrate(Box::new(narration_exprs(base)))
            })
            .collect();
        assert_eq!(&program.body[..2], expected.as_slice());
        assert_eq!(program.narrations.len(), 2);
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn instance_missing_from_image_fails_the_whole_emit() {
        let graph = scenario(false);
        let image = build(&graph);
        let mut stale = graph.clone();
        stale.instances.push(Instance {
            name: "ghost".into(),
            species: AnimalRef(0),
        });

        let err = emit(&stale, &image, &EmitConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ReferenceResolution { ref name, field: "name", .. } if name == "ghost"
        ));
    }

    #[test]
    fn unplaced_instance_is_a_dereference_error() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        b.instance("stray", cat);
        let graph = b.build();
        let image = build(&graph);

        let err = emit(&graph, &image, &EmitConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Dereference { ref instance, step: "world-ref", .. } if instance == "stray"
        ));
    }

    #[test]
    fn transfer_rescues_unplaced_instance() {
        let mut b = Graph::builder();
        let cat = b.animal("cat", "G1", "meow");
        let stray = b.instance("stray", cat);
        let home = b.world("home", Vec::new());
        b.transfer(stray, home);
        let graph = b.build();
        let image = build(&graph);

        let program = emit(&graph, &image, &EmitConfig::default()).unwrap();
        let home_off = image.worlds().get("home").unwrap();
        assert_eq!(program.narrations[0].world_name, Offset(home_off.get() + 8));
    }

    #[test]
    fn dangling_transfer_is_a_reference_error() {
        let mut graph = scenario(false);
        graph.transfers.push(Transfer {
            instance: InstanceRef(0),
            to: WorldRef(9),
        });
        let image = build(&graph);

        let err = emit(&graph, &image, &EmitConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ReferenceResolution { field: "to", .. }
        ));
    }

    #[test]
    fn oversized_image_rejected_by_page_limit() {
        let graph = scenario(false);
        let image = build(&graph);
        let config = EmitConfig {
            initial_pages: 2,
            max_pages: 1,
            ..EmitConfig::default()
        };
        let err = emit(&graph, &image, &config).unwrap_err();
        assert!(matches!(err, CompileError::LayoutOverflow { .. }));
    }
}
