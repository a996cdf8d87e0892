//! Reference interpreter for emitted programs.
//!
//! [`Machine`] executes an entry-function body against its own copy of the
//! image bytes with the same semantics the target gives the instructions:
//! little-endian 32-bit loads and stores, wrapping addition, and
//! out-of-bounds accesses that trap. Narration calls are dispatched to a
//! [`NarrationSink`], which gets a view of memory as it stands at call time.

use std::error::Error;
use std::fmt;

use worlds_core::{Offset, RecordKind};
use worlds_image::codec::{read_u32_at, write_u32_at};
use worlds_image::record;
use worlds_image::{ImageView, MemoryImage, RecordSpan};

use crate::instr::{Expr, Instruction};

// ── Narration ──────────────────────────────────────────────────────

/// Receives narration calls from a running program.
pub trait NarrationSink {
    /// Handle one call. `args` are the five addresses in wire order;
    /// `memory` is the machine's memory at the moment of the call.
    fn narrate(&mut self, memory: &ImageView<'_>, args: [u32; 5]);
}

impl<F> NarrationSink for F
where
    F: FnMut(&ImageView<'_>, [u32; 5]),
{
    fn narrate(&mut self, memory: &ImageView<'_>, args: [u32; 5]) {
        self(memory, args)
    }
}

/// The five strings one narration call names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narration {
    /// Current world's name.
    pub world: String,
    /// Species gene.
    pub gene: String,
    /// Species name.
    pub animal: String,
    /// Instance name.
    pub instance: String,
    /// Species sound.
    pub sound: String,
}

impl Narration {
    /// Decode the strings behind `args`, or `None` if any address is not
    /// the start of the expected field.
    pub fn decode(memory: &ImageView<'_>, args: [u32; 5]) -> Option<Self> {
        let [world, gene, animal, instance, sound] = args.map(Offset);
        Some(Self {
            world: memory.str_at(world, RecordKind::World, record::world::NAME)?,
            gene: memory.str_at(gene, RecordKind::Animal, record::animal::GENE)?,
            animal: memory.str_at(animal, RecordKind::Animal, record::animal::NAME)?,
            instance: memory.str_at(instance, RecordKind::Instance, record::instance::NAME)?,
            sound: memory.str_at(sound, RecordKind::Animal, record::animal::SOUND)?,
        })
    }

    /// The narration as a tuple, in wire order.
    pub fn as_tuple(&self) -> (&str, &str, &str, &str, &str) {
        (
            &self.world,
            &self.gene,
            &self.animal,
            &self.instance,
            &self.sound,
        )
    }
}

impl fmt::Display for Narration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In {}, {} the {} ({}) says {}",
            self.world, self.instance, self.animal, self.gene, self.sound
        )
    }
}

// ── Trap ───────────────────────────────────────────────────────────

/// A runtime fault that aborts execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    /// A load or store touched bytes outside memory.
    OutOfBounds {
        /// Effective address of the access.
        addr: u64,
        /// Memory size in bytes.
        size: usize,
    },
    /// The body ended without a return.
    MissingReturn,
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { addr, size } => {
                write!(f, "out-of-bounds access at {addr:#x} (memory is {size} bytes)")
            }
            Self::MissingReturn => write!(f, "function body ended without return"),
        }
    }
}

impl Error for Trap {}

// ── Machine ────────────────────────────────────────────────────────

/// Executes instruction bodies against a private memory.
#[derive(Clone, Debug)]
pub struct Machine {
    memory: Vec<u8>,
    spans: Vec<RecordSpan>,
}

impl Machine {
    /// A machine whose memory starts as a copy of `image`.
    pub fn new(image: &MemoryImage) -> Self {
        Self {
            memory: image.bytes().to_vec(),
            spans: image.spans().to_vec(),
        }
    }

    /// Current memory contents.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// A view of current memory.
    pub fn view(&self) -> ImageView<'_> {
        ImageView::new(&self.memory, &self.spans)
    }

    /// Run `body` to its return, dispatching narration to `sink`.
    pub fn run(
        &mut self,
        body: &[Instruction],
        sink: &mut impl NarrationSink,
    ) -> Result<u32, Trap> {
        for instr in body {
            match instr {
                Instruction::Store {
                    offset,
                    addr,
                    value,
                } => {
                    let base = self.eval(addr)?;
                    let v = self.eval(value)?;
                    let ea = u64::from(base) + u64::from(*offset);
                    let size = self.memory.len();
                    usize::try_from(ea)
                        .ok()
                        .and_then(|pos| write_u32_at(&mut self.memory, pos, v))
                        .ok_or(Trap::OutOfBounds { addr: ea, size })?;
                }
                Instruction::Narrate(args) => {
                    let mut vals = [0u32; 5];
                    for (slot, e) in vals.iter_mut().zip(args.iter()) {
                        *slot = self.eval(e)?;
                    }
                    sink.narrate(&self.view(), vals);
                }
                Instruction::Return(e) => return self.eval(e),
            }
        }
        Err(Trap::MissingReturn)
    }

    /// Evaluate one expression against current memory.
    pub fn eval(&self, expr: &Expr) -> Result<u32, Trap> {
        match expr {
            Expr::Const(v) => Ok(*v),
            Expr::Add(l, r) => Ok(self.eval(l)?.wrapping_add(self.eval(r)?)),
            Expr::Load { offset, addr } => {
                let ea = u64::from(self.eval(addr)?) + u64::from(*offset);
                usize::try_from(ea)
                    .ok()
                    .and_then(|pos| read_u32_at(&self.memory, pos))
                    .ok_or(Trap::OutOfBounds {
                        addr: ea,
                        size: self.memory.len(),
                    })
            }
        }
    }
}
