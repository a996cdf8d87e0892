//! Instruction emission for the Worlds compiler.
//!
//! Turns a finished [`MemoryImage`](worlds_image::MemoryImage) into a
//! [`Program`]: the image as initial memory, one store per transfer, one
//! narration call per instance, and a final `return 0`.
//!
//! # Narration chain
//!
//! For the instance at `I`, each argument is a field address computed by
//! the combinator `field(base, slot) = base + load(base + slot * 4)`:
//!
//! ```text
//! W      = load(field(I, world-ref))
//! A      = load(field(I, species))
//! call narrate(field(W, name), field(A, gene), field(A, name),
//!              field(I, name), field(A, sound))
//! ```
//!
//! [`Machine`] runs the body the way the target would, and [`wat`] renders
//! it as module text.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod emitter;
pub mod instr;
pub mod machine;
pub mod program;
pub mod wat;

pub use config::EmitConfig;
pub use emitter::{emit, narration_exprs, Emitter};
pub use instr::{Expr, Instruction};
pub use machine::{Machine, Narration, NarrationSink, Trap};
pub use program::{NarrationCall, Program, StoreOp};
pub use wat::{render, Wat};
