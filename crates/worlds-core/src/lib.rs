//! Core types for the Worlds compiler.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! resolved domain graph handed over by the front end (animals, instances,
//! worlds, and transfer events), the typed references between records,
//! byte offsets into the memory image, and the error taxonomy shared by the
//! encoder and the emitter.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod model;
pub mod validate;

pub use error::CompileError;
pub use id::{AnimalRef, InstanceRef, Offset, RecordKind, WorldRef};
pub use model::{Animal, Graph, GraphBuilder, Instance, Transfer, World};
pub use validate::{validate, Violation};
