//! Flat memory image layout for the Worlds compiler.
//!
//! Serializes a resolved [`Graph`](worlds_core::Graph) into one contiguous
//! byte buffer in which records point at each other through 32-bit offsets.
//!
//! # Architecture
//!
//! ```text
//! ImageBuilder (orchestrator)
//! ├── allocate()        one cursor folded over animals → instances → worlds
//! │   └── encode_*()    per-record blob: [header offsets][field bytes]
//! ├── placement         copy each blob to its offset in a zeroed buffer
//! └── back-patch        write each world's offset into its instances
//! ```
//!
//! # Record format
//!
//! Every record starts with a header of little-endian `u32` offsets, one
//! per field, relative to the record's own start. Strings are one byte per
//! character with no terminator; a field ends where the next header slot
//! begins, or at the end of the record for the last field.
//!
//! ```text
//! Animal   [gene][name][sound]          gene bytes, name bytes, sound bytes
//! Instance [world][name][species]       world-ref u32, name bytes, animal u32
//! World    [name][contains]             name bytes, instance u32 × n
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod address;
pub mod codec;
pub mod config;
pub mod image;
pub mod layout;
pub mod record;
pub mod table;
pub mod view;

pub use address::{deref, field_address};
pub use config::ImageConfig;
pub use image::{ImageBuilder, MemoryImage};
pub use layout::{allocate, Layout, PlacedRecord};
pub use record::{EncodedRecord, INSTANCE_WORLD_REF};
pub use table::OffsetTable;
pub use view::{DecodedAnimal, DecodedInstance, DecodedWorld, ImageView, RecordSpan};
