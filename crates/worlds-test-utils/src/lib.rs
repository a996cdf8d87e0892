//! Test utilities for Worlds development.
//!
//! Provides ready-made graphs ([`fixtures`]), a seeded random graph
//! generator ([`GraphGen`]), and a [`RecordingSink`] that captures decoded
//! narration from a running program.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod graph_gen;

pub use graph_gen::GraphGen;

use worlds_emit::{Narration, NarrationSink};
use worlds_image::ImageView;

/// Narration sink that decodes and keeps every call.
///
/// Calls whose addresses do not decode are kept as raw arguments in
/// [`undecoded`](RecordingSink::undecoded) so tests can assert on them.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Vec<Narration>,
    pub undecoded: Vec<[u32; 5]>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded calls as tuples in wire order.
    pub fn tuples(&self) -> Vec<(&str, &str, &str, &str, &str)> {
        self.calls.iter().map(Narration::as_tuple).collect()
    }
}

impl NarrationSink for RecordingSink {
    fn narrate(&mut self, memory: &ImageView<'_>, args: [u32; 5]) {
        match Narration::decode(memory, args) {
            Some(n) => self.calls.push(n),
            None => self.undecoded.push(args),
        }
    }
}
