//! Worlds: compiles a resolved graph of animals, instances, and worlds into
//! a flat memory image plus a narration program.
//!
//! This is the facade crate that re-exports the public API of the Worlds
//! sub-crates and adds a one-call [`compile`] pipeline.
//!
//! # Quick start
//!
//! ```rust
//! use worlds::prelude::*;
//!
//! let mut b = Graph::builder();
//! let cat = b.animal("cat", "G1", "meow");
//! let i1 = b.instance("i1", cat);
//! b.world("w1", [i1]);
//! let w2 = b.world("w2", Vec::new());
//! b.transfer(i1, w2);
//! let graph = b.build();
//!
//! let program = worlds::compile(&graph).unwrap();
//!
//! let mut heard = Vec::new();
//! let mut sink = |mem: &ImageView<'_>, args: [u32; 5]| {
//!     heard.push(Narration::decode(mem, args).unwrap().to_string());
//! };
//! Machine::new(&program.image).run(&program.body, &mut sink).unwrap();
//! assert_eq!(heard, ["In w2, i1 the cat (G1) says meow"]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `worlds-core` | Graph model, references, errors, validation |
//! | [`image`] | `worlds-image` | Record encoding, layout, image building, decoding |
//! | [`emit`] | `worlds-emit` | Instruction emission, interpreter, module text |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use tracing::warn;

/// Graph model, typed references, and errors (`worlds-core`).
pub use worlds_core as types;

/// Record encoding, layout, and the memory image (`worlds-image`).
///
/// Most callers only need [`image::ImageBuilder`] and
/// [`image::MemoryImage`], both also in the [`prelude`].
pub use worlds_image as image;

/// Instruction emission, the reference interpreter, and module text
/// rendering (`worlds-emit`).
pub use worlds_emit as emit;

use worlds_core::{validate, CompileError, Graph};
use worlds_emit::{EmitConfig, Program};
use worlds_image::{ImageBuilder, ImageConfig};

/// Image and emission settings for one compilation.
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    /// Image layout settings.
    pub image: ImageConfig,
    /// Emission and rendering settings.
    pub emit: EmitConfig,
}

impl Compiler {
    /// A compiler with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the image of `graph` and emit its program.
    ///
    /// Upstream validation is re-run first and every violation is logged.
    /// Violations that would corrupt the image still fail the build: a
    /// repeated name surfaces as [`CompileError::DuplicateName`] and a
    /// dangling reference as [`CompileError::ReferenceResolution`].
    pub fn compile(&self, graph: &Graph) -> Result<Program, CompileError> {
        for violation in validate(graph) {
            warn!(%violation, "graph failed upstream validation");
        }
        let image = ImageBuilder::new(graph, self.image.clone()).build()?;
        worlds_emit::emit(graph, &image, &self.emit)
    }

    /// Compile `graph` and render the program as module text.
    pub fn compile_to_wat(&self, graph: &Graph) -> Result<String, CompileError> {
        let program = self.compile(graph)?;
        Ok(worlds_emit::render(&program, &self.emit))
    }
}

/// Compile `graph` with default settings.
pub fn compile(graph: &Graph) -> Result<Program, CompileError> {
    Compiler::new().compile(graph)
}

/// Common imports for typical Worlds usage.
///
/// ```rust
/// use worlds::prelude::*;
/// ```
pub mod prelude {
    // Graph model
    pub use worlds_core::{
        AnimalRef, Graph, GraphBuilder, InstanceRef, Offset, RecordKind, WorldRef,
    };

    // Errors and validation
    pub use worlds_core::{validate, CompileError, Violation};

    // Image
    pub use worlds_image::{ImageBuilder, ImageConfig, ImageView, MemoryImage};

    // Emission
    pub use worlds_emit::{EmitConfig, Machine, Narration, NarrationSink, Program};

    pub use crate::{compile, Compiler};
}
