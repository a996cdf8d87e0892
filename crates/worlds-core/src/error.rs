//! Error types for the Worlds compiler core.
//!
//! Every error aborts the current compilation run. Nothing is retried and
//! nothing is partially emitted; the caller decides how to present the
//! failure.

use std::error::Error;
use std::fmt;

use crate::id::RecordKind;

/// Errors raised while laying out the memory image or emitting code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    /// A reference in the graph does not resolve: either the typed index is
    /// out of range, or the target has no entry in its offset table.
    ReferenceResolution {
        /// Category of the record holding the reference.
        record: RecordKind,
        /// Name of the record holding the reference (or its position, for
        /// transfers, which are unnamed).
        name: String,
        /// The referencing field (`"species"`, `"contains"`, `"to"`, ...).
        field: &'static str,
        /// Description of the unresolved target.
        target: String,
    },
    /// A narration address chain cannot be computed because a slot it
    /// depends on is unset or points outside the image.
    Dereference {
        /// Name of the instance being narrated.
        instance: String,
        /// Which link of the chain failed.
        step: &'static str,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The image needs more bytes than the configured memory bound.
    LayoutOverflow {
        /// Bytes required by the layout.
        required: u64,
        /// Configured maximum.
        limit: u64,
    },
    /// A string field contains a character with no one-byte encoding.
    UnencodableString {
        /// Category of the offending record.
        record: RecordKind,
        /// Name of the offending record.
        name: String,
        /// The string field.
        field: &'static str,
        /// The first character outside U+0000..=U+00FF.
        ch: char,
    },
    /// Two records of one category share a name, so the name-keyed offset
    /// table cannot address both.
    DuplicateName {
        /// Category of the clashing records.
        record: RecordKind,
        /// The shared name.
        name: String,
    },
    /// An instance is listed by two worlds and strict placement is on.
    DuplicatePlacement {
        /// The doubly-placed instance.
        instance: String,
        /// The world that placed it first.
        first: String,
        /// The world that tried to place it again.
        second: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferenceResolution {
                record,
                name,
                field,
                target,
            } => {
                write!(
                    f,
                    "unresolved reference: {record} '{name}' field '{field}' points at {target}"
                )
            }
            Self::Dereference {
                instance,
                step,
                detail,
            } => {
                write!(
                    f,
                    "cannot narrate instance '{instance}': {step} failed: {detail}"
                )
            }
            Self::LayoutOverflow { required, limit } => {
                write!(
                    f,
                    "memory image overflow: requires {required} bytes, limit is {limit} bytes"
                )
            }
            Self::UnencodableString {
                record,
                name,
                field,
                ch,
            } => {
                write!(
                    f,
                    "{record} '{name}' field '{field}' contains {ch:?} (U+{:04X}), \
                     which has no single-byte encoding",
                    *ch as u32
                )
            }
            Self::DuplicateName { record, name } => {
                write!(f, "duplicate {record} name '{name}'")
            }
            Self::DuplicatePlacement {
                instance,
                first,
                second,
            } => {
                write!(
                    f,
                    "instance '{instance}' placed in world '{first}' and again in '{second}'"
                )
            }
        }
    }
}

impl Error for CompileError {}
