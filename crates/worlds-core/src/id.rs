//! Strongly-typed record references and the [`Offset`] newtype.

use std::fmt;

/// A byte offset into the memory image.
///
/// Offsets are 32-bit because the image is addressed by 32-bit loads and
/// stores. [`Offset::UNSET`] marks a slot that has not been assigned yet;
/// zero is a valid offset (the first animal record lives there).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset(pub u32);

impl Offset {
    /// Sentinel stored in a world-reference slot that no world claimed.
    pub const UNSET: Offset = Offset(u32::MAX);

    /// The raw offset value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The offset as a `usize` index into a byte buffer.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the [`Offset::UNSET`] sentinel.
    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }

    /// Add a relative displacement, returning `None` on overflow.
    pub fn checked_add(self, rel: u32) -> Option<Offset> {
        self.0.checked_add(rel).map(Offset)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            write!(f, "<unset>")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

impl From<u32> for Offset {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Reference to an [`Animal`](crate::Animal) by declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimalRef(pub u32);

/// Reference to an [`Instance`](crate::Instance) by declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceRef(pub u32);

/// Reference to a [`World`](crate::World) by declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldRef(pub u32);

macro_rules! record_ref {
    ($ty:ident, $label:literal) => {
        impl $ty {
            /// Declaration index of the referenced record.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " #{}"), self.0)
            }
        }

        impl From<u32> for $ty {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

record_ref!(AnimalRef, "animal");
record_ref!(InstanceRef, "instance");
record_ref!(WorldRef, "world");

/// The three record categories, in layout order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// An animal species: gene, name, sound.
    Animal,
    /// A named instance of a species, with a patched world-reference slot.
    Instance,
    /// A world and the instances it initially contains.
    World,
}

impl RecordKind {
    /// All kinds in the fixed pass order used by the layout allocator.
    pub const PASS_ORDER: [RecordKind; 3] =
        [RecordKind::Animal, RecordKind::Instance, RecordKind::World];
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Animal => write!(f, "animal"),
            Self::Instance => write!(f, "instance"),
            Self::World => write!(f, "world"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_not_zero() {
        assert!(Offset::UNSET.is_unset());
        assert!(!Offset(0).is_unset());
    }

    #[test]
    fn checked_add_overflows_to_none() {
        assert_eq!(Offset(10).checked_add(4), Some(Offset(14)));
        assert_eq!(Offset(u32::MAX - 1).checked_add(2), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Offset(16).to_string(), "0x10");
        assert_eq!(Offset::UNSET.to_string(), "<unset>");
        assert_eq!(InstanceRef(3).to_string(), "instance #3");
        assert_eq!(RecordKind::World.to_string(), "world");
    }
}
