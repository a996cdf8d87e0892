//! Name → offset tables, one per record category.

use indexmap::IndexMap;
use indexmap::map::Entry;
use worlds_core::{CompileError, Offset, RecordKind};

/// Maps record names to their starting offset in the image.
///
/// Iteration order is insertion order, which is declaration order because
/// the allocator inserts while walking each category front to back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetTable {
    kind: RecordKind,
    entries: IndexMap<String, Offset>,
}

impl OffsetTable {
    /// Create an empty table for `kind`.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Create an empty table with room for `n` entries.
    pub fn with_capacity(kind: RecordKind, n: usize) -> Self {
        Self {
            kind,
            entries: IndexMap::with_capacity(n),
        }
    }

    /// The category this table indexes.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Record `name` at `offset`.
    ///
    /// # Errors
    ///
    /// [`CompileError::DuplicateName`] if `name` is already in the table.
    /// The earlier entry is left as it was.
    pub fn insert(&mut self, name: &str, offset: Offset) -> Result<(), CompileError> {
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(CompileError::DuplicateName {
                record: self.kind,
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(offset);
                Ok(())
            }
        }
    }

    /// Look up the offset of `name`.
    pub fn get(&self, name: &str) -> Option<Offset> {
        self.entries.get(name).copied()
    }

    /// Offset of the record declared at position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&str, Offset)> {
        self.entries
            .get_index(index)
            .map(|(name, &off)| (name.as_str(), off))
    }

    /// Iterate `(name, offset)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Offset)> + '_ {
        self.entries.iter().map(|(name, &off)| (name.as_str(), off))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_declaration_order() {
        let mut t = OffsetTable::new(RecordKind::Animal);
        t.insert("zebra", Offset(0)).unwrap();
        t.insert("ant", Offset(20)).unwrap();
        let names: Vec<_> = t.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zebra", "ant"]);
        assert_eq!(t.get_index(1), Some(("ant", Offset(20))));
        assert_eq!(t.get("ant"), Some(Offset(20)));
        assert_eq!(t.get("cat"), None);
    }

    #[test]
    fn repeated_name_is_rejected_and_keeps_first() {
        let mut t = OffsetTable::new(RecordKind::Animal);
        t.insert("cat", Offset(0)).unwrap();
        assert_eq!(
            t.insert("cat", Offset(21)),
            Err(CompileError::DuplicateName {
                record: RecordKind::Animal,
                name: "cat".into(),
            })
        );
        assert_eq!(t.get("cat"), Some(Offset(0)));
        assert_eq!(t.len(), 1);
    }
}
