//! Layout allocation: one running cursor over the whole image.
//!
//! The cursor is an explicit accumulator threaded through three category
//! passes in the fixed order animals → instances → worlds. Each pass
//! encodes its records in declaration order against the tables completed
//! by earlier passes, records the cursor as the record's offset, and
//! advances the cursor by the encoded length. Forward references across
//! categories are therefore impossible by construction.

use tracing::debug;
use worlds_core::{CompileError, Graph, Offset, RecordKind};

use crate::config::ImageConfig;
use crate::record::{encode_animal, encode_instance, encode_world, EncodedRecord};
use crate::table::OffsetTable;

/// A record paired with the offset the allocator assigned to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedRecord {
    /// Declaration index within its category.
    pub index: usize,
    /// Assigned starting offset.
    pub offset: Offset,
    /// The encoded record.
    pub record: EncodedRecord,
}

/// Output of [`allocate`]: offset tables, placed records, and total size.
#[derive(Clone, Debug)]
pub struct Layout {
    /// Animal name → offset.
    pub animals: OffsetTable,
    /// Instance name → offset.
    pub instances: OffsetTable,
    /// World name → offset.
    pub worlds: OffsetTable,
    /// Every record in layout order.
    pub records: Vec<PlacedRecord>,
    /// Total image size in bytes (the final cursor value).
    pub total: u32,
}

/// Assign an offset to every record of `graph`.
///
/// # Errors
///
/// - [`CompileError::ReferenceResolution`] if a species or contains
///   reference does not resolve.
/// - [`CompileError::DuplicateName`] if two records of one category share
///   a name.
/// - [`CompileError::UnencodableString`] if a string has a character with
///   no one-byte encoding.
/// - [`CompileError::LayoutOverflow`] if the image would exceed
///   [`ImageConfig::effective_limit`].
pub fn allocate(graph: &Graph, config: &ImageConfig) -> Result<Layout, CompileError> {
    let limit = config.effective_limit();
    let mut records = Vec::with_capacity(graph.record_count());

    let (animals, cursor) = pass(
        RecordKind::Animal,
        &graph.animals,
        |a| a.name.as_str(),
        encode_animal,
        0,
        limit,
        &mut records,
    )?;
    let (instances, cursor) = pass(
        RecordKind::Instance,
        &graph.instances,
        |i| i.name.as_str(),
        |i| encode_instance(graph, i, &animals),
        cursor,
        limit,
        &mut records,
    )?;
    let (worlds, cursor) = pass(
        RecordKind::World,
        &graph.worlds,
        |w| w.name.as_str(),
        |w| encode_world(graph, w, &instances),
        cursor,
        limit,
        &mut records,
    )?;

    Ok(Layout {
        animals,
        instances,
        worlds,
        records,
        total: cursor as u32,
    })
}

/// Encode one category, returning its table and the advanced cursor.
fn pass<T>(
    kind: RecordKind,
    items: &[T],
    name_of: impl Fn(&T) -> &str,
    encode: impl Fn(&T) -> Result<EncodedRecord, CompileError>,
    cursor: u64,
    limit: u64,
    out: &mut Vec<PlacedRecord>,
) -> Result<(OffsetTable, u64), CompileError> {
    let mut table = OffsetTable::with_capacity(kind, items.len());
    let end = items
        .iter()
        .enumerate()
        .try_fold(cursor, |cursor, (index, item)| {
            let record = encode(item)?;
            let next = cursor + u64::from(record.len());
            if next > limit {
                return Err(CompileError::LayoutOverflow {
                    required: next,
                    limit,
                });
            }
            let offset = Offset(cursor as u32);
            debug!(
                kind = %kind,
                name = name_of(item),
                offset = offset.get(),
                len = record.len(),
                "allocated record"
            );
            table.insert(name_of(item), offset)?;
            out.push(PlacedRecord {
                index,
                offset,
                record,
            });
            Ok(next)
        })?;
    Ok((table, end))
}
