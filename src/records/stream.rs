//! # Record Streams
//!
//! A table's rows live in one object as an array of fixed-size records.
//! The record layout is computed once from the column declarations: byte 0
//! is the deletion flag, then each column at a fixed shift: one presence
//! byte first when the column is nullable, then the value bytes sized per
//! [`FieldType::on_disk_size`](super::field::FieldType::on_disk_size).
//! A record is never narrower than a free-list link (flag plus `u32`), so
//! the stride is padded up to that minimum.
//!
//! [`RecordStream::seek`] loads one record into a reusable row buffer;
//! repeated seeks to the same index are free. Field access decodes out of
//! that buffer, checking the requested kind against the column's declared
//! kind. Deleted records keep only their flag; reading fields from one is
//! a caller bug, guarded by a debug assertion.

use std::rc::Rc;

use eyre::{ensure, Result};
use hashbrown::HashMap;
use smallvec::SmallVec;

use super::field::{FieldParams, FieldValue, Kind};
use crate::config::MIN_RECORD_SIZE;
use crate::storage::{ObjectStream, PageCache};

#[derive(Debug)]
struct FieldSlot {
    params: FieldParams,
    shift: usize,
    size: usize,
}

type Slots = SmallVec<[FieldSlot; 8]>;

/// Computes per-column shifts and the padded record stride.
fn prepare_fields(columns: &[FieldParams]) -> Result<(Slots, HashMap<String, u32>, usize)> {
    ensure!(
        columns.len() <= u32::MAX as usize,
        "table declares too many columns"
    );

    let mut slots = Slots::new();
    let mut names = HashMap::with_capacity(columns.len());
    let mut shift = 1usize; // byte 0 is the deletion flag

    for (index, params) in columns.iter().enumerate() {
        let size = usize::from(params.nullable) + params.ftype.on_disk_size(params.length);
        slots.push(FieldSlot {
            params: params.clone(),
            shift,
            size,
        });
        names.insert(params.name.clone(), index as u32);
        shift += size;
    }

    Ok((slots, names, shift.max(MIN_RECORD_SIZE)))
}

/// Positional reader over one table's records object.
#[derive(Debug)]
pub struct RecordStream {
    object: ObjectStream,
    slots: Slots,
    names: HashMap<String, u32>,
    row: Vec<u8>,
    count: u32,
    last: Option<u32>,
}

impl RecordStream {
    /// Opens the records object at page `index` with the table's declared
    /// columns.
    pub fn open(cache: Rc<PageCache>, index: u32, columns: &[FieldParams]) -> Result<Self> {
        let (slots, names, stride) = prepare_fields(columns)?;
        let object = ObjectStream::open(cache, index)?;

        let object_size = object.size();
        let count = object_size / stride as u64;
        ensure!(
            object_size % stride as u64 == 0 && count <= u64::from(u32::MAX),
            "records object size {object_size} is not a whole number of {stride}-byte records"
        );

        Ok(Self {
            object,
            slots,
            names,
            row: vec![0u8; stride],
            count: count as u32,
            last: None,
        })
    }

    /// Records in the table, deleted ones included.
    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes one record occupies, padding included.
    pub fn stride(&self) -> usize {
        self.row.len()
    }

    /// Resolves a column name to its positional index.
    pub fn field_index(&self, name: &str) -> Result<u32> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("table has no field named '{name}'"))
    }

    /// Loads record `index` into the row buffer.
    ///
    /// On failure the buffer contents are unspecified and the stream
    /// reports no current record until a later seek succeeds.
    pub fn seek(&mut self, index: u32) -> Result<()> {
        ensure!(
            index < self.count,
            "record {index} out of range, table holds {}",
            self.count
        );
        if self.last == Some(index) {
            return Ok(());
        }

        self.last = None;
        let pos = self.row.len() as u64 * u64::from(index);
        self.object.read(&mut self.row, pos)?;
        self.last = Some(index);
        Ok(())
    }

    /// Whether the current record carries the deletion flag.
    pub fn is_deleted(&self) -> Result<bool> {
        self.ensure_seeked()?;
        Ok(self.row[0] == 1)
    }

    /// Typed field access: `T` names the column kind the caller expects,
    /// checked against the declaration. `None` means the column is
    /// nullable and this record holds no value.
    pub fn get_field<T: Kind>(&self, index: u32) -> Result<Option<T::Value>> {
        self.ensure_seeked()?;
        let slot = self.slot(index)?;
        ensure!(
            slot.params.ftype == T::TYPE,
            "field '{}' is declared {:?}, requested as {:?}",
            slot.params.name,
            slot.params.ftype,
            T::TYPE
        );
        match self.value_bytes(slot) {
            None => Ok(None),
            Some(bytes) => T::decode(&slot.params, bytes).map(Some),
        }
    }

    /// Untyped field access at the column's declared kind.
    pub fn field(&self, index: u32) -> Result<Option<FieldValue>> {
        self.ensure_seeked()?;
        let slot = self.slot(index)?;
        match self.value_bytes(slot) {
            None => Ok(None),
            Some(bytes) => FieldValue::decode(&slot.params, bytes).map(Some),
        }
    }

    fn ensure_seeked(&self) -> Result<()> {
        ensure!(
            self.last.is_some(),
            "record accessed before a successful seek"
        );
        Ok(())
    }

    fn slot(&self, index: u32) -> Result<&FieldSlot> {
        self.slots
            .get(index as usize)
            .ok_or_else(|| eyre::eyre!("field index {index} out of range"))
    }

    /// Value bytes of a field in the current record, presence byte
    /// consumed; `None` when a nullable field is absent.
    fn value_bytes(&self, slot: &FieldSlot) -> Option<&[u8]> {
        debug_assert!(self.row[0] != 1, "field access on a deleted record");

        let bytes = &self.row[slot.shift..slot.shift + slot.size];
        if slot.params.nullable {
            let (&presence, value) = bytes.split_first().expect("presence byte is part of size");
            if presence == 0 {
                return None;
            }
            return Some(value);
        }
        Some(bytes)
    }
}
