//! # Record Layer
//!
//! Typed access to table rows: `field` defines the column type system and
//! per-kind value decoders, `stream` lays records out and reads them by
//! position.

mod field;
mod stream;

pub use field::{
    kind, BlobRef, DateTimeValue, FieldParams, FieldType, FieldValue, Kind, VersionStamp,
};
pub use stream::RecordStream;
