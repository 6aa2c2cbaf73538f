//! # onecd: 1C:Enterprise 8 Database Reader
//!
//! A read-only, low-level decoder for the `1CDBMSV8` on-disk database
//! format (versions 8.2.14 and 8.3.8). Given a path to a database file it
//! exposes the table catalog, per-table column metadata, and typed per-row
//! field values: enough to extract or inspect data without the vendor
//! runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │        Database (public facade)       │
//! ├───────────────────┬───────────────────┤
//! │    RootCatalog    │   RecordStream    │
//! ├───────────────────┴───────────────────┤
//! │       BlobReader (linked blocks)      │
//! ├───────────────────────────────────────┤
//! │   ObjectStream (placement tables)     │
//! ├───────────────────────────────────────┤
//! │       PageCache (2Q replacement)      │
//! ├───────────────────────────────────────┤
//! │      FileReader (positioned I/O)      │
//! └───────────────────────────────────────┘
//! ```
//!
//! The file is an array of fixed-size pages; page 0 holds the header.
//! Logical byte streams ("objects") are reassembled from scattered pages
//! through placement tables whose shape depends on the format version.
//! Variable-length values live in blob objects as chains of 256-byte
//! blocks. The root catalog is itself a blob holding one brace-group text
//! descriptor per table, and each table's rows are fixed-stride records in
//! the object its descriptor names.
//!
//! ## Quick Start
//!
//! ```ignore
//! use onecd::{kind, Database};
//!
//! let db = Database::open("./base.1cd")?;
//! let table = db.table(0)?;
//! let mut rows = db.records(&table)?;
//!
//! let id = rows.field_index("ID")?;
//! for row in 0..rows.len() {
//!     rows.seek(row)?;
//!     if rows.is_deleted()? {
//!         continue;
//!     }
//!     println!("{:?}", rows.get_field::<kind::Digit>(id)?);
//! }
//! ```
//!
//! ## Scope
//!
//! Strictly read-only and single-threaded. Deleted records report only
//! their flag; record-lock and index streams are recognized in the
//! catalog but not interpreted.

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod records;
pub mod storage;

pub use catalog::{RootCatalog, TableParams};
pub use database::{Database, DatabaseBuilder};
pub use error::OpenError;
pub use records::{
    kind, BlobRef, DateTimeValue, FieldParams, FieldType, FieldValue, Kind, RecordStream,
    VersionStamp,
};
pub use storage::{BlobReader, FormatVersion, ObjectStream, PageCache};
