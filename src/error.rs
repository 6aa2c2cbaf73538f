//! # Error Taxonomy
//!
//! Opening a database distinguishes three failure classes so callers can
//! tell a broken path from a broken file: the filesystem refused, the bytes
//! are not a 1CDBMSV8 database, or the format version is unknown to this
//! crate. Everything past a successful open reports through [`eyre::Report`]
//! with a message describing the violated format invariant.
//!
//! Contract violations (reading a field of a deleted record, holding a page
//! view across the next cache call) are debug assertions, not errors.

use thiserror::Error;

/// Why a database file could not be opened.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The operating system refused an open or read.
    #[error("file system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// Signature, page size, or page count do not describe a valid database.
    #[error("wrong file format: {0}")]
    BadFile(&'static str),

    /// The header carries a version this crate does not decode.
    #[error("unsupported database format version {0:#010x}")]
    UnsupportedVersion(u32),
}
