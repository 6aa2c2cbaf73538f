//! # Storage Layer
//!
//! Everything between the raw file and typed records:
//!
//! - `file`: positioned read-only file access
//! - `headers`: zerocopy views of the packed on-disk structures
//! - `cache`: the page cache with 2Q replacement
//! - `object`: logical byte streams over scattered pages
//! - `blob`: linked-block variable-length values, DEFLATE, UTF-8 text
//!
//! The layering is strict: objects read through the page cache, blobs read
//! through an object, and nothing above this module touches the file.
//!
//! ## Ownership
//!
//! The [`PageCache`] owns the file handle and all cache memory for its
//! lifetime and is shared by reference counting; the crate is
//! single-threaded, so `Rc` stands where a concurrent engine would put
//! `Arc`. An [`ObjectStream`] owns only its parsed header page, a
//! [`BlobReader`] owns its stream.

mod blob;
mod cache;
mod file;
mod headers;
mod object;

pub(crate) use headers::parse_prefix;

pub use blob::{decompress, utf8_text, BlobReader};
pub use cache::{PageCache, PageView};
pub use file::FileReader;
pub use headers::{BlobBlock, DbHeader, FormatVersion, ObjectHeader82, ObjectHeader83, RootHeader};
pub use object::ObjectStream;
