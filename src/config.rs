//! # Format Constants
//!
//! Centralizes the fixed numbers of the 1CDBMSV8 file format. Constants that
//! depend on each other are co-located so a change in one is visible next to
//! the values it constrains.
//!
//! ```text
//! DB_HEADER_SIZE (24)
//!       └─> page 0 layout: signature + version + length + reserved + page size
//!
//! OBJECT_HEADER_SIZE (24)
//!       ├─> entries per header page: (page_size - 24) / 4
//!       └─> entries per placement page: page_size / 4
//!
//! BLOB_BLOCK_SIZE (256)
//!       └─> BLOB_DATA_SIZE (250) = 256 - 4 (next) - 2 (length)
//! ```

/// Magic string at offset 0 of every database file.
pub const DB_SIGNATURE: &[u8; 8] = b"1CDBMSV8";

/// Format version 8.2.14.0 as stored in the database header.
pub const VERSION_8_2_14: u32 = 0x000E_0208;

/// Format version 8.3.8.0 as stored in the database header.
pub const VERSION_8_3_8: u32 = 0x0008_0308;

/// Size of the packed database header at the start of page 0.
pub const DB_HEADER_SIZE: usize = 24;

/// Version 8.2.14 files always use 4 KiB pages; the header value is ignored.
pub const PAGE_SIZE_8_2: usize = 4096;

/// Page sizes a version 8.3.8 header may declare.
pub const ALLOWED_PAGE_SIZES: [usize; 5] = [4096, 8192, 16384, 32768, 65536];

/// Magic string at the start of a version 8.2.14 object header page.
pub const OBJECT_SIGNATURE_8_2: &[u8; 8] = b"1CDBOBV8";

/// Type tag at the start of a version 8.3.8 object header page.
pub const OBJECT_TYPE_8_3: u16 = 0xFD1C;

/// Packed size of an object header; page indices follow to the end of the page.
pub const OBJECT_HEADER_SIZE: usize = 24;

/// One link in a blob chain: next (u32) + length (u16) + data.
pub const BLOB_BLOCK_SIZE: usize = 256;

/// Payload bytes carried by one blob block.
pub const BLOB_DATA_SIZE: usize = 250;

/// Page index of the object holding the root catalog.
pub const ROOT_OBJECT_PAGE: u32 = 2;

/// Packed size of the root catalog header: lang[32] + table count.
pub const ROOT_HEADER_SIZE: usize = 36;

/// A record is never smaller than a free-list link: deletion flag + u32.
pub const MIN_RECORD_SIZE: usize = 1 + std::mem::size_of::<u32>();

/// Resident pages kept by a [`crate::PageCache`] unless overridden.
pub const DEFAULT_PAGE_CACHE_SIZE: usize = 8;
