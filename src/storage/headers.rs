//! # On-Disk Header Definitions
//!
//! Zerocopy views of the packed structures the format lays down on disk:
//! the database header on page 0, the two object header flavors, one blob
//! chain block, and the root catalog header.
//!
//! All multi-byte fields are little-endian. Every struct derives the
//! zerocopy marker traits (`FromBytes`, `Immutable`, `KnownLayout`,
//! `Unaligned`) so a reference can be taken straight over a page buffer
//! without copying, and each has a compile-time size pin next to it.
//!
//! ## Database header (page 0)
//!
//! ```text
//! Offset  Size  Description
//! 0       8     Signature "1CDBMSV8"
//! 8       4     Version (0x000E0208 = 8.2.14, 0x00080308 = 8.3.8)
//! 12      4     Total page count
//! 16      4     Reserved
//! 20      4     Page size in bytes (8.3.8 only; 8.2.14 implies 4096)
//! ```
//!
//! ## Object headers
//!
//! A version 8.3.8 stream starts with a 24-byte tagged header followed by
//! `u32` page indices to the end of the page; `pmt_type` selects whether
//! those indices point at data pages directly or at placement pages. The
//! 8.2.14 flavor replaces the tag with a signature and a 32-bit length,
//! and is always single-level.

use eyre::Result;
use zerocopy::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::config::{
    ALLOWED_PAGE_SIZES, BLOB_BLOCK_SIZE, BLOB_DATA_SIZE, DB_HEADER_SIZE, DB_SIGNATURE,
    OBJECT_HEADER_SIZE, OBJECT_SIGNATURE_8_2, OBJECT_TYPE_8_3, PAGE_SIZE_8_2, ROOT_HEADER_SIZE,
    VERSION_8_2_14, VERSION_8_3_8,
};
use crate::error::OpenError;

/// Parses a zerocopy struct from the front of a byte slice.
#[inline]
pub(crate) fn parse_prefix<'a, T: FromBytes + KnownLayout + Immutable + Unaligned>(
    bytes: &'a [u8],
    type_name: &str,
) -> Result<&'a T> {
    let size = std::mem::size_of::<T>();
    eyre::ensure!(
        bytes.len() >= size,
        "buffer too small for {}: {} < {}",
        type_name,
        bytes.len(),
        size
    );
    T::ref_from_bytes(&bytes[..size])
        .map_err(|e| eyre::eyre!("failed to parse {}: {:?}", type_name, e))
}

/// Format versions this crate decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    V8_2_14,
    V8_3_8,
}

impl FormatVersion {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            VERSION_8_2_14 => Some(Self::V8_2_14),
            VERSION_8_3_8 => Some(Self::V8_3_8),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::V8_2_14 => VERSION_8_2_14,
            Self::V8_3_8 => VERSION_8_3_8,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct DbHeader {
    signature: [u8; 8],
    version: U32,
    length: U32,
    reserved: U32,
    page_size: U32,
}

const _: () = assert!(std::mem::size_of::<DbHeader>() == DB_HEADER_SIZE);

impl DbHeader {
    /// Validates the raw header against a known file size and resolves the
    /// effective page size for the detected version.
    pub fn validate(bytes: &[u8], file_size: u64) -> Result<(FormatVersion, u32, usize), OpenError> {
        let header = Self::ref_from_bytes(bytes)
            .map_err(|_| OpenError::BadFile("truncated database header"))?;

        if &header.signature != DB_SIGNATURE {
            return Err(OpenError::BadFile("missing 1CDBMSV8 signature"));
        }

        let version = FormatVersion::from_raw(header.version.get())
            .ok_or(OpenError::UnsupportedVersion(header.version.get()))?;

        let page_size = match version {
            FormatVersion::V8_2_14 => PAGE_SIZE_8_2,
            FormatVersion::V8_3_8 => {
                let declared = header.page_size.get() as usize;
                if !ALLOWED_PAGE_SIZES.contains(&declared) {
                    return Err(OpenError::BadFile("page size outside the allowed set"));
                }
                declared
            }
        };

        let length = header.length.get();
        if length == 0
            || file_size % page_size as u64 != 0
            || file_size / page_size as u64 != u64::from(length)
        {
            return Err(OpenError::BadFile("file size does not match page count"));
        }

        Ok((version, length, page_size))
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct ObjectHeader83 {
    object_type: U16,
    pmt_type: U16,
    reserved: [U32; 3],
    length: U64,
}

const _: () = assert!(std::mem::size_of::<ObjectHeader83>() == OBJECT_HEADER_SIZE);

impl ObjectHeader83 {
    pub fn parse(page: &[u8]) -> Result<&Self> {
        let header: &Self = parse_prefix(page, "object header")?;
        eyre::ensure!(
            header.object_type.get() == OBJECT_TYPE_8_3,
            "invalid object type {:#06x}",
            header.object_type.get()
        );
        eyre::ensure!(
            header.pmt_type.get() <= 1,
            "invalid placement table type {}",
            header.pmt_type.get()
        );
        Ok(header)
    }

    pub fn two_level(&self) -> bool {
        self.pmt_type.get() == 1
    }

    pub fn length(&self) -> u64 {
        self.length.get()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct ObjectHeader82 {
    signature: [u8; 8],
    length: U32,
    reserved: [U32; 3],
}

const _: () = assert!(std::mem::size_of::<ObjectHeader82>() == OBJECT_HEADER_SIZE);

impl ObjectHeader82 {
    pub fn parse(page: &[u8]) -> Result<&Self> {
        let header: &Self = parse_prefix(page, "object header")?;
        eyre::ensure!(
            &header.signature == OBJECT_SIGNATURE_8_2,
            "invalid object signature"
        );
        Ok(header)
    }

    pub fn length(&self) -> u64 {
        u64::from(self.length.get())
    }
}

/// One link of a blob chain: index of the next block, used byte count, data.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct BlobBlock {
    next: U32,
    length: U16,
    data: [u8; BLOB_DATA_SIZE],
}

const _: () = assert!(std::mem::size_of::<BlobBlock>() == BLOB_BLOCK_SIZE);

impl BlobBlock {
    pub fn next(&self) -> u32 {
        self.next.get()
    }

    pub fn length(&self) -> usize {
        usize::from(self.length.get())
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.length().min(BLOB_DATA_SIZE)]
    }
}

/// Fixed prefix of the root catalog blob; table indices follow.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct RootHeader {
    lang: [u8; 32],
    numtables: U32,
}

const _: () = assert!(std::mem::size_of::<RootHeader>() == ROOT_HEADER_SIZE);

impl RootHeader {
    pub fn parse(bytes: &[u8]) -> Result<&Self> {
        parse_prefix(bytes, "root catalog header")
    }

    /// Language label, for example `ru_RU`, with NUL padding stripped.
    pub fn lang(&self) -> String {
        let end = self.lang.iter().position(|&b| b == 0).unwrap_or(32);
        String::from_utf8_lossy(&self.lang[..end]).into_owned()
    }

    pub fn table_count(&self) -> u32 {
        self.numtables.get()
    }
}
