//! # Field Types and Decoders
//!
//! The type system for table columns: each column declares one of nine
//! on-disk kinds, and every kind occupies a fixed number of bytes computed
//! from the declared length. A decoded field is a [`FieldValue`] with one
//! constructor per kind, or `None` when a nullable column's presence byte
//! is clear.
//!
//! | Code | Kind | On-disk size (bytes) |
//! |------|------|----------------------|
//! | B    | binary | `length` |
//! | L    | boolean | 1 |
//! | N    | digit (packed BCD, kept raw) | `(length + 2) / 2` |
//! | NC   | fixed UTF-16LE string | `length * 2` |
//! | NVC  | variable UTF-16LE string | `length * 2 + 2` |
//! | RV   | version stamp | 16 |
//! | NT   | text blob reference | 8 |
//! | I    | binary blob reference | 8 |
//! | DT   | date-time | 7 |
//!
//! Blob references are returned raw; materializing them is the consumer's
//! call, through the table's [`crate::BlobReader`].
//!
//! Typed access goes through the sealed [`Kind`] markers: a
//! `get_field::<kind::VarStr>` call names the variant it expects, and the
//! record stream checks that against the column's declared kind before
//! decoding.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::storage::parse_prefix;

/// On-disk kind of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Binary,
    Boolean,
    Digit,
    FixedStr,
    VarStr,
    Version,
    TextBlob,
    BinaryBlob,
    DateTime,
}

impl FieldType {
    /// Maps a descriptor type code.
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "B" => Self::Binary,
            "L" => Self::Boolean,
            "N" => Self::Digit,
            "NC" => Self::FixedStr,
            "NVC" => Self::VarStr,
            "RV" => Self::Version,
            "NT" => Self::TextBlob,
            "I" => Self::BinaryBlob,
            "DT" => Self::DateTime,
            _ => return None,
        })
    }

    /// Bytes the value occupies in a record, before the presence byte.
    pub fn on_disk_size(self, length: usize) -> usize {
        match self {
            Self::Binary => length,
            Self::Boolean => 1,
            Self::Digit => (length + 2) / 2,
            Self::FixedStr => length * 2,
            Self::VarStr => length * 2 + 2,
            Self::Version => 16,
            Self::TextBlob | Self::BinaryBlob => 8,
            Self::DateTime => 7,
        }
    }
}

/// Declared parameters of one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParams {
    pub name: String,
    pub ftype: FieldType,
    pub nullable: bool,
    pub length: usize,
    pub precision: usize,
    pub case_sensitive: bool,
}

/// Four-part row version stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionStamp {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
    pub v4: u32,
}

/// Reference into a table's blob object; index 0 means "no value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobRef {
    pub index: u32,
    pub size: u32,
}

impl BlobRef {
    pub fn is_empty(&self) -> bool {
        self.index == 0
    }
}

/// Calendar date-time down to seconds, exactly as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeValue {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// One decoded field, tagged by its column kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Binary(Vec<u8>),
    Boolean(bool),
    /// Packed BCD bytes, not numerically interpreted.
    Digit(Vec<u8>),
    FixedStr(String),
    VarStr(String),
    Version(VersionStamp),
    TextBlob(BlobRef),
    BinaryBlob(BlobRef),
    DateTime(DateTimeValue),
}

impl FieldValue {
    /// Decodes the value bytes of a field at its declared kind.
    pub fn decode(params: &FieldParams, bytes: &[u8]) -> Result<Self> {
        Ok(match params.ftype {
            FieldType::Binary => Self::Binary(kind::Binary::decode(params, bytes)?),
            FieldType::Boolean => Self::Boolean(kind::Boolean::decode(params, bytes)?),
            FieldType::Digit => Self::Digit(kind::Digit::decode(params, bytes)?),
            FieldType::FixedStr => Self::FixedStr(kind::FixedStr::decode(params, bytes)?),
            FieldType::VarStr => Self::VarStr(kind::VarStr::decode(params, bytes)?),
            FieldType::Version => Self::Version(kind::Version::decode(params, bytes)?),
            FieldType::TextBlob => Self::TextBlob(kind::TextBlob::decode(params, bytes)?),
            FieldType::BinaryBlob => Self::BinaryBlob(kind::BinaryBlob::decode(params, bytes)?),
            FieldType::DateTime => Self::DateTime(kind::DateTime::decode(params, bytes)?),
        })
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Binary(_) => FieldType::Binary,
            Self::Boolean(_) => FieldType::Boolean,
            Self::Digit(_) => FieldType::Digit,
            Self::FixedStr(_) => FieldType::FixedStr,
            Self::VarStr(_) => FieldType::VarStr,
            Self::Version(_) => FieldType::Version,
            Self::TextBlob(_) => FieldType::TextBlob,
            Self::BinaryBlob(_) => FieldType::BinaryBlob,
            Self::DateTime(_) => FieldType::DateTime,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A column kind usable as a typed projection in
/// [`crate::RecordStream::get_field`].
pub trait Kind: sealed::Sealed {
    type Value;
    const TYPE: FieldType;

    /// Decodes the value bytes (presence byte already consumed).
    fn decode(params: &FieldParams, bytes: &[u8]) -> Result<Self::Value>;
}

fn check_width(params: &FieldParams, bytes: &[u8], ftype: FieldType) -> Result<()> {
    let want = ftype.on_disk_size(params.length);
    ensure!(
        bytes.len() == want,
        "field '{}' occupies {} bytes, declared size is {}",
        params.name,
        bytes.len(),
        want
    );
    Ok(())
}

fn utf16_string(params: &FieldParams, bytes: &[u8]) -> Result<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| {
        eyre::eyre!("field '{}' holds malformed UTF-16 text: {e}", params.name)
    })
}

#[repr(C)]
#[derive(FromBytes, Immutable, KnownLayout, Unaligned)]
struct VersionWire {
    v1: U32,
    v2: U32,
    v3: U32,
    v4: U32,
}

#[repr(C)]
#[derive(FromBytes, Immutable, KnownLayout, Unaligned)]
struct BlobRefWire {
    index: U32,
    size: U32,
}

#[repr(C)]
#[derive(FromBytes, Immutable, KnownLayout, Unaligned)]
struct DateTimeWire {
    year: U16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

const _: () = assert!(std::mem::size_of::<VersionWire>() == 16);
const _: () = assert!(std::mem::size_of::<BlobRefWire>() == 8);
const _: () = assert!(std::mem::size_of::<DateTimeWire>() == 7);

/// Kind markers for typed field access.
pub mod kind {
    use super::*;

    pub struct Binary;
    pub struct Boolean;
    pub struct Digit;
    pub struct FixedStr;
    pub struct VarStr;
    pub struct Version;
    pub struct TextBlob;
    pub struct BinaryBlob;
    pub struct DateTime;

    impl sealed::Sealed for Binary {}
    impl sealed::Sealed for Boolean {}
    impl sealed::Sealed for Digit {}
    impl sealed::Sealed for FixedStr {}
    impl sealed::Sealed for VarStr {}
    impl sealed::Sealed for Version {}
    impl sealed::Sealed for TextBlob {}
    impl sealed::Sealed for BinaryBlob {}
    impl sealed::Sealed for DateTime {}

    impl Kind for Binary {
        type Value = Vec<u8>;
        const TYPE: FieldType = FieldType::Binary;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<Vec<u8>> {
            check_width(params, bytes, Self::TYPE)?;
            Ok(bytes.to_vec())
        }
    }

    impl Kind for Boolean {
        type Value = bool;
        const TYPE: FieldType = FieldType::Boolean;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<bool> {
            check_width(params, bytes, Self::TYPE)?;
            Ok(bytes[0] != 0)
        }
    }

    impl Kind for Digit {
        type Value = Vec<u8>;
        const TYPE: FieldType = FieldType::Digit;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<Vec<u8>> {
            check_width(params, bytes, Self::TYPE)?;
            Ok(bytes.to_vec())
        }
    }

    impl Kind for FixedStr {
        type Value = String;
        const TYPE: FieldType = FieldType::FixedStr;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<String> {
            check_width(params, bytes, Self::TYPE)?;
            utf16_string(params, bytes)
        }
    }

    impl Kind for VarStr {
        type Value = String;
        const TYPE: FieldType = FieldType::VarStr;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<String> {
            check_width(params, bytes, Self::TYPE)?;
            let real_len = usize::from(u16::from_le_bytes([bytes[0], bytes[1]]));
            ensure!(
                real_len <= params.length,
                "stored string length {} exceeds field '{}' size {}",
                real_len,
                params.name,
                params.length
            );
            utf16_string(params, &bytes[2..2 + real_len * 2])
        }
    }

    impl Kind for Version {
        type Value = VersionStamp;
        const TYPE: FieldType = FieldType::Version;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<VersionStamp> {
            check_width(params, bytes, Self::TYPE)?;
            let wire: &VersionWire = parse_prefix(bytes, "version field")?;
            Ok(VersionStamp {
                v1: wire.v1.get(),
                v2: wire.v2.get(),
                v3: wire.v3.get(),
                v4: wire.v4.get(),
            })
        }
    }

    impl Kind for TextBlob {
        type Value = BlobRef;
        const TYPE: FieldType = FieldType::TextBlob;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<BlobRef> {
            check_width(params, bytes, Self::TYPE)?;
            let wire: &BlobRefWire = parse_prefix(bytes, "blob reference field")?;
            Ok(BlobRef {
                index: wire.index.get(),
                size: wire.size.get(),
            })
        }
    }

    impl Kind for BinaryBlob {
        type Value = BlobRef;
        const TYPE: FieldType = FieldType::BinaryBlob;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<BlobRef> {
            check_width(params, bytes, Self::TYPE)?;
            let wire: &BlobRefWire = parse_prefix(bytes, "blob reference field")?;
            Ok(BlobRef {
                index: wire.index.get(),
                size: wire.size.get(),
            })
        }
    }

    impl Kind for DateTime {
        type Value = DateTimeValue;
        const TYPE: FieldType = FieldType::DateTime;

        fn decode(params: &FieldParams, bytes: &[u8]) -> Result<DateTimeValue> {
            check_width(params, bytes, Self::TYPE)?;
            let wire: &DateTimeWire = parse_prefix(bytes, "date-time field")?;
            Ok(DateTimeValue {
                year: wire.year.get(),
                month: wire.month,
                day: wire.day,
                hour: wire.hour,
                minute: wire.minute,
                second: wire.second,
            })
        }
    }
}
