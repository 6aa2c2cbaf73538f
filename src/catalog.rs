//! # Root Catalog
//!
//! The zeroth control structure of the database: a blob object whose first
//! chain holds the list of tables, and whose remaining chains hold one
//! UTF-8 descriptor per table. A descriptor is brace-group text:
//!
//! ```text
//! {"USERS"}
//! {"ID","N",0,9,0,"CS"}
//! {"NAME","NVC",1,50,0,"CI"}
//! {"Recordlock","0"}
//! {"Files",17,18,19}
//! ```
//!
//! The first group names the table; each six-element group declares a
//! column (name, type code, null flag, length, precision, case flag); the
//! `Recordlock` and `Files` groups carry the lock flag and the page
//! indices of the records, blob, and index objects. Parsing is anchored
//! regular expressions over the decoded text, one per group shape.
//!
//! Descriptors are stored BOM-prefixed; [`RootCatalog::read`] decodes them
//! as strict UTF-8.

use std::rc::Rc;

use eyre::{bail, ensure, Result};
use regex::Regex;
use tracing::debug;
use zerocopy::little_endian::U32;
use zerocopy::FromBytes;

use crate::config::{ROOT_HEADER_SIZE, ROOT_OBJECT_PAGE};
use crate::records::{FieldParams, FieldType};
use crate::storage::{utf8_text, BlobReader, ObjectStream, PageCache, RootHeader};

/// Everything a table descriptor declares.
#[derive(Debug, Clone, PartialEq)]
pub struct TableParams {
    pub name: String,
    pub columns: Vec<FieldParams>,
    pub record_lock: bool,
    /// Page index of the records object.
    pub i_records: u32,
    /// Page index of the blob object; 0 when the table stores no blobs.
    pub i_blob: u32,
    /// Page index of the index object; recognized, not interpreted.
    pub i_indexes: u32,
}

/// Compiled patterns for the four descriptor group shapes.
#[derive(Debug)]
struct DescriptorParser {
    name: Regex,
    fields: Regex,
    lock: Regex,
    files: Regex,
}

const BAD_FIELD: &str = "unknown table field format in table description";

impl DescriptorParser {
    fn new() -> Self {
        Self {
            name: Regex::new(r#"^\{"([^"]+)""#).expect("hard-coded pattern"),
            fields: Regex::new(
                r#"(?m)^\{"([^"]+)","([^"]+)",([0-9]+),([0-9]+),([0-9]+),"([^"]+)"\}"#,
            )
            .expect("hard-coded pattern"),
            lock: Regex::new(r#"(?m)^\{"Recordlock","([0-9])"\}"#).expect("hard-coded pattern"),
            files: Regex::new(r#"(?m)^\{"Files",([0-9]+),([0-9]+),([0-9]+)\}"#)
                .expect("hard-coded pattern"),
        }
    }

    fn parse_name(&self, descr: &str) -> Result<String> {
        let caps = self
            .name
            .captures(descr)
            .ok_or_else(|| eyre::eyre!("table name not found in table description"))?;
        Ok(caps[1].to_string())
    }

    fn parse_fields(&self, descr: &str) -> Result<Vec<FieldParams>> {
        let mut columns = Vec::new();
        for caps in self.fields.captures_iter(descr) {
            let ftype = FieldType::from_code(&caps[2]).ok_or_else(|| eyre::eyre!(BAD_FIELD))?;
            let null_flag: u32 = caps[3].parse().map_err(|_| eyre::eyre!(BAD_FIELD))?;
            let length: u32 = caps[4].parse().map_err(|_| eyre::eyre!(BAD_FIELD))?;
            let precision: u32 = caps[5].parse().map_err(|_| eyre::eyre!(BAD_FIELD))?;
            let case_sensitive = match &caps[6] {
                "CS" => true,
                "CI" => false,
                _ => bail!(BAD_FIELD),
            };

            columns.push(FieldParams {
                name: caps[1].to_string(),
                ftype,
                nullable: null_flag != 0,
                length: length as usize,
                precision: precision as usize,
                case_sensitive,
            });
        }
        Ok(columns)
    }

    fn parse_lock(&self, descr: &str) -> Result<bool> {
        let caps = self
            .lock
            .captures(descr)
            .ok_or_else(|| eyre::eyre!("'Recordlock' parameter not found in table description"))?;
        Ok(&caps[1] == "1")
    }

    fn parse_files(&self, descr: &str) -> Result<[u32; 3]> {
        let caps = self
            .files
            .captures(descr)
            .ok_or_else(|| eyre::eyre!("table files parameters not found in table description"))?;

        let mut files = [0u32; 3];
        for (slot, group) in files.iter_mut().zip(1..=3) {
            *slot = caps[group]
                .parse()
                .map_err(|_| eyre::eyre!("unknown table files format in table description"))?;
        }
        Ok(files)
    }

    fn parse_params(&self, descr: &str) -> Result<TableParams> {
        let name = self.parse_name(descr)?;
        let columns = self.parse_fields(descr)?;
        let record_lock = self.parse_lock(descr)?;
        let [i_records, i_blob, i_indexes] = self.parse_files(descr)?;

        Ok(TableParams {
            name,
            columns,
            record_lock,
            i_records,
            i_blob,
            i_indexes,
        })
    }
}

/// Parsed table list of one database.
#[derive(Debug)]
pub struct RootCatalog {
    blob: BlobReader,
    lang: String,
    tables: Vec<u32>,
    parser: DescriptorParser,
}

impl RootCatalog {
    /// Loads the catalog from its fixed object page.
    pub fn open(cache: Rc<PageCache>) -> Result<Self> {
        let object = ObjectStream::open(cache, ROOT_OBJECT_PAGE)?;
        let blob = BlobReader::new(object)?;

        let header_blob = blob.get(1, None)?;
        let header = RootHeader::parse(&header_blob)?;
        let count = header.table_count() as usize;
        ensure!(
            header_blob.len() == ROOT_HEADER_SIZE + count * 4,
            "root catalog declares {count} tables but holds {} bytes",
            header_blob.len()
        );

        let tables: Vec<u32> = <[U32]>::ref_from_bytes(&header_blob[ROOT_HEADER_SIZE..])
            .map_err(|e| eyre::eyre!("invalid root catalog table list: {e:?}"))?
            .iter()
            .map(|index| index.get())
            .collect();
        let lang = header.lang();
        debug!(tables = count, lang = %lang, "root catalog loaded");

        Ok(Self {
            blob,
            lang,
            tables,
            parser: DescriptorParser::new(),
        })
    }

    /// Language label the database was created with.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Number of tables the catalog declares.
    pub fn len(&self) -> u32 {
        self.tables.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Raw descriptor text of table `index`.
    pub fn read(&self, index: u32) -> Result<String> {
        let blob_index = *self
            .tables
            .get(index as usize)
            .ok_or_else(|| eyre::eyre!("table index {index} exceeds catalog size"))?;
        let raw = self.blob.get(blob_index, None)?;
        utf8_text(&raw)
    }

    /// Parsed parameters of table `index`.
    pub fn get(&self, index: u32) -> Result<TableParams> {
        self.parser.parse_params(&self.read(index)?)
    }
}
