//! Synthesizes complete database images for the end-to-end tests: a page 0
//! header, a root catalog blob at its fixed page, table objects, records,
//! and blob chains, in either format version.

use std::io::Write;
use std::path::PathBuf;

pub const PAGE: usize = 4096;

/// Stride of the USERS table below: deletion flag + nine columns.
pub const USERS_STRIDE: usize = 158;

/// The USERS blob object lays its chains out back to back from block 1.
pub const DATA_CHAIN_START: u32 = 1;
pub const DATA_SIZE: usize = 5000;
pub const BIO_CHAIN_START: u32 = DATA_CHAIN_START + DATA_SIZE.div_ceil(250) as u32;
pub const BIO_TEXT: &str = "software engineer";

#[derive(Clone, Copy, PartialEq)]
pub enum Format {
    V82,
    V83 { page_size: usize },
}

impl Format {
    fn page_size(self) -> usize {
        match self {
            Format::V82 => PAGE,
            Format::V83 { page_size } => page_size,
        }
    }

    fn version(self) -> u32 {
        match self {
            Format::V82 => 0x000E_0208,
            Format::V83 { .. } => 0x0008_0308,
        }
    }
}

pub struct ImageBuilder {
    format: Format,
    pages: Vec<Vec<u8>>,
}

impl ImageBuilder {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            pages: vec![vec![0u8; format.page_size()]],
        }
    }

    pub fn page_size(&self) -> usize {
        self.format.page_size()
    }

    pub fn add_page(&mut self) -> u32 {
        self.pages.push(vec![0u8; self.page_size()]);
        (self.pages.len() - 1) as u32
    }

    pub fn page_mut(&mut self, index: u32) -> &mut [u8] {
        &mut self.pages[index as usize]
    }

    /// Data pages for `data`, then a single-level object header after them;
    /// returns the header page index.
    pub fn add_object(&mut self, data: &[u8]) -> u32 {
        let header = self.add_page();
        self.set_object(header, data);
        header
    }

    /// Writes a single-level object at a pre-allocated header page.
    pub fn set_object(&mut self, header: u32, data: &[u8]) {
        let page_size = self.page_size();
        let data_pages: Vec<u32> = data
            .chunks(page_size)
            .map(|chunk| {
                let page = self.add_page();
                self.page_mut(page)[..chunk.len()].copy_from_slice(chunk);
                page
            })
            .collect();
        self.object_header(header, data.len() as u64, &data_pages, false);
    }

    /// Version 8.3.8 only: object whose header entries point at placement
    /// pages.
    pub fn add_object_two_level(&mut self, data: &[u8]) -> u32 {
        let page_size = self.page_size();
        let data_pages: Vec<u32> = data
            .chunks(page_size)
            .map(|chunk| {
                let page = self.add_page();
                self.page_mut(page)[..chunk.len()].copy_from_slice(chunk);
                page
            })
            .collect();

        let pmt_pages: Vec<u32> = data_pages
            .chunks(page_size / 4)
            .map(|entries| {
                let page = self.add_page();
                let bytes = self.page_mut(page);
                for (i, &entry) in entries.iter().enumerate() {
                    bytes[i * 4..i * 4 + 4].copy_from_slice(&entry.to_le_bytes());
                }
                page
            })
            .collect();

        let header = self.add_page();
        self.object_header(header, data.len() as u64, &pmt_pages, true);
        header
    }

    fn object_header(&mut self, index: u32, length: u64, blocks: &[u32], two_level: bool) {
        let format = self.format;
        let page = self.page_mut(index);
        match format {
            Format::V82 => {
                assert!(!two_level, "8.2.14 objects are single-level");
                page[..8].copy_from_slice(b"1CDBOBV8");
                page[8..12].copy_from_slice(&(length as u32).to_le_bytes());
            }
            Format::V83 { .. } => {
                page[..2].copy_from_slice(&0xFD1Cu16.to_le_bytes());
                page[2..4].copy_from_slice(&u16::from(two_level).to_le_bytes());
                page[16..24].copy_from_slice(&length.to_le_bytes());
            }
        }
        for (i, &block) in blocks.iter().enumerate() {
            let at = 24 + i * 4;
            page[at..at + 4].copy_from_slice(&block.to_le_bytes());
        }
    }

    /// Stamps the page 0 header and writes the image out.
    pub fn finish(self, dir: &std::path::Path) -> PathBuf {
        let page_size = self.page_size();
        let mut pages = self.pages;
        let length = pages.len() as u32;

        let header = &mut pages[0];
        header[..8].copy_from_slice(b"1CDBMSV8");
        header[8..12].copy_from_slice(&self.format.version().to_le_bytes());
        header[12..16].copy_from_slice(&length.to_le_bytes());
        if let Format::V83 { .. } = self.format {
            header[20..24].copy_from_slice(&(page_size as u32).to_le_bytes());
        }

        let path = dir.join("base.1cd");
        let mut file = std::fs::File::create(&path).unwrap();
        for page in &pages {
            file.write_all(page).unwrap();
        }
        path
    }
}

/// Splits payload chains into consecutive 256-byte blob blocks after a
/// zeroed sentinel block; returns the raw blob bytes and each chain's
/// first block index.
pub fn blob_blocks(chains: &[Vec<u8>]) -> (Vec<u8>, Vec<u32>) {
    let mut blocks: Vec<[u8; 256]> = vec![[0u8; 256]];
    let mut starts = Vec::new();

    for chain in chains {
        starts.push(blocks.len() as u32);
        let chunks: Vec<&[u8]> = if chain.is_empty() {
            vec![&[][..]]
        } else {
            chain.chunks(250).collect()
        };
        let count = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            let mut block = [0u8; 256];
            let next = if i + 1 == count {
                0
            } else {
                blocks.len() as u32 + 1
            };
            block[..4].copy_from_slice(&next.to_le_bytes());
            block[4..6].copy_from_slice(&(chunk.len() as u16).to_le_bytes());
            block[6..6 + chunk.len()].copy_from_slice(chunk);
            blocks.push(block);
        }
    }

    (blocks.concat(), starts)
}

pub fn bom_utf8(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Byte pattern of the USERS binary blob.
pub fn data_payload() -> Vec<u8> {
    (0..DATA_SIZE).map(|i| (i % 251) as u8).collect()
}

pub struct TestDb {
    pub path: PathBuf,
    pub users_records_page: u32,
    _dir: tempfile::TempDir,
}

/// Three USERS records covering every column kind: a fully populated row,
/// a deleted row, and a row with null NAME and BIO and an empty DATA
/// reference.
fn users_rows() -> Vec<u8> {
    let mut rows = vec![0u8; 3 * USERS_STRIDE];
    {
        let row = &mut rows[..USERS_STRIDE];
        row[1..6].copy_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x42]); // ID
        row[6] = 1; // NAME present
        row[7..9].copy_from_slice(&5u16.to_le_bytes());
        row[9..19].copy_from_slice(&utf16le("Алиса"));
        row[109] = 1; // ACTIVE
        row[110..114].copy_from_slice(&DATA_CHAIN_START.to_le_bytes());
        row[114..118].copy_from_slice(&(DATA_SIZE as u32).to_le_bytes());
        row[118] = 1; // BIO present
        row[119..123].copy_from_slice(&BIO_CHAIN_START.to_le_bytes());
        let bio_size = bom_utf8(BIO_TEXT).len() as u32;
        row[123..127].copy_from_slice(&bio_size.to_le_bytes());
        row[127..129].copy_from_slice(&2021u16.to_le_bytes()); // CREATED
        row[129..134].copy_from_slice(&[12, 31, 23, 59, 7]);
        for (i, stamp) in [1u32, 2, 3, 4].iter().enumerate() {
            row[134 + i * 4..138 + i * 4].copy_from_slice(&stamp.to_le_bytes());
        }
        row[150..154].copy_from_slice(&utf16le("OK")); // CODE
        row[154..158].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]); // RAW
    }
    rows[USERS_STRIDE] = 1; // record 1 is deleted
    {
        let row = &mut rows[2 * USERS_STRIDE..];
        row[1..6].copy_from_slice(&[0x99, 0x00, 0x00, 0x00, 0x00]);
        // NAME and BIO presence bytes stay 0; DATA stays the empty
        // reference {0, 0}; everything else decodes as zeros.
    }
    rows
}

/// Builds a two-table database: USERS (records + blobs) and SETTINGS
/// (empty, no blob object).
pub fn users_db(format: Format, two_level_records: bool) -> TestDb {
    let mut builder = ImageBuilder::new(format);

    let _reserved = builder.add_page(); // page 1
    let root_header_page = builder.add_page(); // page 2, fixed catalog slot
    assert_eq!(root_header_page, 2);

    let rows = users_rows();
    let users_records_page = if two_level_records {
        builder.add_object_two_level(&rows)
    } else {
        builder.add_object(&rows)
    };

    let (users_blob, starts) = blob_blocks(&[data_payload(), bom_utf8(BIO_TEXT)]);
    assert_eq!(starts, vec![DATA_CHAIN_START, BIO_CHAIN_START]);
    let users_blob_page = builder.add_object(&users_blob);

    let settings_records_page = builder.add_object(&[]);

    let users_descr = bom_utf8(&format!(
        "{{\"USERS\"}}\n\
         {{\"ID\",\"N\",0,9,0,\"CS\"}}\n\
         {{\"NAME\",\"NVC\",1,50,0,\"CI\"}}\n\
         {{\"ACTIVE\",\"L\",0,1,0,\"CS\"}}\n\
         {{\"DATA\",\"I\",0,0,0,\"CS\"}}\n\
         {{\"BIO\",\"NT\",1,0,0,\"CS\"}}\n\
         {{\"CREATED\",\"DT\",0,0,0,\"CS\"}}\n\
         {{\"STAMP\",\"RV\",0,0,0,\"CS\"}}\n\
         {{\"CODE\",\"NC\",0,2,0,\"CI\"}}\n\
         {{\"RAW\",\"B\",0,4,0,\"CS\"}}\n\
         {{\"Recordlock\",\"0\"}}\n\
         {{\"Files\",{users_records_page},{users_blob_page},0}}"
    ));
    let settings_descr = bom_utf8(&format!(
        "{{\"SETTINGS\"}}\n\
         {{\"KEY\",\"NC\",0,4,0,\"CS\"}}\n\
         {{\"Recordlock\",\"1\"}}\n\
         {{\"Files\",{settings_records_page},0,0}}"
    ));

    let users_start = 2u32;
    let settings_start = users_start + users_descr.len().div_ceil(250) as u32;
    let mut root_header = vec![0u8; 36 + 2 * 4];
    root_header[..5].copy_from_slice(b"ru_RU");
    root_header[32..36].copy_from_slice(&2u32.to_le_bytes());
    root_header[36..40].copy_from_slice(&users_start.to_le_bytes());
    root_header[40..44].copy_from_slice(&settings_start.to_le_bytes());

    let (root_blob, starts) = blob_blocks(&[root_header, users_descr, settings_descr]);
    assert_eq!(starts, vec![1, users_start, settings_start]);
    builder.set_object(root_header_page, &root_blob);

    let dir = tempfile::tempdir().unwrap();
    let path = builder.finish(dir.path());
    TestDb {
        path,
        users_records_page,
        _dir: dir,
    }
}
