//! # Blob Chains
//!
//! A blob object stores variable-length values outside table records. Its
//! byte stream is an array of 256-byte blocks, each carrying a link to the
//! next block, a used-byte count, and up to 250 payload bytes. Block 0 of
//! the object is never a chain target; a field referencing block 0 means
//! "no value".
//!
//! Long text is stored as BOM-prefixed UTF-8, sometimes behind raw DEFLATE
//! (no zlib wrapper); [`decompress`] and [`utf8_text`] cover both steps.
//!
//! Chain walks are bounded by the object's total block count, so a cyclic
//! `next` link is reported instead of looping forever.

use eyre::{bail, ensure, Result};
use flate2::{Decompress, FlushDecompress, Status};
use zerocopy::FromBytes;

use super::headers::BlobBlock;
use super::object::ObjectStream;
use crate::config::{BLOB_BLOCK_SIZE, BLOB_DATA_SIZE};

/// Reader over a blob object's linked 256-byte blocks.
#[derive(Debug)]
pub struct BlobReader {
    object: ObjectStream,
    block_count: u32,
}

impl BlobReader {
    /// Wraps an object stream whose size must be whole blocks.
    pub fn new(object: ObjectStream) -> Result<Self> {
        let size = object.size();
        let block_count = size / BLOB_BLOCK_SIZE as u64;
        ensure!(
            size % BLOB_BLOCK_SIZE as u64 == 0 && block_count <= u64::from(u32::MAX),
            "invalid blob object size {size}"
        );
        Ok(Self {
            object,
            block_count: block_count as u32,
        })
    }

    /// Blocks available in the underlying object.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Collects the chain starting at `index` into one buffer.
    ///
    /// When `expected_size` is given the chain must produce exactly that
    /// many bytes; a longer or shorter result is an error. Index 0 is the
    /// "no value" sentinel and cannot be read.
    pub fn get(&self, index: u32, expected_size: Option<usize>) -> Result<Vec<u8>> {
        ensure!(index != 0, "blob index 0 is an empty reference");

        let mut result = Vec::with_capacity(expected_size.unwrap_or(0));
        let mut scratch = [0u8; BLOB_BLOCK_SIZE];
        let mut index = index;

        // Any chain longer than the block count must have revisited a block.
        for _ in 0..self.block_count {
            ensure!(
                index < self.block_count,
                "blob block index {index} exceeds object size"
            );
            self.object
                .read(&mut scratch, BLOB_BLOCK_SIZE as u64 * u64::from(index))?;
            let block = BlobBlock::ref_from_bytes(&scratch[..])
                .expect("scratch buffer is exactly one block");

            let length = block.length();
            let next = block.next();
            ensure!(
                length <= BLOB_DATA_SIZE && !(length == 0 && next != 0),
                "wrong length value in blob block {index}"
            );
            if let Some(limit) = expected_size {
                ensure!(
                    result.len() + length <= limit,
                    "blob larger than the requested size"
                );
            }
            result.extend_from_slice(block.payload());

            if next == 0 {
                if let Some(want) = expected_size {
                    ensure!(
                        result.len() == want,
                        "blob size {} does not match requested size {}",
                        result.len(),
                        want
                    );
                }
                return Ok(result);
            }
            index = next;
        }

        bail!("loop detected while reading blob chain");
    }
}

/// Inflates a raw DEFLATE stream (no zlib wrapper), growing the output
/// geometrically up to `max_size`.
pub fn decompress(src: &[u8], max_size: usize) -> Result<Vec<u8>> {
    if src.is_empty() {
        return Ok(Vec::new());
    }

    // The inflate counters are 32-bit; larger limits are meaningless.
    let max_size = max_size.min(u32::MAX as usize);
    ensure!(src.len() <= max_size, "compressed data exceeds the size limit");

    let mut dst = vec![0u8; src.len()];
    let mut inflater = Decompress::new(false);

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out() as usize;
        let status = inflater
            .decompress(&src[consumed..], &mut dst[produced..], FlushDecompress::None)
            .map_err(|e| eyre::eyre!("deflate error: {e}"))?;

        let produced = inflater.total_out() as usize;
        match status {
            Status::StreamEnd => {
                ensure!(
                    produced <= max_size,
                    "decompressed data exceeds the size limit"
                );
                dst.truncate(produced);
                return Ok(dst);
            }
            Status::Ok | Status::BufError => {
                if produced == dst.len() {
                    // Output full: double it. The buffer may grow one byte
                    // past the limit so a stream that inflates to exactly
                    // `max_size` can still reach its end marker; a byte
                    // written into that slack is over the limit.
                    ensure!(
                        produced <= max_size,
                        "decompressed data exceeds the size limit"
                    );
                    let room = max_size - dst.len() + 1;
                    let grow = dst.len().min(room);
                    dst.resize(dst.len() + grow, 0);
                } else if inflater.total_in() as usize == src.len() {
                    bail!("compressed data ended before the stream was complete");
                } else if status == Status::BufError {
                    bail!("deflate stream made no progress");
                }
            }
        }
    }
}

/// Decodes a BOM-prefixed UTF-8 buffer into a string.
pub fn utf8_text(src: &[u8]) -> Result<String> {
    ensure!(
        src.len() >= 3 && src[..3] == [0xEF, 0xBB, 0xBF],
        "text blob does not start with a UTF-8 byte order mark"
    );
    let body = std::str::from_utf8(&src[3..])
        .map_err(|e| eyre::eyre!("malformed UTF-8 in text blob: {e}"))?;
    Ok(body.to_owned())
}
