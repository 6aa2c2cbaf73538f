//! # Positioned File Access
//!
//! A minimal read-only handle over the database file. Reads are positioned
//! (`pread`-style) so the handle carries no cursor state, and every read
//! either fills the destination completely or fails; a short read is never
//! reported as success.
//!
//! On Unix this uses `FileExt::read_at`, on Windows `FileExt::seek_read`,
//! looping until the buffer is full. The size is captured once at open;
//! the format forbids concurrent writers, so it cannot change underneath.

use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::Path;

#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    /// Total file size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Fills `buf` from the absolute offset `pos`, or fails.
    pub fn read_exact_at(&self, buf: &mut [u8], pos: u64) -> io::Result<()> {
        let mut total = 0usize;
        while total < buf.len() {
            let n = self.read_at(&mut buf[total..], pos + total as u64)?;
            if n == 0 {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "short read from database file",
                ));
            }
            total += n;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, pos)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, pos)
    }
}
