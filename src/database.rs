//! # Database Facade
//!
//! The entry point tying the layers together: open a file, walk the
//! catalog, read records, chase blob references.
//!
//! ```ignore
//! use onecd::{kind, Database};
//!
//! let db = Database::builder()
//!     .path("./base.1cd")
//!     .page_cache_size(8)
//!     .open()?;
//!
//! for table in db.tables() {
//!     let table = table?;
//!     let rows = db.records(&table)?;
//!     println!("{}: {} records", table.name, rows.len());
//! }
//!
//! let users = db.table(0)?;
//! let mut rows = db.records(&users)?;
//! let name = rows.field_index("NAME")?;
//! rows.seek(0)?;
//! if !rows.is_deleted()? {
//!     println!("{:?}", rows.get_field::<kind::VarStr>(name)?);
//! }
//! ```
//!
//! The database is a single-threaded reader: one [`PageCache`] shared by
//! reference counting, with every stream constructed on demand against it.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use eyre::{ensure, Result, WrapErr};
use tracing::debug;

use crate::catalog::{RootCatalog, TableParams};
use crate::config::DEFAULT_PAGE_CACHE_SIZE;
use crate::records::RecordStream;
use crate::storage::{BlobReader, FormatVersion, ObjectStream, PageCache};

/// Open database file with its parsed catalog.
#[derive(Debug)]
pub struct Database {
    cache: Rc<PageCache>,
    root: RootCatalog,
}

impl Database {
    /// Opens a database with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    pub fn version(&self) -> FormatVersion {
        self.cache.version()
    }

    pub fn page_size(&self) -> usize {
        self.cache.page_size()
    }

    pub fn page_count(&self) -> u32 {
        self.cache.page_count()
    }

    /// Language label of the root catalog.
    pub fn lang(&self) -> &str {
        self.root.lang()
    }

    pub fn table_count(&self) -> u32 {
        self.root.len()
    }

    /// Raw descriptor text of table `index`.
    pub fn descriptor(&self, index: u32) -> Result<String> {
        self.root.read(index)
    }

    /// Parsed parameters of table `index`.
    pub fn table(&self, index: u32) -> Result<TableParams> {
        self.root.get(index)
    }

    /// Iterates the catalog in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = Result<TableParams>> + '_ {
        (0..self.table_count()).map(|index| self.table(index))
    }

    /// Opens the records stream of a table.
    pub fn records(&self, table: &TableParams) -> Result<RecordStream> {
        RecordStream::open(Rc::clone(&self.cache), table.i_records, &table.columns)
            .wrap_err_with(|| format!("cannot open records of table '{}'", table.name))
    }

    /// Opens the blob stream of a table; fails when the table declares
    /// none.
    pub fn blobs(&self, table: &TableParams) -> Result<BlobReader> {
        ensure!(
            table.i_blob != 0,
            "table '{}' declares no blob object",
            table.name
        );
        let object = ObjectStream::open(Rc::clone(&self.cache), table.i_blob)
            .wrap_err_with(|| format!("cannot open blobs of table '{}'", table.name))?;
        BlobReader::new(object)
    }

    /// Opens an arbitrary object stream by header page index.
    pub fn object(&self, index: u32) -> Result<ObjectStream> {
        ObjectStream::open(Rc::clone(&self.cache), index)
    }
}

/// Configures and opens a [`Database`].
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    page_cache_size: usize,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self {
            path: None,
            page_cache_size: DEFAULT_PAGE_CACHE_SIZE,
        }
    }
}

impl DatabaseBuilder {
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pages kept resident by the cache; must be at least one.
    pub fn page_cache_size(mut self, pages: usize) -> Self {
        self.page_cache_size = pages;
        self
    }

    pub fn open(self) -> Result<Database> {
        let path = self.path.ok_or_else(|| eyre::eyre!("no database path configured"))?;

        let cache = Rc::new(
            PageCache::open(&path, self.page_cache_size)
                .wrap_err_with(|| format!("cannot open database '{}'", path.display()))?,
        );
        let root = RootCatalog::open(Rc::clone(&cache))
            .wrap_err_with(|| format!("cannot read catalog of '{}'", path.display()))?;
        debug!(path = %path.display(), tables = root.len(), "database opened");

        Ok(Database { cache, root })
    }
}
