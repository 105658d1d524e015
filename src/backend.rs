// Seams to the external services.
// `Config` only ever talks to object storage and the key-value store through
// these traits. The production implementation lives in `aws`; tests use an
// in-memory one.

use crate::config::Credentials;
use crate::error::Result;

/// Name of the hash key every catalog table is keyed by.
pub const HASH_KEY: &str = "tag";

/// Anything that refers to a named cloud resource.
pub trait Handle {
    fn name(&self) -> &str;
}

/// Shape and provisioning of a table to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// String-typed hash key attribute.
    pub hash_key: &'static str,
    pub read_units: i64,
    pub write_units: i64,
}

impl TableSpec {
    /// The layout used by every catalog table.
    pub const CATALOG: TableSpec = TableSpec {
        hash_key: HASH_KEY,
        read_units: 3,
        write_units: 5,
    };
}

/// Object storage, where the images go.
pub trait ObjectStorage {
    type Bucket: Handle;

    fn list_buckets(&self) -> Result<Vec<String>>;
    fn get_bucket(&self, name: &str) -> Result<Self::Bucket>;
    fn create_bucket(&self, name: &str) -> Result<Self::Bucket>;
}

/// Key-value store, where the tags go.
pub trait TableStore {
    type Table: Handle;

    fn list_tables(&self) -> Result<Vec<String>>;
    fn get_table(&self, name: &str) -> Result<Self::Table>;

    /// Create a table. Must fail with `Error::TableExists` when the service
    /// reports that the name is already taken.
    fn create_table(&self, name: &str, spec: &TableSpec) -> Result<Self::Table>;
}

/// Opens connections to both services.
pub trait Backend {
    type Storage: ObjectStorage;
    type Tables: TableStore;

    fn connect_storage(&self, credentials: &Credentials, region: &str) -> Result<Self::Storage>;
    fn connect_tables(&self, credentials: &Credentials, region: &str) -> Result<Self::Tables>;
}

/// Bucket handle type of a backend.
pub type BucketOf<B> = <<B as Backend>::Storage as ObjectStorage>::Bucket;

/// Table handle type of a backend.
pub type TableOf<B> = <<B as Backend>::Tables as TableStore>::Table;
