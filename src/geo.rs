use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::ApiError;

/// One address-to-location mapping entry in the backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRecord {
    pub address: String,
    pub city: String,
    pub country: String,
}

impl LocationRecord {
    /// Parses an `address,city,country` line. Lines with any other field
    /// count are not records.
    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split(',');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(address), Some(city), Some(country), None) => Some(Self {
                address: address.to_string(),
                city: city.to_string(),
                country: country.to_string(),
            }),
            _ => None,
        }
    }
}

/// Owns the path to the record file and hands out read handles.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh buffered handle over the backing file. Every caller
    /// gets its own cursor.
    async fn open(&self) -> io::Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.path).await?))
    }
}

/// Resolves addresses against a [`RecordStore`] by linear scan.
#[derive(Debug, Clone)]
pub struct Resolver {
    store: RecordStore,
}

impl Resolver {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Returns the first record whose address equals the input exactly.
    /// Matching is plain string equality; no normalization is applied.
    pub async fn resolve(&self, address: &str) -> Result<LocationRecord, ApiError> {
        let reader = self.store.open().await.map_err(|err| {
            tracing::warn!(
                "failed to open record file {}: {}",
                self.store.path().display(),
                err
            );
            ApiError::LookupUnavailable(err)
        })?;

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(record) = LocationRecord::parse(&line) {
                if record.address == address {
                    return Ok(record);
                }
            }
        }

        Err(ApiError::NotFound)
    }

    /// Whether the backing file is currently readable.
    pub async fn is_available(&self) -> bool {
        self.store.open().await.is_ok()
    }
}
