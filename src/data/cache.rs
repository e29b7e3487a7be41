use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::error::IngestError;
use super::loader::{load_sample, load_uploaded};
use super::model::Dataset;

/// Hex SHA-256 of an upload's bytes.
pub fn content_key(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Memoized loader outputs.
///
/// The sample is generated once. Uploads are keyed by content, never by
/// file name, so a changed file with the same name is always re-parsed.
/// Failed loads are not stored.
#[derive(Debug, Default)]
pub struct DatasetCache {
    sample: Option<Arc<Dataset>>,
    uploads: HashMap<String, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self) -> Arc<Dataset> {
        self.sample
            .get_or_insert_with(|| {
                log::debug!("generating sample dataset");
                Arc::new(load_sample())
            })
            .clone()
    }

    /// Load `bytes` unless identical content was loaded before.
    ///
    /// The cached dataset keeps the file name it was first loaded under.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<Arc<Dataset>, IngestError> {
        let key = content_key(bytes);
        if let Some(hit) = self.uploads.get(&key) {
            log::debug!("cache hit for {file_name} ({})", &key[..12]);
            return Ok(hit.clone());
        }
        log::debug!("cache miss for {file_name} ({})", &key[..12]);
        let dataset = Arc::new(load_uploaded(file_name, bytes)?);
        self.uploads.insert(key, dataset.clone());
        Ok(dataset)
    }

    /// A previously loaded upload, without re-parsing.
    pub fn get_upload(&self, key: &str) -> Option<Arc<Dataset>> {
        self.uploads.get(key).cloned()
    }

    pub fn contains_upload(&self, key: &str) -> bool {
        self.uploads.contains_key(key)
    }

    /// Drop one upload. Returns whether it was cached.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.uploads.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.sample = None;
        self.uploads.clear();
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.len()
    }
}
