//! JSON catalog store with full-document rewrites
//!
//! Durability comes from rewriting the complete catalog on every mutation
//! rather than appending: each write lands as a whole, self-describing
//! document, so a crash can never leave a half-record behind. Record
//! volume is bounded by crawl size, which keeps the write amplification
//! acceptable.

use crate::model::{Catalog, CatalogMetadata, Posting, CATALOG_FORMAT_VERSION};
use crate::store::StoreResult;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// In-memory mirror of the persisted catalog
struct StoreInner {
    records: Vec<Posting>,
    ids: HashSet<String>,
}

/// Durable, deduplicated posting store shared by all workers
///
/// The dedup check and the durable write happen under one lock, so racing
/// workers can never both insert the same id.
pub struct CatalogStore {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

impl CatalogStore {
    /// Creates a store over the given catalog path without touching disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: Mutex::new(StoreInner {
                records: Vec::new(),
                ids: HashSet::new(),
            }),
        }
    }

    /// Ensures the output directory exists and loads any prior catalog
    ///
    /// Malformed content is logged and treated as absent rather than fatal,
    /// so a corrupted file never blocks a new run.
    ///
    /// # Returns
    ///
    /// The number of records recovered from disk.
    pub fn initialize(&self) -> StoreResult<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !self.path.exists() {
            tracing::info!("No existing catalog at {}, starting empty", self.path.display());
            return Ok(0);
        }

        let content = fs::read_to_string(&self.path)?;
        let catalog: Catalog = match serde_json::from_str(&content) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(
                    "Existing catalog at {} is malformed ({}), starting empty",
                    self.path.display(),
                    e
                );
                return Ok(0);
            }
        };

        let mut inner = self.inner.lock().unwrap();
        inner.ids = catalog.records.iter().map(|r| r.id.clone()).collect();
        inner.records = catalog.records;
        let recovered = inner.records.len();

        tracing::info!(
            "Recovered {} records from {}",
            recovered,
            self.path.display()
        );
        Ok(recovered)
    }

    /// Adds one posting and rewrites the catalog
    ///
    /// Returns false without writing when the id is already stored.
    pub fn add(&self, posting: Posting) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();

        if inner.ids.contains(&posting.id) {
            tracing::debug!("Posting {} already stored, skipping", posting.id);
            return Ok(false);
        }

        inner.ids.insert(posting.id.clone());
        inner.records.push(posting);
        self.write_catalog(&inner.records, None, &self.path)?;
        Ok(true)
    }

    /// Adds a batch of postings with a single rewrite at the end
    ///
    /// # Returns
    ///
    /// The number of postings actually added after dedup.
    pub fn add_batch(&self, postings: Vec<Posting>) -> StoreResult<usize> {
        let mut inner = self.inner.lock().unwrap();

        let mut added = 0;
        for posting in postings {
            if inner.ids.contains(&posting.id) {
                tracing::debug!("Posting {} already stored, skipping", posting.id);
                continue;
            }
            inner.ids.insert(posting.id.clone());
            inner.records.push(posting);
            added += 1;
        }

        if added > 0 {
            self.write_catalog(&inner.records, None, &self.path)?;
        }
        Ok(added)
    }

    /// Snapshot of every stored posting id
    ///
    /// The listing walk uses this to skip postings harvested by earlier runs.
    pub fn existing_ids(&self) -> HashSet<String> {
        self.inner.lock().unwrap().ids.clone()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored records
    pub fn records(&self) -> Vec<Posting> {
        self.inner.lock().unwrap().records.clone()
    }

    /// Writes a timestamped backup copy of the current catalog
    ///
    /// Returns the backup path, or None when the catalog is empty (no-op).
    pub fn backup(&self) -> StoreResult<Option<PathBuf>> {
        let inner = self.inner.lock().unwrap();

        if inner.records.is_empty() {
            tracing::debug!("Catalog is empty, skipping backup");
            return Ok(None);
        }

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let backup_path = self.backup_path(&stamp.to_string());

        self.write_catalog(
            &inner.records,
            Some(chrono::Utc::now().to_rfc3339()),
            &backup_path,
        )?;

        // Snapshots are archival; guard them against accidental edits
        let mut permissions = fs::metadata(&backup_path)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&backup_path, permissions)?;

        tracing::info!("Backup written to {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// Derives the timestamp-suffixed backup path from the primary path
    fn backup_path(&self, stamp: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("catalog");
        let extension = self
            .path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("json");
        self.path
            .with_file_name(format!("{}.backup-{}.{}", stem, stamp, extension))
    }

    /// Serializes and durably writes a complete catalog document
    ///
    /// The document goes to a temp file first and is renamed into place, so
    /// the target path always holds a complete document.
    fn write_catalog(
        &self,
        records: &[Posting],
        backup_date: Option<String>,
        target: &Path,
    ) -> StoreResult<()> {
        let catalog = Catalog {
            metadata: CatalogMetadata {
                total_records: records.len(),
                last_updated: chrono::Utc::now().to_rfc3339(),
                format_version: CATALOG_FORMAT_VERSION.to_string(),
            },
            backup_date,
            records: records.to_vec(),
        };

        let json = serde_json::to_string_pretty(&catalog)?;

        let tmp_path = target.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, target)?;

        tracing::debug!("Wrote {} records to {}", records.len(), target.display());
        Ok(())
    }
}
