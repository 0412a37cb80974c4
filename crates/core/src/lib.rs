pub mod capture;
pub mod domain;
pub mod error;
pub mod exif;
pub mod export;
pub mod items;
pub mod merge;
pub mod naming;
pub mod scanner;
pub mod store;
pub mod sync;

use std::fs;
use std::path::{Path, PathBuf};

use domain::*;
use error::{Error, Result};

pub use export::ExportProgress;
pub use sync::SyncProgress;

/// Handle on a catalog root directory: entity subdirectories plus the root
/// index. Every catalog operation goes through one of these.
#[derive(Debug, Clone)]
pub struct CatalogRoot {
    path: PathBuf,
}

impl CatalogRoot {
    /// Open the catalog at `path`, creating the directory if it does not exist.
    /// Indexes are not touched until the first sync.
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root_index_path(&self) -> PathBuf {
        self.path.join(INDEX_FILE_NAME)
    }

    pub fn entity_dir(&self, key: &str) -> PathBuf {
        self.path.join(key)
    }

    pub fn item_index_path(&self, key: &str) -> PathBuf {
        self.entity_dir(key).join(INDEX_FILE_NAME)
    }

    /// Directory name of the entity answering to `key` under the catalog key
    /// convention, if any.
    pub fn find_entity(&self, key: &str) -> Result<Option<String>> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Ok(None);
        }
        if self.entity_dir(key).is_dir() {
            return Ok(Some(key.to_string()));
        }
        let wanted = naming::normalize_key(key);
        Ok(scanner::entity_dirs(&self.path)?
            .into_iter()
            .find(|name| naming::normalize_key(name) == wanted))
    }

    /// Like [`find_entity`](Self::find_entity) but missing entities are an error.
    pub fn resolve_key(&self, key: &str) -> Result<String> {
        self.find_entity(key)?
            .ok_or_else(|| Error::EntityNotFound(key.to_string()))
    }

    // ── Synchronizer ─────────────────────────────────────────────────

    pub fn sync_root(&self) -> Result<EntityIndex> {
        sync::sync_root(self)
    }

    pub fn sync_entity(&self, key: &str) -> Result<ItemIndex> {
        let key = self.resolve_key(key)?;
        sync::sync_entity(self, &key)
    }

    /// Full re-synchronization; the recovery path after any failed operation.
    pub fn sync_all(&self, progress_cb: Option<&mut dyn FnMut(SyncProgress)>) -> Result<SyncSummary> {
        sync::sync_all(self, progress_cb)
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// The reconciled root index.
    pub fn entities(&self) -> Result<EntityIndex> {
        sync::sync_root(self)
    }

    /// Entity keys containing `term`, case-insensitively, sorted.
    pub fn search_entities(&self, term: &str) -> Result<Vec<String>> {
        let needle = term.trim().to_uppercase();
        let mut keys: Vec<String> = self
            .entities()?
            .into_keys()
            .filter(|key| key.to_uppercase().contains(&needle))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Replace an entity's metadata. Returns false when nothing changed.
    pub fn update_entity(&self, key: &str, meta: EntityMetadata) -> Result<bool> {
        let key = self.resolve_key(key)?;
        let mut index = sync::sync_root(self)?;
        let Some(current) = index.get_mut(&key) else {
            return Err(Error::EntityNotFound(key));
        };
        if *current == meta {
            return Ok(false);
        }
        *current = meta;
        store::save(&self.root_index_path(), &index)?;
        log::info!("updated metadata of {}", key);
        Ok(true)
    }

    /// Entity directories that hold no supported item files.
    pub fn empty_entities(&self) -> Result<Vec<String>> {
        let mut empty = Vec::new();
        for key in scanner::entity_dirs(&self.path)? {
            if scanner::item_files(&self.entity_dir(&key))?.is_empty() {
                empty.push(key);
            }
        }
        Ok(empty)
    }

    /// Rename an entity, merging into an existing one when `confirm_merge` is set.
    pub fn rename_entity(&self, old_key: &str, new_key: &str, confirm_merge: bool) -> Result<RenameOutcome> {
        merge::rename_or_merge(self, old_key, new_key, confirm_merge)
    }

    // ── Items ────────────────────────────────────────────────────────

    /// The reconciled item index of one entity, in display order.
    pub fn items(&self, key: &str) -> Result<ItemIndex> {
        self.sync_entity(key)
    }

    pub fn reorder_item(&self, key: &str, position: usize, direction: Direction) -> Result<ReorderOutcome> {
        items::reorder(self, key, position, direction)
    }

    pub fn rename_item(&self, key: &str, old_name: &str, new_name: &str) -> Result<()> {
        items::rename_item(self, key, old_name, new_name)
    }

    pub fn delete_item(&self, key: &str, name: &str) -> Result<()> {
        items::delete_item(self, key, name)
    }

    pub fn update_item(
        &self,
        key: &str,
        name: &str,
        date: Option<&str>,
        description: Option<&str>,
    ) -> Result<bool> {
        items::update_item(self, key, name, date, description)
    }

    /// Copy a new image into an entity under the canonical filename.
    pub fn import_item(&self, key: &str, source: &Path, date: &str) -> Result<String> {
        capture::import_item(self, key, source, date)
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Copy every item dated `date` to `out_dir` with a per-entity report.
    pub fn export_date(
        &self,
        date: &str,
        out_dir: &Path,
        progress_cb: Option<&mut dyn FnMut(ExportProgress)>,
    ) -> Result<export::ExportReport> {
        export::export_date(self, date, out_dir, progress_cb)
    }
}
