//! Reconciles the persisted indexes with what is actually on disk.
//!
//! Both passes are idempotent: a second run over an unchanged tree loads the
//! index, finds nothing to repair, and leaves the file untouched.

use std::path::Path;

use crate::domain::{EntityIndex, EntityMetadata, ItemIndex, ItemMetadata, SyncSummary, UNKNOWN_DATE};
use crate::error::{Error, Result};
use crate::naming::find_date_token;
use crate::{exif, scanner, store, CatalogRoot};

/// Progress events for a full re-synchronization.
pub enum SyncProgress {
    /// The root index has been reconciled.
    RootSynced { entities: usize },
    /// One entity's item index has been reconciled.
    EntitySynced { entity: String, items: usize },
    /// One entity could not be reconciled; the pass continues.
    EntityFailed { entity: String, error: String },
    /// Pass completed.
    Complete { summary: SyncSummary },
}

/// Bring the root index in line with the entity directories under the root.
pub fn sync_root(root: &CatalogRoot) -> Result<EntityIndex> {
    let index_path = root.root_index_path();
    let (mut index, mut dirty) = store::load::<EntityIndex>(&index_path).or_rebuild();

    let found = scanner::entity_dirs(root.path())?;

    for key in &found {
        if !index.contains_key(key) {
            index.insert(key.clone(), EntityMetadata::default());
            dirty = true;
        }
    }

    let before = index.len();
    index.retain(|key, _| found.binary_search(key).is_ok());
    if index.len() != before {
        dirty = true;
    }

    if !is_sorted(&index) {
        dirty = true;
    }

    if dirty {
        index.sort_keys();
        store::save(&index_path, &index)?;
        log::info!("root index rewritten ({} entities)", index.len());
    }

    Ok(index)
}

/// Bring one entity's item index in line with the item files in its directory.
pub fn sync_entity(root: &CatalogRoot, key: &str) -> Result<ItemIndex> {
    let dir = root.entity_dir(key);
    if !dir.is_dir() {
        return Err(Error::EntityNotFound(key.to_string()));
    }

    let index_path = root.item_index_path(key);
    let (mut index, mut dirty) = store::load::<ItemIndex>(&index_path).or_rebuild();

    let found = scanner::item_files(&dir)?;

    let before = index.len();
    index.retain(|name, _| found.binary_search(name).is_ok());
    if index.len() != before {
        dirty = true;
    }

    for name in &found {
        if !index.contains_key(name) {
            let date = guess_date(&dir, name);
            index.insert(name.clone(), ItemMetadata::new(date));
            dirty = true;
        }
    }

    for (name, meta) in index.iter_mut() {
        if !meta.has_dimensions() {
            let (width, height) = exif::dimensions_or_zero(&dir.join(name));
            meta.width = Some(width);
            meta.height = Some(height);
            dirty = true;
        }
    }

    if dirty {
        store::save(&index_path, &index)?;
        log::info!("item index for {} rewritten ({} items)", key, index.len());
    }

    Ok(index)
}

/// Re-synchronize the whole catalog: the root index, then every entity.
/// A failing entity is reported and skipped.
pub fn sync_all(
    root: &CatalogRoot,
    mut progress_cb: Option<&mut dyn FnMut(SyncProgress)>,
) -> Result<SyncSummary> {
    let entities = sync_root(root)?;

    if let Some(ref mut cb) = progress_cb {
        cb(SyncProgress::RootSynced {
            entities: entities.len(),
        });
    }

    let mut summary = SyncSummary {
        entities: entities.len(),
        ..Default::default()
    };

    for key in entities.keys() {
        match sync_entity(root, key) {
            Ok(items) => {
                summary.items += items.len();
                if let Some(ref mut cb) = progress_cb {
                    cb(SyncProgress::EntitySynced {
                        entity: key.clone(),
                        items: items.len(),
                    });
                }
            }
            Err(error) => {
                log::warn!("sync of {} failed: {}", key, error);
                summary.failed.push(key.clone());
                if let Some(ref mut cb) = progress_cb {
                    cb(SyncProgress::EntityFailed {
                        entity: key.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }
    }

    if let Some(ref mut cb) = progress_cb {
        cb(SyncProgress::Complete {
            summary: summary.clone(),
        });
    }

    Ok(summary)
}

/// Date for a newly seen item: a `YYYY-MM-DD` token in the filename, then the
/// embedded capture date, then the sentinel.
fn guess_date(dir: &Path, name: &str) -> String {
    if let Some(token) = find_date_token(name) {
        return token.to_string();
    }
    exif::capture_date(&dir.join(name)).unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn is_sorted(index: &EntityIndex) -> bool {
    index
        .keys()
        .zip(index.keys().skip(1))
        .all(|(a, b)| a <= b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn open(tmp: &tempfile::TempDir) -> CatalogRoot {
        CatalogRoot::open(tmp.path()).unwrap()
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        image::RgbImage::new(w, h).save(path).unwrap();
    }

    // ── sync_root ───────────────────────────────────────────────

    #[test]
    fn test_sync_root_creates_index_for_empty_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        let index = sync_root(&root).unwrap();
        assert!(index.is_empty());
        assert_eq!(fs::read_to_string(root.root_index_path()).unwrap(), "{}\n");
    }

    #[test]
    fn test_sync_root_adds_and_removes_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        fs::create_dir(tmp.path().join("B")).unwrap();
        fs::create_dir(tmp.path().join("A")).unwrap();

        let mut stale = EntityIndex::new();
        stale.insert(
            "A".into(),
            EntityMetadata {
                company: "Keep".into(),
                ..Default::default()
            },
        );
        stale.insert("GONE".into(), EntityMetadata::default());
        store::save(&root.root_index_path(), &stale).unwrap();

        let index = sync_root(&root).unwrap();
        let keys: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(index["A"].company, "Keep");
        assert_eq!(index["B"], EntityMetadata::default());
    }

    #[test]
    fn test_sync_root_resorts_unsorted_index() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        fs::create_dir(tmp.path().join("A")).unwrap();
        fs::create_dir(tmp.path().join("B")).unwrap();
        fs::write(
            root.root_index_path(),
            br#"{"B": {"company": "", "year": "", "manufacturer": "", "model": ""},
                "A": {"company": "", "year": "", "manufacturer": "", "model": ""}}"#,
        )
        .unwrap();

        let index = sync_root(&root).unwrap();
        let keys: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "B"]);
        let text = fs::read_to_string(root.root_index_path()).unwrap();
        assert!(text.find("\"A\"").unwrap() < text.find("\"B\"").unwrap());
    }

    #[test]
    fn test_sync_root_recovers_from_corrupt_index() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        fs::create_dir(tmp.path().join("A")).unwrap();
        fs::write(root.root_index_path(), b"\x00\x01garbage").unwrap();

        let index = sync_root(&root).unwrap();
        assert_eq!(index.len(), 1);
        assert!(store::load::<EntityIndex>(&root.root_index_path())
            .into_option()
            .is_some());
    }

    #[test]
    fn test_sync_root_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        fs::create_dir(tmp.path().join("X")).unwrap();
        sync_root(&root).unwrap();
        let first = fs::read(root.root_index_path()).unwrap();
        sync_root(&root).unwrap();
        let second = fs::read(root.root_index_path()).unwrap();
        assert_eq!(first, second);
    }

    // ── sync_entity ─────────────────────────────────────────────

    #[test]
    fn test_sync_entity_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        assert!(matches!(
            sync_entity(&root, "NOPE"),
            Err(Error::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_sync_entity_guesses_dates_and_reads_dimensions() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        let dir = tmp.path().join("A");
        fs::create_dir(&dir).unwrap();
        write_png(&dir.join("A_2023-04-05_01.png"), 8, 6);
        write_png(&dir.join("scan.png"), 3, 2);
        fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let index = sync_entity(&root, "A").unwrap();
        let keys: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A_2023-04-05_01.png", "scan.png"]);

        let dated = &index["A_2023-04-05_01.png"];
        assert_eq!(dated.date, "2023-04-05");
        assert_eq!(dated.description, "");
        assert_eq!((dated.width, dated.height), (Some(8), Some(6)));

        let undated = &index["scan.png"];
        assert_eq!(undated.date, UNKNOWN_DATE);
        assert_eq!((undated.width, undated.height), (Some(3), Some(2)));
    }

    #[test]
    fn test_sync_entity_bad_image_gets_zero_dimensions() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        let dir = tmp.path().join("A");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("broken.jpg"), b"nope").unwrap();
        write_png(&dir.join("ok.png"), 5, 5);

        let index = sync_entity(&root, "A").unwrap();
        assert_eq!(index["broken.jpg"].width, Some(0));
        assert_eq!(index["broken.jpg"].height, Some(0));
        assert_eq!(index["ok.png"].width, Some(5));
    }

    #[test]
    fn test_sync_entity_preserves_existing_metadata_and_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        let dir = tmp.path().join("A");
        fs::create_dir(&dir).unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            write_png(&dir.join(name), 2, 2);
        }

        let mut existing = ItemIndex::new();
        let mut c = ItemMetadata::new("2020-01-01");
        c.description = "front view".into();
        existing.insert("c.png".into(), c);
        existing.insert("a.png".into(), ItemMetadata::new("2020-01-02"));
        existing.insert("stale.png".into(), ItemMetadata::new("2020-01-03"));
        store::save(&root.item_index_path("A"), &existing).unwrap();

        let index = sync_entity(&root, "A").unwrap();
        let keys: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["c.png", "a.png", "b.png"]);
        assert_eq!(index["c.png"].description, "front view");
        assert_eq!(index["c.png"].date, "2020-01-01");
        assert_eq!(index["a.png"].width, Some(2));
    }

    #[test]
    fn test_sync_entity_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        let dir = tmp.path().join("A");
        fs::create_dir(&dir).unwrap();
        write_png(&dir.join("x_2022-02-02.png"), 4, 4);
        fs::write(dir.join("bad.gif"), b"??").unwrap();

        sync_entity(&root, "A").unwrap();
        let first = fs::read(root.item_index_path("A")).unwrap();
        sync_entity(&root, "A").unwrap();
        let second = fs::read(root.item_index_path("A")).unwrap();
        assert_eq!(first, second);
    }

    // ── sync_all ────────────────────────────────────────────────

    #[test]
    fn test_sync_all_reports_progress() {
        let tmp = tempfile::tempdir().unwrap();
        let root = open(&tmp);
        for key in ["A", "B"] {
            let dir = tmp.path().join(key);
            fs::create_dir(&dir).unwrap();
            write_png(&dir.join("one.png"), 1, 1);
        }

        let mut synced = Vec::new();
        let mut completed = false;
        let summary = sync_all(
            &root,
            Some(&mut |p| match p {
                SyncProgress::EntitySynced { entity, .. } => synced.push(entity),
                SyncProgress::Complete { .. } => completed = true,
                _ => {}
            }),
        )
        .unwrap();

        assert_eq!(summary.entities, 2);
        assert_eq!(summary.items, 2);
        assert!(summary.failed.is_empty());
        assert_eq!(synced, vec!["A", "B"]);
        assert!(completed);
    }
}
