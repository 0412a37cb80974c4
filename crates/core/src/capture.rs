use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use crate::domain::is_supported_item;
use crate::error::{Error, Result};
use crate::naming::{canonical_name, is_valid_date, normalize_key, split_name};
use crate::{scanner, sync, CatalogRoot};

/// Copy `source` into entity `key` as `<KEY>_<date>_<NN>.<ext>`, creating the
/// entity if needed. Returns the new item's filename.
pub fn import_item(root: &CatalogRoot, key: &str, source: &Path, date: &str) -> Result<String> {
    if !is_valid_date(date) {
        return Err(Error::InvalidDate(date.to_string()));
    }
    if !is_supported_item(source) {
        return Err(Error::UnsupportedFormat(source.to_path_buf()));
    }
    if !source.is_file() {
        return Err(Error::Io(io::Error::new(
            ErrorKind::NotFound,
            format!("{} is not a file", source.display()),
        )));
    }

    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return Err(Error::InvalidEntityKey(key.to_string()));
    }

    let (entity, created) = match root.find_entity(&normalized)? {
        Some(existing) => (existing, false),
        None => {
            fs::create_dir_all(root.entity_dir(&normalized))?;
            log::info!("created entity {}", normalized);
            (normalized, true)
        }
    };

    let dir = root.entity_dir(&entity);
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let mut counter = next_counter(&scanner::item_files(&dir)?, &entity, date);
    let name = loop {
        let candidate = canonical_name(&entity, date, counter, ext);
        if !dir.join(&candidate).exists() {
            break candidate;
        }
        counter += 1;
    };

    fs::copy(source, dir.join(&name))?;
    log::info!("imported {} as {}/{}", source.display(), entity, name);

    if created {
        sync::sync_root(root)?;
    }
    sync::sync_entity(root, &entity)?;
    Ok(name)
}

/// One past the highest `NN` among `<key>_<date>_<NN>.*` names.
fn next_counter(names: &[String], key: &str, date: &str) -> u32 {
    let prefix = format!("{key}_{date}_");
    names
        .iter()
        .filter_map(|name| {
            let (stem, _) = split_name(name);
            stem.strip_prefix(&prefix)?.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityIndex, ItemIndex};
    use crate::store;

    fn source_image(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(6, 4).save(&path).unwrap();
        path
    }

    #[test]
    fn test_next_counter() {
        let names: Vec<String> = ["K_2024-01-01_01.jpg", "K_2024-01-01_07.png", "K_2024-01-02_09.jpg", "other.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(next_counter(&names, "K", "2024-01-01"), 8);
        assert_eq!(next_counter(&names, "K", "2024-01-03"), 1);
    }

    #[test]
    fn test_import_creates_entity_and_indexes_item() {
        let tmp = tempfile::tempdir().unwrap();
        let incoming = tempfile::tempdir().unwrap();
        let root = CatalogRoot::open(tmp.path()).unwrap();
        let src = source_image(incoming.path(), "IMG_001.PNG");

        let name = import_item(&root, " kka-1234 ", &src, "2024-03-09").unwrap();
        assert_eq!(name, "KKA-1234_2024-03-09_01.png");
        assert!(src.exists(), "source is copied, not moved");

        let entities: EntityIndex = store::load(&root.root_index_path()).into_option().unwrap();
        assert!(entities.contains_key("KKA-1234"));
        let items: ItemIndex = store::load(&root.item_index_path("KKA-1234")).into_option().unwrap();
        assert_eq!(items[&name].date, "2024-03-09");
        assert_eq!(items[&name].width, Some(6));

        let second = import_item(&root, "KKA-1234", &src, "2024-03-09").unwrap();
        assert_eq!(second, "KKA-1234_2024-03-09_02.png");
    }

    #[test]
    fn test_import_rejects_bad_input() {
        let tmp = tempfile::tempdir().unwrap();
        let root = CatalogRoot::open(tmp.path()).unwrap();
        let src = source_image(tmp.path(), "a.png");

        assert!(matches!(
            import_item(&root, "K", &src, "2024-02-30"),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            import_item(&root, "K", Path::new("notes.txt"), "2024-02-03"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            import_item(&root, " ?* ", &src, "2024-02-03"),
            Err(Error::InvalidEntityKey(_))
        ));
    }
}
