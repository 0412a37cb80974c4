//! Entity rename, and the merge that runs when the new name is already taken.
//!
//! A merge moves every item of the source entity into the target, then
//! renumbers the combined set in two phases: every file is first staged under
//! a unique `~merge` name, and only then committed to its final
//! `<key>_<date>_<NN>.<ext>` name. No rename in the commit phase can land on a
//! file that has not been moved out of the way yet.
//!
//! Nothing is rolled back on failure. A partially merged tree is repaired by
//! running the synchronizer over the whole catalog.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::{
    is_supported_item, EntityIndex, ItemIndex, ItemMetadata, MergeReport, RenameOutcome,
    INDEX_FILE_NAME,
};
use crate::error::{Error, Result};
use crate::naming::{
    canonical_name, date_after_underscore, normalize_key, numbered_variant, split_name,
    staged_name,
};
use crate::{scanner, store, sync, CatalogRoot};

/// A file parked under a staging name, with what is known about it.
struct Staged {
    original: String,
    temp: String,
    meta: Option<ItemMetadata>,
}

/// Rename entity `old_key` to `new_key`. When an entity already answers to
/// `new_key` the two are merged, which requires `confirm_merge`.
pub fn rename_or_merge(
    root: &CatalogRoot,
    old_key: &str,
    new_key: &str,
    confirm_merge: bool,
) -> Result<RenameOutcome> {
    let old = root.resolve_key(old_key)?;
    let target = normalize_key(new_key);
    if target.is_empty() || target == normalize_key(&old) {
        return Ok(RenameOutcome::NoOp);
    }
    if target == "." || target == ".." {
        return Err(Error::InvalidEntityKey(new_key.to_string()));
    }

    match root.find_entity(&target)? {
        None => rename_entity(root, &old, &target).map(RenameOutcome::Renamed),
        Some(existing) if confirm_merge => merge(root, &old, &existing).map(RenameOutcome::Merged),
        Some(existing) => Err(Error::MergeNotConfirmed {
            entity: old,
            target: existing,
        }),
    }
}

fn rename_entity(root: &CatalogRoot, old: &str, target: &str) -> Result<String> {
    fs::rename(root.entity_dir(old), root.entity_dir(target))?;
    log::info!("renamed entity {} -> {}", old, target);

    let index_path = root.root_index_path();
    let (mut index, _) = store::load::<EntityIndex>(&index_path).or_rebuild();
    let meta = index.shift_remove(old).unwrap_or_default();
    index.insert(target.to_string(), meta);
    index.sort_keys();
    store::save(&index_path, &index)?;

    sync::sync_root(root)?;
    sync::sync_entity(root, target)?;
    Ok(target.to_string())
}

/// Fold `source` into `target` and delete `source`.
pub fn merge(root: &CatalogRoot, source: &str, target: &str) -> Result<MergeReport> {
    let source_dir = root.entity_dir(source);
    let target_dir = root.entity_dir(target);
    if !target_dir.is_dir() {
        return Err(Error::EntityNotFound(target.to_string()));
    }
    if let Some(path) = first_non_item(&source_dir)? {
        return Err(Error::UnmergeableEntry {
            entity: source.to_string(),
            path,
        });
    }

    let source_items = load_items(root, source);
    let target_items = load_items(root, target);

    // Metadata for every file in the target directory, keyed by its current name.
    let mut carried: HashMap<String, ItemMetadata> = target_items.into_iter().collect();
    let mut staged: Vec<Staged> = Vec::new();
    let mut report = MergeReport {
        target: target.to_string(),
        ..Default::default()
    };

    // Move the source's items across. A name already used in the target is
    // staged straight away instead of overwriting.
    for name in scanner::item_files(&source_dir)? {
        let meta = source_items.get(&name).cloned();
        if target_dir.join(&name).exists() {
            let temp = free_staged_name(&target_dir, &name)?;
            fs::rename(source_dir.join(&name), target_dir.join(&temp))?;
            log::debug!("moved {}/{} -> {}/{} (collision)", source, name, target, temp);
            staged.push(Staged {
                original: name,
                temp,
                meta,
            });
        } else {
            fs::rename(source_dir.join(&name), target_dir.join(&name))?;
            log::debug!("moved {}/{} -> {}", source, name, target);
            match meta {
                Some(meta) => {
                    carried.insert(name, meta);
                }
                None => {
                    carried.remove(&name);
                }
            }
        }
        report.moved += 1;
    }

    remove_source_dir(&source_dir)?;

    // Phase one: park everything under a unique staging name.
    let parked: HashSet<String> = staged.iter().map(|s| s.temp.clone()).collect();
    for name in scanner::item_files(&target_dir)? {
        if parked.contains(&name) {
            continue;
        }
        let temp = free_staged_name(&target_dir, &name)?;
        fs::rename(target_dir.join(&name), target_dir.join(&temp))?;
        log::debug!("staged {}/{} as {}", target, name, temp);
        let meta = carried.remove(&name);
        staged.push(Staged {
            original: name,
            temp,
            meta,
        });
    }

    // Phase two: commit each group to its final names.
    let (dated, unknown) = group_by_date(staged);
    let mut merged = ItemIndex::new();

    for (date, mut group) in dated {
        group.sort_by(|a, b| a.temp.cmp(&b.temp));
        let mut counter = 0u32;
        for item in group {
            let ext = split_name(&item.original).1.unwrap_or_default();
            let final_name = loop {
                counter += 1;
                let candidate = canonical_name(target, &date, counter, ext);
                if !target_dir.join(&candidate).exists() {
                    break candidate;
                }
            };
            fs::rename(target_dir.join(&item.temp), target_dir.join(&final_name))?;
            report.renumbered += 1;
            if let Some(mut meta) = item.meta {
                meta.date = date.clone();
                merged.insert(final_name, meta);
            }
        }
    }

    for item in unknown {
        let restored = free_name(&target_dir, &item.original);
        fs::rename(target_dir.join(&item.temp), target_dir.join(&restored))?;
        log::warn!(
            "{}: no date for {}, kept as {} instead of renumbering",
            target,
            item.original,
            restored
        );
        if let Some(meta) = item.meta {
            merged.insert(restored.clone(), meta);
        }
        report.unknown_date.push(restored);
    }

    merged.sort_keys();
    store::save(&root.item_index_path(target), &merged)?;
    sync::sync_entity(root, target)?;

    let index_path = root.root_index_path();
    let (mut index, _) = store::load::<EntityIndex>(&index_path).or_rebuild();
    if let Some(source_meta) = index.shift_remove(source) {
        index
            .entry(target.to_string())
            .or_default()
            .fill_blanks_from(&source_meta);
    }
    index.sort_keys();
    store::save(&index_path, &index)?;
    sync::sync_root(root)?;

    log::info!(
        "merged {} into {}: {} moved, {} renumbered, {} without date",
        source,
        target,
        report.moved,
        report.renumbered,
        report.unknown_date.len()
    );
    Ok(report)
}

/// Split staged files by capture date: the first `_YYYY-MM-DD` token of the
/// original filename, else a real date recorded in the index, else unknown.
fn group_by_date(staged: Vec<Staged>) -> (BTreeMap<String, Vec<Staged>>, Vec<Staged>) {
    let mut dated: BTreeMap<String, Vec<Staged>> = BTreeMap::new();
    let mut unknown = Vec::new();

    for item in staged {
        let date = date_after_underscore(&item.original)
            .map(str::to_string)
            .or_else(|| {
                item.meta
                    .as_ref()
                    .filter(|m| m.has_known_date())
                    .map(|m| m.date.clone())
            });
        match date {
            Some(date) => dated.entry(date).or_default().push(item),
            None => unknown.push(item),
        }
    }

    unknown.sort_by(|a, b| a.temp.cmp(&b.temp));
    (dated, unknown)
}

fn load_items(root: &CatalogRoot, key: &str) -> ItemIndex {
    store::load::<ItemIndex>(&root.item_index_path(key))
        .into_option()
        .unwrap_or_default()
}

/// A staging name for `name` that is free in `dir`, adding a random tag on collision.
fn free_staged_name(dir: &Path, name: &str) -> Result<String> {
    let plain = staged_name(name, None);
    if !dir.join(&plain).exists() {
        return Ok(plain);
    }
    for _ in 0..16 {
        let tag = uuid::Uuid::new_v4().simple().to_string();
        let candidate = staged_name(name, Some(&tag[..8]));
        if !dir.join(&candidate).exists() {
            return Ok(candidate);
        }
    }
    Err(Error::ItemConflict {
        entity: dir.display().to_string(),
        name: plain,
    })
}

/// `name` if free in `dir`, else the first free `stem_N.ext`.
fn free_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }
    (1..)
        .map(|n| numbered_variant(name, n))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| name.to_string())
}

/// The first entry of `dir` that a merge could not carry over: anything but
/// item files and the item index.
fn first_non_item(dir: &Path) -> Result<Option<PathBuf>> {
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let carried = entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(|name| {
                name == INDEX_FILE_NAME || is_supported_item(Path::new(name))
            });
        if !carried {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

/// Remove the merged-away directory, which must hold nothing but its index by now.
fn remove_source_dir(dir: &Path) -> Result<()> {
    match fs::remove_file(dir.join(INDEX_FILE_NAME)) {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error.into()),
    }
    fs::remove_dir(dir)?;
    Ok(())
}
