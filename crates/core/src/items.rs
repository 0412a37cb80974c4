use std::fs;
use std::io::ErrorKind;

use crate::domain::{is_supported_item, Direction, ItemIndex, ReorderOutcome, UNKNOWN_DATE};
use crate::error::{Error, Result};
use crate::naming::is_valid_date;
use crate::{store, sync, CatalogRoot};

/// Swap the item at `position` with its neighbor in `direction`.
pub fn reorder(
    root: &CatalogRoot,
    key: &str,
    position: usize,
    direction: Direction,
) -> Result<ReorderOutcome> {
    let key = root.resolve_key(key)?;
    let mut index = sync::sync_entity(root, &key)?;

    if position >= index.len() {
        return Err(Error::ItemOutOfRange {
            position,
            len: index.len(),
        });
    }

    let neighbor = match direction {
        Direction::Up if position == 0 => return Ok(ReorderOutcome::NoOp),
        Direction::Up => position - 1,
        Direction::Down if position + 1 == index.len() => return Ok(ReorderOutcome::NoOp),
        Direction::Down => position + 1,
    };

    index.swap_indices(position, neighbor);
    store::save(&root.item_index_path(&key), &index)?;
    sync::sync_entity(root, &key)?;

    log::info!("{}: moved item {} {} to {}", key, position, direction, neighbor);
    Ok(ReorderOutcome::Moved(neighbor))
}

/// Rename an item file and re-key its index entry in place.
pub fn rename_item(root: &CatalogRoot, key: &str, old_name: &str, new_name: &str) -> Result<()> {
    let key = root.resolve_key(key)?;
    validate_item_name(old_name)?;
    validate_item_name(new_name)?;

    let dir = root.entity_dir(&key);
    let old_path = dir.join(old_name);
    let new_path = dir.join(new_name);

    if old_name == new_name {
        return Ok(());
    }
    if !old_path.is_file() {
        return Err(Error::ItemNotFound {
            entity: key,
            name: old_name.to_string(),
        });
    }
    if new_path.exists() {
        return Err(Error::ItemConflict {
            entity: key,
            name: new_name.to_string(),
        });
    }

    let index = sync::sync_entity(root, &key)?;
    fs::rename(&old_path, &new_path)?;

    // Rebuild rather than remove+insert so the entry keeps its position.
    let renamed: ItemIndex = index
        .into_iter()
        .map(|(name, meta)| {
            if name == old_name {
                (new_name.to_string(), meta)
            } else {
                (name, meta)
            }
        })
        .collect();

    store::save(&root.item_index_path(&key), &renamed)?;
    sync::sync_entity(root, &key)?;

    log::info!("{}: renamed {} -> {}", key, old_name, new_name);
    Ok(())
}

/// Delete an item file and its index entry. Already-missing files are fine.
pub fn delete_item(root: &CatalogRoot, key: &str, name: &str) -> Result<()> {
    let key = root.resolve_key(key)?;
    validate_item_name(name)?;

    match fs::remove_file(root.entity_dir(&key).join(name)) {
        Ok(()) => log::info!("{}: deleted {}", key, name),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error.into()),
    }

    let index_path = root.item_index_path(&key);
    if let Some(mut index) = store::load::<ItemIndex>(&index_path).into_option() {
        if index.shift_remove(name).is_some() {
            store::save(&index_path, &index)?;
        }
    }

    sync::sync_entity(root, &key)?;
    Ok(())
}

/// Edit an item's date and/or description. Only writes when something changed.
pub fn update_item(
    root: &CatalogRoot,
    key: &str,
    name: &str,
    date: Option<&str>,
    description: Option<&str>,
) -> Result<bool> {
    let key = root.resolve_key(key)?;
    if let Some(date) = date {
        if date != UNKNOWN_DATE && !is_valid_date(date) {
            return Err(Error::InvalidDate(date.to_string()));
        }
    }

    let mut index = sync::sync_entity(root, &key)?;
    let meta = index.get_mut(name).ok_or_else(|| Error::ItemNotFound {
        entity: key.clone(),
        name: name.to_string(),
    })?;

    let mut changed = false;
    if let Some(date) = date {
        if meta.date != date {
            meta.date = date.to_string();
            changed = true;
        }
    }
    if let Some(description) = description {
        if meta.description != description {
            meta.description = description.to_string();
            changed = true;
        }
    }

    if changed {
        store::save(&root.item_index_path(&key), &index)?;
        log::info!("{}: updated metadata of {}", key, name);
    }
    Ok(changed)
}

fn validate_item_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != "..";
    if !plain || !is_supported_item(std::path::Path::new(name)) {
        return Err(Error::InvalidItemName(name.to_string()));
    }
    Ok(())
}
