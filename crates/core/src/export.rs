use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{EntityIndex, EntityMetadata, ItemIndex};
use crate::error::{Error, Result};
use crate::naming::is_valid_date;
use crate::{store, CatalogRoot};

/// Name of the plain-text report written next to the exported files.
pub const REPORT_FILE_NAME: &str = "out.txt";

/// Progress callback events for a date export.
pub enum ExportProgress {
    /// Starting export with the number of matching items.
    Start { total: usize },
    /// A file was copied.
    Copied { source: PathBuf, target: PathBuf },
    /// A file was skipped (already exists with same size).
    Skipped { path: PathBuf },
    /// An indexed item has no file on disk.
    Missing { path: PathBuf },
    /// Copying a file failed; the export carries on.
    Failed { path: PathBuf, error: String },
    /// Export completed.
    Complete {
        copied: usize,
        skipped: usize,
        missing: usize,
        failed: usize,
    },
}

/// Outcome of a date export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub copied: usize,
    pub skipped: usize,
    pub missing: usize,
    pub failed: usize,
    /// Entities that had at least one matching item, sorted.
    pub entities: Vec<String>,
    /// Path of the written report, if any item matched.
    pub report_path: Option<PathBuf>,
}

/// Copy every item dated `date` into `out_dir` and write the entity report.
/// Read-only with respect to the catalog.
pub fn export_date(
    root: &CatalogRoot,
    date: &str,
    out_dir: &Path,
    mut progress_cb: Option<&mut dyn FnMut(ExportProgress)>,
) -> Result<ExportReport> {
    if !is_valid_date(date) {
        return Err(Error::InvalidDate(date.to_string()));
    }

    let index_path = root.root_index_path();
    let entities: EntityIndex = match store::load(&index_path) {
        store::Loaded::Found(index) => index,
        store::Loaded::NotFound | store::Loaded::Corrupt(_) => {
            return Err(Error::IndexMissing(index_path))
        }
    };

    let matches = select_items(root, &entities, date);

    if let Some(ref mut cb) = progress_cb {
        cb(ExportProgress::Start {
            total: matches.len(),
        });
    }

    fs::create_dir_all(out_dir)?;
    let mut report = ExportReport::default();

    for (entity, name) in &matches {
        let source = root.entity_dir(entity).join(name);
        let target = out_dir.join(name);

        let size = match source.metadata() {
            Ok(meta) => meta.len(),
            Err(_) => {
                log::warn!("{} is indexed but missing on disk", source.display());
                report.missing += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Missing { path: source });
                }
                continue;
            }
        };

        match copy_item(&source, &target, size) {
            Ok(true) => {
                report.copied += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Copied {
                        source: source.clone(),
                        target,
                    });
                }
            }
            Ok(false) => {
                report.skipped += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Skipped { path: source.clone() });
                }
            }
            Err(error) => {
                log::warn!("failed to copy {}: {}", source.display(), error);
                report.failed += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(ExportProgress::Failed {
                        path: source,
                        error: error.to_string(),
                    });
                }
                continue;
            }
        }

        if report.entities.last() != Some(entity) {
            report.entities.push(entity.clone());
        }
    }

    report.entities.sort();
    report.entities.dedup();

    if !report.entities.is_empty() {
        let blocks: Vec<(&str, &EntityMetadata)> = report
            .entities
            .iter()
            .filter_map(|key| entities.get(key).map(|meta| (key.as_str(), meta)))
            .collect();
        let path = out_dir.join(REPORT_FILE_NAME);
        fs::write(&path, render_report(date, &blocks))?;
        report.report_path = Some(path);
    }

    if let Some(ref mut cb) = progress_cb {
        cb(ExportProgress::Complete {
            copied: report.copied,
            skipped: report.skipped,
            missing: report.missing,
            failed: report.failed,
        });
    }

    Ok(report)
}

/// `(entity, filename)` pairs whose recorded date equals `date`, in index order.
pub fn select_items(root: &CatalogRoot, entities: &EntityIndex, date: &str) -> Vec<(String, String)> {
    let mut selected = Vec::new();
    for key in entities.keys() {
        let items: ItemIndex = match store::load(&root.item_index_path(key)) {
            store::Loaded::Found(items) => items,
            store::Loaded::NotFound => continue,
            store::Loaded::Corrupt(_) => {
                log::warn!("item index of {} is unreadable, skipped", key);
                continue;
            }
        };
        selected.extend(
            items
                .iter()
                .filter(|(_, meta)| meta.date == date)
                .map(|(name, _)| (key.clone(), name.clone())),
        );
    }
    selected
}

/// Render the export report: one block per entity, separated by two blank lines.
pub fn render_report(date: &str, entities: &[(&str, &EntityMetadata)]) -> String {
    let display_date = date.replace('-', "/");
    entities
        .iter()
        .map(|(key, meta)| {
            format!(
                "{key}\n{} {} {}\n{display_date}\n\n#{}\n",
                meta.year, meta.manufacturer, meta.model, meta.company
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Copy a single file to the target path, creating parent directories as needed.
/// Returns Ok(false) if skipped (file exists with same size), Ok(true) if copied.
pub fn copy_item(source: &Path, target: &Path, expected_size: u64) -> Result<bool> {
    if let Ok(metadata) = target.metadata() {
        if metadata.is_file() && metadata.len() == expected_size {
            return Ok(false);
        }
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::copy(source, target)?;
    Ok(true)
}
