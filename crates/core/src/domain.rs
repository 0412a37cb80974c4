use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name of the sidecar index at both catalog levels.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Date recorded for items whose capture date could not be inferred.
pub const UNKNOWN_DATE: &str = "YYYY-MM-DD";

/// Item file extensions the catalog tracks (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

/// Descriptive metadata for one entity, stored in the root index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
}

impl EntityMetadata {
    /// Fill every blank field from `other`, keeping fields that already hold a value.
    pub fn fill_blanks_from(&mut self, other: &EntityMetadata) {
        for (mine, theirs) in [
            (&mut self.company, &other.company),
            (&mut self.year, &other.year),
            (&mut self.manufacturer, &other.manufacturer),
            (&mut self.model, &other.model),
        ] {
            if mine.trim().is_empty() && !theirs.trim().is_empty() {
                mine.clone_from(theirs);
            }
        }
    }
}

/// Per-item metadata, stored in the entity's item index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default = "unknown_date")]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

fn unknown_date() -> String {
    UNKNOWN_DATE.to_string()
}

impl ItemMetadata {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            description: String::new(),
            width: None,
            height: None,
        }
    }

    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// True when `date` holds a real date rather than the sentinel.
    pub fn has_known_date(&self) -> bool {
        self.date != UNKNOWN_DATE && crate::naming::is_valid_date(&self.date)
    }
}

/// Root index: entity key → metadata. Written sorted by key.
pub type EntityIndex = IndexMap<String, EntityMetadata>;

/// Item index: filename → metadata. Key order is display order and is preserved.
pub type ItemIndex = IndexMap<String, ItemMetadata>;

/// Direction for moving an item within its entity's ordered index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Result of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The item swapped places with its neighbor; carries the item's new position.
    Moved(usize),
    /// The item already sits at the boundary in the requested direction.
    NoOp,
}

/// Result of an entity rename request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The directory was renamed; carries the final key.
    Renamed(String),
    /// The entity was folded into an existing one.
    Merged(MergeReport),
    /// Empty target or same key after normalization.
    NoOp,
}

/// Summary of a completed merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub target: String,
    /// Files moved out of the merged-away entity.
    pub moved: usize,
    /// Files given a canonical `<key>_<date>_<NN>` name.
    pub renumbered: usize,
    /// Files with no recoverable date, left under their original name.
    pub unknown_date: Vec<String>,
}

/// Counts from a full catalog re-synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub entities: usize,
    pub items: usize,
    /// Entities whose item index could not be synchronized.
    pub failed: Vec<String>,
}

/// True when the path carries one of the supported item extensions.
pub fn is_supported_item(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let lower = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
}
