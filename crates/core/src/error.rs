use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid entity name: {0:?}")]
    InvalidEntityKey(String),

    #[error("item not found in {entity}: {name}")]
    ItemNotFound { entity: String, name: String },

    #[error("item already exists in {entity}: {name}")]
    ItemConflict { entity: String, name: String },

    #[error("invalid item name: {0:?}")]
    InvalidItemName(String),

    #[error("item position {position} out of range ({len} items)")]
    ItemOutOfRange { position: usize, len: usize },

    #[error("invalid date {0:?} — expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("entity {target} already exists — merging {entity} into it must be confirmed")]
    MergeNotConfirmed { entity: String, target: String },

    #[error("cannot merge {entity}: {} is not an item", .path.display())]
    UnmergeableEntry { entity: String, path: PathBuf },

    #[error("root index not found: {}", .0.display())]
    IndexMissing(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
