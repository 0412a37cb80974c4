mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pagekeeper_core::domain::Direction;
use pagekeeper_core::CatalogRoot;

/// pagekeeper — filesystem-backed image catalog
#[derive(Parser)]
#[command(name = "pagekeeper", version, about)]
struct Cli {
    /// Catalog root directory
    #[arg(long, global = true, env = "PAGEKEEPER_ROOT", default_value = "pages")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every index with the directory tree
    Sync,
    /// List entities
    Ls {
        /// Only show entities whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show an entity's metadata and items
    Show {
        entity: String,
    },
    /// Edit an entity's metadata
    SetInfo {
        entity: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Rename an entity, or merge it into an existing one
    Rename {
        old: String,
        new: String,
        /// Confirm merging when the new name is already taken
        #[arg(long)]
        merge: bool,
    },
    /// Manage the items of an entity
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Copy an image into an entity under the canonical filename
    Import {
        entity: String,
        file: PathBuf,
        /// Capture date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Copy every item taken on a date into a folder, with a report
    Export {
        /// Date to export (YYYY-MM-DD)
        date: String,
        /// Destination directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// List entity folders that contain no images
    Check,
}

#[derive(Subcommand)]
enum ItemAction {
    /// Move an item one position up or down
    Move {
        entity: String,
        /// Zero-based position in the item list
        position: usize,
        direction: DirectionArg,
    },
    /// Rename an item file
    Rename {
        entity: String,
        old: String,
        new: String,
    },
    /// Delete an item file
    Rm {
        entity: String,
        name: String,
    },
    /// Edit an item's date or description
    Set {
        entity: String,
        name: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let root = CatalogRoot::open(&cli.root)?;

    match cli.command {
        Commands::Sync => commands::sync::run(&root)?,
        Commands::Ls { filter } => commands::entities::list(&root, filter.as_deref())?,
        Commands::Show { entity } => commands::entities::show(&root, &entity)?,
        Commands::SetInfo {
            entity,
            company,
            year,
            manufacturer,
            model,
        } => commands::entities::set_info(&root, &entity, company, year, manufacturer, model)?,
        Commands::Rename { old, new, merge } => {
            commands::entities::rename(&root, &old, &new, merge)?
        }
        Commands::Item { action } => match action {
            ItemAction::Move {
                entity,
                position,
                direction,
            } => commands::items::reorder(&root, &entity, position, direction.into())?,
            ItemAction::Rename { entity, old, new } => {
                commands::items::rename(&root, &entity, &old, &new)?
            }
            ItemAction::Rm { entity, name } => commands::items::rm(&root, &entity, &name)?,
            ItemAction::Set {
                entity,
                name,
                date,
                description,
            } => commands::items::set(&root, &entity, &name, date.as_deref(), description.as_deref())?,
        },
        Commands::Import { entity, file, date } => {
            commands::transfer::import(&root, &entity, &file, &date)?
        }
        Commands::Export { date, out } => commands::transfer::export(&root, &date, &out)?,
        Commands::Check => commands::entities::check(&root)?,
    }

    Ok(())
}
