use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use pagekeeper_core::{CatalogRoot, SyncProgress};

fn active_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {bar:30.cyan/blue} {spinner:.green} {pos:>5}/{len:<5} {prefix:.dim} {msg}",
    )
    .unwrap()
    .progress_chars("━╸─")
}

pub fn run(root: &CatalogRoot) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(active_style());
    pb.set_prefix("Syncing");

    let summary = root.sync_all(Some(&mut |progress| match progress {
        SyncProgress::RootSynced { entities } => {
            pb.set_length(entities as u64);
            pb.set_position(0);
        }
        SyncProgress::EntitySynced { entity, .. } => {
            pb.set_message(entity);
            pb.inc(1);
        }
        SyncProgress::EntityFailed { entity, error } => {
            pb.println(format!("  ! {entity}: {error}"));
            pb.inc(1);
        }
        SyncProgress::Complete { .. } => {
            pb.finish_and_clear();
        }
    }))?;

    println!(
        "Synced {} entities ({} items).",
        summary.entities, summary.items
    );
    if !summary.failed.is_empty() {
        println!(
            "{} entities could not be synced: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        );
    }
    Ok(())
}
