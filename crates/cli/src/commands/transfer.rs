use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use pagekeeper_core::{CatalogRoot, ExportProgress};

pub fn import(root: &CatalogRoot, entity: &str, file: &Path, date: &str) -> Result<()> {
    let name = root.import_item(entity, file, date)?;
    println!("Imported {} as {name}.", file.display());
    Ok(())
}

pub fn export(root: &CatalogRoot, date: &str, out: &Path) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let report = root.export_date(
        date,
        out,
        Some(&mut |progress| match progress {
            ExportProgress::Start { total } => {
                pb.set_length(total as u64);
                pb.set_position(0);
                pb.set_message(format!("Exporting photos from {date}..."));
            }
            ExportProgress::Copied { target, .. } => {
                pb.inc(1);
                pb.set_message(format!("-> {}", target.display()));
            }
            ExportProgress::Skipped { .. } => {
                pb.inc(1);
            }
            ExportProgress::Missing { path } => {
                pb.inc(1);
                pb.println(format!("  ! missing on disk: {}", path.display()));
            }
            ExportProgress::Failed { path, error } => {
                pb.inc(1);
                pb.println(format!("  ! failed to copy {}: {error}", path.display()));
            }
            ExportProgress::Complete {
                copied,
                skipped,
                missing,
                failed,
            } => {
                pb.finish_with_message(format!(
                    "{copied} copied, {skipped} skipped, {missing} missing, {failed} failed"
                ));
            }
        }),
    )?;

    match report.report_path {
        Some(path) => println!(
            "Exported {} entities; report written to {}.",
            report.entities.len(),
            path.display()
        ),
        None => println!("No photos found for {date}."),
    }
    Ok(())
}
