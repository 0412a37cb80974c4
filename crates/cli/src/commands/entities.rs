use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use pagekeeper_core::domain::{EntityMetadata, MergeReport, RenameOutcome};
use pagekeeper_core::CatalogRoot;

pub fn list(root: &CatalogRoot, filter: Option<&str>) -> Result<()> {
    let index = root.entities()?;
    let keys = root.search_entities(filter.unwrap_or(""))?;

    if keys.is_empty() {
        println!("No entities found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Entity"),
        Cell::new("Company"),
        Cell::new("Year"),
        Cell::new("Manufacturer"),
        Cell::new("Model"),
    ]);

    for key in &keys {
        let meta = index.get(key).cloned().unwrap_or_default();
        table.add_row(vec![
            Cell::new(key),
            Cell::new(meta.company),
            Cell::new(meta.year),
            Cell::new(meta.manufacturer),
            Cell::new(meta.model),
        ]);
    }

    println!("{table}");
    println!("  {} / {} entities", keys.len(), index.len());
    Ok(())
}

pub fn show(root: &CatalogRoot, entity: &str) -> Result<()> {
    let key = root.resolve_key(entity)?;
    let items = root.items(&key)?;
    let meta = root.entities()?.get(&key).cloned().unwrap_or_default();

    println!("{key}");
    println!("  Company:      {}", meta.company);
    println!("  Year:         {}", meta.year);
    println!("  Manufacturer: {}", meta.manufacturer);
    println!("  Model:        {}", meta.model);
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("File"),
        Cell::new("Date"),
        Cell::new("Size"),
        Cell::new("Description"),
    ]);

    for (position, (name, item)) in items.iter().enumerate() {
        let size = format!(
            "{}x{}",
            item.width.unwrap_or_default(),
            item.height.unwrap_or_default()
        );
        table.add_row(vec![
            Cell::new(position),
            Cell::new(name),
            Cell::new(&item.date),
            Cell::new(size),
            Cell::new(&item.description),
        ]);
    }

    println!("{table}");
    println!("  {} items", items.len());
    Ok(())
}

pub fn set_info(
    root: &CatalogRoot,
    entity: &str,
    company: Option<String>,
    year: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let key = root.resolve_key(entity)?;
    let current = root.entities()?.get(&key).cloned().unwrap_or_default();
    let updated = EntityMetadata {
        company: company.unwrap_or(current.company),
        year: year.unwrap_or(current.year),
        manufacturer: manufacturer.unwrap_or(current.manufacturer),
        model: model.unwrap_or(current.model),
    };

    if root.update_entity(&key, updated)? {
        println!("Updated {key}.");
    } else {
        println!("{key} unchanged.");
    }
    Ok(())
}

pub fn rename(root: &CatalogRoot, old: &str, new: &str, merge: bool) -> Result<()> {
    match root.rename_entity(old, new, merge)? {
        RenameOutcome::NoOp => println!("Nothing to do."),
        RenameOutcome::Renamed(key) => println!("Renamed {old} -> {key}."),
        RenameOutcome::Merged(report) => print_merge(old, &report),
    }
    Ok(())
}

fn print_merge(old: &str, report: &MergeReport) {
    println!(
        "Merged {old} into {}: {} files moved, {} renumbered.",
        report.target, report.moved, report.renumbered
    );
    if !report.unknown_date.is_empty() {
        println!("  Kept without a date (not renumbered):");
        for name in &report.unknown_date {
            println!("    {name}");
        }
    }
}

pub fn check(root: &CatalogRoot) -> Result<()> {
    let empty = root.empty_entities()?;
    if empty.is_empty() {
        println!("All entity folders contain images.");
        return Ok(());
    }

    println!("These entity folders are empty:");
    for key in &empty {
        println!("  {key}");
    }
    println!();
    println!("Add images to them or remove them.");
    Ok(())
}
