use anyhow::Result;
use pagekeeper_core::domain::{Direction, ReorderOutcome};
use pagekeeper_core::CatalogRoot;

pub fn reorder(root: &CatalogRoot, entity: &str, position: usize, direction: Direction) -> Result<()> {
    match root.reorder_item(entity, position, direction)? {
        ReorderOutcome::Moved(to) => println!("Moved item {position} {direction} to {to}."),
        ReorderOutcome::NoOp => println!("Item {position} is already at the boundary."),
    }
    Ok(())
}

pub fn rename(root: &CatalogRoot, entity: &str, old: &str, new: &str) -> Result<()> {
    root.rename_item(entity, old, new)?;
    println!("Renamed {old} -> {new}.");
    Ok(())
}

pub fn rm(root: &CatalogRoot, entity: &str, name: &str) -> Result<()> {
    root.delete_item(entity, name)?;
    println!("Deleted {name}.");
    Ok(())
}

pub fn set(
    root: &CatalogRoot,
    entity: &str,
    name: &str,
    date: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    if root.update_item(entity, name, date, description)? {
        println!("Updated {name}.");
    } else {
        println!("{name} unchanged.");
    }
    Ok(())
}
