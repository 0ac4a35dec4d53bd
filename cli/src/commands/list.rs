use anyhow::Result;
use chrono::NaiveDate;

use recipebox_core::models::{Session, ShoppingCategory};
use recipebox_core::service::RecipeBoxService;
use recipebox_core::view::ShoppingListView;

use super::helpers::{exit_not_found, parse_range, week_range};

pub(crate) fn cmd_list_show(svc: &RecipeBoxService, session: &Session, json: bool) -> Result<()> {
    let view = ShoppingListView::new(svc.list_items(session)?);
    if json {
        println!("{}", serde_json::to_string_pretty(view.items())?);
        return Ok(());
    }
    if view.items().is_empty() {
        eprintln!("Shopping list is empty");
        return Ok(());
    }
    for (category, items) in view.grouped() {
        println!("{category}");
        for item in items {
            let mark = if item.is_checked { "x" } else { " " };
            println!("  [{mark}] {} (#{})", item.name, item.id);
        }
    }
    println!("\n{} of {} remaining", view.remaining(), view.items().len());
    Ok(())
}

pub(crate) fn cmd_list_add(
    svc: &RecipeBoxService,
    session: &Session,
    name: &str,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let category = category.map(str::parse::<ShoppingCategory>).transpose()?;
    let item = svc.add_item(session, name, category)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Added {} to {} (id: {})", item.name, item.category, item.id);
    }
    Ok(())
}

/// Toggle an item's checked state through the optimistic list view.
pub(crate) fn cmd_list_check(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    json: bool,
) -> Result<()> {
    let mut view = ShoppingListView::new(svc.list_items(session)?);
    let Some(item) = view.toggle(id, |checked| svc.set_item_checked(session, id, checked))? else {
        exit_not_found(&format!("Shopping list item {id} not found"), json);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        let state = if item.is_checked { "Checked" } else { "Unchecked" };
        println!("{state} {}", item.name);
    }
    Ok(())
}

pub(crate) fn cmd_list_delete(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    json: bool,
) -> Result<()> {
    if !svc.delete_item(session, id)? {
        exit_not_found(&format!("Shopping list item {id} not found"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_list_clear(svc: &RecipeBoxService, session: &Session, json: bool) -> Result<()> {
    let removed = svc.clear_list(session)?;
    print_removed(removed, "items", json);
    Ok(())
}

pub(crate) fn cmd_list_clear_checked(
    svc: &RecipeBoxService,
    session: &Session,
    json: bool,
) -> Result<()> {
    let removed = svc.remove_checked(session)?;
    print_removed(removed, "checked items", json);
    Ok(())
}

pub(crate) fn cmd_list_cleanup(
    svc: &RecipeBoxService,
    session: &Session,
    json: bool,
) -> Result<()> {
    let removed = svc.cleanup_orphans(session)?;
    print_removed(removed, "orphaned items", json);
    Ok(())
}

fn print_removed(removed: usize, what: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {removed} {what}");
    }
}

pub(crate) fn cmd_list_sync(
    svc: &RecipeBoxService,
    session: &Session,
    start: Option<String>,
    end: Option<String>,
    json: bool,
) -> Result<()> {
    let (start, end): (NaiveDate, NaiveDate) = match parse_range(start, end)? {
        Some(range) => range,
        None => week_range(None)?,
    };
    let report = svc.sync_shopping_list(session, start, end)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "Synced {} of {} planned meals ({start} to {end}): {} added, {} removed",
        report.synced, report.placements, report.added, report.removed
    );
    for failure in &report.failures {
        eprintln!(
            "Warning: meal plan item {} failed: {}",
            failure.meal_plan_id, failure.error
        );
    }
    Ok(())
}
