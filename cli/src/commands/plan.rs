use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use recipebox_core::models::{Session, SlotPlan, WeekPlan};
use recipebox_core::service::RecipeBoxService;

use super::helpers::{exit_not_found, parse_date, parse_range, parse_slot, truncate};

pub(crate) fn cmd_plan_add(
    svc: &RecipeBoxService,
    session: &Session,
    recipe_id: i64,
    date: &str,
    meal: &str,
    json: bool,
) -> Result<()> {
    let slot = parse_slot(date, meal)?;
    let item = svc.add_to_meal_plan(session, recipe_id, &slot)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        let title = item.recipe_title.as_deref().unwrap_or("recipe");
        println!(
            "Planned {title} for {} {} (id: {})",
            item.day, item.meal_type, item.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_plan_move(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    date: &str,
    meal: &str,
    json: bool,
) -> Result<()> {
    let slot = parse_slot(date, meal)?;
    let item = svc.move_placement(session, id, &slot)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Moved {id} to {slot}");
    }
    Ok(())
}

pub(crate) fn cmd_plan_remove(
    svc: &RecipeBoxService,
    session: &Session,
    id: i64,
    json: bool,
) -> Result<()> {
    if !svc.remove_from_meal_plan(session, id)? {
        exit_not_found(&format!("Meal plan item {id} not found"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "removed": id }));
    } else {
        println!("Removed meal plan item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_plan_week(
    svc: &RecipeBoxService,
    session: &Session,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let week = svc.week_plan(session, parse_date(date)?)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&week)?);
        return Ok(());
    }
    println!("Week of {} to {}", week.start, week.end);
    println!("{}", week_table(&week));
    Ok(())
}

fn cell(slot: &SlotPlan) -> String {
    slot.items
        .iter()
        .map(|item| {
            let title = item.recipe_title.as_deref().unwrap_or("?");
            format!("{} (#{})", truncate(title, 18), item.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn week_table(week: &WeekPlan) -> String {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Breakfast")]
        breakfast: String,
        #[tabled(rename = "Lunch")]
        lunch: String,
        #[tabled(rename = "Dinner")]
        dinner: String,
        #[tabled(rename = "Dessert")]
        dessert: String,
    }

    let rows: Vec<DayRow> = week
        .days
        .iter()
        .map(|d| {
            let meal = |i: usize| d.meals.get(i).map(cell).unwrap_or_default();
            DayRow {
                day: format!("{}\n{}", d.day, d.date),
                breakfast: meal(0),
                lunch: meal(1),
                dinner: meal(2),
                dessert: meal(3),
            }
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

pub(crate) fn cmd_plan_clear(
    svc: &RecipeBoxService,
    session: &Session,
    start: Option<String>,
    end: Option<String>,
    json: bool,
) -> Result<()> {
    let removed = match parse_range(start, end)? {
        Some((start, end)) => svc.clear_meal_plan_for_range(session, start, end)?,
        None => svc.clear_meal_plan(session)?,
    };
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {removed} meal plan items");
    }
    Ok(())
}
