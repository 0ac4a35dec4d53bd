use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use recipebox_core::models::{Ingredient, MealType, Recipe, SlotId, week_start};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Calendar cell from a date argument and a meal type name.
pub(crate) fn parse_slot(date: &str, meal: &str) -> Result<SlotId> {
    let date = parse_date(Some(date.to_string()))?;
    let meal_type: MealType = meal.parse()?;
    Ok(SlotId::new(date, meal_type))
}

/// Monday-to-Sunday week containing `date` (default: today).
pub(crate) fn week_range(date: Option<String>) -> Result<(NaiveDate, NaiveDate)> {
    let start = week_start(parse_date(date)?);
    Ok((start, start + chrono::Duration::days(6)))
}

/// Resolve an optional `--start`/`--end` pair. Either both or neither.
pub(crate) fn parse_range(
    start: Option<String>,
    end: Option<String>,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(s), Some(e)) => Ok(Some((parse_date(Some(s))?, parse_date(Some(e))?))),
        _ => bail!("--start and --end must be given together"),
    }
}

/// Ingredient argument: `qty|unit|name`, `qty|name`, or just `name`.
pub(crate) fn parse_ingredient(s: &str) -> Result<Ingredient> {
    let parts: Vec<&str> = s.split('|').map(str::trim).collect();
    let ingredient = match parts.as_slice() {
        [name] => Ingredient::new("", "", name),
        [qty, name] => Ingredient::new(qty, "", name),
        [qty, unit, name] => Ingredient::new(qty, unit, name),
        _ => bail!("Invalid ingredient '{s}'. Use 'qty|unit|name', e.g. '2|cups|flour'"),
    };
    if ingredient.name.is_empty() {
        bail!("Invalid ingredient '{s}': name must not be empty");
    }
    Ok(ingredient)
}

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "")]
        favorite: &'static str,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            favorite: if r.is_favorite { "*" } else { "" },
            title: truncate(&r.title, 35),
            category: r.category.to_string(),
            time: truncate(&r.cooking_time, 15),
            servings: truncate(&r.servings, 10),
            ingredients: r.ingredients.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(6..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing item and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(2);
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
