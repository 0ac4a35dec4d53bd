//! Recipe dashboard browsing: search, filter, sort, and paging.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecipeBoxError;
use crate::models::Recipe;

pub const PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSort {
    #[default]
    ServingsAsc,
    TimeAsc,
    IngredientsAsc,
}

impl FromStr for RecipeSort {
    type Err = RecipeBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "servings_asc" | "servings" => Ok(Self::ServingsAsc),
            "time_asc" | "time" => Ok(Self::TimeAsc),
            "ingredients_asc" | "ingredients" => Ok(Self::IngredientsAsc),
            _ => Err(RecipeBoxError::invalid(format!(
                "Invalid sort '{s}'. Must be one of: servings_asc, time_asc, ingredients_asc"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipeQuery {
    /// Matches the title or any ingredient name, case-insensitively.
    pub query: Option<String>,
    pub favorites_only: bool,
    /// Meal type name; "All" or absent means no filter.
    pub category: Option<String>,
    pub sort: RecipeSort,
    /// 1-based page number.
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Leading digits of `s`, if any.
fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// First run of digits followed (after optional whitespace) by `unit`.
fn number_before(s: &str, unit: char) -> Option<u32> {
    let mut rest = s;
    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        let tail = &rest[start..];
        let len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
        let after = tail[len..].trim_start();
        if after.starts_with(unit) {
            return tail[..len].parse().ok();
        }
        rest = &tail[len..];
    }
    None
}

/// Minutes in a free-text cooking time such as "1 hr 30 mins" or "45".
#[must_use]
pub fn cooking_minutes(cooking_time: &str) -> u32 {
    let lower = cooking_time.to_lowercase();
    let hours = number_before(&lower, 'h');
    let minutes = number_before(&lower, 'm');
    if hours.is_none() && minutes.is_none() {
        return first_number(&lower).unwrap_or(0);
    }
    hours.unwrap_or(0).saturating_mul(60).saturating_add(minutes.unwrap_or(0))
}

fn first_number(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    leading_number(&s[start..])
}

/// First integer in a free-text servings field, or 0.
#[must_use]
pub fn servings_count(servings: &str) -> u32 {
    first_number(servings).unwrap_or(0)
}

fn matches(recipe: &Recipe, query: &RecipeQuery) -> bool {
    if query.favorites_only && !recipe.is_favorite {
        return false;
    }
    if let Some(category) = query.category.as_deref().map(str::trim) {
        if !category.is_empty()
            && !category.eq_ignore_ascii_case("all")
            && !recipe.category.as_str().eq_ignore_ascii_case(category)
        {
            return false;
        }
    }
    match query.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => {
            let q = q.to_lowercase();
            recipe.title.to_lowercase().contains(&q)
                || recipe
                    .ingredients
                    .iter()
                    .any(|ing| ing.name.to_lowercase().contains(&q))
        }
        _ => true,
    }
}

/// Filter, sort, and page a user's recipes. Sorting is stable, so ties keep
/// the incoming (newest first) order.
#[must_use]
pub fn browse(recipes: Vec<Recipe>, query: &RecipeQuery) -> RecipePage {
    let mut filtered: Vec<Recipe> = recipes.into_iter().filter(|r| matches(r, query)).collect();

    match query.sort {
        RecipeSort::ServingsAsc => filtered.sort_by_key(|r| servings_count(&r.servings)),
        RecipeSort::TimeAsc => filtered.sort_by_key(|r| cooking_minutes(&r.cooking_time)),
        RecipeSort::IngredientsAsc => filtered.sort_by_key(|r| r.ingredients.len()),
    }

    let total = filtered.len();
    let total_pages = total.div_ceil(PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let recipes = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();

    RecipePage {
        recipes,
        page,
        total_pages,
        total,
    }
}
