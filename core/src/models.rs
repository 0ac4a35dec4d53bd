use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RecipeBoxError;

// --- Meal types and calendar slots ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Dessert,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Dessert => "Dessert",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = RecipeBoxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        MealType::ALL
            .into_iter()
            .find(|m| m.as_str().to_lowercase() == lower)
            .ok_or_else(|| {
                RecipeBoxError::invalid(format!(
                    "Invalid meal type '{s}'. Must be one of: Breakfast, Lunch, Dinner, Dessert"
                ))
            })
    }
}

/// English weekday name used on meal plan rows.
#[must_use]
pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// One calendar cell, rendered as `YYYY-MM-DD::MealType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub date: NaiveDate,
    pub meal_type: MealType,
}

impl SlotId {
    #[must_use]
    pub fn new(date: NaiveDate, meal_type: MealType) -> Self {
        Self { date, meal_type }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.date.format("%Y-%m-%d"), self.meal_type)
    }
}

impl FromStr for SlotId {
    type Err = RecipeBoxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (date, meal) = s.split_once("::").ok_or_else(|| {
            RecipeBoxError::invalid(format!(
                "Invalid slot '{s}'. Use format 'YYYY-MM-DD::MealType'"
            ))
        })?;
        let date = parse_iso_date(date)?;
        Ok(Self {
            date,
            meal_type: meal.parse()?,
        })
    }
}

pub fn parse_iso_date(s: &str) -> std::result::Result<NaiveDate, RecipeBoxError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| RecipeBoxError::invalid(format!("Invalid date '{s}'. Use YYYY-MM-DD")))
}

// --- Shopping categories ---

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ShoppingCategory {
    Produce,
    #[serde(rename = "Dairy & Eggs")]
    DairyEggs,
    #[serde(rename = "Meat & Fish")]
    MeatFish,
    #[serde(rename = "Pantry Staples")]
    PantryStaples,
    #[default]
    Other,
}

impl ShoppingCategory {
    /// Display order on the shopping list.
    pub const ALL: [ShoppingCategory; 5] = [
        ShoppingCategory::Produce,
        ShoppingCategory::DairyEggs,
        ShoppingCategory::MeatFish,
        ShoppingCategory::PantryStaples,
        ShoppingCategory::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ShoppingCategory::Produce => "Produce",
            ShoppingCategory::DairyEggs => "Dairy & Eggs",
            ShoppingCategory::MeatFish => "Meat & Fish",
            ShoppingCategory::PantryStaples => "Pantry Staples",
            ShoppingCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ShoppingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShoppingCategory {
    type Err = RecipeBoxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ShoppingCategory::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == lower)
            .ok_or_else(|| {
                RecipeBoxError::invalid(format!(
                    "Invalid category '{s}'. Must be one of: Produce, Dairy & Eggs, Meat & Fish, Pantry Staples, Other"
                ))
            })
    }
}

// --- Users ---

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

/// Authenticated user handle passed to every user-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

// --- Recipes ---

/// One ingredient line. All fields are free text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub qty: String,
    #[serde(default)]
    pub unit: String,
    pub name: String,
}

impl Ingredient {
    #[must_use]
    pub fn new(qty: &str, unit: &str, name: &str) -> Self {
        Self {
            qty: qty.to_string(),
            unit: unit.to_string(),
            name: name.to_string(),
        }
    }

    /// Shopping list line, e.g. "2 cups flour".
    #[must_use]
    pub fn display_string(&self) -> String {
        format!("{} {} {}", self.qty, self.unit, self.name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub user_id: i64,
    pub title: String,
    pub cooking_time: String,
    pub servings: String,
    pub category: MealType,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub cooking_time: String,
    #[serde(default)]
    pub servings: String,
    pub category: MealType,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub category: Option<MealType>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<String>,
}

impl RecipeUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.cooking_time.is_none()
            && self.servings.is_none()
            && self.category.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
    }
}

pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        bail!(RecipeBoxError::invalid("Recipe title must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub fn validate_ingredients(ingredients: &[Ingredient]) -> Result<()> {
    if let Some(pos) = ingredients.iter().position(|i| i.name.trim().is_empty()) {
        bail!(RecipeBoxError::invalid(format!(
            "Ingredient {} has an empty name",
            pos + 1
        )));
    }
    Ok(())
}

// --- Meal plans ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanItem {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub user_id: i64,
    pub recipe_id: i64,
    pub date: String,
    pub day: String,
    pub meal_type: MealType,
    pub order: i64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_title: Option<String>,
}

impl MealPlanItem {
    #[must_use]
    pub fn slot_id(&self) -> String {
        format!("{}::{}", self.date, self.meal_type)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotPlan {
    pub slot: String,
    pub meal_type: MealType,
    pub items: Vec<MealPlanItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayPlan {
    pub date: String,
    pub day: String,
    pub meals: Vec<SlotPlan>,
}

/// Monday-first grid of 7 days by 4 meal types.
#[derive(Debug, Clone, Serialize)]
pub struct WeekPlan {
    pub start: String,
    pub end: String,
    pub days: Vec<DayPlan>,
}

// --- Shopping list ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub user_id: i64,
    pub name: String,
    pub category: ShoppingCategory,
    pub is_checked: bool,
    pub meal_plan_id: Option<i64>,
    pub created_at: String,
}

pub fn validate_item_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!(RecipeBoxError::invalid("Item name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Outcome of one placement that failed during a sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub meal_plan_id: i64,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub placements: usize,
    pub synced: usize,
    pub skipped: usize,
    pub added: usize,
    pub removed: usize,
    pub failures: Vec<SyncFailure>,
}
