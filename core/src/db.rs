use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::{
    Ingredient, MealPlanItem, MealType, NewRecipe, Recipe, RecipeUpdate, ShoppingCategory,
    ShoppingListItem, SlotId, User, day_name,
};
use crate::reconcile::ReconcilePlan;

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ShoppingCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ShoppingCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    token TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    cooking_time TEXT NOT NULL DEFAULT '',
                    servings TEXT NOT NULL DEFAULT '',
                    category TEXT NOT NULL,
                    ingredients TEXT NOT NULL DEFAULT '[]',
                    instructions TEXT NOT NULL DEFAULT '',
                    image_url TEXT,
                    is_favorite INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meal_plans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    date TEXT NOT NULL,
                    day TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS shopping_list_items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL DEFAULT 'Other',
                    is_checked INTEGER NOT NULL DEFAULT 0,
                    meal_plan_id INTEGER,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_user ON recipes(user_id);
                CREATE INDEX IF NOT EXISTS idx_meal_plans_user_date ON meal_plans(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_shopping_user ON shopping_list_items(user_id);
                CREATE INDEX IF NOT EXISTS idx_shopping_meal_plan ON shopping_list_items(meal_plan_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    // Expects columns:
    // 0: id, 1: uuid, 2: user_id, 3: title, 4: cooking_time, 5: servings,
    // 6: category, 7: ingredients (JSON), 8: instructions, 9: image_url,
    // 10: is_favorite, 11: created_at, 12: updated_at
    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        let ingredients_json: String = row.get(7)?;
        let ingredients: Vec<Ingredient> =
            serde_json::from_str(&ingredients_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
        Ok(Recipe {
            id: row.get(0)?,
            uuid: row.get(1)?,
            user_id: row.get(2)?,
            title: row.get(3)?,
            cooking_time: row.get(4)?,
            servings: row.get(5)?,
            category: row.get(6)?,
            ingredients,
            instructions: row.get(8)?,
            image_url: row.get(9)?,
            is_favorite: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    // Expects columns:
    // 0: mp.id, 1: mp.uuid, 2: mp.user_id, 3: mp.recipe_id, 4: mp.date, 5: mp.day,
    // 6: mp.meal_type, 7: mp.sort_order, 8: mp.created_at, 9: r.title
    fn meal_plan_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealPlanItem> {
        Ok(MealPlanItem {
            id: row.get(0)?,
            uuid: row.get(1)?,
            user_id: row.get(2)?,
            recipe_id: row.get(3)?,
            date: row.get(4)?,
            day: row.get(5)?,
            meal_type: row.get(6)?,
            order: row.get(7)?,
            created_at: row.get(8)?,
            recipe_title: row.get(9)?,
        })
    }

    fn shopping_item_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingListItem> {
        Ok(ShoppingListItem {
            id: row.get(0)?,
            uuid: row.get(1)?,
            user_id: row.get(2)?,
            name: row.get(3)?,
            category: row.get(4)?,
            is_checked: row.get(5)?,
            meal_plan_id: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // --- Users ---

    /// Create a user with a freshly generated API token.
    pub fn insert_user(&self, username: &str, token: &str) -> Result<User> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO users (username, token, created_at) VALUES (?1, ?2, ?3)",
                params![username, token, now],
            )
            .with_context(|| format!("Failed to create user '{username}'"))?;
        let id = self.conn.last_insert_rowid();
        Ok(User {
            id,
            username: username.to_string(),
            created_at: now,
        })
    }

    pub fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE token = ?1",
                params![token],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_token(&self, user_id: i64) -> Result<Option<String>> {
        let token = self
            .conn
            .query_row(
                "SELECT token FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(token)
    }

    // --- Recipes ---

    const RECIPE_COLUMNS: &'static str = "id, uuid, user_id, title, cooking_time, servings, category, ingredients, instructions, image_url, is_favorite, created_at, updated_at";

    pub fn insert_recipe(&self, user_id: i64, recipe: &NewRecipe) -> Result<Recipe> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let ingredients = serde_json::to_string(&recipe.ingredients)?;
        self.conn.execute(
            "INSERT INTO recipes (uuid, user_id, title, cooking_time, servings, category, ingredients, instructions, image_url, is_favorite, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)",
            params![
                uuid,
                user_id,
                recipe.title,
                recipe.cooking_time,
                recipe.servings,
                recipe.category,
                ingredients,
                recipe.instructions,
                recipe.image_url,
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_recipe(user_id, id)?.context("Recipe not found")
    }

    pub fn get_recipe(&self, user_id: i64, id: i64) -> Result<Option<Recipe>> {
        let recipe = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM recipes WHERE id = ?1 AND user_id = ?2",
                    Self::RECIPE_COLUMNS
                ),
                params![id, user_id],
                Self::recipe_from_row,
            )
            .optional()?;
        Ok(recipe)
    }

    /// All recipes owned by the user, newest first.
    pub fn list_recipes(&self, user_id: i64) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM recipes WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            Self::RECIPE_COLUMNS
        ))?;
        let recipes = stmt
            .query_map(params![user_id], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Apply a partial update. Returns `None` when the recipe does not exist.
    pub fn update_recipe(
        &self,
        user_id: i64,
        id: i64,
        update: &RecipeUpdate,
    ) -> Result<Option<Recipe>> {
        let Some(mut recipe) = self.get_recipe(user_id, id)? else {
            return Ok(None);
        };

        if let Some(ref title) = update.title {
            recipe.title.clone_from(title);
        }
        if let Some(ref cooking_time) = update.cooking_time {
            recipe.cooking_time.clone_from(cooking_time);
        }
        if let Some(ref servings) = update.servings {
            recipe.servings.clone_from(servings);
        }
        if let Some(category) = update.category {
            recipe.category = category;
        }
        if let Some(ref ingredients) = update.ingredients {
            recipe.ingredients.clone_from(ingredients);
        }
        if let Some(ref instructions) = update.instructions {
            recipe.instructions.clone_from(instructions);
        }

        let now = Local::now().to_rfc3339();
        let ingredients = serde_json::to_string(&recipe.ingredients)?;
        self.conn.execute(
            "UPDATE recipes SET title = ?1, cooking_time = ?2, servings = ?3, category = ?4,
                    ingredients = ?5, instructions = ?6, updated_at = ?7
             WHERE id = ?8 AND user_id = ?9",
            params![
                recipe.title,
                recipe.cooking_time,
                recipe.servings,
                recipe.category,
                ingredients,
                recipe.instructions,
                now,
                id,
                user_id,
            ],
        )?;
        self.get_recipe(user_id, id)
    }

    pub fn set_recipe_favorite(&self, user_id: i64, id: i64, favorite: bool) -> Result<bool> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE recipes SET is_favorite = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![favorite, now, id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn set_recipe_image(&self, user_id: i64, id: i64, image_url: &str) -> Result<bool> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE recipes SET image_url = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![image_url, now, id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Delete a recipe. Its meal plan placements go with it.
    pub fn delete_recipe(&self, user_id: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM recipes WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    // --- Meal plans ---

    const MEAL_PLAN_SELECT: &'static str = "SELECT mp.id, mp.uuid, mp.user_id, mp.recipe_id, mp.date, mp.day, mp.meal_type, mp.sort_order, mp.created_at, r.title
         FROM meal_plans mp
         LEFT JOIN recipes r ON r.id = mp.recipe_id";

    fn next_slot_order(&self, user_id: i64, slot: &SlotId) -> Result<i64> {
        let order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM meal_plans
             WHERE user_id = ?1 AND date = ?2 AND meal_type = ?3",
            params![user_id, format_date(slot.date), slot.meal_type],
            |row| row.get(0),
        )?;
        Ok(order)
    }

    /// Place a recipe at the end of a slot.
    pub fn insert_placement(
        &self,
        user_id: i64,
        recipe_id: i64,
        slot: &SlotId,
    ) -> Result<MealPlanItem> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let order = self.next_slot_order(user_id, slot)?;
        self.conn.execute(
            "INSERT INTO meal_plans (uuid, user_id, recipe_id, date, day, meal_type, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                uuid,
                user_id,
                recipe_id,
                format_date(slot.date),
                day_name(slot.date),
                slot.meal_type,
                order,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_placement(user_id, id)?
            .context("Meal plan item not found")
    }

    pub fn get_placement(&self, user_id: i64, id: i64) -> Result<Option<MealPlanItem>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "{} WHERE mp.id = ?1 AND mp.user_id = ?2",
                    Self::MEAL_PLAN_SELECT
                ),
                params![id, user_id],
                Self::meal_plan_from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Placements with `start <= date <= end`, ordered by date, slot order, then id.
    pub fn get_meal_plan(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealPlanItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE mp.user_id = ?1 AND mp.date >= ?2 AND mp.date <= ?3
             ORDER BY mp.date, mp.sort_order, mp.id",
            Self::MEAL_PLAN_SELECT
        ))?;
        let items = stmt
            .query_map(
                params![user_id, format_date(start), format_date(end)],
                Self::meal_plan_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Re-drop a placement into another slot, appended after existing items.
    pub fn move_placement(
        &self,
        user_id: i64,
        id: i64,
        slot: &SlotId,
    ) -> Result<Option<MealPlanItem>> {
        if self.get_placement(user_id, id)?.is_none() {
            return Ok(None);
        }
        let order = self.next_slot_order(user_id, slot)?;
        self.conn.execute(
            "UPDATE meal_plans SET date = ?1, day = ?2, meal_type = ?3, sort_order = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                format_date(slot.date),
                day_name(slot.date),
                slot.meal_type,
                order,
                id,
                user_id,
            ],
        )?;
        self.get_placement(user_id, id)
    }

    pub fn delete_placement(&self, user_id: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM meal_plans WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn clear_meal_plan(&self, user_id: i64) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM meal_plans WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }

    pub fn clear_meal_plan_range(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM meal_plans WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
            params![user_id, format_date(start), format_date(end)],
        )?;
        Ok(rows)
    }

    // --- Shopping list ---

    const SHOPPING_COLUMNS: &'static str =
        "id, uuid, user_id, name, category, is_checked, meal_plan_id, created_at";

    pub fn list_items(&self, user_id: i64) -> Result<Vec<ShoppingListItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM shopping_list_items WHERE user_id = ?1 ORDER BY created_at, id",
            Self::SHOPPING_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![user_id], Self::shopping_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn items_for_placement(
        &self,
        user_id: i64,
        meal_plan_id: i64,
    ) -> Result<Vec<ShoppingListItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM shopping_list_items WHERE user_id = ?1 AND meal_plan_id = ?2 ORDER BY id",
            Self::SHOPPING_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![user_id, meal_plan_id], Self::shopping_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_item(&self, user_id: i64, id: i64) -> Result<Option<ShoppingListItem>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM shopping_list_items WHERE id = ?1 AND user_id = ?2",
                    Self::SHOPPING_COLUMNS
                ),
                params![id, user_id],
                Self::shopping_item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn insert_item(
        &self,
        user_id: i64,
        name: &str,
        category: ShoppingCategory,
        meal_plan_id: Option<i64>,
    ) -> Result<ShoppingListItem> {
        self.insert_item_row(user_id, name, category, meal_plan_id)?;
        let id = self.conn.last_insert_rowid();
        self.get_item(user_id, id)?
            .context("Shopping list item not found")
    }

    fn insert_item_row(
        &self,
        user_id: i64,
        name: &str,
        category: ShoppingCategory,
        meal_plan_id: Option<i64>,
    ) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO shopping_list_items (uuid, user_id, name, category, is_checked, meal_plan_id, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            params![uuid, user_id, name, category, meal_plan_id, now],
        )?;
        Ok(())
    }

    pub fn set_item_checked(
        &self,
        user_id: i64,
        id: i64,
        checked: bool,
    ) -> Result<Option<ShoppingListItem>> {
        let rows = self.conn.execute(
            "UPDATE shopping_list_items SET is_checked = ?1 WHERE id = ?2 AND user_id = ?3",
            params![checked, id, user_id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        self.get_item(user_id, id)
    }

    pub fn delete_item(&self, user_id: i64, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_list_items WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn clear_items(&self, user_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_list_items WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(rows)
    }

    pub fn delete_checked_items(&self, user_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_list_items WHERE user_id = ?1 AND is_checked = 1",
            params![user_id],
        )?;
        Ok(rows)
    }

    /// Delete rows whose placement reference no longer points at a placement.
    pub fn delete_orphan_items(&self, user_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM shopping_list_items
             WHERE user_id = ?1
               AND meal_plan_id IS NOT NULL
               AND meal_plan_id NOT IN (SELECT id FROM meal_plans)",
            params![user_id],
        )?;
        Ok(rows)
    }

    /// Apply a reconcile plan for one placement atomically.
    /// Returns `(added, removed)`.
    pub fn apply_reconcile(
        &self,
        user_id: i64,
        meal_plan_id: i64,
        plan: &ReconcilePlan,
    ) -> Result<(usize, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        for id in &plan.to_remove {
            removed += tx.execute(
                "DELETE FROM shopping_list_items WHERE id = ?1 AND user_id = ?2 AND meal_plan_id = ?3",
                params![id, user_id, meal_plan_id],
            )?;
        }
        for item in &plan.to_add {
            self.insert_item_row(user_id, &item.name, item.category, Some(meal_plan_id))?;
        }
        tx.commit()
            .with_context(|| format!("Failed to commit shopping list sync for meal plan {meal_plan_id}"))?;
        Ok((plan.to_add.len(), removed))
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{self, target_items};

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db.insert_user("alice", "token-a").unwrap();
        (db, user.id)
    }

    fn sample_recipe() -> NewRecipe {
        NewRecipe {
            title: "Pancakes".to_string(),
            cooking_time: "20 mins".to_string(),
            servings: "4".to_string(),
            category: MealType::Breakfast,
            ingredients: vec![
                Ingredient::new("2", "cups", "flour"),
                Ingredient::new("1", "cup", "milk"),
            ],
            instructions: "Mix and fry.".to_string(),
            image_url: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn slot(d: &str, meal: MealType) -> SlotId {
        SlotId::new(date(d), meal)
    }

    #[test]
    fn test_insert_and_lookup_user() {
        let (db, user_id) = setup();
        let by_token = db.get_user_by_token("token-a").unwrap().unwrap();
        assert_eq!(by_token.id, user_id);
        let by_name = db.get_user_by_name("ALICE").unwrap().unwrap();
        assert_eq!(by_name.id, user_id);
        assert!(db.get_user_by_token("nope").unwrap().is_none());
        assert_eq!(db.get_user_token(user_id).unwrap().as_deref(), Some("token-a"));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (db, _) = setup();
        assert!(db.insert_user("Alice", "token-b").is_err());
    }

    #[test]
    fn test_insert_and_get_recipe() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();

        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.category, MealType::Breakfast);
        assert_eq!(recipe.ingredients.len(), 2);
        assert!(!recipe.is_favorite);
        assert!(!recipe.uuid.is_empty());

        let fetched = db.get_recipe(user_id, recipe.id).unwrap().unwrap();
        assert_eq!(fetched.ingredients, recipe.ingredients);
    }

    #[test]
    fn test_recipe_scoped_to_owner() {
        let (db, user_id) = setup();
        let other = db.insert_user("bob", "token-b").unwrap();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();

        assert!(db.get_recipe(other.id, recipe.id).unwrap().is_none());
        assert!(!db.delete_recipe(other.id, recipe.id).unwrap());
        assert!(db.list_recipes(other.id).unwrap().is_empty());
    }

    #[test]
    fn test_list_recipes_newest_first() {
        let (db, user_id) = setup();
        let first = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        let mut second = sample_recipe();
        second.title = "Waffles".to_string();
        let second = db.insert_recipe(user_id, &second).unwrap();

        let list = db.list_recipes(user_id).unwrap();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
    }

    #[test]
    fn test_update_recipe_partial() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();

        let updated = db
            .update_recipe(
                user_id,
                recipe.id,
                &RecipeUpdate {
                    servings: Some("6".to_string()),
                    ingredients: Some(vec![Ingredient::new("3", "cups", "flour")]),
                    ..RecipeUpdate::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Pancakes");
        assert_eq!(updated.servings, "6");
        assert_eq!(updated.ingredients, vec![Ingredient::new("3", "cups", "flour")]);
    }

    #[test]
    fn test_update_recipe_not_found() {
        let (db, user_id) = setup();
        let result = db
            .update_recipe(user_id, 999, &RecipeUpdate::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_set_favorite_and_image() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();

        assert!(db.set_recipe_favorite(user_id, recipe.id, true).unwrap());
        assert!(db.set_recipe_image(user_id, recipe.id, "http://x/images/1-a.png").unwrap());

        let fetched = db.get_recipe(user_id, recipe.id).unwrap().unwrap();
        assert!(fetched.is_favorite);
        assert_eq!(fetched.image_url.as_deref(), Some("http://x/images/1-a.png"));
        assert!(!db.set_recipe_favorite(user_id, 999, true).unwrap());
    }

    #[test]
    fn test_placement_order_within_slot() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        let dinner = slot("2024-06-10", MealType::Dinner);

        let a = db.insert_placement(user_id, recipe.id, &dinner).unwrap();
        let b = db.insert_placement(user_id, recipe.id, &dinner).unwrap();
        let c = db
            .insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Lunch))
            .unwrap();

        assert_eq!(a.order, 0);
        assert_eq!(b.order, 1);
        assert_eq!(c.order, 0);
        assert_eq!(a.day, "Monday");
        assert_eq!(a.recipe_title.as_deref(), Some("Pancakes"));
        assert_eq!(a.slot_id(), "2024-06-10::Dinner");
    }

    #[test]
    fn test_get_meal_plan_range() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        db.insert_placement(user_id, recipe.id, &slot("2024-06-09", MealType::Dinner))
            .unwrap();
        db.insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Dinner))
            .unwrap();
        db.insert_placement(user_id, recipe.id, &slot("2024-06-16", MealType::Lunch))
            .unwrap();
        db.insert_placement(user_id, recipe.id, &slot("2024-06-17", MealType::Lunch))
            .unwrap();

        let week = db
            .get_meal_plan(user_id, date("2024-06-10"), date("2024-06-16"))
            .unwrap();
        let dates: Vec<&str> = week.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-10", "2024-06-16"]);
    }

    #[test]
    fn test_move_placement_appends_to_target_slot() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        let lunch = slot("2024-06-11", MealType::Lunch);
        db.insert_placement(user_id, recipe.id, &lunch).unwrap();
        let moving = db
            .insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Dinner))
            .unwrap();

        let moved = db
            .move_placement(user_id, moving.id, &lunch)
            .unwrap()
            .unwrap();
        assert_eq!(moved.date, "2024-06-11");
        assert_eq!(moved.day, "Tuesday");
        assert_eq!(moved.meal_type, MealType::Lunch);
        assert_eq!(moved.order, 1);

        assert!(db.move_placement(user_id, 999, &lunch).unwrap().is_none());
    }

    #[test]
    fn test_clear_meal_plan_range_and_all() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        db.insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Dinner))
            .unwrap();
        db.insert_placement(user_id, recipe.id, &slot("2024-06-20", MealType::Dinner))
            .unwrap();

        let cleared = db
            .clear_meal_plan_range(user_id, date("2024-06-10"), date("2024-06-16"))
            .unwrap();
        assert_eq!(cleared, 1);
        assert_eq!(db.clear_meal_plan(user_id).unwrap(), 1);
    }

    #[test]
    fn test_delete_recipe_cascades_placements() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        let placement = db
            .insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Dinner))
            .unwrap();

        assert!(db.delete_recipe(user_id, recipe.id).unwrap());
        assert!(db.get_placement(user_id, placement.id).unwrap().is_none());
    }

    #[test]
    fn test_shopping_items_crud() {
        let (db, user_id) = setup();
        let item = db
            .insert_item(user_id, "paper towels", ShoppingCategory::Other, None)
            .unwrap();
        assert!(!item.is_checked);
        assert_eq!(item.meal_plan_id, None);

        let checked = db.set_item_checked(user_id, item.id, true).unwrap().unwrap();
        assert!(checked.is_checked);
        assert!(db.set_item_checked(user_id, 999, true).unwrap().is_none());

        assert!(db.delete_item(user_id, item.id).unwrap());
        assert!(!db.delete_item(user_id, item.id).unwrap());
    }

    #[test]
    fn test_list_items_ordered_by_creation() {
        let (db, user_id) = setup();
        for name in ["b", "a", "c"] {
            db.insert_item(user_id, name, ShoppingCategory::Other, None)
                .unwrap();
        }
        let names: Vec<String> = db
            .list_items(user_id)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_clear_items_only_touches_owner() {
        let (db, user_id) = setup();
        let other = db.insert_user("bob", "token-b").unwrap();
        db.insert_item(user_id, "milk", ShoppingCategory::DairyEggs, None)
            .unwrap();
        db.insert_item(other.id, "eggs", ShoppingCategory::DairyEggs, None)
            .unwrap();

        assert_eq!(db.clear_items(user_id).unwrap(), 1);
        assert!(db.list_items(user_id).unwrap().is_empty());
        assert_eq!(db.list_items(other.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_checked_items() {
        let (db, user_id) = setup();
        let a = db
            .insert_item(user_id, "a", ShoppingCategory::Other, None)
            .unwrap();
        db.insert_item(user_id, "b", ShoppingCategory::Other, None)
            .unwrap();
        db.set_item_checked(user_id, a.id, true).unwrap();

        assert_eq!(db.delete_checked_items(user_id).unwrap(), 1);
        assert_eq!(db.list_items(user_id).unwrap()[0].name, "b");
    }

    #[test]
    fn test_delete_orphan_items() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        let kept = db
            .insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Dinner))
            .unwrap();
        let gone = db
            .insert_placement(user_id, recipe.id, &slot("2024-06-11", MealType::Dinner))
            .unwrap();
        db.insert_item(user_id, "1 cup milk", ShoppingCategory::DairyEggs, Some(kept.id))
            .unwrap();
        db.insert_item(user_id, "2 cups flour", ShoppingCategory::PantryStaples, Some(gone.id))
            .unwrap();
        db.insert_item(user_id, "soap", ShoppingCategory::Other, None)
            .unwrap();
        db.delete_placement(user_id, gone.id).unwrap();

        assert_eq!(db.delete_orphan_items(user_id).unwrap(), 1);
        let names: Vec<String> = db
            .list_items(user_id)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["1 cup milk", "soap"]);
    }

    #[test]
    fn test_apply_reconcile_round() {
        let (db, user_id) = setup();
        let recipe = db.insert_recipe(user_id, &sample_recipe()).unwrap();
        let placement = db
            .insert_placement(user_id, recipe.id, &slot("2024-06-10", MealType::Dinner))
            .unwrap();

        let target = target_items(&recipe.ingredients);
        let existing = db.items_for_placement(user_id, placement.id).unwrap();
        let plan = reconcile::plan(&existing, &target);
        assert_eq!(
            db.apply_reconcile(user_id, placement.id, &plan).unwrap(),
            (2, 0)
        );

        let rows = db.items_for_placement(user_id, placement.id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "2 cups flour");
        assert_eq!(rows[0].category, ShoppingCategory::PantryStaples);
        assert_eq!(rows[1].category, ShoppingCategory::DairyEggs);
        assert!(rows.iter().all(|r| r.meal_plan_id == Some(placement.id)));
    }
}
