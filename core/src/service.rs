use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::browse::{self, RecipePage, RecipeQuery};
use crate::db::Database;
use crate::error::RecipeBoxError;
use crate::models::{
    DayPlan, MealPlanItem, MealType, NewRecipe, Recipe, RecipeUpdate, Session, ShoppingCategory,
    ShoppingListItem, SlotId, SlotPlan, SyncFailure, SyncReport, User, WeekPlan, day_name,
    validate_ingredients, validate_item_name, validate_title, week_start,
};
use crate::reconcile::{self, target_items};
use crate::storage::ImageStore;

/// Random 32-byte token, hex encoded.
fn generate_token() -> String {
    use rand::Rng;
    use std::fmt::Write;

    let bytes: [u8; 32] = rand::rng().random();
    bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc: String, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        bail!(RecipeBoxError::invalid(format!(
            "Start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

pub struct RecipeBoxService {
    db: Database,
    images: Option<ImageStore>,
}

impl RecipeBoxService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db, images: None })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db, images: None })
    }

    #[must_use]
    pub fn with_images(mut self, images: ImageStore) -> Self {
        self.images = Some(images);
        self
    }

    #[must_use]
    pub fn images(&self) -> Option<&ImageStore> {
        self.images.as_ref()
    }

    // --- Users and sessions ---

    /// Create a user and return it with its API token.
    pub fn create_user(&self, username: &str) -> Result<(User, String)> {
        let username = username.trim();
        if username.is_empty() || username.contains(char::is_whitespace) {
            bail!(RecipeBoxError::invalid(
                "Username must be non-empty and contain no whitespace"
            ));
        }
        if self.db.get_user_by_name(username)?.is_some() {
            bail!(RecipeBoxError::invalid(format!(
                "User '{username}' already exists"
            )));
        }
        let token = generate_token();
        let user = self.db.insert_user(username, &token)?;
        tracing::info!(user_id = user.id, username = %user.username, "created user");
        Ok((user, token))
    }

    pub fn authenticate(&self, token: &str) -> Result<Session> {
        let token = token.trim();
        if token.is_empty() {
            bail!(RecipeBoxError::NotAuthenticated);
        }
        match self.db.get_user_by_token(token)? {
            Some(user) => Ok(Session::from(&user)),
            None => bail!(RecipeBoxError::NotAuthenticated),
        }
    }

    /// Session for a named local user, created on first use.
    pub fn local_session(&self, username: &str) -> Result<Session> {
        if let Some(user) = self.db.get_user_by_name(username)? {
            return Ok(Session::from(&user));
        }
        let (user, _token) = self.create_user(username)?;
        Ok(Session::from(&user))
    }

    pub fn user_token(&self, session: &Session) -> Result<String> {
        match self.db.get_user_token(session.user_id)? {
            Some(token) => Ok(token),
            None => bail!(RecipeBoxError::NotAuthenticated),
        }
    }

    // --- Recipes ---

    pub fn add_recipe(&self, session: &Session, recipe: &NewRecipe) -> Result<Recipe> {
        let mut recipe = recipe.clone();
        recipe.title = validate_title(&recipe.title)?;
        validate_ingredients(&recipe.ingredients)?;
        let created = self.db.insert_recipe(session.user_id, &recipe)?;
        tracing::debug!(recipe_id = created.id, title = %created.title, "added recipe");
        Ok(created)
    }

    pub fn get_recipe(&self, session: &Session, id: i64) -> Result<Recipe> {
        match self.db.get_recipe(session.user_id, id)? {
            Some(recipe) => Ok(recipe),
            None => bail!(RecipeBoxError::not_found(format!("Recipe {id}"))),
        }
    }

    pub fn list_recipes(&self, session: &Session) -> Result<Vec<Recipe>> {
        self.db.list_recipes(session.user_id)
    }

    pub fn browse_recipes(&self, session: &Session, query: &RecipeQuery) -> Result<RecipePage> {
        let recipes = self.db.list_recipes(session.user_id)?;
        Ok(browse::browse(recipes, query))
    }

    pub fn update_recipe(
        &self,
        session: &Session,
        id: i64,
        update: &RecipeUpdate,
    ) -> Result<Recipe> {
        if update.is_empty() {
            bail!(RecipeBoxError::invalid("At least one field must be provided"));
        }
        let mut update = update.clone();
        if let Some(title) = update.title.as_deref() {
            update.title = Some(validate_title(title)?);
        }
        if let Some(ingredients) = update.ingredients.as_deref() {
            validate_ingredients(ingredients)?;
        }
        match self.db.update_recipe(session.user_id, id, &update)? {
            Some(recipe) => Ok(recipe),
            None => bail!(RecipeBoxError::not_found(format!("Recipe {id}"))),
        }
    }

    pub fn delete_recipe(&self, session: &Session, id: i64) -> Result<bool> {
        self.db.delete_recipe(session.user_id, id)
    }

    pub fn set_favorite(&self, session: &Session, id: i64, favorite: bool) -> Result<Recipe> {
        if !self.db.set_recipe_favorite(session.user_id, id, favorite)? {
            bail!(RecipeBoxError::not_found(format!("Recipe {id}")));
        }
        self.get_recipe(session, id)
    }

    pub fn toggle_favorite(&self, session: &Session, id: i64) -> Result<Recipe> {
        let recipe = self.get_recipe(session, id)?;
        self.set_favorite(session, id, !recipe.is_favorite)
    }

    /// Store an uploaded image and point the recipe at its public URL.
    pub fn attach_image(
        &self,
        session: &Session,
        id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Recipe> {
        let Some(images) = self.images.as_ref() else {
            bail!(RecipeBoxError::invalid("Image storage is not configured"));
        };
        self.get_recipe(session, id)?;
        let stored = images.put(filename, bytes)?;
        self.db
            .set_recipe_image(session.user_id, id, &stored.public_url)?;
        self.get_recipe(session, id)
    }

    // --- Meal plan ---

    pub fn add_to_meal_plan(
        &self,
        session: &Session,
        recipe_id: i64,
        slot: &SlotId,
    ) -> Result<MealPlanItem> {
        self.get_recipe(session, recipe_id)?;
        let item = self.db.insert_placement(session.user_id, recipe_id, slot)?;
        tracing::debug!(meal_plan_id = item.id, slot = %slot, "planned recipe");
        Ok(item)
    }

    pub fn move_placement(&self, session: &Session, id: i64, slot: &SlotId) -> Result<MealPlanItem> {
        match self.db.move_placement(session.user_id, id, slot)? {
            Some(item) => Ok(item),
            None => bail!(RecipeBoxError::not_found(format!("Meal plan item {id}"))),
        }
    }

    pub fn remove_from_meal_plan(&self, session: &Session, id: i64) -> Result<bool> {
        self.db.delete_placement(session.user_id, id)
    }

    pub fn get_meal_plan(
        &self,
        session: &Session,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealPlanItem>> {
        validate_range(start, end)?;
        self.db.get_meal_plan(session.user_id, start, end)
    }

    pub fn clear_meal_plan(&self, session: &Session) -> Result<usize> {
        self.db.clear_meal_plan(session.user_id)
    }

    pub fn clear_meal_plan_for_range(
        &self,
        session: &Session,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize> {
        validate_range(start, end)?;
        self.db.clear_meal_plan_range(session.user_id, start, end)
    }

    /// Monday-first week grid containing `date`.
    pub fn week_plan(&self, session: &Session, date: NaiveDate) -> Result<WeekPlan> {
        let start = week_start(date);
        let end = start + chrono::Duration::days(6);
        let items = self.db.get_meal_plan(session.user_id, start, end)?;

        let days = start
            .iter_days()
            .take(7)
            .map(|day| {
                let date_str = day.format("%Y-%m-%d").to_string();
                let meals = MealType::ALL
                    .into_iter()
                    .map(|meal_type| SlotPlan {
                        slot: SlotId::new(day, meal_type).to_string(),
                        meal_type,
                        items: items
                            .iter()
                            .filter(|i| i.date == date_str && i.meal_type == meal_type)
                            .cloned()
                            .collect(),
                    })
                    .collect();
                DayPlan {
                    day: day_name(day).to_string(),
                    date: date_str,
                    meals,
                }
            })
            .collect();

        Ok(WeekPlan {
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
            days,
        })
    }

    // --- Shopping list ---

    pub fn list_items(&self, session: &Session) -> Result<Vec<ShoppingListItem>> {
        self.db.list_items(session.user_id)
    }

    pub fn add_item(
        &self,
        session: &Session,
        name: &str,
        category: Option<ShoppingCategory>,
    ) -> Result<ShoppingListItem> {
        let name = validate_item_name(name)?;
        self.db
            .insert_item(session.user_id, &name, category.unwrap_or_default(), None)
    }

    pub fn set_item_checked(
        &self,
        session: &Session,
        id: i64,
        checked: bool,
    ) -> Result<ShoppingListItem> {
        match self.db.set_item_checked(session.user_id, id, checked)? {
            Some(item) => Ok(item),
            None => bail!(RecipeBoxError::not_found(format!("Shopping list item {id}"))),
        }
    }

    pub fn delete_item(&self, session: &Session, id: i64) -> Result<bool> {
        self.db.delete_item(session.user_id, id)
    }

    /// Remove every row owned by the session's user.
    pub fn clear_list(&self, session: &Session) -> Result<usize> {
        self.db.clear_items(session.user_id)
    }

    pub fn remove_checked(&self, session: &Session) -> Result<usize> {
        self.db.delete_checked_items(session.user_id)
    }

    pub fn cleanup_orphans(&self, session: &Session) -> Result<usize> {
        let removed = self.db.delete_orphan_items(session.user_id)?;
        if removed > 0 {
            tracing::info!(removed, "removed orphaned shopping list items");
        }
        Ok(removed)
    }

    /// Reconcile the shopping list against every placement in `[start, end]`.
    ///
    /// Placements are processed in order, each in its own transaction. A
    /// failing placement is logged and reported, and the rest still run.
    pub fn sync_shopping_list(
        &self,
        session: &Session,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SyncReport> {
        validate_range(start, end)?;
        let placements = self.db.get_meal_plan(session.user_id, start, end)?;
        let recipes: HashMap<i64, Recipe> = self
            .db
            .list_recipes(session.user_id)?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut report = SyncReport {
            placements: placements.len(),
            ..SyncReport::default()
        };

        for placement in &placements {
            let Some(recipe) = recipes.get(&placement.recipe_id) else {
                tracing::warn!(
                    meal_plan_id = placement.id,
                    recipe_id = placement.recipe_id,
                    "skipping placement whose recipe is missing"
                );
                report.skipped += 1;
                continue;
            };
            match self.sync_placement(session.user_id, placement.id, recipe) {
                Ok((added, removed)) => {
                    report.synced += 1;
                    report.added += added;
                    report.removed += removed;
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    tracing::error!(meal_plan_id = placement.id, %error, "failed to sync placement");
                    report.failures.push(SyncFailure {
                        meal_plan_id: placement.id,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            placements = report.placements,
            added = report.added,
            removed = report.removed,
            failed = report.failures.len(),
            "shopping list sync finished"
        );
        Ok(report)
    }

    fn sync_placement(
        &self,
        user_id: i64,
        meal_plan_id: i64,
        recipe: &Recipe,
    ) -> Result<(usize, usize)> {
        let existing = self.db.items_for_placement(user_id, meal_plan_id)?;
        let plan = reconcile::plan(&existing, &target_items(&recipe.ingredients));
        if plan.is_empty() {
            return Ok((0, 0));
        }
        self.db.apply_reconcile(user_id, meal_plan_id, &plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn setup() -> (RecipeBoxService, Session) {
        let svc = RecipeBoxService::new_in_memory().unwrap();
        let session = svc.local_session("alice").unwrap();
        (svc, session)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pancakes() -> NewRecipe {
        NewRecipe {
            title: "Pancakes".to_string(),
            cooking_time: "20 mins".to_string(),
            servings: "4".to_string(),
            category: MealType::Breakfast,
            ingredients: vec![
                Ingredient::new("2", "cups", "flour"),
                Ingredient::new("1", "cup", "milk"),
            ],
            instructions: String::new(),
            image_url: None,
        }
    }

    fn plan_pancakes(svc: &RecipeBoxService, session: &Session) -> (Recipe, MealPlanItem) {
        let recipe = svc.add_recipe(session, &pancakes()).unwrap();
        let slot: SlotId = "2024-06-10::Breakfast".parse().unwrap();
        let placement = svc.add_to_meal_plan(session, recipe.id, &slot).unwrap();
        (recipe, placement)
    }

    fn names(svc: &RecipeBoxService, session: &Session) -> Vec<String> {
        svc.list_items(session)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect()
    }

    fn sync_week(svc: &RecipeBoxService, session: &Session) -> SyncReport {
        svc.sync_shopping_list(session, date("2024-06-10"), date("2024-06-16"))
            .unwrap()
    }

    #[test]
    fn test_create_user_and_authenticate() {
        let svc = RecipeBoxService::new_in_memory().unwrap();
        let (user, token) = svc.create_user("bob").unwrap();
        assert_eq!(token.len(), 64);

        let session = svc.authenticate(&token).unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(svc.user_token(&session).unwrap(), token);
    }

    #[test]
    fn test_authenticate_rejects_unknown_token() {
        let svc = RecipeBoxService::new_in_memory().unwrap();
        for token in ["", "nope"] {
            let err = svc.authenticate(token).unwrap_err();
            assert_eq!(
                RecipeBoxError::classify(&err),
                Some(&RecipeBoxError::NotAuthenticated)
            );
        }
    }

    #[test]
    fn test_create_user_validation() {
        let svc = RecipeBoxService::new_in_memory().unwrap();
        assert!(svc.create_user(" ").is_err());
        assert!(svc.create_user("two words").is_err());
        svc.create_user("carol").unwrap();
        assert!(svc.create_user("carol").is_err());
    }

    #[test]
    fn test_local_session_reuses_user() {
        let svc = RecipeBoxService::new_in_memory().unwrap();
        let a = svc.local_session("local").unwrap();
        let b = svc.local_session("local").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_add_recipe_validates() {
        let (svc, session) = setup();
        let mut recipe = pancakes();
        recipe.title = "  ".to_string();
        let err = svc.add_recipe(&session, &recipe).unwrap_err();
        assert!(matches!(
            RecipeBoxError::classify(&err),
            Some(RecipeBoxError::Invalid(_))
        ));
    }

    #[test]
    fn test_get_recipe_not_found() {
        let (svc, session) = setup();
        let err = svc.get_recipe(&session, 42).unwrap_err();
        assert_eq!(err.to_string(), "Recipe 42 not found");
    }

    #[test]
    fn test_toggle_favorite_twice() {
        let (svc, session) = setup();
        let recipe = svc.add_recipe(&session, &pancakes()).unwrap();
        assert!(svc.toggle_favorite(&session, recipe.id).unwrap().is_favorite);
        assert!(!svc.toggle_favorite(&session, recipe.id).unwrap().is_favorite);
    }

    #[test]
    fn test_update_recipe_requires_fields() {
        let (svc, session) = setup();
        let recipe = svc.add_recipe(&session, &pancakes()).unwrap();
        assert!(
            svc.update_recipe(&session, recipe.id, &RecipeUpdate::default())
                .is_err()
        );
    }

    #[test]
    fn test_attach_image_requires_store() {
        let (svc, session) = setup();
        let recipe = svc.add_recipe(&session, &pancakes()).unwrap();
        assert!(svc.attach_image(&session, recipe.id, "a.png", b"x").is_err());
    }

    #[test]
    fn test_attach_image_sets_public_url() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = RecipeBoxService::new_in_memory()
            .unwrap()
            .with_images(ImageStore::new(tmp.path(), "http://localhost:8080").unwrap());
        let session = svc.local_session("alice").unwrap();
        let recipe = svc.add_recipe(&session, &pancakes()).unwrap();

        let updated = svc
            .attach_image(&session, recipe.id, "stack.jpg", b"jpeg")
            .unwrap();
        let url = updated.image_url.unwrap();
        assert!(url.starts_with("http://localhost:8080/images/"));
        assert!(url.ends_with("-stack.jpg"));
    }

    #[test]
    fn test_add_to_meal_plan_checks_recipe_owner() {
        let (svc, session) = setup();
        let other = svc.local_session("bob").unwrap();
        let recipe = svc.add_recipe(&other, &pancakes()).unwrap();
        let slot: SlotId = "2024-06-10::Dinner".parse().unwrap();
        assert!(svc.add_to_meal_plan(&session, recipe.id, &slot).is_err());
    }

    #[test]
    fn test_week_plan_grid() {
        let (svc, session) = setup();
        let (_, placement) = plan_pancakes(&svc, &session);

        let week = svc.week_plan(&session, date("2024-06-13")).unwrap();
        assert_eq!(week.start, "2024-06-10");
        assert_eq!(week.end, "2024-06-16");
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].day, "Monday");
        assert_eq!(week.days[0].meals.len(), 4);
        assert_eq!(week.days[0].meals[0].slot, "2024-06-10::Breakfast");
        assert_eq!(week.days[0].meals[0].items[0].id, placement.id);
        assert!(week.days[1].meals.iter().all(|m| m.items.is_empty()));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let (svc, session) = setup();
        assert!(
            svc.get_meal_plan(&session, date("2024-06-16"), date("2024-06-10"))
                .is_err()
        );
    }

    #[test]
    fn test_sync_creates_categorized_rows() {
        let (svc, session) = setup();
        let (_, placement) = plan_pancakes(&svc, &session);

        let report = sync_week(&svc, &session);
        assert_eq!(report.placements, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(report.added, 2);

        let items = svc.list_items(&session).unwrap();
        assert_eq!(items[0].name, "2 cups flour");
        assert_eq!(items[0].category, ShoppingCategory::PantryStaples);
        assert_eq!(items[1].name, "1 cup milk");
        assert_eq!(items[1].category, ShoppingCategory::DairyEggs);
        assert!(items.iter().all(|i| i.meal_plan_id == Some(placement.id)));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (svc, session) = setup();
        plan_pancakes(&svc, &session);

        sync_week(&svc, &session);
        let before = names(&svc, &session);
        let report = sync_week(&svc, &session);
        assert_eq!(report.added, 0);
        assert_eq!(report.removed, 0);
        assert_eq!(names(&svc, &session), before);
    }

    #[test]
    fn test_sync_removes_dropped_ingredient_only() {
        let (svc, session) = setup();
        let (recipe, _) = plan_pancakes(&svc, &session);
        sync_week(&svc, &session);
        let flour_id = svc.list_items(&session).unwrap()[0].id;

        svc.update_recipe(
            &session,
            recipe.id,
            &RecipeUpdate {
                ingredients: Some(vec![Ingredient::new("2", "cups", "flour")]),
                ..RecipeUpdate::default()
            },
        )
        .unwrap();
        let report = sync_week(&svc, &session);
        assert_eq!(report.removed, 1);
        assert_eq!(report.added, 0);

        let items = svc.list_items(&session).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, flour_id);
    }

    #[test]
    fn test_sync_keeps_manual_items_and_checked_state() {
        let (svc, session) = setup();
        plan_pancakes(&svc, &session);
        svc.add_item(&session, "dish soap", None).unwrap();
        sync_week(&svc, &session);
        let flour = svc.list_items(&session).unwrap()[1].clone();
        svc.set_item_checked(&session, flour.id, true).unwrap();

        sync_week(&svc, &session);
        let items = svc.list_items(&session).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "dish soap");
        assert!(items.iter().find(|i| i.id == flour.id).unwrap().is_checked);
    }

    #[test]
    fn test_sync_ignores_placements_outside_range() {
        let (svc, session) = setup();
        plan_pancakes(&svc, &session);
        let report = svc
            .sync_shopping_list(&session, date("2024-06-17"), date("2024-06-23"))
            .unwrap();
        assert_eq!(report.placements, 0);
        assert!(svc.list_items(&session).unwrap().is_empty());
    }

    #[test]
    fn test_sync_continues_after_failed_placement() {
        let (svc, session) = setup();
        let (_, good) = plan_pancakes(&svc, &session);
        let mut bad_recipe = pancakes();
        bad_recipe.title = "Poison Pie".to_string();
        bad_recipe.ingredients = vec![
            Ingredient::new("1", "cup", "sugar"),
            Ingredient::new("1", "", "poison apple"),
        ];
        let bad_recipe = svc.add_recipe(&session, &bad_recipe).unwrap();
        let slot = SlotId::new(date("2024-06-11"), MealType::Dessert);
        let bad = svc.add_to_meal_plan(&session, bad_recipe.id, &slot).unwrap();

        svc.db
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_poison BEFORE INSERT ON shopping_list_items
                 WHEN NEW.name LIKE '%poison%'
                 BEGIN SELECT RAISE(ABORT, 'poisoned item'); END;",
            )
            .unwrap();

        let report = sync_week(&svc, &session);
        assert_eq!(report.placements, 2);
        assert_eq!(report.synced, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].meal_plan_id, bad.id);
        assert!(report.failures[0].error.contains("poisoned item"));

        let items = svc.list_items(&session).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.meal_plan_id == Some(good.id)));
    }

    #[test]
    fn test_clear_list_only_current_user() {
        let (svc, session) = setup();
        let other = svc.local_session("bob").unwrap();
        svc.add_item(&session, "milk", Some(ShoppingCategory::DairyEggs))
            .unwrap();
        svc.add_item(&other, "eggs", None).unwrap();

        assert_eq!(svc.clear_list(&session).unwrap(), 1);
        assert!(svc.list_items(&session).unwrap().is_empty());
        assert_eq!(names(&svc, &other), vec!["eggs"]);
    }

    #[test]
    fn test_add_item_defaults_to_other() {
        let (svc, session) = setup();
        let item = svc.add_item(&session, "  candles ", None).unwrap();
        assert_eq!(item.name, "candles");
        assert_eq!(item.category, ShoppingCategory::Other);
        assert!(svc.add_item(&session, "", None).is_err());
    }

    #[test]
    fn test_set_item_checked_other_user_not_found() {
        let (svc, session) = setup();
        let other = svc.local_session("bob").unwrap();
        let item = svc.add_item(&other, "eggs", None).unwrap();
        let err = svc.set_item_checked(&session, item.id, true).unwrap_err();
        assert!(matches!(
            RecipeBoxError::classify(&err),
            Some(RecipeBoxError::NotFound(_))
        ));
    }

    #[test]
    fn test_cleanup_orphans_after_unplanning() {
        let (svc, session) = setup();
        let (_, placement) = plan_pancakes(&svc, &session);
        sync_week(&svc, &session);
        svc.add_item(&session, "napkins", None).unwrap();

        assert!(svc.remove_from_meal_plan(&session, placement.id).unwrap());
        assert_eq!(svc.cleanup_orphans(&session).unwrap(), 2);
        assert_eq!(names(&svc, &session), vec!["napkins"]);
    }

    #[test]
    fn test_remove_checked() {
        let (svc, session) = setup();
        let a = svc.add_item(&session, "a", None).unwrap();
        svc.add_item(&session, "b", None).unwrap();
        svc.set_item_checked(&session, a.id, true).unwrap();
        assert_eq!(svc.remove_checked(&session).unwrap(), 1);
        assert_eq!(names(&svc, &session), vec!["b"]);
    }
}
