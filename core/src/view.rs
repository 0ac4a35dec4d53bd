//! Client-side list state with optimistic toggles.
//!
//! A toggle flips the local flag first, then commits it to the backend. If
//! the commit fails the flag is restored and the error is returned.

use crate::models::{Recipe, ShoppingCategory, ShoppingListItem};

/// Flip `flag`, run `commit` with the new value, and restore the old value
/// if the commit fails.
pub fn toggle_optimistic<T, E>(
    flag: &mut bool,
    commit: impl FnOnce(bool) -> Result<T, E>,
) -> Result<T, E> {
    let previous = *flag;
    *flag = !previous;
    commit(*flag).inspect_err(|_| *flag = previous)
}

#[derive(Debug, Clone, Default)]
pub struct ShoppingListView {
    items: Vec<ShoppingListItem>,
}

impl ShoppingListView {
    #[must_use]
    pub fn new(items: Vec<ShoppingListItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|i| !i.is_checked).count()
    }

    /// Non-empty categories in display order.
    #[must_use]
    pub fn grouped(&self) -> Vec<(ShoppingCategory, Vec<&ShoppingListItem>)> {
        ShoppingCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let items: Vec<&ShoppingListItem> = self
                    .items
                    .iter()
                    .filter(|i| i.category == category)
                    .collect();
                (!items.is_empty()).then_some((category, items))
            })
            .collect()
    }

    /// Toggle the checked flag of item `id`. Returns `Ok(None)` when the item
    /// is not in the view.
    pub fn toggle<T, E>(
        &mut self,
        id: i64,
        commit: impl FnOnce(bool) -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        toggle_optimistic(&mut item.is_checked, commit).map(Some)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeListView {
    recipes: Vec<Recipe>,
}

impl RecipeListView {
    #[must_use]
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn toggle_favorite<T, E>(
        &mut self,
        id: i64,
        commit: impl FnOnce(bool) -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        toggle_optimistic(&mut recipe.is_favorite, commit).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, name: &str, category: ShoppingCategory) -> ShoppingListItem {
        ShoppingListItem {
            id,
            uuid: String::new(),
            user_id: 1,
            name: name.to_string(),
            category,
            is_checked: false,
            meal_plan_id: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut view = ShoppingListView::new(vec![item(1, "milk", ShoppingCategory::DairyEggs)]);
        view.toggle(1, |_| Ok::<_, ()>(())).unwrap();
        assert!(view.items()[0].is_checked);
        view.toggle(1, |_| Ok::<_, ()>(())).unwrap();
        assert!(!view.items()[0].is_checked);
    }

    #[test]
    fn test_failed_commit_reverts() {
        let mut view = ShoppingListView::new(vec![item(1, "milk", ShoppingCategory::DairyEggs)]);
        let mut sent = None;
        let result = view.toggle(1, |checked| {
            sent = Some(checked);
            Err::<(), _>("network down")
        });
        assert_eq!(result, Err("network down"));
        assert_eq!(sent, Some(true));
        assert!(!view.items()[0].is_checked);
    }

    #[test]
    fn test_toggle_unknown_id() {
        let mut view = ShoppingListView::default();
        let result = view.toggle(42, |_| Ok::<_, ()>(()));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_grouped_in_category_order() {
        let view = ShoppingListView::new(vec![
            item(1, "salt", ShoppingCategory::PantryStaples),
            item(2, "onion", ShoppingCategory::Produce),
            item(3, "flour", ShoppingCategory::PantryStaples),
        ]);
        let groups = view.grouped();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, ShoppingCategory::Produce);
        assert_eq!(groups[1].1.len(), 2);
        assert_eq!(view.remaining(), 3);
    }

    #[test]
    fn test_favorite_toggle_reverts_on_error() {
        let recipe = Recipe {
            id: 5,
            uuid: String::new(),
            user_id: 1,
            title: "Tacos".to_string(),
            cooking_time: String::new(),
            servings: String::new(),
            category: crate::models::MealType::Dinner,
            ingredients: Vec::new(),
            instructions: String::new(),
            image_url: None,
            is_favorite: false,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let mut view = RecipeListView::new(vec![recipe]);
        assert!(view.toggle_favorite(5, |_| Err::<(), _>("boom")).is_err());
        assert!(!view.recipes()[0].is_favorite);
        view.toggle_favorite(5, |fav| Ok::<_, ()>(fav)).unwrap();
        assert!(view.recipes()[0].is_favorite);
    }
}
