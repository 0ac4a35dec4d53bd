//! Shopping list reconciliation for a single meal plan placement.
//!
//! Given a recipe's current ingredients and the rows already tagged with the
//! placement, [`plan`] computes the inserts and deletes that make the
//! persisted names match the target set. Names compare case-insensitively and
//! without further normalization, so "2 cups flour" and "2  cups flour" are
//! different lines.

use std::collections::HashSet;

use serde::Serialize;

use crate::categorize::categorize;
use crate::models::{Ingredient, ShoppingCategory, ShoppingListItem};

/// A row the placement should have on the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetItem {
    pub name: String,
    pub category: ShoppingCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub to_add: Vec<TargetItem>,
    /// Ids of existing rows to delete.
    pub to_remove: Vec<i64>,
}

impl ReconcilePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Build the target rows for a recipe. Categories come from the ingredient
/// name alone. Lines that format to an empty string are dropped.
#[must_use]
pub fn target_items(ingredients: &[Ingredient]) -> Vec<TargetItem> {
    ingredients
        .iter()
        .filter_map(|ing| {
            let name = ing.display_string();
            if name.is_empty() {
                return None;
            }
            Some(TargetItem {
                name,
                category: categorize(&ing.name),
            })
        })
        .collect()
}

/// Diff `existing` rows (all tagged with one placement) against `target`.
///
/// Every target entry whose name is missing from `existing` is added, so a
/// recipe listing the same line twice gets two rows on the first sync.
#[must_use]
pub fn plan(existing: &[ShoppingListItem], target: &[TargetItem]) -> ReconcilePlan {
    let target_names: HashSet<String> = target.iter().map(|t| t.name.to_lowercase()).collect();
    let existing_names: HashSet<String> =
        existing.iter().map(|item| item.name.to_lowercase()).collect();

    let to_remove = existing
        .iter()
        .filter(|item| !target_names.contains(&item.name.to_lowercase()))
        .map(|item| item.id)
        .collect();

    let to_add = target
        .iter()
        .filter(|t| !existing_names.contains(&t.name.to_lowercase()))
        .cloned()
        .collect();

    ReconcilePlan { to_add, to_remove }
}
