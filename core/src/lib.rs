//! RecipeBox core: recipes, weekly meal plans, and shopping list reconciliation.

pub mod browse;
pub mod categorize;
pub mod chef;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod service;
pub mod storage;
pub mod view;
