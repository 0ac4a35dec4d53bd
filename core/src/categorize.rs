//! Keyword-based grocery categorization for shopping list rows.

use crate::models::ShoppingCategory;

/// A category and the lower-case substrings that select it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: ShoppingCategory,
    pub keywords: &'static [&'static str],
}

/// Rules in priority order. The first rule with a matching keyword wins.
pub const DEFAULT_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ShoppingCategory::Produce,
        keywords: &[
            "onion",
            "garlic",
            "tomato",
            "spinach",
            "lemon",
            "lettuce",
            "carrot",
            "pepper",
            "vegetable",
            "potato",
            "cucumber",
            "broccoli",
        ],
    },
    CategoryRule {
        category: ShoppingCategory::DairyEggs,
        keywords: &["milk", "cheese", "egg", "butter", "yogurt", "cream"],
    },
    CategoryRule {
        category: ShoppingCategory::MeatFish,
        keywords: &[
            "chicken", "beef", "pork", "fish", "salmon", "meat", "shrimp", "steak", "bacon",
        ],
    },
    CategoryRule {
        category: ShoppingCategory::PantryStaples,
        keywords: &[
            "flour", "sugar", "salt", "oil", "rice", "pasta", "bean", "bread", "sauce", "spice",
            "honey", "vanilla",
        ],
    },
];

/// Classify an ingredient name with [`DEFAULT_RULES`].
#[must_use]
pub fn categorize(name: &str) -> ShoppingCategory {
    categorize_with(DEFAULT_RULES, name)
}

/// Classify an ingredient name against `rules`, falling back to `Other`.
///
/// Matching is a case-insensitive substring test, so "peppermint" lands in
/// Produce and "eggplant" in Dairy & Eggs.
#[must_use]
pub fn categorize_with(rules: &[CategoryRule], name: &str) -> ShoppingCategory {
    let lower = name.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
        .map_or(ShoppingCategory::Other, |rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_each_bucket() {
        assert_eq!(categorize("Red Onion"), ShoppingCategory::Produce);
        assert_eq!(categorize("whole milk"), ShoppingCategory::DairyEggs);
        assert_eq!(categorize("Salmon fillet"), ShoppingCategory::MeatFish);
        assert_eq!(categorize("all-purpose flour"), ShoppingCategory::PantryStaples);
        assert_eq!(categorize("basil"), ShoppingCategory::Other);
    }

    #[test]
    fn test_categorize_priority_order() {
        // produce beats dairy
        assert_eq!(categorize("garlic butter"), ShoppingCategory::Produce);
        // dairy beats meat
        assert_eq!(categorize("cream of chicken"), ShoppingCategory::DairyEggs);
        // meat beats pantry
        assert_eq!(categorize("fish sauce"), ShoppingCategory::MeatFish);
    }

    #[test]
    fn test_categorize_substring_false_positives() {
        assert_eq!(categorize("eggplant"), ShoppingCategory::DairyEggs);
        assert_eq!(categorize("peppermint"), ShoppingCategory::Produce);
    }

    #[test]
    fn test_categorize_empty_name() {
        assert_eq!(categorize(""), ShoppingCategory::Other);
    }

    #[test]
    fn test_categorize_with_custom_rules() {
        const RULES: &[CategoryRule] = &[CategoryRule {
            category: ShoppingCategory::Produce,
            keywords: &["basil"],
        }];
        assert_eq!(categorize_with(RULES, "Fresh Basil"), ShoppingCategory::Produce);
        assert_eq!(categorize_with(RULES, "milk"), ShoppingCategory::Other);
    }
}
