//! Category registry
//!
//! The set of categories visible to one user: the global read-only defaults
//! plus the user's own. Every lookup that misses lands in the fallback
//! bucket so breakdowns always account for the full total.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Category;

/// Name of the bucket that collects uncategorized and unknown-category spend
pub const FALLBACK_CATEGORY: &str = "Other";

/// Color of the fallback bucket
pub const FALLBACK_COLOR: &str = "#64748b";

/// A default category definition (name, color, icon)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Built-in defaults, used when no configuration overrides them
pub fn builtin_categories() -> Vec<CategorySpec> {
    [
        ("Food & Dining", "#ef4444", "utensils"),
        ("Transportation", "#f59e0b", "car"),
        ("Shopping", "#8b5cf6", "shopping-bag"),
        ("Entertainment", "#ec4899", "film"),
        ("Bills & Utilities", "#3b82f6", "file-text"),
        ("Healthcare", "#10b981", "heart"),
        ("Travel", "#06b6d4", "plane"),
        ("Groceries", "#84cc16", "shopping-cart"),
        ("Subscriptions", "#a855f7", "repeat"),
        (FALLBACK_CATEGORY, FALLBACK_COLOR, "more-horizontal"),
    ]
    .into_iter()
    .map(|(name, color, icon)| CategorySpec {
        name: name.to_string(),
        color: color.to_string(),
        icon: Some(icon.to_string()),
    })
    .collect()
}

/// Categories visible to a user, indexed by name
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    by_name: HashMap<String, usize>,
}

impl CategoryRegistry {
    /// Build a registry; later entries with a duplicate name are ignored.
    /// The fallback bucket is added if missing.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut registry = Self {
            categories: Vec::new(),
            by_name: HashMap::new(),
        };
        for category in categories {
            registry.insert(category);
        }
        if !registry.by_name.contains_key(FALLBACK_CATEGORY) {
            registry.insert(Category {
                id: Uuid::new_v4(),
                name: FALLBACK_CATEGORY.to_string(),
                color: FALLBACK_COLOR.to_string(),
                icon: None,
                owner: None,
            });
        }
        registry
    }

    /// Registry of global defaults built from specs
    pub fn from_specs(specs: &[CategorySpec]) -> Self {
        Self::new(specs.iter().map(|spec| Category {
            id: Uuid::new_v4(),
            name: spec.name.clone(),
            color: spec.color.clone(),
            icon: spec.icon.clone(),
            owner: None,
        }))
    }

    fn insert(&mut self, category: Category) {
        if self.by_name.contains_key(&category.name) {
            return;
        }
        self.by_name
            .insert(category.name.clone(), self.categories.len());
        self.categories.push(category);
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.by_name.get(name).map(|&i| &self.categories[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The category an expense with this category name is counted under
    pub fn resolve(&self, name: Option<&str>) -> &Category {
        name.and_then(|n| self.get(n))
            .unwrap_or_else(|| self.fallback())
    }

    pub fn fallback(&self) -> &Category {
        // `new` always inserts the fallback bucket
        &self.categories[self.by_name[FALLBACK_CATEGORY]]
    }

    /// All categories in registration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryRegistry {
    /// Just the fallback bucket
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_category(name: &str, owner: Uuid) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: "#000000".to_string(),
            icon: None,
            owner: Some(owner),
        }
    }

    #[test]
    fn test_builtin_defaults() {
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        assert_eq!(registry.len(), 10);
        assert!(registry.contains("Groceries"));
        assert!(registry.categories().iter().all(Category::is_default));
        assert_eq!(registry.fallback().color, FALLBACK_COLOR);
    }

    #[test]
    fn test_fallback_added_when_missing() {
        let owner = Uuid::new_v4();
        let registry = CategoryRegistry::new(vec![user_category("Pets", owner)]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.fallback().name, FALLBACK_CATEGORY);
    }

    #[test]
    fn test_resolve_unknown_and_missing() {
        let registry = CategoryRegistry::from_specs(&builtin_categories());
        assert_eq!(registry.resolve(Some("Travel")).name, "Travel");
        assert_eq!(registry.resolve(Some("Yachts")).name, FALLBACK_CATEGORY);
        assert_eq!(registry.resolve(None).name, FALLBACK_CATEGORY);
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let owner = Uuid::new_v4();
        let mut categories: Vec<Category> = CategoryRegistry::from_specs(&builtin_categories())
            .categories()
            .to_vec();
        categories.push(user_category("Travel", owner));
        let registry = CategoryRegistry::new(categories);
        assert!(registry.get("Travel").unwrap().is_default());
        assert_eq!(registry.len(), 10);
    }
}
