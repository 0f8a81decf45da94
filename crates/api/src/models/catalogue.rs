//! Category and product types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marketplace_core::{CategoryId, DateRange, Pagination, Price, ProductId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub seller_id: UserId,
    pub display_order: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub display_order: i32,
}

/// Category update. `name` always overwrites; the rest only when `Some`.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
}

impl CategoryChanges {
    /// Merge onto `existing`, the way both stores apply an update.
    #[must_use]
    pub fn apply_to(&self, existing: &Category) -> Category {
        Category {
            name: self.name.clone(),
            description: self
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            parent_id: self.parent_id.or(existing.parent_id),
            image_url: self.image_url.clone().or_else(|| existing.image_url.clone()),
            display_order: self.display_order.unwrap_or(existing.display_order),
            ..existing.clone()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub created: DateRange,
    pub parent_id: Option<CategoryId>,
    pub page: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: CategoryId,
    pub stock: i32,
    pub image_url: Option<String>,
    pub seller_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: CategoryId,
    pub stock: i32,
    pub image_url: Option<String>,
}

/// Fully resolved product columns for an update. The service merges
/// request input onto the stored row before handing this to a repository.
#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: CategoryId,
    pub stock: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub created: DateRange,
    pub page: Pagination,
}

/// Shared search predicate for the in-memory store and tests.
#[must_use]
pub fn matches_search(search: Option<&str>, name: &str, description: Option<&str>) -> bool {
    let Some(needle) = search.map(str::to_lowercase) else {
        return true;
    };
    name.to_lowercase().contains(&needle)
        || description.is_some_and(|d| d.to_lowercase().contains(&needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category() -> Category {
        Category {
            id: CategoryId::new(1),
            name: "Phones".to_owned(),
            parent_id: Some(CategoryId::new(9)),
            image_url: Some("phones.png".to_owned()),
            seller_id: UserId::new(1),
            display_order: 3,
            description: Some("Mobile phones".to_owned()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_changes_keep_unset_fields() {
        let changes = CategoryChanges {
            name: "Smartphones".to_owned(),
            ..CategoryChanges::default()
        };
        let updated = changes.apply_to(&category());

        assert_eq!(updated.name, "Smartphones");
        assert_eq!(updated.description.as_deref(), Some("Mobile phones"));
        assert_eq!(updated.image_url.as_deref(), Some("phones.png"));
        assert_eq!(updated.parent_id, Some(CategoryId::new(9)));
        assert_eq!(updated.display_order, 3);
    }

    #[test]
    fn test_category_changes_overwrite_set_fields() {
        let changes = CategoryChanges {
            name: "Phones".to_owned(),
            display_order: Some(0),
            description: Some("All phones".to_owned()),
            ..CategoryChanges::default()
        };
        let updated = changes.apply_to(&category());

        assert_eq!(updated.display_order, 0);
        assert_eq!(updated.description.as_deref(), Some("All phones"));
    }

    #[test]
    fn test_matches_search_is_case_insensitive() {
        assert!(matches_search(Some("PHO"), "Phone", None));
        assert!(matches_search(Some("mobile"), "X", Some("Mobile stuff")));
        assert!(!matches_search(Some("laptop"), "Phone", Some("Mobile")));
        assert!(matches_search(None, "anything", None));
    }
}
