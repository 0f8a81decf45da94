//! Catalogue rules: seller-owned categories and products.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use marketplace_core::{CategoryId, Page, Patch, Price, ProductId, UserId};

use super::non_blank;
use crate::db::{CatalogueRepository, RepositoryError};
use crate::models::{
    Category, CategoryChanges, CategoryFilter, NewCategory, NewProduct, Product, ProductChanges,
    ProductFilter,
};

pub const NAME_REQUIRED: &str = "Field 'name' is required";
pub const NAME_EMPTY: &str = "Field 'name' cannot be empty";
pub const PRICE_NOT_POSITIVE: &str = "Field 'price' must be greater than 0";
pub const CATEGORY_REQUIRED: &str = "Field 'category_id' is required and must be a valid category ID";
pub const CATEGORY_INVALID: &str = "Field 'category_id' must be a valid category ID";
pub const STOCK_NEGATIVE: &str = "Field 'stock' cannot be negative";
pub const EMPTY_PATCH: &str = "Request body cannot be empty. Provide at least one field to update";

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("you can only modify your own products")]
    Unauthorized,

    #[error("category has associated products")]
    HasProducts { detail: Option<String> },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CatalogueError {
    fn validation(message: &str) -> Self {
        Self::Validation(message.to_owned())
    }
}

/// Category create/update input.
#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
}

/// Product create/replace input. Missing numeric fields arrive as zero.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub stock: i32,
    pub image_url: Option<String>,
}

/// Partial product update. Only present fields are validated and applied.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Patch<String>,
    pub description: Patch<String>,
    pub price: Patch<Decimal>,
    pub category_id: Patch<CategoryId>,
    pub stock: Patch<i32>,
    pub image_url: Patch<String>,
}

impl ProductPatch {
    fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.description.is_absent()
            && self.price.is_absent()
            && self.category_id.is_absent()
            && self.stock.is_absent()
            && self.image_url.is_absent()
    }
}

/// Validated required product columns.
struct ProductCore {
    name: String,
    price: Price,
    category_id: CategoryId,
    stock: i32,
}

fn validate_product(input: &ProductInput) -> Result<ProductCore, CatalogueError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(CatalogueError::validation(NAME_REQUIRED));
    }
    let price =
        Price::new(input.price).map_err(|_| CatalogueError::validation(PRICE_NOT_POSITIVE))?;
    if input.category_id.is_unset() {
        return Err(CatalogueError::validation(CATEGORY_REQUIRED));
    }
    if input.stock < 0 {
        return Err(CatalogueError::validation(STOCK_NEGATIVE));
    }

    Ok(ProductCore {
        name: name.to_owned(),
        price,
        category_id: input.category_id,
        stock: input.stock,
    })
}

fn require_seller(seller_id: UserId) -> Result<(), CatalogueError> {
    if seller_id.is_unset() {
        return Err(CatalogueError::validation("seller id is required"));
    }
    Ok(())
}

pub struct CatalogueService<'a> {
    repo: &'a dyn CatalogueRepository,
}

impl<'a> CatalogueService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn CatalogueRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// `Validation` for a blank name or unset seller.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        seller_id: UserId,
        input: CategoryInput,
    ) -> Result<Category, CatalogueError> {
        require_seller(seller_id)?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CatalogueError::validation(NAME_REQUIRED));
        }

        let category = NewCategory {
            name: name.to_owned(),
            description: non_blank(input.description),
            parent_id: input.parent_id.filter(|p| !p.is_unset()),
            image_url: non_blank(input.image_url),
            display_order: input.display_order.unwrap_or(0),
        };
        let created = self.repo.create_category(seller_id, &category).await?;

        tracing::info!(category_id = %created.id, %seller_id, "Category created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Repository failures only.
    pub async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Page<Category>, CatalogueError> {
        let (categories, total) = self.repo.list_categories(filter).await?;
        Ok(Page::new(categories, filter.page.meta(total)))
    }

    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, CatalogueError> {
        self.repo
            .get_category(id)
            .await?
            .ok_or(CatalogueError::NotFound("category"))
    }

    /// Overwrite the name; keep stored values for blank or absent optionals.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name, `NotFound` for an unknown id.
    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: CategoryInput,
    ) -> Result<Category, CatalogueError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CatalogueError::validation(NAME_EMPTY));
        }

        let changes = CategoryChanges {
            name: name.to_owned(),
            description: non_blank(input.description),
            parent_id: input.parent_id.filter(|p| !p.is_unset()),
            image_url: non_blank(input.image_url),
            display_order: input.display_order,
        };

        self.repo
            .update_category(id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogueError::NotFound("category"),
                other => CatalogueError::Repository(other),
            })
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    ///
    /// `HasProducts` while products remain, `NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogueError> {
        let products = self.repo.count_products_in_category(id).await?;
        if products > 0 {
            return Err(CatalogueError::HasProducts { detail: None });
        }

        // A product inserted between the count and the delete trips the FK.
        match self.repo.delete_category(id).await {
            Ok(()) => {
                tracing::info!(category_id = %id, "Category deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(CatalogueError::NotFound("category")),
            Err(RepositoryError::ForeignKey { detail, .. }) => {
                Err(CatalogueError::HasProducts {
                    detail: Some(detail),
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// `Validation` for bad fields; a `ForeignKey` repository error if the
    /// category does not exist.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        seller_id: UserId,
        input: ProductInput,
    ) -> Result<Product, CatalogueError> {
        require_seller(seller_id)?;
        let core = validate_product(&input)?;

        let product = NewProduct {
            name: core.name,
            description: non_blank(input.description),
            price: core.price,
            category_id: core.category_id,
            stock: core.stock,
            image_url: non_blank(input.image_url),
        };
        let created = self.repo.create_product(seller_id, &product).await?;

        tracing::info!(product_id = %created.id, %seller_id, "Product created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Repository failures only.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, CatalogueError> {
        let (products, total) = self.repo.list_products(filter).await?;
        Ok(Page::new(products, filter.page.meta(total)))
    }

    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogueError> {
        self.repo
            .get_product(id)
            .await?
            .ok_or(CatalogueError::NotFound("product"))
    }

    async fn owned_product(
        &self,
        id: ProductId,
        seller_id: UserId,
    ) -> Result<Product, CatalogueError> {
        let existing = self.get_product(id).await?;
        if existing.seller_id != seller_id {
            tracing::warn!(product_id = %id, %seller_id, owner = %existing.seller_id, "Product update by non-owner");
            return Err(CatalogueError::Unauthorized);
        }
        Ok(existing)
    }

    async fn save_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, CatalogueError> {
        self.repo
            .update_product(id, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogueError::NotFound("product"),
                other => CatalogueError::Repository(other),
            })
    }

    /// Replace a product's fields. Blank description or image URL keeps the
    /// stored value.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, or `Unauthorized` for another seller's
    /// product.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        seller_id: UserId,
        input: ProductInput,
    ) -> Result<Product, CatalogueError> {
        let core = validate_product(&input)?;
        let existing = self.owned_product(id, seller_id).await?;

        let changes = ProductChanges {
            name: core.name,
            description: non_blank(input.description).or(existing.description),
            price: core.price,
            category_id: core.category_id,
            stock: core.stock,
            image_url: non_blank(input.image_url).or(existing.image_url),
        };
        self.save_product(id, &changes).await
    }

    /// Apply only the fields present in `patch`. `null` clears description
    /// and image URL and is rejected for required fields.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty patch or bad values, `NotFound`,
    /// `Unauthorized`.
    #[instrument(skip(self, patch))]
    pub async fn patch_product(
        &self,
        id: ProductId,
        seller_id: UserId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogueError> {
        if patch.is_empty() {
            return Err(CatalogueError::validation(EMPTY_PATCH));
        }

        let name = super::required_text("name", patch.name).map_err(CatalogueError::Validation)?;
        let price = match patch.price {
            Patch::Absent => None,
            Patch::Null => return Err(CatalogueError::validation(PRICE_NOT_POSITIVE)),
            Patch::Value(p) => Some(
                Price::new(p).map_err(|_| CatalogueError::validation(PRICE_NOT_POSITIVE))?,
            ),
        };
        let category_id = match patch.category_id {
            Patch::Absent => None,
            Patch::Value(c) if !c.is_unset() => Some(c),
            Patch::Null | Patch::Value(_) => {
                return Err(CatalogueError::validation(CATEGORY_INVALID));
            }
        };
        let stock = match patch.stock {
            Patch::Absent => None,
            Patch::Value(s) if s >= 0 => Some(s),
            Patch::Null | Patch::Value(_) => {
                return Err(CatalogueError::validation(STOCK_NEGATIVE));
            }
        };

        let existing = self.owned_product(id, seller_id).await?;
        let changes = ProductChanges {
            name: name.unwrap_or(existing.name),
            description: patch
                .description
                .map(|d| d.trim().to_owned())
                .apply_nullable(existing.description),
            price: price.unwrap_or(existing.price),
            category_id: category_id.unwrap_or(existing.category_id),
            stock: stock.unwrap_or(existing.stock),
            image_url: patch
                .image_url
                .map(|u| u.trim().to_owned())
                .apply_nullable(existing.image_url),
        };
        self.save_product(id, &changes).await
    }

    /// Delete a product. Any authenticated seller may delete any product.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogueError> {
        self.repo.delete_product(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogueError::NotFound("product"),
            other => CatalogueError::Repository(other),
        })?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{DateRange, Pagination};

    use super::*;
    use crate::db::memory::MemoryStore;

    const SELLER: UserId = UserId::new(1);
    const OTHER_SELLER: UserId = UserId::new(2);

    async fn category(service: &CatalogueService<'_>, name: &str) -> Category {
        service
            .create_category(
                SELLER,
                CategoryInput {
                    name: name.to_owned(),
                    ..CategoryInput::default()
                },
            )
            .await
            .unwrap()
    }

    fn phone(category_id: CategoryId) -> ProductInput {
        ProductInput {
            name: "Phone".to_owned(),
            description: Some("A phone".to_owned()),
            price: Decimal::from(500),
            category_id,
            stock: 10,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_category_validation() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);

        let err = service
            .create_category(SELLER, CategoryInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NAME_REQUIRED);

        let err = service
            .create_category(
                UserId::new(0),
                CategoryInput {
                    name: "Electronics".to_owned(),
                    ..CategoryInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_categories_total_and_order() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        for i in 0..5 {
            service
                .create_category(
                    SELLER,
                    CategoryInput {
                        name: format!("Cat {i}"),
                        display_order: Some(5 - i),
                        ..CategoryInput::default()
                    },
                )
                .await
                .unwrap();
        }

        let page = service
            .list_categories(&CategoryFilter {
                page: Pagination::new(Some(2), Some(1)),
                ..CategoryFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].display_order, 2);
        assert_eq!(page.data[1].display_order, 3);
    }

    #[tokio::test]
    async fn test_update_category_keeps_blank_fields() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let created = service
            .create_category(
                SELLER,
                CategoryInput {
                    name: "Phones".to_owned(),
                    description: Some("Mobile".to_owned()),
                    display_order: Some(4),
                    ..CategoryInput::default()
                },
            )
            .await
            .unwrap();

        let updated = service
            .update_category(
                created.id,
                CategoryInput {
                    name: "Smartphones".to_owned(),
                    description: Some(String::new()),
                    ..CategoryInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Smartphones");
        assert_eq!(updated.description.as_deref(), Some("Mobile"));
        assert_eq!(updated.display_order, 4);

        let missing = service
            .update_category(
                CategoryId::new(99),
                CategoryInput {
                    name: "X".to_owned(),
                    ..CategoryInput::default()
                },
            )
            .await;
        assert!(matches!(missing, Err(CatalogueError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_category_with_products() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let electronics = category(&service, "Electronics").await;
        let empty = category(&service, "Empty").await;
        service
            .create_product(SELLER, phone(electronics.id))
            .await
            .unwrap();

        let blocked = service.delete_category(electronics.id).await;
        assert!(matches!(blocked, Err(CatalogueError::HasProducts { .. })));
        assert!(service.get_category(electronics.id).await.is_ok());

        service.delete_category(empty.id).await.unwrap();
        assert!(matches!(
            service.delete_category(empty.id).await,
            Err(CatalogueError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_product_validation_messages() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let cat = category(&service, "Electronics").await;

        let cases = [
            (
                ProductInput {
                    name: " ".to_owned(),
                    ..phone(cat.id)
                },
                NAME_REQUIRED,
            ),
            (
                ProductInput {
                    price: Decimal::ZERO,
                    ..phone(cat.id)
                },
                PRICE_NOT_POSITIVE,
            ),
            (
                ProductInput {
                    category_id: CategoryId::default(),
                    ..phone(cat.id)
                },
                CATEGORY_REQUIRED,
            ),
            (
                ProductInput {
                    stock: -1,
                    ..phone(cat.id)
                },
                STOCK_NEGATIVE,
            ),
        ];
        for (input, message) in cases {
            let err = service.create_product(SELLER, input).await.unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_create_product_unknown_category() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);

        let err = service
            .create_product(SELLER, phone(CategoryId::new(77)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogueError::Repository(RepositoryError::ForeignKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_product_ownership() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let cat = category(&service, "Electronics").await;
        let product = service.create_product(SELLER, phone(cat.id)).await.unwrap();

        let err = service
            .update_product(
                product.id,
                OTHER_SELLER,
                ProductInput {
                    price: Decimal::from(1),
                    ..phone(cat.id)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::Unauthorized));

        let unchanged = service.get_product(product.id).await.unwrap();
        assert_eq!(unchanged.price, Price::from_units(500).unwrap());
        assert_eq!(unchanged.stock, 10);
    }

    #[tokio::test]
    async fn test_update_product_keeps_blank_description() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let cat = category(&service, "Electronics").await;
        let product = service.create_product(SELLER, phone(cat.id)).await.unwrap();

        let updated = service
            .update_product(
                product.id,
                SELLER,
                ProductInput {
                    description: Some("  ".to_owned()),
                    stock: 3,
                    ..phone(cat.id)
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("A phone"));
        assert_eq!(updated.stock, 3);
    }

    #[tokio::test]
    async fn test_patch_product() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let cat = category(&service, "Electronics").await;
        let product = service.create_product(SELLER, phone(cat.id)).await.unwrap();

        let empty = service
            .patch_product(product.id, SELLER, ProductPatch::default())
            .await
            .unwrap_err();
        assert_eq!(empty.to_string(), EMPTY_PATCH);

        let null_name = service
            .patch_product(
                product.id,
                SELLER,
                ProductPatch {
                    name: Patch::Null,
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(null_name.to_string(), NAME_EMPTY);

        let patched = service
            .patch_product(
                product.id,
                SELLER,
                ProductPatch {
                    stock: Patch::Value(0),
                    description: Patch::Null,
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.stock, 0);
        assert_eq!(patched.description, None);
        assert_eq!(patched.name, "Phone");
        assert_eq!(patched.price, Price::from_units(500).unwrap());
    }

    #[tokio::test]
    async fn test_delete_product_by_any_seller() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let cat = category(&service, "Electronics").await;
        let product = service.create_product(SELLER, phone(cat.id)).await.unwrap();

        service.delete_product(product.id).await.unwrap();
        assert!(matches!(
            service.get_product(product.id).await,
            Err(CatalogueError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_products_search_and_dates() {
        let store = MemoryStore::new();
        let service = CatalogueService::new(&store);
        let cat = category(&service, "Electronics").await;
        service.create_product(SELLER, phone(cat.id)).await.unwrap();
        service
            .create_product(
                SELLER,
                ProductInput {
                    name: "Laptop".to_owned(),
                    description: None,
                    ..phone(cat.id)
                },
            )
            .await
            .unwrap();

        let search = service
            .list_products(&ProductFilter {
                search: Some("PHONE".to_owned()),
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(search.pagination.total, 1);
        assert_eq!(search.data[0].name, "Phone");

        let future = chrono::Utc::now() + chrono::Duration::days(1);
        let none = service
            .list_products(&ProductFilter {
                created: DateRange {
                    beginning: Some(future),
                    ending: None,
                },
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(none.pagination.total, 0);
        assert!(none.data.is_empty());
    }
}
