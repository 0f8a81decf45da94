//! In-memory repositories.
//!
//! [`MemoryStore`] implements every repository trait over a single mutex so
//! services and routes can be exercised without a database. It enforces the
//! same unique, foreign-key and cascade rules as the migrations and reports
//! violations under the same constraint names, so error translation behaves
//! identically against either store.

use std::cmp::Reverse;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use marketplace_core::{
    AddressId, BankAccountId, CartLineId, CategoryId, Email, Price, ProductId, UserId, UserRole,
};

use super::constraints;
use super::{CartRepository, CatalogueRepository, RepositoryError, UserRepository};
use crate::models::{
    Address, AddressChanges, BankAccount, CartLine, Category, CategoryChanges, CategoryFilter,
    NewAddress, NewCartLine, NewCategory, NewProduct, NewUser, Product, ProductChanges,
    ProductFilter, SellerUpgrade, User, UserChanges, catalogue::matches_search,
};

const CATEGORIES_PARENT: &str = "categories_parent_id_fkey";
const CART_ITEMS_PRODUCT: &str = "cart_items_product_id_fkey";

#[derive(Default)]
struct Sequences {
    users: i32,
    addresses: i32,
    bank_accounts: i32,
    categories: i32,
    products: i32,
    cart_items: i32,
}

fn bump(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct State {
    seq: Sequences,
    /// Users alongside their password hashes.
    users: Vec<(User, String)>,
    addresses: Vec<Address>,
    bank_accounts: Vec<BankAccount>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart: Vec<CartLine>,
}

impl State {
    fn user_mut(&mut self, id: UserId) -> Result<&mut User, RepositoryError> {
        self.users
            .iter_mut()
            .map(|(u, _)| u)
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn check_user_unique(
        &self,
        id: Option<UserId>,
        email: Option<&Email>,
        phone: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let others = self.users.iter().map(|(u, _)| u).filter(|u| Some(u.id) != id);
        for other in others {
            if email.is_some_and(|e| other.email == *e) {
                return Err(RepositoryError::conflict(constraints::USERS_EMAIL));
            }
            if phone.is_some_and(|p| other.phone.as_str() == p) {
                return Err(RepositoryError::conflict(constraints::USERS_PHONE));
            }
        }
        Ok(())
    }

    fn check_parent(&self, parent_id: Option<CategoryId>) -> Result<(), RepositoryError> {
        match parent_id {
            Some(parent) if !self.categories.iter().any(|c| c.id == parent) => Err(
                RepositoryError::foreign_key("categories", "insert or update", CATEGORIES_PARENT),
            ),
            _ => Ok(()),
        }
    }

    fn check_category(&self, category_id: CategoryId) -> Result<(), RepositoryError> {
        if self.categories.iter().any(|c| c.id == category_id) {
            Ok(())
        } else {
            Err(RepositoryError::foreign_key(
                "products",
                "insert or update",
                constraints::PRODUCTS_CATEGORY,
            ))
        }
    }

    fn remove_products(&mut self, doomed: impl Fn(&Product) -> bool) {
        let removed: Vec<ProductId> = self
            .products
            .iter()
            .filter(|p| doomed(p))
            .map(|p| p.id)
            .collect();
        self.products.retain(|p| !removed.contains(&p.id));
        self.cart.retain(|l| !removed.contains(&l.product_id));
    }

    fn cart_line_mut(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<&mut CartLine, RepositoryError> {
        self.cart
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .ok_or(RepositoryError::NotFound)
    }
}

/// Thread-safe in-memory store backing all three repository traits.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state();
        state.check_user_unique(None, Some(&user.email), Some(user.phone.as_str()))?;

        let now = Utc::now();
        let created = User {
            id: UserId::new(bump(&mut state.seq.users)),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            user_type: UserRole::Buyer,
            verified: false,
            code: 0,
            expiry: None,
            created_at: now,
            updated_at: now,
        };
        state
            .users
            .push((created.clone(), user.password_hash.clone()));
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| u.email == *email)
            .map(|(u, _)| u.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| u.email == *email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.state().users.iter().map(|(u, _)| u.clone()).collect())
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let mut state = self.state();
        state.user_mut(id)?;
        state.check_user_unique(
            Some(id),
            changes.email.as_ref(),
            changes.phone.as_ref().map(|p| p.as_str()),
        )?;

        let (user, password) = state
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(first_name) = &changes.first_name {
            user.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name.clone_from(last_name);
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            user.phone = phone.clone();
        }
        if let Some(hash) = &changes.password_hash {
            password.clone_from(hash);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state.user_mut(id)?;

        let owned: Vec<CategoryId> = state
            .categories
            .iter()
            .filter(|c| c.seller_id == id)
            .map(|c| c.id)
            .collect();
        let blocked = state
            .products
            .iter()
            .any(|p| p.seller_id != id && owned.contains(&p.category_id));
        if blocked {
            return Err(RepositoryError::foreign_key(
                "categories",
                "update or delete",
                constraints::PRODUCTS_CATEGORY,
            ));
        }

        state.remove_products(|p| p.seller_id == id);
        state.categories.retain(|c| c.seller_id != id);
        for category in &mut state.categories {
            if category.parent_id.is_some_and(|p| owned.contains(&p)) {
                category.parent_id = None;
            }
        }
        state.addresses.retain(|a| a.user_id != id);
        state.bank_accounts.retain(|b| b.user_id != id);
        state.cart.retain(|l| l.user_id != id);
        state.users.retain(|(u, _)| u.id != id);
        Ok(())
    }

    async fn set_verification_code(
        &self,
        id: UserId,
        code: i32,
        expiry: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let user = state.user_mut(id)?;
        user.code = code;
        user.expiry = Some(expiry);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_verified(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let user = state.user_mut(id)?;
        user.verified = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn upgrade_to_seller(
        &self,
        id: UserId,
        upgrade: &SellerUpgrade,
    ) -> Result<Option<(User, BankAccount)>, RepositoryError> {
        let mut state = self.state();
        if state.user_mut(id)?.user_type != UserRole::Buyer {
            return Ok(None);
        }
        state.check_user_unique(Some(id), None, Some(upgrade.phone.as_str()))?;

        let now = Utc::now();
        let user = state.user_mut(id)?;
        user.first_name.clone_from(&upgrade.first_name);
        user.last_name.clone_from(&upgrade.last_name);
        user.phone = upgrade.phone.clone();
        user.user_type = UserRole::Seller;
        user.updated_at = now;
        let user = user.clone();

        let account = BankAccount {
            id: BankAccountId::new(bump(&mut state.seq.bank_accounts)),
            user_id: id,
            bank_name: upgrade.bank_name.clone(),
            bank_account_number: upgrade.bank_account_number.clone(),
            bank_code: upgrade.bank_code.clone(),
            created_at: now,
            updated_at: now,
        };
        state.bank_accounts.push(account.clone());
        Ok(Some((user, account)))
    }

    async fn bank_accounts(&self, id: UserId) -> Result<Vec<BankAccount>, RepositoryError> {
        Ok(self
            .state()
            .bank_accounts
            .iter()
            .filter(|b| b.user_id == id)
            .cloned()
            .collect())
    }

    async fn find_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .state()
            .addresses
            .iter()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn create_address(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut state = self.state();
        if state.addresses.iter().any(|a| a.user_id == user_id) {
            return Err(RepositoryError::conflict(constraints::ADDRESSES_USER));
        }

        let now = Utc::now();
        let created = Address {
            id: AddressId::new(bump(&mut state.seq.addresses)),
            user_id,
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
            postal_code: address.postal_code.clone(),
            created_at: now,
            updated_at: now,
        };
        state.addresses.push(created.clone());
        Ok(created)
    }

    async fn update_address(
        &self,
        user_id: UserId,
        changes: &AddressChanges,
    ) -> Result<Address, RepositoryError> {
        let mut state = self.state();
        let address = state
            .addresses
            .iter_mut()
            .find(|a| a.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        let fields = [
            (&mut address.address_line1, &changes.address_line1),
            (&mut address.address_line2, &changes.address_line2),
            (&mut address.city, &changes.city),
            (&mut address.state, &changes.state),
            (&mut address.country, &changes.country),
            (&mut address.postal_code, &changes.postal_code),
        ];
        for (field, change) in fields {
            if let Some(value) = change {
                field.clone_from(value);
            }
        }
        address.updated_at = Utc::now();
        Ok(address.clone())
    }
}

#[async_trait]
impl CatalogueRepository for MemoryStore {
    async fn create_category(
        &self,
        seller_id: UserId,
        category: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let mut state = self.state();
        state.check_parent(category.parent_id)?;

        let now = Utc::now();
        let created = Category {
            id: CategoryId::new(bump(&mut state.seq.categories)),
            name: category.name.clone(),
            parent_id: category.parent_id,
            image_url: category.image_url.clone(),
            seller_id,
            display_order: category.display_order,
            description: category.description.clone(),
            created_at: now,
            updated_at: now,
        };
        state.categories.push(created.clone());
        Ok(created)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .state()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<(Vec<Category>, i64), RepositoryError> {
        let mut matching: Vec<Category> = self
            .state()
            .categories
            .iter()
            .filter(|c| matches_search(filter.search.as_deref(), &c.name, c.description.as_deref()))
            .filter(|c| filter.created.contains(c.created_at))
            .filter(|c| filter.parent_id.is_none_or(|p| c.parent_id == Some(p)))
            .cloned()
            .collect();
        matching.sort_by_key(|c| (c.display_order, Reverse(c.created_at), Reverse(c.id)));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        Ok((filter.page.apply(&matching), total))
    }

    async fn update_category(
        &self,
        id: CategoryId,
        changes: &CategoryChanges,
    ) -> Result<Category, RepositoryError> {
        let mut state = self.state();
        state.check_parent(changes.parent_id)?;

        let category = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        *category = Category {
            updated_at: Utc::now(),
            ..changes.apply_to(category)
        };
        Ok(category.clone())
    }

    async fn count_products_in_category(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count = self
            .state()
            .products
            .iter()
            .filter(|p| p.category_id == id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.categories.iter().any(|c| c.id == id) {
            return Err(RepositoryError::NotFound);
        }
        if state.products.iter().any(|p| p.category_id == id) {
            return Err(RepositoryError::foreign_key(
                "categories",
                "update or delete",
                constraints::PRODUCTS_CATEGORY,
            ));
        }

        state.categories.retain(|c| c.id != id);
        for child in &mut state.categories {
            if child.parent_id == Some(id) {
                child.parent_id = None;
            }
        }
        Ok(())
    }

    async fn create_product(
        &self,
        seller_id: UserId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state();
        state.check_category(product.category_id)?;

        let now = Utc::now();
        let created = Product {
            id: ProductId::new(bump(&mut state.seq.products)),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category_id: product.category_id,
            stock: product.stock,
            image_url: product.image_url.clone(),
            seller_id,
            created_at: now,
            updated_at: now,
        };
        state.products.push(created.clone());
        Ok(created)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state().products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut matching: Vec<Product> = self
            .state()
            .products
            .iter()
            .filter(|p| matches_search(filter.search.as_deref(), &p.name, p.description.as_deref()))
            .filter(|p| filter.created.contains(p.created_at))
            .cloned()
            .collect();
        matching.sort_by_key(|p| (Reverse(p.created_at), Reverse(p.id)));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        Ok((filter.page.apply(&matching), total))
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state();
        if !state.products.iter().any(|p| p.id == id) {
            return Err(RepositoryError::NotFound);
        }
        state.check_category(changes.category_id)?;

        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        product.name.clone_from(&changes.name);
        product.description.clone_from(&changes.description);
        product.price = changes.price;
        product.category_id = changes.category_id;
        product.stock = changes.stock;
        product.image_url.clone_from(&changes.image_url);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.products.iter().any(|p| p.id == id) {
            return Err(RepositoryError::NotFound);
        }
        state.remove_products(|p| p.id == id);
        Ok(())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn add(&self, line: &NewCartLine) -> Result<CartLine, RepositoryError> {
        let mut state = self.state();
        if !state.products.iter().any(|p| p.id == line.product_id) {
            return Err(RepositoryError::foreign_key(
                "cart_items",
                "insert or update",
                CART_ITEMS_PRODUCT,
            ));
        }

        let now = Utc::now();
        if let Ok(existing) = state.cart_line_mut(line.user_id, line.product_id) {
            existing.quantity = existing
                .quantity
                .checked_add(line.quantity)
                .ok_or_else(|| RepositoryError::OutOfRange {
                    detail: "integer out of range".to_owned(),
                })?;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = CartLine {
            id: CartLineId::new(bump(&mut state.seq.cart_items)),
            user_id: line.user_id,
            seller_id: line.seller_id,
            product_id: line.product_id,
            name: line.name.clone(),
            image_url: line.image_url.clone(),
            price: line.price,
            quantity: line.quantity,
            created_at: now,
            updated_at: now,
        };
        state.cart.push(created.clone());
        Ok(created)
    }

    async fn get(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .state()
            .cart
            .iter()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .cloned())
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut lines: Vec<CartLine> = self
            .state()
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| (l.created_at, l.id));
        Ok(lines)
    }

    async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
        price: Option<Price>,
    ) -> Result<CartLine, RepositoryError> {
        let mut state = self.state();
        let line = state.cart_line_mut(user_id, product_id)?;
        if let Some(quantity) = quantity {
            line.quantity = quantity;
        }
        if let Some(price) = price {
            line.price = price;
        }
        line.updated_at = Utc::now();
        Ok(line.clone())
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        CartRepository::update(self, user_id, product_id, Some(quantity), None).await
    }

    async fn delete(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let before = state.cart.len();
        state
            .cart
            .retain(|l| !(l.user_id == user_id && l.product_id == product_id));
        if state.cart.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut state = self.state();
        let before = state.cart.len();
        state.cart.retain(|l| l.user_id != user_id);
        Ok(u64::try_from(before - state.cart.len()).unwrap_or(u64::MAX))
    }
}
