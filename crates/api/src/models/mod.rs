//! Domain models for the marketplace.
//!
//! These are the shapes handlers serialize and repositories return. Rows
//! map onto them directly through `sqlx::FromRow`.

pub mod cart;
pub mod catalogue;
pub mod user;

pub use cart::{CartLine, NewCartLine};
pub use catalogue::{
    Category, CategoryChanges, CategoryFilter, NewCategory, NewProduct, Product, ProductChanges,
    ProductFilter,
};
pub use user::{
    Address, AddressChanges, BankAccount, NewAddress, NewUser, SellerUpgrade, User, UserChanges,
};
