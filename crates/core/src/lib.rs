//! Marketplace Core - Shared types library.
//!
//! This crate provides common types used across all marketplace components:
//! - `api` - REST backend for buyers and sellers
//! - `cli` - Command-line tools for migrations
//! - `integration-tests` - End-to-end HTTP scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, phone
//!   numbers, roles, partial updates and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
