//! Marketplace API library.
//!
//! Multi-tenant e-commerce backend: buyer and seller accounts, SMS
//! verification, a seller-owned catalogue, carts and bank account
//! verification. The binary in `main.rs` is a thin wrapper; everything is
//! exposed here so it can be tested in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

pub use routes::app;
pub use state::{AppState, Components};
