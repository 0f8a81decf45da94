//! HTTP middleware for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//!
//! Authentication is per-handler through the [`RequireAuth`] and
//! [`RequireSeller`] extractors.

pub mod auth;
pub mod request_id;

pub use auth::{RequireAuth, RequireSeller};
pub use request_id::request_id_middleware;
