//! Business rules for the marketplace.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer tokens
//! - `users` - User administration, profile and the seller upgrade
//! - `verification` - SMS one-time codes
//! - `catalogue` - Seller categories and products
//! - `cart` - Per-user cart lines
//! - `bank` - Bank directory and account lookup (optional provider)
//! - `sms` - Outbound SMS
//!
//! Services borrow their repositories and collaborators from
//! [`AppState`](crate::state::AppState) and are built per request.

pub mod auth;
pub mod bank;
pub mod cart;
pub mod catalogue;
pub mod sms;
pub mod users;
pub mod verification;

use marketplace_core::Patch;

/// Resolve a patched text field that may not be blank or null.
///
/// `Ok(None)` means "leave unchanged".
pub(crate) fn required_text(field: &str, patch: Patch<String>) -> Result<Option<String>, String> {
    match patch {
        Patch::Absent => Ok(None),
        Patch::Null => Err(format!("Field '{field}' cannot be empty")),
        Patch::Value(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(format!("Field '{field}' cannot be empty"));
            }
            Ok(Some(trimmed.to_owned()))
        }
    }
}

/// Treat whitespace-only input as not provided.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", Patch::Absent), Ok(None));
        assert_eq!(
            required_text("name", Patch::Value(" Phone ".to_owned())),
            Ok(Some("Phone".to_owned()))
        );
        assert_eq!(
            required_text("name", Patch::Null),
            Err("Field 'name' cannot be empty".to_owned())
        );
        assert!(required_text("name", Patch::Value("  ".to_owned())).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_owned())), None);
        assert_eq!(non_blank(Some(" x ".to_owned())), Some("x".to_owned()));
        assert_eq!(non_blank(None), None);
    }
}
