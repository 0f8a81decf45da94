//! Field presence for partial updates.
//!
//! A `PATCH` body has to distinguish three cases per field: the client left
//! it out, the client sent `null`, or the client sent a value. `Option<T>`
//! collapses the first two, so request types use [`Patch<T>`] with
//! `#[serde(default)]` instead:
//!
//! ```
//! use marketplace_core::Patch;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Body {
//!     #[serde(default)]
//!     name: Patch<String>,
//!     #[serde(default)]
//!     description: Patch<String>,
//! }
//!
//! let body: Body = serde_json::from_str(r#"{"description": null}"#).unwrap();
//! assert!(body.name.is_absent());
//! assert!(body.description.is_null());
//! ```

use serde::{Deserialize, Deserializer};

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field not present in the request.
    #[default]
    Absent,
    /// Field present with an explicit `null`.
    Null,
    /// Field present with a value.
    Value(T),
}

impl<T> Patch<T> {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the client mentioned this field at all.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Borrow the value, if one was sent.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent | Self::Null => None,
        }
    }

    /// Resolve a nullable column: absent keeps `current`, null clears it.
    #[must_use]
    pub fn apply_nullable(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Absent => current,
            Self::Null => None,
            Self::Value(v) => Some(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Null => Patch::Null,
            Self::Value(v) => Patch::Value(f(v)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    // Only called when the key exists; `#[serde(default)]` covers Absent.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.map_or(Self::Null, Self::Value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        stock: Patch<i32>,
        #[serde(default)]
        image_url: Patch<String>,
    }

    #[test]
    fn test_three_states() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        assert!(absent.stock.is_absent());

        let null: Body = serde_json::from_str(r#"{"stock": null}"#).unwrap();
        assert!(null.stock.is_null());

        let zero: Body = serde_json::from_str(r#"{"stock": 0}"#).unwrap();
        assert_eq!(zero.stock, Patch::Value(0));
    }

    #[test]
    fn test_type_errors_still_fail() {
        assert!(serde_json::from_str::<Body>(r#"{"stock": "ten"}"#).is_err());
    }

    #[test]
    fn test_apply_nullable() {
        let current = Some("old.png".to_owned());
        let body: Body = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        assert_eq!(body.image_url.apply_nullable(current.clone()), None);

        assert_eq!(
            Patch::<String>::Absent.apply_nullable(current.clone()),
            current
        );
        assert_eq!(
            Patch::Value("new.png".to_owned()).apply_nullable(current),
            Some("new.png".to_owned())
        );
    }
}
