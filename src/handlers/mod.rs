pub mod auth;
pub mod category;
pub mod comment;
pub mod favorite;
pub mod post;
pub mod profile;
pub mod upload;

pub use auth::*;

use serde::{Deserialize, Deserializer};

/// Distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        category: Option<Option<i32>>,
    }

    #[test]
    fn double_option_tells_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.category, None);

        let null: Patch = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(null.category, Some(None));

        let set: Patch = serde_json::from_str(r#"{"category": 4}"#).unwrap();
        assert_eq!(set.category, Some(Some(4)));
    }
}
