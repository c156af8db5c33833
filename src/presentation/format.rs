use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %H:%M";
pub const MEDIA_URL_PREFIX: &str = "/media/";

/// A value, or the string `"null"` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrNull<T> {
    Value(T),
    Null,
}

impl<T> From<Option<T>> for OrNull<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(OrNull::Null, OrNull::Value)
    }
}

impl<T: Serialize> Serialize for OrNull<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OrNull::Value(v) => v.serialize(serializer),
            OrNull::Null => serializer.serialize_str("null"),
        }
    }
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Absolute URL for a file stored under the media root.
/// Missing or empty paths yield `"null"`.
pub fn media_url(base: &str, path: Option<&str>) -> OrNull<String> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => OrNull::Value(format!(
            "{}{}{}",
            base.trim_end_matches('/'),
            MEDIA_URL_PREFIX,
            p.trim_start_matches('/')
        )),
        None => OrNull::Null,
    }
}
