//! Recursive merging of partial JSON documents.

use crate::{error::Side, Error, Result};
use serde_json::{Map, Value};

/// Merges `patch` onto `base`, returning a new object.
///
/// Objects present in both are merged recursively. Anything else in `patch`,
/// arrays and `null` included, replaces what's in `base`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// let patch = json!({"a": {"x": 1}});
/// let base = json!({"a": {"x": 2, "y": 3}, "b": 4});
/// let merged = pgstac_api::merge(
///     patch.as_object().unwrap(),
///     base.as_object().unwrap(),
/// );
/// assert_eq!(serde_json::Value::Object(merged), json!({"a": {"x": 1, "y": 3}, "b": 4}));
/// ```
pub fn merge(patch: &Map<String, Value>, base: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    apply(&mut merged, patch.clone());
    merged
}

/// Parses two JSON objects and merges `patch` onto `base`.
///
/// Parse errors say which side failed.
pub fn merge_slices(patch: &[u8], base: &[u8]) -> Result<Map<String, Value>> {
    let patch: Map<String, Value> = serde_json::from_slice(patch).map_err(|source| {
        tracing::debug!(%source, "could not parse patch document");
        Error::Merge {
            side: Side::Patch,
            source,
        }
    })?;
    let mut base: Map<String, Value> = serde_json::from_slice(base).map_err(|source| {
        tracing::error!(%source, "could not parse base document");
        Error::Merge {
            side: Side::Base,
            source,
        }
    })?;
    apply(&mut base, patch);
    Ok(base)
}

/// Merges an owned `patch` into `base` in place.
pub fn apply(base: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(patch)) => apply(existing, patch),
            (Some(existing), value) => *existing = value,
            (None, value) => {
                let _ = base.insert(key, value);
            }
        }
    }
}
