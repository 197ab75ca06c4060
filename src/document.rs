//! Checks on stored STAC documents and the patches applied to them.

use crate::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Returns a document's `id`, checking that it's a well-formed identifier.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use pgstac_api::document::validate_id;
/// let document = json!({"id": "an-id_1.0"});
/// assert_eq!(validate_id(document.as_object().unwrap()).unwrap(), "an-id_1.0");
/// let document = json!({"id": "an id"});
/// assert!(validate_id(document.as_object().unwrap()).is_err());
/// ```
pub fn validate_id(document: &Map<String, Value>) -> Result<&str> {
    let id = string_field(document, "id")?;
    if is_id(id) {
        Ok(id)
    } else {
        Err(Error::InvalidId(id.to_string()))
    }
}

/// Checks that a document belongs to the collection named in its path.
pub fn validate_collection(document: &Map<String, Value>, expected: &str) -> Result<()> {
    let collection = string_field(document, "collection")?;
    if collection == expected {
        Ok(())
    } else {
        tracing::debug!(path = expected, document = collection, "collection ids do not match");
        Err(Error::CollectionMismatch {
            path: expected.to_string(),
            document: collection.to_string(),
        })
    }
}

/// Checks that a patch doesn't try to move a document.
///
/// Patches may leave out `id` and `collection`. If they're there, they must
/// match where the document already lives.
pub fn validate_patch(
    patch: &Map<String, Value>,
    id: &str,
    collection: Option<&str>,
) -> Result<()> {
    if patch.contains_key("id") {
        let patched = validate_id(patch)?;
        if patched != id {
            return Err(Error::InvalidId(patched.to_string()));
        }
    }
    if let Some(collection) = collection {
        if patch.contains_key("collection") {
            validate_collection(patch, collection)?;
        }
    }
    Ok(())
}

fn string_field<'a>(document: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    document
        .get(field)
        .and_then(Value::as_str)
        .ok_or(Error::MissingField(field))
}

fn is_id(s: &str) -> bool {
    static ID: OnceLock<Regex> = OnceLock::new();
    ID.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\-_.]+$").expect("the id pattern is valid"))
        .is_match(s)
}
