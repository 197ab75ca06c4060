use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A page of search results.
#[derive(Debug, Deserialize)]
pub struct Page {
    /// This should always be "FeatureCollection".
    pub r#type: String,

    /// These are the out features, usually STAC items, but maybe not legal STAC
    /// items if fields are excluded.
    pub features: Vec<Map<String, Value>>,

    /// The next id.
    pub next: Option<String>,

    /// The previous id.
    pub prev: Option<String>,

    /// The search context.
    #[serde(default)]
    pub context: Option<Context>,
}

/// The search context, when **pgstac**'s context setting is on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Context {
    /// The number of features in this page.
    pub returned: u64,

    /// The page size that was asked for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// The number of features matching the search, if counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<u64>,
}

impl Page {
    /// Returns this page's next token, if it has one.
    pub fn next_token(&self) -> Option<String> {
        self.next.as_ref().map(|next| format!("next:{}", next))
    }

    /// Returns this page's prev token, if it has one.
    pub fn prev_token(&self) -> Option<String> {
        self.prev.as_ref().map(|prev| format!("prev:{}", prev))
    }
}

#[cfg(test)]
mod tests {
    use super::Page;
    use crate::Pagination;
    use serde_json::json;

    #[test]
    fn tokens() {
        let page: Page = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [],
            "next": "an-id",
            "prev": null,
            "context": {"returned": 0, "limit": 1},
        }))
        .unwrap();
        assert_eq!(page.next_token().as_deref(), Some("next:an-id"));
        assert!(page.prev_token().is_none());
        assert_eq!(page.context.as_ref().unwrap().limit, Some(1));
        let pagination = Pagination::from(&page);
        assert_eq!(pagination.next.as_deref(), Some("next:an-id"));
        assert!(pagination.prev.is_none());
    }

    #[test]
    fn no_context() {
        let page: Page = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{"id": "a"}],
        }))
        .unwrap();
        assert!(page.context.is_none());
        assert_eq!(page.features[0]["id"], "a");
    }
}
