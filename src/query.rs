use crate::{Fields, FilterLang, SortBy};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The page size used when the client doesn't ask for one.
pub const DEFAULT_LIMIT: u64 = 10;

/// The largest page size we'll ask pgstac for.
pub const MAX_LIMIT: u64 = 10_000;

/// A canonical search query, as handed to **pgstac**'s `search` function.
///
/// Build these with a [Normalizer](crate::Normalizer) to get validated
/// values. Pagination never modifies a query, it creates a new one with
/// [Query::with_token].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Query {
    /// Array of Collection ids to include in the search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    /// Array of Item ids to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// Requested bounding box, 4 or 6 numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Searches items by performing intersection between their geometry and
    /// the provided GeoJSON geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<Value>"))]
    pub intersects: Option<Geometry>,

    /// Single date+time, or a range ('/' separator).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// The maximum number of results to return (page size).
    pub limit: u64,

    /// Extra **pgstac** configuration, passed through unexamined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conf: Option<Value>,

    /// A query extension expression, passed through unexamined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,

    /// Include/exclude fields from item collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,

    /// Fields by which to sort results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sortby: Vec<SortBy>,

    /// CQL2 filter expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    /// The language of the filter.
    #[serde(rename = "filter-lang", default)]
    pub filter_lang: FilterLang,

    /// The pagination token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Query {
    /// Returns a copy of this query with a different pagination token.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgstac_api::Query;
    /// let query = Query::default();
    /// let next = query.with_token(Some("next:an-id"));
    /// assert_eq!(next.token.as_deref(), Some("next:an-id"));
    /// assert!(query.token.is_none());
    /// ```
    pub fn with_token(&self, token: Option<&str>) -> Query {
        Query {
            token: token.map(String::from),
            ..self.clone()
        }
    }

    /// Restricts this query to a single collection.
    pub fn in_collection(self, collection: impl ToString) -> Query {
        Query {
            collections: Some(vec![collection.to_string()]),
            ..self
        }
    }
}

impl Default for Query {
    fn default() -> Query {
        Query {
            collections: None,
            ids: None,
            bbox: None,
            intersects: None,
            datetime: None,
            limit: DEFAULT_LIMIT,
            conf: None,
            query: None,
            fields: None,
            sortby: Vec::new(),
            filter: None,
            filter_lang: FilterLang::Cql2Json,
            token: None,
        }
    }
}
