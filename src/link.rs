use crate::{Page, Params, Query, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

/// The path every link is rooted under, after the base url.
pub const API_PREFIX: &str = "/api/stac/v1";

/// The JSON media type.
pub const JSON: &str = "application/json";

/// The GeoJSON media type.
pub const GEOJSON: &str = "application/geo+json";

/// Query-string parameters carried over into pagination links, in the order
/// they're written.
pub const CARRIED_PARAMS: [&str; 10] = [
    "collections",
    "ids",
    "limit",
    "bbox",
    "intersects",
    "datetime",
    "filter",
    "filter-lang",
    "sortby",
    "fields",
];

/// A link to a related resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Link {
    /// The relation type.
    pub rel: String,

    /// The media type of the target.
    #[serde(rename = "type")]
    pub r#type: String,

    /// A human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The target.
    pub href: String,

    /// The HTTP method to use, if not `GET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,

    /// The request body to send, for `POST` links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// An HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,

    /// POST
    Post,
}

/// How the original request was encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport<'a> {
    /// Query-string parameters on a `GET`.
    Get(&'a Params),

    /// A JSON body on a `POST`.
    Post,
}

/// The continuation tokens of a page of results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    /// The token for the next page.
    pub next: Option<String>,

    /// The token for the previous page.
    pub prev: Option<String>,
}

/// Builds links rooted at a base url.
///
/// # Examples
///
/// ```
/// use pgstac_api::LinkBuilder;
/// let builder = LinkBuilder::new("http://stac.test/");
/// let link = builder.link("root", "/", "application/json");
/// assert_eq!(link.href, "http://stac.test/api/stac/v1/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
    prefix: String,
}

impl Link {
    /// Sets this link's title.
    pub fn title(mut self, title: impl ToString) -> Link {
        self.title = Some(title.to_string());
        self
    }
}

impl From<&Page> for Pagination {
    fn from(page: &Page) -> Pagination {
        Pagination {
            next: page.next_token(),
            prev: page.prev_token(),
        }
    }
}

impl LinkBuilder {
    /// Creates a new builder for the given base url (scheme and host).
    pub fn new(base_url: impl ToString) -> LinkBuilder {
        LinkBuilder {
            base_url: base_url.to_string().trim_end_matches('/').to_string(),
            prefix: API_PREFIX.to_string(),
        }
    }

    /// Sets the path prefix that comes between the base url and each link's
    /// path.
    pub fn with_prefix(mut self, prefix: impl ToString) -> LinkBuilder {
        self.prefix = prefix.to_string().trim_end_matches('/').to_string();
        self
    }

    /// Returns the absolute href for a path.
    pub fn href(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    /// Creates a `GET` link.
    pub fn link(&self, rel: &str, path: &str, media_type: &str) -> Link {
        Link {
            rel: rel.to_string(),
            r#type: media_type.to_string(),
            title: None,
            href: self.href(path),
            method: None,
            body: None,
        }
    }

    /// Creates a link that repeats a query with a (possibly different)
    /// continuation token, encoded the same way as the original request.
    ///
    /// `GET` requests get every parameter the client sent written back into
    /// the query string. `POST` requests get the whole query in the body.
    pub fn query_link(
        &self,
        rel: &str,
        path: &str,
        transport: Transport<'_>,
        query: &Query,
        token: Option<&str>,
    ) -> Result<Link> {
        match transport {
            Transport::Get(params) => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for key in CARRIED_PARAMS {
                    if let Some(value) = params.get(key) {
                        let _ = serializer.append_pair(key, value);
                    }
                }
                if let Some(token) = token {
                    let _ = serializer.append_pair("token", token);
                }
                let query_string = serializer.finish();
                let path = if query_string.is_empty() {
                    path.to_string()
                } else {
                    format!("{}?{}", path, query_string)
                };
                Ok(self.link(rel, &path, GEOJSON))
            }
            Transport::Post => {
                let body = serde_json::to_value(query.with_token(token))?;
                Ok(Link {
                    method: Some(Method::Post),
                    body: Some(body),
                    ..self.link(rel, path, GEOJSON)
                })
            }
        }
    }

    /// Returns the links for a page of `/search` results.
    ///
    /// In order: `self`, `root`, `parent`, then `next` and `previous` if the
    /// page has them.
    pub fn search_links(
        &self,
        transport: Transport<'_>,
        query: &Query,
        pagination: &Pagination,
    ) -> Result<Vec<Link>> {
        let navigation = [self.link("root", "/", JSON), self.link("parent", "/", JSON)];
        self.page_links("/search", transport, query, navigation, pagination)
    }

    /// Returns the links for a page of `/collections/{id}/items` results.
    ///
    /// In order: `self`, `root`, `parent`, `collection`, then `next` and
    /// `previous` if the page has them.
    pub fn items_links(
        &self,
        collection_id: &str,
        transport: Transport<'_>,
        query: &Query,
        pagination: &Pagination,
    ) -> Result<Vec<Link>> {
        let collection = format!("/collections/{}", collection_id);
        let navigation = [
            self.link("root", "/", JSON),
            self.link("parent", &collection, JSON),
            self.link("collection", &collection, JSON),
        ];
        self.page_links(
            &format!("{}/items", collection),
            transport,
            query,
            navigation,
            pagination,
        )
    }

    fn page_links(
        &self,
        path: &str,
        transport: Transport<'_>,
        query: &Query,
        navigation: impl IntoIterator<Item = Link>,
        pagination: &Pagination,
    ) -> Result<Vec<Link>> {
        let mut links = vec![self.query_link(
            "self",
            path,
            transport,
            query,
            query.token.as_deref(),
        )?];
        links.extend(navigation);
        if let Some(next) = pagination.next.as_deref() {
            links.push(self.query_link("next", path, transport, query, Some(next))?);
        }
        if let Some(prev) = pagination.prev.as_deref() {
            links.push(self.query_link("previous", path, transport, query, Some(prev))?);
        }
        tracing::debug!(path, count = links.len(), "built page links");
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkBuilder, Method, Pagination, Transport};
    use crate::{Params, Query, Request, SortBy};
    use serde_json::json;

    fn builder() -> LinkBuilder {
        LinkBuilder::new("http://stac.test")
    }

    fn pagination(next: Option<&str>, prev: Option<&str>) -> Pagination {
        Pagination {
            next: next.map(String::from),
            prev: prev.map(String::from),
        }
    }

    fn rels(links: &[super::Link]) -> Vec<&str> {
        links.iter().map(|link| link.rel.as_str()).collect()
    }

    #[test]
    fn simple_link() {
        let link = builder().link("parent", "/collections/an-id", "application/json");
        assert_eq!(link.href, "http://stac.test/api/stac/v1/collections/an-id");
        assert_eq!(
            serde_json::to_value(link).unwrap(),
            json!({
                "rel": "parent",
                "type": "application/json",
                "href": "http://stac.test/api/stac/v1/collections/an-id",
            })
        );
    }

    #[test]
    fn prefix() {
        let link = LinkBuilder::new("https://stac.test/")
            .with_prefix("/stac/")
            .link("root", "/", "application/json");
        assert_eq!(link.href, "https://stac.test/stac/");
        let link = LinkBuilder::new("https://stac.test")
            .with_prefix("")
            .link("self", "/search", "application/geo+json");
        assert_eq!(link.href, "https://stac.test/search");
    }

    #[test]
    fn title() {
        let link = builder().link("search", "/search", "application/geo+json").title("STAC search");
        assert_eq!(link.title.as_deref(), Some("STAC search"));
    }

    #[test]
    fn get_self_without_token() {
        let params = Params::parse("limit=5&bbox=1,2,3,4&unknown=x");
        let query = Query::try_from(&params).unwrap();
        let link = builder()
            .query_link("self", "/search", Transport::Get(&params), &query, None)
            .unwrap();
        assert_eq!(
            link.href,
            "http://stac.test/api/stac/v1/search?limit=5&bbox=1%2C2%2C3%2C4"
        );
        assert!(link.method.is_none());
        assert!(link.body.is_none());
    }

    #[test]
    fn get_without_params() {
        let params = Params::default();
        let link = builder()
            .query_link("self", "/search", Transport::Get(&params), &Query::default(), None)
            .unwrap();
        assert_eq!(link.href, "http://stac.test/api/stac/v1/search");
    }

    #[test]
    fn get_replaces_token() {
        let params = Params::parse("collections=a&token=next:old");
        let query = Query::try_from(&params).unwrap();
        let links = builder()
            .search_links(
                Transport::Get(&params),
                &query,
                &pagination(Some("next:new"), Some("prev:new")),
            )
            .unwrap();
        assert_eq!(rels(&links), ["self", "root", "parent", "next", "previous"]);
        assert!(links[0].href.ends_with("/search?collections=a&token=next%3Aold"));
        assert!(links[3].href.ends_with("/search?collections=a&token=next%3Anew"));
        assert!(links[4].href.ends_with("/search?collections=a&token=prev%3Anew"));
    }

    #[test]
    fn post_links_carry_the_query() {
        let request = Request::Post(
            br#"{"collections": ["a"], "limit": 2, "sortby": "-datetime"}"#.to_vec(),
        );
        let query = crate::Normalizer::new().normalize(&request).unwrap();
        let links = builder()
            .search_links(request.transport(), &query, &pagination(Some("next:b"), None))
            .unwrap();
        assert_eq!(rels(&links), ["self", "root", "parent", "next"]);

        let this = &links[0];
        assert_eq!(this.href, "http://stac.test/api/stac/v1/search");
        assert_eq!(this.method, Some(Method::Post));
        assert_eq!(
            this.body.as_ref().unwrap(),
            &serde_json::to_value(&query).unwrap()
        );
        assert!(this.body.as_ref().unwrap().get("token").is_none());

        let next = &links[3];
        assert_eq!(next.href, "http://stac.test/api/stac/v1/search");
        assert_eq!(next.method, Some(Method::Post));
        let body: Query = serde_json::from_value(next.body.clone().unwrap()).unwrap();
        assert_eq!(body.token.as_deref(), Some("next:b"));
        assert_eq!(body.sortby, vec![SortBy::desc("datetime")]);
        assert_eq!(body.with_token(None), query);
    }

    #[test]
    fn post_self_keeps_original_token() {
        let query = Query {
            token: Some("prev:x".to_string()),
            ..Default::default()
        };
        let links = builder()
            .search_links(Transport::Post, &query, &Pagination::default())
            .unwrap();
        assert_eq!(rels(&links), ["self", "root", "parent"]);
        assert_eq!(links[0].body.as_ref().unwrap()["token"], "prev:x");
    }

    #[test]
    fn items_links() {
        let params = Params::parse("limit=1");
        let query = Query::try_from(&params).unwrap().in_collection("an-id");
        let links = builder()
            .items_links(
                "an-id",
                Transport::Get(&params),
                &query,
                &pagination(None, Some("prev:a")),
            )
            .unwrap();
        assert_eq!(
            rels(&links),
            ["self", "root", "parent", "collection", "previous"]
        );
        assert_eq!(
            links[0].href,
            "http://stac.test/api/stac/v1/collections/an-id/items?limit=1"
        );
        assert_eq!(
            links[3].href,
            "http://stac.test/api/stac/v1/collections/an-id"
        );
        assert_eq!(
            links[4].href,
            "http://stac.test/api/stac/v1/collections/an-id/items?limit=1&token=prev%3Aa"
        );
    }
}
