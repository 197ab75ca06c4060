use crate::{
    link::{GEOJSON, JSON},
    Context, Cql2TextTranslator, Error, Link, LinkBuilder, Normalizer, Page, Pagination,
    PassThrough, Query, Request, Result,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// Something that can run searches and look up collections.
///
/// Implemented by [Client](crate::Client) for any **pgstac** connection.
#[async_trait]
pub trait SearchClient {
    /// Runs a normalized search.
    async fn search(&self, query: &Query) -> Result<Page>;

    /// Fetches a collection document, or `None` if there isn't one.
    async fn find_collection(&self, id: &str) -> Result<Option<Map<String, Value>>>;
}

/// The search endpoints of a STAC API.
///
/// Normalizes requests, runs them, and links up the results.
#[derive(Debug)]
pub struct Api<S, T = PassThrough> {
    client: S,
    links: LinkBuilder,
    normalizer: Normalizer<T>,
}

/// A page of search results, ready to be sent back to a client.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ItemCollection {
    /// Always "FeatureCollection".
    pub r#type: String,

    /// The items, with their links filled in.
    pub features: Vec<Map<String, Value>>,

    /// Links for this page.
    pub links: Vec<Link>,

    /// The search context, if **pgstac** returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

impl<S: SearchClient> Api<S> {
    /// Creates a new api that writes its links with `links`.
    pub fn new(client: S, links: LinkBuilder) -> Api<S> {
        Api {
            client,
            links,
            normalizer: Normalizer::new(),
        }
    }
}

impl<S: SearchClient, T: Cql2TextTranslator> Api<S, T> {
    /// Replaces this api's normalizer, e.g. to plug in a CQL2 text translator.
    pub fn with_normalizer<U: Cql2TextTranslator>(self, normalizer: Normalizer<U>) -> Api<S, U> {
        Api {
            client: self.client,
            links: self.links,
            normalizer,
        }
    }

    /// Returns a reference to the underlying client.
    pub fn client(&self) -> &S {
        &self.client
    }

    /// Handles `GET /search` and `POST /search`.
    pub async fn search(&self, request: &Request) -> Result<ItemCollection> {
        let query = self.normalizer.normalize(request).map_err(log_error)?;
        let page = self.client.search(&query).await.map_err(log_error)?;
        let links = self
            .links
            .search_links(request.transport(), &query, &Pagination::from(&page))?;
        self.item_collection(page, links)
    }

    /// Handles `GET /collections/{collection_id}/items`.
    pub async fn items(&self, collection_id: &str, request: &Request) -> Result<ItemCollection> {
        if self
            .client
            .find_collection(collection_id)
            .await
            .map_err(log_error)?
            .is_none()
        {
            return Err(log_error(Error::NotFound(format!(
                "collection '{}'",
                collection_id
            ))));
        }
        let query = self
            .normalizer
            .normalize(request)
            .map_err(log_error)?
            .in_collection(collection_id);
        let page = self.client.search(&query).await.map_err(log_error)?;
        let links = self.links.items_links(
            collection_id,
            request.transport(),
            &query,
            &Pagination::from(&page),
        )?;
        self.item_collection(page, links)
    }

    fn item_collection(&self, page: Page, links: Vec<Link>) -> Result<ItemCollection> {
        let mut features = page.features;
        for item in &mut features {
            self.add_item_links(item)?;
        }
        tracing::debug!(count = features.len(), "returning items");
        Ok(ItemCollection {
            r#type: page.r#type,
            features,
            links,
            context: page.context,
        })
    }

    fn add_item_links(&self, item: &mut Map<String, Value>) -> Result<()> {
        let id = string_field(item, "id")?;
        let collection = string_field(item, "collection")?;
        let collection_path = format!("/collections/{}", collection);
        let self_path = format!("{}/items/{}", collection_path, id);
        let links = item
            .entry("links")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| Error::Server(format!("links of item '{}' are not an array", id)))?;
        for link in links.iter_mut().filter_map(Value::as_object_mut) {
            if link.get("rel").and_then(Value::as_str) == Some("collection") {
                let _ = link.insert(
                    "href".to_string(),
                    Value::String(self.links.href(&collection_path)),
                );
            }
        }
        for link in [
            self.links.link("parent", &collection_path, JSON),
            self.links.link("root", "/", JSON),
            self.links.link("self", &self_path, GEOJSON),
        ] {
            links.push(serde_json::to_value(link)?);
        }
        Ok(())
    }
}

fn log_error(err: Error) -> Error {
    if err.is_client_error() {
        tracing::debug!(%err, "rejected search request");
    } else {
        tracing::error!(%err, "search failed");
    }
    err
}

fn string_field(item: &Map<String, Value>, field: &str) -> Result<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| {
            tracing::error!(field, "search result is missing a string field");
            Error::Server(format!("item {} is missing or not a string", field))
        })
}
