use crate::{document, merge, Error, Page, Query, Result, SearchClient};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use stac::{Collection, Item};
use tokio_postgres::{
    types::{Json, ToSql, WasNull},
    GenericClient, Row,
};

/// A **pgstac** client.
///
/// Not every **pgstac** function is provided, and some names are changed to
/// match Rust conventions.
#[derive(Debug)]
pub struct Client<C>(C)
where
    C: GenericClient;

impl<C: GenericClient> Client<C> {
    /// Creates a new client.
    pub fn new(client: C) -> Client<C> {
        Client(client)
    }

    /// Returns this client's inner client.
    pub fn into_inner(self) -> C {
        self.0
    }

    /// Returns the **pgstac** version.
    pub async fn version(&self) -> Result<String> {
        self.string("get_version", &[]).await
    }

    /// Fetches all collections.
    pub async fn collections(&self) -> Result<Vec<Collection>> {
        self.vec("all_collections", &[]).await
    }

    /// Fetches a collection by id.
    pub async fn collection(&self, id: &str) -> Result<Option<Collection>> {
        self.opt("get_collection", &[&id]).await
    }

    /// Adds a collection.
    pub async fn add_collection(&self, collection: Collection) -> Result<()> {
        let collection = serde_json::to_value(collection)?;
        self.void("create_collection", &[&collection]).await
    }

    /// Updates a collection.
    pub async fn update_collection(&self, collection: Collection) -> Result<()> {
        let collection = serde_json::to_value(collection)?;
        self.void("update_collection", &[&collection]).await
    }

    /// Deletes a collection.
    pub async fn delete_collection(&self, id: &str) -> Result<()> {
        self.void("delete_collection", &[&id]).await
    }

    /// Merges a partial document onto a stored collection and saves the
    /// result.
    ///
    /// Returns the merged collection.
    pub async fn patch_collection(
        &self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        document::validate_patch(patch, id, None)?;
        let collection: Map<String, Value> = self
            .opt("get_collection", &[&id])
            .await?
            .ok_or_else(|| Error::NotFound(format!("collection '{}'", id)))?;
        let collection = merge(patch, &collection);
        self.void("update_collection", &[&Json(&collection)]).await?;
        Ok(collection)
    }

    /// Fetches an item.
    pub async fn item(&self, id: &str, collection: &str) -> Result<Option<Item>> {
        self.opt("get_item", &[&id, &collection]).await
    }

    /// Adds an item.
    pub async fn add_item(&self, item: Item) -> Result<()> {
        let item = serde_json::to_value(item)?;
        self.void("create_item", &[&item]).await
    }

    /// Updates an item.
    pub async fn update_item(&self, item: Item) -> Result<()> {
        let item = serde_json::to_value(item)?;
        self.void("update_item", &[&item]).await
    }

    /// Merges a partial document onto a stored item and saves the result.
    ///
    /// The patch may not change the item's id or collection. Returns the
    /// merged item.
    pub async fn patch_item(
        &self,
        id: &str,
        collection: &str,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        document::validate_patch(patch, id, Some(collection))?;
        let item: Map<String, Value> = self
            .opt("get_item", &[&id, &collection])
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("item '{}' in collection '{}'", id, collection))
            })?;
        let item = merge(patch, &item);
        self.void("update_item", &[&Json(&item)]).await?;
        Ok(item)
    }

    /// Searches for items.
    pub async fn search(&self, query: &Query) -> Result<Page> {
        let query = serde_json::to_value(query)?;
        self.value("search", &[&query]).await
    }

    async fn query_one<'a>(
        &'a self,
        function: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Row, tokio_postgres::Error> {
        let param_string = (0..params.len())
            .map(|i| format!("${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT * from pgstac.{}({})", function, param_string);
        tracing::debug!(function, "calling pgstac");
        self.0.query_one(&query, params).await
    }

    async fn string(&self, function: &str, params: &[&(dyn ToSql + Sync)]) -> Result<String> {
        let row = self.query_one(function, params).await?;
        row.try_get(function).map_err(Error::from)
    }

    async fn vec<T>(&self, function: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        if let Some(value) = self.opt(function, params).await? {
            Ok(value)
        } else {
            Ok(Vec::new())
        }
    }

    async fn opt<T>(&self, function: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.value(function, params).await {
            Ok(value) => Ok(value),
            Err(err) => match err {
                Error::TokioPostgres(err) => {
                    if let Some(err) = err.into_source() {
                        if err.downcast_ref::<WasNull>().is_some() {
                            Ok(None)
                        } else {
                            Err(Error::from(err))
                        }
                    } else {
                        Err(Error::Unknown)
                    }
                }
                _ => Err(err),
            },
        }
    }

    async fn value<T>(&self, function: &str, params: &[&(dyn ToSql + Sync)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let row = self.query_one(function, params).await?;
        let value = row.try_get(function)?;
        serde_json::from_value(value).map_err(Error::from)
    }

    async fn void(&self, function: &str, params: &[&(dyn ToSql + Sync)]) -> Result<()> {
        let _ = self.query_one(function, params).await?;
        Ok(())
    }
}

#[async_trait]
impl<C> SearchClient for Client<C>
where
    C: GenericClient + Send + Sync,
{
    async fn search(&self, query: &Query) -> Result<Page> {
        Client::search(self, query).await
    }

    async fn find_collection(&self, id: &str) -> Result<Option<Map<String, Value>>> {
        self.opt("get_collection", &[&id]).await
    }
}
