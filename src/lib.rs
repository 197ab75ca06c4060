//! Search plumbing for a STAC API backed by [pgstac](https://github.com/stac-utils/pgstac).
//!
//! Search requests arrive as query strings or JSON bodies. A [Normalizer]
//! turns either one into a canonical [Query], a [Client] runs it against
//! **pgstac**, and a [LinkBuilder] writes pagination links that repeat the
//! request the same way the client sent it. Partial updates of stored
//! documents go through [merge].
//!
//! # Examples
//!
//! ```
//! use pgstac_api::{LinkBuilder, Normalizer, Pagination, Params, Request};
//! let request = Request::Get(Params::parse("collections=sentinel-2&limit=1"));
//! let query = Normalizer::new().normalize(&request).unwrap();
//! let pagination = Pagination {
//!     next: Some("next:an-id".to_string()),
//!     prev: None,
//! };
//! let links = LinkBuilder::new("http://stac.test")
//!     .search_links(request.transport(), &query, &pagination)
//!     .unwrap();
//! assert_eq!(
//!     links[3].href,
//!     "http://stac.test/api/stac/v1/search?collections=sentinel-2&limit=1&token=next%3Aan-id"
//! );
//! ```

#![warn(missing_docs)]

mod api;
mod client;
pub mod document;
mod error;
mod fields;
mod filter;
pub mod link;
mod merge;
pub mod normalize;
mod page;
mod params;
mod query;
mod sort_by;

pub use {
    api::{Api, ItemCollection, SearchClient},
    client::Client,
    error::{Code, Error, Message, Side},
    fields::Fields,
    filter::{Cql2TextTranslator, FilterLang, PassThrough},
    link::{Link, LinkBuilder, Method, Pagination, Transport, API_PREFIX},
    merge::{apply, merge, merge_slices},
    normalize::{Normalizer, Request},
    page::{Context, Page},
    params::Params,
    query::{Query, DEFAULT_LIMIT, MAX_LIMIT},
    sort_by::{Direction, SortBy},
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
