//! Turns client input into canonical [Query] values.
//!
//! Both transports go through the same per-field functions, so a query string
//! and a JSON body that say the same thing produce the same [Query].

use crate::{
    filter::{self, Cql2TextTranslator, PassThrough},
    Error, Fields, FilterLang, Params, Query, Result, SortBy, Transport, DEFAULT_LIMIT,
    MAX_LIMIT,
};
use geojson::Geometry;
use regex::Regex;
use serde_json::{Map, Value};
use std::{num::IntErrorKind, sync::OnceLock};

/// The marker for an open side of a datetime interval.
pub const OPEN_INTERVAL: &str = "..";

/// A search request, in the encoding the client used.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// A `GET` with query-string parameters.
    Get(Params),

    /// A `POST` with a JSON body.
    Post(Vec<u8>),
}

/// Normalizes search requests.
///
/// CQL2 text filters are handed to the translator, which by default passes
/// them through unchanged.
#[derive(Clone, Debug, Default)]
pub struct Normalizer<T = PassThrough> {
    translator: T,
}

impl Request {
    /// Returns the transport this request was made with.
    pub fn transport(&self) -> Transport<'_> {
        match self {
            Request::Get(params) => Transport::Get(params),
            Request::Post(_) => Transport::Post,
        }
    }
}

impl Normalizer {
    /// Creates a normalizer that passes CQL2 text through.
    pub fn new() -> Normalizer {
        Normalizer {
            translator: PassThrough,
        }
    }
}

impl<T: Cql2TextTranslator> Normalizer<T> {
    /// Creates a normalizer with a custom CQL2 text translator.
    pub fn with_translator(translator: T) -> Normalizer<T> {
        Normalizer { translator }
    }

    /// Normalizes a request in either encoding.
    pub fn normalize(&self, request: &Request) -> Result<Query> {
        match request {
            Request::Get(params) => self.normalize_params(params),
            Request::Post(body) => self.normalize_json(body),
        }
    }

    /// Normalizes query-string parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgstac_api::{Normalizer, Params};
    /// let params = Params::parse("collections=a,b&limit=20000&sortby=-datetime");
    /// let query = Normalizer::new().normalize_params(&params).unwrap();
    /// assert_eq!(query.collections.unwrap(), vec!["a", "b"]);
    /// assert_eq!(query.limit, 10000);
    /// ```
    pub fn normalize_params(&self, params: &Params) -> Result<Query> {
        if params.get("bbox").is_some() && params.get("intersects").is_some() {
            return Err(Error::BboxAndIntersects);
        }
        let filter_lang = params
            .get("filter-lang")
            .map(str::parse)
            .transpose()?
            .unwrap_or(FilterLang::Cql2Text);
        let query = Query {
            collections: params.get("collections").map(parse_list),
            ids: params.get("ids").map(parse_list),
            limit: params
                .get("limit")
                .map(parse_limit)
                .transpose()?
                .unwrap_or(DEFAULT_LIMIT),
            bbox: params.get("bbox").map(parse_bbox).transpose()?,
            intersects: params.get("intersects").map(parse_intersects).transpose()?,
            datetime: params.get("datetime").map(validate_datetime).transpose()?,
            filter: params
                .get("filter")
                .map(|filter| {
                    filter::compile(
                        Value::String(filter.to_string()),
                        filter_lang,
                        &self.translator,
                    )
                })
                .transpose()?,
            filter_lang: FilterLang::Cql2Json,
            sortby: params
                .get("sortby")
                .map(SortBy::parse_list)
                .transpose()?
                .unwrap_or_default(),
            fields: params.get("fields").map(str::parse).transpose()?,
            token: params.get("token").map(String::from),
            conf: None,
            query: None,
        };
        tracing::debug!(?query, "normalized query-string search");
        Ok(query)
    }

    /// Normalizes a JSON search body.
    ///
    /// `null` values are treated as absent and unknown keys are ignored.
    pub fn normalize_json(&self, body: &[u8]) -> Result<Query> {
        let mut body: Map<String, Value> =
            serde_json::from_slice(body).map_err(Error::InvalidBody)?;
        body.retain(|_, value| !value.is_null());
        if body.contains_key("bbox") && body.contains_key("intersects") {
            return Err(Error::BboxAndIntersects);
        }
        let filter_lang = body
            .remove("filter-lang")
            .map(json_filter_lang)
            .transpose()?
            .unwrap_or(FilterLang::Cql2Json);
        let query = Query {
            collections: body
                .remove("collections")
                .map(|value| json_list("collections", value))
                .transpose()?,
            ids: body
                .remove("ids")
                .map(|value| json_list("ids", value))
                .transpose()?,
            limit: body
                .remove("limit")
                .map(json_limit)
                .transpose()?
                .unwrap_or(DEFAULT_LIMIT),
            bbox: body.remove("bbox").map(json_bbox).transpose()?,
            intersects: body
                .remove("intersects")
                .map(|value| {
                    serde_json::from_value::<Geometry>(value).map_err(Error::InvalidIntersects)
                })
                .transpose()?,
            datetime: body.remove("datetime").map(json_datetime).transpose()?,
            filter: body
                .remove("filter")
                .map(|filter| filter::compile(filter, filter_lang, &self.translator))
                .transpose()?,
            filter_lang: FilterLang::Cql2Json,
            sortby: body
                .remove("sortby")
                .map(json_sortby)
                .transpose()?
                .unwrap_or_default(),
            fields: body.remove("fields").map(json_fields).transpose()?,
            token: body.remove("token").map(|value| match value {
                Value::String(token) => token,
                other => other.to_string(),
            }),
            conf: body.remove("conf"),
            query: body.remove("query"),
        };
        if !body.is_empty() {
            tracing::debug!(
                keys = ?body.keys().collect::<Vec<_>>(),
                "ignoring unknown search keys"
            );
        }
        tracing::debug!(?query, "normalized JSON search");
        Ok(query)
    }
}

impl TryFrom<&Params> for Query {
    type Error = Error;

    fn try_from(params: &Params) -> Result<Query> {
        Normalizer::new().normalize_params(params)
    }
}

/// Splits a comma-separated list, dropping empty entries.
pub fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a limit, clamping large values to [MAX_LIMIT].
///
/// # Examples
///
/// ```
/// use pgstac_api::normalize::parse_limit;
/// assert_eq!(parse_limit("42").unwrap(), 42);
/// assert_eq!(parse_limit("100000").unwrap(), 10000);
/// assert!(parse_limit("-1").is_err());
/// assert!(parse_limit("ten").is_err());
/// ```
pub fn parse_limit(s: &str) -> Result<u64> {
    match s.parse::<i64>() {
        Ok(limit) => validate_limit(limit),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Ok(clamp_limit(s)),
            IntErrorKind::NegOverflow => Err(Error::NegativeLimit(s.to_string())),
            _ => Err(Error::InvalidLimit(s.to_string())),
        },
    }
}

/// Checks an already-parsed limit, clamping large values to [MAX_LIMIT].
pub fn validate_limit(limit: i64) -> Result<u64> {
    match u64::try_from(limit) {
        Ok(limit) if limit > MAX_LIMIT => Ok(clamp_limit(limit)),
        Ok(limit) => Ok(limit),
        Err(_) => Err(Error::NegativeLimit(limit.to_string())),
    }
}

fn clamp_limit(limit: impl std::fmt::Display) -> u64 {
    tracing::warn!(%limit, max = MAX_LIMIT, "limit is too large, clamping");
    MAX_LIMIT
}

/// Parses a comma-separated bbox.
///
/// # Examples
///
/// ```
/// use pgstac_api::normalize::parse_bbox;
/// assert_eq!(parse_bbox("-106,40,-105,41").unwrap(), vec![-106., 40., -105., 41.]);
/// assert!(parse_bbox("-106,41,-105,40").is_err());
/// assert!(parse_bbox("-106,40,-105").is_err());
/// ```
pub fn parse_bbox(s: &str) -> Result<Vec<f64>> {
    let bbox = s
        .split(',')
        .map(|coordinate| {
            coordinate
                .parse::<f64>()
                .ok()
                .filter(|c| c.is_finite())
                .ok_or_else(|| Error::InvalidBboxCoordinate {
                    bbox: s.to_string(),
                    coordinate: coordinate.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;
    validate_bbox(&bbox, s)?;
    Ok(bbox)
}

/// Checks a bbox's length and the order of its latitudes.
///
/// `original` is only used to describe the failure.
pub fn validate_bbox(bbox: &[f64], original: &str) -> Result<()> {
    let (lower, upper) = match bbox.len() {
        4 => (bbox[1], bbox[3]),
        6 => (bbox[1], bbox[4]),
        _ => {
            return Err(Error::InvalidBbox {
                bbox: original.to_string(),
                reason: "bbox must have 4 or 6 coordinates",
            })
        }
    };
    if lower <= upper {
        Ok(())
    } else {
        Err(Error::InvalidBbox {
            bbox: original.to_string(),
            reason: "the lower left latitude must not be greater than the upper right latitude",
        })
    }
}

/// Parses a GeoJSON geometry.
pub fn parse_intersects(s: &str) -> Result<Geometry> {
    serde_json::from_str(s).map_err(Error::InvalidIntersects)
}

/// Checks that a datetime is an RFC 3339 timestamp or an interval of them.
///
/// Either side of an interval may be open (`..`), but not both. Only the
/// grammar is checked, so e.g. `2023-02-31T00:00:00Z` passes.
///
/// # Examples
///
/// ```
/// use pgstac_api::normalize::validate_datetime;
/// assert!(validate_datetime("2023-01-07T00:00:00Z").is_ok());
/// assert!(validate_datetime("2023-01-07T00:00:00Z/..").is_ok());
/// assert!(validate_datetime("../..").is_err());
/// assert!(validate_datetime("yesterday").is_err());
/// ```
pub fn validate_datetime(s: &str) -> Result<String> {
    if let Some((start, end)) = s.split_once('/') {
        if start == OPEN_INTERVAL && end == OPEN_INTERVAL {
            return Err(Error::OpenInterval(s.to_string()));
        }
        for side in [start, end] {
            if side != OPEN_INTERVAL && !is_timestamp(side) {
                return Err(Error::InvalidDatetime(side.to_string()));
            }
        }
    } else if !is_timestamp(s) {
        return Err(Error::InvalidDatetime(s.to_string()));
    }
    Ok(s.to_string())
}

fn is_timestamp(s: &str) -> bool {
    static TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    TIMESTAMP
        .get_or_init(|| {
            Regex::new(
                r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])[T ]([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](\.[0-9]+)?(Z|[+-]([01][0-9]|2[0-3]):[0-5][0-9])?$",
            )
            .expect("the timestamp pattern is valid")
        })
        .is_match(s)
}

fn json_list(field: &'static str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(parse_list(&s)),
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(Ok(s)),
                _ => Some(Err(Error::InvalidList(field))),
            })
            .collect(),
        _ => Err(Error::InvalidList(field)),
    }
}

fn json_limit(value: Value) -> Result<u64> {
    match value {
        Value::String(s) => parse_limit(&s),
        Value::Number(n) => {
            if let Some(limit) = n.as_i64() {
                validate_limit(limit)
            } else if n.is_u64() {
                Ok(clamp_limit(n))
            } else {
                Err(Error::InvalidLimit(n.to_string()))
            }
        }
        other => Err(Error::InvalidLimit(other.to_string())),
    }
}

fn json_bbox(value: Value) -> Result<Vec<f64>> {
    let original = value.to_string();
    let bbox: Vec<f64> = serde_json::from_value(value).map_err(|_| Error::InvalidBbox {
        bbox: original.clone(),
        reason: "bbox must be an array of numbers",
    })?;
    validate_bbox(&bbox, &original)?;
    Ok(bbox)
}

fn json_datetime(value: Value) -> Result<String> {
    match value {
        Value::String(s) => validate_datetime(&s),
        other => Err(Error::InvalidDatetime(other.to_string())),
    }
}

fn json_filter_lang(value: Value) -> Result<FilterLang> {
    match value {
        Value::String(s) => s.parse(),
        other => Err(Error::InvalidFilterLang(other.to_string())),
    }
}

fn json_sortby(value: Value) -> Result<Vec<SortBy>> {
    match value {
        Value::String(s) => SortBy::parse_list(&s),
        Value::Array(values) => values.into_iter().map(json_sortby_entry).collect(),
        other => Err(Error::InvalidSortBy(other.to_string())),
    }
}

fn json_sortby_entry(value: Value) -> Result<SortBy> {
    match value {
        Value::String(s) => s.parse(),
        object @ Value::Object(_) => {
            let original = object.to_string();
            match serde_json::from_value::<SortBy>(object) {
                Ok(sortby) if !sortby.field.is_empty() => Ok(sortby),
                _ => Err(Error::InvalidSortBy(original)),
            }
        }
        other => Err(Error::InvalidSortBy(other.to_string())),
    }
}

fn json_fields(value: Value) -> Result<Fields> {
    match value {
        Value::String(s) => s.parse(),
        Value::Array(values) => {
            let mut fields = Fields::default();
            for value in values {
                match value {
                    Value::String(token) => fields.push_token(&token)?,
                    other => return Err(Error::InvalidFields(other.to_string())),
                }
            }
            Ok(fields)
        }
        object @ Value::Object(_) => {
            let original = object.to_string();
            serde_json::from_value::<Fields>(object)
                .map(Fields::normalized)
                .map_err(|_| Error::InvalidFields(original))
        }
        other => Err(Error::InvalidFields(other.to_string())),
    }
}
