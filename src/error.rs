use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Crate-specific error enum.
#[derive(Debug, Error)]
pub enum Error {
    /// The limit could not be parsed as an integer.
    #[error("limit '{0}' could not be converted to an integer")]
    InvalidLimit(String),

    /// The limit is negative.
    #[error("limit '{0}' must not be negative")]
    NegativeLimit(String),

    /// One of the bbox coordinates is not a finite number.
    #[error("could not parse bbox: '{bbox}'; offending coordinate '{coordinate}'. bbox must be 4 or 6 numbers separated by commas")]
    InvalidBboxCoordinate {
        /// The bbox as supplied by the client.
        bbox: String,

        /// The first coordinate that could not be parsed.
        coordinate: String,
    },

    /// The bbox has the wrong length or its latitudes are out of order.
    #[error("invalid bbox: '{bbox}'; {reason}")]
    InvalidBbox {
        /// The bbox as supplied by the client.
        bbox: String,

        /// What is wrong with it.
        reason: &'static str,
    },

    /// The intersects geometry is not valid GeoJSON.
    #[error("could not parse intersects geometry: {0}")]
    InvalidIntersects(#[source] serde_json::Error),

    /// Both bbox and intersects were supplied.
    #[error("bbox and intersects are mutually exclusive")]
    BboxAndIntersects,

    /// The datetime (or one side of an interval) is not RFC 3339.
    #[error("datetime '{0}' is not RFC 3339 formatted or an open interval marker")]
    InvalidDatetime(String),

    /// Both sides of the datetime interval are open.
    #[error("both sides of the datetime interval '{0}' cannot be open")]
    OpenInterval(String),

    /// The filter language is not one we accept.
    #[error("filter-lang '{0}' must be one of 'cql2-text' or 'cql2-json'")]
    InvalidFilterLang(String),

    /// A cql2-json filter could not be parsed.
    #[error("could not parse cql2-json filter: {0}")]
    InvalidFilter(#[source] serde_json::Error),

    /// A list field is neither a comma-separated string nor an array of strings.
    #[error("{0} must be a comma-separated string or an array of strings")]
    InvalidList(&'static str),

    /// A sortby expression is malformed.
    #[error("sortby '{0}' must be of the form ([+-]?)(field)")]
    InvalidSortBy(String),

    /// A fields expression is malformed.
    #[error("fields '{0}' must be of the form ([+-]?)(field)")]
    InvalidFields(String),

    /// The search body is not a JSON object.
    #[error("could not parse search body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// One side of a merge is not a JSON object.
    #[error("could not parse {side} document: {source}")]
    Merge {
        /// Which side failed.
        side: Side,

        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A document id is missing characters or contains invalid ones.
    #[error("id '{0}' must conform to format '^[a-zA-Z0-9\\-_.]+$'")]
    InvalidId(String),

    /// A required document field is missing or has the wrong type.
    #[error("{0} field is missing or is not a string")]
    MissingField(&'static str),

    /// A document names a different collection than its path.
    #[error("collection '{document}' does not match path collection '{path}'")]
    CollectionMismatch {
        /// The collection named in the path.
        path: String,

        /// The collection named in the document.
        document: String,
    },

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// An internal invariant was violated.
    #[error("{0}")]
    Server(String),

    /// A boxed error.
    ///
    /// Used to capture generic errors from [tokio_postgres::types::FromSql].
    #[error(transparent)]
    Boxed(#[from] Box<dyn std::error::Error + Sync + Send>),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// [tokio_postgres::Error]
    #[error(transparent)]
    TokioPostgres(#[from] tokio_postgres::Error),

    /// An unknown error.
    ///
    /// Used when [tokio_postgres::types::FromSql] doesn't have a source.
    #[error("unknown error")]
    Unknown,
}

/// Machine-readable error codes, as rendered in error responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum Code {
    /// The client sent something invalid.
    ParameterError,

    /// Something went wrong on our side.
    ServerError,

    /// The thing asked for doesn't exist.
    NotFoundError,
}

/// The side of a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The partial update.
    Patch,

    /// The stored document.
    Base,
}

/// An error body, ready to be serialized into a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Message {
    /// The error code.
    pub code: Code,

    /// A human-readable description.
    pub description: String,
}

impl Error {
    /// Returns this error's code.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgstac_api::{Code, Error};
    /// assert_eq!(Error::BboxAndIntersects.code(), Code::ParameterError);
    /// assert_eq!(Error::Unknown.code(), Code::ServerError);
    /// ```
    pub fn code(&self) -> Code {
        match self {
            Error::InvalidLimit(_)
            | Error::NegativeLimit(_)
            | Error::InvalidBboxCoordinate { .. }
            | Error::InvalidBbox { .. }
            | Error::InvalidIntersects(_)
            | Error::BboxAndIntersects
            | Error::InvalidDatetime(_)
            | Error::OpenInterval(_)
            | Error::InvalidFilterLang(_)
            | Error::InvalidFilter(_)
            | Error::InvalidList(_)
            | Error::InvalidSortBy(_)
            | Error::InvalidFields(_)
            | Error::InvalidBody(_)
            | Error::InvalidId(_)
            | Error::MissingField(_)
            | Error::CollectionMismatch { .. } => Code::ParameterError,
            Error::Merge { side, .. } => match side {
                Side::Patch => Code::ParameterError,
                Side::Base => Code::ServerError,
            },
            Error::NotFound(_) => Code::NotFoundError,
            Error::Server(_)
            | Error::Boxed(_)
            | Error::SerdeJson(_)
            | Error::TokioPostgres(_)
            | Error::Unknown => Code::ServerError,
        }
    }

    /// Returns true if this error was caused by the client's input.
    pub fn is_client_error(&self) -> bool {
        self.code() != Code::ServerError
    }
}

impl From<&Error> for Message {
    fn from(error: &Error) -> Message {
        Message {
            code: error.code(),
            description: error.to_string(),
        }
    }
}

impl From<Error> for Message {
    fn from(error: Error) -> Message {
        Message::from(&error)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Patch => f.write_str("patch"),
            Side::Base => f.write_str("base"),
        }
    }
}
