use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sort by.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct SortBy {
    /// The field to sort by.
    pub field: String,

    /// The direction to sort by.
    #[serde(default)]
    pub direction: Direction,
}

/// The direction of a sort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,

    /// Largest first.
    Desc,
}

impl SortBy {
    /// Sorts by `field`, ascending.
    pub fn asc(field: impl ToString) -> SortBy {
        SortBy {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    /// Sorts by `field`, descending.
    pub fn desc(field: impl ToString) -> SortBy {
        SortBy {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }

    /// Parses a comma-separated list of sort tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgstac_api::SortBy;
    /// let sortby = SortBy::parse_list("foo,-bar,+baz").unwrap();
    /// assert_eq!(
    ///     sortby,
    ///     vec![SortBy::asc("foo"), SortBy::desc("bar"), SortBy::asc("baz")]
    /// );
    /// ```
    pub fn parse_list(s: &str) -> Result<Vec<SortBy>> {
        s.split(',').map(str::parse).collect()
    }
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<SortBy> {
        let (direction, field) = split_prefix(s);
        if field.is_empty() {
            Err(Error::InvalidSortBy(s.to_string()))
        } else {
            Ok(SortBy {
                field: field.to_string(),
                direction,
            })
        }
    }
}

/// Splits an optional `+` or `-` off the front of a token.
pub(crate) fn split_prefix(s: &str) -> (Direction, &str) {
    if let Some(field) = s.strip_prefix('-') {
        (Direction::Desc, field)
    } else if let Some(field) = s.strip_prefix('+') {
        (Direction::Asc, field)
    } else {
        (Direction::Asc, s)
    }
}
