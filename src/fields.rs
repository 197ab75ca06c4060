use crate::{
    sort_by::{split_prefix, Direction},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fields to include or exclude.
///
/// The two sets are disjoint: adding a field to one removes it from the
/// other.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Fields {
    /// Fields to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Fields to exclude.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Fields {
    /// Adds a field to the include set.
    pub fn include(&mut self, field: impl ToString) {
        let field = field.to_string();
        self.exclude.retain(|f| *f != field);
        if !self.include.contains(&field) {
            self.include.push(field);
        }
    }

    /// Adds a field to the exclude set.
    pub fn exclude(&mut self, field: impl ToString) {
        let field = field.to_string();
        self.include.retain(|f| *f != field);
        if !self.exclude.contains(&field) {
            self.exclude.push(field);
        }
    }

    /// Adds a single `(+|-)?field` token.
    pub fn push_token(&mut self, token: &str) -> Result<()> {
        match split_prefix(token) {
            (_, "") => return Err(Error::InvalidFields(token.to_string())),
            (Direction::Asc, field) => self.include(field),
            (Direction::Desc, field) => self.exclude(field),
        }
        Ok(())
    }

    /// Rebuilds these fields so the include and exclude sets are disjoint.
    ///
    /// Exclusions win over inclusions of the same name.
    pub fn normalized(self) -> Fields {
        let mut fields = Fields::default();
        for field in self.include {
            fields.include(field);
        }
        for field in self.exclude {
            fields.exclude(field);
        }
        fields
    }
}

impl FromStr for Fields {
    type Err = Error;

    fn from_str(s: &str) -> Result<Fields> {
        let mut fields = Fields::default();
        for token in s.split(',') {
            fields.push_token(token)?;
        }
        Ok(fields)
    }
}
