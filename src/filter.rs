use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// A filter language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum FilterLang {
    /// CQL2 text.
    #[serde(rename = "cql2-text")]
    Cql2Text,

    /// CQL2 JSON.
    #[default]
    #[serde(rename = "cql2-json")]
    Cql2Json,
}

/// Translates CQL2 text filters into CQL2 JSON.
pub trait Cql2TextTranslator {
    /// Translates a CQL2 text expression.
    fn translate(&self, text: &str) -> Result<Value>;
}

/// Forwards CQL2 text unchanged, as a JSON string.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl Cql2TextTranslator for PassThrough {
    fn translate(&self, text: &str) -> Result<Value> {
        Ok(Value::String(text.to_string()))
    }
}

impl FilterLang {
    /// Returns this language's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterLang::Cql2Text => "cql2-text",
            FilterLang::Cql2Json => "cql2-json",
        }
    }
}

impl FromStr for FilterLang {
    type Err = Error;

    fn from_str(s: &str) -> Result<FilterLang> {
        match s {
            "cql2-text" => Ok(FilterLang::Cql2Text),
            "cql2-json" => Ok(FilterLang::Cql2Json),
            _ => Err(Error::InvalidFilterLang(s.to_string())),
        }
    }
}

impl fmt::Display for FilterLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiles a filter into CQL2 JSON.
///
/// String filters in `cql2-json` are parsed, string filters in `cql2-text`
/// go through the translator. Anything else is already structured.
pub(crate) fn compile(
    filter: Value,
    lang: FilterLang,
    translator: &impl Cql2TextTranslator,
) -> Result<Value> {
    match (filter, lang) {
        (Value::String(text), FilterLang::Cql2Text) => translator.translate(&text),
        (Value::String(text), FilterLang::Cql2Json) => {
            serde_json::from_str(&text).map_err(Error::InvalidFilter)
        }
        (filter, _) => Ok(filter),
    }
}

#[cfg(test)]
mod tests {
    use super::{compile, FilterLang, PassThrough};
    use serde_json::{json, Value};

    #[test]
    fn parse() {
        assert_eq!(
            "cql2-text".parse::<FilterLang>().unwrap(),
            FilterLang::Cql2Text
        );
        assert_eq!(
            "cql2-json".parse::<FilterLang>().unwrap(),
            FilterLang::Cql2Json
        );
        assert!("cql-json".parse::<FilterLang>().is_err());
        assert!("CQL2-TEXT".parse::<FilterLang>().is_err());
    }

    #[test]
    fn serialize() {
        assert_eq!(
            serde_json::to_value(FilterLang::Cql2Json).unwrap(),
            json!("cql2-json")
        );
    }

    #[test]
    fn compile_text() {
        let filter = compile(
            Value::String("foo = 42".to_string()),
            FilterLang::Cql2Text,
            &PassThrough,
        )
        .unwrap();
        assert_eq!(filter, json!("foo = 42"));
    }

    #[test]
    fn compile_json_string() {
        let filter = compile(
            Value::String(r#"{"op":"=","args":[{"property":"foo"},42]}"#.to_string()),
            FilterLang::Cql2Json,
            &PassThrough,
        )
        .unwrap();
        assert_eq!(filter["op"], "=");
        assert!(compile(
            Value::String("foo = 42".to_string()),
            FilterLang::Cql2Json,
            &PassThrough
        )
        .is_err());
    }

    #[test]
    fn compile_structured() {
        let filter = json!({"op": "=", "args": [{"property": "foo"}, 42]});
        assert_eq!(
            compile(filter.clone(), FilterLang::Cql2Text, &PassThrough).unwrap(),
            filter
        );
    }
}
