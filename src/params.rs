use std::collections::BTreeMap;
use url::form_urlencoded;

/// Query-string parameters, as the client sent them.
///
/// Only the first value of a repeated key is kept, and empty values are
/// treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Parses an (already split off) URL query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgstac_api::Params;
    /// let params = Params::parse("limit=5&bbox=1%2C2%2C3%2C4&datetime=");
    /// assert_eq!(params.get("limit"), Some("5"));
    /// assert_eq!(params.get("bbox"), Some("1,2,3,4"));
    /// assert_eq!(params.get("datetime"), None);
    /// ```
    pub fn parse(query: &str) -> Params {
        form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Returns a parameter's value, if it was given and is not empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Params {
        let mut map = BTreeMap::new();
        for (key, value) in iter {
            let _ = map.entry(key.to_string()).or_insert(value.to_string());
        }
        Params(map)
    }
}
