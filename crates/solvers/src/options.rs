use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// A single solver option value.
///
/// Deserialized untagged, so `true`, `200`, `1e-6` and `"mumps"` map to the
/// obvious variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Returns the value as a float, widening integers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:e}"),
            Self::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Solver options, keyed by name.
///
/// Keys are kept sorted so forwarded option sets are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, OptionValue>);

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Options::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Overlays `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: Options) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Removes `key` and returns it as a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidOption`] if the value is not a
    /// boolean.
    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>, ConfigurationError> {
        self.take(key, "a boolean", OptionValue::as_bool)
    }

    /// Removes `key` and returns it as text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidOption`] if the value is not text.
    pub fn take_text(&mut self, key: &str) -> Result<Option<String>, ConfigurationError> {
        self.take(key, "text", |value| value.as_str().map(str::to_owned))
    }

    fn take<T>(
        &mut self,
        key: &str,
        expected: &'static str,
        convert: impl Fn(&OptionValue) -> Option<T>,
    ) -> Result<Option<T>, ConfigurationError> {
        let Some(value) = self.0.remove(key) else {
            return Ok(None);
        };
        convert(&value)
            .map(Some)
            .ok_or_else(|| ConfigurationError::InvalidOption {
                key: key.to_owned(),
                expected,
            })
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Options {
    type Item = (String, OptionValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_option_sets() {
        let options: Options = serde_json::from_str(
            r#"{ "max_iter": 200, "tol": 1e-8, "linear_solver": "ma57", "return_iterations": true }"#,
        )
        .unwrap();

        assert_eq!(options.get("max_iter"), Some(&OptionValue::Int(200)));
        assert_eq!(options.get("tol"), Some(&OptionValue::Float(1e-8)));
        assert_eq!(options.get("linear_solver"), Some(&OptionValue::from("ma57")));
        assert_eq!(options.get("return_iterations"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn merge_lets_later_values_win() {
        let mut options = Options::new().with("tol", 1e-6).with("max_iter", 1000);
        options.merge(Options::new().with("tol", 1e-3));

        assert_eq!(options.get("tol").and_then(OptionValue::as_f64), Some(1e-3));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn take_checks_the_value_type() {
        let mut options = Options::new().with("return_iterations", "yes");

        assert_eq!(
            options.take_bool("return_iterations"),
            Err(ConfigurationError::InvalidOption {
                key: "return_iterations".into(),
                expected: "a boolean",
            })
        );
        assert_eq!(options.take_bool("missing"), Ok(None));
    }
}
