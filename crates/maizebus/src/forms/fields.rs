use std::collections::BTreeMap;

use serde_json::Value;

use super::SubmissionError;

/// Text fields of a submitted form, keyed by their wire names.
///
/// Only values that count as present are kept: JSON `null`, `false`, `0` and empty
/// strings are dropped, as are blank urlencoded or multipart values. The first value
/// wins when a name repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFields {
    values: BTreeMap<String, String>,
}

impl SubmissionFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds fields from a JSON document, which must be an object.
    pub fn from_json(document: Value) -> Result<Self, SubmissionError> {
        let Value::Object(map) = document else {
            return Err(SubmissionError::InvalidBody {
                detail: "expected a JSON object".to_string(),
            });
        };

        let mut fields = Self::new();
        for (name, value) in map {
            if let Some(text) = json_text(value) {
                fields.insert(name, text);
            }
        }
        Ok(fields)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (name, value) in pairs {
            fields.insert(name, value);
        }
        fields
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.values.entry(name.into()).or_insert(value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Owned copy of a field that is known to be present.
    pub(crate) fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    pub(crate) fn optional(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Names from `required` with no value, in the order given.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.values.contains_key(*name))
            .collect()
    }

    pub fn require(&self, required: &[&str]) -> Result<(), SubmissionError> {
        let missing = self.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SubmissionError::MissingFields(
                missing.into_iter().map(str::to_string).collect(),
            ))
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_text(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(number) => {
            if number.as_f64() == Some(0.0) {
                None
            } else {
                Some(number.to_string())
            }
        }
        Value::String(text) => Some(text),
        other @ (Value::Array(_) | Value::Object(_)) => Some(other.to_string()),
    }
}
