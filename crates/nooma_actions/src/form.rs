//! Raw form field access.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Submitted form fields keyed by input name.
///
/// Empty and whitespace-only values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    NotANumber(&'static str),
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber(field) => write!(f, "`{field}` is not a number"),
        }
    }
}

impl Error for FieldError {}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the trimmed value of `name`, or `None` when missing or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Parses `name` as a finite number. Absent fields yield `Ok(None)`.
    pub fn number(&self, name: &'static str) -> Result<Option<f64>, FieldError> {
        self.get(name)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or(FieldError::NotANumber(name))
            })
            .transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldError, FormData};

    #[test]
    fn blank_values_read_as_absent() {
        let form: FormData = [("name", "  "), ("title", ""), ("kept", " x ")]
            .into_iter()
            .collect();
        assert_eq!(form.get("name"), None);
        assert_eq!(form.get("title"), None);
        assert_eq!(form.get("missing"), None);
        assert_eq!(form.get("kept"), Some("x"));
    }

    #[test]
    fn number_rejects_garbage_and_non_finite_values() {
        let form: FormData = [("a", "12.5"), ("b", "abc"), ("c", "inf"), ("d", "")]
            .into_iter()
            .collect();
        assert_eq!(form.number("a"), Ok(Some(12.5)));
        assert_eq!(form.number("b"), Err(FieldError::NotANumber("b")));
        assert_eq!(form.number("c"), Err(FieldError::NotANumber("c")));
        assert_eq!(form.number("d"), Ok(None));
    }
}
