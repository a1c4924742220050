use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Field-level validation messages, keyed by the camelCase field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used when the input as a whole is unusable (e.g. not a JSON object).
pub const FORM_ERROR_KEY: &str = "_form";

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-.";

/// Checks an address against the usual `local@domain.tld` grammar.
///
/// Local part: printable ASCII from the RFC 5322 atom set, no leading,
/// trailing or doubled dots. Domain: two or more dot-separated labels of
/// alphanumerics and inner hyphens, with an alphabetic TLD.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.len() > 255 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    labels_ok && tld_ok
}

/// Accumulates field errors while reading values out of a JSON object.
pub struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            errors: FieldErrors::new(),
        }
    }

    pub fn push_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// The raw value, treating JSON `null` the same as absent.
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    /// A string that must be present and non-empty.
    pub fn required_string(&mut self, field: &str, message: &str) -> String {
        match self.get(field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::String(_)) | None => {
                self.push_error(field, message);
                String::new()
            }
            Some(_) => {
                self.push_error(field, "Expected a string");
                String::new()
            }
        }
    }

    /// A string that may be absent; present values pass through unchanged.
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push_error(field, "Expected a string");
                None
            }
            None => None,
        }
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Errors for input that is not a JSON object at all.
pub fn not_an_object() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(
        FORM_ERROR_KEY.to_string(),
        vec!["Expected a JSON object".to_string()],
    );
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_emails() {
        for email in [
            "john.doe@example.com",
            "jane+leads@sub.example.co",
            "a@b.io",
            "o'brien@example.org",
        ] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn test_invalid_emails() {
        for email in [
            "",
            "not-an-email",
            "@example.com",
            "john@",
            "john@example",
            "john..doe@example.com",
            ".john@example.com",
            "john doe@example.com",
            "john@-example.com",
            "john@example.c",
            "john@example.123",
        ] {
            assert!(!is_valid_email(email), "{email} should be invalid");
        }
    }

    #[test]
    fn test_reader_collects_all_errors() {
        let input = json!({ "a": "", "b": 3 });
        let object = input.as_object().unwrap();
        let mut reader = FieldReader::new(object);
        reader.required_string("a", "A is required");
        reader.optional_string("b");
        reader.required_string("c", "C is required");
        let errors = reader.into_result(()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["a"], vec!["A is required".to_string()]);
        assert_eq!(errors["b"], vec!["Expected a string".to_string()]);
    }

    #[test]
    fn test_null_treated_as_absent() {
        let input = json!({ "phone": null });
        let object = input.as_object().unwrap();
        let mut reader = FieldReader::new(object);
        assert_eq!(reader.optional_string("phone"), None);
        assert!(reader.into_result(()).is_ok());
    }
}
