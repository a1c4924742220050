use serde::Deserialize;
use serde_json::Value;

use crate::validation::{is_valid_email, not_an_object, FieldErrors, FieldReader};

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub email: String,
}

impl LoginRequest {
    pub fn parse(raw: &Value) -> Result<Self, FieldErrors> {
        let Some(object) = raw.as_object() else {
            return Err(not_an_object());
        };
        let mut reader = FieldReader::new(object);
        let email = match reader.get("email") {
            Some(Value::String(s)) if is_valid_email(s) => s.clone(),
            _ => {
                reader.push_error("email", "Please enter a valid email address");
                String::new()
            }
        };
        reader.into_result(LoginRequest { email })
    }
}

/// Query of `GET /api/auth/verify`.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyTokenQuery {
    pub token: Option<String>,
}

impl VerifyTokenQuery {
    pub fn token(&self) -> Result<&str, FieldErrors> {
        match self.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => {
                let mut errors = FieldErrors::new();
                errors.insert("token".into(), vec!["Token is required".into()]);
                Err(errors)
            }
        }
    }
}
