use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::buyer::{BuyerPriority, BuyerStatus};
use crate::validation::{is_valid_email, not_an_object, FieldErrors, FieldReader};

/// A validated, normalized buyer record ready for persistence.
///
/// Produced only by [`BuyerInput::parse`]; unknown input fields are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: BuyerStatus,
    pub priority: BuyerPriority,
    pub budget: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
}

impl BuyerInput {
    /// Validates an arbitrary JSON value against the buyer rules.
    ///
    /// All-or-nothing: every failing field is reported, and nothing is
    /// returned unless all fields pass.
    pub fn parse(raw: &Value) -> Result<Self, FieldErrors> {
        let Some(object) = raw.as_object() else {
            return Err(not_an_object());
        };
        let mut reader = FieldReader::new(object);

        let first_name = reader.required_string("firstName", "First name is required");
        let last_name = reader.required_string("lastName", "Last name is required");
        let email = read_email(&mut reader);
        let phone = reader.optional_string("phone");
        let status = read_enum(&mut reader, "status", &BuyerStatus::ALL.map(|s| s.as_str()));
        let priority = read_enum(&mut reader, "priority", &BuyerPriority::ALL.map(|p| p.as_str()));
        let budget = read_budget(&mut reader);
        let location = reader.optional_string("location");
        let notes = reader.optional_string("notes");
        let tags = read_tags(&mut reader);
        let assigned_to = read_assigned_to(&mut reader);

        let input = BuyerInput {
            first_name,
            last_name,
            email,
            phone,
            status: status.and_then(|s| s.parse().ok()).unwrap_or_default(),
            priority: priority.and_then(|p| p.parse().ok()).unwrap_or_default(),
            budget,
            location,
            notes,
            tags,
            assigned_to,
        };
        reader.into_result(input)
    }
}

fn read_email(reader: &mut FieldReader<'_>) -> String {
    match reader.get("email") {
        Some(Value::String(s)) if is_valid_email(s) => s.clone(),
        _ => {
            reader.push_error("email", "Please enter a valid email address");
            String::new()
        }
    }
}

/// Returns the literal if present and allowed; absent means "use the default".
fn read_enum<'v>(reader: &mut FieldReader<'_>, field: &str, allowed: &[&'v str]) -> Option<&'v str> {
    let value = reader.get(field)?;
    let literal = value
        .as_str()
        .and_then(|s| allowed.iter().copied().find(|a| *a == s));
    if literal.is_none() {
        reader.push_error(
            field,
            format!("Invalid {field}. Expected one of: {}", allowed.join(", ")),
        );
    }
    literal
}

/// First value that no longer fits in the BIGINT column.
const MAX_BUDGET: f64 = i64::MAX as f64;

fn read_budget(reader: &mut FieldReader<'_>) -> Option<i64> {
    let value = reader.get("budget")?;
    match value.as_f64() {
        Some(n) if n.is_finite() && n >= MAX_BUDGET => {
            reader.push_error("budget", "Budget is too large");
            None
        }
        Some(n) if n.is_finite() && n >= 0.0 => Some(n.round() as i64),
        Some(n) if n.is_finite() => {
            reader.push_error("budget", "Budget cannot be negative");
            None
        }
        _ => {
            reader.push_error("budget", "Budget must be a number");
            None
        }
    }
}

fn read_tags(reader: &mut FieldReader<'_>) -> Vec<String> {
    let Some(value) = reader.get("tags") else {
        return Vec::new();
    };
    let tags: Option<Vec<String>> = value
        .as_array()
        .and_then(|items| items.iter().map(|t| t.as_str().map(String::from)).collect());
    tags.unwrap_or_else(|| {
        reader.push_error("tags", "Tags must be a list of strings");
        Vec::new()
    })
}

fn read_assigned_to(reader: &mut FieldReader<'_>) -> Option<Uuid> {
    let raw = reader.optional_string("assignedTo")?;
    match Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
            reader.push_error("assignedTo", "Assigned user must be a valid user id");
            None
        }
    }
}
