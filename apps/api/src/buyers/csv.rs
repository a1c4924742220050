//! CSV import/export for buyer records.
//!
//! Columns are fixed and ordered; each human-readable header maps to one
//! buyer field. Import produces raw JSON candidates that still have to pass
//! [`BuyerInput::parse`]; export writes persisted rows.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::buyers::validation::BuyerInput;
use crate::models::buyer::Buyer;
use crate::validation::FieldErrors;

/// Header label → buyer field name, in column order.
pub const CSV_COLUMNS: [(&str, &str); 10] = [
    ("First Name", "firstName"),
    ("Last Name", "lastName"),
    ("Email", "email"),
    ("Phone", "phone"),
    ("Status", "status"),
    ("Priority", "priority"),
    ("Budget", "budget"),
    ("Location", "location"),
    ("Notes", "notes"),
    ("Tags", "tags"),
];

const TAG_SEPARATOR: &str = ", ";

/// A structural problem with one line of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvRowError {
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub candidates: Vec<Value>,
    pub errors: Vec<CsvRowError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidBuyer {
    pub data: Value,
    pub errors: FieldErrors,
}

#[derive(Debug, Default)]
pub struct BatchValidation {
    pub valid: Vec<BuyerInput>,
    pub invalid: Vec<InvalidBuyer>,
}

fn headers() -> impl Iterator<Item = &'static str> {
    CSV_COLUMNS.iter().map(|(header, _)| *header)
}

/// The downloadable import template: header row plus one blank data row.
pub fn generate_template() -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers())?;
    writer.write_record(CSV_COLUMNS.iter().map(|_| ""))?;
    finish(writer)
}

/// Parses an uploaded file into buyer-shaped candidates.
///
/// Blank lines are skipped. Columns missing from the file are left out of
/// every candidate so schema defaults apply. Any structural error means the
/// whole upload should be rejected.
pub fn parse(bytes: &[u8]) -> ParsedCsv {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedCsv::default();

    let header_row = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            parsed.errors.push(row_error(&e));
            return parsed;
        }
    };
    let positions: Vec<(usize, &str)> = CSV_COLUMNS
        .iter()
        .filter_map(|(header, field)| {
            header_row
                .iter()
                .position(|h| h.trim() == *header)
                .map(|idx| (idx, *field))
        })
        .collect();

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                parsed.errors.push(row_error(&e));
                continue;
            }
        };

        let mut candidate = Map::new();
        for (idx, field) in &positions {
            let Some(cell) = record.get(*idx) else {
                continue;
            };
            match *field {
                "tags" => {
                    candidate.insert(field.to_string(), Value::Array(split_tags(cell)));
                }
                "budget" => {
                    if let Some(budget) = parse_budget(cell) {
                        candidate.insert(field.to_string(), budget);
                    }
                }
                _ => {
                    candidate.insert(field.to_string(), Value::String(cell.to_string()));
                }
            }
        }
        parsed.candidates.push(Value::Object(candidate));
    }

    parsed
}

/// Writes buyers out under the fixed headers, one row per buyer in order.
pub fn serialize(buyers: &[Buyer]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers())?;
    for buyer in buyers {
        writer.write_record(buyer_row(buyer))?;
    }
    finish(writer)
}

/// Runs every candidate through the buyer schema independently.
pub fn validate_batch(candidates: Vec<Value>) -> BatchValidation {
    let mut batch = BatchValidation::default();
    for candidate in candidates {
        match BuyerInput::parse(&candidate) {
            Ok(input) => batch.valid.push(input),
            Err(errors) => batch.invalid.push(InvalidBuyer {
                data: candidate,
                errors,
            }),
        }
    }
    batch
}

fn buyer_row(buyer: &Buyer) -> [String; 10] {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        buyer.first_name.clone(),
        buyer.last_name.clone(),
        buyer.email.clone(),
        text(&buyer.phone),
        buyer.status.to_string(),
        buyer.priority.to_string(),
        // zero renders blank, like any other falsy value
        buyer
            .budget
            .filter(|b| *b != 0)
            .map(|b| b.to_string())
            .unwrap_or_default(),
        text(&buyer.location),
        text(&buyer.notes),
        buyer.tags.join(TAG_SEPARATOR),
    ]
}

fn split_tags(cell: &str) -> Vec<Value> {
    cell.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| Value::String(t.to_string()))
        .collect()
}

/// Empty cells are treated as absent; unparseable text is kept verbatim so
/// the schema reports it.
fn parse_budget(cell: &str) -> Option<Value> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let number = trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number);
    Some(number.unwrap_or_else(|| Value::String(cell.to_string())))
}

fn row_error(err: &csv::Error) -> CsvRowError {
    CsvRowError {
        line: err.position().map(|p| p.line()).unwrap_or_default(),
        message: err.to_string(),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV writer: {e}"))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sqlx::types::Json;
    use uuid::Uuid;

    use crate::models::buyer::{BuyerPriority, BuyerStatus};

    #[allow(clippy::too_many_arguments)]
    fn buyer(
        first: &str,
        last: &str,
        email: &str,
        phone: &str,
        status: BuyerStatus,
        priority: BuyerPriority,
        budget: i64,
        location: &str,
        notes: &str,
        tags: &[&str],
    ) -> Buyer {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        Buyer {
            id: Uuid::new_v4(),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: Some(phone.into()),
            status,
            priority,
            budget: Some(budget),
            location: Some(location.into()),
            notes: Some(notes.into()),
            tags: Json(tags.iter().map(|t| t.to_string()).collect()),
            assigned_to: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn sample_buyers() -> Vec<Buyer> {
        vec![
            buyer(
                "John",
                "Doe",
                "john.doe@example.com",
                "555-123-4567",
                BuyerStatus::New,
                BuyerPriority::Medium,
                500000,
                "New York, NY",
                "Looking for a 3-bedroom house",
                &["first-time", "pre-approved"],
            ),
            buyer(
                "Jane",
                "Smith",
                "jane.smith@example.com",
                "555-987-6543",
                BuyerStatus::Contacted,
                BuyerPriority::High,
                750000,
                "San Francisco, CA",
                "Interested in waterfront properties",
                &["investor", "cash-buyer"],
            ),
        ]
    }

    #[test]
    fn test_template_has_headers_and_one_blank_row() {
        let template = generate_template().unwrap();
        let lines: Vec<&str> = template.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "First Name,Last Name,Email,Phone,Status,Priority,Budget,Location,Notes,Tags"
        );
        assert_eq!(lines[1], ",,,,,,,,,");
    }

    #[test]
    fn test_export_contains_buyer_rows() {
        let csv = serialize(&sample_buyers()).unwrap();
        assert!(csv.contains("John,Doe,john.doe@example.com"));
        assert!(csv.contains("Jane,Smith,jane.smith@example.com"));
        assert!(csv.contains("first-time, pre-approved"));
        assert!(csv.contains("investor, cash-buyer"));
        assert!(csv.contains("\"New York, NY\""));
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_export_blanks_missing_and_zero_values() {
        let mut b = sample_buyers().remove(0);
        b.phone = None;
        b.notes = None;
        b.budget = Some(0);
        b.tags = Json(vec![]);
        let csv = serialize(&[b]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "John,Doe,john.doe@example.com,,new,medium,,\"New York, NY\",,");
    }

    #[test]
    fn test_round_trip() {
        let buyers = sample_buyers();
        let parsed = parse(serialize(&buyers).unwrap().as_bytes());
        assert!(parsed.errors.is_empty());
        let batch = validate_batch(parsed.candidates);
        assert!(batch.invalid.is_empty());
        assert_eq!(batch.valid.len(), buyers.len());

        for (original, input) in buyers.iter().zip(&batch.valid) {
            assert_eq!(input.first_name, original.first_name);
            assert_eq!(input.last_name, original.last_name);
            assert_eq!(input.email, original.email);
            assert_eq!(input.phone, original.phone);
            assert_eq!(input.status, original.status);
            assert_eq!(input.priority, original.priority);
            assert_eq!(input.budget, original.budget);
            assert_eq!(input.location, original.location);
            assert_eq!(input.notes, original.notes);
            assert_eq!(input.tags, original.tags.0);
        }
    }

    #[test]
    fn test_parse_maps_headers_and_special_fields() {
        let file = "First Name,Last Name,Email,Budget,Tags\n\
                    Ana,Lopez,ana@example.com,350000.5, downsizing ,, condo \n";
        let parsed = parse(file.as_bytes());
        // unquoted commas in the tags cell make the row too long
        assert_eq!(parsed.errors.len(), 1);

        let file = "First Name,Last Name,Email,Budget,Tags\n\
                    Ana,Lopez,ana@example.com,350000.5,\" downsizing ,, condo \"\n";
        let parsed = parse(file.as_bytes());
        assert!(parsed.errors.is_empty());
        assert_eq!(
            parsed.candidates,
            vec![json!({
                "firstName": "Ana",
                "lastName": "Lopez",
                "email": "ana@example.com",
                "budget": 350000.5,
                "tags": ["downsizing", "condo"],
            })]
        );
    }

    #[test]
    fn test_parse_omits_absent_columns_and_blank_budget() {
        let file = "First Name,Last Name,Email,Budget\nAna,Lopez,ana@example.com,\n";
        let parsed = parse(file.as_bytes());
        let candidate = parsed.candidates[0].as_object().unwrap();
        assert!(!candidate.contains_key("budget"));
        assert!(!candidate.contains_key("status"));
        assert!(!candidate.contains_key("tags"));

        let input = BuyerInput::parse(&parsed.candidates[0]).unwrap();
        assert_eq!(input.status, BuyerStatus::New);
    }

    #[test]
    fn test_parse_keeps_bad_budget_for_schema() {
        let file = "First Name,Last Name,Email,Budget\nAna,Lopez,ana@example.com,lots\n";
        let parsed = parse(file.as_bytes());
        assert_eq!(parsed.candidates[0]["budget"], json!("lots"));
        let batch = validate_batch(parsed.candidates);
        assert!(batch.invalid[0].errors.contains_key("budget"));
    }

    #[test]
    fn test_parse_skips_empty_lines_and_bom() {
        let file = "\u{feff}First Name,Last Name,Email\n\nAna,Lopez,ana@example.com\n\n\nBo,Chen,bo@example.com\n";
        let parsed = parse(file.as_bytes());
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[1]["firstName"], "Bo");
    }

    #[test]
    fn test_parse_reports_malformed_rows() {
        let file = "First Name,Last Name,Email\nAna,Lopez\nBo,Chen,bo@example.com\n";
        let parsed = parse(file.as_bytes());
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].line, 2);
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_validate_batch_partitions_in_order() {
        let candidates = vec![
            json!({
                "firstName": "John",
                "lastName": "Doe",
                "email": "john.doe@example.com",
                "phone": "555-123-4567",
                "status": "new",
                "priority": "medium",
                "budget": 500000,
                "location": "New York, NY",
                "notes": "Looking for a 3-bedroom house",
                "tags": ["first-time", "pre-approved"],
            }),
            json!({
                "firstName": "Jane",
                "lastName": "Smith",
                "phone": "555-987-6543",
            }),
        ];
        let batch = validate_batch(candidates.clone());
        assert_eq!(batch.valid.len(), 1);
        assert_eq!(batch.invalid.len(), 1);
        assert_eq!(batch.valid[0].first_name, "John");
        assert_eq!(batch.invalid[0].data, candidates[1]);
        assert!(batch.invalid[0].errors.contains_key("email"));
    }

    #[test]
    fn test_template_row_fails_validation() {
        let parsed = parse(generate_template().unwrap().as_bytes());
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.candidates.len(), 1);
        let batch = validate_batch(parsed.candidates);
        assert_eq!(batch.invalid.len(), 1);
    }
}
