use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::buyers::csv::{self, InvalidBuyer};
use crate::buyers::history::buyer_history;
use crate::buyers::queries::{
    count_buyers, create_buyer, delete_buyer, get_buyer, list_buyers, update_buyer, BuyerFilter,
    SortBy, SortOrder, MAX_PAGE_SIZE,
};
use crate::buyers::validation::BuyerInput;
use crate::errors::AppError;
use crate::models::buyer::{Buyer, BuyerStatus};
use crate::models::history::BuyerHistoryItem;
use crate::state::AppState;
use crate::validation::FieldErrors;

const EXPORT_LIMIT: u32 = 1000;
const EXPORT_FILENAME: &str = "buyers-export.csv";
const TEMPLATE_FILENAME: &str = "buyer-template.csv";
const IMPORT_FIELD: &str = "file";

/// Query string of `GET /api/buyers`. Kept as raw strings so bad values
/// surface as field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl BuyerListQuery {
    pub fn into_filter(self) -> Result<BuyerFilter, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut filter = BuyerFilter::default();

        if let Some(page) = non_empty(self.page) {
            match page.parse::<u32>() {
                Ok(p) if p >= 1 => filter.page = p,
                _ => push(&mut errors, "page", "Page must be a positive integer"),
            }
        }
        if let Some(limit) = non_empty(self.limit) {
            match limit.parse::<u32>() {
                Ok(l) if (1..=MAX_PAGE_SIZE).contains(&l) => filter.limit = l,
                _ => push(
                    &mut errors,
                    "limit",
                    format!("Limit must be between 1 and {MAX_PAGE_SIZE}"),
                ),
            }
        }
        match parse_status(self.status) {
            Ok(status) => filter.status = status,
            Err(message) => push(&mut errors, "status", message),
        }
        filter.search = non_empty(self.search.map(|s| s.trim().to_string()));
        if let Some(sort_by) = self.sort_by.as_deref() {
            filter.sort_by = SortBy::parse(sort_by).unwrap_or_default();
        }
        if let Some(order) = non_empty(self.sort_order) {
            match SortOrder::parse(&order) {
                Some(o) => filter.sort_order = o,
                None => push(&mut errors, "sortOrder", "Sort order must be asc or desc"),
            }
        }

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct BuyerListResponse {
    pub data: Vec<Buyer>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub inserted: usize,
    pub invalid: usize,
    pub invalid_buyers: Vec<InvalidBuyer>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

fn parse_status(raw: Option<String>) -> Result<Option<BuyerStatus>, String> {
    match non_empty(raw) {
        None => Ok(None),
        Some(s) => s.parse::<BuyerStatus>().map(Some).map_err(|_| {
            let allowed: Vec<&str> = BuyerStatus::ALL.iter().map(|v| v.as_str()).collect();
            format!("Invalid status. Expected one of: {}", allowed.join(", "))
        }),
    }
}

/// Unparseable ids are reported the same way as unknown ones.
fn parse_buyer_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| buyer_not_found())
}

fn buyer_not_found() -> AppError {
    AppError::NotFound("Buyer not found".to_string())
}

fn parse_buyer_body(body: &Value) -> Result<BuyerInput, AppError> {
    BuyerInput::parse(body).map_err(|details| AppError::validation("Invalid buyer data", details))
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/buyers
pub async fn handle_list_buyers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<BuyerListQuery>,
) -> Result<Json<BuyerListResponse>, AppError> {
    let filter = query
        .into_filter()
        .map_err(|details| AppError::validation("Invalid query parameters", details))?;

    let data = list_buyers(&state.db, &filter).await?;
    let total = count_buyers(&state.db, &filter).await?;

    Ok(Json(BuyerListResponse {
        data,
        page: filter.page,
        limit: filter.limit,
        total,
    }))
}

/// POST /api/buyers
pub async fn handle_create_buyer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Buyer>), AppError> {
    let Json(body) = payload?;
    let input = parse_buyer_body(&body)?;
    let buyer = create_buyer(&state.db, &input, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(buyer)))
}

/// GET /api/buyers/:id
pub async fn handle_get_buyer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Buyer>, AppError> {
    let id = parse_buyer_id(&id)?;
    let buyer = get_buyer(&state.db, id).await?.ok_or_else(buyer_not_found)?;
    Ok(Json(buyer))
}

/// PUT /api/buyers/:id
pub async fn handle_update_buyer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Buyer>, AppError> {
    let id = parse_buyer_id(&id)?;
    let Json(body) = payload?;
    let input = parse_buyer_body(&body)?;
    let buyer = update_buyer(&state.db, id, &input, Some(user.id))
        .await?
        .ok_or_else(buyer_not_found)?;
    Ok(Json(buyer))
}

/// DELETE /api/buyers/:id
pub async fn handle_delete_buyer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_buyer_id(&id)?;
    if !delete_buyer(&state.db, id, Some(user.id)).await? {
        return Err(buyer_not_found());
    }
    Ok(Json(json!({ "success": true })))
}

/// GET /api/buyers/:id/history
pub async fn handle_buyer_history(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<BuyerHistoryItem>>, AppError> {
    let id = parse_buyer_id(&id)?;
    if get_buyer(&state.db, id).await?.is_none() {
        return Err(buyer_not_found());
    }
    Ok(Json(buyer_history(&state.db, id).await?))
}

/// GET /api/buyers/export?status=
pub async fn handle_export_buyers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let status = parse_status(query.status).map_err(|message| {
        let mut details = FieldErrors::new();
        push(&mut details, "status", message);
        AppError::validation("Invalid query parameters", details)
    })?;

    let filter = BuyerFilter {
        status,
        limit: EXPORT_LIMIT,
        ..Default::default()
    };
    let buyers = list_buyers(&state.db, &filter).await?;
    let body = csv::serialize(&buyers)?;

    info!("Exported {} buyers", buyers.len());
    Ok(csv_attachment(EXPORT_FILENAME, body))
}

/// GET /api/buyers/template
pub async fn handle_buyer_template(_user: CurrentUser) -> Result<Response, AppError> {
    Ok(csv_attachment(TEMPLATE_FILENAME, csv::generate_template()?))
}

/// POST /api/buyers/import
///
/// Structural CSV errors reject the whole file. Rows that parse but fail
/// validation are skipped and reported back with their raw data.
pub async fn handle_import_buyers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some(IMPORT_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
            upload = Some(bytes);
            break;
        }
    }
    let bytes = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let parsed = csv::parse(&bytes);
    if !parsed.errors.is_empty() {
        warn!("Rejected CSV import with {} row errors", parsed.errors.len());
        return Err(AppError::CsvParse(parsed.errors));
    }

    let batch = csv::validate_batch(parsed.candidates);
    let mut inserted = 0;
    for input in &batch.valid {
        create_buyer(&state.db, input, Some(user.id)).await?;
        inserted += 1;
    }

    info!(
        "Imported {inserted} buyers, skipped {} invalid rows",
        batch.invalid.len()
    );
    Ok(Json(ImportResponse {
        success: true,
        inserted,
        invalid: batch.invalid.len(),
        invalid_buyers: batch.invalid,
    }))
}
