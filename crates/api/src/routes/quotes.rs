//! Quote endpoints: form-based create/edit, item and status commands, order
//! generation and the PDF download.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::{CompanyId, QuoteId, QuoteStatus};
use domain::{
    ConversionOutcome, CreateQuote, LineItemInput, Quote, UpdateQuote, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{QuoteFilter, QuoteRow, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::forms::QuoteForm;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub company_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub discount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ConversionResponse {
    pub quote: Quote,
    pub outcome: ConversionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn parse_status(raw: &str) -> Result<QuoteStatus, ValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::UnknownStatus(raw.to_string()))
}

// -- Handlers --

/// POST /companies/{id}/quotes: create a quote from the quote form.
#[tracing::instrument(skip(state, pairs))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(company_id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let form = QuoteForm::parse(&pairs)?;
    let cmd = CreateQuote {
        company_id: CompanyId::new(company_id),
        client: form.client,
        fields: form.fields,
        items: form.items,
    };
    let quote = state.quotes.create_quote(cmd).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET /quotes: quote headers, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<QuoteRow>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;
    let filter = QuoteFilter {
        company_id: query.company_id.map(CompanyId::new),
        status,
    };
    Ok(Json(state.quotes.list_quotes(filter).await?))
}

/// GET /quotes/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.quotes.get_quote(QuoteId::new(id)).await?))
}

/// POST /quotes/{id}: edit a quote from the quote form, replacing its items.
#[tracing::instrument(skip(state, pairs))]
pub async fn update<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Quote>, ApiError> {
    let form = QuoteForm::parse(&pairs)?;
    let cmd = UpdateQuote {
        quote_id: QuoteId::new(id),
        client: form.client,
        fields: form.fields,
        items: form.items,
    };
    Ok(Json(state.quotes.update_quote(cmd).await?))
}

/// DELETE /quotes/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.quotes.delete_quote(QuoteId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /quotes/{id}/items
#[tracing::instrument(skip(state, item))]
pub async fn add_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(item): Json<LineItemInput>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let quote = state.quotes.add_item(QuoteId::new(id), item).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// DELETE /quotes/{id}/items/{sequence}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, sequence)): Path<(i64, i32)>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(
        state
            .quotes
            .remove_item(QuoteId::new(id), sequence)
            .await?,
    ))
}

/// PUT /quotes/{id}/discount
#[tracing::instrument(skip(state))]
pub async fn set_discount<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<DiscountRequest>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(
        state
            .quotes
            .set_discount(QuoteId::new(id), req.discount)
            .await?,
    ))
}

/// PUT /quotes/{id}/status: manual status change.
#[tracing::instrument(skip(state))]
pub async fn change_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Quote>, ApiError> {
    let status = parse_status(&req.status)?;
    Ok(Json(
        state
            .quotes
            .change_status(QuoteId::new(id), status)
            .await?,
    ))
}

/// POST /quotes/{id}/order: convert into an order and lock.
#[tracing::instrument(skip(state))]
pub async fn generate_order<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ConversionResponse>, ApiError> {
    let (quote, outcome) = state.quotes.generate_order(QuoteId::new(id)).await?;
    let message = match outcome {
        ConversionOutcome::Converted => None,
        ConversionOutcome::AlreadyConverted => Some(format!(
            "Quote {} was already converted into an order",
            quote.number()
        )),
    };
    Ok(Json(ConversionResponse {
        quote,
        outcome,
        message,
    }))
}

/// GET /quotes/{id}/pdf: the printed quote as an attachment.
#[tracing::instrument(skip(state))]
pub async fn pdf<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let sheet = state.quotes.load_sheet(QuoteId::new(id)).await?;
    let disposition = format!("attachment; filename=\"{}.pdf\"", sheet.quote.number);

    let renderer = state.renderer.clone();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&sheet))
        .await
        .map_err(|e| ApiError::Internal(format!("PDF task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
