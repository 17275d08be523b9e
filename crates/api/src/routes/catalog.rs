//! Company, unit of measure and client endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ClientId, CompanyId, UnitId};
use domain::{CompanyInput, UnitInput, UnitPatch};
use serde::Deserialize;
use store::{Client, Company, Store, Unit};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ActiveFilter {
    /// Only list active records.
    #[serde(default)]
    pub active: bool,
}

// -- Companies --

/// GET /companies
#[tracing::instrument(skip(state))]
pub async fn list_companies<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(state.catalog.list_companies(filter.active).await?))
}

/// POST /companies
#[tracing::instrument(skip(state, input))]
pub async fn create_company<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(input): Json<CompanyInput>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let company = state.catalog.create_company(input).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /companies/{id}
#[tracing::instrument(skip(state))]
pub async fn get_company<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Company>, ApiError> {
    Ok(Json(state.catalog.get_company(CompanyId::new(id)).await?))
}

/// PUT /companies/{id}
#[tracing::instrument(skip(state, input))]
pub async fn update_company<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(input): Json<CompanyInput>,
) -> Result<Json<Company>, ApiError> {
    Ok(Json(
        state
            .catalog
            .update_company(CompanyId::new(id), input)
            .await?,
    ))
}

/// DELETE /companies/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_company<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_company(CompanyId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Units --

/// GET /units
#[tracing::instrument(skip(state))]
pub async fn list_units<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<Unit>>, ApiError> {
    Ok(Json(state.catalog.list_units(filter.active).await?))
}

/// POST /units
#[tracing::instrument(skip(state, input))]
pub async fn create_unit<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(input): Json<UnitInput>,
) -> Result<(StatusCode, Json<Unit>), ApiError> {
    let unit = state.catalog.create_unit(input).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

/// GET /units/{id}
#[tracing::instrument(skip(state))]
pub async fn get_unit<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Unit>, ApiError> {
    Ok(Json(state.catalog.get_unit(UnitId::new(id)).await?))
}

/// PUT /units/{id}: the code is fixed; description and active flag change.
#[tracing::instrument(skip(state, patch))]
pub async fn update_unit<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(patch): Json<UnitPatch>,
) -> Result<Json<Unit>, ApiError> {
    Ok(Json(state.catalog.update_unit(UnitId::new(id), patch).await?))
}

/// DELETE /units/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_unit<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_unit(UnitId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Clients --

/// GET /clients
#[tracing::instrument(skip(state))]
pub async fn list_clients<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.catalog.list_clients().await?))
}

/// GET /clients/{id}
#[tracing::instrument(skip(state))]
pub async fn get_client<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(state.catalog.get_client(ClientId::new(id)).await?))
}

/// DELETE /clients/{id}
#[tracing::instrument(skip(state))]
pub async fn delete_client<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_client(ClientId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
