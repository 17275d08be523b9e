//! Purchase order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderStatus};
use domain::{CreateOrder, Order, OrderItemInput, ValidationError};
use serde::Deserialize;
use store::{OrderRow, Store};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /orders: register a purchase order.
#[tracing::instrument(skip(state, cmd))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(cmd): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.orders.create_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders: order headers by order date.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderRow>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /orders/{id}: the order with its items and derived total.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get_order(OrderId::new(id)).await?))
}

/// POST /orders/{id}/items
#[tracing::instrument(skip(state, item))]
pub async fn add_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(item): Json<OrderItemInput>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.orders.add_item(OrderId::new(id), item).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// PUT /orders/{id}/status
#[tracing::instrument(skip(state))]
pub async fn change_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let status: OrderStatus = req
        .status
        .trim()
        .parse()
        .map_err(|_| ValidationError::UnknownStatus(req.status.clone()))?;
    Ok(Json(
        state
            .orders
            .change_status(OrderId::new(id), status)
            .await?,
    ))
}
