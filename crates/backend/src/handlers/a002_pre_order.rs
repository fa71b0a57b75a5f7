use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use contracts::domain::a002_pre_order::{CreatePreOrderDto, PreOrder, UpdatePreOrderDto};

use crate::domain::a002_pre_order::service;
use crate::routes::AppState;
use crate::shared::error::ApiError;

/// GET /api/pre-orders
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<PreOrder>>, ApiError> {
    match service::list(&state.pre_orders).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to fetch pre-orders: {:#}", e);
            Err(ApiError::internal("Failed to fetch pre-orders"))
        }
    }
}

/// POST /api/pre-orders
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreatePreOrderDto>, JsonRejection>,
) -> Result<Json<PreOrder>, ApiError> {
    let Json(dto) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    service::create(&state.pre_orders, &dto)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Pre-order not found", "Failed to create pre-order"))
}

/// PATCH /api/pre-orders/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePreOrderDto>, JsonRejection>,
) -> Result<Json<PreOrder>, ApiError> {
    let Json(dto) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    if dto.is_empty() {
        return Err(ApiError::bad_request("Status or notes are required"));
    }
    // Некорректный id не может существовать
    let uuid = uuid::Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::not_found("Pre-order not found"))?;

    service::update(&state.pre_orders, uuid, &dto)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Pre-order not found", "Failed to update pre-order"))
}
