use contracts::domain::a002_pre_order::{CreatePreOrderDto, PreOrder, UpdatePreOrderDto};
use uuid::Uuid;

use super::repository::PreOrderRepository;
use crate::shared::error::ServiceError;

/// Новый предзаказ с публичной формы (статус pending)
pub async fn create(
    repo: &PreOrderRepository,
    dto: &CreatePreOrderDto,
) -> Result<PreOrder, ServiceError> {
    let order = PreOrder::new_for_insert(dto);
    order.validate().map_err(ServiceError::Validation)?;

    repo.insert(&order).await?;
    tracing::info!("Pre-order {} created", order.id);
    Ok(order)
}

pub async fn list(repo: &PreOrderRepository) -> anyhow::Result<Vec<PreOrder>> {
    repo.list().await
}

/// Смена статуса и/или заметок
pub async fn update(
    repo: &PreOrderRepository,
    id: Uuid,
    dto: &UpdatePreOrderDto,
) -> Result<PreOrder, ServiceError> {
    if dto.is_empty() {
        return Err(ServiceError::Validation("Status or notes are required".into()));
    }

    let mut order = repo
        .get_by_id(id)
        .await?
        .ok_or(ServiceError::NotFound("Pre-order"))?;

    order.apply(dto);
    repo.update(&order).await?;
    Ok(order)
}
