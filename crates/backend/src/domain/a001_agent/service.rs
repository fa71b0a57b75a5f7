use contracts::domain::a001_agent::{Agent, AgentDto, AgentId, AgentListQuery};
use contracts::domain::common::AggregateId;
use uuid::Uuid;

use super::repository::AgentStore;
use crate::shared::error::ServiceError;

/// Разбор идентификатора из строки запроса/тела
pub fn parse_id(raw: Option<&str>) -> Result<Uuid, ServiceError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::Validation("Agent ID is required".into()))?;
    AgentId::from_string(raw)
        .map(|id| id.value())
        .map_err(|_| ServiceError::Validation("Invalid agent ID".into()))
}

/// Создание нового агента
pub async fn create(store: &dyn AgentStore, dto: &AgentDto) -> Result<Agent, ServiceError> {
    let mut aggregate = Agent::new_for_insert(dto);

    // Валидация
    aggregate.validate().map_err(ServiceError::Validation)?;

    aggregate.before_write();
    store.insert(&aggregate).await?;
    Ok(aggregate)
}

/// Обновление существующего агента
pub async fn update(store: &dyn AgentStore, dto: &AgentDto) -> Result<Agent, ServiceError> {
    let id = parse_id(dto.id.as_deref())?;

    let mut aggregate = store
        .get_by_id(id)
        .await?
        .ok_or(ServiceError::NotFound("Agent"))?;

    aggregate.update(dto);

    // Валидация
    aggregate.validate().map_err(ServiceError::Validation)?;

    aggregate.before_write();
    store.update(&aggregate).await?;
    Ok(aggregate)
}

/// Удаление агента (физическое)
pub async fn delete(store: &dyn AgentStore, id: Uuid) -> Result<(), ServiceError> {
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound("Agent"))
    }
}

pub async fn get_by_id(store: &dyn AgentStore, id: Uuid) -> Result<Agent, ServiceError> {
    store
        .get_by_id(id)
        .await?
        .ok_or(ServiceError::NotFound("Agent"))
}

pub async fn list(store: &dyn AgentStore, query: &AgentListQuery) -> anyhow::Result<Vec<Agent>> {
    store.list(query).await
}
