use anyhow::Context;
use async_trait::async_trait;
use contracts::domain::a001_agent::{Agent, AgentId, AgentListQuery, AgentSort, AgentStatus};
use contracts::domain::common::{AggregateId, EntityMetadata};
use uuid::Uuid;

use sea_orm::entity::prelude::*;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_agent")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub location: String,
    pub status: String,
    pub telegram: Option<String>,
    pub sort_order: i32,
    pub category: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Agent {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let id = AgentId::from_string(&m.id)
            .map_err(|e| anyhow::anyhow!("a001_agent {}: {}", m.id, e))?;
        let status = m.status.parse::<AgentStatus>().unwrap_or_else(|e| {
            tracing::warn!("a001_agent {}: {}, treating as active", m.id, e);
            AgentStatus::Active
        });

        Ok(Agent {
            id,
            name: m.name,
            phone_number: m.phone_number,
            location: m.location,
            status,
            telegram: m.telegram,
            order: m.sort_order,
            category: m.category,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
            },
        })
    }
}

fn to_active_model(agent: &Agent) -> ActiveModel {
    ActiveModel {
        id: Set(agent.id.as_string()),
        name: Set(agent.name.clone()),
        phone_number: Set(agent.phone_number.clone()),
        location: Set(agent.location.clone()),
        status: Set(agent.status.as_str().to_string()),
        telegram: Set(agent.telegram.clone()),
        sort_order: Set(agent.order),
        category: Set(agent.category.clone()),
        created_at: Set(agent.metadata.created_at),
        updated_at: Set(agent.metadata.updated_at),
    }
}

/// Хранилище агентов.
///
/// Импорт и сервис работают только через этот трейт; конкурентные записи
/// разруливает само хранилище.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Agent>>;

    async fn insert(&self, agent: &Agent) -> anyhow::Result<()>;

    async fn update(&self, agent: &Agent) -> anyhow::Result<()>;

    /// false, если записи не было
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn list(&self, query: &AgentListQuery) -> anyhow::Result<Vec<Agent>>;

    async fn count(&self) -> anyhow::Result<u64>;
}

/// Реализация на sea-orm (SQLite)
#[derive(Clone)]
pub struct AgentRepository {
    conn: DatabaseConnection,
}

impl AgentRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl AgentStore for AgentRepository {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Agent>> {
        let result = Entity::find_by_id(id.to_string()).one(&self.conn).await?;
        result.map(Agent::try_from).transpose()
    }

    async fn insert(&self, agent: &Agent) -> anyhow::Result<()> {
        to_active_model(agent).insert(&self.conn).await?;
        Ok(())
    }

    async fn update(&self, agent: &Agent) -> anyhow::Result<()> {
        let mut active = to_active_model(agent);
        // created_at не меняется после вставки
        active.created_at = sea_orm::ActiveValue::NotSet;
        active.update(&self.conn).await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = Entity::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, query: &AgentListQuery) -> anyhow::Result<Vec<Agent>> {
        let mut select = Entity::find();
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }
        select = match query.sort {
            AgentSort::Newest => select.order_by_desc(Column::CreatedAt),
            AgentSort::Order => select
                .order_by_asc(Column::SortOrder)
                .order_by_asc(Column::CreatedAt),
        };

        select
            .all(&self.conn)
            .await
            .context("Failed to load a001_agent")?
            .into_iter()
            .map(Agent::try_from)
            .collect()
    }

    async fn count(&self) -> anyhow::Result<u64> {
        Ok(Entity::find().count(&self.conn).await?)
    }
}
