use anyhow::Context;
use contracts::domain::a002_pre_order::{PreOrder, PreOrderId, PreOrderStatus};
use contracts::domain::common::{AggregateId, EntityMetadata};
use uuid::Uuid;

use sea_orm::entity::prelude::*;

use sea_orm::{EntityTrait, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_pre_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for PreOrder {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let id = PreOrderId::from_string(&m.id)
            .map_err(|e| anyhow::anyhow!("a002_pre_order {}: {}", m.id, e))?;
        let status = m.status.parse::<PreOrderStatus>().unwrap_or_else(|e| {
            tracing::warn!("a002_pre_order {}: {}, treating as pending", m.id, e);
            PreOrderStatus::Pending
        });

        Ok(PreOrder {
            id,
            name: m.name,
            phone_number: m.phone_number,
            status,
            notes: m.notes,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
            },
        })
    }
}

#[derive(Clone)]
pub struct PreOrderRepository {
    conn: DatabaseConnection,
}

impl PreOrderRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<PreOrder>> {
        Entity::find()
            .order_by_desc(Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to load a002_pre_order")?
            .into_iter()
            .map(PreOrder::try_from)
            .collect()
    }

    pub async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PreOrder>> {
        let result = Entity::find_by_id(id.to_string()).one(&self.conn).await?;
        result.map(PreOrder::try_from).transpose()
    }

    pub async fn insert(&self, order: &PreOrder) -> anyhow::Result<()> {
        let active = ActiveModel {
            id: Set(order.id.as_string()),
            name: Set(order.name.clone()),
            phone_number: Set(order.phone_number.clone()),
            status: Set(order.status.as_str().to_string()),
            notes: Set(order.notes.clone()),
            created_at: Set(order.metadata.created_at),
            updated_at: Set(order.metadata.updated_at),
        };
        active.insert(&self.conn).await?;
        Ok(())
    }

    /// Обновляет только изменяемые админкой поля
    pub async fn update(&self, order: &PreOrder) -> anyhow::Result<()> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(order.id.as_string()),
            status: Set(order.status.as_str().to_string()),
            notes: Set(order.notes.clone()),
            updated_at: Set(order.metadata.updated_at),
            ..Default::default()
        };
        active.update(&self.conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;
    use contracts::domain::a002_pre_order::CreatePreOrderDto;

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = PreOrderRepository::new(db::connect("sqlite::memory:").await.unwrap());

        let mut older = PreOrder::new_for_insert(&CreatePreOrderDto {
            name: "Older".into(),
            phone_number: "1".into(),
        });
        older.metadata.created_at = older.metadata.created_at - chrono::Duration::minutes(5);
        let newer = PreOrder::new_for_insert(&CreatePreOrderDto {
            name: "Newer".into(),
            phone_number: "2".into(),
        });
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_update_changes_status_and_notes_only() {
        let repo = PreOrderRepository::new(db::connect("sqlite::memory:").await.unwrap());
        let mut order = PreOrder::new_for_insert(&CreatePreOrderDto {
            name: "Aziz".into(),
            phone_number: "901112233".into(),
        });
        repo.insert(&order).await.unwrap();

        order.status = PreOrderStatus::Contacted;
        order.notes = Some("Called back".into());
        order.name = "Renamed".into();
        repo.update(&order).await.unwrap();

        let loaded = repo.get_by_id(order.id.value()).await.unwrap().unwrap();
        assert_eq!(loaded.status, PreOrderStatus::Contacted);
        assert_eq!(loaded.notes.as_deref(), Some("Called back"));
        assert_eq!(loaded.name, "Aziz");
    }
}
