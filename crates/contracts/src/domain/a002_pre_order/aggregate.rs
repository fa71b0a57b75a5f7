use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::common::EntityMetadata;

crate::uuid_aggregate_id!(PreOrderId);

/// Статус обработки предзаказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreOrderStatus {
    #[default]
    Pending,
    Contacted,
    Completed,
    Cancelled,
}

impl PreOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreOrderStatus::Pending => "pending",
            PreOrderStatus::Contacted => "contacted",
            PreOrderStatus::Completed => "completed",
            PreOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PreOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PreOrderStatus::Pending),
            "contacted" => Ok(PreOrderStatus::Contacted),
            "completed" => Ok(PreOrderStatus::Completed),
            "cancelled" => Ok(PreOrderStatus::Cancelled),
            other => Err(format!("Invalid pre-order status: {}", other)),
        }
    }
}

impl fmt::Display for PreOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Предзаказ с публичной формы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrder {
    pub id: PreOrderId,
    pub name: String,
    pub phone_number: String,
    pub status: PreOrderStatus,
    pub notes: Option<String>,

    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl PreOrder {
    pub fn new_for_insert(dto: &CreatePreOrderDto) -> Self {
        Self {
            id: PreOrderId::new_v4(),
            name: dto.name.trim().to_string(),
            phone_number: dto.phone_number.trim().to_string(),
            status: PreOrderStatus::Pending,
            notes: None,
            metadata: EntityMetadata::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.phone_number.is_empty() {
            return Err("Name and phone number are required".into());
        }
        Ok(())
    }

    /// Применить изменения из админки; пустые заметки не затирают существующие
    pub fn apply(&mut self, dto: &UpdatePreOrderDto) {
        if let Some(status) = dto.status {
            self.status = status;
        }
        if let Some(notes) = dto.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            self.notes = Some(notes.to_string());
        }
        self.metadata.touch();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreOrderDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePreOrderDto {
    pub status: Option<PreOrderStatus>,
    pub notes: Option<String>,
}

impl UpdatePreOrderDto {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.as_deref().map_or(true, |n| n.trim().is_empty())
    }
}
