use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::common::EntityMetadata;

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(AgentId);

/// Категория по умолчанию для новых агентов
pub const DEFAULT_CATEGORY: &str = "General";

/// Сообщение об ошибке обязательных полей (используется и формой, и импортом)
pub const REQUIRED_FIELDS_MESSAGE: &str = "Name, phone number, and location are required";

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("active") {
            Ok(AgentStatus::Active)
        } else if value.eq_ignore_ascii_case("inactive") {
            Ok(AgentStatus::Inactive)
        } else {
            Err(format!("Invalid status: {}", value))
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Агент по продажам (запись публичного справочника)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub phone_number: String,
    pub location: String,
    pub status: AgentStatus,
    pub telegram: Option<String>,
    /// Порядок отображения, меньшее значение выше в списке
    pub order: i32,
    pub category: String,

    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Agent {
    /// Создать нового агента для вставки в БД (значения по умолчанию подставляются здесь)
    pub fn new_for_insert(dto: &AgentDto) -> Self {
        Self {
            id: AgentId::new_v4(),
            name: dto.name.trim().to_string(),
            phone_number: dto.phone_number.trim().to_string(),
            location: dto.location.trim().to_string(),
            status: dto.status.unwrap_or_default(),
            telegram: normalize_optional(dto.telegram.as_deref()),
            order: dto.order.unwrap_or(0),
            category: normalize_category(dto.category.as_deref()),
            metadata: EntityMetadata::new(),
        }
    }

    /// Обновить данные из DTO
    ///
    /// status, order и category сохраняют текущие значения, если не переданы.
    /// telegram перезаписывается всегда (отсутствие = очистка).
    pub fn update(&mut self, dto: &AgentDto) {
        self.name = dto.name.trim().to_string();
        self.phone_number = dto.phone_number.trim().to_string();
        self.location = dto.location.trim().to_string();
        if let Some(status) = dto.status {
            self.status = status;
        }
        self.telegram = normalize_optional(dto.telegram.as_deref());
        if let Some(order) = dto.order {
            self.order = order;
        }
        if dto.category.is_some() {
            self.category = normalize_category(dto.category.as_deref());
        }
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty()
            || self.phone_number.trim().is_empty()
            || self.location.trim().is_empty()
        {
            return Err(REQUIRED_FIELDS_MESSAGE.into());
        }
        Ok(())
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.metadata.touch();
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_category(value: Option<&str>) -> String {
    normalize_optional(value).unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания/обновления агента
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentDto {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub location: String,
    pub status: Option<AgentStatus>,
    pub telegram: Option<String>,
    pub order: Option<i32>,
    pub category: Option<String>,
}

/// Сортировка списка агентов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentSort {
    /// Сначала новые (админка)
    #[default]
    Newest,
    /// По полю order, затем по дате создания (публичный справочник)
    Order,
}

/// Параметры выборки списка агентов
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentListQuery {
    pub status: Option<AgentStatus>,
    pub sort: AgentSort,
}

impl AgentListQuery {
    /// Публичный справочник: только активные, по порядку отображения
    pub fn directory() -> Self {
        Self {
            status: Some(AgentStatus::Active),
            sort: AgentSort::Order,
        }
    }
}
