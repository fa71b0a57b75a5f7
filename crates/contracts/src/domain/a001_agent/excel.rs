use serde::{Deserialize, Serialize};

/// Строка из загруженной таблицы, еще не сохраненная в БД
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    /// Значение как в файле (проверяется только при подтверждении)
    pub status: String,
    pub telegram: Option<String>,
    pub order: i32,
    pub category: String,
}

/// Ответ на неподтвержденную загрузку
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub preview: Vec<ImportRow>,
    pub total_records: usize,
    pub require_confirmation: bool,
}

/// Ошибка импорта одной строки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// Номер строки в исходной таблице (с учетом заголовка)
    pub row: usize,
    pub error: String,
}

/// Итог подтвержденного импорта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub message: String,
    pub errors: Vec<ImportRowError>,
}

impl ImportSummary {
    pub fn new(imported: usize, errors: Vec<ImportRowError>) -> Self {
        Self {
            message: format!("Successfully imported {} agents", imported),
            errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportResponse {
    Preview(ImportPreview),
    Committed(ImportSummary),
}
