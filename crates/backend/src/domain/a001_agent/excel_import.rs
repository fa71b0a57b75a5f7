use contracts::domain::a001_agent::{
    Agent, AgentDto, AgentStatus, ImportPreview, ImportResponse, ImportRow, ImportRowError,
    ImportSummary, DEFAULT_CATEGORY,
};
use thiserror::Error;

use super::repository::AgentStore;
use crate::shared::spreadsheet::{self, CellValue, SheetError, SheetRow};

/// Номер первой строки данных в таблице (строка 1 - заголовок)
const ROW_OFFSET: usize = 2;

const NAME_HEADERS: &[&str] = &["name", "Name"];
const PHONE_HEADERS: &[&str] = &["phoneNumber", "phone number"];
const LOCATION_HEADERS: &[&str] = &["location", "Location"];

/// Ошибка импорта одной строки; не прерывает обработку остальных
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Name, phone number, and location are required")]
    MissingRequired,

    #[error("{0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl RowError {
    fn into_row_error(self, index: usize) -> ImportRowError {
        let message = self.to_string();
        ImportRowError {
            row: index + ROW_OFFSET,
            error: if message.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                message
            },
        }
    }
}

fn text(row: &SheetRow, headers: &[&str]) -> Option<String> {
    row.resolve(headers)
        .map(|v| v.to_text().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Разбор строки таблицы в ImportRow (одинаково для предпросмотра и записи)
pub fn read_import_row(row: &SheetRow) -> ImportRow {
    ImportRow {
        name: text(row, NAME_HEADERS),
        phone_number: text(row, PHONE_HEADERS),
        location: text(row, LOCATION_HEADERS),
        status: text(row, &["status"]).unwrap_or_else(|| AgentStatus::Active.to_string()),
        telegram: text(row, &["telegram"]),
        // Только числовые ячейки, дробная часть отбрасывается
        order: row
            .resolve(&["order"])
            .and_then(CellValue::as_number)
            .map(|n| n.trunc() as i32)
            .unwrap_or(0),
        category: text(row, &["category"]).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
    }
}

pub fn build_preview(rows: &[SheetRow]) -> ImportPreview {
    ImportPreview {
        preview: rows.iter().map(read_import_row).collect(),
        total_records: rows.len(),
        require_confirmation: true,
    }
}

async fn import_row(store: &dyn AgentStore, row: ImportRow) -> Result<Agent, RowError> {
    let (name, phone_number, location) = match (row.name, row.phone_number, row.location) {
        (Some(name), Some(phone), Some(location)) => (name, phone, location),
        _ => return Err(RowError::MissingRequired),
    };
    let status = row
        .status
        .parse::<AgentStatus>()
        .map_err(RowError::InvalidStatus)?;

    let mut agent = Agent::new_for_insert(&AgentDto {
        id: None,
        name,
        phone_number,
        location,
        status: Some(status),
        telegram: row.telegram,
        order: Some(row.order),
        category: Some(row.category),
    });
    agent.validate().map_err(|_| RowError::MissingRequired)?;
    agent.before_write();
    store.insert(&agent).await?;
    Ok(agent)
}

/// Последовательная запись строк. Ошибка строки фиксируется и не прерывает импорт,
/// уже записанные строки не откатываются.
pub async fn commit_rows(store: &dyn AgentStore, rows: &[SheetRow]) -> ImportSummary {
    let mut imported = 0;
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match import_row(store, read_import_row(row)).await {
            Ok(agent) => {
                tracing::debug!("Imported agent {} ({})", agent.name, agent.id);
                imported += 1;
            }
            Err(e) => {
                let failure = e.into_row_error(index);
                tracing::warn!("Import row {} skipped: {}", failure.row, failure.error);
                errors.push(failure);
            }
        }
    }

    ImportSummary::new(imported, errors)
}

/// Обработка загруженного файла: предпросмотр (confirm = false) или запись
pub async fn process_upload(
    store: &dyn AgentStore,
    file_name: Option<&str>,
    bytes: &[u8],
    confirm: bool,
) -> Result<ImportResponse, SheetError> {
    let rows = spreadsheet::read_first_sheet(file_name, bytes)?;
    tracing::info!(
        "Agent upload {}: {} rows, confirm={}",
        file_name.unwrap_or("<unnamed>"),
        rows.len(),
        confirm
    );

    if !confirm {
        return Ok(ImportResponse::Preview(build_preview(&rows)));
    }

    let summary = commit_rows(store, &rows).await;
    tracing::info!("{} ({} failed rows)", summary.message, summary.errors.len());
    Ok(ImportResponse::Committed(summary))
}
