//! Чтение первой таблицы загруженного файла в виде строк "заголовок -> значение".
//!
//! Книги Excel/ODS читаются через calamine, `.csv` - через csv.
//! Пустые ячейки в строку не попадают, полностью пустые строки пропускаются.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no worksheets")]
    NoWorksheet,

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Значение непустой ячейки
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Текстовое представление; целые числа без дробной части
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Строка данных таблицы
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: HashMap<String, CellValue>,
}

impl SheetRow {
    pub fn from_cells(cells: HashMap<String, CellValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(header)
    }

    /// Первое непустое значение по списку заголовков-кандидатов.
    /// Сначала точное совпадение в порядке списка, затем без учета регистра.
    pub fn resolve(&self, candidates: &[&str]) -> Option<&CellValue> {
        let present = |v: &&CellValue| !v.is_blank();

        candidates
            .iter()
            .find_map(|c| self.cells.get(*c).filter(present))
            .or_else(|| {
                candidates.iter().find_map(|c| {
                    // HashMap без порядка: при нескольких совпадениях берем наименьший заголовок
                    let mut matches: Vec<(&String, &CellValue)> = self
                        .cells
                        .iter()
                        .filter(|(h, v)| h.eq_ignore_ascii_case(c) && present(v))
                        .collect();
                    matches.sort_by(|a, b| a.0.cmp(b.0));
                    matches.first().map(|(_, v)| *v)
                })
            })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Читает первый лист файла. Формат определяется по имени файла (`.csv`),
/// всё остальное открывается как книга.
pub fn read_first_sheet(
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<Vec<SheetRow>, SheetError> {
    let is_csv = file_name
        .map(|n| n.to_ascii_lowercase().ends_with(".csv"))
        .unwrap_or(false);

    if is_csv {
        read_csv(bytes)
    } else {
        read_workbook(bytes)
    }
}

/// Повторяющиеся заголовки получают суффикс: `name`, `name_1`, `name_2`.
/// Пустые заголовки становятся None.
fn unique_headers<I>(raw: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .map(|header| {
            let header = header.map(|h| h.trim().to_string()).filter(|h| !h.is_empty())?;
            if taken.insert(header.clone()) {
                return Some(header);
            }
            let counter = seen.entry(header.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}_{}", header, counter);
                if taken.insert(candidate.clone()) {
                    return Some(candidate);
                }
            }
        })
        .collect()
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoWorksheet)??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => {
            unique_headers(header_row.iter().map(|cell| workbook_cell(cell).map(|v| v.to_text())))
        }
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .filter_map(|(header, cell)| {
                    let header = header.as_ref()?;
                    workbook_cell(cell).map(|v| (header.clone(), v))
                })
                .collect::<HashMap<_, _>>()
        })
        .filter(|cells| !cells.is_empty())
        .map(SheetRow::from_cells)
        .collect())
}

fn workbook_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // Даты отдаем серийным номером Excel
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        _ => None,
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let text = String::from_utf8_lossy(bytes);
    // Strip UTF-8 BOM if present
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = unique_headers(reader.headers()?.iter().map(|h| Some(h.to_string())));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells: HashMap<String, CellValue> = headers
            .iter()
            .zip(record.iter())
            .filter_map(|(header, raw)| {
                let header = header.as_ref()?;
                csv_cell(raw).map(|v| (header.clone(), v))
            })
            .collect();
        if !cells.is_empty() {
            rows.push(SheetRow::from_cells(cells));
        }
    }
    Ok(rows)
}

/// Типизация текстовой ячейки CSV: числа и true/false как в книгах.
/// Значения с ведущим `+` или `0` (телефоны) остаются текстом.
fn csv_cell(raw: &str) -> Option<CellValue> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if value.eq_ignore_ascii_case("true") {
        return Some(CellValue::Bool(true));
    }
    if value.eq_ignore_ascii_case("false") {
        return Some(CellValue::Bool(false));
    }
    if looks_numeric(value) {
        if let Ok(n) = value.parse::<f64>() {
            return Some(CellValue::Number(n));
        }
    }
    Some(CellValue::Text(value.to_string()))
}

fn looks_numeric(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or_default();
    let frac_part = parts.next();

    let int_ok = !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && !(int_part.len() > 1 && int_part.starts_with('0'));
    let frac_ok =
        frac_part.map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()));

    int_ok && frac_ok
}
