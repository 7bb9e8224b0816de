//! Bulletin spreadsheet extraction
//!
//! A bulletin workbook holds one table per unit of measure. Only the
//! metric-ton section is read: it starts after the cell
//! `Единица измерения: Метрическая тонна`, has a header row naming the
//! columns and ends at the `Итого` row.

use crate::table::{TableExtractor, TradeRow};
use crate::HarvestError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// Marker cell that opens the metric-ton section (lowercased)
const SECTION_MARKER: &str = "единица измерения: метрическая тонна";

/// Prefix of the row closing the section (lowercased)
const TOTAL_ROW_PREFIX: &str = "итого";

/// Reads the metric-ton table from the first worksheet of a bulletin
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletinTableExtractor;

impl TableExtractor for BulletinTableExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<TradeRow>, HarvestError> {
        let context = path.display().to_string();

        let mut workbook =
            open_workbook_auto(path).map_err(|e| HarvestError::parse(&context, e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| HarvestError::parse(&context, "workbook has no worksheets"))?
            .map_err(|e| HarvestError::parse(&context, e.to_string()))?;

        let rows = extract_trade_rows(&range)
            .map_err(|message| HarvestError::parse(&context, message))?;

        tracing::debug!("Extracted {} rows from {}", rows.len(), context);
        Ok(rows)
    }
}

/// Column positions of the metric-ton table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    product_id: usize,
    product_name: usize,
    delivery_basis: usize,
    volume: usize,
    total: usize,
    count: usize,
}

impl Columns {
    /// Maps header captions to column positions
    ///
    /// Returns `Ok(None)` for rows that are not the header row.
    fn from_header(row: &[Data]) -> Result<Option<Self>, String> {
        let captions: Vec<String> = row.iter().map(normalize).collect();

        let product_id = match find_column(&captions, |c| c.contains("код инструмента")) {
            Some(index) => index,
            None => return Ok(None),
        };

        let missing = |name: &str| format!("header row has no '{}' column", name);

        Ok(Some(Self {
            product_id,
            product_name: find_column(&captions, |c| c.contains("наименование инструмента"))
                .ok_or_else(|| missing("Наименование Инструмента"))?,
            delivery_basis: find_column(&captions, |c| c.contains("базис поставки"))
                .ok_or_else(|| missing("Базис поставки"))?,
            volume: find_column(&captions, |c| c.contains("единицах измерения"))
                .ok_or_else(|| missing("Объем Договоров в единицах измерения"))?,
            total: find_column(&captions, |c| {
                c.contains("руб") && (c.contains("объем") || c.contains("обьем"))
            })
            .ok_or_else(|| missing("Объем Договоров, руб."))?,
            count: find_column(&captions, |c| c.contains("количество договоров"))
                .ok_or_else(|| missing("Количество Договоров, шт."))?,
        }))
    }
}

/// Extracts the metric-ton trading rows from a worksheet
///
/// Rows without an instrument code or with a non-positive contract count
/// carry no trades and are skipped.
pub fn extract_trade_rows(range: &Range<Data>) -> Result<Vec<TradeRow>, String> {
    let mut rows = range.rows();

    let section_found = rows
        .by_ref()
        .any(|row| row.iter().any(|cell| normalize(cell).contains(SECTION_MARKER)));
    if !section_found {
        return Err("metric ton section not found".to_string());
    }

    let columns = loop {
        match rows.next() {
            Some(row) => {
                if let Some(columns) = Columns::from_header(row)? {
                    break columns;
                }
            }
            None => return Err("metric ton header row not found".to_string()),
        }
    };

    let mut trades = Vec::new();
    for row in rows {
        if row
            .iter()
            .any(|cell| normalize(cell).starts_with(TOTAL_ROW_PREFIX))
        {
            break;
        }

        let exchange_product_id = text_at(row, columns.product_id);
        if exchange_product_id.is_empty() {
            continue;
        }

        let count = match number_at(row, columns.count) {
            Some(count) if count > 0 => count,
            _ => continue,
        };

        trades.push(TradeRow {
            exchange_product_id,
            exchange_product_name: text_at(row, columns.product_name),
            delivery_basis_name: text_at(row, columns.delivery_basis),
            volume: number_at(row, columns.volume).unwrap_or(0),
            total: number_at(row, columns.total).unwrap_or(0),
            count,
        });
    }

    Ok(trades)
}

fn find_column(captions: &[String], matches: impl Fn(&str) -> bool) -> Option<usize> {
    captions.iter().position(|caption| matches(caption.as_str()))
}

/// Lowercased cell text with runs of whitespace collapsed
fn normalize(cell: &Data) -> String {
    cell.to_string()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn text_at(row: &[Data], index: usize) -> String {
    match row.get(index) {
        Some(Data::Empty) | None => String::new(),
        Some(cell) => cell.to_string().trim().to_string(),
    }
}

/// Reads a whole number from a numeric or textual cell
///
/// Text cells may use spaces as thousands separators and a comma as the
/// decimal separator; `-` means no value.
fn number_at(row: &[Data], index: usize) -> Option<i64> {
    match row.get(index)? {
        Data::Int(value) => Some(*value),
        Data::Float(value) if value.is_finite() => Some(value.round() as i64),
        Data::String(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| value.round() as i64)
        }
        _ => None,
    }
}
