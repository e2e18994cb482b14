use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::error::TabliftError;
use crate::model::TabularResult;

/// Sheet used when no table was found.
pub const PLACEHOLDER_SHEET: &str = "Sheet1";
pub const PLACEHOLDER_MESSAGE: &str = "No tables found";

/// Worksheet limits; anything past them is dropped.
const MAX_DATA_ROWS: usize = 1_048_575;
const MAX_COLUMNS: usize = 16_384;
const MAX_CELL_CHARS: usize = 32_767;

/// Name of the sheet holding the table at 1-based `position`.
pub fn sheet_name(position: usize) -> String {
    format!("Table_{position}")
}

/// Serialize tables into an xlsx workbook, one sheet per table.
///
/// With no tables the workbook holds a single placeholder sheet.
pub fn write_workbook(tables: &[TabularResult]) -> Result<Vec<u8>, TabliftError> {
    let mut workbook = Workbook::new();

    if tables.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(PLACEHOLDER_SHEET)?;
        sheet.write_string(0, 0, PLACEHOLDER_MESSAGE)?;
    } else {
        let header = Format::new()
            .set_bold()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center);
        for (i, table) in tables.iter().enumerate() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(i + 1))?;
            write_table(sheet, table, &header)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_table(
    sheet: &mut Worksheet,
    table: &TabularResult,
    header: &Format,
) -> Result<(), TabliftError> {
    if table.width() > MAX_COLUMNS || table.height() > MAX_DATA_ROWS {
        tracing::warn!(
            page = table.page_number,
            columns = table.width(),
            rows = table.height(),
            "table exceeds worksheet limits, truncating"
        );
    }

    for (col, name) in table.columns.iter().take(MAX_COLUMNS).enumerate() {
        sheet.write_string_with_format(0, col as u16, cell_text(name), header)?;
    }

    for (r, row) in table.rows.iter().take(MAX_DATA_ROWS).enumerate() {
        for (col, value) in row.iter().take(MAX_COLUMNS).enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32 + 1, col as u16, cell_text(value))?;
            }
        }
    }

    Ok(())
}

fn cell_text(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &value[..cut],
        None => value,
    }
}
