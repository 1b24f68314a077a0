use std::path::Path;

use chrono::{DateTime, TimeZone};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::ExtractError;
use crate::model::DataTable;
use crate::options::ExportFormat;

pub const DEFAULT_OUTPUT_PREFIX: &str = "combined_output";
pub const SHEET_NAME: &str = "Sheet1";

/// `<prefix>_<YYYYMMDD_HHMMSS>.<ext>` for the moment the output was generated.
#[must_use]
pub fn output_file_name<Tz>(
    prefix: &str,
    generated_at: &DateTime<Tz>,
    format: ExportFormat,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{prefix}_{}.{}",
        generated_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn column_index(index: usize) -> Result<u16, ExtractError> {
    u16::try_from(index).map_err(|_| {
        ExtractError::InvalidOption(format!("table has too many columns for a worksheet: {index}"))
    })
}

fn row_index(index: usize) -> Result<u32, ExtractError> {
    u32::try_from(index).map_err(|_| {
        ExtractError::InvalidOption(format!("table has too many rows for a worksheet: {index}"))
    })
}

fn fill_worksheet(worksheet: &mut Worksheet, table: &DataTable) -> Result<(), ExtractError> {
    worksheet.set_name(SHEET_NAME)?;
    let header_format = Format::new().set_bold();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, name, &header_format)?;
    }

    for (row_offset, row) in table.rows.iter().enumerate() {
        let row_number = row_index(row_offset + 1)?;
        for (col, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string(row_number, column_index(col)?, value)?;
            }
        }
    }

    Ok(())
}

/// Serializes `table` as a single-sheet workbook: a header row, then one row per record.
pub fn write_xlsx_to_buffer(table: &DataTable) -> Result<Vec<u8>, ExtractError> {
    let mut workbook = Workbook::new();
    fill_worksheet(workbook.add_worksheet(), table)?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes the same workbook as [`write_xlsx_to_buffer`] straight to `path`.
pub fn write_xlsx(path: &Path, table: &DataTable) -> Result<(), ExtractError> {
    let mut workbook = Workbook::new();
    fill_worksheet(workbook.add_worksheet(), table)?;
    workbook.save(path)?;
    Ok(())
}

pub fn write_csv_to_string(table: &DataTable, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or_default()))?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

/// Encodes `table` in the requested format.
pub fn export_table(table: &DataTable, format: ExportFormat) -> Result<Vec<u8>, ExtractError> {
    match format {
        ExportFormat::Xlsx => write_xlsx_to_buffer(table),
        ExportFormat::Csv => write_csv_to_string(table, b',').map(String::into_bytes),
    }
}
