//! # Excel Module
//!
//! Spreadsheet side of import and export: the category export workbook, the
//! import template, reading `(parent, child)` rows from an uploaded `.xlsx`
//! file and progress bookkeeping for long imports.

use anyhow::{Context, Result};
use calamine::{open_workbook_from_rs, Reader, Xlsx};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::io::Cursor;
use tracing::debug;

use crate::tree::{walk, TreeNode};

/// File extension accepted for uploads, compared case-insensitively
pub const SUPPORTED_EXTENSION: &str = ".xlsx";
pub const EXPORT_FILE_NAME: &str = "categories.xlsx";
pub const TEMPLATE_FILE_NAME: &str = "category_template.xlsx";

const TEMPLATE_COLUMN_WIDTH: f64 = 20.0;
const TEMPLATE_ROW_HEIGHT: f64 = 25.0;
const EXPORT_COLUMN_WIDTH: f64 = 40.0;

/// Example rows shipped in the import template
const TEMPLATE_EXAMPLES: &[(&str, &str)] = &[("Drinks", "Coca-Cola"), ("Drinks", "Fanta")];

/// Whether an uploaded file name has the supported spreadsheet extension
pub fn is_supported_file(file_name: &str) -> bool {
    file_name
        .to_ascii_lowercase()
        .ends_with(SUPPORTED_EXTENSION)
}

/// Text of an exported name cell: two spaces per level and a branch glyph below the roots
pub fn export_cell_text(level: usize, name: &str) -> String {
    let branch = if level > 0 { "└─ " } else { "" };
    format!("{}{}{}", "  ".repeat(level), branch, name)
}

/// Export the category forest as a single-column workbook
pub fn export_workbook(forest: &[TreeNode], sheet_name: &str, header: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    worksheet.set_column_width(0, EXPORT_COLUMN_WIDTH)?;
    worksheet.write_string_with_format(0, 0, header, &bold)?;

    let mut cells = Vec::new();
    walk(forest, &mut |level, category| {
        cells.push((level, export_cell_text(level, &category.name)));
    });

    for (index, (level, text)) in cells.iter().enumerate() {
        let row = u32::try_from(index + 1).context("too many categories for one worksheet")?;
        if *level == 0 {
            worksheet.write_string_with_format(row, 0, text, &bold)?;
        } else {
            worksheet.write_string(row, 0, text)?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .context("failed to serialize export workbook")?;
    debug!(rows = cells.len(), size = bytes.len(), "Export workbook built");
    Ok(bytes)
}

/// Build the import template: a header row and a couple of example rows
pub fn template_workbook(
    sheet_name: &str,
    category_header: &str,
    subcategory_header: &str,
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let cell_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    for col in 0..3u16 {
        worksheet.set_column_width(col, TEMPLATE_COLUMN_WIDTH)?;
    }

    worksheet.set_row_height(0, TEMPLATE_ROW_HEIGHT)?;
    worksheet.write_string_with_format(0, 0, category_header, &header_format)?;
    worksheet.write_string_with_format(0, 1, subcategory_header, &header_format)?;
    // Third column stays blank but styled, for notes
    worksheet.write_blank(0, 2, &header_format)?;

    for (index, (parent, child)) in TEMPLATE_EXAMPLES.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.set_row_height(row, TEMPLATE_ROW_HEIGHT)?;
        worksheet.write_string_with_format(row, 0, *parent, &cell_format)?;
        worksheet.write_string_with_format(row, 1, *child, &cell_format)?;
        worksheet.write_blank(row, 2, &cell_format)?;
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize template workbook")
}

/// One data row of an import sheet, cell text already trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 0-based sheet row, the header being row 0
    pub row: u32,
    pub parent: String,
    pub child: String,
}

/// Read every data row of the first worksheet.
///
/// Row 0 is the header. Column A is the parent name and column B the child
/// name; missing cells read as empty strings and non-text cells are rendered
/// to text.
pub fn read_import_rows(bytes: &[u8]) -> Result<Vec<ImportRow>> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("failed to open workbook")?;

    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("failed to read first worksheet")?;

    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let cell_text = |row: u32, col: u32| {
        range
            .get_value((row, col))
            .map(|value| value.to_string().trim().to_string())
            .unwrap_or_default()
    };

    let rows: Vec<ImportRow> = (1..=last_row)
        .map(|row| ImportRow {
            row,
            parent: cell_text(row, 0),
            child: cell_text(row, 1),
        })
        .collect();

    debug!(rows = rows.len(), "Import sheet read");
    Ok(rows)
}

/// Integer progress over a known number of steps.
///
/// [`ProgressTracker::advance`] yields a percentage only when it differs from
/// the last one reported, so callers can edit a progress message sparingly.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    last_reported: Option<u8>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            last_reported: None,
        }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = self.processed.min(self.total) * 100 / self.total;
        percent as u8
    }

    /// Count one more processed step; `Some(percent)` when the integer percentage changed
    pub fn advance(&mut self) -> Option<u8> {
        self.processed += 1;
        let percent = self.percent();
        if self.last_reported == Some(percent) {
            return None;
        }
        self.last_reported = Some(percent);
        Some(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extension() {
        assert!(is_supported_file("categories.xlsx"));
        assert!(is_supported_file("CATEGORIES.XLSX"));
        assert!(!is_supported_file("categories.xls"));
        assert!(!is_supported_file("categories.csv"));
        assert!(!is_supported_file("xlsx"));
    }

    #[test]
    fn test_export_cell_text() {
        assert_eq!(export_cell_text(0, "Cars"), "Cars");
        assert_eq!(export_cell_text(1, "Porsche"), "  └─ Porsche");
        assert_eq!(export_cell_text(2, "911"), "    └─ 911");
    }

    #[test]
    fn test_progress_reports_only_changes() {
        let mut progress = ProgressTracker::new(3);
        assert_eq!(progress.advance(), Some(33));
        assert_eq!(progress.advance(), Some(66));
        assert_eq!(progress.advance(), Some(100));
    }

    #[test]
    fn test_progress_skips_repeated_percentages() {
        let mut progress = ProgressTracker::new(300);
        let reported: Vec<u8> = (0..300).filter_map(|_| progress.advance()).collect();
        assert_eq!(reported.len(), 101);
        assert_eq!(reported.first(), Some(&0));
        assert_eq!(reported.last(), Some(&100));
    }

    #[test]
    fn test_progress_empty() {
        assert_eq!(ProgressTracker::new(0).percent(), 100);
    }
}
