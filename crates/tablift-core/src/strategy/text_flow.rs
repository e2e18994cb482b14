use std::sync::Arc;

use crate::error::TabliftError;
use crate::extraction::{PageContent, PdfExtractor};
use crate::model::{PdfBytesSource, TabularResult};
use crate::selector::PageSelector;
use crate::strategy::{append_text, merge_spans, span_index, TableExtractionStrategy};

/// Minimum run of spaces separating two cells on a layout line.
const CELL_GAP: usize = 2;

/// A table needs a header line plus at least one more line.
const MIN_TABLE_LINES: usize = 2;

/// Reconstruct tables from layout-preserving text.
///
/// pdftotext -layout keeps column alignment using spaces, so cells are runs
/// of text separated by wide gaps and columns are the character spans those
/// runs occupy across consecutive lines.
///
/// Every page of the document is scanned. The page selector only narrows
/// grid extraction, so a selector the grid strategy rejects still leaves
/// this fallback with the whole document.
pub struct TextFlowStrategy {
    extractor: Arc<dyn PdfExtractor>,
}

impl TextFlowStrategy {
    pub fn new(extractor: Arc<dyn PdfExtractor>) -> Self {
        TextFlowStrategy { extractor }
    }
}

impl TableExtractionStrategy for TextFlowStrategy {
    fn extract(
        &self,
        source: &PdfBytesSource,
        _pages: &PageSelector,
    ) -> Result<Vec<TabularResult>, TabliftError> {
        let content = self.extractor.extract_pages(source.as_bytes())?;

        let mut tables = Vec::new();
        for page in &content {
            for region in find_table_regions(page) {
                let grid = region_grid(page, &region);
                tables.extend(TabularResult::from_grid(page.page_number, grid));
            }
        }

        tracing::debug!(
            backend = self.extractor.backend_name(),
            tables = tables.len(),
            "text-flow extraction finished"
        );
        Ok(tables)
    }

    fn name(&self) -> &str {
        "text-flow"
    }
}

/// A run of text on a layout line. `start..end` are character columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCell {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Split a layout line into cells separated by two or more spaces.
pub fn split_cells(line: &str) -> Vec<LayoutCell> {
    let mut cells = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut spaces = 0;

    for (col, ch) in line.chars().enumerate() {
        if ch.is_whitespace() {
            spaces += 1;
            if spaces >= CELL_GAP {
                if let Some((start, text)) = current.take() {
                    cells.push(finish_cell(start, &text));
                }
            } else if let Some((_, text)) = current.as_mut() {
                text.push(' ');
            }
            continue;
        }

        spaces = 0;
        match current.as_mut() {
            Some((_, text)) => text.push(ch),
            None => current = Some((col, ch.to_string())),
        }
    }

    if let Some((start, text)) = current {
        cells.push(finish_cell(start, &text));
    }

    cells
}

fn finish_cell(start: usize, text: &str) -> LayoutCell {
    let text = text.trim_end();
    LayoutCell {
        start,
        end: start + text.chars().count(),
        text: text.to_string(),
    }
}

/// Line range `[start_line, end_line)` of one table on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegion {
    pub page_number: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// Find the table regions within a page: maximal runs of lines that each
/// split into at least two cells.
pub fn find_table_regions(page: &PageContent) -> Vec<TableRegion> {
    let mut regions = Vec::new();
    let mut table_start: Option<usize> = None;

    for (i, line) in page.lines.iter().enumerate() {
        let is_table_line = split_cells(line).len() >= 2;
        match (is_table_line, table_start) {
            (true, None) => table_start = Some(i),
            (false, Some(start)) => {
                push_region(&mut regions, page.page_number, start, i);
                table_start = None;
            }
            _ => {}
        }
    }

    // Reached end of page while in a table
    if let Some(start) = table_start {
        push_region(&mut regions, page.page_number, start, page.lines.len());
    }

    regions
}

fn push_region(regions: &mut Vec<TableRegion>, page_number: usize, start: usize, end: usize) {
    if end - start >= MIN_TABLE_LINES {
        regions.push(TableRegion {
            page_number,
            start_line: start,
            end_line: end,
        });
    }
}

/// Lay the cells of a region out on the columns they share.
pub fn region_grid(page: &PageContent, region: &TableRegion) -> Vec<Vec<String>> {
    let lines: Vec<Vec<LayoutCell>> = page.lines[region.start_line..region.end_line]
        .iter()
        .map(|line| split_cells(line))
        .collect();
    let columns = merge_spans(
        lines
            .iter()
            .flatten()
            .map(|cell| (cell.start, cell.end))
            .collect(),
    );

    lines
        .into_iter()
        .map(|cells| {
            let mut row = vec![String::new(); columns.len()];
            for cell in cells {
                if let Some(col) = span_index(&columns, cell.start) {
                    append_text(&mut row[col], &cell.text);
                }
            }
            row
        })
        .collect()
}
