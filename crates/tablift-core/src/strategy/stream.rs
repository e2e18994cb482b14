//! Whitespace-inference table detection over positioned words.
//!
//! Words are grouped into text rows, rows into runs of cells separated by wide
//! horizontal gaps, and consecutive multi-cell rows into tables whose columns
//! are the merged horizontal spans of their cells.

use crate::extraction::{PageContent, Word};
use crate::strategy::{append_text, merge_spans, span_index};

/// Words whose vertical centers are within this fraction of the word height share a row.
const ROW_TOLERANCE: f32 = 0.5;

/// A horizontal gap wider than this multiple of the word height starts a new cell.
const CELL_GAP_FACTOR: f32 = 1.0;

/// A table needs a header row plus at least one more row.
const MIN_TABLE_ROWS: usize = 2;

/// Floor on run width; pdftotext emits zero-width boxes for zero-advance glyphs.
const MIN_RUN_WIDTH: f32 = 1.0;

#[derive(Debug, Clone)]
struct Run {
    x_min: f32,
    x_max: f32,
    text: String,
}

impl Run {
    /// Half-open horizontal span, never empty.
    fn span(&self) -> (f32, f32) {
        (self.x_min, self.x_max.max(self.x_min + MIN_RUN_WIDTH))
    }

    fn center(&self) -> f32 {
        let (start, end) = self.span();
        (start + end) / 2.0
    }
}

/// Find tables on a page and return their raw cell grids, top to bottom.
pub fn find_tables(page: &PageContent) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut region: Vec<Vec<Run>> = Vec::new();

    for row in cluster_rows(&page.words) {
        let runs = split_runs(&row);
        if runs.len() >= 2 {
            region.push(runs);
        } else {
            close_region(&mut region, &mut tables);
        }
    }
    close_region(&mut region, &mut tables);

    tables
}

/// Group words into text rows, top to bottom, each row sorted left to right.
pub(crate) fn cluster_rows(words: &[Word]) -> Vec<Vec<&Word>> {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| a.bbox.center_y().total_cmp(&b.bbox.center_y()));

    let mut rows: Vec<Vec<&Word>> = Vec::new();
    let mut anchor = f32::NEG_INFINITY;
    for word in sorted {
        let tolerance = word.bbox.height().max(1.0) * ROW_TOLERANCE;
        match rows.last_mut() {
            Some(row) if word.bbox.center_y() - anchor <= tolerance => row.push(word),
            _ => {
                anchor = word.bbox.center_y();
                rows.push(vec![word]);
            }
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.bbox.x_min.total_cmp(&b.bbox.x_min));
    }
    rows
}

fn split_runs(row: &[&Word]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for word in row {
        let gap_limit = word.bbox.height().max(1.0) * CELL_GAP_FACTOR;
        match runs.last_mut() {
            Some(run) if word.bbox.x_min - run.x_max <= gap_limit => {
                append_text(&mut run.text, &word.text);
                run.x_max = run.x_max.max(word.bbox.x_max);
            }
            _ => runs.push(Run {
                x_min: word.bbox.x_min,
                x_max: word.bbox.x_max,
                text: word.text.clone(),
            }),
        }
    }
    runs
}

fn close_region(region: &mut Vec<Vec<Run>>, tables: &mut Vec<Vec<Vec<String>>>) {
    let rows = std::mem::take(region);
    if rows.len() < MIN_TABLE_ROWS {
        return;
    }

    let columns = merge_spans(rows.iter().flatten().map(Run::span).collect());
    if columns.len() < 2 {
        return;
    }

    let grid = rows
        .into_iter()
        .map(|runs| {
            let mut cells = vec![String::new(); columns.len()];
            for run in runs {
                if let Some(col) = span_index(&columns, run.center()) {
                    append_text(&mut cells[col], &run.text);
                }
            }
            cells
        })
        .collect();
    tables.push(grid);
}
