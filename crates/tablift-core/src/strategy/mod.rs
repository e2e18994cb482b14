pub mod grid;
pub mod lattice;
pub mod stream;
pub mod text_flow;

use std::cmp::Ordering;

use crate::error::TabliftError;
use crate::extraction::PageContent;
use crate::model::{PdfBytesSource, TabularResult};
use crate::selector::PageSelector;

/// A way of finding tables in a PDF.
///
/// Implementations report failures as errors; deciding whether a failure
/// stops the request or just counts as "no tables" is the orchestrator's job.
pub trait TableExtractionStrategy: Send + Sync {
    /// Extract every table on the selected pages, in page order and then
    /// top-to-bottom order within a page.
    fn extract(
        &self,
        source: &PdfBytesSource,
        pages: &PageSelector,
    ) -> Result<Vec<TabularResult>, TabliftError>;

    /// Short identifier used in logs and extraction reports.
    fn name(&self) -> &str;
}

/// Keep the pages the selector asks for, in document order.
pub(crate) fn select_pages<'a>(
    pages: &'a [PageContent],
    selector: &PageSelector,
) -> Result<Vec<&'a PageContent>, TabliftError> {
    let wanted = selector.resolve(pages.len())?;
    Ok(pages
        .iter()
        .filter(|p| wanted.binary_search(&p.page_number).is_ok())
        .collect())
}

/// Merge overlapping half-open spans `[start, end)` into sorted, disjoint spans.
pub(crate) fn merge_spans<T: PartialOrd + Copy>(mut spans: Vec<(T, T)>) -> Vec<(T, T)> {
    spans.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut merged: Vec<(T, T)> = Vec::new();
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start < last.1 => {
                if end > last.1 {
                    last.1 = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Index of the span containing `pos`.
pub(crate) fn span_index<T: PartialOrd + Copy>(spans: &[(T, T)], pos: T) -> Option<usize> {
    spans.iter().position(|(start, end)| pos >= *start && pos < *end)
}

/// Append text to a cell, space-separated.
pub(crate) fn append_text(cell: &mut String, text: &str) {
    if !cell.is_empty() {
        cell.push(' ');
    }
    cell.push_str(text);
}
