use std::sync::Arc;

use crate::error::TabliftError;
use crate::extraction::{PdfExtractor, RulingExtractor, Segment};
use crate::model::{GridMode, PdfBytesSource, TabularResult};
use crate::selector::PageSelector;
use crate::strategy::{lattice, select_pages, stream, TableExtractionStrategy};

/// Grid-based extraction, either from ruling lines or from whitespace alignment.
pub struct GridStrategy {
    mode: GridMode,
    extractor: Arc<dyn PdfExtractor>,
    rulings: Arc<dyn RulingExtractor>,
}

impl GridStrategy {
    pub fn new(
        mode: GridMode,
        extractor: Arc<dyn PdfExtractor>,
        rulings: Arc<dyn RulingExtractor>,
    ) -> Self {
        GridStrategy {
            mode,
            extractor,
            rulings,
        }
    }
}

impl TableExtractionStrategy for GridStrategy {
    fn extract(
        &self,
        source: &PdfBytesSource,
        pages: &PageSelector,
    ) -> Result<Vec<TabularResult>, TabliftError> {
        let content = self.extractor.extract_pages(source.as_bytes())?;
        let selected = select_pages(&content, pages)?;

        let mut tables = Vec::new();
        match self.mode {
            GridMode::Ruled => {
                let rulings = self.rulings.extract_rulings(source.as_bytes())?;
                for page in selected {
                    let segments: &[Segment] = rulings
                        .iter()
                        .find(|r| r.page_number == page.page_number)
                        .map(|r| r.segments.as_slice())
                        .unwrap_or(&[]);
                    for grid in lattice::find_tables(page, segments) {
                        tables.extend(TabularResult::from_grid(page.page_number, grid));
                    }
                }
            }
            GridMode::Inferred => {
                for page in selected {
                    for grid in stream::find_tables(page) {
                        tables.extend(TabularResult::from_grid(page.page_number, grid));
                    }
                }
            }
        }

        tracing::debug!(
            strategy = self.name(),
            backend = self.extractor.backend_name(),
            tables = tables.len(),
            "grid extraction finished"
        );
        Ok(tables)
    }

    fn name(&self) -> &str {
        match self.mode {
            GridMode::Ruled => "grid-ruled",
            GridMode::Inferred => "grid-inferred",
        }
    }
}
