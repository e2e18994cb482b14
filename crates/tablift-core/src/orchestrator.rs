use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::extraction::pdftotext::PdftotextExtractor;
use crate::extraction::ruling::LopdfRulingExtractor;
use crate::extraction::{PdfExtractor, RulingExtractor};
use crate::model::{ExtractionOutcome, FlavorHint, GridMode, PdfBytesSource, TabularResult};
use crate::selector::PageSelector;
use crate::strategy::grid::GridStrategy;
use crate::strategy::text_flow::TextFlowStrategy;
use crate::strategy::TableExtractionStrategy;

/// Record of one strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub table_count: usize,
    /// Set when the strategy could not read the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall result of an extraction, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionStatus {
    Tables,
    NoTables,
    ParseError,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Tables => "tables",
            ExtractionStatus::NoTables => "no-tables",
            ExtractionStatus::ParseError => "parse-error",
        }
    }
}

/// Tables found for one document plus how they were found.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub flavor: String,
    pub pages: String,
    pub attempts: Vec<StrategyAttempt>,
    pub tables: Vec<TabularResult>,
}

impl Extraction {
    /// `ParseError` only when every strategy that ran failed to read the file.
    pub fn status(&self) -> ExtractionStatus {
        if !self.tables.is_empty() {
            ExtractionStatus::Tables
        } else if !self.attempts.is_empty() && self.attempts.iter().all(|a| a.error.is_some()) {
            ExtractionStatus::ParseError
        } else {
            ExtractionStatus::NoTables
        }
    }
}

/// Chooses strategies from the flavor hint and applies the fallback rule.
///
/// Grid extraction runs first unless the flavor asks for text flow; text flow
/// runs when grid extraction found nothing or when it was asked for. Each
/// strategy runs at most once and failures never escape.
pub struct Orchestrator {
    grid_ruled: Box<dyn TableExtractionStrategy>,
    grid_inferred: Box<dyn TableExtractionStrategy>,
    text_flow: Box<dyn TableExtractionStrategy>,
}

impl Orchestrator {
    pub fn new(
        grid_ruled: Box<dyn TableExtractionStrategy>,
        grid_inferred: Box<dyn TableExtractionStrategy>,
        text_flow: Box<dyn TableExtractionStrategy>,
    ) -> Self {
        Orchestrator {
            grid_ruled,
            grid_inferred,
            text_flow,
        }
    }

    /// Wire the strategies to the given backends.
    pub fn with_backends(
        extractor: Arc<dyn PdfExtractor>,
        rulings: Arc<dyn RulingExtractor>,
    ) -> Self {
        Orchestrator::new(
            Box::new(GridStrategy::new(
                GridMode::Ruled,
                extractor.clone(),
                rulings.clone(),
            )),
            Box::new(GridStrategy::new(
                GridMode::Inferred,
                extractor.clone(),
                rulings,
            )),
            Box::new(TextFlowStrategy::new(extractor)),
        )
    }

    /// Production wiring: pdftotext at `program` plus lopdf rulings.
    pub fn with_pdftotext(program: impl Into<PathBuf>) -> Self {
        Orchestrator::with_backends(
            Arc::new(PdftotextExtractor::with_program(program)),
            Arc::new(LopdfRulingExtractor::new()),
        )
    }

    pub fn run(
        &self,
        source: &PdfBytesSource,
        pages: &PageSelector,
        flavor: &FlavorHint,
    ) -> Extraction {
        let mut attempts = Vec::new();
        let mut tables = Vec::new();

        if let Some(mode) = flavor.grid_mode() {
            let strategy = match mode {
                GridMode::Ruled => self.grid_ruled.as_ref(),
                GridMode::Inferred => self.grid_inferred.as_ref(),
            };
            let outcome = attempt(strategy, source, pages);
            attempts.push(summarize(strategy, &outcome));
            tables.extend(outcome.into_tables());
        }

        if tables.is_empty() || flavor.forces_text_flow() {
            if !attempts.is_empty() {
                tracing::debug!(flavor = %flavor, "grid extraction found no tables, falling back to text flow");
            }
            let strategy = self.text_flow.as_ref();
            let outcome = attempt(strategy, source, pages);
            attempts.push(summarize(strategy, &outcome));
            tables.extend(outcome.into_tables());
        }

        Extraction {
            flavor: flavor.to_string(),
            pages: pages.as_str().to_string(),
            attempts,
            tables,
        }
    }
}

/// Run one strategy, turning errors and panics into `ParseError`.
fn attempt(
    strategy: &dyn TableExtractionStrategy,
    source: &PdfBytesSource,
    pages: &PageSelector,
) -> ExtractionOutcome {
    tracing::debug!(strategy = strategy.name(), pages = pages.as_str(), "running table extraction");
    let result = catch_unwind(AssertUnwindSafe(|| strategy.extract(source, pages)));
    match result {
        Ok(Ok(tables)) => ExtractionOutcome::from_tables(tables),
        Ok(Err(e)) => {
            tracing::warn!(strategy = strategy.name(), error = %e, "table extraction failed");
            ExtractionOutcome::ParseError(e.to_string())
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "strategy panicked".to_string());
            tracing::warn!(strategy = strategy.name(), panic = %message, "table extraction panicked");
            ExtractionOutcome::ParseError(message)
        }
    }
}

fn summarize(strategy: &dyn TableExtractionStrategy, outcome: &ExtractionOutcome) -> StrategyAttempt {
    let (table_count, error) = match outcome {
        ExtractionOutcome::Tables(tables) => (tables.len(), None),
        ExtractionOutcome::NoTables => (0, None),
        ExtractionOutcome::ParseError(message) => (0, Some(message.clone())),
    };
    StrategyAttempt {
        strategy: strategy.name().to_string(),
        table_count,
        error,
    }
}
