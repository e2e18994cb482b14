pub mod error;
pub mod extraction;
pub mod model;
pub mod orchestrator;
pub mod selector;
pub mod strategy;
pub mod workbook;

use error::TabliftError;
use model::{FlavorHint, PdfBytesSource};
use orchestrator::{Extraction, Orchestrator};
use selector::PageSelector;

/// MIME type of the produced workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A finished conversion: what was extracted and the serialized workbook.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub extraction: Extraction,
    pub workbook: Vec<u8>,
}

/// Main API entry point: extract the tables of a PDF into an xlsx workbook.
///
/// Extraction itself never fails; a document without readable tables
/// produces a placeholder workbook. Only serialization can return an error.
pub fn convert_pdf(
    source: &PdfBytesSource,
    pages: &PageSelector,
    flavor: &FlavorHint,
    orchestrator: &Orchestrator,
) -> Result<Conversion, TabliftError> {
    let extraction = orchestrator.run(source, pages, flavor);
    let workbook = workbook::write_workbook(&extraction.tables)?;

    tracing::debug!(
        tables = extraction.tables.len(),
        status = extraction.status().as_str(),
        bytes = workbook.len(),
        "workbook written"
    );

    Ok(Conversion {
        extraction,
        workbook,
    })
}
