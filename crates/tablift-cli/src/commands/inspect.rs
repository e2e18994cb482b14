use std::path::PathBuf;

use tablift_core::model::{FlavorHint, PdfBytesSource};
use tablift_core::orchestrator::Orchestrator;
use tablift_core::selector::PageSelector;

use crate::error::CliError;
use crate::output;

pub fn run(
    pdf_file: PathBuf,
    pages: &str,
    flavor: &str,
    output_format: &str,
    pdftotext: PathBuf,
) -> Result<(), CliError> {
    let source = PdfBytesSource::new(std::fs::read(&pdf_file)?);
    let orchestrator = Orchestrator::with_pdftotext(pdftotext);
    let extraction = orchestrator.run(
        &source,
        &PageSelector::new(pages),
        &FlavorHint::from_str_loose(flavor),
    );

    match output_format {
        "json" => output::json::print(&extraction)?,
        _ => print!("{}", output::table::format_extraction(&extraction)),
    }

    Ok(())
}
