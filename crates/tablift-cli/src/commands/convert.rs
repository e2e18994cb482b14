use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tablift_core::model::{FlavorHint, PdfBytesSource};
use tablift_core::orchestrator::Orchestrator;
use tablift_core::selector::PageSelector;

use crate::error::CliError;

pub fn run(
    pdf_file: PathBuf,
    pages: &str,
    flavor: &str,
    out: Option<PathBuf>,
    pdftotext: PathBuf,
) -> Result<(), CliError> {
    let source = PdfBytesSource::new(std::fs::read(&pdf_file)?);
    let orchestrator = Orchestrator::with_pdftotext(pdftotext);
    let conversion = tablift_core::convert_pdf(
        &source,
        &PageSelector::new(pages),
        &FlavorHint::from_str_loose(flavor),
        &orchestrator,
    )?;

    let out = out.unwrap_or_else(|| default_output(&pdf_file));
    std::fs::write(&out, &conversion.workbook)?;

    let extraction = &conversion.extraction;
    eprintln!(
        "Extracted {} table(s) [{}], written to {}",
        extraction.tables.len(),
        extraction.status().as_str(),
        out.display()
    );
    for attempt in &extraction.attempts {
        if let Some(ref error) = attempt.error {
            eprintln!("  {} failed: {}", attempt.strategy, error);
        }
    }

    Ok(())
}

/// `report.pdf` becomes `report.pdf.xlsx` in the same directory.
fn default_output(pdf_file: &Path) -> PathBuf {
    let mut name = pdf_file
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".xlsx");
    pdf_file.with_file_name(name)
}
