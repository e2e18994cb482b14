use std::path::PathBuf;

use tablift_core::extraction::pdftotext::PdftotextExtractor;
use tablift_core::orchestrator::Orchestrator;

use crate::error::CliError;
use crate::server::{self, ServerConfig};

pub fn run(config: ServerConfig, pdftotext: PathBuf) -> Result<(), CliError> {
    if !PdftotextExtractor::with_program(&pdftotext).is_available() {
        tracing::warn!(
            program = %pdftotext.display(),
            "pdftotext not found, every upload will yield an empty workbook"
        );
    }

    let orchestrator = Orchestrator::with_pdftotext(pdftotext);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(config, orchestrator))
}
