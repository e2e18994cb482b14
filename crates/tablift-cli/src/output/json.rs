use tablift_core::orchestrator::Extraction;

use crate::error::CliError;

pub fn print(extraction: &Extraction) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(extraction)?;
    println!("{json}");
    Ok(())
}
