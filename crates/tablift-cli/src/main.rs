mod commands;
mod error;
mod logging;
mod output;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use server::ServerConfig;

#[derive(Parser)]
#[command(
    name = "tablift",
    version,
    about = "Extract tables from PDF documents into xlsx workbooks"
)]
struct Cli {
    /// pdftotext binary used for text extraction
    #[arg(
        long,
        global = true,
        env = "TABLIFT_PDFTOTEXT",
        default_value = "pdftotext",
        value_name = "PATH"
    )]
    pdftotext: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP upload service
    Serve(ServerConfig),
    /// Convert a PDF into an xlsx workbook, one sheet per table
    Convert {
        /// Path to the PDF file
        pdf_file: PathBuf,

        /// Pages to extract: "all" or a list like "1,3-5,7-end"
        #[arg(long, default_value = "all")]
        pages: String,

        /// Extraction flavor: auto, grid-ruled, grid-inferred or text-flow
        #[arg(long, default_value = "auto")]
        flavor: String,

        /// Where to write the workbook (default: <PDF file name>.xlsx)
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Show the tables found in a PDF without writing a workbook
    Inspect {
        /// Path to the PDF file
        pdf_file: PathBuf,

        /// Pages to extract: "all" or a list like "1,3-5,7-end"
        #[arg(long, default_value = "all")]
        pages: String,

        /// Extraction flavor: auto, grid-ruled, grid-inferred or text-flow
        #[arg(long, default_value = "auto")]
        flavor: String,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(config) => {
            logging::setup_logging("info");
            commands::serve::run(config, cli.pdftotext)
        }
        Commands::Convert {
            pdf_file,
            pages,
            flavor,
            out,
        } => {
            logging::setup_logging("warn");
            commands::convert::run(pdf_file, &pages, &flavor, out, cli.pdftotext)
        }
        Commands::Inspect {
            pdf_file,
            pages,
            flavor,
            output,
        } => {
            logging::setup_logging("warn");
            commands::inspect::run(pdf_file, &pages, &flavor, &output, cli.pdftotext)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
