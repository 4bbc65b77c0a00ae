use crate::config::paths::default_template_path;
use crate::domain::ports::PathProvider;
use crate::utils::encoding::resolve_encoding;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::Parser;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "shipping-forms")]
#[command(about = "Fill one PDF shipping form per spreadsheet row")]
pub struct CliConfig {
    /// Spreadsheet with one shipment per row, header in the first row
    #[arg(short, long)]
    pub input: PathBuf,

    /// Existing directory that receives the PDF files
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Form template; defaults to Template.pdf next to the executable
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Encoding of CSV input, as a label (windows-1250) or code page (1250)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Show what would be generated without writing PDFs
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn csv_encoding(&self) -> Result<&'static Encoding> {
        match &self.encoding {
            Some(label) => resolve_encoding(label),
            None => Ok(encoding_rs::UTF_8),
        }
    }
}

impl PathProvider for CliConfig {
    fn template_path(&self) -> PathBuf {
        self.template.clone().unwrap_or_else(default_template_path)
    }

    fn input_path(&self) -> PathBuf {
        self.input.clone()
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }
}

/// Template, input and output directory are left to the batch preconditions,
/// which report each one with its own error.
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(report) = &self.report {
            validate_path("report", report)?;
        }
        self.csv_encoding()?;
        Ok(())
    }
}
