pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{paths::StaticPaths, toml_config::TomlConfig};

pub use crate::core::{
    batch::BatchEngine, extractor::SpreadsheetExtractor, filler::PdfFormFiller,
    selections::FormSelections,
};
pub use crate::domain::model::{BatchOutcome, BatchReport, Record, RecordFailure, RecordField};
pub use crate::domain::ports::{BatchObserver, BatchPhase, DocumentFiller, PathProvider};
pub use crate::utils::error::{FormsError, Result};
