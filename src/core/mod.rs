pub mod acroform;
pub mod appearance;
pub mod batch;
pub mod extractor;
pub mod filler;
pub mod flatten;
pub mod selections;

pub use crate::domain::model::{BatchReport, Record};
pub use crate::domain::ports::{BatchObserver, DocumentFiller, PathProvider};
pub use crate::utils::error::Result;
