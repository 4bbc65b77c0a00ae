use std::path::PathBuf;
use thiserror::Error;

/// Low-level failures while manipulating a PDF document.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF structure error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("required form field '{0}' not found in template")]
    MissingField(String),

    #[error("malformed form structure: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum FormsError {
    #[error("PDF template not found: {}", path.display())]
    MissingTemplate { path: PathBuf },

    #[error("input spreadsheet does not exist: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("output directory does not exist: {}", path.display())]
    MissingOutputDir { path: PathBuf },

    #[error("cannot read spreadsheet {}: {message}", path.display())]
    ReadError { path: PathBuf, message: String },

    #[error("error while filling PDF {}: {source}", path.display())]
    FillError {
        path: PathBuf,
        #[source]
        source: PdfError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Template,
    Document,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl FormsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FormsError::MissingTemplate { .. } => ErrorCategory::Template,
            FormsError::MissingInput { .. }
            | FormsError::MissingOutputDir { .. }
            | FormsError::ReadError { .. } => ErrorCategory::Input,
            FormsError::FillError { .. } => ErrorCategory::Document,
            FormsError::ConfigError { .. }
            | FormsError::MissingConfigError { .. }
            | FormsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            FormsError::IoError(_) | FormsError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Document => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Template | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FormsError::MissingTemplate { path } => format!(
                "PDF template was not found in the program directory ({})",
                path.display()
            ),
            FormsError::MissingInput { path } => {
                format!("The given Excel file does not exist ({})", path.display())
            }
            FormsError::MissingOutputDir { path } => {
                format!("The given directory does not exist ({})", path.display())
            }
            FormsError::ReadError { path, message } => {
                format!("Could not read {}: {}", path.display(), message)
            }
            FormsError::FillError { source, .. } => {
                format!("Error while filling PDF: {}", source)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FormsError::MissingTemplate { .. } => {
                "Place Template.pdf next to the executable or pass --template"
            }
            FormsError::MissingInput { .. } => "Check the path given with --input",
            FormsError::MissingOutputDir { .. } => {
                "Create the output directory first or choose an existing one"
            }
            FormsError::ReadError { .. } => {
                "Make sure the file is a .xls, .xlsx, .xlsb, .ods or .csv spreadsheet"
            }
            FormsError::FillError { .. } => {
                "Check that the template contains the fields Group1 to Group5"
            }
            FormsError::ConfigError { .. }
            | FormsError::MissingConfigError { .. }
            | FormsError::InvalidConfigValueError { .. } => "Review the configuration values",
            FormsError::IoError(_) | FormsError::SerializationError(_) => {
                "Check file permissions and free disk space"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FormsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_distinct() {
        let template = FormsError::MissingTemplate { path: "Template.pdf".into() };
        let input = FormsError::MissingInput { path: "data.xlsx".into() };
        let output = FormsError::MissingOutputDir { path: "out".into() };

        assert_ne!(template.user_friendly_message(), input.user_friendly_message());
        assert_ne!(input.user_friendly_message(), output.user_friendly_message());
        assert_eq!(template.category(), ErrorCategory::Template);
        assert_eq!(output.exit_code(), 1);
    }

    #[test]
    fn test_fill_error_keeps_cause() {
        let err = FormsError::FillError {
            path: "out/1 Smith.pdf".into(),
            source: PdfError::MissingField("Group3".to_string()),
        };

        assert!(err.to_string().starts_with("error while filling PDF"));
        assert!(err.to_string().contains("Group3"));
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.to_string().contains("Group3"));
    }
}
