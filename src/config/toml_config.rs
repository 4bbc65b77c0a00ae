use crate::config::paths::default_template_path;
use crate::core::selections::FormSelections;
use crate::domain::ports::PathProvider;
use crate::utils::encoding::resolve_encoding;
use crate::utils::error::{FormsError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_required_field, Validate,
};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    pub input: Option<InputConfig>,
    pub form: Option<FormConfig>,
    pub report: Option<ReportConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub template: Option<String>,
    pub input: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Replaces the built-in group selections when present.
    pub selections: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub path: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// Loads and parses a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FormsError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FormsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FormsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Checks settings only. The `[paths]` entries are reported by the batch
    /// preconditions, each with its own error.
    pub fn validate_config(&self) -> Result<()> {
        self.csv_encoding()?;

        if let Some(report) = self.report_path() {
            validate_path("report.path", &report)?;
        }

        if let Some(form) = &self.form {
            let selections = validate_required_field("form.selections", &form.selections)?;
            for (field, option) in selections {
                validate_non_empty_string("form.selections", field)?;
                validate_non_empty_string(&format!("form.selections.{}", field), option)?;
            }
        }

        Ok(())
    }

    pub fn csv_encoding(&self) -> Result<&'static Encoding> {
        match self.input.as_ref().and_then(|i| i.encoding.as_deref()) {
            Some(label) => resolve_encoding(label),
            None => Ok(encoding_rs::UTF_8),
        }
    }

    pub fn selections(&self) -> FormSelections {
        self.form
            .as_ref()
            .and_then(|f| f.selections.clone())
            .map(FormSelections::from)
            .unwrap_or_default()
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.report
            .as_ref()
            .and_then(|r| r.path.as_ref())
            .map(PathBuf::from)
    }

    pub fn dry_run(&self) -> bool {
        self.report
            .as_ref()
            .and_then(|r| r.dry_run)
            .unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl PathProvider for TomlConfig {
    fn template_path(&self) -> PathBuf {
        self.paths
            .template
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_template_path)
    }

    fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.input)
    }

    fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.output_dir)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
