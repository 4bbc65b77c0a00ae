use crate::domain::ports::PathProvider;
use std::path::PathBuf;

/// Template looked up next to the executable when none is given.
pub const TEMPLATE_FILE_NAME: &str = "Template.pdf";

pub fn default_template_path() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(TEMPLATE_FILE_NAME)
}

/// Paths fixed up front, for library callers and tests.
#[derive(Debug, Clone)]
pub struct StaticPaths {
    pub template: PathBuf,
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

impl StaticPaths {
    pub fn new(
        template: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            input: input.into(),
            output_dir: output_dir.into(),
        }
    }
}

impl PathProvider for StaticPaths {
    fn template_path(&self) -> PathBuf {
        self.template.clone()
    }

    fn input_path(&self) -> PathBuf {
        self.input.clone()
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }
}
