//! Configuration for the template engine

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Directory containing template files
    pub template_dir: PathBuf,

    /// Template file extension (default: ".hbs")
    pub template_extension: String,

    /// Reload templates from disk before every render
    pub dev_mode: bool,

    /// Error on missing variables instead of rendering them empty
    pub strict_mode: bool,
}

impl TemplateConfig {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            template_extension: ".hbs".to_string(),
            dev_mode: false,
            strict_mode: false,
        }
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.template_extension = ext.into();
        self
    }

    pub fn with_dev_mode(mut self, enable: bool) -> Self {
        self.dev_mode = enable;
        self
    }

    pub fn with_strict_mode(mut self, enable: bool) -> Self {
        self.strict_mode = enable;
        self
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::new("templates")
    }
}
