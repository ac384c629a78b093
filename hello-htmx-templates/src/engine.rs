//! Handlebars template engine wrapper

use crate::{Result, config::TemplateConfig, error::TemplateError};
use handlebars::Handlebars;
use parking_lot::RwLock;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Template engine over a directory of Handlebars files
///
/// Templates are named by their path relative to the template directory,
/// without extension, so `todos/item.hbs` is rendered as `"todos/item"`.
/// Every template is also usable as a partial under the same name.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<RwLock<Handlebars<'static>>>,
    config: TemplateConfig,
}

impl TemplateEngine {
    pub fn new(config: TemplateConfig) -> Result<Self> {
        let handlebars = Self::load_templates(&config)?;

        Ok(Self {
            handlebars: Arc::new(RwLock::new(handlebars)),
            config,
        })
    }

    /// Build a fresh registry from the template directory
    fn load_templates(config: &TemplateConfig) -> Result<Handlebars<'static>> {
        if !config.template_dir.is_dir() {
            return Err(TemplateError::ConfigError(format!(
                "Template directory not found: {}",
                config.template_dir.display()
            )));
        }

        let mut loaded = Vec::new();
        Self::collect_templates(config, &config.template_dir, &mut loaded)?;

        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(config.strict_mode);
        for (name, source) in loaded {
            handlebars.register_template_string(&name, source)?;
        }
        debug!(
            dir = %config.template_dir.display(),
            count = handlebars.get_templates().len(),
            "Templates loaded"
        );

        Ok(handlebars)
    }

    /// Read every template file under `dir`, recursively
    fn collect_templates(
        config: &TemplateConfig,
        dir: &Path,
        out: &mut Vec<(String, String)>,
    ) -> Result<()> {
        let extension = config.template_extension.trim_start_matches('.');

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                Self::collect_templates(config, &path, out)?;
            } else if path.extension().is_some_and(|ext| ext == extension) {
                let name = path
                    .strip_prefix(&config.template_dir)
                    .unwrap_or(&path)
                    .with_extension("")
                    .to_string_lossy()
                    .replace('\\', "/");

                out.push((name, fs::read_to_string(&path)?));
            }
        }

        Ok(())
    }

    /// Render a named template
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        if self.config.dev_mode {
            self.reload_templates()?;
        }

        let handlebars = self.handlebars.read();
        if !handlebars.has_template(template) {
            return Err(TemplateError::TemplateNotFound(template.to_string()));
        }

        Ok(handlebars.render(template, data)?)
    }

    /// Render a template string (not from file)
    pub fn render_template<T: Serialize>(&self, template_str: &str, data: &T) -> Result<String> {
        Ok(self.handlebars.read().render_template(template_str, data)?)
    }

    /// Register a template from string
    pub fn register_template(&self, name: &str, template: &str) -> Result<()> {
        Ok(self
            .handlebars
            .write()
            .register_template_string(name, template)?)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.read().has_template(name)
    }

    /// Registered template names, sorted
    pub fn get_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlebars
            .read()
            .get_templates()
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Reload all templates from disk
    ///
    /// The new set replaces the old one in a single swap. On error the
    /// previously loaded templates stay in place. Templates added with
    /// [`register_template`](Self::register_template) are dropped.
    pub fn reload_templates(&self) -> Result<()> {
        let fresh = Self::load_templates(&self.config)?;
        *self.handlebars.write() = fresh;
        Ok(())
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_templates() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("todos")).unwrap();

        fs::write(root.join("hello.hbs"), "<h1>Hello {{name}}!</h1>").unwrap();
        fs::write(root.join("item.hbs"), "<li>{{this}}</li>").unwrap();
        fs::write(
            root.join("list.hbs"),
            "<ul>{{#each items}}{{> item}}{{/each}}</ul>",
        )
        .unwrap();
        fs::write(root.join("todos/row.hbs"), "<tr>{{title}}</tr>").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        temp_dir
    }

    #[test]
    fn test_loads_templates_recursively() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        assert_eq!(engine.get_templates(), vec!["hello", "item", "list", "todos/row"]);
        assert_eq!(
            engine.render("todos/row", &json!({"title": "x"})).unwrap(),
            "<tr>x</tr>"
        );
    }

    #[test]
    fn test_render_template() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        let result = engine.render("hello", &json!({"name": "World"})).unwrap();
        assert_eq!(result, "<h1>Hello World!</h1>");
    }

    #[test]
    fn test_render_with_partial() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        let result = engine.render("list", &json!({"items": ["a", "b"]})).unwrap();
        assert_eq!(result, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_html_is_escaped() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        let result = engine
            .render("hello", &json!({"name": "<script>"}))
            .unwrap();
        assert_eq!(result, "<h1>Hello &lt;script&gt;!</h1>");
    }

    #[test]
    fn test_unknown_template() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        assert!(matches!(
            engine.render("missing", &json!({})),
            Err(TemplateError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = TemplateEngine::new(TemplateConfig::new(dir.path().join("nope")));
        assert!(matches!(result, Err(TemplateError::ConfigError(_))));
    }

    #[test]
    fn test_dev_mode_picks_up_changes() {
        let dir = create_test_templates();
        let engine =
            TemplateEngine::new(TemplateConfig::new(dir.path()).with_dev_mode(true)).unwrap();

        fs::write(dir.path().join("hello.hbs"), "<h2>Hi {{name}}</h2>").unwrap();
        let result = engine.render("hello", &json!({"name": "there"})).unwrap();
        assert_eq!(result, "<h2>Hi there</h2>");
    }

    #[test]
    fn test_dev_mode_concurrent_renders() {
        let dir = create_test_templates();
        for i in 0..40 {
            fs::write(dir.path().join(format!("t{}.hbs", i)), "<p>{{n}}</p>").unwrap();
        }
        let engine =
            TemplateEngine::new(TemplateConfig::new(dir.path()).with_dev_mode(true)).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    (0..200)
                        .filter(|_| engine.render("t0", &json!({"n": 1})).is_err())
                        .count()
                })
            })
            .collect();

        let failures: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(failures, 0);
    }

    #[test]
    fn test_failed_reload_keeps_previous_templates() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        fs::write(dir.path().join("broken.hbs"), "{{#if ok}}unclosed").unwrap();
        assert!(engine.reload_templates().is_err());

        assert_eq!(
            engine.render("hello", &json!({"name": "World"})).unwrap(),
            "<h1>Hello World!</h1>"
        );
        assert!(!engine.has_template("broken"));
    }

    #[test]
    fn test_strict_mode_rejects_missing_fields() {
        let dir = create_test_templates();
        let engine =
            TemplateEngine::new(TemplateConfig::new(dir.path()).with_strict_mode(true)).unwrap();

        assert!(matches!(
            engine.render("hello", &json!({})),
            Err(TemplateError::RenderError(_))
        ));
    }

    #[test]
    fn test_register_template() {
        let dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

        engine.register_template("custom", "<p>{{message}}</p>").unwrap();
        assert!(engine.has_template("custom"));
        assert_eq!(
            engine.render("custom", &json!({"message": "Hello"})).unwrap(),
            "<p>Hello</p>"
        );
    }
}
