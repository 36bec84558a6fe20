use async_trait::async_trait;
use inertia_cms::host::{TemplateEngine, TemplateError, TemplateMode};
use inertia_cms::{InertiaProps, RenderContext};
use regex::{Captures, Regex};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A tiny file system template engine, understanding:
///
/// * `{% page 'Component' %}`
/// * `{% prop 'name' <json> %}`
/// * `{% set name = <json> %}`
/// * `{% fail <status> %}`
/// * `{{ variable }}`
pub struct FsEngine {
    root: PathBuf,
}

impl FsEngine {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

#[async_trait(?Send)]
impl TemplateEngine for FsEngine {
    fn resolve_template(&self, name: &str, mode: TemplateMode) -> Option<PathBuf> {
        let root = match mode {
            TemplateMode::Site => self.root.clone(),
            TemplateMode::ControlPanel => self.root.join("_cp"),
        };

        [
            root.join(name),
            root.join(format!("{}.twig", name)),
            root.join(format!("{}.html", name)),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    fn templates_path(&self) -> PathBuf {
        self.root.clone()
    }

    async fn render_string(
        &self,
        source: &str,
        variables: &InertiaProps,
        ctx: &mut RenderContext,
    ) -> Result<String, TemplateError> {
        let fail = Regex::new(r"\{%\s*fail\s+(\d+)\s*%\}").unwrap();
        if let Some(caps) = fail.captures(source) {
            return Err(TemplateError::new("Raised by template")
                .with_line(1)
                .with_status(caps[1].parse().unwrap()));
        }

        let page = Regex::new(r"\{%\s*page\s+'([^']*)'\s*%\}").unwrap();
        for caps in page.captures_iter(source) {
            ctx.page(&caps[1]);
        }
        let output = page.replace_all(source, "").into_owned();

        let set = Regex::new(r"\{%\s*set\s+(\w+)\s*=\s*(.+?)\s*%\}").unwrap();
        for caps in set.captures_iter(&output) {
            ctx.capture(&caps[1], serde_json::from_str(&caps[2]).unwrap());
        }
        let output = set.replace_all(&output, "").into_owned();

        let prop = Regex::new(r"\{%\s*prop\s+'(\w+)'\s+(.+?)\s*%\}").unwrap();
        let output = prop
            .replace_all(&output, |caps: &Captures| {
                let value: Value = serde_json::from_str(&caps[2]).unwrap();
                ctx.prop(&caps[1], &value).unwrap()
            })
            .into_owned();

        let var = Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap();
        let output = var.replace_all(&output, |caps: &Captures| match variables.get(&caps[1]) {
            Some(Value::String(value)) => value.clone(),
            Some(value) => value.to_string(),
            None => String::new(),
        });

        Ok(output.into_owned())
    }
}

/// Writes `templates` (name, source) into a fresh temporary directory.
pub fn templates_dir(templates: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();

    for (name, source) in templates {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }

    dir
}

pub const ROOT_VIEW: &str = r#"<!doctype html>
<html lang="en">
<head>
    <meta name="csrf-token" content="{{ csrfToken }}">
    <title>{{ siteTitle }}</title>
</head>
<body>
    <div id="app" data-page='{{ page }}'></div>
</body>
</html>"#;
