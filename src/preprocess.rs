use crate::context::RenderContext;
use crate::error::InertiaError;
use crate::host::{TemplateEngine, TemplateMode};
use crate::utils::inertia_err_msg;
use regex::Regex;
use std::sync::LazyLock;

/// `{% pull('path') %}`, `{% pull 'path' %}`, and the same two forms of `inherit`.
static INCLUSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%\s*(?:pull|inherit)\b\s*(?:\(\s*([^)]+)\s*\)\s*|([^%]+))%\}")
        .expect("inclusion directive pattern is valid")
});

/// Inlines the raw source of the templates referenced by inclusion directives, before the
/// host engine ever sees the template.
///
/// Expansion is textual and runs a single pass: directives found in the inlined sources are
/// left as they are.
pub struct TemplateInclusionPreprocessor<'a> {
    engine: &'a dyn TemplateEngine,
}

impl<'a> TemplateInclusionPreprocessor<'a> {
    pub fn new(engine: &'a dyn TemplateEngine) -> Self {
        Self { engine }
    }

    /// Returns the source of `template` with every inclusion directive expanded.
    ///
    /// Lookups run in site template mode, whatever mode `ctx` was in; the previous mode is
    /// restored before returning.
    pub async fn process(
        &self,
        template: &str,
        ctx: &mut RenderContext,
    ) -> Result<String, InertiaError> {
        let ctx = ctx.site_mode();
        let mode = ctx.template_mode();

        let path = self
            .engine
            .resolve_template(template, mode)
            .ok_or_else(|| InertiaError::TemplateNotFound(template.to_string()))?;
        let source = self.engine.read_template(&path).await?;

        let mut processed = String::with_capacity(source.len());
        let mut last = 0;

        for caps in INCLUSION.captures_iter(&source) {
            let Some(directive) = caps.get(0) else {
                continue;
            };

            let reference = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |reference| reference.as_str())
                .trim();
            let name = reference.trim_matches(|c| c == '\'' || c == '"');

            processed.push_str(&source[last..directive.start()]);
            processed.push_str(&self.included_source(name, reference, mode).await);
            last = directive.end();
        }

        processed.push_str(&source[last..]);
        Ok(processed)
    }

    async fn included_source(
        &self,
        name: &str,
        reference: &str,
        mode: TemplateMode,
    ) -> String {
        let Some(path) = self.engine.resolve_template(name, mode) else {
            log::warn!(
                "{}",
                inertia_err_msg(format!("Template not found: {}", reference))
            );
            return String::new();
        };

        match self.engine.read_template(&path).await {
            Ok(source) => source,
            Err(err) => {
                log::warn!(
                    "{}",
                    inertia_err_msg(format!("Failed to read template {}: {}", reference, err))
                );
                String::new()
            }
        }
    }
}
