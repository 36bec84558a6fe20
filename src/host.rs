//! Narrow interfaces to the host CMS.
//!
//! Inertia never talks to the CMS directly: templates, content entries, sessions and CSRF
//! tokens are all consumed through the traits below, so any template engine or content
//! store can sit behind the adapter.

use crate::context::RenderContext;
use crate::props::InertiaProps;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub type SiteId = u32;

/// Where template names are looked up. The CMS keeps site (front-end) templates apart from
/// its own control-panel templates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateMode {
    #[default]
    Site,
    ControlPanel,
}

/// A failure raised by the host template engine while evaluating a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub message: String,
    pub template: Option<String>,
    pub line: Option<u32>,
    /// HTTP status carried by the failure, e.g. a template that explicitly raised a 404.
    pub status: Option<u16>,
}

impl TemplateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            template: None,
            line: None,
            status: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.template, self.line) {
            (Some(template), Some(line)) => {
                write!(f, "{} in {} on line {}", self.message, template, line)
            }
            (Some(template), None) => write!(f, "{} in {}", self.message, template),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl Error for TemplateError {}

/// The host template engine.
///
/// Rendering receives the request's [`RenderContext`] by mutable reference. Template helpers
/// such as `page()`, `prop()` or `inertia()` must record their declarations there, never in
/// global state.
#[async_trait(?Send)]
pub trait TemplateEngine: Send + Sync {
    /// Resolves a template name (e.g. `"news/_entry"`) to a file on disk.
    fn resolve_template(&self, name: &str, mode: TemplateMode) -> Option<PathBuf>;

    fn template_exists(&self, name: &str, mode: TemplateMode) -> bool {
        self.resolve_template(name, mode).is_some()
    }

    /// Root directory of the site templates.
    fn templates_path(&self) -> PathBuf;

    async fn read_template(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn render_string(
        &self,
        source: &str,
        variables: &InertiaProps,
        ctx: &mut RenderContext,
    ) -> Result<String, TemplateError>;

    async fn render_template(
        &self,
        name: &str,
        variables: &InertiaProps,
        ctx: &mut RenderContext,
    ) -> Result<String, TemplateError> {
        let path = self
            .resolve_template(name, ctx.template_mode())
            .ok_or_else(|| {
                TemplateError::new(format!("Unable to find the template \"{}\"", name))
                    .with_template(name)
            })?;

        let source = self
            .read_template(&path)
            .await
            .map_err(|err| TemplateError::new(err.to_string()).with_template(name))?;

        self.render_string(&source, variables, ctx).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Entry,
    Category,
}

impl ElementKind {
    /// Name of the template variable the element is exposed as.
    pub fn variable_name(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Category => "category",
        }
    }
}

/// Per-site configuration of an entry's section or a category's group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteSettings {
    pub site_id: SiteId,
    pub template: String,
    /// E.g. `"news/{year}/{slug}"`.
    pub uri_format: String,
}

/// A content element (entry or category) routed by its URI.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub id: u64,
    pub kind: ElementKind,
    pub site_settings: Vec<SiteSettings>,
    /// JSON representation handed to templates and, optionally, to the client.
    pub attributes: Value,
}

impl Element {
    pub fn settings_for_site(&self, site_id: SiteId) -> Option<&SiteSettings> {
        self.site_settings
            .iter()
            .find(|settings| settings.site_id == site_id)
    }

    pub fn to_value(&self) -> Value {
        match &self.attributes {
            Value::Object(attributes) => {
                let mut value = attributes.clone();
                value.insert("id".into(), self.id.into());
                Value::Object(value)
            }
            Value::Null => Value::Object(Map::from_iter([("id".into(), self.id.into())])),
            other => other.clone(),
        }
    }
}

pub trait ContentRepository: Send + Sync {
    fn element_by_uri(&self, uri: &str, site_id: SiteId) -> Option<Element>;

    fn current_site_id(&self) -> SiteId {
        1
    }
}

/// A content repository without any content, for applications that only route templates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContent;

impl ContentRepository for NoContent {
    fn element_by_uri(&self, _uri: &str, _site_id: SiteId) -> Option<Element> {
        None
    }
}

/// The host's per-visitor session storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn set(&self, key: &str, value: Value);

    fn remove(&self, key: &str) -> Option<Value>;

    /// Reads and clears a value in one step, so a one-shot value is observed by a single
    /// request only. Stores shared between workers must override this with an atomic
    /// operation.
    fn take(&self, key: &str) -> Option<Value> {
        self.remove(key)
    }
}

/// A process-local session store.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<Map<String, Value>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<Value> {
        self.values().get(key).cloned()
    }

    fn has(&self, key: &str) -> bool {
        self.values().contains_key(key)
    }

    fn set(&self, key: &str, value: Value) {
        self.values().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.values().remove(key)
    }
}

/// The current visitor's session, inserted into the request extensions by the host (e.g. from
/// a session middleware running before [`InertiaMiddleware`]).
///
/// [`InertiaMiddleware`]: crate::actix::InertiaMiddleware
#[derive(Clone)]
pub struct InertiaSession(pub Arc<dyn SessionStore>);

pub trait CsrfTokenIssuer: Send + Sync {
    fn validation_enabled(&self) -> bool {
        true
    }

    /// Generates a fresh token, persisting it wherever the host validates it from.
    fn issue_token(&self, session: Option<&dyn SessionStore>) -> String;
}

/// A CSRF token issued for the current full-page visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CsrfToken(pub String);

/// Request extension set by the host router when it already matched a content element.
#[derive(Clone, Debug)]
pub struct MatchedElement(pub Element);

/// Request extension carrying the element being edited, e.g. after a failed validation.
#[derive(Clone, Debug)]
pub struct CurrentElement(pub Element);
