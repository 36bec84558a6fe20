use crate::config::InertiaConfig;
use crate::host::{ContentRepository, CsrfTokenIssuer, NoContent, TemplateEngine};
use crate::props::InertiaProps;
use crate::req_type::InertiaRequestType;
use crate::resolver::PageRequest;
use crate::version::AssetFingerprinter;
use crate::InertiaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const X_INERTIA: &str = "x-inertia";
pub const X_INERTIA_LOCATION: &str = "x-inertia-location";
pub const X_INERTIA_VERSION: &str = "x-inertia-version";
pub const X_INERTIA_PARTIAL_COMPONENT: &str = "x-inertia-partial-component";
pub const X_INERTIA_PARTIAL_DATA: &str = "x-inertia-partial-data";
pub const X_INERTIA_PARTIAL_EXCEPT: &str = "x-inertia-partial-except";
/// Internal redirect signal, forwarded to `Location` and stripped before the response leaves.
pub const X_REDIRECT: &str = "x-redirect";

/// The javascript component name.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Component(pub String);

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Component(value.to_string())
    }
}

impl From<String> for Component {
    fn from(value: String) -> Self {
        Component(value)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// InertiaResponder trait defines methods that every crate feature
/// should implement. For instance, T may be a sort of actix-web Responder,
/// if "actix" feature is passed with the --feature flag or with the
/// feature field in the cargo toml.
#[async_trait(?Send)] // it's `?Send` because some frameworks like Actix won't require requests to be thread-safe
pub trait InertiaResponder<T, THttpReq> {
    /// Renders an Inertia Page without props as an HTTP response.
    async fn render(&self, req: &THttpReq, component: Component) -> Result<T, InertiaError>;

    /// Renders an Inertia Page with explicit props as an HTTP response. Explicit props
    /// override shared and one-shot session props with the same key.
    ///
    /// # Arguments
    /// * `req`         -   The HTTP request.
    /// * `component`   -   The page component to be rendered by the client-side adapter.
    /// * `props`       -   The page props.
    async fn render_with_props(
        &self,
        req: &THttpReq,
        component: Component,
        props: InertiaProps,
    ) -> Result<T, InertiaError>;

    /// Resolves the template answering `page_request`, renders it and responds with the
    /// resulting page. Unresolvable requests are answered with the 404 error template.
    async fn render_page(&self, req: &THttpReq, page_request: PageRequest)
        -> Result<T, InertiaError>;

    /// Redirects to `url`, forcing a full visit when the request came from the Inertia client.
    fn location(req: &THttpReq, url: &str) -> T;
}

/// Defines some helper methods to be implemented to HttpRequests from the
/// library opted by the cargo feature.
pub(crate) trait InertiaHttpRequest {
    fn is_inertia_request(&self) -> bool;

    fn get_request_type(&self) -> Result<InertiaRequestType, InertiaError>;

    /// The assets version the client was built with, if it sent one.
    fn inertia_version(&self) -> Option<&str>;

    fn absolute_url(&self) -> String;
}

/// Registers Inertia-owned routes on the opted http library's application.
pub trait InertiaService {
    /// Takes over the application routing: `/` and every unmatched path are answered by
    /// [`InertiaResponder::render_page`].
    fn inertia_routes(self) -> Self;

    /// Registers a route answered by an explicit template, whatever the URI looks like.
    fn inertia_template_route(self, path: &str, template: &'static str) -> Self;
}

pub enum InertiaVersion {
    Literal(String),
    Resolver(Box<dyn Fn() -> String + Send + Sync>),
    /// Hashes the configured assets directories on every request.
    Fingerprint(AssetFingerprinter),
}

impl InertiaVersion {
    pub async fn resolve(&self) -> String {
        match self {
            Self::Literal(version) => version.clone(),
            Self::Resolver(resolver) => resolver(),
            Self::Fingerprint(fingerprinter) => fingerprinter.fingerprint().await,
        }
    }
}

/// Inertia struct must be a singleton and initialized at the application bootstrap.
/// It is supposed to last during the whole application runtime.
///
/// Extra details of how to initialize and keep it is specific to the feature-opted http library.
pub struct Inertia {
    pub(crate) config: InertiaConfig,
    pub(crate) version: InertiaVersion,
    pub(crate) engine: Arc<dyn TemplateEngine>,
    pub(crate) content: Arc<dyn ContentRepository>,
    pub(crate) csrf: Option<Arc<dyn CsrfTokenIssuer>>,
}

impl Inertia {
    /// Initializes an instance of [`Inertia`] struct.
    ///
    /// # Arguments
    /// * `config`  -   An [`InertiaConfig`]. Unless it carries an explicit version, the
    ///                 assets version is fingerprinted from `config.assets_dirs`.
    /// * `engine`  -   The host template engine.
    pub fn new(mut config: InertiaConfig, engine: Arc<dyn TemplateEngine>) -> Self {
        let version = match config.version.take() {
            Some(version) => version,
            None => InertiaVersion::Fingerprint(AssetFingerprinter::from_config(&config)),
        };

        Self {
            config,
            version,
            engine,
            content: Arc::new(NoContent),
            csrf: None,
        }
    }

    pub fn with_content_repository(mut self, content: Arc<dyn ContentRepository>) -> Self {
        self.content = content;
        self
    }

    pub fn with_csrf_issuer(mut self, csrf: Arc<dyn CsrfTokenIssuer>) -> Self {
        self.csrf = Some(csrf);
        self
    }

    /// The current assets version.
    pub async fn version(&self) -> String {
        self.version.resolve().await
    }

    pub fn config(&self) -> &InertiaConfig {
        &self.config
    }

    /// Prefixes `path` with the configured Inertia templates directory, if any.
    pub(crate) fn template_path(&self, path: &str) -> String {
        match &self.config.inertia_directory {
            Some(directory) if !directory.is_empty() => {
                format!("{}/{}", directory.trim_end_matches('/'), path)
            }
            _ => path.to_string(),
        }
    }
}
