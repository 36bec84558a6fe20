use crate::routes::{LegacyRoute, LegacyRoutes};
use crate::InertiaVersion;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A configuration struct for initializing Inertia. You can directly fill the struct or use
/// the builder fluent syntax by calling `InertiaConfig::builder()`, and finally `InertiaConfigBuilder::build()`.
///
/// * `view`                    -   The root template rendered on full visits. It receives the
///                                 page payload as the `page` variable, e.g.
///                                 `<div id="app" data-page="{{ page|json_encode }}"></div>`.
/// * `inertia_directory`       -   Templates directory holding the Inertia pages. URIs, the
///                                 root view and error templates are resolved inside it.
/// * `shared_directory`        -   Directory (inside `inertia_directory`) whose templates
///                                 declare the props shared by every page.
/// * `use_versioning`          -   Whether assets versioning is used. Disable it if your build
///                                 process already handles it.
/// * `assets_dirs`             -   Directories fingerprinted for the assets version. They may
///                                 contain `$ENV_VARS` and `@aliases`.
/// * `aliases`                 -   Path aliases usable in `assets_dirs`.
/// * `version`                 -   An explicit assets version, bypassing the fingerprinting.
/// * `inject_element_as_prop`  -   Whether the matched `entry` or `category` is also sent to
///                                 the client as a prop.
/// * `auto_capture_variables`  -   Whether template-local assignments become props.
/// * `error_template_prefix`   -   Prefix of the error templates (e.g. `"_errors/"` for
///                                 `_errors/404`).
/// * `dev_mode`                -   When enabled, template errors carrying an http status are
///                                 propagated instead of rendering the error template.
/// * `one_shot_session_keys`   -   Session keys surfaced as props once, then removed.
/// * `legacy_routes`           -   Route table consulted when nothing else matches a URI.
/// * `view_data`               -   Extra data passed to the root template.
pub struct InertiaConfig {
    pub view: String,
    pub inertia_directory: Option<String>,
    pub shared_directory: String,
    pub use_versioning: bool,
    pub assets_dirs: Vec<String>,
    pub aliases: HashMap<String, String>,
    pub version: Option<InertiaVersion>,
    pub inject_element_as_prop: bool,
    pub auto_capture_variables: bool,
    pub error_template_prefix: String,
    pub dev_mode: bool,
    pub one_shot_session_keys: Vec<String>,
    pub legacy_routes: LegacyRoutes,
    pub view_data: Map<String, Value>,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            view: "base.twig".into(),
            inertia_directory: None,
            shared_directory: "_shared".into(),
            use_versioning: true,
            assets_dirs: vec!["@webroot/assets".into()],
            aliases: HashMap::from([("@webroot".to_string(), "web".to_string())]),
            version: None,
            inject_element_as_prop: false,
            auto_capture_variables: false,
            error_template_prefix: String::new(),
            dev_mode: false,
            one_shot_session_keys: vec!["recentElementSave".into()],
            legacy_routes: LegacyRoutes::default(),
            view_data: Map::new(),
        }
    }
}

impl InertiaConfig {
    /// Instatiates a new InertiaConfigBuilder instance. It must be configured using a fluent syntax.
    ///
    /// # Examples
    /// ```rust
    /// use inertia_cms::{InertiaConfig, InertiaVersion};
    ///
    /// let inertia_config = InertiaConfig::builder()
    ///     .set_view("_layouts/inertia.twig")
    ///     .set_inertia_directory("inertia")
    ///     .set_version(InertiaVersion::Literal("v1".into()))
    ///     .build();
    ///
    /// assert_eq!(inertia_config.view, "_layouts/inertia.twig");
    /// ```
    pub fn builder() -> InertiaConfigBuilder {
        InertiaConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct InertiaConfigBuilder {
    config: InertiaConfig,
}

impl InertiaConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view(mut self, view: impl Into<String>) -> Self {
        self.config.view = view.into();
        self
    }

    pub fn set_inertia_directory(mut self, directory: impl Into<String>) -> Self {
        self.config.inertia_directory = Some(directory.into());
        self
    }

    pub fn set_shared_directory(mut self, directory: impl Into<String>) -> Self {
        self.config.shared_directory = directory.into();
        self
    }

    pub fn disable_versioning(mut self) -> Self {
        self.config.use_versioning = false;
        self
    }

    pub fn set_assets_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.assets_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_alias(mut self, alias: impl Into<String>, path: impl Into<String>) -> Self {
        self.config.aliases.insert(alias.into(), path.into());
        self
    }

    pub fn set_version(mut self, version: InertiaVersion) -> Self {
        self.config.version = Some(version);
        self
    }

    pub fn inject_element_as_prop(mut self) -> Self {
        self.config.inject_element_as_prop = true;
        self
    }

    pub fn auto_capture_variables(mut self) -> Self {
        self.config.auto_capture_variables = true;
        self
    }

    pub fn set_error_template_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.error_template_prefix = prefix.into();
        self
    }

    pub fn enable_dev_mode(mut self) -> Self {
        self.config.dev_mode = true;
        self
    }

    pub fn set_one_shot_session_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.one_shot_session_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_legacy_route(mut self, route: LegacyRoute) -> Self {
        self.config.legacy_routes.push(route);
        self
    }

    pub fn set_view_data(mut self, view_data: Map<String, Value>) -> Self {
        self.config.view_data = view_data;
        self
    }

    /// Compile the current `InertiaConfigBuilder` into a valid `InertiaConfig` struct.
    pub fn build(self) -> InertiaConfig {
        self.config
    }
}
