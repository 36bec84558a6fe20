use crate::config::InertiaConfig;
use crate::error::InertiaError;
use crate::host::{ContentRepository, Element, TemplateEngine, TemplateMode};
use crate::props::InertiaProps;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Route param naming the template a route explicitly delegates to Inertia.
pub const INERTIA_TEMPLATE_PARAM: &str = "inertiaTemplate";

/// Route param whose object entries are lifted to the top level of the template variables.
const NESTED_VARIABLES_PARAM: &str = "variables";

static URI_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("uri placeholder pattern is valid"));

/// Everything the resolution of a page depends on, gathered from the http request by the
/// opted http library.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    uri: String,
    route_params: InertiaProps,
    query_params: InertiaProps,
    body_params: InertiaProps,
    explicit_template: Option<String>,
    matched_element: Option<Element>,
    current_element: Option<Element>,
}

impl PageRequest {
    /// # Arguments
    /// * `uri` -   The request path, e.g. `"/news/2024/launch"`. Surrounding slashes are
    ///             ignored.
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.trim_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_route_params(mut self, params: InertiaProps) -> Self {
        self.route_params = params;
        self
    }

    pub fn with_query_params(mut self, params: InertiaProps) -> Self {
        self.query_params = params;
        self
    }

    pub fn with_body_params(mut self, params: InertiaProps) -> Self {
        self.body_params = params;
        self
    }

    /// Answers the request with `template`, whatever the URI looks like.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.explicit_template = Some(template.into());
        self
    }

    /// The element the host router already matched for this URI, if any. When absent, the
    /// element is looked up by URI in the [`ContentRepository`].
    pub fn with_matched_element(mut self, element: Element) -> Self {
        self.matched_element = Some(element);
        self
    }

    /// The element currently being edited (e.g. a form submission that failed validation).
    /// It is handed to the template as `entry` or `category`, so validation errors can be
    /// displayed.
    pub fn with_current_element(mut self, element: Element) -> Self {
        self.current_element = Some(element);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn current_element(&self) -> Option<&Element> {
        self.current_element.as_ref()
    }

    /// Route params, with the entries of a nested `variables` object lifted to the top level.
    /// Top-level keys win over nested ones.
    pub fn variables(&self) -> InertiaProps {
        let mut variables = self.route_params.clone();

        if let Some(Value::Object(nested)) = variables.remove(NESTED_VARIABLES_PARAM) {
            for (key, value) in nested {
                variables.entry(key).or_insert(value);
            }
        }

        variables
    }

    fn explicit_template(&self) -> Option<&str> {
        self.explicit_template.as_deref().or_else(|| {
            self.route_params
                .get(INERTIA_TEMPLATE_PARAM)
                .and_then(Value::as_str)
        })
    }

    /// Body and query params, the body winning, without the template selector.
    pub(crate) fn request_params(&self) -> InertiaProps {
        let mut params = self.query_params.clone();
        params.extend(self.body_params.clone());
        params.remove(INERTIA_TEMPLATE_PARAM);
        params
    }
}

/// The template answering a request, and the variables it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub template: String,
    pub variables: InertiaProps,
    /// The content element the URI routed to, if any.
    pub element: Option<Element>,
}

/// Finds the template answering a URI. Candidates are tried in order and the first one that
/// applies wins:
///
/// 1. the content element routed by the URI, rendered with its section's template;
/// 2. a template explicitly declared by the route;
/// 3. the template named after the URI, inside the Inertia templates directory;
/// 4. the legacy route table.
///
/// Once a candidate applies, later ones are not tried even if its template is missing.
pub struct PageResolver<'a> {
    config: &'a InertiaConfig,
    engine: &'a dyn TemplateEngine,
    content: &'a dyn ContentRepository,
}

impl<'a> PageResolver<'a> {
    pub fn new(
        config: &'a InertiaConfig,
        engine: &'a dyn TemplateEngine,
        content: &'a dyn ContentRepository,
    ) -> Self {
        Self {
            config,
            engine,
            content,
        }
    }

    pub fn resolve(&self, request: &PageRequest) -> Result<Option<Resolution>, InertiaError> {
        let element = match &request.matched_element {
            Some(element) => Some(element.clone()),
            None => self
                .content
                .element_by_uri(request.uri(), self.content.current_site_id()),
        };

        if let Some(element) = element {
            return self.resolve_element(request, element);
        }

        let variables = request.variables();

        if let Some(template) = request.explicit_template() {
            if self.exists(template) {
                log::debug!("Resolved {} to explicit template {}", request.uri(), template);

                let mut variables = variables;
                variables.extend(request.request_params());
                return Ok(Some(Resolution {
                    template: template.to_string(),
                    variables,
                    element: None,
                }));
            }
        }

        let uri_template = self.uri_template(request.uri());
        if self.exists(&uri_template) {
            log::debug!("Resolved {} to template {}", request.uri(), uri_template);

            return Ok(Some(Resolution {
                template: uri_template,
                variables,
                element: None,
            }));
        }

        if let Some((template, params)) = self.config.legacy_routes.parse_request(request.uri()) {
            if !self.exists(template) {
                return Ok(None);
            }

            log::debug!("Resolved {} to legacy route template {}", request.uri(), template);

            let mut variables = variables;
            variables.extend(params);
            return Ok(Some(Resolution {
                template: template.to_string(),
                variables,
                element: None,
            }));
        }

        Ok(None)
    }

    fn resolve_element(
        &self,
        request: &PageRequest,
        element: Element,
    ) -> Result<Option<Resolution>, InertiaError> {
        let site_id = self.content.current_site_id();
        let settings = element.settings_for_site(site_id).ok_or_else(|| {
            InertiaError::ConfigurationError(format!(
                "No section site setting found for site {} (element {}).",
                site_id, element.id
            ))
        })?;

        if !self.exists(&settings.template) {
            return Ok(None);
        }

        let template = settings.template.clone();
        let mut variables = extract_uri_parameters(request.uri(), &settings.uri_format)?;
        variables.insert(element.kind.variable_name().into(), element.to_value());

        log::debug!("Resolved {} to element {} ({})", request.uri(), element.id, template);

        Ok(Some(Resolution {
            template,
            variables,
            element: Some(element),
        }))
    }

    /// The template named after `uri` inside the Inertia templates directory. The site root is
    /// answered by `index`.
    fn uri_template(&self, uri: &str) -> String {
        let uri = if uri.is_empty() { "index" } else { uri };

        match &self.config.inertia_directory {
            Some(directory) if !directory.is_empty() => {
                format!("{}/{}", directory.trim_end_matches('/'), uri)
            }
            _ => uri.to_string(),
        }
    }

    fn exists(&self, template: &str) -> bool {
        self.engine.template_exists(template, TemplateMode::Site)
    }
}

/// Extracts the `{name}` placeholders of `uri_format` from `uri`.
///
/// ```rust
/// use inertia_cms::extract_uri_parameters;
/// use serde_json::json;
///
/// let params = extract_uri_parameters("news/2024/launch", "news/{year}/{slug}").unwrap();
/// assert_eq!(params.get("year"), Some(&json!("2024")));
/// assert_eq!(params.get("slug"), Some(&json!("launch")));
/// ```
pub fn extract_uri_parameters(uri: &str, uri_format: &str) -> Result<InertiaProps, InertiaError> {
    let mut names = Vec::new();
    let mut pattern = String::from("^");
    let mut last = 0;

    for caps in URI_PLACEHOLDER.captures_iter(uri_format) {
        let placeholder = caps.get(0).map_or(0..0, |placeholder| placeholder.range());
        pattern.push_str(&regex::escape(&uri_format[last..placeholder.start]));
        pattern.push_str("([^/]+)");

        names.push(caps[1].to_string());
        last = placeholder.end;
    }

    if names.is_empty() {
        return Ok(InertiaProps::new());
    }

    pattern.push_str(&regex::escape(&uri_format[last..]));
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|err| {
        InertiaError::UriFormatError(format!("Invalid uri format {}: {}", uri_format, err))
    })?;

    let caps = regex.captures(uri).ok_or_else(|| {
        InertiaError::UriFormatError(format!(
            "Failed to combine parameter names and values of '{}' with uri format '{}'.",
            uri, uri_format
        ))
    })?;

    Ok(names
        .into_iter()
        .zip(caps.iter().skip(1))
        .filter_map(|(name, value)| {
            value.map(|value| (name, Value::String(value.as_str().to_string())))
        })
        .collect())
}
