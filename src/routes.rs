use crate::error::InertiaError;
use crate::props::InertiaProps;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z_][A-Za-z0-9_]*)(?::([^>]+))?>").expect("route token pattern is valid")
});

/// A URL rule mapping a URI pattern to a template, e.g. `news/<year:\d{4}>/<slug>`.
///
/// `<name>` matches one path segment, `<name:regex>` matches `regex`. Every other character
/// is literal.
#[derive(Debug, Clone)]
pub struct LegacyRoute {
    pattern: String,
    regex: Regex,
    names: Vec<String>,
    template: String,
    params: InertiaProps,
}

impl LegacyRoute {
    pub fn new(pattern: &str, template: &str) -> Result<Self, InertiaError> {
        let pattern = pattern.trim_matches('/');
        let mut names = Vec::new();
        let mut regex = String::from("^");
        let mut last = 0;

        for caps in TOKEN.captures_iter(pattern) {
            let token = caps.get(0).map_or(0..0, |token| token.range());
            regex.push_str(&regex::escape(&pattern[last..token.start]));

            let segment = caps.get(2).map_or("[^/]+", |segment| segment.as_str());
            regex.push_str(&format!("(?P<{}>{})", &caps[1], segment));

            names.push(caps[1].to_string());
            last = token.end;
        }

        regex.push_str(&regex::escape(&pattern[last..]));
        regex.push('$');

        let regex = Regex::new(&regex).map_err(|err| {
            InertiaError::ConfigurationError(format!("Invalid route pattern {}: {}", pattern, err))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            names,
            template: template.to_string(),
            params: InertiaProps::new(),
        })
    }

    /// Declares variables handed to the template whenever the route matches.
    pub fn with_params(mut self, params: InertiaProps) -> Self {
        self.params = params;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The route's params and captured tokens if `uri` matches it.
    pub fn matches(&self, uri: &str) -> Option<InertiaProps> {
        let caps = self.regex.captures(uri.trim_matches('/'))?;

        let mut params = self.params.clone();
        for name in &self.names {
            if let Some(value) = caps.name(name) {
                params.insert(name.clone(), Value::String(value.as_str().to_string()));
            }
        }

        Some(params)
    }
}

/// Ordered route table; the first matching route wins.
#[derive(Debug, Clone, Default)]
pub struct LegacyRoutes(Vec<LegacyRoute>);

impl LegacyRoutes {
    pub fn push(&mut self, route: LegacyRoute) {
        self.0.push(route);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parse_request(&self, uri: &str) -> Option<(&str, InertiaProps)> {
        self.0
            .iter()
            .find_map(|route| route.matches(uri).map(|params| (route.template(), params)))
    }
}
