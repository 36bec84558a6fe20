use crate::error::InertiaError;
use crate::utils::{inertia_err_msg, truncate_snippet};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Page props. Keys are kept sorted, so identical props always serialize identically.
pub type InertiaProps = Map<String, Value>;

pub const PROP_MARKER_PREFIX: &str = "<!--INERTIA_PROP:";
pub const PROP_MARKER_SUFFIX: &str = "-->";

/// Longest part of a malformed marker body echoed into the logs.
const SNIPPET_LENGTH: usize = 120;

static PROP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--INERTIA_PROP:(\{.*?\})-->").expect("prop marker pattern is valid")
});

/// Renders the marker a template prints to declare a single prop.
///
/// ```rust
/// use inertia_cms::prop_marker;
///
/// let marker = prop_marker("title", &"Hello".into()).unwrap();
/// assert_eq!(marker, r#"<!--INERTIA_PROP:{"title":"Hello"}-->"#);
/// ```
pub fn prop_marker(name: &str, value: &Value) -> Result<String, InertiaError> {
    let mut prop = Map::new();
    prop.insert(name.to_string(), value.clone());

    let json = serde_json::to_string(&prop).map_err(|err| {
        InertiaError::SerializationError(format!(
            "Failed to encode Inertia prop '{}' as JSON: {}",
            name, err
        ))
    })?;

    Ok(format!("{}{}{}", PROP_MARKER_PREFIX, json, PROP_MARKER_SUFFIX))
}

/// Result of scanning a template output for prop markers.
#[derive(Debug, Default, PartialEq)]
pub struct PropExtraction {
    pub props: InertiaProps,
    /// Keys dropped because an earlier marker (or the existing props) already declared them,
    /// once per dropped occurrence.
    pub skipped_duplicates: Vec<String>,
    pub malformed_markers: usize,
}

pub struct PropExtractor;

impl PropExtractor {
    /// Collects every prop marker in `output` into `existing`. The first declaration of a key
    /// wins; malformed markers are logged and skipped.
    pub fn extract(output: &str, existing: InertiaProps) -> PropExtraction {
        let mut extraction = PropExtraction {
            props: existing,
            ..Default::default()
        };

        for caps in PROP_MARKER.captures_iter(output) {
            let json = &caps[1];

            let decoded = match serde_json::from_str::<Value>(json) {
                Ok(decoded) => decoded,
                Err(err) => {
                    log::error!(
                        "{}",
                        inertia_err_msg(format!(
                            "Failed to decode Inertia prop JSON: {}. Offending JSON: {}",
                            err,
                            truncate_snippet(json, SNIPPET_LENGTH)
                        ))
                    );
                    extraction.malformed_markers += 1;
                    continue;
                }
            };

            let Value::Object(decoded) = decoded else {
                continue;
            };

            for (key, value) in decoded {
                if extraction.props.contains_key(&key) {
                    log::warn!(
                        "{}",
                        inertia_err_msg(format!(
                            "Duplicate Inertia prop '{}' detected in template output. Skipping duplicate to avoid overwriting.",
                            key
                        ))
                    );
                    extraction.skipped_duplicates.push(key);
                    continue;
                }

                extraction.props.insert(key, value);
            }
        }

        extraction
    }
}

/// Every source of page props, from the lowest to the highest priority. A key declared by a
/// later layer overwrites the same key of any earlier layer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PropLayers {
    /// Route parameters and template variables.
    pub route: InertiaProps,
    /// One-shot values taken from the session.
    pub one_shot: InertiaProps,
    /// Props shared by every page.
    pub shared: InertiaProps,
    /// Template-local assignments captured while rendering.
    pub captured: InertiaProps,
    /// Props explicitly declared for this page.
    pub explicit: InertiaProps,
}

impl PropLayers {
    pub fn merge(self) -> InertiaProps {
        let mut props = self.route;
        props.extend(self.one_shot);
        props.extend(self.shared);
        props.extend(self.captured);
        props.extend(self.explicit);
        props
    }
}
