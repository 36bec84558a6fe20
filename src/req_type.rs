use crate::inertia::Component;
use crate::props::InertiaProps;

/// What a partial reload asks for.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartialComponent {
    pub component: Component,
    pub only: Vec<String>,
    pub except: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum InertiaRequestType {
    Standard,
    Partial(PartialComponent),
}

impl InertiaRequestType {
    #[inline]
    pub fn is_standard(&self) -> bool {
        matches!(*self, InertiaRequestType::Standard)
    }

    #[inline]
    pub fn is_partial(&self) -> bool {
        !self.is_standard()
    }

    #[inline]
    pub fn partials(&self) -> Option<&PartialComponent> {
        match self {
            InertiaRequestType::Partial(reqs) => Some(reqs),
            InertiaRequestType::Standard => None,
        }
    }
}

/// Splits a comma-separated partial-reload header value, discarding empty entries.
pub(crate) fn split_partial_keys(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Filters `props` down to what a partial reload of `component` asked for.
///
/// Props pass through untouched on standard visits, and on partial reloads targeting another
/// component. Otherwise the "only" keys are kept (when any were given) and the "except" keys
/// are then removed.
pub fn resolve_partial_props(
    props: InertiaProps,
    req_type: &InertiaRequestType,
    component: &Component,
) -> InertiaProps {
    let partial = match req_type.partials() {
        Some(partial) if &partial.component == component => partial,
        _ => return props,
    };

    let mut props = if partial.only.is_empty() {
        props
    } else {
        props
            .into_iter()
            .filter(|(key, _)| partial.only.contains(key))
            .collect()
    };

    for key in &partial.except {
        props.remove(key);
    }

    props
}
