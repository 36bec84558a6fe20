use crate::inertia;
use crate::utils::inertia_err_msg;
use actix_web::http::header::{HeaderName, HeaderValue};

pub const X_INERTIA: HeaderName = HeaderName::from_static(inertia::X_INERTIA);
pub const X_INERTIA_LOCATION: HeaderName = HeaderName::from_static(inertia::X_INERTIA_LOCATION);
pub const X_INERTIA_VERSION: HeaderName = HeaderName::from_static(inertia::X_INERTIA_VERSION);
pub const X_INERTIA_PARTIAL_COMPONENT: HeaderName =
    HeaderName::from_static(inertia::X_INERTIA_PARTIAL_COMPONENT);
pub const X_INERTIA_PARTIAL_DATA: HeaderName =
    HeaderName::from_static(inertia::X_INERTIA_PARTIAL_DATA);
pub const X_INERTIA_PARTIAL_EXCEPT: HeaderName =
    HeaderName::from_static(inertia::X_INERTIA_PARTIAL_EXCEPT);
pub const X_REDIRECT: HeaderName = HeaderName::from_static(inertia::X_REDIRECT);

pub enum InertiaHeader<'a> {
    Inertia,
    InertiaLocation(&'a str),
    Version(&'a str),
    PartialComponent(&'a str),
    PartialData(&'a [&'a str]),
    PartialExcept(&'a [&'a str]),
    /// Asks for a redirect to the given url, once the response leaves the middleware.
    Redirect(&'a str),
}

impl InertiaHeader<'_> {
    pub fn convert(&self) -> (HeaderName, HeaderValue) {
        match self {
            Self::Inertia => (X_INERTIA, HeaderValue::from_static("true")),
            Self::InertiaLocation(url) => (X_INERTIA_LOCATION, header_value(url)),
            Self::Version(version) => (X_INERTIA_VERSION, header_value(version)),
            Self::PartialComponent(component) => {
                (X_INERTIA_PARTIAL_COMPONENT, header_value(component))
            }
            Self::PartialData(keys) => (X_INERTIA_PARTIAL_DATA, header_value(&keys.join(","))),
            Self::PartialExcept(keys) => {
                (X_INERTIA_PARTIAL_EXCEPT, header_value(&keys.join(",")))
            }
            Self::Redirect(url) => (X_REDIRECT, header_value(url)),
        }
    }
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|err| {
        log::warn!(
            "{}",
            inertia_err_msg(format!("Invalid header value {:?}: {}", value, err))
        );
        HeaderValue::from_static("")
    })
}
