#[cfg(feature = "actix")]
mod actix_provider;

#[cfg(feature = "actix")]
pub mod actix {
    pub use super::actix_provider::facade::{
        extract_inertia, location, render, render_page, render_with_props,
    };
    pub use super::actix_provider::headers;
    pub use super::actix_provider::middleware::{InertiaMiddleware, InertiaMiddlewareService};
}
