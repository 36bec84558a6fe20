use super::impls::page_request;
use crate::inertia::InertiaResponder;
use crate::utils::inertia_err_msg;
use crate::{Component, Inertia, InertiaError, InertiaProps};
use actix_web::web::Data;
use actix_web::{HttpRequest, HttpResponse};

/// Short for calling `render` from the `Inertia` instance configured and added to the request
/// AppData.
///
/// # Arguments
/// * `req`         -   A reference to the HttpRequest.
/// * `component`   -   The name of the page javascript component.
pub async fn render(req: &HttpRequest, component: Component) -> Result<HttpResponse, InertiaError> {
    extract_inertia(req)?.render(req, component).await
}

/// Short for calling `render_with_props` from the `Inertia` instance configured and added to the request
/// AppData.
///
/// # Arguments
/// * `req`         -   A reference to the HttpRequest.
/// * `component`   -   The name of the page javascript component.
/// * `props`       -   The page props.
pub async fn render_with_props(
    req: &HttpRequest,
    component: Component,
    props: InertiaProps,
) -> Result<HttpResponse, InertiaError> {
    extract_inertia(req)?
        .render_with_props(req, component, props)
        .await
}

/// Resolves, renders and responds with the template answering the request, as
/// [`InertiaService::inertia_routes`] does.
///
/// # Arguments
/// * `req`     -   A reference to the HttpRequest.
/// * `body`    -   The raw request body. Form and JSON bodies are handed to explicitly routed
///                 templates as variables.
///
/// [`InertiaService::inertia_routes`]: crate::InertiaService::inertia_routes
pub async fn render_page(req: &HttpRequest, body: &[u8]) -> Result<HttpResponse, InertiaError> {
    extract_inertia(req)?
        .render_page(req, page_request(req, body))
        .await
}

/// Redirects to `url`. Inertia visits are asked to perform a full page visit instead.
pub fn location(req: &HttpRequest, url: &str) -> HttpResponse {
    Inertia::location(req, url)
}

/// Gets the `Inertia` instance registered as AppData.
pub fn extract_inertia(req: &HttpRequest) -> Result<&Inertia, InertiaError> {
    match req.app_data::<Data<Inertia>>() {
        None => Err(InertiaError::ConfigurationError(inertia_err_msg(
            "There is no Inertia struct in AppData. Please, assure you have correctly configured Inertia.".into(),
        ))),
        Some(inertia) => Ok(inertia),
    }
}
