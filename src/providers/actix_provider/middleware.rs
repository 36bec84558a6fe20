use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpMessage;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use super::headers::{InertiaHeader, X_REDIRECT};
use crate::host::{CsrfToken, InertiaSession};
use crate::inertia::{InertiaHttpRequest, InertiaResponder};
use crate::protocol::Visit;
use crate::utils::inertia_err_msg;
use crate::{Inertia, InertiaProps};

type SharedPropsCallback = dyn Fn(&ServiceRequest) -> InertiaProps;

/// Applies the Inertia protocol to every response of the wrapped services:
///
/// * stale assets on Inertia GET visits are answered with `409` and `X-Inertia-Location`,
///   without running the handler;
/// * successful Inertia responses are confirmed with `X-Inertia: true`. A response without a
///   content type is declared JSON; any other content type is kept, with a warning, since
///   only [`InertiaPage`] bodies are JSON;
/// * `302` redirects answering `PUT`, `PATCH` or `DELETE` become `303`;
/// * an `X-Redirect` response header is moved to `Location`.
///
/// Full visits are issued a fresh CSRF token when a [`CsrfTokenIssuer`] is configured.
///
/// [`CsrfTokenIssuer`]: crate::host::CsrfTokenIssuer
/// [`InertiaPage`]: crate::InertiaPage
pub struct InertiaMiddleware {
    shared_props_cb: Arc<SharedPropsCallback>,
}

impl Default for InertiaMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl InertiaMiddleware {
    pub fn new() -> Self {
        Self {
            shared_props_cb: Arc::new(|_req| InertiaProps::new()),
        }
    }

    /// Props shared by every page rendered during the request. Shared props templates never
    /// override them.
    pub fn with_shared_props(mut self, props: Arc<SharedPropsCallback>) -> Self {
        self.shared_props_cb = props;
        self
    }
}

// Middleware factory is `Transform` trait
// `S` - type of the next service
// `B` - type of response's body
impl<S, B> Transform<S, ServiceRequest> for InertiaMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = InertiaMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let shpcb = self.shared_props_cb.clone();
        ready(Ok(InertiaMiddlewareService {
            service: Rc::new(service),
            shared_props: shpcb,
        }))
    }
}

pub struct InertiaMiddlewareService<S> {
    service: Rc<S>,
    shared_props: Arc<SharedPropsCallback>,
}

pub(crate) struct SharedProps(pub InertiaProps);

/// The assets version resolved by the middleware, reused when composing the page.
#[derive(Clone)]
pub(crate) struct ResolvedVersion(pub String);

impl<S, B> Service<ServiceRequest> for InertiaMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let shared_props = (self.shared_props)(&req);
        req.extensions_mut().insert(SharedProps(shared_props));

        let inertia = req.app_data::<Data<Inertia>>().cloned();

        // the router needs the only handle to the request, so nothing borrowed from it may
        // outlive this block
        let (visit, client_version) = {
            let http_req = req.request();
            let visit = Visit::new(http_req.is_inertia_request(), http_req.method().as_str());
            (visit, http_req.inertia_version().map(str::to_string))
        };

        if !visit.is_inertia() {
            if let Some(token) = inertia.as_deref().and_then(|inertia| issue_csrf_token(inertia, &req))
            {
                req.extensions_mut().insert(token);
            }
        }

        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let client_version = client_version.as_deref();

            if let Some(inertia) = inertia.filter(|_| visit.checks_version(client_version)) {
                let current_version = inertia.version().await;

                // assets are outdated: the client must reload the whole page
                if visit.requires_full_reload(client_version, &current_version) {
                    let (http_req, _payload) = req.into_parts();
                    log::debug!(
                        "Stale assets version on {}, forcing a full reload",
                        http_req.uri()
                    );

                    let response = Inertia::location(&http_req, &http_req.absolute_url());
                    return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
                }

                req.extensions_mut().insert(ResolvedVersion(current_version));
            }

            let mut res = service.call(req).await.map(ServiceResponse::map_into_left_body)?;

            let adjustment = visit.adjust_response(res.status().as_u16());
            let response = res.response_mut();

            if let Ok(status) = StatusCode::from_u16(adjustment.status) {
                *response.status_mut() = status;
            }

            let headers = response.headers_mut();

            if adjustment.confirm_protocol {
                let (name, value) = InertiaHeader::Inertia.convert();
                headers.insert(name, value);

                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                } else if let Some(content_type) =
                    headers.get(CONTENT_TYPE).filter(|value| !is_json(value))
                {
                    log::warn!(
                        "{}",
                        inertia_err_msg(format!(
                            "Inertia visit answered with a {:?} body. Only Inertia pages are JSON.",
                            content_type
                        ))
                    );
                }
            }

            if let Some(url) = headers.remove(X_REDIRECT).next() {
                headers.insert(LOCATION, url);
            }

            Ok(res)
        })
    }
}

fn is_json(content_type: &HeaderValue) -> bool {
    content_type
        .to_str()
        .map(|content_type| content_type.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

fn issue_csrf_token(inertia: &Inertia, req: &ServiceRequest) -> Option<CsrfToken> {
    let issuer = inertia.csrf.as_ref()?;
    if !issuer.validation_enabled() {
        return None;
    }

    let session = req.extensions().get::<InertiaSession>().cloned();
    let token = issuer.issue_token(session.as_ref().map(|InertiaSession(store)| store.as_ref()));

    Some(CsrfToken(token))
}
