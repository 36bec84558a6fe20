use super::headers;
use super::middleware::{ResolvedVersion, SharedProps};

use crate::host::{CsrfToken, CurrentElement, InertiaSession, MatchedElement};
use crate::inertia::{Inertia, InertiaHttpRequest, InertiaResponder, InertiaService};
use crate::props::{InertiaProps, PropLayers};
use crate::req_type::{split_partial_keys, InertiaRequestType, PartialComponent};
use crate::resolver::PageRequest;
use crate::utils::{convert_struct_to_stringified_json, inertia_err_msg};
use crate::{Component, InertiaError, InertiaPage};

use actix_web::body::BoxBody;
use actix_web::dev::{ServiceFactory, ServiceRequest};
use actix_web::http::header::{self, ContentType, HeaderName};
use actix_web::http::StatusCode;
use actix_web::{
    web, App, HttpMessage, HttpRequest, HttpResponse, HttpResponseBuilder, Responder,
    ResponseError,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

impl Responder for InertiaPage {
    type Body = BoxBody;

    #[inline]
    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        match convert_struct_to_stringified_json(self) {
            Ok(json) => HttpResponseBuilder::new(StatusCode::OK)
                .insert_header(headers::InertiaHeader::Inertia.convert())
                .insert_header(ContentType::json())
                .body(json),
            Err(err) => err.error_response(),
        }
    }
}

#[async_trait(?Send)]
impl InertiaResponder<HttpResponse, HttpRequest> for Inertia {
    #[inline]
    async fn render(
        &self,
        req: &HttpRequest,
        component: Component,
    ) -> Result<HttpResponse, InertiaError> {
        self.render_with_props(req, component, InertiaProps::new())
            .await
    }

    async fn render_with_props(
        &self,
        req: &HttpRequest,
        component: Component,
        props: InertiaProps,
    ) -> Result<HttpResponse, InertiaError> {
        let layers = PropLayers {
            one_shot: self.one_shot_props(req),
            shared: self.request_shared_props(req).await,
            explicit: props,
            ..Default::default()
        };

        self.respond(req, component, layers, StatusCode::OK).await
    }

    async fn render_page(
        &self,
        req: &HttpRequest,
        page_request: PageRequest,
    ) -> Result<HttpResponse, InertiaError> {
        let rendered = self.render_request(&page_request).await?;
        let status = StatusCode::from_u16(rendered.status).unwrap_or(StatusCode::OK);

        let (component, layers) = rendered.into_layers(
            self.one_shot_props(req),
            self.request_shared_props(req).await,
        );

        self.respond(req, component, layers, status).await
    }

    #[inline]
    fn location(req: &HttpRequest, url: &str) -> HttpResponse {
        if !req.is_inertia_request() {
            return HttpResponse::Found()
                .append_header((header::LOCATION, url))
                .finish();
        }

        HttpResponseBuilder::new(StatusCode::CONFLICT)
            .append_header(headers::InertiaHeader::InertiaLocation(url).convert())
            .finish()
    }
}

#[async_trait(?Send)]
pub(crate) trait InertiaActixHelpers {
    fn one_shot_props(&self, req: &HttpRequest) -> InertiaProps;

    async fn request_shared_props(&self, req: &HttpRequest) -> InertiaProps;

    async fn respond(
        &self,
        req: &HttpRequest,
        component: Component,
        layers: PropLayers,
        status: StatusCode,
    ) -> Result<HttpResponse, InertiaError>;
}

#[async_trait(?Send)]
impl InertiaActixHelpers for Inertia {
    fn one_shot_props(&self, req: &HttpRequest) -> InertiaProps {
        let session = req.extensions().get::<InertiaSession>().cloned();
        self.take_one_shot_props(session.as_ref().map(|InertiaSession(store)| store.as_ref()))
    }

    async fn request_shared_props(&self, req: &HttpRequest) -> InertiaProps {
        let seed = req
            .extensions()
            .get::<SharedProps>()
            .map(|SharedProps(props)| props.clone())
            .unwrap_or_default();

        self.shared_props(seed).await
    }

    async fn respond(
        &self,
        req: &HttpRequest,
        component: Component,
        layers: PropLayers,
        status: StatusCode,
    ) -> Result<HttpResponse, InertiaError> {
        let url = req.uri().to_string();
        let req_type = req.get_request_type()?;
        let resolved = req.extensions().get::<ResolvedVersion>().cloned();
        let version = match resolved {
            Some(ResolvedVersion(version)) => version,
            None => self.version().await,
        };

        let page = self.compose_page(component, layers, url, version, &req_type);

        // if it's an inertia request, returns an InertiaPage object
        if req.is_inertia_request() {
            let mut response = page.respond_to(req);
            *response.status_mut() = status;
            return Ok(response);
        }

        let csrf_token = req.extensions().get::<CsrfToken>().cloned();
        let html = self.render_shell(&page, csrf_token.as_ref()).await?;

        Ok(HttpResponseBuilder::new(status)
            .insert_header(ContentType::html())
            .body(html))
    }
}

impl ResponseError for InertiaError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(InertiaError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponseBuilder::new(ResponseError::status_code(self))
            .insert_header(ContentType::plaintext())
            .body(self.get_cause())
    }
}

async fn inertia_page_handler(
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, InertiaError> {
    crate::actix::render_page(&req, &body).await
}

impl<TApp> InertiaService for App<TApp>
where
    TApp: ServiceFactory<
        ServiceRequest,
        Config = (),
        Error = actix_web::error::Error,
        InitError = (),
    >,
{
    fn inertia_routes(self) -> Self {
        self.default_service(web::to(inertia_page_handler))
    }

    fn inertia_template_route(self, path: &str, template: &'static str) -> Self {
        self.route(
            path,
            web::route().to(move |req: HttpRequest, body: web::Bytes| async move {
                let page_request = page_request(&req, &body).with_template(template);
                crate::actix::extract_inertia(&req)?
                    .render_page(&req, page_request)
                    .await
            }),
        )
    }
}

impl InertiaHttpRequest for HttpRequest {
    fn is_inertia_request(&self) -> bool {
        match self.headers().get(headers::X_INERTIA) {
            None => false,
            Some(v) => !v.is_empty(),
        }
    }

    fn get_request_type(&self) -> Result<InertiaRequestType, InertiaError> {
        let Some(partial_comp) = self.headers().get(headers::X_INERTIA_PARTIAL_COMPONENT) else {
            return Ok(InertiaRequestType::Standard);
        };

        let partial_comp = partial_comp.to_str().map_err(|_err| {
            InertiaError::HeaderError(format!(
                "Header {}'s value must contain only printable ASCII characters.",
                headers::X_INERTIA_PARTIAL_COMPONENT
            ))
        })?;

        let component = Component(partial_comp.into());
        let only = extract_partials_headers_content(self, &headers::X_INERTIA_PARTIAL_DATA)?;
        let except = extract_partials_headers_content(self, &headers::X_INERTIA_PARTIAL_EXCEPT)?;

        Ok(InertiaRequestType::Partial(PartialComponent {
            component,
            only,
            except,
        }))
    }

    fn inertia_version(&self) -> Option<&str> {
        self.headers()
            .get(headers::X_INERTIA_VERSION)
            .and_then(|version| version.to_str().ok())
    }

    fn absolute_url(&self) -> String {
        if self.uri().scheme().is_some() {
            return self.uri().to_string();
        }

        let info = self.connection_info();
        format!("{}://{}{}", info.scheme(), info.host(), self.uri())
    }
}

fn extract_partials_headers_content(
    req: &HttpRequest,
    header_name: &HeaderName,
) -> Result<Vec<String>, InertiaError> {
    let partials = match req.headers().get(header_name) {
        None => Vec::new(),
        Some(value) => match value.to_str() {
            Ok(value) => split_partial_keys(value),
            Err(_err) => {
                return Err(InertiaError::HeaderError(format!(
                    "Header {}'s value must contain only printable ASCII characters.",
                    header_name,
                )))
            }
        },
    };

    Ok(partials)
}

/// Gathers the request path, its route, query and body params, and the elements the host
/// attached to the request.
pub(crate) fn page_request(req: &HttpRequest, body: &[u8]) -> PageRequest {
    let route_params = req
        .match_info()
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    let mut page_request = PageRequest::new(req.path())
        .with_route_params(route_params)
        .with_query_params(query_params(req.query_string()))
        .with_body_params(body_params(req, body));

    let extensions = req.extensions();
    if let Some(MatchedElement(element)) = extensions.get::<MatchedElement>() {
        page_request = page_request.with_matched_element(element.clone());
    }
    if let Some(CurrentElement(element)) = extensions.get::<CurrentElement>() {
        page_request = page_request.with_current_element(element.clone());
    }

    page_request
}

fn query_params(query: &str) -> InertiaProps {
    match web::Query::<HashMap<String, String>>::from_query(query) {
        Ok(params) => params
            .into_inner()
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
        Err(err) => {
            log::warn!(
                "{}",
                inertia_err_msg(format!("Failed to parse request params: {}", err))
            );
            InertiaProps::new()
        }
    }
}

fn body_params(req: &HttpRequest, body: &[u8]) -> InertiaProps {
    if body.is_empty() {
        return InertiaProps::new();
    }

    match req.content_type() {
        "application/json" => match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(params)) => params,
            Ok(_) => InertiaProps::new(),
            Err(err) => {
                log::warn!(
                    "{}",
                    inertia_err_msg(format!("Failed to parse the JSON request body: {}", err))
                );
                InertiaProps::new()
            }
        },
        "application/x-www-form-urlencoded" => match std::str::from_utf8(body) {
            Ok(body) => query_params(body),
            Err(_) => InertiaProps::new(),
        },
        _ => InertiaProps::new(),
    }
}

#[cfg(test)]
mod test {
    use super::page_request;
    use crate::config::InertiaConfig;
    use crate::host::mock::MemoryEngine;
    use crate::host::{InertiaSession, MemorySession, SessionStore};
    use crate::inertia::{InertiaHttpRequest, InertiaResponder};
    use crate::providers::actix::headers::{
        InertiaHeader, X_INERTIA, X_INERTIA_LOCATION, X_INERTIA_PARTIAL_COMPONENT,
        X_INERTIA_PARTIAL_DATA, X_INERTIA_PARTIAL_EXCEPT,
    };
    use crate::req_type::PartialComponent;
    use crate::{Component, Inertia, InertiaError, InertiaVersion};
    use actix_web::body::MessageBody;
    use actix_web::http::header::{CONTENT_TYPE, LOCATION};
    use actix_web::http::StatusCode;
    use actix_web::{test, HttpMessage, ResponseError};
    use serde_json::{json, Map, Value};
    use std::str::from_utf8;
    use std::sync::Arc;

    fn inertia(engine: MemoryEngine) -> Inertia {
        Inertia::new(
            InertiaConfig::builder()
                .set_version(InertiaVersion::Literal("v1".into()))
                .build(),
            Arc::new(engine),
        )
    }

    fn body_json(body: impl MessageBody) -> Value {
        let bytes = body.try_into_bytes().unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    async fn test_get_partials_requirements() {
        let request = test::TestRequest::default()
            .insert_header((X_INERTIA_PARTIAL_COMPONENT, "/Index"))
            .insert_header((X_INERTIA_PARTIAL_DATA, "events, popularUsers,")) // not any props but events and popularUsers
            .insert_header((X_INERTIA_PARTIAL_EXCEPT, "auth")) // all props but auth
            .to_http_request();

        let partials = request.get_request_type().unwrap();

        assert_eq!(
            partials.partials(),
            Some(&PartialComponent {
                only: vec!["events".to_string(), "popularUsers".to_string()],
                except: vec!["auth".to_string()],
                component: Component("/Index".to_string())
            })
        )
    }

    #[test]
    async fn test_inertia_page() {
        let inertia = inertia(MemoryEngine::default());

        let mut props = Map::new();
        props.insert("title".into(), json!("My website's cool title!"));

        let fake_req = test::TestRequest::get()
            .insert_header(InertiaHeader::Inertia.convert())
            .insert_header(InertiaHeader::Version("v1").convert())
            .uri("/users")
            .to_http_request();

        let response = inertia
            .render_with_props(&fake_req, Component("Users/Index".into()), props)
            .await
            .unwrap();

        assert_eq!(response.headers().get(X_INERTIA).unwrap(), "true");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_json(response.into_body()),
            json!({
                "component": "Users/Index",
                "props": {"title": "My website's cool title!"},
                "url": "/users",
                "version": "v1"
            })
        );
    }

    #[test]
    async fn full_visits_render_the_root_view() {
        let inertia = inertia(MemoryEngine::default().with_template(
            "base.twig",
            "<div id=\"app\" data-page='{{ page }}'></div>",
        ));

        let req = test::TestRequest::get().uri("/").to_http_request();
        let response = inertia.render(&req, Component("Index".into())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(X_INERTIA).is_none());

        let body = response.into_body().try_into_bytes().unwrap();
        assert_eq!(
            from_utf8(&body).unwrap(),
            r#"<div id="app" data-page='{"component":"Index","props":{},"url":"/","version":"v1"}'></div>"#
        );
    }

    #[test]
    async fn one_shot_session_values_are_rendered_once() {
        let inertia = inertia(MemoryEngine::default());
        let session = Arc::new(MemorySession::new());
        session.set("recentElementSave", json!(7));

        let req = test::TestRequest::get()
            .insert_header(InertiaHeader::Inertia.convert())
            .uri("/saved")
            .to_http_request();
        req.extensions_mut()
            .insert(InertiaSession(session.clone() as Arc<dyn SessionStore>));

        let first = inertia.render(&req, Component("Saved".into())).await.unwrap();
        assert_eq!(
            body_json(first.into_body())["props"],
            json!({"recentElementSave": 7})
        );

        let second = inertia.render(&req, Component("Saved".into())).await.unwrap();
        assert_eq!(body_json(second.into_body())["props"], json!({}));
    }

    #[test]
    async fn location_forces_full_visits_for_inertia_requests() {
        let req = test::TestRequest::get().uri("/").to_http_request();
        let response = Inertia::location(&req, "/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");

        let req = test::TestRequest::get()
            .insert_header(InertiaHeader::Inertia.convert())
            .uri("/")
            .to_http_request();
        let response = Inertia::location(&req, "https://example.com/login");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(X_INERTIA_LOCATION).unwrap(),
            "https://example.com/login"
        );
    }

    #[test]
    async fn absolute_urls_include_scheme_and_host() {
        let req = test::TestRequest::get()
            .uri("/news?page=2")
            .insert_header(("host", "example.com"))
            .to_http_request();

        assert_eq!(req.absolute_url(), "http://example.com/news?page=2");
    }

    #[test]
    async fn page_requests_carry_query_and_body_params() {
        let req = test::TestRequest::post()
            .uri("/contact/?ref=footer&name=query")
            .insert_header((CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .to_http_request();

        let form = page_request(&req, b"name=Jane&inertiaTemplate=evil");

        assert_eq!(form.uri(), "contact");
        assert_eq!(
            Value::Object(form.request_params()),
            json!({"ref": "footer", "name": "Jane"})
        );

        let req = test::TestRequest::post()
            .uri("/contact")
            .insert_header((CONTENT_TYPE, "application/json"))
            .to_http_request();

        let json_body = page_request(&req, br#"{"name": "Jane", "tags": ["a"]}"#);

        assert_eq!(
            Value::Object(json_body.request_params()),
            json!({"name": "Jane", "tags": ["a"]})
        );
    }

    #[test]
    async fn errors_respond_with_their_status() {
        assert_eq!(
            ResponseError::status_code(&InertiaError::NotFound("about".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ResponseError::status_code(&InertiaError::ErrorTemplateNotFound("404".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
