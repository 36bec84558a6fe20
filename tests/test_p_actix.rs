mod common;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::{CONTENT_TYPE, LOCATION};
use actix_web::http::StatusCode;
use actix_web::web::{self, Data};
use actix_web::{test, App, HttpMessage, HttpResponse};
use common::template_engine::{templates_dir, FsEngine, ROOT_VIEW};
use inertia_cms::actix::headers::{InertiaHeader, X_INERTIA, X_INERTIA_LOCATION};
use inertia_cms::actix::InertiaMiddleware;
use inertia_cms::host::{
    ContentRepository, CsrfTokenIssuer, Element, ElementKind, InertiaSession, MemorySession,
    SessionStore, SiteId, SiteSettings,
};
use inertia_cms::{
    AssetFingerprinter, Inertia, InertiaConfig, InertiaService, InertiaVersion, LegacyRoute,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::TempDir;

struct NewsContent;

impl ContentRepository for NewsContent {
    fn element_by_uri(&self, uri: &str, site_id: SiteId) -> Option<Element> {
        (uri == "news/launch").then(|| Element {
            id: 12,
            kind: ElementKind::Entry,
            site_settings: vec![SiteSettings {
                site_id,
                template: "news/_entry".into(),
                uri_format: "news/{slug}".into(),
            }],
            attributes: json!({"title": "Launch"}),
        })
    }
}

struct FixedToken;

impl CsrfTokenIssuer for FixedToken {
    fn issue_token(&self, _session: Option<&dyn SessionStore>) -> String {
        "token-abc".into()
    }
}

fn site_templates() -> TempDir {
    templates_dir(&[
        ("base.twig", ROOT_VIEW),
        ("_partials/header.twig", "<header>{% prop 'header' \"Welcome\" %}</header>"),
        (
            "about.twig",
            "{% page 'About' %}{% pull '_partials/header' %}<h1>{% prop 'title' \"About us\" %}</h1>",
        ),
        (
            "events.twig",
            "{% page 'Events' %}{% prop 'events' [1, 2] %}{% prop 'categories' [\"music\"] %}",
        ),
        ("404.twig", "{% page 'Errors/NotFound' %}"),
        ("broken.twig", "{% fail 403 %}"),
        ("403.twig", "{% page 'Errors/Forbidden' %}"),
        ("legacy.twig", r#"{"component": "Legacy", "props": {"fromJson": true}}"#),
        ("news/_entry.twig", "{% page 'News/Entry' %}{% prop 'heading' \"News\" %}"),
        ("blog/_index.twig", "{% page 'Blog/Index' %}"),
        ("contact/_form.twig", "{% page 'Contact' %}"),
        (
            "_shared/site.twig",
            "{% prop 'siteName' \"Acme\" %}{% prop 'navigation' [\"home\", \"about\"] %}",
        ),
        ("_shared/user.html", "{% prop 'navigation' [\"duplicate\"] %}"),
    ])
}

fn inertia(templates: &TempDir) -> Data<Inertia> {
    let mut view_data = Map::new();
    view_data.insert("siteTitle".into(), json!("Acme"));

    let config = InertiaConfig::builder()
        .set_version(InertiaVersion::Literal("v1".into()))
        .add_legacy_route(LegacyRoute::new("blog/<page:\\d+>", "blog/_index").unwrap())
        .set_view_data(view_data)
        .build();

    Data::new(
        Inertia::new(config, Arc::new(FsEngine::new(templates.path())))
            .with_content_repository(Arc::new(NewsContent))
            .with_csrf_issuer(Arc::new(FixedToken)),
    )
}

// region: --- Service

fn generate_actix_app(
    inertia: Data<Inertia>,
    session: Arc<dyn SessionStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(inertia)
        .wrap(
            InertiaMiddleware::new().with_shared_props(Arc::new(|_req: &ServiceRequest| {
                let mut shared_props = Map::new();
                shared_props.insert("siteName".into(), json!("Seeded"));
                shared_props
            })),
        )
        .wrap_fn(move |req, srv| {
            req.extensions_mut()
                .insert(InertiaSession(Arc::clone(&session)));
            srv.call(req)
        })
        .route(
            "/items/{id}",
            web::put().to(|| async {
                HttpResponse::Found()
                    .insert_header((LOCATION, "/items"))
                    .finish()
            }),
        )
        .inertia_template_route("/contact", "contact/_form")
        .inertia_routes()
}

fn inertia_get(uri: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header(("host", "example.com"))
        .insert_header(InertiaHeader::Inertia.convert())
        .insert_header(InertiaHeader::Version("v1").convert())
}

async fn json_body(resp: ServiceResponse<impl MessageBody>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}

// endregion: --- Service

// region: --- Tests

#[actix_web::test]
async fn test_render_full_visit() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let req = test::TestRequest::get().uri("/about").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(X_INERTIA).is_none());
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();

    let page = json!({
        "component": "About",
        "props": {
            "header": "Welcome",
            "navigation": ["home", "about"],
            "siteName": "Seeded",
            "title": "About us"
        },
        "url": "/about",
        "version": "v1"
    });

    assert!(html.contains(&format!("data-page='{}'", page)));
    assert!(html.contains(r#"<meta name="csrf-token" content="token-abc">"#));
    assert!(html.contains("<title>Acme</title>"));
}

#[actix_web::test]
async fn test_render_inertia_visit() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let resp = test::call_service(&app, inertia_get("/about").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(X_INERTIA).unwrap(), "true");
    assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(
        json_body(resp).await,
        json!({
            "component": "About",
            "props": {
                "header": "Welcome",
                "navigation": ["home", "about"],
                "siteName": "Seeded",
                "title": "About us"
            },
            "url": "/about",
            "version": "v1"
        })
    );
}

#[actix_web::test]
async fn test_stale_version_forces_full_reload() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let req = inertia_get("/about")
        .insert_header(InertiaHeader::Version("v0").convert())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        resp.headers().get(X_INERTIA_LOCATION).unwrap(),
        "http://example.com/about"
    );
}

#[actix_web::test]
async fn test_partial_reload() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let req = inertia_get("/events")
        .insert_header(InertiaHeader::PartialComponent("Events").convert())
        .insert_header(InertiaHeader::PartialData(&["events", "siteName"]).convert())
        .to_request();
    let page = json_body(test::call_service(&app, req).await).await;
    assert_eq!(page["props"], json!({"events": [1, 2], "siteName": "Seeded"}));

    let req = inertia_get("/events")
        .insert_header(InertiaHeader::PartialComponent("Events").convert())
        .insert_header(InertiaHeader::PartialExcept(&["navigation", "siteName"]).convert())
        .to_request();
    let page = json_body(test::call_service(&app, req).await).await;
    assert_eq!(page["props"], json!({"events": [1, 2], "categories": ["music"]}));

    // a partial reload of another component gets every prop
    let req = inertia_get("/events")
        .insert_header(InertiaHeader::PartialComponent("About").convert())
        .insert_header(InertiaHeader::PartialData(&["events"]).convert())
        .to_request();
    let page = json_body(test::call_service(&app, req).await).await;
    assert_eq!(page["props"].as_object().map(|props| props.len()), Some(4));
}

#[actix_web::test]
async fn test_one_shot_session_values() {
    let templates = site_templates();
    let session = Arc::new(MemorySession::new());
    session.set("recentElementSave", json!(12));

    let app = test::init_service(generate_actix_app(inertia(&templates), session.clone())).await;

    let page = json_body(test::call_service(&app, inertia_get("/about").to_request()).await).await;
    assert_eq!(page["props"]["recentElementSave"], json!(12));

    let page = json_body(test::call_service(&app, inertia_get("/about").to_request()).await).await;
    assert!(page["props"].get("recentElementSave").is_none());
    assert!(!session.has("recentElementSave"));
}

#[actix_web::test]
async fn test_content_elements_and_routes() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let page =
        json_body(test::call_service(&app, inertia_get("/news/launch").to_request()).await).await;
    assert_eq!(page["component"], json!("News/Entry"));
    assert_eq!(page["props"]["slug"], json!("launch"));
    assert_eq!(page["props"]["heading"], json!("News"));
    assert!(page["props"].get("entry").is_none());

    let page = json_body(test::call_service(&app, inertia_get("/blog/2").to_request()).await).await;
    assert_eq!(page["component"], json!("Blog/Index"));
    assert_eq!(page["props"]["page"], json!("2"));

    let page = json_body(test::call_service(&app, inertia_get("/legacy").to_request()).await).await;
    assert_eq!(page["component"], json!("Legacy"));
    assert_eq!(page["props"]["fromJson"], json!(true));

    let req = test::TestRequest::post()
        .uri("/contact?ref=footer")
        .insert_header(InertiaHeader::Inertia.convert())
        .insert_header((CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload("name=Jane")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = json_body(resp).await;
    assert_eq!(page["component"], json!("Contact"));
    assert_eq!(page["props"]["ref"], json!("footer"));
    assert_eq!(page["props"]["name"], json!("Jane"));
}

#[actix_web::test]
async fn test_error_templates() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let resp = test::call_service(&app, inertia_get("/missing").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["component"], json!("Errors/NotFound"));

    let resp = test::call_service(&app, inertia_get("/broken").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(resp).await["component"], json!("Errors/Forbidden"));

    let req = test::TestRequest::get().uri("/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Errors/NotFound"));
}

#[actix_web::test]
async fn test_redirects_after_writes() {
    let templates = site_templates();
    let app = test::init_service(generate_actix_app(
        inertia(&templates),
        Arc::new(MemorySession::new()),
    ))
    .await;

    let req = test::TestRequest::put()
        .uri("/items/3")
        .insert_header(InertiaHeader::Inertia.convert())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/items");
}

#[actix_web::test]
async fn test_fingerprinted_version() {
    let templates = site_templates();
    let assets = templates_dir(&[("app.js", "console.log('hello')"), ("css/app.css", "body {}")]);

    let config = InertiaConfig::builder()
        .set_assets_dirs([assets.path().to_string_lossy().to_string()])
        .build();
    let inertia = Data::new(Inertia::new(
        config,
        Arc::new(FsEngine::new(templates.path())),
    ));
    let expected = AssetFingerprinter::new(true, vec![assets.path().to_path_buf()])
        .fingerprint()
        .await;

    let app = test::init_service(generate_actix_app(inertia, Arc::new(MemorySession::new()))).await;

    let req = test::TestRequest::get()
        .uri("/about")
        .insert_header(InertiaHeader::Inertia.convert())
        .insert_header(InertiaHeader::Version(&expected).convert())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["version"], json!(expected));
}

// endregion: --- Tests
