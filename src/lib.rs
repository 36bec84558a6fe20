mod config;
mod context;
mod error;
pub mod host;
mod inertia;
mod page;
mod preprocess;
mod props;
pub mod protocol;
mod providers;
mod renderer;
mod req_type;
mod resolver;
mod routes;
mod utils;
mod version;

pub use config::{InertiaConfig, InertiaConfigBuilder};
pub use context::{RenderContext, TemplateModeGuard};
pub use error::InertiaError;
pub use inertia::{Component, Inertia, InertiaResponder, InertiaService, InertiaVersion};
pub use page::InertiaPage;
pub use preprocess::TemplateInclusionPreprocessor;
pub use props::{prop_marker, InertiaProps, PropExtraction, PropExtractor, PropLayers};
pub use renderer::RenderedTemplate;
pub use req_type::{resolve_partial_props, InertiaRequestType, PartialComponent};
pub use resolver::{extract_uri_parameters, PageRequest, PageResolver, Resolution};
pub use routes::{LegacyRoute, LegacyRoutes};
pub use version::{AssetFingerprinter, NO_VERSIONING};

#[cfg(feature = "actix")]
pub use providers::actix;
