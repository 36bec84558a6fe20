use crate::context::RenderContext;
use crate::error::InertiaError;
use crate::host::{CsrfToken, Element, SessionStore, TemplateError, TemplateMode};
use crate::inertia::{Component, Inertia};
use crate::page::InertiaPage;
use crate::preprocess::TemplateInclusionPreprocessor;
use crate::props::{InertiaProps, PropExtractor, PropLayers};
use crate::req_type::{resolve_partial_props, InertiaRequestType};
use crate::resolver::{PageRequest, PageResolver, Resolution};
use crate::utils::inertia_err_msg;
use serde_json::Value;
use std::path::Path;

/// Extensions of the templates declaring shared props.
const SHARED_TEMPLATE_EXTENSIONS: [&str; 2] = ["twig", "html"];

/// A template rendered for the current request, before its props are merged with the
/// request-wide sources (shared props and one-shot session values).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTemplate {
    pub status: u16,
    pub component: Component,
    /// Variables the template was rendered with.
    pub variables: InertiaProps,
    /// Template-local assignments, when `auto_capture_variables` is enabled.
    pub captured: InertiaProps,
    /// Props the template declared.
    pub explicit: InertiaProps,
}

impl RenderedTemplate {
    /// Stacks the template's props on top of the request-wide sources.
    pub fn into_layers(self, one_shot: InertiaProps, shared: InertiaProps) -> (Component, PropLayers) {
        let layers = PropLayers {
            route: self.variables,
            one_shot,
            shared,
            captured: self.captured,
            explicit: self.explicit,
        };

        (self.component, layers)
    }
}

impl Inertia {
    pub fn resolver(&self) -> PageResolver<'_> {
        PageResolver::new(&self.config, &*self.engine, &*self.content)
    }

    /// Resolves and renders the template answering `request`.
    ///
    /// Unresolvable requests, and templates failing with an http status outside dev mode, are
    /// answered by the matching error template instead.
    pub async fn render_request(
        &self,
        request: &PageRequest,
    ) -> Result<RenderedTemplate, InertiaError> {
        let rendered = match self.resolver().resolve(request)? {
            Some(resolution) => {
                self.handle_matched_template(resolution, request.uri(), request.current_element())
                    .await
            }
            None => {
                log::debug!("No template answers {}", request.uri());
                Err(InertiaError::NotFound(request.uri().to_string()))
            }
        };

        match rendered {
            Ok(rendered) => Ok(rendered),
            Err(err) => {
                let status = self.triage(err)?;
                self.render_error(request, status).await
            }
        }
    }

    /// Renders a resolved template and collects the page it declares.
    pub async fn handle_matched_template(
        &self,
        resolution: Resolution,
        uri: &str,
        current_element: Option<&Element>,
    ) -> Result<RenderedTemplate, InertiaError> {
        let Resolution {
            template,
            mut variables,
            element,
        } = resolution;

        let mut element_keys: Vec<&str> = element
            .iter()
            .map(|element| element.kind.variable_name())
            .collect();

        if let Some(current) = current_element {
            let key = current.kind.variable_name();
            variables.insert(key.into(), current.to_value());
            element_keys.push(key);
        }

        let mut ctx = RenderContext::new(TemplateMode::Site);

        let source = TemplateInclusionPreprocessor::new(&*self.engine)
            .process(&template, &mut ctx)
            .await?;

        let output = self
            .engine
            .render_string(&source, &variables, &mut ctx)
            .await
            .map_err(|err| match err.template {
                Some(_) => err,
                None => err.with_template(template.as_str()),
            })?;

        let (component, explicit, captured) = self.collect_page(uri, &output, ctx);

        if !self.config.inject_element_as_prop {
            for key in element_keys {
                variables.remove(key);
            }
        }

        Ok(RenderedTemplate {
            status: 200,
            component,
            variables,
            captured,
            explicit,
        })
    }

    /// Gathers the component and the explicit props out of a rendered template.
    ///
    /// A component declared through the render context comes with the props printed as
    /// markers, overridden by the props declared through the context. Otherwise the whole
    /// output is read as a `{"component": ..., "props": ...}` JSON page.
    fn collect_page(
        &self,
        uri: &str,
        output: &str,
        ctx: RenderContext,
    ) -> (Component, InertiaProps, InertiaProps) {
        let (component, declared, captured) = ctx.into_parts();
        let captured = if self.config.auto_capture_variables {
            captured
        } else {
            InertiaProps::new()
        };

        let default_component = || {
            if uri.is_empty() {
                Component::from("Index")
            } else {
                Component::from(uri)
            }
        };

        let (component, mut explicit) = match component {
            Some(component) => {
                let extraction = PropExtractor::extract(output, InertiaProps::new());
                (component, extraction.props)
            }
            None => match serde_json::from_str::<Value>(output.trim()) {
                Ok(Value::Object(mut page)) => {
                    let component = match page.remove("component") {
                        Some(Value::String(component)) => Component(component),
                        _ => default_component(),
                    };
                    let props = match page.remove("props") {
                        Some(Value::Object(props)) => props,
                        _ => InertiaProps::new(),
                    };
                    (component, props)
                }
                Ok(_) => {
                    log::warn!(
                        "{}",
                        inertia_err_msg(
                            "Template output is not a JSON page. Using default page component and props.".into()
                        )
                    );
                    (default_component(), InertiaProps::new())
                }
                Err(err) => {
                    log::warn!(
                        "{}",
                        inertia_err_msg(format!(
                            "JSON decoding failed: {}. Using default page component and props.",
                            err
                        ))
                    );
                    (default_component(), InertiaProps::new())
                }
            },
        };

        explicit.extend(declared);
        (component, explicit, captured)
    }

    /// Props shared by every page: `seed` first, then the props declared by every template of
    /// the shared directory, in file name order. The first declaration of a key wins.
    pub async fn shared_props(&self, seed: InertiaProps) -> InertiaProps {
        let directory = self.template_path(&self.config.shared_directory);
        let path = self.engine.templates_path().join(&directory);

        let mut props = seed;
        for file_name in shared_templates(&path).await {
            let template = format!("{}/{}", directory, file_name);
            if !self.engine.template_exists(&template, TemplateMode::Site) {
                continue;
            }

            let mut ctx = RenderContext::new(TemplateMode::Site);
            let output = match self
                .engine
                .render_template(&template, &InertiaProps::new(), &mut ctx)
                .await
            {
                Ok(output) => output,
                Err(err) => {
                    log::error!(
                        "{}",
                        inertia_err_msg(format!("Failed to render shared props template: {}", err))
                    );
                    continue;
                }
            };

            props = PropExtractor::extract(&output, props).props;

            let (_, declared, _) = ctx.into_parts();
            for (key, value) in declared {
                props.entry(key).or_insert(value);
            }
        }

        props
    }

    /// Reads and clears every one-shot session value, so each surfaces in a single response.
    pub fn take_one_shot_props(&self, session: Option<&dyn SessionStore>) -> InertiaProps {
        let Some(session) = session else {
            return InertiaProps::new();
        };

        self.config
            .one_shot_session_keys
            .iter()
            .filter_map(|key| session.take(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Merges the prop layers and filters them for partial reloads.
    pub fn compose_page(
        &self,
        component: Component,
        layers: PropLayers,
        url: String,
        version: String,
        req_type: &InertiaRequestType,
    ) -> InertiaPage {
        let props = resolve_partial_props(layers.merge(), req_type, &component);
        InertiaPage::new(component, url, version, props)
    }

    /// Renders the root template of full visits.
    pub async fn render_shell(
        &self,
        page: &InertiaPage,
        csrf_token: Option<&CsrfToken>,
    ) -> Result<String, InertiaError> {
        let mut variables = self.config.view_data.clone();
        variables.insert(
            "page".into(),
            serde_json::to_value(page)
                .map_err(|err| InertiaError::SerializationError(err.to_string()))?,
        );

        if let Some(CsrfToken(token)) = csrf_token {
            variables.insert("csrfToken".into(), Value::String(token.clone()));
        }

        let view = self.template_path(&self.config.view);
        let mut ctx = RenderContext::new(TemplateMode::Site);

        self.engine
            .render_template(&view, &variables, &mut ctx)
            .await
            .map_err(|err| {
                log::error!(
                    "{}",
                    inertia_err_msg(format!("Failed to render the root view: {}", err))
                );
                InertiaError::from(err)
            })
    }

    /// Decides whether a failed render is answered by an error template. Unresolvable requests
    /// always are. Template errors carrying an http status are, unless in dev mode; any other
    /// error is logged and propagated.
    fn triage(&self, err: InertiaError) -> Result<u16, InertiaError> {
        if let InertiaError::NotFound(_) = &err {
            return Ok(err.status_code());
        }

        if let InertiaError::RenderError(TemplateError {
            status: Some(status),
            ..
        }) = &err
        {
            if !self.config.dev_mode {
                return Ok(*status);
            }
        }

        match &err {
            InertiaError::RenderError(err) => log::error!(
                "{}",
                inertia_err_msg(format!("Template rendering failed: {}", err))
            ),
            err => log::error!(
                "{}",
                inertia_err_msg(format!("Error processing Inertia template: {}", err))
            ),
        }

        Err(err)
    }

    /// Answers `request` with the error template for `status`.
    pub async fn render_error(
        &self,
        request: &PageRequest,
        status: u16,
    ) -> Result<RenderedTemplate, InertiaError> {
        let code = status.to_string();
        let template = self.template_path(&self.resolve_error_template(&code));

        if !self.engine.template_exists(&template, TemplateMode::Site) {
            log::error!(
                "{}",
                inertia_err_msg(format!("Error template not found: {}", template))
            );
            return Err(InertiaError::ErrorTemplateNotFound(template));
        }

        let resolution = Resolution {
            template,
            variables: request.variables(),
            element: None,
        };

        let mut rendered = self.handle_matched_template(resolution, &code, None).await?;
        rendered.status = status;
        Ok(rendered)
    }

    /// `{prefix}{code}`, else `{prefix}error`, else the bare code.
    pub(crate) fn resolve_error_template(&self, code: &str) -> String {
        let prefix = &self.config.error_template_prefix;

        [format!("{}{}", prefix, code), format!("{}error", prefix)]
            .into_iter()
            .find(|candidate| {
                self.engine
                    .template_exists(&self.template_path(candidate), TemplateMode::Site)
            })
            .unwrap_or_else(|| code.to_string())
    }
}

/// File names of the shared props templates in `directory`, sorted. A missing directory has
/// none.
async fn shared_templates(directory: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_template = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| SHARED_TEMPLATE_EXTENSIONS.contains(&extension));

        if !is_template {
            continue;
        }

        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            names.push(name.to_string());
        }
    }

    names.sort();
    names
}
