use crate::error::InertiaError;
use crate::host::TemplateMode;
use crate::inertia::Component;
use crate::props::{prop_marker, InertiaProps};
use serde_json::{json, Value};
use std::ops::{Deref, DerefMut};

/// Request-scoped state shared between Inertia and the template being rendered.
///
/// Template helpers run deep inside the host engine and have no return channel to Inertia;
/// they record their declarations here instead. A fresh context is created for every
/// rendered template, so nothing leaks into the next request handled by the same worker.
#[derive(Debug, Default)]
pub struct RenderContext {
    template_mode: TemplateMode,
    component: Option<Component>,
    props: InertiaProps,
    captured: InertiaProps,
}

impl RenderContext {
    pub fn new(template_mode: TemplateMode) -> Self {
        Self {
            template_mode,
            ..Default::default()
        }
    }

    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    /// Forces site template lookups until the returned guard is dropped, then restores the
    /// previous mode.
    pub fn site_mode(&mut self) -> TemplateModeGuard<'_> {
        TemplateModeGuard::new(self, TemplateMode::Site)
    }

    /// The `page()` template helper: declares the component answering the request.
    pub fn page(&mut self, component: impl Into<Component>) {
        self.component = Some(component.into());
    }

    /// The legacy `inertia(component, props)` helper. Declares both the component and its
    /// props and returns the JSON page the helper prints.
    pub fn inertia(
        &mut self,
        component: impl Into<Component>,
        props: InertiaProps,
    ) -> Result<String, InertiaError> {
        let component = component.into();
        let output = serde_json::to_string(&json!({
            "component": component,
            "props": props,
        }))
        .map_err(|err| InertiaError::SerializationError(err.to_string()))?;

        self.component = Some(component);
        self.props.extend(props);
        Ok(output)
    }

    /// The `prop(name, value)` template helper: returns the marker the template prints.
    pub fn prop(&self, name: &str, value: &Value) -> Result<String, InertiaError> {
        prop_marker(name, value)
    }

    /// Declares a prop explicitly, overriding any marker with the same key.
    pub fn set_prop(&mut self, name: impl Into<String>, value: Value) {
        self.props.insert(name.into(), value);
    }

    pub fn set_props(&mut self, props: InertiaProps) {
        self.props.extend(props);
    }

    /// Records a template-local assignment (`{% set name = value %}`).
    pub fn capture(&mut self, name: &str, value: Value) {
        self.captured.insert(name.to_string(), value);
    }

    pub fn component(&self) -> Option<&Component> {
        self.component.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Option<Component>, InertiaProps, InertiaProps) {
        (self.component, self.props, self.captured)
    }
}

/// Scoped template mode switch. The previous mode is restored on drop, whichever way the
/// scope is left.
pub struct TemplateModeGuard<'a> {
    ctx: &'a mut RenderContext,
    previous: TemplateMode,
}

impl<'a> TemplateModeGuard<'a> {
    fn new(ctx: &'a mut RenderContext, mode: TemplateMode) -> Self {
        let previous = ctx.template_mode;
        ctx.template_mode = mode;
        Self { ctx, previous }
    }
}

impl Deref for TemplateModeGuard<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for TemplateModeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for TemplateModeGuard<'_> {
    fn drop(&mut self) {
        self.ctx.template_mode = self.previous;
    }
}
