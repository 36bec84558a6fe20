use std::error::Error;
use std::fmt;

use crate::host::TemplateError;

#[derive(Debug)]
pub enum InertiaError {
    SerializationError(String),
    HeaderError(String),
    /// No template or component answers the requested URI.
    NotFound(String),
    /// The host's content settings are incomplete, e.g. an entry without settings for the
    /// current site. Never retried.
    ConfigurationError(String),
    TemplateNotFound(String),
    ErrorTemplateNotFound(String),
    UriFormatError(String),
    RenderError(TemplateError),
    IoError(std::io::Error),
}

impl InertiaError {
    pub fn get_cause(&self) -> String {
        match self {
            Self::SerializationError(cause) => cause.clone(),
            Self::HeaderError(cause) => cause.clone(),
            Self::NotFound(uri) => format!("No template found for '{}'.", uri),
            Self::ConfigurationError(cause) => cause.clone(),
            Self::TemplateNotFound(template) => format!("Template not found: {}", template),
            Self::ErrorTemplateNotFound(template) => {
                format!("Error template not found: {}", template)
            }
            Self::UriFormatError(cause) => cause.clone(),
            Self::RenderError(err) => err.to_string(),
            Self::IoError(err) => err.to_string(),
        }
    }

    /// The HTTP status this error naturally maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::RenderError(TemplateError {
                status: Some(status),
                ..
            }) => *status,
            _ => 500,
        }
    }
}

impl fmt::Display for InertiaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_cause())
    }
}

impl Error for InertiaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RenderError(err) => Some(err),
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for InertiaError {
    fn from(err: TemplateError) -> Self {
        Self::RenderError(err)
    }
}

impl From<std::io::Error> for InertiaError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
