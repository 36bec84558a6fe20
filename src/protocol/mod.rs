//! The Inertia wire protocol, independent of any http library.
//!
//! A visit is classified once from the request (`X-Inertia` present or not); the opted http
//! library then asks it whether the handler may run at all, and how the handler's response
//! must be adjusted.

mod http_method;

pub use http_method::HttpMethod;

pub const FOUND: u16 = 302;
pub const SEE_OTHER: u16 = 303;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// First load, or any request not issued by the Inertia client router.
    Full,
    /// A request issued by the Inertia client router. `method` is `None` for methods the
    /// protocol has no rule for.
    Inertia { method: Option<HttpMethod> },
}

/// Adjustments to apply to the handler's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseAdjustment {
    /// Whether to confirm the protocol (`X-Inertia: true`, JSON body).
    pub confirm_protocol: bool,
    pub status: u16,
}

impl Visit {
    pub fn new(is_inertia_request: bool, method: &str) -> Self {
        if !is_inertia_request {
            return Self::Full;
        }

        Self::Inertia {
            method: method.parse().ok(),
        }
    }

    pub fn is_inertia(&self) -> bool {
        matches!(self, Self::Inertia { .. })
    }

    /// Whether the assets version must be resolved to answer this visit: only GET visits
    /// carrying a version header are checked.
    pub fn checks_version(&self, client_version: Option<&str>) -> bool {
        client_version.is_some()
            && matches!(
                self,
                Self::Inertia {
                    method: Some(HttpMethod::Get)
                }
            )
    }

    /// Whether the client's assets are outdated, in which case the handler must not run and
    /// the client is told to reload the whole page (409 + `X-Inertia-Location`).
    pub fn requires_full_reload(&self, client_version: Option<&str>, current_version: &str) -> bool {
        self.checks_version(client_version)
            && client_version.is_some_and(|client_version| client_version != current_version)
    }

    pub fn adjust_response(&self, status: u16) -> ResponseAdjustment {
        match self {
            Self::Full => ResponseAdjustment {
                confirm_protocol: false,
                status,
            },
            Self::Inertia { method } => ResponseAdjustment {
                confirm_protocol: (200..300).contains(&status),
                status: adjust_redirect_status(*method, status),
            },
        }
    }
}

/// A 302 answering PUT, PATCH or DELETE becomes a 303, so the browser follows it with a GET
/// instead of replaying the write.
pub fn adjust_redirect_status(method: Option<HttpMethod>, status: u16) -> u16 {
    match method {
        Some(method) if status == FOUND && method.is_replayed_on_redirect() => SEE_OTHER,
        _ => status,
    }
}
