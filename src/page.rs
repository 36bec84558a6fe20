use crate::inertia::Component;
use crate::props::InertiaProps;
use serde::{Deserialize, Serialize};

/// Response containing a valid Inertia Payload that will be used
/// by the Inertia client to render the components.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct InertiaPage {
    /// The name of the JavaScript page component.
    pub(crate) component: Component,
    /// The page props (data). A merge of every props source, filtered for partial reloads.
    pub(crate) props: InertiaProps,
    /// Page's URL. Must be a valid href.
    // this is the current request's url, i.e. the page url, not the application url.
    pub(crate) url: String,
    /// Current assets version.
    pub(crate) version: String,
}

impl InertiaPage {
    /// Instantiates an Inertia Page object to sent as http response,
    /// according to [Inertia Protocol].
    ///
    /// [Inertia Protocol]: https://inertiajs.com/the-protocol
    ///
    /// # Arguments
    /// * `component`   -   The name of the javascript page component (e.g. "/Me").
    ///                     An empty name falls back to "Index".
    /// * `url`         -   The current request's url. It can be a whole href or an absolute
    ///                     hostless path ("/me").
    /// * `version`     -   Current assets version. Used to assert assets are up-to-date. See
    ///                     [Inertia's assets versioning] page for more details.
    /// * `props`       -   A map of the page's props.
    ///
    /// [Inertia's assets versioning]: https://inertiajs.com/the-protocol#asset-versioning
    ///
    pub fn new(component: Component, url: String, version: String, props: InertiaProps) -> Self {
        let component = if component.0.is_empty() {
            Component("Index".into())
        } else {
            component
        };

        InertiaPage {
            component,
            url,
            props,
            version,
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn props(&self) -> &InertiaProps {
        &self.props
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
