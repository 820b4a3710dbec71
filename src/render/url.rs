//! Deferred render URLs.

use ::url::form_urlencoded;

/// Builds the URL the web layer routes back into [`RenderService::show`].
///
/// [`RenderService::show`]: super::RenderService::show
pub trait UrlBuilder: Send + Sync {
    fn render_url(&self, reference: &str, profile: &str) -> String;
}

/// `<route>?path=<reference>&type=<profile>` with both values form-encoded.
#[derive(Debug, Clone)]
pub struct RouteUrlBuilder {
    route: String,
}

impl RouteUrlBuilder {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }
}

impl UrlBuilder for RouteUrlBuilder {
    fn render_url(&self, reference: &str, profile: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("path", reference)
            .append_pair("type", profile)
            .finish();
        let separator = if self.route.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.route, separator, query)
    }
}
