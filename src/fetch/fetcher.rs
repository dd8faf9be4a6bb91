use crate::error::{ResolutionError, TransportError};

use super::links::{self, Link};

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// A blocking HTTP GET that never follows redirects on its own.
///
/// The pipeline interprets 3xx responses itself, so implementations must hand them
/// back untouched. Any status is a successful fetch here; status checks happen in
/// [`super::Session`].
pub trait Fetcher {
    /// Returns a short name used in diagnostics
    fn name(&self) -> &str;

    fn get(&self, url: &str) -> Result<Response, TransportError>;
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The URL that was requested (no redirects are followed, so it is also the effective URL)
    pub url: String,
    pub status: u16,
    /// Header names are stored lowercase
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn is_redirect(&self) -> bool {
        self.location().is_some() && REDIRECT_STATUSES.contains(&self.status)
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// All links from every `Link` header, in header order.
    pub fn links(&self) -> Vec<Link> {
        self.headers
            .iter()
            .filter(|(key, _)| key == "link")
            .flat_map(|(_, value)| links::parse_link_header(value))
            .collect()
    }

    /// The logical URL of the archived resource, from the `rel="original"` link.
    pub fn original_url(&self) -> Result<String, ResolutionError> {
        self.links()
            .into_iter()
            .find(|link| link.has_rel("original"))
            .map(|link| link.url)
            .ok_or_else(|| ResolutionError::MissingOriginal {
                url: self.url.clone(),
            })
    }
}
