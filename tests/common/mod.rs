//! Common utilities for pipeline tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use timemap2git::{Fetcher, Response, TransportError};

pub const ENDPOINT: &str = "http://timemap.test/json/";
pub const SUBJECT: &str = "http://example.com/";

/// Archived-copy URI as listed in a TimeMap
pub fn archived(timestamp: &str, original: &str) -> String {
    format!("http://web.archive.org/web/{}/{}", timestamp, original)
}

/// The same URI once rewritten for verbatim content
pub fn verbatim(timestamp: &str, original: &str) -> String {
    format!("http://web.archive.org/web/{}id_/{}", timestamp, original)
}

fn original_link(original: &str) -> String {
    format!(
        "<{}>; rel=\"original\", <{}{}>; rel=\"timemap\"; type=\"application/json\"",
        original, ENDPOINT, original
    )
}

/// A captured page served with status 200
pub fn capture(timestamp: &str, original: &str, body: &[u8]) -> Response {
    Response::new(verbatim(timestamp, original), 200)
        .with_header("Link", original_link(original))
        .with_body(body.to_vec())
}

/// A captured redirect
pub fn captured_redirect(timestamp: &str, original: &str, location: &str) -> Response {
    Response::new(verbatim(timestamp, original), 302)
        .with_header("Location", location)
        .with_header("Link", original_link(original))
}

/// A TimeMap JSON document
pub fn timemap(
    url: &str,
    mementos: &[(&str, String)],
    chunks: &[(&str, Option<&str>)],
) -> Response {
    let list: Vec<serde_json::Value> = mementos
        .iter()
        .map(|(datetime, uri)| serde_json::json!({ "datetime": datetime, "uri": uri }))
        .collect();
    let index: Vec<serde_json::Value> = chunks
        .iter()
        .map(|(uri, until)| match until {
            Some(until) => serde_json::json!({ "uri": uri, "until": until }),
            None => serde_json::json!({ "uri": uri }),
        })
        .collect();

    let mut document = serde_json::json!({ "original_uri": SUBJECT });
    if !list.is_empty() {
        document["mementos"] = serde_json::json!({ "list": list });
    }
    if !index.is_empty() {
        document["timemap_index"] = serde_json::Value::Array(index);
    }

    Response::new(url, 200).with_body(document.to_string())
}

/// Fake archive: answers from a table and records every request.
///
/// Clones share their state, so a test can keep a handle after giving one to the
/// processor.
#[derive(Clone, Default)]
pub struct FakeArchive {
    responses: Rc<RefCell<HashMap<String, Response>>>,
    failures: Rc<RefCell<HashMap<String, u32>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, response: Response) -> &Self {
        self.responses
            .borrow_mut()
            .insert(response.url.clone(), response);
        self
    }

    pub fn fail(&self, url: &str, times: u32) -> &Self {
        self.failures.borrow_mut().insert(url.to_string(), times);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for FakeArchive {
    fn name(&self) -> &str {
        "fake"
    }

    fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.requests.borrow_mut().push(url.to_string());

        if let Some(remaining) = self.failures.borrow_mut().get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Connection {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                });
            }
        }

        Ok(self
            .responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Response::new(url, 404)))
    }
}
