use std::cell::RefCell;
use std::collections::HashMap;

use super::{Fetcher, Response};
use crate::error::TransportError;

/// In-memory [`Fetcher`] answering from a table of canned responses.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Response>,
    failures: RefCell<HashMap<String, u32>>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for its own URL.
    pub fn respond(mut self, response: Response) -> Self {
        self.responses.insert(response.url.clone(), response);
        self
    }

    /// Fail the next `times` requests to `url` with a connection error.
    pub fn fail_times(self, url: &str, times: u32) -> Self {
        self.failures.borrow_mut().insert(url.to_string(), times);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.requests.borrow_mut().push(url.to_string());

        if let Some(remaining) = self.failures.borrow_mut().get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Connection {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                });
            }
        }

        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Connection {
                url: url.to_string(),
                message: "no scripted response".to_string(),
            })
    }
}
