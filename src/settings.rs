use chrono::{DateTime, FixedOffset};

use crate::fetch::RetryPolicy;

pub const DEFAULT_ENDPOINT: &str = "http://labs.mementoweb.org/timemap/json/";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_COMMITTER: &str = "<donotreply@localhost>";
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Everything a run needs besides the subject URL.
#[derive(Debug, Clone)]
pub struct Settings {
    /// TimeMap service prefix; the subject URL is appended verbatim
    pub endpoint: String,
    pub branch: String,
    /// `[NAME ]<EMAIL>`
    pub committer: String,
    /// Defaults to the committer when absent
    pub author: Option<String>,
    /// Mementos captured before this instant are ignored
    pub since: Option<DateTime<FixedOffset>>,
    /// Parent of the first emitted commit
    pub parent: Option<String>,
    pub verbosity: u8,
    pub retry: RetryPolicy,
    pub max_redirects: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            committer: DEFAULT_COMMITTER.to_string(),
            author: None,
            since: None,
            parent: None,
            verbosity: 0,
            retry: RetryPolicy::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Settings {
    pub fn timemap_uri(&self, url: &str) -> String {
        format!("{}{}", self.endpoint, url)
    }

    pub fn author_identity(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.committer)
    }
}
