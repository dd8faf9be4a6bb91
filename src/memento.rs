//! Fetching one memento and flattening its same-instant redirects.
//!
//! Archives answer many captures with a redirect: `http://example.com` may have been
//! captured as a 301 to `http://example.com/`, or to a page archived a few seconds
//! later. [`MementoResolver`] follows redirects that stay inside the same capture and
//! records each one as a [`RedirectHop`] (a symlink in the resulting tree). A redirect
//! into a differently dated capture ends the chain with [`Terminal::Abandoned`].

use anyhow::Result;

use crate::error::ResolutionError;
use crate::fetch::{Response, Session};
use crate::paths::{derive_path, verbatim_uri, SNAPSHOT_MARKER};
use crate::timemap::Memento;

/// One followed redirect: the file at `path` becomes a symlink to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectHop {
    pub path: String,
    /// Original URI of the response the redirect led to
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    /// Raw content of the last response in the chain
    Blob { path: String, content: Vec<u8> },
    /// The chain crossed into another capture at this `Location`
    Abandoned { location: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMemento {
    pub hops: Vec<RedirectHop>,
    pub terminal: Terminal,
}

impl ResolvedMemento {
    /// True when nothing will be written for this memento.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty() && matches!(self.terminal, Terminal::Abandoned { .. })
    }
}

/// How a `Location` header value relates to the current capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `scheme://…`, fetched as is
    Absolute,
    /// Points into a different capture (contains the snapshot marker)
    Snapshot,
    /// Relative to the current response URL
    PathRelative,
}

pub fn classify_redirect(location: &str) -> RedirectKind {
    if has_scheme(location) {
        RedirectKind::Absolute
    } else if location.contains(SNAPSHOT_MARKER) {
        RedirectKind::Snapshot
    } else {
        RedirectKind::PathRelative
    }
}

fn has_scheme(location: &str) -> bool {
    let Some((scheme, rest)) = location.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && rest.starts_with("//")
}

/// Joins a path-relative `Location` onto the URL of the response that carried it.
///
/// A root-relative path (`/x`) replaces the path of the original URL while keeping the
/// archive, timestamp and original host; any other path replaces the last segment.
pub fn join_relative(current_url: &str, location: &str) -> String {
    let base_len = if location.starts_with('/') {
        let search_from = current_url
            .find(SNAPSHOT_MARKER)
            .map(|pos| pos + SNAPSHOT_MARKER.len() + 4)
            .unwrap_or("https://".len());
        current_url
            .get(search_from..)
            .and_then(|rest| rest.find('/'))
            .map(|pos| search_from + pos)
            .unwrap_or(current_url.len())
    } else {
        current_url.rfind('/').map(|pos| pos + 1).unwrap_or(0)
    };

    format!("{}{}", &current_url[..base_len], location)
}

pub struct MementoResolver<'s, 'a> {
    session: &'s Session<'a>,
    max_redirects: usize,
}

impl<'s, 'a> MementoResolver<'s, 'a> {
    pub fn new(session: &'s Session<'a>, max_redirects: usize) -> Self {
        Self {
            session,
            max_redirects,
        }
    }

    /// Fetches `memento` and follows its redirect chain to a terminal state.
    ///
    /// # Errors
    /// - [`ResolutionError::MissingOriginal`] when a response needed for a path or a
    ///   symlink target has no `rel="original"` link.
    /// - [`ResolutionError::TooManyRedirects`] when the chain exceeds the limit.
    /// - Whatever the session returns for failed requests.
    pub fn resolve(&self, memento: &Memento) -> Result<ResolvedMemento> {
        let first_url = verbatim_uri(&memento.uri);
        let mut response = self.session.get(&first_url)?;
        let mut hops = Vec::new();

        loop {
            let Some(location) = redirect_location(&response) else {
                let path = derive_path(&response.original_url()?)?;
                return Ok(ResolvedMemento {
                    hops,
                    terminal: Terminal::Blob {
                        path,
                        content: response.body,
                    },
                });
            };

            let notifier = self.session.notifier();
            notifier.info(&format!("Location: {}", location));

            let next_url = match classify_redirect(&location) {
                RedirectKind::Snapshot => {
                    notifier.debug(&format!(
                        "{} redirects to another capture, abandoning chain",
                        response.url
                    ));
                    return Ok(ResolvedMemento {
                        hops,
                        terminal: Terminal::Abandoned { location },
                    });
                }
                RedirectKind::Absolute => location,
                RedirectKind::PathRelative => join_relative(&response.url, &location),
            };

            if hops.len() >= self.max_redirects {
                return Err(ResolutionError::TooManyRedirects {
                    url: first_url,
                    limit: self.max_redirects,
                }
                .into());
            }

            let path = derive_path(&response.original_url()?)?;
            let next = self.session.get(&verbatim_uri(&next_url))?;
            let target = next.original_url()?;
            notifier.trace(&format!("Symlink {} -> {}", path, target));

            hops.push(RedirectHop { path, target });
            response = next;
        }
    }
}

fn redirect_location(response: &Response) -> Option<String> {
    if response.is_redirect() {
        response.location().map(str::to_string)
    } else {
        None
    }
}
