//! Lazy expansion of a (possibly paginated) JSON TimeMap into mementos.
//!
//! A TimeMap document may list mementos directly and/or point to further documents
//! covering sub-ranges:
//!
//! ```json
//! {
//!   "mementos": { "list": [ { "datetime": "2001-01-01T00:00:00Z", "uri": "http://…" } ] },
//!   "timemap_index": [ { "uri": "http://…", "from": "…", "until": "…" } ]
//! }
//! ```
//!
//! [`TimeMapWalker`] yields a document's mementos in list order, then descends into its
//! index entries depth-first. Documents are fetched only when the walk reaches them.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::vec;

use crate::dates::parse_memento_datetime;
use crate::error::ResolutionError;
use crate::fetch::Session;

#[derive(Debug, Deserialize)]
pub struct TimeMapDocument {
    #[serde(default)]
    pub mementos: Option<MementoList>,
    #[serde(default)]
    pub timemap_index: Vec<ChunkRef>,
}

#[derive(Debug, Deserialize)]
pub struct MementoList {
    pub list: Vec<MementoEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MementoEntry {
    pub datetime: String,
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct ChunkRef {
    pub uri: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub until: Option<String>,
}

/// One archived capture of the subject URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Memento {
    pub datetime: DateTime<FixedOffset>,
    /// Archived-copy URI as listed by the TimeMap (not yet rewritten for verbatim bytes)
    pub uri: String,
}

impl TimeMapDocument {
    pub fn parse(url: &str, body: &[u8]) -> Result<Self, ResolutionError> {
        serde_json::from_slice(body).map_err(|source| ResolutionError::MalformedTimeMap {
            url: url.to_string(),
            source,
        })
    }
}

struct Frame {
    mementos: vec::IntoIter<MementoEntry>,
    chunks: vec::IntoIter<ChunkRef>,
}

impl From<TimeMapDocument> for Frame {
    fn from(document: TimeMapDocument) -> Self {
        let mementos = document.mementos.map(|m| m.list).unwrap_or_default();
        Self {
            mementos: mementos.into_iter(),
            chunks: document.timemap_index.into_iter(),
        }
    }
}

/// Pull-based walk over a TimeMap and all of its chunks.
///
/// Mementos captured before `since` are skipped, and index entries whose `until`
/// boundary lies before `since` are not fetched at all. After the first error the
/// walker is exhausted.
pub struct TimeMapWalker<'s, 'a> {
    session: &'s Session<'a>,
    since: Option<DateTime<FixedOffset>>,
    root: Option<String>,
    stack: Vec<Frame>,
    finished: bool,
}

impl<'s, 'a> TimeMapWalker<'s, 'a> {
    pub fn new(
        session: &'s Session<'a>,
        root_uri: impl Into<String>,
        since: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            session,
            since,
            root: Some(root_uri.into()),
            stack: Vec::new(),
            finished: false,
        }
    }

    fn fetch_frame(session: &Session, url: &str) -> Result<Frame> {
        let response = session.get(url)?;
        let document = TimeMapDocument::parse(url, &response.body)?;
        session.notifier().debug(&format!(
            "TimeMap {}: {} mementos, {} chunks",
            url,
            document.mementos.as_ref().map_or(0, |m| m.list.len()),
            document.timemap_index.len()
        ));
        Ok(Frame::from(document))
    }

    fn advance(&mut self) -> Result<Option<Memento>> {
        if let Some(root) = self.root.take() {
            let frame = Self::fetch_frame(self.session, &root)?;
            self.stack.push(frame);
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some(entry) = frame.mementos.next() {
                let datetime = parse_memento_datetime(&entry.datetime)?;
                if let Some(since) = self.since {
                    if datetime < since {
                        self.session
                            .notifier()
                            .trace(&format!("Skipping {} captured {}", entry.uri, datetime));
                        continue;
                    }
                }
                return Ok(Some(Memento {
                    datetime,
                    uri: entry.uri,
                }));
            }

            if let Some(chunk) = frame.chunks.next() {
                if let (Some(since), Some(until)) = (self.since, chunk.until.as_deref()) {
                    if parse_memento_datetime(until)? < since {
                        self.session.notifier().debug(&format!(
                            "Pruning TimeMap chunk {} (until {})",
                            chunk.uri, until
                        ));
                        continue;
                    }
                }
                let child = Self::fetch_frame(self.session, &chunk.uri)?;
                self.stack.push(child);
                continue;
            }

            self.stack.pop();
        }
    }
}

impl Iterator for TimeMapWalker<'_, '_> {
    type Item = Result<Memento>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.advance() {
            Ok(Some(memento)) => Some(Ok(memento)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_since;
    use crate::fetch::testing::ScriptedFetcher;
    use crate::fetch::{Response, RetryPolicy};
    use crate::notifier::Notifier;

    const ROOT: &str = "http://tm.example/json/http://example.com/";

    fn json(url: &str, body: &str) -> Response {
        Response::new(url, 200).with_body(body.as_bytes().to_vec())
    }

    fn uris(mementos: &[Memento]) -> Vec<&str> {
        mementos.iter().map(|m| m.uri.as_str()).collect()
    }

    #[test]
    fn test_flat_timemap_in_list_order() {
        let fetcher = ScriptedFetcher::new().respond(json(
            ROOT,
            r#"{"original_uri": "http://example.com/",
                "mementos": {"list": [
                    {"datetime": "2001-01-01T00:00:00Z", "uri": "m1"},
                    {"datetime": "2002-01-01T00:00:00Z", "uri": "m2"}
                ]}}"#,
        ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);

        let mementos: Vec<Memento> = TimeMapWalker::new(&session, ROOT, None)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(uris(&mementos), vec!["m1", "m2"]);
        assert_eq!(mementos[0].datetime.timestamp(), 978307200);
    }

    #[test]
    fn test_since_filters_every_entry() {
        let fetcher = ScriptedFetcher::new().respond(json(
            ROOT,
            r#"{"mementos": {"list": [
                    {"datetime": "2001-01-01T00:00:00Z", "uri": "old"},
                    {"datetime": "2005-01-01T00:00:00Z", "uri": "new"},
                    {"datetime": "2002-01-01T00:00:00Z", "uri": "out-of-order"}
                ]}}"#,
        ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);
        let since = parse_since("2003-01-01").unwrap();

        let mementos: Vec<Memento> = TimeMapWalker::new(&session, ROOT, Some(since))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(uris(&mementos), vec!["new"]);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let fetcher = ScriptedFetcher::new().respond(json(
            ROOT,
            r#"{"mementos": {"list": [{"datetime": "2003-01-01T00:00:00Z", "uri": "edge"}]}}"#,
        ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);
        let since = parse_since("2003-01-01").unwrap();

        let mementos: Vec<Memento> = TimeMapWalker::new(&session, ROOT, Some(since))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(uris(&mementos), vec!["edge"]);
    }

    #[test]
    fn test_chunks_are_walked_depth_first() {
        let fetcher = ScriptedFetcher::new()
            .respond(json(
                ROOT,
                r#"{"mementos": {"list": [{"datetime": "2000-01-01T00:00:00Z", "uri": "root"}]},
                    "timemap_index": [
                        {"uri": "http://tm.example/a", "until": "2001-12-31T00:00:00Z"},
                        {"uri": "http://tm.example/b"}
                    ]}"#,
            ))
            .respond(json(
                "http://tm.example/a",
                r#"{"mementos": {"list": [{"datetime": "2001-01-01T00:00:00Z", "uri": "a1"}]},
                    "timemap_index": [{"uri": "http://tm.example/a/nested"}]}"#,
            ))
            .respond(json(
                "http://tm.example/a/nested",
                r#"{"mementos": {"list": [{"datetime": "2001-06-01T00:00:00Z", "uri": "a2"}]}}"#,
            ))
            .respond(json(
                "http://tm.example/b",
                r#"{"mementos": {"list": [{"datetime": "2002-01-01T00:00:00Z", "uri": "b1"}]}}"#,
            ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);

        let mementos: Vec<Memento> = TimeMapWalker::new(&session, ROOT, None)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(uris(&mementos), vec!["root", "a1", "a2", "b1"]);
    }

    #[test]
    fn test_chunks_ending_before_cutoff_are_not_fetched() {
        let fetcher = ScriptedFetcher::new()
            .respond(json(
                ROOT,
                r#"{"timemap_index": [
                        {"uri": "http://tm.example/old", "until": "2001-12-31T00:00:00Z"},
                        {"uri": "http://tm.example/new", "from": "2002-01-01T00:00:00Z"}
                    ]}"#,
            ))
            .respond(json(
                "http://tm.example/new",
                r#"{"mementos": {"list": [{"datetime": "2004-01-01T00:00:00Z", "uri": "n1"}]}}"#,
            ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);
        let since = parse_since("2003-01-01").unwrap();

        let mementos: Vec<Memento> = TimeMapWalker::new(&session, ROOT, Some(since))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(uris(&mementos), vec!["n1"]);
        assert!(!fetcher
            .requests()
            .contains(&"http://tm.example/old".to_string()));
    }

    #[test]
    fn test_chunks_are_fetched_lazily() {
        let fetcher = ScriptedFetcher::new()
            .respond(json(
                ROOT,
                r#"{"mementos": {"list": [{"datetime": "2000-01-01T00:00:00Z", "uri": "first"}]},
                    "timemap_index": [{"uri": "http://tm.example/next"}]}"#,
            ))
            .respond(json(
                "http://tm.example/next",
                r#"{"mementos": {"list": [{"datetime": "2001-01-01T00:00:00Z", "uri": "second"}]}}"#,
            ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);
        let mut walker = TimeMapWalker::new(&session, ROOT, None);

        assert_eq!(walker.next().unwrap().unwrap().uri, "first");
        assert_eq!(fetcher.requests(), vec![ROOT.to_string()]);

        assert_eq!(walker.next().unwrap().unwrap().uri, "second");
        assert_eq!(fetcher.requests().len(), 2);
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let fetcher = ScriptedFetcher::new().respond(json(ROOT, "{}"));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);

        assert_eq!(TimeMapWalker::new(&session, ROOT, None).count(), 0);
    }

    #[test]
    fn test_malformed_document_is_fatal_and_fuses() {
        let fetcher = ScriptedFetcher::new().respond(json(ROOT, "<html>not json</html>"));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);
        let mut walker = TimeMapWalker::new(&session, ROOT, None);

        let err = walker.next().unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolutionError>(),
            Some(ResolutionError::MalformedTimeMap { .. })
        ));
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_bad_memento_datetime_is_fatal() {
        let fetcher = ScriptedFetcher::new().respond(json(
            ROOT,
            r#"{"mementos": {"list": [{"datetime": "last tuesday", "uri": "m"}]}}"#,
        ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::attempts(1), &notifier);

        let err = TimeMapWalker::new(&session, ROOT, None)
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolutionError>(),
            Some(ResolutionError::InvalidDatetime { .. })
        ));
    }

    #[test]
    fn test_transport_failures_are_retried() {
        let fetcher = ScriptedFetcher::new().fail_times(ROOT, 3).respond(json(
            ROOT,
            r#"{"mementos": {"list": [{"datetime": "2000-01-01T00:00:00Z", "uri": "m"}]}}"#,
        ));
        let notifier = Notifier::new(0);
        let session = Session::new(&fetcher, RetryPolicy::unbounded(), &notifier);

        let mementos: Vec<Memento> = TimeMapWalker::new(&session, ROOT, None)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(mementos.len(), 1);
        assert_eq!(fetcher.requests().len(), 4);
    }
}
