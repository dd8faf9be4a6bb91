//! End-to-end "TimeMap → fast-import stream" pipeline orchestrator.
//!
//! [`TimeMapProcessor`] walks the TimeMap of a URL, resolves every memento and writes
//! one commit per memento, strictly in TimeMap order:
//! - [`crate::timemap::TimeMapWalker`] yields mementos lazily,
//! - [`crate::memento::MementoResolver`] fetches each one and flattens its redirects,
//! - [`crate::fast_import::FastImportEmitter`] appends the commit to the output.
//!
//! A memento is fully resolved before its commit is started, and its commit is fully
//! written before the next memento is fetched, so the stream never references a mark
//! that has not been written yet.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::io::Write;

use crate::error::TransportError;
use crate::fast_import::{Clock, CommitTemplate, FastImportEmitter, SystemClock};
use crate::fetch::{Fetcher, Session};
use crate::memento::{MementoResolver, Terminal};
use crate::notifier::Notifier;
use crate::settings::Settings;
use crate::timemap::TimeMapWalker;

/// What a run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub commits: u64,
    /// Commits whose redirect chain crossed into another capture
    pub abandoned: u64,
    /// Commits without any file entry
    pub empty: u64,
    pub checkpoints: u64,
}

pub struct TimeMapProcessor<F: Fetcher> {
    fetcher: F,
    settings: Settings,
    notifier: Notifier,
    clock: Box<dyn Clock>,
}

impl<F: Fetcher> TimeMapProcessor<F> {
    pub fn new(fetcher: F, settings: Settings, notifier: Notifier) -> Self {
        Self {
            fetcher,
            settings,
            notifier,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the committer clock (tests use a fixed one).
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Converts the archive history of `url` into a fast-import stream written to `out`.
    ///
    /// # Errors
    /// Any fatal [`crate::error::ResolutionError`] from the walk or a memento, and I/O
    /// errors on `out`. Commits written before the error stay valid; rerun with
    /// `since`/`parent` to continue the history.
    pub fn run<W: Write>(self, url: &str, out: W) -> Result<RunSummary> {
        let Self {
            fetcher,
            settings,
            notifier,
            clock,
        } = self;

        let template = CommitTemplate {
            branch: settings.branch.clone(),
            committer: settings.committer.clone(),
            author: settings.author_identity().to_string(),
            parent: settings.parent.clone(),
        };
        let emitter = RefCell::new(FastImportEmitter::new(out, template, clock));
        let checkpoints = RefCell::new(0u64);

        // Fetches never overlap with emission, so the emitter is free whenever this runs
        let checkpoint_on_failure = |_: &TransportError| -> Result<()> {
            if emitter
                .borrow_mut()
                .checkpoint()
                .context("Failed to write checkpoint")?
            {
                *checkpoints.borrow_mut() += 1;
            }
            Ok(())
        };

        let session = Session::new(&fetcher, settings.retry, &notifier)
            .with_failure_hook(&checkpoint_on_failure);
        let resolver = MementoResolver::new(&session, settings.max_redirects);
        let root = settings.timemap_uri(url);

        notifier.info(&format!(
            "Reading TimeMap of {} using {} fetcher",
            url,
            fetcher.name()
        ));
        notifier.debug(&format!("TimeMap URI: {}", root));
        if let Some(since) = settings.since {
            notifier.debug(&format!("Ignoring mementos before {}", since));
        }

        let mut summary = RunSummary::default();

        for memento in TimeMapWalker::new(&session, root, settings.since) {
            let memento = memento?;
            notifier.info(&format!("Memento {} ({})", memento.uri, memento.datetime));

            let resolved = resolver
                .resolve(&memento)
                .with_context(|| format!("Failed to resolve memento {}", memento.uri))?;

            if resolved.is_empty() {
                notifier.warn(&format!(
                    "Memento {} redirects to another capture; writing an empty commit",
                    memento.uri
                ));
                summary.empty += 1;
            }
            if matches!(resolved.terminal, Terminal::Abandoned { .. }) {
                summary.abandoned += 1;
            }

            let mark = emitter
                .borrow_mut()
                .emit(&memento, &resolved)
                .context("Failed to write commit")?;
            notifier.debug(&format!(
                "Wrote commit :{} with {} symlink(s)",
                mark,
                resolved.hops.len()
            ));
        }

        summary.commits = emitter.borrow().commits();
        summary.checkpoints = *checkpoints.borrow();
        emitter
            .into_inner()
            .finish()
            .context("Failed to flush output stream")?;

        notifier.info(&format!(
            "Done: {} commits ({} abandoned redirect chains, {} empty)",
            summary.commits, summary.abandoned, summary.empty
        ));
        notifier.finish();

        Ok(summary)
    }
}
