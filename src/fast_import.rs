//! Writer for the `git fast-import` command stream.
//!
//! Each memento becomes one commit on a single linear branch:
//!
//! ```text
//! commit master
//! mark :2
//! author <donotreply@localhost> 978307200 +0000
//! committer <donotreply@localhost> 1700000000 +0100
//! data 0
//! from :1
//! M 120000 inline example.com
//! data 19
//! http://example.com/
//! M 644 inline example.com/index.html
//! data 7
//! <html/>
//! ```
//!
//! Marks start at 1 and grow by one per commit regardless of how many file entries a
//! commit carries. The first commit has no `from` line unless an external parent was
//! configured.

use chrono::{DateTime, FixedOffset, Local};
use std::io::{self, Write};

use crate::memento::{ResolvedMemento, Terminal};
use crate::timemap::Memento;

/// Source of committer timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local time zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Identities and branch shared by every commit of a stream.
#[derive(Debug, Clone)]
pub struct CommitTemplate {
    pub branch: String,
    pub committer: String,
    pub author: String,
    /// Parent of the very first commit
    pub parent: Option<String>,
}

pub struct FastImportEmitter<W: Write> {
    out: W,
    template: CommitTemplate,
    clock: Box<dyn Clock>,
    next_mark: u64,
    checkpoint_due: bool,
}

fn git_time(time: &DateTime<FixedOffset>) -> String {
    time.format("%s %z").to_string()
}

impl<W: Write> FastImportEmitter<W> {
    pub fn new(out: W, template: CommitTemplate, clock: Box<dyn Clock>) -> Self {
        Self {
            out,
            template,
            clock,
            next_mark: 1,
            checkpoint_due: false,
        }
    }

    /// Number of commits written so far.
    pub fn commits(&self) -> u64 {
        self.next_mark - 1
    }

    /// Writes the commit for `memento` and returns its mark.
    pub fn emit(&mut self, memento: &Memento, resolved: &ResolvedMemento) -> io::Result<u64> {
        let mark = self.next_mark;

        writeln!(self.out, "commit {}", self.template.branch)?;
        writeln!(self.out, "mark :{}", mark)?;
        writeln!(
            self.out,
            "author {} {}",
            self.template.author,
            git_time(&memento.datetime)
        )?;
        writeln!(
            self.out,
            "committer {} {}",
            self.template.committer,
            git_time(&self.clock.now())
        )?;
        writeln!(self.out, "data 0")?;

        if mark > 1 {
            writeln!(self.out, "from :{}", mark - 1)?;
        } else if let Some(parent) = &self.template.parent {
            writeln!(self.out, "from {}", parent)?;
        }

        for hop in &resolved.hops {
            writeln!(self.out, "M 120000 inline {}", hop.path)?;
            writeln!(self.out, "data {}", hop.target.len())?;
            writeln!(self.out, "{}", hop.target)?;
        }

        if let Terminal::Blob { path, content } = &resolved.terminal {
            writeln!(self.out, "M 644 inline {}", path)?;
            writeln!(self.out, "data {}", content.len())?;
            self.out.write_all(content)?;
            writeln!(self.out)?;
        }

        writeln!(self.out)?;
        self.out.flush()?;

        self.next_mark += 1;
        self.checkpoint_due = true;
        Ok(mark)
    }

    /// Asks the importer to persist what it has received, once per finished commit.
    ///
    /// Returns whether a checkpoint was written.
    pub fn checkpoint(&mut self) -> io::Result<bool> {
        if !self.checkpoint_due {
            return Ok(false);
        }
        writeln!(self.out, "checkpoint")?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.checkpoint_due = false;
        Ok(true)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
