use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::Parser;
use std::io::{self, BufWriter};
use std::time::Duration;

use timemap2git::dates::parse_since;
use timemap2git::settings::{DEFAULT_BRANCH, DEFAULT_COMMITTER, DEFAULT_ENDPOINT};
use timemap2git::fetch::Backoff;
use timemap2git::{HttpFetcher, Notifier, RetryPolicy, Settings, TimeMapProcessor};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Download web archive history for URL to be piped to `git fast-import'",
    long_about = None
)]
struct Cli {
    #[arg(help = "URL whose archived history to download")]
    url: String,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Verbose mode (-v lists GET requests and redirects on stderr, -vv adds redirect handling, -vvv for trace)"
    )]
    verbose: u8,

    #[arg(
        short,
        long,
        value_name = "REF",
        default_value = DEFAULT_BRANCH,
        help = "Branch to make the commits on"
    )]
    branch: String,

    #[arg(
        short,
        long,
        value_name = "[NAME ]<EMAIL>",
        default_value = DEFAULT_COMMITTER,
        help = "Whom to list as committer"
    )]
    committer: String,

    #[arg(
        short,
        long,
        value_name = "[NAME ]<EMAIL>",
        help = "Whom to list as author (defaults to committer)"
    )]
    author: Option<String>,

    #[arg(
        short,
        long,
        value_name = "DATE",
        value_parser = parse_since,
        help = "Ignore information prior to DATE (copy-paste it from git log)"
    )]
    since: Option<DateTime<FixedOffset>>,

    #[arg(
        short,
        long,
        value_name = "COMMIT",
        help = "Give the first commit this parent (without it the first commit has no parent)"
    )]
    parent: Option<String>,

    #[arg(
        long,
        value_name = "URL",
        default_value = DEFAULT_ENDPOINT,
        help = "TimeMap service prefix the URL is appended to"
    )]
    endpoint: String,

    #[arg(
        long,
        value_name = "N",
        default_value_t = timemap2git::settings::DEFAULT_MAX_REDIRECTS,
        help = "Give up on a memento after following N redirects"
    )]
    max_redirects: usize,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 0,
        help = "Wait this long before repeating a failed request"
    )]
    retry_delay: u64,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            endpoint: self.endpoint.clone(),
            branch: self.branch.clone(),
            committer: self.committer.clone(),
            author: self.author.clone(),
            since: self.since,
            parent: self.parent.clone(),
            verbosity: self.verbose,
            retry: self.retry_policy(),
            max_redirects: self.max_redirects,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        match self.retry_delay {
            0 => RetryPolicy::unbounded(),
            secs => {
                RetryPolicy::unbounded().with_backoff(Backoff::Fixed(Duration::from_secs(secs)))
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings();

    let notifier = Notifier::new(settings.verbosity);
    notifier.debug(&format!("Branch: {}", settings.branch));
    notifier.debug(&format!("Committer: {}", settings.committer));
    if let Some(parent) = &settings.parent {
        notifier.debug(&format!("First parent: {}", parent));
    }

    let fetcher = HttpFetcher::new()?;
    let stdout = io::stdout();
    let out = BufWriter::new(stdout.lock());

    TimeMapProcessor::new(fetcher, settings, notifier)
        .run(&cli.url, out)
        .with_context(|| format!("Failed to convert archive history of {}", cli.url))?;

    Ok(())
}
