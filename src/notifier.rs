//! Unified diagnostics for a run.
//!
//! [`Notifier`] wraps `env_logger` (text logs) and `indicatif` (a spinner) under a single
//! verbosity switch. Everything it prints goes to standard error, which keeps standard
//! output free for the fast-import stream:
//! - [`VerbosityLevel::Quiet`] → no text logs; a spinner shows the request in flight and
//!   warnings are printed above it (or logged when stderr is not a terminal).
//! - [`VerbosityLevel::Info`] → one `GET <url>` line per request, the `Location` of every
//!   redirect, and per-memento progress.
//! - [`VerbosityLevel::Debug`]/[`VerbosityLevel::Trace`] → redirect decisions and internals.
//!
//! `RUST_LOG` is still honoured through [`env_logger::Env`].

use env_logger::Env;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{Level, LevelFilter, Log, Record};
use std::cell::RefCell;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerbosityLevel {
    Quiet = 0, // Spinner, no text logs
    Info = 1,  // GET requests and redirects
    Debug = 2, // Redirect handling
    Trace = 3,
}

impl From<u8> for VerbosityLevel {
    fn from(level: u8) -> Self {
        match level {
            0 => VerbosityLevel::Quiet,
            1 => VerbosityLevel::Info,
            2 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }
}

impl VerbosityLevel {
    fn to_log_level(self) -> LevelFilter {
        match self {
            VerbosityLevel::Quiet => LevelFilter::Warn,
            VerbosityLevel::Info => LevelFilter::Info,
            VerbosityLevel::Debug => LevelFilter::Debug,
            VerbosityLevel::Trace => LevelFilter::Trace,
        }
    }
}

pub struct Notifier {
    verbosity: VerbosityLevel,
    logger: env_logger::Logger,
    active_spinner: RefCell<Option<ProgressBar>>,
    #[cfg(test)]
    logged: RefCell<Vec<(Level, String)>>,
}

impl Notifier {
    pub fn new(verbosity_level: u8) -> Self {
        let verbosity = VerbosityLevel::from(verbosity_level);

        let logger = env_logger::Builder::from_env(Env::default())
            .filter_level(verbosity.to_log_level())
            .build();

        Self {
            verbosity,
            logger,
            active_spinner: RefCell::new(None),
            #[cfg(test)]
            logged: RefCell::new(Vec::new()),
        }
    }

    fn log(&self, level: Level, message: &str) {
        #[cfg(test)]
        self.logged.borrow_mut().push((level, message.to_string()));

        self.logger.log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(module_path!())
                .build(),
        );
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        if self.active_spinner.borrow().is_none() {
            let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
            {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            *self.active_spinner.borrow_mut() = Some(spinner);
        }

        if let Some(spinner) = self.active_spinner.borrow().as_ref() {
            f(spinner);
        }
    }

    pub fn info(&self, message: &str) {
        match self.verbosity {
            VerbosityLevel::Quiet => self.with_spinner(|spinner| {
                spinner.set_message(message.to_string());
            }),
            _ => self.log(Level::Info, message),
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            self.log(Level::Debug, message);
        }
    }

    pub fn warn(&self, message: &str) {
        match self.verbosity {
            // `println` is a no-op on a hidden draw target (stderr redirected)
            VerbosityLevel::Quiet => self.with_spinner(|spinner| {
                if spinner.is_hidden() {
                    self.log(Level::Warn, message);
                } else {
                    spinner.println(message);
                }
            }),
            _ => self.log(Level::Warn, message),
        }
    }

    pub fn trace(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            self.log(Level::Trace, message);
        }
    }

    /// Clears the spinner, if one was started.
    pub fn finish(&self) {
        if let Some(spinner) = self.active_spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
        self.logger.flush();
    }

    pub fn verbosity_level(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Messages that reached the text logger at `level`.
    #[cfg(test)]
    pub(crate) fn logged(&self, level: Level) -> Vec<String> {
        self.logged
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.finish();
    }
}
