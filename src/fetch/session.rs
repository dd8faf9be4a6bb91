use anyhow::Result;
use backon::{BackoffBuilder, BlockingRetryable};
use std::cell::{Cell, RefCell};
use std::time::Duration;

use super::retry::RetryStrategy;
use super::{Fetcher, Response, RetryPolicy};
use crate::error::{ResolutionError, TransportError};
use crate::notifier::Notifier;

/// Hook invoked after every failed attempt, before the retry decision.
pub type FailureHook<'a> = &'a dyn Fn(&TransportError) -> Result<()>;

/// The single outbound HTTP session shared by every stage of a run.
///
/// Wraps a [`Fetcher`] with the run's [`RetryPolicy`], request logging and an
/// optional failure hook. Responses with an error status count as transport
/// failures and are retried like connection errors.
pub struct Session<'a> {
    fetcher: &'a dyn Fetcher,
    policy: RetryPolicy,
    notifier: &'a Notifier,
    on_failure: Option<FailureHook<'a>>,
}

impl<'a> Session<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, policy: RetryPolicy, notifier: &'a Notifier) -> Self {
        Self {
            fetcher,
            policy,
            notifier,
            on_failure: None,
        }
    }

    pub fn with_failure_hook(mut self, hook: FailureHook<'a>) -> Self {
        self.on_failure = Some(hook);
        self
    }

    pub fn notifier(&self) -> &Notifier {
        self.notifier
    }

    /// GET `url`, retrying transport failures according to the policy.
    ///
    /// # Errors
    /// [`ResolutionError::RetriesExhausted`] once a bounded policy runs out, or whatever
    /// the failure hook returns.
    pub fn get(&self, url: &str) -> Result<Response> {
        match self.policy.strategy() {
            RetryStrategy::Constant(builder) => self.get_with(url, builder),
            RetryStrategy::Exponential(builder) => self.get_with(url, builder),
        }
    }

    fn attempt(&self, url: &str) -> Result<Response, TransportError> {
        self.notifier.info(&format!("GET {}", url));

        let response = self.fetcher.get(url)?;
        if response.is_error() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    fn get_with<B: BackoffBuilder>(&self, url: &str, backoff: B) -> Result<Response> {
        let failed = Cell::new(0u32);
        let hook_error = RefCell::new(None);

        // `when` sees every failure, including the last one a bounded policy allows
        let outcome = (|| self.attempt(url))
            .retry(backoff)
            .when(|err: &TransportError| {
                failed.set(failed.get().saturating_add(1));
                self.notifier.warn(&err.to_string());

                match self.on_failure.map_or(Ok(()), |hook| hook(err)) {
                    Ok(()) => true,
                    Err(e) => {
                        *hook_error.borrow_mut() = Some(e);
                        false
                    }
                }
            })
            .notify(|_: &TransportError, delay: Duration| {
                if !delay.is_zero() {
                    self.notifier.debug(&format!(
                        "Retrying {} in {:?} (attempt {})",
                        url,
                        delay,
                        failed.get() + 1
                    ));
                }
            })
            .call();

        if let Some(err) = hook_error.into_inner() {
            return Err(err);
        }

        outcome.map_err(|source| {
            anyhow::Error::from(ResolutionError::RetriesExhausted {
                url: url.to_string(),
                attempts: failed.get(),
                source,
            })
        })
    }
}
