use backon::{ConstantBuilder, ExponentialBuilder};
use std::time::Duration;

/// Delay between two attempts of the same request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Retry immediately
    None,
    Fixed(Duration),
    /// Starts at `base`, doubles per failure, capped at `max`
    Exponential { base: Duration, max: Duration },
}

/// How often a failed request is repeated.
///
/// The default never gives up and never waits: a long archive crawl is expected to
/// outlive network outages, and a human stops it if needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// `None` retries forever
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

/// A [`RetryPolicy`] expressed as a `backon` builder.
#[derive(Debug)]
pub enum RetryStrategy {
    Constant(ConstantBuilder),
    Exponential(ExponentialBuilder),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::None,
        }
    }

    /// At most `attempts` tries in total, without delay.
    pub fn attempts(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
            backoff: Backoff::None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Retries allowed after the first attempt, `None` when unbounded.
    fn retries(&self) -> Option<usize> {
        self.max_attempts
            .map(|attempts| attempts.saturating_sub(1) as usize)
    }

    pub fn strategy(&self) -> RetryStrategy {
        match self.backoff {
            Backoff::None => RetryStrategy::Constant(self.constant(Duration::ZERO)),
            Backoff::Fixed(delay) => RetryStrategy::Constant(self.constant(delay)),
            Backoff::Exponential { base, max } => {
                let builder = ExponentialBuilder::default()
                    .with_min_delay(base)
                    .with_max_delay(max)
                    .with_factor(2.0);
                RetryStrategy::Exponential(match self.retries() {
                    Some(times) => builder.with_max_times(times),
                    None => builder.without_max_times(),
                })
            }
        }
    }

    fn constant(&self, delay: Duration) -> ConstantBuilder {
        let builder = ConstantBuilder::default().with_delay(delay);
        match self.retries() {
            Some(times) => builder.with_max_times(times),
            None => builder.without_max_times(),
        }
    }
}
