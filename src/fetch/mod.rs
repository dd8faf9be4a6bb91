pub mod fetcher;
pub mod http;
pub mod links;
pub mod retry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{Fetcher, Response};
pub use http::HttpFetcher;
pub use links::Link;
pub use retry::{Backoff, RetryPolicy, RetryStrategy};
pub use session::Session;
