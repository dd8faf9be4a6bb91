pub mod dates;
pub mod error;
pub mod fast_import;
pub mod fetch;
pub mod memento;
pub mod notifier;
pub mod paths;
pub mod processor;
pub mod settings;
pub mod timemap;

// Re-exports for easy access
pub use error::{ConfigurationError, ResolutionError, TransportError};
pub use fast_import::{Clock, FastImportEmitter, FixedClock, SystemClock};
pub use fetch::{Fetcher, HttpFetcher, Response, RetryPolicy, Session};
pub use memento::{MementoResolver, RedirectHop, ResolvedMemento, Terminal};
pub use notifier::Notifier;
pub use processor::{RunSummary, TimeMapProcessor};
pub use settings::Settings;
pub use timemap::{Memento, TimeMapWalker};
