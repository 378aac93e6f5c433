//! Dynamic field synchronization for the weather responder link.
//!
//! Periodically fetches a JSON document over HTTP, classifies the direct
//! members of one of its objects as strings, integers or floats, and
//! republishes each of them as a typed node in a [`NodeStore`].
//!
//! # Components
//!
//! - **Fetcher**: GETs the configured URL and returns the whole body
//! - **Decoder**: walks one JSON object and classifies its members
//! - **Synchronizer**: one fetch, decode and publish pass
//! - **Scheduler**: drives passes from a one-shot timer while connected
//!
//! ## Synchronization pass
//!
//! 1. **Fetch**: a transport failure ends the pass and leaves the store untouched
//! 2. **Raw publish**: the body is stored in the raw document node
//! 3. **Decode**: members are classified; unsupported ones are dropped
//! 4. **Publish**: every supported field is upserted, failures don't stop the rest
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weatherlink_store::NodeTree;
//! use weatherlink_sync::{FieldSynchronizer, HttpFetcher, SourceConfig};
//!
//! let settings = SourceConfig::default().settings().unwrap();
//! let fetcher = Arc::new(HttpFetcher::new(settings.request_timeout).unwrap());
//! let tree = Arc::new(NodeTree::new());
//! let synchronizer = FieldSynchronizer::new(fetcher, tree, &settings);
//! assert_eq!(synchronizer.raw_node_path().as_str(), "/OpenWeatherData");
//! ```
//!
//! [`NodeStore`]: weatherlink_store::NodeStore

mod config;
pub mod decode;
mod error;
pub mod fetch;
pub mod scheduler;
mod synchronizer;
pub mod timer;

pub use config::{SourceConfig, SourceSettings};
pub use decode::{FieldKind, FieldRecord, FieldValue, ScalarDecoder};
pub use error::{SyncError, SyncResult, TransportError};
pub use fetch::{Fetcher, HttpFetcher};
pub use scheduler::{PollScheduler, PollState, SchedulerStatus};
pub use synchronizer::{FieldSynchronizer, SyncReport};
pub use timer::{TaskScheduler, TokioTimer};
