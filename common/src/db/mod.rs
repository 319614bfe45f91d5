//! Document store access.
//!
//! - [`ConnectionCache`]: lazily established, process-wide connection handle
//! - [`MongoConnector`]: MongoDB implementation of [`Connector`]

pub mod cache;
pub mod mongo;

pub use cache::{ConnectionCache, ConnectionState, Connector};
pub use mongo::MongoConnector;
