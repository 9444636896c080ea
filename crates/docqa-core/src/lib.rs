//! docqa-core
//!
//! Domain types, error taxonomy, configuration and the format/topic
//! routing table shared by the ingestion, embedding, index and query
//! crates.

pub mod config;
pub mod error;
pub mod routing;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
