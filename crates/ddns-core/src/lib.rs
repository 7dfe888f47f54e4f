// # ddns-core
//
// Provider-agnostic core for dynamic DNS record management.
//
// ## Architecture Overview
//
// - **Record / RR**: Generic records and the closed set of typed variants
// - **ProviderConfig**: TSIG key, server and resolver settings
// - **name**: Zone and record name normalization
// - **Record store traits**: Get, append, set and delete records in a zone
//
// Concrete providers (e.g. `ddns-provider-rfc2136`) implement the traits.

pub mod config;
pub mod error;
pub mod name;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, SigningAlgorithm};
pub use error::{Error, Result};
pub use record::{RR, Record};
pub use traits::{RecordAppender, RecordDeleter, RecordGetter, RecordSetter, RecordStore};
