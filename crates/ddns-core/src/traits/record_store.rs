// # Record Store Traits
//
// The interface a record-store client (an ACME solver, a DDNS loop) uses to
// read and mutate a zone through a provider.
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{Record, RecordAppender};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* RecordStore implementation */;
//
//     provider
//         .append_records("example.com.", &[Record::txt("_acme-challenge", "abc123")])
//         .await?;
//
//     Ok(())
// }
// ```
//
// ## Partial application
//
// Batches are applied one record at a time with no rollback. If record k of
// n fails, records 1..k-1 have already been applied on the server and the
// call returns the error of record k.

use async_trait::async_trait;

use crate::Result;
use crate::record::Record;

/// Reads the records currently discoverable for a zone
#[async_trait]
pub trait RecordGetter: Send + Sync {
    /// List address and text records for `zone`
    ///
    /// Zero records is not an error; a failed lookup is.
    async fn get_records(&self, zone: &str) -> Result<Vec<Record>>;
}

/// Adds records to a zone
#[async_trait]
pub trait RecordAppender: Send + Sync {
    /// Add `records` to `zone` in order
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Record>)`: the input records, unchanged, in input order
    /// - `Err(Error)`: the error of the first record that failed; earlier
    ///   records stay applied
    async fn append_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>>;
}

/// Creates or updates records in a zone
#[async_trait]
pub trait RecordSetter: Send + Sync {
    /// Set `records` in `zone` in order
    ///
    /// Whether an existing record is replaced or joined is left to the
    /// server's update semantics. Same partial-application rules as
    /// [`RecordAppender::append_records`].
    async fn set_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>>;
}

/// Removes records from a zone
#[async_trait]
pub trait RecordDeleter: Send + Sync {
    /// Delete `records` from `zone` in order
    ///
    /// Same partial-application rules as [`RecordAppender::append_records`].
    async fn delete_records(&self, zone: &str, records: &[Record]) -> Result<Vec<Record>>;
}

/// Everything a full provider implements
pub trait RecordStore: RecordGetter + RecordAppender + RecordSetter + RecordDeleter {
    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
