//! Core traits for record providers
//!
//! - [`RecordGetter`]: Read the current records of a zone
//! - [`RecordAppender`], [`RecordSetter`], [`RecordDeleter`]: Mutate a zone
//! - [`RecordStore`]: All of the above

pub mod record_store;

pub use record_store::{RecordAppender, RecordDeleter, RecordGetter, RecordSetter, RecordStore};
