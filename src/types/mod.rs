//! Shared value types and the error taxonomy.

pub mod error;
pub mod record;

pub use error::{Result, StoreError};
pub use record::{Record, DELETED_KEY, EMPTY_KEY, RECORD_SIZE};
