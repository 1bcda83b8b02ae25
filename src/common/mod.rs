//! Shared error handling.

pub mod error;
pub mod result;

pub use error::BbsError;
pub use result::BbsResult;
