//! Centralized error handling for EPG merging
//!
//! Errors are split by layer so callers can decide what is recoverable:
//!
//! - **Load Errors**: a single input that is missing or unparseable
//! - **XML Errors**: tree construction and serialization failures
//! - **App Errors**: everything that ends a merge group or the run
//!
//! # Usage
//!
//! ```rust
//! use epg_merge::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("no merge groups configured"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for XML tree/writer Results
pub type XmlResult<T> = Result<T, XmlError>;
