//! Top-K word frequency service.
//!
//! Uploaded text is split on spaces, counted, and the K most frequent words
//! are returned. Results are memoized by upload name, size, K and offset.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod spool;

pub use analysis::{TopKResult, WordCount};
pub use error::{Result, WordFrequencyError};
pub use handler::{RequestHandler, UploadMode, UploadRequest};
