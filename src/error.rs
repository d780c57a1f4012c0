//! Error handling for HSQ decoding operations
//!
//! This module re-exports the error types defined alongside the common types.
//! It uses thiserror for ergonomic error handling and provides context-specific
//! error variants.

pub use crate::common::HsqLibError;
pub use crate::common::Result;
