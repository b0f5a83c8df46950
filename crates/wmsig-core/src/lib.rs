//! # wmsig-core
//!
//! Core error definitions for the wmsig KWM key loading and signing library.
//!
//! This crate provides the foundational types shared across all wmsig crates:
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//!
//! ## Error Handling
//!
//! Every failure mode has a structured error value; no operation swallows an
//! error and returns a partially valid result:
//!
//! ```rust
//! use wmsig_core::error::{KeyError, WmError};
//!
//! fn example() -> Result<(), WmError> {
//!     // Domain errors automatically convert to WmError
//!     let err: WmError = KeyError::MissingWmid.into();
//!     assert!(matches!(err, WmError::Key(KeyError::MissingWmid)));
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;

// Re-export commonly used error types at crate root for convenience
pub use error::{FormatError, KeyError, MathError, Result, WmError};
