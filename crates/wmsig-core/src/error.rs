//! Error types for KWM key loading and signing.
//!
//! This module provides error types for all failure modes in the wmsig
//! system, organized by domain:
//!
//! - [`FormatError`] - Binary layout decoding failures
//! - [`KeyError`] - Key container loading and validation failures
//! - [`MathError`] - Big-integer arithmetic and backend failures
//! - [`WmError`] - Top-level error that wraps all error types
//!
//! # Example
//!
//! ```rust
//! use wmsig_core::error::{KeyError, WmError};
//!
//! fn check_wmid(wmid: &str) -> Result<(), WmError> {
//!     if wmid.is_empty() {
//!         return Err(KeyError::MissingWmid.into());
//!     }
//!     Ok(())
//! }
//! ```

/// Top-level error type for the wmsig library.
///
/// This enum wraps all domain-specific error types and provides
/// automatic conversion via the `#[from]` attribute.
#[derive(Debug, thiserror::Error)]
pub enum WmError {
    /// Binary layout decoding failed.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Key container loading or validation failed.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Big-integer arithmetic or backend selection failed.
    #[error("math error: {0}")]
    Math(#[from] MathError),
}

// ============================================================================
// FormatError
// ============================================================================

/// Errors that can occur while decoding a binary layout.
///
/// These errors indicate that a byte buffer does not match the declared
/// field sequence. They are fatal for the current parse.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// A decoded field was requested under a name that was never declared.
    ///
    /// The message lists the currently known field names, which helps when
    /// diagnosing a malformed or truncated container.
    #[error("unknown field \"{name}\", available: {available}")]
    UnknownField {
        /// The name that was looked up.
        name: String,
        /// Comma-separated list of field names decoded so far.
        available: String,
    },

    /// The buffer ended before a declared field could be fully decoded.
    #[error("unexpected end of data in field \"{field}\": need {needed} bytes, {available} left")]
    UnexpectedEnd {
        /// The field that could not be decoded.
        field: String,
        /// How many bytes the field requires.
        needed: usize,
        /// How many bytes remain in the buffer.
        available: usize,
    },

    /// A repeat count referenced a field that is absent or not an integer.
    #[error("length reference \"{name}\" is absent or not an integer")]
    BadLengthRef {
        /// The referenced field name.
        name: String,
    },

    /// A decoded field holds a different kind of value than expected.
    #[error("field \"{name}\" is not {expected}")]
    WrongKind {
        /// The field name.
        name: String,
        /// What the caller expected ("an integer" or "a byte run").
        expected: &'static str,
    },
}

impl FormatError {
    /// Create an `UnknownField` error from a lookup name and the names
    /// known at that point.
    #[must_use]
    pub fn unknown_field<'a>(name: &str, known: impl Iterator<Item = &'a str>) -> Self {
        Self::UnknownField {
            name: name.to_string(),
            available: known.collect::<Vec<_>>().join(", "),
        }
    }

    /// Create an `UnexpectedEnd` error.
    #[must_use]
    pub fn unexpected_end(field: &str, needed: usize, available: usize) -> Self {
        Self::UnexpectedEnd {
            field: field.to_string(),
            needed,
            available,
        }
    }

    /// Create a `BadLengthRef` error.
    #[must_use]
    pub fn bad_length_ref(name: impl Into<String>) -> Self {
        Self::BadLengthRef { name: name.into() }
    }

    /// Create a `WrongKind` error.
    #[must_use]
    pub fn wrong_kind(name: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongKind {
            name: name.into(),
            expected,
        }
    }
}

// ============================================================================
// KeyError
// ============================================================================

/// Errors that can occur while loading or validating a KWM key container.
///
/// A failed load never yields a partial key pair: the checksum gate in
/// particular must stop a wrong-password or tampered container cold.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The caller did not supply a WMID (the credential account identifier).
    #[error("wmid not provided")]
    MissingWmid,

    /// The key source does not exist.
    #[error("key file not found: {path}")]
    NotFound {
        /// The path or source name that was not found.
        path: String,
    },

    /// Reading the key source failed.
    #[error("key source unreadable: {0}")]
    Io(#[source] std::io::Error),

    /// The key source was readable but yielded no bytes.
    #[error("key source is empty")]
    EmptyKeyData,

    /// The integrity checksum did not match after decryption.
    ///
    /// This means the password was wrong or the container is corrupted or
    /// tampered with. Fatal; never retried with the same inputs.
    #[error("checksum failed, KWM seems corrupted or the password is wrong")]
    ChecksumMismatch,

    /// A key component (modulus or exponent) decoded to zero.
    #[error("key component must be a non-zero positive integer: {component}")]
    ZeroComponent {
        /// Which component was zero.
        component: &'static str,
    },
}

impl KeyError {
    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a `ZeroComponent` error.
    #[must_use]
    pub const fn zero_component(component: &'static str) -> Self {
        Self::ZeroComponent { component }
    }
}

impl From<std::io::Error> for KeyError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

// ============================================================================
// MathError
// ============================================================================

/// Errors from the big-integer engine.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Modular exponentiation was attempted with a zero modulus.
    #[error("modular exponentiation with zero modulus")]
    ZeroModulus,

    /// No usable big-integer backend is available.
    #[error("no usable bignum backend available")]
    NoBackend,

    /// A digit string could not be parsed in the given radix.
    #[error("invalid base-{radix} digits: \"{input}\"")]
    InvalidDigits {
        /// The offending input (possibly truncated for display).
        input: String,
        /// The radix the input was parsed as.
        radix: u32,
    },
}

impl MathError {
    /// Create an `InvalidDigits` error, truncating long inputs for display.
    #[must_use]
    pub fn invalid_digits(input: &str, radix: u32) -> Self {
        const DISPLAY_LIMIT: usize = 64;
        let input = if input.len() > DISPLAY_LIMIT {
            format!("{}...", &input[..DISPLAY_LIMIT])
        } else {
            input.to_string()
        };
        Self::InvalidDigits { input, radix }
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// A `Result` type alias using [`WmError`] as the error type.
pub type Result<T> = std::result::Result<T, WmError>;

/// A `Result` type alias for binary decoding operations.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// A `Result` type alias for key loading operations.
pub type KeyResult<T> = std::result::Result<T, KeyError>;

/// A `Result` type alias for big-integer operations.
pub type MathResult<T> = std::result::Result<T, MathError>;

// ============================================================================
// Unit Tests
// ============================================================================
