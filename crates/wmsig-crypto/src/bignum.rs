//! Arbitrary-precision integer engine.
//!
//! This module wraps the big-integer operations the key loader and signer
//! need behind a single interface: modular exponentiation and conversions
//! between hex, decimal, and [`BigUint`] values.
//!
//! # Backend Selection
//!
//! The original payment client picks between a native bignum library and a
//! software fallback at runtime. That selection survives here as
//! [`MathBackend`]: `Auto` probes the available backends in a fixed priority
//! order and fails with [`MathError::NoBackend`] when none are usable. The
//! portable `num-bigint` backend is always compiled in, so `Auto` currently
//! resolves to [`MathBackend::Portable`].
//!
//! The resolved backend lives inside the [`MathEngine`] value itself. There
//! is no process-wide mutable selection: callers construct an engine once and
//! share it freely (it is `Copy`), which keeps concurrent signing free of
//! shared mutable state.
//!
//! # Example
//!
//! ```rust
//! use wmsig_crypto::bignum::{MathBackend, MathEngine};
//!
//! let engine = MathEngine::new(MathBackend::Auto).expect("a backend is available");
//!
//! let base = engine.from_decimal("4").unwrap();
//! let exp = engine.from_decimal("13").unwrap();
//! let modulus = engine.from_decimal("497").unwrap();
//!
//! let r = engine.mod_pow(&base, &exp, &modulus).unwrap();
//! assert_eq!(engine.to_decimal(&r), "445");
//! ```

use std::fmt;

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use wmsig_core::error::{MathError, MathResult};

// ============================================================================
// MathBackend
// ============================================================================

/// Big-integer backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathBackend {
    /// Probe available backends in priority order.
    Auto,
    /// The portable pure-Rust backend (`num-bigint`).
    Portable,
}

impl MathBackend {
    /// Probe priority for [`MathBackend::Auto`].
    const PRIORITY: &'static [Self] = &[Self::Portable];

    /// Whether this backend can actually be used in this build.
    const fn is_available(self) -> bool {
        matches!(self, Self::Portable)
    }
}

impl fmt::Display for MathBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Portable => write!(f, "portable"),
        }
    }
}

// ============================================================================
// MathEngine
// ============================================================================

/// Handle to a resolved big-integer backend.
///
/// Cheap to copy and immutable once constructed; safe to share across
/// concurrent signing calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathEngine {
    /// The resolved (never `Auto`) backend.
    backend: MathBackend,
}

impl MathEngine {
    /// Create an engine for the requested backend.
    ///
    /// `Auto` resolves to the first available backend in priority order.
    ///
    /// # Errors
    /// Returns [`MathError::NoBackend`] if the requested backend (or, for
    /// `Auto`, every probed backend) is unavailable.
    pub fn new(backend: MathBackend) -> MathResult<Self> {
        let backend = match backend {
            MathBackend::Auto => MathBackend::PRIORITY
                .iter()
                .copied()
                .find(|b| b.is_available())
                .ok_or(MathError::NoBackend)?,
            explicit => {
                if !explicit.is_available() {
                    return Err(MathError::NoBackend);
                }
                explicit
            }
        };
        Ok(Self { backend })
    }

    /// The backend this engine resolved to.
    #[must_use]
    pub const fn backend(&self) -> MathBackend {
        self.backend
    }

    /// Compute `base ^ exponent mod modulus`.
    ///
    /// # Errors
    /// Returns [`MathError::ZeroModulus`] when `modulus` is zero.
    pub fn mod_pow(
        &self,
        base: &BigUint,
        exponent: &BigUint,
        modulus: &BigUint,
    ) -> MathResult<BigUint> {
        if modulus.is_zero() {
            return Err(MathError::ZeroModulus);
        }
        Ok(base.modpow(exponent, modulus))
    }

    /// Render `n` as lowercase hex, always with an even number of digits.
    ///
    /// The wire transforms downstream work on whole bytes, so an odd-length
    /// natural representation gets one `0` nibble of left padding.
    #[must_use]
    pub fn to_hex(&self, n: &BigUint) -> String {
        let hex = format!("{n:x}");
        if hex.len() % 2 == 0 {
            hex
        } else {
            format!("0{hex}")
        }
    }

    /// Parse a hex digit string (either case) into a [`BigUint`].
    ///
    /// # Errors
    /// Returns [`MathError::InvalidDigits`] for empty or non-hex input.
    pub fn from_hex(&self, s: &str) -> MathResult<BigUint> {
        BigUint::from_str_radix(s, 16).map_err(|_| MathError::invalid_digits(s, 16))
    }

    /// Parse a decimal digit string into a [`BigUint`].
    ///
    /// # Errors
    /// Returns [`MathError::InvalidDigits`] for empty or non-decimal input.
    pub fn from_decimal(&self, s: &str) -> MathResult<BigUint> {
        BigUint::from_str_radix(s, 10).map_err(|_| MathError::invalid_digits(s, 10))
    }

    /// Render `n` as a decimal digit string.
    #[must_use]
    pub fn to_decimal(&self, n: &BigUint) -> String {
        n.to_str_radix(10)
    }
}

impl Default for MathEngine {
    /// The portable backend, which is always available.
    fn default() -> Self {
        Self {
            backend: MathBackend::Portable,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
