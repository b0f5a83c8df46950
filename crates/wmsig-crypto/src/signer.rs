//! Message signing with the legacy RSA-variant scheme.
//!
//! A signature over `message` is produced in lockstep with the historical
//! payment client:
//!
//! 1. `MD4(message)` (16 bytes), followed by ten random 4-byte padding
//!    words, little-endian (56 bytes total).
//! 2. The 56-byte body is prefixed with its own length as a little-endian
//!    `u16` (58 bytes).
//! 3. The whole buffer is byte-reversed and read as a big-endian hex
//!    magnitude `m`.
//! 4. `a = m ^ exponent mod modulus`.
//! 5. `a` is rendered as even-length lowercase hex, left-padded with zero
//!    bytes to the 132-digit wire width, and its 4-digit chunks are emitted
//!    in reverse order ([`short_unswap`]).
//!
//! Every step is fixed by existing verifiers; none of it is negotiable.
//!
//! # Example
//!
//! ```rust
//! use wmsig_crypto::keyfile::KeyPair;
//! use wmsig_crypto::signer::{KwmSigner, Signer};
//!
//! let key = KeyPair::new("9516311845790656153", "65537")?;
//! let signer = KwmSigner::new(key);
//!
//! let signature = signer.sign(b"TEST")?;
//! assert_eq!(signature.len(), 132);
//! # Ok::<(), wmsig_core::error::WmError>(())
//! ```

use md4::{Digest, Md4};
use tracing::trace;

use wmsig_core::error::Result;

use crate::bignum::MathEngine;
use crate::keyfile::{reversed_to_uint, KeyPair};
use crate::rng::{PadSource, SystemPad};

/// Number of 4-byte random padding words appended to the message digest.
const PAD_WORDS: usize = 10;

/// Hex digits in the packed signature wire value (66 bytes).
const WIRE_HEX_LEN: usize = 132;

// ============================================================================
// Signer
// ============================================================================

/// Anything that can sign a message into the wire hex form.
pub trait Signer: Send + Sync {
    /// Sign `message`, returning the lowercase hex wire string.
    ///
    /// # Errors
    /// Returns a [`WmError`](wmsig_core::error::WmError) if the arithmetic
    /// backend rejects the operation.
    fn sign(&self, message: &[u8]) -> Result<String>;
}

// ============================================================================
// KwmSigner
// ============================================================================

/// Signer over a loaded [`KeyPair`].
///
/// Immutable after construction; `&self` signing makes one instance safe to
/// share across threads.
#[derive(Debug)]
pub struct KwmSigner {
    /// The signing key.
    key: KeyPair,
    /// The arithmetic backend handle.
    engine: MathEngine,
}

impl KwmSigner {
    /// Create a signer using the default arithmetic backend.
    #[must_use]
    pub fn new(key: KeyPair) -> Self {
        Self {
            key,
            engine: MathEngine::default(),
        }
    }

    /// Create a signer with an explicitly chosen arithmetic backend.
    #[must_use]
    pub const fn with_engine(key: KeyPair, engine: MathEngine) -> Self {
        Self { key, engine }
    }

    /// The key this signer holds.
    #[must_use]
    pub const fn key(&self) -> &KeyPair {
        &self.key
    }

    /// Sign with an explicit padding source.
    ///
    /// Production callers use [`Signer::sign`]; this entry point exists so a
    /// seeded generator can replay the padding stream of a known-answer
    /// signature.
    ///
    /// # Errors
    /// Returns a [`WmError`](wmsig_core::error::WmError) if the arithmetic
    /// backend rejects the operation.
    pub fn sign_with_padding(
        &self,
        message: &[u8],
        padding: &mut dyn PadSource,
    ) -> Result<String> {
        let digest = Md4::digest(message);

        let mut body = Vec::with_capacity(digest.len() + PAD_WORDS * 4);
        body.extend_from_slice(&digest);
        for _ in 0..PAD_WORDS {
            body.extend_from_slice(&padding.next_u32().to_le_bytes());
        }

        let mut plain = Vec::with_capacity(2 + body.len());
        plain.extend_from_slice(&(body.len() as u16).to_le_bytes());
        plain.extend_from_slice(&body);

        let m = reversed_to_uint(&self.engine, &plain)?;
        let a = self.engine.mod_pow(&m, self.key.exponent(), self.key.modulus())?;

        let signature = short_unswap(&self.engine.to_hex(&a));
        trace!(message_len = message.len(), signature_len = signature.len(), "signed message");
        Ok(signature)
    }
}

impl Signer for KwmSigner {
    fn sign(&self, message: &[u8]) -> Result<String> {
        self.sign_with_padding(message, &mut SystemPad::default())
    }
}

// ============================================================================
// Wire packing
// ============================================================================

/// Reorder a hex magnitude into the signature wire form.
///
/// Left-pads with `00` to [`WIRE_HEX_LEN`] digits, then emits the 4-digit
/// chunks in reverse order. Chunking runs from the front, so when the padded
/// string is not a multiple of four digits the short trailing chunk comes
/// out first, matching the historical packing exactly.
fn short_unswap(hex: &str) -> String {
    let pad = WIRE_HEX_LEN.saturating_sub(hex.len()) / 2;
    let mut padded = String::with_capacity(hex.len() + pad * 2);
    for _ in 0..pad {
        padded.push_str("00");
    }
    padded.push_str(hex);

    let chars: Vec<char> = padded.chars().collect();
    chars
        .chunks(4)
        .rev()
        .flat_map(|chunk| chunk.iter().copied())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
