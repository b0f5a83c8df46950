//! KWM key-container decryption and validation.
//!
//! A KWM container wraps an RSA-variant private key in a small encrypted
//! binary envelope:
//!
//! ```text
//! offset 0   u16 reserved
//! offset 2   u16 sign_flag
//! offset 4   16 bytes checksum (MD4 digest)
//! offset 20  u32 payload_len
//! offset 24  .. encrypted payload (remainder of buffer)
//! ```
//!
//! The payload is XOR-encrypted with a keystream derived from the caller's
//! credentials (`MD4(wmid ++ password)`, cycled), starting at payload offset
//! 6: the first six bytes are the body's reserved/length fields, reproduced
//! in plaintext. After decryption an MD4 checksum gates the result, so a
//! wrong password or a tampered container can never silently yield a usable
//! key. The decrypted body is:
//!
//! ```text
//! u32 reserved
//! u16 exp_len;  exp_len bytes exponent (byte-reversed big-endian magnitude)
//! u16 mod_len;  mod_len bytes modulus (byte-reversed big-endian magnitude)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use wmsig_crypto::keyfile;
//!
//! let key = keyfile::load_from_file("405002833238", "keys/test.kwm", "passphrase")?;
//! println!("modulus is {} bits", key.modulus().bits());
//! # Ok::<(), wmsig_core::error::WmError>(())
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use md4::{Digest, Md4};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::debug;

use wmsig_core::error::{KeyError, KeyResult, Result};

use crate::bignum::MathEngine;
use crate::unpacker::{FieldKind, Repeat, Unpacker};

/// Length of the MD4 checksum in the container header.
const CHECKSUM_LEN: usize = 16;

/// Offset into the payload where the XOR keystream starts. The bytes before
/// it are the body's plaintext reserved/length prefix.
const KEYSTREAM_SKIP: usize = 6;

// ============================================================================
// KeyPair
// ============================================================================

/// An RSA-variant signing key: modulus and private exponent.
///
/// Immutable once constructed; both components are guaranteed non-zero.
/// Values are created by the loading pipeline in this module, or directly
/// from decimal strings by callers who already possess the components (for
/// instance extracted from an XML key export using the same byte-reversal
/// convention the container uses).
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// The public modulus.
    modulus: BigUint,
    /// The private exponent.
    exponent: BigUint,
}

impl KeyPair {
    /// Construct a key pair from decimal component strings.
    ///
    /// # Errors
    /// - [`MathError::InvalidDigits`](wmsig_core::error::MathError::InvalidDigits)
    ///   if either string is not a decimal integer.
    /// - [`KeyError::ZeroComponent`] if either component is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use wmsig_crypto::keyfile::KeyPair;
    ///
    /// let key = KeyPair::new("3233", "17")?;
    /// assert_eq!(key.modulus_decimal(), "3233");
    /// # Ok::<(), wmsig_core::error::WmError>(())
    /// ```
    pub fn new(modulus_decimal: &str, exponent_decimal: &str) -> Result<Self> {
        let engine = MathEngine::default();
        let modulus = engine.from_decimal(modulus_decimal)?;
        let exponent = engine.from_decimal(exponent_decimal)?;
        Self::from_parts(modulus, exponent).map_err(Into::into)
    }

    /// Construct a key pair from already-parsed components.
    ///
    /// # Errors
    /// Returns [`KeyError::ZeroComponent`] if either component is zero.
    pub fn from_parts(modulus: BigUint, exponent: BigUint) -> KeyResult<Self> {
        if modulus.is_zero() {
            return Err(KeyError::zero_component("modulus"));
        }
        if exponent.is_zero() {
            return Err(KeyError::zero_component("exponent"));
        }
        Ok(Self { modulus, exponent })
    }

    /// The public modulus.
    #[must_use]
    pub const fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// The private exponent.
    #[must_use]
    pub const fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// The modulus as a decimal string.
    #[must_use]
    pub fn modulus_decimal(&self) -> String {
        MathEngine::default().to_decimal(&self.modulus)
    }

    /// The exponent as a decimal string.
    #[must_use]
    pub fn exponent_decimal(&self) -> String {
        MathEngine::default().to_decimal(&self.exponent)
    }
}

impl fmt::Debug for KeyPair {
    /// The private exponent never appears in debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("modulus_bits", &self.modulus.bits())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// KeySource
// ============================================================================

/// A named source of raw key-container bytes.
///
/// This is the loader's consumed capability: files are the common case, but
/// anything that can produce the container bytes works (network blobs,
/// in-memory stores in tests).
pub trait KeySource {
    /// Read the entire source.
    ///
    /// # Errors
    /// [`KeyError::NotFound`] if the source does not exist, [`KeyError::Io`]
    /// for other read failures.
    fn read_all(&self) -> KeyResult<Vec<u8>>;
}

impl KeySource for Path {
    fn read_all(&self) -> KeyResult<Vec<u8>> {
        match fs::read(self) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(KeyError::not_found(self.display().to_string()))
            }
            Err(e) => Err(KeyError::Io(e)),
        }
    }
}

impl KeySource for PathBuf {
    fn read_all(&self) -> KeyResult<Vec<u8>> {
        self.as_path().read_all()
    }
}

// ============================================================================
// Loading pipeline
// ============================================================================

/// Load a key pair from raw container bytes.
///
/// # Errors
/// - [`KeyError::MissingWmid`] if `wmid` is empty.
/// - [`FormatError`](wmsig_core::error::FormatError) variants if the
///   container layout is malformed.
/// - [`KeyError::ChecksumMismatch`] if the integrity gate fails (wrong
///   password, or a corrupted or tampered container).
/// - [`KeyError::ZeroComponent`] if a decoded component is zero.
pub fn load_from_bytes(wmid: &str, raw: &[u8], password: &str) -> Result<KeyPair> {
    if wmid.is_empty() {
        return Err(KeyError::MissingWmid.into());
    }

    let header = Unpacker::new(raw)
        .with_field(FieldKind::U16, Repeat::Count(1), "reserved")?
        .with_field(FieldKind::U16, Repeat::Count(1), "sign_flag")?
        .with_field(FieldKind::Bytes, Repeat::Count(CHECKSUM_LEN), "checksum")?
        .with_field(FieldKind::U32, Repeat::Count(1), "payload_len")?
        .with_field(FieldKind::Bytes, Repeat::Remainder, "payload")?;

    let reserved = header.uint("reserved")?;
    let payload_len = header.uint("payload_len")?;

    let buf = decrypt_payload(wmid, password, header.bytes("payload")?);
    verify_checksum(reserved, payload_len, &buf, header.bytes("checksum")?)?;

    let body = Unpacker::new(&buf)
        .with_field(FieldKind::U32, Repeat::Count(1), "reserved")?
        .with_field(FieldKind::U16, Repeat::Count(1), "exp_len")?
        .with_field(FieldKind::Bytes, Repeat::FieldRef("exp_len"), "exponent")?
        .with_field(FieldKind::U16, Repeat::Count(1), "mod_len")?
        .with_field(FieldKind::Bytes, Repeat::FieldRef("mod_len"), "modulus")?;

    let engine = MathEngine::default();
    let exponent = reversed_to_uint(&engine, body.bytes("exponent")?)?;
    let modulus = reversed_to_uint(&engine, body.bytes("modulus")?)?;

    debug!(modulus_bits = modulus.bits(), "loaded KWM key container");

    KeyPair::from_parts(modulus, exponent).map_err(Into::into)
}

/// Load a key pair from an external byte source.
///
/// # Errors
/// Source errors ([`KeyError::NotFound`], [`KeyError::Io`],
/// [`KeyError::EmptyKeyData`]) plus everything [`load_from_bytes`] can
/// return.
pub fn load_from_source<S>(wmid: &str, source: &S, password: &str) -> Result<KeyPair>
where
    S: KeySource + ?Sized,
{
    let raw = source.read_all()?;
    if raw.is_empty() {
        return Err(KeyError::EmptyKeyData.into());
    }
    load_from_bytes(wmid, &raw, password)
}

/// Load a key pair from a container file on disk.
///
/// # Errors
/// See [`load_from_source`].
pub fn load_from_file(wmid: &str, path: impl AsRef<Path>, password: &str) -> Result<KeyPair> {
    load_from_source(wmid, path.as_ref(), password)
}

// ============================================================================
// Pipeline internals
// ============================================================================

/// MD4 over a sequence of byte slices.
fn md4(parts: &[&[u8]]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Md4::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// XOR the payload with the credential keystream.
///
/// The keystream is `MD4(wmid ++ password)`, cycled; it starts at payload
/// offset [`KEYSTREAM_SKIP`]. XOR is an involution, so this both decrypts
/// containers and (in tests) builds them.
fn decrypt_payload(wmid: &str, password: &str, payload: &[u8]) -> Vec<u8> {
    let digest = md4(&[wmid.as_bytes(), password.as_bytes()]);
    let mut buf = payload.to_vec();
    for (i, byte) in buf.iter_mut().enumerate().skip(KEYSTREAM_SKIP) {
        *byte ^= digest[(i - KEYSTREAM_SKIP) % digest.len()];
    }
    buf
}

/// The integrity gate: MD4 over the reconstructed header-plus-body bytes
/// must match the checksum stored in the container header.
fn verify_checksum(reserved: u64, payload_len: u64, buf: &[u8], expected: &[u8]) -> KeyResult<()> {
    let mut data = Vec::with_capacity(24 + buf.len());
    data.extend_from_slice(&(reserved as u16).to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&(payload_len as u32).to_le_bytes());
    data.extend_from_slice(buf);

    if md4(&[data.as_slice()]) != *expected {
        return Err(KeyError::ChecksumMismatch);
    }
    Ok(())
}

/// Interpret a byte string stored in the container's reversed order.
///
/// The on-disk convention reverses the entire byte string relative to
/// big-endian magnitude order (not a per-word endianness swap). External
/// verifiers depend on this exact convention; do not "fix" it.
pub(crate) fn reversed_to_uint(engine: &MathEngine, data: &[u8]) -> Result<BigUint> {
    let mut reversed = data.to_vec();
    reversed.reverse();
    engine.from_hex(&hex::encode(reversed)).map_err(Into::into)
}

// ============================================================================
// Tests
// ============================================================================
