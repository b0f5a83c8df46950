//! # wmsig-crypto
//!
//! KWM key-container loading and legacy RSA-variant message signing.
//!
//! The crate splits the work into small, separately testable pieces:
//!
//! - [`unpacker`] - declarative little-endian binary field extraction
//! - [`bignum`] - arbitrary-precision arithmetic behind a backend handle
//! - [`keyfile`] - container decryption, integrity checking, key decoding
//! - [`rng`] - padding word sources, including the seedable legacy generator
//! - [`signer`] - the signing pipeline itself
//!
//! ## Quick Start
//!
//! ```no_run
//! use wmsig_crypto::keyfile;
//! use wmsig_crypto::signer::{KwmSigner, Signer};
//!
//! let key = keyfile::load_from_file("405002833238", "keys/test.kwm", "passphrase")?;
//! let signer = KwmSigner::new(key);
//!
//! let signature = signer.sign(b"payment request body")?;
//! assert_eq!(signature.len(), 132);
//! # Ok::<(), wmsig_core::error::WmError>(())
//! ```
//!
//! The byte-level conventions in here (whole-string byte reversal, MD4
//! digests, the 31-bit padding generator, the 4-digit chunk reordering) are
//! all load-bearing: existing external verifiers accept these signatures
//! bit-for-bit.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod bignum;
pub mod keyfile;
pub mod rng;
pub mod signer;
pub mod unpacker;

pub use bignum::{MathBackend, MathEngine};
pub use keyfile::{load_from_bytes, load_from_file, load_from_source, KeyPair, KeySource};
pub use rng::{Mt19937, PadSource, SystemPad};
pub use signer::{KwmSigner, Signer};
pub use unpacker::{Field, FieldKind, Repeat, Unpacker};
