//! End-to-end container tests over synthetically built KWM files.
//!
//! The payload XOR is an involution, so the loader's own transforms run in
//! reverse build a container the loader must accept. This exercises the full
//! pipeline (header parse, decrypt, checksum gate, body parse, byte-order
//! decode) without shipping any real key material.

use std::io::Write;

use md4::{Digest, Md4};
use num_bigint::BigUint;

use wmsig_core::error::{KeyError, WmError};
use wmsig_crypto::keyfile::{self, KeyPair};
use wmsig_crypto::rng::Mt19937;
use wmsig_crypto::signer::{KwmSigner, Signer};

const WMID: &str = "405002833238";
const PASSWORD: &str = "correct horse battery staple";

/// Build a well-formed container holding `modulus` and `exponent`.
fn build_container(wmid: &str, password: &str, modulus: &BigUint, exponent: &BigUint) -> Vec<u8> {
    let exp_bytes = exponent.to_bytes_le();
    let mod_bytes = modulus.to_bytes_le();

    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&u16::try_from(exp_bytes.len()).unwrap().to_le_bytes());
    body.extend_from_slice(&exp_bytes);
    body.extend_from_slice(&u16::try_from(mod_bytes.len()).unwrap().to_le_bytes());
    body.extend_from_slice(&mod_bytes);

    let reserved: u16 = 1;
    let payload_len = u32::try_from(body.len()).unwrap();

    let mut checksum_input = Vec::new();
    checksum_input.extend_from_slice(&reserved.to_le_bytes());
    checksum_input.extend_from_slice(&0u16.to_le_bytes());
    checksum_input.extend_from_slice(&[0u8; 16]);
    checksum_input.extend_from_slice(&payload_len.to_le_bytes());
    checksum_input.extend_from_slice(&body);
    let checksum = Md4::digest(&checksum_input);

    let mut keystream = Md4::new();
    keystream.update(wmid.as_bytes());
    keystream.update(password.as_bytes());
    let digest = keystream.finalize();

    let mut payload = body;
    for i in 6..payload.len() {
        payload[i] ^= digest[(i - 6) % 16];
    }

    let mut out = Vec::new();
    out.extend_from_slice(&reserved.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&checksum);
    out.extend_from_slice(&payload_len.to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

fn test_modulus() -> BigUint {
    // 528-bit all-ones value: wide enough that the signing base never
    // exceeds it, so signatures span the full wire width.
    (BigUint::from(1u8) << 528u32) - BigUint::from(1u8)
}

fn test_exponent() -> BigUint {
    BigUint::from(65_537u32)
}

#[test]
fn loads_key_from_synthetic_container() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let key = keyfile::load_from_bytes(WMID, &raw, PASSWORD).unwrap();
    assert_eq!(key.modulus(), &test_modulus());
    assert_eq!(key.exponent(), &test_exponent());
}

#[test]
fn loaded_key_signs_deterministically() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());
    let key = keyfile::load_from_bytes(WMID, &raw, PASSWORD).unwrap();

    // The same key loaded twice signs identically under a fixed seed.
    let again = keyfile::load_from_bytes(WMID, &raw, PASSWORD).unwrap();
    let a = KwmSigner::new(key)
        .sign_with_padding(b"TEST", &mut Mt19937::new(0))
        .unwrap();
    let b = KwmSigner::new(again)
        .sign_with_padding(b"TEST", &mut Mt19937::new(0))
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(a.len(), 132);
}

#[test]
fn wrong_password_fails_checksum() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let result = keyfile::load_from_bytes(WMID, &raw, "not the password");
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ChecksumMismatch))
    ));
}

#[test]
fn empty_password_fails_checksum() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let result = keyfile::load_from_bytes(WMID, &raw, "");
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ChecksumMismatch))
    ));
}

#[test]
fn wrong_wmid_fails_checksum() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let result = keyfile::load_from_bytes("111222333444", &raw, PASSWORD);
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ChecksumMismatch))
    ));
}

#[test]
fn corrupted_payload_fails_checksum() {
    let mut raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());
    let last = raw.len() - 1;
    raw[last] ^= 0xff;

    let result = keyfile::load_from_bytes(WMID, &raw, PASSWORD);
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ChecksumMismatch))
    ));
}

#[test]
fn corrupted_stored_checksum_is_rejected() {
    let mut raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());
    raw[4] ^= 0x01;

    let result = keyfile::load_from_bytes(WMID, &raw, PASSWORD);
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ChecksumMismatch))
    ));
}

#[test]
fn empty_wmid_is_rejected_before_any_parsing() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let result = keyfile::load_from_bytes("", &raw, PASSWORD);
    assert!(matches!(result, Err(WmError::Key(KeyError::MissingWmid))));
}

#[test]
fn truncated_container_is_a_format_error() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let result = keyfile::load_from_bytes(WMID, &raw[..12], PASSWORD);
    assert!(matches!(result, Err(WmError::Format(_))));
}

#[test]
fn loads_from_file_on_disk() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.kwm");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&raw).unwrap();
    drop(file);

    let key = keyfile::load_from_file(WMID, &path, PASSWORD).unwrap();
    assert_eq!(key.modulus(), &test_modulus());
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.kwm");

    match keyfile::load_from_file(WMID, &path, PASSWORD) {
        Err(WmError::Key(KeyError::NotFound { path: reported })) => {
            assert!(reported.ends_with("absent.kwm"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.kwm");
    std::fs::File::create(&path).unwrap();

    let result = keyfile::load_from_file(WMID, &path, PASSWORD);
    assert!(matches!(result, Err(WmError::Key(KeyError::EmptyKeyData))));
}

#[test]
fn container_with_zero_modulus_is_rejected() {
    // Encode a zero modulus; the loader must refuse to build a key from it.
    let raw = build_container(WMID, PASSWORD, &BigUint::from(0u8), &test_exponent());

    let result = keyfile::load_from_bytes(WMID, &raw, PASSWORD);
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ZeroComponent { .. }))
    ));
}

#[test]
fn default_padding_varies_between_signs() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());
    let signer = KwmSigner::new(keyfile::load_from_bytes(WMID, &raw, PASSWORD).unwrap());

    let a = signer.sign(b"TEST").unwrap();
    let b = signer.sign(b"TEST").unwrap();
    assert_ne!(a, b);
}

#[test]
fn concurrent_signing_over_a_shared_signer() {
    let raw = build_container(WMID, PASSWORD, &test_modulus(), &test_exponent());
    let key = keyfile::load_from_bytes(WMID, &raw, PASSWORD).unwrap();
    let signer = std::sync::Arc::new(KwmSigner::new(key));

    let handles: Vec<_> = (0u32..4)
        .map(|i| {
            let signer = std::sync::Arc::clone(&signer);
            std::thread::spawn(move || {
                let msg = format!("message {i}");
                signer
                    .sign_with_padding(msg.as_bytes(), &mut Mt19937::new(i))
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let sig = handle.join().unwrap();
        assert_eq!(sig.len(), 132);
    }
}

#[test]
fn zero_component_error_from_manual_construction() {
    let result = KeyPair::new("0", "65537");
    assert!(matches!(
        result,
        Err(WmError::Key(KeyError::ZeroComponent { component: "modulus" }))
    ));
}
