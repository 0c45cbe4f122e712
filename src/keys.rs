//! Key derivation and ownership.
//!
//! This module owns two responsibilities:
//! 1. Turning a PIN plus a per-blob salt into a 256-bit key.
//! 2. Holding derived key material in a type that is opaque, non-cloneable,
//!    and zeroised on drop.
//!
//! ## Derivation structure
//!
//! ```text
//! primary:  PBKDF2-HMAC-SHA256(password = pin, salt, iterations = 100_000)
//! fallback: key[i] = (pin_bytes ∥ salt)[i mod len] XOR i,  i in 0..32
//! ```
//!
//! The fallback derivation is fast and weak. It exists only so that the same
//! inputs keep producing the same key when the primary primitives are not
//! available to the host.

use std::num::NonZeroU32;

use ring::pbkdf2;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::CipherMode;
use crate::crypto::KEY_LEN;

/// PBKDF2 iteration count for primary mode.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length for primary-mode blobs.
pub const PRIMARY_SALT_LEN: usize = 16;

/// Salt length for fallback-mode blobs.
pub const FALLBACK_SALT_LEN: usize = 32;

/// Salt length used by `mode`.
pub fn salt_len(mode: CipherMode) -> usize {
    match mode {
        CipherMode::Primary => PRIMARY_SALT_LEN,
        CipherMode::Fallback => FALLBACK_SALT_LEN,
    }
}

// ---------------------------------------------------------------------------
// Derived key
// ---------------------------------------------------------------------------

/// A key derived from a PIN for exactly one blob.
///
/// - Not `Clone`.
/// - Zeroised on drop.
/// - Raw bytes are only reachable inside the crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive a key from `pin` and `salt` in the given mode.
///
/// Deterministic for a given `(mode, pin, salt)`.
pub fn derive_key(mode: CipherMode, pin: &str, salt: &[u8]) -> DerivedKey {
    match mode {
        CipherMode::Primary => derive_pbkdf2(pin, salt),
        CipherMode::Fallback => derive_mixed(pin, salt),
    }
}

fn derive_pbkdf2(pin: &str, salt: &[u8]) -> DerivedKey {
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN);
    let mut bytes = [0u8; KEY_LEN];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, pin.as_bytes(), &mut bytes);
    DerivedKey { bytes }
}

fn derive_mixed(pin: &str, salt: &[u8]) -> DerivedKey {
    let mut combined = Vec::with_capacity(pin.len() + salt.len());
    combined.extend_from_slice(pin.as_bytes());
    combined.extend_from_slice(salt);

    let mut bytes = [0u8; KEY_LEN];
    if !combined.is_empty() {
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = combined[i % combined.len()] ^ (i as u8);
        }
    }
    combined.zeroize();
    DerivedKey { bytes }
}
