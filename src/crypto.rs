//! Low-level cryptographic operations.
//!
//! This module and `keys` are the only places in the crate that import `ring`
//! directly. Every other module encrypts, decrypts, and hashes exclusively
//! through the functions exposed here.
//!
//! Primitive choices (primary mode):
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **Nonce**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes), derived per blob by `keys::derive_key`
//! - **PIN digest**: SHA-256, base64
//!
//! Fallback mode keeps the same blob framing without a nonce and replaces the
//! AEAD with a repeating-key XOR stream. It offers no tamper evidence.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use crate::config::CipherMode;
use crate::error::{PinGateError, Result};
use crate::keys::{self, DerivedKey};

/// The AEAD algorithm used in primary mode.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = aead::NONCE_LEN;

/// Size of a derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the GCM authentication tag appended to primary ciphertexts.
pub const TAG_LEN: usize = 16;

/// A nonce generated for a single encryption operation.
/// Newtype to prevent accidental reuse: each `OwnedNonce` is consumed on use.
struct OwnedNonce([u8; NONCE_LEN]);

/// Fill `buf` from the system CSPRNG.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| PinGateError::RandomnessFailure)
}

fn generate_nonce() -> Result<OwnedNonce> {
    let mut buf = [0u8; NONCE_LEN];
    fill_random(&mut buf)?;
    Ok(OwnedNonce(buf))
}

fn aead_key(key: &DerivedKey) -> Result<LessSafeKey> {
    let unbound =
        UnboundKey::new(ALGORITHM, key.as_bytes()).map_err(|_| PinGateError::EncryptionFailure)?;
    Ok(LessSafeKey::new(unbound))
}

// ---------------------------------------------------------------------------
// PIN-based cipher
// ---------------------------------------------------------------------------

/// Encrypts and decrypts text payloads under a PIN.
///
/// The mode is fixed at construction. A blob carries no mode tag, so it can
/// only be opened by a `Cipher` in the mode that sealed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cipher {
    mode: CipherMode,
}

impl Cipher {
    pub fn new(mode: CipherMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Smallest decoded blob this mode will attempt to open.
    pub fn min_blob_len(&self) -> usize {
        match self.mode {
            CipherMode::Primary => keys::PRIMARY_SALT_LEN + NONCE_LEN + TAG_LEN,
            CipherMode::Fallback => keys::FALLBACK_SALT_LEN,
        }
    }

    /// Encrypt `plaintext` under a key derived from `pin` and a fresh salt.
    ///
    /// # Layout of the decoded blob
    /// ```text
    /// primary:  [ salt (16) ][ nonce (12) ][ ciphertext + GCM tag (16) ]
    /// fallback: [ salt (32) ][ xor stream ]
    /// ```
    /// The whole layout is standard base64 with padding.
    pub fn encrypt(&self, plaintext: &str, pin: &str) -> Result<String> {
        let mut salt = vec![0u8; keys::salt_len(self.mode)];
        fill_random(&mut salt)?;
        let key = keys::derive_key(self.mode, pin, &salt);

        let mut blob = salt;
        match self.mode {
            CipherMode::Primary => {
                let nonce = generate_nonce()?;
                let mut in_out = plaintext.as_bytes().to_vec();
                aead_key(&key)?
                    .seal_in_place_append_tag(
                        Nonce::assume_unique_for_key(nonce.0),
                        Aad::empty(),
                        &mut in_out,
                    )
                    .map_err(|_| PinGateError::EncryptionFailure)?;
                blob.reserve(NONCE_LEN + in_out.len());
                blob.extend_from_slice(&nonce.0);
                blob.extend_from_slice(&in_out);
            }
            CipherMode::Fallback => {
                let mut data = plaintext.as_bytes().to_vec();
                xor_stream(&key, &mut data);
                blob.extend_from_slice(&data);
            }
        }

        Ok(STANDARD.encode(blob))
    }

    /// Decrypt a blob produced by [`Cipher::encrypt`] in the same mode.
    ///
    /// Bad base64, a blob shorter than the mode's header, a failed GCM check,
    /// or a plaintext that is not UTF-8 all yield `DecryptionFailed`. The
    /// caller receives no partial plaintext.
    ///
    /// In fallback mode nothing checks the key: a wrong PIN usually returns
    /// `Ok` with garbage text. Verify the PIN against its group first.
    pub fn decrypt(&self, blob: &str, pin: &str) -> Result<String> {
        let decoded = STANDARD
            .decode(blob.trim())
            .map_err(|_| PinGateError::DecryptionFailed)?;
        if decoded.len() < self.min_blob_len() {
            return Err(PinGateError::DecryptionFailed);
        }

        let salt_len = keys::salt_len(self.mode);
        let (salt, rest) = decoded.split_at(salt_len);
        let key = keys::derive_key(self.mode, pin, salt);

        let plaintext = match self.mode {
            CipherMode::Primary => {
                let (nonce_bytes, sealed) = rest.split_at(NONCE_LEN);
                let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
                    .map_err(|_| PinGateError::DecryptionFailed)?;
                let mut payload = sealed.to_vec();
                let opened = aead_key(&key)
                    .map_err(|_| PinGateError::DecryptionFailed)?
                    .open_in_place(nonce, Aad::empty(), &mut payload)
                    .map_err(|_| PinGateError::DecryptionFailed)?
                    .to_vec();
                payload.zeroize();
                opened
            }
            CipherMode::Fallback => {
                let mut data = rest.to_vec();
                xor_stream(&key, &mut data);
                data
            }
        };

        match String::from_utf8(plaintext) {
            Ok(text) => Ok(text),
            Err(err) => {
                err.into_bytes().zeroize();
                Err(PinGateError::DecryptionFailed)
            }
        }
    }
}

/// XOR `data` in place with the key repeated end to end. Self-inverse.
fn xor_stream(key: &DerivedKey, data: &mut [u8]) {
    let key = key.as_bytes();
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % KEY_LEN];
    }
}

// ---------------------------------------------------------------------------
// PIN digests
// ---------------------------------------------------------------------------

/// One-way, unsalted digest of a PIN, used only for comparison.
pub fn hash_pin(mode: CipherMode, pin: &str) -> String {
    match mode {
        CipherMode::Primary => STANDARD.encode(digest::digest(&digest::SHA256, pin.as_bytes())),
        CipherMode::Fallback => rolling_hash_hex(pin),
    }
}

/// Compare `pin` against a stored digest.
pub fn verify_pin(mode: CipherMode, pin: &str, hashed: &str) -> bool {
    let candidate = hash_pin(mode, pin);
    ring::constant_time::verify_slices_are_equal(candidate.as_bytes(), hashed.as_bytes()).is_ok()
}

/// 32-bit rolling string hash over UTF-16 code units (`h = h * 31 + c`),
/// rendered as the absolute value in lower-case hex, padded to 8 digits.
fn rolling_hash_hex(pin: &str) -> String {
    let hash = pin
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32));
    format!("{:08x}", (hash as i64).unsigned_abs())
}
