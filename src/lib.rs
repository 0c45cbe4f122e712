//! # pingate
//!
//! PIN-gated encryption and access control for a personal launcher.
//!
//! Shortcuts ("apps") and private text ("notes") can be placed behind a PIN
//! group. The crate turns a short PIN into a key, seals the item's sensitive
//! field into a self-contained text blob, and records which group guards
//! which item.
//!
//! ## Public API
//!
//! Callers construct one [`AccessGate`] per process over a [`Persistence`]
//! port and route every protect, open, edit, and export action through it.
//! Digests and blobs are never handled by the UI directly.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pingate::{AccessGate, GateConfig, ItemRef, MemoryPersistence};
//!
//! # fn main() -> pingate::Result<()> {
//! let gate = AccessGate::new(&GateConfig::default(), Arc::new(MemoryPersistence::new()));
//! let bank = gate.credentials().add_group("Bank", "4242", "last 4 digits")?;
//! let app = ItemRef::app("a1");
//! let blob = gate.protect(&app, &bank, "4242", "https://bank.example")?;
//! assert_eq!(gate.open(&app, "4242", &blob)?.into_inner(), "https://bank.example");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub(crate) mod crypto;
pub mod error;
pub mod export;
pub mod gate;
pub(crate) mod keys;
pub mod mapping;
pub mod store;

pub use config::{CipherMode, GateConfig};
pub use credentials::{GroupId, PinCredentialStore, PinGroup, MIN_PIN_LENGTH};
pub use crypto::Cipher;
pub use error::{AccessOutcome, PinGateError, Result};
pub use export::{ExportReport, ExportUnlock, GroupSelection, Protectable, StoredValue};
pub use gate::{AccessGate, Released};
pub use mapping::{AccessMapping, AccessMappingStore, ItemKind, ItemRef};
pub use store::{FilePersistence, MemoryPersistence, Persistence};

/// Encrypt `plaintext` under `pin` in the given mode.
///
/// Standalone form of [`Cipher::encrypt`] for callers that manage their own
/// bindings.
pub fn encrypt(mode: CipherMode, plaintext: &str, pin: &str) -> Result<String> {
    Cipher::new(mode).encrypt(plaintext, pin)
}

/// Decrypt a blob produced by [`encrypt`] in the same mode.
pub fn decrypt(mode: CipherMode, blob: &str, pin: &str) -> Result<String> {
    Cipher::new(mode).decrypt(blob, pin)
}

/// Derive the 256-bit key for `pin` and `salt`.
///
/// Exposed for benchmarking and interop checks; the gate derives keys
/// internally.
pub fn derive_key_bytes(mode: CipherMode, pin: &str, salt: &[u8]) -> [u8; crypto::KEY_LEN] {
    *keys::derive_key(mode, pin, salt).as_bytes()
}

/// Digest a PIN the way the credential store does.
pub fn hash_pin(mode: CipherMode, pin: &str) -> Result<String> {
    credentials::validate_pin(pin)?;
    Ok(crypto::hash_pin(mode, pin))
}

/// Compare a PIN against a stored digest.
pub fn verify_pin(mode: CipherMode, pin: &str, digest: &str) -> bool {
    credentials::validate_pin(pin).is_ok() && crypto::verify_pin(mode, pin, digest)
}
