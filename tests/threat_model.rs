use base64::{engine::general_purpose::STANDARD, Engine as _};
use pingate::{decrypt, encrypt, CipherMode, PinGateError};

const PRIMARY_HEADER: usize = 16 + 12;

#[test]
fn test_any_ciphertext_byte_flip_is_detected() {
    // Threat: an attacker with write access to storage flips bits in a blob.
    // Goal: primary mode must refuse to decrypt, never return altered text.
    let blob = encrypt(CipherMode::Primary, "https://bank.example", "4242").unwrap();
    let bytes = STANDARD.decode(&blob).unwrap();

    for index in PRIMARY_HEADER..bytes.len() {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x01;
        let result = decrypt(CipherMode::Primary, &STANDARD.encode(&tampered), "4242");
        assert!(
            matches!(result, Err(PinGateError::DecryptionFailed)),
            "flip at byte {index} was not detected"
        );
    }
}

#[test]
fn test_header_tampering_is_detected() {
    // Salt or nonce changes derive a different key / keystream; the tag fails.
    let blob = encrypt(CipherMode::Primary, "note body", "4242").unwrap();
    let bytes = STANDARD.decode(&blob).unwrap();

    for index in [0, 15, 16, 27] {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x80;
        assert!(decrypt(CipherMode::Primary, &STANDARD.encode(&tampered), "4242").is_err());
    }
}

#[test]
fn test_truncated_and_garbage_blobs_fail_cleanly() {
    let blob = encrypt(CipherMode::Primary, "note body", "4242").unwrap();
    let bytes = STANDARD.decode(&blob).unwrap();

    for len in [0, 10, PRIMARY_HEADER, bytes.len() - 1] {
        let truncated = STANDARD.encode(&bytes[..len]);
        assert!(matches!(
            decrypt(CipherMode::Primary, &truncated, "4242"),
            Err(PinGateError::DecryptionFailed)
        ));
    }

    for garbage in ["", "%%%", "not-base64", "QUJD"] {
        assert!(decrypt(CipherMode::Primary, garbage, "4242").is_err());
        assert!(decrypt(CipherMode::Fallback, garbage, "4242").is_err());
    }
}

#[test]
fn test_fallback_mode_is_not_tamper_evident() {
    // Known weaker guarantee: fallback blobs carry no tag, so a flipped
    // ciphertext bit decrypts to silently altered text.
    let blob = encrypt(CipherMode::Fallback, "abcdef", "4242").unwrap();
    let mut bytes = STANDARD.decode(&blob).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let altered = decrypt(CipherMode::Fallback, &STANDARD.encode(&bytes), "4242").unwrap();
    assert_eq!(altered, "abcdeg");
}

#[test]
fn test_fallback_mode_does_not_reject_wrong_pin() {
    // Known weaker guarantee: without a tag, a wrong PIN only changes the
    // keystream. "4243" differs from "4242" by one bit in key byte 3, so the
    // blob opens as slightly altered text instead of failing.
    let blob = encrypt(CipherMode::Fallback, "abcdef", "4242").unwrap();
    let opened = decrypt(CipherMode::Fallback, &blob, "4243").unwrap();
    assert_eq!(opened, "abceef");

    // Primary mode always refuses.
    let blob = encrypt(CipherMode::Primary, "abcdef", "4242").unwrap();
    assert!(matches!(
        decrypt(CipherMode::Primary, &blob, "4243"),
        Err(PinGateError::DecryptionFailed)
    ));
}

#[test]
fn test_blob_does_not_cross_modes() {
    let primary = encrypt(CipherMode::Primary, "secret", "4242").unwrap();
    assert_ne!(
        decrypt(CipherMode::Fallback, &primary, "4242").ok().as_deref(),
        Some("secret")
    );

    let fallback = encrypt(CipherMode::Fallback, "secret", "4242").unwrap();
    assert!(decrypt(CipherMode::Primary, &fallback, "4242").is_err());
}
