// passd — AES-256-GCM envelope sealing
//
// Every call to `encrypt` draws a fresh 96-bit nonce from the OS random
// source, so sealing the same password twice never yields the same
// envelope. `decrypt` verifies the GCM tag before releasing any plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::keystore::Key;

use super::{DecryptError, EncryptError};

/// Size of the GCM nonce prefixed to every envelope.
pub const NONCE_LEN: usize = 12;

/// Size of the SHA-256 digest used for password comparison.
pub const DIGEST_LEN: usize = 32;

#[allow(deprecated)]
fn cipher_for(key: &Key) -> Aes256Gcm {
    Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Seal `plaintext` under `key`, returning `nonce || ciphertext || tag`.
#[allow(deprecated)]
pub fn encrypt(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>, EncryptError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| EncryptError::Nonce(e.to_string()))?;

    let sealed = cipher_for(key)
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| EncryptError::Seal)?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + sealed.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

/// Open an envelope produced by [`encrypt`].
///
/// Envelopes shorter than [`NONCE_LEN`] are rejected as `Malformed` before
/// any cipher work. Anything that fails tag verification (wrong key,
/// flipped bits, truncation) is `AuthenticationFailed` and yields no bytes.
#[allow(deprecated)]
pub fn decrypt(key: &Key, envelope: &[u8]) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
    if envelope.len() < NONCE_LEN {
        return Err(DecryptError::Malformed {
            len: envelope.len(),
            min: NONCE_LEN,
        });
    }

    let (nonce, sealed) = envelope.split_at(NONCE_LEN);
    cipher_for(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map(Zeroizing::new)
        .map_err(|_| DecryptError::AuthenticationFailed)
}

/// One-way SHA-256 digest of `data`.
pub fn digest(data: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(data).into()
}

/// Full-length comparison that does not stop at the first differing byte.
pub fn digests_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// GCM authentication tag length.
    const TAG_LEN: usize = 16;

    fn key(byte: u8) -> Key {
        Key::load(&[byte; crate::keystore::KEY_SIZE]).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_recovers_plaintext() {
        let k = key(1);
        let cases: [&[u8]; 4] = [
            b"",
            b"hunter2",
            "pässwörd ✓ 密码".as_bytes(),
            &[0u8, 255, 10, 13],
        ];
        for plaintext in cases {
            let envelope = encrypt(&k, plaintext).unwrap();
            let opened = decrypt(&k, &envelope).unwrap();
            assert_eq!(opened.as_slice(), plaintext);
        }
    }

    #[test]
    fn test_envelope_layout_length() {
        let k = key(2);
        let envelope = encrypt(&k, b"0123456789").unwrap();
        assert_eq!(envelope.len(), NONCE_LEN + 10 + TAG_LEN);
    }

    #[test]
    fn test_same_plaintext_gives_fresh_envelopes() {
        let k = key(3);
        let a = encrypt(&k, b"same password").unwrap();
        let b = encrypt(&k, b"same password").unwrap();
        assert_ne!(a, b, "Envelopes must differ for equal plaintexts");
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN], "Nonces must not be reused");
    }

    #[test]
    fn test_decrypt_with_other_key_fails_authentication() {
        let envelope = encrypt(&key(4), b"secret").unwrap();
        assert_eq!(
            decrypt(&key(5), &envelope).unwrap_err(),
            DecryptError::AuthenticationFailed
        );
    }

    #[test]
    fn test_envelope_shorter_than_nonce_is_malformed() {
        let k = key(6);
        let short = vec![0u8; NONCE_LEN - 1];
        assert_eq!(
            decrypt(&k, &short).unwrap_err(),
            DecryptError::Malformed {
                len: NONCE_LEN - 1,
                min: NONCE_LEN
            }
        );
        assert!(matches!(
            decrypt(&k, &[]),
            Err(DecryptError::Malformed { len: 0, .. })
        ));
    }

    #[test]
    fn test_nonce_only_envelope_fails_authentication() {
        let k = key(7);
        let envelope = encrypt(&k, b"abc").unwrap();
        assert_eq!(
            decrypt(&k, &envelope[..NONCE_LEN]).unwrap_err(),
            DecryptError::AuthenticationFailed
        );
    }

    #[test]
    fn test_any_flipped_byte_is_detected() {
        let k = key(8);
        let envelope = encrypt(&k, b"tamper target").unwrap();

        // nonce, body and tag regions
        for index in [0, NONCE_LEN + 2, envelope.len() - 1] {
            let mut tampered = envelope.clone();
            tampered[index] ^= 0x01;
            assert_eq!(
                decrypt(&k, &tampered).unwrap_err(),
                DecryptError::AuthenticationFailed,
                "flip at byte {} must be rejected",
                index
            );
        }
    }

    #[test]
    fn test_truncated_envelope_is_detected() {
        let k = key(9);
        let envelope = encrypt(&k, b"truncate me").unwrap();
        let truncated = &envelope[..envelope.len() - 1];
        assert_eq!(
            decrypt(&k, truncated).unwrap_err(),
            DecryptError::AuthenticationFailed
        );
    }

    #[test]
    fn test_large_plaintext() {
        let k = key(10);
        let plaintext = vec![b'x'; 64 * 1024];
        let envelope = encrypt(&k, &plaintext).unwrap();
        assert_eq!(decrypt(&k, &envelope).unwrap().as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_digest_is_deterministic_and_distinguishing() {
        assert_eq!(digest(b"abc"), digest(b"abc"));
        assert_ne!(digest(b"abc"), digest(b"abd"));
        assert_eq!(digest(b"").len(), DIGEST_LEN);
    }

    #[test]
    fn test_digests_match() {
        let a = digest(b"one");
        let b = digest(b"two");
        assert!(digests_match(&a, &a));
        assert!(!digests_match(&a, &b));
        assert!(!digests_match(&a, &a[..DIGEST_LEN - 1]));
    }
}
