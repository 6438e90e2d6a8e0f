//! Block-wise RSA payload transform (spec §4.3).
//!
//! Electronic-codebook use of PKCS#1 v1.5 RSA: the plaintext is split
//! into fixed-size blocks and each is encrypted independently with the
//! peer's public key; ciphertext blocks are decrypted independently with
//! the local private key. There is no mode, no chaining, and no
//! authentication, documented here because preserving the format is a
//! wire-compatibility requirement, not an endorsement (spec §9). A
//! reimplementation MUST NOT "fix" this silently; any upgrade
//! requires a protocol version bump in the P0 config.

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

/// Plaintext block size for a given modulus size: `key_size/8 - 11`
/// bytes of PKCS#1 v1.5 overhead (spec §4.3).
pub fn encrypt_block_size(key_size: u32) -> usize {
    (key_size / 8) as usize - 11
}

/// Ciphertext block size for a given modulus size: one block per
/// modulus, `key_size/8` bytes.
pub fn decrypt_block_size(key_size: u32) -> usize {
    (key_size / 8) as usize
}

/// Generate a fresh RSA keypair at the given modulus size.
pub fn generate_keypair(key_size: u32) -> Result<(RsaPublicKey, RsaPrivateKey)> {
    let mut rng = OsRng;
    let private = RsaPrivateKey::new(&mut rng, key_size as usize)
        .map_err(|e| Error::Crypto("keygen", e))?;
    let public = RsaPublicKey::from(&private);
    Ok((public, private))
}

/// Serialize a public key as PKCS#1 PEM bytes, matching
/// `rsa.PublicKey.save_pkcs1()` in the original implementation.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<Vec<u8>> {
    let pem = key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .map_err(|_| Error::InvalidEncoding("RSA public key PEM".to_string()))?;
    Ok(pem.into_bytes())
}

/// Parse PKCS#1 PEM bytes into a public key, matching
/// `rsa.PublicKey.load_pkcs1(pem, 'PEM')`.
pub fn public_key_from_pem(pem: &[u8]) -> Result<RsaPublicKey> {
    let text =
        std::str::from_utf8(pem).map_err(|_| Error::InvalidEncoding("RSA public key PEM".to_string()))?;
    RsaPublicKey::from_pkcs1_pem(text)
        .map_err(|_| Error::InvalidEncoding("RSA public key PEM".to_string()))
}

/// Serialize a private key as PKCS#1 PEM bytes.
pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let pem = key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .map_err(|_| Error::InvalidEncoding("RSA private key PEM".to_string()))?;
    Ok(pem.as_bytes().to_vec())
}

/// Parse PKCS#1 PEM bytes into a private key.
pub fn private_key_from_pem(pem: &[u8]) -> Result<RsaPrivateKey> {
    let text =
        std::str::from_utf8(pem).map_err(|_| Error::InvalidEncoding("RSA private key PEM".to_string()))?;
    RsaPrivateKey::from_pkcs1_pem(text)
        .map_err(|_| Error::InvalidEncoding("RSA private key PEM".to_string()))
}

/// Split `data` into consecutive blocks of `block_size` (last block may
/// be short), encrypt each with `public_key`, and concatenate the
/// ciphertext blocks.
pub fn encrypt(data: &[u8], public_key: &RsaPublicKey, key_size: u32) -> Result<Vec<u8>> {
    let block_size = encrypt_block_size(key_size);
    let mut rng = OsRng;
    let mut out = Vec::with_capacity(data.len() / block_size.max(1) * decrypt_block_size(key_size) + 16);

    for block in data.chunks(block_size.max(1)) {
        let ciphertext = public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, block)
            .map_err(|e| Error::Crypto("encrypt", e))?;
        out.extend_from_slice(&ciphertext);
    }

    Ok(out)
}

/// Split `data` into exact-size ciphertext blocks, decrypt each with
/// `private_key`, and concatenate the plaintext blocks. A short final
/// block is a protocol error: ciphertext must be an exact multiple of
/// the modulus size.
pub fn decrypt(data: &[u8], private_key: &RsaPrivateKey, key_size: u32) -> Result<Vec<u8>> {
    let block_size = decrypt_block_size(key_size);

    if block_size == 0 || !data.len().is_multiple_of(block_size) {
        return Err(Error::InvalidEncoding(format!(
            "ciphertext length {} is not a multiple of the {}-byte block size",
            data.len(),
            block_size
        )));
    }

    let mut out = Vec::with_capacity(data.len());
    for block in data.chunks(block_size) {
        let plaintext = private_key
            .decrypt(Pkcs1v15Encrypt, block)
            .map_err(|e| Error::Crypto("decrypt", e))?;
        out.extend_from_slice(&plaintext);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sizes_match_spec_formula() {
        assert_eq!(encrypt_block_size(1024), 117);
        assert_eq!(decrypt_block_size(1024), 128);
        assert_eq!(encrypt_block_size(512), 53);
        assert_eq!(decrypt_block_size(512), 64);
    }

    #[test]
    fn roundtrip_single_block() {
        let (public, private) = generate_keypair(512).unwrap();
        let plaintext = b"hello";
        let ciphertext = encrypt(plaintext, &public, 512).unwrap();
        assert_eq!(ciphertext.len(), decrypt_block_size(512));
        let decrypted = decrypt(&ciphertext, &private, 512).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn roundtrip_multi_block() {
        let (public, private) = generate_keypair(1024).unwrap();
        let plaintext = vec![0x41u8; 2000];
        let ciphertext = encrypt(&plaintext, &public, 1024).unwrap();
        assert_eq!(ciphertext.len(), 2304); // ceil(2000/117) * 128
        let decrypted = decrypt(&ciphertext, &private, 1024).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn pem_roundtrip() {
        let (public, private) = generate_keypair(512).unwrap();
        let pub_pem = public_key_to_pem(&public).unwrap();
        let parsed_pub = public_key_from_pem(&pub_pem).unwrap();
        assert_eq!(public, parsed_pub);

        let priv_pem = private_key_to_pem(&private).unwrap();
        let parsed_priv = private_key_from_pem(&priv_pem).unwrap();
        assert_eq!(private.to_public_key(), parsed_priv.to_public_key());
    }

    #[test]
    fn decrypt_rejects_short_tail() {
        let (_, private) = generate_keypair(512).unwrap();
        let err = decrypt(&[0u8; 10], &private, 512).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }
}
