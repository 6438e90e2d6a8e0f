//! Key store & pinning policy (spec §4.5).
//!
//! Two independent, opt-in behaviors: [`KeyStore`] persists the local
//! RSA keypair across sessions, and [`PinningPolicy`] applies
//! trust-on-first-use pinning to the peer's public-key fingerprint on
//! the responder side. Both are plain structs over `std::fs` with
//! scoped acquisition (open, read or write once, close) per spec §5's
//! resource model; no lock is held across network I/O.

use crate::crypto;
use crate::error::Result;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha512};
use std::path::PathBuf;
use tracing::{debug, warn};

/// A loaded or freshly generated local keypair, plus the cached PEM
/// serialization of its public half.
pub struct LocalKeys {
    pub public: RsaPublicKey,
    pub private: RsaPrivateKey,
    pub public_pem: Vec<u8>,
}

/// Persistent local keypair storage (the `const_key`/`key_file` option
/// pair in spec §6).
///
/// Layout on disk: `<public PEM>\n\n<private PEM>`, split on the first
/// blank line.
pub struct KeyStore {
    enabled: bool,
    path: PathBuf,
}

impl KeyStore {
    pub fn new(enabled: bool, path: impl Into<PathBuf>) -> Self {
        Self {
            enabled,
            path: path.into(),
        }
    }

    /// Load the keypair from disk if present, otherwise generate one at
    /// `key_size` bits and persist it (when enabled); generate a fresh
    /// ephemeral keypair with no persistence when disabled.
    pub fn load_or_generate(&self, key_size: u32) -> Result<LocalKeys> {
        if self.enabled && self.path.is_file() {
            debug!(path = %self.path.display(), "loading persisted keypair");
            return self.load();
        }

        let (public, private) = crypto::generate_keypair(key_size)?;
        let public_pem = crypto::public_key_to_pem(&public)?;

        if self.enabled {
            debug!(path = %self.path.display(), key_size, "generating and persisting new keypair");
            self.store(&public_pem, &private)?;
        }

        Ok(LocalKeys {
            public,
            private,
            public_pem,
        })
    }

    /// Regenerate the keypair at a new modulus size (the responder path
    /// when the initiator's `key_size` differs, spec §4.4 step 3). This
    /// never persists, a renegotiated key size is session-specific.
    pub fn regenerate(&self, key_size: u32) -> Result<LocalKeys> {
        let (public, private) = crypto::generate_keypair(key_size)?;
        let public_pem = crypto::public_key_to_pem(&public)?;
        Ok(LocalKeys {
            public,
            private,
            public_pem,
        })
    }

    fn load(&self) -> Result<LocalKeys> {
        let contents = std::fs::read(&self.path)?;
        let split_at = contents
            .windows(2)
            .position(|w| w == b"\n\n")
            .unwrap_or(contents.len());
        let (pub_pem, rest) = contents.split_at(split_at);
        let priv_pem = &rest[rest.len().min(2)..];

        let mut pub_pem = pub_pem.to_vec();
        if !pub_pem.ends_with(b"\n") {
            pub_pem.push(b'\n');
        }

        let public = crypto::public_key_from_pem(&pub_pem)?;
        let private = crypto::private_key_from_pem(priv_pem)?;

        Ok(LocalKeys {
            public,
            private,
            public_pem: pub_pem,
        })
    }

    fn store(&self, public_pem: &[u8], private: &RsaPrivateKey) -> Result<()> {
        let private_pem = crypto::private_key_to_pem(private)?;
        let mut contents = public_pem.to_vec();
        contents.extend_from_slice(b"\n");
        contents.extend_from_slice(&private_pem);
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Trust-on-first-use pinning of the peer's public-key fingerprint
/// (the `save_pub`/`pub_file` option pair in spec §6). Applied only on
/// the responder path (spec §4.4, §9 Open Questions).
pub struct PinningPolicy {
    enabled: bool,
    path: PathBuf,
    console_log: bool,
}

impl PinningPolicy {
    pub fn new(enabled: bool, path: impl Into<PathBuf>, console_log: bool) -> Self {
        Self {
            enabled,
            path: path.into(),
            console_log,
        }
    }

    /// SHA-512 hex digest of a public key's PEM bytes.
    pub fn fingerprint(public_pem: &[u8]) -> String {
        hex::encode(Sha512::digest(public_pem))
    }

    /// Apply the pinning policy to a candidate peer public key. Returns
    /// `Ok(true)` if the handshake may proceed, `Ok(false)` on a
    /// fingerprint mismatch.
    pub fn check(&self, peer_public_pem: &[u8]) -> Result<bool> {
        if !self.enabled {
            return Ok(true);
        }

        let fingerprint = Self::fingerprint(peer_public_pem);

        if self.path.is_file() {
            let stored = std::fs::read_to_string(&self.path)?;
            if stored.trim_end() != fingerprint {
                if self.console_log {
                    warn!("#mpsp : incorrect pub_key");
                }
                return Ok(false);
            }
        } else {
            std::fs::write(&self.path, &fingerprint)?;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn keystore_generates_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys");
        let store = KeyStore::new(true, &path);

        let keys = store.load_or_generate(512).unwrap();
        assert!(path.is_file());

        let reloaded = KeyStore::new(true, &path).load_or_generate(512).unwrap();
        assert_eq!(keys.public, reloaded.public);
    }

    #[test]
    fn keystore_disabled_never_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys");
        let store = KeyStore::new(false, &path);
        store.load_or_generate(512).unwrap();
        assert!(!path.is_file());
    }

    #[test]
    fn pinning_trust_on_first_use_then_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pin");
        let policy = PinningPolicy::new(true, &path, false);

        let pem_a = b"first-key-pem".to_vec();
        assert!(policy.check(&pem_a).unwrap());
        assert!(path.is_file());

        let stored = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stored, PinningPolicy::fingerprint(&pem_a));

        let pem_b = b"different-key-pem".to_vec();
        assert!(!policy.check(&pem_b).unwrap());

        // A mismatch must not overwrite the pinned fingerprint.
        let stored_after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stored_after, stored);
    }

    #[test]
    fn pinning_disabled_always_passes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pin");
        let policy = PinningPolicy::new(false, &path, false);
        assert!(policy.check(b"anything").unwrap());
        assert!(!path.is_file());
    }
}
