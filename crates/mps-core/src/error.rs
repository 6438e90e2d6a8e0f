//! Error types surfaced by the MPS protocol engine.
//!
//! Every engine operation returns a [`Result`] instead of the `True`/`False`
//! sentinel the original implementation used, callers pattern-match on the
//! [`Error`] variant instead of re-deriving failure from a falsy return.

use thiserror::Error;

/// Errors produced by the MPS protocol engine (spec §7).
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying transport ended or errored mid read/write. Fatal; the
    /// owning session transitions to `Closed`.
    #[error("transport closed")]
    TransportClosed,

    /// A header's kind tag (`co`/`tr`) did not match what the codec
    /// expected. Fatal.
    #[error("protocol desynchronized: expected {expected:?} field, got {got:?}")]
    ProtocolDesync {
        /// The header kind tag the codec required at this point.
        expected: &'static str,
        /// What was actually found in that field.
        got: String,
    },

    /// The configured frame size leaves no room for the header it must
    /// carry. Surfaced at the operation that detected it, not fatal to the
    /// session.
    #[error("frame size {frame_size} is too small for a {header_len}-byte header")]
    ConfigTooTight {
        /// The frame (or P0) size that was too small.
        frame_size: u32,
        /// The header length that didn't fit.
        header_len: usize,
    },

    /// A send/receive that requires a completed handshake was called before
    /// the session reached the `Ready` state (or after `close`).
    #[error("session has not completed its handshake")]
    NotHandshaken,

    /// The peer's public key fingerprint did not match the pinned value.
    /// Fatal handshake failure.
    #[error("peer public key does not match the pinned fingerprint")]
    PeerKeyMismatch,

    /// RSA encrypt/decrypt rejected the input (wrong length, corrupted
    /// ciphertext). Fatal for that payload.
    #[error("RSA {0} failed: {1}")]
    Crypto(&'static str, rsa::Error),

    /// A wire field was not valid for the configured encoding, or named
    /// an encoding this engine does not implement.
    #[error("invalid {0}")]
    InvalidEncoding(String),

    /// I/O error from the transport adapter or key/pin file access.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The handshake JSON config blob failed to (de)serialize.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout `mps-core`.
pub type Result<T> = std::result::Result<T, Error>;
