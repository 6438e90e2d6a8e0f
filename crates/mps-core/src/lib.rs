//! MPS (Message Protocol Secure) protocol engine.
//!
//! A small, framed, RSA-encrypted application-layer transport over a
//! reliable byte-stream. Two endpoints negotiate framing parameters and
//! exchange long-lived RSA public keys during a handshake; afterward each
//! direction encrypts outbound payloads with the peer's public key and
//! decrypts inbound payloads with its own private key.
//!
//! This crate is the protocol engine only: the handshake state machine,
//! the fixed-size frame codec, the block-wise RSA payload transform, and
//! the optional key-pinning policy. Establishing the underlying
//! byte-stream (dialing, listening, accepting) is left to the caller,
//! `mps-core` consumes anything implementing [`std::io::Read`] +
//! [`std::io::Write`].
//!
//! This is not a drop-in TLS replacement: there is no forward secrecy, no
//! authenticated encryption, no replay protection, no session resumption,
//! and no certificate chain. See [`crypto`] for the exact wire-compatible
//! shortcomings this preserves on purpose.

pub mod config;
pub mod crypto;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod keystore;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
pub use transport::Transport;
