//! Session configuration (spec §3, §6).
//!
//! [`Config`] is the constructor-style option table a caller fills in
//! before building a [`crate::Session`]; [`SessionParams`] is the subset
//! that gets negotiated during handshake and then frozen for the life of
//! the session.

use crate::error::{Error, Result};

/// Text encoding used to turn application strings into bytes and back.
///
/// The wire format only ever names an encoding by string (`"utf-8"` in
/// every scenario spec.md exercises and in `original_source/`); nothing
/// in the spec or the original implementation exercises a second
/// encoding, so this is a small closed enum rather than a dependency on a
/// general codec crate. See `DESIGN.md` for the Open Question this
/// resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
}

impl TextEncoding {
    /// Parse the encoding name as it appears in the handshake config blob.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            other => Err(Error::InvalidEncoding(format!("text encoding {other:?}"))),
        }
    }

    /// The canonical name written into the handshake config blob.
    pub fn as_name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|_| Error::InvalidEncoding("utf-8 payload".to_string())),
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::Utf8
    }
}

/// Session parameters negotiated once during handshake, then immutable
/// for the life of the session (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub frame_size: u32,
    pub proto_name: String,
    pub split: u8,
    pub text_encoding: TextEncoding,
    pub key_size: u32,
}

impl SessionParams {
    /// `key_size` is a multiple of 8 and at least 96, so the encrypt
    /// block size `key_size/8 - 11` is at least 1 (spec §3 invariants).
    pub fn validate(&self) -> Result<()> {
        if self.key_size % 8 != 0 || self.key_size < 96 {
            return Err(Error::InvalidEncoding(format!(
                "key_size {} (must be a multiple of 8 and >= 96)",
                self.key_size
            )));
        }
        Ok(())
    }
}

/// Handshake-only constants, fixed before handshake and never
/// renegotiated (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeConstants {
    pub config_frame_size: u32,
    pub config_encoding: TextEncoding,
}

impl Default for HandshakeConstants {
    fn default() -> Self {
        Self {
            config_frame_size: 1000,
            config_encoding: TextEncoding::Utf8,
        }
    }
}

/// Constructor-style configuration recognized by an MPS endpoint (spec
/// §6's option table).
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial `frame_size` proposal (`package_max_size`).
    pub package_max_size: u32,
    /// Initial `proto_name`.
    pub proto_name: String,
    /// Initial `split` delimiter (`split_symbol`).
    pub split_symbol: u8,
    /// Initial `text_encoding` (`encoding`).
    pub encoding: TextEncoding,
    /// Fixed P0 packet length (`config_p0_size`).
    pub config_p0_size: u32,
    /// Encoding of the P0 header and JSON config blob.
    pub config_encoding: TextEncoding,
    /// Initial RSA modulus size in bits.
    pub key_size: u32,
    /// Enable persistent local keypair storage.
    pub const_key: bool,
    /// Path to the persistent local keypair file.
    pub key_file: String,
    /// Enable trust-on-first-use pinning of the peer's public key
    /// (responder side only, spec §4.5).
    pub save_pub: bool,
    /// Path to the pinning fingerprint file.
    pub pub_file: String,
    /// Emit a diagnostic log line on a pinning mismatch.
    pub console_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_max_size: 1000,
            proto_name: "mps".to_string(),
            split_symbol: b'$',
            encoding: TextEncoding::Utf8,
            config_p0_size: 1000,
            config_encoding: TextEncoding::Utf8,
            key_size: 512,
            const_key: false,
            key_file: ".mp.chain".to_string(),
            save_pub: false,
            pub_file: ".mp.pub_d".to_string(),
            console_log: false,
        }
    }
}

impl Config {
    pub fn with_frame_size(mut self, frame_size: u32) -> Self {
        self.package_max_size = frame_size;
        self
    }

    pub fn with_proto_name(mut self, name: impl Into<String>) -> Self {
        self.proto_name = name.into();
        self
    }

    pub fn with_split(mut self, split: u8) -> Self {
        self.split_symbol = split;
        self
    }

    pub fn with_key_size(mut self, key_size: u32) -> Self {
        self.key_size = key_size;
        self
    }

    pub fn with_const_key(mut self, key_file: impl Into<String>) -> Self {
        self.const_key = true;
        self.key_file = key_file.into();
        self
    }

    pub fn with_save_pub(mut self, pub_file: impl Into<String>) -> Self {
        self.save_pub = true;
        self.pub_file = pub_file.into();
        self
    }

    pub fn with_console_log(mut self, enabled: bool) -> Self {
        self.console_log = enabled;
        self
    }

    /// The initial session params this config proposes, before
    /// handshake negotiation may override them.
    pub fn initial_params(&self) -> SessionParams {
        SessionParams {
            frame_size: self.package_max_size,
            proto_name: self.proto_name.clone(),
            split: self.split_symbol,
            text_encoding: self.encoding,
            key_size: self.key_size,
        }
    }

    pub fn handshake_constants(&self) -> HandshakeConstants {
        HandshakeConstants {
            config_frame_size: self.config_p0_size,
            config_encoding: self.config_encoding,
        }
    }
}
