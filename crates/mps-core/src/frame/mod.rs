//! Frame codec (spec §4.2).
//!
//! Two frame families live on the wire: the one-shot fixed-size [`p0`]
//! (config) packet used once per handshake, and the [`tr`] (transfer)
//! packet family used for every subsequent payload, including the
//! handshake's own public-key exchange. Header fields are ASCII text
//! joined by a single-byte delimiter; padding is trailing `0x20` bytes
//! and is never stripped explicitly by a receiver, every read cuts at a
//! declared length instead.

pub mod p0;
pub mod tr;
