//! Handshake state machine (spec §4.4).
//!
//! `Fresh → ConfigSent/ConfigReceived → PubKeySent/PubKeyAwaited → Ready
//! → Closed`. The two middle stages have one name per role: an
//! initiator moves through `ConfigSent`/`PubKeySent`, a responder
//! through `ConfigReceived`/`PubKeyAwaited`. The machine is not
//! restartable, there is no transition back out of `Closed` or out of
//! a handshake that returned an error before reaching `Ready`.

/// Current stage of a session's handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No handshake traffic has been exchanged yet.
    Fresh,
    /// Initiator: sent the P0 descriptor and JSON config blob.
    ConfigSent,
    /// Responder: received and parsed the P0 descriptor and config blob.
    ConfigReceived,
    /// Initiator: sent its own public key, waiting on the peer's.
    PubKeySent,
    /// Responder: received a candidate peer public key, pinning policy
    /// applied, about to send its own key back.
    PubKeyAwaited,
    /// Handshake complete; `peer_pub` installed. Send/recv are now
    /// permitted.
    Ready,
    /// The session has been closed. Terminal.
    Closed,
}

impl HandshakeState {
    /// Whether send/recv operations that require a completed handshake
    /// may proceed.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}
