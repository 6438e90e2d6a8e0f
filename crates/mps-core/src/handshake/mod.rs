//! Handshake engine (spec §4.4).
//!
//! Two roles, symmetric termination: [`initiate`] (`set_handshake` in
//! the original implementation) drives a config push followed by a
//! public-key exchange; [`respond`] (`get_handshake`) consumes it. All
//! P0 and key-exchange payloads traverse the TR path with encryption
//! off. Neither function is restartable, a [`crate::session::Session`]
//! calls one of them exactly once, during construction.

mod config_blob;
pub mod state;

pub use state::HandshakeState;

use crate::config::{Config, HandshakeConstants, SessionParams};
use crate::crypto;
use crate::error::Result;
use crate::error::Error;
use crate::frame::{p0, tr};
use crate::keystore::{KeyStore, LocalKeys, PinningPolicy};
use crate::transport::Transport;
use config_blob::ConfigBlob;
use rsa::RsaPublicKey;
use tracing::debug;

/// Everything a completed handshake installs on the session.
pub struct HandshakeOutcome {
    pub params: SessionParams,
    pub local: LocalKeys,
    pub peer_public: RsaPublicKey,
}

fn send_tr_unencrypted<T: Transport + ?Sized>(
    transport: &mut T,
    params: &SessionParams,
    payload: &[u8],
) -> Result<()> {
    for packet in tr::encode(&params.proto_name, params.split, payload, params.frame_size)? {
        transport.send_all(&packet)?;
    }
    Ok(())
}

/// Initiator role (`set_handshake`): push our config and public key,
/// then install the peer's.
pub fn initiate<T: Transport + ?Sized>(
    transport: &mut T,
    cfg: &Config,
    constants: &HandshakeConstants,
    local: LocalKeys,
    state: &mut HandshakeState,
) -> Result<HandshakeOutcome> {
    let params = cfg.initial_params();
    params.validate()?;

    let blob = ConfigBlob::from_params(&params)?;
    let json = serde_json::to_vec(&blob)?;

    let p0_packet = p0::encode(
        &params.proto_name,
        json.len(),
        constants.config_frame_size,
        constants.config_encoding,
    )?;
    transport.send_all(&p0_packet)?;
    transport.send_all(&json)?;
    debug!(frame_size = params.frame_size, key_size = params.key_size, "sent handshake config");
    *state = HandshakeState::ConfigSent;

    send_tr_unencrypted(transport, &params, &local.public_pem)?;
    debug!("sent local public key");
    *state = HandshakeState::PubKeySent;

    let peer_pem = tr::decode(transport, params.split, params.frame_size)?;
    let peer_public = crypto::public_key_from_pem(&peer_pem)?;
    debug!("received peer public key");
    *state = HandshakeState::Ready;

    Ok(HandshakeOutcome {
        params,
        local,
        peer_public,
    })
}

/// Responder role (`get_handshake`): consume the peer's config and
/// public key, apply pinning, then send ours back.
pub fn respond<T: Transport + ?Sized>(
    transport: &mut T,
    cfg: &Config,
    constants: &HandshakeConstants,
    keystore: &KeyStore,
    pinning: &PinningPolicy,
    mut local: LocalKeys,
    state: &mut HandshakeState,
) -> Result<HandshakeOutcome> {
    let p0_bytes = transport.recv_exact(constants.config_frame_size as usize)?;
    let header = p0::decode(&p0_bytes, constants.config_encoding)?;

    let json_bytes = transport.recv_exact(header.config_len)?;
    let blob: ConfigBlob = serde_json::from_slice(&json_bytes)?;
    let mut params = blob.to_params()?;
    debug!(frame_size = params.frame_size, key_size = params.key_size, "received handshake config");
    *state = HandshakeState::ConfigReceived;

    if cfg.key_size != params.key_size {
        debug!(
            from = cfg.key_size,
            to = params.key_size,
            "peer key_size differs, regenerating local keypair"
        );
        local = keystore.regenerate(params.key_size)?;
    }
    params.validate()?;

    let peer_pem_candidate = tr::decode(transport, params.split, params.frame_size)?;

    if !pinning.check(&peer_pem_candidate)? {
        return Err(Error::PeerKeyMismatch);
    }
    let peer_public = crypto::public_key_from_pem(&peer_pem_candidate)?;
    debug!("pinning policy accepted peer public key");
    *state = HandshakeState::PubKeyAwaited;

    send_tr_unencrypted(transport, &params, &local.public_pem)?;
    debug!("sent local public key");
    *state = HandshakeState::Ready;

    Ok(HandshakeOutcome {
        params,
        local,
        peer_public,
    })
}
