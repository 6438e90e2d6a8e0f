//! P0 (config) frame: the one-shot handshake descriptor.
//!
//! ```text
//! <proto_name> '$' "co" '$' <config_len>  padded with 0x20 to config_frame_size
//! ```
//!
//! The delimiter here is the literal `$` byte regardless of the
//! negotiated `split`, a deliberate wire-compatibility
//! preservation, not an oversight (spec §9 Open Questions, see
//! `DESIGN.md`).

use crate::config::TextEncoding;
use crate::error::{Error, Result};

const P0_DELIM: char = '$';
const P0_KIND: &str = "co";

/// Build the fixed-size P0 packet: header padded with spaces to
/// `config_frame_size`. Fails with [`Error::ConfigTooTight`] if the
/// header alone would not fit with room to spare.
pub fn encode(
    proto_name: &str,
    config_len: usize,
    config_frame_size: u32,
    config_encoding: TextEncoding,
) -> Result<Vec<u8>> {
    let header = [proto_name, P0_KIND, &config_len.to_string()].join(&P0_DELIM.to_string());
    let header = config_encoding.encode(&header);

    if header.len() >= config_frame_size as usize {
        return Err(Error::ConfigTooTight {
            frame_size: config_frame_size,
            header_len: header.len(),
        });
    }

    let mut packet = header;
    packet.resize(config_frame_size as usize, b' ');
    Ok(packet)
}

/// Decoded P0 header fields.
pub struct Header {
    pub proto_name: String,
    pub config_len: usize,
}

/// Parse a P0 packet of exactly `config_frame_size` bytes (trailing
/// space padding included: the decimal length field has no trailing
/// delimiter, so `str::parse` on the space-padded fourth-and-later
/// bytes would fail; the config length is the third field only).
pub fn decode(packet: &[u8], config_encoding: TextEncoding) -> Result<Header> {
    let text = config_encoding.decode(packet)?;
    let fields: Vec<&str> = text.split(P0_DELIM).collect();

    if fields.len() < 3 || fields[1] != P0_KIND {
        return Err(Error::ProtocolDesync {
            expected: P0_KIND,
            got: fields.get(1).map(|s| s.to_string()).unwrap_or_default(),
        });
    }

    let config_len: usize = fields[2]
        .trim_end()
        .parse()
        .map_err(|_| Error::InvalidEncoding(format!("P0 config length {:?}", fields[2])))?;

    Ok(Header {
        proto_name: fields[0].to_string(),
        config_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pads_to_frame_size() {
        let packet = encode("mps", 42, 1000, TextEncoding::Utf8).unwrap();
        assert_eq!(packet.len(), 1000);
        assert!(packet.starts_with(b"mps$co$42"));
        assert!(packet[9..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn decode_recovers_fields() {
        let packet = encode("mps", 123, 200, TextEncoding::Utf8).unwrap();
        let header = decode(&packet, TextEncoding::Utf8).unwrap();
        assert_eq!(header.proto_name, "mps");
        assert_eq!(header.config_len, 123);
    }

    #[test]
    fn encode_rejects_frame_too_tight() {
        let err = encode("mps", 42, 5, TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, Error::ConfigTooTight { .. }));
    }

    #[test]
    fn decode_rejects_wrong_kind() {
        let mut packet = b"mps$xx$5".to_vec();
        packet.resize(100, b' ');
        let err = decode(&packet, TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, Error::ProtocolDesync { .. }));
    }
}
