//! TR (transfer) frame family: carries every application and
//! handshake-key payload after the initial P0 exchange.
//!
//! ```text
//! <proto_name> <split> "tr" <split> <payload_len> <split> <payload...>
//! ```
//!
//! The header always carries a trailing `split` byte so the (empty)
//! fourth field marks where the payload begins. A payload that fits
//! entirely in the first frame is space-padded to `frame_size`; a
//! payload that spans multiple frames is not padded, the final frame
//! is simply short, and the receiver stops once it has accumulated
//! `payload_len` bytes.

use crate::error::{Error, Result};
use crate::transport::Transport;
use bytes::{BufMut, BytesMut};

const TR_KIND: &[u8] = b"tr";

fn build_header(proto_name: &str, split: u8, payload_len: usize) -> Vec<u8> {
    let mut header = BytesMut::with_capacity(proto_name.len() + 16);
    header.put(proto_name.as_bytes());
    header.put_u8(split);
    header.put(TR_KIND);
    header.put_u8(split);
    header.put(payload_len.to_string().as_bytes());
    header.put_u8(split);
    header.to_vec()
}

/// Encode `payload` into the packets that must be written to the wire,
/// in order. Fails with [`Error::ConfigTooTight`] if the header alone
/// would not fit in a single frame.
pub fn encode(proto_name: &str, split: u8, payload: &[u8], frame_size: u32) -> Result<Vec<Vec<u8>>> {
    let frame_size = frame_size as usize;
    let header = build_header(proto_name, split, payload.len());

    if header.len() > frame_size {
        return Err(Error::ConfigTooTight {
            frame_size: frame_size as u32,
            header_len: header.len(),
        });
    }

    let mut packets = Vec::new();

    if header.len() + payload.len() <= frame_size {
        let mut packet = header;
        packet.extend_from_slice(payload);
        packet.resize(frame_size, b' ');
        packets.push(packet);
    } else {
        let first_payload_len = frame_size - header.len();
        let mut first = header;
        first.extend_from_slice(&payload[..first_payload_len]);
        packets.push(first);

        let mut transferred = first_payload_len;
        while transferred < payload.len() {
            let end = (transferred + frame_size).min(payload.len());
            packets.push(payload[transferred..end].to_vec());
            transferred = end;
        }
    }

    Ok(packets)
}

/// Read one complete TR payload from `transport`, issuing as many
/// additional frame reads as the declared payload length requires.
pub fn decode<T: Transport + ?Sized>(transport: &mut T, split: u8, frame_size: u32) -> Result<Vec<u8>> {
    let frame_size_usize = frame_size as usize;
    let packet = transport.recv_exact(frame_size_usize)?;

    let mut fields = packet.splitn(4, |&b| b == split);
    let _proto_name = fields.next().unwrap_or(&[]);
    let kind = fields.next().unwrap_or(&[]);

    if kind != TR_KIND {
        return Err(Error::ProtocolDesync {
            expected: "tr",
            got: String::from_utf8_lossy(kind).into_owned(),
        });
    }

    let len_field = fields.next().ok_or_else(|| Error::ProtocolDesync {
        expected: "payload_len",
        got: String::new(),
    })?;
    let len_str = std::str::from_utf8(len_field)
        .map_err(|_| Error::InvalidEncoding("TR payload length field".to_string()))?;
    let payload_len: usize = len_str
        .trim_end()
        .parse()
        .map_err(|_| Error::InvalidEncoding(format!("TR payload length {len_str:?}")))?;

    let mut data = fields.next().unwrap_or(&[]).to_vec();

    while data.len() < payload_len {
        let remaining = payload_len - data.len();
        let want = remaining.min(frame_size_usize);
        data.extend_from_slice(&transport.recv_exact(want)?);
    }

    data.truncate(payload_len);
    Ok(data)
}
