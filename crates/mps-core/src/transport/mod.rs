//! Transport adapter (spec §4.1).
//!
//! Hides partial reads/writes from the rest of the engine: `send_all`
//! writes every byte before returning, `recv_exact` returns exactly `n`
//! bytes or fails with [`Error::TransportClosed`]. Everything above this
//! layer relies on both being total, it never issues a read expecting a
//! short return.

use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::net::TcpStream;

/// A byte-stream endpoint the protocol engine can send to and receive
/// from. Implemented for anything that is `Read + Write` via the
/// blanket impl below; callers needing dynamic dispatch can box a
/// `dyn Transport`.
pub trait Transport {
    /// Write every byte of `buf`, looping internally on short writes.
    fn send_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Read and return exactly `n` bytes, looping internally on short
    /// reads. Fails with [`Error::TransportClosed`] on EOF or I/O error.
    fn recv_exact(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Release the underlying stream. Best-effort: never returns an
    /// error a caller needs to handle, since [`crate::Session::close`]
    /// must never raise (spec §7). The default no-op suits a plain
    /// in-memory stream; [`TcpTransport`] overrides it to shut down the
    /// socket in both directions.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Blanket adapter over any `Read + Write` stream (an in-memory duplex
/// pipe in tests, anything else a caller already owns), matching the
/// teacher's habit of wrapping a raw socket behind a small owned type
/// rather than exposing it directly to protocol logic.
impl<S: Read + Write + ?Sized> Transport for S {
    fn send_all(&mut self, buf: &[u8]) -> Result<()> {
        self.write_all(buf).map_err(|_| Error::TransportClosed)
    }

    fn recv_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        self.read_exact(&mut out).map_err(|_| Error::TransportClosed)?;
        Ok(out)
    }
}

/// A `TcpStream`-backed transport that shuts the socket down in both
/// directions on [`Transport::close`]. The natural production transport
/// for `mps-node`: opaque to the protocol engine above it, same as the
/// teacher's `ClientConnection` wrapping a raw socket in `ro2-login`.
pub struct TcpTransport(pub TcpStream);

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self(stream)
    }
}

impl Transport for TcpTransport {
    fn send_all(&mut self, buf: &[u8]) -> Result<()> {
        self.0.write_all(buf).map_err(|_| Error::TransportClosed)
    }

    fn recv_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        self.0.read_exact(&mut out).map_err(|_| Error::TransportClosed)?;
        Ok(out)
    }

    fn close(&mut self) -> Result<()> {
        let _ = self.0.shutdown(std::net::Shutdown::Both);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn recv_exact_returns_requested_length() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        let got = cursor.recv_exact(3).unwrap();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn recv_exact_on_short_stream_fails_closed() {
        let mut cursor = Cursor::new(vec![1, 2]);
        let err = cursor.recv_exact(5).unwrap_err();
        assert!(matches!(err, Error::TransportClosed));
    }

    #[test]
    fn send_all_writes_every_byte() {
        let mut buf: Vec<u8> = Vec::new();
        buf.send_all(b"hello").unwrap();
        assert_eq!(buf, b"hello");
    }
}
