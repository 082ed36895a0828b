//! Wire format of the chunk protocol.
//!
//! A session carries exactly two kinds of frames:
//!
//! - a request of [`REQUEST_LEN`] bytes holding the chunk length as a `u64`
//!   in the byte order of the host that sent it, and
//! - a response of exactly `chunk_length` zero bytes with no header.
//!
//! The request is not normalized to network byte order, so both ends must
//! share endianness to interoperate.

use std::io::{ErrorKind, Read, Write};

use bincode::config::{self, Config};

use crate::error::{Error, Result};

/// Size in bytes of an encoded [`ChunkRequest`].
pub const REQUEST_LEN: usize = size_of::<u64>();

/// Upper bound on the zero buffer used to emit a response payload.
const ZERO_BUF_LEN: usize = 64 * 1024;

/// A request for one chunk of `chunk_length` zero bytes.
#[derive(bincode::Encode, bincode::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    /// Number of payload bytes the responder must send back.
    pub chunk_length: u64,
}

#[cfg(target_endian = "little")]
fn wire_config() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

#[cfg(target_endian = "big")]
fn wire_config() -> impl Config {
    config::standard().with_fixed_int_encoding().with_big_endian()
}

impl ChunkRequest {
    /// Creates a request for `chunk_length` bytes.
    pub fn new(chunk_length: u64) -> Self {
        ChunkRequest { chunk_length }
    }

    /// Encodes the request into its fixed-size wire representation.
    pub fn to_bytes(&self) -> Result<[u8; REQUEST_LEN]> {
        let mut buf = [0u8; REQUEST_LEN];
        let n = bincode::encode_into_slice(*self, &mut buf, wire_config())
            .map_err(|e| Error::Codec(e.to_string()))?;
        if n != REQUEST_LEN {
            return Err(Error::Codec(format!("encoded {n} bytes, expected {REQUEST_LEN}")));
        }
        Ok(buf)
    }

    /// Decodes a request from a complete frame.
    pub fn from_bytes(buf: &[u8; REQUEST_LEN]) -> Result<Self> {
        let (request, _) = bincode::decode_from_slice(buf, wire_config())
            .map_err(|e| Error::Codec(e.to_string()))?;
        Ok(request)
    }
}

/// Writes one request frame in full.
pub fn write_request<W: Write>(w: &mut W, request: &ChunkRequest) -> Result<()> {
    let buf = request.to_bytes()?;
    w.write_all(&buf)?;
    log::debug!("Sent request for {} bytes", request.chunk_length);
    Ok(())
}

/// Reads one request frame with a single read call.
///
/// Returns `Ok(None)` when the peer has closed its write side. A read that
/// yields anything other than zero or a whole frame is a framing violation;
/// the missing bytes are never waited for.
pub fn read_request<R: Read>(r: &mut R) -> Result<Option<ChunkRequest>> {
    let mut buf = [0u8; REQUEST_LEN];
    let n = loop {
        match r.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };
    match n {
        0 => Ok(None),
        REQUEST_LEN => ChunkRequest::from_bytes(&buf).map(Some),
        got => Err(Error::Framing { expected: REQUEST_LEN, got }),
    }
}

/// Writes exactly `len` zero bytes.
pub fn write_zeros<W: Write>(w: &mut W, len: u64) -> Result<()> {
    let zeros = vec![0u8; usize::try_from(len).unwrap_or(ZERO_BUF_LEN).min(ZERO_BUF_LEN)];
    let mut remaining = len;
    while remaining > 0 {
        let n = usize::try_from(remaining).unwrap_or(zeros.len()).min(zeros.len());
        w.write_all(&zeros[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_uses_native_byte_order() {
        let request = ChunkRequest::new(1_000_000);
        assert_eq!(request.to_bytes().unwrap(), 1_000_000u64.to_ne_bytes());
        let back = ChunkRequest::from_bytes(&0xdead_beefu64.to_ne_bytes()).unwrap();
        assert_eq!(back.chunk_length, 0xdead_beef);
    }

    #[test]
    fn read_request_reports_clean_close() {
        let mut empty = Cursor::new(Vec::<u8>::new());
        assert!(read_request(&mut empty).unwrap().is_none());
    }

    #[test]
    fn read_request_rejects_short_frame() {
        let mut short = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        match read_request(&mut short) {
            Err(Error::Framing { expected, got }) => {
                assert_eq!(expected, REQUEST_LEN);
                assert_eq!(got, 5);
            }
            other => panic!("expected framing error, got {other:?}"),
        }
    }

    #[test]
    fn back_to_back_requests_are_read_one_frame_at_a_time() {
        let mut bytes = Vec::new();
        write_request(&mut bytes, &ChunkRequest::new(7)).unwrap();
        write_request(&mut bytes, &ChunkRequest::new(0)).unwrap();
        assert_eq!(bytes.len(), 2 * REQUEST_LEN);

        let mut cursor = Cursor::new(bytes);
        assert_eq!(read_request(&mut cursor).unwrap(), Some(ChunkRequest::new(7)));
        assert_eq!(read_request(&mut cursor).unwrap(), Some(ChunkRequest::new(0)));
        assert_eq!(read_request(&mut cursor).unwrap(), None);
    }

    #[test]
    fn write_zeros_emits_exact_length() {
        for len in [0u64, 1, ZERO_BUF_LEN as u64, ZERO_BUF_LEN as u64 * 3 + 17] {
            let mut out = Vec::new();
            write_zeros(&mut out, len).unwrap();
            assert_eq!(out.len() as u64, len);
            assert!(out.iter().all(|&b| b == 0));
        }
    }
}
