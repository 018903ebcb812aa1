//! Body transport: content-length and chunked framing, both directions.
//!
//! Every read round runs under the keep-alive deadline; a round that makes
//! no progress within it fails with [`Error::IdleTimeout`], which the server
//! answers with silence and the client reports as a timeout.

use std::io;

use tokio::io::{AsyncBufRead, AsyncReadExt};
use tokio::time::timeout;

use crate::http::error::Error;
use crate::http::parser::read_head_line;
use crate::http::KEEP_ALIVE_TIMEOUT;

/// Final frame of a chunk stream. The space before the first CRLF is part
/// of the wire format this engine emits and accepts.
pub const CHUNK_TERMINATOR: &[u8] = b"0 \r\n\r\n";

/// Reads exactly `length` body bytes.
///
/// A stream that ends short of `length` is a framing violation.
pub async fn read_full_body<R>(reader: &mut R, length: usize) -> Result<Vec<u8>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = vec![0u8; length];
    timeout(KEEP_ALIVE_TIMEOUT, reader.read_exact(&mut body))
        .await
        .map_err(|_| Error::IdleTimeout)?
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::BadRequest,
            _ => Error::Io(e),
        })?;
    Ok(body)
}

/// Reads a chunked body until the zero-size terminator.
///
/// Without a callback the decoded chunks accumulate and are returned whole.
/// With one, each decoded chunk is handed to the callback and the
/// accumulation buffer is reset afterwards, so the returned body holds only
/// what arrived after the callback last declined; returning `false` stops
/// the read there.
pub async fn read_chunked_body<R, F>(reader: &mut R, mut on_chunk: Option<F>) -> Result<Vec<u8>, Error>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&[u8]) -> bool,
{
    let mut body = Vec::new();
    let mut finished = false;

    while !finished {
        let size_line = timeout(KEEP_ALIVE_TIMEOUT, read_chunk_size_line(reader))
            .await
            .map_err(|_| Error::IdleTimeout)??;

        let size = u32::from_str_radix(size_line.trim(), 16).map_err(|_| Error::BadRequest)?;

        if size != 0 {
            let mut chunk = vec![0u8; size as usize];
            timeout(KEEP_ALIVE_TIMEOUT, reader.read_exact(&mut chunk))
                .await
                .map_err(|_| Error::IdleTimeout)?
                .map_err(|e| match e.kind() {
                    io::ErrorKind::UnexpectedEof => Error::BadRequest,
                    _ => Error::Io(e),
                })?;

            match on_chunk.as_mut() {
                Some(callback) => {
                    let proceed = callback(&chunk);
                    body.clear();
                    if !proceed {
                        finished = true;
                    }
                }
                None => body.extend_from_slice(&chunk),
            }
        } else {
            finished = true;
        }

        // CRLF after the chunk payload; after the terminator this is the
        // single final CRLF. Trailing headers are unsupported.
        let _ = timeout(KEEP_ALIVE_TIMEOUT, read_head_line(reader)).await;
    }

    Ok(body)
}

/// Reads the next non-empty line, the hex chunk size.
async fn read_chunk_size_line<R>(reader: &mut R) -> Result<String, Error>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_head_line(reader).await? {
            None => return Err(Error::BadRequest),
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => return Ok(line),
        }
    }
}

/// Appends one chunk frame: lowercase hex size, a space, CRLF, the payload,
/// CRLF.
pub fn encode_chunk(buf: &mut Vec<u8>, chunk: &[u8]) {
    buf.extend_from_slice(format!("{:x} \r\n", chunk.len()).as_bytes());
    buf.extend_from_slice(chunk);
    buf.extend_from_slice(b"\r\n");
}
