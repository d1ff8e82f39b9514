/*!
HTTP/1.1 chunked transfer-coding, read and write sides. Writing switches to chunked automatically
once a payload exceeds [`DEFAULT_CHUNK_THRESHOLD`] and a `Content-Length` would otherwise have
been used instead (§4.2); the source left this knob unspecified, so this crate documents and
defaults it rather than hard-coding it invisibly.
*/

use crate::error::Error;
use std::io::{BufRead, Read, Write};

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

/// Payloads at or above this size are written chunked rather than with `Content-Length`.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 1024 * 1024;

/// Upper bound on a single written chunk's size.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 64 * 1024;

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Writes `body` as a sequence of chunks bounded by `max_chunk_size`, followed by the
/// zero-size terminating chunk. Trailers are never written.
pub fn write_chunked<W: Write>(
    writer: &mut W,
    body: &[u8],
    max_chunk_size: usize,
) -> Result<(), Error> {
    for chunk in body.chunks(max_chunk_size.max(1)) {
        write!(writer, "{:x}\r\n", chunk.len())?;
        writer.write_all(chunk)?;
        writer.write_all(b"\r\n")?;
    }
    writer.write_all(b"0\r\n\r\n")?;
    Ok(())
}

/// Reads a chunked body from `reader` until the zero-size chunk, discarding any trailers.
pub fn read_chunked<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line)?;
        let size_line = size_line.trim();
        // A chunk extension, if present, follows a ';' and is ignored.
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16)
            .map_err(|_| crate::error::invalid_field_value("chunk-size", size_line))?;
        if size == 0 {
            // Discard trailers up to the terminating empty line.
            loop {
                let mut trailer_line = String::new();
                reader.read_line(&mut trailer_line)?;
                if trailer_line.trim().is_empty() {
                    break;
                }
            }
            break;
        }
        let mut chunk = vec![0u8; size];
        reader.read_exact(&mut chunk)?;
        body.extend_from_slice(&chunk);
        // Each chunk's data is followed by a CRLF.
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
    }
    Ok(body)
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_body_across_several_chunks() {
        let body = vec![b'x'; 10_000];
        let mut encoded = Vec::new();
        write_chunked(&mut encoded, &body, 4096).unwrap();

        let mut reader = Cursor::new(encoded);
        let decoded = read_chunked(&mut reader).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn round_trips_an_empty_body() {
        let mut encoded = Vec::new();
        write_chunked(&mut encoded, &[], 4096).unwrap();
        let mut reader = Cursor::new(encoded);
        let decoded = read_chunked(&mut reader).unwrap();
        assert_eq!(decoded, Vec::<u8>::new());
    }
}
