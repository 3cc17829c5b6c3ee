//! zlib encoding and strict decoding.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

/// Minimum output buffer reserved up front when inflating.
const MIN_INFLATE_CAPACITY: usize = 8 * 1024;

/// Compress `data` into a zlib stream at `level` (0-9).
pub fn deflate(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2 + 64),
        Compression::new(level),
    );
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a complete zlib stream.
///
/// Fails if the stream is malformed or ends before its end marker, so a
/// truncated file is never mistaken for a shorter valid one.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(MIN_INFLATE_CAPACITY));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }

        let in_before = decoder.total_in();
        let out_before = decoder.total_out();
        let remaining = &data[in_before as usize..];

        let status = decoder
            .decompress_vec(remaining, &mut out, FlushDecompress::None)
            .map_err(|e| format!("invalid deflate stream: {e}"))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                // Output space is always available here, so no progress means no more input
                if decoder.total_in() == in_before && decoder.total_out() == out_before {
                    return Err(format!(
                        "truncated stream: input ended after {} bytes without an end marker",
                        data.len()
                    ));
                }
            }
        }
    }
}
