//! Binary field encoder: lowercase hex, two digits per byte

use std::io::{self, Write};

/// Bytes encoded per chunk when streaming to a writer
const CHUNK_BYTES: usize = 256;

/// Encode bytes as lowercase hex, two digits per byte
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Stream the hex encoding of `bytes` into `out` without allocating
pub fn write_hex<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    let mut buf = [0u8; CHUNK_BYTES * 2];
    for chunk in bytes.chunks(CHUNK_BYTES) {
        let dst = &mut buf[..chunk.len() * 2];
        hex::encode_to_slice(chunk, dst)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        out.write_all(dst)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_lowercase() {
        assert_eq!(encode(&[0x00, 0x0f, 0xab, 0xff]), "000fabff");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_write_hex_spans_chunks() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(CHUNK_BYTES * 2 + 3).collect();
        let mut out = Vec::new();
        write_hex(&mut out, &bytes).expect("write to vec");

        assert_eq!(out.len(), bytes.len() * 2);
        assert_eq!(String::from_utf8(out.clone()).expect("ascii"), encode(&bytes));
        assert_eq!(hex::decode(&out).expect("valid hex"), bytes);
    }
}
