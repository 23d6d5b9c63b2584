//! Line encoder: one field set to one delimited text line

use crate::binary::write_hex;
use crate::error::SinkResult;
use crate::field::{FieldSet, FieldValue};
use std::io::Write;

/// Encodes records and header rows with a single-byte delimiter
#[derive(Debug, Clone, Copy)]
pub struct LineEncoder {
    delimiter: u8,
}

impl Default for LineEncoder {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl LineEncoder {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Write the header row: field names joined by the delimiter, newline terminated
    pub fn write_header<W, S>(&self, out: &mut W, names: &[S]) -> SinkResult<()>
    where
        W: Write + ?Sized,
        S: AsRef<str>,
    {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                out.write_all(&[self.delimiter])?;
            }
            out.write_all(name.as_ref().as_bytes())?;
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    /// Write one record as a newline terminated line
    pub fn write_record<W: Write + ?Sized>(&self, out: &mut W, record: &FieldSet) -> SinkResult<()> {
        for (i, field) in record.iter().enumerate() {
            if i > 0 {
                out.write_all(&[self.delimiter])?;
            }
            self.write_value(out, &field.value)?;
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    /// Encode one record into an owned line, including the trailing newline
    pub fn encode_record(&self, record: &FieldSet) -> SinkResult<String> {
        let mut buf = Vec::with_capacity(record.len() * 8);
        self.write_record(&mut buf, record)?;
        String::from_utf8(buf).map_err(Into::into)
    }

    fn write_value<W: Write + ?Sized>(&self, out: &mut W, value: &FieldValue) -> SinkResult<()> {
        match value {
            FieldValue::String(s) => {
                // No escaping of embedded quotes
                if s.as_bytes().contains(&self.delimiter) {
                    out.write_all(b"\"")?;
                    out.write_all(s.as_bytes())?;
                    out.write_all(b"\"")?;
                } else {
                    out.write_all(s.as_bytes())?;
                }
            }
            FieldValue::Uint64(n) => write!(out, "{n}")?,
            FieldValue::Bool(b) => out.write_all(if *b { b"1" } else { b"0" })?,
            FieldValue::Binary(bytes) => write_hex(out, bytes)?,
            FieldValue::Null => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(record: &FieldSet) -> String {
        LineEncoder::default()
            .encode_record(record)
            .expect("Failed to encode test record")
    }

    #[test]
    fn test_scalar_types() {
        let record = FieldSet::new()
            .with("addr", "10.0.0.2")
            .with("ip", 5u64)
            .with("ok", true)
            .with("closed", false);
        assert_eq!(encode(&record), "10.0.0.2,5,1,0\n");
    }

    #[test]
    fn test_string_without_delimiter_is_verbatim() {
        let record = FieldSet::new().with("banner", "SSH-2.0 \"OpenSSH\"");
        assert_eq!(encode(&record), "SSH-2.0 \"OpenSSH\"\n");
    }

    #[test]
    fn test_string_with_delimiter_is_quoted() {
        let record = FieldSet::new().with("a", "x").with("b", "a,b");
        assert_eq!(encode(&record), "x,\"a,b\"\n");
    }

    #[test]
    fn test_quoting_follows_configured_delimiter() {
        let encoder = LineEncoder::new(b'\t');
        let record = FieldSet::new().with("a", "a,b").with("b", "c\td");
        let line = encoder.encode_record(&record).expect("encode");
        assert_eq!(line, "a,b\t\"c\td\"\n");
    }

    #[test]
    fn test_null_is_empty_span() {
        let record = FieldSet::new()
            .with("a", 1u64)
            .with("b", FieldValue::Null)
            .with("c", 2u64);
        assert_eq!(encode(&record), "1,,2\n");

        let trailing = FieldSet::new().with("a", 1u64).with("b", FieldValue::Null);
        assert_eq!(encode(&trailing), "1,\n");
    }

    #[test]
    fn test_binary_is_lowercase_hex() {
        let payload = vec![0x16, 0x03, 0x01, 0xAB, 0xFF];
        let record = FieldSet::new().with("data", payload.clone());
        let line = encode(&record);
        let encoded = line.trim_end_matches('\n');

        assert_eq!(encoded.len(), payload.len() * 2);
        assert_eq!(encoded, "160301abff");
        assert_eq!(hex::decode(encoded).expect("valid hex"), payload);
    }

    #[test]
    fn test_u64_max() {
        let record = FieldSet::new().with("n", u64::MAX);
        assert_eq!(encode(&record), "18446744073709551615\n");
    }

    #[test]
    fn test_header() {
        let mut out = Vec::new();
        LineEncoder::default()
            .write_header(&mut out, &["addr", "ip", "ok"])
            .expect("write header");
        assert_eq!(out, b"addr,ip,ok\n");
    }
}
