//! Remote managed string reads.
//!
//! Managed strings are length-prefixed UTF-16; the decode goes through
//! `encoding_rs` so unpaired surrogates from a torn read degrade to
//! replacement characters instead of failing the whole string.

use encoding_rs::UTF_16LE;

use crate::error::{Error, Result};
use crate::memory::{ReadMemory, layout};

/// Read the managed string at `address` with the default length ceiling.
pub fn read_managed_string<R: ReadMemory + ?Sized>(
    reader: &R,
    address: u64,
    use_cache: bool,
) -> Result<String> {
    read_managed_string_bounded(reader, address, use_cache, layout::MAX_STRING_CHARS)
}

/// Read the managed string at `address`, rejecting lengths above `limit`
/// code units before any character data is read.
pub fn read_managed_string_bounded<R: ReadMemory + ?Sized>(
    reader: &R,
    address: u64,
    use_cache: bool,
    limit: usize,
) -> Result<String> {
    let mut buf = [0u8; 4];
    reader.read_buf(address + layout::string::LENGTH, &mut buf, use_cache)?;
    let length = i32::from_le_bytes(buf);
    if length < 0 || length as usize > limit {
        return Err(Error::SnapshotTooLarge {
            count: length as i64,
            limit,
        });
    }
    if length == 0 {
        return Ok(String::new());
    }

    let mut bytes = vec![0u8; length as usize * 2];
    reader.read_buf(address + layout::string::CHARS, &mut bytes, use_cache)?;

    let (decoded, _, _) = UTF_16LE.decode(&bytes);
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    const BASE: u64 = 0x4700_0000;

    fn seed_string(text: &str) -> crate::memory::MockMemoryReader {
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut bytes = Vec::new();
        for unit in &units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        MockMemoryBuilder::new()
            .with_i32(BASE + layout::string::LENGTH, units.len() as i32)
            .with_bytes(BASE + layout::string::CHARS, &bytes)
            .build()
    }

    #[test]
    fn test_read_utf16_string() {
        let reader = seed_string("Factory4_day");
        assert_eq!(
            read_managed_string(&reader, BASE, false).unwrap(),
            "Factory4_day"
        );
    }

    #[test]
    fn test_read_non_ascii_string() {
        let reader = seed_string("灯台エリア");
        assert_eq!(
            read_managed_string(&reader, BASE, false).unwrap(),
            "灯台エリア"
        );
    }

    #[test]
    fn test_read_empty_string_issues_single_read() {
        let reader = seed_string("");
        assert_eq!(read_managed_string(&reader, BASE, false).unwrap(), "");
        assert_eq!(reader.buf_read_count(), 1);
    }

    #[test]
    fn test_implausible_length_rejected() {
        let reader = MockMemoryBuilder::new()
            .with_i32(BASE + layout::string::LENGTH, 1_000_000)
            .build();
        let err = read_managed_string(&reader, BASE, false).unwrap_err();
        assert!(err.is_bounds_violation());
        assert_eq!(reader.buf_read_count(), 1);
    }
}
