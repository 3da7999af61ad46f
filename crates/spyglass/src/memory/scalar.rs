//! Fixed-width scalar decoding for remote reads.
//!
//! Every value the engine reconstructs from raw bytes goes through the
//! [`Scalar`] trait: a blittable little-endian value with a known width.
//! Collection snapshots and scatter entries are generic over it.

use strum::{Display, EnumIter, EnumString};

use crate::error::Result;
use crate::memory::ReadMemory;

/// Widest scalar the engine decodes inline (covers every [`Scalar`] impl
/// with headroom for short raw reads).
pub const MAX_SCALAR_WIDTH: usize = 16;

/// A fixed-width value decodable from remote memory bytes.
///
/// Implementations decode from little-endian byte order, matching the
/// target process layout on every supported platform.
pub trait Scalar: Copy + Sized {
    /// Number of bytes this value occupies in the remote process.
    const WIDTH: usize;

    /// Decode from exactly [`Self::WIDTH`] bytes.
    ///
    /// Callers guarantee `bytes.len() == Self::WIDTH`.
    fn from_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar_int {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = size_of::<$ty>();

                fn from_bytes(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_scalar_int!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const WIDTH: usize = 1;

    fn from_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Runtime-selectable scalar type, used by the CLI to parse `--type`
/// arguments and format read results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    /// Byte width of this kind in the remote process.
    pub fn width(&self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }

    /// Read a value of this kind at `address` and format it for display.
    pub fn read_display<R: ReadMemory + ?Sized>(
        &self,
        reader: &R,
        address: u64,
        use_cache: bool,
    ) -> Result<String> {
        let mut buf = [0u8; MAX_SCALAR_WIDTH];
        let width = self.width();
        reader.read_buf(address, &mut buf[..width], use_cache)?;
        Ok(self.format_bytes(&buf[..width]))
    }

    /// Decode and format a raw byte slice of this kind's width.
    pub fn format_bytes(&self, bytes: &[u8]) -> String {
        match self {
            ScalarKind::U8 => u8::from_bytes(bytes).to_string(),
            ScalarKind::I8 => i8::from_bytes(bytes).to_string(),
            ScalarKind::U16 => u16::from_bytes(bytes).to_string(),
            ScalarKind::I16 => i16::from_bytes(bytes).to_string(),
            ScalarKind::U32 => u32::from_bytes(bytes).to_string(),
            ScalarKind::I32 => i32::from_bytes(bytes).to_string(),
            ScalarKind::U64 => format!("{} ({:#x})", u64::from_bytes(bytes), u64::from_bytes(bytes)),
            ScalarKind::I64 => i64::from_bytes(bytes).to_string(),
            ScalarKind::F32 => f32::from_bytes(bytes).to_string(),
            ScalarKind::F64 => f64::from_bytes(bytes).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scalar_widths() {
        assert_eq!(<u8 as Scalar>::WIDTH, 1);
        assert_eq!(<i32 as Scalar>::WIDTH, 4);
        assert_eq!(<u64 as Scalar>::WIDTH, 8);
        assert_eq!(<f64 as Scalar>::WIDTH, 8);
        assert_eq!(<bool as Scalar>::WIDTH, 1);
    }

    #[test]
    fn test_scalar_decode_le() {
        assert_eq!(u32::from_bytes(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!(i32::from_bytes(&[0xFF, 0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(
            u64::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0x80]),
            0x8000_0000_0000_0000
        );
        assert_eq!(f32::from_bytes(&1.5f32.to_le_bytes()), 1.5);
    }

    #[test]
    fn test_scalar_decode_bool() {
        assert!(bool::from_bytes(&[1]));
        assert!(bool::from_bytes(&[0xFF]));
        assert!(!bool::from_bytes(&[0]));
    }

    #[test]
    fn test_scalar_kind_parse() {
        assert_eq!(ScalarKind::from_str("u32").unwrap(), ScalarKind::U32);
        assert_eq!(ScalarKind::from_str("f64").unwrap(), ScalarKind::F64);
        assert!(ScalarKind::from_str("u128").is_err());
    }

    #[test]
    fn test_scalar_kind_format() {
        assert_eq!(
            ScalarKind::I32.format_bytes(&(-42i32).to_le_bytes()),
            "-42"
        );
        assert_eq!(ScalarKind::F32.format_bytes(&2.5f32.to_le_bytes()), "2.5");
    }
}
