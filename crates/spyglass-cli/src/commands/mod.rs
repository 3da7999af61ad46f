//! Subcommand implementations.

pub mod hexdump;
pub mod read;
pub mod scan;
pub mod snapshot;
pub mod watch;

#[cfg(target_os = "windows")]
pub mod record;

/// Parse an address argument, accepting `0x`-prefixed hex or decimal.
pub fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("invalid address '{}'", s))
}

/// Parse a scalar type argument (`u8`..`f64`).
pub fn parse_scalar_kind(s: &str) -> Result<spyglass::ScalarKind, String> {
    use std::str::FromStr;
    spyglass::ScalarKind::from_str(s)
        .map_err(|_| format!("unknown type '{}' (expected u8..u64, i8..i64, f32, f64)", s))
}

/// Parse a collection kind argument.
pub fn parse_collection_kind(s: &str) -> Result<spyglass::snapshot::CollectionKind, String> {
    use std::str::FromStr;
    spyglass::snapshot::CollectionKind::from_str(s)
        .map_err(|_| format!("unknown kind '{}' (expected array, list, dict, set)", s))
}
