//! Wildcard byte signatures.
//!
//! Signatures are written in the conventional space-separated hex form
//! with `??` wildcards, e.g. `"48 8B ?? 05"`. Scanning anchors on the
//! longest literal run with `memchr::memmem` and verifies the full mask
//! at each candidate, which keeps wildcard-heavy patterns from
//! degenerating into a byte-at-a-time crawl.

use std::fmt;
use std::str::FromStr;

use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parsed wildcard byte pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    bytes: Vec<Option<u8>>,
}

impl Signature {
    /// Parse from the `"48 8B ?? 05"` form.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in pattern.split_whitespace() {
            match token {
                "?" | "??" => bytes.push(None),
                _ => {
                    let value = u8::from_str_radix(token, 16).map_err(|e| {
                        Error::InvalidPattern(format!("bad token '{}': {}", token, e))
                    })?;
                    bytes.push(Some(value));
                }
            }
        }
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("empty pattern".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Longest run of literal (non-wildcard) bytes: `(offset, bytes)`.
    fn anchor(&self) -> Option<(usize, Vec<u8>)> {
        let mut best: Option<(usize, Vec<u8>)> = None;
        let mut run_start = 0;
        let mut run: Vec<u8> = Vec::new();

        for (i, byte) in self.bytes.iter().enumerate() {
            match byte {
                Some(b) => {
                    if run.is_empty() {
                        run_start = i;
                    }
                    run.push(*b);
                }
                None => {
                    if best.as_ref().is_none_or(|(_, b)| b.len() < run.len()) && !run.is_empty() {
                        best = Some((run_start, std::mem::take(&mut run)));
                    }
                    run.clear();
                }
            }
        }
        if best.as_ref().is_none_or(|(_, b)| b.len() < run.len()) && !run.is_empty() {
            best = Some((run_start, run));
        }
        best
    }

    fn matches_at(&self, haystack: &[u8], pos: usize) -> bool {
        haystack[pos..pos + self.bytes.len()]
            .iter()
            .zip(&self.bytes)
            .all(|(byte, expected)| expected.is_none_or(|e| e == *byte))
    }

    /// Offset of the first match in `haystack`, if any.
    pub fn scan(&self, haystack: &[u8]) -> Option<usize> {
        self.scan_all(haystack).next()
    }

    /// All match offsets in `haystack`, in order.
    pub fn scan_all<'a>(&'a self, haystack: &'a [u8]) -> Box<dyn Iterator<Item = usize> + 'a> {
        let pattern_len = self.bytes.len();
        if haystack.len() < pattern_len {
            return Box::new(std::iter::empty());
        }

        match self.anchor() {
            Some((anchor_offset, anchor)) => {
                let candidates: Vec<usize> = memmem::find_iter(haystack, &anchor)
                    .filter_map(|found| found.checked_sub(anchor_offset))
                    .filter(|&pos| pos + pattern_len <= haystack.len())
                    .collect();
                let iter = candidates
                    .into_iter()
                    .filter(move |&pos| self.matches_at(haystack, pos));
                Box::new(iter)
            }
            // All wildcards: every window matches.
            None => Box::new(0..=haystack.len() - pattern_len),
        }
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .bytes
            .iter()
            .map(|b| match b {
                Some(value) => format!("{:02X}", value),
                None => "??".to_string(),
            })
            .collect();
        write!(f, "{}", tokens.join(" "))
    }
}

impl TryFrom<String> for Signature {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        let sig = Signature::parse("48 8D 0D ?? ?? ?? 05").unwrap();
        assert_eq!(sig.len(), 7);
        assert_eq!(sig.to_string(), "48 8D 0D ?? ?? ?? 05");
        assert_eq!(Signature::parse(&sig.to_string()).unwrap(), sig);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Signature::parse("GG 01").is_err());
        assert!(Signature::parse("").is_err());
        assert!(Signature::parse("   ").is_err());
    }

    #[test]
    fn test_scan_with_wildcards() {
        let haystack = [0x00, 0x48, 0x8B, 0x99, 0x05, 0x48, 0x8B, 0x11, 0x05];
        let sig = Signature::parse("48 8B ?? 05").unwrap();
        let hits: Vec<usize> = sig.scan_all(&haystack).collect();
        assert_eq!(hits, vec![1, 5]);
        assert_eq!(sig.scan(&haystack), Some(1));
    }

    #[test]
    fn test_scan_anchor_not_at_pattern_start() {
        // Anchor (longest literal run) sits after a leading wildcard.
        let sig = Signature::parse("?? DE AD BE EF").unwrap();
        let haystack = [0x42, 0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(sig.scan(&haystack), Some(0));
        // A run whose anchor would start before the haystack is not a
        // match.
        let short = [0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(sig.scan(&short), None);
    }

    #[test]
    fn test_scan_all_wildcards() {
        let sig = Signature::parse("?? ??").unwrap();
        let hits: Vec<usize> = sig.scan_all(&[1, 2, 3]).collect();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn test_scan_no_match() {
        let sig = Signature::parse("AA BB").unwrap();
        assert_eq!(sig.scan(&[0x01, 0x02, 0x03]), None);
        assert_eq!(sig.scan(&[0xAA]), None);
    }
}
