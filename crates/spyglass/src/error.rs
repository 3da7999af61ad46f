use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read remote memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Collection count {count} exceeds the bounds ceiling of {limit}")]
    SnapshotTooLarge { count: i64, limit: usize },

    #[error("Invalid backing pointer read from {address:#x}")]
    InvalidPointer { address: u64 },

    #[error("Scatter entry width {width} exceeds the inline maximum of {max} bytes")]
    EntryTooWide { width: usize, max: usize },

    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    #[error("Malformed dump file: {0}")]
    DumpFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a bounds-ceiling rejection.
    ///
    /// Poll loops treat these as "object transiently unavailable this cycle"
    /// rather than a reason to stop polling.
    pub fn is_bounds_violation(&self) -> bool {
        matches!(self, Error::SnapshotTooLarge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_bounds_violation() {
        let err = Error::SnapshotTooLarge {
            count: 100_000,
            limit: 16384,
        };
        assert!(err.is_bounds_violation());

        let other = Error::InvalidPointer { address: 0x10 };
        assert!(!other.is_bounds_violation());
    }
}
