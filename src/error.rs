use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Faults that abort a scan before it starts, or that occur while persisting results.
///
/// Per-target network failures are never represented here: a port that does not
/// answer is simply not open.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid port value: {0}")]
    InvalidPort(String),

    #[error("invalid port range {start}-{end} (start > end)")]
    InvalidPortRange { start: u16, end: u16 },

    #[error("malformed address range `{0}`, expected A.B.C.S-A.B.C.E")]
    MalformedRange(String),

    #[error("invalid IPv4 address in range: {0}")]
    InvalidAddress(String),

    #[error("range endpoints {start} and {end} differ outside the last octet")]
    RangePrefixMismatch { start: String, end: String },

    #[error("range start {start} is after range end {end}")]
    RangeReversed { start: String, end: String },

    #[error("failed to write results to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
