//! `.video.dat` container format
//!
//! A container is a fixed header followed by back-to-back frame records.
//! There is no trailer, no index and no padding: record boundaries are only
//! recoverable by parsing length-prefixed records from the start of the
//! frame region.
//!
//! # File Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Header (41 bytes for v1/v2, 43 bytes for v3)     │
//! │ ├─ magic: [u8; 37]  "HELSINKI_VIDEO_MEG_..."     │
//! │ ├─ version: u32                                  │
//! │ ├─ site_id_present: u8     (v3 only)             │
//! │ └─ is_sender_present: u8   (v3 only)             │
//! ├──────────────────────────────────────────────────┤
//! │ Frame record (repeats until EOF)                 │
//! │ ├─ timestamp: u64                                │
//! │ ├─ sequence_index: u64     (v2/v3 only)          │
//! │ ├─ payload_len: u32                              │
//! │ └─ payload: [u8; payload_len]                    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian.

mod header;
mod record;

pub use header::{ContainerHeader, PresenceFlags};
pub use record::{FrameRecord, FrameRecordHeader, RecordReader};

use crate::error::VideoFileError;

/// Magic preamble shared by every format version (37 bytes, no terminator).
pub const MAGIC: &[u8; 37] = b"HELSINKI_VIDEO_MEG_PROJECT_VIDEO_FILE";

/// Supported container versions.
///
/// The version fixes both the header layout and the frame record shape, so
/// it is validated once when a file is created or opened and never
/// re-checked afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Records carry `(timestamp, payload_len)`.
    V1,
    /// Records additionally carry a 0-based sequence index.
    V2,
    /// Same records as V2; header adds two presence-flag bytes.
    V3,
}

impl FormatVersion {
    pub const ALL: [FormatVersion; 3] = [FormatVersion::V1, FormatVersion::V2, FormatVersion::V3];

    pub const fn as_u32(self) -> u32 {
        match self {
            FormatVersion::V1 => 1,
            FormatVersion::V2 => 2,
            FormatVersion::V3 => 3,
        }
    }

    /// Whether frame records carry a sequence index.
    pub const fn has_sequence_index(self) -> bool {
        matches!(self, FormatVersion::V2 | FormatVersion::V3)
    }

    /// Whether the header carries the two presence-flag bytes.
    pub const fn has_presence_flags(self) -> bool {
        matches!(self, FormatVersion::V3)
    }

    /// Size of the container header in bytes.
    pub const fn header_size(self) -> usize {
        let base = MAGIC.len() + 4;
        if self.has_presence_flags() { base + 2 } else { base }
    }

    /// Size of a frame record header (everything before the payload).
    pub const fn record_header_size(self) -> usize {
        if self.has_sequence_index() { 8 + 8 + 4 } else { 8 + 4 }
    }
}

impl TryFrom<u32> for FormatVersion {
    type Error = VideoFileError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FormatVersion::V1),
            2 => Ok(FormatVersion::V2),
            3 => Ok(FormatVersion::V3),
            other => Err(VideoFileError::UnsupportedVersion(other)),
        }
    }
}

impl From<FormatVersion> for u32 {
    fn from(version: FormatVersion) -> Self {
        version.as_u32()
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.as_u32())
    }
}
