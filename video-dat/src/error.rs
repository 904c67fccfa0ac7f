//! Error type for container creation, appends and reads.

use std::path::PathBuf;

/// Errors produced by [`VideoFile`](crate::VideoFile) and the format codecs.
///
/// Any error returned from an append leaves the file in an undefined state
/// (a partial record may have been written). Callers should treat it as
/// ending the session for that file.
#[derive(Debug, thiserror::Error)]
pub enum VideoFileError {
    #[error("Won't allow overwriting. File exists on path: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Unsupported version: {0} (supported version numbers are: 1, 2, 3)")]
    UnsupportedVersion(u32),

    #[error("Frame index {index} out of range ({frame_count} frames)")]
    IndexOutOfRange { index: usize, frame_count: usize },

    #[error("Frame payload too large: {0} bytes (max {max} bytes)", max = u32::MAX)]
    PayloadTooLarge(usize),

    #[error("Invalid magic bytes (expected HELSINKI_VIDEO_MEG_PROJECT_VIDEO_FILE)")]
    InvalidMagic,

    #[error("Invalid presence flag byte: {0} (expected 0 or 1)")]
    InvalidPresenceFlag(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VideoFileError>;
