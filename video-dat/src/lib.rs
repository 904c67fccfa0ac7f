//! Writer for `.video.dat` frame containers.
//!
//! A `.video.dat` file stores a sequence of timestamped, variable-length
//! binary frames (in practice JPEG images from a synchronized video capture)
//! behind a small versioned header. Three format versions exist; see
//! [`format`] for the byte layout.
//!
//! The [`VideoFile`] writer appends frames and keeps an in-memory index of
//! where each payload landed, so frames written during the session can be
//! read back by position. The index is not persisted: a file opened later can
//! only be scanned sequentially with [`RecordReader`].
//!
//! # Usage
//!
//! ```no_run
//! use video_dat::{PresenceFlags, VideoFile};
//!
//! let mut video = VideoFile::create("capture.video.dat", 3, PresenceFlags::both())?;
//! video.append_frame(1_000, b"\xFF\xD8 jpeg bytes")?;
//! video.append_frame(1_033, b"\xFF\xD8 more jpeg bytes")?;
//!
//! assert_eq!(video.get_frame(0)?, b"\xFF\xD8 jpeg bytes");
//! assert!(video.check_sanity().is_empty());
//! video.close()?;
//! # Ok::<(), video_dat::VideoFileError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod index;
pub mod sanity;
mod writer;

pub use config::WriterConfig;
pub use error::{Result, VideoFileError};
pub use format::{
    ContainerHeader, FormatVersion, FrameRecord, FrameRecordHeader, MAGIC, PresenceFlags,
    RecordReader,
};
pub use index::{FrameIndex, FrameIndexEntry};
pub use sanity::{SanityFinding, check_sanity};
pub use writer::VideoFile;
