//! Container writer and in-session frame index
//!
//! [`VideoFile`] owns one output file for one append session:
//!
//! ```text
//! create() ──► Open ──► append_frame()* / get_frame()* ──► close() or drop
//! ```
//!
//! Creation never touches an existing file. The header is written once, at
//! creation, and never rewritten. Frames are appended at end-of-file and
//! located afterwards through an index that exists only in memory.
//!
//! Not safe for concurrent use: appends and reads share the file position.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WriterConfig;
use crate::error::{Result, VideoFileError};
use crate::format::{ContainerHeader, FormatVersion, FrameRecordHeader, PresenceFlags};
use crate::index::{FrameIndex, FrameIndexEntry};
use crate::sanity::{self, SanityFinding};

/// An open `.video.dat` container being written.
///
/// The file handle is closed exactly once, either by [`VideoFile::close`] or
/// when the value is dropped.
#[derive(Debug)]
pub struct VideoFile {
    path: PathBuf,
    file: File,
    version: FormatVersion,
    presence: PresenceFlags,
    index: FrameIndex,
    timestamps: Vec<u64>,
    frame_count: usize,
}

impl VideoFile {
    /// Create a new container at `path` and write its header.
    ///
    /// # Errors
    ///
    /// - [`VideoFileError::AlreadyExists`] if anything already exists at
    ///   `path`, whatever the requested version. The existing file is neither
    ///   opened nor modified.
    /// - [`VideoFileError::UnsupportedVersion`] if `version` is not 1, 2 or 3.
    ///   No file is created.
    /// - [`VideoFileError::Io`] for any other failure.
    pub fn create(path: impl AsRef<Path>, version: u32, presence: PresenceFlags) -> Result<Self> {
        let path = path.as_ref();
        let version = match FormatVersion::try_from(version) {
            Ok(version) => version,
            // An existing file outranks a bad version
            Err(e) => {
                return Err(match path.symlink_metadata() {
                    Ok(_) => VideoFileError::AlreadyExists {
                        path: path.to_path_buf(),
                    },
                    Err(_) => e,
                });
            }
        };

        // create_new makes the existence check and the creation one atomic step
        let mut file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(VideoFileError::AlreadyExists {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let header = ContainerHeader::new(version, presence);
        if let Err(e) = file.write_all(&header.to_bytes()) {
            drop(file);
            // We created this file ourselves, so removing it cannot clobber anything
            if let Err(remove_err) = std::fs::remove_file(path) {
                tracing::warn!(
                    "Failed to remove partially written container {}: {}",
                    path.display(),
                    remove_err
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            "Created {} container {} (site_id_present={}, is_sender_present={})",
            version,
            path.display(),
            header.presence.site_id,
            header.presence.is_sender
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            version,
            presence: header.presence,
            index: FrameIndex::new(),
            timestamps: Vec::new(),
            frame_count: 0,
        })
    }

    /// Create a new container using settings from a [`WriterConfig`].
    pub fn create_with_config(path: impl AsRef<Path>, config: &WriterConfig) -> Result<Self> {
        Self::create(path, config.version, config.presence())
    }

    /// Append one frame at the end of the file.
    ///
    /// Timestamps are not required to increase here; use
    /// [`check_sanity`](Self::check_sanity) to find ordering problems.
    /// The frame is readable through [`get_frame`](Self::get_frame) as soon as
    /// this returns.
    pub fn append_frame(&mut self, timestamp: u64, payload: &[u8]) -> Result<()> {
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| VideoFileError::PayloadTooLarge(payload.len()))?;
        let sequence_index = self.frame_count as u64;

        self.file.seek(SeekFrom::End(0))?;

        let record_header =
            FrameRecordHeader::new(self.version, timestamp, sequence_index, payload_len);
        let mut record = Vec::with_capacity(record_header.size());
        record_header.write_to(&mut record)?;
        self.file.write_all(&record)?;

        let offset = self.file.stream_position()?;
        self.file.write_all(payload)?;

        let position = self.index.push(FrameIndexEntry {
            offset,
            len: payload_len,
        });
        self.frame_count += 1;
        self.timestamps.push(timestamp);

        tracing::debug!(
            "Appended frame {} (timestamp={}, offset={}, len={})",
            position,
            timestamp,
            offset,
            payload_len
        );

        Ok(())
    }

    /// Read back the payload of the `index`-th appended frame.
    ///
    /// The stream position is restored afterwards, so reads may be freely
    /// interleaved with appends.
    pub fn get_frame(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self
            .index
            .get(index)
            .ok_or(VideoFileError::IndexOutOfRange {
                index,
                frame_count: self.index.len(),
            })?;

        let previous = self.file.stream_position()?;
        self.file.seek(SeekFrom::Start(entry.offset))?;

        let mut payload = vec![0u8; entry.len as usize];
        let read = self.file.read_exact(&mut payload);
        self.file.seek(SeekFrom::Start(previous))?;
        read?;

        Ok(payload)
    }

    /// Report timestamp ordering and count problems.
    ///
    /// Findings are logged as warnings and returned; this never fails.
    pub fn check_sanity(&self) -> Vec<SanityFinding> {
        let findings = sanity::check_sanity(self.frame_count, &self.timestamps);
        for finding in &findings {
            tracing::warn!("{}: {}", self.path.display(), finding);
        }
        findings
    }

    /// Flush file contents to disk and close the handle.
    ///
    /// Dropping a `VideoFile` also closes it, but silently discards any
    /// error from the final sync.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        tracing::debug!(
            "Closed {} after {} frames",
            self.path.display(),
            self.frame_count
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn presence(&self) -> PresenceFlags {
        self.presence
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Timestamps in append order.
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{MAGIC, RecordReader};
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir) -> PathBuf {
        dir.path().join("capture.video.dat")
    }

    #[test]
    fn test_create_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir);

        let video = VideoFile::create(&path, 2, PresenceFlags::none()).unwrap();
        assert_eq!(video.version(), FormatVersion::V2);
        assert!(video.is_empty());
        video.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 41);
        assert_eq!(&bytes[..37], MAGIC);
        assert_eq!(&bytes[37..41], &2u32.to_le_bytes());
    }

    #[test]
    fn test_create_rejects_version_without_creating_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir);

        let err = VideoFile::create(&path, 4, PresenceFlags::none()).unwrap_err();
        assert!(matches!(err, VideoFileError::UnsupportedVersion(4)));
        assert!(!path.exists());
    }

    #[test]
    fn test_presence_dropped_for_v1() {
        let dir = TempDir::new().unwrap();
        let video = VideoFile::create(temp_path(&dir), 1, PresenceFlags::both()).unwrap();
        assert_eq!(video.presence(), PresenceFlags::none());
    }

    #[test]
    fn test_index_offsets_v1() {
        let dir = TempDir::new().unwrap();
        let mut video = VideoFile::create(temp_path(&dir), 1, PresenceFlags::none()).unwrap();

        video.append_frame(1, b"abcd").unwrap();
        video.append_frame(2, b"xy").unwrap();

        // header 41 + record header 12
        assert_eq!(video.index().get(0), Some(FrameIndexEntry { offset: 53, len: 4 }));
        // 53 + 4 + 12
        assert_eq!(video.index().get(1), Some(FrameIndexEntry { offset: 69, len: 2 }));
    }

    #[test]
    fn test_index_offsets_v3() {
        let dir = TempDir::new().unwrap();
        let mut video = VideoFile::create(temp_path(&dir), 3, PresenceFlags::none()).unwrap();

        video.append_frame(1, b"abcd").unwrap();
        video.append_frame(2, b"").unwrap();

        // header 43 + record header 20
        assert_eq!(video.index().get(0), Some(FrameIndexEntry { offset: 63, len: 4 }));
        assert_eq!(video.index().get(1), Some(FrameIndexEntry { offset: 87, len: 0 }));
        assert_eq!(video.get_frame(1).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_get_frame_out_of_range() {
        let dir = TempDir::new().unwrap();
        let mut video = VideoFile::create(temp_path(&dir), 2, PresenceFlags::none()).unwrap();
        video.append_frame(10, b"only").unwrap();

        let err = video.get_frame(1).unwrap_err();
        assert!(matches!(
            err,
            VideoFileError::IndexOutOfRange {
                index: 1,
                frame_count: 1
            }
        ));
        // Writer stays usable after a failed read
        video.append_frame(20, b"more").unwrap();
        assert_eq!(video.get_frame(1).unwrap(), b"more");
    }

    #[test]
    fn test_interleaved_append_and_read() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir);
        let mut video = VideoFile::create(&path, 2, PresenceFlags::none()).unwrap();

        video.append_frame(1, b"one").unwrap();
        assert_eq!(video.get_frame(0).unwrap(), b"one");
        video.append_frame(2, b"two").unwrap();
        assert_eq!(video.get_frame(0).unwrap(), b"one");
        video.append_frame(3, b"three").unwrap();
        assert_eq!(video.get_frame(2).unwrap(), b"three");
        video.close().unwrap();

        let file = File::open(&path).unwrap();
        let payloads: Vec<Vec<u8>> = RecordReader::new(file)
            .unwrap()
            .map(|r| r.unwrap().payload)
            .collect();
        assert_eq!(payloads, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn test_timestamps_and_sanity() {
        let dir = TempDir::new().unwrap();
        let mut video = VideoFile::create(temp_path(&dir), 3, PresenceFlags::none()).unwrap();

        video.append_frame(5, b"a").unwrap();
        video.append_frame(10, b"b").unwrap();
        assert!(video.check_sanity().is_empty());

        video.append_frame(10, b"c").unwrap();
        assert_eq!(video.timestamps(), &[5, 10, 10]);
        assert_eq!(video.frame_count(), 3);

        let findings = video.check_sanity();
        assert_eq!(findings.len(), 1);
        assert!(matches!(
            findings[0],
            SanityFinding::NonIncreasingTimestamps { index: 2, .. }
        ));
    }

    #[test]
    fn test_create_with_config() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir);
        let config = WriterConfig {
            version: 3,
            site_id_present: false,
            is_sender_present: true,
        };

        let video = VideoFile::create_with_config(&path, &config).unwrap();
        assert_eq!(video.presence(), config.presence());
        video.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[41..43], &[0, 1]);
    }
}
