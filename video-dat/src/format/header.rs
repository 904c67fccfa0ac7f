//! Container header encoding and decoding

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use super::{FormatVersion, MAGIC};
use crate::error::{Result, VideoFileError};

/// Which optional identifiers the caller declared when creating the file.
///
/// Only the presence bits are stored. The identifier values themselves are
/// never written to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceFlags {
    pub site_id: bool,
    pub is_sender: bool,
}

impl PresenceFlags {
    pub const fn none() -> Self {
        Self {
            site_id: false,
            is_sender: false,
        }
    }

    pub const fn both() -> Self {
        Self {
            site_id: true,
            is_sender: true,
        }
    }

    fn to_bytes(self) -> [u8; 2] {
        [self.site_id as u8, self.is_sender as u8]
    }
}

/// Decoded container header.
///
/// For v1 and v2 the flags are not stored and `presence` is always
/// [`PresenceFlags::none`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: FormatVersion,
    pub presence: PresenceFlags,
}

impl ContainerHeader {
    pub fn new(version: FormatVersion, presence: PresenceFlags) -> Self {
        let presence = if version.has_presence_flags() {
            presence
        } else {
            PresenceFlags::none()
        };
        Self { version, presence }
    }

    /// Size of this header on disk.
    pub fn size(&self) -> usize {
        self.version.header_size()
    }

    /// Write the header in the layout fixed by its version.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Serialize to a freshly allocated buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let version_at = MAGIC.len();
        let mut bytes = vec![0u8; self.size()];
        bytes[..version_at].copy_from_slice(MAGIC);
        LittleEndian::write_u32(&mut bytes[version_at..version_at + 4], self.version.as_u32());
        if self.version.has_presence_flags() {
            bytes[version_at + 4..].copy_from_slice(&self.presence.to_bytes());
        }
        bytes
    }

    /// Read and validate a header: magic, version, and v3 flag bytes.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; MAGIC.len()];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(VideoFileError::InvalidMagic);
        }

        let version = FormatVersion::try_from(reader.read_u32::<LittleEndian>()?)?;

        let presence = if version.has_presence_flags() {
            PresenceFlags {
                site_id: read_flag(reader)?,
                is_sender: read_flag(reader)?,
            }
        } else {
            PresenceFlags::none()
        };

        Ok(Self { version, presence })
    }
}

fn read_flag<R: Read>(reader: &mut R) -> Result<bool> {
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(VideoFileError::InvalidPresenceFlag(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_header_layout() {
        let header = ContainerHeader::new(FormatVersion::V1, PresenceFlags::both());
        let mut buffer = Vec::new();
        header.write_to(&mut buffer).unwrap();

        assert_eq!(buffer.len(), 41);
        assert_eq!(&buffer[..37], MAGIC);
        assert_eq!(&buffer[37..41], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_v2_ignores_presence() {
        let header = ContainerHeader::new(FormatVersion::V2, PresenceFlags::both());
        assert_eq!(header.presence, PresenceFlags::none());

        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 41);
        assert_eq!(&bytes[37..41], &[2, 0, 0, 0]);
    }

    #[test]
    fn test_v3_flags() {
        let presence = PresenceFlags {
            site_id: true,
            is_sender: false,
        };
        let bytes = ContainerHeader::new(FormatVersion::V3, presence).to_bytes();

        assert_eq!(bytes.len(), 43);
        assert_eq!(&bytes[37..41], &[3, 0, 0, 0]);
        assert_eq!(bytes[41], 1);
        assert_eq!(bytes[42], 0);
    }

    #[test]
    fn test_write_to_matches_to_bytes() {
        for version in FormatVersion::ALL {
            let header = ContainerHeader::new(version, PresenceFlags::both());
            let mut written = Vec::new();
            header.write_to(&mut written).unwrap();
            assert_eq!(written, header.to_bytes());
            assert_eq!(written.len(), header.size());
        }
    }

    #[test]
    fn test_read_v3() {
        let header = ContainerHeader::new(
            FormatVersion::V3,
            PresenceFlags {
                site_id: false,
                is_sender: true,
            },
        );
        let bytes = header.to_bytes();
        let parsed = ContainerHeader::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_read_rejects_bad_magic() {
        let mut bytes = ContainerHeader::new(FormatVersion::V1, PresenceFlags::none()).to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            ContainerHeader::read_from(&mut bytes.as_slice()),
            Err(VideoFileError::InvalidMagic)
        ));
    }

    #[test]
    fn test_read_rejects_unknown_version() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            ContainerHeader::read_from(&mut bytes.as_slice()),
            Err(VideoFileError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_read_rejects_bad_flag_byte() {
        let mut bytes = ContainerHeader::new(FormatVersion::V3, PresenceFlags::none()).to_bytes();
        bytes[42] = 2;
        assert!(matches!(
            ContainerHeader::read_from(&mut bytes.as_slice()),
            Err(VideoFileError::InvalidPresenceFlag(2))
        ));
    }

    #[test]
    fn test_read_truncated() {
        let bytes = &MAGIC[..10];
        let err = ContainerHeader::read_from(&mut &bytes[..]).unwrap_err();
        assert!(matches!(err, VideoFileError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }
}
