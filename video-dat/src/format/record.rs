//! Frame record encoding and sequential decoding

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{ContainerHeader, FormatVersion};
use crate::error::{Result, VideoFileError};

/// Everything in a frame record that precedes the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecordHeader {
    pub timestamp: u64,
    /// Present for v2 and v3 only.
    pub sequence_index: Option<u64>,
    pub payload_len: u32,
}

impl FrameRecordHeader {
    /// Build the record header for `version`, dropping the sequence index
    /// where the version has none.
    pub fn new(version: FormatVersion, timestamp: u64, sequence_index: u64, payload_len: u32) -> Self {
        Self {
            timestamp,
            sequence_index: version.has_sequence_index().then_some(sequence_index),
            payload_len,
        }
    }

    /// Size of this record header on disk.
    pub fn size(&self) -> usize {
        if self.sequence_index.is_some() { 8 + 8 + 4 } else { 8 + 4 }
    }

    /// Write the header. The sequence index is written exactly when present,
    /// so the shape always matches the version the header was built for.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.timestamp)?;
        if let Some(sequence_index) = self.sequence_index {
            writer.write_u64::<LittleEndian>(sequence_index)?;
        }
        writer.write_u32::<LittleEndian>(self.payload_len)?;
        Ok(())
    }

    /// Read one record header.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a record boundary.
    /// A stream that ends partway through a header is an `UnexpectedEof`.
    pub fn read_from<R: Read>(reader: &mut R, version: FormatVersion) -> Result<Option<Self>> {
        let mut first = [0u8; 8];
        let filled = read_up_to(reader, &mut first)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < first.len() {
            return Err(truncated("timestamp").into());
        }
        let timestamp = u64::from_le_bytes(first);

        let sequence_index = if version.has_sequence_index() {
            Some(reader.read_u64::<LittleEndian>()?)
        } else {
            None
        };
        let payload_len = reader.read_u32::<LittleEndian>()?;

        Ok(Some(Self {
            timestamp,
            sequence_index,
            payload_len,
        }))
    }
}

/// A fully decoded frame record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub timestamp: u64,
    pub sequence_index: Option<u64>,
    pub payload: Vec<u8>,
}

/// Sequential reader over a container stream.
///
/// Parses the header, then yields records in file order. It does not seek
/// and builds no index; random access is only available through the
/// [`VideoFile`](crate::VideoFile) that wrote the records.
pub struct RecordReader<R: Read> {
    reader: R,
    header: ContainerHeader,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    /// Read and validate the container header.
    pub fn new(mut reader: R) -> Result<Self> {
        let header = ContainerHeader::read_from(&mut reader)?;
        Ok(Self {
            reader,
            header,
            finished: false,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn version(&self) -> FormatVersion {
        self.header.version
    }

    /// Read the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<FrameRecord>> {
        let Some(record_header) = FrameRecordHeader::read_from(&mut self.reader, self.header.version)?
        else {
            return Ok(None);
        };

        // Grow with the data actually present; the length may be corrupt
        let expected = record_header.payload_len as u64;
        let mut payload = Vec::new();
        (&mut self.reader).take(expected).read_to_end(&mut payload)?;
        if (payload.len() as u64) < expected {
            return Err(truncated("payload").into());
        }

        Ok(Some(FrameRecord {
            timestamp: record_header.timestamp,
            sequence_index: record_header.sequence_index,
            payload,
        }))
    }

    /// Consume the reader and return the inner stream
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<FrameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill as much of `buf` as the stream allows, stopping only at EOF.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn truncated(field: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("Truncated frame record ({field})"),
    )
}
