//! In-memory frame index
//!
//! The index lives only as long as the [`VideoFile`](crate::VideoFile) that
//! built it. It is never written to disk.

/// Location of one frame payload inside the container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndexEntry {
    /// Absolute file offset of the first payload byte.
    pub offset: u64,
    /// Payload length in bytes.
    pub len: u32,
}

impl FrameIndexEntry {
    /// Offset one past the last payload byte.
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}

/// Append-only list of frame locations, indexed by append order.
#[derive(Debug, Clone, Default)]
pub struct FrameIndex {
    entries: Vec<FrameIndexEntry>,
}

impl FrameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new frame and return its position.
    pub fn push(&mut self, entry: FrameIndexEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<FrameIndexEntry> {
        self.entries.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameIndexEntry> {
        self.entries.iter()
    }

    /// Sum of all payload lengths (record headers excluded).
    pub fn total_payload_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.len as u64).sum()
    }
}
