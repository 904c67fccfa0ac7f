//! Advisory consistency checks over a writing session
//!
//! Findings are returned as data. Nothing here fails or panics; a long
//! recording should never stop just because a timestamp went backwards.

use std::fmt;

/// One problem detected by [`check_sanity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanityFinding {
    /// First adjacent pair where `timestamps[index - 1] >= timestamps[index]`.
    NonIncreasingTimestamps {
        index: usize,
        previous: u64,
        current: u64,
    },
    /// The frame counter and the timestamp series disagree in length.
    FrameCountMismatch {
        frame_count: usize,
        timestamp_count: usize,
    },
}

impl fmt::Display for SanityFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanityFinding::NonIncreasingTimestamps {
                index,
                previous,
                current,
            } => write!(
                f,
                "Timestamps don't increase expectedly (frame {index}: {current} after {previous})"
            ),
            SanityFinding::FrameCountMismatch {
                frame_count,
                timestamp_count,
            } => write!(
                f,
                "Framecount doesn't match the count of timestamps ({frame_count} frames, {timestamp_count} timestamps)"
            ),
        }
    }
}

/// Check timestamp ordering and frame/timestamp count agreement.
///
/// Ordering is strict: equal neighbours are reported. Only the first
/// ordering violation is reported.
pub fn check_sanity(frame_count: usize, timestamps: &[u64]) -> Vec<SanityFinding> {
    let mut findings = Vec::new();

    if let Some(i) = timestamps.windows(2).position(|pair| pair[0] >= pair[1]) {
        findings.push(SanityFinding::NonIncreasingTimestamps {
            index: i + 1,
            previous: timestamps[i],
            current: timestamps[i + 1],
        });
    }

    if frame_count != timestamps.len() {
        findings.push(SanityFinding::FrameCountMismatch {
            frame_count,
            timestamp_count: timestamps.len(),
        });
    }

    findings
}
