// Error types for Ogg/Vorbis parsing

use std::io;
use thiserror::Error;

/// Result type for oggdemux operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for oggdemux operations.
///
/// Clean end of input is not an error: page reads return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error other than truncation of a structure being decoded.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad capture pattern, unsupported stream structure version, or a
    /// truncated page header or segment table.
    #[error("malformed page header at offset {offset}: {reason}")]
    MalformedHeader { offset: u64, reason: String },

    /// Unknown packet type, bad codec identifier, failed framing bit,
    /// lengths overrunning the packet, or a declared/actual length mismatch.
    #[error("malformed packet at offset {offset}: {reason}")]
    MalformedPacket { offset: u64, reason: String },

    /// Identification header declares a Vorbis version other than 0.
    #[error("unsupported Vorbis version {version} at offset {offset}")]
    UnsupportedVersion { offset: u64, version: u32 },

    /// A page belongs to a logical stream that never had a beginning-of-stream page.
    #[error("page at offset {offset} belongs to unknown logical stream {serial:#010x}")]
    UnknownStream { offset: u64, serial: u32 },

    /// Page sequence numbers of one logical stream are not consecutive.
    #[error("page sequence gap in stream {serial:#010x} at offset {offset}: expected {expected}, found {found}")]
    SequenceGap {
        offset: u64,
        serial: u32,
        expected: u32,
        found: u32,
    },

    /// A page header to be written has more lacing values than fit in one page.
    #[error("segment table of {entries} entries does not fit in one page")]
    SegmentTableTooLong { entries: usize },

    /// The page cap was reached before the end of input.
    #[error("processed {limit} pages without reaching end of stream")]
    TooManyPages { limit: usize },
}

impl Error {
    /// Create a malformed page header error.
    pub fn malformed_header(offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a malformed packet error.
    pub fn malformed_packet(offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedPacket {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset at which the failure was detected, if it has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::MalformedHeader { offset, .. }
            | Error::MalformedPacket { offset, .. }
            | Error::UnsupportedVersion { offset, .. }
            | Error::UnknownStream { offset, .. }
            | Error::SequenceGap { offset, .. } => Some(*offset),
            Error::Io(_) | Error::SegmentTableTooLong { .. } | Error::TooManyPages { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_of_decode_errors() {
        assert_eq!(Error::malformed_header(27, "x").offset(), Some(27));
        assert_eq!(Error::malformed_packet(58, "x").offset(), Some(58));
        let err = Error::UnsupportedVersion { offset: 4, version: 2 };
        assert_eq!(err.offset(), Some(4));
        assert_eq!(Error::TooManyPages { limit: 10 }.offset(), None);
        assert_eq!(Error::SegmentTableTooLong { entries: 300 }.offset(), None);
    }

    #[test]
    fn test_display_includes_offset() {
        let err = Error::malformed_packet(1234, "framing bit not set");
        assert_eq!(
            err.to_string(),
            "malformed packet at offset 1234: framing bit not set"
        );
    }
}
