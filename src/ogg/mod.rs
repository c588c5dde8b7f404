// Ogg container support
//
// Ogg Page Header (27 + N bytes, little-endian)
// - Capture Pattern: "OggS" (4 bytes)
// - Version: 0 (1 byte)
// - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
// - Granule Position (8 bytes, signed, -1 = no packet ends on this page)
// - Bitstream Serial Number (4 bytes)
// - Page Sequence Number (4 bytes)
// - CRC Checksum (4 bytes, passed through, never recomputed)
// - Number of Page Segments (1 byte)
// - Segment Table (N lacing values)
//
// A lacing value of 255 continues the current packet; anything smaller ends
// it. A table ending in 255 leaves the packet open into the next page of the
// same logical stream.

pub mod page;
pub mod reader;

pub use page::{PacketSpan, Page, PageHeader};
pub use reader::{OggReader, ReaderOptions};

// OGG signature
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

// OGG page header types
pub const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream

/// Header bytes preceding the segment table
pub const PAGE_HEADER_FIXED_SIZE: usize = 27;

/// Largest segment table a page can carry
pub const MAX_PAGE_SEGMENTS: usize = 255;

/// Lacing value meaning "packet continues in the next segment"
pub const LACING_CONTINUE: u8 = 255;

/// Default page cap for `ReaderOptions`
pub const DEFAULT_MAX_PAGES: usize = 100_000;
