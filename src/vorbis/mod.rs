// Vorbis header decoding on top of the Ogg demultiplexer
//
// Vorbis Structure:
// 1. Identification Header (type 1) - channels, sample rate, bitrates, block sizes
// 2. Comment Header (type 3) - vendor string and user comments
// 3. Setup Header (type 5) - codebooks, treated as opaque
// 4. Audio packets (even type byte), treated as opaque
//
// Every header packet starts with its type byte followed by "vorbis".

pub mod packet;
pub mod stream;

pub use packet::{CommentHeader, IdentificationHeader, VorbisPacket};
pub use stream::{LogicalStream, PagePackets, RawPacket};

/// Codec identifier following the type byte of every header packet
pub const VORBIS_CODEC_ID: &[u8; 6] = b"vorbis";

pub const VORBIS_PACKET_IDENTIFICATION: u8 = 1;
pub const VORBIS_PACKET_COMMENT: u8 = 3;
pub const VORBIS_PACKET_SETUP: u8 = 5;

/// Encoded size of an identification header packet
pub const IDENTIFICATION_HEADER_LENGTH: usize = 30;

/// Common Vorbis comment field names
pub struct VorbisFields;
impl VorbisFields {
    pub const TITLE: &'static str = "TITLE";
    pub const ARTIST: &'static str = "ARTIST";
    pub const ALBUM: &'static str = "ALBUM";
    pub const DATE: &'static str = "DATE";
    pub const TRACKNUMBER: &'static str = "TRACKNUMBER";
    pub const GENRE: &'static str = "GENRE";
    pub const COMMENT: &'static str = "COMMENT";
}
