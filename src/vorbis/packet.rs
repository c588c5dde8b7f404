// Vorbis packet classification and header decoding

use std::fmt;
use std::io::{self, Cursor, Write};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::io::{read_bytes, read_le_i32, read_le_u32, read_u8};
use crate::vorbis::{
    IDENTIFICATION_HEADER_LENGTH, VORBIS_CODEC_ID, VORBIS_PACKET_COMMENT,
    VORBIS_PACKET_IDENTIFICATION, VORBIS_PACKET_SETUP,
};

/// A decoded Vorbis packet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VorbisPacket {
    Identification(IdentificationHeader),
    Comment(CommentHeader),
    Setup { packet_length: usize },
    Audio { packet_length: usize },
}

impl VorbisPacket {
    /// Decode one complete packet. `offset` is where the packet starts in the
    /// physical stream and is only used for error reporting.
    ///
    /// The decoded length must equal `data.len()`, the length implied by lacing.
    pub fn decode(data: &[u8], offset: u64) -> Result<Self> {
        let mut reader = PacketReader::new(data, offset);

        let packet_type = reader.read_u8("packet type")?;
        if packet_type & 1 == 0 {
            return Ok(VorbisPacket::Audio {
                packet_length: data.len(),
            });
        }

        let codec_id = reader.read_bytes(VORBIS_CODEC_ID.len(), "codec identifier")?;
        if codec_id.as_slice() != VORBIS_CODEC_ID {
            return Err(Error::malformed_packet(
                offset + 1,
                format!(
                    "unexpected codec identifier {:?}",
                    String::from_utf8_lossy(&codec_id)
                ),
            ));
        }

        let packet = match packet_type {
            VORBIS_PACKET_IDENTIFICATION => {
                VorbisPacket::Identification(IdentificationHeader::decode_body(&mut reader)?)
            }
            VORBIS_PACKET_COMMENT => VorbisPacket::Comment(CommentHeader::decode_body(&mut reader)?),
            VORBIS_PACKET_SETUP => VorbisPacket::Setup {
                packet_length: data.len(),
            },
            other => {
                return Err(Error::malformed_packet(
                    offset,
                    format!("unexpected packet type {other}"),
                ))
            }
        };

        if packet.packet_length() != data.len() {
            return Err(Error::malformed_packet(
                offset,
                format!(
                    "expected packet of length {}, but packet was {} bytes",
                    data.len(),
                    packet.packet_length()
                ),
            ));
        }

        Ok(packet)
    }

    /// Encoded length of the packet in bytes
    pub fn packet_length(&self) -> usize {
        match self {
            VorbisPacket::Identification(header) => header.packet_length,
            VorbisPacket::Comment(header) => header.packet_length,
            VorbisPacket::Setup { packet_length } | VorbisPacket::Audio { packet_length } => {
                *packet_length
            }
        }
    }

    /// Short name of the packet variant
    pub fn kind(&self) -> &'static str {
        match self {
            VorbisPacket::Identification(_) => "identification",
            VorbisPacket::Comment(_) => "comment",
            VorbisPacket::Setup { .. } => "setup",
            VorbisPacket::Audio { .. } => "audio",
        }
    }
}

impl fmt::Display for VorbisPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VorbisPacket::Identification(h) => write!(
                f,
                "Identification header ({}Hz, {} channel(s), {}kb/s, length: {})",
                h.sample_rate,
                h.channels,
                h.bitrate_nominal / 1000,
                h.packet_length
            ),
            VorbisPacket::Comment(h) => write!(
                f,
                "Comment header (vendor: {}, comments: {:?}, length: {})",
                h.vendor, h.comments, h.packet_length
            ),
            VorbisPacket::Setup { packet_length } => {
                write!(f, "Setup header (length: {packet_length})")
            }
            VorbisPacket::Audio { packet_length } => {
                write!(f, "Audio packet (length: {packet_length})")
            }
        }
    }
}

/// Vorbis identification header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentificationHeader {
    pub channels: u8,
    pub sample_rate: u32,
    pub bitrate_max: i32,
    pub bitrate_nominal: i32,
    pub bitrate_min: i32,
    /// blocksize_0 exponent in the low nibble, blocksize_1 in the high nibble
    pub block_sizes: u8,
    pub packet_length: usize,
}

impl IdentificationHeader {
    fn decode_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        let version_offset = reader.absolute_position();
        let vorbis_version = reader.read_u32("vorbis version")?;
        if vorbis_version != 0 {
            return Err(Error::UnsupportedVersion {
                offset: version_offset,
                version: vorbis_version,
            });
        }

        let channels = reader.read_u8("channel count")?;
        let sample_rate = reader.read_u32("sample rate")?;
        let bitrate_max = reader.read_i32("maximum bitrate")?;
        let bitrate_nominal = reader.read_i32("nominal bitrate")?;
        let bitrate_min = reader.read_i32("minimum bitrate")?;
        let block_sizes = reader.read_u8("block sizes")?;
        let framing_offset = reader.absolute_position();
        let framing = reader.read_u8("framing flag")?;
        if framing & 1 == 0 {
            return Err(Error::malformed_packet(
                framing_offset,
                "framing bit not set at the end of identification header",
            ));
        }

        Ok(IdentificationHeader {
            channels,
            sample_rate,
            bitrate_max,
            bitrate_nominal,
            bitrate_min,
            block_sizes,
            packet_length: reader.position(),
        })
    }

    /// Short window size in samples
    pub fn blocksize_0(&self) -> u32 {
        1u32 << (self.block_sizes & 0x0f)
    }

    /// Long window size in samples
    pub fn blocksize_1(&self) -> u32 {
        1u32 << (self.block_sizes >> 4)
    }

    /// Copy of this header with a different sample rate
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        IdentificationHeader {
            sample_rate,
            ..self.clone()
        }
    }

    /// Write the full packet, type byte and codec identifier included
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IDENTIFICATION_HEADER_LENGTH);
        out.push(VORBIS_PACKET_IDENTIFICATION);
        out.extend_from_slice(VORBIS_CODEC_ID);
        out.extend_from_slice(&0u32.to_le_bytes()); // vorbis_version
        out.push(self.channels);
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.bitrate_max.to_le_bytes());
        out.extend_from_slice(&self.bitrate_nominal.to_le_bytes());
        out.extend_from_slice(&self.bitrate_min.to_le_bytes());
        out.push(self.block_sizes);
        out.push(1); // framing_flag
        out
    }
}

/// Vorbis comment header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentHeader {
    pub vendor: String,
    /// Comments in declared order, normally `FIELD=value`
    pub comments: Vec<String>,
    pub packet_length: usize,
}

impl CommentHeader {
    /// Build a comment header and compute its encoded length
    pub fn new(vendor: impl Into<String>, comments: Vec<String>) -> Self {
        let vendor = vendor.into();
        let packet_length = 1
            + VORBIS_CODEC_ID.len()
            + 4
            + vendor.len()
            + 4
            + comments.iter().map(|c| 4 + c.len()).sum::<usize>()
            + 1;
        CommentHeader {
            vendor,
            comments,
            packet_length,
        }
    }

    fn decode_body(reader: &mut PacketReader<'_>) -> Result<Self> {
        let vendor = reader.read_string("vendor string")?;
        let comment_count = reader.read_u32("comment count")?;

        let mut comments = Vec::new();
        for _ in 0..comment_count {
            comments.push(reader.read_string("comment")?);
        }

        let framing_offset = reader.absolute_position();
        let framing = reader.read_u8("framing bit")?;
        if framing & 1 == 0 {
            return Err(Error::malformed_packet(
                framing_offset,
                "framing bit should be set at the end of comment header",
            ));
        }

        Ok(CommentHeader {
            vendor,
            comments,
            packet_length: reader.position(),
        })
    }

    /// Get a comment value by field name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields()
            .find(|(f, _)| f.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
    }

    /// `FIELD=value` comments split at the first `=`; others are skipped
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.comments.iter().filter_map(|c| c.split_once('='))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.packet_length);
        out.push(VORBIS_PACKET_COMMENT);
        out.extend_from_slice(VORBIS_CODEC_ID);
        out.extend_from_slice(&(self.vendor.len() as u32).to_le_bytes());
        out.extend_from_slice(self.vendor.as_bytes());
        out.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for comment in &self.comments {
            out.extend_from_slice(&(comment.len() as u32).to_le_bytes());
            out.extend_from_slice(comment.as_bytes());
        }
        out.push(1);
        out
    }
}

/// Bounds-checked reader over one packet's bytes
struct PacketReader<'a> {
    cursor: Cursor<&'a [u8]>,
    offset: u64,
}

impl<'a> PacketReader<'a> {
    fn new(data: &'a [u8], offset: u64) -> Self {
        PacketReader {
            cursor: Cursor::new(data),
            offset,
        }
    }

    fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn absolute_position(&self) -> u64 {
        self.offset + self.cursor.position()
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::malformed_packet(self.absolute_position(), reason)
    }

    fn truncated(&self, what: &str) -> Error {
        self.error(format!("packet ends before {what}"))
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        read_u8(&mut self.cursor).map_err(|_| self.truncated(what))
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        read_le_u32(&mut self.cursor).map_err(|_| self.truncated(what))
    }

    fn read_i32(&mut self, what: &str) -> Result<i32> {
        read_le_i32(&mut self.cursor).map_err(|_| self.truncated(what))
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> Result<Vec<u8>> {
        read_bytes(&mut self.cursor, len).map_err(|_| self.truncated(what))
    }

    /// Length-prefixed UTF-8 string
    fn read_string(&mut self, what: &str) -> Result<String> {
        let length = self.read_u32(what)? as usize;
        if length > self.remaining() {
            return Err(self.error(format!(
                "{what} length {length} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        let start = self.absolute_position();
        let bytes = self.read_bytes(length, what)?;
        String::from_utf8(bytes)
            .map_err(|_| Error::malformed_packet(start, format!("{what} is not valid UTF-8")))
    }
}
