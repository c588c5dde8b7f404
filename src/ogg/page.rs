use std::fmt;
use std::io::{self, Read, Write};

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ogg::{
    LACING_CONTINUE, MAX_PAGE_SEGMENTS, OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION,
    OGG_HEADER_TYPE_EOS, OGG_SIGNATURE, PAGE_HEADER_FIXED_SIZE,
};
use crate::utils::io::{
    read_bytes, read_le_i64, read_le_u32, read_u8, read_up_to, write_le_i64, write_le_u32,
    write_u8,
};

/// One run of lacing values on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketSpan {
    /// Bytes of the packet carried by this page
    pub length: usize,
    /// `false` when the run hits the end of the segment table on a 255
    pub complete: bool,
}

/// OGG Page Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    pub version: u8,
    pub header_type: u8,
    pub granule_position: i64,
    pub bitstream_serial: u32,
    pub page_sequence: u32,
    pub crc: u32,
    pub segment_table: Vec<u8>,
}

impl PageHeader {
    /// Read a page header starting at `offset`.
    ///
    /// Returns `Ok(None)` if the source is exhausted before the first byte of
    /// the capture pattern.
    pub fn read<R: Read>(reader: &mut R, offset: u64) -> Result<Option<Self>> {
        let mut signature = [0u8; 4];
        let read = read_up_to(reader, &mut signature)?;
        if read == 0 {
            debug!(offset, "reached end of stream");
            return Ok(None);
        }
        if read < signature.len() {
            return Err(Error::malformed_header(
                offset,
                format!("truncated capture pattern ({read} of 4 bytes)"),
            ));
        }
        if &signature != OGG_SIGNATURE {
            return Err(Error::malformed_header(
                offset,
                format!("expected capture pattern \"OggS\" but got {signature:02x?}"),
            ));
        }

        let truncated = |e: io::Error| truncation_error(offset, e);

        let version = read_u8(reader).map_err(truncated)?;
        if version != 0 {
            return Err(Error::malformed_header(
                offset,
                format!("unsupported stream structure version {version}"),
            ));
        }

        let header_type = read_u8(reader).map_err(truncated)?;
        let granule_position = read_le_i64(reader).map_err(truncated)?;
        let bitstream_serial = read_le_u32(reader).map_err(truncated)?;
        let page_sequence = read_le_u32(reader).map_err(truncated)?;
        let crc = read_le_u32(reader).map_err(truncated)?;
        let segment_count = read_u8(reader).map_err(truncated)?;
        let segment_table = read_bytes(reader, segment_count as usize).map_err(truncated)?;

        Ok(Some(PageHeader {
            version,
            header_type,
            granule_position,
            bitstream_serial,
            page_sequence,
            crc,
            segment_table,
        }))
    }

    /// Serialize the header in wire layout. The checksum is written as stored.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.segment_table.len() > MAX_PAGE_SEGMENTS {
            return Err(Error::SegmentTableTooLong {
                entries: self.segment_table.len(),
            });
        }

        writer.write_all(OGG_SIGNATURE)?;
        write_u8(writer, self.version)?;
        write_u8(writer, self.header_type)?;
        write_le_i64(writer, self.granule_position)?;
        write_le_u32(writer, self.bitstream_serial)?;
        write_le_u32(writer, self.page_sequence)?;
        write_le_u32(writer, self.crc)?;
        write_u8(writer, self.segment_table.len() as u8)?;
        writer.write_all(&self.segment_table)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.header_length());
        self.write(&mut out)?;
        Ok(out)
    }

    /// First packet on this page continues one from the previous page
    pub fn is_continuation(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    /// Check if this is the beginning of a stream
    pub fn is_bos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    /// Check if this is the end of a stream
    pub fn is_eos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// Header byte length including the segment table
    pub fn header_length(&self) -> usize {
        PAGE_HEADER_FIXED_SIZE + self.segment_table.len()
    }

    /// Calculate total page data size from segment table
    pub fn content_length(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    /// Split the segment table into packet runs.
    ///
    /// Spans partition the page content in order. Only the last span can be
    /// incomplete.
    pub fn packet_spans(&self) -> Vec<PacketSpan> {
        let mut spans = Vec::new();
        let mut accumulator = 0usize;
        let mut open = false;

        for &lacing_value in &self.segment_table {
            accumulator += lacing_value as usize;
            if lacing_value == LACING_CONTINUE {
                open = true;
            } else {
                spans.push(PacketSpan {
                    length: accumulator,
                    complete: true,
                });
                accumulator = 0;
                open = false;
            }
        }

        if open {
            spans.push(PacketSpan {
                length: accumulator,
                complete: false,
            });
        }

        spans
    }

    /// Lengths of the packet runs terminated on this page
    pub fn packet_sizes(&self) -> Vec<usize> {
        self.packet_spans()
            .into_iter()
            .filter(|span| span.complete)
            .map(|span| span.length)
            .collect()
    }

    /// The last packet on this page continues into the next one
    pub fn ends_with_partial_packet(&self) -> bool {
        self.segment_table.last() == Some(&LACING_CONTINUE)
    }
}

fn truncation_error(offset: u64, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::malformed_header(offset, "truncated page header")
    } else {
        Error::Io(err)
    }
}

impl fmt::Display for PageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {} of stream {:#010x} ({} segments, granule {})",
            self.page_sequence,
            self.bitstream_serial,
            self.segment_table.len(),
            self.granule_position
        )
    }
}

/// OGG Page placement within the physical stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub header: PageHeader,
    /// Position of this page in physical order, starting at 0
    pub index: usize,
    pub byte_offset: u64,
    pub header_byte_length: usize,
    pub content_byte_length: usize,
}

impl Page {
    pub fn content_offset(&self) -> u64 {
        self.byte_offset + self.header_byte_length as u64
    }

    pub fn next_page_offset(&self) -> u64 {
        self.content_offset() + self.content_byte_length as u64
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, offset: {}, header length: {}, content length: {}",
            self.header, self.byte_offset, self.header_byte_length, self.content_byte_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_with_table(segment_table: Vec<u8>) -> PageHeader {
        PageHeader {
            version: 0,
            header_type: OGG_HEADER_TYPE_BOS,
            granule_position: 0,
            bitstream_serial: 0x1234_5678,
            page_sequence: 0,
            crc: 0xcafe_babe,
            segment_table,
        }
    }

    #[test]
    fn test_lacing_partitions_content() {
        let header = header_with_table(vec![255, 10, 30, 255, 255, 0, 1]);
        let spans = header.packet_spans();
        let lengths: Vec<usize> = spans.iter().map(|s| s.length).collect();
        assert_eq!(lengths, vec![265, 30, 510, 1]);
        assert!(spans.iter().all(|s| s.complete));
        assert_eq!(lengths.iter().sum::<usize>(), header.content_length());
    }

    #[test]
    fn test_lacing_trailing_255_is_incomplete() {
        let header = header_with_table(vec![30, 255, 255]);
        assert_eq!(
            header.packet_spans(),
            vec![
                PacketSpan { length: 30, complete: true },
                PacketSpan { length: 510, complete: false },
            ]
        );
        assert_eq!(header.packet_sizes(), vec![30]);
        assert!(header.ends_with_partial_packet());
    }

    #[test]
    fn test_lacing_empty_table() {
        let header = header_with_table(Vec::new());
        assert!(header.packet_spans().is_empty());
        assert_eq!(header.content_length(), 0);
        assert_eq!(header.header_length(), 27);
    }

    #[test]
    fn test_roundtrip_maximal_table() {
        let header = header_with_table(vec![255; 255]);
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), 27 + 255);

        let parsed = PageHeader::read(&mut Cursor::new(&bytes), 0).unwrap().unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
        assert_eq!(parsed.content_length(), 255 * 255);
    }

    #[test]
    fn test_roundtrip_preserves_unknown_flag_bits() {
        let mut header = header_with_table(vec![1, 2, 3]);
        header.header_type = 0xf5;
        header.granule_position = -1;
        let bytes = header.to_bytes().unwrap();
        let parsed = PageHeader::read(&mut Cursor::new(&bytes), 0).unwrap().unwrap();
        assert_eq!(parsed.header_type, 0xf5);
        assert!(parsed.is_continuation() && parsed.is_eos());
        assert_eq!(parsed.granule_position, -1);
    }

    #[test]
    fn test_read_empty_source_is_end_of_stream() {
        let result = PageHeader::read(&mut Cursor::new(Vec::new()), 100).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_partial_signature() {
        let err = PageHeader::read(&mut Cursor::new(b"Og".to_vec()), 42).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { offset: 42, .. }));
    }

    #[test]
    fn test_read_bad_signature() {
        let err = PageHeader::read(&mut Cursor::new(b"RIFF\0\0\0\0".to_vec()), 0).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { offset: 0, .. }));
    }

    #[test]
    fn test_read_bad_version() {
        let mut bytes = header_with_table(vec![]).to_bytes().unwrap();
        bytes[4] = 1;
        let err = PageHeader::read(&mut Cursor::new(bytes), 0).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_read_truncated_segment_table() {
        let bytes = header_with_table(vec![10, 20, 30]).to_bytes().unwrap();
        let err = PageHeader::read(&mut Cursor::new(&bytes[..28]), 7).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { offset: 7, .. }));
    }

    #[test]
    fn test_write_rejects_oversized_table() {
        let header = header_with_table(vec![0; 256]);
        let err = header.to_bytes().unwrap_err();
        assert!(matches!(err, Error::SegmentTableTooLong { entries: 256 }));
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_page_offsets() {
        let header = header_with_table(vec![100, 50]);
        let page = Page {
            index: 0,
            byte_offset: 1000,
            header_byte_length: header.header_length(),
            content_byte_length: header.content_length(),
            header,
        };
        assert_eq!(page.content_offset(), 1029);
        assert_eq!(page.next_page_offset(), 1179);
    }
}
