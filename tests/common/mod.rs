//! Byte-level builders for synthetic Ogg Vorbis streams

#![allow(dead_code)]

use oggdemux::{CommentHeader, IdentificationHeader, PageHeader};

pub use oggdemux::ogg::{OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS};

pub fn identification(sample_rate: u32, channels: u8) -> IdentificationHeader {
    IdentificationHeader {
        channels,
        sample_rate,
        bitrate_max: 0,
        bitrate_nominal: 128_000,
        bitrate_min: 0,
        block_sizes: 0xb8,
        packet_length: 30,
    }
}

pub fn identification_packet(sample_rate: u32, channels: u8) -> Vec<u8> {
    identification(sample_rate, channels).to_bytes()
}

pub fn comment_packet(vendor: &str, comments: &[&str]) -> Vec<u8> {
    CommentHeader::new(vendor, comments.iter().map(|c| c.to_string()).collect()).to_bytes()
}

/// Setup header of exactly `len` bytes with opaque filler
pub fn setup_packet(len: usize) -> Vec<u8> {
    assert!(len >= 7);
    let mut data = vec![0x05];
    data.extend_from_slice(b"vorbis");
    data.resize(len, 0x5a);
    data
}

/// Audio packet of `len` bytes (even type byte)
pub fn audio_packet(len: usize, fill: u8) -> Vec<u8> {
    let mut data = vec![fill & 0xfe; len];
    if let Some(first) = data.first_mut() {
        *first = 0x00;
    }
    data
}

/// Lacing values for one terminated packet
pub fn lacing(len: usize) -> Vec<u8> {
    let mut table = vec![255u8; len / 255];
    table.push((len % 255) as u8);
    table
}

/// Page carrying a segment table and content exactly as given
pub fn raw_page(
    serial: u32,
    sequence: u32,
    header_type: u8,
    granule: i64,
    segment_table: Vec<u8>,
    content: &[u8],
) -> Vec<u8> {
    let header = PageHeader {
        version: 0,
        header_type,
        granule_position: granule,
        bitstream_serial: serial,
        page_sequence: sequence,
        crc: 0x0bad_c0de,
        segment_table,
    };
    assert_eq!(header.content_length(), content.len());
    let mut out = header.to_bytes().unwrap();
    out.extend_from_slice(content);
    out
}

/// Page of complete packets
pub fn page(serial: u32, sequence: u32, header_type: u8, granule: i64, packets: &[&[u8]]) -> Vec<u8> {
    let mut table = Vec::new();
    let mut content = Vec::new();
    for packet in packets {
        table.extend(lacing(packet.len()));
        content.extend_from_slice(packet);
    }
    raw_page(serial, sequence, header_type, granule, table, &content)
}

/// A well-formed three-page Vorbis stream
pub fn simple_stream(serial: u32, sample_rate: u32, final_granule: i64) -> Vec<Vec<u8>> {
    let id = identification_packet(sample_rate, 2);
    let comments = comment_packet("test", &["A=1", "B=2"]);
    let setup = setup_packet(300);
    let audio_a = audio_packet(100, 0x10);
    let audio_b = audio_packet(80, 0x20);

    vec![
        page(serial, 0, OGG_HEADER_TYPE_BOS, 0, &[&id]),
        page(serial, 1, 0, 0, &[&comments, &setup]),
        page(serial, 2, OGG_HEADER_TYPE_EOS, final_granule, &[&audio_a, &audio_b]),
    ]
}
