// Read-only consumers of the demultiplexer
//
// Each function walks the whole physical stream once. Packet decoding is
// limited to the pages a consumer needs: comments and durations only decode
// packets until the header they are after has been seen for that stream.

use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ogg::OggReader;
use crate::vorbis::{CommentHeader, LogicalStream};

/// Everything known about a logical stream after a full pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub serial: u32,
    pub channels: Option<u8>,
    pub sample_rate: Option<u32>,
    pub bitrate_nominal: Option<i32>,
    pub vendor: Option<String>,
    pub comments: Vec<String>,
    pub last_granule_position: Option<i64>,
    pub duration_secs: Option<f64>,
    pub packets_parsed: usize,
    pub pages: usize,
    /// The file ended while a packet was still waiting for its continuation
    pub unterminated_packet: bool,
}

impl From<&LogicalStream> for StreamSummary {
    fn from(stream: &LogicalStream) -> Self {
        let identification = stream.identification_header.as_ref();
        let comment = stream.comment_header.as_ref();
        StreamSummary {
            serial: stream.serial,
            channels: identification.map(|h| h.channels),
            sample_rate: identification.map(|h| h.sample_rate),
            bitrate_nominal: identification.map(|h| h.bitrate_nominal),
            vendor: comment.map(|c| c.vendor.clone()),
            comments: comment.map(|c| c.comments.clone()).unwrap_or_default(),
            last_granule_position: stream.last_granule_position,
            duration_secs: stream.calculate_duration(),
            packets_parsed: stream.packets_parsed,
            pages: stream.pages_seen,
            unterminated_packet: stream.has_partial_packet(),
        }
    }
}

/// Comment header of one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamComments {
    pub serial: u32,
    #[serde(flatten)]
    pub header: CommentHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDuration {
    pub serial: u32,
    pub sample_rate: Option<u32>,
    pub last_granule_position: Option<i64>,
    pub duration_secs: Option<f64>,
}

/// Counts of what `write_page_tree` created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    pub pages: usize,
    pub packets: usize,
}

/// Decode every packet of every page
pub fn parse_fully<R: Read + Seek>(reader: &mut OggReader<R>) -> Result<Vec<StreamSummary>> {
    while let Some(page) = reader.next_page()? {
        for packet in reader.packets(&page)? {
            packet?;
        }
    }
    Ok(reader.streams().map(StreamSummary::from).collect())
}

/// Comment headers of all streams that carry one
pub fn read_comments<R: Read + Seek>(reader: &mut OggReader<R>) -> Result<Vec<StreamComments>> {
    decode_while(reader, |stream| stream.comment_header.is_none())?;
    Ok(reader
        .streams()
        .filter_map(|stream| {
            stream.comment_header.as_ref().map(|header| StreamComments {
                serial: stream.serial,
                header: header.clone(),
            })
        })
        .collect())
}

/// Duration of every stream, from its identification header and final granule position
pub fn read_durations<R: Read + Seek>(reader: &mut OggReader<R>) -> Result<Vec<StreamDuration>> {
    decode_while(reader, |stream| stream.identification_header.is_none())?;
    Ok(reader
        .streams()
        .map(|stream| StreamDuration {
            serial: stream.serial,
            sample_rate: stream.identification_header.as_ref().map(|h| h.sample_rate),
            last_granule_position: stream.last_granule_position,
            duration_secs: stream.calculate_duration(),
        })
        .collect())
}

/// Walk all pages, decoding packets only of pages whose stream satisfies `wanted`
fn decode_while<R, F>(reader: &mut OggReader<R>, wanted: F) -> Result<()>
where
    R: Read + Seek,
    F: Fn(&LogicalStream) -> bool,
{
    while let Some(page) = reader.next_page()? {
        let decode = reader
            .stream(page.header.bitstream_serial)
            .is_some_and(|stream| wanted(stream));
        if decode {
            for packet in reader.packets(&page)? {
                packet?;
            }
        }
    }
    Ok(())
}

/// Make sure `dir` exists and is empty. With `force`, existing contents are removed.
pub fn prepare_output_dir(dir: &Path, force: bool) -> Result<()> {
    if dir.exists() {
        let occupied = fs::read_dir(dir)?.next().is_some();
        if occupied {
            if !force {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("output directory {} is not empty", dir.display()),
                )));
            }
            debug!(dir = %dir.display(), "removing existing output directory");
            fs::remove_dir_all(dir)?;
        }
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Mirror the page/packet layout as directories under `dir`:
/// `<page>/granule_pos=<g>` and `<page>/<packet>/{type=<kind>,offset=<offset>}`.
pub fn write_page_tree<R: Read + Seek>(reader: &mut OggReader<R>, dir: &Path) -> Result<TreeSummary> {
    let mut summary = TreeSummary { pages: 0, packets: 0 };

    while let Some(page) = reader.next_page()? {
        let page_dir = dir.join(page.index.to_string());
        fs::create_dir(&page_dir)?;
        touch(&page_dir.join(format!("granule_pos={}", page.header.granule_position)))?;
        summary.pages += 1;

        for (packet_index, packet) in reader.packets(&page)?.enumerate() {
            let (offset, packet) = packet?;
            let packet_dir = page_dir.join(packet_index.to_string());
            fs::create_dir(&packet_dir)?;
            touch(&packet_dir.join(format!("type={}", packet.kind())))?;
            touch(&packet_dir.join(format!("offset={offset}")))?;
            summary.packets += 1;
        }
    }

    Ok(summary)
}

fn touch(path: &Path) -> Result<()> {
    File::create(path)?;
    Ok(())
}
