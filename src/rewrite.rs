// Identification header rewriting
//
// Pages are copied byte-for-byte except for the identification header packet
// of each stream, which is re-encoded in place. The re-encoded packet has the
// same length, so segment tables stay valid. Page CRCs are NOT recomputed:
// checksums of rewritten pages are stale in the output.

use std::io::{Read, Seek, Write};

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ogg::OggReader;
use crate::vorbis::{IdentificationHeader, VorbisPacket};

/// What a rewrite pass produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub pages_written: usize,
    pub headers_rewritten: usize,
}

/// Copy `reader`'s stream to `writer`, replacing each identification header
/// with `rewrite(&header)`.
pub fn rewrite_identification_headers<R, W, F>(
    reader: &mut OggReader<R>,
    writer: &mut W,
    mut rewrite: F,
) -> Result<RewriteSummary>
where
    R: Read + Seek,
    W: Write,
    F: FnMut(&IdentificationHeader) -> IdentificationHeader,
{
    let mut summary = RewriteSummary::default();

    while let Some(page) = reader.next_page()? {
        let mut content = reader.page_content(&page)?;

        let needs_header = reader
            .stream(page.header.bitstream_serial)
            .is_some_and(|stream| stream.identification_header.is_none());
        if needs_header {
            let content_offset = page.content_offset();
            for packet in reader.packets(&page)? {
                let (offset, packet) = packet?;
                let VorbisPacket::Identification(header) = packet else {
                    continue;
                };

                let replacement = rewrite(&header).to_bytes();
                let start = offset
                    .checked_sub(content_offset)
                    .map(|relative| relative as usize)
                    .filter(|&relative| relative + replacement.len() <= content.len())
                    .ok_or_else(|| {
                        Error::malformed_packet(offset, "identification header spans a page boundary")
                    })?;
                content[start..start + replacement.len()].copy_from_slice(&replacement);
                debug!(
                    serial = page.header.bitstream_serial,
                    offset, "rewrote identification header"
                );
                summary.headers_rewritten += 1;
            }
        }

        page.header.write(writer)?;
        writer.write_all(&content)?;
        summary.pages_written += 1;
    }

    writer.flush()?;
    Ok(summary)
}

/// Multiply every stream's sample rate by `multiplier`, truncating toward zero
pub fn multiply_sample_rate<R, W>(
    reader: &mut OggReader<R>,
    writer: &mut W,
    multiplier: f64,
) -> Result<RewriteSummary>
where
    R: Read + Seek,
    W: Write,
{
    rewrite_identification_headers(reader, writer, |header| {
        let sample_rate = (header.sample_rate as f64 * multiplier) as u32;
        header.with_sample_rate(sample_rate)
    })
}
