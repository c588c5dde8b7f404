use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ogg::Page;
use crate::vorbis::packet::{CommentHeader, IdentificationHeader, VorbisPacket};

/// Packet bytes reassembled from one or more pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Physical offset of the packet's first byte
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Packet left open at the end of a page
#[derive(Debug, Clone)]
struct PartialPacket {
    packet: RawPacket,
    /// Value of `pages_seen` when the packet was left open
    page: usize,
}

/// Per logical stream demultiplexer state
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogicalStream {
    pub serial: u32,
    pub identification_header: Option<IdentificationHeader>,
    pub comment_header: Option<CommentHeader>,
    /// Granule position of the end-of-stream page, once seen
    pub last_granule_position: Option<i64>,
    pub packets_parsed: usize,
    pub pages_seen: usize,
    #[serde(skip)]
    last_page_sequence: Option<u32>,
    #[serde(skip)]
    partial: Option<PartialPacket>,
}

impl LogicalStream {
    pub fn new(serial: u32) -> Self {
        LogicalStream {
            serial,
            ..Default::default()
        }
    }

    /// Duration in seconds, once both the sample rate and the final granule
    /// position are known
    pub fn calculate_duration(&self) -> Option<f64> {
        let header = self.identification_header.as_ref()?;
        let granule = self.last_granule_position?;
        if header.sample_rate == 0 || granule < 0 {
            return None;
        }
        Some(granule as f64 / header.sample_rate as f64)
    }

    /// A packet left open by the last assembled page is waiting for its continuation
    pub fn has_partial_packet(&self) -> bool {
        self.partial.is_some()
    }

    /// Account for a page of this stream and check sequence continuity if asked.
    pub(crate) fn observe_page(&mut self, page: &Page, check_sequence: bool) -> Result<()> {
        let found = page.header.page_sequence;
        if check_sequence {
            if let Some(previous) = self.last_page_sequence {
                let expected = previous.wrapping_add(1);
                if found != expected {
                    return Err(Error::SequenceGap {
                        offset: page.byte_offset,
                        serial: self.serial,
                        expected,
                        found,
                    });
                }
            }
        }
        self.last_page_sequence = Some(found);
        self.pages_seen += 1;
        if page.header.is_eos() {
            self.last_granule_position = Some(page.header.granule_position);
        }
        Ok(())
    }

    /// Cut a page's content into complete packets.
    ///
    /// A packet left open by the previous page is joined with this page's
    /// leading fragment. A packet left open by this page is held back until
    /// the next page of the stream is assembled. If pages of the stream were
    /// observed but not assembled in between, the held packet is dropped.
    pub fn assemble(&mut self, page: &Page, content: &[u8]) -> Result<Vec<RawPacket>> {
        let content_offset = page.content_offset();
        if content.len() != page.content_byte_length {
            return Err(Error::malformed_packet(
                content_offset,
                format!(
                    "page content is {} bytes but the segment table describes {}",
                    content.len(),
                    page.content_byte_length
                ),
            ));
        }

        let mut pending = match self.partial.take() {
            Some(partial) if partial.page + 1 == self.pages_seen => Some(partial.packet),
            Some(partial) => {
                warn!(
                    serial = self.serial,
                    offset = partial.packet.offset,
                    bytes = partial.packet.data.len(),
                    "dropping partial packet whose continuation page was skipped"
                );
                None
            }
            None => None,
        };

        let mut packets = Vec::new();
        let mut position = 0usize;

        for (index, span) in page.header.packet_spans().into_iter().enumerate() {
            let fragment = &content[position..position + span.length];
            let fragment_offset = content_offset + position as u64;
            position += span.length;

            let carried = if index == 0 {
                match (page.header.is_continuation(), pending.take()) {
                    (true, Some(partial)) => Some(partial),
                    (true, None) => {
                        warn!(
                            serial = self.serial,
                            offset = fragment_offset,
                            "dropping continuation fragment of a packet whose start was not read"
                        );
                        continue;
                    }
                    (false, Some(partial)) => {
                        return Err(Error::malformed_packet(
                            partial.offset,
                            format!(
                                "packet continues past its page but the page at offset {} is not a continuation",
                                page.byte_offset
                            ),
                        ));
                    }
                    (false, None) => None,
                }
            } else {
                None
            };

            let packet = match carried {
                Some(mut partial) => {
                    partial.data.extend_from_slice(fragment);
                    partial
                }
                None => RawPacket {
                    offset: fragment_offset,
                    data: fragment.to_vec(),
                },
            };

            if span.complete {
                packets.push(packet);
            } else {
                debug!(
                    serial = self.serial,
                    offset = packet.offset,
                    bytes = packet.data.len(),
                    "packet continues on the next page"
                );
                self.partial = Some(PartialPacket {
                    packet,
                    page: self.pages_seen,
                });
            }
        }

        // Page without lacing values
        if let Some(packet) = pending {
            self.partial = Some(PartialPacket {
                packet,
                page: self.pages_seen,
            });
        }

        Ok(packets)
    }

    /// Decode one reassembled packet and fold header packets into the stream state
    pub fn decode_packet(&mut self, raw: RawPacket) -> Result<(u64, VorbisPacket)> {
        let packet = VorbisPacket::decode(&raw.data, raw.offset)?;
        debug!(serial = self.serial, offset = raw.offset, %packet, "parsed packet");

        match &packet {
            VorbisPacket::Identification(header) => {
                if self.identification_header.is_none() {
                    self.identification_header = Some(header.clone());
                } else {
                    warn!(
                        serial = self.serial,
                        offset = raw.offset,
                        "ignoring repeated identification header"
                    );
                }
            }
            VorbisPacket::Comment(header) => self.comment_header = Some(header.clone()),
            VorbisPacket::Setup { .. } | VorbisPacket::Audio { .. } => {}
        }

        self.packets_parsed += 1;
        Ok((raw.offset, packet))
    }
}

/// Lazily decoded packets of one page
pub struct PagePackets<'a> {
    stream: &'a mut LogicalStream,
    pending: std::vec::IntoIter<RawPacket>,
}

impl<'a> PagePackets<'a> {
    pub(crate) fn new(stream: &'a mut LogicalStream, packets: Vec<RawPacket>) -> Self {
        PagePackets {
            stream,
            pending: packets.into_iter(),
        }
    }
}

impl Iterator for PagePackets<'_> {
    type Item = Result<(u64, VorbisPacket)>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.pending.next()?;
        let result = self.stream.decode_packet(raw);
        if result.is_err() {
            // A malformed packet ends iteration of this page
            self.pending = Vec::new().into_iter();
        }
        Some(result)
    }
}
