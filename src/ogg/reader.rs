// Page sequencer: walks the physical stream one page at a time

use std::collections::BTreeMap;
use std::io::{self, Read, Seek};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ogg::page::{Page, PageHeader};
use crate::ogg::DEFAULT_MAX_PAGES;
use crate::utils::io::{read_bytes, seek_to, stream_length};
use crate::vorbis::{LogicalStream, PagePackets};

/// Options for `OggReader`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Abort with `TooManyPages` once this many pages have been read
    pub max_pages: usize,
    /// Require consecutive page sequence numbers within each logical stream
    pub check_sequence: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            max_pages: DEFAULT_MAX_PAGES,
            check_sequence: false,
        }
    }
}

/// Ogg demultiplexer over a seekable byte source.
///
/// Pages come out of [`next_page`](Self::next_page) in physical order. Packet
/// bytes for a page are read with [`packets`](Self::packets) or
/// [`page_content`](Self::page_content) before moving on; the reader
/// re-seeks to the next page header on every call, so it does not matter
/// where those reads leave the underlying cursor.
pub struct OggReader<R> {
    reader: R,
    options: ReaderOptions,
    streams: BTreeMap<u32, LogicalStream>,
    next_offset: u64,
    /// Content offset of the last page returned
    last_content_offset: u64,
    pages_parsed: usize,
    finished: bool,
}

impl<R: Read + Seek> OggReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        OggReader {
            reader,
            options,
            streams: BTreeMap::new(),
            next_offset: 0,
            last_content_offset: 0,
            pages_parsed: 0,
            finished: false,
        }
    }

    /// Read the next page header, or `None` at a clean end of input.
    ///
    /// Input ending inside the content of the previous page is
    /// `MalformedPacket`, whether or not that content was read.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        if self.finished {
            return Ok(None);
        }

        let offset = self.next_offset;
        seek_to(&mut self.reader, offset)?;
        let header = match PageHeader::read(&mut self.reader, offset)? {
            Some(header) => header,
            None => {
                if stream_length(&mut self.reader)? < offset {
                    return Err(Error::malformed_packet(
                        self.last_content_offset,
                        "page content truncated at end of input",
                    ));
                }
                self.finished = true;
                return Ok(None);
            }
        };

        if self.pages_parsed >= self.options.max_pages {
            return Err(Error::TooManyPages {
                limit: self.options.max_pages,
            });
        }

        let serial = header.bitstream_serial;
        let page = Page {
            index: self.pages_parsed,
            byte_offset: offset,
            header_byte_length: header.header_length(),
            content_byte_length: header.content_length(),
            header,
        };

        if page.header.is_bos() {
            debug!(serial, page = page.index, "logical stream starting");
            if self.streams.insert(serial, LogicalStream::new(serial)).is_some() {
                warn!(serial, offset, "serial number reused, replacing stream state");
            }
        }
        let stream = self
            .streams
            .get_mut(&serial)
            .ok_or(Error::UnknownStream { offset, serial })?;
        stream.observe_page(&page, self.options.check_sequence)?;
        if page.header.is_eos() {
            debug!(serial, page = page.index, "logical stream ending");
        }

        self.pages_parsed += 1;
        self.next_offset = page.next_page_offset();
        self.last_content_offset = page.content_offset();
        debug!(next_offset = self.next_offset, "{page}");
        Ok(Some(page))
    }

    /// Raw content bytes of a page
    pub fn page_content(&mut self, page: &Page) -> Result<Vec<u8>> {
        let content_offset = page.content_offset();
        seek_to(&mut self.reader, content_offset)?;
        read_bytes(&mut self.reader, page.content_byte_length).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::malformed_packet(content_offset, "page content truncated")
            } else {
                Error::Io(e)
            }
        })
    }

    /// Packets completed on this page, decoded lazily as the iterator advances.
    pub fn packets(&mut self, page: &Page) -> Result<PagePackets<'_>> {
        let content = self.page_content(page)?;
        let serial = page.header.bitstream_serial;
        let stream = self.streams.get_mut(&serial).ok_or(Error::UnknownStream {
            offset: page.byte_offset,
            serial,
        })?;
        debug!(serial, offset = page.content_offset(), "parsing page content");
        let raw = stream.assemble(page, &content)?;
        Ok(PagePackets::new(stream, raw))
    }

    /// State for one logical stream
    pub fn stream(&self, serial: u32) -> Option<&LogicalStream> {
        self.streams.get(&serial)
    }

    /// All logical streams seen so far, by ascending serial number
    pub fn streams(&self) -> impl Iterator<Item = &LogicalStream> {
        self.streams.values()
    }

    pub fn pages_parsed(&self) -> usize {
        self.pages_parsed
    }

    /// Start over from offset 0 with no stream state
    pub fn reset(&mut self) {
        self.streams.clear();
        self.next_offset = 0;
        self.last_content_offset = 0;
        self.pages_parsed = 0;
        self.finished = false;
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
