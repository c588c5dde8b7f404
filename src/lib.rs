//! oggdemux - Ogg page demultiplexer and Vorbis header decoder
//!
//! [`OggReader`] walks a seekable Ogg file page by page and keeps one
//! [`LogicalStream`] per serial number. Packets are reassembled across page
//! boundaries from the lacing values and classified into [`VorbisPacket`]s.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use oggdemux::OggReader;
//!
//! # fn main() -> oggdemux::Result<()> {
//! let mut reader = OggReader::new(BufReader::new(File::open("song.ogg")?));
//! while let Some(page) = reader.next_page()? {
//!     for packet in reader.packets(&page)? {
//!         let (offset, packet) = packet?;
//!         println!("{offset}: {packet}");
//!     }
//! }
//! for stream in reader.streams() {
//!     println!("{:#010x}: {:?}s", stream.serial, stream.calculate_duration());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod inspect;
pub mod ogg;
pub mod rewrite;
pub mod vorbis;

mod utils;

pub use error::{Error, Result};
pub use ogg::{OggReader, PacketSpan, Page, PageHeader, ReaderOptions};
pub use vorbis::{CommentHeader, IdentificationHeader, LogicalStream, VorbisFields, VorbisPacket};
