// Byte cursor helpers for reading and writing Ogg/Vorbis structures
//
// All multi-byte integers in Ogg pages and Vorbis headers are little-endian.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Read a single byte
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buffer = [0u8; 1];
    reader.read_exact(&mut buffer)?;
    Ok(buffer[0])
}

/// Read little-endian 32-bit unsigned integer
pub fn read_le_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(u32::from_le_bytes(buffer))
}

/// Read little-endian 32-bit signed integer
pub fn read_le_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(i32::from_le_bytes(buffer))
}

/// Read little-endian 64-bit signed integer
pub fn read_le_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buffer = [0u8; 8];
    reader.read_exact(&mut buffer)?;
    Ok(i64::from_le_bytes(buffer))
}

/// Read exactly `len` raw bytes
pub fn read_bytes<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Fill `buffer` as far as the source allows and return how many bytes were read.
///
/// Unlike `read_exact`, running out of input is not an error here; the caller
/// decides what a short read means.
pub fn read_up_to<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Seek to an absolute position
pub fn seek_to<R: Seek>(reader: &mut R, offset: u64) -> io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    Ok(())
}

/// Total length of a seekable source. Leaves the cursor at the end.
pub fn stream_length<R: Seek>(reader: &mut R) -> io::Result<u64> {
    reader.seek(SeekFrom::End(0))
}

/// Write a single byte
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

/// Write little-endian 32-bit unsigned integer
pub fn write_le_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write little-endian 64-bit signed integer
pub fn write_le_i64<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}
