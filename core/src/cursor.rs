//! Component A: random-access, bounds-checked reads into a profile blob.
//!
//! All multi-byte reads are little-endian except the regex-program version
//! field, which `sb2dot-automata` reads directly as big-endian -- that
//! mismatch lives entirely in the automata crate, not here. Every read here
//! is pure and bounds-checked; a short read is reported as `Error::Short`
//! rather than panicking, matching `workspace.rs`'s `read_u8`/`read_u16`
//! convention of turning an out-of-bounds access into a typed error instead
//! of indexing panics.

use byteorder::{ByteOrder, LittleEndian};
use failure::Fail;

#[derive(Debug, Fail)]
pub enum CursorError {
    #[fail(display = "short read: wanted {} bytes at offset {:#x}, blob is {} bytes", want, offset, len)]
    Short { offset: usize, want: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, CursorError>;

/// A borrowed view of the profile blob plus the handful of typed readers
/// every component needs. Cheap to copy (it's just a slice reference), so
/// passed by value where convenient.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Cursor<'a> {
        Cursor { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    fn slice(&self, offset: usize, want: usize) -> Result<&'a [u8]> {
        self.buf
            .get(offset..offset + want)
            .ok_or(CursorError::Short { offset, want, len: self.buf.len() })
    }

    pub fn read(&self, offset: usize, n: usize) -> Result<&'a [u8]> {
        self.slice(offset, n)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }

    /// Every "offset" in the profile format is a 16-bit word value scaled
    /// by 8; this is the one place that scaling happens.
    pub fn word_to_byte(word: u16) -> usize {
        (word as usize) * 8
    }

    /// `read_string_at`: seek to `word_off*8`, read a `u32` length, skip
    /// one padding byte (`# wtf?` in the original -- preserved exactly,
    /// see spec.md Sec 9 Open Questions), then read that many bytes and
    /// strip trailing NULs.
    pub fn read_string_at(&self, word_off: u16) -> Result<Vec<u8>> {
        let base = Cursor::word_to_byte(word_off);
        let n = self.read_u32(base)? as usize;
        let start = base + 4 + 1;
        let bytes = self.read(start, n)?;
        Ok(strip_trailing_nuls(bytes))
    }

    /// `read_string_nopadding_at`: identical to `read_string_at` but
    /// without the one-byte skip. Used for filter IDs 23 and 30 only --
    /// preserve this exactly, do not rationalize (spec.md Sec 9).
    pub fn read_string_nopadding_at(&self, word_off: u16) -> Result<Vec<u8>> {
        let base = Cursor::word_to_byte(word_off);
        let n = self.read_u32(base)? as usize;
        let start = base + 4;
        let bytes = self.read(start, n)?;
        Ok(strip_trailing_nuls(bytes))
    }

    /// `read_network_at`: reads `B B H H H` (8 bytes total) and discards
    /// the trailing two `u16`s -- the cursor still advances the full 8
    /// bytes in case downstream offsets depend on it (spec.md Sec 9).
    pub fn read_network_at(&self, word_off: u16) -> Result<(u8, u8, u16)> {
        let base = Cursor::word_to_byte(word_off);
        let bytes = self.read(base, 8)?;
        let typ = bytes[0];
        let addr = bytes[1];
        let port = LittleEndian::read_u16(&bytes[2..4]);
        Ok((typ, addr, port))
    }
}

fn strip_trailing_nuls(bytes: &[u8]) -> Vec<u8> {
    let end = bytes.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
    bytes[..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_typed_little_endian() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let c = Cursor::new(&buf);
        assert_eq!(c.read_u8(0).unwrap(), 0x01);
        assert_eq!(c.read_u16(0).unwrap(), 0x0201);
        assert_eq!(c.read_u32(0).unwrap(), 0x04030201);
    }

    #[test]
    fn short_read_is_an_error() {
        let buf = [0u8; 2];
        let c = Cursor::new(&buf);
        assert!(c.read_u32(0).is_err());
    }

    #[test]
    fn string_at_skips_one_pad_byte_and_strips_nuls() {
        // word offset 1 -> byte 8: len=5, pad, "hello", trailing NUL.
        let mut buf = vec![0u8; 8];
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.push(0xAA); // padding byte, any value
        buf.extend_from_slice(b"hell\0");
        let c = Cursor::new(&buf);
        assert_eq!(c.read_string_at(1).unwrap(), b"hell");
    }

    #[test]
    fn string_nopadding_at_skips_no_byte() {
        let mut buf = vec![0u8; 8];
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"abc");
        let c = Cursor::new(&buf);
        assert_eq!(c.read_string_nopadding_at(1).unwrap(), b"abc");
    }

    #[test]
    fn network_reads_first_four_of_eight_bytes() {
        let mut buf = vec![0u8; 8];
        buf.extend_from_slice(&[0x07, 0x00, 0x50, 0x00, 0xff, 0xff, 0xff, 0xff]);
        let c = Cursor::new(&buf);
        assert_eq!(c.read_network_at(1).unwrap(), (0x07, 0x00, 0x50));
    }
}
