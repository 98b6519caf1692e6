use crate::{Error, ErrorKind, Result};
use core::str;

pub(crate) const WASM_MAGIC_NUMBER: &[u8; 4] = b"\0asm";
pub(crate) const WASM_VERSION: u32 = 1;

/// Maximum byte length accepted for a feature name.
pub(crate) const MAX_STRING_SIZE: usize = 100_000;

/// A low-level binary reader over a byte slice.
///
/// The reader tracks an `original_offset` so that errors report positions
/// relative to the start of the whole input even when `data` is a window into
/// a larger buffer, such as the payload of one section.
#[derive(Clone, Debug)]
pub struct BinaryReader<'a> {
    buffer: &'a [u8],
    position: usize,
    original_offset: usize,
}

impl<'a> BinaryReader<'a> {
    /// Creates a new binary reader over the `data` provided.
    ///
    /// The `original_offset` is added to the current position in `data` when
    /// reporting byte offsets in errors.
    pub fn new(data: &'a [u8], original_offset: usize) -> BinaryReader<'a> {
        BinaryReader {
            buffer: data,
            position: 0,
            original_offset,
        }
    }

    /// Gets the original position of the binary reader.
    #[inline]
    pub fn original_position(&self) -> usize {
        self.original_offset + self.position
    }

    /// Returns whether the reader has reached the end of its buffer.
    #[inline]
    pub fn eof(&self) -> bool {
        self.position >= self.buffer.len()
    }

    /// Returns the number of bytes remaining in the reader.
    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub(crate) fn remaining_buffer(&self) -> &'a [u8] {
        &self.buffer[self.position..]
    }

    fn ensure_has_bytes(&self, len: usize) -> Result<()> {
        if self.position + len <= self.buffer.len() {
            Ok(())
        } else {
            Err(Error::eof(self.original_position()))
        }
    }

    /// Reads a value of type `T` from this binary reader, advancing the
    /// internal position forward as data is read.
    #[inline]
    pub fn read<T>(&mut self) -> Result<T>
    where
        T: FromReader<'a>,
    {
        T::from_reader(self)
    }

    /// Advances the reader a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let b = match self.buffer.get(self.position) {
            Some(b) => *b,
            None => return Err(Error::eof(self.original_position())),
        };
        self.position += 1;
        Ok(b)
    }

    /// Advances the reader four bytes and returns a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure_has_bytes(4)?;
        let word = u32::from_le_bytes(
            self.buffer[self.position..self.position + 4]
                .try_into()
                .unwrap(),
        );
        self.position += 4;
        Ok(word)
    }

    /// Advances the reader up to five bytes to parse a LEB128 variable-length
    /// integer as a `u32`.
    #[inline]
    pub fn read_var_u32(&mut self) -> Result<u32> {
        // Optimization for the single byte case.
        let byte = self.read_u8()?;
        if (byte & 0x80) == 0 {
            Ok(u32::from(byte))
        } else {
            self.read_var_u32_big(byte)
        }
    }

    fn read_var_u32_big(&mut self, byte: u8) -> Result<u32> {
        let mut result = (byte & 0x7F) as u32;
        let mut shift = 7;
        loop {
            let byte = self.read_u8()?;
            result |= ((byte & 0x7F) as u32) << shift;
            if shift >= 25 && (byte >> (32 - shift)) != 0 {
                let reason = if byte & 0x80 != 0 {
                    "integer representation too long"
                } else {
                    "integer too large"
                };
                // The continuation bit or unused bits are set.
                return Err(Error::new(
                    ErrorKind::InvalidVarInt(reason),
                    self.original_position() - 1,
                ));
            }
            shift += 7;
            if (byte & 0x80) == 0 {
                break;
            }
        }
        Ok(result)
    }

    /// Advances the reader `size` bytes and returns a slice of that length
    /// from the current position.
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        self.ensure_has_bytes(size)?;
        let start = self.position;
        self.position += size;
        Ok(&self.buffer[start..self.position])
    }

    /// Reads a variable-length item count while checking it against a limit.
    pub(crate) fn read_size(&mut self, limit: usize, desc: &'static str) -> Result<usize> {
        let pos = self.original_position();
        let size = self.read_var_u32()? as usize;
        if size > limit {
            return Err(Error::new(ErrorKind::SizeOutOfBounds(desc), pos));
        }
        Ok(size)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let len = self.read_size(MAX_STRING_SIZE, "string")?;
        let pos = self.original_position();
        let bytes = self.read_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| Error::new(ErrorKind::InvalidUtf8, pos))
    }

    pub(crate) fn read_header(&mut self) -> Result<()> {
        let start = self.original_position();
        let magic = self
            .read_bytes(4)
            .map_err(|_| Error::new(ErrorKind::BadHeader, start))?;
        if magic != WASM_MAGIC_NUMBER {
            return Err(Error::new(ErrorKind::BadHeader, start));
        }
        let version = self
            .read_u32()
            .map_err(|_| Error::new(ErrorKind::BadHeader, start))?;
        if version != WASM_VERSION {
            return Err(Error::new(ErrorKind::BadHeader, start + 4));
        }
        Ok(())
    }
}

/// A trait for types deserializable from a [`BinaryReader`].
pub trait FromReader<'a>: Sized {
    /// Attempts to read `Self` from the provided binary reader, returning an
    /// error if it is unable to do so.
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self>;
}

impl<'a> FromReader<'a> for u32 {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        reader.read_var_u32()
    }
}

impl<'a> FromReader<'a> for &'a str {
    fn from_reader(reader: &mut BinaryReader<'a>) -> Result<Self> {
        reader.read_string()
    }
}
