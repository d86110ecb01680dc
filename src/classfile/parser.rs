//! Cursor-based reader over class file bytes.

use crate::{
    classfile::io::{read_be_at, ClassIO},
    Result,
};

/// A bounds-checked cursor for reading big-endian class file structures.
///
/// `Parser` keeps a position into the borrowed bytes and advances it on every read.
/// All reads validate that enough data remains, so truncated or damaged class files
/// surface as [`crate::Error::OutOfBounds`] instead of panics.
///
/// # Examples
///
/// ```rust
/// use mockloader::classfile::Parser;
///
/// let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
/// assert_eq!(parser.read_be::<u16>()?, 0);
/// assert_eq!(parser.read_be::<u16>()?, 52);
/// assert!(!parser.has_more_data());
/// # Ok::<(), mockloader::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the current position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes left after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the position forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the new position would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.position = self.calc_end_position(step)?;
        Ok(())
    }

    /// Read a type `T` from the current position in big-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_be<T: ClassIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Reads a slice of `length` bytes from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Reads a `u2`-length-prefixed modified UTF-8 string (a `CONSTANT_Utf8` payload).
    ///
    /// Modified UTF-8 only differs from UTF-8 for NUL and supplementary characters, which
    /// never occur in class names; such strings are decoded lossily.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the string extends past the data.
    pub fn read_utf8(&mut self) -> Result<String> {
        let length = self.read_be::<u16>()? as usize;
        let bytes = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }
}
