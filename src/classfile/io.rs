//! Big-endian, bounds-checked reading and writing of class file primitives.
//!
//! Every multi-byte quantity in a JVM class file is stored big-endian. This module provides
//! the [`ClassIO`] trait for the unsigned widths the format uses and free functions that read
//! or write at an offset while advancing it, refusing any access past the end of the buffer.
//!
//! # Key Components
//!
//! - [`ClassIO`] - Conversion between fixed-size byte arrays and primitive values
//! - [`read_be`] / [`read_be_at`] - Bounds-checked reads
//! - [`write_be_at`] - Bounds-checked in-place writes, used to patch header fields
//!
//! # Examples
//!
//! ```rust,ignore
//! use mockloader::classfile::io::{read_be_at, write_be_at};
//!
//! let mut data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00];
//! let mut offset = 0;
//! let magic: u32 = read_be_at(&data, &mut offset)?;
//! assert_eq!(magic, 0xCAFE_BABE);
//!
//! let mut offset = 4;
//! write_be_at(&mut data, &mut offset, 3_u16)?;
//! assert_eq!(&data[4..], &[0x00, 0x03]);
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for type-specific big-endian conversion of class file primitives.
///
/// Each implementation names the fixed-size byte array it converts from and to
/// (e.g. `[u8; 2]` for `u16`).
pub trait ClassIO: Sized + Copy {
    /// Byte array representation of this type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in big-endian
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_class_io {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl ClassIO for $ty {
                type Bytes = [u8; $len];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_class_io!(u8 => 1, u16 => 2, u32 => 4, u64 => 8);

/// Safely reads a value of type `T` in big-endian byte order from the start of a buffer.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be<T: ClassIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Safely reads a value of type `T` in big-endian byte order at `offset`, advancing it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be_at<T: ClassIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = offset.checked_add(type_len).ok_or(OutOfBounds)?;
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Safely writes a value of type `T` in big-endian byte order at `offset`, advancing it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too small for the value.
pub fn write_be_at<T: ClassIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let end = offset.checked_add(type_len).ok_or(OutOfBounds)?;
    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(value.to_be_bytes().as_ref());
    *offset = end;

    Ok(())
}
