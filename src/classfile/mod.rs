//! Class-byte intermediate representation.
//!
//! This module provides the mutable representation that flows from the class pool through the
//! transformer chain and into class definition. A [`ClassFile`] owns the raw bytes of one JVM
//! class file together with the header information parsed from them: version, constant pool
//! derived names, and access flags.
//!
//! Only the header is interpreted. Fields, methods and attributes are carried as opaque bytes,
//! which is all the loading engine needs: it must know which class the bytes describe and be
//! able to hand them, possibly rewritten, to the definition primitive. Header mutations are
//! patched into the buffer in place, so serializing a [`ClassFile`] is simply taking its bytes.
//!
//! # Key Types
//!
//! - [`ClassFile`] - Parsed class bytes, mutable and serializable
//! - [`AccessFlags`] - Class-level access and property flags
//! - [`ClassVersion`] - Major/minor class file format version
//! - [`ClassFileBuilder`] - Writer for minimal, valid class files
//! - [`Parser`] - Bounds-checked big-endian cursor
//!
//! # Examples
//!
//! ```rust
//! use mockloader::classfile::{AccessFlags, ClassFile, ClassFileBuilder};
//!
//! let bytes = ClassFileBuilder::new("com.example.Service")
//!     .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER)
//!     .build();
//!
//! let mut class = ClassFile::parse(bytes)?;
//! assert_eq!(class.name(), "com.example.Service");
//! assert_eq!(class.super_name(), Some("java.lang.Object"));
//!
//! class.set_access_flags(class.access_flags() - AccessFlags::FINAL)?;
//! let reparsed = ClassFile::parse(class.into_bytes())?;
//! assert!(!reparsed.access_flags().contains(AccessFlags::FINAL));
//! # Ok::<(), mockloader::Error>(())
//! ```

mod builder;
pub mod io;
mod parser;

pub use builder::ClassFileBuilder;
pub use parser::Parser;

use std::fmt;

use bitflags::bitflags;

use crate::{classfile::io::write_be_at, Result};

/// Magic number that opens every class file.
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Class-level access and property flags
    pub struct AccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared final; no subclasses allowed
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by invokespecial
        const SUPER = 0x0020;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Declared abstract; must not be instantiated
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Is a module, not a class or interface
        const MODULE = 0x8000;
    }
}

/// Class file format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassVersion {
    /// Major version (52 = Java 8)
    pub major: u16,
    /// Minor version
    pub minor: u16,
}

impl ClassVersion {
    /// Java 8 class files, the default for synthesized classes.
    pub const JAVA_8: ClassVersion = ClassVersion {
        major: 52,
        minor: 0,
    };
}

impl fmt::Display for ClassVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Converts a binary class name (`a.b.C`) into its internal form (`a/b/C`).
#[must_use]
pub fn internal_name(binary_name: &str) -> String {
    binary_name.replace('.', "/")
}

/// Converts an internal class name (`a/b/C`) into its binary form (`a.b.C`).
#[must_use]
pub fn binary_name(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// Returns the resource path under which the class file of `class_name` is stored.
///
/// ```rust
/// assert_eq!(mockloader::classfile::class_resource_path("a.b.C"), "a/b/C.class");
/// ```
#[must_use]
pub fn class_resource_path(class_name: &str) -> String {
    format!("{}.class", internal_name(class_name))
}

/// Mutable, serializable representation of one class file.
///
/// A `ClassFile` is produced by the class pool, handed through every unit of the transformer
/// chain, and finally serialized into the bytes given to the definition primitive. The parsed
/// header is always consistent with the bytes: header setters patch the buffer in place, and
/// wholesale rewrites go through [`ClassFile::replace_bytes`], which parses again.
#[derive(Clone)]
pub struct ClassFile {
    data: Vec<u8>,
    name: String,
    super_name: Option<String>,
    version: ClassVersion,
    access_flags: AccessFlags,
    access_flags_offset: usize,
}

impl ClassFile {
    /// Parses class file bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a bad magic number, unknown constant pool tag,
    /// or dangling constant pool reference, and [`crate::Error::OutOfBounds`] for truncated data.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let header = ClassHeader::read(&data)?;
        Ok(ClassFile {
            data,
            name: header.name,
            super_name: header.super_name,
            version: header.version,
            access_flags: header.access_flags,
            access_flags_offset: header.access_flags_offset,
        })
    }

    /// Parses a copy of `data`.
    ///
    /// # Errors
    /// See [`ClassFile::parse`].
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Self::parse(data.to_vec())
    }

    /// The binary name of the class (`a.b.C`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The binary name of the superclass, `None` only for `java.lang.Object` and modules.
    #[must_use]
    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    /// The class file format version.
    #[must_use]
    pub fn version(&self) -> ClassVersion {
        self.version
    }

    /// The class-level access flags.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    /// Overwrites the class-level access flags.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer no longer holds the flags field.
    pub fn set_access_flags(&mut self, flags: AccessFlags) -> Result<()> {
        let mut offset = self.access_flags_offset;
        write_be_at(&mut self.data, &mut offset, flags.bits())?;
        self.access_flags = flags;
        Ok(())
    }

    /// Overwrites the class file format version.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than the header.
    pub fn set_version(&mut self, version: ClassVersion) -> Result<()> {
        let mut offset = 4;
        write_be_at(&mut self.data, &mut offset, version.minor)?;
        write_be_at(&mut self.data, &mut offset, version.major)?;
        self.version = version;
        Ok(())
    }

    /// Replaces the whole class with new bytes, re-reading the header.
    ///
    /// On error the class keeps its previous bytes.
    ///
    /// # Errors
    /// See [`ClassFile::parse`].
    pub fn replace_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        *self = Self::parse(data)?;
        Ok(())
    }

    /// The serialized class bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Serializes the class into a fresh byte vector.
    #[must_use]
    pub fn to_bytecode(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Consumes the class, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for ClassFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassFile")
            .field("name", &self.name)
            .field("super_name", &self.super_name)
            .field("version", &self.version)
            .field("access_flags", &self.access_flags)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Constant pool slot contents needed to resolve class names.
enum PoolEntry {
    Empty,
    Utf8(String),
    Class(u16),
    Other,
}

struct ClassHeader {
    name: String,
    super_name: Option<String>,
    version: ClassVersion,
    access_flags: AccessFlags,
    access_flags_offset: usize,
}

impl ClassHeader {
    fn read(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        let magic = parser.read_be::<u32>()?;
        if magic != CLASS_MAGIC {
            return Err(malformed_error!("Invalid class file magic - 0x{:08X}", magic));
        }

        let minor = parser.read_be::<u16>()?;
        let major = parser.read_be::<u16>()?;

        let pool = Self::read_constant_pool(&mut parser)?;

        let access_flags_offset = parser.pos();
        let access_flags = AccessFlags::from_bits_retain(parser.read_be::<u16>()?);
        let this_class = parser.read_be::<u16>()?;
        let super_class = parser.read_be::<u16>()?;

        let name = Self::class_name(&pool, this_class)?;
        let super_name = if super_class == 0 {
            None
        } else {
            Some(Self::class_name(&pool, super_class)?)
        };

        Ok(ClassHeader {
            name,
            super_name,
            version: ClassVersion { major, minor },
            access_flags,
            access_flags_offset,
        })
    }

    fn read_constant_pool(parser: &mut Parser<'_>) -> Result<Vec<PoolEntry>> {
        let count = parser.read_be::<u16>()? as usize;
        let mut pool = Vec::with_capacity(count);
        pool.push(PoolEntry::Empty);

        while pool.len() < count {
            let tag = parser.read_be::<u8>()?;
            match tag {
                TAG_UTF8 => pool.push(PoolEntry::Utf8(parser.read_utf8()?)),
                TAG_CLASS => pool.push(PoolEntry::Class(parser.read_be::<u16>()?)),
                TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                    parser.advance_by(2)?;
                    pool.push(PoolEntry::Other);
                }
                TAG_METHOD_HANDLE => {
                    parser.advance_by(3)?;
                    pool.push(PoolEntry::Other);
                }
                TAG_INTEGER
                | TAG_FLOAT
                | TAG_FIELDREF
                | TAG_METHODREF
                | TAG_INTERFACE_METHODREF
                | TAG_NAME_AND_TYPE
                | TAG_DYNAMIC
                | TAG_INVOKE_DYNAMIC => {
                    parser.advance_by(4)?;
                    pool.push(PoolEntry::Other);
                }
                // 8-byte constants occupy two slots
                TAG_LONG | TAG_DOUBLE => {
                    parser.advance_by(8)?;
                    pool.push(PoolEntry::Other);
                    pool.push(PoolEntry::Empty);
                }
                _ => {
                    return Err(malformed_error!(
                        "Unknown constant pool tag {} at entry {}",
                        tag,
                        pool.len()
                    ))
                }
            }
        }

        if pool.len() > count {
            return Err(malformed_error!(
                "8-byte constant overflows constant pool of {} entries",
                count
            ));
        }

        Ok(pool)
    }

    fn class_name(pool: &[PoolEntry], index: u16) -> Result<String> {
        let Some(PoolEntry::Class(name_index)) = pool.get(index as usize) else {
            return Err(malformed_error!(
                "Constant pool entry {} is not a class reference",
                index
            ));
        };
        match pool.get(*name_index as usize) {
            Some(PoolEntry::Utf8(name)) => Ok(binary_name(name)),
            _ => Err(malformed_error!(
                "Class reference {} points to non-UTF8 entry {}",
                index,
                name_index
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn parse_synthesized() {
        let bytes = ClassFileBuilder::new("org.sample.Widget")
            .super_class("org.sample.Base")
            .build();
        let class = ClassFile::parse(bytes).unwrap();

        assert_eq!(class.name(), "org.sample.Widget");
        assert_eq!(class.super_name(), Some("org.sample.Base"));
        assert_eq!(class.version(), ClassVersion::JAVA_8);
        assert_eq!(class.access_flags(), AccessFlags::PUBLIC | AccessFlags::SUPER);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = ClassFileBuilder::new("a.B").build();
        bytes[0] = 0x00;
        assert!(matches!(
            ClassFile::parse(bytes),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated() {
        let bytes = ClassFileBuilder::new("a.B").build();
        let result = ClassFile::from_slice(&bytes[..12]);
        assert!(matches!(result, Err(Error::OutOfBounds)));
    }

    #[test]
    fn unknown_tag() {
        // magic, version, cp_count = 2, tag 99
        let bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2, 99];
        assert!(matches!(
            ClassFile::parse(bytes),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn wide_constants_take_two_slots() {
        // #1 Long, #3 Utf8 "a/B", #4 Class #3
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 5];
        bytes.push(TAG_LONG);
        bytes.extend_from_slice(&[0; 8]);
        bytes.push(TAG_UTF8);
        bytes.extend_from_slice(&[0, 3, b'a', b'/', b'B']);
        bytes.push(TAG_CLASS);
        bytes.extend_from_slice(&[0, 3]);
        // access, this = #4, super = 0, no interfaces/fields/methods/attributes
        bytes.extend_from_slice(&[0, 0x21, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let class = ClassFile::parse(bytes).unwrap();
        assert_eq!(class.name(), "a.B");
        assert_eq!(class.super_name(), None);
    }

    #[test]
    fn dangling_class_reference() {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2];
        bytes.push(TAG_UTF8);
        bytes.extend_from_slice(&[0, 1, b'X']);
        bytes.extend_from_slice(&[0, 0x21, 0, 1, 0, 0]);
        assert!(matches!(
            ClassFile::parse(bytes),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn header_mutation_round_trips() {
        let bytes = ClassFileBuilder::new("a.Final")
            .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
            .build();
        let mut class = ClassFile::parse(bytes).unwrap();

        class.set_access_flags(AccessFlags::PUBLIC).unwrap();
        class
            .set_version(ClassVersion {
                major: 61,
                minor: 0,
            })
            .unwrap();

        let reparsed = ClassFile::parse(class.to_bytecode()).unwrap();
        assert_eq!(reparsed.access_flags(), AccessFlags::PUBLIC);
        assert_eq!(reparsed.version().major, 61);
        assert_eq!(reparsed.name(), "a.Final");
    }

    #[test]
    fn replace_bytes_keeps_old_on_error() {
        let mut class = ClassFile::parse(ClassFileBuilder::new("a.One").build()).unwrap();
        assert!(class.replace_bytes(vec![1, 2, 3]).is_err());
        assert_eq!(class.name(), "a.One");

        class
            .replace_bytes(ClassFileBuilder::new("a.Two").build())
            .unwrap();
        assert_eq!(class.name(), "a.Two");
    }

    #[test]
    fn name_conversions() {
        assert_eq!(internal_name("a.b.C"), "a/b/C");
        assert_eq!(binary_name("a/b/C$D"), "a.b.C$D");
        assert_eq!(class_resource_path("C"), "C.class");
    }
}
