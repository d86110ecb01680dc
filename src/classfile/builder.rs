//! Writer for minimal class files.

use crate::classfile::{internal_name, AccessFlags, ClassVersion, CLASS_MAGIC, TAG_CLASS, TAG_UTF8};

/// Builder producing the bytes of a minimal, structurally valid class file.
///
/// The generated class has no fields, methods or attributes; only its name, superclass,
/// access flags and version are configurable. This is what a class pool needs to synthesize
/// classes at runtime, and what tests need to feed the loader real class bytes.
///
/// # Examples
///
/// ```rust
/// use mockloader::classfile::{ClassFile, ClassFileBuilder};
///
/// let bytes = ClassFileBuilder::new("my.ABCTestClass").build();
/// assert_eq!(ClassFile::parse(bytes)?.name(), "my.ABCTestClass");
/// # Ok::<(), mockloader::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_class: String,
    access_flags: AccessFlags,
    version: ClassVersion,
}

impl ClassFileBuilder {
    /// Starts a public class named `name` extending `java.lang.Object`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassFileBuilder {
            name: name.to_string(),
            super_class: "java.lang.Object".to_string(),
            access_flags: AccessFlags::PUBLIC | AccessFlags::SUPER,
            version: ClassVersion::JAVA_8,
        }
    }

    /// Sets the superclass.
    #[must_use]
    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = name.to_string();
        self
    }

    /// Sets the class access flags.
    #[must_use]
    pub fn access_flags(mut self, flags: AccessFlags) -> Self {
        self.access_flags = flags;
        self
    }

    /// Sets the class file version.
    #[must_use]
    pub fn version(mut self, version: ClassVersion) -> Self {
        self.version = version;
        self
    }

    /// Writes the class file.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let this_name = internal_name(&self.name);
        let super_name = internal_name(&self.super_class);

        let mut out = Vec::with_capacity(32 + this_name.len() + super_name.len());
        out.extend_from_slice(&CLASS_MAGIC.to_be_bytes());
        out.extend_from_slice(&self.version.minor.to_be_bytes());
        out.extend_from_slice(&self.version.major.to_be_bytes());

        // #1 Utf8 this, #2 Class #1, #3 Utf8 super, #4 Class #3
        out.extend_from_slice(&5_u16.to_be_bytes());
        Self::write_utf8(&mut out, &this_name);
        out.push(TAG_CLASS);
        out.extend_from_slice(&1_u16.to_be_bytes());
        Self::write_utf8(&mut out, &super_name);
        out.push(TAG_CLASS);
        out.extend_from_slice(&3_u16.to_be_bytes());

        out.extend_from_slice(&self.access_flags.bits().to_be_bytes());
        out.extend_from_slice(&2_u16.to_be_bytes());
        out.extend_from_slice(&4_u16.to_be_bytes());

        // interfaces, fields, methods, attributes
        out.extend_from_slice(&[0; 8]);
        out
    }

    fn write_utf8(out: &mut Vec<u8>, value: &str) {
        let bytes = value.as_bytes();
        let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
        out.push(TAG_UTF8);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&bytes[..len as usize]);
    }
}
