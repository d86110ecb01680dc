//! Per-loader table of defined classes.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    classfile::ClassFile,
    loader::{ClassRef, LoadedClass, LoaderId, ProtectionDomain},
    Error, Result,
};

/// Name → class map guaranteeing each name is defined at most once.
#[derive(Default)]
pub(crate) struct DefinedClasses {
    classes: DashMap<String, ClassRef>,
}

impl DefinedClasses {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, class_name: &str) -> Option<ClassRef> {
        self.classes
            .get(class_name)
            .map(|entry| entry.value().clone())
    }

    pub(crate) fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub(crate) fn len(&self) -> usize {
        self.classes.len()
    }

    /// Defines `class_name` from `len` bytes of `bytes` starting at `offset`.
    ///
    /// The window must fit the buffer, parse as a class file, and describe `class_name`.
    pub(crate) fn define(
        &self,
        loader: LoaderId,
        class_name: &str,
        bytes: &[u8],
        offset: usize,
        len: usize,
        domain: ProtectionDomain,
    ) -> Result<ClassRef> {
        let end = offset.checked_add(len).ok_or(out_of_bounds_error!())?;
        let window = bytes.get(offset..end).ok_or(out_of_bounds_error!())?;

        let class = ClassFile::from_slice(window)?;
        if class.name() != class_name {
            return Err(Error::ClassNameMismatch {
                expected: class_name.to_string(),
                found: class.name().to_string(),
            });
        }

        match self.classes.entry(class_name.to_string()) {
            Entry::Occupied(_) => Err(Error::DuplicateDefinition(class_name.to_string())),
            Entry::Vacant(slot) => {
                let defined = Arc::new(LoadedClass::new(class, loader, domain));
                slot.insert(defined.clone());
                Ok(defined)
            }
        }
    }

    /// Defines a class produced by the loader itself, returning the existing definition if
    /// another caller won the race for the same name.
    pub(crate) fn define_or_get(
        &self,
        loader: LoaderId,
        class: ClassFile,
        domain: ProtectionDomain,
    ) -> ClassRef {
        self.classes
            .entry(class.name().to_string())
            .or_insert_with(|| Arc::new(LoadedClass::new(class, loader, domain)))
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::ClassFileBuilder;

    #[test]
    fn define_window() {
        let table = DefinedClasses::new();
        let class = ClassFileBuilder::new("w.Window").build();
        let mut padded = vec![0xAA; 3];
        padded.extend_from_slice(&class);
        padded.extend_from_slice(&[0xBB; 5]);

        let id = LoaderId::next();
        let defined = table
            .define(id, "w.Window", &padded, 3, class.len(), ProtectionDomain::default())
            .unwrap();
        assert_eq!(defined.bytes(), class.as_slice());
        assert!(table.contains("w.Window"));
        assert_eq!(table.len(), 1);
        assert!(Arc::ptr_eq(&defined, &table.get("w.Window").unwrap()));
    }

    #[test]
    fn define_rejections() {
        let table = DefinedClasses::new();
        let id = LoaderId::next();
        let bytes = ClassFileBuilder::new("r.Real").build();
        let domain = ProtectionDomain::default;

        assert!(matches!(
            table.define(id, "r.Real", &bytes, 1, bytes.len(), domain()),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            table.define(id, "r.Real", &bytes, usize::MAX, 2, domain()),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            table.define(id, "r.Other", &bytes, 0, bytes.len(), domain()),
            Err(Error::ClassNameMismatch { .. })
        ));
        assert!(matches!(
            table.define(id, "r.Real", b"junkjunkjunk", 0, 12, domain()),
            Err(Error::Malformed { .. })
        ));

        table
            .define(id, "r.Real", &bytes, 0, bytes.len(), domain())
            .unwrap();
        assert!(matches!(
            table.define(id, "r.Real", &bytes, 0, bytes.len(), domain()),
            Err(Error::DuplicateDefinition(name)) if name == "r.Real"
        ));
    }

    #[test]
    fn define_or_get_keeps_first() {
        let table = DefinedClasses::new();
        let id = LoaderId::next();
        let parse = || ClassFile::parse(ClassFileBuilder::new("k.First").build()).unwrap();

        let first = table.define_or_get(id, parse(), ProtectionDomain::default());
        let second = table.define_or_get(id, parse(), ProtectionDomain::default());
        assert!(Arc::ptr_eq(&first, &second));
    }
}
