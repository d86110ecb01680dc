//! The plain, non-transforming loader.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    loader::{ClassLoader, ClassRef, DefinedClasses, LoaderId, ProtectionDomain},
    pool::ClassPool,
    resource::{ResourceIter, ResourceUrl},
    Error, Result,
};

static AMBIENT: OnceLock<Arc<HostClassLoader>> = OnceLock::new();

/// Loader that defines every class it can find, unmodified.
///
/// This is the default deferral target of a [`crate::loader::MockClassLoader`], standing in
/// for the loader that started the process. It resolves names from its own pool, caches
/// every definition, and answers resource lookups from the same pool.
pub struct HostClassLoader {
    id: LoaderId,
    pool: ClassPool,
    classes: DefinedClasses,
    domain: ProtectionDomain,
}

impl HostClassLoader {
    /// Creates a loader over `pool`.
    #[must_use]
    pub fn new(pool: ClassPool) -> Self {
        HostClassLoader {
            id: LoaderId::next(),
            pool,
            classes: DefinedClasses::new(),
            domain: ProtectionDomain::default(),
        }
    }

    /// The process-wide loader built from the `CLASSPATH` environment variable.
    ///
    /// Built on first use; later changes to the variable are not observed.
    #[must_use]
    pub fn ambient() -> Arc<HostClassLoader> {
        AMBIENT
            .get_or_init(|| {
                let loader = HostClassLoader::new(ClassPool::system());
                tracing::info!(
                    loader = %loader.id,
                    entries = loader.pool.len(),
                    "ambient host loader initialized"
                );
                Arc::new(loader)
            })
            .clone()
    }

    /// The pool this loader resolves from.
    #[must_use]
    pub fn pool(&self) -> &ClassPool {
        &self.pool
    }

    /// Number of classes defined so far.
    #[must_use]
    pub fn defined_count(&self) -> usize {
        self.classes.len()
    }

    /// Defines `class_name` from `len` bytes of `bytes` starting at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the window exceeds `bytes`, [`Error::Malformed`] if
    /// it is not a class file, [`Error::ClassNameMismatch`] if it describes another class,
    /// and [`Error::DuplicateDefinition`] if `class_name` is already defined here.
    pub fn define_class(
        &self,
        class_name: &str,
        bytes: &[u8],
        offset: usize,
        len: usize,
        domain: ProtectionDomain,
    ) -> Result<ClassRef> {
        self.classes
            .define(self.id, class_name, bytes, offset, len, domain)
    }
}

impl ClassLoader for HostClassLoader {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn load_class(&self, class_name: &str) -> Result<ClassRef> {
        if let Some(class) = self.classes.get(class_name) {
            return Ok(class);
        }

        let Some(class) = self.pool.find(class_name)? else {
            return Err(Error::ClassNotFound(class_name.to_string()));
        };
        if class.name() != class_name {
            return Err(Error::ClassNameMismatch {
                expected: class_name.to_string(),
                found: class.name().to_string(),
            });
        }

        tracing::debug!(class = class_name, loader = %self.id, "host loader defined class");
        Ok(self
            .classes
            .define_or_get(self.id, class, self.domain.clone()))
    }

    fn resource(&self, path: &str) -> Option<ResourceUrl> {
        self.pool.find_resource(path)
    }

    fn resources(&self, path: &str) -> ResourceIter<'_> {
        Box::new(self.pool.find_resources(path).into_iter())
    }
}

impl fmt::Debug for HostClassLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClassLoader")
            .field("id", &self.id)
            .field("pool", &self.pool)
            .field("defined", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classfile::ClassFileBuilder, pool::ByteArrayClassPath};

    #[test]
    fn loads_and_caches() {
        let pool = ClassPool::new();
        pool.make_class("h.Hosted").unwrap();
        let host = HostClassLoader::new(pool);

        let first = host.load_class("h.Hosted").unwrap();
        let second = host.load_class("h.Hosted").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.loader(), host.id());
        assert_eq!(host.defined_count(), 1);
    }

    #[test]
    fn missing_and_mismatched() {
        let pool = ClassPool::new();
        let bytes = ClassFileBuilder::new("h.Actual").build();
        pool.append_class_path(ByteArrayClassPath::new("h.Claimed", &bytes));
        let host = HostClassLoader::new(pool);

        assert!(matches!(
            host.load_class("h.Nope"),
            Err(Error::ClassNotFound(_))
        ));
        assert!(matches!(
            host.load_class("h.Claimed"),
            Err(Error::ClassNameMismatch { .. })
        ));
    }

    #[test]
    fn predefined_class_is_served() {
        let host = HostClassLoader::new(ClassPool::new());
        let bytes = ClassFileBuilder::new("h.Pre").build();
        let domain = ProtectionDomain::with_code_source("test");

        let defined = host
            .define_class("h.Pre", &bytes, 0, bytes.len(), domain.clone())
            .unwrap();
        let loaded = host.load_class("h.Pre").unwrap();
        assert!(Arc::ptr_eq(&defined, &loaded));
        assert_eq!(loaded.protection_domain(), &domain);
        assert!(matches!(
            host.define_class("h.Pre", &bytes, 0, bytes.len(), domain),
            Err(Error::DuplicateDefinition(_))
        ));
    }

    #[test]
    fn ambient_is_shared() {
        let a = HostClassLoader::ambient();
        let b = HostClassLoader::ambient();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
