//! The class-byte pool.
//!
//! A [`ClassPool`] maps class names to class bytes by consulting an ordered list of
//! [`ClassPath`] entries: directories of compiled classes, single injected byte arrays, or
//! in-memory collections. Each mock loader owns exactly one pool, so classes injected into
//! one loader's pool are invisible to every other loader.
//!
//! The entry list is append-only. Appending takes `&self`, which lets a class path adjuster
//! extend the pool while the loader is being built and lets the loader register dynamically
//! defined classes later on, without ever reordering or dropping entries.
//!
//! # Key Types
//!
//! - [`ClassPool`] - Ordered, append-only collection of class path entries
//! - [`ClassPath`] - Trait implemented by every entry kind
//! - [`DirClassPath`], [`ByteArrayClassPath`], [`MemoryClassPath`] - Entry kinds
//!
//! # Examples
//!
//! ```rust
//! use mockloader::classfile::ClassFileBuilder;
//! use mockloader::pool::{ByteArrayClassPath, ClassPool};
//!
//! let pool = ClassPool::new();
//! let bytes = ClassFileBuilder::new("my.Generated").build();
//! pool.append_class_path(ByteArrayClassPath::new("my.Generated", &bytes));
//!
//! let class = pool.get("my.Generated")?;
//! assert_eq!(class.name(), "my.Generated");
//! assert!(pool.get("my.Missing").is_err());
//! # Ok::<(), mockloader::Error>(())
//! ```

mod classpath;

pub use classpath::{ByteArrayClassPath, ClassPath, DirClassPath, MemoryClassPath};

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    classfile::{ClassFile, ClassFileBuilder},
    resource::ResourceUrl,
    Error, Result,
};

/// Environment variable holding the system class path.
pub const CLASSPATH_ENV: &str = "CLASSPATH";

/// Ordered, append-only registry of class path entries.
pub struct ClassPool {
    entries: boxcar::Vec<Arc<dyn ClassPath>>,
}

impl ClassPool {
    /// Creates a pool with no entries.
    #[must_use]
    pub fn new() -> Self {
        ClassPool {
            entries: boxcar::Vec::new(),
        }
    }

    /// Creates a pool with one directory entry per path, in order.
    #[must_use]
    pub fn with_directories<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let pool = Self::new();
        for path in paths {
            pool.append_directory(path);
        }
        pool
    }

    /// Creates a pool from the directories listed in the `CLASSPATH` environment variable.
    ///
    /// An unset variable yields an empty pool.
    #[must_use]
    pub fn system() -> Self {
        Self::with_directories(system_class_path())
    }

    /// Appends an entry after every existing one.
    pub fn append_class_path<C: ClassPath + 'static>(&self, entry: C) {
        self.append_shared(Arc::new(entry));
    }

    /// Appends an entry that may also be referenced elsewhere.
    ///
    /// Sharing one entry between two pools is the only way for two loaders to see the
    /// same injected classes.
    pub fn append_shared(&self, entry: Arc<dyn ClassPath>) {
        tracing::trace!(entry = %entry.label(), "appending class path entry");
        self.entries.push(entry);
    }

    /// Appends a directory entry.
    pub fn append_directory<P: AsRef<Path>>(&self, path: P) {
        self.append_class_path(DirClassPath::new(path));
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if the pool has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks `class_name` up in every entry, in order.
    ///
    /// Returns a fresh, independently mutable [`ClassFile`] on every call, or `None` if no
    /// entry holds the class.
    ///
    /// # Errors
    /// Returns an error if the first entry holding the class cannot read it, or if its bytes
    /// are not a valid class file.
    pub fn find(&self, class_name: &str) -> Result<Option<ClassFile>> {
        for (_, entry) in self.entries.iter() {
            match entry.find_class(class_name) {
                Ok(Some(bytes)) => return ClassFile::parse(bytes).map(Some),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        class = class_name,
                        entry = %entry.label(),
                        error = %error,
                        "failed to read class from class path entry"
                    );
                    return Err(error);
                }
            }
        }
        Ok(None)
    }

    /// Looks `class_name` up, failing if no entry holds it.
    ///
    /// # Errors
    /// Returns [`Error::ClassNotFound`] if no entry holds the class, otherwise see
    /// [`ClassPool::find`].
    pub fn get(&self, class_name: &str) -> Result<ClassFile> {
        self.find(class_name)?
            .ok_or_else(|| Error::ClassNotFound(class_name.to_string()))
    }

    /// Returns `true` if some entry holds `class_name`.
    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, entry)| matches!(entry.find_class(class_name), Ok(Some(_))))
    }

    /// Synthesizes an empty public class named `class_name` and registers it in the pool.
    ///
    /// Entries appended earlier still take precedence for the same name.
    ///
    /// # Errors
    /// Returns an error if the synthesized bytes cannot be parsed back.
    pub fn make_class(&self, class_name: &str) -> Result<ClassFile> {
        let bytes = ClassFileBuilder::new(class_name).build();
        self.append_class_path(ByteArrayClassPath::new(class_name, &bytes));
        ClassFile::parse(bytes)
    }

    /// Returns the first entry's location for the resource at `path`.
    #[must_use]
    pub fn find_resource(&self, path: &str) -> Option<ResourceUrl> {
        self.entries
            .iter()
            .find_map(|(_, entry)| entry.find_resource(path))
    }

    /// Returns every entry's location for the resource at `path`, in entry order.
    ///
    /// Aliases of the same file held by two entries are both returned; merging callers
    /// de-duplicate.
    #[must_use]
    pub fn find_resources(&self, path: &str) -> Vec<ResourceUrl> {
        self.entries
            .iter()
            .filter_map(|(_, entry)| entry.find_resource(path))
            .collect()
    }
}

impl Default for ClassPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.entries.iter().map(|(_, e)| e.label()).collect();
        f.debug_struct("ClassPool").field("entries", &labels).finish()
    }
}

/// Splits the `CLASSPATH` environment variable into directories.
#[must_use]
pub fn system_class_path() -> Vec<PathBuf> {
    std::env::var_os(CLASSPATH_ENV)
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|path| !path.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::write_class;

    #[test]
    fn first_entry_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_class(first.path(), "a.A", "a.First");
        write_class(second.path(), "a.A", "a.Second");

        let pool = ClassPool::with_directories([first.path(), second.path()]);
        assert_eq!(pool.len(), 2);

        let class = pool.get("a.A").unwrap();
        assert_eq!(class.super_name(), Some("a.First"));
    }

    #[test]
    fn missing_class() {
        let pool = ClassPool::new();
        assert!(pool.is_empty());
        assert!(matches!(pool.get("no.Such"), Err(Error::ClassNotFound(n)) if n == "no.Such"));
        assert!(!pool.contains("no.Such"));
    }

    #[test]
    fn malformed_bytes_surface() {
        let pool = ClassPool::new();
        pool.append_class_path(ByteArrayClassPath::new("bad.Class", b"not a class"));
        assert!(pool.contains("bad.Class"));
        assert!(matches!(pool.get("bad.Class"), Err(Error::Malformed { .. })));
    }

    #[test]
    fn each_lookup_is_independent() {
        let pool = ClassPool::new();
        pool.make_class("gen.Thing").unwrap();

        let mut first = pool.get("gen.Thing").unwrap();
        first
            .set_access_flags(crate::classfile::AccessFlags::empty())
            .unwrap();

        let second = pool.get("gen.Thing").unwrap();
        assert!(!second.access_flags().is_empty());
    }

    #[test]
    fn shared_entry_visible_in_both_pools() {
        let shared: Arc<dyn ClassPath> = Arc::new(MemoryClassPath::new("shared"));
        let a = ClassPool::new();
        let b = ClassPool::new();
        a.append_shared(shared.clone());
        b.append_shared(shared);

        let holder = MemoryClassPath::new("late");
        holder.insert_class("x.Late", &ClassFileBuilder::new("x.Late").build());
        a.append_class_path(holder);

        assert!(a.contains("x.Late"));
        assert!(!b.contains("x.Late"));
    }

    #[test]
    fn resources_in_entry_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("r.txt"), b"1").unwrap();
        std::fs::write(second.path().join("r.txt"), b"2").unwrap();

        let pool = ClassPool::with_directories([first.path(), second.path()]);
        let all = pool.find_resources("r.txt");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].read().unwrap(), b"1");
        assert_eq!(pool.find_resource("r.txt").unwrap(), all[0]);
        assert!(pool.find_resource("absent.txt").is_none());
    }
}
