//! Class path entries consulted by a [`crate::pool::ClassPool`].

use std::{
    fmt,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    classfile::class_resource_path,
    resource::{EntryId, ResourceUrl},
    Result,
};

/// A source of class bytes and resources.
///
/// Entries are consulted in the order they were appended to the pool; the first entry that
/// knows a class wins. Implementations must be cheap to query for names they do not hold.
pub trait ClassPath: Send + Sync {
    /// Short label used in logs and in-memory resource locations.
    fn label(&self) -> String;

    /// Returns the bytes of `class_name`, or `None` if this entry does not hold it.
    ///
    /// # Errors
    /// Returns an error if the entry holds the class but cannot read it.
    fn find_class(&self, class_name: &str) -> Result<Option<Vec<u8>>>;

    /// Returns the location of the resource at `path`, if this entry holds it.
    fn find_resource(&self, path: &str) -> Option<ResourceUrl>;
}

/// Class path entry backed by a directory tree.
///
/// Class `a.b.C` is read from `<root>/a/b/C.class`; resource `x/y.txt` is found at
/// `<root>/x/y.txt`. Names and paths that would resolve outside the root (absolute paths,
/// `..` segments, empty segments) are never found.
#[derive(Debug, Clone)]
pub struct DirClassPath {
    root: PathBuf,
}

impl DirClassPath {
    /// Creates an entry rooted at `root`. The directory need not exist yet.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirClassPath {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory this entry reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `relative` onto the root if every component of it is a plain name.
    fn confined(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let mut components = relative.components().peekable();
        components.peek()?;
        if components.all(|component| matches!(component, Component::Normal(_))) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

impl ClassPath for DirClassPath {
    fn label(&self) -> String {
        self.root.display().to_string()
    }

    fn find_class(&self, class_name: &str) -> Result<Option<Vec<u8>>> {
        if class_name.contains(['/', '\\']) || class_name.split('.').any(str::is_empty) {
            return Ok(None);
        }
        let Some(path) = self.confined(&class_resource_path(class_name)) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn find_resource(&self, path: &str) -> Option<ResourceUrl> {
        let relative = path.trim_start_matches('/');
        ResourceUrl::file(&self.confined(relative)?)
    }
}

/// Class path entry holding exactly one class.
///
/// This is the entry a class path adjuster typically appends to make a dynamically
/// generated class resolvable by the pool.
#[derive(Clone)]
pub struct ByteArrayClassPath {
    id: EntryId,
    class_name: String,
    bytes: Arc<[u8]>,
    label: Arc<str>,
}

impl ByteArrayClassPath {
    /// Creates an entry serving `bytes` as the class file of `class_name`.
    #[must_use]
    pub fn new(class_name: &str, bytes: &[u8]) -> Self {
        ByteArrayClassPath {
            id: EntryId::next(),
            class_name: class_name.to_string(),
            bytes: Arc::from(bytes),
            label: Arc::from(format!("bytes:{class_name}")),
        }
    }
}

impl fmt::Debug for ByteArrayClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteArrayClassPath")
            .field("class_name", &self.class_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ClassPath for ByteArrayClassPath {
    fn label(&self) -> String {
        self.label.to_string()
    }

    fn find_class(&self, class_name: &str) -> Result<Option<Vec<u8>>> {
        if class_name == self.class_name {
            Ok(Some(self.bytes.to_vec()))
        } else {
            Ok(None)
        }
    }

    fn find_resource(&self, path: &str) -> Option<ResourceUrl> {
        let path = path.trim_start_matches('/');
        if path == class_resource_path(&self.class_name) {
            Some(ResourceUrl::memory(
                self.id,
                self.label.clone(),
                path,
                self.bytes.clone(),
            ))
        } else {
            None
        }
    }
}

/// Class path entry holding any number of classes and resources in memory.
///
/// Insertion takes `&self`, so an entry already appended to a pool can keep receiving
/// classes and resources for the pool's lifetime.
pub struct MemoryClassPath {
    id: EntryId,
    label: Arc<str>,
    classes: DashMap<String, Arc<[u8]>>,
    resources: DashMap<String, Arc<[u8]>>,
}

impl MemoryClassPath {
    /// Creates an empty entry.
    #[must_use]
    pub fn new(label: &str) -> Self {
        MemoryClassPath {
            id: EntryId::next(),
            label: Arc::from(label),
            classes: DashMap::new(),
            resources: DashMap::new(),
        }
    }

    /// Registers (or replaces) the class file of `class_name`.
    pub fn insert_class(&self, class_name: &str, bytes: &[u8]) {
        self.classes
            .insert(class_name.to_string(), Arc::from(bytes));
    }

    /// Registers (or replaces) the resource at `path`.
    pub fn insert_resource(&self, path: &str, bytes: &[u8]) {
        self.resources.insert(
            path.trim_start_matches('/').to_string(),
            Arc::from(bytes),
        );
    }

    /// Number of classes held.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl fmt::Debug for MemoryClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryClassPath")
            .field("label", &self.label)
            .field("classes", &self.classes.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

impl ClassPath for MemoryClassPath {
    fn label(&self) -> String {
        self.label.to_string()
    }

    fn find_class(&self, class_name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.classes.get(class_name).map(|bytes| bytes.to_vec()))
    }

    fn find_resource(&self, path: &str) -> Option<ResourceUrl> {
        let path = path.trim_start_matches('/');
        if let Some(data) = self.resources.get(path) {
            return Some(ResourceUrl::memory(
                self.id,
                self.label.clone(),
                path,
                data.value().clone(),
            ));
        }

        // Class files held here are resources too
        let class_name = path.strip_suffix(".class")?.replace('/', ".");
        self.classes.get(&class_name).map(|data| {
            ResourceUrl::memory(self.id, self.label.clone(), path, data.value().clone())
        })
    }
}
