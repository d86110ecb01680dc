//! Resource locations and duplicate-free resource merging.
//!
//! Loaders answer resource lookups (non-class files such as configuration or fixture data)
//! with [`ResourceUrl`] values. A mock loader must merge the answers of its own storage with
//! those of the loader it defers to, and the same underlying file is frequently reachable
//! through both, possibly under different aliases (a prefixed search root, a symlink, a path
//! containing `..`). File locations are therefore canonicalized when they are created, so two
//! aliases of one file compare equal, and [`MergedResources`] drops every location it has
//! already yielded. In-memory locations are equal only when they come from the same class path
//! entry, whatever the entries' labels.
//!
//! # Key Types
//!
//! - [`ResourceUrl`] - Location of one resource, on disk or in memory
//! - [`EntryId`] - Identity of the in-memory class path entry holding a resource
//! - [`ResourceIter`] - Boxed, lazy, finite, non-restartable sequence of locations
//! - [`MergedResources`] - Order-preserving, de-duplicating concatenation of sequences

use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::Result;

/// A lazy sequence of resource locations.
///
/// The sequence is finite and consumed once; looking a resource up again produces a new one.
pub type ResourceIter<'a> = Box<dyn Iterator<Item = ResourceUrl> + 'a>;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an in-memory class path entry.
///
/// Clones of an entry, and an entry shared between pools, keep their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        EntryId(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identity value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Location of a resource.
///
/// Equality and hashing follow the location only: a file is identified by its canonical path,
/// an in-memory resource by the [`EntryId`] of the entry that holds it and its path.
#[derive(Clone)]
pub enum ResourceUrl {
    /// A file on disk, identified by its canonical path.
    File(PathBuf),
    /// A resource held in memory by a class path entry.
    Memory {
        /// Identity of the class path entry holding the resource
        entry: EntryId,
        /// Label of the class path entry holding the resource
        origin: Arc<str>,
        /// Resource path within that entry
        path: String,
        /// Resource contents
        data: Arc<[u8]>,
    },
}

impl ResourceUrl {
    /// Creates a file location, canonicalizing `path`.
    ///
    /// Returns `None` if `path` does not name an existing regular file.
    #[must_use]
    pub fn file(path: &Path) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        path.canonicalize().ok().map(ResourceUrl::File)
    }

    /// Creates an in-memory location.
    #[must_use]
    pub fn memory(entry: EntryId, origin: Arc<str>, path: &str, data: Arc<[u8]>) -> Self {
        ResourceUrl::Memory {
            entry,
            origin,
            path: path.to_string(),
            data,
        }
    }

    /// The path component of the location.
    ///
    /// For files this is the canonical filesystem path; for in-memory resources it is the
    /// resource path inside the holding entry.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            ResourceUrl::File(path) => path.to_string_lossy().into_owned(),
            ResourceUrl::Memory { path, .. } => path.clone(),
        }
    }

    /// Returns `true` if the location's path ends with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.path().ends_with(suffix)
    }

    /// Reads the resource contents.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if a file resource cannot be read.
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            ResourceUrl::File(path) => Ok(std::fs::read(path)?),
            ResourceUrl::Memory { data, .. } => Ok(data.to_vec()),
        }
    }
}

impl PartialEq for ResourceUrl {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResourceUrl::File(a), ResourceUrl::File(b)) => a == b,
            (
                ResourceUrl::Memory {
                    entry: entry_a,
                    path: path_a,
                    ..
                },
                ResourceUrl::Memory {
                    entry: entry_b,
                    path: path_b,
                    ..
                },
            ) => entry_a == entry_b && path_a == path_b,
            _ => false,
        }
    }
}

impl Eq for ResourceUrl {}

impl Hash for ResourceUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ResourceUrl::File(path) => {
                0_u8.hash(state);
                path.hash(state);
            }
            ResourceUrl::Memory { entry, path, .. } => {
                1_u8.hash(state);
                entry.hash(state);
                path.hash(state);
            }
        }
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceUrl::File(path) => write!(f, "file:{}", path.display()),
            ResourceUrl::Memory { origin, path, .. } => write!(f, "memory:{origin}!/{path}"),
        }
    }
}

impl fmt::Debug for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceUrl({self})")
    }
}

/// Concatenation of resource sequences that yields every location at most once.
///
/// Sources are drained in the order they were given; within a source, order is preserved.
/// A source is only pulled from once every earlier source is exhausted, so lookups in later
/// sources happen lazily.
pub struct MergedResources<'a> {
    sources: std::collections::VecDeque<ResourceIter<'a>>,
    seen: HashSet<ResourceUrl>,
}

impl<'a> MergedResources<'a> {
    /// Creates an empty merge.
    #[must_use]
    pub fn new() -> Self {
        MergedResources {
            sources: std::collections::VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Appends a source whose locations follow those of every earlier source.
    #[must_use]
    pub fn chain(mut self, source: ResourceIter<'a>) -> Self {
        self.sources.push_back(source);
        self
    }
}

impl Default for MergedResources<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for MergedResources<'_> {
    type Item = ResourceUrl;

    fn next(&mut self) -> Option<ResourceUrl> {
        loop {
            let source = self.sources.front_mut()?;
            match source.next() {
                Some(url) => {
                    if self.seen.insert(url.clone()) {
                        return Some(url);
                    }
                }
                None => {
                    self.sources.pop_front();
                }
            }
        }
    }
}
