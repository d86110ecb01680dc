//! Class loaders.
//!
//! This module contains the selective loading engine. A [`MockClassLoader`] resolves every
//! class name it is asked for by consulting its [`crate::policy::DeferralPolicy`]: classes it
//! owns are read from its private [`crate::pool::ClassPool`], run through its
//! [`crate::transform::TransformerChain`] and defined in its own namespace, every other class
//! is forwarded unchanged to a deferred loader. Resource lookups are answered from both places
//! and merged without duplicates.
//!
//! # Architecture
//!
//! ```text
//!   load_class(name)
//!        │
//!        ├── defined before? ─────────────────────────────► cached ClassRef
//!        │
//!   find_class(name)
//!        │
//!        ├── interceptor claims it? ──────────────────────► interceptor result
//!        │
//!        ├── policy: Modify ─────► pool ─► chain ─► define ► ClassRef
//!        ├── policy: LoadUnmodified ► pool ─────────► define ► ClassRef
//!        └── policy: Defer ──────► deferred loader ────────► its ClassRef
//! ```
//!
//! Every decision is one-shot: a class the policy assigns to this loader and that the pool
//! cannot provide fails with [`crate::Error::ClassNotFound`], it is never retried through the
//! deferred loader, and a class the deferred loader cannot find is never looked for locally.
//!
//! # Key Types
//!
//! - [`ClassLoader`] - The standard loading surface shared by every loader
//! - [`MockClassLoader`] - The selective, transforming loader
//! - [`HostClassLoader`] - Plain loader used as the default deferral target
//! - [`LoadedClass`] / [`ClassRef`] - A defined class and the shared handle to it
//! - [`LoaderConfig`] - Construction-time configuration
//! - [`ClassPathAdjuster`] - Hook extending the pool while the loader is built
//! - [`ClassInterceptor`] - Hook resolving specific names ahead of the policy
//!
//! # Identity
//!
//! A class is identified by its name *and* its defining loader. Each definition produces a
//! new [`LoadedClass`] behind an `Arc`, and [`ClassRef`]s are compared with [`Arc::ptr_eq`],
//! so the same class name defined by two loaders yields two distinct classes.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use mockloader::prelude::*;
//!
//! let adjuster = |pool: &ClassPool| -> mockloader::Result<()> {
//!     pool.make_class("com.example.Target")?;
//!     Ok(())
//! };
//! let mut loader = MockClassLoader::new(
//!     LoaderConfig::new()
//!         .prepare("com.example.Target")
//!         .adjuster(Arc::new(adjuster)),
//! )?;
//! loader.set_transformer_chain(TransformerChain::new().with(DefinalizeTransformer));
//!
//! let first = loader.load_class("com.example.Target")?;
//! let second = loader.load_class("com.example.Target")?;
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(first.loader(), loader.id());
//! # Ok::<(), mockloader::Error>(())
//! ```

mod adjuster;
mod config;
mod host;
mod intercept;
mod mock;
mod stats;
mod table;

pub use adjuster::ClassPathAdjuster;
pub use config::LoaderConfig;
pub use host::HostClassLoader;
pub use intercept::{ClassInterceptor, PrefixInterceptor};
pub use mock::MockClassLoader;
pub use stats::{LoaderStats, StatsSnapshot};

pub(crate) use table::DefinedClasses;

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use sha1::{Digest, Sha1};

use crate::{
    classfile::{AccessFlags, ClassFile},
    resource::{ResourceIter, ResourceUrl},
    Result,
};

/// Shared handle to a defined class.
///
/// Two handles denote the same class exactly when [`Arc::ptr_eq`] holds.
pub type ClassRef = Arc<LoadedClass>;

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loader instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

impl LoaderId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identity value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

/// Security context a class is defined under.
///
/// The engine does not enforce anything based on the domain; it records it with every
/// definition so callers can tell where a class was claimed to come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProtectionDomain {
    code_source: Option<String>,
}

impl ProtectionDomain {
    /// A domain attributed to `code_source` (a path, URL or label).
    #[must_use]
    pub fn with_code_source(code_source: &str) -> Self {
        ProtectionDomain {
            code_source: Some(code_source.to_string()),
        }
    }

    /// Where the class code claims to come from, if known.
    #[must_use]
    pub fn code_source(&self) -> Option<&str> {
        self.code_source.as_deref()
    }
}

/// A class defined by some loader.
pub struct LoadedClass {
    name: String,
    super_name: Option<String>,
    access_flags: AccessFlags,
    bytes: Vec<u8>,
    loader: LoaderId,
    domain: ProtectionDomain,
    fingerprint: [u8; 20],
}

impl LoadedClass {
    pub(crate) fn new(class: ClassFile, loader: LoaderId, domain: ProtectionDomain) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(class.bytes());
        let mut fingerprint = [0_u8; 20];
        fingerprint.copy_from_slice(hasher.finalize().as_slice());

        LoadedClass {
            name: class.name().to_string(),
            super_name: class.super_name().map(str::to_string),
            access_flags: class.access_flags(),
            bytes: class.into_bytes(),
            loader,
            domain,
            fingerprint,
        }
    }

    /// The binary class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The binary name of the superclass.
    #[must_use]
    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    /// The class-level access flags as defined.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    /// The exact bytes the class was defined from.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The defining loader.
    #[must_use]
    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    /// The protection domain the class was defined under.
    #[must_use]
    pub fn protection_domain(&self) -> &ProtectionDomain {
        &self.domain
    }

    /// SHA-1 digest of the defined bytes.
    ///
    /// Equal fingerprints from two loaders mean the same bytes were defined twice, which is
    /// how a caller can tell a transformed class from an untouched copy.
    #[must_use]
    pub fn fingerprint(&self) -> &[u8; 20] {
        &self.fingerprint
    }

    /// The fingerprint as lowercase hex.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for LoadedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedClass")
            .field("name", &self.name)
            .field("loader", &self.loader)
            .field("access_flags", &self.access_flags)
            .field("len", &self.bytes.len())
            .field("fingerprint", &self.fingerprint_hex())
            .finish()
    }
}

/// The standard loading surface.
///
/// Implemented by [`MockClassLoader`] and [`HostClassLoader`], and by anything a caller wants
/// to install as a mock loader's deferred loader.
pub trait ClassLoader: Send + Sync {
    /// The identity of this loader.
    fn id(&self) -> LoaderId;

    /// Resolves `class_name` to a defined class.
    ///
    /// # Errors
    /// Returns [`crate::Error::ClassNotFound`] if the class cannot be resolved, or whatever
    /// error prevented its definition.
    fn load_class(&self, class_name: &str) -> Result<ClassRef>;

    /// Returns the first location of the resource at `path`.
    fn resource(&self, path: &str) -> Option<ResourceUrl>;

    /// Returns every location of the resource at `path`.
    fn resources(&self, path: &str) -> ResourceIter<'_>;
}
