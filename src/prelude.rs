//! # mockloader Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the mockloader library. Import this module to get quick access to everything needed
//! to configure a loader, feed it classes, and resolve them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all mockloader operations
pub use crate::Error;

/// The result type used throughout mockloader
pub use crate::Result;

// ================================================================================================
// Loaders
// ================================================================================================

/// The standard loading surface shared by every loader
pub use crate::loader::ClassLoader;

/// The selective, transforming loader and its configuration
pub use crate::loader::{LoaderConfig, MockClassLoader};

/// The plain loader used as default deferral target
pub use crate::loader::HostClassLoader;

/// Defined classes and their identity
pub use crate::loader::{ClassRef, LoadedClass, LoaderId, ProtectionDomain};

/// Extension hooks
pub use crate::loader::{ClassInterceptor, ClassPathAdjuster, PrefixInterceptor};

/// Resolution counters
pub use crate::loader::StatsSnapshot;

// ================================================================================================
// Policy
// ================================================================================================

/// Ownership decisions and the patterns driving them
pub use crate::policy::{
    DeferralPolicy, LoadDecision, NamePattern, PatternList, MODIFY_ALL_CLASSES,
};

// ================================================================================================
// Class Bytes
// ================================================================================================

/// Class file representation
pub use crate::classfile::{AccessFlags, ClassFile, ClassFileBuilder, ClassVersion};

/// The class-byte pool and its entries
pub use crate::pool::{ByteArrayClassPath, ClassPath, ClassPool, DirClassPath, MemoryClassPath};

// ================================================================================================
// Transformation
// ================================================================================================

/// Transformer units and chains
pub use crate::transform::{
    ClassTransformer, DefinalizeTransformer, TransformContext, TransformerChain,
};

// ================================================================================================
// Resources
// ================================================================================================

/// Resource locations
pub use crate::resource::{EntryId, MergedResources, ResourceIter, ResourceUrl};
