// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # mockloader
//!
//! A selective class-loading and transformation engine for testing already compiled JVM
//! programs. Instead of changing how code is compiled, `mockloader` controls how classes are
//! loaded: a [`MockClassLoader`] decides, per class name, whether to load the class itself and
//! rewrite it through a chain of transformers, or to defer the class entirely to another
//! loader. Static methods, final classes, constructors and static initializers become
//! interceptable because the loader owns the bytes that define them.
//!
//! ## Features
//!
//! - **🎯 Pattern-based ownership** - Exact, package and wildcard patterns with a protected,
//!   built-in ignore set that even blanket modification cannot override
//! - **🔗 Ordered transformer chains** - Caller-supplied units applied in order, with failures
//!   naming the unit that rejected a class
//! - **🧊 Per-loader isolation** - Every loader owns its class pool and defined classes, so
//!   two tests never observe each other's rewritten classes
//! - **📦 Resource merging** - Lookups answered from the loader's own storage and its deferred
//!   loader, with aliases of one file reported once
//! - **🪝 Extension hooks** - Class path adjusters extend the pool at construction,
//!   interceptors claim names ahead of the policy
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use mockloader::prelude::*;
//!
//! // Inject a class that exists only in this loader's pool
//! let adjuster = |pool: &ClassPool| -> mockloader::Result<()> {
//!     let bytes = ClassFileBuilder::new("com.example.Target")
//!         .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
//!         .build();
//!     pool.append_class_path(ByteArrayClassPath::new("com.example.Target", &bytes));
//!     Ok(())
//! };
//!
//! let mut loader = MockClassLoader::new(
//!     LoaderConfig::new()
//!         .prepare("com.example.Target")
//!         .adjuster(Arc::new(adjuster)),
//! )?;
//! loader.set_transformer_chain(TransformerChain::new().with(DefinalizeTransformer));
//!
//! let class = loader.load_class("com.example.Target")?;
//! assert!(!class.access_flags().contains(AccessFlags::FINAL));
//! assert_eq!(class.loader(), loader.id());
//! # Ok::<(), mockloader::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`classfile`] - Class-byte intermediate representation
//! - [`pool`] - The per-loader class-byte pool and its class path entries
//! - [`policy`] - Name patterns and the deferral policy
//! - [`transform`] - Transformer units and chains
//! - [`loader`] - Mock, host and deferred loaders
//! - [`resource`] - Resource locations and merging
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! `mockloader` emits structured events through [`tracing`]: one `debug` event per resolution
//! outcome carrying `class` and `loader` fields, `trace` events per transformer unit, and
//! `info` events when loaders are built. No subscriber is installed by the library.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Nothing is retried and no failure
//! switches a class to another loading strategy:
//!
//! ```rust
//! use mockloader::{ClassLoader, Error, LoaderConfig, MockClassLoader};
//!
//! let loader = MockClassLoader::new(LoaderConfig::new().prepare("com.example.Absent"))?;
//! match loader.load_class("com.example.Absent") {
//!     Err(Error::ClassNotFound(name)) => println!("not found: {name}"),
//!     Err(Error::Transformation { transformer, .. }) => println!("{transformer} failed"),
//!     Err(e) => println!("other error: {e}"),
//!     Ok(class) => println!("loaded {}", class.name()),
//! }
//! # Ok::<(), mockloader::Error>(())
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench loader
//! cargo +nightly fuzz run classfile --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use mockloader::prelude::*;
///
/// let loader = MockClassLoader::new(LoaderConfig::new().prepare("app.Service"))?;
/// assert!(loader.should_modify("app.Service"));
/// # Ok::<(), mockloader::Error>(())
/// ```
pub mod prelude;

/// Class-byte intermediate representation.
///
/// # Key Types
///
/// - [`classfile::ClassFile`] - Parsed, mutable, serializable class bytes
/// - [`classfile::ClassFileBuilder`] - Writer for minimal valid classes
/// - [`classfile::AccessFlags`] - Class access flags
pub mod classfile;

/// The class-byte pool consulted for every class a mock loader owns.
pub mod pool;

/// Name patterns and the deferral policy deciding who owns a class.
pub mod policy;

/// Transformer units and the ordered chain applying them.
pub mod transform;

/// Class loaders: the selective mock loader, the host loader and their hooks.
pub mod loader;

/// Resource locations and duplicate-free merging.
pub mod resource;

/// `mockloader` Result type
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

pub use classfile::{ClassFile, Parser};

pub use loader::{
    ClassLoader, ClassRef, HostClassLoader, LoadedClass, LoaderConfig, LoaderId,
    MockClassLoader,
};

pub use policy::{DeferralPolicy, LoadDecision};

pub use pool::ClassPool;

pub use transform::{ClassTransformer, TransformerChain};
