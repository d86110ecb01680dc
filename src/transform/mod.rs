//! Transformer units and the ordered chain that applies them.
//!
//! A mock loader rewrites every class it owns under a MODIFY decision by running it through
//! its [`TransformerChain`]. The chain is an ordered list of [`ClassTransformer`] units; each
//! unit receives the [`ClassFile`] produced by the previous one and returns a possibly
//! modified class. The order is exactly the order the caller supplied, and an empty chain
//! passes classes through untouched.
//!
//! Units are opaque to the loader. What they rewrite (method bodies, static initializers,
//! finality) is their own business; the loader only guarantees that each unit sees the
//! class once per definition, with a [`TransformContext`] describing the load.
//!
//! # Key Types
//!
//! - [`ClassTransformer`] - One transformation unit
//! - [`TransformerChain`] - Ordered, owned sequence of units
//! - [`TransformContext`] - Per-load information handed to every unit
//! - [`DefinalizeTransformer`] - Unit clearing the `final` flag so classes can be subclassed
//!
//! # Examples
//!
//! ```rust
//! use mockloader::classfile::{AccessFlags, ClassFile, ClassFileBuilder};
//! use mockloader::transform::{DefinalizeTransformer, TransformContext, TransformerChain};
//! use mockloader::loader::LoaderId;
//!
//! let chain = TransformerChain::new().with(DefinalizeTransformer);
//! let class = ClassFile::parse(
//!     ClassFileBuilder::new("app.Sealed")
//!         .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
//!         .build(),
//! )?;
//!
//! let ctx = TransformContext::new("app.Sealed", LoaderId::next(), false);
//! let rewritten = chain.apply(class, &ctx)?;
//! assert!(!rewritten.access_flags().contains(AccessFlags::FINAL));
//! # Ok::<(), mockloader::Error>(())
//! ```

mod definalize;

pub use definalize::DefinalizeTransformer;

use std::{fmt, sync::Arc};

use crate::{classfile::ClassFile, loader::LoaderId, Error, Result};

/// A unit of the transformer chain.
///
/// Units must be thread-safe (Send + Sync) since a chain is owned by a loader that may be
/// handed between threads. A unit receives the class by value and returns the class the
/// next unit should see, which lets it either patch the header in place or replace the
/// bytes wholesale.
pub trait ClassTransformer: Send + Sync {
    /// Unique name for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Should this unit run on a specific class?
    ///
    /// Called before `transform`. Override to skip classes the unit has nothing to do for.
    fn should_transform(&self, _class: &ClassFile, _ctx: &TransformContext) -> bool {
        true
    }

    /// Rewrites one class.
    ///
    /// # Arguments
    ///
    /// * `class` - The output of the previous unit (or the pool, for the first unit).
    /// * `ctx` - Information about the load in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot process the class. The chain wraps it into
    /// [`Error::Transformation`] and the load fails.
    fn transform(&self, class: ClassFile, ctx: &TransformContext) -> Result<ClassFile>;

    /// Get a description of what this unit does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

/// Information about the load a unit is transforming for.
#[derive(Debug, Clone)]
pub struct TransformContext {
    class_name: String,
    loader: LoaderId,
    suppress_static_initializer: bool,
}

impl TransformContext {
    /// Creates a context.
    #[must_use]
    pub fn new(class_name: &str, loader: LoaderId, suppress_static_initializer: bool) -> Self {
        TransformContext {
            class_name: class_name.to_string(),
            loader,
            suppress_static_initializer,
        }
    }

    /// The name the class is being loaded under.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The loader that will define the class.
    #[must_use]
    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    /// Returns `true` if the loader was configured to suppress this class's static
    /// initializer.
    #[must_use]
    pub fn suppress_static_initializer(&self) -> bool {
        self.suppress_static_initializer
    }
}

/// Ordered sequence of transformer units.
///
/// Owned by exactly one loader. Units are stored behind `Arc` so a caller can keep a handle
/// to a unit (for example to inspect what it recorded) after handing it to the chain.
#[derive(Clone, Default)]
pub struct TransformerChain {
    units: Vec<Arc<dyn ClassTransformer>>,
}

impl TransformerChain {
    /// Creates an empty, pass-through chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit after every existing one.
    #[must_use]
    pub fn with<T: ClassTransformer + 'static>(mut self, unit: T) -> Self {
        self.push(Arc::new(unit));
        self
    }

    /// Appends a shared unit after every existing one.
    #[must_use]
    pub fn with_shared(mut self, unit: Arc<dyn ClassTransformer>) -> Self {
        self.push(unit);
        self
    }

    /// Appends a shared unit after every existing one.
    pub fn push(&mut self, unit: Arc<dyn ClassTransformer>) {
        self.units.push(unit);
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the chain passes classes through unchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names in application order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.units.iter().map(|unit| unit.name()).collect()
    }

    /// Runs `class` through every unit, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transformation`] naming the first unit that failed. Later units are
    /// not run.
    pub fn apply(&self, class: ClassFile, ctx: &TransformContext) -> Result<ClassFile> {
        let mut current = class;
        for unit in &self.units {
            if !unit.should_transform(&current, ctx) {
                tracing::trace!(
                    class = ctx.class_name(),
                    transformer = unit.name(),
                    "transformer skipped"
                );
                continue;
            }

            tracing::trace!(
                class = ctx.class_name(),
                transformer = unit.name(),
                loader = %ctx.loader(),
                "applying transformer"
            );
            current = unit
                .transform(current, ctx)
                .map_err(|source| Error::Transformation {
                    class: ctx.class_name().to_string(),
                    transformer: unit.name(),
                    source: Box::new(source),
                })?;
        }
        Ok(current)
    }
}

impl fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerChain")
            .field("units", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classfile::{AccessFlags, ClassFileBuilder},
        test::{FailingTransformer, FlagTransformer, RecordingTransformer},
    };

    fn class(name: &str) -> ClassFile {
        ClassFile::parse(ClassFileBuilder::new(name).build()).unwrap()
    }

    fn ctx(name: &str) -> TransformContext {
        TransformContext::new(name, LoaderId::next(), false)
    }

    #[test]
    fn empty_chain_passes_through() {
        let chain = TransformerChain::new();
        assert!(chain.is_empty());

        let input = class("a.B");
        let expected = input.to_bytecode();
        let output = chain.apply(input, &ctx("a.B")).unwrap();
        assert_eq!(output.bytes(), expected.as_slice());
    }

    #[test]
    fn units_run_in_order() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = TransformerChain::new()
            .with(RecordingTransformer::new("first", log.clone()))
            .with(RecordingTransformer::new("second", log.clone()))
            .with(RecordingTransformer::new("third", log.clone()));

        assert_eq!(chain.names(), ["first", "second", "third"]);
        chain.apply(class("a.B"), &ctx("a.B")).unwrap();
        assert_eq!(*log.lock().unwrap(), ["first:a.B", "second:a.B", "third:a.B"]);
    }

    #[test]
    fn each_unit_sees_previous_output() {
        let chain = TransformerChain::new()
            .with(FlagTransformer::new(AccessFlags::SYNTHETIC))
            .with(FlagTransformer::new(AccessFlags::ABSTRACT));

        let output = chain.apply(class("a.B"), &ctx("a.B")).unwrap();
        let flags = output.access_flags();
        assert!(flags.contains(AccessFlags::SYNTHETIC | AccessFlags::ABSTRACT));
    }

    #[test]
    fn failure_names_unit_and_stops_chain() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = TransformerChain::new()
            .with(FailingTransformer)
            .with(RecordingTransformer::new("after", log.clone()));

        match chain.apply(class("a.B"), &ctx("a.B")) {
            Err(Error::Transformation {
                class, transformer, ..
            }) => {
                assert_eq!(class, "a.B");
                assert_eq!(transformer, "failing");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn context_accessors() {
        let id = LoaderId::next();
        let ctx = TransformContext::new("x.Y", id, true);
        assert_eq!(ctx.class_name(), "x.Y");
        assert_eq!(ctx.loader(), id);
        assert!(ctx.suppress_static_initializer());
    }
}
