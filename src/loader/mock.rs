//! The selective, transforming class loader.

use std::{fmt, sync::Arc};

use crate::{
    loader::{
        ClassInterceptor, ClassLoader, ClassRef, DefinedClasses, HostClassLoader, LoaderConfig,
        LoaderId, LoaderStats, ProtectionDomain, StatsSnapshot,
    },
    policy::{DeferralPolicy, LoadDecision, NamePattern, PatternList},
    pool::{ByteArrayClassPath, ClassPool},
    resource::{MergedResources, ResourceIter, ResourceUrl},
    transform::{TransformContext, TransformerChain},
    Error, Result,
};

/// Class loader that transforms the classes its policy assigns to it and defers the rest.
///
/// One instance serves one test class. Its pool, defined classes, and transformer chain are
/// private, so two instances never observe each other's definitions even for identical class
/// names. Resolution methods take `&self`; reconfiguration (chain, deferred loader,
/// interceptors) takes `&mut self` and is expected to happen before the first load.
///
/// # Resolution
///
/// [`ClassLoader::load_class`] answers from the defined-class cache when it can and otherwise
/// calls [`MockClassLoader::find_class`], which consults the interceptors and then the policy:
///
/// - [`LoadDecision::Modify`]: the pool provides the class, the chain rewrites it, the result is
///   defined here.
/// - [`LoadDecision::LoadUnmodified`]: as above without the chain.
/// - [`LoadDecision::Defer`]: the request goes verbatim to the deferred loader, whose answer
///   (class or error) is returned as is.
///
/// # Examples
///
/// ```rust
/// use mockloader::prelude::*;
///
/// let loader = MockClassLoader::new(
///     LoaderConfig::new()
///         .prepare("com.example.Target")
///         .ignore("*internal*"),
/// )?;
/// assert!(loader.should_modify("com.example.Target"));
/// assert!(!loader.should_modify("com.example.Other"));
///
/// loader.add_ignore_patterns(["com.example.generated.*"]);
/// assert_eq!(
///     loader.ignore_patterns().last().map(String::as_str),
///     Some("com.example.generated.*")
/// );
/// # Ok::<(), mockloader::Error>(())
/// ```
pub struct MockClassLoader {
    id: LoaderId,
    policy: DeferralPolicy,
    suppress_static: PatternList,
    pool: ClassPool,
    classes: DefinedClasses,
    chain: TransformerChain,
    deferred: Arc<dyn ClassLoader>,
    interceptors: Vec<Arc<dyn ClassInterceptor>>,
    domain: ProtectionDomain,
    stats: LoaderStats,
}

impl MockClassLoader {
    /// Builds a loader from `config`.
    ///
    /// The pool is created from the configured class path, then the adjuster (if any) runs
    /// once. The chain starts empty and the deferred loader is [`HostClassLoader::ambient`].
    ///
    /// # Errors
    /// Returns [`Error::AdjusterFailure`] if the adjuster fails.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let id = LoaderId::next();
        let pool = ClassPool::with_directories(config.class_path_entries());

        if let Some(adjuster) = config.class_path_adjuster() {
            tracing::info!(loader = %id, "running class path adjuster");
            adjuster
                .adjust_class_path(&pool)
                .map_err(|error| Error::AdjusterFailure(Box::new(error)))?;
        }

        let policy = config.policy();
        tracing::info!(
            loader = %id,
            prepare = policy.prepare_patterns().len(),
            modify_all = policy.modifies_all(),
            entries = pool.len(),
            "mock class loader created"
        );

        let deferred: Arc<dyn ClassLoader> = HostClassLoader::ambient();
        Ok(MockClassLoader {
            id,
            policy,
            suppress_static: config.suppressed_static_initializers().clone(),
            pool,
            classes: DefinedClasses::new(),
            chain: TransformerChain::new(),
            deferred,
            interceptors: Vec::new(),
            domain: config.domain().clone(),
            stats: LoaderStats::default(),
        })
    }

    /// Replaces the transformer chain.
    pub fn set_transformer_chain(&mut self, chain: TransformerChain) {
        tracing::debug!(loader = %self.id, units = ?chain.names(), "transformer chain set");
        self.chain = chain;
    }

    /// The transformer chain.
    #[must_use]
    pub fn transformer_chain(&self) -> &TransformerChain {
        &self.chain
    }

    /// Replaces the deferred loader.
    pub fn set_deferred_loader(&mut self, loader: Arc<dyn ClassLoader>) {
        tracing::debug!(loader = %self.id, deferred = %loader.id(), "deferred loader set");
        self.deferred = loader;
    }

    /// The loader every deferred request goes to.
    #[must_use]
    pub fn deferred_loader(&self) -> &Arc<dyn ClassLoader> {
        &self.deferred
    }

    /// Adds an interceptor consulted after every interceptor added before it.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn ClassInterceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Appends caller ignore patterns; they affect every later decision.
    pub fn add_ignore_patterns<I, P>(&self, patterns: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<NamePattern>,
    {
        for pattern in patterns {
            self.policy.add_ignore_pattern(pattern);
        }
    }

    /// Every ignore pattern, built-in first, then caller patterns in the order added.
    #[must_use]
    pub fn ignore_patterns(&self) -> Vec<String> {
        self.policy.ignore_patterns()
    }

    /// Returns `true` if `class_name` would be loaded through the transformer chain.
    #[must_use]
    pub fn should_modify(&self, class_name: &str) -> bool {
        self.policy.should_modify(class_name)
    }

    /// The policy decision for `class_name`.
    #[must_use]
    pub fn decide(&self, class_name: &str) -> LoadDecision {
        self.policy.decide(class_name)
    }

    /// The deferral policy.
    #[must_use]
    pub fn policy(&self) -> &DeferralPolicy {
        &self.policy
    }

    /// The private class pool.
    #[must_use]
    pub fn pool(&self) -> &ClassPool {
        &self.pool
    }

    /// Returns `true` if this loader has defined `class_name`.
    #[must_use]
    pub fn is_defined(&self, class_name: &str) -> bool {
        self.classes.contains(class_name)
    }

    /// Counters of resolution outcomes so far.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Resolves `class_name` without consulting the defined-class cache.
    ///
    /// Interceptors are consulted first; if none claims the name, the policy decides. Calling
    /// this for a class this loader already defined fails with
    /// [`Error::DuplicateDefinition`]; use [`ClassLoader::load_class`] to get cached classes.
    ///
    /// # Errors
    /// Returns [`Error::ClassNotFound`] if the owning side cannot provide the class,
    /// [`Error::Transformation`] if a transformer fails, or any definition error.
    pub fn find_class(&self, class_name: &str) -> Result<ClassRef> {
        for interceptor in &self.interceptors {
            if let Some(result) = interceptor.intercept(class_name) {
                self.stats.record_intercepted();
                tracing::debug!(class = class_name, loader = %self.id, "class intercepted");
                return result;
            }
        }

        match self.policy.decide(class_name) {
            LoadDecision::Modify => self.load_owned(class_name, true),
            LoadDecision::LoadUnmodified => self.load_owned(class_name, false),
            LoadDecision::Defer => self.defer(class_name),
        }
    }

    /// Defines `class_name` from `len` bytes of `bytes` starting at `offset`.
    ///
    /// This is the primitive the resolution path defines classes with. Called directly, it
    /// pre-seeds a definition that later [`ClassLoader::load_class`] calls return from the
    /// cache, and the bytes become available from the pool as the class's `.class` resource.
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
        let defined = self
            .classes
            .define(self.id, class_name, bytes, offset, len, domain)?;
        self.pool
            .append_class_path(ByteArrayClassPath::new(class_name, defined.bytes()));

        tracing::debug!(class = class_name, loader = %self.id, "class defined directly");
        Ok(defined)
    }

    fn load_owned(&self, class_name: &str, transform: bool) -> Result<ClassRef> {
        let Some(mut class) = self.pool.find(class_name)? else {
            self.stats.record_not_found();
            tracing::debug!(class = class_name, loader = %self.id, "owned class not in pool");
            return Err(Error::ClassNotFound(class_name.to_string()));
        };

        if transform {
            let ctx = TransformContext::new(
                class_name,
                self.id,
                self.suppress_static.matches_any(class_name),
            );
            class = self.chain.apply(class, &ctx)?;
        }

        let bytes = class.into_bytes();
        let defined =
            self.classes
                .define(self.id, class_name, &bytes, 0, bytes.len(), self.domain.clone())?;

        self.stats.record_defined(transform);
        tracing::debug!(
            class = class_name,
            loader = %self.id,
            transformed = transform,
            "class defined"
        );
        Ok(defined)
    }

    fn defer(&self, class_name: &str) -> Result<ClassRef> {
        match self.deferred.load_class(class_name) {
            Ok(class) => {
                self.stats.record_deferred();
                tracing::debug!(
                    class = class_name,
                    loader = %self.id,
                    deferred = %self.deferred.id(),
                    "class deferred"
                );
                Ok(class)
            }
            Err(error) => {
                if error.is_not_found() {
                    self.stats.record_not_found();
                }
                tracing::debug!(
                    class = class_name,
                    loader = %self.id,
                    error = %error,
                    "deferred loader failed"
                );
                Err(error)
            }
        }
    }
}

impl ClassLoader for MockClassLoader {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn load_class(&self, class_name: &str) -> Result<ClassRef> {
        if let Some(class) = self.classes.get(class_name) {
            self.stats.record_cache_hit();
            tracing::debug!(class = class_name, loader = %self.id, "class cached");
            return Ok(class);
        }
        self.find_class(class_name)
    }

    fn resource(&self, path: &str) -> Option<ResourceUrl> {
        self.pool
            .find_resource(path)
            .or_else(|| self.deferred.resource(path))
    }

    fn resources(&self, path: &str) -> ResourceIter<'_> {
        let own: ResourceIter<'_> = Box::new(self.pool.find_resources(path).into_iter());
        Box::new(
            MergedResources::new()
                .chain(own)
                .chain(self.deferred.resources(path)),
        )
    }
}

impl fmt::Debug for MockClassLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClassLoader")
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("chain", &self.chain)
            .field("deferred", &self.deferred.id())
            .field("interceptors", &self.interceptors.len())
            .field("defined", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classfile::{AccessFlags, ClassFileBuilder},
        test::{CountingTransformer, FailingTransformer, RecordingTransformer},
        transform::DefinalizeTransformer,
    };

    fn isolated(config: LoaderConfig) -> MockClassLoader {
        let mut loader = MockClassLoader::new(config).unwrap();
        loader.set_deferred_loader(Arc::new(HostClassLoader::new(ClassPool::new())));
        loader
    }

    fn with_class(name: &'static str) -> Arc<dyn crate::loader::ClassPathAdjuster> {
        Arc::new(move |pool: &ClassPool| -> Result<()> {
            pool.make_class(name)?;
            Ok(())
        })
    }

    #[test]
    fn modify_path_transforms_and_caches() {
        let counter = Arc::new(CountingTransformer::default());
        let mut loader = isolated(
            LoaderConfig::new()
                .prepare("m.Target")
                .adjuster(with_class("m.Target")),
        );
        loader.set_transformer_chain(TransformerChain::new().with_shared(counter.clone()));

        let first = loader.load_class("m.Target").unwrap();
        let second = loader.load_class("m.Target").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.count(), 1);
        assert_eq!(first.loader(), loader.id());
        assert!(loader.is_defined("m.Target"));

        let stats = loader.stats();
        assert_eq!(stats.transformed, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn modify_missing_is_not_deferred() {
        let host = ClassPool::new();
        host.make_class("m.OnlyInHost").unwrap();

        let mut loader = MockClassLoader::new(LoaderConfig::new().prepare("m.OnlyInHost")).unwrap();
        loader.set_deferred_loader(Arc::new(HostClassLoader::new(host)));

        assert!(matches!(
            loader.load_class("m.OnlyInHost"),
            Err(Error::ClassNotFound(name)) if name == "m.OnlyInHost"
        ));
        assert_eq!(loader.stats().deferred, 0);
        assert_eq!(loader.stats().not_found, 1);
    }

    #[test]
    fn defer_path_returns_deferred_class() {
        let host_pool = ClassPool::new();
        host_pool.make_class("d.Shared").unwrap();
        let host = Arc::new(HostClassLoader::new(host_pool));

        let mut loader = MockClassLoader::new(
            LoaderConfig::new()
                .prepare("d.Other")
                .adjuster(with_class("d.Shared")),
        )
        .unwrap();
        loader.set_deferred_loader(host.clone());

        let from_mock = loader.load_class("d.Shared").unwrap();
        let from_host = host.load_class("d.Shared").unwrap();
        assert!(Arc::ptr_eq(&from_mock, &from_host));
        assert!(!loader.is_defined("d.Shared"));
        assert_eq!(loader.stats().deferred, 1);
    }

    #[test]
    fn load_unmodified_skips_chain() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut loader = isolated(
            LoaderConfig::new()
                .load_unmodified("u.Support")
                .adjuster(with_class("u.Support")),
        );
        loader.set_transformer_chain(
            TransformerChain::new().with(RecordingTransformer::new("rec", log.clone())),
        );

        let class = loader.load_class("u.Support").unwrap();
        assert_eq!(class.loader(), loader.id());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(loader.stats().unmodified, 1);
    }

    #[test]
    fn load_unmodified_survives_modify_all() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let adjuster = |pool: &ClassPool| -> Result<()> {
            pool.make_class("support.Helper")?;
            pool.make_class("app.Service")?;
            Ok(())
        };
        let mut loader = isolated(
            LoaderConfig::new()
                .prepare(crate::policy::MODIFY_ALL_CLASSES)
                .load_unmodified("support.")
                .adjuster(Arc::new(adjuster)),
        );
        loader.set_transformer_chain(
            TransformerChain::new().with(RecordingTransformer::new("rec", log.clone())),
        );

        loader.load_class("support.Helper").unwrap();
        loader.load_class("app.Service").unwrap();

        assert_eq!(*log.lock().unwrap(), ["rec:app.Service"]);
        let stats = loader.stats();
        assert_eq!(stats.unmodified, 1);
        assert_eq!(stats.transformed, 1);
    }

    #[test]
    fn transformation_failure_is_fatal() {
        let mut loader = isolated(
            LoaderConfig::new()
                .prepare("f.Broken")
                .adjuster(with_class("f.Broken")),
        );
        loader.set_transformer_chain(TransformerChain::new().with(FailingTransformer));

        assert!(matches!(
            loader.load_class("f.Broken"),
            Err(Error::Transformation { transformer: "failing", .. })
        ));
        assert!(!loader.is_defined("f.Broken"));
    }

    #[test]
    fn adjuster_failure_aborts_construction() {
        let failing = |_: &ClassPool| -> Result<()> { Err(Error::Error("no".into())) };
        let result = MockClassLoader::new(LoaderConfig::new().adjuster(Arc::new(failing)));
        assert!(matches!(result, Err(Error::AdjusterFailure(_))));
    }

    #[test]
    fn find_class_twice_is_duplicate() {
        let loader = isolated(
            LoaderConfig::new()
                .prepare("x.Once")
                .adjuster(with_class("x.Once")),
        );
        loader.find_class("x.Once").unwrap();
        assert!(matches!(
            loader.find_class("x.Once"),
            Err(Error::DuplicateDefinition(_))
        ));
        assert!(loader.load_class("x.Once").is_ok());
    }

    #[test]
    fn define_then_load_returns_definition() {
        let loader = isolated(LoaderConfig::new().prepare("my.ABCTestClass"));
        let bytes = ClassFileBuilder::new("my.ABCTestClass").build();

        let defined = loader
            .define_class("my.ABCTestClass", &bytes, 0, bytes.len(), ProtectionDomain::default())
            .unwrap();
        let loaded = loader.load_class("my.ABCTestClass").unwrap();
        assert!(Arc::ptr_eq(&defined, &loaded));
        assert!(loader.resource("my/ABCTestClass.class").is_some());
    }

    #[test]
    fn static_initializer_flag_reaches_transformers() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut loader = isolated(
            LoaderConfig::new()
                .prepare_all(["s.Quiet", "s.Loud"])
                .suppress_static_initialization_for("s.Quiet")
                .adjuster(Arc::new(|pool: &ClassPool| -> Result<()> {
                    pool.make_class("s.Quiet")?;
                    pool.make_class("s.Loud")?;
                    Ok(())
                })),
        );
        loader.set_transformer_chain(
            TransformerChain::new().with(RecordingTransformer::new("rec", log.clone())),
        );

        loader.load_class("s.Quiet").unwrap();
        loader.load_class("s.Loud").unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            ["rec:s.Quiet:suppress", "rec:s.Loud"]
        );
    }

    #[test]
    fn definalize_in_chain() {
        let adjuster = |pool: &ClassPool| -> Result<()> {
            let bytes = ClassFileBuilder::new("f.Final")
                .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
                .build();
            pool.append_class_path(ByteArrayClassPath::new("f.Final", &bytes));
            Ok(())
        };
        let mut loader = isolated(
            LoaderConfig::new()
                .prepare("f.Final")
                .adjuster(Arc::new(adjuster)),
        );
        loader.set_transformer_chain(TransformerChain::new().with(DefinalizeTransformer));

        let class = loader.load_class("f.Final").unwrap();
        assert!(!class.access_flags().contains(AccessFlags::FINAL));
    }
}
