//! Construction-time configuration of a mock loader.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    loader::{ClassPathAdjuster, ProtectionDomain},
    policy::{DeferralPolicy, NamePattern, PatternList, DEFAULT_IGNORED},
    pool::system_class_path,
};

/// Configuration consumed by [`crate::loader::MockClassLoader::new`].
///
/// # Examples
///
/// ```rust
/// use mockloader::loader::LoaderConfig;
/// use mockloader::policy::{LoadDecision, MODIFY_ALL_CLASSES};
///
/// let config = LoaderConfig::new()
///     .prepare(MODIFY_ALL_CLASSES)
///     .ignore("*protected*")
///     .load_unmodified("com.example.support.")
///     .suppress_static_initialization_for("com.example.Registry")
///     .class_path("target/test-classes");
///
/// let policy = config.policy();
/// assert!(!policy.should_modify("protected.pkg.X"));
/// assert!(policy.should_modify("any.other.Y"));
/// assert_eq!(
///     policy.decide("com.example.support.Helper"),
///     LoadDecision::LoadUnmodified
/// );
/// ```
#[derive(Clone)]
pub struct LoaderConfig {
    prepare: PatternList,
    ignore: PatternList,
    load_unmodified: PatternList,
    suppress_static: PatternList,
    class_path: Vec<PathBuf>,
    adjuster: Option<Arc<dyn ClassPathAdjuster>>,
    default_ignores: bool,
    domain: ProtectionDomain,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            prepare: PatternList::new(),
            ignore: PatternList::new(),
            load_unmodified: PatternList::new(),
            suppress_static: PatternList::new(),
            class_path: Vec::new(),
            adjuster: None,
            default_ignores: true,
            domain: ProtectionDomain::default(),
        }
    }
}

impl LoaderConfig {
    /// Creates a configuration that prepares nothing and defers everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that classes matching `pattern` be modified.
    ///
    /// [`crate::policy::MODIFY_ALL_CLASSES`] requests every class not ignored.
    #[must_use]
    pub fn prepare<P: Into<NamePattern>>(mut self, pattern: P) -> Self {
        self.prepare.push(pattern);
        self
    }

    /// Requests that classes matching any of `patterns` be modified.
    #[must_use]
    pub fn prepare_all<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<NamePattern>,
    {
        for pattern in patterns {
            self.prepare.push(pattern);
        }
        self
    }

    /// Adds a caller ignore pattern, checked after the built-in ones.
    #[must_use]
    pub fn ignore<P: Into<NamePattern>>(mut self, pattern: P) -> Self {
        self.ignore.push(pattern);
        self
    }

    /// Makes classes matching `pattern` owned by the loader but not transformed.
    ///
    /// Takes precedence over every prepare pattern, including the modify-all sentinel.
    #[must_use]
    pub fn load_unmodified<P: Into<NamePattern>>(mut self, pattern: P) -> Self {
        self.load_unmodified.push(pattern);
        self
    }

    /// Asks transformers to suppress the static initializer of classes matching `pattern`.
    #[must_use]
    pub fn suppress_static_initialization_for<P: Into<NamePattern>>(mut self, pattern: P) -> Self {
        self.suppress_static.push(pattern);
        self
    }

    /// Appends a directory to the pool's base class path.
    #[must_use]
    pub fn class_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.class_path.push(path.as_ref().to_path_buf());
        self
    }

    /// Appends the directories of the `CLASSPATH` environment variable.
    #[must_use]
    pub fn with_system_class_path(mut self) -> Self {
        self.class_path.extend(system_class_path());
        self
    }

    /// Sets the class path adjuster run during construction.
    #[must_use]
    pub fn adjuster(mut self, adjuster: Arc<dyn ClassPathAdjuster>) -> Self {
        self.adjuster = Some(adjuster);
        self
    }

    /// Drops the built-in ignore set.
    ///
    /// Only meaningful for tests exercising the policy in isolation; a loader without it will
    /// happily claim JDK classes when asked to modify everything.
    #[must_use]
    pub fn without_default_ignores(mut self) -> Self {
        self.default_ignores = false;
        self
    }

    /// Sets the protection domain classes are defined under by the resolution path.
    #[must_use]
    pub fn protection_domain(mut self, domain: ProtectionDomain) -> Self {
        self.domain = domain;
        self
    }

    /// The class path directories, in order.
    #[must_use]
    pub fn class_path_entries(&self) -> &[PathBuf] {
        &self.class_path
    }

    /// Builds the deferral policy this configuration describes.
    #[must_use]
    pub fn policy(&self) -> DeferralPolicy {
        let builtin = if self.default_ignores {
            DEFAULT_IGNORED.iter().copied().collect()
        } else {
            PatternList::new()
        };
        DeferralPolicy::with_builtin(
            builtin,
            self.prepare.clone(),
            self.ignore.clone(),
            self.load_unmodified.clone(),
        )
    }

    pub(crate) fn suppressed_static_initializers(&self) -> &PatternList {
        &self.suppress_static
    }

    pub(crate) fn class_path_adjuster(&self) -> Option<&Arc<dyn ClassPathAdjuster>> {
        self.adjuster.as_ref()
    }

    pub(crate) fn domain(&self) -> &ProtectionDomain {
        &self.domain
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("prepare", &self.prepare)
            .field("ignore", &self.ignore)
            .field("load_unmodified", &self.load_unmodified)
            .field("suppress_static", &self.suppress_static)
            .field("class_path", &self.class_path)
            .field("adjuster", &self.adjuster.is_some())
            .field("default_ignores", &self.default_ignores)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LoadDecision;

    #[test]
    fn defaults() {
        let config = LoaderConfig::new();
        assert!(config.class_path_entries().is_empty());
        assert!(config.class_path_adjuster().is_none());
        assert_eq!(config.policy().decide("com.example.Anything"), LoadDecision::Defer);
        assert_eq!(
            config.policy().ignore_patterns().len(),
            DEFAULT_IGNORED.len()
        );
    }

    #[test]
    fn builder_accumulates() {
        let config = LoaderConfig::new()
            .prepare_all(["a.A", "b.*"])
            .prepare("c.C")
            .ignore("b.internal.*")
            .load_unmodified("s.Support")
            .suppress_static_initialization_for("a.A")
            .class_path("/one")
            .class_path("/two");

        let policy = config.policy();
        assert_eq!(policy.prepare_patterns().len(), 3);
        assert_eq!(policy.decide("b.internal.X"), LoadDecision::Modify);
        assert_eq!(policy.decide("s.Support"), LoadDecision::LoadUnmodified);
        assert!(config.suppressed_static_initializers().matches_any("a.A"));
        assert_eq!(
            config.class_path_entries(),
            [PathBuf::from("/one"), PathBuf::from("/two")]
        );
        assert_eq!(
            policy.ignore_patterns().last().map(String::as_str),
            Some("b.internal.*")
        );
    }

    #[test]
    fn without_default_ignores_claims_everything() {
        let policy = LoaderConfig::new()
            .prepare(crate::policy::MODIFY_ALL_CLASSES)
            .without_default_ignores()
            .policy();
        assert!(policy.should_modify("java.lang.String"));
    }
}
