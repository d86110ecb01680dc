//! The deferral policy.
//!
//! For every class name a mock loader resolves, the [`DeferralPolicy`] decides who owns the
//! class: the mock loader itself (which transforms it, or, for support classes, defines it
//! unmodified) or the deferred loader. The decision is a pure function of the name and the
//! configured pattern lists, so it is deterministic for the lifetime of a loader; the only
//! mutation allowed afterwards is appending ignore patterns.
//!
//! # Decision Order
//!
//! Ignore patterns come in two tiers: the built-in set ([`DEFAULT_IGNORED`]) protecting the
//! JDK and test framework internals, followed by caller-supplied patterns. The first matching
//! rule decides:
//!
//! 1. a built-in ignore pattern matches → [`LoadDecision::Defer`]
//! 2. a load-unmodified pattern matches and no caller ignore pattern does →
//!    [`LoadDecision::LoadUnmodified`], whatever the prepare list says
//! 3. the prepare list holds the modify-all sentinel → [`LoadDecision::Modify`], unless a
//!    caller ignore pattern matches ([`LoadDecision::Defer`])
//! 4. a prepare pattern matches → [`LoadDecision::Modify`], even if a caller ignore pattern
//!    matches
//! 5. otherwise → [`LoadDecision::Defer`]
//!
//! # Examples
//!
//! ```rust
//! use mockloader::policy::{DeferralPolicy, PatternList, MODIFY_ALL_CLASSES};
//!
//! let policy = DeferralPolicy::new(
//!     [MODIFY_ALL_CLASSES].into_iter().collect(),
//!     ["*protected*"].into_iter().collect(),
//!     PatternList::new(),
//! );
//! assert!(!policy.should_modify("protected.pkg.X"));
//! assert!(policy.should_modify("any.other.Y"));
//! assert!(!policy.should_modify("java.lang.String"));
//! ```

mod pattern;

pub use pattern::{NamePattern, PatternList, WILDCARD};

use std::fmt;

use strum::{AsRefStr, Display, EnumIter};

/// Prepare-list sentinel requesting that every class not ignored be modified.
pub const MODIFY_ALL_CLASSES: &str = "*";

/// Packages that are never loaded by a mock loader.
///
/// Rewriting or duplicating these classes breaks the JVM itself or the test framework
/// driving the loader, so they always resolve through the deferred loader.
pub const DEFAULT_IGNORED: &[&str] = &[
    "java.*",
    "javax.accessibility.*",
    "jdk.internal.*",
    "sun.*",
    "com.sun.*",
    "org.junit.*",
    "junit.*",
    "org.testng.*",
    "org.hamcrest.*",
    "org.pitest.*",
    "org.jacoco.agent.rt.*",
];

/// Who owns a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LoadDecision {
    /// Load from the pool, run the transformer chain, define in this loader.
    Modify,
    /// Load from the pool and define in this loader without transformation.
    LoadUnmodified,
    /// Forward the request to the deferred loader.
    Defer,
}

impl LoadDecision {
    /// Returns `true` if the class is defined by this loader.
    #[must_use]
    pub fn is_owned(self) -> bool {
        !matches!(self, LoadDecision::Defer)
    }
}

/// Pattern-based ownership decision for class names.
pub struct DeferralPolicy {
    builtin_ignore: PatternList,
    ignore: boxcar::Vec<NamePattern>,
    prepare: PatternList,
    load_unmodified: PatternList,
    modify_all: bool,
}

impl DeferralPolicy {
    /// Creates a policy with the built-in ignore set.
    #[must_use]
    pub fn new(prepare: PatternList, ignore: PatternList, load_unmodified: PatternList) -> Self {
        Self::with_builtin(
            DEFAULT_IGNORED.iter().copied().collect(),
            prepare,
            ignore,
            load_unmodified,
        )
    }

    /// Creates a policy with an explicit built-in ignore set, which may be empty.
    #[must_use]
    pub fn with_builtin(
        builtin_ignore: PatternList,
        prepare: PatternList,
        ignore: PatternList,
        load_unmodified: PatternList,
    ) -> Self {
        let caller_ignore = boxcar::Vec::new();
        for pattern in ignore.iter() {
            caller_ignore.push(pattern.clone());
        }

        DeferralPolicy {
            modify_all: prepare.has_match_all(),
            builtin_ignore,
            ignore: caller_ignore,
            prepare,
            load_unmodified,
        }
    }

    /// Decides who owns `class_name`.
    #[must_use]
    pub fn decide(&self, class_name: &str) -> LoadDecision {
        if self.builtin_ignore.matches_any(class_name) {
            return LoadDecision::Defer;
        }

        if self.load_unmodified.matches_any(class_name) && !self.caller_ignores(class_name) {
            return LoadDecision::LoadUnmodified;
        }

        if self.modify_all {
            return if self.caller_ignores(class_name) {
                LoadDecision::Defer
            } else {
                LoadDecision::Modify
            };
        }

        if self.prepare.matches_any(class_name) {
            return LoadDecision::Modify;
        }

        LoadDecision::Defer
    }

    /// Returns `true` if `class_name` is loaded through the transformer chain.
    #[must_use]
    pub fn should_modify(&self, class_name: &str) -> bool {
        self.decide(class_name) == LoadDecision::Modify
    }

    /// Appends a caller ignore pattern; it takes effect for the next decision.
    pub fn add_ignore_pattern<P: Into<NamePattern>>(&self, pattern: P) {
        self.ignore.push(pattern.into());
    }

    /// Every ignore pattern, built-in first, then caller patterns in the order added.
    #[must_use]
    pub fn ignore_patterns(&self) -> Vec<String> {
        self.builtin_ignore
            .iter()
            .map(|p| p.as_str().to_string())
            .chain(self.ignore.iter().map(|(_, p)| p.as_str().to_string()))
            .collect()
    }

    /// The prepare (modify) patterns.
    #[must_use]
    pub fn prepare_patterns(&self) -> &PatternList {
        &self.prepare
    }

    /// Returns `true` if the modify-all sentinel was requested.
    #[must_use]
    pub fn modifies_all(&self) -> bool {
        self.modify_all
    }

    fn caller_ignores(&self, class_name: &str) -> bool {
        self.ignore.iter().any(|(_, p)| p.matches(class_name))
    }
}

impl fmt::Debug for DeferralPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferralPolicy")
            .field("ignore", &self.ignore_patterns())
            .field("prepare", &self.prepare)
            .field("load_unmodified", &self.load_unmodified)
            .field("modify_all", &self.modify_all)
            .finish()
    }
}
