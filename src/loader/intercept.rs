//! Resolution hooks consulted ahead of the deferral policy.

use std::{fmt, sync::Arc};

use crate::{
    loader::{ClassLoader, ClassRef},
    Result,
};

/// Hook that may resolve a class before the mock loader applies its policy.
///
/// Interceptors are consulted by [`crate::loader::MockClassLoader::find_class`] in the order
/// they were added. Returning `None` declines the name and lets the next interceptor (and
/// finally the policy) handle it; returning `Some` ends resolution with that result,
/// including errors.
pub trait ClassInterceptor: Send + Sync {
    /// Resolves `class_name`, or declines with `None`.
    fn intercept(&self, class_name: &str) -> Option<Result<ClassRef>>;
}

impl<F> ClassInterceptor for F
where
    F: Fn(&str) -> Option<Result<ClassRef>> + Send + Sync,
{
    fn intercept(&self, class_name: &str) -> Option<Result<ClassRef>> {
        self(class_name)
    }
}

/// Routes every name starting with one of its prefixes to another loader.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use mockloader::loader::{ClassInterceptor, HostClassLoader, PrefixInterceptor};
///
/// let host = Arc::new(HostClassLoader::new(Default::default()));
/// let interceptor = PrefixInterceptor::new(host).prefix("java.lang");
/// assert!(interceptor.intercept("com.example.Thing").is_none());
/// assert!(interceptor.intercept("java.lang.Missing").is_some());
/// ```
pub struct PrefixInterceptor {
    prefixes: Vec<String>,
    target: Arc<dyn ClassLoader>,
}

impl PrefixInterceptor {
    /// Creates an interceptor routing to `target` that matches nothing yet.
    #[must_use]
    pub fn new(target: Arc<dyn ClassLoader>) -> Self {
        PrefixInterceptor {
            prefixes: Vec::new(),
            target,
        }
    }

    /// Adds a name prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefixes.push(prefix.to_string());
        self
    }

    /// Returns `true` if `class_name` is routed to the target.
    #[must_use]
    pub fn matches(&self, class_name: &str) -> bool {
        self.prefixes.iter().any(|p| class_name.starts_with(p.as_str()))
    }
}

impl ClassInterceptor for PrefixInterceptor {
    fn intercept(&self, class_name: &str) -> Option<Result<ClassRef>> {
        if self.matches(class_name) {
            Some(self.target.load_class(class_name))
        } else {
            None
        }
    }
}

impl fmt::Debug for PrefixInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixInterceptor")
            .field("prefixes", &self.prefixes)
            .field("target", &self.target.id())
            .finish()
    }
}
