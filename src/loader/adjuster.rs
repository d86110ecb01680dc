use crate::{pool::ClassPool, Result};

/// Hook extending a mock loader's class pool while the loader is being built.
///
/// The adjuster runs exactly once, after the pool holds the configured class path and before
/// any class is resolved. It may only append entries; the pool offers no way to remove or
/// reorder them. If it fails, construction fails with [`crate::Error::AdjusterFailure`] and no
/// loader is returned.
///
/// Closures taking `&ClassPool` implement this trait, which covers most test usage:
///
/// ```rust
/// use std::sync::Arc;
/// use mockloader::loader::{ClassPathAdjuster, LoaderConfig};
/// use mockloader::pool::{ByteArrayClassPath, ClassPool};
/// use mockloader::classfile::ClassFileBuilder;
///
/// let bytes = ClassFileBuilder::new("my.Dynamic").build();
/// let adjuster = move |pool: &ClassPool| -> mockloader::Result<()> {
///     pool.append_class_path(ByteArrayClassPath::new("my.Dynamic", &bytes));
///     Ok(())
/// };
/// let config = LoaderConfig::new().prepare("my.Dynamic").adjuster(Arc::new(adjuster));
/// ```
pub trait ClassPathAdjuster: Send + Sync {
    /// Appends entries to `pool`.
    ///
    /// # Errors
    /// Any error aborts construction of the loader.
    fn adjust_class_path(&self, pool: &ClassPool) -> Result<()>;
}

impl<F> ClassPathAdjuster for F
where
    F: Fn(&ClassPool) -> Result<()> + Send + Sync,
{
    fn adjust_class_path(&self, pool: &ClassPool) -> Result<()> {
        self(pool)
    }
}
