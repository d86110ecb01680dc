use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure of the loading engine is surfaced synchronously to the immediate caller of the
/// operation that triggered it. Nothing is retried and nothing falls back to another loading
/// strategy, so the variant tells the caller exactly which stage rejected the request.
///
/// # Error Categories
///
/// ## Resolution Errors
/// - [`Error::ClassNotFound`] - No consulted source could provide the class
/// - [`Error::DuplicateDefinition`] - The class was already defined by this loader
/// - [`Error::ClassNameMismatch`] - Bytes handed to `define_class` describe another class
///
/// ## Transformation Errors
/// - [`Error::Transformation`] - A transformer unit rejected the class bytes
/// - [`Error::Malformed`] - The class bytes are structurally invalid
/// - [`Error::OutOfBounds`] - A read or a definition window exceeded the buffer
///
/// ## Construction Errors
/// - [`Error::AdjusterFailure`] - The class path adjuster failed while the loader was built
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors while reading class path entries
///
/// # Examples
///
/// ```rust
/// use mockloader::{Error, LoaderConfig, MockClassLoader, ClassLoader};
///
/// let loader = MockClassLoader::new(LoaderConfig::new().prepare("com.example.Missing"))?;
/// match loader.load_class("com.example.Missing") {
///     Err(Error::ClassNotFound(name)) => assert_eq!(name, "com.example.Missing"),
///     other => panic!("unexpected result: {:?}", other.map(|c| c.name().to_string())),
/// }
/// # Ok::<(), mockloader::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The requested class could not be found by any consulted source.
    ///
    /// For classes owned by the loader this means the class pool has no entry for the
    /// name; for deferred classes it means the deferred loader failed to resolve it.
    #[error("Class not found - {0}")]
    ClassNotFound(String),

    /// A transformer unit failed to process the bytes of a class.
    ///
    /// The load of that class is aborted. The failing unit is named so that the
    /// offending rewrite can be identified in chains with many units.
    ///
    /// # Fields
    ///
    /// * `class` - The class being transformed
    /// * `transformer` - Name of the unit that failed
    /// * `source` - The error raised by the unit
    #[error("Transformer '{transformer}' failed on {class}: {source}")]
    Transformation {
        /// The class that was being transformed
        class: String,
        /// The name of the failing transformer unit
        transformer: &'static str,
        /// The underlying error reported by the unit
        #[source]
        source: Box<Error>,
    },

    /// The class path adjuster raised an error during loader construction.
    ///
    /// A loader whose adjuster failed is never handed out to the caller.
    #[error("Class path adjuster failed: {0}")]
    AdjusterFailure(#[source] Box<Error>),

    /// A class with this name has already been defined by this loader.
    #[error("Duplicate class definition - {0}")]
    DuplicateDefinition(String),

    /// The class bytes name a different class than the one being defined.
    #[error("Class bytes define {found}, expected {expected}")]
    ClassNameMismatch {
        /// The name the caller asked to define
        expected: String,
        /// The name found inside the class bytes
        found: String,
    },

    /// The class bytes are damaged and could not be parsed.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted.
    ///
    /// Raised when parsing would read past the end of the class bytes, or when the
    /// offset/length window passed to `define_class` does not fit the buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors raised while reading class files or resources
    /// from directory class path entries.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    ///
    /// Used by caller-supplied extension points (adjusters, transformers) that need
    /// to report a failure without a more specific variant.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns `true` if this error reports a class that could not be found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ClassNotFound(_))
    }
}
