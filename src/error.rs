use thiserror::Error;

use crate::norm::VerificationFailure;

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

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Declaration Errors
/// - [`Error::AmbiguousOrMissingMethod`] - A `must_not_call` target does not denote exactly one method
/// - [`Error::TypeNotFound`] - A type named in a rule does not exist in the loaded universe
///
/// ## Verification Outcome
/// - [`Error::VerificationFailure`] - At least one type violated a norm (the expected "test failed" signal)
///
/// ## Metadata Errors
/// - [`Error::Malformed`] - Inconsistent metadata handed to a builder or loader
/// - [`Error::FileError`] - Filesystem I/O errors while loading an assembly
/// - [`Error::RecursionLimit`] - Maximum recursion depth exceeded while walking a type hierarchy
///
/// # Examples
///
/// ```rust,ignore
/// use cilnorm::{Error, prelude::*};
///
/// match norm.verify() {
///     Ok(()) => println!("all types conform"),
///     Err(Error::VerificationFailure(failure)) => {
///         for violation in failure.violations.iter() {
///             eprintln!("offender: {}", violation.full_name);
///         }
///     }
///     Err(e) => panic!("norm could not be evaluated: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A method descriptor resolved to zero or to more than one method.
    ///
    /// Raised while declaring a `must_not_call` rule. This is a configuration error in the
    /// rule declaration, not a problem with the inspected assembly, and aborts the run.
    ///
    /// # Fields
    ///
    /// * `method` - The descriptor that failed to resolve, rendered for display
    /// * `candidates` - How many methods matched the descriptor
    #[error("Method '{method}' resolved to {candidates} candidates, expected exactly one")]
    AmbiguousOrMissingMethod {
        /// The method descriptor that could not be resolved
        method: String,
        /// Number of methods matching the descriptor
        candidates: usize,
    },

    /// A type named in a rule declaration is not part of the loaded universe.
    #[error("Failed to find type '{0}' in the loaded assemblies")]
    TypeNotFound(String),

    /// One or more types do not conform to a norm.
    ///
    /// Carries the formatted report together with the violation set for programmatic
    /// inspection. Produced by [`crate::norm::ErrorSink`].
    #[error("{0}")]
    VerificationFailure(Box<VerificationFailure>),

    /// The metadata handed to a builder or loader is inconsistent.
    ///
    /// The error includes the source location where the inconsistency was detected.
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

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Recursion limit reached.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns the verification failure if this error carries one.
    #[must_use]
    pub fn as_verification_failure(&self) -> Option<&VerificationFailure> {
        match self {
            Error::VerificationFailure(failure) => Some(failure),
            _ => None,
        }
    }
}
