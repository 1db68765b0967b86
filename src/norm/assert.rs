//! Reporting of verification outcomes.
//!
//! A [`Norm`](crate::Norm) does not decide how a failure surfaces. It hands every non-empty
//! violation set to an [`AssertionSink`], together with the predicate the set is expected
//! to satisfy and a renderer for the failure message. The sink evaluates the predicate and
//! reports a failure the way its host wants one.
//!
//! - [`ErrorSink`] - Returns [`Error::VerificationFailure`], the default
//! - [`PanicSink`] - Panics with the report, for plain `#[test]` functions
//! - [`CollectingSink`] - Records failures and lets verification continue

use std::sync::Mutex;

use crate::{
    norm::verifier::{VerificationFailure, ViolationSet},
    Error, Result,
};

/// Receives the outcome of each verified scope.
pub trait AssertionSink: Send + Sync {
    /// Checks `predicate` against `subject`; if it does not hold, reports a failure whose
    /// text is produced by `message`.
    ///
    /// # Errors
    /// A sink may turn a failed check into an error, which aborts [`crate::Norm::verify`]
    /// once all scopes were evaluated.
    fn report_failure(
        &self,
        subject: &ViolationSet,
        predicate: &dyn Fn(&ViolationSet) -> bool,
        message: &dyn Fn(&ViolationSet) -> String,
    ) -> Result<()>;
}

/// Reports failures as [`Error::VerificationFailure`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorSink;

impl AssertionSink for ErrorSink {
    fn report_failure(
        &self,
        subject: &ViolationSet,
        predicate: &dyn Fn(&ViolationSet) -> bool,
        message: &dyn Fn(&ViolationSet) -> String,
    ) -> Result<()> {
        if predicate(subject) {
            return Ok(());
        }

        Err(Error::VerificationFailure(Box::new(VerificationFailure {
            message: message(subject),
            violations: subject.clone(),
        })))
    }
}

/// Panics on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicSink;

impl AssertionSink for PanicSink {
    fn report_failure(
        &self,
        subject: &ViolationSet,
        predicate: &dyn Fn(&ViolationSet) -> bool,
        message: &dyn Fn(&ViolationSet) -> String,
    ) -> Result<()> {
        assert!(predicate(subject), "{}", message(subject));
        Ok(())
    }
}

/// Records every failure instead of reporting it.
#[derive(Debug, Default)]
pub struct CollectingSink {
    failures: Mutex<Vec<VerificationFailure>>,
}

impl CollectingSink {
    /// Creates an empty sink
    #[must_use]
    pub fn new() -> Self {
        CollectingSink::default()
    }

    /// Copies the failures recorded so far
    #[must_use]
    pub fn failures(&self) -> Vec<VerificationFailure> {
        lock!(self.failures).clone()
    }

    /// Removes and returns the failures recorded so far
    pub fn take(&self) -> Vec<VerificationFailure> {
        std::mem::take(&mut *lock!(self.failures))
    }
}

impl AssertionSink for CollectingSink {
    fn report_failure(
        &self,
        subject: &ViolationSet,
        predicate: &dyn Fn(&ViolationSet) -> bool,
        message: &dyn Fn(&ViolationSet) -> String,
    ) -> Result<()> {
        if !predicate(subject) {
            lock!(self.failures).push(VerificationFailure {
                message: message(subject),
                violations: subject.clone(),
            });
        }
        Ok(())
    }
}
