//! Declaring and verifying architectural norms.
//!
//! A [`Norm`] is the root of a declaration tree:
//!
//! - [`AssemblyNorm`] - selects assemblies of the loaded [`Universe`]
//! - [`TypeNorm`] - selects types of those assemblies and holds the rule groups
//! - [`RuleGroup`] - a conjunction of conditions; a type conforms when it satisfies at
//!   least one group of its [`TypeNorm`]
//!
//! [`Norm::verify`] evaluates every scope and hands each non-empty [`ViolationSet`] to the
//! configured [`AssertionSink`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use cilnorm::prelude::*;
//!
//! let mut norm = Norm::new(universe);
//! norm.for_assemblies(|a| a.full_name().contains(".Tests"))
//!     .for_types(|t| t.name.ends_with("Tests"))
//!     .must_satisfy(|t| t.is_public());
//! norm.for_types(|t| t.namespace.ends_with(".Types"))
//!     .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;
//! norm.verify()?;
//! ```
//!
//! # Thread Safety
//!
//! A declared [`Norm`] is `Send + Sync`. With [`VerifyConfig::parallel`] the candidate types
//! of a scope are checked on the rayon thread pool, results do not depend on it.

mod assert;
mod config;
mod rule;
mod scope;
mod verifier;

pub use assert::{AssertionSink, CollectingSink, ErrorSink, PanicSink};
pub use config::VerifyConfig;
pub use rule::{type_predicate, AssemblyPredicate, RuleGroup, TypePredicate};
pub use scope::{AssemblyNorm, TypeNorm};
pub use verifier::{build_failure_message, TypeViolation, VerificationFailure, ViolationSet};

use std::sync::Arc;

use crate::{
    analysis::IdentityResolver,
    metadata::{typesystem::CilType, universe::Assembly, universe::Universe},
    Result,
};

/// The root of a set of norm declarations over one universe.
pub struct Norm {
    universe: Arc<Universe>,
    resolver: Arc<IdentityResolver>,
    config: VerifyConfig,
    sink: Arc<dyn AssertionSink>,
    scopes: Vec<AssemblyNorm>,
}

impl Norm {
    /// A norm over `universe` with the default configuration, failures are returned as
    /// errors
    #[must_use]
    pub fn new(universe: Arc<Universe>) -> Self {
        Norm::with_config(universe, VerifyConfig::default())
    }

    /// A norm over `universe` with an explicit configuration
    #[must_use]
    pub fn with_config(universe: Arc<Universe>, config: VerifyConfig) -> Self {
        let resolver = Arc::new(IdentityResolver::new(
            universe.clone(),
            config.max_base_depth,
        ));
        Norm {
            universe,
            resolver,
            config,
            sink: Arc::new(ErrorSink),
            scopes: Vec::new(),
        }
    }

    /// Replaces the sink failures are reported to
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AssertionSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// The universe the norm is verified against
    #[must_use]
    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    /// Opens a scope over the assemblies matching `selector`
    pub fn for_assemblies<F>(&mut self, selector: F) -> &mut AssemblyNorm
    where
        F: Fn(&Assembly) -> bool + Send + Sync + 'static,
    {
        self.push_scope(Some(Arc::new(selector)))
    }

    /// Opens a scope over the matching types of every loaded assembly
    pub fn for_types<F>(&mut self, selector: F) -> &mut TypeNorm
    where
        F: Fn(&CilType) -> bool + Send + Sync + 'static,
    {
        self.push_scope(None).for_types(selector)
    }

    fn push_scope(&mut self, selector: Option<AssemblyPredicate>) -> &mut AssemblyNorm {
        let index = self.scopes.len();
        self.scopes
            .push(AssemblyNorm::new(selector, self.resolver.clone()));
        &mut self.scopes[index]
    }

    /// Evaluates every type scope, in declaration order, without reporting.
    #[must_use]
    pub fn evaluate(&self) -> Vec<ViolationSet> {
        let mut results = Vec::new();
        for scope in &self.scopes {
            let assemblies = scope.matched_assemblies(&self.universe);
            log::debug!("Scope matched {} assemblies", assemblies.len());
            for types in &scope.types {
                results.push(types.violations(&assemblies, &self.config));
            }
        }
        results
    }

    /// Evaluates every scope and reports each non-empty violation set to the sink.
    ///
    /// All scopes are evaluated even after a failure.
    ///
    /// # Errors
    /// Returns the first error produced by the sink, with the default [`ErrorSink`] an
    /// [`crate::Error::VerificationFailure`] for the first scope that has offending types.
    pub fn verify(&self) -> Result<()> {
        let mut first_error = None;
        for (index, violations) in self.evaluate().into_iter().enumerate() {
            if violations.is_empty() {
                continue;
            }

            log::info!(
                "Scope {} has {} non-conforming types",
                index,
                violations.len()
            );
            if let Err(error) = self.sink.report_failure(
                &violations,
                &ViolationSet::is_empty,
                &build_failure_message,
            ) {
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
