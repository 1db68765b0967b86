//! Evaluation of a type norm and the resulting report.

use std::{collections::BTreeSet, fmt};

use rayon::prelude::*;

use crate::{
    analysis::CallScanner,
    metadata::{
        token::Token,
        universe::{AssemblyRc, TypeHandle},
    },
    norm::{
        config::VerifyConfig,
        rule::EvalContext,
        scope::TypeNorm,
    },
};

/// A type that failed every rule group of its scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeViolation {
    /// Full name of the offending type
    pub full_name: String,
    /// Simple name of the assembly defining it
    pub assembly: String,
    /// `TypeDef` token inside its module
    pub token: Token,
}

impl TypeViolation {
    /// Describes the type behind `handle`
    #[must_use]
    pub fn from_handle(handle: &TypeHandle) -> Self {
        TypeViolation {
            full_name: handle.fullname(),
            assembly: handle.assembly.name().to_string(),
            token: handle.ty.token,
        }
    }
}

impl fmt::Display for TypeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.assembly, self.full_name)
    }
}

/// The offending types of one scope, ordered by full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationSet {
    violations: BTreeSet<TypeViolation>,
}

impl ViolationSet {
    /// An empty set
    #[must_use]
    pub fn new() -> Self {
        ViolationSet {
            violations: BTreeSet::new(),
        }
    }

    /// Adds a violation, returns `false` if it was already present
    pub fn insert(&mut self, violation: TypeViolation) -> bool {
        self.violations.insert(violation)
    }

    /// Number of offending types
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns `true` if every type conforms
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterates the violations in order
    pub fn iter(&self) -> impl Iterator<Item = &TypeViolation> {
        self.violations.iter()
    }

    /// Returns `true` if a type with the given full name is part of the set
    #[must_use]
    pub fn contains(&self, full_name: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.full_name == full_name)
    }

    /// Full names of the offending types, in order
    #[must_use]
    pub fn full_names(&self) -> Vec<&str> {
        self.violations
            .iter()
            .map(|violation| violation.full_name.as_str())
            .collect()
    }
}

impl FromIterator<TypeViolation> for ViolationSet {
    fn from_iter<T: IntoIterator<Item = TypeViolation>>(iter: T) -> Self {
        ViolationSet {
            violations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a TypeViolation;
    type IntoIter = std::collections::btree_set::Iter<'a, TypeViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// A failed verification: the report text and the types it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    /// Report, see [`build_failure_message`]
    pub message: String,
    /// The offending types
    pub violations: ViolationSet,
}

impl VerificationFailure {
    /// Builds the failure for `violations`
    #[must_use]
    pub fn new(violations: ViolationSet) -> Self {
        VerificationFailure {
            message: build_failure_message(&violations),
            violations,
        }
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Renders the report for a violation set.
///
/// A header line with the number of offending types, then one full name per line, each
/// line terminated by `\n`.
#[must_use]
pub fn build_failure_message(violations: &ViolationSet) -> String {
    let mut message = format!(
        "The following {} types don't conform to the norm.\n",
        violations.len()
    );
    for violation in violations {
        message.push_str(&violation.full_name);
        message.push('\n');
    }
    message
}

impl TypeNorm {
    /// Evaluates the norm over the types of `assemblies`.
    ///
    /// A type matching the selector conforms when it has no rule group to satisfy or
    /// satisfies at least one of them.
    pub(crate) fn violations(
        &self,
        assemblies: &[AssemblyRc],
        config: &VerifyConfig,
    ) -> ViolationSet {
        let candidates: Vec<TypeHandle> = assemblies
            .iter()
            .flat_map(|assembly| assembly.types())
            .filter(|handle| (self.selector)(&handle.ty))
            .collect();

        log::debug!(
            "Checking {} candidate types against {} rule groups",
            candidates.len(),
            self.groups.len()
        );
        if self.groups.is_empty() {
            return ViolationSet::new();
        }

        let scanner = CallScanner::new(&self.resolver, config.name_prefilter);
        let context = EvalContext {
            scanner: &scanner,
            assemblies,
        };
        let conforms = |handle: &TypeHandle| {
            let ok = self.groups.iter().any(|group| group.passes(handle, &context));
            if !ok {
                log::trace!("'{}' violates every rule group", handle.fullname());
            }
            ok
        };

        let violations: BTreeSet<TypeViolation> = if config.parallel {
            candidates
                .par_iter()
                .filter(|handle| !conforms(*handle))
                .map(TypeViolation::from_handle)
                .collect()
        } else {
            candidates
                .iter()
                .filter(|handle| !conforms(*handle))
                .map(TypeViolation::from_handle)
                .collect()
        };
        ViolationSet { violations }
    }
}
