//! Scopes: which assemblies and which of their types a set of rule groups applies to.
//!
//! An [`AssemblyNorm`] selects assemblies, a [`TypeNorm`] narrows them to types and holds
//! the rule groups. A type selected by a [`TypeNorm`] conforms when it satisfies at least
//! one of the groups; every declaration method below adds one group.
//!
//! ```rust,ignore
//! norm.for_assemblies(|a| a.full_name().contains(".Tests"))
//!     .for_types(|t| t.namespace.ends_with(".ViewModels"))
//!     .must_not_call_any(|t| t.namespace.ends_with(".Services"));
//! ```

use std::sync::Arc;

use crate::{
    analysis::{IdentityResolver, MethodDescriptor},
    metadata::{
        typesystem::CilType,
        universe::{AssemblyRc, Universe},
    },
    norm::rule::{AssemblyPredicate, CompiledGroup, ForbiddenSet, Rule, RuleGroup, TypePredicate},
    Result,
};

/// Selects the assemblies a group of type norms is evaluated on.
pub struct AssemblyNorm {
    selector: Option<AssemblyPredicate>,
    resolver: Arc<IdentityResolver>,
    pub(crate) types: Vec<TypeNorm>,
}

impl AssemblyNorm {
    pub(crate) fn new(
        selector: Option<AssemblyPredicate>,
        resolver: Arc<IdentityResolver>,
    ) -> Self {
        AssemblyNorm {
            selector,
            resolver,
            types: Vec::new(),
        }
    }

    /// Narrows the selected assemblies to the types matching `selector`
    pub fn for_types<F>(&mut self, selector: F) -> &mut TypeNorm
    where
        F: Fn(&CilType) -> bool + Send + Sync + 'static,
    {
        let index = self.types.len();
        self.types
            .push(TypeNorm::new(Arc::new(selector), self.resolver.clone()));
        &mut self.types[index]
    }

    /// Assemblies of `universe` matching the selector, in load order
    pub(crate) fn matched_assemblies(&self, universe: &Universe) -> Vec<AssemblyRc> {
        universe
            .assemblies()
            .into_iter()
            .filter(|assembly| match &self.selector {
                Some(selector) => selector(assembly),
                None => true,
            })
            .collect()
    }
}

/// The types of a scope together with the rule groups they must conform to.
pub struct TypeNorm {
    pub(crate) selector: TypePredicate,
    pub(crate) groups: Vec<CompiledGroup>,
    pub(crate) resolver: Arc<IdentityResolver>,
}

impl TypeNorm {
    fn new(selector: TypePredicate, resolver: Arc<IdentityResolver>) -> Self {
        TypeNorm {
            selector,
            groups: Vec::new(),
            resolver,
        }
    }

    /// Adds a group: the type satisfies `predicate`
    pub fn must_satisfy<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&CilType) -> bool + Send + Sync + 'static,
    {
        self.groups
            .push(CompiledGroup::from_rule(Rule::Satisfies(Arc::new(predicate))));
        self
    }

    /// Adds a group: the type satisfies every one of `predicates`
    pub fn must_satisfy_all<I>(&mut self, predicates: I) -> &mut Self
    where
        I: IntoIterator<Item = TypePredicate>,
    {
        let rules = predicates.into_iter().map(Rule::Satisfies).collect();
        self.groups.push(CompiledGroup::new(rules));
        self
    }

    /// Adds an arbitrary conjunction.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] or [`crate::Error::AmbiguousOrMissingMethod`]
    /// if a condition of the group cannot be resolved.
    pub fn must(&mut self, group: RuleGroup) -> Result<&mut Self> {
        let compiled = group.compile(&self.resolver)?;
        self.groups.push(compiled);
        Ok(self)
    }

    /// Adds a group: the type implements `interface` (a full name).
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if no loaded assembly defines `interface`.
    pub fn must_implement(&mut self, interface: &str) -> Result<&mut Self> {
        self.must(RuleGroup::new().implements(interface))
    }

    /// Adds a group: no method of the type calls `method`.
    ///
    /// The descriptor is resolved immediately.
    ///
    /// # Errors
    /// Returns [`crate::Error::AmbiguousOrMissingMethod`] if `method` does not denote exactly
    /// one method of the loaded assemblies.
    pub fn must_not_call(&mut self, method: MethodDescriptor) -> Result<&mut Self> {
        self.must(RuleGroup::new().not_calling(method))
    }

    /// Adds a group: no method of the type calls a method of a type matching `forbidden`.
    ///
    /// `forbidden` is evaluated over every type of the selected assemblies, not only over
    /// the types this norm checks. It runs once, on first verification.
    pub fn must_not_call_any<F>(&mut self, forbidden: F) -> &mut Self
    where
        F: Fn(&CilType) -> bool + Send + Sync + 'static,
    {
        self.groups
            .push(CompiledGroup::from_rule(Rule::NotCallingAny(ForbiddenSet::new(
                Arc::new(forbidden),
            ))));
        self
    }

    /// Number of rule groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
