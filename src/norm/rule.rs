//! Rules and rule groups.
//!
//! A [`RuleGroup`] is a conjunction: a type satisfies the group when every condition in
//! it holds. A scope holds several groups and a type conforms when it satisfies at least
//! one of them. Groups are declared unresolved and compiled when attached to a
//! [`crate::norm::TypeNorm`], which is when method descriptors and interface names are
//! checked against the loaded universe.

use std::{fmt, sync::Arc, sync::OnceLock};

use crate::{
    analysis::{CallScanner, ForbiddenType, IdentityResolver, MethodDescriptor, ResolvedMethod},
    metadata::{
        typesystem::CilType,
        universe::{Assembly, AssemblyRc, TypeHandle},
    },
    Error, Result,
};

/// A predicate over a type definition
pub type TypePredicate = Arc<dyn Fn(&CilType) -> bool + Send + Sync>;

/// A predicate over a loaded assembly
pub type AssemblyPredicate = Arc<dyn Fn(&Assembly) -> bool + Send + Sync>;

/// Wraps a closure into a [`TypePredicate`]
pub fn type_predicate<F>(predicate: F) -> TypePredicate
where
    F: Fn(&CilType) -> bool + Send + Sync + 'static,
{
    Arc::new(predicate)
}

#[derive(Clone)]
enum Condition {
    Satisfies(TypePredicate),
    Implements(String),
    NotCalling(MethodDescriptor),
    NotCallingAny(TypePredicate),
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Satisfies(_) => f.write_str("Satisfies(<predicate>)"),
            Condition::Implements(name) => write!(f, "Implements({name})"),
            Condition::NotCalling(descriptor) => write!(f, "NotCalling({descriptor})"),
            Condition::NotCallingAny(_) => f.write_str("NotCallingAny(<predicate>)"),
        }
    }
}

/// A conjunction of conditions a type must all satisfy.
///
/// ```rust,ignore
/// let group = RuleGroup::new()
///     .satisfies(|t| t.is_sealed())
///     .implements("MyApp.IHandler")
///     .not_calling(MethodDescriptor::getter("System.DateTime", "Now"));
/// ```
#[derive(Clone, Default, Debug)]
pub struct RuleGroup {
    conditions: Vec<Condition>,
}

impl RuleGroup {
    /// An empty group; every type satisfies it
    #[must_use]
    pub fn new() -> Self {
        RuleGroup {
            conditions: Vec::new(),
        }
    }

    /// The type must satisfy `predicate`
    #[must_use]
    pub fn satisfies<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CilType) -> bool + Send + Sync + 'static,
    {
        self.conditions
            .push(Condition::Satisfies(Arc::new(predicate)));
        self
    }

    /// The type must satisfy the shared `predicate`
    #[must_use]
    pub fn satisfies_shared(mut self, predicate: TypePredicate) -> Self {
        self.conditions.push(Condition::Satisfies(predicate));
        self
    }

    /// The type must list `interface` (a full name) among its interfaces
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.conditions.push(Condition::Implements(interface.into()));
        self
    }

    /// No method of the type may call the described method
    #[must_use]
    pub fn not_calling(mut self, method: MethodDescriptor) -> Self {
        self.conditions.push(Condition::NotCalling(method));
        self
    }

    /// No method of the type may call a method of a type matching `forbidden`
    #[must_use]
    pub fn not_calling_any<F>(mut self, forbidden: F) -> Self
    where
        F: Fn(&CilType) -> bool + Send + Sync + 'static,
    {
        self.conditions
            .push(Condition::NotCallingAny(Arc::new(forbidden)));
        self
    }

    /// Number of conditions
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns `true` if the group has no condition
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Resolves every condition against the universe of `resolver`.
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] for an unknown interface and
    /// [`Error::AmbiguousOrMissingMethod`] for a descriptor that does not denote exactly
    /// one method.
    pub(crate) fn compile(self, resolver: &IdentityResolver) -> Result<CompiledGroup> {
        let mut rules = Vec::with_capacity(self.conditions.len());
        for condition in self.conditions {
            let rule = match condition {
                Condition::Satisfies(predicate) => Rule::Satisfies(predicate),
                Condition::Implements(interface) => {
                    if resolver.universe().find_types(&interface, None).is_empty() {
                        return Err(Error::TypeNotFound(interface));
                    }
                    Rule::Implements(interface)
                }
                Condition::NotCalling(descriptor) => {
                    Rule::NotCalling(resolver.resolve_descriptor(&descriptor)?)
                }
                Condition::NotCallingAny(predicate) => {
                    Rule::NotCallingAny(ForbiddenSet::new(predicate))
                }
            };
            rules.push(rule);
        }
        Ok(CompiledGroup { rules })
    }
}

/// What a single rule needs while a scope is evaluated
pub(crate) struct EvalContext<'a> {
    pub scanner: &'a CallScanner<'a>,
    pub assemblies: &'a [AssemblyRc],
}

/// The types matching a predicate, collected on first use.
pub(crate) struct ForbiddenSet {
    predicate: TypePredicate,
    types: OnceLock<Vec<ForbiddenType>>,
}

impl ForbiddenSet {
    pub(crate) fn new(predicate: TypePredicate) -> Self {
        ForbiddenSet {
            predicate,
            types: OnceLock::new(),
        }
    }

    /// Evaluates the predicate over every type of `assemblies` once, later calls return
    /// the cached result.
    pub(crate) fn types(&self, assemblies: &[AssemblyRc]) -> &[ForbiddenType] {
        self.types.get_or_init(|| {
            let types: Vec<ForbiddenType> = assemblies
                .iter()
                .flat_map(|assembly| assembly.types())
                .filter(|handle| (self.predicate)(&handle.ty))
                .map(|handle| ForbiddenType::from_handle(&handle))
                .collect();
            log::debug!(
                "Forbidden type set holds {} types from {} assemblies",
                types.len(),
                assemblies.len()
            );
            types
        })
    }
}

/// A resolved condition.
pub(crate) enum Rule {
    Satisfies(TypePredicate),
    Implements(String),
    NotCalling(ResolvedMethod),
    NotCallingAny(ForbiddenSet),
}

impl Rule {
    fn holds(&self, handle: &TypeHandle, context: &EvalContext<'_>) -> bool {
        match self {
            Rule::Satisfies(predicate) => predicate(&handle.ty),
            Rule::Implements(interface) => handle.ty.implements(interface),
            Rule::NotCalling(target) => !context.scanner.is_calling(handle, target),
            Rule::NotCallingAny(forbidden) => !context
                .scanner
                .is_calling_any(handle, forbidden.types(context.assemblies)),
        }
    }
}

/// A resolved [`RuleGroup`].
pub(crate) struct CompiledGroup {
    rules: Vec<Rule>,
}

impl CompiledGroup {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        CompiledGroup { rules }
    }

    pub(crate) fn from_rule(rule: Rule) -> Self {
        CompiledGroup { rules: vec![rule] }
    }

    /// Returns `true` if every rule holds; vacuously `true` for an empty group
    pub(crate) fn passes(&self, handle: &TypeHandle, context: &EvalContext<'_>) -> bool {
        self.rules.iter().all(|rule| rule.holds(handle, context))
    }
}
