//! Canonical method identities and their resolution.
//!
//! Two call-sites call the same method exactly when their targets resolve to the same
//! [`MethodIdentity`]. An identity is the `MethodDef` token of the method definition
//! qualified by the MVID of the module that defines it; names and parameter lists are
//! never compared, so overloads stay distinct.
//!
//! The [`IdentityResolver`] produces identities from two directions:
//!
//! - [`IdentityResolver::resolve_descriptor`] turns a caller-supplied [`MethodDescriptor`]
//!   into exactly one method, or fails with [`crate::Error::AmbiguousOrMissingMethod`]
//! - [`IdentityResolver::resolve_call_site`] resolves the token operand of a call
//!   instruction (`MethodDef`, `MemberRef` or `MethodSpec`) in the context of its module
//!
//! Call-site results are memoized per (module, token), as one reference is usually met at
//! many call-sites. Only successful resolutions are cached.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    metadata::{
        method::MethodRc,
        module::{MemberRef, Module},
        token::Token,
        universe::{TypeHandle, Universe},
    },
    Error, Result,
};

/// Canonical, overload-safe key of a method definition.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MethodIdentity {
    /// MVID of the module defining the method
    pub module: uguid::Guid,
    /// `MethodDef` token of the method within that module
    pub token: Token,
}

impl Hash for MethodIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.module.to_bytes().hash(state);
        self.token.hash(state);
    }
}

impl PartialOrd for MethodIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MethodIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.module
            .to_bytes()
            .cmp(&other.module.to_bytes())
            .then(self.token.cmp(&other.token))
    }
}

impl fmt::Debug for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodIdentity({}, {})", self.module, self.token)
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.token)
    }
}

/// Which member of the declaring type a descriptor names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A method, by name
    Method,
    /// The getter of a property
    Getter,
    /// The setter of a property
    Setter,
}

/// Selects one method among several that share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Overload {
    /// The name alone must be unique
    Unique,
    /// The overload with exactly these parameter type names
    Params(Vec<String>),
    /// The method with this `MethodDef` token
    Token(Token),
}

/// Describes a method the calling code wants to refer to, e.g. in `must_not_call`.
///
/// ```rust,ignore
/// let now = MethodDescriptor::getter("System.DateTime", "Now").in_assembly("System.Runtime");
/// let parse = MethodDescriptor::method("System.Int32", "Parse").params(["System.String"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Assembly expected to define the type, `None` searches every loaded assembly
    pub assembly: Option<String>,
    /// Full name of the declaring type
    pub type_name: String,
    /// Method name, or property name for accessors
    pub member: String,
    /// What `member` names
    pub kind: MemberKind,
    /// Overload discriminator
    pub overload: Overload,
}

impl MethodDescriptor {
    /// The method `name` of `type_name`
    pub fn method(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        MethodDescriptor {
            assembly: None,
            type_name: type_name.into(),
            member: name.into(),
            kind: MemberKind::Method,
            overload: Overload::Unique,
        }
    }

    /// The getter of the property `property` of `type_name`
    pub fn getter(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        MethodDescriptor {
            kind: MemberKind::Getter,
            ..MethodDescriptor::method(type_name, property)
        }
    }

    /// The setter of the property `property` of `type_name`
    pub fn setter(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        MethodDescriptor {
            kind: MemberKind::Setter,
            ..MethodDescriptor::method(type_name, property)
        }
    }

    /// Restrict the lookup to one assembly
    #[must_use]
    pub fn in_assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }

    /// Select the overload with these parameter type names
    #[must_use]
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overload = Overload::Params(params.into_iter().map(Into::into).collect());
        self
    }

    /// Select the method with this `MethodDef` token
    #[must_use]
    pub fn token(mut self, token: Token) -> Self {
        self.overload = Overload::Token(token);
        self
    }

    fn accepts(&self, method: &MethodRc) -> bool {
        match &self.overload {
            Overload::Unique => true,
            Overload::Params(params) => method.signature.same_params(params),
            Overload::Token(token) => method.token == *token,
        }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(assembly) = &self.assembly {
            write!(f, "[{assembly}]")?;
        }
        match self.kind {
            MemberKind::Method => write!(f, "{}::{}", self.type_name, self.member)?,
            MemberKind::Getter => write!(f, "{}::get_{}", self.type_name, self.member)?,
            MemberKind::Setter => write!(f, "{}::set_{}", self.type_name, self.member)?,
        }
        match &self.overload {
            Overload::Unique => Ok(()),
            Overload::Params(params) => write!(f, "({})", params.join(", ")),
            Overload::Token(token) => write!(f, " [{token}]"),
        }
    }
}

/// A method definition found for a [`MethodDescriptor`].
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    /// Canonical identity
    pub identity: MethodIdentity,
    /// Full name of the declaring type
    pub declaring_type: String,
    /// The method definition
    pub method: MethodRc,
}

impl ResolvedMethod {
    /// Name of the method, used as call-site pre-filter
    #[must_use]
    pub fn name(&self) -> &str {
        &self.method.name
    }
}

impl fmt::Display for ResolvedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}({})",
            self.declaring_type,
            self.method.name,
            self.method.signature.params.join(", ")
        )
    }
}

/// Resolves descriptors and call-site tokens to [`MethodIdentity`] values.
pub struct IdentityResolver {
    universe: Arc<Universe>,
    max_base_depth: usize,
    memo: DashMap<([u8; 16], Token), MethodIdentity>,
}

impl IdentityResolver {
    /// Creates a resolver over `universe`, following at most `max_base_depth` base types
    /// when a `MemberRef` names an inherited method.
    #[must_use]
    pub fn new(universe: Arc<Universe>, max_base_depth: usize) -> Self {
        IdentityResolver {
            universe,
            max_base_depth,
            memo: DashMap::new(),
        }
    }

    /// The universe this resolver works on
    #[must_use]
    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    /// Resolves a caller-supplied descriptor to exactly one method definition.
    ///
    /// # Errors
    /// Returns [`Error::AmbiguousOrMissingMethod`] if zero or more than one method matches,
    /// which includes the case of an unknown declaring type.
    pub fn resolve_descriptor(&self, descriptor: &MethodDescriptor) -> Result<ResolvedMethod> {
        let mut candidates = Vec::new();
        for handle in self
            .universe
            .find_types(&descriptor.type_name, descriptor.assembly.as_deref())
        {
            let methods: Vec<MethodRc> = match descriptor.kind {
                MemberKind::Method => handle
                    .ty
                    .methods_named(&descriptor.member)
                    .cloned()
                    .collect(),
                MemberKind::Getter | MemberKind::Setter => {
                    let accessor = handle.ty.property(&descriptor.member).and_then(|property| {
                        if descriptor.kind == MemberKind::Getter {
                            property.getter
                        } else {
                            property.setter
                        }
                    });
                    accessor
                        .and_then(|token| handle.ty.method(token).cloned())
                        .into_iter()
                        .collect()
                }
            };

            for method in methods {
                if descriptor.accepts(&method) {
                    candidates.push((handle.clone(), method));
                }
            }
        }

        if candidates.len() != 1 {
            return Err(Error::AmbiguousOrMissingMethod {
                method: descriptor.to_string(),
                candidates: candidates.len(),
            });
        }

        let (handle, method) = candidates.remove(0);
        let resolved = ResolvedMethod {
            identity: MethodIdentity {
                module: handle.module.mvid,
                token: method.token,
            },
            declaring_type: handle.fullname(),
            method,
        };
        log::debug!("Resolved '{}' to {}", descriptor, resolved.identity);
        Ok(resolved)
    }

    /// Returns `true` if the call-site token refers to a method whose name satisfies `accept`.
    ///
    /// Nothing is resolved: a `MemberRef` already carries the name of the method it resolves
    /// to, so this is a safe filter before [`IdentityResolver::resolve_call_site`].
    pub fn reference_name_matches<F>(&self, module: &Module, token: Token, accept: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        if token.is_method_def() {
            module
                .method(token)
                .is_some_and(|(_, method)| accept(&method.name))
        } else if token.is_member_ref() {
            module
                .member_ref(token)
                .is_some_and(|member_ref| accept(&member_ref.name))
        } else if token.is_method_spec() {
            module
                .method_spec(token)
                .is_some_and(|spec| self.reference_name_matches(module, spec.method, accept))
        } else {
            false
        }
    }

    /// Resolves the token operand of a call instruction found in `module`.
    ///
    /// Returns `None` if the target cannot be resolved, e.g. because the assembly defining
    /// it was not loaded. Such call-sites never match any target.
    #[must_use]
    pub fn resolve_call_site(&self, module: &Module, token: Token) -> Option<MethodIdentity> {
        let key = (module.mvid.to_bytes(), token);
        if let Some(identity) = self.memo.get(&key) {
            return Some(*identity);
        }

        let resolved = if token.is_method_def() {
            module.method(token).map(|_| MethodIdentity {
                module: module.mvid,
                token,
            })
        } else if token.is_member_ref() {
            module
                .member_ref(token)
                .and_then(|member_ref| self.resolve_member_ref(member_ref))
        } else if token.is_method_spec() {
            module
                .method_spec(token)
                .and_then(|spec| self.resolve_call_site(module, spec.method))
        } else {
            None
        };

        match resolved {
            Some(identity) => {
                self.memo.insert(key, identity);
            }
            None => log::debug!(
                "Call target {} in module '{}' could not be resolved",
                token,
                module.name
            ),
        }
        resolved
    }

    /// Resolves a `MemberRef` against the universe, following the base type chain.
    #[must_use]
    pub fn resolve_member_ref(&self, member_ref: &MemberRef) -> Option<MethodIdentity> {
        let start = self
            .universe
            .find_types(&member_ref.parent, member_ref.scope.as_deref())
            .into_iter()
            .next()?;

        match self.find_in_hierarchy(start, member_ref) {
            Ok(found) => found,
            Err(error) => {
                log::warn!("Reference {} left unresolved: {}", member_ref, error);
                None
            }
        }
    }

    fn find_in_hierarchy(
        &self,
        start: TypeHandle,
        member_ref: &MemberRef,
    ) -> Result<Option<MethodIdentity>> {
        let mut current = start;
        let mut depth = 0;
        loop {
            let found = current
                .ty
                .methods_named(&member_ref.name)
                .find(|method| method.signature == member_ref.signature);
            if let Some(method) = found {
                return Ok(Some(MethodIdentity {
                    module: current.module.mvid,
                    token: method.token,
                }));
            }

            let Some(base) = current.ty.base.as_deref() else {
                return Ok(None);
            };
            let Some(next) = self.universe.find_types(base, None).into_iter().next() else {
                return Ok(None);
            };

            depth += 1;
            if depth > self.max_base_depth {
                return Err(Error::RecursionLimit(self.max_base_depth));
            }
            current = next;
        }
    }

    /// Number of memoized call-site resolutions
    #[must_use]
    pub fn cached(&self) -> usize {
        self.memo.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        metadata::builder::{AssemblyBuilder, Callee, TypeBuilder},
        test::{fixture_universe, type_handle},
    };

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(fixture_universe()), 16)
    }

    #[test]
    fn test_resolve_descriptor_kinds() {
        let resolver = resolver();

        let now = resolver
            .resolve_descriptor(&MethodDescriptor::getter("System.DateTime", "Now"))
            .unwrap();
        assert_eq!(now.name(), "get_Now");
        assert_eq!(now.declaring_type, "System.DateTime");

        let parse = resolver
            .resolve_descriptor(
                &MethodDescriptor::method("System.Int32", "Parse")
                    .params(["System.String"])
                    .in_assembly("System.Runtime"),
            )
            .unwrap();
        assert_eq!(parse.method.signature.params, vec!["System.String".to_string()]);
        assert_ne!(parse.identity, now.identity);

        let by_token = resolver
            .resolve_descriptor(
                &MethodDescriptor::method("System.Int32", "Parse").token(parse.identity.token),
            )
            .unwrap();
        assert_eq!(by_token.identity, parse.identity);
    }

    #[test]
    fn test_resolve_descriptor_failures() {
        let resolver = resolver();

        match resolver.resolve_descriptor(&MethodDescriptor::method("System.Int32", "Parse")) {
            Err(Error::AmbiguousOrMissingMethod { method, candidates }) => {
                assert_eq!(method, "System.Int32::Parse");
                assert_eq!(candidates, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            resolver.resolve_descriptor(&MethodDescriptor::method("No.Such.Type", "Run")),
            Err(Error::AmbiguousOrMissingMethod { candidates: 0, .. })
        ));
        assert!(matches!(
            resolver.resolve_descriptor(&MethodDescriptor::setter("System.DateTime", "Now")),
            Err(Error::AmbiguousOrMissingMethod { candidates: 0, .. })
        ));
        assert!(matches!(
            resolver.resolve_descriptor(
                &MethodDescriptor::getter("System.DateTime", "Now").in_assembly("Norman.Tests")
            ),
            Err(Error::AmbiguousOrMissingMethod { candidates: 0, .. })
        ));
    }

    #[test]
    fn test_resolve_call_site_through_member_ref_and_memo() {
        let resolver = resolver();
        let now = resolver
            .resolve_descriptor(&MethodDescriptor::getter("System.DateTime", "Now"))
            .unwrap();

        let caller = type_handle(resolver.universe(), "Norman.Tests.Types.UseDateTimeNow");
        let call = caller
            .ty
            .methods
            .iter()
            .flat_map(|method| method.instructions())
            .find(|instruction| instruction.opcode.is_call_site())
            .and_then(|instruction| instruction.token())
            .unwrap();
        assert!(call.is_member_ref());
        assert!(!resolver.reference_name_matches(&caller.module, call, |name| name == "Now"));
        assert!(resolver.reference_name_matches(&caller.module, call, |name| name == "get_Now"));

        assert_eq!(resolver.cached(), 0);
        assert_eq!(
            resolver.resolve_call_site(&caller.module, call),
            Some(now.identity)
        );
        assert_eq!(resolver.cached(), 1);
        assert_eq!(
            resolver.resolve_call_site(&caller.module, call),
            Some(now.identity)
        );
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_member_ref_follows_base_chain() {
        let resolver = resolver();
        let handler = type_handle(resolver.universe(), "Norman.Tests.Types.CallsInheritedSave");
        let base_save = resolver
            .resolve_descriptor(&MethodDescriptor::method(
                "Norman.Services.RepositoryBase",
                "Save",
            ))
            .unwrap();

        let targets: HashSet<MethodIdentity> = handler
            .ty
            .methods
            .iter()
            .flat_map(|method| method.instructions())
            .filter_map(|instruction| instruction.token())
            .filter_map(|token| resolver.resolve_call_site(&handler.module, token))
            .collect();
        assert!(targets.contains(&base_save.identity));
    }

    #[test]
    fn test_unloaded_target_is_unresolved() {
        let universe = Universe::new();
        universe.add(
            AssemblyBuilder::new("Lonely")
                .class(TypeBuilder::new("Caller").method(|m| {
                    m.implementation(|body| {
                        body.call(Callee::method("Missing.Type", "Run").in_assembly("Missing"))
                            .ret()
                    })
                }))
                .build()
                .unwrap(),
        );
        let resolver = IdentityResolver::new(Arc::new(universe), 16);
        let caller = type_handle(resolver.universe(), "Caller");
        let call = caller.ty.methods[0].instructions()[0].token().unwrap();
        assert_eq!(resolver.resolve_call_site(&caller.module, call), None);
        assert_eq!(resolver.cached(), 0);
    }

    #[test]
    fn test_method_spec_resolves_to_underlying_method() {
        let universe = Universe::new();
        universe.add(
            AssemblyBuilder::new("Lib")
                .class(
                    TypeBuilder::new("Gen")
                        .namespace("Lib")
                        .public()
                        .method(|m| m.name("Make").public().static_()),
                )
                .build()
                .unwrap(),
        );
        universe.add(
            AssemblyBuilder::new("App")
                .class(
                    TypeBuilder::new("Local")
                        .namespace("App")
                        .method(|m| m.name("Make").static_()),
                )
                .class(TypeBuilder::new("Caller").namespace("App").method(|m| {
                    m.implementation(|body| {
                        body.call(Callee::method("Lib.Gen", "Make").in_assembly("Lib").generic())
                            .call(Callee::method("App.Local", "Make").generic())
                            .ret()
                    })
                }))
                .build()
                .unwrap(),
        );
        let resolver = IdentityResolver::new(Arc::new(universe), 16);
        let remote = resolver
            .resolve_descriptor(&MethodDescriptor::method("Lib.Gen", "Make"))
            .unwrap();
        let local = resolver
            .resolve_descriptor(&MethodDescriptor::method("App.Local", "Make"))
            .unwrap();

        let caller = type_handle(resolver.universe(), "App.Caller");
        let calls: Vec<Token> = caller.ty.methods[0]
            .instructions()
            .iter()
            .filter_map(|instruction| instruction.token())
            .collect();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|token| token.is_method_spec()));

        assert!(resolver.reference_name_matches(&caller.module, calls[0], |name| name == "Make"));
        assert!(!resolver.reference_name_matches(&caller.module, calls[0], |name| name == "Take"));
        assert_eq!(
            resolver.resolve_call_site(&caller.module, calls[0]),
            Some(remote.identity)
        );
        assert_eq!(
            resolver.resolve_call_site(&caller.module, calls[1]),
            Some(local.identity)
        );
    }

    #[test]
    fn test_base_chain_limit() {
        let mut builder = AssemblyBuilder::new("Deep")
            .class(TypeBuilder::new("Level0").method(|m| m.name("Work").public()));
        for level in 1..=5 {
            builder = builder
                .class(TypeBuilder::new(format!("Level{level}")).extends(format!("Level{}", level - 1)));
        }
        let universe = Universe::new();
        universe.add(builder.build().unwrap());
        universe.add(
            AssemblyBuilder::new("Client")
                .class(TypeBuilder::new("User").method(|m| {
                    m.implementation(|body| {
                        body.callvirt(Callee::method("Level5", "Work").in_assembly("Deep"))
                            .ret()
                    })
                }))
                .build()
                .unwrap(),
        );
        let universe = Arc::new(universe);

        let user = type_handle(&universe, "User");
        let call = user.ty.methods[0].instructions()[0].token().unwrap();

        let shallow = IdentityResolver::new(universe.clone(), 3);
        assert_eq!(shallow.resolve_call_site(&user.module, call), None);

        let deep = IdentityResolver::new(universe, 5);
        let work = deep
            .resolve_descriptor(&MethodDescriptor::method("Level0", "Work"))
            .unwrap();
        assert_eq!(deep.resolve_call_site(&user.module, call), Some(work.identity));
    }

    #[test]
    fn test_identity_ordering_and_display() {
        let a = MethodIdentity {
            module: uguid::Guid::ZERO,
            token: Token::new(0x0600_0001),
        };
        let b = MethodIdentity {
            token: Token::new(0x0600_0002),
            ..a
        };
        assert!(a < b);
        assert_eq!(
            a.to_string(),
            "00000000-0000-0000-0000-000000000000:0x06000001"
        );
        assert_eq!(
            MethodDescriptor::method("A.B", "C").params(["System.Int32"]).to_string(),
            "A.B::C(System.Int32)"
        );
        assert_eq!(
            MethodDescriptor::getter("A.B", "Now").in_assembly("X").to_string(),
            "[X]A.B::get_Now"
        );
    }
}
