//! Call-site detection in method bodies.
//!
//! The scanner walks the instruction streams of a type's methods and answers two questions:
//!
//! - [`CallScanner::is_calling`]: does the type call one specific method?
//! - [`CallScanner::is_calling_any`]: does the type call any method of a set of types?
//!
//! Only `call` and `callvirt` instructions form call-sites. Methods without a body never
//! match. Each target is compared by [`MethodIdentity`], so calls to other overloads or to
//! unrelated methods sharing the target's name are not reported. The first matching
//! call-site ends the scan.

use std::{collections::HashSet, fmt};

use crate::{
    analysis::identity::{IdentityResolver, MethodIdentity, ResolvedMethod},
    assembly::{Instruction, OpCode},
    metadata::{method::Method, token::Token, universe::TypeHandle},
};

/// Type of call instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    /// Direct call instruction (`call`).
    Call,
    /// Virtual call instruction (`callvirt`).
    CallVirt,
}

impl CallType {
    /// Maps an opcode to the call type it forms, `None` for anything that is not a call-site
    #[must_use]
    pub const fn from_opcode(opcode: OpCode) -> Option<Self> {
        match opcode {
            OpCode::Call => Some(CallType::Call),
            OpCode::Callvirt => Some(CallType::CallVirt),
            _ => None,
        }
    }

    /// Returns `true` if this is a virtual call that requires runtime dispatch.
    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        matches!(self, Self::CallVirt)
    }
}

/// A call instruction inside a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// `MethodDef` token of the method containing the call
    pub caller: Token,
    /// IL offset of the call instruction
    pub offset: u32,
    /// Kind of call
    pub call_type: CallType,
    /// Unresolved target token (`MethodDef`, `MemberRef` or `MethodSpec`)
    pub target: Token,
}

impl CallSite {
    /// Extracts a call-site from an instruction of `caller`
    #[must_use]
    pub fn from_instruction(caller: &Method, instruction: &Instruction) -> Option<Self> {
        let call_type = CallType::from_opcode(instruction.opcode)?;
        Some(CallSite {
            caller: caller.token,
            offset: instruction.offset,
            call_type,
            target: instruction.token()?,
        })
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self.call_type {
            CallType::Call => "call",
            CallType::CallVirt => "callvirt",
        };
        write!(
            f,
            "{} IL_{:04x}: {} {}",
            self.caller, self.offset, mnemonic, self.target
        )
    }
}

/// Returns the call-sites of a method in instruction order; empty for bodiless methods.
pub fn call_sites(method: &Method) -> impl Iterator<Item = CallSite> + '_ {
    method
        .instructions()
        .iter()
        .filter_map(move |instruction| CallSite::from_instruction(method, instruction))
}

/// A type whose methods must not be called, prepared for scanning.
#[derive(Debug, Clone)]
pub struct ForbiddenType {
    /// Full name of the type
    pub full_name: String,
    names: HashSet<String>,
    identities: HashSet<MethodIdentity>,
}

impl ForbiddenType {
    /// Collects the identities and names of all methods owned by `handle`
    #[must_use]
    pub fn from_handle(handle: &TypeHandle) -> Self {
        let mut names = HashSet::with_capacity(handle.ty.methods.len());
        let mut identities = HashSet::with_capacity(handle.ty.methods.len());
        for method in &handle.ty.methods {
            names.insert(method.name.clone());
            identities.insert(MethodIdentity {
                module: handle.module.mvid,
                token: method.token,
            });
        }

        ForbiddenType {
            full_name: handle.fullname(),
            names,
            identities,
        }
    }

    /// Returns `true` if `identity` is one of the type's methods
    #[must_use]
    pub fn owns(&self, identity: &MethodIdentity) -> bool {
        self.identities.contains(identity)
    }

    /// Number of methods owned by the type
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.identities.len()
    }
}

/// Scans method bodies for calls to given targets.
pub struct CallScanner<'a> {
    resolver: &'a IdentityResolver,
    prefilter: bool,
}

impl<'a> CallScanner<'a> {
    /// Creates a scanner. With `prefilter` set, call-sites whose target name cannot match
    /// are skipped before resolution.
    #[must_use]
    pub fn new(resolver: &'a IdentityResolver, prefilter: bool) -> Self {
        CallScanner {
            resolver,
            prefilter,
        }
    }

    /// Returns `true` if any method of `handle` calls `target`.
    #[must_use]
    pub fn is_calling(&self, handle: &TypeHandle, target: &ResolvedMethod) -> bool {
        self.find_call(handle, target).is_some()
    }

    /// Returns the first call-site in `handle` that calls `target`.
    #[must_use]
    pub fn find_call(&self, handle: &TypeHandle, target: &ResolvedMethod) -> Option<CallSite> {
        let found = handle.ty.methods.iter().find_map(|method| {
            call_sites(method).find(|site| {
                self.matches(handle, site, |name| name == target.name(), |identity| {
                    *identity == target.identity
                })
            })
        });

        if let Some(site) = &found {
            log::debug!("'{}' calls {} at {}", handle.fullname(), target, site);
        }
        found
    }

    /// Returns `true` if any method of `handle` calls a method owned by one of `forbidden`.
    #[must_use]
    pub fn is_calling_any(&self, handle: &TypeHandle, forbidden: &[ForbiddenType]) -> bool {
        handle.ty.methods.iter().any(|method| {
            forbidden
                .iter()
                .any(|target| self.method_calls_into(handle, method, target))
        })
    }

    fn method_calls_into(
        &self,
        handle: &TypeHandle,
        method: &Method,
        target: &ForbiddenType,
    ) -> bool {
        let found = call_sites(method).find(|site| {
            self.matches(
                handle,
                site,
                |name| target.names.contains(name),
                |identity| target.owns(identity),
            )
        });

        match found {
            Some(site) => {
                log::debug!(
                    "'{}' calls into '{}' at {}",
                    handle.fullname(),
                    target.full_name,
                    site
                );
                true
            }
            None => false,
        }
    }

    fn matches<N, I>(&self, handle: &TypeHandle, site: &CallSite, name: N, identity: I) -> bool
    where
        N: Fn(&str) -> bool,
        I: Fn(&MethodIdentity) -> bool,
    {
        if self.prefilter
            && !self
                .resolver
                .reference_name_matches(&handle.module, site.target, name)
        {
            return false;
        }

        match self.resolver.resolve_call_site(&handle.module, site.target) {
            Some(resolved) => identity(&resolved),
            None => false,
        }
    }
}
