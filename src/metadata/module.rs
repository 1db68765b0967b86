//! A loaded module: its types plus the method references its bodies point at.
//!
//! Call instructions carry one of three token kinds:
//!
//! - `MethodDef` - a method defined in this module, found through the [`TypeRegistry`]
//! - `MemberRef` - an unresolved reference to a method in another module ([`MemberRef`])
//! - `MethodSpec` - a generic instantiation wrapping either of the above ([`MethodSpec`])

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    metadata::{
        method::{MethodRc, MethodSignature},
        token::Token,
        typesystem::{CilTypeRc, TypeRegistry},
    },
    Result,
};

/// A reference counted `Module`
pub type ModuleRc = Arc<Module>;

/// A reference counted `MemberRef`
pub type MemberRefRc = Arc<MemberRef>;

/// An unresolved method reference (`MemberRef` row).
///
/// The parent is identified by the full name of the type the compiler emitted the call
/// against, which may be a type deriving from the one that actually declares the method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    /// Token (`MemberRef` table)
    pub token: Token,
    /// Resolution scope: name of the assembly expected to define the parent type
    pub scope: Option<String>,
    /// Full name of the parent type
    pub parent: String,
    /// Name of the referenced method
    pub name: String,
    /// Signature of the referenced method
    pub signature: MethodSignature,
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "[{scope}]")?;
        }
        write!(
            f,
            "{}::{}({})",
            self.parent,
            self.name,
            self.signature.params.join(", ")
        )
    }
}

/// A generic method instantiation (`MethodSpec` row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Token (`MethodSpec` table)
    pub token: Token,
    /// The instantiated method, a `MethodDef` or `MemberRef` token
    pub method: Token,
}

/// The in-memory representation of one loaded module.
pub struct Module {
    /// Name of this module (e.g. `Sample.dll`)
    pub name: String,
    /// A Guid used to distinguish between two versions of the same module
    pub mvid: uguid::Guid,
    types: TypeRegistry,
    member_refs: HashMap<Token, MemberRefRc>,
    method_specs: HashMap<Token, MethodSpec>,
}

impl Module {
    /// Creates an empty module
    #[must_use]
    pub fn new(name: impl Into<String>, mvid: uguid::Guid) -> Self {
        Module {
            name: name.into(),
            mvid,
            types: TypeRegistry::new(),
            member_refs: HashMap::new(),
            method_specs: HashMap::new(),
        }
    }

    /// Registers a type definition
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the type clashes with an existing one.
    pub fn add_type(&self, new_type: CilTypeRc) -> Result<()> {
        self.types.insert(new_type)
    }

    /// Registers a `MemberRef` row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the token is not a `MemberRef` token or is already used.
    pub fn add_member_ref(&mut self, member_ref: MemberRef) -> Result<()> {
        if !member_ref.token.is_member_ref() {
            return Err(malformed_error!(
                "Token {} is not a MemberRef token",
                member_ref.token
            ));
        }
        if self.member_refs.contains_key(&member_ref.token) {
            return Err(malformed_error!(
                "Duplicate MemberRef token {}",
                member_ref.token
            ));
        }
        self.member_refs
            .insert(member_ref.token, Arc::new(member_ref));
        Ok(())
    }

    /// Registers a `MethodSpec` row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the token is not a `MethodSpec` token, is already
    /// used, or the instantiated method is neither a `MethodDef` nor a `MemberRef`.
    pub fn add_method_spec(&mut self, spec: MethodSpec) -> Result<()> {
        if !spec.token.is_method_spec() {
            return Err(malformed_error!("Token {} is not a MethodSpec token", spec.token));
        }
        if !(spec.method.is_method_def() || spec.method.is_member_ref()) {
            return Err(malformed_error!(
                "MethodSpec {} instantiates invalid method token {}",
                spec.token,
                spec.method
            ));
        }
        if self.method_specs.contains_key(&spec.token) {
            return Err(malformed_error!("Duplicate MethodSpec token {}", spec.token));
        }
        self.method_specs.insert(spec.token, spec);
        Ok(())
    }

    /// The type registry of this module
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Returns a `MethodDef` of this module together with its declaring type
    #[must_use]
    pub fn method(&self, token: Token) -> Option<(CilTypeRc, MethodRc)> {
        if !token.is_method_def() {
            return None;
        }
        self.types.method(token)
    }

    /// Returns the `MemberRef` row with the given token
    #[must_use]
    pub fn member_ref(&self, token: Token) -> Option<&MemberRefRc> {
        self.member_refs.get(&token)
    }

    /// Returns the `MethodSpec` row with the given token
    #[must_use]
    pub fn method_spec(&self, token: Token) -> Option<&MethodSpec> {
        self.method_specs.get(&token)
    }

    /// Returns the number of `MemberRef` rows
    #[must_use]
    pub fn member_ref_count(&self) -> usize {
        self.member_refs.len()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("mvid", &self.mvid)
            .field("types", &self.types.len())
            .field("member_refs", &self.member_refs.len())
            .field("method_specs", &self.method_specs.len())
            .finish()
    }
}
