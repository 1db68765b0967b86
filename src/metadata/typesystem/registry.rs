//! Token-ordered registry of the types defined in one module.
//!
//! The registry keeps three indices:
//!
//! - **Token-based lookup**: primary storage in a `SkipMap`, iterated in token (declaration) order
//! - **Name-based lookup**: full name to token
//! - **Method ownership**: `MethodDef` token to the token of its declaring type
//!
//! All indices are lock-free or sharded so a registry can be shared across the worker
//! threads of a parallel verification run.

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    metadata::{method::MethodRc, token::Token, typesystem::CilTypeRc},
    Result,
};

/// Central registry for all types of a module
pub struct TypeRegistry {
    types: SkipMap<Token, CilTypeRc>,
    by_fullname: DashMap<String, Token>,
    method_owner: DashMap<Token, Token>,
}

impl TypeRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry {
            types: SkipMap::new(),
            by_fullname: DashMap::new(),
            method_owner: DashMap::new(),
        }
    }

    /// Registers a type and indexes its methods.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the token or the full name is already taken,
    /// or if one of the methods is already owned by another type.
    pub fn insert(&self, new_type: CilTypeRc) -> Result<()> {
        if self.types.contains_key(&new_type.token) {
            return Err(malformed_error!(
                "Duplicate type token {} for '{}'",
                new_type.token,
                new_type.fullname()
            ));
        }

        let fullname = new_type.fullname();
        if self.by_fullname.contains_key(&fullname) {
            return Err(malformed_error!("Duplicate type name '{}'", fullname));
        }

        for method in &new_type.methods {
            if let Some(owner) = self.method_owner.get(&method.token) {
                return Err(malformed_error!(
                    "Method {} of '{}' is already owned by type {}",
                    method.token,
                    fullname,
                    *owner
                ));
            }
        }

        for method in &new_type.methods {
            self.method_owner.insert(method.token, new_type.token);
        }
        self.by_fullname.insert(fullname, new_type.token);
        self.types.insert(new_type.token, new_type);
        Ok(())
    }

    /// Get a type by its token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<CilTypeRc> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Get a type by its full name (`Namespace.Name`)
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<CilTypeRc> {
        let token = *self.by_fullname.get(fullname)?;
        self.get(&token)
    }

    /// Returns the type declaring the method with the given `MethodDef` token
    #[must_use]
    pub fn declaring_type(&self, method: Token) -> Option<CilTypeRc> {
        let owner = *self.method_owner.get(&method)?;
        self.get(&owner)
    }

    /// Returns the method with the given `MethodDef` token together with its declaring type
    #[must_use]
    pub fn method(&self, token: Token) -> Option<(CilTypeRc, MethodRc)> {
        let owner = self.declaring_type(token)?;
        let method = owner.method(token)?.clone();
        Some((owner, method))
    }

    /// Returns all types in token order
    #[must_use]
    pub fn all_types(&self) -> Vec<CilTypeRc> {
        self.types
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns the number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
