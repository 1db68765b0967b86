//! Method definitions and their bodies.
//!
//! A [`Method`] belongs to exactly one type. Methods that are abstract or implemented
//! outside of IL (P/Invoke, runtime-provided) have no body.

mod types;

use std::{fmt, sync::Arc};

pub use types::{MethodAccessFlags, MethodModifiers, METHOD_ACCESS_MASK};

use crate::{assembly::Instruction, metadata::token::Token};

/// A reference counted `Method`
pub type MethodRc = Arc<Method>;

/// Parameter and return types of a method, as full type names.
///
/// Two methods with the same name are overloads of each other when their signatures differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Full names of the parameter types, in declaration order
    pub params: Vec<String>,
    /// Full name of the return type (`System.Void` for none)
    pub returns: String,
}

impl MethodSignature {
    /// Creates a signature from parameter and return type names
    pub fn new<I, S>(params: I, returns: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MethodSignature {
            params: params.into_iter().map(Into::into).collect(),
            returns: returns.into(),
        }
    }

    /// A parameterless method returning `System.Void`
    #[must_use]
    pub fn void() -> Self {
        MethodSignature {
            params: Vec::new(),
            returns: "System.Void".to_string(),
        }
    }

    /// Returns `true` if the parameter lists are identical
    #[must_use]
    pub fn same_params(&self, params: &[String]) -> bool {
        self.params == params
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.returns, self.params.join(", "))
    }
}

/// A method definition (`MethodDef` row) with its decoded body.
#[derive(Debug)]
pub struct Method {
    /// Token (`MethodDef` table)
    pub token: Token,
    /// Name of the method
    pub name: String,
    /// Parameter and return types
    pub signature: MethodSignature,
    /// Accessibility
    pub flags_access: MethodAccessFlags,
    /// Modifiers (static, virtual, abstract, ...)
    pub flags_modifiers: MethodModifiers,
    /// Decoded IL body, `None` for abstract and external methods
    pub body: Option<Vec<Instruction>>,
}

impl Method {
    /// Returns `true` if the method carries an IL body
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns the instructions of the body, empty when there is none
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        self.body.as_deref().unwrap_or(&[])
    }

    /// Returns `true` if the method is abstract
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::ABSTRACT)
    }

    /// Returns `true` if the method is virtual
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::VIRTUAL)
    }

    /// Returns `true` if the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::STATIC)
    }

    /// Returns `true` if the method is public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags_access == MethodAccessFlags::PUBLIC
    }
}
