//! .NET type representation used by norm predicates.
//!
//! # Key Components
//!
//! - [`CilType`]: A type definition with its methods, properties and implemented interfaces
//! - [`TypeRegistry`]: Token-ordered storage of all types of a module
//! - [`TypeAttributes`]: Raw `TypeDef` flag constants
//!
//! Types are immutable once registered. Predicates handed to a norm receive `&CilType`
//! and usually look at [`CilType::namespace`], [`CilType::name`] or the helper methods.

mod registry;

use std::{fmt, sync::Arc};

pub use registry::TypeRegistry;

use crate::metadata::{method::MethodRc, token::Token};

/// Reference to a `CilType`
pub type CilTypeRc = Arc<CilType>;

#[allow(non_snake_case)]
/// Flags of a `TypeDef` row (ECMA-335 §II.23.1.15)
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
}

/// A property of a type, linking to its accessor methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Name of the property
    pub name: String,
    /// Full name of the property type
    pub type_name: String,
    /// `MethodDef` token of the getter, if any
    pub getter: Option<Token>,
    /// `MethodDef` token of the setter, if any
    pub setter: Option<Token>,
}

/// A type definition (`TypeDef` row) with everything a norm can inspect.
#[derive(Debug)]
pub struct CilType {
    /// Token
    pub token: Token,
    /// `TypeNamespace` (can be empty)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// Flags (see [`TypeAttributes`])
    pub flags: u32,
    /// Full name of the base type ('extends'), if any
    pub base: Option<String>,
    /// Full names of all interfaces this type implements
    pub interfaces: Vec<String>,
    /// All properties this type has
    pub properties: Vec<Property>,
    /// All methods this type owns
    pub methods: Vec<MethodRc>,
}

impl CilType {
    /// Returns the full name (Namespace.Name) of the entity
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// Returns `true` if the type is a public top-level type.
    ///
    /// Nested types never count, see [`CilType::is_nested_public`].
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags & TypeAttributes::VISIBILITY_MASK == TypeAttributes::PUBLIC
    }

    /// Returns `true` if the type is nested and public
    #[must_use]
    pub fn is_nested_public(&self) -> bool {
        self.flags & TypeAttributes::VISIBILITY_MASK == TypeAttributes::NESTED_PUBLIC
    }

    /// Returns `true` if the type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::INTERFACE != 0
    }

    /// Returns `true` if the type is abstract
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0
    }

    /// Returns `true` if the type is sealed
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags & TypeAttributes::SEALED != 0
    }

    /// Returns `true` if the type lists `interface` (a full name) among its interfaces
    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|name| name == interface)
    }

    /// Returns the property with the given name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Returns the owned method with the given token
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodRc> {
        self.methods.iter().find(|method| method.token == token)
    }

    /// Returns all owned methods with the given name (every overload)
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodRc> {
        self.methods.iter().filter(move |method| method.name == name)
    }
}

impl fmt::Display for CilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname())
    }
}
