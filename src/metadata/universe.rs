//! The set of assemblies a norm run can see.
//!
//! A [`Universe`] is filled once, either by a [`crate::metadata::loader::ModuleLoader`] or
//! by the in-memory builders, and then only read. It contains both the assemblies under
//! test and the assemblies they reference (framework libraries, services, ...), since
//! method references can only be resolved against assemblies that were loaded.
//!
//! The assembly list is append-only and can be extended through a shared reference.

use std::{fmt, sync::Arc};

use crate::metadata::{
    identity::AssemblyIdentity,
    module::ModuleRc,
    typesystem::{CilType, CilTypeRc},
};

/// A reference counted `Assembly`
pub type AssemblyRc = Arc<Assembly>;

/// A loaded assembly and its modules.
#[derive(Debug)]
pub struct Assembly {
    /// Identity (name, version, culture)
    pub identity: AssemblyIdentity,
    /// Modules in manifest order, the first one is the manifest module
    pub modules: Vec<ModuleRc>,
}

impl Assembly {
    /// Creates an assembly from its identity and modules
    #[must_use]
    pub fn new(identity: AssemblyIdentity, modules: Vec<ModuleRc>) -> Self {
        Assembly { identity, modules }
    }

    /// Simple name of the assembly
    #[must_use]
    pub fn name(&self) -> &str {
        self.identity.simple_name()
    }

    /// Full display name of the assembly
    #[must_use]
    pub fn full_name(&self) -> String {
        self.identity.display_name()
    }

    /// Returns every type of every module, modules in manifest order, types in token order
    pub fn types(self: &Arc<Self>) -> impl Iterator<Item = TypeHandle> + '_ {
        self.modules.iter().flat_map(move |module| {
            module
                .types()
                .all_types()
                .into_iter()
                .map(move |ty| TypeHandle {
                    assembly: Arc::clone(self),
                    module: Arc::clone(module),
                    ty,
                })
        })
    }
}

/// A type together with the module and assembly it was loaded from.
///
/// Call-site tokens are module-relative, so scanning a type's bodies needs its module.
#[derive(Clone)]
pub struct TypeHandle {
    /// The assembly defining the type
    pub assembly: AssemblyRc,
    /// The module defining the type
    pub module: ModuleRc,
    /// The type itself
    pub ty: CilTypeRc,
}

impl TypeHandle {
    /// Full name of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        self.ty.fullname()
    }

    /// Borrow the type definition
    #[must_use]
    pub fn cil_type(&self) -> &CilType {
        &self.ty
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("assembly", &self.assembly.name())
            .field("module", &self.module.name)
            .field("type", &self.ty.fullname())
            .field("token", &self.ty.token)
            .finish()
    }
}

/// All assemblies known to a verification run.
pub struct Universe {
    assemblies: boxcar::Vec<AssemblyRc>,
}

impl Universe {
    /// Creates an empty universe
    #[must_use]
    pub fn new() -> Self {
        Universe {
            assemblies: boxcar::Vec::new(),
        }
    }

    /// Creates a universe from a list of assemblies
    pub fn from_assemblies<I>(assemblies: I) -> Self
    where
        I: IntoIterator<Item = AssemblyRc>,
    {
        let universe = Universe::new();
        for assembly in assemblies {
            universe.add(assembly);
        }
        universe
    }

    /// Appends an assembly
    pub fn add(&self, assembly: AssemblyRc) {
        log::debug!(
            "Adding assembly '{}' ({} modules)",
            assembly.full_name(),
            assembly.modules.len()
        );
        self.assemblies.push(assembly);
    }

    /// Returns all assemblies in insertion order
    #[must_use]
    pub fn assemblies(&self) -> Vec<AssemblyRc> {
        self.assemblies
            .iter()
            .map(|(_, assembly)| Arc::clone(assembly))
            .collect()
    }

    /// Returns the assembly with the given simple name
    #[must_use]
    pub fn assembly(&self, name: &str) -> Option<AssemblyRc> {
        self.assemblies
            .iter()
            .find(|(_, assembly)| assembly.name() == name)
            .map(|(_, assembly)| Arc::clone(assembly))
    }

    /// Returns the number of assemblies
    #[must_use]
    pub fn len(&self) -> usize {
        self.assemblies.count()
    }

    /// Returns `true` if no assembly was added yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds every definition of the type `fullname`.
    ///
    /// When `scope` names an assembly, only that assembly is searched. The result is
    /// normally a single handle; more than one means the same type name is defined in
    /// several loaded assemblies.
    #[must_use]
    pub fn find_types(&self, fullname: &str, scope: Option<&str>) -> Vec<TypeHandle> {
        let mut found = Vec::new();
        for (_, assembly) in self.assemblies.iter() {
            if scope.is_some_and(|name| assembly.name() != name) {
                continue;
            }
            for module in &assembly.modules {
                if let Some(ty) = module.types().get_by_fullname(fullname) {
                    found.push(TypeHandle {
                        assembly: Arc::clone(assembly),
                        module: Arc::clone(module),
                        ty,
                    });
                }
            }
        }
        found
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.assemblies.iter().map(|(_, assembly)| assembly.name()))
            .finish()
    }
}
