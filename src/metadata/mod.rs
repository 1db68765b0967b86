//! In-memory model of loaded .NET assemblies.
//!
//! This is the read model every norm is evaluated against: assemblies contain modules,
//! modules contain types, types own methods and methods carry decoded instruction
//! streams. Nothing in here is mutated once an assembly was added to a [`universe::Universe`].
//!
//! # Key Components
//!
//! - [`universe`] - The set of loaded assemblies
//! - [`module`] - Types plus the `MemberRef` / `MethodSpec` rows call-sites point at
//! - [`typesystem`] - Type definitions and the per-module type registry
//! - [`method`] - Method definitions, signatures and bodies
//! - [`token`] - Metadata table row references
//! - [`loader`] - The seam through which compiled files are turned into this model
//! - [`builder`] - Fluent builders for in-memory assemblies
//!
//! # Examples
//!
//! ```rust,ignore
//! use cilnorm::prelude::*;
//!
//! let universe = Universe::new();
//! universe.add(AssemblyBuilder::new("MyApp").class(TypeBuilder::new("Foo")).build()?);
//! for handle in universe.find_types("Foo", None) {
//!     println!("{} in {}", handle.fullname(), handle.assembly.full_name());
//! }
//! ```

/// Fluent in-memory assembly construction
pub mod builder;
/// Assembly names and versions
pub mod identity;
/// Loading compiled files into the model
pub mod loader;
/// Method definitions
pub mod method;
/// Module contents
pub mod module;
/// Metadata tokens
pub mod token;
/// Type definitions
pub mod typesystem;
/// The universe of loaded assemblies
pub mod universe;
