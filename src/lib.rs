// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'metadata/loader.rs' uses mmap to map an assembly file into memory

//! # cilnorm
//!
//! Architectural conventions for compiled .NET assemblies, checked from a unit test.
//!
//! A norm selects assemblies, narrows them to types and states what those types must look
//! like: a structural predicate, an implemented interface, a method they must never call
//! or a group of types they must never call into. Call rules are decided by walking the
//! CIL of every method body and comparing each `call`/`callvirt` target by its resolved
//! metadata identity, so overloads and unrelated methods sharing a name never collide.
//!
//! ## Features
//!
//! - **📐 Declarative scopes** - Assembly and type selectors with OR-combined rule groups
//! - **🔍 Exact call matching** - Targets compared by (module MVID, `MethodDef` token)
//! - **🧬 Inherited calls** - `MemberRef`s through derived types resolve to the base method
//! - **⚡ Parallel evaluation** - Candidate types checked on the rayon pool on request
//! - **🧪 Pluggable reporting** - Errors, panics or collected failures via [`norm::AssertionSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cilnorm::prelude::*;
//!
//! let universe = Arc::new(Universe::from_assemblies([app, runtime]));
//! let mut norm = Norm::new(universe);
//!
//! norm.for_assemblies(|a| a.full_name().contains(".Tests"))
//!     .for_types(|t| t.name.ends_with("Tests"))
//!     .must_satisfy(|t| t.is_public());
//!
//! norm.for_types(|t| t.namespace.ends_with(".Types"))
//!     .must_not_call(MethodDescriptor::getter("System.DateTime", "Now"))?;
//!
//! norm.verify()?;
//! # Ok::<(), cilnorm::Error>(())
//! ```
//!
//! A failing scope produces [`Error::VerificationFailure`] with a report such as:
//!
//! ```text
//! The following 1 types don't conform to the norm.
//! MyApp.Types.Clock
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The assemblies of a run: [`metadata::universe::Universe`], types,
//!   methods, per-module reference tables and the in-memory builders
//! - [`assembly`] - CIL instructions and opcodes
//! - [`analysis`] - Method identities, descriptor and call-site resolution, call scanning
//! - [`norm`] - Scopes, rule groups, verification and reporting
//! - [`Error`] and [`Result`] - Error handling

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,ignore
/// use cilnorm::prelude::*;
///
/// let mut norm = Norm::new(universe);
/// norm.for_types(|t| t.namespace.ends_with(".ViewModels"))
///     .must_not_call_any(|t| t.namespace.ends_with(".Services"));
/// norm.verify()?;
/// ```
pub mod prelude;

/// CIL instructions based on ECMA-335
///
/// The instruction model the call scanner walks: [`assembly::OpCode`],
/// [`assembly::Operand`] and [`assembly::Instruction`].
pub mod assembly;

/// Assemblies, modules, types and methods of a verification run
///
/// # Key Components
///
/// - [`metadata::universe`] - The loaded assemblies and type lookup across them
/// - [`metadata::module`] - Types and the `MemberRef`/`MethodSpec` tables of one module
/// - [`metadata::loader`] - The seam for binary metadata readers
/// - [`metadata::builder`] - Builders for assemblies held in memory
/// - [`metadata::token`] - Metadata tokens
pub mod metadata;

/// Method identity resolution and call-site scanning
pub mod analysis;

/// Norm declaration, verification and reporting
pub mod norm;

/// `cilnorm` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilnorm` Error type
///
/// # Examples
///
/// ```rust,ignore
/// use cilnorm::Error;
///
/// match norm.verify() {
///     Ok(()) => {}
///     Err(Error::VerificationFailure(failure)) => panic!("{}", failure),
///     Err(Error::AmbiguousOrMissingMethod { method, .. }) => panic!("bad rule: {method}"),
///     Err(e) => panic!("{e}"),
/// }
/// ```
pub use error::Error;

/// Root of a norm declaration.
///
/// See [`norm::Norm`].
pub use norm::Norm;
