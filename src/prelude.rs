//! # cilnorm Prelude
//!
//! The types needed to load a universe and declare norms over it.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilnorm operations
pub use crate::Error;

/// The result type used throughout cilnorm
pub use crate::Result;

// ================================================================================================
// Metadata
// ================================================================================================

/// The loaded assemblies of a run
pub use crate::metadata::universe::{Assembly, AssemblyRc, TypeHandle, Universe};

/// Reading assemblies from binaries
pub use crate::metadata::loader::ModuleLoader;

/// Types and methods
pub use crate::metadata::{method::Method, typesystem::CilType};

/// Building assemblies in memory
pub use crate::metadata::builder::{AssemblyBuilder, Callee, ModuleBuilder, TypeBuilder};

/// Assembly identities
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion};

/// Metadata tokens
pub use crate::metadata::token::Token;

// ================================================================================================
// Analysis
// ================================================================================================

/// Describing and resolving methods
pub use crate::analysis::{IdentityResolver, MethodDescriptor, MethodIdentity, ResolvedMethod};

/// Call-site scanning
pub use crate::analysis::{CallScanner, CallSite, CallType};

// ================================================================================================
// Norms
// ================================================================================================

/// Declaring and verifying norms
pub use crate::norm::{
    type_predicate, AssemblyNorm, Norm, RuleGroup, TypeNorm, TypePredicate, VerifyConfig,
};

/// Outcomes and reporting
pub use crate::norm::{
    AssertionSink, CollectingSink, ErrorSink, PanicSink, TypeViolation, VerificationFailure,
    ViolationSet,
};
