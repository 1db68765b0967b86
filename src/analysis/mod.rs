//! Method identity resolution and call-site inspection.
//!
//! This module provides the analysis half of norm verification:
//!
//! - [`identity`] - Canonical [`MethodIdentity`] values and the [`IdentityResolver`] that
//!   produces them from descriptors and call-site tokens
//! - [`scanner`] - The [`CallScanner`] walking instruction streams for call-sites
//!
//! # Usage
//!
//! ```rust,ignore
//! use cilnorm::analysis::{CallScanner, IdentityResolver, MethodDescriptor};
//!
//! let resolver = IdentityResolver::new(universe.clone(), 32);
//! let now = resolver.resolve_descriptor(&MethodDescriptor::getter("System.DateTime", "Now"))?;
//! let scanner = CallScanner::new(&resolver, true);
//! for handle in universe.find_types("MyApp.Clock", None) {
//!     assert!(!scanner.is_calling(&handle, &now));
//! }
//! ```

pub mod identity;
pub mod scanner;

pub use identity::{
    IdentityResolver, MemberKind, MethodDescriptor, MethodIdentity, Overload, ResolvedMethod,
};
pub use scanner::{call_sites, CallScanner, CallSite, CallType, ForbiddenType};
