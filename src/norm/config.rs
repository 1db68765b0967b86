//! Verification configuration.

/// Configuration of a [`crate::Norm`] run.
///
/// Verification results do not depend on the configuration; it only trades speed for
/// resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyConfig {
    /// Evaluate candidate types on the rayon thread pool
    pub parallel: bool,

    /// Compare the target name of a call-site before resolving it
    pub name_prefilter: bool,

    /// Maximum number of base types followed when resolving an inherited method reference
    /// (default: 32)
    pub max_base_depth: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            name_prefilter: true,
            max_base_depth: 32,
        }
    }
}

impl VerifyConfig {
    /// Single-threaded evaluation, the default
    #[must_use]
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Evaluates candidate types in parallel
    ///
    /// Each type is checked independently, so this pays off for scopes with many candidates.
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }
}
