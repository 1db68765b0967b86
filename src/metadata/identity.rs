//! Assembly identity: simple name, four-part version and culture.
//!
//! Assembly predicates of a norm usually match on [`AssemblyIdentity::display_name`], the
//! same `Name, Version=a.b.c.d, Culture=neutral, PublicKeyToken=null` string the .NET
//! runtime reports as an assembly's full name.

use std::fmt::{self, Write};

use crate::Result;

/// Identity of a loaded assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple assembly name (e.g., "mscorlib", "Norman.Tests")
    pub name: String,
    /// Four-part version number
    pub version: AssemblyVersion,
    /// Culture of satellite assemblies, `None` for culture-neutral assemblies
    pub culture: Option<String>,
}

impl AssemblyIdentity {
    /// Creates a culture-neutral identity
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version,
            culture: None,
        }
    }

    /// Renders the full display name, e.g.
    /// `Norman.Tests, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len() + 64);
        result.push_str(&self.name);
        let _ = write!(result, ", Version={}", self.version);
        let _ = write!(
            result,
            ", Culture={}",
            self.culture.as_deref().unwrap_or("neutral")
        );
        result.push_str(", PublicKeyToken=null");
        result
    }

    /// Get the simple assembly name without version or culture information
    #[must_use]
    pub fn simple_name(&self) -> &str {
        &self.name
    }
}

/// Four-part version numbering for .NET assemblies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version component
    pub major: u16,
    /// Minor version component
    pub minor: u16,
    /// Build version component
    pub build: u16,
    /// Revision version component
    pub revision: u16,
}

impl AssemblyVersion {
    /// Creates a version from its four components
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parses `major[.minor[.build[.revision]]]`, missing components are zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the string has more than four components or a
    /// component is not a 16-bit number.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();
        if parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}
