//! The seam through which compiled assemblies enter a [`crate::metadata::universe::Universe`].
//!
//! This crate does not parse PE files. A [`ModuleLoader`] implementation (backed by any
//! metadata reader) turns raw bytes into an [`Assembly`]; the provided
//! [`ModuleLoader::load_file`] memory-maps the file and forwards the mapped bytes.
//!
//! # Examples
//!
//! ```rust,ignore
//! use cilnorm::prelude::*;
//!
//! struct MyReader;
//!
//! impl ModuleLoader for MyReader {
//!     fn load_bytes(&self, name: &str, data: &[u8]) -> cilnorm::Result<AssemblyRc> {
//!         // decode metadata tables and method bodies, then use the builders
//!         # unimplemented!()
//!     }
//! }
//!
//! let universe = Universe::new();
//! universe.load_file(&MyReader, "bin/Debug/MyApp.dll")?;
//! ```

use std::{fs, path::Path};

use memmap2::Mmap;

use crate::{
    metadata::universe::{AssemblyRc, Universe},
    Error::{Error, FileError},
    Result,
};

/// Turns the image of a compiled assembly into the in-memory model.
pub trait ModuleLoader {
    /// Decodes an assembly from its raw image.
    ///
    /// `name` is the file name the bytes were read from, used for module naming and
    /// diagnostics.
    ///
    /// # Errors
    /// Returns an error if the image cannot be decoded.
    fn load_bytes(&self, name: &str, data: &[u8]) -> Result<AssemblyRc>;

    /// Memory-maps `path` and decodes it with [`ModuleLoader::load_bytes`].
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, or whatever
    /// [`ModuleLoader::load_bytes`] reports.
    fn load_file(&self, path: &Path) -> Result<AssemblyRc> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());
        log::debug!("Loading '{}' ({} bytes)", name, mmap.len());
        self.load_bytes(&name, &mmap)
    }
}

impl Universe {
    /// Loads an assembly from disk and adds it to the universe
    ///
    /// # Errors
    /// Propagates the errors of [`ModuleLoader::load_file`].
    pub fn load_file(
        &self,
        loader: &dyn ModuleLoader,
        path: impl AsRef<Path>,
    ) -> Result<AssemblyRc> {
        let assembly = loader.load_file(path.as_ref())?;
        self.add(assembly.clone());
        Ok(assembly)
    }

    /// Loads an assembly from an in-memory image and adds it to the universe
    ///
    /// # Errors
    /// Propagates the errors of [`ModuleLoader::load_bytes`].
    pub fn load_bytes(
        &self,
        loader: &dyn ModuleLoader,
        name: &str,
        data: &[u8],
    ) -> Result<AssemblyRc> {
        let assembly = loader.load_bytes(name, data)?;
        self.add(assembly.clone());
        Ok(assembly)
    }
}
