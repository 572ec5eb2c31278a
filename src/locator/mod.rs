//! Package location - catalog abstraction.
//!
//! The PackageLocator trait provides a uniform interface for resolving a
//! logical package name to installed package metadata. The production
//! implementation queries pkg-config; tests substitute an in-memory
//! catalog.

pub mod pkg_config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

pub use pkg_config::PkgConfigLocator;

/// Metadata of an installed package, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgInfo {
    /// pkg-config package name this record was resolved from.
    pub name: String,

    /// Installation prefix.
    pub prefix: PathBuf,

    /// Include directories exported by the package.
    pub include_dirs: Vec<PathBuf>,

    /// Path to the associated oroGen description file, if the package is an
    /// oroGen project (`deffile` variable).
    pub description_path: Option<PathBuf>,

    /// Path to the exported type-registry file, if the package is a typekit
    /// (`type_registry` variable).
    pub type_registry: Option<PathBuf>,

    /// Name of the oroGen project this package belongs to, if the package
    /// is a deployment (`project_name` variable).
    pub project_name: Option<String>,

    /// Remaining pkg-config variables, verbatim.
    pub variables: BTreeMap<String, String>,
}

impl PkgInfo {
    /// A minimal record with just a name and prefix.
    pub fn new(name: impl Into<String>, prefix: impl Into<PathBuf>) -> Self {
        PkgInfo {
            name: name.into(),
            prefix: prefix.into(),
            include_dirs: Vec::new(),
            description_path: None,
            type_registry: None,
            project_name: None,
            variables: BTreeMap::new(),
        }
    }

    /// Look up a pkg-config variable.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

/// Error from a catalog lookup.
#[derive(Debug, Error)]
pub enum LocateError {
    /// No package of that name is installed.
    #[error("package '{name}' not found")]
    NotFound { name: String },

    /// The catalog itself failed (tool missing, malformed output).
    #[error("failed to query package '{name}': {message}")]
    Failure { name: String, message: String },
}

impl LocateError {
    /// True if this is a plain not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LocateError::NotFound { .. })
    }
}

/// A catalog of installed packages.
pub trait PackageLocator {
    /// Resolve a logical name to package metadata, or a not-found signal.
    fn locate(&self, name: &str) -> Result<PkgInfo, LocateError>;

    /// True if a package of that name is installed.
    fn contains(&self, name: &str) -> bool {
        self.locate(name).is_ok()
    }
}
