//! The project-owned typekit.
//!
//! The typekit exports a project's own types into the runtime's type
//! system. The project model treats it as a merge target for imported
//! types, a registration point for native type sources, and a build
//! dependency contributor; rendering the marshalling code is done by the
//! generation stage through the external renderer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::build_dep::BuildDependency;
use crate::core::naming;
use crate::locator::PkgInfo;
use crate::util::AUTOMATIC_AREA_NAME;

/// Which of the typekit's types are exported to the runtime type system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeExportPolicy {
    /// Export only the types used on a task interface.
    #[default]
    Used,
    /// Export everything the typekit defines.
    All,
    /// Export an explicit selection.
    Selected(Vec<String>),
}

/// The type-export unit owned by a project.
#[derive(Debug, Clone, Default)]
pub struct Typekit {
    name: Option<String>,
    version: String,

    base_dir: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    automatic_dir: Option<PathBuf>,

    export_policy: TypeExportPolicy,
    enabled_plugins: BTreeSet<String>,

    include_dirs: BTreeSet<PathBuf>,

    /// Native headers registered as type sources.
    loads: Vec<PathBuf>,
    /// Headers registered but not yet resolved into the type system.
    pending_loads: Vec<PathBuf>,

    /// Names of imported typekits whose types this typekit re-exposes.
    used_typekits: Vec<String>,
    /// Libraries this typekit uses, with their link flag. Unlinked
    /// libraries only contribute include paths.
    used_libraries: Vec<(PkgInfo, bool)>,
}

impl Typekit {
    /// Create an unnamed typekit.
    pub fn new() -> Self {
        Typekit {
            version: "0.0".to_string(),
            ..Typekit::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Root the typekit's work areas under the given project directory.
    pub fn set_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        let base_dir = base_dir.into();
        self.user_dir = Some(base_dir.join("typekit"));
        self.templates_dir = Some(base_dir.join("templates").join("typekit"));
        self.automatic_dir = Some(base_dir.join(AUTOMATIC_AREA_NAME).join("typekit"));
        self.base_dir = Some(base_dir);
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    pub fn automatic_dir(&self) -> Option<&Path> {
        self.automatic_dir.as_deref()
    }

    pub fn export_policy(&self) -> &TypeExportPolicy {
        &self.export_policy
    }

    pub fn set_export_policy(&mut self, policy: TypeExportPolicy) {
        self.export_policy = policy;
    }

    /// Add explicit types to the exported selection.
    pub fn export_types(&mut self, names: &[String]) {
        match &mut self.export_policy {
            TypeExportPolicy::Selected(selection) => {
                selection.extend(names.iter().cloned());
            }
            _ => {
                self.export_policy = TypeExportPolicy::Selected(names.to_vec());
            }
        }
    }

    /// Enable a transport plugin.
    pub fn enable_plugin(&mut self, name: impl Into<String>) {
        self.enabled_plugins.insert(name.into());
    }

    pub fn enabled_plugins(&self) -> impl Iterator<Item = &str> {
        self.enabled_plugins.iter().map(String::as_str)
    }

    pub fn include_dirs(&self) -> impl Iterator<Item = &Path> {
        self.include_dirs.iter().map(PathBuf::as_path)
    }

    pub fn add_include_dirs<I>(&mut self, dirs: I)
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
    }

    /// Register a native header as a type source. The load stays pending
    /// until [`Typekit::perform_pending_loads`] runs.
    pub fn load(&mut self, header: impl Into<PathBuf>) {
        self.pending_loads.push(header.into());
    }

    /// Resolve all pending type sources. Must run before any definition
    /// that needs the types they declare.
    pub fn perform_pending_loads(&mut self) {
        for header in self.pending_loads.drain(..) {
            tracing::debug!(header = %header.display(), "registered type source");
            self.loads.push(header);
        }
    }

    /// Headers registered as type sources.
    pub fn loads(&self) -> impl Iterator<Item = &Path> {
        self.loads.iter().map(PathBuf::as_path)
    }

    /// True if any registered load has not been resolved yet.
    pub fn has_pending_loads(&self) -> bool {
        !self.pending_loads.is_empty()
    }

    /// Record an imported typekit so its types are re-exposed by this one.
    pub fn using_typekit(&mut self, name: &str) {
        if !self.used_typekits.iter().any(|n| n == name) {
            self.used_typekits.push(name.to_string());
        }
    }

    /// Names of the imported typekits.
    pub fn used_typekits(&self) -> impl Iterator<Item = &str> {
        self.used_typekits.iter().map(String::as_str)
    }

    /// Record a library dependency. `link` selects whether the library is
    /// linked into the typekit or only contributes headers.
    pub fn using_library(&mut self, pkg: &PkgInfo, link: bool) {
        if !self.used_libraries.iter().any(|(p, _)| p.name == pkg.name) {
            self.include_dirs.extend(pkg.include_dirs.iter().cloned());
            self.used_libraries.push((pkg.clone(), link));
        }
    }

    /// Build dependencies of the compiled typekit library.
    pub fn dependencies(&self, target: &str) -> Vec<BuildDependency> {
        let mut result = Vec::new();
        for name in &self.used_typekits {
            result.push(
                BuildDependency::new(
                    format!("{}_TYPEKIT", name),
                    naming::typekit_pkg_name(name, target),
                )
                .in_context("core", "include")
                .in_context("core", "link"),
            );
        }
        for (pkg, link) in &self.used_libraries {
            let mut dep =
                BuildDependency::new(pkg.name.clone(), pkg.name.clone()).in_context("core", "include");
            if *link {
                dep.add_context("core", "link");
            }
            result.push(dep);
        }
        result
    }
}
