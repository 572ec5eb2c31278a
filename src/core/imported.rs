//! Imported projects and typekits.
//!
//! Installed oroGen packages answer the same queries as the project under
//! generation: name, task models, typekits, dependencies. The two variants
//! are kept as distinct types and unified by [`ProjectModel`] where a
//! caller does not care which one it holds.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::core::deployment::{Deployment, TaskInstance};
use crate::core::error::{ConfigError, ProjectError};
use crate::core::project::Project;
use crate::core::spec::ProjectSpec;
use crate::core::task::{Port, PortDirection, Property, TaskContext};
use crate::locator::PkgInfo;
use crate::typelib::{OpaqueDef, TypeRegistry};

/// A typekit installed on the system, loaded from its exported
/// type-registry and typelist files.
#[derive(Debug, Clone)]
pub struct ImportedTypekit {
    name: String,
    pkg: Option<PkgInfo>,
    registry: TypeRegistry,
    opaque_registry: TypeRegistry,
    opaques: Vec<OpaqueDef>,
    /// Types actually exported to the runtime type system.
    typelist: BTreeSet<String>,
    /// Header-only typekits contribute types without a link-time
    /// dependency.
    is_virtual: bool,
}

impl ImportedTypekit {
    /// Build a typekit handle from the raw contents of its description
    /// files.
    pub fn from_raw_data(
        name: impl Into<String>,
        pkg: Option<PkgInfo>,
        registry_doc: &str,
        typelist: &str,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let (registry, opaques) =
            TypeRegistry::from_doc_str(registry_doc).map_err(|e| ConfigError::BadDescription {
                name: name.clone(),
                message: e.to_string(),
            })?;

        let typelist = typelist
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(TypeRegistry::normalize_typename)
            .collect();

        let is_virtual = pkg
            .as_ref()
            .and_then(|pkg| pkg.variable("virtual"))
            .is_some_and(|value| value == "1" || value == "true");

        Ok(ImportedTypekit {
            name,
            pkg,
            opaque_registry: registry.opaque_subset(),
            registry,
            opaques,
            typelist,
            is_virtual,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pkg(&self) -> Option<&PkgInfo> {
        self.pkg.as_ref()
    }

    /// All types this typekit defines.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The opaque subset of the registry.
    pub fn opaque_registry(&self) -> &TypeRegistry {
        &self.opaque_registry
    }

    /// The opaque declarations shipped with the typekit.
    pub fn opaques(&self) -> &[OpaqueDef] {
        &self.opaques
    }

    /// Mark the typekit as header-only. Used for built-in typekits that
    /// have no package description to carry the flag.
    pub fn make_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// True if this typekit contributes types without a link-time
    /// dependency.
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// True if the typekit defines the given type.
    pub fn includes(&self, typename: &str) -> bool {
        self.registry.contains(typename)
    }

    /// True if the given type is exported to the runtime type system and
    /// can therefore be used on a task interface.
    pub fn is_interface_type(&self, typename: &str) -> bool {
        self.typelist
            .contains(&TypeRegistry::normalize_typename(typename))
    }
}

/// An installed oroGen project, loaded from its description file.
#[derive(Debug, Clone)]
pub struct ImportedProject {
    name: String,
    version: String,
    pkg: Option<PkgInfo>,
    tasks: BTreeMap<String, Rc<TaskContext>>,
    self_tasks: Vec<Rc<TaskContext>>,
    used_typekits: Vec<String>,
    deployers: Vec<Deployment>,
}

impl ImportedProject {
    /// Interpret a parsed description document as an imported project.
    ///
    /// The interpretation is shallow: task models and typekit names are
    /// recorded as declared, without re-resolving the imported project's
    /// own imports. The importing project triggers those recursively.
    pub fn from_spec(pkg: Option<PkgInfo>, spec: &ProjectSpec) -> Result<Self, ProjectError> {
        let name = spec.name.clone().ok_or_else(|| ConfigError::BadDescription {
            name: pkg
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "<anonymous>".to_string()),
            message: "description declares no project name".to_string(),
        })?;

        let mut tasks = BTreeMap::new();
        let mut self_tasks = Vec::new();
        for decl in &spec.tasks {
            let full_name = format!("{}::{}", name, decl.name);
            let mut task = TaskContext::new(&full_name).with_origin(&name);
            if let Some(superclass) = &decl.superclass {
                task.set_superclass(superclass);
            }
            if decl.extended_states.unwrap_or(false) {
                task.enable_extended_state_support();
            }
            for port in &decl.input_ports {
                task.add_port(Port {
                    name: port.name.clone(),
                    direction: PortDirection::Input,
                    type_name: TypeRegistry::normalize_typename(&port.type_name),
                });
            }
            for port in &decl.output_ports {
                task.add_port(Port {
                    name: port.name.clone(),
                    direction: PortDirection::Output,
                    type_name: TypeRegistry::normalize_typename(&port.type_name),
                });
            }
            for property in &decl.properties {
                task.add_property(Property {
                    name: property.name.clone(),
                    type_name: TypeRegistry::normalize_typename(&property.type_name),
                    doc: property.doc.clone(),
                });
            }
            let task = Rc::new(task);
            tasks.insert(full_name, task.clone());
            self_tasks.push(task);
        }

        let mut deployers = Vec::new();
        for decl in &spec.deployments {
            let mut deployment = Deployment::new(&decl.name);
            for instance in &decl.tasks {
                deployment.add_task(TaskInstance::new(&instance.name, &instance.task));
            }
            if decl.install == Some(false) {
                deployment.do_not_install();
            }
            deployers.push(deployment);
        }

        Ok(ImportedProject {
            name,
            version: spec.version.clone().unwrap_or_else(|| "0.0".to_string()),
            pkg,
            tasks,
            self_tasks,
            used_typekits: spec.typekits.clone(),
            deployers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn pkg(&self) -> Option<&PkgInfo> {
        self.pkg.as_ref()
    }

    /// All task models this project makes available.
    pub fn tasks(&self) -> impl Iterator<Item = &Rc<TaskContext>> {
        self.tasks.values()
    }

    /// Task models defined by this project itself.
    pub fn self_tasks(&self) -> &[Rc<TaskContext>] {
        &self.self_tasks
    }

    /// True if this project defines task models of its own. A project may
    /// exist purely as a typekit.
    pub fn defines_tasks(&self) -> bool {
        !self.self_tasks.is_empty()
    }

    /// Names of the typekits this project declared as used.
    pub fn used_typekits(&self) -> &[String] {
        &self.used_typekits
    }

    /// Deployments advertised by this project.
    pub fn deployers(&self) -> &[Deployment] {
        &self.deployers
    }

    /// Include directories exported by the installed package.
    pub fn include_dirs(&self) -> impl Iterator<Item = &std::path::PathBuf> {
        self.pkg.iter().flat_map(|pkg| pkg.include_dirs.iter())
    }
}

/// Uniform view over the project under generation and an imported one.
#[derive(Debug, Clone, Copy)]
pub enum ProjectModel<'a> {
    Local(&'a Project),
    Imported(&'a ImportedProject),
}

impl<'a> ProjectModel<'a> {
    /// Project name, if set.
    pub fn name(&self) -> Option<&str> {
        match self {
            ProjectModel::Local(project) => project.name(),
            ProjectModel::Imported(imported) => Some(imported.name()),
        }
    }

    /// Task models defined by the project itself.
    pub fn self_tasks(&self) -> Vec<Rc<TaskContext>> {
        match self {
            ProjectModel::Local(project) => project.self_tasks().to_vec(),
            ProjectModel::Imported(imported) => imported.self_tasks().to_vec(),
        }
    }

    /// Names of the typekits the project uses.
    pub fn used_typekit_names(&self) -> Vec<String> {
        match self {
            ProjectModel::Local(project) => project
                .used_typekits()
                .map(|tk| tk.name().to_string())
                .collect(),
            ProjectModel::Imported(imported) => imported.used_typekits().to_vec(),
        }
    }

    /// True if the project defines task models of its own.
    pub fn defines_tasks(&self) -> bool {
        !self.self_tasks().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY_DOC: &str = r#"
[[types]]
name = "/base/Time"
kind = "compound"
fields = [{ name = "seconds", type = "/int64_t" }]

[[types]]
name = "/base/Joints"
kind = "compound"
fields = [{ name = "positions", type = "/std/vector</double>" }]

[[opaques]]
name = "/boost/shared_ptr"
intermediate = "/base/Time"
"#;

    #[test]
    fn test_typekit_from_raw_data() {
        let typekit = ImportedTypekit::from_raw_data(
            "base",
            None,
            REGISTRY_DOC,
            "/base/Time\n# comment\n\n/base/Joints\n",
        )
        .unwrap();

        assert!(typekit.includes("/base/Time"));
        assert!(typekit.is_interface_type("base::Time"));
        assert!(!typekit.is_virtual());
        assert_eq!(typekit.opaques().len(), 1);
        assert!(typekit.opaque_registry().is_empty());
    }

    #[test]
    fn test_typekit_non_exported_type() {
        let typekit =
            ImportedTypekit::from_raw_data("base", None, REGISTRY_DOC, "/base/Time\n").unwrap();

        assert!(typekit.includes("/base/Joints"));
        assert!(!typekit.is_interface_type("/base/Joints"));
    }

    #[test]
    fn test_virtual_flag_from_pkg_variable() {
        let mut pkg = PkgInfo::new("base-typekit-gnulinux", "/opt/rock");
        pkg.variables.insert("virtual".to_string(), "1".to_string());

        let typekit =
            ImportedTypekit::from_raw_data("base", Some(pkg), REGISTRY_DOC, "").unwrap();
        assert!(typekit.is_virtual());
    }

    #[test]
    fn test_imported_project_qualifies_tasks() {
        let spec = ProjectSpec::from_toml_str(
            r#"
name = "upstream"
typekits = ["base"]

[[tasks]]
name = "Base"
"#,
        )
        .unwrap();

        let imported = ImportedProject::from_spec(None, &spec).unwrap();
        assert_eq!(imported.name(), "upstream");
        assert!(imported.defines_tasks());
        assert_eq!(imported.self_tasks()[0].name(), "upstream::Base");
        assert_eq!(imported.self_tasks()[0].origin(), Some("upstream"));
        assert_eq!(imported.used_typekits(), ["base"]);
    }

    #[test]
    fn test_imported_project_requires_name() {
        let spec = ProjectSpec::from_toml_str("version = \"0.1\"").unwrap();
        let err = ImportedProject::from_spec(None, &spec).unwrap_err();
        assert!(err.to_string().contains("no project name"));
    }

    #[test]
    fn test_project_model_over_imported() {
        let spec = ProjectSpec::from_toml_str(
            r#"
name = "upstream"

[[tasks]]
name = "Base"
"#,
        )
        .unwrap();
        let imported = ImportedProject::from_spec(None, &spec).unwrap();

        let model = ProjectModel::Imported(&imported);
        assert_eq!(model.name(), Some("upstream"));
        assert!(model.defines_tasks());
    }
}
