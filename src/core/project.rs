//! The Project aggregate.
//!
//! One Project instance represents one specification: the task contexts it
//! defines, the typekits and task libraries it imports, the merged type
//! registry and the deployments to generate. All resolution against the
//! package catalog goes through memoization caches so a dependency name is
//! resolved at most once per Project instance, diamond imports included.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::core::build_dep::{self, BuildDependency};
use crate::core::deployment::{Deployment, TaskInstance};
use crate::core::error::{ConfigError, InternalError, ProjectError, SpecError};
use crate::core::imported::{ImportedProject, ImportedTypekit, ProjectModel};
use crate::core::naming;
use crate::core::spec::{
    DeploymentDecl, DetailedLibraryImport, LibraryImport, OperationDecl, PortDecl, ProjectSpec,
    PropertyDecl, TaskDecl, TaskInstanceDecl,
};
use crate::core::standard::{self, DEFAULT_LOGGER_MODEL, DEFAULT_TASK_SUPERCLASS};
use crate::core::task::{Operation, Port, PortDirection, Property, TaskContext};
use crate::core::typekit::{TypeExportPolicy, Typekit};
use crate::locator::{LocateError, PackageLocator, PkgInfo};
use crate::typelib::{OpaqueDef, TypeDef, TypeRegistry};
use crate::util::GenConfig;

/// The root aggregate: one instance per specification.
pub struct Project {
    config: GenConfig,
    locator: Box<dyn PackageLocator>,

    name: Option<String>,
    version: String,
    definition_path: Option<PathBuf>,

    /// All known types, merged from every imported typekit.
    registry: TypeRegistry,
    /// The opaque subset of `registry`.
    opaque_registry: TypeRegistry,
    opaques: Vec<OpaqueDef>,
    /// Types declared directly in the specification.
    own_types: Vec<TypeDef>,

    /// All reachable task models, local and imported, by qualified name.
    tasks: BTreeMap<String, Rc<TaskContext>>,
    /// Task models defined by this project, in declaration order.
    self_tasks: Vec<Rc<TaskContext>>,

    used_libraries: Vec<PkgInfo>,
    /// Subset of `used_libraries` also linked into the typekit.
    typekit_libraries: Vec<PkgInfo>,
    used_typekits: Vec<Rc<ImportedTypekit>>,
    used_task_libraries: Vec<Rc<ImportedProject>>,

    deployers: Vec<Deployment>,
    enabled_transports: BTreeSet<String>,

    // Memoization caches. Once populated for a name, never re-resolved.
    loaded_orogen_projects: HashMap<String, Rc<ImportedProject>>,
    loaded_typekits: HashMap<String, Rc<ImportedTypekit>>,
    known_projects: HashMap<String, (PkgInfo, String)>,
    known_typekits: HashMap<String, (PkgInfo, String, String)>,

    /// Names currently being resolved; re-entering one is a cycle.
    resolving: HashSet<String>,

    typekit: Option<Typekit>,
}

impl Project {
    /// Create an empty project, pre-seeded with the standard task models
    /// and the base `rtt` typekit.
    pub fn new(config: GenConfig, locator: Box<dyn PackageLocator>) -> Result<Self, ProjectError> {
        let mut project = Project {
            config,
            locator,
            name: None,
            version: "0.0".to_string(),
            definition_path: None,
            registry: TypeRegistry::with_standard_cxx_types(),
            opaque_registry: TypeRegistry::new(),
            opaques: Vec::new(),
            own_types: Vec::new(),
            tasks: BTreeMap::new(),
            self_tasks: Vec::new(),
            used_libraries: Vec::new(),
            typekit_libraries: Vec::new(),
            used_typekits: Vec::new(),
            used_task_libraries: Vec::new(),
            deployers: Vec::new(),
            enabled_transports: BTreeSet::new(),
            loaded_orogen_projects: HashMap::new(),
            loaded_typekits: HashMap::new(),
            known_projects: HashMap::new(),
            known_typekits: HashMap::new(),
            resolving: HashSet::new(),
            typekit: None,
        };

        for task in standard::standard_tasks() {
            project.tasks.insert(task.name().to_string(), task);
        }
        let rtt = standard::rtt_typekit();
        project
            .loaded_typekits
            .insert(rtt.name().to_string(), rtt.clone());
        project.using_typekit_handle(rtt)?;

        Ok(project)
    }

    // ------------------------------------------------------------------
    // Identity

    /// Project name, if one has been set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the project name.
    ///
    /// Re-setting is allowed; the name grammar is only enforced at
    /// generation time so a provisional name can be used while the
    /// specification is being assembled. Naming the project also names the
    /// owned typekit if that one is still anonymous.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if let Some(typekit) = &mut self.typekit {
            if typekit.name().is_none() {
                typekit.set_name(&name);
            }
        }
        self.name = Some(name);
    }

    /// Project version, `"0.0"` by default.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Set the project version. Version strings must start with a digit.
    pub fn set_version(&mut self, version: impl Into<String>) -> Result<(), ProjectError> {
        let version = version.into();
        naming::verify_version(&version)?;
        if let Some(typekit) = &mut self.typekit {
            typekit.set_version(&version);
        }
        self.version = version;
        Ok(())
    }

    /// Path of the specification file this project was defined by.
    pub fn definition_path(&self) -> Option<&Path> {
        self.definition_path.as_deref()
    }

    /// Set the specification file path. Re-derives the owned typekit's
    /// work areas.
    pub fn set_definition_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(base_dir) = path.parent().map(Path::to_path_buf) {
            if let Some(typekit) = &mut self.typekit {
                typekit.set_base_dir(base_dir);
            }
        }
        self.definition_path = Some(path);
    }

    /// Directory of the specification file.
    pub fn base_dir(&self) -> Option<&Path> {
        self.definition_path.as_deref().and_then(Path::parent)
    }

    /// The per-run configuration.
    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Resolved target platform for this run.
    pub fn target(&self) -> String {
        self.config.target()
    }

    /// True if the resolved target is gnulinux.
    pub fn is_linux(&self) -> bool {
        self.target() == "gnulinux"
    }

    /// True if the resolved target is xenomai.
    pub fn is_xenomai(&self) -> bool {
        self.target() == "xenomai"
    }

    // ------------------------------------------------------------------
    // Model queries

    /// All reachable task models, by qualified name.
    pub fn tasks(&self) -> impl Iterator<Item = &Rc<TaskContext>> {
        self.tasks.values()
    }

    /// Task models defined in this project, in declaration order.
    pub fn self_tasks(&self) -> &[Rc<TaskContext>] {
        &self.self_tasks
    }

    /// The imported typekits, in import order.
    pub fn used_typekits(&self) -> impl Iterator<Item = &Rc<ImportedTypekit>> {
        self.used_typekits.iter()
    }

    /// The imported task libraries, in import order.
    pub fn used_task_libraries(&self) -> impl Iterator<Item = &Rc<ImportedProject>> {
        self.used_task_libraries.iter()
    }

    /// The external libraries this project build-depends on.
    pub fn used_libraries(&self) -> &[PkgInfo] {
        &self.used_libraries
    }

    /// The deployments declared so far, in declaration order.
    pub fn deployers(&self) -> &[Deployment] {
        &self.deployers
    }

    /// The merged type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The opaque subset of the registry.
    pub fn opaque_registry(&self) -> &TypeRegistry {
        &self.opaque_registry
    }

    /// All opaque declarations, in import order.
    pub fn opaques(&self) -> &[OpaqueDef] {
        &self.opaques
    }

    /// Types declared directly in the specification.
    pub fn own_types(&self) -> &[TypeDef] {
        &self.own_types
    }

    /// Transports enabled on this project.
    pub fn enabled_transports(&self) -> impl Iterator<Item = &str> {
        self.enabled_transports.iter().map(String::as_str)
    }

    /// View this project through the uniform project-model interface.
    pub fn as_model(&self) -> ProjectModel<'_> {
        ProjectModel::Local(self)
    }

    /// True if a task model with this name is known. Locally defined tasks
    /// can be looked up without their namespace.
    pub fn has_task_context(&self, name: &str) -> bool {
        if self.tasks.contains_key(name) {
            return true;
        }
        match &self.name {
            Some(project_name) => self.tasks.contains_key(&format!("{}::{}", project_name, name)),
            None => false,
        }
    }

    /// Find a task model by name.
    ///
    /// The leading namespace can be omitted for tasks defined in this
    /// project, never for imported ones.
    pub fn find_task_context(&self, name: &str) -> Result<Rc<TaskContext>, ProjectError> {
        if let Some(task) = self.tasks.get(name) {
            return Ok(task.clone());
        }
        if let Some(project_name) = &self.name {
            if let Some(task) = self.tasks.get(&format!("{}::{}", project_name, name)) {
                return Ok(task.clone());
            }
        }
        Err(SpecError::TaskNotFound {
            name: name.to_string(),
        }
        .into())
    }

    /// True if the type registry has a namespace of this name.
    pub fn has_namespace(&self, name: &str) -> bool {
        self.registry.has_namespace(name)
    }

    /// True if a deployment with this name was already declared.
    pub fn has_deployment(&self, name: &str) -> bool {
        self.deployers.iter().any(|d| d.name() == name)
    }

    /// Find a type by name. The type must have been defined by an imported
    /// typekit, a specification-level type declaration, or the standard
    /// types.
    pub fn find_type(&self, name: &str) -> Result<&TypeDef, ProjectError> {
        self.registry.get(name).ok_or_else(|| {
            SpecError::TypeNotFound {
                name: TypeRegistry::normalize_typename(name),
            }
            .into()
        })
    }

    /// Find a type and validate that it can be used on a task interface:
    /// static arrays are rejected, and a type owned by an imported typekit
    /// must actually be exported by it.
    pub fn find_interface_type(&self, name: &str) -> Result<&TypeDef, ProjectError> {
        let def = self.find_type(name)?;
        if def.is_array() {
            return Err(SpecError::StaticArrayInterface {
                name: def.name.clone(),
            }
            .into());
        }
        if let Some(typekit) = self.imported_typekit_for(&def.name) {
            debug!(type_name = %def.name, typekit = typekit.name(), "type exported by imported typekit");
            if !typekit.is_interface_type(&def.name) {
                return Err(ConfigError::TypeNotExported {
                    type_name: def.name.clone(),
                    typekit: typekit.name().to_string(),
                }
                .into());
            }
        }
        Ok(def)
    }

    /// The imported typekit defining the given type, if any.
    pub fn imported_typekit_for(&self, typename: &str) -> Option<&Rc<ImportedTypekit>> {
        self.used_typekits.iter().find(|tk| tk.includes(typename))
    }

    /// True if `typename` comes from an imported typekit.
    pub fn imported_type(&self, typename: &str) -> bool {
        self.imported_typekit_for(typename).is_some()
    }

    /// True if any locally defined task requests extended-state support.
    pub fn extended_state_support(&self) -> bool {
        self.self_tasks.iter().any(|t| t.extended_state_support())
    }

    // ------------------------------------------------------------------
    // Catalog predicates

    /// True if the catalog knows a typekit of this name.
    pub fn has_typekit(&mut self, name: &str) -> bool {
        self.orogen_typekit_description(name).is_ok()
    }

    /// True if the catalog knows an oroGen project of this name.
    pub fn has_task_library(&mut self, name: &str) -> bool {
        self.orogen_project_description(name).is_ok()
    }

    /// True if the catalog knows a plain library of this name.
    pub fn has_library(&self, name: &str) -> bool {
        self.locator.contains(name)
    }

    // ------------------------------------------------------------------
    // Resolution

    fn enter_resolution(&mut self, key: String) -> Result<ResolutionGuardKey, ProjectError> {
        if !self.resolving.insert(key.clone()) {
            let name = key.split_once(':').map(|(_, n)| n).unwrap_or(&key);
            return Err(ConfigError::ImportCycle {
                name: name.to_string(),
            }
            .into());
        }
        Ok(ResolutionGuardKey(key))
    }

    fn leave_resolution(&mut self, key: ResolutionGuardKey) {
        self.resolving.remove(&key.0);
    }

    /// Catalog lookup for an oroGen project: `orogen-project-<name>`
    /// first, then the legacy `<name>-tasks-<target>` convention. The
    /// result, including the description file content, is cached.
    pub fn orogen_project_description(
        &mut self,
        name: &str,
    ) -> Result<(PkgInfo, String), ProjectError> {
        if let Some((pkg, content)) = self.known_projects.get(name) {
            return Ok((pkg.clone(), content.clone()));
        }

        let target = self.target();
        let pkg = match self.locator.locate(&naming::project_pkg_name(name)) {
            Ok(pkg) => pkg,
            Err(LocateError::NotFound { .. }) => self
                .locator
                .locate(&naming::tasklib_pkg_name(name, &target))
                .map_err(|_| ConfigError::TaskLibraryNotFound {
                    name: name.to_string(),
                })?,
            Err(LocateError::Failure { message, .. }) => {
                return Err(ConfigError::BadDescription {
                    name: name.to_string(),
                    message,
                }
                .into())
            }
        };

        let path = pkg
            .description_path
            .clone()
            .ok_or_else(|| ConfigError::BadDescription {
                name: name.to_string(),
                message: "package exports no description file".to_string(),
            })?;
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::BadDescription {
            name: name.to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;

        self.known_projects
            .insert(name.to_string(), (pkg.clone(), content.clone()));
        Ok((pkg, content))
    }

    /// Load an installed oroGen project. Resolution is memoized: a second
    /// request for the same name returns the previously resolved handle
    /// without contacting the catalog again.
    pub fn load_orogen_project(&mut self, name: &str) -> Result<Rc<ImportedProject>, ProjectError> {
        if let Some(lib) = self.loaded_orogen_projects.get(name) {
            debug!(project = name, "reusing already loaded oroGen project");
            return Ok(lib.clone());
        }

        let guard = self.enter_resolution(format!("project:{}", name))?;
        let result = self.load_orogen_project_inner(name);
        self.leave_resolution(guard);

        let lib = result?;
        self.loaded_orogen_projects
            .insert(name.to_string(), lib.clone());
        Ok(lib)
    }

    fn load_orogen_project_inner(
        &mut self,
        name: &str,
    ) -> Result<Rc<ImportedProject>, ProjectError> {
        let (pkg, content) = self.orogen_project_description(name)?;
        let spec =
            ProjectSpec::from_toml_str(&content).map_err(|e| ConfigError::BadDescription {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        let lib = ImportedProject::from_spec(Some(pkg), &spec)?;
        debug!(project = name, tasks = lib.self_tasks().len(), "loaded oroGen project");
        Ok(Rc::new(lib))
    }

    /// Load an installed project and require it to define tasks of its
    /// own. A project may exist purely as a typekit.
    pub fn load_task_library(&mut self, name: &str) -> Result<Rc<ImportedProject>, ProjectError> {
        let tasklib = self.load_orogen_project(name)?;
        if !tasklib.defines_tasks() {
            return Err(ConfigError::NotATaskLibrary {
                name: name.to_string(),
            }
            .into());
        }
        Ok(tasklib)
    }

    /// Catalog lookup for a typekit: `<name>-typekit-<target>`. Returns
    /// the package plus the contents of its registry and typelist files;
    /// cached independently from project descriptions.
    pub fn orogen_typekit_description(
        &mut self,
        name: &str,
    ) -> Result<(PkgInfo, String, String), ProjectError> {
        if let Some(cached) = self.known_typekits.get(name) {
            return Ok(cached.clone());
        }

        let target = self.target();
        let pkg = self
            .locator
            .locate(&naming::typekit_pkg_name(name, &target))
            .map_err(|_| ConfigError::TypekitNotFound {
                name: name.to_string(),
            })?;

        let registry_path =
            pkg.type_registry
                .clone()
                .ok_or_else(|| ConfigError::BadDescription {
                    name: name.to_string(),
                    message: "typekit package exports no type registry".to_string(),
                })?;
        let registry_doc =
            std::fs::read_to_string(&registry_path).map_err(|e| ConfigError::BadDescription {
                name: name.to_string(),
                message: format!("{}: {}", registry_path.display(), e),
            })?;
        let typelist_path = registry_path.with_file_name(format!("{}.typelist", name));
        let typelist =
            std::fs::read_to_string(&typelist_path).map_err(|e| ConfigError::BadDescription {
                name: name.to_string(),
                message: format!("{}: {}", typelist_path.display(), e),
            })?;

        let description = (pkg, registry_doc, typelist);
        self.known_typekits
            .insert(name.to_string(), description.clone());
        Ok(description)
    }

    /// Load an installed typekit. Memoized like
    /// [`Project::load_orogen_project`], with an independent key space: a
    /// name may denote both a project and a typekit.
    pub fn load_typekit(&mut self, name: &str) -> Result<Rc<ImportedTypekit>, ProjectError> {
        if let Some(typekit) = self.loaded_typekits.get(name) {
            debug!(typekit = name, "reusing already loaded typekit");
            return Ok(typekit.clone());
        }

        let guard = self.enter_resolution(format!("typekit:{}", name))?;
        let result = self.load_typekit_inner(name);
        self.leave_resolution(guard);

        let typekit = result?;
        self.loaded_typekits
            .insert(name.to_string(), typekit.clone());
        Ok(typekit)
    }

    fn load_typekit_inner(&mut self, name: &str) -> Result<Rc<ImportedTypekit>, ProjectError> {
        let (pkg, registry_doc, typelist) = self.orogen_typekit_description(name)?;
        let typekit = ImportedTypekit::from_raw_data(name, Some(pkg), &registry_doc, &typelist)?;
        debug!(typekit = name, types = typekit.registry().len(), "loaded typekit");
        Ok(Rc::new(typekit))
    }

    // ------------------------------------------------------------------
    // Imports

    /// Make the project build-depend on the given library.
    ///
    /// The library is linked to both the task library and the typekit;
    /// pass `link_typekit = false` to keep it out of the typekit's link
    /// interface.
    pub fn using_library(&mut self, name: &str, link_typekit: bool) -> Result<(), ProjectError> {
        let pkg = self.locator.locate(name).map_err(|err| match err {
            LocateError::NotFound { .. } => ConfigError::LibraryNotFound {
                name: name.to_string(),
            },
            LocateError::Failure { message, .. } => ConfigError::BadDescription {
                name: name.to_string(),
                message,
            },
        })?;

        self.used_libraries.push(pkg.clone());
        if link_typekit {
            self.typekit_libraries.push(pkg.clone());
        }
        if let Some(typekit) = &mut self.typekit {
            typekit.using_library(&pkg, link_typekit);
        }
        Ok(())
    }

    /// Import a typekit by name. A no-op if a typekit of that name was
    /// already imported.
    pub fn using_typekit(&mut self, name: &str) -> Result<Rc<ImportedTypekit>, ProjectError> {
        if let Some(existing) = self.used_typekits.iter().find(|tk| tk.name() == name) {
            return Ok(existing.clone());
        }
        let typekit = self.load_typekit(name)?;
        self.using_typekit_handle(typekit.clone())?;
        Ok(typekit)
    }

    /// Import an already resolved typekit handle: record it, forward the
    /// import to the owned typekit, and merge its registries. A merge that
    /// would redefine an existing type differently fails hard.
    pub fn using_typekit_handle(
        &mut self,
        typekit: Rc<ImportedTypekit>,
    ) -> Result<(), ProjectError> {
        if self
            .used_typekits
            .iter()
            .any(|tk| tk.name() == typekit.name())
        {
            return Ok(());
        }

        debug!(typekit = typekit.name(), "importing typekit");
        if let Some(own) = &mut self.typekit {
            own.using_typekit(typekit.name());
        }
        self.registry.merge(typekit.registry())?;
        self.opaque_registry.merge(typekit.opaque_registry())?;
        self.opaques.extend(typekit.opaques().iter().cloned());
        self.used_typekits.push(typekit);
        Ok(())
    }

    /// Declare that this project uses task models from the given
    /// orogen-generated project.
    ///
    /// The imported project's tasks are registered verbatim (they arrive
    /// pre-qualified), its include paths propagate to the owned typekit,
    /// and its typekits are imported recursively: the library's own
    /// typekit if there is one, then every typekit the library declared.
    /// Memoization guarantees a diamond resolves each shared typekit once.
    pub fn using_task_library(&mut self, name: &str) -> Result<Rc<ImportedProject>, ProjectError> {
        if let Some(existing) = self
            .used_task_libraries
            .iter()
            .find(|lib| lib.name() == name)
        {
            return Ok(existing.clone());
        }

        let tasklib = self.load_task_library(name)?;

        for task in tasklib.tasks() {
            self.tasks.insert(task.name().to_string(), task.clone());
        }
        self.used_task_libraries.push(tasklib.clone());
        if let Some(typekit) = &mut self.typekit {
            let dirs: Vec<PathBuf> = tasklib.include_dirs().cloned().collect();
            typekit.add_include_dirs(dirs);
        }

        if self.has_typekit(name) {
            self.using_typekit(name)?;
        }
        let declared: Vec<String> = tasklib.used_typekits().to_vec();
        for typekit_name in declared {
            self.using_typekit(&typekit_name)?;
        }

        Ok(tasklib)
    }

    /// Import the types defined by `name`: a known typekit is imported
    /// with its compiled marshalling support, anything else is treated as
    /// a native header compiled into the project's own typekit.
    pub fn import_types_from(&mut self, name: &str) -> Result<(), ProjectError> {
        if self.has_typekit(name) {
            self.using_typekit(name)?;
        } else {
            self.typekit_mut().load(name);
        }
        Ok(())
    }

    /// Register a type declared directly in the specification. Goes
    /// through the same merge discipline as typekit imports.
    pub fn register_type(&mut self, def: TypeDef) -> Result<(), ProjectError> {
        if def.is_opaque() {
            self.opaque_registry.add(def.clone())?;
        }
        self.registry.add(def.clone())?;
        if !self.own_types.iter().any(|t| t.name == def.name) {
            self.own_types.push(def);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Owned typekit

    /// The owned typekit, if any types have been defined locally.
    pub fn typekit(&self) -> Option<&Typekit> {
        self.typekit.as_ref()
    }

    /// The owned typekit, created on first use. Creation wires the
    /// project's accumulated state in: name, version, work areas,
    /// transports, include paths, libraries and imported typekits.
    pub fn typekit_mut(&mut self) -> &mut Typekit {
        if self.typekit.is_none() {
            let mut typekit = Typekit::new();
            if let Some(name) = &self.name {
                typekit.set_name(name);
            }
            typekit.set_version(&self.version);
            if let Some(base_dir) = self.base_dir().map(Path::to_path_buf) {
                typekit.set_base_dir(base_dir);
            }
            typekit.set_export_policy(TypeExportPolicy::Used);
            for transport in &self.enabled_transports {
                typekit.enable_plugin(transport);
            }
            let include_dirs: Vec<PathBuf> = self
                .used_task_libraries
                .iter()
                .flat_map(|lib| lib.include_dirs().cloned())
                .collect();
            typekit.add_include_dirs(include_dirs);
            for pkg in &self.used_libraries {
                let link = self.typekit_libraries.iter().any(|p| p.name == pkg.name);
                typekit.using_library(pkg, link);
            }
            for imported in &self.used_typekits {
                typekit.using_typekit(imported.name());
            }
            self.typekit = Some(typekit);
        }
        // Unwrap is safe because we just ensured the typekit exists
        self.typekit.as_mut().unwrap()
    }

    /// Set the typekit's type-export policy. Fails if no typekit exists.
    pub fn type_export_policy(&mut self, policy: TypeExportPolicy) -> Result<(), ProjectError> {
        match &mut self.typekit {
            Some(typekit) => {
                typekit.set_export_policy(policy);
                Ok(())
            }
            None => Err(ConfigError::NoTypekit {
                operation: "type_export_policy".to_string(),
            }
            .into()),
        }
    }

    /// Explicitly select types to export. Fails if no typekit exists.
    pub fn export_types(&mut self, names: &[String]) -> Result<(), ProjectError> {
        match &mut self.typekit {
            Some(typekit) => {
                typekit.export_types(names);
                Ok(())
            }
            None => Err(ConfigError::NoTypekit {
                operation: "export_types".to_string(),
            }
            .into()),
        }
    }

    // ------------------------------------------------------------------
    // Definitions

    /// Define a new task context in the project's namespace.
    ///
    /// The run-wide extended-states default applies unless the declaration
    /// overrides it.
    pub fn task_context(&mut self, decl: &TaskDecl) -> Result<Rc<TaskContext>, ProjectError> {
        let extended = decl
            .extended_states
            .unwrap_or(self.config.extended_states());
        self.define_task(decl, extended)
    }

    /// Register a task context that is being imported, not defined: the
    /// extended-states default does not apply.
    pub fn external_task_context(
        &mut self,
        decl: &TaskDecl,
    ) -> Result<Rc<TaskContext>, ProjectError> {
        self.define_task(decl, decl.extended_states.unwrap_or(false))
    }

    fn define_task(
        &mut self,
        decl: &TaskDecl,
        extended_states: bool,
    ) -> Result<Rc<TaskContext>, ProjectError> {
        let project_name = self.name.clone().ok_or(SpecError::MissingName)?;
        if decl.name == project_name {
            return Err(SpecError::TaskNamedLikeProject {
                name: decl.name.clone(),
            }
            .into());
        }
        naming::verify_valid_identifier(&decl.name)?;
        if self.has_task_context(&decl.name) {
            return Err(SpecError::DuplicateTask {
                name: decl.name.clone(),
            }
            .into());
        }
        if self.has_namespace(&decl.name) {
            return Err(SpecError::NamespaceCollision {
                name: decl.name.clone(),
            }
            .into());
        }

        // Types declared through pending header loads must be available to
        // the interface resolution below.
        if let Some(typekit) = &mut self.typekit {
            typekit.perform_pending_loads();
        }

        let full_name = format!("{}::{}", project_name, decl.name);
        let mut task = TaskContext::new(&full_name);

        let superclass_name = decl
            .superclass
            .as_deref()
            .unwrap_or(DEFAULT_TASK_SUPERCLASS);
        let superclass = self.find_task_context(superclass_name)?;
        task.set_superclass(superclass.name());
        if let Some(origin) = superclass.origin() {
            task.record_used_task_library(origin);
        }

        for port in &decl.input_ports {
            self.add_interface_port(&mut task, port, PortDirection::Input)?;
        }
        for port in &decl.output_ports {
            self.add_interface_port(&mut task, port, PortDirection::Output)?;
        }
        for property in &decl.properties {
            let type_name = self.resolve_interface_type(&mut task, &property.type_name)?;
            task.add_property(Property {
                name: property.name.clone(),
                type_name,
                doc: property.doc.clone(),
            });
        }
        for operation in &decl.operations {
            let resolved = self.resolve_operation(&mut task, operation)?;
            task.add_operation(resolved);
        }

        if extended_states {
            task.enable_extended_state_support();
        }

        let task = Rc::new(task);
        self.tasks.insert(full_name, task.clone());
        self.self_tasks.push(task.clone());
        debug!(task = task.name(), "defined task context");
        Ok(task)
    }

    fn add_interface_port(
        &self,
        task: &mut TaskContext,
        decl: &PortDecl,
        direction: PortDirection,
    ) -> Result<(), ProjectError> {
        let type_name = self.resolve_interface_type(task, &decl.type_name)?;
        task.add_port(Port {
            name: decl.name.clone(),
            direction,
            type_name,
        });
        Ok(())
    }

    /// Resolve a type for use on a task interface and record the typekit
    /// providing it, if any.
    fn resolve_interface_type(
        &self,
        task: &mut TaskContext,
        type_name: &str,
    ) -> Result<String, ProjectError> {
        let resolved = self.find_interface_type(type_name)?.name.clone();
        if let Some(typekit) = self.imported_typekit_for(&resolved) {
            task.record_used_typekit(typekit.name(), typekit.is_virtual());
        }
        Ok(resolved)
    }

    fn resolve_operation(
        &self,
        task: &mut TaskContext,
        decl: &OperationDecl,
    ) -> Result<Operation, ProjectError> {
        let return_type = match &decl.returns {
            Some(type_name) => Some(self.resolve_interface_type(task, type_name)?),
            None => None,
        };
        let mut arguments = Vec::new();
        for argument in &decl.arguments {
            let type_name = self.resolve_interface_type(task, &argument.type_name)?;
            arguments.push((argument.name.clone(), type_name));
        }
        Ok(Operation {
            name: decl.name.clone(),
            return_type,
            arguments,
        })
    }

    /// Define a deployment.
    pub fn deployment(&mut self, decl: &DeploymentDecl) -> Result<(), ProjectError> {
        if let Some(typekit) = &mut self.typekit {
            typekit.perform_pending_loads();
        }
        if self.has_deployment(&decl.name) {
            return Err(SpecError::DuplicateDeployment {
                name: decl.name.clone(),
            }
            .into());
        }

        let mut deployment = Deployment::new(&decl.name);
        for instance in &decl.tasks {
            let model = self.find_task_context(&instance.task)?;
            let mut task = TaskInstance::new(&instance.name, model.name());
            if let Some(period) = instance.period {
                task = task.periodic(period);
            }
            deployment.add_task(task);
        }
        if decl.default_logger {
            let logger = self.find_task_context(DEFAULT_LOGGER_MODEL)?;
            deployment.add_task(TaskInstance::new(
                format!("{}_Logger", decl.name),
                logger.name(),
            ));
        }
        for transport in &self.enabled_transports {
            deployment.enable_transport(transport);
        }
        if decl.install == Some(false) {
            deployment.do_not_install();
        }

        self.deployers.push(deployment);
        Ok(())
    }

    /// Define a deployment with a single task of the given model, plus the
    /// default logger.
    pub fn simple_deployment(&mut self, name: &str, model: &str) -> Result<(), ProjectError> {
        let decl = DeploymentDecl {
            name: name.to_string(),
            tasks: vec![TaskInstanceDecl {
                name: name.to_string(),
                task: model.to_string(),
                period: None,
            }],
            install: None,
            default_logger: true,
        };
        self.deployment(&decl)
    }

    /// Enable transports on the typekit and every deployment declared so
    /// far, then record them for future ones.
    pub fn enable_transports<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if let Some(typekit) = &mut self.typekit {
                typekit.enable_plugin(&name);
            }
            for deployment in &mut self.deployers {
                deployment.enable_transport(&name);
            }
            self.enabled_transports.insert(name);
        }
    }

    /// Find the specification of an installed deployment.
    ///
    /// The catalog advertises the owning project; a deployment the
    /// advertised project does not actually define indicates a broken
    /// installation.
    pub fn load_orogen_deployment(&mut self, name: &str) -> Result<Deployment, ProjectError> {
        let pkg = self
            .locator
            .locate(&naming::deployment_pkg_name(name))
            .map_err(|_| ConfigError::DeploymentNotFound {
                name: name.to_string(),
            })?;
        let project_name = pkg
            .project_name
            .clone()
            .ok_or_else(|| ConfigError::BadDescription {
                name: name.to_string(),
                message: "deployment package names no project".to_string(),
            })?;

        let tasklib = self.load_orogen_project(&project_name)?;
        match tasklib.deployers().iter().find(|d| d.name() == name) {
            Some(deployment) => Ok(deployment.clone()),
            None => {
                let candidates: Vec<&str> =
                    tasklib.deployers().iter().map(|d| d.name()).collect();
                Err(InternalError::DeploymentMissingFromProject {
                    name: name.to_string(),
                    project: project_name,
                    candidates: candidates.join(", "),
                }
                .into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Build-dependency aggregation

    /// Task libraries our own task library depends on, sorted by name.
    pub fn tasklib_used_task_libraries(&self) -> Vec<Rc<ImportedProject>> {
        let names: BTreeSet<&str> = self
            .self_tasks
            .iter()
            .flat_map(|task| task.used_task_libraries())
            .collect();
        let mut result: Vec<Rc<ImportedProject>> = self
            .used_task_libraries
            .iter()
            .filter(|lib| names.contains(lib.name()))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name().cmp(b.name()));
        result
    }

    /// Build dependencies of the generated task library.
    ///
    /// Collects the typekits actually referenced by local task interfaces
    /// (virtual typekits excluded), the used libraries and the task
    /// libraries local tasks depend on, then folds in the owned typekit's
    /// core dependencies include-only: the typekit's link requirements are
    /// internal to the typekit library. The result is deduplicated by
    /// variable name and sorted for deterministic output.
    pub fn tasklib_dependencies(&self, target: &str) -> Vec<BuildDependency> {
        let mut typekit_names = BTreeSet::new();
        for task in &self.self_tasks {
            for (name, is_virtual) in task.used_typekits() {
                if !is_virtual {
                    typekit_names.insert(name.to_string());
                }
            }
        }

        let mut result = Vec::new();
        for name in &typekit_names {
            result.push(
                BuildDependency::new(
                    format!("{}_TYPEKIT", name),
                    naming::typekit_pkg_name(name, target),
                )
                .in_context("core", "include")
                .in_context("core", "link"),
            );
        }
        for pkg in &self.used_libraries {
            result.push(
                BuildDependency::new(pkg.name.clone(), pkg.name.clone())
                    .in_context("core", "include")
                    .in_context("core", "link"),
            );
        }
        for tasklib in self.tasklib_used_task_libraries() {
            result.push(
                BuildDependency::new(
                    format!("{}_TASKLIB", tasklib.name()),
                    naming::tasklib_pkg_name(tasklib.name(), target),
                )
                .in_context("core", "include")
                .in_context("core", "link"),
            );
        }

        let var_names: HashSet<String> =
            result.iter().map(|dep| dep.var_name().to_string()).collect();
        if let Some(typekit) = &self.typekit {
            for dep in typekit.dependencies(target) {
                if !dep.has_context("core") || var_names.contains(dep.var_name()) {
                    continue;
                }
                let mut dep = dep.clone();
                dep.remove_relation("link");
                result.push(dep);
            }
        }

        build_dep::dedupe_sorted(result)
    }

    // ------------------------------------------------------------------
    // Snapshot

    /// Reconstruct a normalized specification document from the resolved
    /// model. Used for the installed copy of the specification.
    pub fn to_spec(&self) -> ProjectSpec {
        let libraries = self
            .used_libraries
            .iter()
            .map(|pkg| {
                let link = self.typekit_libraries.iter().any(|p| p.name == pkg.name);
                if link {
                    LibraryImport::Simple(pkg.name.clone())
                } else {
                    LibraryImport::Detailed(DetailedLibraryImport {
                        name: pkg.name.clone(),
                        typekit: false,
                    })
                }
            })
            .collect();

        let typekits = self
            .used_typekits
            .iter()
            .map(|tk| tk.name().to_string())
            .filter(|name| name != "rtt")
            .collect();

        let import_types = self
            .typekit
            .as_ref()
            .map(|tk| {
                tk.loads()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();

        let tasks = self.self_tasks.iter().map(|task| task_decl(task)).collect();

        let deployments = self
            .deployers
            .iter()
            .map(|deployment| DeploymentDecl {
                name: deployment.name().to_string(),
                tasks: deployment
                    .task_instances()
                    .iter()
                    .map(|instance| TaskInstanceDecl {
                        name: instance.name.clone(),
                        task: instance.model.clone(),
                        period: match instance.activity {
                            crate::core::deployment::Activity::Periodic(period) => Some(period),
                            _ => None,
                        },
                    })
                    .collect(),
                install: if deployment.install() { None } else { Some(false) },
                default_logger: false,
            })
            .collect();

        ProjectSpec {
            name: self.name.clone(),
            version: Some(self.version.clone()),
            libraries,
            typekits,
            task_libraries: self
                .used_task_libraries
                .iter()
                .map(|lib| lib.name().to_string())
                .collect(),
            import_types,
            types: self.own_types.clone(),
            transports: self.enabled_transports.iter().cloned().collect(),
            tasks,
            deployments,
        }
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("tasks", &self.tasks.len())
            .field("self_tasks", &self.self_tasks.len())
            .field("used_typekits", &self.used_typekits.len())
            .field("used_task_libraries", &self.used_task_libraries.len())
            .field("deployers", &self.deployers.len())
            .finish_non_exhaustive()
    }
}

/// Token proving a resolution guard was entered; consumed on leave.
#[derive(Debug)]
struct ResolutionGuardKey(String);

fn task_decl(task: &TaskContext) -> TaskDecl {
    let mut decl = TaskDecl::named(task.basename());
    decl.superclass = task.superclass().map(str::to_string);
    decl.extended_states = Some(task.extended_state_support());
    for port in task.ports() {
        let port_decl = PortDecl {
            name: port.name.clone(),
            type_name: port.type_name.clone(),
        };
        match port.direction {
            PortDirection::Input => decl.input_ports.push(port_decl),
            PortDirection::Output => decl.output_ports.push(port_decl),
        }
    }
    for property in task.properties() {
        decl.properties.push(PropertyDecl {
            name: property.name.clone(),
            type_name: property.type_name.clone(),
            doc: property.doc.clone(),
        });
    }
    for operation in task.operations() {
        decl.operations.push(OperationDecl {
            name: operation.name.clone(),
            returns: operation.return_type.clone(),
            arguments: operation
                .arguments
                .iter()
                .map(|(name, type_name)| crate::core::spec::ArgumentDecl {
                    name: name.clone(),
                    type_name: type_name.clone(),
                })
                .collect(),
        });
    }
    decl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures;
    use crate::test_support::MockLocator;

    fn empty_project() -> Project {
        Project::new(GenConfig::new("."), Box::new(MockLocator::new())).unwrap()
    }

    fn project_with(locator: &MockLocator) -> Project {
        Project::new(
            GenConfig::new(".").with_target("gnulinux"),
            Box::new(locator.clone()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_project_is_seeded() {
        let project = empty_project();
        assert!(project.has_task_context("RTT::TaskContext"));
        assert!(project.registry().contains("/std/string"));
        assert_eq!(project.used_typekits().count(), 1);
        assert!(project.self_tasks().is_empty());
    }

    #[test]
    fn test_version_validation() {
        let mut project = empty_project();
        assert!(project.set_version("0.1").is_ok());
        assert!(project.set_version("v1").is_err());
        assert_eq!(project.version(), "0.1");
    }

    #[test]
    fn test_task_context_registration() {
        let mut project = empty_project();
        project.set_name("cam");

        let task = project.task_context(&TaskDecl::named("Grabber")).unwrap();
        assert_eq!(task.name(), "cam::Grabber");
        assert_eq!(task.superclass(), Some("RTT::TaskContext"));
        assert_eq!(project.self_tasks().len(), 1);
        assert!(project.has_task_context("Grabber"));
        assert!(project.has_task_context("cam::Grabber"));
    }

    #[test]
    fn test_task_named_like_project_is_rejected() {
        let mut project = empty_project();
        project.set_name("cam");

        let err = project.task_context(&TaskDecl::named("cam")).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Spec(SpecError::TaskNamedLikeProject { .. })
        ));
    }

    #[test]
    fn test_duplicate_task_does_not_mutate() {
        let mut project = empty_project();
        project.set_name("cam");
        project.task_context(&TaskDecl::named("Grabber")).unwrap();

        let before = project.tasks().count();
        let err = project.task_context(&TaskDecl::named("Grabber")).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Spec(SpecError::DuplicateTask { .. })
        ));
        assert_eq!(project.tasks().count(), before);
        assert_eq!(project.self_tasks().len(), 1);
    }

    #[test]
    fn test_namespace_collision_is_rejected() {
        let mut project = empty_project();
        project.set_name("cam");
        project
            .register_type(TypeDef::compound("/Frame/Header", &[("stamp", "/double")]))
            .unwrap();

        let err = project.task_context(&TaskDecl::named("Frame")).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Spec(SpecError::NamespaceCollision { .. })
        ));
        assert!(!project.has_task_context("Frame"));
    }

    #[test]
    fn test_port_type_resolution_records_typekit() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_typekit(&locator, tmp.path(), "base", "gnulinux");

        let mut project = project_with(&locator);
        project.set_name("cam");
        project.using_typekit("base").unwrap();

        let mut decl = TaskDecl::named("Grabber");
        decl.output_ports.push(PortDecl {
            name: "frame".to_string(),
            type_name: "/base/Time".to_string(),
        });
        let task = project.task_context(&decl).unwrap();

        let typekits: Vec<(&str, bool)> = task.used_typekits().collect();
        assert_eq!(typekits, [("base", false)]);
    }

    #[test]
    fn test_static_array_is_not_an_interface_type() {
        let mut project = empty_project();
        project.set_name("cam");
        project
            .register_type(TypeDef {
                name: "/cam/Buffer".to_string(),
                kind: crate::typelib::TypeKind::Array {
                    element: "/double".to_string(),
                    size: 64,
                },
            })
            .unwrap();

        let mut decl = TaskDecl::named("Grabber");
        decl.output_ports.push(PortDecl {
            name: "buffer".to_string(),
            type_name: "/cam/Buffer".to_string(),
        });
        let err = project.task_context(&decl).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Spec(SpecError::StaticArrayInterface { .. })
        ));
    }

    #[test]
    fn test_non_exported_type_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        // /base/Internal is defined but missing from the typelist.
        fixtures::install_typekit_with(
            &locator,
            tmp.path(),
            "base",
            "gnulinux",
            fixtures::BASE_REGISTRY_DOC,
            "/base/Time\n",
        );

        let mut project = project_with(&locator);
        project.set_name("cam");
        project.using_typekit("base").unwrap();

        let mut decl = TaskDecl::named("Grabber");
        decl.output_ports.push(PortDecl {
            name: "internal".to_string(),
            type_name: "/base/Joints".to_string(),
        });
        let err = project.task_context(&decl).unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Config(ConfigError::TypeNotExported { .. })
        ));
    }

    #[test]
    fn test_using_typekit_is_memoized() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_typekit(&locator, tmp.path(), "base", "gnulinux");

        let mut project = project_with(&locator);
        let first = project.using_typekit("base").unwrap();
        let second = project.using_typekit("base").unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(locator.lookup_count("base-typekit-gnulinux"), 1);
        assert_eq!(
            project
                .used_typekits()
                .filter(|tk| tk.name() == "base")
                .count(),
            1
        );
    }

    #[test]
    fn test_using_task_library_merges_tasks() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_task_library(&locator, tmp.path(), "upstream", "gnulinux", &[]);

        let mut project = project_with(&locator);
        project.set_name("cam");

        let tasklib = project.using_task_library("upstream").unwrap();
        assert_eq!(tasklib.name(), "upstream");
        assert!(project.has_task_context("upstream::Base"));
        assert_eq!(project.used_task_libraries().count(), 1);
        // Imported tasks are not ours.
        assert!(project.self_tasks().is_empty());
    }

    #[test]
    fn test_using_task_library_is_memoized() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_task_library(&locator, tmp.path(), "upstream", "gnulinux", &[]);

        let mut project = project_with(&locator);
        project.set_name("cam");
        let first = project.using_task_library("upstream").unwrap();
        let second = project.using_task_library("upstream").unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(locator.lookup_count("orogen-project-upstream"), 1);
        assert_eq!(project.used_task_libraries().count(), 1);
    }

    #[test]
    fn test_reentrant_resolution_fails_fast() {
        let mut project = empty_project();
        let guard = project
            .enter_resolution("project:loop".to_string())
            .unwrap();

        let err = project
            .enter_resolution("project:loop".to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Config(ConfigError::ImportCycle { .. })
        ));

        // Leaving the guard makes the name resolvable again.
        project.leave_resolution(guard);
        assert!(project.enter_resolution("project:loop".to_string()).is_ok());
    }

    #[test]
    fn test_using_task_library_not_found_leaves_model_unchanged() {
        let locator = MockLocator::new();
        let mut project = project_with(&locator);
        project.set_name("cam");

        let err = project.using_task_library("upstream").unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Config(ConfigError::TaskLibraryNotFound { .. })
        ));
        assert_eq!(project.used_task_libraries().count(), 0);
    }

    #[test]
    fn test_typekit_only_project_is_not_a_task_library() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_project(
            &locator,
            tmp.path(),
            "types_only",
            "name = \"types_only\"\nversion = \"0.1\"\n",
        );

        let mut project = project_with(&locator);
        let err = project.using_task_library("types_only").unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Config(ConfigError::NotATaskLibrary { .. })
        ));
    }

    #[test]
    fn test_diamond_import_resolves_shared_typekit_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_typekit(&locator, tmp.path(), "base", "gnulinux");
        fixtures::install_task_library(&locator, tmp.path(), "left", "gnulinux", &["base"]);
        fixtures::install_task_library(&locator, tmp.path(), "right", "gnulinux", &["base"]);

        let mut project = project_with(&locator);
        project.set_name("cam");
        project.using_task_library("left").unwrap();
        project.using_task_library("right").unwrap();

        assert_eq!(
            project
                .used_typekits()
                .filter(|tk| tk.name() == "base")
                .count(),
            1
        );
        assert_eq!(locator.lookup_count("base-typekit-gnulinux"), 1);
        // The shared types merged exactly once, without conflicts.
        assert!(project.registry().contains("/base/Time"));
    }

    #[test]
    fn test_tasklib_dependencies_for_simple_project() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        locator.add(PkgInfo::new("opencv", tmp.path()));

        let mut project = project_with(&locator);
        project.set_name("cam");
        project.using_library("opencv", true).unwrap();
        project.task_context(&TaskDecl::named("Grabber")).unwrap();

        let deps = project.tasklib_dependencies("gnulinux");
        let opencv = deps.iter().find(|d| d.var_name() == "opencv").unwrap();
        assert_eq!(opencv.pkg_name(), "opencv");
        assert!(opencv.has_relation("core", "include"));
        assert!(opencv.has_relation("core", "link"));
    }

    #[test]
    fn test_tasklib_dependencies_are_order_independent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        locator.add(PkgInfo::new("opencv", tmp.path()));
        locator.add(PkgInfo::new("audio", tmp.path()));
        fixtures::install_typekit(&locator, tmp.path(), "base", "gnulinux");

        let build = |library_order: [&str; 2]| {
            let mut project = project_with(&locator);
            project.set_name("cam");
            for lib in library_order {
                project.using_library(lib, true).unwrap();
            }
            project.using_typekit("base").unwrap();
            let mut decl = TaskDecl::named("Grabber");
            decl.output_ports.push(PortDecl {
                name: "time".to_string(),
                type_name: "/base/Time".to_string(),
            });
            project.task_context(&decl).unwrap();
            project.tasklib_dependencies("gnulinux")
        };

        let forward = build(["opencv", "audio"]);
        let reverse = build(["audio", "opencv"]);
        assert_eq!(forward, reverse);
        assert_eq!(forward[0].var_name(), "audio");
    }

    #[test]
    fn test_typekit_core_deps_are_include_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_typekit(&locator, tmp.path(), "base", "gnulinux");

        let mut project = project_with(&locator);
        project.set_name("cam");
        // Imported typekit, but no task interface references its types:
        // the typekit pulls it in, the task library needs headers only.
        project.using_typekit("base").unwrap();
        project.typekit_mut();
        project.task_context(&TaskDecl::named("Grabber")).unwrap();

        let deps = project.tasklib_dependencies("gnulinux");
        let base = deps.iter().find(|d| d.var_name() == "base_TYPEKIT").unwrap();
        assert!(base.has_relation("core", "include"));
        assert!(!base.has_relation("core", "link"));
    }

    #[test]
    fn test_deployment_definition_and_duplicates() {
        let mut project = empty_project();
        project.set_name("cam");
        project.task_context(&TaskDecl::named("Grabber")).unwrap();

        project.simple_deployment("cam_test", "Grabber").unwrap();
        assert!(project.has_deployment("cam_test"));
        let deployment = &project.deployers()[0];
        // The requested task plus the default logger.
        assert_eq!(deployment.task_instances().len(), 2);
        assert_eq!(deployment.task_instances()[0].model, "cam::Grabber");

        let err = project
            .deployment(&DeploymentDecl {
                name: "cam_test".to_string(),
                ..DeploymentDecl::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Spec(SpecError::DuplicateDeployment { .. })
        ));
    }

    #[test]
    fn test_enable_transports_propagates() {
        let mut project = empty_project();
        project.set_name("cam");
        project.task_context(&TaskDecl::named("Grabber")).unwrap();
        project.simple_deployment("cam_test", "Grabber").unwrap();

        project.typekit_mut();
        project.enable_transports(["corba"]);

        assert!(project.enabled_transports().any(|t| t == "corba"));
        assert!(project.deployers()[0].transports().any(|t| t == "corba"));
        assert!(project
            .typekit()
            .unwrap()
            .enabled_plugins()
            .any(|t| t == "corba"));
    }

    #[test]
    fn test_load_orogen_deployment_detects_broken_description() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        fixtures::install_task_library(&locator, tmp.path(), "upstream", "gnulinux", &[]);

        // The catalog advertises a deployment the project does not define.
        let mut pkg = PkgInfo::new("orogen-ghost", tmp.path());
        pkg.project_name = Some("upstream".to_string());
        locator.add(pkg);

        let mut project = project_with(&locator);
        let err = project.load_orogen_deployment("ghost").unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Internal(InternalError::DeploymentMissingFromProject { .. })
        ));
    }

    #[test]
    fn test_snapshot_reflects_resolved_model() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = MockLocator::new();
        locator.add(PkgInfo::new("opencv", tmp.path()));

        let mut project = project_with(&locator);
        project.set_name("cam");
        project.set_version("0.1").unwrap();
        project.using_library("opencv", true).unwrap();
        project.task_context(&TaskDecl::named("Grabber")).unwrap();

        let spec = project.to_spec();
        assert_eq!(spec.name.as_deref(), Some("cam"));
        assert_eq!(spec.libraries.len(), 1);
        assert_eq!(spec.tasks.len(), 1);
        assert_eq!(spec.tasks[0].name, "Grabber");
        // The built-in rtt typekit is implicit, not part of the snapshot.
        assert!(spec.typekits.iter().all(|name| name != "rtt"));
    }
}
