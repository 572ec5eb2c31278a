//! Generation pipeline.
//!
//! `Project::generate` walks the fully resolved model in a fixed stage
//! order. Stage 4 is the feedback point: the generated task-state header
//! is registered back into the type system before the typekit stage runs.
//! Any stage failure aborts the pipeline; files already written stay on
//! disk and the run is re-invoked from scratch after the fix.

pub mod build_system;
pub mod emitter;
pub mod render;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::error::{ProjectError, SpecError};
use crate::core::naming;
use crate::core::project::Project;
use crate::typelib::TypeDef;

pub use emitter::{bindings, ArtifactStore, Bindings, FsArtifacts, GenError, TemplateRenderer};
pub use render::PlainRenderer;

/// Outcome of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Target the run was generated for.
    pub target: String,

    /// Package identifiers downstream projects can resolve.
    pub package_ids: Vec<String>,

    /// Stale automatic-area files removed at the end of the run.
    pub stale_files: Vec<PathBuf>,
}

/// Enumeration values every generated task-state type starts from.
const TASK_STATE_VALUES: &[&str] = &[
    "INIT",
    "PRE_OPERATIONAL",
    "FATAL_ERROR",
    "EXCEPTION",
    "STOPPED",
    "RUNNING",
    "RUNTIME_ERROR",
];

impl Project {
    /// Generate the project's source tree.
    pub fn generate(
        &mut self,
        renderer: &dyn TemplateRenderer,
        artifacts: &mut dyn ArtifactStore,
    ) -> Result<GenerationReport, ProjectError> {
        // Stage 1: preconditions. The name grammar is only enforced here
        // so specification evaluation can work with a provisional name.
        let name = self
            .name()
            .ok_or(SpecError::MissingName)?
            .to_string();
        naming::verify_project_name(&name)?;
        let deffile = self
            .definition_path()
            .ok_or(SpecError::MissingDefinitionFile)?
            .to_path_buf();
        if !deffile.is_file() {
            warn!(path = %deffile.display(), "specification file does not exist, generating a stub project");
        }

        // The target is resolved once and reused by every stage.
        let target = self.target();
        info!(project = %name, target = %target, "generating");

        // Stage 2: normalized copy of the specification, used for
        // install/up-to-date tracking.
        let snapshot = self.spec_snapshot();
        let snapshot_name = deffile
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.orogen", name));
        artifacts.save_automatic(&snapshot_name, &snapshot)?;

        // Stage 3: install shims from previous runs.
        artifacts.remove_stale_install_shims(&name)?;

        // Stage 4: feedback. The state enumeration header is generated,
        // then folded back into the type system so the typekit stage sees
        // the state types.
        if self.extended_state_support() {
            let task_names = self
                .self_tasks()
                .iter()
                .filter(|task| task.extended_state_support())
                .map(|task| task.basename().to_string())
                .collect::<Vec<String>>();
            let text = renderer.render(
                "tasks/TaskStates.hpp",
                &bindings([
                    ("project", name.clone()),
                    ("tasks", task_names.join(";")),
                ]),
            )?;
            let header = artifacts.save_automatic(&format!("{}TaskStates.hpp", name), &text)?;
            self.register_state_types(&name, &task_names)?;
            let typekit = self.typekit_mut();
            typekit.load(header);
            typekit.perform_pending_loads();
        }

        // Stage 5: typekit.
        let mut package_ids = vec![naming::project_pkg_name(&name)];
        if self.typekit().is_some() {
            self.generate_typekit(&name, &target, renderer, artifacts)?;
            package_ids.push(naming::typekit_pkg_name(&name, &target));
        }

        // Stage 6: project package metadata.
        let text = renderer.render(
            "project.pc",
            &bindings([
                ("name", name.clone()),
                ("version", self.version().to_string()),
            ]),
        )?;
        artifacts.save_automatic(&format!("orogen-project-{}.pc.in", name), &text)?;

        // Stage 7: task library.
        if !self.self_tasks().is_empty() {
            self.generate_task_library(&name, &target, renderer, artifacts)?;
            package_ids.push(naming::tasklib_pkg_name(&name, &target));
        }

        // Stage 8: user-owned ancillary files.
        let text = renderer.render("gitignore", &bindings([]))?;
        artifacts.save_user(".gitignore", &text)?;
        let text = renderer.render("Doxyfile.in", &bindings([("name", name.clone())]))?;
        artifacts.save_user("Doxyfile.in", &text)?;

        // Stage 9: deployments.
        for deployment in self.deployers() {
            let tasks = deployment
                .task_instances()
                .iter()
                .map(|instance| format!("{}:{}", instance.name, instance.model))
                .collect::<Vec<String>>()
                .join(";");
            let text = renderer.render(
                "deployment/main.cpp",
                &bindings([
                    ("deployment", deployment.name().to_string()),
                    ("tasks", tasks),
                ]),
            )?;
            artifacts.save_automatic(&format!("deployments/{}/main.cpp", deployment.name()), &text)?;
        }

        // Stage 10: build system.
        build_system::generate(self, &name, &target, renderer, artifacts)?;

        // Stage 11: automatic-area cleanup.
        let stale_files = artifacts.cleanup_automatic()?;
        if !stale_files.is_empty() {
            info!(count = stale_files.len(), "removed stale generated files");
        }

        Ok(GenerationReport {
            target,
            package_ids,
            stale_files,
        })
    }

    /// The normalized specification document emitted in stage 2, with the
    /// command line that produced it echoed on top.
    fn spec_snapshot(&self) -> String {
        let mut out = String::from("# generated by orogen, do not edit\n");
        if !self.config().command_line().is_empty() {
            out.push_str(&format!(
                "# command line: {}\n",
                self.config().command_line().join(" ")
            ));
        }
        out.push('\n');
        out.push_str(&self.to_spec().to_toml_string());
        out
    }

    /// Register the generated state enumerations through the normal
    /// type-registration path.
    fn register_state_types(
        &mut self,
        project_name: &str,
        task_names: &[String],
    ) -> Result<(), ProjectError> {
        for task in task_names {
            let type_name = format!("/{}/{}_STATES", project_name, task);
            let values: Vec<String> = TASK_STATE_VALUES
                .iter()
                .map(|state| format!("{}_{}", task, state))
                .collect();
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            self.register_type(TypeDef::enumeration(type_name, &values))?;
        }
        Ok(())
    }

    fn generate_typekit(
        &self,
        name: &str,
        target: &str,
        renderer: &dyn TemplateRenderer,
        artifacts: &mut dyn ArtifactStore,
    ) -> Result<(), ProjectError> {
        let exported = self
            .own_types()
            .iter()
            .map(|def| def.name.clone())
            .collect::<Vec<String>>()
            .join(";");

        let text = renderer.render(
            "typekit/Typekit.hpp",
            &bindings([("name", name.to_string()), ("types", exported)]),
        )?;
        artifacts.save_automatic(&format!("typekit/{}Typekit.hpp", name), &text)?;

        let text = renderer.render("typekit/Typekit.cpp", &bindings([("name", name.to_string())]))?;
        artifacts.save_automatic(&format!("typekit/{}Typekit.cpp", name), &text)?;

        let text = renderer.render(
            "typekit/typekit.pc",
            &bindings([
                ("name", name.to_string()),
                ("version", self.version().to_string()),
                ("target", target.to_string()),
            ]),
        )?;
        artifacts.save_automatic(&format!("typekit/{}-typekit.pc.in", name), &text)?;
        Ok(())
    }

    fn generate_task_library(
        &self,
        name: &str,
        target: &str,
        renderer: &dyn TemplateRenderer,
        artifacts: &mut dyn ArtifactStore,
    ) -> Result<(), ProjectError> {
        for task in self.self_tasks() {
            let task_bindings = bindings([
                ("project", name.to_string()),
                ("task", task.basename().to_string()),
                (
                    "superclass",
                    task.superclass().unwrap_or("RTT::TaskContext").to_string(),
                ),
            ]);
            let text = renderer.render("tasks/Task.hpp", &task_bindings)?;
            artifacts.save_automatic(&format!("tasks/{}.hpp", task.basename()), &text)?;
            let text = renderer.render("tasks/Task.cpp", &task_bindings)?;
            artifacts.save_automatic(&format!("tasks/{}.cpp", task.basename()), &text)?;
        }

        let task_names = self
            .self_tasks()
            .iter()
            .map(|task| task.basename().to_string())
            .collect::<Vec<String>>()
            .join(";");
        let text = renderer.render(
            "tasks/DeployerComponent.cpp",
            &bindings([("project", name.to_string()), ("tasks", task_names)]),
        )?;
        artifacts.save_automatic("tasks/DeployerComponent.cpp", &text)?;

        let requires = self
            .tasklib_dependencies(target)
            .iter()
            .map(|dep| dep.pkg_name().to_string())
            .collect::<Vec<String>>()
            .join(", ");
        let text = renderer.render(
            "tasks/tasks.pc",
            &bindings([
                ("name", name.to_string()),
                ("version", self.version().to_string()),
                ("target", target.to_string()),
                ("requires", requires),
            ]),
        )?;
        artifacts.save_automatic(&format!("tasks/{}-tasks.pc.in", name), &text)?;
        Ok(())
    }
}
