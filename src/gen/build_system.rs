//! Build-system generation (pipeline stage 10).
//!
//! The cmake configuration is derived from the same resolved model as
//! everything else: the library/include directives come straight from the
//! aggregated BuildDependency list.

use crate::core::error::ProjectError;
use crate::core::project::Project;
use crate::gen::emitter::{bindings, ArtifactStore, TemplateRenderer};

/// Support files copied verbatim into the configuration directory.
const CMAKE_SUPPORT_CONFIG: &[&str] = &["OrogenPkgCheck.cmake"];

/// Configuration files generated per project, prefixed with its name.
const CMAKE_GENERATED_CONFIG: &[&str] = &["Base.cmake", "TaskLib.cmake"];

pub(crate) fn generate(
    project: &Project,
    name: &str,
    target: &str,
    renderer: &dyn TemplateRenderer,
    artifacts: &mut dyn ArtifactStore,
) -> Result<(), ProjectError> {
    let deps = project.tasklib_dependencies(target);

    let dependencies = deps
        .iter()
        .map(|dep| format!("orogen_pkg_check_modules({} REQUIRED {})\n", dep.var_name(), dep.pkg_name()))
        .collect::<String>();
    let include_vars = deps
        .iter()
        .filter(|dep| dep.has_relation("core", "include"))
        .map(|dep| dep.var_name())
        .collect::<Vec<&str>>()
        .join(";");
    let link_vars = deps
        .iter()
        .filter(|dep| dep.has_relation("core", "link"))
        .map(|dep| dep.var_name())
        .collect::<Vec<&str>>()
        .join(";");

    for support in CMAKE_SUPPORT_CONFIG {
        let template_id = format!("config/{}", support);
        let text = renderer.render(&template_id, &bindings([]))?;
        artifacts.save_automatic(&template_id, &text)?;
    }

    for file in CMAKE_GENERATED_CONFIG {
        let template_id = format!("config/{}", file);
        let text = renderer.render(
            &template_id,
            &bindings([
                ("project", name.to_string()),
                ("version", project.version().to_string()),
                ("target", target.to_string()),
                ("dependencies", dependencies.clone()),
                ("include_vars", include_vars.clone()),
                ("link_vars", link_vars.clone()),
            ]),
        )?;
        artifacts.save_automatic(&format!("config/{}{}", name, file), &text)?;
    }

    if !project.self_tasks().is_empty() {
        let text = renderer.render(
            "tasks/CMakeLists.txt",
            &bindings([("project", name.to_string())]),
        )?;
        artifacts.save_user("tasks/CMakeLists.txt", &text)?;
    }

    let text = renderer.render(
        "CMakeLists.txt",
        &bindings([
            ("project", name.to_string()),
            ("version", project.version().to_string()),
        ]),
    )?;
    artifacts.save_user("CMakeLists.txt", &text)?;

    Ok(())
}
