//! Specification interpreter.
//!
//! Applies a parsed specification document to a Project. Each declaration
//! mutates the aggregate immediately and can observe everything declared
//! before it; the application order below is the document's declaration
//! order contract.

use crate::core::error::ProjectError;
use crate::core::project::Project;
use crate::core::spec::ProjectSpec;

/// Apply a specification document to a project.
///
/// Declarations are applied in dependency order: identity, transports,
/// libraries, typekits, task libraries, type imports, local types, task
/// contexts, deployments. A failing declaration aborts the application;
/// declarations already applied stay in effect.
pub fn apply(project: &mut Project, spec: &ProjectSpec) -> Result<(), ProjectError> {
    if let Some(name) = &spec.name {
        project.set_name(name);
    }
    if let Some(version) = &spec.version {
        project.set_version(version)?;
    }
    project.enable_transports(spec.transports.iter().cloned());

    for library in &spec.libraries {
        project.using_library(library.name(), library.link_to_typekit())?;
    }
    for typekit in &spec.typekits {
        project.using_typekit(typekit)?;
    }
    for task_library in &spec.task_libraries {
        project.using_task_library(task_library)?;
    }
    for import in &spec.import_types {
        project.import_types_from(import)?;
    }
    for def in &spec.types {
        project.register_type(def.clone())?;
    }
    for task in &spec.tasks {
        project.task_context(task)?;
    }
    for deployment in &spec.deployments {
        project.deployment(deployment)?;
    }
    Ok(())
}
