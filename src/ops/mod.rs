//! High-level operations.
//!
//! This module contains the implementation of the orogen commands: load a
//! specification, resolve it into a Project, and either generate the
//! source tree or report on the resolved model.

pub mod apply;

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::project::Project;
use crate::core::spec::ProjectSpec;
use crate::gen::{FsArtifacts, GenerationReport, PlainRenderer};
use crate::locator::{PackageLocator, PkgConfigLocator};
use crate::util::GenConfig;

pub use apply::apply;

/// Load a specification file and resolve it into a Project.
pub fn load_project(
    spec_path: &Path,
    config: GenConfig,
    locator: Box<dyn PackageLocator>,
) -> Result<Project> {
    let spec = ProjectSpec::load(spec_path)
        .with_context(|| format!("failed to load {}", spec_path.display()))?;

    let mut project = Project::new(config, locator)?;
    let absolute = spec_path
        .canonicalize()
        .unwrap_or_else(|_| spec_path.to_path_buf());
    project.set_definition_path(absolute);
    apply(&mut project, &spec)?;
    Ok(project)
}

/// Resolve a specification and run the full generation pipeline.
pub fn generate_project(spec_path: &Path, config: GenConfig) -> Result<GenerationReport> {
    let output_dir = config.output_dir().to_path_buf();
    let locator = PkgConfigLocator::from_env();
    let mut project = load_project(spec_path, config, Box::new(locator))?;

    let mut artifacts = FsArtifacts::new(output_dir);
    let report = project.generate(&PlainRenderer, &mut artifacts)?;
    Ok(report)
}

/// Summary of a resolved project, for the `check` command.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub name: String,
    pub version: String,
    pub task_count: usize,
    pub deployment_count: usize,
    pub typekits: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Resolve a specification and report on the model without generating.
pub fn check_project(spec_path: &Path, config: GenConfig) -> Result<CheckReport> {
    let target = config.target();
    let locator = PkgConfigLocator::from_env();
    let project = load_project(spec_path, config, Box::new(locator))?;

    let model = project.as_model();
    let name = model.name().unwrap_or("<unnamed>").to_string();
    let dependencies = project
        .tasklib_dependencies(&target)
        .iter()
        .map(|dep| format!("{} ({})", dep.var_name(), dep.pkg_name()))
        .collect();

    Ok(CheckReport {
        name,
        version: project.version().to_string(),
        task_count: model.self_tasks().len(),
        deployment_count: project.deployers().len(),
        typekits: model.used_typekit_names(),
        dependencies,
    })
}
