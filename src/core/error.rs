//! Error taxonomy for the project model.
//!
//! Three kinds are distinguished because their fixes live in different
//! places: specification errors are fixed in the specification file,
//! configuration errors in the environment (install a package, extend the
//! search path), and internal errors indicate a broken installed
//! description. None of them is ever retried.

use miette::Diagnostic;
use thiserror::Error;

use crate::gen::GenError;
use crate::typelib::MergeConflict;

/// Malformed specification input. The offending name is always carried so
/// the user can locate the declaration to fix.
#[derive(Debug, Error, Diagnostic)]
pub enum SpecError {
    #[error("invalid project name '{name}': names must be all lowercase, can contain alphanumeric characters and underscores and start with a letter")]
    #[diagnostic(code(orogen::spec::invalid_project_name))]
    InvalidProjectName { name: String },

    #[error("invalid identifier '{name}'")]
    #[diagnostic(code(orogen::spec::invalid_identifier))]
    InvalidIdentifier { name: String },

    #[error("version strings must start with a number (had: {version})")]
    #[diagnostic(code(orogen::spec::invalid_version))]
    InvalidVersion { version: String },

    #[error("you must set a name for this project")]
    #[diagnostic(code(orogen::spec::missing_name))]
    MissingName,

    #[error("there is no specification file for this project, cannot generate")]
    #[diagnostic(code(orogen::spec::missing_definition))]
    MissingDefinitionFile,

    #[error("a task cannot have the same name as the project ('{name}')")]
    #[diagnostic(code(orogen::spec::task_named_like_project))]
    TaskNamedLikeProject { name: String },

    #[error("there is already a '{name}' task")]
    #[diagnostic(code(orogen::spec::duplicate_task))]
    DuplicateTask { name: String },

    #[error("there is already a namespace called '{name}', reusing it as a task name is not supported")]
    #[diagnostic(code(orogen::spec::namespace_collision))]
    NamespaceCollision { name: String },

    #[error("there is already a deployment named '{name}' in this project")]
    #[diagnostic(code(orogen::spec::duplicate_deployment))]
    DuplicateDeployment { name: String },

    #[error("cannot find a task context model named '{name}'")]
    #[diagnostic(code(orogen::spec::task_not_found))]
    TaskNotFound { name: String },

    #[error("cannot find type '{name}'")]
    #[diagnostic(code(orogen::spec::type_not_found))]
    TypeNotFound { name: String },

    #[error("static arrays are not valid interface types (got '{name}'). Use an array in a structure or a std::vector")]
    #[diagnostic(code(orogen::spec::static_array_interface))]
    StaticArrayInterface { name: String },

    #[error(transparent)]
    #[diagnostic(code(orogen::spec::type_mismatch))]
    TypeMismatch(#[from] MergeConflict),
}

/// A dependency is missing from the environment, or an operation was
/// invoked in a configuration that does not support it. The fix lives
/// outside the specification.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("no task library named '{name}' is available")]
    #[diagnostic(code(orogen::config::task_library_not_found))]
    TaskLibraryNotFound { name: String },

    #[error("no typekit named '{name}' is available")]
    #[diagnostic(code(orogen::config::typekit_not_found))]
    TypekitNotFound { name: String },

    #[error("no library named '{name}' is available")]
    #[diagnostic(code(orogen::config::library_not_found))]
    LibraryNotFound { name: String },

    #[error("there is no deployment called '{name}'")]
    #[diagnostic(code(orogen::config::deployment_not_found))]
    DeploymentNotFound { name: String },

    #[error("'{name}' is an oroGen project, but it defines no task library")]
    #[diagnostic(code(orogen::config::not_a_task_library))]
    NotATaskLibrary { name: String },

    #[error("using {operation} here makes no sense since no new types are defined in this project")]
    #[diagnostic(code(orogen::config::no_typekit))]
    NoTypekit { operation: String },

    #[error("{type_name}, defined in the {typekit} typekit, is not exported by it")]
    #[diagnostic(code(orogen::config::type_not_exported))]
    TypeNotExported { type_name: String, typekit: String },

    #[error("import cycle detected while resolving '{name}'")]
    #[diagnostic(code(orogen::config::import_cycle))]
    ImportCycle { name: String },

    #[error("cannot use the description of '{name}': {message}")]
    #[diagnostic(code(orogen::config::bad_description))]
    BadDescription { name: String, message: String },
}

/// An installed package description advertised something that does not
/// exist. Always fatal, never silently ignored.
#[derive(Debug, Error, Diagnostic)]
pub enum InternalError {
    #[error("cannot find the deployment called '{name}' in '{project}'. Candidates were {candidates}")]
    #[diagnostic(code(orogen::internal::deployment_missing))]
    DeploymentMissingFromProject {
        name: String,
        project: String,
        candidates: String,
    },
}

/// Any error raised by the project model or the generation pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Gen(#[from] GenError),
}

impl From<MergeConflict> for ProjectError {
    fn from(err: MergeConflict) -> Self {
        ProjectError::Spec(SpecError::TypeMismatch(err))
    }
}

impl ProjectError {
    /// True if this is a specification error.
    pub fn is_spec(&self) -> bool {
        matches!(self, ProjectError::Spec(_))
    }

    /// True if this is a configuration/environment error.
    pub fn is_config(&self) -> bool {
        matches!(self, ProjectError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinguished() {
        let spec: ProjectError = SpecError::MissingName.into();
        let config: ProjectError = ConfigError::TypekitNotFound {
            name: "base".to_string(),
        }
        .into();

        assert!(spec.is_spec());
        assert!(!spec.is_config());
        assert!(config.is_config());
    }

    #[test]
    fn test_messages_carry_the_offending_name() {
        let err = ConfigError::TaskLibraryNotFound {
            name: "upstream".to_string(),
        };
        assert!(err.to_string().contains("'upstream'"));

        let err = SpecError::DuplicateTask {
            name: "Grabber".to_string(),
        };
        assert!(err.to_string().contains("'Grabber'"));
    }
}
