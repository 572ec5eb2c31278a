//! Project specification document parsing and schema.
//!
//! A specification is a declarative TOML document applied to a Project by
//! the interpreter in [`crate::ops::apply`]. The same schema is used for
//! the descriptions of installed oroGen projects, so an imported project is
//! parsed with the exact machinery used for local ones.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigError, ProjectError};
use crate::typelib::TypeDef;

/// Canonical extension of specification files.
pub const SPEC_EXTENSION: &str = "orogen";

/// A library import as it appears in the document.
///
/// The simple form links the library to both the task library and the
/// typekit; the detailed form can reduce the link interface with
/// `typekit = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibraryImport {
    /// Just a pkg-config name: `libraries = ["opencv"]`
    Simple(String),

    /// Detailed form: `{ name = "opencv", typekit = false }`
    Detailed(DetailedLibraryImport),
}

/// Detailed library import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedLibraryImport {
    pub name: String,

    /// Whether the library is also linked into the project's typekit.
    #[serde(default = "default_true")]
    pub typekit: bool,
}

fn default_true() -> bool {
    true
}

impl LibraryImport {
    /// The pkg-config name of the library.
    pub fn name(&self) -> &str {
        match self {
            LibraryImport::Simple(name) => name,
            LibraryImport::Detailed(detailed) => &detailed.name,
        }
    }

    /// Whether the library is linked into the typekit as well.
    pub fn link_to_typekit(&self) -> bool {
        match self {
            LibraryImport::Simple(_) => true,
            LibraryImport::Detailed(detailed) => detailed.typekit,
        }
    }
}

/// A port declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A property declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub doc: Option<String>,
}

/// An operation argument declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// An operation declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDecl {
    pub name: String,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentDecl>,
}

/// A task-context declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDecl {
    /// Local name; the project namespace is prepended on registration.
    pub name: String,

    /// Task model to subclass, defaults to `RTT::TaskContext`.
    #[serde(default)]
    pub superclass: Option<String>,

    /// Per-task override of the run-wide extended-states default.
    #[serde(default)]
    pub extended_states: Option<bool>,

    #[serde(default)]
    pub input_ports: Vec<PortDecl>,

    #[serde(default)]
    pub output_ports: Vec<PortDecl>,

    #[serde(default)]
    pub properties: Vec<PropertyDecl>,

    #[serde(default)]
    pub operations: Vec<OperationDecl>,
}

impl TaskDecl {
    /// A bare task declaration with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        TaskDecl {
            name: name.into(),
            ..TaskDecl::default()
        }
    }
}

/// A task instantiated by a deployment declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInstanceDecl {
    pub name: String,

    /// Task model name; resolved against all known task contexts.
    pub task: String,

    /// Period in seconds; triggered activity when absent.
    #[serde(default)]
    pub period: Option<f64>,
}

/// A deployment declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentDecl {
    pub name: String,

    #[serde(default)]
    pub tasks: Vec<TaskInstanceDecl>,

    /// Whether this deployment is part of the installation.
    #[serde(default)]
    pub install: Option<bool>,

    /// Add the default logger component to the deployment.
    #[serde(default)]
    pub default_logger: bool,
}

/// The parsed specification document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: Option<String>,
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<LibraryImport>,

    /// Typekits imported with their compiled marshalling support.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typekits: Vec<String>,

    /// Task libraries whose task models become available.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_libraries: Vec<String>,

    /// Type imports: known typekit names or native headers to compile into
    /// the project's own typekit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_types: Vec<String>,

    /// Types declared directly in the document, registered into the
    /// project's own type registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<DeploymentDecl>,
}

impl ProjectSpec {
    /// Parse a specification document.
    pub fn from_toml_str(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }

    /// Load a specification file from disk.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BadDescription {
            name: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            ConfigError::BadDescription {
                name: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize back to a normalized TOML document.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
