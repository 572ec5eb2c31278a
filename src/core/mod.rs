//! Core data structures of the project model.
//!
//! This module contains the aggregate and its building blocks:
//! - The Project orchestrator and its resolution caches
//! - Handles for task contexts, typekits, imported projects, deployments
//! - Build-dependency records and naming conventions
//! - The specification document schema

pub mod build_dep;
pub mod deployment;
pub mod error;
pub mod imported;
pub mod naming;
pub mod project;
pub mod spec;
pub mod standard;
pub mod task;
pub mod typekit;

pub use build_dep::BuildDependency;
pub use deployment::Deployment;
pub use error::{ConfigError, InternalError, ProjectError, SpecError};
pub use imported::{ImportedProject, ImportedTypekit, ProjectModel};
pub use project::Project;
pub use spec::ProjectSpec;
pub use task::TaskContext;
pub use typekit::Typekit;
