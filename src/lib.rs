//! orogen - project model and dependency-resolution engine for oroGen-style
//! component generation.
//!
//! This crate builds an in-memory model of task contexts, typekits,
//! library dependencies and deployments from a declarative specification,
//! resolves transitive dependencies against a pkg-config catalog, and
//! drives the multi-stage generation pipeline.

pub mod core;
pub mod gen;
pub mod locator;
pub mod ops;
pub mod typelib;
pub mod util;

/// Test utilities and mocks for orogen unit tests.
///
/// Only available when running tests. Provides an in-memory package
/// catalog and fixture helpers.
#[cfg(test)]
pub mod test_support;

pub use self::core::{
    build_dep::BuildDependency, error::ProjectError, imported::ProjectModel, project::Project,
    spec::ProjectSpec, task::TaskContext, typekit::Typekit,
};

pub use self::gen::{FsArtifacts, GenerationReport, PlainRenderer};
pub use self::locator::{PackageLocator, PkgConfigLocator, PkgInfo};
pub use self::util::GenConfig;
