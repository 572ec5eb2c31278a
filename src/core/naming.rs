//! Name grammar and package naming conventions.
//!
//! The package identifiers emitted here are what downstream projects resolve
//! through pkg-config, so their shape is a hard compatibility requirement:
//! `orogen-project-<name>`, `<name>-tasks-<target>`, `<name>-typekit-<target>`
//! and `orogen-<deployment>`.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::SpecError;

/// Environment variable selecting the default target platform.
pub const TARGET_ENV_VAR: &str = "OROCOS_TARGET";

/// Target platform used when neither an override nor the environment
/// selects one.
pub const DEFAULT_TARGET: &str = "gnulinux";

/// Project names: all lowercase, alphanumeric/underscore, starting with a
/// letter, at least two characters.
static PROJECT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z][a-z0-9_]+$").unwrap());

/// Task and deployment identifiers: C++-identifier shaped.
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-zA-Z][a-zA-Z0-9_]*$").unwrap());

/// Resolve the target platform.
///
/// Order: explicit override (non-empty), `OROCOS_TARGET` environment
/// variable (non-empty), then [`DEFAULT_TARGET`]. Pure apart from the
/// environment read; callers that need stability within a run resolve once
/// and thread the value through.
pub fn resolve_target(explicit: Option<&str>) -> String {
    if let Some(target) = explicit {
        if !target.is_empty() {
            return target.to_string();
        }
    }
    match std::env::var(TARGET_ENV_VAR) {
        Ok(value) if !value.is_empty() => value,
        _ => DEFAULT_TARGET.to_string(),
    }
}

/// Validate a project name against the project-name grammar.
pub fn verify_project_name(name: &str) -> Result<(), SpecError> {
    if PROJECT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(SpecError::InvalidProjectName {
            name: name.to_string(),
        })
    }
}

/// Validate a task/deployment identifier.
pub fn verify_valid_identifier(name: &str) -> Result<(), SpecError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(SpecError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Validate a version string: it must start with a digit.
pub fn verify_version(version: &str) -> Result<(), SpecError> {
    if version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(SpecError::InvalidVersion {
            version: version.to_string(),
        })
    }
}

/// pkg-config name of an oroGen project: `orogen-project-<name>`.
pub fn project_pkg_name(project: &str) -> String {
    format!("orogen-project-{}", project)
}

/// pkg-config name of a task library: `<name>-tasks-<target>`.
pub fn tasklib_pkg_name(project: &str, target: &str) -> String {
    format!("{}-tasks-{}", project, target)
}

/// pkg-config name of a typekit: `<name>-typekit-<target>`.
pub fn typekit_pkg_name(name: &str, target: &str) -> String {
    format!("{}-typekit-{}", name, target)
}

/// pkg-config name of a deployment: `orogen-<name>`.
pub fn deployment_pkg_name(name: &str) -> String {
    format!("orogen-{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_project_names() {
        for name in ["cam", "my_project", "a2", "laser_driver2"] {
            assert!(verify_project_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_project_names() {
        for name in ["", "a", "2cam", "Cam", "cam-driver", "cam driver", "_cam"] {
            assert!(
                verify_project_name(name).is_err(),
                "{} should be invalid",
                name
            );
        }
    }

    #[test]
    fn test_identifiers_allow_camel_case() {
        assert!(verify_valid_identifier("Grabber").is_ok());
        assert!(verify_valid_identifier("motor_driver").is_ok());
        assert!(verify_valid_identifier("X").is_ok());
        assert!(verify_valid_identifier("2Grabber").is_err());
        assert!(verify_valid_identifier("Grab-ber").is_err());
        assert!(verify_valid_identifier("").is_err());
    }

    #[test]
    fn test_version_grammar() {
        assert!(verify_version("0.0").is_ok());
        assert!(verify_version("1.2rc1").is_ok());
        assert!(verify_version("v1").is_err());
        assert!(verify_version("").is_err());
    }

    #[test]
    fn test_package_names() {
        assert_eq!(project_pkg_name("cam"), "orogen-project-cam");
        assert_eq!(tasklib_pkg_name("cam", "gnulinux"), "cam-tasks-gnulinux");
        assert_eq!(typekit_pkg_name("base", "xenomai"), "base-typekit-xenomai");
        assert_eq!(deployment_pkg_name("cam_test"), "orogen-cam_test");
    }

    #[test]
    fn test_explicit_target_override() {
        assert_eq!(resolve_target(Some("xenomai")), "xenomai");
        // An empty override falls through to the environment/default chain
        // rather than producing an empty target.
        assert_ne!(resolve_target(Some("")), "");
    }
}
