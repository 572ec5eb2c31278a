//! pkg-config backed package locator.
//!
//! Packages are searched through the `pkg-config` tool, so the install
//! prefixes of all dependencies must be listed in the `PKG_CONFIG_PATH`
//! environment variable.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use crate::locator::{LocateError, PackageLocator, PkgInfo};

/// Variables with dedicated fields on [`PkgInfo`].
const KNOWN_VARIABLES: &[&str] = &["prefix", "deffile", "type_registry", "project_name"];

/// Locator that shells out to pkg-config.
#[derive(Debug, Clone)]
pub struct PkgConfigLocator {
    pkg_config: PathBuf,
}

impl PkgConfigLocator {
    /// Locate the pkg-config executable on PATH. Falls back to the bare
    /// command name so lookups fail lazily, on first use, when the tool is
    /// not installed.
    pub fn from_env() -> Self {
        let pkg_config = match which::which("pkg-config") {
            Ok(path) => path,
            Err(_) => {
                tracing::debug!("pkg-config not found on PATH");
                PathBuf::from("pkg-config")
            }
        };
        PkgConfigLocator { pkg_config }
    }

    /// Use a specific pkg-config executable.
    pub fn with_executable(pkg_config: impl Into<PathBuf>) -> Self {
        PkgConfigLocator {
            pkg_config: pkg_config.into(),
        }
    }

    fn run(&self, name: &str, args: &[&str]) -> Result<String, LocateError> {
        let output = Command::new(&self.pkg_config)
            .args(args)
            .arg(name)
            .output()
            .map_err(|e| LocateError::Failure {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(LocateError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn variable(&self, name: &str, variable: &str) -> Option<String> {
        let arg = format!("--variable={}", variable);
        match self.run(name, &[&arg]) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }
}

impl PackageLocator for PkgConfigLocator {
    fn locate(&self, name: &str) -> Result<PkgInfo, LocateError> {
        // --exists distinguishes not-found from query failures up front.
        self.run(name, &["--exists"])?;
        tracing::debug!(package = name, "located through pkg-config");

        let prefix = self
            .variable(name, "prefix")
            .map(PathBuf::from)
            .unwrap_or_default();

        let include_dirs = self
            .run(name, &["--cflags-only-I"])?
            .split_whitespace()
            .filter_map(|flag| flag.strip_prefix("-I"))
            .map(PathBuf::from)
            .collect();

        let mut variables = BTreeMap::new();
        if let Ok(listing) = self.run(name, &["--print-variables"]) {
            for var in listing.lines().map(str::trim).filter(|v| !v.is_empty()) {
                if KNOWN_VARIABLES.contains(&var) {
                    continue;
                }
                if let Some(value) = self.variable(name, var) {
                    variables.insert(var.to_string(), value);
                }
            }
        }

        Ok(PkgInfo {
            name: name.to_string(),
            prefix,
            include_dirs,
            description_path: self.variable(name, "deffile").map(PathBuf::from),
            type_registry: self.variable(name, "type_registry").map(PathBuf::from),
            project_name: self.variable(name, "project_name"),
            variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    /// A fake pkg-config that knows exactly one package.
    fn fake_pkg_config(dir: &std::path::Path) -> PathBuf {
        let script = dir.join("pkg-config");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(
            file,
            r#"#!/bin/sh
pkg=""
for arg in "$@"; do pkg="$arg"; done
[ "$pkg" = "cam-tasks-gnulinux" ] || exit 1
case "$1" in
    --exists) exit 0;;
    --cflags-only-I) echo "-I/opt/rock/include";;
    --variable=prefix) echo "/opt/rock";;
    --variable=deffile) echo "/opt/rock/share/cam.orogen";;
    --print-variables) printf 'prefix\ndeffile\n';;
    *) echo "";;
esac
"#
        )
        .unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();
        script
    }

    #[test]
    fn test_locate_known_package() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = PkgConfigLocator::with_executable(fake_pkg_config(tmp.path()));

        let info = locator.locate("cam-tasks-gnulinux").unwrap();
        assert_eq!(info.prefix, PathBuf::from("/opt/rock"));
        assert_eq!(info.include_dirs, vec![PathBuf::from("/opt/rock/include")]);
        assert_eq!(
            info.description_path,
            Some(PathBuf::from("/opt/rock/share/cam.orogen"))
        );
    }

    #[test]
    fn test_locate_missing_package() {
        let tmp = tempfile::TempDir::new().unwrap();
        let locator = PkgConfigLocator::with_executable(fake_pkg_config(tmp.path()));

        let err = locator.locate("nope").unwrap_err();
        assert!(err.is_not_found());
    }
}
