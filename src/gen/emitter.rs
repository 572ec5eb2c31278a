//! Artifact emission contract.
//!
//! Generated files fall in two areas: the automatic area is always
//! overwritten and cleaned of stale files at the end of a run, user files
//! are written once and never clobbered afterwards. The filesystem
//! implementation lives here; tests substitute a recording store.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use walkdir::WalkDir;

use crate::util::AUTOMATIC_AREA_NAME;

/// Error from rendering or file emission.
#[derive(Debug, Error, Diagnostic)]
pub enum GenError {
    #[error("failed to write {path}: {source}")]
    #[diagnostic(code(orogen::gen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown template '{template_id}'")]
    #[diagnostic(code(orogen::gen::unknown_template))]
    UnknownTemplate { template_id: String },

    #[error("template '{template_id}' is missing binding '{binding}'")]
    #[diagnostic(code(orogen::gen::missing_binding))]
    MissingBinding {
        template_id: String,
        binding: String,
    },
}

/// Name/value bindings passed to the renderer.
pub type Bindings = BTreeMap<String, String>;

/// Build a bindings map from key/value pairs.
pub fn bindings<const N: usize>(pairs: [(&str, String); N]) -> Bindings {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Fetch a required binding.
pub fn required<'a>(
    bindings: &'a Bindings,
    template_id: &str,
    binding: &str,
) -> Result<&'a str, GenError> {
    bindings
        .get(binding)
        .map(String::as_str)
        .ok_or_else(|| GenError::MissingBinding {
            template_id: template_id.to_string(),
            binding: binding.to_string(),
        })
}

/// Renders a template into text.
pub trait TemplateRenderer {
    fn render(&self, template_id: &str, bindings: &Bindings) -> Result<String, GenError>;
}

/// Stores rendered artifacts.
pub trait ArtifactStore {
    /// Write a file into the automatic area, overwriting any previous
    /// content. Returns the absolute path of the written file.
    fn save_automatic(&mut self, relative: &str, text: &str) -> Result<PathBuf, GenError>;

    /// Write a user-owned file unless it already exists. Returns the
    /// absolute path whether or not anything was written.
    fn save_user(&mut self, relative: &str, text: &str) -> Result<PathBuf, GenError>;

    /// Remove install shims symlinked into the automatic area by previous
    /// runs.
    fn remove_stale_install_shims(&mut self, project: &str) -> Result<(), GenError>;

    /// Remove automatic-area files not produced by this run. Returns the
    /// removed paths.
    fn cleanup_automatic(&mut self) -> Result<Vec<PathBuf>, GenError>;
}

/// Filesystem-backed artifact store.
pub struct FsArtifacts {
    output_dir: PathBuf,
    automatic_dir: PathBuf,
    written: BTreeSet<PathBuf>,
}

impl FsArtifacts {
    /// Create a store rooted at the given output directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let automatic_dir = output_dir.join(AUTOMATIC_AREA_NAME);
        FsArtifacts {
            output_dir,
            automatic_dir,
            written: BTreeSet::new(),
        }
    }

    /// The automatic area this store writes to.
    pub fn automatic_dir(&self) -> &Path {
        &self.automatic_dir
    }

    fn write(path: &Path, text: &str) -> Result<(), GenError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GenError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn remove_if_symlink(path: &Path) -> Result<(), GenError> {
        match std::fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                tracing::debug!(path = %path.display(), "removing stale install shim");
                std::fs::remove_file(path).map_err(|source| GenError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

impl ArtifactStore for FsArtifacts {
    fn save_automatic(&mut self, relative: &str, text: &str) -> Result<PathBuf, GenError> {
        let path = self.automatic_dir.join(relative);
        Self::write(&path, text)?;
        self.written.insert(path.clone());
        Ok(path)
    }

    fn save_user(&mut self, relative: &str, text: &str) -> Result<PathBuf, GenError> {
        let path = self.output_dir.join(relative);
        if path.exists() {
            tracing::debug!(path = %path.display(), "keeping user-owned file");
            return Ok(path);
        }
        Self::write(&path, text)?;
        Ok(path)
    }

    fn remove_stale_install_shims(&mut self, project: &str) -> Result<(), GenError> {
        Self::remove_if_symlink(&self.automatic_dir.join(project))?;
        let tasks_dir = self.automatic_dir.join("tasks");
        if tasks_dir.is_dir() {
            let entries = std::fs::read_dir(&tasks_dir).map_err(|source| GenError::Io {
                path: tasks_dir.clone(),
                source,
            })?;
            for entry in entries.flatten() {
                Self::remove_if_symlink(&entry.path())?;
            }
        }
        Ok(())
    }

    fn cleanup_automatic(&mut self) -> Result<Vec<PathBuf>, GenError> {
        let mut removed = Vec::new();
        if !self.automatic_dir.is_dir() {
            return Ok(removed);
        }
        for entry in WalkDir::new(&self.automatic_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            let path = entry.path().to_path_buf();
            if !self.written.contains(&path) {
                tracing::debug!(path = %path.display(), "removing stale generated file");
                std::fs::remove_file(&path).map_err(|source| GenError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed.push(path);
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_automatic_files_are_overwritten() {
        let tmp = TempDir::new().unwrap();
        let mut artifacts = FsArtifacts::new(tmp.path());

        let path = artifacts.save_automatic("tasks/a.cpp", "first").unwrap();
        artifacts.save_automatic("tasks/a.cpp", "second").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn test_user_files_are_never_clobbered() {
        let tmp = TempDir::new().unwrap();
        let mut artifacts = FsArtifacts::new(tmp.path());

        std::fs::write(tmp.path().join("CMakeLists.txt"), "user content").unwrap();
        let path = artifacts.save_user("CMakeLists.txt", "generated").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "user content");

        let fresh = artifacts.save_user("Doxyfile.in", "generated").unwrap();
        assert_eq!(std::fs::read_to_string(fresh).unwrap(), "generated");
    }

    #[test]
    fn test_cleanup_removes_only_stale_files() {
        let tmp = TempDir::new().unwrap();
        let mut artifacts = FsArtifacts::new(tmp.path());

        let stale = tmp.path().join(".orogen/old.cpp");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "stale").unwrap();

        let kept = artifacts.save_automatic("fresh.cpp", "fresh").unwrap();
        let removed = artifacts.cleanup_automatic().unwrap();

        assert_eq!(removed, vec![stale.clone()]);
        assert!(!stale.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_stale_shim_removal() {
        let tmp = TempDir::new().unwrap();
        let mut artifacts = FsArtifacts::new(tmp.path());
        let automatic = tmp.path().join(".orogen");
        std::fs::create_dir_all(automatic.join("tasks")).unwrap();

        let real = tmp.path().join("real");
        std::fs::write(&real, "x").unwrap();
        let shim = automatic.join("cam");
        std::os::unix::fs::symlink(&real, &shim).unwrap();
        let task_shim = automatic.join("tasks/shim.hpp");
        std::os::unix::fs::symlink(&real, &task_shim).unwrap();

        artifacts.remove_stale_install_shims("cam").unwrap();
        assert!(!shim.exists());
        assert!(!task_shim.exists());
        assert!(real.exists());
    }

    #[test]
    fn test_required_binding() {
        let b = bindings([("name", "cam".to_string())]);
        assert_eq!(required(&b, "project.pc", "name").unwrap(), "cam");
        assert!(required(&b, "project.pc", "version").is_err());
    }
}
