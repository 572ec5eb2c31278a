//! Per-run generation configuration.
//!
//! One `GenConfig` value is constructed per generation run and threaded
//! through the Project explicitly. The target override, output directory
//! and transport selection all live here; there is no process-wide state.

use std::path::{Path, PathBuf};

use crate::core::naming;

/// Name of the directory holding generated files that are always
/// overwritten. User-editable files live next to it and are never clobbered.
pub const AUTOMATIC_AREA_NAME: &str = ".orogen";

/// Configuration for a single generation run.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Explicit target platform override. When unset, the `OROCOS_TARGET`
    /// environment variable is consulted, then the `gnulinux` default.
    target_override: Option<String>,

    /// Directory the generated tree is rooted at.
    output_dir: PathBuf,

    /// Transports enabled for every typekit and deployment of this run.
    transports: Vec<String>,

    /// Whether locally defined tasks get extended-state support by default.
    extended_states: bool,

    /// Command line that started this run, echoed into the installed copy
    /// of the specification for up-to-date tracking.
    command_line: Vec<String>,
}

impl GenConfig {
    /// Create a configuration rooted at the given output directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        GenConfig {
            target_override: None,
            output_dir: output_dir.into(),
            transports: Vec::new(),
            extended_states: false,
            command_line: Vec::new(),
        }
    }

    /// Override the target platform for this run.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_override = Some(target.into());
        self
    }

    /// Enable the given transports for this run.
    pub fn with_transports(mut self, transports: Vec<String>) -> Self {
        self.transports = transports;
        self
    }

    /// Enable extended-state support for all locally defined tasks.
    pub fn with_extended_states(mut self, enabled: bool) -> Self {
        self.extended_states = enabled;
        self
    }

    /// Record the command line that started this run.
    pub fn with_command_line(mut self, args: Vec<String>) -> Self {
        self.command_line = args;
        self
    }

    /// Resolve the target platform: explicit override, then the
    /// `OROCOS_TARGET` environment variable, then `"gnulinux"`.
    pub fn target(&self) -> String {
        naming::resolve_target(self.target_override.as_deref())
    }

    /// The explicit target override, if any.
    pub fn target_override(&self) -> Option<&str> {
        self.target_override.as_deref()
    }

    /// Root of the generated tree.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The automatic area under the output directory.
    pub fn automatic_dir(&self) -> PathBuf {
        self.output_dir.join(AUTOMATIC_AREA_NAME)
    }

    /// Transports enabled for this run.
    pub fn transports(&self) -> &[String] {
        &self.transports
    }

    /// Whether tasks get extended-state support by default.
    pub fn extended_states(&self) -> bool {
        self.extended_states
    }

    /// Command line echoed into the specification snapshot.
    pub fn command_line(&self) -> &[String] {
        &self.command_line
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig::new(".")
    }
}
