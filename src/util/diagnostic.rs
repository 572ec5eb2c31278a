//! User-friendly diagnostic messages.
//!
//! Every fatal error is mapped to a diagnostic carrying the offending name,
//! enough context to locate the problem, and a suggested fix that tells the
//! user whether the specification or the environment has to change.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::error::{ConfigError, InternalError, ProjectError, SpecError};

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a package cannot be located.
    pub const CHECK_PKG_CONFIG_PATH: &str =
        "help: Check that the package's install prefix is listed in PKG_CONFIG_PATH";

    /// Suggestion when a specification element is malformed.
    pub const FIX_SPECIFICATION: &str =
        "help: The fix lives in the specification file, not in the environment";

    /// Suggestion when an imported description is inconsistent.
    pub const BROKEN_DESCRIPTION: &str =
        "help: The installed package description is broken; reinstall the upstream project";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional context and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Missing package error with pkg-config guidance attached.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("could not locate package `{package}`")]
#[diagnostic(
    code(orogen::locate::not_found),
    help("Check that the package's install prefix is listed in PKG_CONFIG_PATH")
)]
pub struct PackageNotLocatedError {
    pub package: String,
    pub tried: Vec<String>,
}

/// Import cycle error.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("import cycle detected while resolving `{name}`")]
#[diagnostic(
    code(orogen::resolve::cycle),
    help("Break the cycle by removing one of the mutual imports")
)]
pub struct ImportCycleError {
    pub name: String,
}

impl ProjectError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ProjectError::Spec(err) => spec_diagnostic(err),
            ProjectError::Config(err) => config_diagnostic(err),
            ProjectError::Internal(err) => internal_diagnostic(err),
            ProjectError::Gen(err) => Diagnostic::error(err.to_string())
                .with_suggestion("Check filesystem permissions on the output directory"),
        }
    }
}

fn spec_diagnostic(err: &SpecError) -> Diagnostic {
    let diag = Diagnostic::error(err.to_string());
    match err {
        SpecError::InvalidProjectName { .. } => diag.with_suggestion(
            "Project names must be all lowercase, alphanumeric/underscore, and start with a letter",
        ),
        SpecError::DuplicateTask { name } => diag
            .with_context(format!("a task named `{}` is already registered", name))
            .with_suggestion("Rename the task or remove the duplicate declaration"),
        SpecError::NamespaceCollision { name } => diag
            .with_context(format!("the type registry defines a `{}` namespace", name))
            .with_suggestion("Pick a task name that does not collide with a type namespace"),
        SpecError::StaticArrayInterface { .. } => diag
            .with_suggestion("Wrap the array in a struct, or use a std::vector instead"),
        _ => diag.with_suggestion(suggestions::FIX_SPECIFICATION),
    }
}

fn config_diagnostic(err: &ConfigError) -> Diagnostic {
    let diag = Diagnostic::error(err.to_string());
    match err {
        ConfigError::TaskLibraryNotFound { name }
        | ConfigError::TypekitNotFound { name }
        | ConfigError::LibraryNotFound { name }
        | ConfigError::DeploymentNotFound { name } => diag
            .with_context(format!("`{}` was searched through pkg-config", name))
            .with_suggestion(suggestions::CHECK_PKG_CONFIG_PATH),
        ConfigError::ImportCycle { .. } => {
            diag.with_suggestion("Break the cycle by removing one of the mutual imports")
        }
        _ => diag,
    }
}

fn internal_diagnostic(err: &InternalError) -> Diagnostic {
    Diagnostic::error(err.to_string()).with_suggestion(suggestions::BROKEN_DESCRIPTION)
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("no typekit named 'base' is available")
            .with_context("`base-typekit-gnulinux` was searched through pkg-config")
            .with_suggestion("Install the base typekit")
            .with_suggestion("Extend PKG_CONFIG_PATH");

        let output = diag.format(false);
        assert!(output.contains("error: no typekit named 'base'"));
        assert!(output.contains("searched through pkg-config"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Install the base typekit"));
    }

    #[test]
    fn test_config_error_diagnostic() {
        let err = ProjectError::from(ConfigError::TypekitNotFound {
            name: "base".to_string(),
        });
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("no typekit named 'base'"));
        assert!(output.contains("PKG_CONFIG_PATH"));
    }

    #[test]
    fn test_spec_error_diagnostic() {
        let err = ProjectError::from(SpecError::DuplicateTask {
            name: "Grabber".to_string(),
        });
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("Grabber"));
        assert!(output.contains("Rename the task"));
    }
}
