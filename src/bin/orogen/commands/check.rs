//! `orogen check` - resolve a specification and report on the model.

use anyhow::{bail, Result};

use orogen::core::error::ProjectError;
use orogen::util::diagnostic;
use orogen::GenConfig;

use crate::cli::CheckArgs;

pub fn execute(args: CheckArgs) -> Result<()> {
    let output_dir = args
        .spec
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());

    let mut config = GenConfig::new(output_dir);
    if let Some(target) = &args.target {
        config = config.with_target(target);
    }

    match orogen::ops::check_project(&args.spec, config) {
        Ok(report) => {
            println!("project {} {}", report.name, report.version);
            println!("  {} task context(s)", report.task_count);
            println!("  {} deployment(s)", report.deployment_count);
            if !report.typekits.is_empty() {
                println!("  typekits: {}", report.typekits.join(", "));
            }
            if !report.dependencies.is_empty() {
                println!("  task library depends on:");
                for dep in &report.dependencies {
                    println!("    {}", dep);
                }
            }
            Ok(())
        }
        Err(err) => match err.downcast_ref::<ProjectError>() {
            Some(project_err) => {
                diagnostic::emit(&project_err.to_diagnostic(), true);
                bail!("check failed");
            }
            None => Err(err),
        },
    }
}
