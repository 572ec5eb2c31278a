//! `orogen gen` - run the generation pipeline.

use anyhow::{bail, Result};

use orogen::core::error::ProjectError;
use orogen::util::diagnostic;
use orogen::GenConfig;

use crate::cli::GenArgs;

pub fn execute(args: GenArgs) -> Result<()> {
    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => args
            .spec
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into()),
    };

    let mut config = GenConfig::new(output_dir)
        .with_transports(args.transports.clone())
        .with_extended_states(args.extended_states)
        .with_command_line(std::env::args().collect());
    if let Some(target) = &args.target {
        config = config.with_target(target);
    }

    match orogen::ops::generate_project(&args.spec, config) {
        Ok(report) => {
            println!("generated for target {}", report.target);
            for id in &report.package_ids {
                println!("  package {}", id);
            }
            if !report.stale_files.is_empty() {
                println!("  removed {} stale generated file(s)", report.stale_files.len());
            }
            Ok(())
        }
        Err(err) => match err.downcast_ref::<ProjectError>() {
            Some(project_err) => {
                diagnostic::emit(&project_err.to_diagnostic(), true);
                bail!("generation failed");
            }
            None => Err(err),
        },
    }
}
