//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// oroGen component generator.
#[derive(Parser)]
#[command(name = "orogen", version, about = "Generate component code from an oroGen specification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a specification and generate the source tree
    Gen(GenArgs),

    /// Resolve a specification and report on the model
    Check(CheckArgs),
}

#[derive(Args)]
pub struct GenArgs {
    /// Path to the specification file
    pub spec: PathBuf,

    /// Target platform (overrides the OROCOS_TARGET environment variable)
    #[arg(long, env = "OROCOS_TARGET")]
    pub target: Option<String>,

    /// Output directory, defaults to the specification's directory
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Enable a transport for all typekits and deployments (repeatable)
    #[arg(long = "transports", value_delimiter = ',')]
    pub transports: Vec<String>,

    /// Generate extended-state support for all tasks
    #[arg(long)]
    pub extended_states: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the specification file
    pub spec: PathBuf,

    /// Target platform (overrides the OROCOS_TARGET environment variable)
    #[arg(long, env = "OROCOS_TARGET")]
    pub target: Option<String>,
}
