//! Command-line argument definitions for rfswift.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

use crate::engine::EngineKind;

/// Command-line interface for rfswift.
#[derive(Debug, Parser)]
#[command(name = "rfswift")]
#[command(
    author,
    version,
    about = "Container environments for radio-frequency tooling"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine to use.
    #[arg(long, global = true, value_enum)]
    pub engine: Option<EngineKind>,

    /// Container image to use.
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// Log engine detection and session details.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a container and attach an interactive shell.
    Run(RunArgs),

    /// Open a shell in an existing container.
    Exec(ExecArgs),

    /// Save a container as a new image.
    Commit(CommitArgs),

    /// Pull an image.
    Pull(ImageArgs),

    /// Tag an image under a new reference.
    Tag(TagArgs),

    /// Rename a container.
    Rename(RenameArgs),

    /// Remove a container.
    Remove(ContainerArgs),

    /// Remove an image and the containers created from it.
    RemoveImage(ImageArgs),

    /// Report whether local images match their published tags.
    Status(StatusArgs),

    /// Show or control the container engine.
    Engine(EngineArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Container name.
    #[arg(long)]
    pub name: Option<String>,

    /// Shell command line to start.
    #[arg(long)]
    pub shell: Option<String>,

    /// Comma-separated extra bind mounts.
    #[arg(long)]
    pub bind: Option<String>,

    /// Engine network mode.
    #[arg(long)]
    pub network: Option<String>,

    /// Run the container privileged.
    #[arg(long)]
    pub privileged: bool,
}

/// Arguments for the `exec` subcommand.
#[derive(Debug, Parser)]
pub struct ExecArgs {
    /// Container ID or name; defaults to the most recent rfswift container.
    pub container: Option<String>,

    /// Shell command line to start.
    #[arg(long)]
    pub shell: Option<String>,
}

/// Arguments for the `commit` subcommand.
#[derive(Debug, Parser)]
pub struct CommitArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,

    /// Target image reference.
    #[arg(required = true)]
    pub target: String,
}

/// Arguments naming a single image.
#[derive(Debug, Parser)]
pub struct ImageArgs {
    /// Image reference.
    #[arg(required = true)]
    pub reference: String,
}

/// Arguments for the `tag` subcommand.
#[derive(Debug, Parser)]
pub struct TagArgs {
    /// Existing image reference or ID.
    #[arg(required = true)]
    pub source: String,

    /// New image reference.
    #[arg(required = true)]
    pub target: String,
}

/// Arguments for the `rename` subcommand.
#[derive(Debug, Parser)]
pub struct RenameArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,

    /// New container name.
    #[arg(required = true)]
    pub new_name: String,
}

/// Arguments naming a single container.
#[derive(Debug, Parser)]
pub struct ContainerArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,
}

/// Arguments for the `status` subcommand.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Image to check; every labelled local image when omitted.
    pub reference: Option<String>,
}

/// Arguments for the `engine` subcommand.
#[derive(Debug, Parser)]
pub struct EngineArgs {
    /// What to do with the engine.
    #[arg(value_enum, default_value_t = EngineAction::Info)]
    pub action: EngineAction,
}

/// Engine actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EngineAction {
    /// Report the resolved engine and its endpoint.
    #[default]
    Info,
    /// Start the engine's service.
    Start,
    /// Restart the engine's service.
    Restart,
}
