//! `rfswift` application entry point.
//!
//! This binary launches and manages radio-frequency tooling containers over
//! Docker or Podman. It uses `eyre` for opaque error handling at the
//! application boundary, converting domain-specific errors into
//! human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/rfswift/config.toml` or path from `RFSWIFT_CONFIG_PATH`)
//! 3. Environment variables (`RFSWIFT_*`)
//! 4. Command-line arguments
//!
//! Logs go to stderr so container output on stdout is never interleaved with
//! them.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use eyre::{Report, Result as EyreResult};
use mockable::{DefaultEnv, Env};
use rfswift::api::{self, CommandOutcome, EngineContext, EngineInfo, ImageStatusReport};
use rfswift::config::{AppConfig, Cli, Commands, EngineAction, RunArgs, load_config};
use rfswift::engine::selector;
use rfswift::error::{EngineError, Result as RfswiftResult, RfswiftError};
use rfswift::session::SessionConfig;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for leftover blocking tasks before abandoning them.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Application entry point.
///
/// Loads configuration, applies the engine preference, then dispatches to
/// the subcommand handler. Lookup misses are reported without an error
/// report and exit with status 1.
fn main() -> EyreResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli).map_err(Report::from)?;
    let engine_selector = selector::global();
    api::configure_engine(engine_selector, &config);
    // Resolution may publish `DOCKER_HOST`; do it before any worker threads
    // exist.
    drop(engine_selector.resolve());

    let runtime = tokio::runtime::Runtime::new().map_err(|error| {
        Report::from(RfswiftError::from(EngineError::RuntimeCreationFailed {
            message: error.to_string(),
        }))
    })?;
    let context = EngineContext::new(engine_selector, runtime.handle());

    let outcome = run(&cli, &config, &context);
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    match outcome {
        Ok(CommandOutcome::Success) => Ok(ExitCode::SUCCESS),
        Ok(CommandOutcome::CommandExit { code }) => {
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX)))
        }
        Err(error) if error.is_not_found() => {
            report_not_found(&error);
            Ok(ExitCode::FAILURE)
        }
        Err(error) => Err(Report::from(error)),
    }
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Execute the CLI command, returning domain-specific errors.
///
/// Keeps semantic errors inside the run loop so the CLI boundary owns
/// conversion to `eyre::Report`.
fn run(cli: &Cli, config: &AppConfig, context: &EngineContext<'_>) -> RfswiftResult<CommandOutcome> {
    match &cli.command {
        Commands::Run(args) => api::run_container(context, &session_for(config, args)?),
        Commands::Exec(args) => {
            let shell = args.shell.as_deref().unwrap_or(&config.session.shell);
            api::exec_container(context, args.container.as_deref(), shell)
        }
        Commands::Commit(args) => api::commit_container(context, &args.container, &args.target),
        Commands::Pull(args) => api::pull_image(context, &args.reference),
        Commands::Tag(args) => api::tag_image(context, &args.source, &args.target),
        Commands::Rename(args) => api::rename_container(context, &args.container, &args.new_name),
        Commands::Remove(args) => api::remove_container(context, &args.container),
        Commands::RemoveImage(args) => {
            let removal = api::remove_image(context, &args.reference)?;
            for container in &removal.failed_containers {
                warn!(container = %container, "dependent container was left in place");
            }
            Ok(CommandOutcome::Success)
        }
        Commands::Status(args) => {
            print_status(&api::image_status(context, args.reference.as_deref())?);
            Ok(CommandOutcome::Success)
        }
        Commands::Engine(args) => match args.action {
            EngineAction::Info => {
                print_engine(&api::engine_info(context.selector));
                Ok(CommandOutcome::Success)
            }
            EngineAction::Start => api::start_engine(context.selector),
            EngineAction::Restart => api::restart_engine(context.selector),
        },
    }
}

/// Apply `run` flags over the configured session settings.
fn session_for(config: &AppConfig, args: &RunArgs) -> RfswiftResult<SessionConfig> {
    let mut effective = config.clone();
    if let Some(shell) = &args.shell {
        effective.session.shell.clone_from(shell);
    }
    if let Some(bind) = &args.bind {
        effective.session.extra_bindings.clone_from(bind);
    }
    if let Some(network) = &args.network {
        effective.session.network_mode.clone_from(network);
    }
    effective.session.privileged |= args.privileged;

    effective.session_config(args.name.clone(), DefaultEnv::new().string("DISPLAY"))
}

#[expect(clippy::print_stderr, reason = "lookup misses are user-facing messages")]
fn report_not_found(error: &RfswiftError) {
    eprintln!("{error}");
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_status(reports: &[ImageStatusReport]) {
    if reports.is_empty() {
        println!("No rfswift images found.");
    }
    for report in reports {
        println!("{}\t{}", report.reference, report.status);
    }
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_engine(info: &EngineInfo) {
    println!("engine:      {} (preferred: {})", info.name, info.preferred);
    println!(
        "endpoint:    {}",
        info.endpoint.as_deref().unwrap_or("not detected")
    );
    println!(
        "service:     {}",
        if info.service_running {
            "running"
        } else {
            "not responding"
        }
    );
    println!("storage:     {}", info.storage_root.display());
    println!(
        "config edit: {}",
        if info.supports_direct_config_edit {
            "supported"
        } else {
            "not supported"
        }
    );
}
