//! Behavioural test helpers for session configuration.

// rstest-bdd macros generate internal code that triggers these lints for unused state parameters
#![allow(
    clippy::used_underscore_binding,
    reason = "rstest-bdd requires state parameter in macro-generated code"
)]
#![allow(
    non_snake_case,
    reason = "rstest-bdd generates non-snake-case internal variables"
)]

mod steps;

use rfswift::config::AppConfig;
use rfswift::session::SessionConfig;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

// Re-export step definitions so they are visible to rstest-bdd macros.
#[expect(
    unused_imports,
    reason = "rstest-bdd discovers step functions via attributes, not runtime usage"
)]
pub use steps::*;

/// Step result type for BDD tests, using a static string for errors.
pub type StepResult<T> = Result<T, &'static str>;

/// How building the session configuration turned out.
#[derive(Clone, Debug)]
pub enum BuildOutcome {
    /// The configuration was built.
    Built(Box<SessionConfig>),
    /// Building failed with this message.
    Failed(String),
}

/// State shared across session configuration scenarios.
#[derive(Default, ScenarioState)]
pub struct SessionConfigState {
    /// Application configuration under construction.
    pub config: Slot<AppConfig>,
    /// `DISPLAY` of the simulated host.
    pub host_display: Slot<String>,
    /// Result of the build step.
    pub outcome: Slot<BuildOutcome>,
}

/// Fixture providing a fresh session configuration state.
#[fixture]
pub fn session_config_state() -> SessionConfigState {
    SessionConfigState::default()
}

impl SessionConfigState {
    /// Apply `edit` to the stored configuration.
    pub fn update(&self, edit: impl FnOnce(&mut AppConfig)) {
        let mut config = self.config.get().unwrap_or_default();
        edit(&mut config);
        self.config.set(config);
    }

    /// The built session configuration.
    pub fn built(&self) -> StepResult<SessionConfig> {
        match self.outcome.get() {
            Some(BuildOutcome::Built(config)) => Ok(*config),
            Some(BuildOutcome::Failed(_)) => Err("session configuration failed to build"),
            None => Err("session configuration was not built"),
        }
    }
}
