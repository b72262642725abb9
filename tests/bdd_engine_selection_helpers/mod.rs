//! Behavioural test helpers for engine selection.
//!
//! Backends are stubs produced by a counting [`EngineFactory`], so the
//! scenarios never touch the host's real sockets or environment.

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

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bollard::Docker;
use rfswift::engine::{Engine, EngineEndpoint, EngineFactory, EngineKind, EngineSelector};
use rfswift::error::{EngineError, RfswiftError};
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

/// State shared across engine selection scenarios.
#[derive(Default, ScenarioState)]
pub struct EngineSelectionState {
    /// Whether the Docker stub reports an endpoint.
    pub docker_available: Slot<bool>,
    /// Whether the Podman stub reports an endpoint.
    pub podman_available: Slot<bool>,
    /// Preference supplied by the stub environment.
    pub env_preference: Slot<EngineKind>,
    /// Selector under test, built on first use.
    pub selector: Slot<Arc<EngineSelector>>,
    /// Detection passes observed by the factory.
    pub passes: Slot<Arc<AtomicUsize>>,
    /// Kind of the most recently resolved engine.
    pub resolved: Slot<EngineKind>,
}

/// Fixture providing a fresh selection state.
#[fixture]
pub fn engine_selection_state() -> EngineSelectionState {
    EngineSelectionState::default()
}

impl EngineSelectionState {
    /// The selector for this scenario, built from the availability recorded
    /// so far.
    pub fn selector(&self) -> Arc<EngineSelector> {
        if let Some(existing) = self.selector.get() {
            return existing;
        }

        let passes = Arc::new(AtomicUsize::new(0));
        let factory = StubFactory {
            docker_available: self.docker_available.get().unwrap_or(false),
            podman_available: self.podman_available.get().unwrap_or(false),
            env_preference: self.env_preference.get(),
            passes: Arc::clone(&passes),
        };
        let selector = Arc::new(EngineSelector::new(Box::new(factory)));
        self.passes.set(passes);
        self.selector.set(Arc::clone(&selector));
        selector
    }

    /// Detection passes so far.
    pub fn detection_passes(&self) -> usize {
        self.passes
            .get()
            .map_or(0, |passes| passes.load(Ordering::SeqCst))
    }
}

/// Parses a step argument naming an engine.
pub fn parse_kind(raw: &str) -> StepResult<EngineKind> {
    raw.parse().map_err(|_| "unknown engine name in step")
}

#[derive(Debug)]
struct StubEngine {
    kind: EngineKind,
    available: bool,
}

impl Engine for StubEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        match self.kind {
            EngineKind::Podman => "Podman",
            EngineKind::Docker | EngineKind::Auto => "Docker",
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_service_running(&self) -> bool {
        self.available
    }

    fn endpoint(&self) -> Option<EngineEndpoint> {
        self.available
            .then(|| EngineEndpoint::unix_socket(Path::new("/run/stub.sock")))
    }

    fn client(&self) -> Result<Docker, RfswiftError> {
        Err(RfswiftError::from(EngineError::Unavailable {
            engine: String::from(self.name()),
            message: String::from("stub engine"),
        }))
    }

    fn start_service(&self) -> Result<(), RfswiftError> {
        Ok(())
    }

    fn restart_service(&self) -> Result<(), RfswiftError> {
        Ok(())
    }

    fn container_config_paths(&self, _container_id: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    fn supports_direct_config_edit(&self) -> bool {
        self.kind == EngineKind::Docker
    }

    fn storage_root(&self) -> PathBuf {
        PathBuf::new()
    }
}

struct StubFactory {
    docker_available: bool,
    podman_available: bool,
    env_preference: Option<EngineKind>,
    passes: Arc<AtomicUsize>,
}

impl EngineFactory for StubFactory {
    fn docker(&self) -> Arc<dyn Engine> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        Arc::new(StubEngine {
            kind: EngineKind::Docker,
            available: self.docker_available,
        })
    }

    fn podman(&self) -> Arc<dyn Engine> {
        Arc::new(StubEngine {
            kind: EngineKind::Podman,
            available: self.podman_available,
        })
    }

    fn env_preference(&self) -> Option<EngineKind> {
        self.env_preference
    }

    fn publish_engine_host(&self, _endpoint: &EngineEndpoint) {}
}
