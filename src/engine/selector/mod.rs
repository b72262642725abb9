//! Process-wide engine selection.
//!
//! [`EngineSelector`] resolves a preference into a concrete backend exactly
//! once and hands the same instance to every caller until the preference
//! changes. Backends are produced by an [`EngineFactory`], so tests can swap in
//! stub engines without touching the real environment.

use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mockable::DefaultEnv;
use tracing::{debug, info, warn};

use super::connection::EngineEndpoint;
use super::detect::{DOCKER_HOST_VAR, Platform, SocketDetector, SystemHostProbe};
use super::docker::DockerEngine;
use super::podman::PodmanEngine;
use super::{Engine, EngineKind};

/// Environment variable supplying the auto-mode preference.
pub const ENGINE_PREFERENCE_VAR: &str = "RFSWIFT_ENGINE";

/// Produces backend instances for the selector.
pub trait EngineFactory: Send + Sync {
    /// Builds the Docker backend.
    fn docker(&self) -> Arc<dyn Engine>;

    /// Builds the Podman backend.
    fn podman(&self) -> Arc<dyn Engine>;

    /// The preference named by the environment, if any.
    fn env_preference(&self) -> Option<EngineKind>;

    /// Exposes `endpoint` as the generic engine host so clients built from
    /// environment defaults reach the resolved Podman service.
    fn publish_engine_host(&self, endpoint: &EngineEndpoint);
}

/// [`EngineFactory`] backed by the real host.
pub struct SystemEngineFactory {
    detector: Arc<SocketDetector<DefaultEnv>>,
}

impl SystemEngineFactory {
    /// Creates a factory probing the current platform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detector: Arc::new(SocketDetector::new(
                DefaultEnv::new(),
                Arc::new(SystemHostProbe),
                Platform::current(),
            )),
        }
    }
}

impl Default for SystemEngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for SystemEngineFactory {
    fn docker(&self) -> Arc<dyn Engine> {
        Arc::new(DockerEngine::new(Arc::clone(&self.detector)))
    }

    fn podman(&self) -> Arc<dyn Engine> {
        Arc::new(PodmanEngine::new(Arc::clone(&self.detector)))
    }

    fn env_preference(&self) -> Option<EngineKind> {
        let raw = self.detector.var(ENGINE_PREFERENCE_VAR)?;
        match raw.parse::<EngineKind>() {
            Ok(kind) => Some(kind),
            Err(error) => {
                warn!(%error, "ignoring {ENGINE_PREFERENCE_VAR}");
                None
            }
        }
    }

    fn publish_engine_host(&self, endpoint: &EngineEndpoint) {
        if self.detector.var(DOCKER_HOST_VAR).is_some() {
            return;
        }
        debug!(%endpoint, "publishing Podman endpoint as {DOCKER_HOST_VAR}");
        // SAFETY: runs under the selector's write lock. The binary resolves on
        // its main thread before the Tokio runtime starts any workers, and
        // nothing changes the preference after that.
        unsafe { std::env::set_var(DOCKER_HOST_VAR, endpoint.uri()) };
    }
}

struct SelectionState {
    preferred: Option<EngineKind>,
    resolved: Option<Arc<dyn Engine>>,
}

/// Thread-safe, lazily resolving engine selection.
pub struct EngineSelector {
    factory: Box<dyn EngineFactory>,
    state: RwLock<SelectionState>,
}

impl EngineSelector {
    /// Creates a selector with no explicit preference and nothing resolved.
    #[must_use]
    pub fn new(factory: Box<dyn EngineFactory>) -> Self {
        Self {
            factory,
            state: RwLock::new(SelectionState {
                preferred: None,
                resolved: None,
            }),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SelectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SelectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an explicit preference and invalidates any resolved engine.
    ///
    /// Clients already obtained from the previous engine keep working; only
    /// the next [`Self::resolve`] re-detects.
    pub fn set_preferred(&self, kind: EngineKind) {
        let mut state = self.write_state();
        state.preferred = Some(kind);
        state.resolved = None;
        debug!(%kind, "engine preference set");
    }

    /// The effective preference: explicit, then environment, then `Auto`.
    #[must_use]
    pub fn preferred(&self) -> EngineKind {
        let explicit = self.read_state().preferred;
        explicit
            .or_else(|| self.factory.env_preference())
            .unwrap_or_default()
    }

    /// The resolved engine, if resolution already happened.
    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn Engine>> {
        self.read_state().resolved.clone()
    }

    /// Returns the resolved engine, detecting it on first use.
    ///
    /// Concurrent first calls run a single detection pass; every caller
    /// observes the same instance. The result is never empty: when nothing is
    /// reachable the preferred backend is returned so the first real operation
    /// fails with a descriptive engine error.
    pub fn resolve(&self) -> Arc<dyn Engine> {
        if let Some(engine) = self.current() {
            return engine;
        }

        let mut state = self.write_state();
        if let Some(engine) = &state.resolved {
            return Arc::clone(engine);
        }

        let preference = state
            .preferred
            .or_else(|| self.factory.env_preference())
            .unwrap_or_default();
        let engine = self.select(preference);
        if engine.kind() == EngineKind::Podman
            && let Some(endpoint) = engine.endpoint()
        {
            self.factory.publish_engine_host(&endpoint);
        }

        info!(engine = engine.name(), %preference, "container engine resolved");
        state.resolved = Some(Arc::clone(&engine));
        engine
    }

    fn select(&self, preference: EngineKind) -> Arc<dyn Engine> {
        let (primary, secondary) = match preference {
            EngineKind::Podman => (self.factory.podman(), self.factory.docker()),
            EngineKind::Docker | EngineKind::Auto => (self.factory.docker(), self.factory.podman()),
        };

        if primary.is_available() {
            return primary;
        }

        if secondary.is_available() {
            if preference == EngineKind::Auto {
                debug!(engine = secondary.name(), "Docker not found, using Podman");
            } else {
                warn!(
                    requested = primary.name(),
                    using = secondary.name(),
                    "requested engine is not available, falling back"
                );
            }
            return secondary;
        }

        warn!(
            engine = primary.name(),
            "no container engine detected, defaulting to {}",
            primary.name()
        );
        primary
    }
}

/// The process-wide selector backed by [`SystemEngineFactory`].
#[must_use]
pub fn global() -> &'static EngineSelector {
    static SELECTOR: OnceLock<EngineSelector> = OnceLock::new();
    SELECTOR.get_or_init(|| EngineSelector::new(Box::new(SystemEngineFactory::new())))
}
