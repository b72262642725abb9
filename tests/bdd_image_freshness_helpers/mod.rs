//! Behavioural test helpers for image freshness.
//!
//! The registry and the local engine are fixed-answer stubs; checks run on
//! a private Tokio runtime.

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

use chrono::{DateTime, Utc};
use rfswift::error::{ImageError, RfswiftError};
use rfswift::freshness::{
    CreatedFuture, FreshnessChecker, ImageStatus, LocalImageSource, RemoteTag, TagSource,
    TagsFuture,
};
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

/// State shared across image freshness scenarios.
#[derive(Default, ScenarioState)]
pub struct FreshnessState {
    /// Tags the stub registry publishes.
    pub published: Slot<Vec<RemoteTag>>,
    /// Whether the stub registry fails every request.
    pub registry_down: Slot<bool>,
    /// Creation time reported for the local image.
    pub local_created: Slot<DateTime<Utc>>,
    /// Outcome of the status check.
    pub status: Slot<ImageStatus>,
}

/// Fixture providing a fresh freshness state.
#[fixture]
pub fn freshness_state() -> FreshnessState {
    FreshnessState::default()
}

impl FreshnessState {
    /// Check `repository:tag` against the stubbed registry and engine.
    pub fn check(&self, repository: &str, tag: &str) -> StepResult<ImageStatus> {
        let tags = StubRegistry {
            published: self.published.get().unwrap_or_default(),
            down: self.registry_down.get().unwrap_or(false),
        };
        let local = StubLocal {
            created: self.local_created.get(),
        };
        let checker = FreshnessChecker::for_architecture(tags, local, "x86_64")
            .map_err(|_| "architecture should be supported")?;
        let runtime = tokio::runtime::Runtime::new().map_err(|_| "failed to create runtime")?;
        Ok(runtime.block_on(checker.status_or_unknown(repository, tag)))
    }
}

/// Parses an RFC 3339 step argument.
pub fn parse_time(raw: &str) -> StepResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| "timestamp must be RFC 3339")
}

struct StubRegistry {
    published: Vec<RemoteTag>,
    down: bool,
}

impl TagSource for StubRegistry {
    fn list_tags(&self, repository: &str, architecture: &str) -> TagsFuture<'_> {
        let result = if self.down {
            Err(RfswiftError::from(ImageError::RegistryFailed {
                repository: String::from(repository),
                message: String::from("connection refused"),
            }))
        } else {
            Ok(self
                .published
                .iter()
                .filter(|tag| tag.architecture == architecture)
                .cloned()
                .collect())
        };
        Box::pin(async move { result })
    }
}

struct StubLocal {
    created: Option<DateTime<Utc>>,
}

impl LocalImageSource for StubLocal {
    fn image_created(&self, image: &str) -> CreatedFuture<'_> {
        let result = self.created.ok_or_else(|| {
            RfswiftError::from(ImageError::InspectFailed {
                image: String::from(image),
                message: String::from("no such image"),
            })
        });
        Box::pin(async move { result })
    }
}
