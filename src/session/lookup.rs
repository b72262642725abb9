//! Lookup of containers carrying the project label.

use bollard::models::ContainerSummary;
use tracing::debug;

use super::client::ContainerSessionClient;
use super::config::project_label_filter;
use crate::error::{ContainerError, RfswiftError};

/// A labelled container as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContainer {
    /// Engine-assigned identifier.
    pub id: String,
    /// Primary name without the leading `/`.
    pub name: String,
    /// Image the container was created from.
    pub image: String,
    /// Human-readable status (`Up 2 hours`, `Exited (0) ...`).
    pub status: String,
    /// Creation time in seconds since the Unix epoch.
    pub created: i64,
}

impl SessionContainer {
    fn from_summary(summary: ContainerSummary) -> Option<Self> {
        let id = summary.id?;
        let name = summary
            .names
            .and_then(|names| names.into_iter().next())
            .map(|raw| String::from(raw.trim_start_matches('/')))
            .unwrap_or_else(|| id.clone());

        Some(Self {
            id,
            name,
            image: summary.image.unwrap_or_default(),
            status: summary.status.unwrap_or_default(),
            created: summary.created.unwrap_or_default(),
        })
    }
}

/// List every container carrying the project label, newest first.
///
/// # Errors
///
/// Returns `ContainerError::OperationFailed` when the engine rejects the
/// listing.
pub async fn list_session_containers<C: ContainerSessionClient + ?Sized>(
    client: &C,
) -> Result<Vec<SessionContainer>, RfswiftError> {
    let label = project_label_filter();
    let summaries = client.list_containers(&label).await.map_err(|error| {
        RfswiftError::from(ContainerError::OperationFailed {
            operation: String::from("list containers"),
            target: label.clone(),
            message: error.to_string(),
        })
    })?;

    let mut containers: Vec<SessionContainer> = summaries
        .into_iter()
        .filter_map(SessionContainer::from_summary)
        .collect();
    containers.sort_by(|left, right| right.created.cmp(&left.created));
    debug!(count = containers.len(), "listed labelled containers");
    Ok(containers)
}

/// The most recently created labelled container.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` when no labelled container exists, and
/// the listing errors of [`list_session_containers`].
pub async fn latest_session_container<C: ContainerSessionClient + ?Sized>(
    client: &C,
) -> Result<SessionContainer, RfswiftError> {
    let containers = list_session_containers(client).await?;
    select_latest(containers).ok_or_else(|| {
        RfswiftError::from(ContainerError::NotFound {
            identifier: format!("label {}", project_label_filter()),
            available: Vec::new(),
        })
    })
}

/// Picks the container with the greatest creation time.
///
/// Among equal timestamps the last listed wins.
fn select_latest(containers: Vec<SessionContainer>) -> Option<SessionContainer> {
    containers
        .into_iter()
        .max_by_key(|container| container.created)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn container(id: &str, created: i64) -> SessionContainer {
        SessionContainer {
            id: String::from(id),
            name: String::from(id),
            image: String::from("penthertz/rfswift:sdr_light"),
            status: String::from("Exited (0)"),
            created,
        }
    }

    #[rstest]
    #[case(vec![container("a", 10), container("b", 30), container("c", 20)], "b")]
    #[case(vec![container("a", 30), container("b", 10)], "a")]
    #[case(vec![container("a", 10), container("b", 10)], "b")]
    fn latest_has_greatest_creation_time(
        #[case] containers: Vec<SessionContainer>,
        #[case] expected: &str,
    ) {
        let latest = select_latest(containers).expect("one container should be selected");
        assert_eq!(latest.id, expected);
    }

    #[rstest]
    fn latest_of_nothing_is_none() {
        assert_eq!(select_latest(Vec::new()), None);
    }

    #[rstest]
    fn summary_name_drops_leading_slash() {
        let summary = ContainerSummary {
            id: Some(String::from("f00d")),
            names: Some(vec![String::from("/sdr")]),
            created: Some(42),
            ..ContainerSummary::default()
        };
        let parsed = SessionContainer::from_summary(summary).expect("summary has an id");
        assert_eq!(parsed.name, "sdr");
        assert_eq!(parsed.created, 42);
    }

    #[rstest]
    fn summary_without_id_is_skipped() {
        assert_eq!(
            SessionContainer::from_summary(ContainerSummary::default()),
            None
        );
    }
}
