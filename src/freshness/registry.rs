//! Docker Hub tag listings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{RemoteTag, TagSource, TagsFuture};
use crate::error::{ImageError, RfswiftError};

/// Base URL of the Docker Hub v2 API.
pub const DOCKER_HUB_API: &str = "https://hub.docker.com/v2";

const PAGE_SIZE: u32 = 100;
const MAX_PAGES: usize = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// [`TagSource`] backed by the Docker Hub HTTP API.
#[derive(Debug, Clone)]
pub struct DockerHubTagSource {
    client: Client,
    base_url: String,
}

impl DockerHubTagSource {
    /// A source querying the public Docker Hub.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::RegistryFailed` when the HTTP client cannot be
    /// built.
    pub fn new() -> Result<Self, RfswiftError> {
        Self::with_base_url(DOCKER_HUB_API)
    }

    /// A source querying a Docker Hub compatible API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::RegistryFailed` when the HTTP client cannot be
    /// built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, RfswiftError> {
        let base = base_url.into();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("rfswift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| registry_failed(&base, error.to_string()))?;

        Ok(Self {
            client,
            base_url: base,
        })
    }

    async fn fetch_all(
        &self,
        repository: &str,
        architecture: &str,
    ) -> Result<Vec<RemoteTag>, RfswiftError> {
        let mut next = Some(format!(
            "{}/repositories/{repository}/tags?page_size={PAGE_SIZE}",
            self.base_url.trim_end_matches('/')
        ));
        let mut tags = Vec::new();

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else {
                break;
            };
            let page = self.fetch_page(repository, &url).await?;
            next = page.next.clone();
            tags.extend(tags_from_page(page, architecture));
        }

        debug!(repository, architecture, count = tags.len(), "fetched remote tags");
        Ok(tags)
    }

    async fn fetch_page(&self, repository: &str, url: &str) -> Result<TagPage, RfswiftError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| registry_failed(repository, error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(registry_failed(
                repository,
                format!("registry returned {status}: {body}"),
            ));
        }

        response
            .json::<TagPage>()
            .await
            .map_err(|error| registry_failed(repository, format!("invalid tag listing: {error}")))
    }
}

impl TagSource for DockerHubTagSource {
    fn list_tags(&self, repository: &str, architecture: &str) -> TagsFuture<'_> {
        let repository_owned = String::from(repository);
        let architecture_owned = String::from(architecture);
        Box::pin(async move {
            self.fetch_all(&repository_owned, &architecture_owned)
                .await
        })
    }
}

/// One page of `/repositories/<repo>/tags`.
#[derive(Debug, Deserialize)]
pub(super) struct TagPage {
    next: Option<String>,
    #[serde(default)]
    results: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
    tag_last_pushed: Option<DateTime<Utc>>,
    #[serde(default)]
    images: Vec<TagImage>,
}

#[derive(Debug, Deserialize)]
struct TagImage {
    architecture: Option<String>,
    last_pushed: Option<DateTime<Utc>>,
}

/// Entries of `page` built for `architecture`, one per matching image.
///
/// An image without its own push time inherits the tag's.
pub(super) fn tags_from_page(page: TagPage, architecture: &str) -> Vec<RemoteTag> {
    page.results
        .into_iter()
        .flat_map(|entry| {
            let TagEntry {
                name,
                tag_last_pushed,
                images,
            } = entry;
            images
                .into_iter()
                .filter(|image| image.architecture.as_deref() == Some(architecture))
                .filter_map(move |image| {
                    image.last_pushed.or(tag_last_pushed).map(|pushed| RemoteTag {
                        name: name.clone(),
                        architecture: String::from(architecture),
                        pushed,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn registry_failed(repository: &str, message: String) -> RfswiftError {
    RfswiftError::from(ImageError::RegistryFailed {
        repository: String::from(repository),
        message,
    })
}
