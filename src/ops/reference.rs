//! Image references split into repository and tag.

use std::fmt;
use std::str::FromStr;

use crate::error::{ImageError, RfswiftError};

/// Tag assumed when a reference names none.
pub const DEFAULT_TAG: &str = "latest";

/// A `repository[:tag]` image reference.
///
/// Registry ports (`registry:5000/repo`) are not mistaken for tags; digests
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    repository: String,
    tag: String,
}

impl ImageReference {
    /// Build a reference from parts.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::InvalidReference` when either part is blank.
    pub fn new(repository: &str, tag: &str) -> Result<Self, RfswiftError> {
        let repository_trimmed = repository.trim();
        let tag_trimmed = tag.trim();
        if repository_trimmed.is_empty() || tag_trimmed.is_empty() || tag_trimmed.contains('/') {
            return Err(invalid(&format!("{repository}:{tag}")));
        }

        Ok(Self {
            repository: String::from(repository_trimmed),
            tag: String::from(tag_trimmed),
        })
    }

    /// The repository, including any registry prefix.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl FromStr for ImageReference {
    type Err = RfswiftError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains('@') || trimmed.contains(char::is_whitespace) {
            return Err(invalid(value));
        }

        let name_start = trimmed.rfind('/').map_or(0, |slash| slash + 1);
        let tag_separator = trimmed
            .rfind(':')
            .filter(|&colon| colon >= name_start);

        match tag_separator {
            Some(colon) => {
                let (repository, tag_with_colon) = trimmed.split_at(colon);
                let tag = tag_with_colon.trim_start_matches(':');
                Self::new(repository, tag).map_err(|_| invalid(value))
            }
            None => Self::new(trimmed, DEFAULT_TAG),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.repository, self.tag)
    }
}

fn invalid(reference: &str) -> RfswiftError {
    RfswiftError::from(ImageError::InvalidReference {
        reference: String::from(reference),
    })
}
