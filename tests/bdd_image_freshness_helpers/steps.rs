//! Step definitions for image freshness scenarios.

use rfswift::freshness::RemoteTag;
use rstest_bdd_macros::{given, then, when};

use super::{FreshnessState, StepResult, parse_time};

#[given("the registry published {tag} at {pushed}")]
pub fn registry_published(
    freshness_state: &FreshnessState,
    tag: String,
    pushed: String,
) -> StepResult<()> {
    let mut published = freshness_state.published.get().unwrap_or_default();
    published.push(RemoteTag {
        name: tag,
        architecture: String::from("amd64"),
        pushed: parse_time(&pushed)?,
    });
    freshness_state.published.set(published);
    Ok(())
}

#[given("the registry is unreachable")]
pub fn registry_is_unreachable(freshness_state: &FreshnessState) {
    freshness_state.registry_down.set(true);
}

#[given("the local image was created at {created}")]
pub fn local_image_created(freshness_state: &FreshnessState, created: String) -> StepResult<()> {
    freshness_state.local_created.set(parse_time(&created)?);
    Ok(())
}

#[when("the status of {repository}:{tag} is checked")]
pub fn status_is_checked(
    freshness_state: &FreshnessState,
    repository: String,
    tag: String,
) -> StepResult<()> {
    let status = freshness_state.check(&repository, &tag)?;
    freshness_state.status.set(status);
    Ok(())
}

#[then("the image is {expected}")]
pub fn image_is(freshness_state: &FreshnessState, expected: String) -> StepResult<()> {
    let status = freshness_state
        .status
        .get()
        .ok_or("no status was checked")?;
    if status.to_string().starts_with(expected.as_str()) {
        Ok(())
    } else {
        Err("image status differs from the expected one")
    }
}
