//! Step definitions for session configuration scenarios.

use rfswift::session::{PROJECT_LABEL_KEY, PROJECT_LABEL_VALUE, build_create_body};
use rstest_bdd_macros::{given, then, when};

use super::{BuildOutcome, SessionConfigState, StepResult};

#[given("a configuration for image {image}")]
pub fn configuration_for_image(session_config_state: &SessionConfigState, image: String) {
    session_config_state.update(|config| config.image = Some(image));
}

#[given("a configuration without an image")]
pub fn configuration_without_image(session_config_state: &SessionConfigState) {
    session_config_state.update(|config| config.image = None);
}

#[given("the X11 binding is {binding}")]
pub fn x11_binding_is(session_config_state: &SessionConfigState, binding: String) {
    session_config_state.update(|config| config.session.x11_binding = binding);
}

#[given("the USB binding is {binding}")]
pub fn usb_binding_is(session_config_state: &SessionConfigState, binding: String) {
    session_config_state.update(|config| config.session.usb_binding = binding);
}

#[given("no extra bindings are configured")]
pub fn extra_bindings_are_empty(session_config_state: &SessionConfigState) {
    session_config_state.update(|config| config.session.extra_bindings.clear());
}

#[given("the extra bindings are {bindings}")]
pub fn extra_bindings_are(session_config_state: &SessionConfigState, bindings: String) {
    session_config_state.update(|config| config.session.extra_bindings = bindings);
}

#[given("the host display is {display}")]
pub fn host_display_is(session_config_state: &SessionConfigState, display: String) {
    session_config_state.host_display.set(display);
}

#[when("the session configuration is built")]
pub fn session_configuration_is_built(session_config_state: &SessionConfigState) {
    let config = session_config_state.config.get().unwrap_or_default();
    let outcome = match config.session_config(None, session_config_state.host_display.get()) {
        Ok(session) => BuildOutcome::Built(Box::new(session)),
        Err(error) => BuildOutcome::Failed(error.to_string()),
    };
    session_config_state.outcome.set(outcome);
}

#[then("the binds are {binds}")]
pub fn binds_are(session_config_state: &SessionConfigState, binds: String) -> StepResult<()> {
    let expected: Vec<&str> = binds.split(',').collect();
    if session_config_state.built()?.binds() == expected {
        Ok(())
    } else {
        Err("bind mounts differ from the expected order")
    }
}

#[then("the container environment contains {entry}")]
pub fn environment_contains(
    session_config_state: &SessionConfigState,
    entry: String,
) -> StepResult<()> {
    if session_config_state.built()?.environment().contains(&entry) {
        Ok(())
    } else {
        Err("environment entry is missing")
    }
}

#[then("the create payload is labelled project=rfswift")]
pub fn create_payload_is_labelled(session_config_state: &SessionConfigState) -> StepResult<()> {
    let body = build_create_body(&session_config_state.built()?, true);
    let labelled = body
        .labels
        .as_ref()
        .and_then(|labels| labels.get(PROJECT_LABEL_KEY))
        .is_some_and(|value| value == PROJECT_LABEL_VALUE);
    if labelled {
        Ok(())
    } else {
        Err("create payload lacks the project label")
    }
}

#[then("building fails because the image is missing")]
pub fn building_fails_for_missing_image(
    session_config_state: &SessionConfigState,
) -> StepResult<()> {
    match session_config_state.outcome.get() {
        Some(BuildOutcome::Failed(message)) if message.contains("image") => Ok(()),
        Some(BuildOutcome::Failed(_)) => Err("building failed for another reason"),
        Some(BuildOutcome::Built(_)) => Err("building succeeded without an image"),
        None => Err("session configuration was not built"),
    }
}
