//! Step definitions for engine selection scenarios.

use rstest_bdd_macros::{given, then, when};

use super::{EngineSelectionState, StepResult, parse_kind};

fn set_availability(state: &EngineSelectionState, docker: bool, podman: bool) {
    state.docker_available.set(docker);
    state.podman_available.set(podman);
}

#[given("only Podman is available")]
pub fn only_podman_available(engine_selection_state: &EngineSelectionState) {
    set_availability(engine_selection_state, false, true);
}

#[given("both engines are available")]
pub fn both_engines_available(engine_selection_state: &EngineSelectionState) {
    set_availability(engine_selection_state, true, true);
}

#[given("no engine is available")]
pub fn no_engine_available(engine_selection_state: &EngineSelectionState) {
    set_availability(engine_selection_state, false, false);
}

#[given("the environment prefers {kind}")]
pub fn environment_prefers(
    engine_selection_state: &EngineSelectionState,
    kind: String,
) -> StepResult<()> {
    engine_selection_state.env_preference.set(parse_kind(&kind)?);
    Ok(())
}

#[given("the preferred engine is {kind}")]
pub fn preferred_engine_is(
    engine_selection_state: &EngineSelectionState,
    kind: String,
) -> StepResult<()> {
    engine_selection_state
        .selector()
        .set_preferred(parse_kind(&kind)?);
    Ok(())
}

#[when("the preference is changed to {kind}")]
pub fn preference_is_changed_to(
    engine_selection_state: &EngineSelectionState,
    kind: String,
) -> StepResult<()> {
    preferred_engine_is(engine_selection_state, kind)
}

#[when("the engine is resolved")]
pub fn engine_is_resolved(engine_selection_state: &EngineSelectionState) {
    let engine = engine_selection_state.selector().resolve();
    engine_selection_state.resolved.set(engine.kind());
}

#[then("the resolved engine is {kind}")]
pub fn resolved_engine_is(
    engine_selection_state: &EngineSelectionState,
    kind: String,
) -> StepResult<()> {
    let expected = parse_kind(&kind)?;
    let actual = engine_selection_state
        .resolved
        .get()
        .ok_or("no engine was resolved")?;
    if actual == expected {
        Ok(())
    } else {
        Err("resolved engine differs from the expected one")
    }
}

#[then("detection ran {count} times")]
pub fn detection_ran(
    engine_selection_state: &EngineSelectionState,
    count: String,
) -> StepResult<()> {
    let expected: usize = count.parse().map_err(|_| "count must be a number")?;
    if engine_selection_state.detection_passes() == expected {
        Ok(())
    } else {
        Err("unexpected number of detection passes")
    }
}
