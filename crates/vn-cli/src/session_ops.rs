use std::path::Path;

use tracing::debug;
use vn_api::{
    create_engine_from_sources, resume_engine_from_snapshot, CreateEngineFromSourcesOptions,
    ResumeEngineFromSnapshotOptions,
};
use vn_core::VnError;
use vn_runtime::{HistoryEngine, HistoryOptions, MemoryStage};

use crate::{
    emit_boundary, load_player_state, load_source_by_ref, save_player_state, BoundaryResult,
    LoadedScenario, PlayerSession, PlayerStateV1, PLAYER_STATE_SCHEMA,
};

pub(crate) fn create_session_for_scenario(
    scenario: &LoadedScenario,
    entry_section: &str,
    history_capacity: usize,
) -> Result<PlayerSession, VnError> {
    let engine = create_engine_from_sources(CreateEngineFromSourcesOptions {
        sources: scenario.sources.clone(),
        entry_section: Some(entry_section.to_string()),
        ..CreateEngineFromSourcesOptions::default()
    })?;

    Ok(PlayerSession {
        engine,
        stage: MemoryStage::new(),
        history: HistoryEngine::new(HistoryOptions {
            capacity: history_capacity,
        }),
    })
}

/// Rebuilds a session from a saved state. The stage gets the newest
/// captured presentation and the engine re-issues its pending boundary so
/// the next action applies to it.
pub(crate) fn resume_session_for_state(
    scenario: &LoadedScenario,
    state: &PlayerStateV1,
) -> Result<PlayerSession, VnError> {
    let mut engine = resume_engine_from_snapshot(ResumeEngineFromSnapshotOptions {
        sources: scenario.sources.clone(),
        snapshot: state.snapshot.clone(),
        keywords: None,
        tags: None,
    })?;

    let history = HistoryEngine::from_timeline(state.history.clone());
    let mut stage = MemoryStage::new();
    history.restore_latest(&mut stage);

    if !engine.ended() {
        engine.next_output()?;
    }
    debug!(
        scenario = %state.scenario_id,
        states = history.timeline().len(),
        "session resumed"
    );

    Ok(PlayerSession {
        engine,
        stage,
        history,
    })
}

pub(crate) fn save_session_state(
    path: &Path,
    session: &PlayerSession,
    scenario_id: &str,
    entry_section: &str,
) -> Result<(), VnError> {
    let state = PlayerStateV1 {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        scenario_id: scenario_id.to_string(),
        entry_section: entry_section.to_string(),
        snapshot: session.engine.snapshot(),
        history: session.history.timeline().clone(),
    };
    save_player_state(path, &state)
}

pub(crate) fn load_session_from_state_for_ref(
    path: &Path,
) -> Result<(LoadedScenario, PlayerStateV1, PlayerSession), VnError> {
    let state = load_player_state(path)?;
    let scenario = load_source_by_ref(&state.scenario_id, &state.entry_section)?;
    let session = resume_session_for_state(&scenario, &state)?;
    Ok((scenario, state, session))
}

/// Saves the session unless the story is over, then prints the boundary.
pub(crate) fn emit_boundary_with_saved_state(
    session: &PlayerSession,
    boundary: BoundaryResult,
    state_out: &str,
    scenario_id: &str,
    entry_section: &str,
) -> Result<i32, VnError> {
    if boundary.is_suspended() {
        save_session_state(Path::new(state_out), session, scenario_id, entry_section)?;
        emit_boundary(boundary, Some(state_out.to_string()));
        return Ok(0);
    }

    emit_boundary(boundary, None);
    Ok(0)
}

impl PlayerSession {
    /// Steps one line back and makes it live. Returns false when there is
    /// no older line.
    pub(crate) fn back(&mut self) -> Result<bool, VnError> {
        if !self
            .history
            .rewind_one_step(&self.engine, &mut self.stage)
        {
            return Ok(false);
        }
        self.history
            .apply_and_commit(&mut self.engine, &mut self.stage)
    }
}
