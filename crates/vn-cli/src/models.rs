use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vn_core::{CommandToken, DialogueState, SessionSnapshot};
use vn_runtime::{HistoryEngine, HistoryTimeline, MemoryStage, VnEngine};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScenario {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) sources: BTreeMap<String, String>,
    pub(crate) entry_section: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerStateV1 {
    pub(crate) schema_version: String,
    pub(crate) scenario_id: String,
    pub(crate) entry_section: String,
    pub(crate) snapshot: SessionSnapshot,
    pub(crate) history: HistoryTimeline,
}

/// One running playthrough: the engine, the stage it drives and the
/// lines captured along the way.
#[derive(Debug)]
pub(crate) struct PlayerSession {
    pub(crate) engine: VnEngine,
    pub(crate) stage: MemoryStage,
    pub(crate) history: HistoryEngine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Dialogue,
    Choices,
    Input,
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    /// Every command performed on the way, transitions included.
    pub(crate) commands: Vec<CommandToken>,
    pub(crate) dialogue: Option<DialogueState>,
    pub(crate) title: Option<String>,
    pub(crate) choices: Vec<(usize, String)>,
}

impl BoundaryResult {
    pub(crate) fn new(event: BoundaryEvent, commands: Vec<CommandToken>) -> Self {
        Self {
            event,
            commands,
            dialogue: None,
            title: None,
            choices: Vec::new(),
        }
    }

    pub(crate) fn is_suspended(&self) -> bool {
        self.event != BoundaryEvent::End
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}
