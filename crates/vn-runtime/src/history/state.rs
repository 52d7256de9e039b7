use serde::{Deserialize, Serialize};
use vn_core::{
    AudioTrack, CharacterPlacement, DialogueState, ExecutionPoint, VariableRecord, VisualLayer,
};

use crate::engine::VnEngine;
use crate::stage::Stage;

/// Everything needed to put the session back where it was when a line
/// was shown. Read-only once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    dialogue: DialogueState,
    audio_tracks: Vec<AudioTrack>,
    visual_layers: Vec<VisualLayer>,
    characters: Vec<CharacterPlacement>,
    variables: Vec<VariableRecord>,
    point: Option<ExecutionPoint>,
}

impl HistoryState {
    pub fn capture(engine: &VnEngine, stage: &dyn Stage) -> Self {
        Self {
            dialogue: engine.last_dialogue().clone(),
            audio_tracks: stage.audio_tracks(),
            visual_layers: stage.visual_layers(),
            characters: stage.characters(),
            variables: engine.variables().records(),
            point: engine.current_point(),
        }
    }

    pub fn dialogue(&self) -> &DialogueState {
        &self.dialogue
    }

    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio_tracks
    }

    pub fn visual_layers(&self) -> &[VisualLayer] {
        &self.visual_layers
    }

    pub fn characters(&self) -> &[CharacterPlacement] {
        &self.characters
    }

    pub fn variables(&self) -> &[VariableRecord] {
        &self.variables
    }

    pub fn point(&self) -> Option<&ExecutionPoint> {
        self.point.as_ref()
    }

    /// Whether this state describes the line the engine is showing now.
    pub(crate) fn mirrors(&self, engine: &VnEngine) -> bool {
        self.point == engine.current_point() && &self.dialogue == engine.last_dialogue()
    }
}
