use vn_core::{AudioTrack, VisualLayer};

use super::state::HistoryState;
use crate::stage::Stage;

/// Puts a state's presentation on the stage. Slots that already match are
/// left playing or showing.
pub(super) fn apply_presentation(state: &HistoryState, stage: &mut dyn Stage) {
    stage.show_dialogue(state.dialogue());
    apply_audio(state.audio_tracks(), stage);
    apply_visuals(state.visual_layers(), stage);
    if stage.characters() != state.characters() {
        stage.apply_characters(state.characters());
    }
}

fn apply_audio(target: &[AudioTrack], stage: &mut dyn Stage) {
    let live = stage.audio_tracks();
    for track in &live {
        if !target.iter().any(|wanted| wanted.slot() == track.slot()) {
            stage.stop_track(track.channel, track.layer);
        }
    }
    for wanted in target {
        let unchanged = live
            .iter()
            .any(|track| track.slot() == wanted.slot() && track == wanted);
        if !unchanged {
            stage.play_track(wanted);
        }
    }
}

fn apply_visuals(target: &[VisualLayer], stage: &mut dyn Stage) {
    let live = stage.visual_layers();
    for layer in &live {
        if !target.iter().any(|wanted| wanted.slot() == layer.slot()) {
            stage.clear_layer(layer.kind, layer.depth);
        }
    }
    for wanted in target {
        if !live.contains(wanted) {
            stage.show_layer(wanted);
        }
    }
}
