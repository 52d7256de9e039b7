use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::warn;
use vn_core::{
    AudioChannel, AudioTrack, CharacterPlacement, CommandToken, DialogueState, VisualLayer,
    VisualLayerKind,
};

/// Presentation collaborator driven by the history engine.
///
/// Getters describe what is live right now; the mutators are called by
/// rewinds with per-slot differences only, so a slot that already matches
/// is never touched.
pub trait Stage {
    fn audio_tracks(&self) -> Vec<AudioTrack>;
    fn visual_layers(&self) -> Vec<VisualLayer>;
    fn characters(&self) -> Vec<CharacterPlacement>;

    fn show_dialogue(&mut self, dialogue: &DialogueState);
    fn play_track(&mut self, track: &AudioTrack);
    fn stop_track(&mut self, channel: AudioChannel, layer: u32);
    fn show_layer(&mut self, layer: &VisualLayer);
    fn clear_layer(&mut self, kind: VisualLayerKind, depth: u32);
    /// Receives the full cast; the stage works out what moved.
    fn apply_characters(&mut self, characters: &[CharacterPlacement]);
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Dialogue(DialogueState),
    Play(AudioTrack),
    Stop(AudioChannel, u32),
    Show(VisualLayer),
    Clear(VisualLayerKind, u32),
    Characters(Vec<CharacterPlacement>),
}

/// Stage kept entirely in memory. Understands a small command vocabulary
/// and records every mutation it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryStage {
    dialogue: DialogueState,
    audio: BTreeMap<(AudioChannel, u32), AudioTrack>,
    visuals: BTreeMap<(VisualLayerKind, u32), VisualLayer>,
    characters: Vec<CharacterPlacement>,
    events: Vec<StageEvent>,
}

fn parsed_arg<T: FromStr>(command: &CommandToken, key: &str, default: T) -> T {
    command
        .arg(key)
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn flag_arg(command: &CommandToken, key: &str, default: bool) -> bool {
    match command.arg(key) {
        Some(value) => value.eq_ignore_ascii_case("true") || value == "1",
        None => {
            default
                || command
                    .args
                    .iter()
                    .any(|arg| arg.key.is_none() && arg.value.eq_ignore_ascii_case(key))
        }
    }
}

impl MemoryStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialogue(&self) -> &DialogueState {
        &self.dialogue
    }

    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    /// Applies commands in order and returns the names it did not know.
    pub fn apply_commands(&mut self, commands: &[CommandToken]) -> Vec<String> {
        commands
            .iter()
            .filter(|command| !self.apply_command(command))
            .map(|command| command.name.clone())
            .collect()
    }

    pub fn apply_command(&mut self, command: &CommandToken) -> bool {
        let name = command.name.to_ascii_lowercase();
        match name.as_str() {
            "music" | "ambience" | "sfx" => {
                let channel = match name.as_str() {
                    "music" => AudioChannel::Music,
                    "ambience" => AudioChannel::Ambience,
                    _ => AudioChannel::Sfx,
                };
                let Some(track) = command.positional(0) else {
                    warn!(command = %command.name, "audio command without a track name");
                    return false;
                };
                let track = AudioTrack {
                    channel,
                    layer: parsed_arg(command, "layer", 0),
                    name: track.to_string(),
                    volume: parsed_arg(command, "volume", 1.0),
                    pitch: parsed_arg(command, "pitch", 1.0),
                    looping: flag_arg(command, "loop", channel != AudioChannel::Sfx),
                };
                self.play_track(&track);
                true
            }
            "stopmusic" => {
                self.stop_track(AudioChannel::Music, parsed_arg(command, "layer", 0));
                true
            }
            "bg" | "fg" => {
                let kind = if name == "bg" {
                    VisualLayerKind::Background
                } else {
                    VisualLayerKind::Foreground
                };
                let Some(image) = command.positional(0) else {
                    warn!(command = %command.name, "layer command without an image name");
                    return false;
                };
                let layer = VisualLayer {
                    kind,
                    depth: parsed_arg(command, "depth", 0),
                    is_image: !flag_arg(command, "video", false),
                    name: image.to_string(),
                    muted: flag_arg(command, "muted", false),
                };
                self.show_layer(&layer);
                true
            }
            "clearbg" => {
                self.clear_layer(VisualLayerKind::Background, parsed_arg(command, "depth", 0));
                true
            }
            "show" | "hide" => {
                let Some(character) = command.positional(0) else {
                    warn!(command = %command.name, "character command without a name");
                    return false;
                };
                let mut cast = self.characters.clone();
                let index = match cast
                    .iter()
                    .position(|placement| placement.name.eq_ignore_ascii_case(character))
                {
                    Some(index) => index,
                    None => {
                        cast.push(CharacterPlacement {
                            name: character.to_string(),
                            visible: false,
                            x: 0.0,
                            y: 0.0,
                            expression: None,
                        });
                        cast.len() - 1
                    }
                };
                let placement = &mut cast[index];
                placement.visible = name == "show";
                if name == "show" {
                    placement.x = parsed_arg(command, "x", placement.x);
                    placement.y = parsed_arg(command, "y", placement.y);
                    if let Some(expression) = command
                        .arg("expression")
                        .or_else(|| command.positional(1))
                    {
                        placement.expression = Some(expression.to_string());
                    }
                }
                self.apply_characters(&cast);
                true
            }
            _ => false,
        }
    }
}

impl Stage for MemoryStage {
    fn audio_tracks(&self) -> Vec<AudioTrack> {
        self.audio.values().cloned().collect()
    }

    fn visual_layers(&self) -> Vec<VisualLayer> {
        self.visuals.values().cloned().collect()
    }

    fn characters(&self) -> Vec<CharacterPlacement> {
        self.characters.clone()
    }

    fn show_dialogue(&mut self, dialogue: &DialogueState) {
        self.dialogue = dialogue.clone();
        self.events.push(StageEvent::Dialogue(dialogue.clone()));
    }

    fn play_track(&mut self, track: &AudioTrack) {
        self.audio.insert(track.slot(), track.clone());
        self.events.push(StageEvent::Play(track.clone()));
    }

    fn stop_track(&mut self, channel: AudioChannel, layer: u32) {
        self.audio.remove(&(channel, layer));
        self.events.push(StageEvent::Stop(channel, layer));
    }

    fn show_layer(&mut self, layer: &VisualLayer) {
        self.visuals.insert(layer.slot(), layer.clone());
        self.events.push(StageEvent::Show(layer.clone()));
    }

    fn clear_layer(&mut self, kind: VisualLayerKind, depth: u32) {
        self.visuals.remove(&(kind, depth));
        self.events.push(StageEvent::Clear(kind, depth));
    }

    fn apply_characters(&mut self, characters: &[CharacterPlacement]) {
        self.characters = characters.to_vec();
        self.events
            .push(StageEvent::Characters(characters.to_vec()));
    }
}
