//! Presentation records shared between the runtime and its hosts.
//!
//! These describe what is currently audible or visible; they carry no
//! behavior. History snapshots store copies of them and rewinding compares
//! them layer by layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioChannel {
    Music,
    Ambience,
    Sfx,
    Voice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub channel: AudioChannel,
    pub layer: u32,
    pub name: String,
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
}

impl AudioTrack {
    pub fn slot(&self) -> (AudioChannel, u32) {
        (self.channel, self.layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualLayerKind {
    Background,
    Foreground,
    Cinematic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualLayer {
    pub kind: VisualLayerKind,
    pub depth: u32,
    pub is_image: bool,
    pub name: String,
    pub muted: bool,
}

impl VisualLayer {
    pub fn slot(&self) -> (VisualLayerKind, u32) {
        (self.kind, self.depth)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPlacement {
    pub name: String,
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub expression: Option<String>,
}
