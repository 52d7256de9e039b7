mod apply;
mod state;
mod timeline;

use tracing::{debug, info};
use vn_core::{DialogueState, VnError};

use crate::engine::VnEngine;
use crate::stage::Stage;
use apply::apply_presentation;

pub use state::HistoryState;
pub use timeline::HistoryTimeline;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub capacity: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Which retained state is on screen while live play is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCursor {
    Rewind(usize),
    Log(usize),
}

/// Captures states as lines are shown and lets the player step back
/// through them.
///
/// While a cursor is set the session is viewing the past: captures are
/// ignored until `apply_and_commit` or `return_to_live`. All operations
/// take `&mut self`, so a capture can never interleave with a rewind.
#[derive(Debug, Clone)]
pub struct HistoryEngine {
    timeline: HistoryTimeline,
    cursor: Option<HistoryCursor>,
    live: Option<HistoryState>,
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new(HistoryOptions::default())
    }
}

impl HistoryEngine {
    pub fn new(options: HistoryOptions) -> Self {
        Self::from_timeline(HistoryTimeline::new(options.capacity))
    }

    pub fn from_timeline(timeline: HistoryTimeline) -> Self {
        Self {
            timeline,
            cursor: None,
            live: None,
        }
    }

    pub fn timeline(&self) -> &HistoryTimeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> HistoryTimeline {
        self.timeline
    }

    pub fn cursor(&self) -> Option<HistoryCursor> {
        self.cursor
    }

    pub fn is_viewing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn selected(&self) -> Option<&HistoryState> {
        match self.cursor? {
            HistoryCursor::Rewind(index) | HistoryCursor::Log(index) => self.timeline.get(index),
        }
    }

    /// Records the current line. Skipped while viewing the past and when
    /// nothing changed since the newest state.
    pub fn capture(&mut self, engine: &VnEngine, stage: &dyn Stage) -> bool {
        if self.is_viewing() {
            debug!("viewing history, capture skipped");
            return false;
        }
        let state = HistoryState::capture(engine, stage);
        if self.timeline.latest() == Some(&state) {
            return false;
        }
        if self.timeline.push(state).is_some() {
            debug!(capacity = self.timeline.capacity(), "oldest history state evicted");
        }
        debug!(states = self.timeline.len(), "history state captured");
        true
    }

    /// Shows the state one step older than what is on screen. Returns
    /// false when there is nothing older.
    pub fn rewind_one_step(&mut self, engine: &VnEngine, stage: &mut dyn Stage) -> bool {
        let target = match self.cursor {
            Some(HistoryCursor::Rewind(index)) | Some(HistoryCursor::Log(index)) => {
                if index == 0 {
                    return false;
                }
                index - 1
            }
            None => {
                let Some(latest) = self.timeline.latest() else {
                    return false;
                };
                let newest = self.timeline.len() - 1;
                // After the end the newest state is still what the player sees.
                if engine.ended() || latest.mirrors(engine) {
                    if newest == 0 {
                        return false;
                    }
                    newest - 1
                } else {
                    newest
                }
            }
        };

        if self.cursor.is_none() {
            self.live = Some(HistoryState::capture(engine, stage));
        }
        self.show(HistoryCursor::Rewind(target), stage)
    }

    /// Moves one step toward the present; past the newest state the live
    /// session comes back.
    pub fn step_forward(&mut self, stage: &mut dyn Stage) -> bool {
        let index = match self.cursor {
            Some(HistoryCursor::Rewind(index)) | Some(HistoryCursor::Log(index)) => index,
            None => return false,
        };
        if index + 1 < self.timeline.len() {
            return self.show(HistoryCursor::Rewind(index + 1), stage);
        }
        self.return_to_live(stage)
    }

    /// Jumps straight to a retained state for the backlog view.
    pub fn view_log(&mut self, index: usize, engine: &VnEngine, stage: &mut dyn Stage) -> bool {
        if index >= self.timeline.len() {
            return false;
        }
        if self.cursor.is_none() {
            self.live = Some(HistoryState::capture(engine, stage));
        }
        self.show(HistoryCursor::Log(index), stage)
    }

    /// Leaves the past without changing anything and puts the live
    /// presentation back.
    pub fn return_to_live(&mut self, stage: &mut dyn Stage) -> bool {
        if self.cursor.take().is_none() {
            return false;
        }
        if let Some(live) = self.live.take() {
            apply_presentation(&live, stage);
        }
        true
    }

    /// Makes the selected state the live session: presentation, all
    /// variable banks and the execution point. A rewind drops the newer
    /// states; a log jump drops the older ones including the selected one.
    pub fn apply_and_commit(
        &mut self,
        engine: &mut VnEngine,
        stage: &mut dyn Stage,
    ) -> Result<bool, VnError> {
        let Some(cursor) = self.cursor else {
            return Ok(false);
        };
        let (HistoryCursor::Rewind(index) | HistoryCursor::Log(index)) = cursor;
        let Some(state) = self.timeline.get(index).cloned() else {
            self.cursor = None;
            self.live = None;
            return Ok(false);
        };

        // The point is checked first so a bad state leaves the session untouched.
        if let Some(point) = state.point() {
            engine.restore_point(point)?;
        }
        engine.variables_mut().load_records(state.variables());
        apply_presentation(&state, stage);

        let discarded = match cursor {
            HistoryCursor::Rewind(_) => self.timeline.truncate_after(index),
            HistoryCursor::Log(_) => self.timeline.drain_through(index),
        };
        self.cursor = None;
        self.live = None;
        info!(
            discarded,
            retained = self.timeline.len(),
            "history state committed"
        );
        Ok(true)
    }

    /// Puts the newest state's presentation on a fresh stage when a saved
    /// session is reopened.
    pub fn restore_latest(&self, stage: &mut dyn Stage) -> bool {
        match self.timeline.latest() {
            Some(state) => {
                apply_presentation(state, stage);
                true
            }
            None => false,
        }
    }

    pub fn log_entries(&self) -> Vec<DialogueState> {
        self.timeline
            .iter()
            .map(|state| state.dialogue().clone())
            .collect()
    }

    fn show(&mut self, cursor: HistoryCursor, stage: &mut dyn Stage) -> bool {
        let (HistoryCursor::Rewind(index) | HistoryCursor::Log(index)) = cursor;
        let Some(state) = self.timeline.get(index) else {
            return false;
        };
        apply_presentation(state, stage);
        self.cursor = Some(cursor);
        true
    }
}
