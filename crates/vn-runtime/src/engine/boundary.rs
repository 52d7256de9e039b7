use tracing::{debug, warn};
use vn_core::{EngineOutput, VarValue, VnError};

use super::lifecycle::{PendingBoundary, VnEngine, INPUT_VARIABLE};

impl PendingBoundary {
    pub(super) fn output(&self) -> EngineOutput {
        match self {
            Self::Advance {
                speaker,
                text,
                commands,
            } => EngineOutput::Dialogue {
                speaker: speaker.clone(),
                text: text.clone(),
                commands: commands.clone(),
            },
            Self::Transition { commands } => EngineOutput::Commands {
                commands: commands.clone(),
            },
            Self::Choice { title, items } => EngineOutput::Choices {
                title: title.clone(),
                items: items.clone(),
            },
            Self::Input { title } => EngineOutput::Input {
                title: title.clone(),
            },
        }
    }
}

impl VnEngine {
    /// Continues past a dialogue line or a finished command transition.
    pub fn advance(&mut self) -> Result<(), VnError> {
        if !matches!(
            self.pending,
            Some(PendingBoundary::Advance { .. } | PendingBoundary::Transition { .. })
        ) {
            return Err(VnError::new(
                "ENGINE_NO_PENDING_ADVANCE",
                "No dialogue or transition is waiting to advance.",
            ));
        }
        let next = self.current_node()?.next_id;
        self.finish_pending();
        self.complete_and_move(next);
        Ok(())
    }

    /// Asks the waiting dialogue to finish presenting quickly. Returns
    /// whether a dialogue was waiting.
    pub fn speed_up(&mut self) -> bool {
        if matches!(self.pending, Some(PendingBoundary::Advance { .. })) {
            self.hurried = true;
            return true;
        }
        false
    }

    pub fn choose(&mut self, index: usize) -> Result<(), VnError> {
        let Some(PendingBoundary::Choice { items, .. }) = &self.pending else {
            return Err(VnError::new(
                "ENGINE_NO_PENDING_CHOICE",
                "No pending choice is available.",
            ));
        };
        let Some(item) = items.get(index) else {
            return Err(VnError::new(
                "ENGINE_CHOICE_INDEX",
                format!("Choice index \"{}\" is out of range.", index),
            ));
        };

        debug!(index, option = %item.text, "choice selected");
        let target = self.branch_entry(item.node_id)?;
        self.finish_pending();
        self.complete_and_move(target);
        Ok(())
    }

    /// Stores the text in `Default.input` and the `<input>` tag.
    pub fn submit_input(&mut self, text: &str) -> Result<(), VnError> {
        if !matches!(self.pending, Some(PendingBoundary::Input { .. })) {
            return Err(VnError::new(
                "ENGINE_NO_PENDING_INPUT",
                "No pending input is available.",
            ));
        }

        if let Err(error) = self
            .variables
            .set(INPUT_VARIABLE, VarValue::String(text.to_string()))
        {
            warn!(code = %error.code, "{}", error.message);
        }
        *self.last_input.borrow_mut() = text.to_string();

        let next = self.current_node()?.next_id;
        self.finish_pending();
        self.complete_and_move(next);
        Ok(())
    }

    /// Abandons a pending choice or input and continues after the node
    /// without storing anything. Other suspensions are left alone.
    pub fn cancel(&mut self) -> Result<bool, VnError> {
        if !matches!(
            self.pending,
            Some(PendingBoundary::Choice { .. } | PendingBoundary::Input { .. })
        ) {
            return Ok(false);
        }
        let next = self.current_node()?.next_id;
        debug!("pending suspension cancelled");
        self.finish_pending();
        self.complete_and_move(next);
        Ok(true)
    }

    fn finish_pending(&mut self) {
        self.pending = None;
        self.hurried = false;
    }
}
