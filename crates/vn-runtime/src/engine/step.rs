use tracing::warn;
use vn_core::{ChoiceItem, CommandToken, DialogueState, EngineOutput, NodeId, VnError};

use super::lifecycle::{PendingBoundary, VnEngine};
use super::node::ParsedNode;

const GUARD_LIMIT: usize = 10_000;

pub(super) enum NodeStep {
    Next(Option<NodeId>),
    Jump(String),
    Suspend(PendingBoundary),
}

impl VnEngine {
    /// Runs nodes until one suspends or the run ends. While a suspension
    /// is unanswered the same output is returned again.
    pub fn next_output(&mut self) -> Result<EngineOutput, VnError> {
        if let Some(boundary) = &self.pending {
            return Ok(boundary.output());
        }
        if self.ended {
            return Ok(EngineOutput::End);
        }
        if !self.started {
            return Err(VnError::new(
                "ENGINE_NOT_STARTED",
                "start() must be called before next_output().",
            ));
        }

        let mut guard = 0usize;
        while guard < GUARD_LIMIT {
            guard += 1;

            if self.cursor.is_none() {
                self.ended = true;
                return Ok(EngineOutput::End);
            }
            self.start_execution()?;

            match self.execute_active()? {
                NodeStep::Next(next) => self.complete_and_move(next),
                NodeStep::Jump(target) => {
                    self.complete_and_move(None);
                    self.jump_to_section(&target)?;
                }
                NodeStep::Suspend(boundary) => {
                    let output = boundary.output();
                    self.pending = Some(boundary);
                    return Ok(output);
                }
            }
        }

        Err(VnError::new(
            "ENGINE_GUARD_EXCEEDED",
            format!(
                "Execution guard exceeded {} nodes without a suspension.",
                GUARD_LIMIT
            ),
        ))
    }

    fn execute_active(&mut self) -> Result<NodeStep, VnError> {
        let next = self.current_node()?.next_id;
        let active = self
            .cursor
            .as_ref()
            .and_then(|cursor| cursor.active.clone())
            .ok_or_else(|| VnError::new("ENGINE_NOT_STARTED", "No node is being executed."))?;

        match active {
            ParsedNode::Dialogue {
                speaker,
                text,
                commands,
            } => Ok(self.execute_dialogue(&speaker, &text, commands, next)),
            ParsedNode::Condition { branches } => {
                Ok(NodeStep::Next(self.select_condition_branch(&branches, next)?))
            }
            ParsedNode::Choice { title, options } => {
                if options.is_empty() {
                    return Ok(NodeStep::Next(next));
                }
                let items = options
                    .iter()
                    .enumerate()
                    .map(|(index, (node_id, text))| ChoiceItem {
                        index,
                        node_id: *node_id,
                        text: self.render_text(text),
                    })
                    .collect();
                Ok(NodeStep::Suspend(PendingBoundary::Choice {
                    title: self.render_text(&title),
                    items,
                }))
            }
            ParsedNode::Input { title } => Ok(NodeStep::Suspend(PendingBoundary::Input {
                title: self.render_text(&title),
            })),
            ParsedNode::Jump { target } => {
                if target.is_empty() {
                    warn!("jump without a target section, skipping");
                    return Ok(NodeStep::Next(next));
                }
                Ok(NodeStep::Jump(target))
            }
            ParsedNode::Assignment(parts) => {
                self.execute_assignment(parts.as_ref());
                Ok(NodeStep::Next(next))
            }
            ParsedNode::Branch => Ok(NodeStep::Next(next)),
        }
    }

    fn execute_dialogue(
        &mut self,
        speaker: &str,
        text: &str,
        commands: Vec<CommandToken>,
        next: Option<NodeId>,
    ) -> NodeStep {
        let speaker = self.render_text(speaker);
        let text = self.render_text(text);

        if speaker.is_empty() && text.is_empty() {
            if commands.is_empty() {
                return NodeStep::Next(next);
            }
            return NodeStep::Suspend(PendingBoundary::Transition { commands });
        }

        self.last_dialogue = DialogueState {
            speaker: speaker.clone(),
            text: text.clone(),
        };
        NodeStep::Suspend(PendingBoundary::Advance {
            speaker: (!speaker.is_empty()).then_some(speaker),
            text,
            commands,
        })
    }
}

#[cfg(test)]
mod step_tests {
    use super::*;
    use crate::engine::runtime_test_support::*;
    use crate::engine::Suspension;
    use vn_core::VarValue;

    #[test]
    fn dialogue_then_end() {
        let mut engine = started_engine("Alice \"Hello\" [music theme]\n");
        let EngineOutput::Dialogue {
            speaker,
            text,
            commands,
        } = engine.next_output().expect("next")
        else {
            panic!("dialogue expected");
        };
        assert_eq!(speaker.as_deref(), Some("Alice"));
        assert_eq!(text, "Hello");
        assert_eq!(commands[0].name, "music");

        engine.advance().expect("advance");
        assert_eq!(engine.next_output().expect("next"), EngineOutput::End);
        assert!(engine.ended());
    }

    #[test]
    fn pending_output_is_reissued() {
        let mut engine = started_engine("Narrator \"Once\"\n");
        let first = engine.next_output().expect("first");
        let second = engine.next_output().expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn narration_has_no_speaker() {
        let mut engine = started_engine("The wind howls.\n");
        let EngineOutput::Dialogue { speaker, text, .. } = engine.next_output().expect("next")
        else {
            panic!("dialogue expected");
        };
        assert_eq!(speaker, None);
        assert_eq!(text, "The wind howls.");
    }

    #[test]
    fn command_only_line_is_a_transition() {
        let mut engine = started_engine("[bg castle] [music night]\nNarrator \"Inside\"\n");
        let EngineOutput::Commands { commands } = engine.next_output().expect("next") else {
            panic!("commands expected");
        };
        assert_eq!(commands.len(), 2);
        assert_eq!(engine.suspension(), Some(Suspension::Transition));
        engine.advance().expect("transition done");
        assert!(matches!(
            engine.next_output().expect("next"),
            EngineOutput::Dialogue { .. }
        ));
    }

    #[test]
    fn interpolates_variables_and_tags() {
        let mut engine = started_engine(
            "$Default.name = \"Sam\"\nAlice \"Hi {$Default.name}! You are in {<section>}.\"\n",
        );
        let EngineOutput::Dialogue { text, .. } = engine.next_output().expect("next") else {
            panic!("dialogue expected");
        };
        assert_eq!(text, "Hi Sam! You are in main.");
        assert_eq!(
            engine.last_dialogue(),
            &DialogueState {
                speaker: "Alice".to_string(),
                text: "Hi Sam! You are in main.".to_string(),
            }
        );
    }

    #[test]
    fn unresolved_reference_prints_bare_name() {
        let mut engine = started_engine("Alice \"Hi {$Default.name}!\"\n");
        let EngineOutput::Dialogue { text, .. } = engine.next_output().expect("next") else {
            panic!("dialogue expected");
        };
        assert_eq!(text, "Hi name!");
    }

    #[test]
    fn jump_moves_to_other_section() {
        let mut engine = started_engine(
            "Narrator \"Start\"\njump Ending\nNarrator \"Skipped\"\n=== Ending ===\nNarrator \"Bye\"\n",
        );
        let texts = drive_engine_to_end(&mut engine);
        assert_eq!(texts, vec!["Start".to_string(), "Bye".to_string()]);
    }

    #[test]
    fn jump_to_missing_section_stops_without_partial_execution() {
        let mut engine = started_engine("$Default.x = 1\njump Nowhere\n$Default.x = 2\n");
        let error = engine.next_output().expect_err("missing section");
        assert_eq!(error.code, "ENGINE_SECTION_NOT_FOUND");
        assert!(engine.ended());
        assert_eq!(engine.variables().get("x"), Some(VarValue::Int(1)));
        assert_eq!(engine.next_output().expect("after"), EngineOutput::End);
    }

    #[test]
    fn endless_jump_loop_hits_guard() {
        let mut engine = started_engine("jump main\n");
        let error = engine.next_output().expect_err("guard");
        assert_eq!(error.code, "ENGINE_GUARD_EXCEEDED");
    }

    #[test]
    fn empty_jump_target_is_skipped() {
        let mut engine = started_engine("jump\nNarrator \"After\"\n");
        assert_eq!(drive_engine_to_end(&mut engine), vec!["After".to_string()]);
    }
}
