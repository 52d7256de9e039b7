use std::path::Path;

use vn_api::{create_engine_from_sources, CreateEngineFromSourcesOptions};
use vn_core::EngineOutput;
use vn_runtime::VnEngine;

use crate::source::{load_project, read_test_case};
use crate::{ExpectedEvent, TestAction, TestCase, VnToolError};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
}

struct ActionQueue<'a> {
    actions: &'a [TestAction],
    consumed: usize,
}

impl<'a> ActionQueue<'a> {
    fn take(
        &mut self,
        event_index: usize,
        expected_action_kind: &str,
    ) -> Result<&'a TestAction, VnToolError> {
        let action = self
            .actions
            .get(self.consumed)
            .ok_or_else(|| VnToolError::MissingAction {
                event_index,
                expected_action_kind: expected_action_kind.to_string(),
            })?;
        self.consumed += 1;
        Ok(action)
    }
}

fn kind_mismatch(event_index: usize, expected: &str, action: &TestAction) -> VnToolError {
    VnToolError::ActionKindMismatch {
        event_index,
        expected_action_kind: expected.to_string(),
        actual_action_kind: action.kind_name().to_string(),
    }
}

fn advance(
    engine: &mut VnEngine,
    case: &TestCase,
    queue: &mut ActionQueue<'_>,
    event_index: usize,
) -> Result<(), VnToolError> {
    if !case.auto_advance {
        let action = queue.take(event_index, "advance")?;
        if !matches!(action, TestAction::Advance) {
            return Err(kind_mismatch(event_index, "advance", action));
        }
    }
    engine.advance()?;
    Ok(())
}

pub fn run_case(example_dir: &Path, case: &TestCase) -> Result<RunReport, VnToolError> {
    let sources = load_project(example_dir)?;
    let mut engine = create_engine_from_sources(CreateEngineFromSourcesOptions {
        sources,
        entry_section: Some(case.entry_section.clone()),
        ..CreateEngineFromSourcesOptions::default()
    })?;

    let mut observed_events = Vec::new();
    let mut queue = ActionQueue {
        actions: &case.actions,
        consumed: 0,
    };

    for step in 1..=MAX_STEPS {
        match engine.next_output()? {
            EngineOutput::Dialogue {
                speaker,
                text,
                commands,
            } => {
                observed_events.push(ExpectedEvent::Dialogue {
                    speaker,
                    text,
                    commands: commands.iter().map(ToString::to_string).collect(),
                });
                advance(&mut engine, case, &mut queue, observed_events.len() - 1)?;
            }
            EngineOutput::Commands { commands } => {
                observed_events.push(ExpectedEvent::Commands {
                    commands: commands.iter().map(ToString::to_string).collect(),
                });
                advance(&mut engine, case, &mut queue, observed_events.len() - 1)?;
            }
            EngineOutput::Choices { title, items } => {
                let choices = items.into_iter().map(|item| item.text).collect();
                observed_events.push(ExpectedEvent::Choices { title, choices });
                let event_index = observed_events.len() - 1;
                match queue.take(event_index, "choose")? {
                    TestAction::Choose { index } => engine.choose(*index)?,
                    TestAction::Cancel => {
                        engine.cancel()?;
                    }
                    action => return Err(kind_mismatch(event_index, "choose", action)),
                }
            }
            EngineOutput::Input { title } => {
                observed_events.push(ExpectedEvent::Input { title });
                let event_index = observed_events.len() - 1;
                match queue.take(event_index, "input")? {
                    TestAction::Input { text } => engine.submit_input(text)?,
                    TestAction::Cancel => {
                        engine.cancel()?;
                    }
                    action => return Err(kind_mismatch(event_index, "input", action)),
                }
            }
            EngineOutput::End => {
                observed_events.push(ExpectedEvent::End);
                if queue.consumed != case.actions.len() {
                    return Err(VnToolError::UnusedActions {
                        used: queue.consumed,
                        total: case.actions.len(),
                    });
                }
                return Ok(RunReport {
                    observed_events,
                    consumed_actions: queue.consumed,
                    steps: step,
                });
            }
        }
    }

    Err(VnToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

pub fn assert_case(example_dir: &Path, case_path: &Path) -> Result<(), VnToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(example_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(VnToolError::EventSerialize)?;
        return Err(VnToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(VnToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(VnToolError::EventSerialize)?;
            return Err(VnToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
