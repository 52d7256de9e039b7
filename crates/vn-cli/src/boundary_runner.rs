use tracing::warn;
use vn_core::{CommandToken, EngineOutput, VnError};
use vn_runtime::{MemoryStage, Stage};

use crate::{BoundaryEvent, BoundaryResult, PlayerSession};

const MAX_TRANSITIONS: usize = 10_000;

fn perform(stage: &mut MemoryStage, commands: &[CommandToken]) {
    for name in stage.apply_commands(commands) {
        warn!(command = %name, "stage ignored unknown command");
    }
}

/// Runs until the session waits on the player. Command lines are performed
/// and advanced on the spot; a dialogue line is shown and captured.
pub(crate) fn run_to_boundary(session: &mut PlayerSession) -> Result<BoundaryResult, VnError> {
    let mut performed = Vec::new();

    for _ in 0..MAX_TRANSITIONS {
        match session.engine.next_output()? {
            EngineOutput::Dialogue { commands, .. } => {
                perform(&mut session.stage, &commands);
                performed.extend(commands);
                session.stage.show_dialogue(session.engine.last_dialogue());
                session.history.capture(&session.engine, &session.stage);

                let mut boundary = BoundaryResult::new(BoundaryEvent::Dialogue, performed);
                boundary.dialogue = Some(session.engine.last_dialogue().clone());
                return Ok(boundary);
            }
            EngineOutput::Commands { commands } => {
                perform(&mut session.stage, &commands);
                performed.extend(commands);
                session.engine.advance()?;
            }
            EngineOutput::Choices { title, items } => {
                let mut boundary = BoundaryResult::new(BoundaryEvent::Choices, performed);
                boundary.title = Some(title);
                boundary.choices = items
                    .into_iter()
                    .map(|item| (item.index, item.text))
                    .collect();
                return Ok(boundary);
            }
            EngineOutput::Input { title } => {
                let mut boundary = BoundaryResult::new(BoundaryEvent::Input, performed);
                boundary.title = Some(title);
                return Ok(boundary);
            }
            EngineOutput::End => return Ok(BoundaryResult::new(BoundaryEvent::End, performed)),
        }
    }

    Err(VnError::new(
        "CLI_GUARD_EXCEEDED",
        format!(
            "More than {} command lines ran without a dialogue line.",
            MAX_TRANSITIONS
        ),
    ))
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Dialogue => println!("EVENT:DIALOGUE"),
        BoundaryEvent::Choices => println!("EVENT:CHOICES"),
        BoundaryEvent::Input => println!("EVENT:INPUT"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    for command in boundary.commands {
        println!(
            "COMMAND:{}",
            serde_json::to_string(&command).expect("command json")
        );
    }

    if let Some(dialogue) = boundary.dialogue {
        println!(
            "DIALOGUE_JSON:{}",
            serde_json::to_string(&dialogue).expect("dialogue json")
        );
    }

    if let Some(title) = boundary.title {
        println!(
            "TITLE_JSON:{}",
            serde_json::to_string(&title).expect("string json")
        );
    }

    for (index, text) in boundary.choices {
        println!(
            "CHOICE:{}|{}",
            index,
            serde_json::to_string(&text).expect("string json")
        );
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}
