use std::io::{self, BufRead, Write};

use vn_core::{DialogueState, VnError};

use crate::{
    cli_error, run_to_boundary, BoundaryEvent, BoundaryResult, LineCommandAction, PlayerSession,
};

const HELP: &str = "commands: :help :back :forward :resume :log [N] :vars :quit";

pub(crate) fn run_play_line_mode(session: &mut PlayerSession) -> Result<i32, VnError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_line_mode_with_io(session, &mut reader, &mut writer)
}

pub(crate) fn run_play_line_mode_with_io(
    session: &mut PlayerSession,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, VnError> {
    say(writer, "VN script player")?;
    say(writer, HELP)?;

    loop {
        if session.history.is_viewing() {
            render_history(session, writer)?;
            let Some(raw) = prompt_input_from("(history) > ", reader, writer)? else {
                return Ok(0);
            };
            if raw.is_empty() {
                session.history.step_forward(&mut session.stage);
                continue;
            }
            match handle_line_cmd(raw.as_str(), session, writer)? {
                LineCommandAction::Quit => return Ok(0),
                LineCommandAction::NotHandled => {
                    say(writer, "viewing history: Enter steps forward, :resume continues from here")?;
                }
                LineCommandAction::Continue | LineCommandAction::RefreshBoundary => {}
            }
            continue;
        }

        let boundary = run_to_boundary(session)?;
        render_boundary(&boundary, writer)?;

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            match handle_line_cmd(raw.as_str(), session, writer)? {
                LineCommandAction::Continue => continue,
                LineCommandAction::RefreshBoundary => break,
                LineCommandAction::Quit => return Ok(0),
                LineCommandAction::NotHandled => {}
            }

            match boundary.event {
                BoundaryEvent::Dialogue => session.engine.advance()?,
                BoundaryEvent::Choices => {
                    let Some(choice) = offered_choice(&raw, &boundary.choices) else {
                        say(writer, &format!("Invalid choice index: {}", raw.trim()))?;
                        continue;
                    };
                    session.engine.choose(choice)?;
                }
                BoundaryEvent::Input => session.engine.submit_input(&raw)?,
                BoundaryEvent::End => return Ok(0),
            }
            break;
        }
    }
}

/// Handles a `:`-prefixed player command. Anything else is left to the
/// caller as a response to the current boundary.
pub(crate) fn handle_line_cmd(
    raw: &str,
    session: &mut PlayerSession,
    writer: &mut dyn Write,
) -> Result<LineCommandAction, VnError> {
    let mut parts = raw.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(LineCommandAction::NotHandled);
    };

    match command {
        ":help" => {
            say(writer, HELP)?;
            Ok(LineCommandAction::Continue)
        }
        ":back" => {
            if session
                .history
                .rewind_one_step(&session.engine, &mut session.stage)
            {
                Ok(LineCommandAction::RefreshBoundary)
            } else {
                say(writer, "no earlier line")?;
                Ok(LineCommandAction::Continue)
            }
        }
        ":forward" => {
            if session.history.step_forward(&mut session.stage) {
                Ok(LineCommandAction::RefreshBoundary)
            } else {
                say(writer, "already at the latest line")?;
                Ok(LineCommandAction::Continue)
            }
        }
        ":resume" => {
            if session
                .history
                .apply_and_commit(&mut session.engine, &mut session.stage)?
            {
                say(writer, "resumed from history")?;
                Ok(LineCommandAction::RefreshBoundary)
            } else {
                say(writer, "not viewing history")?;
                Ok(LineCommandAction::Continue)
            }
        }
        ":log" => match parts.next() {
            None => {
                for (index, dialogue) in session.history.log_entries().iter().enumerate() {
                    say(writer, &format!("[{}] {}", index, dialogue_line(dialogue)))?;
                }
                Ok(LineCommandAction::Continue)
            }
            Some(raw_index) => {
                let index = raw_index.parse::<usize>().map_err(|_| {
                    VnError::new("CLI_LOG_INDEX", format!("Invalid log index: {}", raw_index))
                })?;
                if session
                    .history
                    .view_log(index, &session.engine, &mut session.stage)
                {
                    Ok(LineCommandAction::RefreshBoundary)
                } else {
                    say(writer, &format!("no log entry {}", index))?;
                    Ok(LineCommandAction::Continue)
                }
            }
        },
        ":vars" => {
            for record in session.engine.variables().records() {
                say(
                    writer,
                    &format!(
                        "{}.{} ({}) = {}",
                        record.bank, record.name, record.data_type, record.value
                    ),
                )?;
            }
            Ok(LineCommandAction::Continue)
        }
        ":quit" => {
            say(writer, "bye")?;
            Ok(LineCommandAction::Quit)
        }
        _ => Ok(LineCommandAction::NotHandled),
    }
}

fn render_boundary(boundary: &BoundaryResult, writer: &mut dyn Write) -> Result<(), VnError> {
    say(writer, "")?;
    for command in &boundary.commands {
        say(writer, &format!("  [{}]", command))?;
    }
    match boundary.event {
        BoundaryEvent::Dialogue => {
            if let Some(dialogue) = &boundary.dialogue {
                say(writer, &dialogue_line(dialogue))?;
            }
        }
        BoundaryEvent::Choices => {
            if let Some(title) = &boundary.title {
                say(writer, title)?;
            }
            for (index, text) in &boundary.choices {
                say(writer, &format!("  [{}] {}", index, text))?;
            }
        }
        BoundaryEvent::Input => {
            if let Some(title) = &boundary.title {
                say(writer, title)?;
            }
        }
        BoundaryEvent::End => say(writer, "[END]")?,
    }
    Ok(())
}

fn render_history(session: &PlayerSession, writer: &mut dyn Write) -> Result<(), VnError> {
    let Some(state) = session.history.selected() else {
        return Ok(());
    };
    let position = match session.history.cursor() {
        Some(vn_runtime::HistoryCursor::Rewind(index))
        | Some(vn_runtime::HistoryCursor::Log(index)) => index + 1,
        None => 0,
    };
    say(writer, "")?;
    say(
        writer,
        &format!(
            "[history {}/{}] {}",
            position,
            session.history.timeline().len(),
            dialogue_line(state.dialogue())
        ),
    )
}

fn offered_choice(raw: &str, choices: &[(usize, String)]) -> Option<usize> {
    let choice = raw.trim().parse::<usize>().ok()?;
    choices
        .iter()
        .any(|(index, _)| *index == choice)
        .then_some(choice)
}

fn dialogue_line(dialogue: &DialogueState) -> String {
    if dialogue.speaker.is_empty() {
        dialogue.text.clone()
    } else {
        format!("{}: {}", dialogue.speaker, dialogue.text)
    }
}

fn say(writer: &mut dyn Write, line: &str) -> Result<(), VnError> {
    writeln!(writer, "{}", line).map_err(cli_error("CLI_IO"))
}

/// Reads one line. `None` means the input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, VnError> {
    write!(writer, "{}", prefix).map_err(cli_error("CLI_IO"))?;
    writer.flush().map_err(cli_error("CLI_IO"))?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(cli_error("CLI_IO"))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
