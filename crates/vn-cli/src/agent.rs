use std::path::Path;

use tracing::warn;
use vn_api::DEFAULT_ENTRY_SECTION;
use vn_core::VnError;

use crate::{
    create_session_for_scenario, emit_boundary_with_saved_state, load_session_from_state_for_ref,
    load_source_by_scripts_dir, run_to_boundary, AgentArgs, AgentCommand, ChooseArgs, InputArgs,
    PlayerSession, StartArgs, StateArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, VnError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Advance(args) => run_advance(args),
        AgentCommand::Choose(args) => run_choose(args),
        AgentCommand::Input(args) => run_input(args),
        AgentCommand::Back(args) => run_back(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, VnError> {
    let scenario = load_source_by_scripts_dir(
        &args.scripts_dir,
        args.entry_section.as_deref().unwrap_or(DEFAULT_ENTRY_SECTION),
    )?;
    let mut session = create_session_for_scenario(
        &scenario,
        &scenario.entry_section,
        args.history_capacity,
    )?;

    let boundary = run_to_boundary(&mut session)?;
    emit_boundary_with_saved_state(
        &session,
        boundary,
        &args.state_out,
        &scenario.id,
        &scenario.entry_section,
    )
}

pub(super) fn run_advance(args: StateArgs) -> Result<i32, VnError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        session.engine.advance()
    })
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, VnError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        session.engine.choose(args.choice)
    })
}

pub(super) fn run_input(args: InputArgs) -> Result<i32, VnError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        session.engine.submit_input(&args.text)
    })
}

pub(super) fn run_back(args: StateArgs) -> Result<i32, VnError> {
    run_state_transition(&args.state_in, &args.state_out, |session| {
        if !session.back()? {
            warn!("no earlier line to go back to");
        }
        Ok(())
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut PlayerSession) -> Result<(), VnError>,
) -> Result<i32, VnError> {
    let (_scenario, state, mut session) = load_session_from_state_for_ref(Path::new(state_in))?;
    transition(&mut session)?;
    let boundary = run_to_boundary(&mut session)?;
    emit_boundary_with_saved_state(
        &session,
        boundary,
        state_out,
        &state.scenario_id,
        &state.entry_section,
    )
}
