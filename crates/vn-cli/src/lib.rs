use std::ffi::OsString;

use clap::Parser;
use tracing::info;
use vn_api::DEFAULT_ENTRY_SECTION;
use vn_core::VnError;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_player;
mod models;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{emit_boundary, run_to_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, ChooseArgs, Cli, InputArgs, Mode, PlayArgs, StartArgs, StateArgs,
};
pub(crate) use error_map::{cli_error, emit_error};
pub(crate) use line_player::run_play_line_mode;
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, LineCommandAction, LoadedScenario, PlayerSession,
    PlayerStateV1, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_session_for_scenario, emit_boundary_with_saved_state, load_session_from_state_for_ref,
};
pub(crate) use source_loader::{load_source_by_ref, load_source_by_scripts_dir};
pub(crate) use state_store::{load_player_state, save_player_state};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, VnError> {
    match cli.command {
        Mode::Agent(args) => run_agent(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_agent(args: AgentArgs) -> Result<i32, VnError> {
    agent::run_agent(args)
}

fn run_play(args: PlayArgs) -> Result<i32, VnError> {
    let entry_section = args
        .entry_section
        .unwrap_or_else(|| DEFAULT_ENTRY_SECTION.to_string());
    let scenario = load_source_by_scripts_dir(&args.scripts_dir, &entry_section)?;
    info!(scenario = %scenario.title, entry = %entry_section, "starting play mode");
    let mut session =
        create_session_for_scenario(&scenario, &entry_section, args.history_capacity)?;

    run_play_line_mode(&mut session)
}

#[cfg(test)]
pub(crate) mod cli_test_support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("vnscript-rs-{}-{}", name, nanos))
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    pub(crate) fn demo_scripts_dir(demo: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("demos")
            .join("scripts")
            .join(demo)
            .to_string_lossy()
            .to_string()
    }
}
