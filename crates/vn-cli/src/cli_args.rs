use clap::{Args, Parser, Subcommand};
use vn_runtime::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Parser)]
#[command(name = "vnscript-player")]
#[command(about = "Visual novel script player")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Advance(StateArgs),
    Choose(ChooseArgs),
    Input(InputArgs),
    Back(StateArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-section")]
    pub(crate) entry_section: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
    #[arg(long = "history-capacity", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub(crate) history_capacity: usize,
}

#[derive(Debug, Args)]
pub(crate) struct StateArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct InputArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-section")]
    pub(crate) entry_section: Option<String>,
    #[arg(long = "history-capacity", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub(crate) history_capacity: usize,
}

#[cfg(test)]
mod cli_args_tests {
    use super::*;

    #[test]
    fn agent_start_defaults_history_capacity() {
        let cli = Cli::try_parse_from([
            "vnscript-player",
            "agent",
            "start",
            "--scripts-dir",
            "demos",
            "--state-out",
            "state.json",
        ])
        .expect("args should parse");
        let Mode::Agent(AgentArgs {
            command: AgentCommand::Start(args),
        }) = cli.command
        else {
            panic!("agent start expected");
        };
        assert_eq!(args.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(args.entry_section, None);
    }

    #[test]
    fn agent_back_takes_state_paths() {
        let cli = Cli::try_parse_from([
            "vnscript-player",
            "agent",
            "back",
            "--state-in",
            "a.json",
            "--state-out",
            "b.json",
        ])
        .expect("args should parse");
        assert!(matches!(
            cli.command,
            Mode::Agent(AgentArgs {
                command: AgentCommand::Back(_)
            })
        ));
    }

    #[test]
    fn choose_requires_choice_index() {
        let error = Cli::try_parse_from([
            "vnscript-player",
            "agent",
            "choose",
            "--state-in",
            "a.json",
            "--state-out",
            "b.json",
        ])
        .expect_err("missing --choice should fail");
        assert_eq!(
            error.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }
}
