use std::sync::OnceLock;

use regex::Regex;
use vn_core::{CommandArg, CommandToken};

use crate::line::{command_token_regex, unquote};

fn command_body_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\[\s*([A-Za-z_][\w.\-]*)(.*)\]$").expect("command body regex must compile")
    })
}

fn command_arg_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?:([A-Za-z_][\w\-]*)=)?("(?:\\.|[^"\\])*"|\S+)"#)
            .expect("command arg regex must compile")
    })
}

/// Splits command text such as `[music theme volume=0.5] [bg park]` into
/// tokens. Text between tokens is ignored.
pub fn parse_commands(command_text: &str) -> Vec<CommandToken> {
    command_token_regex()
        .find_iter(command_text)
        .filter_map(|found| {
            let captures = command_body_regex().captures(found.as_str().trim())?;
            let args = command_arg_regex()
                .captures_iter(&captures[2])
                .map(|arg| CommandArg {
                    key: arg.get(1).map(|key| key.as_str().to_string()),
                    value: unquote(&arg[2]),
                })
                .collect();
            Some(CommandToken {
                name: captures[1].to_string(),
                args,
            })
        })
        .collect()
}
