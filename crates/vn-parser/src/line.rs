use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use vn_core::{ControlSegment, Line, LineContent};

use crate::keywords::KeywordTable;

pub(crate) fn command_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"\[\s*[A-Za-z_][\w.\-]*(?:\s+(?:"(?:\\.|[^"\\])*"|[^\[\]"])*)?\s*\]"#)
            .expect("command token regex must compile")
    })
}

/// Parses one raw script line.
///
/// Never fails: lines that do not fit the speaker/dialogue/command shape
/// become plain dialogue text.
pub fn parse_line(
    file_path: &str,
    line_number: usize,
    raw: &str,
    keywords: &KeywordTable,
) -> Line {
    let trimmed = raw.trim();
    let content = match parse_control(trimmed, keywords) {
        Some(segment) => LineContent::Control(segment),
        None => parse_dialogue(trimmed).unwrap_or_else(|| {
            debug!(
                file = file_path,
                line = line_number,
                "malformed dialogue line, treating it as narration"
            );
            LineContent::Dialogue {
                speaker: String::new(),
                dialogue_text: unescape_quotes(trimmed),
                command_text: String::new(),
            }
        }),
    };

    Line {
        file_path: file_path.to_string(),
        line_number,
        content,
    }
}

fn parse_control(trimmed: &str, keywords: &KeywordTable) -> Option<ControlSegment> {
    let first_char = trimmed.chars().next()?;
    if let Some(parser) = keywords.sigil(first_char) {
        let (kind, data) = parser(trimmed);
        return Some(ControlSegment {
            keyword: first_char.to_string(),
            kind,
            data,
        });
    }

    let token = trimmed.split_whitespace().next()?;
    let parser = keywords.keyword(token)?;
    let (kind, data) = parser(&trimmed[token.len()..]);
    Some(ControlSegment {
        keyword: token.to_ascii_lowercase(),
        kind,
        data,
    })
}

fn parse_dialogue(line: &str) -> Option<LineContent> {
    let quotes = unescaped_quote_positions(line);
    let first_command = command_token_regex().find(line).map(|found| found.start());

    let Some(&open) = quotes.first() else {
        return Some(match first_command {
            None => LineContent::Dialogue {
                speaker: String::new(),
                dialogue_text: unescape_quotes(line),
                command_text: String::new(),
            },
            Some(start) => LineContent::Dialogue {
                speaker: String::new(),
                dialogue_text: unescape_quotes(line[..start].trim()),
                command_text: line[start..].trim().to_string(),
            },
        });
    };

    if first_command.is_some_and(|start| start < open) {
        return None;
    }
    let close = *quotes.get(1)?;

    let command_text = command_token_regex()
        .find_at(line, close + 1)
        .map(|found| line[found.start()..].trim().to_string())
        .unwrap_or_default();

    Some(LineContent::Dialogue {
        speaker: line[..open].trim().to_string(),
        dialogue_text: unescape_quotes(&line[open + 1..close]),
        command_text,
    })
}

fn unescaped_quote_positions(line: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut backslashes = 0usize;
    for (index, ch) in line.char_indices() {
        if ch == '\\' {
            backslashes += 1;
            continue;
        }
        if ch == '"' && backslashes % 2 == 0 {
            positions.push(index);
        }
        backslashes = 0;
    }
    positions
}

pub fn unescape_quotes(text: &str) -> String {
    text.replace("\\\"", "\"")
}

/// Strips one pair of surrounding double quotes, unescaping the inside.
pub fn unquote(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return unescape_quotes(&trimmed[1..trimmed.len() - 1]);
    }
    trimmed.to_string()
}

#[cfg(test)]
mod line_tests {
    use super::*;
    use proptest::prelude::*;
    use vn_core::ControlKind;

    fn parse(raw: &str) -> LineContent {
        parse_line("main.vns", 1, raw, &KeywordTable::standard()).content
    }

    fn dialogue(speaker: &str, text: &str, commands: &str) -> LineContent {
        LineContent::Dialogue {
            speaker: speaker.to_string(),
            dialogue_text: text.to_string(),
            command_text: commands.to_string(),
        }
    }

    #[test]
    fn splits_speaker_dialogue_and_commands() {
        assert_eq!(
            parse(r#"  Alice "Hi there" [music theme volume=0.5] [bg park]  "#),
            dialogue("Alice", "Hi there", "[music theme volume=0.5] [bg park]")
        );
    }

    #[test]
    fn unescapes_quotes_inside_dialogue() {
        assert_eq!(
            parse(r#"Bob "He said \"no\"." "#),
            dialogue("Bob", r#"He said "no"."#, "")
        );
    }

    #[test]
    fn plain_line_becomes_narration() {
        assert_eq!(
            parse(r#"It was a \"dark\" night."#),
            dialogue("", r#"It was a "dark" night."#, "")
        );
    }

    #[test]
    fn command_only_line_has_no_dialogue() {
        assert_eq!(parse("[bg castle] [music night]"), dialogue("", "", "[bg castle] [music night]"));
    }

    #[test]
    fn command_before_quote_falls_back_to_raw_line() {
        assert_eq!(
            parse(r#"[wait] Alice "Hi""#),
            dialogue("", r#"[wait] Alice "Hi""#, "")
        );
    }

    #[test]
    fn unterminated_quote_falls_back_to_raw_line() {
        assert_eq!(parse(r#"Alice "Hi"#), dialogue("", r#"Alice "Hi"#, ""));
    }

    #[test]
    fn brackets_inside_dialogue_are_not_commands() {
        assert_eq!(
            parse(r#"Alice "see [note] here" [sfx ding]"#),
            dialogue("Alice", "see [note] here", "[sfx ding]")
        );
    }

    #[test]
    fn keyword_lines_become_control_segments() {
        let LineContent::Control(segment) = parse("CHOICE \"Where?\"") else {
            panic!("expected control segment");
        };
        assert_eq!(segment.kind, ControlKind::Choice);
        assert_eq!(segment.keyword, "choice");
        assert_eq!(segment.data, vec!["Where?".to_string()]);

        let LineContent::Control(segment) = parse("$score = 10") else {
            panic!("expected assignment");
        };
        assert_eq!(segment.kind, ControlKind::Assignment);
        assert_eq!(segment.keyword, "$");
        assert_eq!(segment.data.len(), 3);
    }

    #[test]
    fn unknown_keyword_is_dialogue() {
        assert_eq!(parse("Walk away."), dialogue("", "Walk away.", ""));
    }

    #[test]
    fn unquote_handles_quoted_and_bare_text() {
        assert_eq!(unquote("\"A \\\"b\\\"\""), "A \"b\"");
        assert_eq!(unquote("  bare "), "bare");
        assert_eq!(unquote("\""), "\"");
    }

    proptest! {
        #[test]
        fn well_formed_lines_round_trip(
            speaker in "[A-Z][a-z]{0,8}( [A-Z][a-z]{0,8})?",
            text in "[A-Za-z0-9 ,.!?']{0,30}",
            commands in proptest::collection::vec("[a-z]{1,8}( [a-z0-9]{1,6}=[a-z0-9]{1,6})?", 0..3),
        ) {
            let command_text = commands
                .iter()
                .map(|command| format!("[{}]", command))
                .collect::<Vec<_>>()
                .join(" ");
            let first_token = speaker.split_whitespace().next().unwrap_or_default();
            prop_assume!(KeywordTable::standard().keyword(first_token).is_none());
            let raw = format!("{} \"{}\" {}", speaker, text, command_text);
            let LineContent::Dialogue { speaker: parsed_speaker, dialogue_text, command_text: parsed_commands } = parse(&raw) else {
                panic!("dialogue expected");
            };
            prop_assert_eq!(parsed_speaker, speaker);
            prop_assert_eq!(dialogue_text, text);
            prop_assert_eq!(parsed_commands, command_text);
        }
    }
}
