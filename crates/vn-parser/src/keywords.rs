use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use vn_core::ControlKind;

use crate::line::unquote;

/// Turns the text after a control keyword into a kind plus raw data fields.
pub type ControlParser = fn(&str) -> (ControlKind, Vec<String>);

/// Registered control keywords, keyed by lowercase keyword.
///
/// Built once per session and handed to the parser; there is no global
/// registry. Sigil entries match a line whose first character is the sigil
/// and receive the whole trimmed line.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    keywords: BTreeMap<String, ControlParser>,
    sigils: Vec<(char, ControlParser)>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut table = Self::new();
        table
            .register("if", parse_if)
            .register("else", parse_else)
            .register("choice", parse_choice)
            .register("input", parse_input)
            .register("jump", parse_jump)
            .register("goto", parse_jump)
            .register_sigil('$', parse_assignment);
        table
    }

    pub fn register(&mut self, keyword: &str, parser: ControlParser) -> &mut Self {
        self.keywords.insert(keyword.to_ascii_lowercase(), parser);
        self
    }

    pub fn register_sigil(&mut self, sigil: char, parser: ControlParser) -> &mut Self {
        self.sigils.retain(|(existing, _)| *existing != sigil);
        self.sigils.push((sigil, parser));
        self
    }

    pub fn keyword(&self, token: &str) -> Option<ControlParser> {
        self.keywords.get(&token.to_ascii_lowercase()).copied()
    }

    pub fn sigil(&self, first: char) -> Option<ControlParser> {
        self.sigils
            .iter()
            .find(|(sigil, _)| *sigil == first)
            .map(|(_, parser)| *parser)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }
}

fn parse_if(rest: &str) -> (ControlKind, Vec<String>) {
    (ControlKind::If, vec![rest.trim().to_string()])
}

fn parse_else(rest: &str) -> (ControlKind, Vec<String>) {
    let rest = rest.trim();
    let mut parts = rest.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or_default();
    if first.eq_ignore_ascii_case("if") {
        let expr = parts.next().unwrap_or_default().trim();
        return (ControlKind::ElseIf, vec![expr.to_string()]);
    }
    (ControlKind::Else, Vec::new())
}

fn parse_choice(rest: &str) -> (ControlKind, Vec<String>) {
    (ControlKind::Choice, vec![unquote(rest.trim())])
}

fn parse_input(rest: &str) -> (ControlKind, Vec<String>) {
    (ControlKind::Input, vec![rest.trim().to_string()])
}

fn parse_jump(rest: &str) -> (ControlKind, Vec<String>) {
    let target = rest.split_whitespace().next().unwrap_or_default();
    (ControlKind::Jump, vec![unquote(target)])
}

fn assignment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\$\s*([A-Za-z_]\w*(?:\s*\.\s*[A-Za-z_]\w*)?)\s*([+\-*/%]?=)(.*)$")
            .expect("assignment regex must compile")
    })
}

fn parse_assignment(line: &str) -> (ControlKind, Vec<String>) {
    let line = line.trim();
    let Some(captures) = assignment_regex().captures(line) else {
        return (ControlKind::Assignment, vec![line.to_string()]);
    };
    let expr = captures[3].trim();
    // `$a == 1` is a comparison, not an assignment.
    if expr.starts_with('=') {
        return (ControlKind::Assignment, vec![line.to_string()]);
    }
    let target = captures[1]
        .split('.')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(".");
    (
        ControlKind::Assignment,
        vec![target, captures[2].to_string(), expr.to_string()],
    )
}
