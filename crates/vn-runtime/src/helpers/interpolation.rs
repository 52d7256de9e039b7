use std::sync::OnceLock;

use regex::{Captures, Regex};
use rhai::Dynamic;
use tracing::{debug, warn};

use crate::helpers::rhai_bridge::var_value_to_dynamic;
use crate::tags::TagBank;
use crate::variables::VariableManager;

fn display_reference_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"\{\s*(?:\$\s*([A-Za-z_]\w*)(?:\s*\.\s*([A-Za-z_]\w*))?|<\s*([A-Za-z_]\w*)\s*>)\s*\}",
        )
        .expect("display reference regex must compile")
    })
}

fn logic_variable_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\$\s*([A-Za-z_]\w*)(?:\s*\.\s*([A-Za-z_]\w*))?")
            .expect("logic variable regex must compile")
    })
}

fn logic_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"<\s*([A-Za-z_]\w*)\s*>").expect("logic tag regex must compile")
    })
}

fn qualified_name(captures: &Captures<'_>) -> (String, String) {
    let first = &captures[1];
    match captures.get(2) {
        Some(second) => (
            format!("{}.{}", first, second.as_str()),
            second.as_str().to_string(),
        ),
        None => (first.to_string(), first.to_string()),
    }
}

/// Renders `{$bank.var}` and `{<tag>}` references for display. Unknown
/// references print their bare name.
pub(crate) fn render_display(text: &str, variables: &VariableManager, tags: &TagBank) -> String {
    if !text.contains('{') {
        return text.to_string();
    }
    display_reference_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            if let Some(tag) = captures.get(3) {
                return tags.get(tag.as_str()).unwrap_or_else(|| {
                    warn!(tag = tag.as_str(), "unknown tag in dialogue");
                    tag.as_str().to_string()
                });
            }
            let (qualified, bare) = qualified_name(captures);
            match variables.get(&qualified) {
                Some(value) => value.to_text(),
                None => {
                    warn!(variable = %qualified, "unknown variable in dialogue");
                    bare
                }
            }
        })
        .into_owned()
}

/// Splits an expression into code and string-literal pieces. A literal
/// piece holds the text between its quotes with escapes left as written;
/// the quotes themselves stay with the code pieces.
fn split_literals(expr: &str) -> Vec<(bool, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_literal = false;
    let mut escaped = false;

    for (index, ch) in expr.char_indices() {
        if !in_literal {
            if ch == '"' {
                pieces.push((false, &expr[start..=index]));
                start = index + 1;
                in_literal = true;
            }
            continue;
        }
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => {
                pieces.push((true, &expr[start..index]));
                start = index;
                in_literal = false;
            }
            _ => {}
        }
    }
    pieces.push((in_literal, &expr[start..]));
    pieces
}

fn escape_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Rewrites `$bank.var` references into scope bindings for rhai. Unknown
/// variables bind to an empty string. Registered `<tag>` references bind
/// to their text; any other `<...>` is left for the expression itself.
/// Inside string literals references are spliced in as escaped text.
pub(crate) fn bind_logic_references(
    expr: &str,
    variables: &VariableManager,
    tags: &TagBank,
) -> (String, Vec<(String, Dynamic)>) {
    let mut bindings: Vec<(String, Dynamic)> = Vec::new();
    let mut rewritten = String::with_capacity(expr.len());

    for (literal, piece) in split_literals(expr) {
        if literal {
            rewritten.push_str(&substitute_text(piece, variables, tags, escape_literal));
        } else {
            rewritten.push_str(&bind_code(piece, variables, tags, &mut bindings));
        }
    }

    (rewritten, bindings)
}

fn bind_code(
    code: &str,
    variables: &VariableManager,
    tags: &TagBank,
    bindings: &mut Vec<(String, Dynamic)>,
) -> String {
    let rewritten = logic_variable_regex()
        .replace_all(code, |captures: &Captures<'_>| {
            let (qualified, _) = qualified_name(captures);
            let value = match variables.get(&qualified) {
                Some(value) => var_value_to_dynamic(&value),
                None => {
                    debug!(variable = %qualified, "unknown variable in expression reads as empty");
                    Dynamic::from(String::new())
                }
            };
            let symbol = format!("__vn_{}", bindings.len());
            bindings.push((symbol.clone(), value));
            symbol
        })
        .into_owned();

    logic_tag_regex()
        .replace_all(&rewritten, |captures: &Captures<'_>| match tags.get(&captures[1]) {
            Some(text) => {
                let symbol = format!("__vn_{}", bindings.len());
                bindings.push((symbol.clone(), Dynamic::from(text)));
                symbol
            }
            None => captures[0].to_string(),
        })
        .into_owned()
}

fn substitute_text(
    text: &str,
    variables: &VariableManager,
    tags: &TagBank,
    encode: fn(&str) -> String,
) -> String {
    let rendered = logic_variable_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            let (qualified, _) = qualified_name(captures);
            variables
                .get(&qualified)
                .map(|value| encode(&value.to_text()))
                .unwrap_or_default()
        })
        .into_owned();

    logic_tag_regex()
        .replace_all(&rendered, |captures: &Captures<'_>| {
            tags.get(&captures[1])
                .map(|text| encode(&text))
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

/// Plain-text substitution of logic references, used when an expression
/// is not valid rhai and is taken as literal text instead.
pub(crate) fn render_logic_text(expr: &str, variables: &VariableManager, tags: &TagBank) -> String {
    substitute_text(expr, variables, tags, |text| text.to_string())
}
