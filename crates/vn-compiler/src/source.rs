use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use vn_core::{SourceLocation, VnError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub location: SourceLocation,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSource {
    pub name: String,
    pub file_path: String,
    pub lines: Vec<SourceLine>,
}

fn section_header_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^===\s*([^=\s][^=]*?)\s*(?:=+)?$").expect("section header regex must compile")
    })
}

/// Splits a file into sections on `=== name ===` headers, dropping blank
/// and `//` comment lines. Lines before the first header form a section
/// named after the file stem.
pub fn split_sections(file_path: &str, source: &str) -> Result<Vec<SectionSource>, VnError> {
    let mut sections = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = SectionSource {
        name: file_stem(file_path),
        file_path: file_path.to_string(),
        lines: Vec::new(),
    };
    let mut current_has_header = false;

    for (index, raw) in source.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with("//") {
            continue;
        }
        let location = SourceLocation::new(file_path, index + 1);

        if let Some(captures) = section_header_regex().captures(text) {
            if current_has_header || !current.lines.is_empty() {
                sections.push(current);
            }
            let name = captures[1].to_string();
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(VnError::at(
                    "COMPILE_DUPLICATE_SECTION",
                    format!("Section \"{}\" is declared twice.", name),
                    location,
                ));
            }
            current = SectionSource {
                name,
                file_path: file_path.to_string(),
                lines: Vec::new(),
            };
            current_has_header = true;
            continue;
        }

        current.lines.push(SourceLine {
            location,
            text: text.to_string(),
        });
    }

    if current_has_header || !current.lines.is_empty() {
        if !current_has_header && !seen.insert(current.name.to_ascii_lowercase()) {
            return Err(VnError::new(
                "COMPILE_DUPLICATE_SECTION",
                format!("Section \"{}\" is declared twice.", current.name),
            ));
        }
        sections.push(current);
    }

    Ok(sections)
}

fn file_stem(file_path: &str) -> String {
    let file_name = Path::new(file_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_path);
    file_name
        .split('.')
        .next()
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name)
        .to_string()
}
