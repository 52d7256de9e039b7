mod project;

use std::collections::BTreeMap;

use tracing::debug;
use vn_compiler::{compile_project_from_source_map, CompiledProject};
use vn_core::{Section, SessionSnapshot, VnError};
use vn_parser::KeywordTable;
use vn_runtime::{TagBank, VariableManager, VnEngine, VnEngineOptions};

pub use project::{ScriptProject, SCRIPT_EXTENSION};

pub const DEFAULT_ENTRY_SECTION: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileProjectResult {
    pub sections: BTreeMap<String, Section>,
    pub entry_section: String,
}

#[derive(Clone, Default)]
pub struct CreateEngineFromSourcesOptions {
    pub sources: BTreeMap<String, String>,
    pub entry_section: Option<String>,
    pub keywords: Option<KeywordTable>,
    pub tags: Option<TagBank>,
    pub variables: Option<VariableManager>,
}

#[derive(Clone)]
pub struct ResumeEngineFromSnapshotOptions {
    pub sources: BTreeMap<String, String>,
    pub snapshot: SessionSnapshot,
    pub keywords: Option<KeywordTable>,
    pub tags: Option<TagBank>,
}

pub fn compile_project_from_sources(
    sources_by_path: &BTreeMap<String, String>,
    entry_section: Option<String>,
    keywords: &KeywordTable,
) -> Result<CompileProjectResult, VnError> {
    let CompiledProject { sections } = compile_project_from_source_map(sources_by_path, keywords)?;
    let entry_section = resolve_entry_section(&sections, entry_section)?;
    Ok(CompileProjectResult {
        sections,
        entry_section,
    })
}

/// Compiles every source, builds an engine and starts it at the entry
/// section (explicit, or `main` when none is given).
pub fn create_engine_from_sources(
    options: CreateEngineFromSourcesOptions,
) -> Result<VnEngine, VnError> {
    let keywords = options.keywords.unwrap_or_else(KeywordTable::standard);
    let compiled =
        compile_project_from_sources(&options.sources, options.entry_section, &keywords)?;

    let mut engine = VnEngine::new(VnEngineOptions {
        sections: compiled.sections,
        tags: options.tags,
        variables: options.variables,
    })?;

    debug!(entry = %compiled.entry_section, "starting engine");
    engine.start(&compiled.entry_section)?;
    Ok(engine)
}

pub fn resume_engine_from_snapshot(
    options: ResumeEngineFromSnapshotOptions,
) -> Result<VnEngine, VnError> {
    let keywords = options.keywords.unwrap_or_else(KeywordTable::standard);
    let compiled = compile_project_from_source_map(&options.sources, &keywords)?;

    let mut engine = VnEngine::new(VnEngineOptions {
        sections: compiled.sections,
        tags: options.tags,
        variables: None,
    })?;

    engine.resume(options.snapshot)?;
    Ok(engine)
}

fn resolve_entry_section(
    sections: &BTreeMap<String, Section>,
    explicit: Option<String>,
) -> Result<String, VnError> {
    if let Some(entry) = explicit {
        return match sections.get(&entry.trim().to_ascii_lowercase()) {
            Some(section) => Ok(section.name.clone()),
            None => Err(VnError::new(
                "API_ENTRY_SECTION_NOT_FOUND",
                format!("Entry section \"{}\" is not defined.", entry),
            )),
        };
    }

    match sections.get(DEFAULT_ENTRY_SECTION) {
        Some(section) => Ok(section.name.clone()),
        None => Err(VnError::new(
            "API_ENTRY_MAIN_NOT_FOUND",
            "Expected a section named \"main\" as default entry.",
        )),
    }
}

#[cfg(test)]
mod api_tests {
    use super::*;
    use vn_core::EngineOutput;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    fn options(sources: BTreeMap<String, String>) -> CreateEngineFromSourcesOptions {
        CreateEngineFromSourcesOptions {
            sources,
            ..CreateEngineFromSourcesOptions::default()
        }
    }

    #[test]
    fn compile_defaults_to_main_section() {
        let sources = map(&[("story/main.vns", "Narrator \"Hello\"\n")]);
        let project = compile_project_from_sources(&sources, None, &KeywordTable::standard())
            .expect("compile should pass");
        assert_eq!(project.entry_section, "main");
    }

    #[test]
    fn compile_accepts_explicit_entry_in_any_case() {
        let sources = map(&[(
            "story/main.vns",
            "Narrator \"Hello\"\n=== Alt ===\nNarrator \"Alt\"\n",
        )]);
        let project =
            compile_project_from_sources(&sources, Some("ALT".to_string()), &KeywordTable::standard())
                .expect("compile should pass");
        assert_eq!(project.entry_section, "Alt");
    }

    #[test]
    fn compile_rejects_missing_explicit_entry() {
        let sources = map(&[("story/main.vns", "Narrator \"Hello\"\n")]);
        let error = compile_project_from_sources(
            &sources,
            Some("missing".to_string()),
            &KeywordTable::standard(),
        )
        .expect_err("missing entry should fail");
        assert_eq!(error.code, "API_ENTRY_SECTION_NOT_FOUND");
    }

    #[test]
    fn compile_requires_main_without_entry() {
        let sources = map(&[("story/intro.vns", "Narrator \"Hello\"\n")]);
        let error = compile_project_from_sources(&sources, None, &KeywordTable::standard())
            .expect_err("default main should fail");
        assert_eq!(error.code, "API_ENTRY_MAIN_NOT_FOUND");
    }

    #[test]
    fn create_engine_starts_at_entry() {
        let mut engine = create_engine_from_sources(options(map(&[(
            "main.vns",
            "Alice \"Hello\"\n",
        )])))
        .expect("engine should build");
        let first = engine.next_output().expect("next should pass");
        assert!(matches!(first, EngineOutput::Dialogue { text, .. } if text == "Hello"));
    }

    #[test]
    fn resume_picks_up_pending_choice() {
        let sources = map(&[(
            "main.vns",
            "choice \"Pick\"\n{\n- A\n{\nNarrator \"Took A\"\n}\n}\n",
        )]);
        let mut engine =
            create_engine_from_sources(options(sources.clone())).expect("engine should build");
        let first = engine.next_output().expect("next should pass");
        assert!(matches!(first, EngineOutput::Choices { .. }));

        let mut resumed = resume_engine_from_snapshot(ResumeEngineFromSnapshotOptions {
            sources,
            snapshot: engine.snapshot(),
            keywords: None,
            tags: None,
        })
        .expect("resume should pass");
        assert!(matches!(
            resumed.next_output().expect("next should pass"),
            EngineOutput::Choices { .. }
        ));
        resumed.choose(0).expect("choose should pass");
        let next = resumed.next_output().expect("next should pass");
        assert!(matches!(next, EngineOutput::Dialogue { text, .. } if text == "Took A"));
    }
}
