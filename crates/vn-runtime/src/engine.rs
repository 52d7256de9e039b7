mod boundary;
mod control_flow;
mod eval;
mod lifecycle;
mod node;
mod snapshot;
mod step;

pub use lifecycle::{
    NodeState, Suspension, VnEngine, VnEngineOptions, INPUT_TAG, INPUT_VARIABLE, SECTION_TAG,
    SESSION_SCHEMA_V1,
};

#[cfg(test)]
pub(crate) mod runtime_test_support {
    use std::collections::BTreeMap;

    use super::*;
    use vn_compiler::compile_project_from_source_map;
    use vn_core::EngineOutput;
    use vn_parser::KeywordTable;

    pub(crate) fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    pub(crate) fn engine_from_sources(files: BTreeMap<String, String>) -> VnEngine {
        let project = compile_project_from_source_map(&files, &KeywordTable::standard())
            .expect("compile should pass");
        VnEngine::new(VnEngineOptions {
            sections: project.sections,
            ..VnEngineOptions::default()
        })
        .expect("engine should build")
    }

    pub(crate) fn engine_from_source(source: &str) -> VnEngine {
        engine_from_sources(map(&[("main.vns", source)]))
    }

    pub(crate) fn started_engine(source: &str) -> VnEngine {
        let mut engine = engine_from_source(source);
        engine.start("main").expect("start should pass");
        engine
    }

    /// Drives the engine to the end, taking the first option and
    /// submitting empty input. Returns the dialogue texts seen.
    pub(crate) fn drive_engine_to_end(engine: &mut VnEngine) -> Vec<String> {
        let mut texts = Vec::new();
        for _ in 0..5_000usize {
            match engine.next_output().expect("next should pass") {
                EngineOutput::Dialogue { text, .. } => {
                    texts.push(text);
                    engine.advance().expect("advance should pass");
                }
                EngineOutput::Commands { .. } => {
                    engine.advance().expect("advance should pass");
                }
                EngineOutput::Choices { items, .. } => {
                    let index = items.first().map(|item| item.index).unwrap_or(0);
                    engine.choose(index).expect("choose should pass");
                }
                EngineOutput::Input { .. } => {
                    engine.submit_input("").expect("input should pass");
                }
                EngineOutput::End => return texts,
            }
        }
        texts
    }
}
