mod builder;
mod source;

use std::collections::BTreeMap;

use tracing::debug;
use vn_core::{Section, VnError};
use vn_parser::KeywordTable;

pub use builder::build_section;
pub use source::{split_sections, SectionSource, SourceLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProject {
    /// Sections keyed by lowercase name.
    pub sections: BTreeMap<String, Section>,
}

impl CompiledProject {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(&name.to_ascii_lowercase())
    }
}

pub fn compile_source(
    file_path: &str,
    source: &str,
    keywords: &KeywordTable,
) -> Result<Vec<Section>, VnError> {
    split_sections(file_path, source)?
        .into_iter()
        .map(|section| build_section(section, keywords))
        .collect()
}

pub fn compile_project_from_source_map(
    sources_by_path: &BTreeMap<String, String>,
    keywords: &KeywordTable,
) -> Result<CompiledProject, VnError> {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    for (file_path, source) in sources_by_path {
        for section in compile_source(file_path, source, keywords)? {
            let key = section.name.to_ascii_lowercase();
            if let Some(existing) = sections.get(&key) {
                return Err(VnError::new(
                    "COMPILE_DUPLICATE_SECTION",
                    format!(
                        "Section \"{}\" in {} is already defined in {}.",
                        section.name, file_path, existing.file_path
                    ),
                ));
            }
            debug!(section = %section.name, nodes = section.nodes.len(), "compiled section");
            sections.insert(key, section);
        }
    }
    Ok(CompiledProject { sections })
}
