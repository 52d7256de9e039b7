use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vn_compiler::split_sections;
use vn_core::VnError;
use walkdir::WalkDir;

pub const SCRIPT_EXTENSION: &str = "vns";

/// A directory of `.vns` scripts held in memory.
///
/// Sources are keyed by their forward-slash path below the root. Section
/// names are unique across the whole project, ignoring case, and each one
/// is indexed to the file that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptProject {
    root: PathBuf,
    sources: BTreeMap<String, String>,
    section_files: BTreeMap<String, String>,
}

impl ScriptProject {
    pub fn load(root: &Path) -> Result<Self, VnError> {
        let sources = read_scripts(root)?;
        let section_files = index_sections(&sources)?;
        info!(
            root = %root.display(),
            files = sources.len(),
            sections = section_files.len(),
            "script project loaded"
        );
        Ok(Self {
            root: root.to_path_buf(),
            sources,
            section_files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sources(&self) -> &BTreeMap<String, String> {
        &self.sources
    }

    pub fn into_sources(self) -> BTreeMap<String, String> {
        self.sources
    }

    pub fn section_count(&self) -> usize {
        self.section_files.len()
    }

    /// The file declaring `section`, matched case-insensitively.
    pub fn section_file(&self, section: &str) -> Option<&str> {
        self.section_files
            .get(&section.trim().to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn read_scripts(root: &Path) -> Result<BTreeMap<String, String>, VnError> {
    let mut sources = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|error| {
            VnError::new(
                "API_PROJECT_SCAN",
                format!("Cannot scan {}: {}", root.display(), error),
            )
        })?;
        // Links are not followed while walking but a linked script is read.
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION) {
            continue;
        }

        let key = script_key(root, path);
        let content = fs::read_to_string(path).map_err(|error| {
            VnError::new(
                "API_PROJECT_READ",
                format!("Cannot read {}: {}", path.display(), error),
            )
        })?;
        debug!(file = %key, bytes = content.len(), "script read");
        sources.insert(key, content);
    }

    if sources.is_empty() {
        return Err(VnError::new(
            "API_PROJECT_EMPTY",
            format!("No .{} files under {}.", SCRIPT_EXTENSION, root.display()),
        ));
    }
    Ok(sources)
}

fn script_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn index_sections(sources: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>, VnError> {
    let mut section_files: BTreeMap<String, String> = BTreeMap::new();
    for (file, source) in sources {
        for section in split_sections(file, source)? {
            let key = section.name.to_ascii_lowercase();
            if let Some(first) = section_files.get(&key) {
                let message = format!(
                    "Section \"{}\" in {} is already declared in {}.",
                    section.name, file, first
                );
                return Err(match section.lines.first() {
                    Some(line) => {
                        VnError::at("COMPILE_DUPLICATE_SECTION", message, line.location.clone())
                    }
                    None => VnError::new("COMPILE_DUPLICATE_SECTION", message),
                });
            }
            section_files.insert(key, file.clone());
        }
    }
    Ok(section_files)
}
