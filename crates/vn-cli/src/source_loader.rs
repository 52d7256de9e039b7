use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use vn_api::ScriptProject;
use vn_core::VnError;

use crate::{cli_error, LoadedScenario};

const SCENARIO_REF_PREFIX: &str = "scripts-dir:";

/// Loads a scripts directory as a scenario that starts at `entry_section`.
pub(crate) fn load_source_by_scripts_dir(
    scripts_dir: &str,
    entry_section: &str,
) -> Result<LoadedScenario, VnError> {
    let root = resolve_scripts_dir(scripts_dir)?;
    let project = ScriptProject::load(&root)?;
    match project.section_file(entry_section) {
        Some(file) => debug!(entry = entry_section, file, "entry section located"),
        None => debug!(entry = entry_section, "entry section not declared in any script"),
    }

    let dir_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    Ok(LoadedScenario {
        id: make_scripts_dir_scenario_id(&root),
        title: format!("Scripts {}", dir_name),
        sources: project.into_sources(),
        entry_section: entry_section.to_string(),
    })
}

/// Reopens the scenario a saved state points at.
pub(crate) fn load_source_by_ref(
    scenario_ref: &str,
    entry_section: &str,
) -> Result<LoadedScenario, VnError> {
    match scenario_ref.strip_prefix(SCENARIO_REF_PREFIX) {
        Some(scripts_dir) => load_source_by_scripts_dir(scripts_dir, entry_section),
        None => Err(VnError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported scenario ref: {}", scenario_ref),
        )),
    }
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, VnError> {
    let path = Path::new(scripts_dir);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(cli_error("CLI_SOURCE_PATH"))?
            .join(path)
    };

    match fs::metadata(&absolute) {
        Ok(metadata) if metadata.is_dir() => Ok(absolute),
        Ok(_) => Err(VnError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        )),
        Err(_) => Err(VnError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        )),
    }
}

pub(crate) fn make_scripts_dir_scenario_id(scripts_dir: &Path) -> String {
    format!("{}{}", SCENARIO_REF_PREFIX, scripts_dir.display())
}
