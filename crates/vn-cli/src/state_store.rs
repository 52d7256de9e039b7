use std::fs;
use std::path::Path;

use vn_core::VnError;

use crate::{cli_error, PlayerStateV1, PLAYER_STATE_SCHEMA};

pub(crate) fn save_player_state(path: &Path, state: &PlayerStateV1) -> Result<(), VnError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(cli_error("CLI_STATE_WRITE"))?;

    let payload = serde_json::to_string(state).map_err(cli_error("CLI_STATE_WRITE"))?;
    fs::write(path, payload).map_err(cli_error("CLI_STATE_WRITE"))
}

pub(crate) fn load_player_state(path: &Path) -> Result<PlayerStateV1, VnError> {
    if !path.exists() {
        return Err(VnError::new(
            "CLI_STATE_NOT_FOUND",
            format!("State file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(cli_error("CLI_STATE_READ"))?;

    let state: PlayerStateV1 = serde_json::from_str(&raw).map_err(cli_error("CLI_STATE_INVALID"))?;

    if state.schema_version != PLAYER_STATE_SCHEMA {
        return Err(VnError::new(
            "CLI_STATE_SCHEMA",
            format!("Unsupported player state schema: {}", state.schema_version),
        ));
    }

    Ok(state)
}

#[cfg(test)]
mod state_store_tests {
    use super::*;
    use crate::cli_test_support::*;
    use vn_core::SessionSnapshot;
    use vn_runtime::{HistoryTimeline, SESSION_SCHEMA_V1};

    fn sample_state() -> PlayerStateV1 {
        PlayerStateV1 {
            schema_version: PLAYER_STATE_SCHEMA.to_string(),
            scenario_id: "scripts-dir:/tmp/demo".to_string(),
            entry_section: "main".to_string(),
            snapshot: SessionSnapshot {
                schema_version: SESSION_SCHEMA_V1.to_string(),
                section: "main".to_string(),
                node_id: Some(2),
                ended: false,
                variables: Vec::new(),
                last_input: String::new(),
            },
            history: HistoryTimeline::new(8),
        }
    }

    #[test]
    fn state_round_trips_through_nested_directories() {
        let path = temp_path("state-store").join("nested").join("state.json");
        save_player_state(&path, &sample_state()).expect("save should pass");

        let loaded = load_player_state(&path).expect("load should pass");
        assert_eq!(loaded.scenario_id, "scripts-dir:/tmp/demo");
        assert_eq!(loaded.snapshot.node_id, Some(2));
        assert_eq!(loaded.history.capacity(), 8);
    }

    #[test]
    fn load_reports_missing_invalid_and_wrong_schema() {
        let missing = load_player_state(&temp_path("no-state.json")).expect_err("missing");
        assert_eq!(missing.code, "CLI_STATE_NOT_FOUND");

        let broken = temp_path("broken-state.json");
        write_file(&broken, "{");
        assert_eq!(
            load_player_state(&broken).expect_err("invalid").code,
            "CLI_STATE_INVALID"
        );

        let old = temp_path("old-state.json");
        let mut state = sample_state();
        state.schema_version = "player-state.v0".to_string();
        save_player_state(&old, &state).expect("save should pass");
        assert_eq!(
            load_player_state(&old).expect_err("schema").code,
            "CLI_STATE_SCHEMA"
        );
    }
}
