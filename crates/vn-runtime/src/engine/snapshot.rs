use tracing::debug;
use vn_core::{DialogueState, ExecutionPoint, SessionSnapshot, VnError};

use super::lifecycle::{Cursor, VnEngine, SESSION_SCHEMA_V1};

impl VnEngine {
    /// Captures the cursor and every variable bank. Resuming re-executes
    /// the captured node, so a pending output is issued again.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            schema_version: SESSION_SCHEMA_V1.to_string(),
            section: self
                .cursor
                .as_ref()
                .map(|cursor| cursor.section.clone())
                .unwrap_or_else(|| self.current_section()),
            node_id: self.cursor.as_ref().map(|cursor| cursor.node_id),
            ended: self.ended || self.cursor.is_none(),
            variables: self.variables.records(),
            last_input: self.last_input(),
        }
    }

    /// Replaces all variable banks with the snapshot's and puts the cursor
    /// back on the captured node.
    pub fn resume(&mut self, snapshot: SessionSnapshot) -> Result<(), VnError> {
        if snapshot.schema_version != SESSION_SCHEMA_V1 {
            return Err(VnError::new(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported session schema \"{}\", expected \"{}\".",
                    snapshot.schema_version, SESSION_SCHEMA_V1
                ),
            ));
        }

        self.variables.load_records(&snapshot.variables);
        *self.last_input.borrow_mut() = snapshot.last_input;
        self.started = true;
        self.last_dialogue = DialogueState::default();

        match snapshot.node_id {
            Some(node_id) if !snapshot.ended => self.restore_point(&ExecutionPoint {
                section: snapshot.section,
                node_id,
            }),
            _ => {
                self.cursor = None;
                self.pending = None;
                self.hurried = false;
                self.ended = true;
                *self.current_section.borrow_mut() = snapshot.section;
                Ok(())
            }
        }
    }

    /// Points the cursor at a node without touching variables. The node
    /// runs from the start on the next `next_output`.
    pub fn restore_point(&mut self, point: &ExecutionPoint) -> Result<(), VnError> {
        let key = point.section.trim().to_ascii_lowercase();
        let Some(section) = self.sections.get(&key) else {
            return Err(VnError::new(
                "ENGINE_SECTION_NOT_FOUND",
                format!("Section \"{}\" is not defined.", point.section),
            ));
        };
        if section.node(point.node_id).is_none() {
            return Err(VnError::new(
                "SNAPSHOT_POINT_INVALID",
                format!(
                    "Section \"{}\" has no node {}.",
                    section.name, point.node_id
                ),
            ));
        }

        debug!(section = %section.name, node = point.node_id, "restoring execution point");
        *self.current_section.borrow_mut() = section.name.clone();
        self.cursor = Some(Cursor::at(section, point.node_id));
        self.pending = None;
        self.hurried = false;
        self.started = true;
        self.ended = false;
        Ok(())
    }
}

#[cfg(test)]
mod snapshot_tests {
    use crate::engine::runtime_test_support::*;
    use crate::engine::SESSION_SCHEMA_V1;
    use vn_core::{EngineOutput, ExecutionPoint, VarValue};

    const SCRIPT: &str = r#"
$gold = 10
choice "Buy?"
{
- Yes
{
    $gold -= 4
    Merchant "Thanks! You have {$gold} gold."
}
- No
}
Merchant "Bye"
"#;

    #[test]
    fn snapshot_resume_reissues_pending_choice() {
        let mut engine = started_engine(SCRIPT);
        let first = engine.next_output().expect("next");
        assert!(matches!(first, EngineOutput::Choices { .. }));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.schema_version, SESSION_SCHEMA_V1);

        let mut resumed = engine_from_source(SCRIPT);
        resumed.resume(snapshot).expect("resume");
        assert_eq!(resumed.next_output().expect("next"), first);
        resumed.choose(0).expect("choose");
        assert_eq!(
            drive_engine_to_end(&mut resumed),
            vec!["Thanks! You have 6 gold.".to_string(), "Bye".to_string()]
        );
    }

    #[test]
    fn snapshot_serializes_as_json() {
        let mut engine = started_engine(SCRIPT);
        engine.next_output().expect("next");
        let json = serde_json::to_string(&engine.snapshot()).expect("json");
        assert!(json.contains("\"schemaVersion\":\"session.v1\""));
        let back = serde_json::from_str(&json).expect("parse");
        let mut resumed = engine_from_source(SCRIPT);
        resumed.resume(back).expect("resume");
        assert_eq!(resumed.variables().get("gold"), Some(VarValue::Int(10)));
    }

    #[test]
    fn resume_replaces_variables_wholesale() {
        let mut engine = started_engine(SCRIPT);
        engine.next_output().expect("next");
        let snapshot = engine.snapshot();
        engine
            .variables_mut()
            .set("Extra.flag", VarValue::Bool(true))
            .expect("set");
        engine.resume(snapshot).expect("resume");
        assert!(!engine.variables().contains("Extra.flag"));
    }

    #[test]
    fn resume_rejects_unknown_schema() {
        let mut engine = started_engine(SCRIPT);
        let mut snapshot = engine.snapshot();
        snapshot.schema_version = "session.v0".to_string();
        assert_eq!(
            engine.resume(snapshot).expect_err("schema").code,
            "SNAPSHOT_SCHEMA"
        );
    }

    #[test]
    fn ended_snapshot_resumes_ended() {
        let mut engine = started_engine("Narrator \"Only\"\n");
        drive_engine_to_end(&mut engine);
        let snapshot = engine.snapshot();
        assert!(snapshot.ended);
        let mut resumed = engine_from_source("Narrator \"Only\"\n");
        resumed.resume(snapshot).expect("resume");
        assert_eq!(resumed.next_output().expect("next"), EngineOutput::End);
    }

    #[test]
    fn restore_point_validates_node() {
        let mut engine = started_engine("Narrator \"Only\"\n");
        let error = engine
            .restore_point(&ExecutionPoint {
                section: "main".to_string(),
                node_id: 9,
            })
            .expect_err("invalid");
        assert_eq!(error.code, "SNAPSHOT_POINT_INVALID");
    }
}
