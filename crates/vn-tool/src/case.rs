use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "vn-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_entry_section")]
    pub entry_section: String,
    /// When false every dialogue and command line needs an explicit
    /// `advance` action.
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

fn default_entry_section() -> String {
    "main".to_string()
}

fn default_auto_advance() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Advance,
    Choose { index: usize },
    Input { text: String },
    Cancel,
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Choose { .. } => "choose",
            Self::Input { .. } => "input",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Dialogue {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        commands: Vec<String>,
    },
    Commands {
        commands: Vec<String>,
    },
    Choices {
        title: String,
        choices: Vec<String>,
    },
    Input {
        title: String,
    },
    End,
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "vn-tool-case.v1",
  "actions": [],
  "expectedEvents": []
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.entry_section, "main");
        assert!(parsed.auto_advance);
        assert!(parsed.actions.is_empty());
    }

    #[test]
    fn test_action_kind_name_reports_expected_value() {
        assert_eq!(TestAction::Advance.kind_name(), "advance");
        assert_eq!(TestAction::Choose { index: 0 }.kind_name(), "choose");
        assert_eq!(TestAction::Cancel.kind_name(), "cancel");
    }

    #[test]
    fn expected_event_deserialize_supports_all_variants() {
        let parsed: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[
  {"kind":"dialogue","speaker":"Alice","text":"Hi","commands":["music theme"]},
  {"kind":"dialogue","text":"Narration"},
  {"kind":"commands","commands":["bg park"]},
  {"kind":"choices","title":"Pick","choices":["A"]},
  {"kind":"input","title":"Name"},
  {"kind":"end"}
]"#,
        )
        .expect("events should deserialize");

        assert_eq!(parsed.len(), 6);
        assert!(matches!(
            &parsed[1],
            ExpectedEvent::Dialogue { speaker: None, commands, .. } if commands.is_empty()
        ));
        assert!(matches!(parsed[5], ExpectedEvent::End));
    }
}
