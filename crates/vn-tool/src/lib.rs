mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{load_project, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VnToolError {
    #[error("Cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Test case {path} is not valid JSON: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Test case schema \"{found}\" is not supported (want \"{expected}\").")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("Scripts under {path} cannot be loaded: {source}")]
    Project {
        path: PathBuf,
        source: vn_core::VnError,
    },
    #[error("Engine error: {0}")]
    Engine(#[from] vn_core::VnError),
    #[error("Event {event_index} needs a {expected_action_kind} action but none is left.")]
    MissingAction {
        event_index: usize,
        expected_action_kind: String,
    },
    #[error("Event {event_index} needs a {expected_action_kind} action, found {actual_action_kind}.")]
    ActionKindMismatch {
        event_index: usize,
        expected_action_kind: String,
        actual_action_kind: String,
    },
    #[error("Story ended with actions left over: {used} of {total} used.")]
    UnusedActions { used: usize, total: usize },
    #[error("Run did not end within {max_steps} steps.")]
    GuardExceeded { max_steps: usize },
    #[error("Expected {expected} events, saw {actual}. observed={observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event {index} differs. expected={expected} actual={actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Cannot serialize event for comparison: {0}")]
    EventSerialize(serde_json::Error),
}
