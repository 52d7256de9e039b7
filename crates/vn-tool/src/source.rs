use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use vn_api::ScriptProject;

use crate::{TestCase, VnToolError, TESTCASE_SCHEMA_V1};

/// Reads the scripts of one example directory. The directory's
/// `testcase.json` sits next to them and is not a script.
pub fn load_project(example_dir: &Path) -> Result<BTreeMap<String, String>, VnToolError> {
    ScriptProject::load(example_dir)
        .map(ScriptProject::into_sources)
        .map_err(|source| VnToolError::Project {
            path: example_dir.to_path_buf(),
            source,
        })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, VnToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| VnToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| VnToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(VnToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod source_tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("vn-tool-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn load_project_collects_nested_scripts() {
        let root = temp_dir("scripts");
        write_file(&root.join("main.vns"), "Alice \"x\"\n");
        write_file(&root.join("chapters/two.vns"), "Bob \"y\"\n");
        write_file(&root.join("testcase.json"), "{}");

        let files = load_project(&root).expect("scan should pass");
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("main.vns"));
        assert!(files.contains_key("chapters/two.vns"));
    }

    #[test]
    fn load_project_fails_when_no_scripts() {
        let root = temp_dir("empty-scripts");
        write_file(&root.join("notes.txt"), "skip");

        let error = load_project(&root).expect_err("empty source should fail");
        assert!(
            matches!(&error, VnToolError::Project { source, .. } if source.code == "API_PROJECT_EMPTY")
        );
    }

    #[cfg(unix)]
    #[test]
    fn load_project_reports_unreadable_scripts() {
        let root = temp_dir("read-error");
        write_file(&root.join("notes.txt"), "skip");
        std::os::unix::fs::symlink(root.join("missing-target.vns"), root.join("main.vns"))
            .expect("symlink should be created");

        let result = load_project(&root);
        assert!(matches!(
            &result,
            Err(VnToolError::Project { source, .. }) if source.code == "API_PROJECT_READ"
        ));
    }

    #[test]
    fn read_test_case_parses_valid_json() {
        let root = temp_dir("case-ok");
        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{
  "schemaVersion":"vn-tool-case.v1",
  "entrySection":"intro",
  "actions":[{"kind":"advance"},{"kind":"cancel"}],
  "expectedEvents":[{"kind":"end"}]
}"#,
        );

        let parsed = read_test_case(&case_path).expect("case should parse");
        assert_eq!(parsed.entry_section, "intro");
        assert_eq!(
            parsed.actions,
            vec![crate::TestAction::Advance, crate::TestAction::Cancel]
        );
        assert_eq!(parsed.expected_events.len(), 1);
    }

    #[test]
    fn read_test_case_reports_read_parse_and_schema_errors() {
        let root = temp_dir("case-errors");
        fs::create_dir_all(&root).expect("root should be created");

        let missing = read_test_case(&root.join("missing.json")).expect_err("missing case");
        assert!(matches!(missing, VnToolError::ReadFile { .. }));

        let bad_json_path = root.join("bad.json");
        write_file(&bad_json_path, "{");
        let parse_error = read_test_case(&bad_json_path).expect_err("parse should fail");
        assert!(matches!(parse_error, VnToolError::ParseCase { .. }));

        let bad_schema_path = root.join("bad-schema.json");
        write_file(
            &bad_schema_path,
            r#"{"schemaVersion":"v0","expectedEvents":[{"kind":"end"}]}"#,
        );
        let schema_error = read_test_case(&bad_schema_path).expect_err("schema should fail");
        assert!(matches!(
            schema_error,
            VnToolError::InvalidSchemaVersion { .. }
        ));
    }
}
