use vn_test_example::{demo_dir, demo_names, testcase_path};
use vn_tool::assert_case;

#[test]
fn every_demo_matches_its_testcase() {
    let names = demo_names();
    assert!(!names.is_empty(), "expected demo scenarios");

    for name in names {
        if let Err(error) = assert_case(&demo_dir(&name), &testcase_path(&name)) {
            panic!("demo {} failed: {}", name, error);
        }
    }
}
