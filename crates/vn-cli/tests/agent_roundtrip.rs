use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn demos_root() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join("scripts")
}

fn run_agent(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_vnscript-player");
    Command::new(bin)
        .arg("agent")
        .args(args)
        .output()
        .expect("agent command should run")
}

fn parse_state_out(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("STATE_OUT:").map(|v| v.to_string()))
        .filter(|value| value != "NONE")
}

fn temp_state(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("vnscript-rs-agent-{}.json", name))
        .to_string_lossy()
        .to_string()
}

fn start(demo: &str, state_out: &str) -> String {
    let scenario = demos_root().join(demo);
    let output = run_agent(&[
        "start",
        "--scripts-dir",
        scenario.to_str().expect("path should be utf-8"),
        "--state-out",
        state_out,
    ]);
    assert!(output.status.success(), "start failed");
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn step(command: &str, state_in: &str, state_out: &str, extra: &[&str]) -> String {
    let mut args = vec![command, "--state-in", state_in, "--state-out", state_out];
    args.extend_from_slice(extra);
    let output = run_agent(&args);
    assert!(output.status.success(), "{} failed", command);
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn agent_choice_flow_reaches_end() {
    let states = (1..=5)
        .map(|index| temp_state(&format!("choice-{}", index)))
        .collect::<Vec<_>>();

    let stdout = start("02-choice", &states[0]);
    assert!(stdout.contains("EVENT:DIALOGUE"));
    assert!(stdout.contains("DIALOGUE_JSON:{\"speaker\":\"Alice\",\"text\":\"Where to?\"}"));
    assert_eq!(parse_state_out(&stdout).as_deref(), Some(states[0].as_str()));

    let stdout = step("advance", &states[0], &states[1], &[]);
    assert!(stdout.contains("EVENT:CHOICES"));
    assert!(stdout.contains("TITLE_JSON:\"Where to?\""));
    assert!(stdout.contains("CHOICE:0|\"Beach\""));
    assert!(stdout.contains("CHOICE:2|\"Stay home\""));

    let stdout = step("choose", &states[1], &states[2], &["--choice", "0"]);
    assert!(stdout.contains("The beach it is."));
    assert!(stdout.contains("COMMAND:"));

    let stdout = step("advance", &states[2], &states[3], &[]);
    assert!(stdout.contains("Mood: sunny"));

    let stdout = step("advance", &states[3], &states[4], &[]);
    assert!(stdout.contains("EVENT:END"));
    assert!(stdout.contains("STATE_OUT:NONE"));
}

#[test]
fn agent_input_flow_uses_state_roundtrip() {
    let states = (1..=3)
        .map(|index| temp_state(&format!("input-{}", index)))
        .collect::<Vec<_>>();

    start("03-input-name", &states[0]);
    let stdout = step("advance", &states[0], &states[1], &[]);
    assert!(stdout.contains("EVENT:INPUT"));
    assert!(stdout.contains("TITLE_JSON:\"Your name?\""));

    let stdout = step("input", &states[1], &states[2], &["--text", "Sam"]);
    assert!(stdout.contains("Nice to meet you, Sam!"));
}

#[test]
fn agent_back_shows_the_previous_line() {
    let states = (1..=4)
        .map(|index| temp_state(&format!("back-{}", index)))
        .collect::<Vec<_>>();

    start("06-rewind", &states[0]);
    step("advance", &states[0], &states[1], &[]);
    let stdout = step("advance", &states[1], &states[2], &[]);
    assert!(stdout.contains("Third stop."));

    let stdout = step("back", &states[2], &states[3], &[]);
    assert!(stdout.contains("EVENT:DIALOGUE"));
    assert!(stdout.contains("Second stop, 2 coins."));
}

#[test]
fn agent_reports_missing_state_as_error() {
    let output = run_agent(&[
        "advance",
        "--state-in",
        &temp_state("never-written"),
        "--state-out",
        &temp_state("unused"),
    ]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_STATE_NOT_FOUND"));
}

#[test]
fn play_mode_accepts_line_commands() {
    let bin = env!("CARGO_BIN_EXE_vnscript-player");
    let scenario = demos_root().join("06-rewind");
    let mut child = Command::new(bin)
        .arg("play")
        .arg("--scripts-dir")
        .arg(&scenario)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("play should spawn");

    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(b"\n:back\n:resume\n:log\n:vars\n:quit\n")
        .expect("stdin write");

    let output = child.wait_with_output().expect("play should finish");
    assert!(output.status.success(), "play mode failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Alice: First stop."));
    assert!(stdout.contains("[history 1/2] Alice: First stop."));
    assert!(stdout.contains("resumed from history"));
    assert!(stdout.contains("[0] Alice: First stop."));
    assert!(stdout.contains("Default.coins (int) = 1"));
    assert!(stdout.contains("bye"));
}
