//! Integration tests for the hook binary: configuration, JSON in/out, audit log

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use bash_block::{CommandDetector, Config, HookInput, HookOutput};
use tempfile::TempDir;

fn bash_json(command: &str) -> String {
    format!(
        r#"{{"tool_name":"Bash","tool_input":{{"command":"{}"}},"session_id":"s-1"}}"#,
        command.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Run the binary with `HOME` pointed at a scratch directory
fn run_hook(home: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bash-block"))
        .args(args)
        .env("HOME", home)
        .env_remove("BASH_BLOCK_DRY_RUN")
        .env_remove("BASH_BLOCK_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start bash-block");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for bash-block")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Library-level hook flow
// ============================================================================

#[test]
fn test_config_file_drives_detector() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[general]
max_depth = 5
audit_log = false
presets = ["git"]

[[rules]]
command = "kubectl"
patterns = ["delete"]
allow = ["delete pod"]
"#,
    );

    let config = Config::load_from(Path::new(&path)).unwrap();
    let mut detector =
        CommandDetector::new(config.resolved_rules().unwrap(), config.general.max_depth);
    assert_eq!(detector.max_depth(), 5);

    let deny = detector.check(&HookInput::from_json(&bash_json("git push")).unwrap());
    assert!(deny.is_deny());
    let input = HookInput::from_json(&bash_json("kubectl delete pod web-1")).unwrap();
    let allow = detector.check(&input);
    assert!(allow.is_allow());
}

#[test]
fn test_invalid_config_is_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "[general\nmax_depth = ");
    let err = Config::load_from(Path::new(&path)).unwrap_err();
    assert!(err.to_string().starts_with("failed to parse"));

    let missing = Config::load_from(&dir.path().join("missing.toml")).unwrap_err();
    assert!(missing.to_string().starts_with("failed to read"));
}

#[test]
fn test_deny_output_lists_issues() {
    let mut detector = CommandDetector::new(vec![bash_block::Rule::new("git", ["push"])], 0);
    let input = HookInput::from_json(&bash_json("bash -c 'git push'")).unwrap();
    let decision = detector.check(&input);
    let json: serde_json::Value =
        serde_json::from_str(&HookOutput::from_decision(&decision).to_json()).unwrap();

    let reason = json["hookSpecificOutput"]["permissionDecisionReason"]
        .as_str()
        .unwrap();
    assert!(reason.contains("Blocked git pattern detected: push"));
    assert!(reason.contains("Blocked command found in string: git push"));
}

// ============================================================================
// Binary
// ============================================================================

#[test]
fn test_binary_denies_blocked_command() {
    let home = TempDir::new().unwrap();
    let output = run_hook(home.path(), &["--cmd", "git push pull"], &bash_json("git push origin"));

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "deny");
    assert_eq!(json["hookSpecificOutput"]["hookEventName"], "PreToolUse");
}

#[test]
fn test_binary_allows_other_commands() {
    let home = TempDir::new().unwrap();
    let output = run_hook(home.path(), &["--cmd=git push"], &bash_json("git status"));

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "{}");
}

#[test]
fn test_binary_allows_non_shell_tools() {
    let home = TempDir::new().unwrap();
    let input = r#"{"tool_name":"Read","tool_input":{"file_path":"/tmp/notes"}}"#;
    let output = run_hook(home.path(), &["--preset", "git"], input);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "{}");
}

#[test]
fn test_binary_fails_closed_on_malformed_input() {
    let home = TempDir::new().unwrap();
    let output = run_hook(home.path(), &["--preset", "git"], "{not json");

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "deny");
}

#[test]
fn test_binary_denies_shell_call_without_command_string() {
    let home = TempDir::new().unwrap();
    let input = r#"{"tool_name":"Bash","tool_input":{"command":["git","push"]}}"#;
    let output = run_hook(home.path(), &["--preset", "git"], input);

    let json = stdout_json(&output);
    assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "deny");
}

#[test]
fn test_binary_dry_run_warns() {
    let home = TempDir::new().unwrap();
    let output = run_hook(
        home.path(),
        &["--preset", "git", "--dry-run"],
        &bash_json("git push"),
    );

    let json = stdout_json(&output);
    assert!(json.get("hookSpecificOutput").is_none());
    assert!(json["systemMessage"].as_str().unwrap().contains("would block"));
}

#[test]
fn test_binary_without_rules_is_usage_error() {
    let home = TempDir::new().unwrap();
    let output = run_hook(home.path(), &[], &bash_json("git push"));

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no rules configured"));
}

#[test]
fn test_binary_unknown_preset_is_error() {
    let home = TempDir::new().unwrap();
    let output = run_hook(home.path(), &["--preset", "terraform"], &bash_json("ls"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_binary_max_recursion_flag() {
    let home = TempDir::new().unwrap();
    let command = r#"sh -c "sh -c 'ls -la'""#;

    let shallow = run_hook(
        home.path(),
        &["--preset", "git", "--max-recursion", "2"],
        &bash_json(command),
    );
    assert_eq!(
        stdout_json(&shallow)["hookSpecificOutput"]["permissionDecision"],
        "deny"
    );

    let deep = run_hook(
        home.path(),
        &["--preset", "git", "--max-recursion", "3"],
        &bash_json(command),
    );
    assert_eq!(String::from_utf8_lossy(&deep.stdout).trim(), "{}");
}

#[test]
fn test_binary_writes_audit_log() {
    let home = TempDir::new().unwrap();
    let audit = home.path().join("logs/audit.jsonl");
    let config = write_config(
        home.path(),
        &format!(
            "[general]\naudit_path = \"{}\"\n\n[[rules]]\ncommand = \"git\"\npatterns = [\"push\"]\n",
            audit.display()
        ),
    );

    run_hook(home.path(), &["--config", &config], &bash_json("git push"));
    run_hook(home.path(), &["--config", &config], &bash_json("git status"));

    let content = std::fs::read_to_string(&audit).unwrap();
    let levels: Vec<String> = content
        .lines()
        .map(|line| {
            let entry: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(entry["session_id"], "s-1");
            entry["level"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(levels, vec!["BLOCKED", "ALLOWED"]);
}
