use apk_renamer::config::Config;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const DEMO_TOOL: &str = r#"printf '%s\n' "package: name='com.example.demo' versionCode='7' versionName='2.3.1'" "application-label:'Demo App'""#;

struct RunResult {
    code: Option<i32>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn run_renamer(workdir: &Path, args: &[&str]) -> RunResult {
    run_renamer_with_env(workdir, args, &[])
}

fn run_renamer_with_env(workdir: &Path, args: &[&str], env: &[(&str, &str)]) -> RunResult {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_apk_renamer"));
    cmd.args(args)
        .current_dir(workdir)
        .env_remove("APK_RENAMER_AAPT")
        .env_remove("APK_RENAMER_TIMEOUT_SECS")
        .env("XDG_CONFIG_HOME", workdir)
        .env("RUST_LOG", "off")
        .envs(env.iter().copied());
    let output = cmd.output().expect("run apk_renamer");
    RunResult {
        code: output.status.code(),
        stdout: output.stdout,
        stderr: output.stderr,
    }
}

/// `sh -c <script>` を aapt として使う設定ファイルを書き出す
fn write_tool_config(dir: &Path, script: &str) -> PathBuf {
    let config = Config {
        aapt: Some(PathBuf::from("sh")),
        aapt_args: vec![
            "-c".to_string(),
            script.to_string(),
            "aapt".to_string(),
            "dump".to_string(),
            "badging".to_string(),
        ],
        ..Config::default()
    };
    let path = dir.join("config.toml");
    fs::write(&path, toml::to_string(&config).expect("serialize config")).expect("write config");
    path
}

fn json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("json output")
}

#[test]
fn missing_file_exits_with_1() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.apk");
    let result = run_renamer(dir.path(), &["--json", missing.to_str().unwrap()]);
    assert_eq!(result.code, Some(1));

    let out = json(&result.stdout);
    assert_eq!(out["status"], "failed");
    assert_eq!(out["kind"], "invalid_input");
}

#[test]
fn wrong_extension_exits_with_1() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, b"hello").unwrap();

    let result = run_renamer(dir.path(), &[file.to_str().unwrap()]);
    assert_eq!(result.code, Some(1));
    assert!(file.exists());
    assert!(!result.stderr.is_empty());
}

#[test]
fn missing_tool_exits_with_2_and_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let apk = dir.path().join("sample.apk");
    fs::write(&apk, b"PK").unwrap();

    let result = run_renamer(
        dir.path(),
        &["--aapt", "/nonexistent/build-tools/aapt", "--json", apk.to_str().unwrap()],
    );
    assert_eq!(result.code, Some(2));
    assert_eq!(json(&result.stdout)["kind"], "tool_not_found");
    assert!(apk.exists());
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let apk = dir.path().join("sample.apk");
    fs::write(&apk, b"PK").unwrap();

    let result = run_renamer(
        dir.path(),
        &["--config", "does-not-exist.toml", apk.to_str().unwrap()],
    );
    assert_eq!(result.code, Some(2));
    assert!(String::from_utf8_lossy(&result.stderr).contains("does-not-exist.toml"));
    assert!(apk.exists());
}

#[test]
fn bad_timeout_env_is_a_config_failure() {
    let dir = tempfile::tempdir().unwrap();
    let apk = dir.path().join("sample.apk");
    fs::write(&apk, b"PK").unwrap();

    let result = run_renamer_with_env(
        dir.path(),
        &[apk.to_str().unwrap()],
        &[("APK_RENAMER_TIMEOUT_SECS", "soon")],
    );
    assert_eq!(result.code, Some(2));
    assert!(result.stdout.is_empty());
    assert!(apk.exists());
}

#[cfg(unix)]
#[test]
fn renames_and_then_reports_already_correct() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tool_config(dir.path(), DEMO_TOOL);
    let apk = dir.path().join("sample.apk");
    fs::write(&apk, b"package bytes").unwrap();

    let first = run_renamer(
        dir.path(),
        &["--config", config.to_str().unwrap(), "--json", apk.to_str().unwrap()],
    );
    assert_eq!(
        first.code,
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    let out = json(&first.stdout);
    assert_eq!(out["status"], "renamed");
    assert_eq!(out["old_name"], "sample.apk");
    assert_eq!(out["new_name"], "Demo_App_2.3.1.apk");
    assert_eq!(out["metadata"]["package_name"], "com.example.demo");

    let renamed = dir.path().join("Demo_App_2.3.1.apk");
    assert!(!apk.exists());
    assert_eq!(fs::read(&renamed).unwrap(), b"package bytes");

    let second = run_renamer(
        dir.path(),
        &["--config", config.to_str().unwrap(), "--json", renamed.to_str().unwrap()],
    );
    assert_eq!(second.code, Some(0));
    let out = json(&second.stdout);
    assert_eq!(out["status"], "already_correct");
    assert_eq!(out["file_name"], "Demo_App_2.3.1.apk");
    assert!(renamed.exists());
}

#[cfg(unix)]
#[test]
fn tool_error_exits_with_2_and_shows_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tool_config(dir.path(), "echo 'bad magic' >&2; exit 1");
    let apk = dir.path().join("broken.apk");
    fs::write(&apk, b"junk").unwrap();

    let result = run_renamer(
        dir.path(),
        &["--config", config.to_str().unwrap(), apk.to_str().unwrap()],
    );
    assert_eq!(result.code, Some(2));
    assert!(String::from_utf8_lossy(&result.stderr).contains("bad magic"));
    assert!(apk.exists());
}

#[cfg(unix)]
#[test]
fn conflict_policy_flag_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_tool_config(dir.path(), DEMO_TOOL);
    let apk = dir.path().join("sample.apk");
    let taken = dir.path().join("Demo_App_2.3.1.apk");
    fs::write(&apk, b"new").unwrap();
    fs::write(&taken, b"old").unwrap();

    let refused = run_renamer(
        dir.path(),
        &["--config", config.to_str().unwrap(), "--json", apk.to_str().unwrap()],
    );
    assert_eq!(refused.code, Some(2));
    assert_eq!(json(&refused.stdout)["kind"], "destination_exists");

    let suffixed = run_renamer(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "--on-conflict",
            "suffix",
            "--json",
            apk.to_str().unwrap(),
        ],
    );
    assert_eq!(suffixed.code, Some(0));
    assert_eq!(json(&suffixed.stdout)["new_name"], "Demo_App_2.3.1_1.apk");
    assert_eq!(fs::read(&taken).unwrap(), b"old");
}
