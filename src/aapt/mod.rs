//! aapt実行モジュール - `aapt dump badging` でAPK情報を取得

use crate::error::ExtractionError;
use crate::parser::PackageMetadata;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// 既定のツール名（PATHから検索）
pub const DEFAULT_TOOL: &str = "aapt";

/// 既定の引数（APKのパスはこの後ろに付く）
pub const DEFAULT_ARGS: &[&str] = &["dump", "badging"];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// メタデータ抽出器
#[derive(Debug, Clone)]
pub struct Extractor {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl Extractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout: None,
        }
    }

    /// APKパスの前に渡す引数を置き換える
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// `None` ならタイムアウトなし
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// APKからアプリ名とバージョン名を抽出
    ///
    /// ツールの起動・終了に失敗した場合のみエラー。項目が見つからない場合は代替値。
    pub fn extract(&self, apk_path: impl AsRef<Path>) -> Result<PackageMetadata, ExtractionError> {
        let apk_path = apk_path.as_ref();
        debug!(
            apk = %apk_path.display(),
            tool = %self.program.display(),
            "aaptを実行"
        );

        let report = self.dump_badging(apk_path)?;
        Ok(PackageMetadata::parse(&report))
    }

    /// ツールを実行して標準出力を返す
    fn dump_badging(&self, apk_path: &Path) -> Result<String, ExtractionError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(apk_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let child = command.spawn().map_err(|e| self.spawn_error(e))?;

        let Some(output) = wait_with_timeout(child, self.timeout).map_err(unexpected)? else {
            return Err(ExtractionError::ToolTimedOut {
                timeout_secs: self.timeout.map_or(0, |t| t.as_secs()),
            });
        };

        if !output.status.success() {
            return Err(ExtractionError::ToolExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| ExtractionError::UnexpectedFailure {
            message: format!("aaptの出力がUTF-8ではありません: {e}"),
        })
    }

    fn spawn_error(&self, err: io::Error) -> ExtractionError {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                ExtractionError::ToolNotFound {
                    program: self.program.display().to_string(),
                }
            }
            _ => unexpected(err),
        }
    }
}

fn unexpected(err: io::Error) -> ExtractionError {
    ExtractionError::UnexpectedFailure {
        message: err.to_string(),
    }
}

/// 子プロセスの終了を待つ。タイムアウトした場合は強制終了して `None`
fn wait_with_timeout(mut child: Child, timeout: Option<Duration>) -> io::Result<Option<Output>> {
    // パイプが詰まらないよう別スレッドで読み続ける
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let status = match timeout {
        None => Some(child.wait()?),
        Some(limit) => match poll_until(&mut child, limit) {
            Ok(status) => status,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        },
    };

    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        // 孫プロセスがパイプを握っている可能性があるので読み取りスレッドは待たない
        return Ok(None);
    };

    Ok(Some(Output {
        status,
        stdout: join_reader(stdout)?,
        stderr: join_reader(stderr)?,
    }))
}

fn poll_until(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| io::Error::other("出力読み取りスレッドが異常終了しました"))?
}

/// ツールのパスを決定
///
/// 既定の `aapt` がPATHに無ければ、`ANDROID_HOME` / `ANDROID_SDK_ROOT` の
/// build-tools から最新のものを探す。見つからなければそのまま返す。
pub fn resolve_tool(program: &Path) -> PathBuf {
    if program != Path::new(DEFAULT_TOOL) {
        return program.to_path_buf();
    }
    if let Ok(found) = which::which(DEFAULT_TOOL) {
        return found;
    }

    ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .into_iter()
        .filter_map(std::env::var_os)
        .find_map(|root| newest_build_tool(Path::new(&root)))
        .inspect(|found| debug!(tool = %found.display(), "SDKのaaptを使用"))
        .unwrap_or_else(|| program.to_path_buf())
}

/// `<sdk>/build-tools/<version>/aapt` のうち最新のバージョンを返す
fn newest_build_tool(sdk_root: &Path) -> Option<PathBuf> {
    let exe = format!("{DEFAULT_TOOL}{}", std::env::consts::EXE_SUFFIX);
    let entries = std::fs::read_dir(sdk_root.join("build-tools")).ok()?;

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|dir| dir.join(&exe).is_file())
        .max_by_key(|dir| version_key(dir))
        .map(|dir| dir.join(&exe))
}

fn version_key(dir: &Path) -> Vec<u64> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .split(['.', '-'])
        .map_while(|part| part.parse().ok())
        .collect()
}

/// `sh -c` で aapt の代わりをするテスト用の抽出器
#[cfg(all(test, unix))]
pub(crate) fn fake_aapt(script: &str) -> Extractor {
    Extractor::new("sh").with_args(["-c", script, "aapt", "dump", "badging"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_tool_is_reported() {
        let extractor = Extractor::new("/nonexistent/build-tools/aapt");
        let err = extractor.extract("/tmp/whatever.apk").unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound { .. }), "{err:?}");
    }

    #[test]
    fn default_extractor_uses_dump_badging() {
        let extractor = Extractor::default();
        assert_eq!(extractor.program(), Path::new("aapt"));
        assert_eq!(extractor.args, vec!["dump", "badging"]);
        assert_eq!(extractor.timeout(), None);
    }

    #[cfg(unix)]
    #[test]
    fn parses_tool_output() {
        let extractor = fake_aapt(
            r#"printf '%s\n' "package: name='com.example.demo' versionCode='7' versionName='2.3.1'" "application-label:'Demo App'""#,
        );
        let meta = extractor.extract("/tmp/sample.apk").unwrap();
        assert_eq!(meta.application_label, "Demo_App");
        assert_eq!(meta.version_identifier, "2.3.1");
        assert_eq!(meta.version_code.as_deref(), Some("7"));
    }

    #[cfg(unix)]
    #[test]
    fn passes_apk_path_after_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("sample.apk");
        fs::write(&apk, b"PK").unwrap();

        let extractor = fake_aapt(
            r#"test -f "$3" || exit 3; printf "application-label:'%s'\nversionName='1'\n" "$1 $2""#,
        );
        let meta = extractor.extract(&apk).unwrap();
        assert_eq!(meta.application_label, "dump_badging");
    }

    #[cfg(unix)]
    #[test]
    fn output_without_fields_uses_placeholders() {
        let extractor = fake_aapt("echo 'sdkVersion:21'");
        let meta = extractor.extract("/tmp/sample.apk").unwrap();
        assert_eq!(meta.file_name(), "UnknownApp_UnknownVersion.apk");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_stderr() {
        let extractor = fake_aapt("echo 'bad magic' >&2; exit 1");
        let err = extractor.extract("/tmp/broken.apk").unwrap_err();
        match err {
            ExtractionError::ToolExecutionFailed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "bad magic");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_tool() {
        let extractor =
            fake_aapt("exec sleep 5").with_timeout(Some(Duration::from_millis(200)));
        let start = Instant::now();
        let err = extractor.extract("/tmp/slow.apk").unwrap_err();
        assert!(matches!(err, ExtractionError::ToolTimedOut { .. }), "{err:?}");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn fast_tool_finishes_within_timeout() {
        let extractor = fake_aapt("echo \"versionName='3.0'\"")
            .with_timeout(Some(Duration::from_secs(10)));
        let meta = extractor.extract("/tmp/fast.apk").unwrap();
        assert_eq!(meta.version_identifier, "3.0");
    }

    #[cfg(unix)]
    #[test]
    fn invalid_utf8_output_is_unexpected() {
        let extractor = fake_aapt(r"printf '\377\376'");
        let err = extractor.extract("/tmp/sample.apk").unwrap_err();
        assert!(matches!(err, ExtractionError::UnexpectedFailure { .. }), "{err:?}");
    }

    #[test]
    fn explicit_tool_is_not_resolved() {
        let tool = Path::new("/opt/sdk/build-tools/34.0.0/aapt");
        assert_eq!(resolve_tool(tool), tool);
    }

    #[test]
    fn newest_build_tools_version_wins() {
        let sdk = tempfile::tempdir().unwrap();
        let exe = format!("aapt{}", std::env::consts::EXE_SUFFIX);
        for version in ["9.0.0", "30.0.3", "34.0.0"] {
            let dir = sdk.path().join("build-tools").join(version);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(&exe), b"").unwrap();
        }
        // aapt の無いバージョンは無視
        fs::create_dir_all(sdk.path().join("build-tools").join("35.0.0")).unwrap();

        let found = newest_build_tool(sdk.path()).unwrap();
        assert_eq!(found, sdk.path().join("build-tools").join("34.0.0").join(&exe));
    }

    #[test]
    fn sdk_without_build_tools() {
        let sdk = tempfile::tempdir().unwrap();
        assert_eq!(newest_build_tool(sdk.path()), None);
    }
}
