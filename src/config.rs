//! 設定 - 設定ファイル (TOML) と環境変数

use crate::aapt::{DEFAULT_ARGS, DEFAULT_TOOL, Extractor, resolve_tool};
use crate::rename::{ConflictPolicy, Renamer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// aapt のパスを上書きする環境変数
pub const ENV_AAPT: &str = "APK_RENAMER_AAPT";
/// タイムアウト秒数を上書きする環境変数
pub const ENV_TIMEOUT_SECS: &str = "APK_RENAMER_TIMEOUT_SECS";

/// `~/.config/apk-renamer/config.toml` の内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// aapt のパス（未指定ならPATHとAndroid SDKから検索）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aapt: Option<PathBuf>,
    /// APKパスの前に渡す引数
    pub aapt_args: Vec<String>,
    /// aapt の実行タイムアウト（秒）。未指定なら無制限
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// 同名ファイルが既にある場合の扱い
    pub on_conflict: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aapt: None,
            aapt_args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout_secs: None,
            on_conflict: ConflictPolicy::default(),
        }
    }
}

impl Config {
    /// 既定の設定ファイルの場所
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("apk-renamer").join("config.toml"))
    }

    /// 設定ファイルを読み込む
    ///
    /// `explicit` を指定した場合は読み込めなければエラー。
    /// 既定の場所のファイルは無くてもよく、壊れていれば警告して既定値を使う。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        let Some(path) = Self::default_path().filter(|p| p.is_file()) else {
            return Ok(Self::default());
        };
        match Self::read(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "設定ファイルを無視");
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("設定ファイルの読み込みに失敗: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("設定ファイルのパースに失敗: {}", path.display()))?;
        debug!(path = %path.display(), "設定ファイルを読み込み");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 環境変数で上書き
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(aapt) = lookup(ENV_AAPT).filter(|v| !v.trim().is_empty()) {
            self.aapt = Some(PathBuf::from(aapt));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} が数値ではありません: {secs}"))?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// 設定に従った抽出器
    pub fn extractor(&self) -> Extractor {
        let program = self
            .aapt
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));
        Extractor::new(resolve_tool(&program))
            .with_args(self.aapt_args.iter().cloned())
            .with_timeout(self.timeout())
    }

    pub fn renamer(&self) -> Renamer {
        Renamer::new(self.extractor(), self.on_conflict)
    }
}
