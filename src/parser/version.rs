//! バージョン抽出モジュール

use regex::Regex;
use std::sync::LazyLock;

static VERSION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"versionName='([^']+)'").expect("valid regex"));

static VERSION_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"versionCode='([^']+)'").expect("valid regex"));

/// `versionName='...'` からバージョン名を抽出
pub fn extract_version_name(text: &str) -> Option<String> {
    first_capture(&VERSION_NAME_RE, text)
}

/// `versionCode='...'` からバージョンコードを抽出
pub fn extract_version_code(text: &str) -> Option<String> {
    first_capture(&VERSION_CODE_RE, text)
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
