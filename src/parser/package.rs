//! パッケージ名抽出モジュール

use regex::Regex;
use std::sync::LazyLock;

static PACKAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"package: name='([^']+)'").expect("valid regex"));

/// `package: name='...'` からパッケージ名を抽出
pub fn extract_package_name(text: &str) -> Option<String> {
    PACKAGE_NAME_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
