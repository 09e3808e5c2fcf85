//! アプリ名抽出モジュール

use regex::Regex;
use std::sync::LazyLock;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"application-label:'([^']+)'").expect("valid regex"));

/// `application-label:'...'` からアプリ名を抽出（最初の一致を採用）
pub fn extract_label(text: &str) -> Option<String> {
    LABEL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
