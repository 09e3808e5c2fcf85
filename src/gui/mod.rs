//! GUI - ドラッグ＆ドロップでリネーム

mod app;
mod theme;

pub use app::{ApkRenamerApp, run};
