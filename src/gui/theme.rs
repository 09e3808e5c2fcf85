//! テーマ設定

use crate::rename::Severity;
use egui::{Color32, CornerRadius, Stroke, Style, Visuals};

/// カラーパレット
pub struct Colors;

impl Colors {
    pub const BG_WINDOW: Color32 = Color32::from_rgb(44, 62, 80);
    pub const BG_PANEL: Color32 = Color32::from_rgb(52, 73, 94);
    pub const BG_DROP: Color32 = Color32::from_rgb(236, 240, 241);
    pub const BG_DROP_HOVER: Color32 = Color32::from_rgb(214, 234, 248);
    pub const ACCENT: Color32 = Color32::from_rgb(102, 204, 255);
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(236, 240, 241);
    pub const TEXT_ON_DROP: Color32 = Color32::from_rgb(44, 62, 80);
    pub const TEXT_NOTE: Color32 = Color32::from_rgb(189, 195, 199);
    pub const SUCCESS: Color32 = Color32::from_rgb(46, 204, 113);
    pub const INFO: Color32 = Color32::from_rgb(52, 152, 219);
    pub const WARNING: Color32 = Color32::from_rgb(241, 196, 15);
    pub const ERROR: Color32 = Color32::from_rgb(231, 76, 60);
    pub const BORDER: Color32 = Color32::from_rgb(127, 140, 141);
}

/// 結果表示用のアイコンと色
pub fn severity_badge(severity: Severity) -> (&'static str, Color32) {
    match severity {
        Severity::Success => ("✓", Colors::SUCCESS),
        Severity::Info => ("ℹ", Colors::INFO),
        Severity::Warning => ("⚠", Colors::WARNING),
        Severity::Error => ("✗", Colors::ERROR),
    }
}

/// ウィンドウ全体のスタイル
pub fn app_style() -> Style {
    let mut visuals = Visuals::dark();
    visuals.panel_fill = Colors::BG_WINDOW;
    visuals.window_fill = Colors::BG_PANEL;
    visuals.extreme_bg_color = Colors::BG_WINDOW;
    visuals.faint_bg_color = Colors::BG_PANEL;
    visuals.hyperlink_color = Colors::ACCENT;

    let radius = CornerRadius::same(6);
    for (widget, text) in [
        (&mut visuals.widgets.noninteractive, Colors::TEXT_NOTE),
        (&mut visuals.widgets.inactive, Colors::TEXT_PRIMARY),
        (&mut visuals.widgets.hovered, Colors::TEXT_PRIMARY),
        (&mut visuals.widgets.active, Colors::TEXT_PRIMARY),
    ] {
        widget.bg_fill = Colors::BG_PANEL;
        widget.fg_stroke = Stroke::new(1.0, text);
        widget.corner_radius = radius;
    }
    visuals.widgets.active.bg_fill = Colors::INFO;
    visuals.selection.bg_fill = Colors::ACCENT.gamma_multiply(0.4);
    visuals.selection.stroke = Stroke::new(1.0, Colors::ACCENT);

    Style {
        visuals,
        ..Style::default()
    }
}
