//! メインアプリケーションウィンドウ

use crate::rename::{RenameOutcome, Renamer, validate_input};
use anyhow::{Context, Result};
use eframe::egui;
use egui::{CentralPanel, RichText, Vec2};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use super::theme::{Colors, app_style, severity_badge};

const IDLE_STATUS: &str = "APKファイルをドロップして開始";

/// アプリケーション状態
pub struct ApkRenamerApp {
    /// リネーム処理
    renamer: Renamer,
    /// バックグラウンド処理用ランタイム
    runtime: Runtime,
    /// 処理結果（新しいものが末尾）
    results: Vec<RenameOutcome>,
    /// 処理中のファイル名
    current_file: Option<String>,
    /// ステータスメッセージ
    status: String,
    /// 最後に処理したフォルダ
    last_folder: Option<PathBuf>,
    result_rx: Receiver<RenameOutcome>,
    result_tx: Sender<RenameOutcome>,
}

impl ApkRenamerApp {
    pub fn new(renamer: Renamer) -> Result<Self> {
        let (result_tx, result_rx) = channel();
        Ok(Self {
            renamer,
            runtime: Runtime::new().context("Tokioランタイムの作成に失敗")?,
            results: Vec::new(),
            current_file: None,
            status: IDLE_STATUS.to_string(),
            last_folder: None,
            result_rx,
            result_tx,
        })
    }

    fn is_processing(&self) -> bool {
        self.current_file.is_some()
    }

    /// ドロップされたファイルを処理（1回に1ファイルのみ）
    fn process_files(&mut self, files: Vec<PathBuf>) {
        if self.is_processing() {
            return;
        }
        let extra = files.len().saturating_sub(1);
        let Some(path) = files.into_iter().next() else {
            return;
        };

        if let Err(err) = validate_input(&path) {
            self.results.push(RenameOutcome::rejected(&path, &err));
            self.status = "APKファイル (.apk) をドロップしてください".to_string();
            return;
        }

        let name = file_label(&path);
        self.last_folder = path.parent().map(Path::to_path_buf);
        self.status = if extra > 0 {
            format!("処理中: {name}...（残り {extra} 件は無視されました）")
        } else {
            format!("処理中: {name}...")
        };
        self.current_file = Some(name);

        let renamer = self.renamer.clone();
        let result_tx = self.result_tx.clone();
        debug!(apk = %path.display(), "バックグラウンドで処理開始");

        // aapt の実行とリネームはブロッキングなのでUIスレッドでは行わない
        self.runtime.spawn_blocking(move || {
            let outcome = renamer.rename_package(&path);
            let _ = result_tx.send(outcome);
        });
    }

    /// 最後に処理したフォルダをファイルマネージャーで開く
    fn open_last_folder(&mut self) {
        let Some(folder) = &self.last_folder else {
            return;
        };
        if let Err(e) = open::that(folder) {
            warn!(folder = %folder.display(), error = %e, "フォルダを開けませんでした");
            self.status = format!("フォルダを開けませんでした: {} ({e})", folder.display());
        }
    }

    /// 結果を受信
    fn receive_results(&mut self) {
        while let Ok(outcome) = self.result_rx.try_recv() {
            self.status = outcome.message().replace('\n', " ");
            self.current_file = None;
            self.results.push(outcome);
        }
    }
}

impl eframe::App for ApkRenamerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_results();

        // ドロップされたファイルを処理
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.process_files(dropped);
        }

        // 処理中は再描画を要求
        if self.is_processing() {
            ctx.request_repaint();
        }

        CentralPanel::default().show(ctx, |ui| {
            ui.spacing_mut().item_spacing = Vec2::new(8.0, 10.0);

            // ヘッダー
            ui.horizontal(|ui| {
                ui.heading(
                    RichText::new("APKリネーマー")
                        .size(26.0)
                        .color(Colors::TEXT_PRIMARY),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(self.last_folder.is_some(), egui::Button::new("📁 フォルダを開く"))
                        .clicked()
                    {
                        self.open_last_folder();
                    }
                });
            });

            ui.label(
                RichText::new("APKをドロップ → aaptで解析 → アプリ名_バージョン名.apk にリネーム")
                    .size(14.0)
                    .color(Colors::TEXT_NOTE),
            );

            // ドロップゾーン
            let is_hovering = !ui.ctx().input(|i| i.raw.hovered_files.is_empty());
            let (fill, border) = if is_hovering {
                (Colors::BG_DROP_HOVER, Colors::ACCENT)
            } else {
                (Colors::BG_DROP, Colors::BORDER)
            };

            let drop_zone = egui::Frame::new()
                .fill(fill)
                .stroke(egui::Stroke::new(3.0, border))
                .corner_radius(10.0)
                .inner_margin(32.0)
                .show(ui, |ui| {
                    ui.set_min_size(Vec2::new(ui.available_width(), 140.0));
                    ui.vertical_centered(|ui| {
                        let text = match &self.current_file {
                            Some(name) => format!("処理中: {name}..."),
                            None => "ここにAPKファイルをドラッグ＆ドロップ".to_string(),
                        };
                        ui.label(
                            RichText::new(text)
                                .size(20.0)
                                .strong()
                                .color(Colors::TEXT_ON_DROP),
                        );
                        ui.label(
                            RichText::new("または、クリックしてファイルを選択")
                                .size(13.0)
                                .color(Colors::TEXT_ON_DROP),
                        );
                    });
                })
                .response
                .interact(egui::Sense::click());

            // クリックでファイル選択
            if drop_zone.clicked() && !self.is_processing() {
                if let Some(file) = rfd::FileDialog::new()
                    .add_filter("APK files", &["apk", "APK"])
                    .pick_file()
                {
                    self.process_files(vec![file]);
                }
            }

            ui.label(
                RichText::new(format!(
                    "注意: aapt (Android SDK Build-Tools) が必要です。使用中: {}",
                    self.renamer.extractor().program().display()
                ))
                .size(11.0)
                .italics()
                .color(Colors::TEXT_NOTE),
            );

            if self.is_processing() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new(&self.status).color(Colors::ACCENT));
                });
            }

            ui.add_space(6.0);

            // 結果セクション
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("処理結果")
                        .size(16.0)
                        .color(Colors::TEXT_PRIMARY),
                );
                if !self.results.is_empty() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("クリア").clicked() {
                            self.results.clear();
                        }
                    });
                }
            });

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .max_height((ui.available_height() - 48.0).max(80.0))
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for outcome in &self.results {
                        result_card(ui, outcome);
                    }
                });

            // ステータスバー
            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                ui.label(
                    RichText::new(&self.status)
                        .size(12.0)
                        .color(Colors::TEXT_NOTE),
                );
            });
        });
    }
}

fn result_card(ui: &mut egui::Ui, outcome: &RenameOutcome) {
    let (icon, color) = severity_badge(outcome.severity());

    ui.add_space(4.0);
    egui::Frame::new()
        .fill(Colors::BG_PANEL)
        .corner_radius(8.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(icon).size(16.0).color(color));
                ui.vertical(|ui| match outcome {
                    RenameOutcome::Renamed {
                        old_name,
                        new_name,
                        metadata,
                        ..
                    } => {
                        ui.label(RichText::new(old_name).size(13.0).color(Colors::TEXT_NOTE));
                        ui.label(
                            RichText::new(format!("→ {new_name}"))
                                .size(14.0)
                                .color(Colors::TEXT_PRIMARY),
                        );
                        if let Some(package) = &metadata.package_name {
                            ui.label(RichText::new(package).size(11.0).color(Colors::TEXT_NOTE));
                        }
                    }
                    RenameOutcome::AlreadyCorrect { file_name, .. } => {
                        ui.label(RichText::new(file_name).size(13.0).color(Colors::TEXT_PRIMARY));
                        ui.label(
                            RichText::new("既に正しい名前です")
                                .size(12.0)
                                .color(color),
                        );
                    }
                    RenameOutcome::Failed {
                        file_name, reason, ..
                    } => {
                        ui.label(RichText::new(file_name).size(13.0).color(Colors::TEXT_NOTE));
                        ui.label(RichText::new(reason).size(13.0).color(color));
                    }
                });
            });
        });
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 日本語表示用にシステムフォントを読み込む
fn install_cjk_font(ctx: &egui::Context) {
    const CANDIDATES: &[&str] = &[
        "C:\\Windows\\Fonts\\YuGothM.ttc",
        "C:\\Windows\\Fonts\\meiryo.ttc",
        "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    ];

    let Some(font_data) = CANDIDATES.iter().find_map(|p| std::fs::read(p).ok()) else {
        debug!("日本語フォントが見つかりません");
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        "cjk".to_owned(),
        egui::FontData::from_owned(font_data).into(),
    );
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);
}

/// アプリケーションを起動
pub fn run(renamer: Renamer) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 520.0])
            .with_min_inner_size([460.0, 400.0])
            .with_title("APKリネーマー")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "APKリネーマー",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_style(app_style());
            install_cjk_font(&cc.egui_ctx);
            Ok(Box::new(ApkRenamerApp::new(renamer)?))
        }),
    )
    .map_err(|e| anyhow::anyhow!("アプリケーションエラー: {}", e))
}
