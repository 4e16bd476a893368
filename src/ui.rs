/*
 * UI Module
 *
 * This module builds the egui overlays on top of the 3D scene: the search
 * interface (oracle and manual filter), the dapp detail panel, the void
 * filter, the sound control and the view settings window.
 *
 * The overlays never mutate navigation or audio state directly. They return
 * a list of UiActions which the app applies after the egui frame ends.
 */

use nannou_egui::{egui, Egui};

use crate::catalog::Dapp;
use crate::constellation::Constellation;
use crate::debug::DebugInfo;
use crate::navigation::ViewMode;
use crate::oracle::PENDING_MESSAGE;
use crate::params::{CameraParams, ViewSettings};
use crate::search::{Category, ManualFilter};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 240, 255);
const MONAD_PURPLE: egui::Color32 = egui::Color32::from_rgb(131, 110, 249);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Oracle,
    Manual,
}

/// State of the search overlay that survives between frames.
pub struct SearchState {
    pub mode: SearchMode,
    pub query: String,
    pub filter: ManualFilter,
    // Last oracle reasoning shown under the input
    pub message: Option<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            mode: SearchMode::Oracle,
            query: String::new(),
            filter: ManualFilter::default(),
            message: None,
        }
    }
}

/// Requests raised by the overlays during one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    CloseSearch,
    SubmitManual,
    SubmitOracle,
    ClosePanel,
    BackToTunnel,
    ToggleMute,
    SetVolume(f32),
    Hover,
}

/// Read-only view of the model handed to the overlays.
pub struct HudState<'a> {
    pub mode: ViewMode,
    pub search_open: bool,
    pub selected: Option<&'a Dapp>,
    pub full: &'a [Dapp],
    pub filtered: &'a [Dapp],
    pub volume: f32,
    pub muted: bool,
    pub oracle_pending: bool,
    // Oracle answer shown, results not yet delivered
    pub oracle_handoff: bool,
    pub debug_info: &'a DebugInfo,
}

// Build all overlays. Returns the raised actions and whether the layout or
// the star field needs a rebuild.
pub fn update_ui(
    egui: &mut Egui,
    settings: &mut ViewSettings,
    search: &mut SearchState,
    constellation: Option<&mut Constellation>,
    camera_params: &mut CameraParams,
    hud: &HudState,
) -> (Vec<UiAction>, bool, bool) {
    let mut actions = Vec::new();

    settings.take_snapshot();

    let ctx = egui.begin_frame();

    if hud.search_open {
        search_window(&ctx, search, hud, &mut actions);
    }
    if let Some(dapp) = hud.selected {
        dapp_panel(&ctx, dapp, &mut actions);
    }
    if hud.mode == ViewMode::Void {
        void_controls(&ctx, constellation, hud, &mut actions);
    }
    sound_control(&ctx, hud, &mut actions);
    settings_window(&ctx, settings, camera_params, hud.debug_info);

    let (layout_changed, stars_changed) = settings.detect_changes();
    (actions, layout_changed, stars_changed)
}

fn search_window(
    ctx: &egui::CtxRef,
    search: &mut SearchState,
    hud: &HudState,
    actions: &mut Vec<UiAction>,
) {
    egui::Window::new("SEARCH THE TUNNEL")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .default_width(560.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.selectable_label(search.mode == SearchMode::Oracle, "AI ORACLE").clicked() {
                    search.mode = SearchMode::Oracle;
                }
                if ui.selectable_label(search.mode == SearchMode::Manual, "MANUAL").clicked() {
                    search.mode = SearchMode::Manual;
                }
                ui.with_layout(egui::Layout::right_to_left(), |ui| {
                    if ui.button("✕").clicked() {
                        actions.push(UiAction::CloseSearch);
                    }
                });
            });
            ui.separator();

            match search.mode {
                SearchMode::Oracle => oracle_tab(ui, search, hud, actions),
                SearchMode::Manual => manual_tab(ui, search, hud, actions),
            }
        });
}

fn oracle_tab(
    ui: &mut egui::Ui,
    search: &mut SearchState,
    hud: &HudState,
    actions: &mut Vec<UiAction>,
) {
    let response = ui.add(
        egui::TextEdit::singleline(&mut search.query)
            .hint_text("Ask the oracle (e.g. 'Where can I trade with low fees?')")
            .desired_width(f32::INFINITY),
    );
    let entered = response.lost_focus() && ui.input().key_pressed(egui::Key::Enter);

    ui.horizontal(|ui| {
        let busy = hud.oracle_pending || hud.oracle_handoff;
        let enabled = !busy && !search.query.trim().is_empty();
        let scan = ui.add_enabled(enabled, egui::Button::new("AI SCAN"));
        if (scan.clicked() || entered) && enabled {
            actions.push(UiAction::SubmitOracle);
        }
    });

    if hud.oracle_pending {
        ui.add(egui::Label::new(PENDING_MESSAGE).text_color(ACCENT).monospace());
    } else if let Some(message) = &search.message {
        ui.add(egui::Label::new("ORACLE RESPONSE:").small().text_color(ACCENT));
        ui.add(egui::Label::new(message).text_color(ACCENT).monospace());
    }
}

fn manual_tab(
    ui: &mut egui::Ui,
    search: &mut SearchState,
    hud: &HudState,
    actions: &mut Vec<UiAction>,
) {
    ui.heading("Manual Filter");

    ui.horizontal(|ui| {
        for category in Category::ALL {
            if ui
                .selectable_label(search.filter.category == category, category.label())
                .clicked()
            {
                search.filter.category = category;
            }
        }
    });

    ui.add_space(6.0);
    ui.horizontal_wrapped(|ui| {
        for tag in search.filter.category.visible_tags() {
            let selected = search.filter.is_selected(tag);
            if ui.selectable_label(selected, tag).clicked() {
                search.filter.toggle_tag(tag);
            }
        }
    });

    ui.add_space(6.0);
    ui.checkbox(&mut search.filter.exclusive_only, "Exclusive to Monad");
    ui.separator();

    let count = search.filter.count(hud.full);
    ui.horizontal(|ui| {
        ui.label(format!("{} MATCHES", count));
        let label = format!("WARP TO {} RESULTS", count);
        let warp = ui.add_enabled(count > 0, egui::Button::new(label));
        if warp.clicked() {
            actions.push(UiAction::SubmitManual);
        }
    });
}

fn dapp_panel(ctx: &egui::CtxRef, dapp: &Dapp, actions: &mut Vec<UiAction>) {
    egui::SidePanel::right("dapp_panel")
        .resizable(false)
        .default_width(320.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.add(egui::Label::new(&dapp.name).heading().text_color(to_color32(dapp)));
                ui.with_layout(egui::Layout::right_to_left(), |ui| {
                    if ui.button("✕").clicked() {
                        actions.push(UiAction::ClosePanel);
                    }
                });
            });

            if !dapp.project_type.is_empty() {
                ui.add(egui::Label::new(&dapp.project_type).small());
            }
            if dapp.exclusive {
                ui.add(egui::Label::new("ONLY ON MONAD").text_color(MONAD_PURPLE).strong());
            }
            ui.separator();

            ui.label(dapp.description.as_str());
            ui.add_space(8.0);

            ui.horizontal_wrapped(|ui| {
                for tag in &dapp.tags {
                    ui.add(egui::Label::new(format!("#{}", tag)).text_color(ACCENT));
                }
            });
            ui.add_space(8.0);

            if let Some(website) = &dapp.website {
                ui.hyperlink_to("WEBSITE", website);
            }
            if let Some(social) = &dapp.social {
                ui.hyperlink_to("X / TWITTER", social);
            }
        });
}

fn void_controls(
    ctx: &egui::CtxRef,
    constellation: Option<&mut Constellation>,
    hud: &HudState,
    actions: &mut Vec<UiAction>,
) {
    egui::Area::new("void_controls")
        .anchor(egui::Align2::CENTER_TOP, [0.0, 20.0])
        .show(ctx, |ui| {
            if let Some(constellation) = constellation {
                ui.add(
                    egui::TextEdit::singleline(&mut constellation.query)
                        .hint_text("Filter Void...")
                        .desired_width(260.0),
                );
                if !constellation.has_matches(hud.filtered) {
                    let label = egui::Label::new("NO SIGNAL FOUND")
                        .text_color(egui::Color32::RED)
                        .strong();
                    ui.add(label);
                }
            }
        });

    egui::Area::new("void_return")
        .anchor(egui::Align2::LEFT_TOP, [20.0, 20.0])
        .show(ctx, |ui| {
            let button = ui.add(egui::Button::new("RETURN").text_color(ACCENT));
            if button.hovered() {
                actions.push(UiAction::Hover);
            }
            if button.clicked() {
                actions.push(UiAction::BackToTunnel);
            }
        });
}

fn sound_control(ctx: &egui::CtxRef, hud: &HudState, actions: &mut Vec<UiAction>) {
    egui::Area::new("sound_control")
        .anchor(egui::Align2::RIGHT_BOTTOM, [-20.0, -20.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let icon = if hud.muted || hud.volume == 0.0 { "🔇" } else { "🔊" };
                if ui.button(icon).clicked() {
                    actions.push(UiAction::ToggleMute);
                }
                let mut volume = if hud.muted { 0.0 } else { hud.volume };
                let slider = ui.add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false));
                if slider.changed() {
                    actions.push(UiAction::SetVolume(volume));
                }
            });
        });
}

fn settings_window(
    ctx: &egui::CtxRef,
    settings: &mut ViewSettings,
    params: &mut CameraParams,
    debug_info: &DebugInfo,
) {
    egui::Window::new("View Settings")
        .default_pos([10.0, 10.0])
        .collapsible(true)
        .show(ctx, |ui| {
            ui.collapsing("Scene", |ui| {
                ui.checkbox(&mut settings.compact_layout, "Compact Layout");
                ui.checkbox(&mut settings.show_stars, "Show Stars");
                ui.add(
                    egui::Slider::new(&mut settings.star_count, ViewSettings::get_star_count_range())
                        .text("Star Count"),
                );
            });

            ui.collapsing("Camera", |ui| {
                ui.add(egui::Slider::new(&mut params.damping, CameraParams::get_damping_range()).text("Damping"));
                ui.add(
                    egui::Slider::new(&mut params.wheel_sensitivity, CameraParams::get_sensitivity_range())
                        .text("Wheel Sensitivity"),
                );
                ui.add(egui::Slider::new(&mut params.wide_fov, CameraParams::get_fov_range()).text("Wide FOV"));
            });

            ui.collapsing("Performance", |ui| {
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Visible tiles: {}", debug_info.visible_tiles));
            });

            ui.checkbox(&mut settings.show_debug, "Show Debug Info");
        });
}

fn to_color32(dapp: &Dapp) -> egui::Color32 {
    egui::Color32::from_rgb(dapp.color.red, dapp.color.green, dapp.color.blue)
}

// Draw debug information on the screen
pub fn draw_debug_info(
    draw: &nannou::Draw,
    debug_info: &DebugInfo,
    window_rect: nannou::geom::Rect,
) {
    let margin = 20.0;
    let line_height = 20.0;
    let lines = debug_info.lines();
    let panel_width = 240.0;
    let panel_height = line_height * lines.len() as f32 + margin;
    let panel_x = window_rect.left() + panel_width / 2.0;
    let panel_y = window_rect.bottom() + panel_height / 2.0;

    draw.rect()
        .x_y(panel_x, panel_y)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_y = window_rect.bottom() + panel_height - margin;
    for (i, text) in lines.iter().enumerate() {
        draw.text(text)
            .x_y(panel_x, text_y - i as f32 * line_height)
            .w(panel_width - margin)
            .left_justify()
            .color(nannou::color::WHITE)
            .font_size(13);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn frame(ctx: &mut egui::CtxRef) {
        ctx.begin_frame(egui::RawInput::default());
    }

    #[test]
    fn overlays_build_without_raising_actions() {
        let catalog = Catalog::from_json(
            r#"[{"NAME": "Swapper", "INFO": "A DEX", "TAGS": "DeFi", "PJ TYPE": "App",
                 "ONLY on Monad": "Yes", "WEB": "https://swapper.xyz"}]"#,
        )
        .unwrap();
        let debug_info = DebugInfo::default();
        let hud = HudState {
            mode: ViewMode::Tunnel,
            search_open: true,
            selected: catalog.entries.first(),
            full: &catalog.entries,
            filtered: &catalog.entries,
            volume: 0.5,
            muted: false,
            oracle_pending: false,
            oracle_handoff: true,
            debug_info: &debug_info,
        };
        let mut search = SearchState {
            query: "swap".to_string(),
            message: Some("Trading venues.".to_string()),
            ..SearchState::default()
        };
        let mut settings = ViewSettings::default();
        let mut params = CameraParams::default();

        let mut ctx = egui::CtxRef::default();
        let mut actions = Vec::new();
        for mode in [SearchMode::Oracle, SearchMode::Manual] {
            search.mode = mode;
            frame(&mut ctx);
            search_window(&ctx, &mut search, &hud, &mut actions);
            dapp_panel(&ctx, &catalog.entries[0], &mut actions);
            void_controls(&ctx, None, &hud, &mut actions);
            sound_control(&ctx, &hud, &mut actions);
            settings_window(&ctx, &mut settings, &mut params, &debug_info);
            let _ = ctx.end_frame();
        }
        assert!(actions.is_empty());
        assert_eq!(params, CameraParams::default());
    }
}
