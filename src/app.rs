/*
 * Application Module
 *
 * This module defines the main application model and the per-frame update
 * of the showcase. It wires the collaborators together: the navigator
 * decides the view mode, the camera controller exists while the tunnel is
 * mounted, the constellation exists while the void is shown, and the
 * overlays report actions that are applied once the egui frame is built.
 */

use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::Arc;

use nannou::prelude::*;
use nannou_egui::Egui;
use rand::Rng;

use crate::audio::{HttpAssets, LogSink, SoundBoard, SoundCue};
use crate::camera::CameraController;
use crate::catalog::{Catalog, TunnelLayout};
use crate::constellation::Constellation;
use crate::debug::DebugInfo;
use crate::input;
use crate::navigation::{Navigator, Transition};
use crate::oracle::{GeminiOracle, OracleClient, OracleStatus, Recommendation};
use crate::params::{ShowcaseConfig, ViewSettings};
use crate::renderer::{self, HitTarget};
use crate::search::resolve_results;
use crate::ui::{self, HudState, SearchState, UiAction};
use crate::DEFAULT_CONFIG_PATH;

const STAR_MIN_RADIUS: f32 = 80.0;
const STAR_MAX_RADIUS: f32 = 130.0;
const STAR_ROLL_SPEED: f32 = 0.06;

// Main model for the application
pub struct Model {
    pub config: ShowcaseConfig,
    pub settings: ViewSettings,
    pub egui: Egui,
    pub debug_info: DebugInfo,
    pub navigator: Navigator,
    // Present while the tunnel scene is mounted
    pub camera: Option<CameraController>,
    pub layout: TunnelLayout,
    // Present while the void is shown
    pub constellation: Option<Constellation>,
    pub sounds: SoundBoard,
    pub oracle: OracleClient,
    pub search: SearchState,
    pub hovered: Option<HitTarget>,
    pub mouse_position: Vec2,
    pub drag_last: Option<Vec2>,
    pub touch: Option<(u64, f32)>,
    pub stars: Vec<Vec3>,
    pub star_rotation: f32,
    pub time: f32,
    last_revision: u64,
    last_window_compact: Option<bool>,
    ui_hovering: bool,
}

// Random points in a spherical shell around the camera
pub fn generate_stars<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let z: f32 = rng.gen_range(-1.0..1.0);
            let theta: f32 = rng.gen_range(0.0..TAU);
            let r = (1.0 - z * z).sqrt();
            let radius = rng.gen_range(STAR_MIN_RADIUS..STAR_MAX_RADIUS);
            vec3(r * theta.cos(), r * theta.sin(), z) * radius
        })
        .collect()
}

// Config path from the first CLI argument
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let config = ShowcaseConfig::load_or_default(&config_path());

    // 80% of the primary monitor when it is known
    let (width, height) = app
        .primary_monitor()
        .map(|m| (m.size().width as f32 * 0.8, m.size().height as f32 * 0.8))
        .unwrap_or((1280.0, 800.0));

    let window_id = match app
        .new_window()
        .title("Monad Tunnel")
        .size(width as u32, height as u32)
        .view(renderer::view)
        .mouse_moved(input::mouse_moved)
        .mouse_pressed(input::mouse_pressed)
        .mouse_released(input::mouse_released)
        .mouse_wheel(input::mouse_wheel)
        .key_pressed(input::key_pressed)
        .touch(input::touch)
        .raw_event(input::raw_window_event)
        .build()
    {
        Ok(id) => id,
        Err(e) => {
            log::error!("Failed to create window: {}", e);
            std::process::exit(1);
        }
    };

    let egui = match app.window(window_id) {
        Some(window) => Egui::from_window(&window),
        None => {
            log::error!("Window {:?} vanished during setup", window_id);
            std::process::exit(1);
        }
    };

    let catalog = Catalog::load_or_empty(&config.catalog_path);
    if catalog.is_empty() {
        log::warn!("Catalog is empty, the tunnel will only show the logo");
    }

    let mut settings = ViewSettings::default();
    settings.compact_layout = width < config.layout.compact_width_threshold;
    let layout = TunnelLayout::new(&config.layout, settings.compact_layout);

    let navigator = Navigator::new(catalog.entries, config.timing.clone(), config.layout.clone());
    let sounds = SoundBoard::new(&config.audio, &config.timing, Box::new(LogSink))
        .with_assets(Arc::new(HttpAssets::new(&config.audio)));
    let oracle = OracleClient::new(Arc::new(GeminiOracle::new(config.oracle.clone())));
    let stars = generate_stars(settings.star_count, &mut rand::thread_rng());

    log::info!("Showcase ready with {} entries", navigator.full().len());

    Model {
        settings,
        egui,
        debug_info: DebugInfo::default(),
        last_revision: navigator.revision(),
        navigator,
        camera: None,
        layout,
        constellation: None,
        sounds,
        oracle,
        search: SearchState::default(),
        hovered: None,
        mouse_position: Vec2::ZERO,
        drag_last: None,
        touch: None,
        stars,
        star_rotation: 0.0,
        time: 0.0,
        last_window_compact: None,
        ui_hovering: false,
        config,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    let now = update.since_start.as_secs_f64();
    let dt = update.since_last.as_secs_f32();
    model.time = update.since_start.as_secs_f32();

    model.egui.set_elapsed_time(update.since_start);

    follow_window_size(app, model);
    poll_oracle(model, now);
    model.sounds.poll_assets();

    for transition in model.navigator.advance(now, &mut model.sounds) {
        if transition == Transition::EnterVoid {
            log::info!("Entering the void with {} nodes", model.navigator.filtered().len());
            model.camera = None;
            model.hovered = None;
            model.constellation = Some(Constellation::new(
                model.navigator.filtered(),
                model.config.void_view.clone(),
            ));
        }
    }

    mount_tunnel(model);
    apply_ui(model, now);

    if model.navigator.revision() != model.last_revision {
        model.last_revision = model.navigator.revision();
        if model.constellation.is_some() {
            model.constellation = Some(Constellation::new(
                model.navigator.filtered(),
                model.config.void_view.clone(),
            ));
        }
        update_min_depth(model);
    }

    if let Some(camera) = model.camera.as_mut() {
        if camera.params() != &model.config.camera {
            *camera.params_mut() = model.config.camera.clone();
        }
        camera.set_warp(model.navigator.warp_state());
        if let Some(depth) = model.navigator.take_camera_jump() {
            camera.set_target(depth);
        }
        camera.tick(dt, &mut rand::thread_rng());
    }
    if let Some(constellation) = model.constellation.as_mut() {
        constellation.update(dt);
    }
    model.star_rotation = (model.star_rotation + STAR_ROLL_SPEED * dt) % TAU;

    update_debug_info(app, model, &update);
}

// Switch to the compact layout when the window crosses the width threshold
fn follow_window_size(app: &App, model: &mut Model) {
    let compact = app.window_rect().w() < model.config.layout.compact_width_threshold;
    if model.last_window_compact != Some(compact) {
        if model.last_window_compact.is_some() {
            model.settings.compact_layout = compact;
            relayout(model);
        }
        model.last_window_compact = Some(compact);
    }
}

fn poll_oracle(model: &mut Model, now: f64) {
    if let OracleStatus::Answered(recommendation) = model.oracle.poll() {
        deliver_answer(
            &mut model.navigator,
            &mut model.sounds,
            &mut model.search,
            recommendation,
            now,
        );
    }
}

// Show the reasoning with a chirp and hand the results to the navigator
fn deliver_answer(
    navigator: &mut Navigator,
    sounds: &mut SoundBoard,
    search: &mut SearchState,
    recommendation: Recommendation,
    now: f64,
) {
    log::info!(
        "Oracle answered with {} ids",
        recommendation.recommended_app_ids.len()
    );
    sounds.play(SoundCue::Hover);
    let results = resolve_results(
        navigator.full(),
        &recommendation.recommended_app_ids,
        &search.filter,
    );
    search.message = Some(recommendation.reasoning);
    navigator.schedule_search(results, now);
}

// Create the camera controller when the tunnel scene (re)appears
fn mount_tunnel(model: &mut Model) {
    if !model.navigator.tunnel_mounted() || model.camera.is_some() {
        return;
    }
    let min_depth = model.layout.logo_depth(model.navigator.filtered().len());
    let params = model.config.camera.clone();
    model.camera = Some(if model.navigator.is_reversing() {
        CameraController::entering_in_reverse(params, min_depth)
    } else {
        CameraController::new(params, min_depth)
    });
    model.constellation = None;
    model.drag_last = None;
    log::debug!("Tunnel mounted, min depth {:.1}", min_depth);
}

fn update_min_depth(model: &mut Model) {
    let min_depth = model.layout.logo_depth(model.navigator.filtered().len());
    if let Some(camera) = model.camera.as_mut() {
        camera.set_min_depth(min_depth);
    }
}

fn relayout(model: &mut Model) {
    model.layout = TunnelLayout::new(&model.config.layout, model.settings.compact_layout);
    update_min_depth(model);
}

// Build the overlays, then apply what they asked for
fn apply_ui(model: &mut Model, now: f64) {
    let hud = HudState {
        mode: model.navigator.mode(),
        search_open: model.navigator.search_open(),
        selected: model.navigator.selected(),
        full: model.navigator.full(),
        filtered: model.navigator.filtered(),
        volume: model.sounds.volume(),
        muted: model.sounds.is_muted(),
        oracle_pending: model.oracle.is_pending(),
        oracle_handoff: model.navigator.handoff_pending(),
        debug_info: &model.debug_info,
    };
    let (actions, layout_changed, stars_changed) = ui::update_ui(
        &mut model.egui,
        &mut model.settings,
        &mut model.search,
        model.constellation.as_mut(),
        &mut model.config.camera,
        &hud,
    );

    if layout_changed {
        relayout(model);
    }
    if stars_changed {
        model.stars = generate_stars(model.settings.star_count, &mut rand::thread_rng());
    }

    let hovering = actions.contains(&UiAction::Hover);
    if hovering && !model.ui_hovering {
        model.sounds.play(SoundCue::Hover);
    }
    model.ui_hovering = hovering;

    for action in actions {
        match action {
            UiAction::CloseSearch => model.navigator.close_search(&mut model.sounds),
            UiAction::SubmitManual => {
                let results = model.search.filter.apply(model.navigator.full());
                model.navigator.submit_search(results, now, &mut model.sounds);
            }
            UiAction::SubmitOracle => {
                if model.navigator.handoff_pending() {
                    continue;
                }
                if model.oracle.submit(&model.search.query, model.navigator.full()) {
                    model.search.message = None;
                    model.sounds.play(SoundCue::Click);
                }
            }
            UiAction::ClosePanel => model.navigator.close_panel(&mut model.sounds),
            UiAction::BackToTunnel => model.navigator.back_to_tunnel(now, &mut model.sounds),
            UiAction::ToggleMute => {
                model.sounds.press_mute_button();
            }
            UiAction::SetVolume(volume) => model.sounds.set_volume(volume),
            UiAction::Hover => {}
        }
    }
}

fn update_debug_info(app: &App, model: &mut Model, update: &Update) {
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;
    model.debug_info.mode = model.navigator.mode();
    model.debug_info.pending_transitions = model.navigator.pending_transitions();
    if let Some(camera) = model.camera.as_ref() {
        model.debug_info.depth = camera.depth();
        model.debug_info.target_depth = camera.target();
        model.debug_info.lower_bound = camera.lower_bound();
        model.debug_info.fov = camera.fov();
        model.debug_info.speed = camera.speed();
    }
    if model.settings.show_debug {
        model.debug_info.visible_tiles = renderer::visible_tiles(model, app.window_rect()).len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Ambience, Playback, SoundSink};
    use crate::params::{AudioParams, LayoutParams, TimingParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Cues(Rc<RefCell<Vec<SoundCue>>>);

    impl SoundSink for Cues {
        fn play(&mut self, playback: &Playback) -> crate::error::Result<()> {
            self.0.borrow_mut().push(playback.cue());
            Ok(())
        }

        fn start_ambience(&mut self, _ambience: &Ambience) -> crate::error::Result<()> {
            Ok(())
        }

        fn stop_ambience(&mut self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn oracle_answer_chirps_and_schedules_once() {
        let catalog = Catalog::from_json(r#"[{"NAME": "Swapper"}, {"NAME": "Lender"}]"#).unwrap();
        let mut navigator =
            Navigator::new(catalog.entries, TimingParams::default(), LayoutParams::default());
        let cues = Rc::new(RefCell::new(Vec::new()));
        let mut sounds = SoundBoard::new(
            &AudioParams::default(),
            &TimingParams::default(),
            Box::new(Cues(Rc::clone(&cues))),
        );
        sounds.init();
        let mut search = SearchState::default();

        let answer = Recommendation {
            reasoning: "Lending markets.".to_string(),
            recommended_app_ids: vec!["Lender".to_string()],
            search_keywords: Vec::new(),
        };
        deliver_answer(&mut navigator, &mut sounds, &mut search, answer.clone(), 1.0);
        assert_eq!(*cues.borrow(), vec![SoundCue::Hover]);
        assert_eq!(search.message.as_deref(), Some("Lending markets."));
        assert!(navigator.handoff_pending());

        // A second answer during the hand-off is not queued behind the first
        deliver_answer(&mut navigator, &mut sounds, &mut search, answer, 1.5);
        assert_eq!(navigator.pending_transitions(), 1);
    }

    #[test]
    fn stars_fill_the_shell() {
        let mut rng = StdRng::seed_from_u64(3);
        let stars = generate_stars(500, &mut rng);
        assert_eq!(stars.len(), 500);
        for star in &stars {
            let r = star.length();
            assert!(r >= STAR_MIN_RADIUS - 1e-3 && r <= STAR_MAX_RADIUS + 1e-3);
        }
        assert!(generate_stars(0, &mut rng).is_empty());
    }
}
