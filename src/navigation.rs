/*
 * Navigation Module
 *
 * The Navigator owns the application's view mode (tunnel, warp, void), the
 * currently displayed subset of the catalog, the overlays that are open and
 * the timer-driven transitions between modes. The camera controller never
 * changes mode by itself; it reads its warp state from here every frame.
 *
 * Scheduled transitions fire in due order from `advance`. They cannot be
 * cancelled once scheduled.
 */

use crate::audio::{SoundBoard, SoundCue};
use crate::camera::WarpState;
use crate::catalog::Dapp;
use crate::params::{LayoutParams, TimingParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Tunnel,
    Warp,
    Void,
}

/// Transitions reported by `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnterVoid,
    SettleTunnel,
    DeliverSearch,
}

#[derive(Debug, Clone)]
enum Action {
    EnterVoid,
    SettleTunnel,
    DeliverSearch(Vec<Dapp>),
}

#[derive(Debug, Clone)]
struct Scheduled {
    due: f64,
    action: Action,
}

fn millis(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

pub struct Navigator {
    mode: ViewMode,
    reversing: bool,
    show_search: bool,
    selected: Option<Dapp>,
    full: Vec<Dapp>,
    filtered: Vec<Dapp>,
    // Bumped whenever `filtered` is replaced
    revision: u64,
    camera_jump: Option<f32>,
    schedule: Vec<Scheduled>,
    timing: TimingParams,
    layout: LayoutParams,
}

impl Navigator {
    pub fn new(entries: Vec<Dapp>, timing: TimingParams, layout: LayoutParams) -> Self {
        Self {
            mode: ViewMode::Tunnel,
            reversing: false,
            show_search: false,
            selected: None,
            filtered: entries.clone(),
            full: entries,
            revision: 0,
            camera_jump: None,
            schedule: Vec::new(),
            timing,
            layout,
        }
    }

    fn set_filtered(&mut self, entries: Vec<Dapp>) {
        self.filtered = entries;
        self.revision += 1;
    }

    fn schedule(&mut self, due: f64, action: Action) {
        self.schedule.push(Scheduled { due, action });
    }

    pub fn open_search(&mut self, sounds: &mut SoundBoard) {
        sounds.play(SoundCue::Click);
        self.show_search = true;
    }

    pub fn close_search(&mut self, sounds: &mut SoundBoard) {
        sounds.play(SoundCue::Click);
        self.show_search = false;
    }

    /// Show `results` and warp forward into the void.
    pub fn submit_search(&mut self, results: Vec<Dapp>, now: f64, sounds: &mut SoundBoard) {
        log::info!("Search submitted with {} results, warping", results.len());
        self.set_filtered(results);
        self.show_search = false;
        self.mode = ViewMode::Warp;
        sounds.play(SoundCue::Warp);
        self.schedule(now + millis(self.timing.warp_to_void_ms), Action::EnterVoid);
    }

    /// Submit oracle results after the hand-off delay, leaving time to read
    /// the reasoning. Only one hand-off may be waiting; returns whether
    /// this one was scheduled.
    pub fn schedule_search(&mut self, results: Vec<Dapp>, now: f64) -> bool {
        if self.handoff_pending() {
            log::warn!("Oracle hand-off already pending, dropping {} results", results.len());
            return false;
        }
        self.schedule(now + millis(self.timing.oracle_handoff_ms), Action::DeliverSearch(results));
        true
    }

    // An oracle answer is waiting to be delivered
    pub fn handoff_pending(&self) -> bool {
        self.schedule
            .iter()
            .any(|s| matches!(s.action, Action::DeliverSearch(_)))
    }

    /// Warp back from the void through the full tunnel.
    pub fn back_to_tunnel(&mut self, now: f64, sounds: &mut SoundBoard) {
        log::info!("Returning to tunnel");
        self.reversing = true;
        self.mode = ViewMode::Warp;
        sounds.play(SoundCue::Warp);
        let full = self.full.clone();
        self.set_filtered(full);
        self.camera_jump = Some(0.0);
        self.schedule(now + millis(self.timing.reverse_warp_ms), Action::SettleTunnel);
    }

    /// Jump the camera to just before the oracle logo at the tunnel's end.
    pub fn time_travel_to_oracle(&mut self, sounds: &mut SoundBoard) {
        self.camera_jump = Some(self.oracle_depth());
        sounds.play(SoundCue::Warp);
    }

    pub fn return_to_start(&mut self, sounds: &mut SoundBoard) {
        self.camera_jump = Some(0.0);
        sounds.play(SoundCue::Warp);
    }

    pub fn oracle_depth(&self) -> f32 {
        let logo =
            -(self.full.len() as f32 * self.layout.z_spacing) - self.layout.oracle_logo_offset;
        logo + self.layout.oracle_stop_buffer
    }

    pub fn select(&mut self, dapp: Dapp, sounds: &mut SoundBoard) {
        sounds.play(SoundCue::Click);
        self.selected = Some(dapp);
    }

    pub fn close_panel(&mut self, sounds: &mut SoundBoard) {
        sounds.play(SoundCue::Click);
        self.selected = None;
    }

    /// Fire every transition due at `now`, earliest first. Transitions
    /// scheduled by a fired one are considered too.
    pub fn advance(&mut self, now: f64, sounds: &mut SoundBoard) -> Vec<Transition> {
        let mut fired = Vec::new();

        loop {
            let next = self
                .schedule
                .iter()
                .enumerate()
                .filter(|(_, s)| s.due <= now)
                .min_by(|(ia, a), (ib, b)| a.due.total_cmp(&b.due).then(ia.cmp(ib)))
                .map(|(i, _)| i);
            let Some(index) = next else { break };
            let Scheduled { due, action } = self.schedule.remove(index);

            match action {
                Action::EnterVoid => {
                    self.mode = ViewMode::Void;
                    fired.push(Transition::EnterVoid);
                }
                Action::SettleTunnel => {
                    self.mode = ViewMode::Tunnel;
                    self.reversing = false;
                    self.camera_jump = Some(0.0);
                    fired.push(Transition::SettleTunnel);
                }
                Action::DeliverSearch(results) => {
                    self.submit_search(results, due, sounds);
                    fired.push(Transition::DeliverSearch);
                }
            }
            log::debug!("Transition fired at {:.2}s, mode {:?}", due, self.mode);
        }

        fired
    }

    /// One-shot hand-off of an explicit camera target.
    pub fn take_camera_jump(&mut self) -> Option<f32> {
        self.camera_jump.take()
    }

    pub fn warp_state(&self) -> Option<WarpState> {
        match (self.mode, self.reversing) {
            (ViewMode::Warp, true) => Some(WarpState::Reverse),
            (ViewMode::Warp, false) => Some(WarpState::Forward),
            _ => None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_reversing(&self) -> bool {
        self.reversing
    }

    // The tunnel scene is mounted in every mode except the void
    pub fn tunnel_mounted(&self) -> bool {
        self.mode != ViewMode::Void
    }

    pub fn search_open(&self) -> bool {
        self.show_search
    }

    pub fn selected(&self) -> Option<&Dapp> {
        self.selected.as_ref()
    }

    pub fn full(&self) -> &[Dapp] {
        &self.full
    }

    pub fn filtered(&self) -> &[Dapp] {
        &self.filtered
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pending_transitions(&self) -> usize {
        self.schedule.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogSink;
    use crate::catalog::Catalog;
    use crate::params::AudioParams;

    fn sounds() -> SoundBoard {
        SoundBoard::new(&AudioParams::default(), &TimingParams::default(), Box::new(LogSink))
    }

    fn navigator(count: usize) -> Navigator {
        let json: Vec<String> = (0..count).map(|i| format!("{{\"NAME\": \"dapp{i}\"}}")).collect();
        let catalog = Catalog::from_json(&format!("[{}]", json.join(","))).unwrap();
        Navigator::new(catalog.entries, TimingParams::default(), LayoutParams::default())
    }

    #[test]
    fn search_warps_then_enters_void() {
        let mut nav = navigator(5);
        let mut sounds = sounds();
        nav.open_search(&mut sounds);
        assert!(nav.search_open());

        let results = nav.full()[..2].to_vec();
        nav.submit_search(results, 10.0, &mut sounds);
        assert!(!nav.search_open());
        assert_eq!(nav.mode(), ViewMode::Warp);
        assert_eq!(nav.warp_state(), Some(WarpState::Forward));
        assert_eq!(nav.filtered().len(), 2);

        assert!(nav.advance(11.9, &mut sounds).is_empty());
        assert_eq!(nav.advance(12.0, &mut sounds), vec![Transition::EnterVoid]);
        assert_eq!(nav.mode(), ViewMode::Void);
        assert!(!nav.tunnel_mounted());
        assert_eq!(nav.warp_state(), None);
    }

    #[test]
    fn back_to_tunnel_reverses_and_settles() {
        let mut nav = navigator(5);
        let mut sounds = sounds();
        nav.submit_search(Vec::new(), 0.0, &mut sounds);
        nav.advance(2.0, &mut sounds);

        let revision = nav.revision();
        nav.back_to_tunnel(3.0, &mut sounds);
        assert_eq!(nav.warp_state(), Some(WarpState::Reverse));
        assert!(nav.tunnel_mounted());
        assert_eq!(nav.filtered().len(), 5);
        assert!(nav.revision() > revision);
        assert_eq!(nav.take_camera_jump(), Some(0.0));
        assert_eq!(nav.take_camera_jump(), None);

        assert!(nav.advance(5.4, &mut sounds).is_empty());
        assert_eq!(nav.advance(5.5, &mut sounds), vec![Transition::SettleTunnel]);
        assert_eq!(nav.mode(), ViewMode::Tunnel);
        assert!(!nav.is_reversing());
        assert_eq!(nav.take_camera_jump(), Some(0.0));
    }

    #[test]
    fn oracle_handoff_chains_transitions() {
        let mut nav = navigator(3);
        let mut sounds = sounds();
        let results = nav.full()[..1].to_vec();
        assert!(nav.schedule_search(results, 1.0));
        assert_eq!(nav.mode(), ViewMode::Tunnel);
        assert!(nav.handoff_pending());

        let fired = nav.advance(10.0, &mut sounds);
        assert_eq!(fired, vec![Transition::DeliverSearch, Transition::EnterVoid]);
        assert_eq!(nav.mode(), ViewMode::Void);
        assert_eq!(nav.filtered().len(), 1);
        assert_eq!(nav.pending_transitions(), 0);
        assert!(!nav.handoff_pending());
    }

    #[test]
    fn second_handoff_is_refused_until_the_first_fires() {
        let mut nav = navigator(4);
        let mut sounds = sounds();
        let first = nav.full()[..1].to_vec();
        let second = nav.full()[..3].to_vec();
        assert!(nav.schedule_search(first, 1.0));
        assert!(!nav.schedule_search(second.clone(), 1.5));
        assert_eq!(nav.pending_transitions(), 1);

        // Reach the void, then make sure nothing bounces it back into a warp
        nav.advance(3.0, &mut sounds);
        nav.advance(5.0, &mut sounds);
        assert_eq!(nav.mode(), ViewMode::Void);
        assert_eq!(nav.filtered().len(), 1);
        assert_eq!(nav.pending_transitions(), 0);
        assert!(nav.advance(10.0, &mut sounds).is_empty());
        assert_eq!(nav.mode(), ViewMode::Void);

        // Once delivered, a new hand-off is accepted again
        assert!(nav.schedule_search(second, 10.0));
    }

    #[test]
    fn time_travel_targets_the_oracle() {
        let mut nav = navigator(10);
        let mut sounds = sounds();
        nav.time_travel_to_oracle(&mut sounds);
        assert_eq!(nav.take_camera_jump(), Some(-180.0));
        nav.return_to_start(&mut sounds);
        assert_eq!(nav.take_camera_jump(), Some(0.0));
    }

    #[test]
    fn selection_opens_and_closes_panel() {
        let mut nav = navigator(2);
        let mut sounds = sounds();
        let dapp = nav.full()[1].clone();
        nav.select(dapp, &mut sounds);
        assert_eq!(nav.selected().map(|d| d.id.as_str()), Some("dapp1"));
        nav.close_panel(&mut sounds);
        assert!(nav.selected().is_none());
    }

    #[test]
    fn scheduled_transitions_are_not_cancelled() {
        let mut nav = navigator(2);
        let mut sounds = sounds();
        nav.submit_search(Vec::new(), 0.0, &mut sounds);
        nav.back_to_tunnel(0.5, &mut sounds);
        assert_eq!(nav.pending_transitions(), 2);
        let fired = nav.advance(3.0, &mut sounds);
        assert_eq!(fired, vec![Transition::EnterVoid, Transition::SettleTunnel]);
        assert_eq!(nav.mode(), ViewMode::Tunnel);
    }
}
