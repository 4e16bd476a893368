/*
 * Audio Module
 *
 * Sound effects are fire-and-forget cues (hover, click, scroll, open, warp).
 * The SoundBoard is an explicitly constructed service owned by the model
 * and handed to whoever needs to trigger a cue. It owns the user's volume
 * and mute preference, throttles scroll cues, and expands each cue into a
 * procedural recipe that is passed to a pluggable sink.
 *
 * The board stays silent until the first user interaction. That first
 * interaction also starts a one-time background fetch of two recorded
 * assets: a looping ambience track and a warp cue. Until (or unless) the
 * warp asset arrives, the warp cue falls back to its procedural sweep.
 *
 * A failing sink or fetch only costs the sound: errors are logged and never
 * reach the camera or the view state.
 */

use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::params::{AudioParams, TimingParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Hover,
    Click,
    Scroll,
    Open,
    Warp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator of a cue: frequency sweep, optional low-pass sweep and a
/// gain envelope peaking at `peak_gain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub start_freq: f32,
    pub end_freq: f32,
    // Random offset added to the start frequency by the sink
    pub pitch_jitter: f32,
    pub lowpass: Option<(f32, f32)>,
    pub peak_gain: f32,
    pub duration: f32,
}

impl Voice {
    fn new(
        waveform: Waveform,
        start_freq: f32,
        end_freq: f32,
        peak_gain: f32,
        duration: f32,
    ) -> Self {
        Self {
            waveform,
            start_freq,
            end_freq,
            pitch_jitter: 0.0,
            lowpass: None,
            peak_gain,
            duration,
        }
    }

    fn with_lowpass(mut self, from: f32, to: f32) -> Self {
        self.lowpass = Some((from, to));
        self
    }

    fn with_jitter(mut self, jitter: f32) -> Self {
        self.pitch_jitter = jitter;
        self
    }
}

impl SoundCue {
    // Procedural recipe at full volume
    pub fn recipe(self) -> Vec<Voice> {
        match self {
            // High tech chirp
            SoundCue::Hover => {
                vec![Voice::new(Waveform::Sine, 800.0, 1600.0, 0.05, 0.05).with_jitter(200.0)]
            }
            // Low frequency thrum
            SoundCue::Scroll => vec![
                Voice::new(Waveform::Sawtooth, 60.0, 20.0, 0.8, 0.15).with_lowpass(150.0, 50.0),
            ],
            SoundCue::Click => vec![
                Voice::new(Waveform::Square, 150.0, 40.0, 0.15, 0.1),
                Voice::new(Waveform::Triangle, 2000.0, 2000.0, 0.05, 0.03),
            ],
            // Swish
            SoundCue::Open => vec![
                Voice::new(Waveform::Sawtooth, 100.0, 100.0, 0.1, 0.3).with_lowpass(200.0, 2000.0),
            ],
            SoundCue::Warp => vec![Voice::new(Waveform::Sawtooth, 100.0, 8000.0, 0.2, 2.0)],
        }
    }
}

/// Encoded audio fetched once from a URL. Decoding is up to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    pub url: String,
    pub bytes: Arc<Vec<u8>>,
}

/// A cue ready to be played, gains already scaled by the user volume.
#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    Procedural { cue: SoundCue, voices: Vec<Voice> },
    Recorded { cue: SoundCue, asset: AudioAsset, gain: f32 },
}

impl Playback {
    pub fn cue(&self) -> SoundCue {
        match self {
            Playback::Procedural { cue, .. } | Playback::Recorded { cue, .. } => *cue,
        }
    }

    pub fn voices(&self) -> &[Voice] {
        match self {
            Playback::Procedural { voices, .. } => voices,
            Playback::Recorded { .. } => &[],
        }
    }
}

/// Looping background track with a linear fade in.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambience {
    pub asset: AudioAsset,
    pub gain: f32,
    pub fade_in: f32,
}

pub trait SoundSink {
    fn play(&mut self, playback: &Playback) -> Result<()>;
    fn start_ambience(&mut self, ambience: &Ambience) -> Result<()>;
    fn stop_ambience(&mut self) -> Result<()>;
}

// Default sink: records cues in the log
pub struct LogSink;

impl SoundSink for LogSink {
    fn play(&mut self, playback: &Playback) -> Result<()> {
        match playback {
            Playback::Procedural { cue, voices } => {
                log::debug!("sound {:?} ({} voices)", cue, voices.len())
            }
            Playback::Recorded { cue, asset, gain } => {
                log::debug!("sound {:?} from {} at gain {:.2}", cue, asset.url, gain)
            }
        }
        Ok(())
    }

    fn start_ambience(&mut self, ambience: &Ambience) -> Result<()> {
        log::debug!("ambience {} started", ambience.asset.url);
        Ok(())
    }

    fn stop_ambience(&mut self) -> Result<()> {
        log::debug!("ambience stopped");
        Ok(())
    }
}

/// Where recorded assets come from.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<AudioAsset>;
}

pub struct HttpAssets {
    timeout: Duration,
}

impl HttpAssets {
    pub fn new(params: &AudioParams) -> Self {
        Self {
            timeout: Duration::from_secs(params.asset_timeout_secs),
        }
    }
}

impl AssetSource for HttpAssets {
    fn fetch(&self, url: &str) -> Result<AudioAsset> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let bytes = client.get(url).send()?.error_for_status()?.bytes()?;
        Ok(AudioAsset {
            url: url.to_string(),
            bytes: Arc::new(bytes.to_vec()),
        })
    }
}

#[derive(Debug, Default)]
struct LoadedAssets {
    ambience: Option<AudioAsset>,
    warp: Option<AudioAsset>,
}

fn fetch_optional(source: &dyn AssetSource, url: &str) -> Option<AudioAsset> {
    if url.is_empty() {
        return None;
    }
    match source.fetch(url) {
        Ok(asset) => {
            log::info!("Loaded audio {} ({} bytes)", url, asset.bytes.len());
            Some(asset)
        }
        Err(e) => {
            log::warn!("Failed to load audio {}: {}", url, e);
            None
        }
    }
}

pub struct SoundBoard {
    sink: Box<dyn SoundSink>,
    source: Option<Arc<dyn AssetSource>>,
    volume: f32,
    muted: bool,
    initialized: bool,
    scroll_interval: Duration,
    last_scroll: Option<Instant>,
    ambience_url: String,
    warp_url: String,
    ambience_gain: f32,
    ambience_fade_in: f32,
    warp_asset_gain: f32,
    loading: Option<mpsc::Receiver<LoadedAssets>>,
    ambience: Option<AudioAsset>,
    warp: Option<AudioAsset>,
    ambience_playing: bool,
}

impl SoundBoard {
    pub fn new(audio: &AudioParams, timing: &TimingParams, sink: Box<dyn SoundSink>) -> Self {
        Self {
            sink,
            source: None,
            volume: audio.volume.clamp(0.0, 1.0),
            muted: audio.muted,
            initialized: false,
            scroll_interval: Duration::from_millis(timing.scroll_sound_interval_ms),
            last_scroll: None,
            ambience_url: audio.ambience_url.clone(),
            warp_url: audio.warp_url.clone(),
            ambience_gain: audio.ambience_gain,
            ambience_fade_in: audio.ambience_fade_in_secs,
            warp_asset_gain: audio.warp_asset_gain,
            loading: None,
            ambience: None,
            warp: None,
            ambience_playing: false,
        }
    }

    /// Fetch the recorded assets from `source` once the board is initialized.
    pub fn with_assets(mut self, source: Arc<dyn AssetSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Enable sound on the first user interaction. Later calls do nothing.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        log::info!("Audio initialized");

        let Some(source) = self.source.clone() else {
            return;
        };
        let (tx, rx) = mpsc::channel();
        let ambience_url = self.ambience_url.clone();
        let warp_url = self.warp_url.clone();
        std::thread::spawn(move || {
            let loaded = LoadedAssets {
                ambience: fetch_optional(source.as_ref(), &ambience_url),
                warp: fetch_optional(source.as_ref(), &warp_url),
            };
            let _ = tx.send(loaded);
        });
        self.loading = Some(rx);
    }

    /// Pick up finished asset fetches. Call every frame; returns whether the
    /// fetch completed during this call.
    pub fn poll_assets(&mut self) -> bool {
        let Some(rx) = &self.loading else {
            return false;
        };
        let loaded = match rx.try_recv() {
            Ok(loaded) => loaded,
            Err(mpsc::TryRecvError::Empty) => return false,
            Err(mpsc::TryRecvError::Disconnected) => LoadedAssets::default(),
        };
        self.loading = None;
        self.ambience = loaded.ambience;
        self.warp = loaded.warp;
        if !self.muted {
            self.start_ambience();
        }
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn ambience_playing(&self) -> bool {
        self.ambience_playing
    }

    fn playback(&self, cue: SoundCue) -> Playback {
        if let (SoundCue::Warp, Some(asset)) = (cue, &self.warp) {
            return Playback::Recorded {
                cue,
                asset: asset.clone(),
                gain: self.warp_asset_gain * self.volume,
            };
        }
        let voices = cue
            .recipe()
            .into_iter()
            .map(|mut v| {
                v.peak_gain *= self.volume;
                v
            })
            .collect();
        Playback::Procedural { cue, voices }
    }

    /// Trigger a cue. Returns whether anything was sent to the sink.
    pub fn play(&mut self, cue: SoundCue) -> bool {
        if self.muted || !self.initialized {
            return false;
        }

        let playback = self.playback(cue);
        if let Err(e) = self.sink.play(&playback) {
            log::warn!("Sound {:?} failed: {}", cue, e);
            return false;
        }
        true
    }

    // Scroll cues are throttled so fast scrolling doesn't machine-gun
    pub fn play_scroll_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_scroll {
            if now.saturating_duration_since(last) <= self.scroll_interval {
                return false;
            }
        }
        if self.muted || !self.initialized {
            return false;
        }
        self.last_scroll = Some(now);
        self.play(SoundCue::Scroll)
    }

    pub fn play_scroll(&mut self) -> bool {
        self.play_scroll_at(Instant::now())
    }

    // Needs an initialized board and a loaded track; never doubles up
    fn start_ambience(&mut self) {
        if self.ambience_playing || !self.initialized {
            return;
        }
        let Some(asset) = self.ambience.clone() else {
            return;
        };
        let ambience = Ambience {
            asset,
            gain: self.ambience_gain * self.volume,
            fade_in: self.ambience_fade_in,
        };
        match self.sink.start_ambience(&ambience) {
            Ok(()) => self.ambience_playing = true,
            Err(e) => log::warn!("Ambience failed to start: {}", e),
        }
    }

    fn stop_ambience(&mut self) {
        if !self.ambience_playing {
            return;
        }
        if let Err(e) = self.sink.stop_ambience() {
            log::warn!("Ambience failed to stop: {}", e);
        }
        self.ambience_playing = false;
    }

    /// Set the volume from the slider; moving it above zero unmutes.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.muted && self.volume > 0.0 {
            self.toggle_mute();
        }
    }

    /// Flip the mute flag and return the new value. Unmuting restarts the
    /// ambience loop.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.stop_ambience();
        } else {
            self.start_ambience();
        }
        self.muted
    }

    /// The speaker button: counts as an interaction, and confirms an
    /// unmute with a click. Returns the new mute flag.
    pub fn press_mute_button(&mut self) -> bool {
        self.init();
        let muted = self.toggle_mute();
        if !muted {
            self.play(SoundCue::Click);
        }
        muted
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShowcaseError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Played(Playback),
        AmbienceStarted(f32),
        AmbienceStopped,
    }

    struct Recording(Rc<RefCell<Vec<Event>>>);

    impl SoundSink for Recording {
        fn play(&mut self, playback: &Playback) -> Result<()> {
            self.0.borrow_mut().push(Event::Played(playback.clone()));
            Ok(())
        }

        fn start_ambience(&mut self, ambience: &Ambience) -> Result<()> {
            self.0.borrow_mut().push(Event::AmbienceStarted(ambience.gain));
            Ok(())
        }

        fn stop_ambience(&mut self) -> Result<()> {
            self.0.borrow_mut().push(Event::AmbienceStopped);
            Ok(())
        }
    }

    struct Broken;

    impl SoundSink for Broken {
        fn play(&mut self, _playback: &Playback) -> Result<()> {
            Err(ShowcaseError::Audio("no device".to_string()))
        }

        fn start_ambience(&mut self, _ambience: &Ambience) -> Result<()> {
            Err(ShowcaseError::Audio("no device".to_string()))
        }

        fn stop_ambience(&mut self) -> Result<()> {
            Err(ShowcaseError::Audio("no device".to_string()))
        }
    }

    // Serves every URL except those containing "missing"
    struct FakeAssets;

    impl AssetSource for FakeAssets {
        fn fetch(&self, url: &str) -> Result<AudioAsset> {
            if url.contains("missing") {
                return Err(ShowcaseError::Audio(format!("404 for {}", url)));
            }
            Ok(AudioAsset {
                url: url.to_string(),
                bytes: Arc::new(vec![1, 2, 3]),
            })
        }
    }

    fn board() -> (SoundBoard, Rc<RefCell<Vec<Event>>>) {
        let played = Rc::new(RefCell::new(Vec::new()));
        let mut board = SoundBoard::new(
            &AudioParams::default(),
            &TimingParams::default(),
            Box::new(Recording(Rc::clone(&played))),
        );
        board.init();
        (board, played)
    }

    fn board_with_assets(audio: AudioParams) -> (SoundBoard, Rc<RefCell<Vec<Event>>>) {
        let played = Rc::new(RefCell::new(Vec::new()));
        let board = SoundBoard::new(
            &audio,
            &TimingParams::default(),
            Box::new(Recording(Rc::clone(&played))),
        )
        .with_assets(Arc::new(FakeAssets));
        (board, played)
    }

    fn wait_for_assets(board: &mut SoundBoard) {
        let start = Instant::now();
        while !board.poll_assets() {
            assert!(start.elapsed() < Duration::from_secs(5), "assets never arrived");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn voices(event: &Event) -> Vec<Voice> {
        match event {
            Event::Played(playback) => playback.voices().to_vec(),
            other => panic!("expected a cue, got {:?}", other),
        }
    }

    #[test]
    fn gains_scale_with_volume() {
        let (mut board, played) = board();
        assert!(board.play(SoundCue::Scroll));
        let voice = voices(&played.borrow()[0])[0];
        assert!((voice.peak_gain - 0.4).abs() < 1e-6);
        assert_eq!(voice.lowpass, Some((150.0, 50.0)));
    }

    #[test]
    fn silent_until_first_interaction() {
        let played = Rc::new(RefCell::new(Vec::new()));
        let mut board = SoundBoard::new(
            &AudioParams::default(),
            &TimingParams::default(),
            Box::new(Recording(Rc::clone(&played))),
        );
        assert!(!board.play(SoundCue::Click));
        assert!(!board.play_scroll());
        board.init();
        board.init();
        assert!(board.is_initialized());
        assert!(board.play(SoundCue::Click));
        assert_eq!(played.borrow().len(), 1);
    }

    #[test]
    fn muted_board_is_silent() {
        let (mut board, played) = board();
        assert!(board.toggle_mute());
        assert!(!board.play(SoundCue::Click));
        assert!(!board.play_scroll());
        assert!(played.borrow().is_empty());
        assert!(!board.toggle_mute());
        assert!(board.play(SoundCue::Click));
        assert_eq!(voices(&played.borrow()[0]).len(), 2);
    }

    #[test]
    fn scroll_is_throttled() {
        let (mut board, played) = board();
        let start = Instant::now();
        assert!(board.play_scroll_at(start));
        assert!(!board.play_scroll_at(start + Duration::from_millis(100)));
        assert!(!board.play_scroll_at(start + Duration::from_millis(150)));
        assert!(board.play_scroll_at(start + Duration::from_millis(151)));
        assert_eq!(played.borrow().len(), 2);
    }

    #[test]
    fn volume_is_clamped_and_unmutes() {
        let (mut board, _) = board();
        board.set_volume(1.7);
        assert_eq!(board.volume(), 1.0);
        board.toggle_mute();
        board.set_volume(0.0);
        assert!(board.is_muted());
        board.set_volume(0.3);
        assert!(!board.is_muted());
        board.set_volume(-1.0);
        assert_eq!(board.volume(), 0.0);
    }

    #[test]
    fn broken_sink_is_swallowed() {
        let mut board = SoundBoard::new(
            &AudioParams::default(),
            &TimingParams::default(),
            Box::new(Broken),
        )
        .with_assets(Arc::new(FakeAssets));
        board.init();
        assert!(!board.play(SoundCue::Warp));
        wait_for_assets(&mut board);
        assert!(!board.ambience_playing());
        assert!(board.toggle_mute());
        assert!(!board.toggle_mute());
        assert!(!board.ambience_playing());
    }

    #[test]
    fn warp_recipe_sweeps_up() {
        let voices = SoundCue::Warp.recipe();
        assert_eq!(voices.len(), 1);
        assert!(voices[0].end_freq > voices[0].start_freq);
        assert_eq!(voices[0].duration, 2.0);
    }

    #[test]
    fn ambience_starts_once_assets_arrive() {
        let (mut board, played) = board_with_assets(AudioParams::default());
        assert!(!board.poll_assets());
        board.init();
        assert!(board.is_loading());
        wait_for_assets(&mut board);

        assert!(board.ambience_playing());
        assert_eq!(*played.borrow(), vec![Event::AmbienceStarted(0.15)]);

        // A late init or poll never starts a second loop
        board.init();
        assert!(!board.poll_assets());
        assert_eq!(played.borrow().len(), 1);
    }

    #[test]
    fn unmute_restarts_ambience() {
        let (mut board, played) = board_with_assets(AudioParams::default());
        board.init();
        wait_for_assets(&mut board);

        assert!(board.toggle_mute());
        assert!(!board.ambience_playing());
        assert!(!board.toggle_mute());
        assert!(board.ambience_playing());
        assert_eq!(
            *played.borrow(),
            vec![
                Event::AmbienceStarted(0.15),
                Event::AmbienceStopped,
                Event::AmbienceStarted(0.15),
            ]
        );

        // The slider unmutes through the same path
        board.toggle_mute();
        board.set_volume(1.0);
        assert!(board.ambience_playing());
        assert_eq!(played.borrow().last(), Some(&Event::AmbienceStarted(0.3)));
    }

    #[test]
    fn mute_button_clicks_only_on_unmute() {
        let played = Rc::new(RefCell::new(Vec::new()));
        let mut board = SoundBoard::new(
            &AudioParams::default(),
            &TimingParams::default(),
            Box::new(Recording(Rc::clone(&played))),
        );
        assert!(board.press_mute_button());
        assert!(board.is_initialized());
        assert!(played.borrow().is_empty());

        assert!(!board.press_mute_button());
        let events = played.borrow();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Played(playback) => assert_eq!(playback.cue(), SoundCue::Click),
            other => panic!("expected a click, got {:?}", other),
        }
    }

    #[test]
    fn muted_board_waits_for_unmute_to_start_ambience() {
        let audio = AudioParams {
            muted: true,
            ..AudioParams::default()
        };
        let (mut board, played) = board_with_assets(audio);
        board.init();
        wait_for_assets(&mut board);
        assert!(!board.ambience_playing());
        assert!(played.borrow().is_empty());

        board.toggle_mute();
        assert!(board.ambience_playing());
    }

    #[test]
    fn warp_uses_the_recorded_asset_when_loaded() {
        let (mut board, played) = board_with_assets(AudioParams::default());
        board.init();
        // Before the fetch lands the procedural sweep stands in
        assert!(board.play(SoundCue::Warp));
        wait_for_assets(&mut board);
        assert!(board.play(SoundCue::Warp));

        let events = played.borrow();
        let warps: Vec<&Playback> = events
            .iter()
            .filter_map(|e| match e {
                Event::Played(p) if p.cue() == SoundCue::Warp => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(warps.len(), 2);
        assert_eq!(warps[0].voices().len(), 1);
        match warps[1] {
            Playback::Recorded { asset, gain, .. } => {
                assert!(asset.url.ends_with("enter-the-portal.mp3"));
                assert!((gain - 0.45).abs() < 1e-6);
            }
            other => panic!("expected the recorded warp, got {:?}", other),
        }
    }

    #[test]
    fn failed_fetch_falls_back_to_procedural_and_no_ambience() {
        let audio = AudioParams {
            ambience_url: "https://host/missing-loop.mp3".to_string(),
            warp_url: "https://host/missing-warp.mp3".to_string(),
            ..AudioParams::default()
        };
        let (mut board, played) = board_with_assets(audio);
        board.init();
        wait_for_assets(&mut board);
        assert!(!board.ambience_playing());

        assert!(board.play(SoundCue::Warp));
        assert_eq!(played.borrow().len(), 1);
        assert_eq!(voices(&played.borrow()[0]).len(), 1);
    }

    #[test]
    fn empty_urls_skip_the_fetch_entirely() {
        let audio = AudioParams {
            ambience_url: String::new(),
            warp_url: String::new(),
            ..AudioParams::default()
        };
        let (mut board, _) = board_with_assets(audio);
        board.init();
        wait_for_assets(&mut board);
        assert!(!board.ambience_playing());
    }
}
