/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that collects frame statistics
 * and the camera controller's state for the debug overlay.
 */

use std::time::Duration;

use crate::navigation::ViewMode;

// Debug information to display
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub depth: f32,
    pub target_depth: f32,
    pub lower_bound: f32,
    pub fov: f32,
    pub speed: f32,
    pub mode: ViewMode,
    pub visible_tiles: usize,
    pub pending_transitions: usize,
}

impl Default for DebugInfo {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time: Duration::ZERO,
            depth: 0.0,
            target_depth: 0.0,
            lower_bound: 0.0,
            fov: 0.0,
            speed: 0.0,
            mode: ViewMode::Tunnel,
            visible_tiles: 0,
            pending_transitions: 0,
        }
    }
}

impl DebugInfo {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("FPS: {:.1}", self.fps),
            format!("Frame time: {:.2} ms", self.frame_time.as_secs_f64() * 1000.0),
            format!("Mode: {:?}", self.mode),
            format!("Depth: {:.1} -> {:.1}", self.depth, self.target_depth),
            format!("Lower bound: {:.1}", self.lower_bound),
            format!("FOV: {:.1} / speed {:.1}", self.fov, self.speed),
            format!("Visible tiles: {}", self.visible_tiles),
            format!("Pending transitions: {}", self.pending_transitions),
        ]
    }
}
