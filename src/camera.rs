/*
 * Camera Module
 *
 * This module defines the CameraController that drives the tunnel camera.
 * The camera only travels along the depth (Z) axis: user input moves a
 * target depth, and every frame the rendered depth is damped toward that
 * target. The controller also derives the field of view and a shake offset
 * from the distance left to travel, and handles the two warp transitions.
 *
 * It also provides the perspective projection used to turn 3D points into
 * screen coordinates for nannou's 2D draw API.
 */

use nannou::prelude::*;
use rand::Rng;

use crate::params::CameraParams;

/// Direction of an active warp. `None` on the controller means normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpState {
    Forward,
    Reverse,
}

/// A single user input event, already converted to browser conventions:
/// positive wheel deltas scroll forward, touch deltas are y-down pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollInput {
    Wheel { delta_y: f32 },
    KeyForward,
    KeyBackward,
    Touch { delta_y: f32 },
}

// Frame-rate independent exponential smoothing
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    current + (target - current) * (1.0 - (-lambda * dt).exp())
}

pub struct CameraController {
    params: CameraParams,
    min_depth: f32,
    depth: f32,
    target: f32,
    fov: f32,
    shake: Vec2,
    warp: Option<WarpState>,
}

impl CameraController {
    /// Controller for a fresh tunnel, starting at the entrance.
    pub fn new(params: CameraParams, min_depth: f32) -> Self {
        Self::starting_at(params, min_depth, 0.0)
    }

    /// Controller for a tunnel re-entered through a reverse warp, starting deep inside.
    pub fn entering_in_reverse(params: CameraParams, min_depth: f32) -> Self {
        let start = params.reverse_entry_depth;
        Self::starting_at(params, min_depth, start)
    }

    fn starting_at(params: CameraParams, min_depth: f32, start: f32) -> Self {
        let fov = params.normal_fov;
        Self {
            params,
            min_depth,
            depth: start,
            target: start,
            fov,
            shake: Vec2::ZERO,
            warp: None,
        }
    }

    /// Add one input event to the target depth. Inputs are ignored while
    /// warping. Returns true when the movement deserves a scroll sound.
    pub fn apply_input(&mut self, input: ScrollInput) -> bool {
        if self.warp.is_some() {
            return false;
        }

        match input {
            ScrollInput::Wheel { delta_y } => {
                self.target -= delta_y * self.params.wheel_sensitivity;
                delta_y.abs() > self.params.wheel_sound_threshold
            }
            ScrollInput::KeyForward => {
                self.target -= self.params.key_step;
                true
            }
            ScrollInput::KeyBackward => {
                self.target += self.params.key_step;
                true
            }
            ScrollInput::Touch { delta_y } => {
                self.target += delta_y * self.params.touch_sensitivity;
                delta_y.abs() > self.params.touch_sound_threshold
            }
        }
    }

    /// One-shot explicit target (time travel). Normal scroll logic keeps
    /// control afterwards; the next tick clamps it like any other target.
    pub fn set_target(&mut self, depth: f32) {
        log::debug!("Camera jump to z={:.1}", depth);
        self.target = depth;
    }

    pub fn set_warp(&mut self, warp: Option<WarpState>) {
        if self.warp != warp {
            log::debug!("Camera warp {:?} -> {:?}", self.warp, warp);
        }
        self.warp = warp;
    }

    pub fn set_min_depth(&mut self, min_depth: f32) {
        self.min_depth = min_depth;
    }

    // Advance one rendered frame
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        let dt = dt.max(0.0);

        match self.warp {
            Some(WarpState::Forward) => {
                self.target -= self.params.warp_forward_speed * dt;
            }
            Some(WarpState::Reverse) => {
                self.target = (self.target + self.params.warp_reverse_speed * dt).min(0.0);
            }
            None => {
                self.target = self.target.clamp(self.lower_bound(), 0.0);
            }
        }

        let lambda = if self.warp.is_some() {
            self.params.warp_damping
        } else {
            self.params.damping
        };
        self.depth = damp(self.depth, self.target, lambda, dt);

        let speed = self.speed();
        let warping = self.warp.is_some();

        // Field of view widens with speed
        let target_fov = if speed > self.params.fov_speed_threshold || warping {
            self.params.wide_fov
        } else {
            self.params.normal_fov
        };
        let t = (dt * self.params.fov_rate).min(1.0);
        self.fov += (target_fov - self.fov) * t;

        // Shake while moving
        if speed > self.params.shake_speed_threshold || warping {
            let intensity = if warping || speed > self.params.fov_speed_threshold {
                self.params.shake_heavy
            } else {
                self.params.shake_light
            };
            self.shake = vec2(
                (rng.gen::<f32>() - 0.5) * intensity,
                (rng.gen::<f32>() - 0.5) * intensity,
            );
        } else {
            self.shake = Vec2::ZERO;
        }
    }

    // Lowest target allowed in normal mode, never above the tunnel start
    pub fn lower_bound(&self) -> f32 {
        (self.min_depth + self.params.limit_buffer).min(0.0)
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn shake(&self) -> Vec2 {
        self.shake
    }

    pub fn speed(&self) -> f32 {
        (self.target - self.depth).abs()
    }

    pub fn warp(&self) -> Option<WarpState> {
        self.warp
    }

    pub fn min_depth(&self) -> f32 {
        self.min_depth
    }

    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut CameraParams {
        &mut self.params
    }

    /// Rendered camera position, shake included.
    pub fn position(&self) -> Vec3 {
        vec3(self.shake.x, self.shake.y, self.depth)
    }

    // Convert a world point into camera space (camera looks down -Z)
    pub fn world_to_view(&self, point: Vec3) -> Vec3 {
        point - self.position()
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self.fov)
    }
}

/// Result of projecting a point onto the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    // Pixels per world unit at the point's distance
    pub scale: f32,
    pub distance: f32,
}

/// Perspective projection for a camera at the origin looking down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(fov: f32) -> Self {
        Self { fov, near: 0.1, far: 1000.0 }
    }

    // Distance from the eye to the image plane in pixels
    pub fn focal_length(&self, window_rect: Rect) -> f32 {
        let half_fov = (self.fov.clamp(1.0, 179.0) * 0.5).to_radians();
        (window_rect.h() * 0.5) / half_fov.tan()
    }

    // Convert a camera-space point to screen space; None when clipped
    pub fn project(&self, view_point: Vec3, window_rect: Rect) -> Option<Projected> {
        let distance = -view_point.z;
        if distance <= self.near || distance > self.far {
            return None;
        }
        let scale = self.focal_length(window_rect) / distance;
        let screen = vec2(view_point.x, view_point.y) * scale + window_rect.xy();
        Some(Projected { screen, scale, distance })
    }
}
