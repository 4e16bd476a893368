/*
 * Constellation Module
 *
 * The void view shows the current search results as a constellation on a
 * sphere around the origin. Nodes are spread with a Fibonacci lattice so any
 * number of entries covers the sphere evenly. An orbit camera circles the
 * sphere, auto-rotating while the void's own text filter is empty.
 */

use std::f32::consts::{PI, TAU};

use nannou::prelude::*;

use crate::camera::Projection;
use crate::catalog::Dapp;
use crate::params::VoidParams;

// Evenly spread points on a sphere
pub fn fibonacci_sphere(count: usize, radius: f32) -> Vec<Vec3> {
    let n = count.max(1) as f32;
    let golden = PI * (1.0 + 5.0_f32.sqrt());
    (0..count)
        .map(|i| {
            let i = i as f32;
            let phi = (1.0 - 2.0 * (i + 0.5) / n).acos();
            let theta = golden * i;
            vec3(
                radius * theta.cos() * phi.sin(),
                radius * theta.sin() * phi.sin(),
                radius * phi.cos(),
            )
        })
        .collect()
}

// Case-insensitive match on name, project type, description or any tag
pub fn matches_query(dapp: &Dapp, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    dapp.name.to_lowercase().contains(&query)
        || dapp.project_type.to_lowercase().contains(&query)
        || dapp.description.to_lowercase().contains(&query)
        || dapp.tags.iter().any(|t| t.to_lowercase().contains(&query))
}

pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    params: VoidParams,
}

impl OrbitCamera {
    pub fn new(params: VoidParams) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: params.camera_distance,
            params,
        }
    }

    // Auto-rotate speed 1.0 is one turn per minute
    pub fn update(&mut self, dt: f32, auto_rotate: bool) {
        if auto_rotate {
            self.yaw += TAU / 60.0 * self.params.auto_rotate_speed * dt;
            self.yaw %= TAU;
        }
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance - amount)
            .clamp(self.params.min_distance, self.params.max_distance);
    }

    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw += delta.x;
        self.pitch = (self.pitch + delta.y).clamp(-1.4, 1.4);
    }

    pub fn world_to_view(&self, point: Vec3) -> Vec3 {
        // Turn the world instead of the eye
        let (sy, cy) = (-self.yaw).sin_cos();
        let x = point.x * cy + point.z * sy;
        let z = -point.x * sy + point.z * cy;
        let (sp, cp) = (-self.pitch).sin_cos();
        let y = point.y * cp - z * sp;
        let z = point.y * sp + z * cp;
        vec3(x, y, z - self.distance)
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self.params.fov)
    }
}

pub struct Constellation {
    pub positions: Vec<Vec3>,
    pub query: String,
    pub camera: OrbitCamera,
}

impl Constellation {
    pub fn new(entries: &[Dapp], params: VoidParams) -> Self {
        Self {
            positions: fibonacci_sphere(entries.len(), params.sphere_radius),
            query: String::new(),
            camera: OrbitCamera::new(params),
        }
    }

    pub fn update(&mut self, dt: f32) {
        let auto_rotate = self.query.trim().is_empty();
        self.camera.update(dt, auto_rotate);
    }

    /// Indices of the entries that pass the void's text filter.
    pub fn visible(&self, entries: &[Dapp]) -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, d)| matches_query(d, &self.query))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_matches(&self, entries: &[Dapp]) -> bool {
        entries.iter().any(|d| matches_query(d, &self.query))
    }
}
