/*
 * Renderer Module
 *
 * This module draws the scene with nannou's 2D draw API. 3D points are
 * moved into camera space by the active camera (tunnel controller or void
 * orbit camera) and perspective-projected onto the window.
 *
 * Tunnel mode draws, back to front: the star field, the tunnel rings and
 * rails, the tiles, the logo at the end of the tunnel and the two time
 * travel buttons. Void mode draws the constellation.
 *
 * The same geometry is used for picking, so what is clicked is exactly
 * what is drawn.
 */

use std::f32::consts::{FRAC_PI_2, TAU};

use nannou::prelude::*;

use crate::app::Model;
use crate::camera::{CameraController, Projected, Projection};
use crate::catalog::TunnelLayout;
use crate::navigation::ViewMode;
use crate::ui;

pub const BACKGROUND: (u8, u8, u8) = (5, 0, 17);
pub const FOG_NEAR: f32 = 20.0;
pub const FOG_FAR: f32 = 150.0;

pub const TUNNEL_RADIUS: f32 = 15.0;
const TUNNEL_SEGMENTS: usize = 20;
const RING_SPACING: f32 = 10.0;
const TUNNEL_START: (u8, u8, u8) = (32, 0, 82);
const TUNNEL_END: (u8, u8, u8) = (76, 29, 149);

pub const TILE_SIZE: f32 = 3.4;
pub const PROXIMITY_RANGE: f32 = 25.0;
const BOB_AMPLITUDE: f32 = 0.3;

const LOGO_SIZE: f32 = 6.0;
const FORWARD_BUTTON_RADIUS: f32 = 0.8;
const NODE_RADIUS: f32 = 1.2;

// The return button only shows near the end of the tunnel
pub const RETURN_BUTTON_RANGE: f32 = 200.0;
const RETURN_BUTTON_SIZE: f32 = 56.0;

/// Something on screen that reacts to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Tile(usize),
    Logo,
    TimeTravel,
    ReturnButton,
    Node(usize),
}

pub fn forward_button_position() -> Vec3 {
    vec3(0.0, -2.5, -8.0)
}

// Each tile floats on its own phase
pub fn tile_world_position(layout: &TunnelLayout, index: usize, time: f32) -> Vec3 {
    let base = layout.tile_position(index);
    let phase = index as f32 * 2.399;
    base + vec3(0.0, (time * 2.0 + phase).sin() * BOB_AMPLITUDE, 0.0)
}

/// 0 when farther than the proximity range, 1 when touching the tile.
pub fn proximity_factor(distance: f32) -> f32 {
    if distance < PROXIMITY_RANGE {
        ((PROXIMITY_RANGE - distance) / PROXIMITY_RANGE).max(0.0)
    } else {
        0.0
    }
}

// Linear fog between FOG_NEAR and FOG_FAR
pub fn fog_alpha(distance: f32) -> f32 {
    1.0 - ((distance - FOG_NEAR) / (FOG_FAR - FOG_NEAR)).clamp(0.0, 1.0)
}

pub fn return_button_visible(camera_depth: f32, logo_depth: f32) -> bool {
    (camera_depth - logo_depth).abs() < RETURN_BUTTON_RANGE
}

// Screen rect of the HUD return button in the top-right corner
pub fn return_button_rect(window_rect: Rect, compact: bool) -> Rect {
    let padding = if compact { 35.0 } else { 85.0 };
    let size = if compact { RETURN_BUTTON_SIZE * 0.7 } else { RETURN_BUTTON_SIZE };
    Rect::from_x_y_w_h(
        window_rect.right() - padding,
        window_rect.top() - padding,
        size,
        size,
    )
}

fn with_alpha(color: Rgb<u8>, alpha: f32) -> Rgba {
    rgba(
        color.red as f32 / 255.0,
        color.green as f32 / 255.0,
        color.blue as f32 / 255.0,
        alpha,
    )
}

fn mix(a: (u8, u8, u8), b: (u8, u8, u8), t: f32, alpha: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let channel = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) / 255.0;
    rgba(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2), alpha)
}

// The view transform already carries the shake offset
fn project_through(camera: &CameraController, point: Vec3, window_rect: Rect) -> Option<Projected> {
    camera.projection().project(camera.world_to_view(point), window_rect)
}

fn project_tunnel(model: &Model, point: Vec3, window_rect: Rect) -> Option<Projected> {
    project_through(model.camera.as_ref()?, point, window_rect)
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let (r, g, b) = BACKGROUND;
    draw.background().color(rgb(r, g, b));

    let window_rect = app.window_rect();

    match model.navigator.mode() {
        ViewMode::Void => draw_constellation(&draw, model, window_rect),
        ViewMode::Tunnel | ViewMode::Warp => draw_tunnel_scene(&draw, model, window_rect),
    }

    if model.settings.show_debug {
        ui::draw_debug_info(&draw, &model.debug_info, window_rect);
    }

    if let Err(e) = draw.to_frame(app, &frame) {
        log::error!("Failed to draw frame: {:?}", e);
    }
    if let Err(e) = model.egui.draw_to_frame(&frame) {
        log::error!("Failed to draw UI: {:?}", e);
    }
}

fn draw_tunnel_scene(draw: &Draw, model: &Model, window_rect: Rect) {
    let Some(camera) = model.camera.as_ref() else {
        return;
    };

    if model.settings.show_stars {
        draw_stars(draw, model, window_rect);
    }
    draw_tunnel(draw, model, window_rect);
    draw_tiles(draw, model, window_rect);
    draw_logo(draw, model, window_rect);
    draw_forward_button(draw, model, window_rect);

    let logo_depth = model.layout.logo_depth(model.navigator.filtered().len());
    if return_button_visible(camera.depth(), logo_depth) {
        draw_return_button(draw, model, window_rect);
    }
}

// The star shell travels with the camera and slowly rolls
fn draw_stars(draw: &Draw, model: &Model, window_rect: Rect) {
    let Some(camera) = model.camera.as_ref() else {
        return;
    };
    let projection = camera.projection();
    let (sin, cos) = model.star_rotation.sin_cos();

    for star in &model.stars {
        let rolled = vec3(star.x * cos - star.y * sin, star.x * sin + star.y * cos, star.z);
        if let Some(p) = projection.project(rolled, window_rect) {
            let size = (p.scale * 0.2).clamp(0.5, 2.5);
            draw.ellipse()
                .xy(p.screen)
                .radius(size)
                .color(rgba(1.0, 1.0, 1.0, 0.8));
        }
    }
}

fn draw_tunnel(draw: &Draw, model: &Model, window_rect: Rect) {
    let Some(camera) = model.camera.as_ref() else {
        return;
    };
    let length = model.layout.tunnel_length(model.navigator.filtered().len());
    let depth = camera.depth();

    // Only the stretch between the near plane and the fog is visible
    let near_z = (depth - 1.0).min(0.0);
    let far_z = (depth - FOG_FAR).max(-length);
    if far_z >= near_z {
        return;
    }

    let first_ring = (-near_z / RING_SPACING).ceil() as i64;
    let last_ring = (-far_z / RING_SPACING).floor() as i64;
    for ring in first_ring..=last_ring {
        let z = -(ring as f32) * RING_SPACING;
        let alpha = fog_alpha(depth - z) * 0.8;
        let color = mix(TUNNEL_START, TUNNEL_END, -z / length, alpha);
        let points: Option<Vec<Point2>> = (0..=TUNNEL_SEGMENTS)
            .map(|i| {
                let angle = i as f32 / TUNNEL_SEGMENTS as f32 * TAU;
                let point = vec3(angle.cos() * TUNNEL_RADIUS, angle.sin() * TUNNEL_RADIUS, z);
                project_tunnel(model, point, window_rect).map(|p| p.screen)
            })
            .collect();
        if let Some(points) = points {
            draw.polyline().weight(1.5).points(points).color(color);
        }
    }

    // Rails along the tunnel wall
    for i in 0..TUNNEL_SEGMENTS {
        let angle = i as f32 / TUNNEL_SEGMENTS as f32 * TAU;
        let (x, y) = (angle.cos() * TUNNEL_RADIUS, angle.sin() * TUNNEL_RADIUS);
        let start = project_tunnel(model, vec3(x, y, near_z), window_rect);
        let end = project_tunnel(model, vec3(x, y, far_z), window_rect);
        if let (Some(start), Some(end)) = (start, end) {
            draw.line()
                .start(start.screen)
                .end(end.screen)
                .weight(1.0)
                .color(mix(TUNNEL_START, TUNNEL_END, 0.5, 0.6));
        }
    }
}

// Tiles visible from the camera, farthest first
pub fn visible_tiles(model: &Model, window_rect: Rect) -> Vec<(usize, Projected)> {
    let mut tiles: Vec<(usize, Projected)> = (0..model.navigator.filtered().len())
        .filter_map(|i| {
            let position = tile_world_position(&model.layout, i, model.time);
            project_tunnel(model, position, window_rect)
                .filter(|p| p.distance < FOG_FAR)
                .map(|p| (i, p))
        })
        .collect();
    tiles.sort_by(|a, b| b.1.distance.total_cmp(&a.1.distance));
    tiles
}

fn tile_screen_size(model: &Model, index: usize, projected: &Projected) -> f32 {
    let active = model.hovered == Some(HitTarget::Tile(index));
    let bonus = if active { 0.2 } else { proximity_factor(projected.distance) * 0.1 };
    TILE_SIZE * model.layout.tile_scale * (1.0 + bonus) * projected.scale
}

fn draw_tiles(draw: &Draw, model: &Model, window_rect: Rect) {
    let entries = model.navigator.filtered();
    for (index, projected) in visible_tiles(model, window_rect) {
        let dapp = &entries[index];
        let alpha = fog_alpha(projected.distance);
        let size = tile_screen_size(model, index, &projected);
        let rotation = model.layout.tile_angle(index) * 0.5;
        let active = model.hovered == Some(HitTarget::Tile(index));
        let glow = if active { 1.0 } else { 0.5 + proximity_factor(projected.distance) };

        // Glow behind the frame
        draw.rect()
            .xy(projected.screen)
            .w_h(size * 1.5, size * 1.5)
            .z_radians(rotation)
            .color(with_alpha(dapp.color, 0.1 * alpha * glow));
        // Frame
        draw.rect()
            .xy(projected.screen)
            .w_h(size, size)
            .z_radians(rotation)
            .color(rgba(0.1, 0.1, 0.1, alpha))
            .stroke(with_alpha(dapp.color, alpha * glow.min(1.0)))
            .stroke_weight((projected.scale * 0.1).max(1.0));

        if projected.distance < FOG_FAR * 0.6 {
            let font_size = (projected.scale * 0.5).clamp(8.0, 48.0) as u32;
            draw.text(&dapp.name)
                .xy(projected.screen - vec2(0.0, size * 0.7))
                .font_size(font_size)
                .w(size * 2.0)
                .color(rgba(1.0, 1.0, 1.0, alpha));
        }
    }
}

fn draw_logo(draw: &Draw, model: &Model, window_rect: Rect) {
    let depth = model.layout.logo_depth(model.navigator.filtered().len());
    let Some(projected) = project_tunnel(model, vec3(0.0, 0.0, depth), window_rect) else {
        return;
    };
    if projected.distance > FOG_FAR {
        return;
    }
    let size = LOGO_SIZE * projected.scale;
    let spin = model.time * 0.5;
    let hovered = model.hovered == Some(HitTarget::Logo);
    let alpha = fog_alpha(projected.distance).max(0.3);

    let diamond = (0..4).map(|i| {
        let angle = spin + i as f32 * FRAC_PI_2;
        projected.screen + vec2(angle.cos(), angle.sin()) * size * 0.5
    });
    draw.polygon()
        .points(diamond)
        .color(rgba(0.51, 0.43, 0.98, if hovered { alpha } else { alpha * 0.8 }));
    draw.text("SEARCH")
        .xy(projected.screen - vec2(0.0, size * 0.7))
        .font_size((projected.scale * 0.8).clamp(10.0, 64.0) as u32)
        .color(rgba(1.0, 1.0, 1.0, alpha));
}

fn draw_forward_button(draw: &Draw, model: &Model, window_rect: Rect) {
    let Some(projected) = project_tunnel(model, forward_button_position(), window_rect) else {
        return;
    };
    let radius = FORWARD_BUTTON_RADIUS * projected.scale;
    let hovered = model.hovered == Some(HitTarget::TimeTravel);
    draw.ellipse()
        .xy(projected.screen)
        .radius(radius)
        .color(rgba(0.0, 0.94, 1.0, if hovered { 0.4 } else { 0.15 }))
        .stroke(rgba(0.0, 0.94, 1.0, 0.9))
        .stroke_weight(2.0);
    draw.text(">>")
        .xy(projected.screen)
        .font_size((radius * 0.8).clamp(8.0, 48.0) as u32)
        .color(WHITE);
}

fn draw_return_button(draw: &Draw, model: &Model, window_rect: Rect) {
    let rect = return_button_rect(window_rect, model.settings.compact_layout);
    let hovered = model.hovered == Some(HitTarget::ReturnButton);
    draw.ellipse()
        .xy(rect.xy())
        .wh(rect.wh())
        .color(rgba(0.0, 0.94, 1.0, if hovered { 0.4 } else { 0.15 }))
        .stroke(rgba(0.0, 0.94, 1.0, 0.9))
        .stroke_weight(2.0);
    draw.text("<<")
        .xy(rect.xy())
        .font_size(18)
        .color(WHITE);
}

// Void nodes that pass the filter, with their projection, farthest first
pub fn visible_nodes(model: &Model, window_rect: Rect) -> Vec<(usize, Projected)> {
    let Some(constellation) = model.constellation.as_ref() else {
        return Vec::new();
    };
    let projection: Projection = constellation.camera.projection();
    let mut nodes: Vec<(usize, Projected)> = constellation
        .visible(model.navigator.filtered())
        .into_iter()
        .filter_map(|i| {
            let view = constellation.camera.world_to_view(constellation.positions[i]);
            projection.project(view, window_rect).map(|p| (i, p))
        })
        .collect();
    nodes.sort_by(|a, b| b.1.distance.total_cmp(&a.1.distance));
    nodes
}

fn draw_constellation(draw: &Draw, model: &Model, window_rect: Rect) {
    let entries = model.navigator.filtered();
    for (index, projected) in visible_nodes(model, window_rect) {
        let dapp = &entries[index];
        let hovered = model.hovered == Some(HitTarget::Node(index));
        let radius = NODE_RADIUS * projected.scale * if hovered { 1.3 } else { 1.0 };
        // Nodes on the far side of the sphere fade out
        let alpha = (1.0 - (projected.distance - 15.0) / 60.0).clamp(0.3, 1.0);

        draw.ellipse()
            .xy(projected.screen)
            .radius(radius * 1.8)
            .color(with_alpha(dapp.color, 0.15 * alpha));
        draw.ellipse()
            .xy(projected.screen)
            .radius(radius)
            .color(with_alpha(dapp.color, alpha));
        draw.text(&dapp.name)
            .xy(projected.screen - vec2(0.0, radius + 10.0))
            .font_size(12)
            .w(160.0)
            .color(rgba(1.0, 1.0, 1.0, alpha));
    }
}

// Find what is under the pointer, nearest first
pub fn pick(model: &Model, window_rect: Rect, position: Point2) -> Option<HitTarget> {
    match model.navigator.mode() {
        ViewMode::Void => {
            return visible_nodes(model, window_rect)
                .into_iter()
                .rev()
                .find(|(_, p)| p.screen.distance(position) <= NODE_RADIUS * p.scale)
                .map(|(i, _)| HitTarget::Node(i));
        }
        ViewMode::Warp => return None,
        ViewMode::Tunnel => {}
    }

    let camera = model.camera.as_ref()?;

    let logo_depth = model.layout.logo_depth(model.navigator.filtered().len());
    if return_button_visible(camera.depth(), logo_depth)
        && return_button_rect(window_rect, model.settings.compact_layout).contains(position)
    {
        return Some(HitTarget::ReturnButton);
    }

    if let Some(p) = project_tunnel(model, forward_button_position(), window_rect) {
        if p.screen.distance(position) <= FORWARD_BUTTON_RADIUS * p.scale {
            return Some(HitTarget::TimeTravel);
        }
    }

    let tile = visible_tiles(model, window_rect)
        .into_iter()
        .rev()
        .find(|(i, p)| {
            let half = tile_screen_size(model, *i, p) * 0.5;
            (p.screen.x - position.x).abs() <= half && (p.screen.y - position.y).abs() <= half
        })
        .map(|(i, _)| HitTarget::Tile(i));
    if tile.is_some() {
        return tile;
    }

    let p = project_tunnel(model, vec3(0.0, 0.0, logo_depth), window_rect)?;
    let inside = p.screen.distance(position) <= LOGO_SIZE * 0.5 * p.scale;
    (p.distance < FOG_FAR && inside).then_some(HitTarget::Logo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayoutParams;

    #[test]
    fn fog_fades_between_near_and_far() {
        assert_eq!(fog_alpha(5.0), 1.0);
        assert_eq!(fog_alpha(FOG_NEAR), 1.0);
        assert!((fog_alpha(85.0) - 0.5).abs() < 1e-6);
        assert_eq!(fog_alpha(FOG_FAR), 0.0);
        assert_eq!(fog_alpha(500.0), 0.0);
    }

    #[test]
    fn proximity_grows_as_camera_approaches() {
        assert_eq!(proximity_factor(30.0), 0.0);
        assert_eq!(proximity_factor(25.0), 0.0);
        assert!((proximity_factor(12.5) - 0.5).abs() < 1e-6);
        assert_eq!(proximity_factor(0.0), 1.0);
    }

    #[test]
    fn tiles_bob_around_their_slot() {
        let layout = TunnelLayout::new(&LayoutParams::default(), false);
        for t in [0.0, 0.4, 1.3, 7.9] {
            let p = tile_world_position(&layout, 3, t);
            let base = layout.tile_position(3);
            assert_eq!(p.x, base.x);
            assert_eq!(p.z, base.z);
            assert!((p.y - base.y).abs() <= BOB_AMPLITUDE + 1e-6);
        }
    }

    #[test]
    fn shake_offsets_the_view_once() {
        use crate::params::CameraParams;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut camera = CameraController::new(CameraParams::default(), -1000.0);
        camera.set_target(-500.0);
        camera.tick(1.0 / 60.0, &mut StdRng::seed_from_u64(11));
        let shake = camera.shake();
        assert_ne!(shake, Vec2::ZERO);

        // A point straight ahead of the shaken camera lands on the window center
        let rect = Rect::from_w_h(800.0, 600.0);
        let ahead = vec3(shake.x, shake.y, camera.depth() - 30.0);
        let projected = project_through(&camera, ahead, rect).unwrap();
        assert!(projected.screen.length() < 1e-3);

        let axis_point = vec3(0.0, 0.0, camera.depth() - 30.0);
        let on_axis = project_through(&camera, axis_point, rect).unwrap();
        let expected = -shake * projected.scale;
        assert!((on_axis.screen - expected).length() < 1e-3);
    }

    #[test]
    fn return_button_shows_near_the_logo() {
        assert!(!return_button_visible(0.0, -210.0));
        assert!(return_button_visible(-20.0, -210.0));
        assert!(return_button_visible(-210.0, -210.0));
    }

    #[test]
    fn return_button_sits_in_the_top_right_corner() {
        let window = Rect::from_w_h(1280.0, 720.0);
        let rect = return_button_rect(window, false);
        assert_eq!(rect.xy(), vec2(640.0 - 85.0, 360.0 - 85.0));
        let compact = return_button_rect(Rect::from_w_h(600.0, 900.0), true);
        assert_eq!(compact.xy(), vec2(300.0 - 35.0, 450.0 - 35.0));
        assert!(compact.w() < rect.w());
    }
}
