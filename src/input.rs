/*
 * Input Module
 *
 * This module handles window events. Scroll-like input (wheel, arrow keys,
 * touch drags) is converted to browser conventions and handed to the tunnel
 * camera controller; clicks are resolved against the rendered scene and
 * turned into navigation requests.
 *
 * Features:
 * - Wheel, arrow key and one-finger touch travel through the tunnel
 * - Hover and click on tiles, the logo and the time travel buttons
 * - Drag to rotate and wheel to zoom in the void
 * - Events over the egui overlays are left to egui
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};

use crate::app::Model;
use crate::audio::SoundCue;
use crate::camera::ScrollInput;
use crate::navigation::ViewMode;
use crate::renderer::{self, HitTarget};

const DRAG_ROTATE_SPEED: f32 = 0.005;
const VOID_ZOOM_SPEED: f32 = 0.02;

/// Browser-style wheel delta (positive scrolls forward) from a winit delta.
pub fn browser_wheel_delta(delta: MouseScrollDelta, line_pixels: f32) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * line_pixels,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    }
}

/// Browser-style touch delta (y-down pixels) between two y-up positions.
pub fn browser_touch_delta(last_y: f32, y: f32) -> f32 {
    -(y - last_y)
}

// Feed one scroll-like input to the camera, with its throttled sound
fn scroll(model: &mut Model, input: ScrollInput) {
    let Some(camera) = model.camera.as_mut() else {
        return;
    };
    if camera.apply_input(input) {
        model.sounds.play_scroll();
    }
}

// Mouse moved event handler
pub fn mouse_moved(app: &App, model: &mut Model, pos: Point2) {
    if let (Some(last), Some(constellation)) = (model.drag_last, model.constellation.as_mut()) {
        constellation.camera.rotate((pos - last) * DRAG_ROTATE_SPEED);
        model.drag_last = Some(pos);
    }
    model.mouse_position = pos;

    let hovered = if model.egui.ctx().is_pointer_over_area() {
        None
    } else {
        renderer::pick(model, app.window_rect(), pos)
    };
    if hovered.is_some() && hovered != model.hovered {
        model.sounds.play(SoundCue::Hover);
    }
    model.hovered = hovered;
}

// Mouse pressed event handler
pub fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    model.sounds.init();
    if button != MouseButton::Left || model.egui.ctx().is_pointer_over_area() {
        return;
    }

    let target = renderer::pick(model, app.window_rect(), model.mouse_position);
    match target {
        Some(HitTarget::Tile(index)) | Some(HitTarget::Node(index)) => {
            if let Some(dapp) = model.navigator.filtered().get(index).cloned() {
                model.navigator.select(dapp, &mut model.sounds);
            }
        }
        Some(HitTarget::Logo) => model.navigator.open_search(&mut model.sounds),
        Some(HitTarget::TimeTravel) => model.navigator.time_travel_to_oracle(&mut model.sounds),
        Some(HitTarget::ReturnButton) => model.navigator.return_to_start(&mut model.sounds),
        None => {
            if model.navigator.mode() == ViewMode::Void {
                model.drag_last = Some(model.mouse_position);
            }
        }
    }
}

// Mouse released event handler
pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.drag_last = None;
    }
}

// Mouse wheel event handler: travel in the tunnel, zoom in the void
pub fn mouse_wheel(_app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }
    let line_pixels = model.config.camera.line_delta_pixels;
    let delta_y = browser_wheel_delta(delta, line_pixels);

    if let Some(constellation) = model.constellation.as_mut() {
        constellation.camera.zoom(-delta_y * VOID_ZOOM_SPEED);
        return;
    }
    scroll(model, ScrollInput::Wheel { delta_y });
}

// Key pressed event handler
pub fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    model.sounds.init();
    if model.egui.ctx().wants_keyboard_input() {
        return;
    }
    match key {
        Key::Up => scroll(model, ScrollInput::KeyForward),
        Key::Down => scroll(model, ScrollInput::KeyBackward),
        Key::Escape => {
            if model.navigator.selected().is_some() {
                model.navigator.close_panel(&mut model.sounds);
            } else if model.navigator.search_open() {
                model.navigator.close_search(&mut model.sounds);
            }
        }
        _ => {}
    }
}

// Touch event handler: a single tracked finger drives the tunnel
pub fn touch(_app: &App, model: &mut Model, touch: TouchEvent) {
    match touch.phase {
        TouchPhase::Started => {
            if model.touch.is_none() {
                model.touch = Some((touch.id, touch.position.y));
            }
        }
        TouchPhase::Moved => {
            let Some((id, last_y)) = model.touch else {
                return;
            };
            if id != touch.id {
                return;
            }
            let delta_y = browser_touch_delta(last_y, touch.position.y);
            model.touch = Some((id, touch.position.y));
            scroll(model, ScrollInput::Touch { delta_y });
        }
        TouchPhase::Ended | TouchPhase::Cancelled => {
            if model.touch.map(|(id, _)| id) == Some(touch.id) {
                model.touch = None;
            }
        }
    }
}

// Handle raw window events for egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
