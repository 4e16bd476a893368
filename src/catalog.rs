/*
 * Catalog Module
 *
 * This module loads the ecosystem directory from its static JSON file and
 * maps each raw record into the display record used by the scenes and the
 * panels. It also owns the spiral tunnel layout, which decides where every
 * tile floats and therefore how deep the camera is allowed to travel.
 */

use std::path::Path;

use nannou::prelude::*;
use serde::Deserialize;

use crate::error::Result;
use crate::params::LayoutParams;

// Cyberpunk palette, assigned by position in the file
pub const PALETTE: [(u8, u8, u8); 6] = [
    (0x83, 0x3a, 0xb4),
    (0xfd, 0x1d, 0x1d),
    (0xfc, 0xb0, 0x45),
    (0x00, 0xf0, 0xff),
    (0x00, 0xff, 0x00),
    (0xff, 0x00, 0xaa),
];

pub fn palette_color(index: usize) -> Rgb<u8> {
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    rgb(r, g, b)
}

// Record as it appears in the data file
#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "INFO", default)]
    info: Option<String>,
    #[serde(rename = "LOGO", default)]
    logo: Option<String>,
    #[serde(rename = "BANNER", default)]
    banner: Option<String>,
    #[serde(rename = "WEB", default)]
    web: Option<String>,
    #[serde(rename = "X", default)]
    social: Option<String>,
    #[serde(rename = "TAGS", default)]
    tags: Option<String>,
    #[serde(rename = "PJ TYPE", default)]
    project_type: Option<String>,
    #[serde(rename = "ONLY on Monad", default)]
    exclusive: Option<serde_json::Value>,
}

// "Yes" or a JSON true marks an exclusive; anything else does not
fn is_exclusive(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::String(s)) => s == "Yes",
        Some(serde_json::Value::Bool(b)) => *b,
        _ => false,
    }
}

/// A catalog entry ready for display. The name doubles as the id.
#[derive(Debug, Clone, PartialEq)]
pub struct Dapp {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub website: Option<String>,
    pub social: Option<String>,
    pub tags: Vec<String>,
    pub project_type: String,
    pub exclusive: bool,
    pub color: Rgb<u8>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "NONE")
}

pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl Dapp {
    fn from_raw(raw: RawEntry, index: usize) -> Self {
        Self {
            id: raw.name.clone(),
            name: raw.name,
            description: raw.info.unwrap_or_default(),
            logo: non_empty(raw.logo),
            banner: non_empty(raw.banner),
            website: non_empty(raw.web),
            social: non_empty(raw.social),
            tags: raw.tags.as_deref().map(split_tags).unwrap_or_default(),
            project_type: raw.project_type.unwrap_or_default(),
            exclusive: is_exclusive(raw.exclusive.as_ref()),
            color: palette_color(index),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub entries: Vec<Dapp>,
}

impl Catalog {
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Vec<RawEntry> = serde_json::from_str(content)?;
        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(i, entry)| Dapp::from_raw(entry, i))
            .collect();
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load the catalog, degrading to an empty one on any failure.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(catalog) => {
                log::info!("Loaded {} catalog entries from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                log::error!("Failed to load ecosystem data from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Dapp> {
        self.entries.iter().find(|d| d.id == id)
    }
}

// Spiral placement of tiles along the tunnel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunnelLayout {
    pub z_spacing: f32,
    pub radius: f32,
    pub angle_step: f32,
    pub tile_scale: f32,
    pub first_tile_offset: f32,
    pub logo_offset: f32,
    pub min_tunnel_length: f32,
    pub tunnel_tail: f32,
}

impl TunnelLayout {
    pub fn new(params: &LayoutParams, compact: bool) -> Self {
        let (z_spacing, radius, angle_step, tile_scale) = if compact {
            (
                params.compact_z_spacing,
                params.compact_radius,
                params.compact_angle_step,
                params.compact_tile_scale,
            )
        } else {
            (params.z_spacing, params.radius, params.angle_step, params.tile_scale)
        };
        Self {
            z_spacing,
            radius,
            angle_step,
            tile_scale,
            first_tile_offset: params.first_tile_offset,
            logo_offset: params.logo_offset,
            min_tunnel_length: params.min_tunnel_length,
            tunnel_tail: params.tunnel_tail,
        }
    }

    pub fn tile_angle(&self, index: usize) -> f32 {
        index as f32 * self.angle_step
    }

    pub fn tile_position(&self, index: usize) -> Vec3 {
        let angle = self.tile_angle(index);
        vec3(
            angle.cos() * self.radius,
            angle.sin() * self.radius,
            -(index as f32) * self.z_spacing - self.first_tile_offset,
        )
    }

    // Depth of the logo placed after the last tile; the camera's lower limit
    pub fn logo_depth(&self, count: usize) -> f32 {
        -(count as f32 * self.z_spacing) - self.logo_offset
    }

    pub fn tunnel_length(&self, count: usize) -> f32 {
        self.min_tunnel_length
            .max(count as f32 * self.z_spacing + self.tunnel_tail)
    }
}
