/*
 * Monad Tunnel Showcase - Module Definitions
 *
 * This file defines the module structure of the ecosystem showcase: a
 * scrollable 3D tunnel of dapp tiles, warp transitions into a constellation
 * view, manual and AI-assisted search, and sound cues.
 */

// Re-export key components for easier access
pub use app::Model;
pub use audio::{SoundBoard, SoundCue};
pub use camera::{CameraController, ScrollInput, WarpState};
pub use catalog::{Catalog, Dapp, TunnelLayout};
pub use debug::DebugInfo;
pub use error::{Result, ShowcaseError};
pub use navigation::{Navigator, Transition, ViewMode};
pub use oracle::{OracleClient, Recommendation, RecommendationSource};
pub use params::{ShowcaseConfig, ViewSettings};

// Define modules
pub mod app;
pub mod audio;
pub mod camera;
pub mod catalog;
pub mod constellation;
pub mod debug;
pub mod error;
pub mod input;
pub mod navigation;
pub mod oracle;
pub mod params;
pub mod renderer;
pub mod search;
pub mod ui;

// Constants
pub const DEFAULT_CONFIG_PATH: &str = "showcase.toml";
