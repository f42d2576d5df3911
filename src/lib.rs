//! # Cosmorph - morphing particle fields
//!
//! CPU-side animation for large point clouds that reshape themselves
//! between target forms: a ball, extruded text, parametric solids, a
//! clumpy star field.
//!
//! Cosmorph samples the shapes, runs eased transitions between them, adds
//! idle sway once the field settles, and keeps fixed-size position, color
//! and size buffers current every frame. Rendering is up to you: upload
//! the buffers however your pipeline likes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cosmorph::prelude::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let mut driver = AnimationDriver::new(FieldConfig {
//!         particle_count: 50_000,
//!         ..FieldConfig::default()
//!     })?;
//!     let mut clock = FrameClock::new();
//!
//!     driver.request_shape(ShapeRequest::Solid(Solid::TORUS), clock.elapsed());
//!     driver.apply_theme(&ThemePreset::SolarFlare.theme());
//!
//!     loop {
//!         driver.tick(clock.tick());
//!         queue.write_buffer(&positions, 0, driver.field().positions().as_bytes());
//!     }
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Shapes
//!
//! A [`ShapeRequest`] names a target form. Geometric shapes are sampled on
//! the spot; text needs a font and is sampled on a worker thread, so its
//! morph starts a few frames later.
//!
//! ### Morphs
//!
//! The [`MorphController`] interpolates every particle from what is on
//! screen to the new target over `morph_duration` seconds. A new request
//! mid-morph picks up from the current positions, so the field never
//! jumps.
//!
//! ### Wizard input
//!
//! Hosts that drive the field from a profile wizard pass a
//! [`ProfileInput`] snapshot to [`AnimationDriver::observe`] each frame;
//! the driver reacts only to what changed.
//!
//! ## Feature Overview
//!
//! | Category | Items |
//! |----------|-------|
//! | Shapes | [`ShapeRequest`], [`Solid`], [`ShapeSampler`] |
//! | Text | [`FontLibrary`], [`FontFetcher`], [`TextOptions`] |
//! | Color | [`ColorTheme`], [`ThemePreset`], [`apply_theme`] |
//! | Motion | [`MorphController`], [`IdleMotion`], [`Ease`] |
//! | Frame loop | [`AnimationDriver`], [`FrameClock`] |

pub mod buffer;
pub mod color;
pub mod config;
mod driver;
pub mod easing;
pub mod error;
pub mod font;
pub mod idle;
pub mod mesh;
pub mod morph;
pub mod profile;
pub mod shape;
mod task;
pub mod text;
pub mod time;

pub use bytemuck;
pub use glam::{Vec2, Vec3};

pub use buffer::{ColorBuffer, ParticleField, ParticleVertex, PositionBuffer, SizeBuffer};
pub use color::{apply_theme, apply_theme_into, gradient_into, ColorTheme, Rgb, ThemePreset};
pub use config::{FieldConfig, MAX_PARTICLES};
pub use driver::{AnimationDriver, FrameReport, EXPLODE_RADIUS, IMPLODE_RADIUS};
pub use easing::Ease;
pub use error::{ConfigError, FontError, SampleError, ThemeError};
pub use font::{FontFetcher, FontLibrary, FsFetcher, MemoryFetcher, TypefaceFont};
pub use idle::IdleMotion;
pub use mesh::{ReferenceMesh, MAX_OCTAHEDRON_DETAIL};
pub use morph::{interpolate, interpolate_into, MorphController, MorphFrame, MorphPhase};
pub use profile::{plan_for, CosmicSymbol, ProfileInput, ShapePlan, WizardStep};
pub use shape::{SamplerSettings, ShapeRequest, ShapeSampler, Solid};
pub use task::{RequestId, SampleTask};
pub use text::TextOptions;
pub use time::FrameClock;

/// Convenient re-exports for common usage.
///
/// This imports:
/// - [`AnimationDriver`] - the frame loop entry point
/// - [`FieldConfig`] - session configuration
/// - [`ShapeRequest`], [`Solid`] - target shapes
/// - [`ThemePreset`], [`ColorTheme`] - colors
/// - [`ProfileInput`], [`WizardStep`], [`CosmicSymbol`] - wizard input
/// - [`FrameClock`] - a frame timer
/// - [`Vec3`] - glam vector type
pub mod prelude {
    pub use crate::color::{ColorTheme, Rgb, ThemePreset};
    pub use crate::config::FieldConfig;
    pub use crate::driver::{AnimationDriver, FrameReport};
    pub use crate::easing::Ease;
    pub use crate::error::{ConfigError, FontError, SampleError};
    pub use crate::font::{FontFetcher, FontLibrary, FsFetcher};
    pub use crate::idle::IdleMotion;
    pub use crate::morph::{MorphController, MorphPhase};
    pub use crate::profile::{CosmicSymbol, ProfileInput, WizardStep};
    pub use crate::shape::{ShapeRequest, ShapeSampler, Solid};
    pub use crate::task::RequestId;
    pub use crate::time::FrameClock;
    pub use crate::Vec3;
}
