//! Configuration for a particle field session.
//!
//! [`FieldConfig`] is plain JSON; every field has a default, so a config
//! file only needs the values it changes:
//!
//! ```json
//! { "particle_count": 50000, "morph_duration": 1.5, "seed": 7 }
//! ```

use crate::easing::Ease;
use crate::error::ConfigError;
use crate::idle::IdleMotion;
use crate::mesh::MAX_OCTAHEDRON_DETAIL;
use crate::shape::SamplerSettings;
use crate::text::TextOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper bound on particles per field.
pub const MAX_PARTICLES: usize = 1_000_000;

/// Complete field configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    /// Particles in the field. Fixed for the session.
    pub particle_count: usize,
    /// `[min, max]` point size.
    pub size_range: [f32; 2],
    /// Seconds per morph.
    pub morph_duration: f64,
    pub ease: Ease,
    /// Full width of the per-axis jitter on resampled meshes.
    pub jitter_amount: f32,
    pub idle_amplitude: f32,
    pub idle_phase_step: f32,
    pub idle_speed: f32,
    /// Seconds for the idle sway to fade in after a morph.
    pub idle_ramp: f32,
    /// Multiplier applied to theme colors before clamping.
    pub brightness: f32,
    /// Radius of the sphere the field starts as (and resets to).
    pub initial_radius: f32,
    /// Sphere used when a text request fails.
    pub fallback_radius: f32,
    pub cluster_count: usize,
    pub local_spread: f32,
    pub octahedron_detail: u32,
    /// Seconds to wait after the last name edit before morphing to it.
    pub name_debounce: f64,
    /// Seconds between entering the final step and its morph.
    pub final_delay: f64,
    /// RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub text: TextOptions,
}

impl Default for FieldConfig {
    fn default() -> Self {
        let sampler = SamplerSettings::default();
        let idle = IdleMotion::default();
        Self {
            particle_count: 10_000,
            size_range: [0.02, 0.08],
            morph_duration: 2.0,
            ease: Ease::InOutCubic,
            jitter_amount: sampler.jitter,
            idle_amplitude: idle.amplitude,
            idle_phase_step: idle.phase_step,
            idle_speed: idle.speed,
            idle_ramp: idle.ramp,
            brightness: 1.5,
            initial_radius: 8.0,
            fallback_radius: 5.0,
            cluster_count: sampler.cluster_count,
            local_spread: sampler.local_spread,
            octahedron_detail: sampler.octahedron_detail,
            name_debounce: 0.5,
            final_delay: 0.5,
            seed: None,
            text: sampler.text,
        }
    }
}

impl FieldConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: FieldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count > MAX_PARTICLES {
            return Err(ConfigError::invalid(
                "particle_count",
                format!("must be at most {MAX_PARTICLES}"),
            ));
        }
        let [lo, hi] = self.size_range;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
            return Err(ConfigError::invalid(
                "size_range",
                "must be finite with 0 < min <= max",
            ));
        }
        if !self.morph_duration.is_finite() || self.morph_duration < 0.0 {
            return Err(ConfigError::invalid("morph_duration", "must be finite and >= 0"));
        }

        let non_negative: [(&'static str, f32); 8] = [
            ("jitter_amount", self.jitter_amount),
            ("idle_amplitude", self.idle_amplitude),
            ("idle_ramp", self.idle_ramp),
            ("brightness", self.brightness),
            ("local_spread", self.local_spread),
            ("text.depth", self.text.depth),
            ("text.bevel_thickness", self.text.bevel_thickness),
            ("text.bevel_size", self.text.bevel_size),
        ];
        for (field, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::invalid(field, "must be finite and >= 0"));
            }
        }

        let positive: [(&'static str, f32); 4] = [
            ("initial_radius", self.initial_radius),
            ("fallback_radius", self.fallback_radius),
            ("text.size", self.text.size),
            ("text.edge_spacing", self.text.edge_spacing),
        ];
        for (field, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::invalid(field, "must be finite and > 0"));
            }
        }

        for (field, v) in [("idle_phase_step", self.idle_phase_step), ("idle_speed", self.idle_speed)] {
            if !v.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }
        if self.cluster_count == 0 || self.cluster_count > MAX_PARTICLES {
            return Err(ConfigError::invalid(
                "cluster_count",
                format!("must be in 1..={MAX_PARTICLES}"),
            ));
        }
        if self.octahedron_detail == 0 || self.octahedron_detail > MAX_OCTAHEDRON_DETAIL {
            return Err(ConfigError::invalid(
                "octahedron_detail",
                format!("must be in 1..={MAX_OCTAHEDRON_DETAIL}"),
            ));
        }
        if self.text.curve_segments == 0 {
            return Err(ConfigError::invalid("text.curve_segments", "must be at least 1"));
        }
        for (field, v) in [("name_debounce", self.name_debounce), ("final_delay", self.final_delay)] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::invalid(field, "must be finite and >= 0"));
            }
        }
        Ok(())
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            jitter: self.jitter_amount,
            cluster_count: self.cluster_count,
            local_spread: self.local_spread,
            octahedron_detail: self.octahedron_detail,
            text: self.text.clone(),
        }
    }

    pub fn idle_motion(&self) -> IdleMotion {
        IdleMotion {
            amplitude: self.idle_amplitude,
            phase_step: self.idle_phase_step,
            speed: self.idle_speed,
            ramp: self.idle_ramp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        FieldConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FieldConfig::from_json(r#"{ "particle_count": 500, "seed": 3 }"#).unwrap();
        assert_eq!(config.particle_count, 500);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.morph_duration, 2.0);
        assert_eq!(config.text.size, 4.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            r#"{ "particle_count": 2000000 }"#,
            r#"{ "size_range": [0.08, 0.02] }"#,
            r#"{ "morph_duration": -1.0 }"#,
            r#"{ "brightness": -0.5 }"#,
            r#"{ "cluster_count": 0 }"#,
            r#"{ "cluster_count": 1000001 }"#,
            r#"{ "octahedron_detail": 0 }"#,
            r#"{ "octahedron_detail": 70000 }"#,
            r#"{ "text": { "size": 0.0 } }"#,
        ];
        for json in cases {
            let err = FieldConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{json}: {err}");
        }
        assert!(matches!(
            FieldConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_upper_bounds_are_inclusive() {
        let config = FieldConfig {
            cluster_count: MAX_PARTICLES,
            octahedron_detail: MAX_OCTAHEDRON_DETAIL,
            ..FieldConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_save_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("cosmorph-config-{}.json", std::process::id()));
        let config = FieldConfig {
            particle_count: 1234,
            ease: Ease::OutExpo,
            seed: Some(99),
            ..FieldConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = FieldConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_derived_settings() {
        let config = FieldConfig {
            jitter_amount: 0.4,
            idle_amplitude: 0.1,
            ..FieldConfig::default()
        };
        assert_eq!(config.sampler_settings().jitter, 0.4);
        assert_eq!(config.idle_motion().amplitude, 0.1);
    }
}
