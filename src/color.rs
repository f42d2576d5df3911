//! Color themes and per-particle color assignment.
//!
//! Each particle gets one of the theme's colors picked at random, so the
//! field reads as a speckle of distinct hues rather than a blend.
//! Particles are first assigned a reference color, which is then scaled
//! by `brightness` and clamped to `[0, 1]` per channel:
//!
//! | Draw `t ~ U(0,1)` | Reference color |
//! |-------------------|-----------------|
//! | `t < 0.3` | primary |
//! | `0.3 <= t < 0.7` | accent |
//! | `t >= 0.7` | particle (secondary if the theme has none) |

use crate::buffer::ColorBuffer;
use crate::error::ThemeError;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An RGB color, channels in `[0, 1]`. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub Vec3);

impl Rgb {
    pub const WHITE: Rgb = Rgb(Vec3::ONE);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb(Vec3::new(r, g, b))
    }

    /// Color from 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Rgb(Vec3::new(r as f32, g as f32, b as f32) / 255.0)
    }

    /// Scale by `factor` and clamp each channel to `[0, 1]`.
    #[inline]
    pub fn brightened(self, factor: f32) -> Vec3 {
        (self.0 * factor).clamp(Vec3::ZERO, Vec3::ONE)
    }

    pub fn to_hex(self) -> String {
        let c = (self.0.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        format!("#{:02x}{:02x}{:02x}", c.x as u8, c.y as u8, c.z as u8)
    }
}

impl FromStr for Rgb {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ThemeError::BadHex(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(bad)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        Ok(Rgb::from_u8(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ThemeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

/// A named set of colors for the particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorTheme {
    pub id: String,
    pub name: String,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particle: Option<Rgb>,
}

impl ColorTheme {
    /// Reference color for a uniform draw `t`.
    #[inline]
    pub fn pick(&self, t: f32) -> Rgb {
        if t < 0.3 {
            self.primary
        } else if t < 0.7 {
            self.accent
        } else {
            self.particle.unwrap_or(self.secondary)
        }
    }

    /// The reference colors particles can be assigned.
    pub fn reference_colors(&self) -> [Rgb; 3] {
        [self.primary, self.accent, self.particle.unwrap_or(self.secondary)]
    }
}

/// Built-in themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    NebulaPurple,
    CosmicBlue,
    SolarFlare,
    AuroraGreen,
    GalaxyPink,
    StellarGold,
}

impl ThemePreset {
    pub const ALL: [ThemePreset; 6] = [
        ThemePreset::NebulaPurple,
        ThemePreset::CosmicBlue,
        ThemePreset::SolarFlare,
        ThemePreset::AuroraGreen,
        ThemePreset::GalaxyPink,
        ThemePreset::StellarGold,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ThemePreset::NebulaPurple => "nebula_purple",
            ThemePreset::CosmicBlue => "cosmic_blue",
            ThemePreset::SolarFlare => "solar_flare",
            ThemePreset::AuroraGreen => "aurora_green",
            ThemePreset::GalaxyPink => "galaxy_pink",
            ThemePreset::StellarGold => "stellar_gold",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThemePreset::NebulaPurple => "Nebula Purple",
            ThemePreset::CosmicBlue => "Cosmic Blue",
            ThemePreset::SolarFlare => "Solar Flare",
            ThemePreset::AuroraGreen => "Aurora Green",
            ThemePreset::GalaxyPink => "Galaxy Pink",
            ThemePreset::StellarGold => "Stellar Gold",
        }
    }

    /// `[primary, secondary, accent, particle]`
    fn rgb(self) -> [(u8, u8, u8); 4] {
        match self {
            ThemePreset::NebulaPurple => [
                (0x72, 0x09, 0xb7),
                (0x9d, 0x4e, 0xdd),
                (0xc7, 0x7d, 0xff),
                (0xe0, 0xaa, 0xff),
            ],
            ThemePreset::CosmicBlue => [
                (0x43, 0x61, 0xee),
                (0x48, 0x95, 0xef),
                (0x4c, 0xc9, 0xf0),
                (0x72, 0x09, 0xb7),
            ],
            ThemePreset::SolarFlare => [
                (0xff, 0x00, 0x6e),
                (0xfb, 0x56, 0x07),
                (0xff, 0xbe, 0x0b),
                (0xff, 0x00, 0x6e),
            ],
            ThemePreset::AuroraGreen => [
                (0x06, 0xff, 0xa5),
                (0x00, 0xd9, 0xff),
                (0x43, 0x61, 0xee),
                (0x06, 0xff, 0xa5),
            ],
            ThemePreset::GalaxyPink => [
                (0xf7, 0x25, 0x85),
                (0xb5, 0x17, 0x9e),
                (0x72, 0x09, 0xb7),
                (0xf7, 0x25, 0x85),
            ],
            ThemePreset::StellarGold => [
                (0xff, 0xd6, 0x0a),
                (0xff, 0xc3, 0x00),
                (0xff, 0x9e, 0x00),
                (0xff, 0xd6, 0x0a),
            ],
        }
    }

    pub fn theme(self) -> ColorTheme {
        let [p, s, a, q] = self.rgb().map(|(r, g, b)| Rgb::from_u8(r, g, b));
        ColorTheme {
            id: self.id().to_string(),
            name: self.name().to_string(),
            primary: p,
            secondary: s,
            accent: a,
            particle: Some(q),
        }
    }
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemePreset::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| {
                format!(
                    "unknown theme '{s}', expected one of: {}",
                    ThemePreset::ALL.map(|p| p.id()).join(", ")
                )
            })
    }
}

/// Colors for `count` particles under `theme`.
pub fn apply_theme<R: Rng + ?Sized>(
    theme: &ColorTheme,
    count: usize,
    brightness: f32,
    rng: &mut R,
) -> ColorBuffer {
    let mut out = ColorBuffer::filled(count, Vec3::ZERO);
    apply_theme_into(theme, brightness, out.colors_mut(), rng);
    out
}

/// In-place variant of [`apply_theme`].
pub fn apply_theme_into<R: Rng + ?Sized>(
    theme: &ColorTheme,
    brightness: f32,
    colors: &mut [Vec3],
    rng: &mut R,
) {
    for c in colors.iter_mut() {
        *c = theme.pick(rng.gen()).brightened(brightness);
    }
}

/// Linear ramp from `a` (first particle) to `b` (last particle).
pub fn gradient_into(a: Rgb, b: Rgb, colors: &mut [Vec3]) {
    let last = colors.len().saturating_sub(1).max(1) as f32;
    for (i, c) in colors.iter_mut().enumerate() {
        *c = a.0.lerp(b.0, i as f32 / last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_hex_parse() {
        let c: Rgb = "#ff8000".parse().unwrap();
        assert_eq!(c, Rgb::new(1.0, 128.0 / 255.0, 0.0));
        assert_eq!(c.to_hex(), "#ff8000");
        assert!("ff8000".parse::<Rgb>().is_err());
        assert!("#ff80".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_theme_json() {
        let json = r##"{
            "id": "custom", "name": "Custom",
            "primary": "#ff0000", "secondary": "#00ff00", "accent": "#0000ff"
        }"##;
        let theme: ColorTheme = serde_json::from_str(json).unwrap();
        assert_eq!(theme.accent, Rgb::new(0.0, 0.0, 1.0));
        assert!(theme.particle.is_none());
        assert_eq!(theme.pick(0.9), theme.secondary);

        let back: ColorTheme = serde_json::from_str(&serde_json::to_string(&theme).unwrap()).unwrap();
        assert_eq!(back, theme);
    }

    #[test]
    fn test_colors_are_scaled_reference_colors() {
        let theme = ThemePreset::NebulaPurple.theme();
        let allowed = theme.reference_colors().map(|c| c.brightened(1.5));
        let colors = apply_theme(&theme, 4000, 1.5, &mut SmallRng::seed_from_u64(3));
        assert_eq!(colors.count(), 4000);
        for c in colors.colors() {
            assert!(allowed.contains(c), "{c:?} is not a theme color");
            assert!(c.max_element() <= 1.0 && c.min_element() >= 0.0);
        }
        // Every reference color shows up
        for a in allowed {
            assert!(colors.colors().contains(&a));
        }
    }

    #[test]
    fn test_selection_thresholds() {
        let theme = ThemePreset::CosmicBlue.theme();
        assert_eq!(theme.pick(0.0), theme.primary);
        assert_eq!(theme.pick(0.29), theme.primary);
        assert_eq!(theme.pick(0.3), theme.accent);
        assert_eq!(theme.pick(0.69), theme.accent);
        assert_eq!(theme.pick(0.7), theme.particle.unwrap());
    }

    #[test]
    fn test_presets() {
        for preset in ThemePreset::ALL {
            assert_eq!(preset.id().parse::<ThemePreset>().unwrap(), preset);
            assert!(preset.theme().particle.is_some());
        }
        assert_eq!(ThemePreset::SolarFlare.theme().primary.to_hex(), "#ff006e");
        assert!("plaid".parse::<ThemePreset>().is_err());
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut colors = vec![Vec3::ZERO; 5];
        gradient_into(Rgb::new(0.0, 0.0, 0.0), Rgb::WHITE, &mut colors);
        assert_eq!(colors[0], Vec3::ZERO);
        assert_eq!(colors[4], Vec3::ONE);
        assert_eq!(colors[2], Vec3::splat(0.5));
    }
}
