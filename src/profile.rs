//! Mapping from profile wizard state to target shapes.
//!
//! The host owns the wizard UI and hands the driver a [`ProfileInput`]
//! snapshot whenever something changes. This module decides what the field
//! should become for each step:
//!
//! | Step | Shape |
//! |------|-------|
//! | Welcome | sphere, radius 8 |
//! | Name | the name in capitals, or a sphere of radius 6 while empty |
//! | Colors | solid sphere, radius 4 |
//! | Symbol | the symbol's solid at radius 4, or a sphere of radius 5 |
//! | Final | torus (5, 1.5) after a short delay |

use crate::color::ColorTheme;
use crate::config::FieldConfig;
use crate::shape::{ShapeRequest, Solid};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Welcome,
    Name,
    Colors,
    Symbol,
    Final,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Welcome,
        WizardStep::Name,
        WizardStep::Colors,
        WizardStep::Symbol,
        WizardStep::Final,
    ];

    /// Step for a zero-based index, `None` past the end.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Personality symbols and the solid each one becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmicSymbol {
    Explorer,
    Dreamer,
    Warrior,
    Sage,
    Creator,
    Guardian,
}

impl CosmicSymbol {
    pub const ALL: [CosmicSymbol; 6] = [
        CosmicSymbol::Explorer,
        CosmicSymbol::Dreamer,
        CosmicSymbol::Warrior,
        CosmicSymbol::Sage,
        CosmicSymbol::Creator,
        CosmicSymbol::Guardian,
    ];

    pub fn id(self) -> &'static str {
        match self {
            CosmicSymbol::Explorer => "explorer",
            CosmicSymbol::Dreamer => "dreamer",
            CosmicSymbol::Warrior => "warrior",
            CosmicSymbol::Sage => "sage",
            CosmicSymbol::Creator => "creator",
            CosmicSymbol::Guardian => "guardian",
        }
    }

    /// The solid for this symbol at `radius`. Shapes without a radius
    /// (spaceship, stars) keep their default proportions.
    pub fn solid(self, radius: f32) -> Solid {
        match self {
            CosmicSymbol::Explorer => Solid::SPACESHIP,
            CosmicSymbol::Dreamer => Solid::STARS,
            CosmicSymbol::Warrior => Solid::Octahedron { radius },
            CosmicSymbol::Sage => Solid::Sphere { radius },
            CosmicSymbol::Creator => Solid::Torus { radius, tube: 2.0 },
            CosmicSymbol::Guardian => Solid::Ring { radius, tube: 0.6 },
        }
    }
}

impl FromStr for CosmicSymbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        CosmicSymbol::ALL
            .into_iter()
            .find(|c| c.id() == lower)
            .ok_or_else(|| format!("unknown symbol '{s}'"))
    }
}

/// Snapshot of the wizard state the field reacts to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub current_step: WizardStep,
    pub name: Option<String>,
    pub color_theme: Option<ColorTheme>,
    pub symbol: Option<CosmicSymbol>,
}

impl ProfileInput {
    /// The trimmed name, `None` when missing or blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// What the field should morph to, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePlan {
    pub request: ShapeRequest,
    /// Seconds to wait before issuing the request.
    pub delay: f64,
}

impl ShapePlan {
    fn now(request: ShapeRequest) -> Self {
        Self { request, delay: 0.0 }
    }
}

/// Target shape for the input's current step.
pub fn plan_for(input: &ProfileInput, config: &FieldConfig) -> ShapePlan {
    match input.current_step {
        WizardStep::Welcome => ShapePlan::now(ShapeRequest::Sphere { radius: 8.0 }),
        WizardStep::Name => ShapePlan::now(match input.display_name() {
            Some(name) => ShapeRequest::Text {
                content: name.to_uppercase(),
            },
            None => ShapeRequest::Sphere { radius: 6.0 },
        }),
        WizardStep::Colors => ShapePlan::now(ShapeRequest::Solid(Solid::Sphere { radius: 4.0 })),
        WizardStep::Symbol => ShapePlan::now(match input.symbol {
            Some(symbol) => ShapeRequest::Solid(symbol.solid(4.0)),
            None => ShapeRequest::Sphere { radius: 5.0 },
        }),
        WizardStep::Final => ShapePlan {
            request: ShapeRequest::Solid(Solid::Torus {
                radius: 5.0,
                tube: 1.5,
            }),
            delay: config.final_delay,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(step: WizardStep) -> ProfileInput {
        ProfileInput {
            current_step: step,
            ..ProfileInput::default()
        }
    }

    #[test]
    fn test_step_table() {
        let config = FieldConfig::default();
        assert_eq!(
            plan_for(&input(WizardStep::Welcome), &config).request,
            ShapeRequest::Sphere { radius: 8.0 }
        );
        assert_eq!(
            plan_for(&input(WizardStep::Name), &config).request,
            ShapeRequest::Sphere { radius: 6.0 }
        );
        assert_eq!(
            plan_for(&input(WizardStep::Colors), &config).request,
            ShapeRequest::Solid(Solid::Sphere { radius: 4.0 })
        );
        assert_eq!(
            plan_for(&input(WizardStep::Symbol), &config).request,
            ShapeRequest::Sphere { radius: 5.0 }
        );
        let last = plan_for(&input(WizardStep::Final), &config);
        assert_eq!(last.delay, 0.5);
        assert_eq!(
            last.request,
            ShapeRequest::Solid(Solid::Torus {
                radius: 5.0,
                tube: 1.5
            })
        );
    }

    #[test]
    fn test_name_is_trimmed_and_uppercased() {
        let mut i = input(WizardStep::Name);
        i.name = Some("  ada  ".into());
        assert_eq!(
            plan_for(&i, &FieldConfig::default()).request,
            ShapeRequest::Text {
                content: "ADA".into()
            }
        );
        i.name = Some("   ".into());
        assert_eq!(
            plan_for(&i, &FieldConfig::default()).request,
            ShapeRequest::Sphere { radius: 6.0 }
        );
    }

    #[test]
    fn test_symbol_solids() {
        assert_eq!(CosmicSymbol::Warrior.solid(4.0), Solid::Octahedron { radius: 4.0 });
        assert_eq!(CosmicSymbol::Dreamer.solid(4.0), Solid::STARS);
        assert_eq!(
            CosmicSymbol::Guardian.solid(4.0),
            Solid::Ring {
                radius: 4.0,
                tube: 0.6
            }
        );
        for symbol in CosmicSymbol::ALL {
            assert_eq!(symbol.id().parse::<CosmicSymbol>().unwrap(), symbol);
        }
        assert_eq!("SAGE".parse::<CosmicSymbol>().unwrap(), CosmicSymbol::Sage);
    }

    #[test]
    fn test_input_json() {
        let json = r##"{
            "current_step": "symbol",
            "name": "Nova",
            "symbol": "creator",
            "color_theme": {
                "id": "x", "name": "X",
                "primary": "#000000", "secondary": "#ffffff", "accent": "#ff0000"
            }
        }"##;
        let input: ProfileInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.current_step, WizardStep::Symbol);
        assert_eq!(input.symbol, Some(CosmicSymbol::Creator));
        assert!(input.color_theme.is_some());
        assert_eq!(WizardStep::from_index(4), Some(WizardStep::Final));
        assert_eq!(WizardStep::from_index(5), None);
    }
}
