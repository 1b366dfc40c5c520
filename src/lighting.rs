//! Five-light rig: front key, ambient fill, red and blue rims, and an overhead
//! spot.

use std::f32::consts::PI;

use glam::Vec3;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_PRESET, LIGHT_BLUE_POSITION, LIGHT_COLOR_BLUE, LIGHT_COLOR_RED, LIGHT_COLOR_WHITE,
    LIGHT_MAIN_POSITION, LIGHT_RED_POSITION, LIGHT_SPOT_POSITION, SPOT_ANGLE, SPOT_PENUMBRA,
};
use crate::math::{calculate_light_intensity, hex_to_linear, smoothstep};
use crate::scene::{Material, MaterialKind};

/// Names of the individually adjustable lights, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightName {
    Main,
    Ambient,
    Red,
    Blue,
    Spotlight,
}

impl LightName {
    pub const ALL: [LightName; 5] = [
        LightName::Main,
        LightName::Ambient,
        LightName::Red,
        LightName::Blue,
        LightName::Spotlight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LightName::Main => "main",
            LightName::Ambient => "ambient",
            LightName::Red => "red",
            LightName::Blue => "blue",
            LightName::Spotlight => "spotlight",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == name)
    }

    /// Slider step used by the UI for this light.
    pub fn step(self) -> f32 {
        match self {
            LightName::Ambient => 0.05,
            _ => 0.5,
        }
    }

    /// Decimal places shown for this light's intensity.
    pub fn decimals(self) -> usize {
        match self {
            LightName::Ambient => 2,
            _ => 1,
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&l| l == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Intensity of every light in the rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightIntensities {
    pub main: f32,
    pub ambient: f32,
    pub red: f32,
    pub blue: f32,
    pub spotlight: f32,
}

impl LightIntensities {
    pub const fn new(main: f32, ambient: f32, red: f32, blue: f32, spotlight: f32) -> Self {
        Self {
            main,
            ambient,
            red,
            blue,
            spotlight,
        }
    }

    pub fn get(&self, light: LightName) -> f32 {
        match light {
            LightName::Main => self.main,
            LightName::Ambient => self.ambient,
            LightName::Red => self.red,
            LightName::Blue => self.blue,
            LightName::Spotlight => self.spotlight,
        }
    }

    fn get_mut(&mut self, light: LightName) -> &mut f32 {
        match light {
            LightName::Main => &mut self.main,
            LightName::Ambient => &mut self.ambient,
            LightName::Red => &mut self.red,
            LightName::Blue => &mut self.blue,
            LightName::Spotlight => &mut self.spotlight,
        }
    }
}

/// Built-in presets, in the order the UI offers them.
pub fn default_presets() -> IndexMap<String, LightIntensities> {
    let mut presets = IndexMap::new();
    presets.insert("studio".to_string(), LightIntensities::new(12.0, 0.3, 4.0, 4.0, 8.0));
    presets.insert("dramatic".to_string(), LightIntensities::new(15.0, 0.05, 8.0, 2.0, 12.0));
    presets.insert("natural".to_string(), LightIntensities::new(8.0, 0.6, 2.0, 2.0, 4.0));
    presets.insert("minimal".to_string(), LightIntensities::new(10.0, 0.2, 0.0, 0.0, 0.0));
    presets.insert(DEFAULT_PRESET.to_string(), LightIntensities::new(10.0, 0.1, 10.0, 10.0, 3.0));
    presets
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Linear RGB
    pub color: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub angle: f32,
    pub penumbra: f32,
}

impl SpotLight {
    /// Cone attenuation for a surface point, 1 inside the inner cone.
    pub fn cone_factor(&self, position: Vec3) -> f32 {
        let axis = (self.position - self.target).normalize_or_zero();
        let to_light = (self.position - position).normalize_or_zero();
        let cos_outer = self.angle.cos();
        let cos_inner = (self.angle * (1.0 - self.penumbra)).cos();
        smoothstep(cos_outer, cos_inner, to_light.dot(axis))
    }
}

pub struct LightingManager {
    main: PointLight,
    ambient_color: Vec3,
    red: PointLight,
    blue: PointLight,
    spotlight: SpotLight,
    intensities: LightIntensities,
    presets: IndexMap<String, LightIntensities>,
}

impl LightingManager {
    /// Builds the rig and applies the `default` preset (or zeros if the
    /// preset table has none).
    pub fn new(presets: IndexMap<String, LightIntensities>) -> Self {
        let white = hex_to_linear(LIGHT_COLOR_WHITE);
        let intensities = presets
            .get(DEFAULT_PRESET)
            .copied()
            .unwrap_or(LightIntensities::new(0.0, 0.0, 0.0, 0.0, 0.0));

        Self {
            main: PointLight {
                position: Vec3::from(LIGHT_MAIN_POSITION),
                color: white,
            },
            ambient_color: white,
            red: PointLight {
                position: Vec3::from(LIGHT_RED_POSITION),
                color: hex_to_linear(LIGHT_COLOR_RED),
            },
            blue: PointLight {
                position: Vec3::from(LIGHT_BLUE_POSITION),
                color: hex_to_linear(LIGHT_COLOR_BLUE),
            },
            spotlight: SpotLight {
                position: Vec3::from(LIGHT_SPOT_POSITION),
                target: Vec3::ZERO,
                color: white,
                angle: SPOT_ANGLE,
                penumbra: SPOT_PENUMBRA,
            },
            intensities,
            presets,
        }
    }

    /// Applies a named preset. Unknown names are ignored.
    pub fn set_preset(&mut self, name: &str) -> bool {
        match self.presets.get(name) {
            Some(preset) => {
                debug!("Applying lighting preset {}", name);
                self.intensities = *preset;
                true
            }
            None => {
                warn!("Unknown lighting preset {}", name);
                false
            }
        }
    }

    pub fn set_intensity(&mut self, light: LightName, intensity: f32) {
        *self.intensities.get_mut(light) = intensity;
    }

    /// Sets a light by name. Unknown names are ignored.
    pub fn set_intensity_by_name(&mut self, name: &str, intensity: f32) -> bool {
        match LightName::parse(name) {
            Some(light) => {
                self.set_intensity(light, intensity);
                true
            }
            None => false,
        }
    }

    pub fn intensities(&self) -> LightIntensities {
        self.intensities
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Outgoing linear radiance of a surface point under the rig.
    pub fn shade(&self, position: Vec3, normal: Vec3, material: &Material) -> Vec3 {
        let base = material.base_color();
        if material.kind == MaterialKind::Basic {
            return base;
        }

        let i = &self.intensities;
        let mut irradiance = self.ambient_color * i.ambient;

        for (light, intensity) in [(&self.main, i.main), (&self.red, i.red), (&self.blue, i.blue)] {
            if intensity > 0.0 {
                let lambert = calculate_light_intensity(normal, position, light.position);
                irradiance += light.color * intensity * lambert;
            }
        }

        if i.spotlight > 0.0 {
            let spot = &self.spotlight;
            let lambert = calculate_light_intensity(normal, position, spot.position);
            irradiance += spot.color * i.spotlight * lambert * spot.cone_factor(position);
        }

        let metalness = match material.kind {
            MaterialKind::Standard | MaterialKind::Physical => material.metalness.clamp(0.0, 1.0),
            _ => 0.0,
        };
        let diffuse = base * (1.0 - metalness);
        diffuse * irradiance / PI
    }
}
