//! Tunable parameters for a [`crate::ParticleField`].
//!
//! Every field has a baseline default, so a YAML file only needs the keys it
//! wants to override:
//!
//! ```yaml
//! count: 6000
//! seed: 7
//! gravity_constant: 0.0002
//! chaos_multiplier: 3.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Lowest damping factor accepted by config and the runtime mutator.
pub const MIN_DRAG: f32 = 0.01;
/// Highest damping factor; drag stays strictly below 1 so speeds always decay.
pub const MAX_DRAG: f32 = 0.9999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub count: usize,
    pub seed: Option<u64>,

    pub gravity_constant: f32,
    pub chaos_multiplier: f32,
    pub drag: f32,
    pub max_velocity: f32,

    // wells
    pub field_radius: f32,
    pub min_distance: f32,
    pub merge_distance: f32,
    pub slingshot_radius: f32,
    pub slingshot_min_speed: f32,

    // drawn paths, `path_fade` is in the caller's clock units (ms)
    pub path_fade: f64,
    pub path_strength: f32,

    pub turbulence: f32,
    pub boundary_radius: f32,
    pub lifetime_step: f32,

    pub attract: bool,
    pub chaos: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 4000,
            seed: None,
            gravity_constant: 0.00015,
            chaos_multiplier: 2.5,
            drag: 0.995,
            max_velocity: 0.08,
            field_radius: 2.5,
            min_distance: 0.05,
            merge_distance: 0.5,
            slingshot_radius: 0.5,
            slingshot_min_speed: 0.01,
            path_fade: 8000.0,
            path_strength: 0.0005,
            turbulence: 0.0001,
            boundary_radius: 4.0,
            lifetime_step: 0.005,
            attract: true,
            chaos: false,
        }
    }
}

impl FieldConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, FieldError> {
        let config: FieldConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| FieldError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check the preconditions the engine relies on. Called by every constructor.
    pub fn validate(&self) -> Result<(), FieldError> {
        let finite = [
            ("gravity_constant", self.gravity_constant),
            ("chaos_multiplier", self.chaos_multiplier),
            ("drag", self.drag),
            ("max_velocity", self.max_velocity),
            ("field_radius", self.field_radius),
            ("min_distance", self.min_distance),
            ("merge_distance", self.merge_distance),
            ("slingshot_radius", self.slingshot_radius),
            ("slingshot_min_speed", self.slingshot_min_speed),
            ("path_strength", self.path_strength),
            ("turbulence", self.turbulence),
            ("boundary_radius", self.boundary_radius),
            ("lifetime_step", self.lifetime_step),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(name, value as f64, "must be finite"));
            }
        }
        if !self.path_fade.is_finite() || self.path_fade <= 0.0 {
            return Err(invalid("path_fade", self.path_fade, "must be positive"));
        }

        if !(MIN_DRAG..=MAX_DRAG).contains(&self.drag) {
            return Err(invalid("drag", self.drag as f64, "must lie in [0.01, 0.9999]"));
        }
        if self.slingshot_radius > self.field_radius {
            return Err(invalid(
                "slingshot_radius",
                self.slingshot_radius as f64,
                "must not exceed field_radius",
            ));
        }

        let positive = [
            ("max_velocity", self.max_velocity),
            ("field_radius", self.field_radius),
            ("min_distance", self.min_distance),
            ("boundary_radius", self.boundary_radius),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(invalid(name, value as f64, "must be positive"));
            }
        }

        let non_negative = [
            ("gravity_constant", self.gravity_constant),
            ("chaos_multiplier", self.chaos_multiplier),
            ("merge_distance", self.merge_distance),
            ("slingshot_radius", self.slingshot_radius),
            ("slingshot_min_speed", self.slingshot_min_speed),
            ("path_strength", self.path_strength),
            ("turbulence", self.turbulence),
            ("lifetime_step", self.lifetime_step),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(invalid(name, value as f64, "must not be negative"));
            }
        }

        Ok(())
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> FieldError {
    FieldError::InvalidParameter { name, value, reason }
}
