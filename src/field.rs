//! The particle population and the per-frame entry point.

use std::f32::consts::TAU;

use cgmath::prelude::*;
use cgmath::{Vector3, vec3};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{FieldConfig, MAX_DRAG, MIN_DRAG};
use crate::error::FieldError;
use crate::forces::{ForceAggregator, GravityWell, PathForce, PathPoint, WellForce, seed_turbulence};
use crate::impulse::Impulse;
use crate::integrator::{StepParams, advance_lifetimes, integrate};

/// A fixed-size population of point particles stored as flat parallel arrays.
///
/// Index `i` identifies the same particle for the lifetime of the field;
/// particles that leave the boundary are respawned in place, never removed.
pub struct ParticleField {
    config: FieldConfig,
    rng: StdRng,

    positions: Vec<Vector3<f32>>,
    velocities: Vec<Vector3<f32>>,
    masses: Vec<f32>,
    lifetimes: Vec<f32>,
    speeds: Vec<f32>,

    // scratch, reused every frame
    accelerations: Vec<Vector3<f32>>,

    gravity_constant: f32,
    drag: f32,
    attract: bool,
    chaos: bool,
}

impl ParticleField {
    /// Build a field from `config`, seeding the random source from
    /// `config.seed` or from OS entropy when no seed is set.
    pub fn new(config: FieldConfig) -> Result<Self, FieldError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Build a field that draws every random sample from `rng`.
    pub fn with_rng(config: FieldConfig, rng: StdRng) -> Result<Self, FieldError> {
        config.validate()?;
        let mut field = Self {
            gravity_constant: config.gravity_constant,
            drag: config.drag,
            attract: config.attract,
            chaos: config.chaos,
            config,
            rng,
            positions: Vec::new(),
            velocities: Vec::new(),
            masses: Vec::new(),
            lifetimes: Vec::new(),
            speeds: Vec::new(),
            accelerations: Vec::new(),
        };
        field.initialize(field.config.count);
        Ok(field)
    }

    /// Discard the current population and seed `count` fresh particles.
    pub fn initialize(&mut self, count: usize) {
        self.config.count = count;
        self.positions.clear();
        self.velocities.clear();
        self.masses.clear();
        self.lifetimes.clear();

        for _ in 0..count {
            let angle: f32 = self.rng.gen_range(0.0..TAU);
            let radius: f32 = self.rng.gen_range(0.0..1.5);
            self.positions
                .push(vec3(angle.cos() * radius, angle.sin() * radius * 0.8, 0.0));
            self.velocities.push(vec3(
                centered(&mut self.rng, 0.001),
                centered(&mut self.rng, 0.001),
                centered(&mut self.rng, 0.0002),
            ));
            self.masses.push(self.rng.gen_range(0.5f32..1.0));
            self.lifetimes.push(self.rng.gen_range(0.0f32..1.0));
        }

        self.accelerations = vec![Vector3::zero(); count];
        self.speeds = vec![0.0; count];
        self.refresh_speeds();
        debug!("initialized particle field with {count} particles");
    }

    /// Recycle particle `i` near the origin with a small planar velocity.
    fn respawn(&mut self, i: usize) {
        let angle: f32 = self.rng.gen_range(0.0..TAU);
        let radius: f32 = self.rng.gen_range(0.1..0.4);
        self.positions[i] = vec3(angle.cos() * radius, angle.sin() * radius, 0.0);
        self.velocities[i] = vec3(
            centered(&mut self.rng, 0.01),
            centered(&mut self.rng, 0.01),
            0.0,
        );
        self.lifetimes[i] = 0.0;
    }

    /// Run one simulation step.
    ///
    /// `dt` is the frame-duration multiplier (1.0 at the target frame rate)
    /// and is trusted as given. `now` is the caller's clock in the same units
    /// as the path point timestamps.
    pub fn advance(&mut self, wells: &[GravityWell], path: &[PathPoint], dt: f32, now: f64) {
        if self.chaos {
            seed_turbulence(&mut self.accelerations, &mut self.rng, self.config.turbulence);
        } else {
            self.accelerations.fill(Vector3::zero());
        }

        let mut forces = ForceAggregator::new();
        if !wells.is_empty() {
            forces = forces.with(WellForce::new(wells, self.effective_gravity(), self.attract, &self.config));
        }
        if !path.is_empty() {
            forces = forces.with(PathForce::new(path, now, &self.config));
        }
        forces.accumulate(&self.positions, &mut self.accelerations);

        let params = StepParams::new(dt, self.drag, &self.config);
        let escaped = integrate(&mut self.positions, &mut self.velocities, &self.accelerations, &params);
        for &i in &escaped {
            self.respawn(i);
        }
        if !escaped.is_empty() {
            trace!("respawned {} particles", escaped.len());
        }
        advance_lifetimes(&mut self.lifetimes, params.lifetime_step);

        self.refresh_speeds();
    }

    pub fn apply_explosion(&mut self, x: f32, y: f32, strength: f32) {
        self.apply_impulse(Impulse::Explosion, x, y, strength);
    }

    pub fn apply_implosion(&mut self, x: f32, y: f32, strength: f32) {
        self.apply_impulse(Impulse::Implosion, x, y, strength);
    }

    pub fn apply_impulse(&mut self, impulse: Impulse, x: f32, y: f32, strength: f32) {
        let hit = impulse.apply(&self.positions, &mut self.velocities, x, y, strength);
        trace!("{impulse:?} at ({x:.2}, {y:.2}) x{strength} hit {hit} particles");
        self.refresh_speeds();
    }

    pub fn set_chaos_mode(&mut self, enabled: bool) {
        if self.chaos != enabled {
            debug!("chaos mode {}", if enabled { "on" } else { "off" });
        }
        self.chaos = enabled;
    }

    pub fn set_attract_mode(&mut self, enabled: bool) {
        if self.attract != enabled {
            debug!("wells now {}", if enabled { "attract" } else { "repel" });
        }
        self.attract = enabled;
    }

    /// Set the per-frame damping factor, clamped into `[MIN_DRAG, MAX_DRAG]`.
    pub fn set_drag(&mut self, value: f32) {
        let clamped = if value.is_nan() { self.drag } else { value.clamp(MIN_DRAG, MAX_DRAG) };
        if clamped != value {
            warn!("drag {value} out of range, using {clamped}");
        }
        self.drag = clamped;
    }

    /// Set the baseline gravitational constant, floored at zero.
    pub fn set_gravity_constant(&mut self, value: f32) {
        let clamped = if value.is_nan() { self.gravity_constant } else { value.max(0.0) };
        if clamped != value {
            warn!("gravity constant {value} out of range, using {clamped}");
        }
        self.gravity_constant = clamped;
    }

    /// G used for the next frame, including the chaos multiplier.
    pub fn effective_gravity(&self) -> f32 {
        if self.chaos {
            self.gravity_constant * self.config.chaos_multiplier
        } else {
            self.gravity_constant
        }
    }

    fn refresh_speeds(&mut self) {
        self.speeds
            .par_iter_mut()
            .zip(self.velocities.par_iter())
            .for_each(|(s, v)| *s = v.magnitude());
    }

    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.positions
    }

    /// Velocity magnitudes, refreshed after every step and impulse.
    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    pub fn velocities(&self) -> &[Vector3<f32>] {
        &self.velocities
    }

    pub fn masses(&self) -> &[f32] {
        &self.masses
    }

    pub fn lifetimes(&self) -> &[f32] {
        &self.lifetimes
    }

    pub fn mean_speed(&self) -> f32 {
        if self.speeds.is_empty() {
            return 0.0;
        }
        self.speeds.par_iter().sum::<f32>() / self.speeds.len() as f32
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn gravity_constant(&self) -> f32 {
        self.gravity_constant
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    pub fn attract_mode(&self) -> bool {
        self.attract
    }

    pub fn chaos_mode(&self) -> bool {
        self.chaos
    }
}

/// Uniform sample in `[-scale / 2, scale / 2)`.
fn centered(rng: &mut StdRng, scale: f32) -> f32 {
    (rng.gen_range(0.0f32..1.0) - 0.5) * scale
}
