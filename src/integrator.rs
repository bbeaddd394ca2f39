//! Semi-implicit Euler step with drag, speed clamp and boundary detection.
//!
//! The step never touches the random source: particles that leave the
//! boundary are reported back by index and respawned by the caller, in index
//! order, after the parallel pass. Lifetimes advance last, once respawns have
//! reset theirs.

use cgmath::prelude::*;
use cgmath::Vector3;
use rayon::prelude::*;

use crate::config::FieldConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub dt: f32,
    pub drag: f32,
    pub max_velocity: f32,
    pub boundary_radius: f32,
    pub lifetime_step: f32,
}

impl StepParams {
    pub fn new(dt: f32, drag: f32, config: &FieldConfig) -> Self {
        Self {
            dt,
            drag,
            max_velocity: config.max_velocity,
            boundary_radius: config.boundary_radius,
            lifetime_step: config.lifetime_step,
        }
    }
}

/// Rescale `v` so its magnitude never exceeds `max`, keeping its direction.
pub fn clamp_speed(v: Vector3<f32>, max: f32) -> Vector3<f32> {
    let speed = v.magnitude();
    if speed <= max {
        return v;
    }
    let mut clamped = v * (max / speed);
    // rounding can leave the rescaled vector a hair above `max`
    for _ in 0..4 {
        if clamped.magnitude() <= max {
            break;
        }
        clamped *= 1.0 - 2.0 * f32::EPSILON;
    }
    clamped
}

/// Advance a single particle. Returns `true` if it ended outside the boundary.
pub fn step_particle(
    position: &mut Vector3<f32>,
    velocity: &mut Vector3<f32>,
    acceleration: Vector3<f32>,
    params: &StepParams,
) -> bool {
    let v = (*velocity + acceleration * params.dt) * params.drag;
    *velocity = clamp_speed(v, params.max_velocity);
    *position += *velocity * params.dt;

    let r2 = position.x * position.x + position.y * position.y;
    r2 > params.boundary_radius * params.boundary_radius
}

/// Step every particle in parallel and return the indices that escaped, ascending.
pub fn integrate(
    positions: &mut [Vector3<f32>],
    velocities: &mut [Vector3<f32>],
    accelerations: &[Vector3<f32>],
    params: &StepParams,
) -> Vec<usize> {
    positions
        .par_iter_mut()
        .zip(velocities.par_iter_mut())
        .zip(accelerations.par_iter())
        .enumerate()
        .filter_map(|(i, ((p, v), a))| step_particle(p, v, *a, params).then_some(i))
        .collect()
}

/// Age every particle by `step`, saturating at 1.
pub fn advance_lifetimes(lifetimes: &mut [f32], step: f32) {
    lifetimes
        .par_iter_mut()
        .for_each(|life| *life = (*life + step).min(1.0));
}
