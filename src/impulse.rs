//! One-shot radial velocity kicks triggered by discrete input events.

use cgmath::prelude::*;
use cgmath::{Vector2, Vector3};
use rayon::prelude::*;

/// Particles closer than this to the impulse center are left alone.
const MIN_REACH: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impulse {
    /// Pushes particles away from the center.
    Explosion,
    /// Pulls particles toward the center.
    Implosion,
}

impl Impulse {
    pub fn radius(self) -> f32 {
        match self {
            Impulse::Explosion => 1.5,
            Impulse::Implosion => 2.0,
        }
    }

    pub fn base_force(self) -> f32 {
        match self {
            Impulse::Explosion => 0.08,
            Impulse::Implosion => 0.06,
        }
    }

    fn sign(self) -> f32 {
        match self {
            Impulse::Explosion => -1.0,
            Impulse::Implosion => 1.0,
        }
    }

    /// Velocity increment for a particle at `position`, measured in the plane.
    pub fn kick(self, position: Vector3<f32>, x: f32, y: f32, strength: f32) -> Vector3<f32> {
        let toward = Vector2::new(x - position.x, y - position.y);
        let dist = toward.magnitude();
        let radius = self.radius();
        if dist <= MIN_REACH || dist >= radius {
            return Vector3::zero();
        }
        let magnitude = self.base_force() * strength * (1.0 - dist / radius);
        let dv = toward / dist * (magnitude * self.sign());
        Vector3::new(dv.x, dv.y, 0.0)
    }

    /// Add the kick to every particle in range. Returns how many were hit.
    pub fn apply(
        self,
        positions: &[Vector3<f32>],
        velocities: &mut [Vector3<f32>],
        x: f32,
        y: f32,
        strength: f32,
    ) -> usize {
        velocities
            .par_iter_mut()
            .zip(positions.par_iter())
            .map(|(v, p)| {
                let dv = self.kick(*p, x, y, strength);
                if dv.is_zero() {
                    0
                } else {
                    *v += dv;
                    1
                }
            })
            .sum()
    }
}
