//! Per-frame acceleration sources.
//!
//! Each source implements [`Acceleration`]; a [`ForceAggregator`] sums every
//! registered source into one acceleration per particle. Sources only read the
//! particle position, so the sum runs over the population in parallel.

use std::borrow::Cow;

use cgmath::prelude::*;
use cgmath::{Vector2, Vector3, vec3};
use rand::Rng;
use rayon::prelude::*;

use crate::config::FieldConfig;

/// Fraction of a fast well's velocity handed to particles right on top of it.
const SLINGSHOT_GAIN: f32 = 0.5;

/// Path points closer than this are ignored to keep the direction well defined.
const PATH_MIN_REACH: f32 = 0.01;
const PATH_REACH: f32 = 0.6;
const PATH_SOFTENING: f32 = 0.03;

/// An external attractor/repeller, supplied fresh every frame.
///
/// A source that does not report its velocity leaves `vx`/`vy` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GravityWell {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub strength: f32,
    pub vx: f32,
    pub vy: f32,
}

impl GravityWell {
    pub fn new(x: f32, y: f32, z: f32, strength: f32) -> Self {
        Self {
            x,
            y,
            z,
            strength,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        vec3(self.x, self.y, self.z)
    }

    pub fn velocity(&self) -> Vector2<f32> {
        Vector2::new(self.vx, self.vy)
    }

    fn planar_distance(&self, other: &GravityWell) -> f32 {
        Vector2::new(self.x - other.x, self.y - other.y).magnitude()
    }
}

/// One sample of a drawn path. `timestamp` uses the same clock as `now` in
/// [`crate::ParticleField::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    pub timestamp: f64,
}

impl PathPoint {
    pub fn new(x: f32, y: f32, timestamp: f64) -> Self {
        Self { x, y, timestamp }
    }
}

/// Fuse exactly two nearby wells into one stronger well.
///
/// Any other count, or two wells at least `merge_distance` apart, comes back
/// untouched. The merged strength grows as the wells close in:
/// `(s1 + s2) * (1 + (1 - d / merge_distance) * 0.5)`.
pub fn merge_wells(wells: &[GravityWell], merge_distance: f32) -> Cow<'_, [GravityWell]> {
    let [a, b] = wells else {
        return Cow::Borrowed(wells);
    };

    let d = a.planar_distance(b);
    if d >= merge_distance {
        return Cow::Borrowed(wells);
    }

    let merge_factor = 1.0 - d / merge_distance;
    let merged = GravityWell {
        x: (a.x + b.x) * 0.5,
        y: (a.y + b.y) * 0.5,
        z: (a.z + b.z) * 0.5,
        strength: (a.strength + b.strength) * (1.0 + merge_factor * 0.5),
        vx: (a.vx + b.vx) * 0.5,
        vy: (a.vy + b.vy) * 0.5,
    };
    Cow::Owned(vec![merged])
}

/// Fill `out` with the chaos-mode jitter, drawn in particle order so a seeded
/// run is reproducible. Only x/y are perturbed.
pub fn seed_turbulence<R: Rng>(out: &mut [Vector3<f32>], rng: &mut R, amplitude: f32) {
    for a in out.iter_mut() {
        *a = if amplitude > 0.0 {
            vec3(
                rng.gen_range(-amplitude..amplitude),
                rng.gen_range(-amplitude..amplitude),
                0.0,
            )
        } else {
            Vector3::zero()
        };
    }
}

/// A source of acceleration evaluated independently for each particle.
pub trait Acceleration: Sync {
    fn acceleration(&self, position: Vector3<f32>) -> Vector3<f32>;
}

/// Softened inverse-square attraction (or repulsion) from every well, with a
/// hard cutoff at `field_radius` and the slingshot term for fast wells.
pub struct WellForce<'a> {
    pub wells: Cow<'a, [GravityWell]>,
    /// Effective G for this frame, chaos multiplier already applied.
    pub gravity: f32,
    /// `1.0` attracts, `-1.0` repels.
    pub sign: f32,
    pub field_radius: f32,
    pub min_distance: f32,
    pub slingshot_radius: f32,
    pub slingshot_min_speed: f32,
}

impl<'a> WellForce<'a> {
    pub fn new(wells: &'a [GravityWell], gravity: f32, attract: bool, config: &FieldConfig) -> Self {
        Self {
            wells: merge_wells(wells, config.merge_distance),
            gravity,
            sign: if attract { 1.0 } else { -1.0 },
            field_radius: config.field_radius,
            min_distance: config.min_distance,
            slingshot_radius: config.slingshot_radius,
            slingshot_min_speed: config.slingshot_min_speed,
        }
    }

    fn single(&self, well: &GravityWell, position: Vector3<f32>) -> Vector3<f32> {
        let offset = well.position() - position;
        let dist = offset.magnitude();
        if dist >= self.field_radius {
            return Vector3::zero();
        }

        let soft = dist.max(self.min_distance);
        let force = self.gravity * well.strength / (soft * soft);
        let mut a = if dist > 0.0 {
            offset / dist * (force * self.sign)
        } else {
            Vector3::zero()
        };

        let velocity = well.velocity();
        if velocity.magnitude() > self.slingshot_min_speed && dist < self.slingshot_radius {
            let fling = SLINGSHOT_GAIN * (1.0 - dist / self.slingshot_radius);
            a += vec3(velocity.x, velocity.y, 0.0) * fling;
        }

        a
    }
}

impl Acceleration for WellForce<'_> {
    fn acceleration(&self, position: Vector3<f32>) -> Vector3<f32> {
        self.wells
            .iter()
            .fold(Vector3::zero(), |acc, well| acc + self.single(well, position))
    }
}

/// Planar attraction toward recently drawn path points, fading linearly with age.
pub struct PathForce<'a> {
    pub points: &'a [PathPoint],
    pub now: f64,
    pub fade: f64,
    pub strength: f32,
}

impl<'a> PathForce<'a> {
    pub fn new(points: &'a [PathPoint], now: f64, config: &FieldConfig) -> Self {
        Self {
            points,
            now,
            fade: config.path_fade,
            strength: config.path_strength,
        }
    }

    /// Strength of a point at `now`, or `None` once it has faded out.
    pub fn point_strength(&self, point: &PathPoint) -> Option<f32> {
        // a timestamp from the future counts as fresh
        let age = (self.now - point.timestamp).max(0.0);
        if age > self.fade {
            return None;
        }
        Some((1.0 - age / self.fade) as f32 * self.strength)
    }
}

impl Acceleration for PathForce<'_> {
    fn acceleration(&self, position: Vector3<f32>) -> Vector3<f32> {
        let mut a = Vector3::zero();
        for point in self.points {
            let Some(strength) = self.point_strength(point) else {
                continue;
            };
            let offset = Vector2::new(point.x - position.x, point.y - position.y);
            let dist = offset.magnitude();
            if dist > PATH_MIN_REACH && dist < PATH_REACH {
                let pull = offset / dist * (strength / (dist + PATH_SOFTENING));
                a += vec3(pull.x, pull.y, 0.0);
            }
        }
        a
    }
}

/// The set of acceleration sources active for one frame.
pub struct ForceAggregator<'a> {
    terms: Vec<Box<dyn Acceleration + 'a>>,
}

impl<'a> ForceAggregator<'a> {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with(mut self, term: impl Acceleration + 'a) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add every term's contribution onto `out[i]`. `out` is not cleared, so
    /// it may already hold turbulence.
    pub fn accumulate(&self, positions: &[Vector3<f32>], out: &mut [Vector3<f32>]) {
        debug_assert_eq!(positions.len(), out.len());
        if self.terms.is_empty() {
            return;
        }
        out.par_iter_mut()
            .zip(positions.par_iter())
            .for_each(|(a, p)| {
                for term in &self.terms {
                    *a += term.acceleration(*p);
                }
            });
    }
}

impl Default for ForceAggregator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn wells_force<'a>(wells: &'a [GravityWell], attract: bool) -> WellForce<'a> {
        let config = FieldConfig::default();
        WellForce::new(wells, config.gravity_constant, attract, &config)
    }

    #[test]
    fn close_pair_merges_with_boosted_strength() {
        let wells = [
            GravityWell::new(-0.15, 0.0, 0.0, 1.0),
            GravityWell::new(0.15, 0.0, 0.0, 1.0),
        ];
        let merged = merge_wells(&wells, 0.5);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].strength - 2.4).abs() < 1e-5, "got {}", merged[0].strength);
        assert!(merged[0].x.abs() < 1e-6);
    }

    #[test]
    fn merged_velocity_is_average() {
        let wells = [
            GravityWell::new(0.0, 0.0, 0.0, 1.0).with_velocity(0.02, 0.0),
            GravityWell::new(0.1, 0.1, 0.0, 1.0),
        ];
        let merged = merge_wells(&wells, 0.5);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].vx - 0.01).abs() < 1e-7);
        assert_eq!(merged[0].vy, 0.0);
    }

    #[test]
    fn distant_pair_and_other_counts_stay_separate() {
        let pair = [
            GravityWell::new(-0.3, 0.0, 0.0, 1.0),
            GravityWell::new(0.3, 0.0, 0.0, 1.0),
        ];
        assert_eq!(merge_wells(&pair, 0.5).len(), 2);

        let triple = [GravityWell::new(0.0, 0.0, 0.0, 1.0); 3];
        assert_eq!(merge_wells(&triple, 0.5).len(), 3);
        assert!(merge_wells(&[], 0.5).is_empty());
    }

    #[test]
    fn merge_ignores_depth() {
        let wells = [
            GravityWell::new(0.0, 0.0, -5.0, 1.0),
            GravityWell::new(0.0, 0.0, 5.0, 1.0),
        ];
        assert_eq!(merge_wells(&wells, 0.5).len(), 1);
    }

    #[test]
    fn well_attracts_with_inverse_square() {
        let wells = [GravityWell::new(0.0, 0.0, 0.0, 1.0)];
        let force = wells_force(&wells, true);

        let near = force.acceleration(vec3(0.5, 0.0, 0.0));
        let far = force.acceleration(vec3(1.0, 0.0, 0.0));
        assert!(near.x < 0.0, "should point toward the well");
        let ratio = near.magnitude() / far.magnitude();
        assert!((ratio - 4.0).abs() < 1e-3, "expected ~4x, got {ratio}");
    }

    #[test]
    fn repel_mode_flips_direction() {
        let wells = [GravityWell::new(0.0, 0.0, 0.0, 1.0)];
        let attract = wells_force(&wells, true).acceleration(vec3(1.0, 0.0, 0.0));
        let repel = wells_force(&wells, false).acceleration(vec3(1.0, 0.0, 0.0));
        assert!((attract + repel).magnitude() < 1e-9);
    }

    #[test]
    fn hard_cutoff_at_field_radius() {
        let wells = [GravityWell::new(0.0, 0.0, 0.0, 1.0)];
        let force = wells_force(&wells, true);
        assert_eq!(force.acceleration(vec3(2.5, 0.0, 0.0)), Vector3::zero());
        assert!(force.acceleration(vec3(2.49, 0.0, 0.0)).magnitude() > 0.0);
    }

    #[test]
    fn softening_caps_force_near_center() {
        let wells = [GravityWell::new(0.0, 0.0, 0.0, 1.0)];
        let force = wells_force(&wells, true);
        let a = force.acceleration(vec3(1e-6, 0.0, 0.0));
        let cap = 0.00015 / (0.05 * 0.05);
        assert!((a.magnitude() - cap).abs() < 1e-6);
        assert_eq!(force.acceleration(Vector3::zero()), Vector3::zero());
    }

    #[test]
    fn fast_well_slings_nearby_particles() {
        let wells = [GravityWell::new(0.0, 0.0, 0.0, 0.0).with_velocity(0.05, 0.0)];
        let force = wells_force(&wells, true);
        let a = force.acceleration(vec3(0.0, 0.25, 0.0));
        // zero strength, so only the slingshot remains: 0.05 * 0.5 * (1 - 0.5)
        assert!((a.x - 0.0125).abs() < 1e-7);
        assert!(a.y.abs() < 1e-9);

        let slow = [GravityWell::new(0.0, 0.0, 0.0, 0.0).with_velocity(0.005, 0.0)];
        assert_eq!(wells_force(&slow, true).acceleration(vec3(0.0, 0.25, 0.0)), Vector3::zero());
    }

    #[test]
    fn path_strength_fades_linearly() {
        let config = FieldConfig::default();
        let points = [PathPoint::new(0.0, 0.0, 0.0)];
        let fresh = PathForce::new(&points, 0.0, &config);
        let half = PathForce::new(&points, 4000.0, &config);
        let stale = PathForce::new(&points, 8001.0, &config);

        assert!((fresh.point_strength(&points[0]).unwrap() - 0.0005).abs() < 1e-9);
        assert!((half.point_strength(&points[0]).unwrap() - 0.00025).abs() < 1e-9);
        assert!(stale.point_strength(&points[0]).is_none());
    }

    #[test]
    fn path_pulls_only_within_reach() {
        let config = FieldConfig::default();
        let points = [PathPoint::new(0.0, 0.0, 0.0)];
        let force = PathForce::new(&points, 0.0, &config);

        let a = force.acceleration(vec3(0.3, 0.0, 1.0));
        assert!((a.x + 0.0005 / 0.33).abs() < 1e-7);
        assert_eq!(a.z, 0.0);

        assert_eq!(force.acceleration(vec3(0.7, 0.0, 0.0)), Vector3::zero());
        assert_eq!(force.acceleration(vec3(0.005, 0.0, 0.0)), Vector3::zero());
    }

    #[test]
    fn aggregator_sums_terms_on_top_of_existing_values() {
        let config = FieldConfig::default();
        let wells = [GravityWell::new(0.0, 0.0, 0.0, 1.0)];
        let points = [PathPoint::new(0.0, 0.0, 0.0)];
        let positions = vec![vec3(0.3, 0.0, 0.0), vec3(3.0, 0.0, 0.0)];

        let aggregator = ForceAggregator::new()
            .with(WellForce::new(&wells, config.gravity_constant, true, &config))
            .with(PathForce::new(&points, 0.0, &config));

        let mut out = vec![vec3(1.0, 1.0, 1.0); 2];
        aggregator.accumulate(&positions, &mut out);

        let expected_x = 1.0 - 0.00015 / 0.09 - 0.0005 / 0.33;
        assert!((out[0].x - expected_x).abs() < 1e-6);
        assert_eq!(out[1], vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn turbulence_is_bounded_and_planar() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut out = vec![Vector3::zero(); 256];
        seed_turbulence(&mut out, &mut rng, 0.0001);
        assert!(out.iter().all(|a| a.x.abs() <= 0.0001 && a.y.abs() <= 0.0001 && a.z == 0.0));
        assert!(out.iter().any(|a| a.x != 0.0));

        seed_turbulence(&mut out, &mut rng, 0.0);
        assert!(out.iter().all(|a| *a == Vector3::zero()));
    }
}
