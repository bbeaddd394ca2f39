use cgmath::prelude::*;
use cgmath::vec2;
use particle_wells::{FieldConfig, GravityWell, ParticleField, PathPoint};

/// Seeded field so every run sees the same population
pub fn seeded_field(count: usize, seed: u64) -> ParticleField {
    ParticleField::new(FieldConfig {
        count,
        seed: Some(seed),
        ..FieldConfig::default()
    })
    .unwrap()
}

fn planar_radius(p: &cgmath::Vector3<f32>) -> f32 {
    (p.x * p.x + p.y * p.y).sqrt()
}

// ==================================================================================
// Integrator invariants
// ==================================================================================

#[test]
fn speed_never_exceeds_max_velocity() {
    let mut field = seeded_field(3000, 1);
    let max = field.config().max_velocity;
    let wells = [
        GravityWell::new(0.2, 0.1, 0.0, 500.0).with_velocity(0.3, -0.2),
        GravityWell::new(-1.0, 0.4, 0.0, 800.0),
    ];
    field.set_chaos_mode(true);

    for frame in 0..60 {
        if frame % 10 == 0 {
            field.apply_explosion(0.0, 0.0, 25.0);
        }
        field.advance(&wells, &[], 2.0, frame as f64 * 16.0);
        for v in field.velocities() {
            assert!(v.magnitude() <= max, "speed {} above clamp", v.magnitude());
        }
        assert!(field.speeds().iter().all(|s| *s <= max));
    }
}

#[test]
fn speeds_decay_without_forces() {
    let mut field = seeded_field(1000, 2);
    let mut previous = field.speeds().to_vec();

    for frame in 0..100 {
        field.advance(&[], &[], 1.0, frame as f64 * 16.0);
        for (now, before) in field.speeds().iter().zip(&previous) {
            assert!(now <= before, "speed grew from {before} to {now}");
        }
        previous = field.speeds().to_vec();
    }
    assert!(field.mean_speed() < 0.001 * 0.995f32.powi(90));
}

#[test]
fn escaping_particles_respawn_near_origin() {
    let mut field = seeded_field(1500, 3);
    field.set_attract_mode(false);
    let wells = [GravityWell::new(0.0, 0.0, 0.0, 50.0)];
    let step = field.config().lifetime_step;
    let mut respawn_frames = 0;

    for frame in 0..400 {
        let previous = field.lifetimes().to_vec();
        field.advance(&wells, &[], 1.0, frame as f64 * 16.0);
        for p in field.positions() {
            assert!(p.x * p.x + p.y * p.y <= 16.0, "particle left at {:?}", p);
        }
        // a recycled particle is the only way a lifetime can go down
        let reborn = field
            .positions()
            .iter()
            .zip(field.lifetimes())
            .zip(&previous)
            .filter(|((_, life), before)| *life < *before)
            .inspect(|((p, life), _)| {
                assert!(planar_radius(p) < 0.4 + 1e-5);
                assert_eq!(**life, step, "respawned particle should have aged one step");
            })
            .count();
        if reborn > 0 {
            respawn_frames += 1;
        }
    }
    assert!(respawn_frames > 0, "repelled particles never reached the boundary");
}

#[test]
fn population_is_fixed_between_reinitializations() {
    let mut field = seeded_field(640, 4);
    let wells = [GravityWell::new(0.5, 0.5, 0.0, 2.0)];
    let path = [PathPoint::new(0.0, 0.0, 0.0)];

    for frame in 0..30 {
        field.advance(&wells, &path, 1.0, frame as f64 * 16.0);
        field.apply_implosion(0.0, 0.0, 1.0);
    }
    assert_eq!(field.count(), 640);
    assert_eq!(field.positions().len(), 640);
    assert_eq!(field.speeds().len(), 640);
    assert_eq!(field.masses().len(), 640);
    assert_eq!(field.lifetimes().len(), 640);

    field.initialize(64);
    assert_eq!(field.count(), 64);
}

#[test]
fn masses_are_carried_through_unchanged() {
    let mut field = seeded_field(300, 5);
    let masses = field.masses().to_vec();
    let wells = [GravityWell::new(0.0, 0.0, 0.0, 5.0)];
    for frame in 0..50 {
        field.advance(&wells, &[], 1.0, frame as f64);
    }
    assert_eq!(masses, field.masses());
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn close_wells_act_as_one_merged_well() {
    let mut pair = seeded_field(800, 6);
    let mut merged = seeded_field(800, 6);

    let wells = [
        GravityWell::new(0.35, 0.2, 0.0, 1.0),
        GravityWell::new(0.65, 0.2, 0.0, 1.0),
    ];
    // distance 0.3: (1 + 1) * (1 + (1 - 0.3 / 0.5) * 0.5) = 2.4
    let single = [GravityWell::new(0.5, 0.2, 0.0, 2.4)];

    for frame in 0..10 {
        pair.advance(&wells, &[], 1.0, frame as f64);
        merged.advance(&single, &[], 1.0, frame as f64);
    }
    for (a, b) in pair.positions().iter().zip(merged.positions()) {
        assert!((*a - *b).magnitude() < 1e-5, "{:?} vs {:?}", a, b);
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let mut a = seeded_field(2000, 7);
    let mut b = seeded_field(2000, 7);
    a.set_chaos_mode(true);
    b.set_chaos_mode(true);
    let wells = [GravityWell::new(-0.4, 0.3, 0.0, 1.5).with_velocity(0.02, 0.0)];
    let path = [PathPoint::new(0.1, 0.1, 0.0), PathPoint::new(0.2, 0.15, 40.0)];

    for frame in 0..40 {
        a.advance(&wells, &path, 1.0, frame as f64 * 16.0);
        b.advance(&wells, &path, 1.0, frame as f64 * 16.0);
    }
    assert_eq!(a.positions(), b.positions());
    assert_eq!(a.speeds(), b.speeds());
}

#[test]
fn faded_path_points_have_no_effect() {
    let mut with_path = seeded_field(500, 8);
    let mut without = seeded_field(500, 8);
    let path = [PathPoint::new(0.0, 0.0, 0.0)];

    with_path.advance(&[], &path, 1.0, 8001.0);
    without.advance(&[], &[], 1.0, 8001.0);
    assert_eq!(with_path.positions(), without.positions());
}

#[test]
fn fresh_path_draws_particles_in() {
    let mut field = seeded_field(1500, 9);
    let target = vec2(0.5, 0.0);
    let path = [PathPoint::new(target.x, target.y, 0.0)];

    let nearby: Vec<usize> = field
        .positions()
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let d = (vec2(p.x, p.y) - target).magnitude();
            d > 0.2 && d < 0.5
        })
        .map(|(i, _)| i)
        .collect();
    assert!(!nearby.is_empty());

    for frame in 0..5 {
        field.advance(&[], &path, 1.0, frame as f64 * 16.0);
    }
    for i in nearby {
        let p = field.positions()[i];
        let v = field.velocities()[i];
        let toward = target - vec2(p.x, p.y);
        assert!(vec2(v.x, v.y).dot(toward) > 0.0, "particle {i} not heading to the path");
    }
}

// ==================================================================================
// Impulse tests
// ==================================================================================

#[test]
fn explosion_kicks_match_linear_falloff() {
    let mut field = seeded_field(1200, 10);
    let before = field.velocities().to_vec();
    field.apply_explosion(0.0, 0.0, 1.0);

    let mut kicked = 0;
    for ((p, v0), v1) in field.positions().iter().zip(&before).zip(field.velocities()) {
        let dv = *v1 - *v0;
        let d = planar_radius(p);
        if d > 0.01 && d < 1.5 {
            let expected = 0.08 * (1.0 - d / 1.5);
            assert!((dv.magnitude() - expected).abs() < 1e-5);
            assert!(dv.x * p.x + dv.y * p.y > 0.0, "kick should point away from the center");
            kicked += 1;
        } else {
            assert!(dv.magnitude() < 1e-9);
        }
    }
    assert!(kicked > 0);
}

#[test]
fn implosion_points_inward_and_compounds() {
    let mut field = seeded_field(500, 11);
    let before = field.velocities().to_vec();
    field.apply_implosion(0.0, 0.0, 1.0);
    let once = field.velocities().to_vec();
    field.apply_implosion(0.0, 0.0, 1.0);

    for (((p, v0), v1), v2) in field.positions().iter().zip(&before).zip(&once).zip(field.velocities()) {
        let first = *v1 - *v0;
        let second = *v2 - *v1;
        if planar_radius(p) > 0.01 {
            assert!(first.x * p.x + first.y * p.y <= 0.0);
        }
        assert!((first - second).magnitude() < 1e-6);
    }
}
