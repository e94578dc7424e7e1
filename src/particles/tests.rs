use super::*;
use crate::gpu::{FieldDescriptor, FilterMode, GridField, Kernel, NumericType, Uniform, WrapMode};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn velocity_field(width: u32, height: u32, value: [f32; 2]) -> GridField<[f32; 2]> {
    let mut field = GridField::allocate(
        FieldDescriptor::new("velocity", NumericType::Float32)
            .with_filter(FilterMode::Linear)
            .with_wrap(WrapMode::Repeat)
            .double_buffered(),
        width,
        height,
    )
    .unwrap();
    field.fill(value).unwrap();
    field
}

const ROW_WIDTH: u32 = 16384;

fn seed_from(positions: Vec<[f32; 4]>, ages: Vec<i16>) -> ParticleSeed {
    ParticleSeed { positions, ages }
}

#[test]
fn test_particle_count_from_density() {
    assert_eq!(particle_count(100, 100, 0.1, 100_000), 1000);
    assert_eq!(particle_count(50, 50, 0.1, 100_000), 250);
    assert_eq!(particle_count(3, 3, 0.5, 100_000), 5);
    assert_eq!(particle_count(1000, 1000, 0.5, 100_000), 100_000);
}

#[test]
fn test_seeded_particles_within_surface() {
    let mut rng = StdRng::seed_from_u64(7);
    let seed = seed_particles(500, 64, 32, 1000, &mut rng);
    assert_eq!(seed.len(), 500);

    for (p, &age) in seed.positions.iter().zip(&seed.ages) {
        assert!(p[0] >= 0.0 && p[0] < 64.0);
        assert!(p[1] >= 0.0 && p[1] < 32.0);
        assert_eq!((p[2], p[3]), (0.0, 0.0));
        assert!((0..1000).contains(&age));
    }
}

#[test]
fn test_seeding_is_deterministic() {
    let a = seed_particles(64, 10, 10, 100, &mut StdRng::seed_from_u64(3));
    let b = seed_particles(64, 10, 10, 100, &mut StdRng::seed_from_u64(3));
    assert_eq!(a.positions, b.positions);
    assert_eq!(a.ages, b.ages);
}

#[test]
fn test_age_wraps_at_lifetime() {
    assert_eq!(next_age(0, 1000), 1);
    assert_eq!(next_age(5, 1000), 6);
    assert_eq!(next_age(998, 1000), 999);
    assert_eq!(next_age(999, 1000), 0);
    // Ages left over from a longer lifetime reset immediately
    assert_eq!(next_age(1500, 1000), 0);
}

#[test]
fn test_zero_velocity_keeps_position() {
    let moved = advect_position([12.0, 34.0, 0.5, -0.5], Vec2::splat(100.0), 1.0 / 3.0, |_| Vec2::ZERO);
    assert_eq!(moved, [12.0, 34.0, 0.5, -0.5]);
}

#[test]
fn test_displacement_accumulates_below_threshold() {
    // 3 px/frame over three sub-steps: 1 px each
    let mut p = [10.0, 10.0, 0.0, 0.0];
    for _ in 0..3 {
        p = advect_position(p, Vec2::splat(100.0), 1.0 / 3.0, |_| Vec2::new(3.0, 0.0));
    }
    assert_eq!((p[0], p[1]), (10.0, 10.0));
    assert!((p[2] - 3.0).abs() < 1e-5);
}

#[test]
fn test_large_displacement_merges_and_wraps() {
    let p = advect_position([99.0, 50.0, 0.0, 0.0], Vec2::splat(100.0), 1.0 / 3.0, |_| {
        Vec2::new(30.0, 0.0)
    });
    assert_eq!(p, [9.0, 50.0, 0.0, 0.0]);
}

#[test]
fn test_expired_particles_reset_to_initial_position() {
    let seed = seed_from(vec![[5.0, 5.0, 0.0, 0.0], [7.0, 7.0, 0.0, 0.0]], vec![0, 10]);
    let mut particles = ParticleFields::allocate(&seed, ROW_WIDTH).unwrap();
    particles.positions.write(&[[40.0, 40.0, 2.0, 2.0], [8.0, 8.0, 1.0, 0.0]]).unwrap();

    let mut kernel = Kernel::new(update::ADVECT_PARTICLES);
    kernel.set_uniform("dimensions", Uniform::Vec2(Vec2::splat(64.0))).unwrap();
    let velocity = velocity_field(8, 8, [0.0, 0.0]);

    update::advect_particles(
        &kernel,
        &mut particles.positions,
        &velocity,
        &particles.ages,
        &particles.initial_positions,
    )
    .unwrap();

    assert_eq!(particles.positions.front()[0], [5.0, 5.0, 0.0, 0.0]);
    assert_eq!(particles.positions.front()[1], [8.0, 8.0, 1.0, 0.0]);
}

#[test]
fn test_opacity_envelope() {
    assert_eq!(particle_opacity(0, 1000), 0.0);
    assert!((particle_opacity(50, 1000) - 0.5).abs() < 1e-4);
    assert_eq!(particle_opacity(500, 1000), 1.0);
    assert!((particle_opacity(950, 1000) - 0.5).abs() < 1e-4);
    assert!(particle_opacity(999, 1000) < 0.02);
}

#[test]
fn test_speed_multiplier() {
    assert!((speed_multiplier(Vec2::ZERO) - 0.7).abs() < 1e-6);
    assert_eq!(speed_multiplier(Vec2::new(10.0, 0.0)), 1.0);
}

#[test]
fn test_trail_increment() {
    assert_eq!(trail_increment(8.0), -0.125);
    assert_eq!(trail_increment(0.0), -1.0);
}

#[test]
fn test_trails_fade_to_zero() {
    let mut trails = allocate_trails(4, 4).unwrap();
    trails.fill(1.0).unwrap();
    let mut kernel = Kernel::new(trails::FADE_TRAILS);
    kernel.set_uniform("increment", Uniform::Float(trail_increment(8.0))).unwrap();

    for _ in 0..4 {
        trails::fade_trails(&kernel, &mut trails).unwrap();
    }
    assert_eq!(trails.front()[0], 0.5);

    for _ in 0..6 {
        trails::fade_trails(&kernel, &mut trails).unwrap();
    }
    assert!(trails.front().iter().all(|&t| t == 0.0));
}

#[test]
fn test_render_splats_live_particles_with_max_blend() {
    let seed = seed_from(
        vec![[10.5, 20.5, 0.0, 0.0], [3.5, 3.5, 0.0, 0.0], [30.25, 1.0, 0.5, 0.0]],
        vec![500, 0, 500],
    );
    let particles = ParticleFields::allocate(&seed, ROW_WIDTH).unwrap();
    let velocity = velocity_field(4, 4, [0.0, 0.0]);
    let mut trails = allocate_trails(32, 32).unwrap();
    let mut existing = vec![0.0f32; 32 * 32];
    existing[20 * 32 + 10] = 0.9;
    trails.write(&existing).unwrap();

    let mut kernel = Kernel::new(trails::RENDER_PARTICLES);
    kernel.set_uniform("lifetime", Uniform::Int(1000)).unwrap();
    kernel.set_uniform("dimensions", Uniform::Vec2(Vec2::splat(32.0))).unwrap();
    trails::render_particles(&kernel, &particles.positions, &particles.ages, &velocity, &mut trails)
        .unwrap();

    let view = trails.view().unwrap();
    // Brighter existing value wins
    assert_eq!(view.texel(10, 20), 0.9);
    // Age 0 particles are not drawn
    assert_eq!(view.texel(3, 3), 0.0);
    // Drawn at absolute + displacement
    assert!((view.texel(30, 1) - 0.7).abs() < 1e-6);
}

#[test]
fn test_system_step_keeps_particles_still_without_flow() {
    let seed = seed_from(vec![[4.5, 4.5, 0.0, 0.0]; 3], vec![100, 200, 300]);
    let mut particles = ParticleFields::allocate(&seed, ROW_WIDTH).unwrap();
    let velocity = velocity_field(2, 2, [0.0, 0.0]);
    let mut trails = allocate_trails(16, 16).unwrap();

    let mut system = ParticleSystem::new(3, 1000, 15.0).unwrap();
    system.update_dimensions((16, 16)).unwrap();
    let update = system.step(&mut particles, &velocity, &mut trails).unwrap();

    assert_eq!(update.particle_count, 3);
    assert_eq!(particles.ages.front(), &[101, 201, 301]);
    assert_eq!(particles.positions.front()[0], [4.5, 4.5, 0.0, 0.0]);
    assert!((trails.view().unwrap().texel(4, 4) - 0.7).abs() < 1e-6);
}

#[test]
fn test_reseeded_fields_match_new_count() {
    let seed = seed_particles(10, 8, 8, 50, &mut StdRng::seed_from_u64(1));
    let mut particles = ParticleFields::allocate(&seed, ROW_WIDTH).unwrap();
    let smaller = seed_particles(4, 8, 8, 50, &mut StdRng::seed_from_u64(2));
    particles = particles.reseeded(&smaller).unwrap();

    assert_eq!(particles.count(), 4);
    assert_eq!(particles.initial_positions.front(), smaller.positions.as_slice());
    assert_eq!(particles.dispose().unwrap(), 3);
    assert!(particles.dispose().is_err());
}

#[test]
fn test_packed_rows_age_and_advect_every_particle() {
    let seed = seed_particles(10, 32, 32, 1000, &mut StdRng::seed_from_u64(9));
    let mut particles = ParticleFields::allocate(&seed, 4).unwrap();
    assert_eq!(particles.count(), 10);
    assert_eq!((particles.ages.width(), particles.ages.height()), (4, 3));

    let before: Vec<i16> = particles.ages.front().to_vec();
    let velocity = velocity_field(4, 4, [0.0, 0.0]);
    let mut trails = allocate_trails(32, 32).unwrap();
    let mut system = ParticleSystem::new(3, 1000, 15.0).unwrap();
    system.update_dimensions((32, 32)).unwrap();
    system.step(&mut particles, &velocity, &mut trails).unwrap();

    for (old, new) in before.iter().zip(particles.ages.front()) {
        assert_eq!(*new, update::next_age(*old, 1000));
    }
    // No flow: every element, including the partial last row, stays put
    assert_eq!(particles.positions.front(), seed.positions.as_slice());

    let smaller = seed_particles(3, 32, 32, 1000, &mut StdRng::seed_from_u64(10));
    let particles = particles.reseeded(&smaller).unwrap();
    assert_eq!((particles.positions.width(), particles.positions.height()), (3, 1));
}
