/// Massless tracer particles advected through the velocity field.
///
/// Particle state lives in three parallel 1D fields (position, initial
/// position, age). Rendering accumulates particle brightness into a trail
/// field which fades every frame.

pub mod particle_data;
pub mod particle_system;
pub mod trails;
pub mod update;

pub use particle_data::{particle_count, seed_particles, ParticleFields, ParticleSeed};
pub use particle_system::{ParticleSystem, ParticleUpdate};
pub use trails::{allocate_trails, particle_opacity, speed_multiplier, trail_increment};
pub use update::{advect_position, next_age};

#[cfg(test)]
mod tests;
