use glam::Vec2;

use crate::constants::particles::{MERGE_THRESHOLD, PARTICLE_LIFETIME, RENDER_STEPS};
use crate::gpu::{GpuError, GridField, Kernel, KernelDescriptor, Uniform, UniformSpec};

/// Increment ages, wrapping to zero at the lifetime
pub const AGE_PARTICLES: KernelDescriptor = KernelDescriptor {
    name: "ageParticles",
    inputs: &["age"],
    uniforms: &[UniformSpec { name: "lifetime", default: Uniform::Int(PARTICLE_LIFETIME as i32) }],
};

/// Move particles through the velocity field with a midpoint integrator
pub const ADVECT_PARTICLES: KernelDescriptor = KernelDescriptor {
    name: "advectParticles",
    inputs: &["position", "velocity", "age", "initialPosition"],
    uniforms: &[
        UniformSpec { name: "dimensions", default: Uniform::Vec2(Vec2::ONE) },
        UniformSpec { name: "step_fraction", default: Uniform::Float(1.0 / RENDER_STEPS as f32) },
    ],
};

/// `age + 1`, or 0 once it reaches `lifetime`. Age 0 marks a particle for reset.
#[inline]
pub fn next_age(age: i16, lifetime: i32) -> i16 {
    let next = age as i32 + 1;
    if next >= lifetime {
        0
    } else {
        next as i16
    }
}

pub fn age_particles(kernel: &Kernel, ages: &mut GridField<i16>) -> Result<(), GpuError> {
    let lifetime = kernel.int("lifetime")?;
    ages.step_in_place(|state, x, y| next_age(state.at(state.index(x, y)), lifetime))
}

/// Zero any age a shortened lifetime left out of range
pub fn expire_ages(kernel: &Kernel, ages: &mut GridField<i16>) -> Result<(), GpuError> {
    let lifetime = kernel.int("lifetime")?;
    ages.step_in_place(|state, x, y| {
        let age = state.at(state.index(x, y));
        if age as i32 >= lifetime {
            0
        } else {
            age
        }
    })
}

/// GLSL `mod`: result carries the sign of `y`
#[inline]
fn wrap(x: Vec2, y: Vec2) -> Vec2 {
    x - y * (x / y).floor()
}

/// One fractional advection step for a single particle.
///
/// Displacement accumulates separately from the absolute position so small
/// steps keep their precision; once `|displacement|^2` reaches the merge
/// threshold it is folded into the absolute part. The absolute part always
/// wraps onto the surface torus.
pub fn advect_position(
    position: [f32; 4],
    dimensions: Vec2,
    step_fraction: f32,
    sample_velocity: impl Fn(Vec2) -> Vec2,
) -> [f32; 4] {
    let absolute = Vec2::new(position[0], position[1]);
    let mut displacement = Vec2::new(position[2], position[3]);
    let current = absolute + displacement;

    let v1 = sample_velocity(current / dimensions);
    let midpoint = current + v1 * 0.5 * step_fraction;
    let v2 = sample_velocity(midpoint / dimensions);
    displacement += v2 * step_fraction;

    let merge = displacement.length_squared() >= MERGE_THRESHOLD;
    let absolute = if merge {
        let merged = wrap(absolute + displacement + dimensions, dimensions);
        displacement = Vec2::ZERO;
        merged
    } else {
        wrap(absolute + dimensions, dimensions)
    };

    [absolute.x, absolute.y, displacement.x, displacement.y]
}

/// Advance every particle by one render sub-step. Particles whose age is 0
/// snap back to their initial position with zero displacement.
pub fn advect_particles(
    kernel: &Kernel,
    positions: &mut GridField<[f32; 4]>,
    velocity: &GridField<[f32; 2]>,
    ages: &GridField<i16>,
    initial_positions: &GridField<[f32; 4]>,
) -> Result<(), GpuError> {
    let dimensions = kernel.vec2("dimensions")?;
    let step_fraction = kernel.float("step_fraction")?;
    let velocity = velocity.view()?;
    let ages = ages.view()?;
    let initial = initial_positions.view()?;

    positions.step_in_place(|state, x, y| {
        let i = state.index(x, y);
        if ages.at(i) == 0 {
            let p = initial.at(i);
            return [p[0], p[1], 0.0, 0.0];
        }
        advect_position(state.at(i), dimensions, step_fraction, |uv| {
            Vec2::from(velocity.sample(uv))
        })
    })
}
