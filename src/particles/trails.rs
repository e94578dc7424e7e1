//! Trail accumulation: particles splat their brightness into a display-sized
//! field which fades a little every frame.

use glam::Vec2;
use rayon::prelude::*;

use crate::constants::particles::{FADE_FRACTION, PARTICLE_LIFETIME, TRAIL_LENGTH};
use crate::gpu::{
    FieldDescriptor, GpuError, GridField, Kernel, KernelDescriptor, NumericType, PointBlend, Uniform,
    UniformSpec, WrapMode,
};

/// Subtract a constant from every trail texel, clamped at zero
pub const FADE_TRAILS: KernelDescriptor = KernelDescriptor {
    name: "fadeTrails",
    inputs: &["trails"],
    uniforms: &[UniformSpec { name: "increment", default: Uniform::Float(-1.0 / TRAIL_LENGTH) }],
};

/// Rasterise each live particle as a single point, max-blended
pub const RENDER_PARTICLES: KernelDescriptor = KernelDescriptor {
    name: "renderParticles",
    inputs: &["position", "age", "velocity"],
    uniforms: &[
        UniformSpec { name: "lifetime", default: Uniform::Int(PARTICLE_LIFETIME as i32) },
        UniformSpec { name: "dimensions", default: Uniform::Vec2(Vec2::ONE) },
    ],
};

/// Allocate the trail field for a display surface
pub fn allocate_trails(width: u32, height: u32) -> Result<GridField<f32>, GpuError> {
    GridField::allocate(
        FieldDescriptor::new("trailState", NumericType::Float32)
            .with_wrap(WrapMode::Repeat)
            .double_buffered(),
        width,
        height,
    )
}

/// Per-frame fade increment; a trail length of 0 clears trails every frame
pub fn trail_increment(trail_length: f32) -> f32 {
    if trail_length > 0.0 {
        -1.0 / trail_length
    } else {
        -1.0
    }
}

/// Fade in over the first tenth of the lifetime, fade out over the last tenth
pub fn particle_opacity(age: i16, lifetime: i32) -> f32 {
    let fraction = age as f32 / lifetime.max(1) as f32;
    let fade_in = (fraction / FADE_FRACTION).min(1.0);
    let fade_out = 1.0 - ((fraction - (1.0 - FADE_FRACTION)) / FADE_FRACTION).clamp(0.0, 1.0);
    fade_in * fade_out
}

/// Brightness boost for fast particles
pub fn speed_multiplier(velocity: Vec2) -> f32 {
    (velocity.length_squared() * 0.05 + 0.7).clamp(0.0, 1.0)
}

/// `max(trail + increment, 0)`. Rounding residue left by summing an inexact
/// `-1 / length` is snapped to zero so a full trail clears in `length` frames.
pub fn fade_trails(kernel: &Kernel, trails: &mut GridField<f32>) -> Result<(), GpuError> {
    let increment = kernel.float("increment")?;
    let residue = increment.abs() * 1e-3;
    trails.step_in_place(|state, x, y| {
        let next = state.texel(x as i64, y as i64) + increment;
        if next <= residue {
            0.0
        } else {
            next
        }
    })
}

/// Splat every particle with age >= 1 into `trails`
pub fn render_particles(
    kernel: &Kernel,
    positions: &GridField<[f32; 4]>,
    ages: &GridField<i16>,
    velocity: &GridField<[f32; 2]>,
    trails: &mut GridField<f32>,
) -> Result<(), GpuError> {
    let lifetime = kernel.int("lifetime")?;
    let dimensions = kernel.vec2("dimensions")?;
    let positions = positions.front();
    let ages = ages.front();
    let velocity = velocity.view()?;

    let points: Vec<(i64, i64, f32)> = positions
        .par_iter()
        .zip(ages.par_iter())
        .filter(|(_, age)| **age >= 1)
        .map(|(p, &age)| {
            let position = Vec2::new(p[0] + p[2], p[1] + p[3]);
            let v = Vec2::from(velocity.sample(position / dimensions));
            let value = particle_opacity(age, lifetime) * speed_multiplier(v);
            (position.x.floor() as i64, position.y.floor() as i64, value)
        })
        .collect();

    trails.blend_points(&points, PointBlend::Max)
}
