//! Circular boundary modifier: a soft disc outside which velocity is suppressed

use glam::Vec2;

use crate::constants::fluid::{BOUNDARY_BASE_RADIUS, BOUNDARY_EDGE_WIDTH};
use crate::gpu::{GpuError, GridField, Kernel, KernelDescriptor, Uniform, UniformSpec};

pub const UPDATE_BOUNDARY: KernelDescriptor = KernelDescriptor {
    name: "updateBoundary",
    inputs: &[],
    uniforms: &[
        UniformSpec { name: "radius", default: Uniform::Float(BOUNDARY_BASE_RADIUS) },
        UniformSpec { name: "center", default: Uniform::Vec2(Vec2::ZERO) },
        UniformSpec { name: "dimensions", default: Uniform::Vec2(Vec2::ONE) },
    ],
};

pub const APPLY_BOUNDARY: KernelDescriptor = KernelDescriptor {
    name: "applyBoundaries",
    inputs: &["velocity", "boundary"],
    uniforms: &[],
};

/// GLSL-style smoothstep; `edge0 > edge1` yields a falling edge
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub struct BoundaryMask {
    update: Kernel,
    apply: Kernel,
}

impl BoundaryMask {
    pub fn new() -> Self {
        Self {
            update: Kernel::new(UPDATE_BOUNDARY),
            apply: Kernel::new(APPLY_BOUNDARY),
        }
    }

    pub fn radius(&self) -> Result<f32, GpuError> {
        self.update.float("radius")
    }

    pub fn set_radius(&mut self, radius: f32) -> Result<(), GpuError> {
        self.update.set_uniform("radius", Uniform::Float(radius))
    }

    /// Centre the disc on a display surface of `dimensions`
    pub fn set_dimensions(&mut self, dimensions: Vec2) -> Result<(), GpuError> {
        self.update.set_uniform("dimensions", Uniform::Vec2(dimensions))?;
        self.update.set_uniform("center", Uniform::Vec2(dimensions * 0.5))
    }

    /// Regenerate the mask: 1 inside the disc, 0 outside, smooth over the edge band
    pub fn update(&self, boundary: &mut GridField<f32>) -> Result<(), GpuError> {
        let radius = self.update.float("radius")?;
        let center = self.update.vec2("center")?;
        let dimensions = self.update.vec2("dimensions")?;
        let size = boundary.dimensions();

        boundary.step(|x, y| {
            let uv = Vec2::new((x as f32 + 0.5) / size.x, (y as f32 + 0.5) / size.y);
            let distance = (uv * dimensions - center).length();
            smoothstep(radius + BOUNDARY_EDGE_WIDTH, radius - BOUNDARY_EDGE_WIDTH, distance)
        })?;
        Ok(())
    }

    /// Scale velocity by the mask sampled at each velocity texel
    pub fn apply(&self, boundary: &GridField<f32>, velocity: &mut GridField<[f32; 2]>) -> Result<(), GpuError> {
        debug_assert_eq!(self.apply.input_slot("boundary"), Some(1));
        let mask = boundary.view()?;

        velocity.step_in_place(|state, x, y| {
            let v = state.texel(x as i64, y as i64);
            let factor = mask.sample_nearest(state.texel_uv(x, y));
            [v[0] * factor, v[1] * factor]
        })
    }
}

impl Default for BoundaryMask {
    fn default() -> Self {
        Self::new()
    }
}
