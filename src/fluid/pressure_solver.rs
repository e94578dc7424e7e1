use glam::Vec2;

use crate::fluid::FluidConstants;
use crate::gpu::{GpuError, GridField, Kernel, KernelDescriptor, Uniform, UniformSpec};

/// One Jacobi relaxation step of the pressure Poisson equation
pub const JACOBI: KernelDescriptor = KernelDescriptor {
    name: "jacobi",
    inputs: &["previous_state", "divergence"],
    uniforms: &[
        UniformSpec { name: "alpha", default: Uniform::Float(crate::constants::fluid::PRESSURE_ALPHA) },
        UniformSpec { name: "beta", default: Uniform::Float(crate::constants::fluid::PRESSURE_BETA) },
        UniformSpec { name: "px_size", default: Uniform::Vec2(Vec2::ONE) },
    ],
};

/// Subtract half the central-difference pressure gradient from velocity
pub const GRADIENT_SUBTRACTION: KernelDescriptor = KernelDescriptor {
    name: "gradientSubtraction",
    inputs: &["scalar_field", "vector_field"],
    uniforms: &[UniformSpec { name: "px_size", default: Uniform::Vec2(Vec2::ONE) }],
};

/// Pressure solver using Jacobi iteration
pub struct PressureSolver {
    jacobi: Kernel,
    gradient_subtraction: Kernel,
    iterations: u32,
}

impl PressureSolver {
    pub fn new(constants: &FluidConstants) -> Result<Self, GpuError> {
        let mut jacobi = Kernel::new(JACOBI);
        jacobi.set_uniform("alpha", Uniform::Float(constants.pressure_alpha))?;
        jacobi.set_uniform("beta", Uniform::Float(constants.pressure_beta))?;

        Ok(Self {
            jacobi,
            gradient_subtraction: Kernel::new(GRADIENT_SUBTRACTION),
            iterations: constants.jacobi_iterations,
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn set_px_size(&mut self, px_size: Vec2) -> Result<(), GpuError> {
        self.jacobi.set_uniform("px_size", Uniform::Vec2(px_size))?;
        self.gradient_subtraction.set_uniform("px_size", Uniform::Vec2(px_size))
    }

    /// Relax pressure toward the solution for `divergence`, ping-ponging each iteration
    pub fn solve(&self, divergence: &GridField<f32>, pressure: &mut GridField<f32>) -> Result<(), GpuError> {
        let alpha = self.jacobi.float("alpha")?;
        let beta = self.jacobi.float("beta")?;
        let px = self.jacobi.vec2("px_size")?;
        let dx = Vec2::new(px.x, 0.0);
        let dy = Vec2::new(0.0, px.y);
        let div = divergence.view()?;

        for _ in 0..self.iterations {
            pressure.step_in_place(|previous, x, y| {
                let uv = previous.texel_uv(x, y);
                let n = previous.sample_nearest(uv + dy);
                let s = previous.sample_nearest(uv - dy);
                let e = previous.sample_nearest(uv + dx);
                let w = previous.sample_nearest(uv - dx);
                let d = div.sample_nearest(uv);
                (n + s + e + w + alpha * d) * beta
            })?;
        }
        Ok(())
    }

    /// Make velocity approximately divergence-free
    pub fn project(&self, pressure: &GridField<f32>, velocity: &mut GridField<[f32; 2]>) -> Result<(), GpuError> {
        let px = self.gradient_subtraction.vec2("px_size")?;
        let dx = Vec2::new(px.x, 0.0);
        let dy = Vec2::new(0.0, px.y);
        let scalar = pressure.view()?;

        velocity.step_in_place(|vector, x, y| {
            let uv = vector.texel_uv(x, y);
            let n = scalar.sample_nearest(uv + dy);
            let s = scalar.sample_nearest(uv - dy);
            let e = scalar.sample_nearest(uv + dx);
            let w = scalar.sample_nearest(uv - dx);
            let v = vector.texel(x as i64, y as i64);
            [v[0] - 0.5 * (e - w), v[1] - 0.5 * (n - s)]
        })
    }
}
