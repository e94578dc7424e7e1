use glam::Vec2;

use crate::fluid::boundary::BoundaryMask;
use crate::fluid::pressure_solver::PressureSolver;
use crate::fluid::{FluidConstants, FluidFields};
use crate::gpu::{GpuError, GridField, Kernel, KernelDescriptor, Uniform, UniformSpec};

/// Semi-Lagrangian self-advection of a vector field
pub const ADVECTION: KernelDescriptor = KernelDescriptor {
    name: "advection",
    inputs: &["state", "velocity"],
    uniforms: &[UniformSpec { name: "dimensions", default: Uniform::Vec2(Vec2::ONE) }],
};

/// Central-difference divergence
pub const DIVERGENCE: KernelDescriptor = KernelDescriptor {
    name: "divergence2D",
    inputs: &["vector_field"],
    uniforms: &[UniformSpec { name: "px_size", default: Uniform::Vec2(Vec2::ONE) }],
};

/// Uniform velocity damping
pub const DAMPING: KernelDescriptor = KernelDescriptor {
    name: "damping",
    inputs: &["velocity"],
    uniforms: &[UniformSpec {
        name: "damping",
        default: Uniform::Float(crate::constants::fluid::DAMPING_FACTOR),
    }],
};

/// Advect velocity through itself.
///
/// `velocity' = sample(velocity, uv - sample(velocity, uv) / dimensions)`, one
/// backtrace per texel. `dimensions` is the display size, velocity being in display pixels.
pub fn advect(kernel: &Kernel, velocity: &mut GridField<[f32; 2]>) -> Result<(), GpuError> {
    let dimensions = kernel.vec2("dimensions")?;

    velocity.step_in_place(|state, x, y| {
        let uv = state.texel_uv(x, y);
        let v = Vec2::from(state.sample(uv));
        state.sample(uv - v / dimensions)
    })
}

/// Divergence of `velocity` into the single-buffered `divergence` field
pub fn compute_divergence(
    kernel: &Kernel,
    velocity: &GridField<[f32; 2]>,
    divergence: &mut GridField<f32>,
) -> Result<(), GpuError> {
    let px = kernel.vec2("px_size")?;
    let field = velocity.view()?;
    let dx = Vec2::new(px.x, 0.0);
    let dy = Vec2::new(0.0, px.y);

    // Offsets land on neighbouring texel centres
    divergence.step(|x, y| {
        let uv = field.texel_uv(x, y);
        let n = field.sample_nearest(uv + dy)[1];
        let s = field.sample_nearest(uv - dy)[1];
        let e = field.sample_nearest(uv + dx)[0];
        let w = field.sample_nearest(uv - dx)[0];
        0.5 * (e - w + n - s)
    })?;
    Ok(())
}

pub fn apply_damping(kernel: &Kernel, velocity: &mut GridField<[f32; 2]>) -> Result<(), GpuError> {
    let damping = kernel.float("damping")?;
    velocity.step_in_place(|state, x, y| {
        let v = state.texel(x as i64, y as i64);
        [v[0] * damping, v[1] * damping]
    })
}

/// Fluid compute kernels outside the pressure solve
pub struct FluidCompute {
    pub advection: Kernel,
    pub divergence: Kernel,
    pub damping: Kernel,
}

impl FluidCompute {
    pub fn new() -> Self {
        Self {
            advection: Kernel::new(ADVECTION),
            divergence: Kernel::new(DIVERGENCE),
            damping: Kernel::new(DAMPING),
        }
    }
}

impl Default for FluidCompute {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed per-frame solver sequence: advection, divergence, pressure solve, projection,
/// then the optional boundary and damping modifiers
pub struct FluidPipeline {
    compute: FluidCompute,
    pressure: PressureSolver,
    boundary: Option<BoundaryMask>,
    constants: FluidConstants,
}

impl FluidPipeline {
    pub fn new(constants: FluidConstants, boundary: Option<BoundaryMask>) -> Result<Self, GpuError> {
        let mut compute = FluidCompute::new();
        if let Some(damping) = constants.damping {
            compute.damping.set_uniform("damping", Uniform::Float(damping))?;
        }
        let pressure = PressureSolver::new(&constants)?;

        Ok(Self {
            compute,
            pressure,
            boundary,
            constants,
        })
    }

    pub fn constants(&self) -> &FluidConstants {
        &self.constants
    }

    pub fn boundary(&self) -> Option<&BoundaryMask> {
        self.boundary.as_ref()
    }

    pub fn set_damping(&mut self, damping: Option<f32>) -> Result<(), GpuError> {
        if let Some(value) = damping {
            self.compute.damping.set_uniform("damping", Uniform::Float(value))?;
        }
        self.constants.damping = damping;
        Ok(())
    }

    /// Push surface-dependent uniforms into every kernel that consumes them
    pub fn update_dimensions(&mut self, display: (u32, u32), grid: (u32, u32)) -> Result<(), GpuError> {
        let dimensions = Vec2::new(display.0 as f32, display.1 as f32);
        let px_size = Vec2::new(1.0 / grid.0 as f32, 1.0 / grid.1 as f32);

        self.compute.advection.set_uniform("dimensions", Uniform::Vec2(dimensions))?;
        self.compute.divergence.set_uniform("px_size", Uniform::Vec2(px_size))?;
        self.pressure.set_px_size(px_size)?;
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.set_dimensions(dimensions)?;
        }
        Ok(())
    }

    /// Update the boundary radius. Ignored when the boundary modifier is off.
    pub fn set_boundary_radius(&mut self, radius: f32) -> Result<(), GpuError> {
        match self.boundary.as_mut() {
            Some(boundary) => boundary.set_radius(radius),
            None => Ok(()),
        }
    }

    /// Run one frame of the solver
    pub fn step(&self, fields: &mut FluidFields) -> Result<(), GpuError> {
        // Step 1: Advection
        advect(&self.compute.advection, &mut fields.velocity)?;

        // Step 2: Divergence of the advected field
        compute_divergence(&self.compute.divergence, &fields.velocity, &mut fields.divergence)?;

        // Step 3: Pressure solve
        self.pressure.solve(&fields.divergence, &mut fields.pressure)?;

        // Step 4: Subtract the pressure gradient
        self.pressure.project(&fields.pressure, &mut fields.velocity)?;

        // Post-projection modifiers
        if let (Some(mask), Some(field)) = (self.boundary.as_ref(), fields.boundary.as_mut()) {
            mask.update(field)?;
            mask.apply(field, &mut fields.velocity)?;
        }
        if self.constants.damping.is_some() {
            apply_damping(&self.compute.damping, &mut fields.velocity)?;
        }

        Ok(())
    }
}
