//! Surface-dependent allocation: grid sizes, particle counts and the field set

use rand::Rng;

use crate::engine::EngineConfig;
use crate::fluid::{velocity_grid_size, FluidFields};
use crate::gpu::{ComputeCapabilities, GpuError, GridField, NumericType};
use crate::particles::{allocate_trails, particle_count, seed_particles, ParticleFields};
use crate::renderer::allocate_display;

/// Sizes derived from a display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLayout {
    pub display: (u32, u32),
    pub grid: (u32, u32),
    pub particle_count: u32,
}

impl SurfaceLayout {
    /// Validate a surface size against the backend and derive every dependent size
    pub fn new(
        width: u32,
        height: u32,
        config: &EngineConfig,
        capabilities: &dyn ComputeCapabilities,
    ) -> Result<Self, GpuError> {
        let max = capabilities.max_grid_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(GpuError::InvalidDimensions {
                name: "surface",
                width,
                height,
            });
        }

        let count = particle_count(
            width,
            height,
            config.simulation.particle_density,
            config.particles.max_particles,
        );
        // Particle fields pack into rows of at most `max` elements
        if count > max.saturating_mul(max) || count == 0 {
            return Err(GpuError::InvalidDimensions {
                name: "position",
                width: count,
                height: 1,
            });
        }

        Ok(Self {
            display: (width, height),
            grid: velocity_grid_size(width, height, config.solver.velocity_scale_factor),
            particle_count: count,
        })
    }
}

/// Every grid field the engine owns
pub struct SimulationState {
    pub fluid: FluidFields,
    pub particles: ParticleFields,
    pub trails: GridField<f32>,
    pub display: GridField<[f32; 4]>,
}

impl SimulationState {
    /// Allocate zeroed fields and freshly seeded particles for `layout`
    pub fn allocate<R: Rng>(
        layout: &SurfaceLayout,
        precision: NumericType,
        with_boundary: bool,
        lifetime: u32,
        max_row_width: u32,
        rng: &mut R,
    ) -> Result<Self, GpuError> {
        let (width, height) = layout.display;
        let seed = seed_particles(layout.particle_count, width, height, lifetime, rng);

        Ok(Self {
            fluid: FluidFields::allocate(layout.grid, layout.display, precision, with_boundary)?,
            particles: ParticleFields::allocate(&seed, max_row_width)?,
            trails: allocate_trails(width, height)?,
            display: allocate_display(width, height)?,
        })
    }

    /// New fields for `layout` with the same descriptors. `self` is untouched,
    /// so a failure leaves the current state valid.
    pub fn reallocated<R: Rng>(&self, layout: &SurfaceLayout, lifetime: u32, rng: &mut R) -> Result<Self, GpuError> {
        let (width, height) = layout.display;
        let seed = seed_particles(layout.particle_count, width, height, lifetime, rng);

        Ok(Self {
            fluid: self.fluid.reallocated(layout.grid, layout.display)?,
            particles: self.particles.reseeded(&seed)?,
            trails: self.trails.reallocated(width, height, None)?,
            display: self.display.reallocated(width, height, None)?,
        })
    }

    /// Release every field; returns how many were released
    pub fn dispose(&mut self) -> Result<usize, GpuError> {
        let mut released = self.fluid.dispose()?;
        released += self.particles.dispose()?;
        self.trails.dispose()?;
        self.display.dispose()?;
        Ok(released + 2)
    }
}
