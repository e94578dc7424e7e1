use glam::Vec2;

use crate::gpu::{GpuError, GridField, Kernel, Uniform};
use crate::particles::trails::{
    fade_trails, render_particles, trail_increment, FADE_TRAILS, RENDER_PARTICLES,
};
use crate::particles::update::{advect_particles, age_particles, expire_ages, ADVECT_PARTICLES, AGE_PARTICLES};
use crate::particles::ParticleFields;

/// Particle update result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleUpdate {
    pub particle_count: u32,
    pub render_steps: u32,
}

/// Per-frame particle pass: age, fade trails, then advect and splat per render step
pub struct ParticleSystem {
    age: Kernel,
    advect: Kernel,
    fade: Kernel,
    render: Kernel,
    render_steps: u32,
}

impl ParticleSystem {
    pub fn new(render_steps: u32, lifetime: u32, trail_length: f32) -> Result<Self, GpuError> {
        let render_steps = render_steps.max(1);
        let mut advect = Kernel::new(ADVECT_PARTICLES);
        advect.set_uniform("step_fraction", Uniform::Float(1.0 / render_steps as f32))?;

        let mut system = Self {
            age: Kernel::new(AGE_PARTICLES),
            advect,
            fade: Kernel::new(FADE_TRAILS),
            render: Kernel::new(RENDER_PARTICLES),
            render_steps,
        };
        system.set_lifetime(lifetime)?;
        system.set_trail_length(trail_length)?;
        Ok(system)
    }

    pub fn render_steps(&self) -> u32 {
        self.render_steps
    }

    pub fn lifetime(&self) -> Result<i32, GpuError> {
        self.age.int("lifetime")
    }

    pub fn set_lifetime(&mut self, lifetime: u32) -> Result<(), GpuError> {
        let lifetime = lifetime.clamp(1, i16::MAX as u32) as i32;
        self.age.set_uniform("lifetime", Uniform::Int(lifetime))?;
        self.render.set_uniform("lifetime", Uniform::Int(lifetime))
    }

    /// Bring ages back into `[0, lifetime)` after the lifetime shrank.
    /// Needed in modes where `step` does not run.
    pub fn clamp_ages(&self, particles: &mut ParticleFields) -> Result<(), GpuError> {
        expire_ages(&self.age, &mut particles.ages)
    }

    pub fn set_trail_length(&mut self, trail_length: f32) -> Result<(), GpuError> {
        self.fade
            .set_uniform("increment", Uniform::Float(trail_increment(trail_length)))
    }

    pub fn update_dimensions(&mut self, display: (u32, u32)) -> Result<(), GpuError> {
        let dimensions = Vec2::new(display.0 as f32, display.1 as f32);
        self.advect.set_uniform("dimensions", Uniform::Vec2(dimensions))?;
        self.render.set_uniform("dimensions", Uniform::Vec2(dimensions))
    }

    /// Run the particle half of a fluid-mode frame
    pub fn step(
        &self,
        particles: &mut ParticleFields,
        velocity: &GridField<[f32; 2]>,
        trails: &mut GridField<f32>,
    ) -> Result<ParticleUpdate, GpuError> {
        age_particles(&self.age, &mut particles.ages)?;
        fade_trails(&self.fade, trails)?;

        for _ in 0..self.render_steps {
            advect_particles(
                &self.advect,
                &mut particles.positions,
                velocity,
                &particles.ages,
                &particles.initial_positions,
            )?;
            render_particles(&self.render, &particles.positions, &particles.ages, velocity, trails)?;
        }

        Ok(ParticleUpdate {
            particle_count: particles.count(),
            render_steps: self.render_steps,
        })
    }
}
