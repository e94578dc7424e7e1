/// Engine facade: owns every field and kernel, runs the per-frame sequence
/// and mediates parameter changes, resizes and disposal.

pub mod config;
pub mod inbox;
pub mod lifecycle;

pub use config::{
    Band, ConfigError, EngineConfig, ModifierConfig, Parameter, ParticleConfig, SimulationParams, SolverConfig,
};
pub use inbox::{EngineInbox, InboxMessages, SpectrumSnapshot};
pub use lifecycle::{SimulationState, SurfaceLayout};

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use thiserror::Error;

use crate::audio::{AudioForcing, FrequencyBands, ParticleColor};
use crate::fluid::{BoundaryMask, FluidPipeline};
use crate::forces::{ForceImpulse, ForceInjector};
use crate::gpu::{ComputeCapabilities, GpuError, HostCapabilities, NumericType};
use crate::particles::{seed_particles, ParticleSystem};
use crate::renderer::{ColorBuffer, Compositor, RenderMode};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image export failed: {0}")]
    Export(#[from] image::ImageError),

    #[error("Engine used after dispose")]
    Disposed,
}

/// Output surface handed to the engine at init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub width: u32,
    pub height: u32,
}

impl SurfaceDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scalar status reported after each frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStatus {
    pub frame: u64,
    /// False when the surface is hidden and the frame was skipped
    pub rendered: bool,
    pub render_mode: RenderMode,
    pub particle_count: u32,
    pub impulses_applied: usize,
    /// Smoothed audio bands
    pub bands: FrequencyBands,
    pub particle_color: Vec3,
    /// Display offset requested by global audio forcing
    pub shake: Vec2,
    /// A PNG was requested and this frame's colour buffer is ready to save
    pub png_ready: bool,
}

pub struct FluidEngine {
    config: EngineConfig,
    capabilities: Box<dyn ComputeCapabilities>,
    precision: NumericType,
    layout: SurfaceLayout,
    state: Option<SimulationState>,

    pipeline: FluidPipeline,
    particles: ParticleSystem,
    forces: ForceInjector,
    audio: AudioForcing,
    color: ParticleColor,
    compositor: Compositor,

    rng: StdRng,
    inbox: EngineInbox,
    pending_impulses: Vec<ForceImpulse>,
    pending_spectrum: Option<SpectrumSnapshot>,
    shake: Vec2,
    visible: bool,
    png_requested: bool,
    frame: u64,
}

impl FluidEngine {
    /// Create an engine on the host backend
    pub fn init(surface: SurfaceDescriptor, config: EngineConfig) -> Result<Self, EngineError> {
        Self::init_with_capabilities(surface, config, Box::new(HostCapabilities::default()))
    }

    pub fn init_with_capabilities(
        surface: SurfaceDescriptor,
        config: EngineConfig,
        capabilities: Box<dyn ComputeCapabilities>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let precision = if capabilities.supports_float32_linear_filter() {
            NumericType::Float32
        } else {
            log::warn!(
                "[FluidEngine] '{}' cannot filter float32 fields, declaring solver fields as float16",
                capabilities.adapter_name()
            );
            NumericType::Float16
        };

        let layout = SurfaceLayout::new(surface.width, surface.height, &config, capabilities.as_ref())?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let state = SimulationState::allocate(
            &layout,
            precision,
            config.modifiers.boundary,
            config.particles.lifetime,
            capabilities.max_grid_dimension(),
            &mut rng,
        )?;

        let boundary = if config.modifiers.boundary {
            let mut mask = BoundaryMask::new();
            mask.set_radius(config.modifiers.boundary_base_radius)?;
            Some(mask)
        } else {
            None
        };
        let sim = &config.simulation;
        let pipeline = FluidPipeline::new(config.fluid_constants(), boundary)?;
        let particles = ParticleSystem::new(config.particles.render_steps, config.particles.lifetime, sim.trail_length)?;
        let forces = ForceInjector::new(sim.touch_force_scale, sim.max_velocity)?;
        let compositor = Compositor::new(config.background)?;
        let audio = AudioForcing::new(config.audio.clone());
        let color = ParticleColor::new(config.audio.color_smoothing);

        let mut engine = Self {
            config,
            capabilities,
            precision,
            layout,
            state: Some(state),
            pipeline,
            particles,
            forces,
            audio,
            color,
            compositor,
            rng,
            inbox: EngineInbox::new(),
            pending_impulses: Vec::new(),
            pending_spectrum: None,
            shake: Vec2::ZERO,
            visible: true,
            png_requested: false,
            frame: 0,
        };
        engine.push_dimensions()?;

        log::info!(
            "[FluidEngine] Initialized {}x{} surface on '{}': grid {}x{}, {} particles, {:?} solver fields",
            layout.display.0,
            layout.display.1,
            engine.capabilities.adapter_name(),
            layout.grid.0,
            layout.grid.1,
            layout.particle_count,
            precision
        );
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    pub fn particle_count(&self) -> u32 {
        self.layout.particle_count
    }

    pub fn precision(&self) -> NumericType {
        self.precision
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Current particle lifetime, including audio modulation
    pub fn lifetime(&self) -> Result<u32, EngineError> {
        Ok(self.particles.lifetime()? as u32)
    }

    /// Shared mailbox for asynchronous producers
    pub fn inbox(&self) -> EngineInbox {
        self.inbox.clone()
    }

    /// Read access to every field
    pub fn state(&self) -> Result<&SimulationState, EngineError> {
        self.state.as_ref().ok_or(EngineError::Disposed)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_none()
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.state.is_some() {
            Ok(())
        } else {
            Err(EngineError::Disposed)
        }
    }

    /// Push surface-dependent uniforms into every kernel that consumes them
    fn push_dimensions(&mut self) -> Result<(), EngineError> {
        let SurfaceLayout { display, grid, .. } = self.layout;
        self.pipeline.update_dimensions(display, grid)?;
        self.particles.update_dimensions(display)?;
        self.forces.update_dimensions(display)?;
        Ok(())
    }

    /// Build every field for `layout` and commit only once all allocations succeeded
    fn reallocate(&mut self, layout: SurfaceLayout) -> Result<(), EngineError> {
        let lifetime = self.particles.lifetime()? as u32;
        let state = self.state.as_ref().ok_or(EngineError::Disposed)?;
        let fresh = state.reallocated(&layout, lifetime, &mut self.rng)?;

        self.state = Some(fresh);
        self.layout = layout;
        self.push_dimensions()
    }

    /// Resize immediately. Invalid sizes are rejected and leave the engine unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.ensure_live()?;
        let layout = SurfaceLayout::new(width, height, &self.config, self.capabilities.as_ref())?;
        self.reallocate(layout)?;

        log::info!(
            "[FluidEngine] Resized to {}x{}: grid {}x{}, {} particles",
            width,
            height,
            layout.grid.0,
            layout.grid.1,
            layout.particle_count
        );
        Ok(())
    }

    /// Clear every field and reseed particles at the current size
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.reallocate(self.layout)?;
        self.audio.reset();
        self.pending_impulses.clear();
        self.shake = Vec2::ZERO;
        log::info!("[FluidEngine] Reset with {} particles", self.layout.particle_count);
        Ok(())
    }

    /// Validate and apply a parameter. On error nothing changes.
    pub fn set_parameter(&mut self, parameter: Parameter) -> Result<(), EngineError> {
        self.ensure_live()?;
        parameter.validate()?;

        match parameter {
            Parameter::TrailLength(v) => self.particles.set_trail_length(v)?,
            Parameter::ParticleDensity(_) => {
                let mut config = self.config.clone();
                parameter.apply_to(&mut config);
                let (width, height) = self.layout.display;
                let layout = SurfaceLayout::new(width, height, &config, self.capabilities.as_ref())?;
                let lifetime = self.particles.lifetime()? as u32;

                let state = self.state.as_mut().ok_or(EngineError::Disposed)?;
                let seed = seed_particles(layout.particle_count, width, height, lifetime, &mut self.rng);
                state.particles = state.particles.reseeded(&seed)?;
                self.layout = layout;
                log::info!("[FluidEngine] Reseeded {} particles", layout.particle_count);
            }
            Parameter::MaxVelocity(v) => self.forces.set_max_velocity(v)?,
            Parameter::TouchForceScale(v) => self.forces.set_force_scale(v)?,
            Parameter::Damping(v) => self.pipeline.set_damping(v)?,
            Parameter::RenderMode(_) | Parameter::Sensitivity(..) | Parameter::BoundaryScale(_) => {}
        }

        parameter.apply_to(&mut self.config);
        if let Parameter::Sensitivity(..) = parameter {
            self.audio.set_sensitivity(self.config.audio.sensitivity);
        }
        log::debug!("[FluidEngine] Set {:?}", parameter);
        Ok(())
    }

    /// Queue an impulse for the next frame's force injection
    pub fn apply_force(&mut self, impulse: ForceImpulse) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.pending_impulses.push(impulse);
        Ok(())
    }

    /// Queue a capped segment impulse
    pub fn apply_segment(&mut self, p1: Vec2, p2: Vec2, thickness: f32, vector: Vec2) -> Result<(), EngineError> {
        self.apply_force(ForceImpulse::segment(p1, p2, thickness, vector))
    }

    /// Hand over a spectrum snapshot (byte-scale magnitudes). Empty or
    /// non-finite snapshots are ignored.
    pub fn feed_audio_spectrum(&mut self, magnitudes: &[f32], sample_rate: Option<f32>) -> Result<(), EngineError> {
        self.ensure_live()?;
        if !self.config.audio.enabled {
            return Ok(());
        }
        if magnitudes.is_empty() || magnitudes.iter().any(|m| !m.is_finite()) {
            log::warn!("[FluidEngine] Ignoring spectrum snapshot with {} bins", magnitudes.len());
            return Ok(());
        }
        self.pending_spectrum = Some(SpectrumSnapshot {
            magnitudes: magnitudes.to_vec(),
            sample_rate,
        });
        Ok(())
    }

    /// Hidden surfaces skip simulation and rendering
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Ask for the next rendered frame to be flagged for export
    pub fn request_png(&mut self) {
        self.png_requested = true;
    }

    pub fn color_buffer(&self) -> Result<ColorBuffer<'_>, EngineError> {
        let state = self.state()?;
        Ok(ColorBuffer {
            width: state.display.width(),
            height: state.display.height(),
            pixels: state.display.front(),
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        crate::renderer::save_png(&self.color_buffer()?, path)?;
        Ok(())
    }

    /// Advance one frame.
    ///
    /// Order: inbox, audio forcing, force injection, fluid solve, colour
    /// easing, then the composite for the current render mode. A failed frame
    /// is logged and reported; the next call runs normally.
    pub fn step(&mut self) -> Result<FrameStatus, EngineError> {
        self.ensure_live()?;

        let messages = self.inbox.drain();
        if let Some((width, height)) = messages.resize {
            if let Err(err) = self.resize(width, height) {
                log::error!("[FluidEngine] Deferred resize to {}x{} failed: {}", width, height, err);
            }
        }
        if let Some(snapshot) = messages.spectrum {
            self.feed_audio_spectrum(&snapshot.magnitudes, snapshot.sample_rate)?;
        }
        self.pending_impulses.extend(messages.impulses);

        self.frame += 1;
        if !self.visible {
            return Ok(FrameStatus {
                frame: self.frame,
                rendered: false,
                render_mode: self.config.simulation.render_mode,
                particle_count: self.layout.particle_count,
                impulses_applied: 0,
                bands: self.audio.smoothed(),
                particle_color: self.color.current,
                shake: self.shake,
                png_ready: false,
            });
        }

        self.run_frame().map_err(|err| {
            log::error!("[FluidEngine] Frame {} failed: {}", self.frame, err);
            err
        })
    }

    fn run_frame(&mut self) -> Result<FrameStatus, EngineError> {
        let mut impulses = std::mem::take(&mut self.pending_impulses);

        // Audio forcing
        if let Some(snapshot) = self.pending_spectrum.take() {
            let response = self.audio.process(
                &snapshot.magnitudes,
                snapshot.sample_rate,
                self.layout.display,
                self.config.simulation.max_velocity,
                &mut self.rng,
            );
            match response {
                Some(response) => {
                    impulses.extend(response.impulses);
                    self.color.target = response.target_color;
                    self.shake = response.shake;
                    if let Some(factor) = response.lifetime_factor {
                        let lifetime = (self.config.particles.lifetime as f32 * factor).round() as u32;
                        let previous = self.particles.lifetime()?;
                        self.particles.set_lifetime(lifetime)?;
                        if self.particles.lifetime()? < previous {
                            if let Some(state) = self.state.as_mut() {
                                self.particles.clamp_ages(&mut state.particles)?;
                            }
                        }
                    }
                    let modifiers = &self.config.modifiers;
                    self.pipeline
                        .set_boundary_radius(modifiers.boundary_base_radius + response.bands.low * modifiers.boundary_scale)?;
                }
                None => log::warn!(
                    "[FluidEngine] Ignoring spectrum snapshot ({} bins, sample rate {:?})",
                    snapshot.magnitudes.len(),
                    snapshot.sample_rate
                ),
            }
        }

        let state = self.state.as_mut().ok_or(EngineError::Disposed)?;

        // Force injection
        let impulses_applied = self.forces.apply(&mut state.fluid.velocity, &impulses)?;

        // Fluid solve
        self.pipeline.step(&mut state.fluid)?;

        let particle_color = self.color.ease();
        self.compositor.set_particle_color(particle_color)?;

        let render_mode = self.config.simulation.render_mode;
        match render_mode {
            RenderMode::Fluid => {
                self.particles.step(&mut state.particles, &state.fluid.velocity, &mut state.trails)?;
                self.compositor.trails(&state.trails, &mut state.display)?;
            }
            RenderMode::Pressure => self.compositor.pressure(&state.fluid.pressure, &mut state.display)?,
            RenderMode::Velocity => self.compositor.velocity(&state.fluid.velocity, &mut state.display)?,
        }

        let png_ready = std::mem::take(&mut self.png_requested);
        log::debug!(
            "[FluidEngine] Frame {}: {:?}, {} impulses",
            self.frame,
            render_mode,
            impulses_applied
        );

        Ok(FrameStatus {
            frame: self.frame,
            rendered: true,
            render_mode,
            particle_count: self.layout.particle_count,
            impulses_applied,
            bands: self.audio.smoothed(),
            particle_color,
            shake: self.shake,
            png_ready,
        })
    }

    /// Release every field. A second call, or any use afterwards, is an error.
    pub fn dispose(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.take().ok_or(EngineError::Disposed)?;
        let released = state.dispose()?;
        self.pending_impulses.clear();
        self.pending_spectrum = None;
        log::info!("[FluidEngine] Disposed, released {} fields", released);
        Ok(())
    }
}
