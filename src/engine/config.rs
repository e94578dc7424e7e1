use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::audio::{AudioConfig, FrequencyBands};
use crate::constants::{fluid, particles, render, simulation};
use crate::fluid::FluidConstants;
use crate::renderer::RenderMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Cannot parse '{value}' for parameter '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// Runtime-tunable simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Frames a full-brightness trail takes to fade out; 0 clears every frame
    pub trail_length: f32,
    /// Particles per display pixel
    pub particle_density: f64,
    pub max_velocity: f32,
    pub touch_force_scale: f32,
    pub render_mode: RenderMode,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            trail_length: particles::TRAIL_LENGTH,
            particle_density: particles::PARTICLE_DENSITY,
            max_velocity: simulation::MAX_VELOCITY,
            touch_force_scale: simulation::TOUCH_FORCE_SCALE,
            render_mode: RenderMode::Fluid,
        }
    }
}

/// Solver constants fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub velocity_scale_factor: u32,
    pub jacobi_iterations: u32,
    pub pressure_alpha: f32,
    pub pressure_beta: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            velocity_scale_factor: fluid::VELOCITY_SCALE_FACTOR,
            jacobi_iterations: fluid::JACOBI_ITERATIONS,
            pressure_alpha: fluid::PRESSURE_ALPHA,
            pressure_beta: fluid::PRESSURE_BETA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub lifetime: u32,
    pub max_particles: u32,
    pub render_steps: u32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            lifetime: particles::PARTICLE_LIFETIME,
            max_particles: particles::MAX_PARTICLES,
            render_steps: particles::RENDER_STEPS,
        }
    }
}

/// Post-projection velocity modifiers. Each is independent of the others
/// and of the forcing topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    /// Velocity multiplier per frame, off when absent
    pub damping: Option<f32>,
    pub boundary: bool,
    pub boundary_base_radius: f32,
    /// Boundary radius growth per unit of low-band strength
    pub boundary_scale: f32,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            damping: None,
            boundary: false,
            boundary_base_radius: fluid::BOUNDARY_BASE_RADIUS,
            boundary_scale: fluid::BOUNDARY_SCALE,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub simulation: SimulationParams,
    pub solver: SolverConfig,
    pub particles: ParticleConfig,
    pub modifiers: ModifierConfig,
    pub audio: AudioConfig,
    pub background: [f32; 3],
    /// Seed of the engine RNG (particle seeding and audio forcing)
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationParams::default(),
            solver: SolverConfig::default(),
            particles: ParticleConfig::default(),
            modifiers: ModifierConfig::default(),
            audio: AudioConfig::default(),
            background: render::BACKGROUND,
            seed: 0x5eed,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn fluid_constants(&self) -> FluidConstants {
        FluidConstants {
            jacobi_iterations: self.solver.jacobi_iterations,
            pressure_alpha: self.solver.pressure_alpha,
            pressure_beta: self.solver.pressure_beta,
            damping: self.modifiers.damping,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        validate_trail_length(sim.trail_length)?;
        validate_density(sim.particle_density)?;
        validate_max_velocity(sim.max_velocity)?;
        validate_force_scale(sim.touch_force_scale)?;

        if self.solver.velocity_scale_factor == 0 {
            return Err(invalid("velocity_scale_factor", "must be at least 1"));
        }
        if self.solver.jacobi_iterations == 0 {
            return Err(invalid("jacobi_iterations", "must be at least 1"));
        }
        if self.particles.lifetime == 0 || self.particles.lifetime > i16::MAX as u32 {
            return Err(invalid("lifetime", format!("must be in [1, {}]", i16::MAX)));
        }
        if self.particles.max_particles == 0 {
            return Err(invalid("max_particles", "must be at least 1"));
        }
        if self.particles.render_steps == 0 {
            return Err(invalid("render_steps", "must be at least 1"));
        }

        if let Some(damping) = self.modifiers.damping {
            validate_damping(damping)?;
        }
        if !(self.modifiers.boundary_base_radius.is_finite() && self.modifiers.boundary_base_radius > 0.0) {
            return Err(invalid("boundary_base_radius", "must be positive"));
        }
        validate_non_negative("boundary_scale", self.modifiers.boundary_scale)?;

        let audio = &self.audio;
        for value in audio.sensitivity.as_array() {
            validate_non_negative("sensitivity", value)?;
        }
        validate_unit("smoothing", audio.smoothing)?;
        validate_unit("color_smoothing", audio.color_smoothing)?;
        validate_non_negative("max_force", audio.max_force)?;
        Ok(())
    }
}

fn validate_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite and >= 0, got {}", value)))
    }
}

fn validate_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, format!("must be in [0, 1], got {}", value)))
    }
}

fn validate_trail_length(value: f32) -> Result<(), ConfigError> {
    validate_non_negative("trail_length", value)
}

fn validate_density(value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid("particle_density", format!("must be in (0, 1], got {}", value)))
    }
}

fn validate_max_velocity(value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid("max_velocity", format!("must be positive, got {}", value)))
    }
}

fn validate_force_scale(value: f32) -> Result<(), ConfigError> {
    validate_non_negative("touch_force_scale", value)
}

fn validate_damping(value: f32) -> Result<(), ConfigError> {
    validate_unit("damping", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    Mid,
    High,
}

/// A runtime parameter change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    TrailLength(f32),
    ParticleDensity(f64),
    MaxVelocity(f32),
    TouchForceScale(f32),
    RenderMode(RenderMode),
    Sensitivity(Band, f32),
    Damping(Option<f32>),
    BoundaryScale(f32),
}

impl Parameter {
    /// Parse a parameter from its name and a string value.
    ///
    /// Names match case-insensitively in snake or camel case, e.g.
    /// `trail_length`, `trailLength`, `sensitivity_low`. Damping accepts `off`.
    pub fn from_name(name: &str, value: &str) -> Result<Self, ConfigError> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let value = value.trim();
        let bad_value = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let float = || value.parse::<f32>().map_err(|_| bad_value());

        let parameter = match key.as_str() {
            "traillength" => Parameter::TrailLength(float()?),
            "particledensity" => Parameter::ParticleDensity(value.parse::<f64>().map_err(|_| bad_value())?),
            "maxvelocity" => Parameter::MaxVelocity(float()?),
            "touchforcescale" => Parameter::TouchForceScale(float()?),
            "render" | "rendermode" => Parameter::RenderMode(RenderMode::from_name(value).ok_or_else(bad_value)?),
            "sensitivitylow" => Parameter::Sensitivity(Band::Low, float()?),
            "sensitivitymid" => Parameter::Sensitivity(Band::Mid, float()?),
            "sensitivityhigh" => Parameter::Sensitivity(Band::High, float()?),
            "damping" => match value.to_ascii_lowercase().as_str() {
                "off" | "none" => Parameter::Damping(None),
                _ => Parameter::Damping(Some(float()?)),
            },
            "boundaryscale" => Parameter::BoundaryScale(float()?),
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        };
        Ok(parameter)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Parameter::TrailLength(v) => validate_trail_length(v),
            Parameter::ParticleDensity(v) => validate_density(v),
            Parameter::MaxVelocity(v) => validate_max_velocity(v),
            Parameter::TouchForceScale(v) => validate_force_scale(v),
            Parameter::RenderMode(_) => Ok(()),
            Parameter::Sensitivity(_, v) => validate_non_negative("sensitivity", v),
            Parameter::Damping(Some(v)) => validate_damping(v),
            Parameter::Damping(None) => Ok(()),
            Parameter::BoundaryScale(v) => validate_non_negative("boundary_scale", v),
        }
    }

    /// Write the value into `config`. Callers validate first.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        match *self {
            Parameter::TrailLength(v) => config.simulation.trail_length = v,
            Parameter::ParticleDensity(v) => config.simulation.particle_density = v,
            Parameter::MaxVelocity(v) => config.simulation.max_velocity = v,
            Parameter::TouchForceScale(v) => config.simulation.touch_force_scale = v,
            Parameter::RenderMode(mode) => config.simulation.render_mode = mode,
            Parameter::Sensitivity(band, v) => {
                let sensitivity: &mut FrequencyBands = &mut config.audio.sensitivity;
                match band {
                    Band::Low => sensitivity.low = v,
                    Band::Mid => sensitivity.mid = v,
                    Band::High => sensitivity.high = v,
                }
            }
            Parameter::Damping(v) => config.modifiers.damping = v,
            Parameter::BoundaryScale(v) => config.modifiers.boundary_scale = v,
        }
    }
}
