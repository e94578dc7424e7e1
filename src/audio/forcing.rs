use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::audio::spectrum::{frequency_ranges, BandSmoother, BandSplit, FrequencyBands, Normalization};
use crate::constants::audio::{
    COLOR_SMOOTHING, GLOBAL_FORCE_FACTOR, MAX_FORCE, MAX_SHAKE, POINT_FORCE_THRESHOLD, SMOOTHING_FACTOR,
};
use crate::constants::render::INITIAL_PARTICLE_COLOR;
use crate::forces::{ForceImpulse, ImpulseShape};

/// Where band forces are injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForcingTopology {
    /// One capped point impulse per loud band at a random position
    #[default]
    RandomPoints,
    /// Summed force over the whole surface plus a shake offset
    Global,
    /// Left, centre and right thirds pushed down, right and up
    ThreeRegion,
}

/// Power-law response of one band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandResponse {
    pub exponent: f32,
    pub gain: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub split: BandSplit,
    pub normalization: Normalization,
    pub smoothing: f32,
    pub topology: ForcingTopology,
    /// Per-band multiplier on top of the response
    pub sensitivity: FrequencyBands,
    pub low: BandResponse,
    pub mid: BandResponse,
    pub high: BandResponse,
    pub max_force: f32,
    /// Particle colour per band, blended by band strength
    pub band_colors: [[f32; 3]; 3],
    pub color_smoothing: f32,
    /// Scale particle lifetime by `1 + low`
    pub modulate_lifetime: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            split: BandSplit::default(),
            normalization: Normalization::default(),
            smoothing: SMOOTHING_FACTOR,
            topology: ForcingTopology::default(),
            sensitivity: FrequencyBands::new(1.0, 1.0, 1.0),
            low: BandResponse { exponent: 1.0, gain: 1.0 },
            mid: BandResponse { exponent: 1.0, gain: 0.5 },
            high: BandResponse { exponent: 1.0, gain: 0.25 },
            max_force: MAX_FORCE,
            band_colors: [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            color_smoothing: COLOR_SMOOTHING,
            modulate_lifetime: false,
        }
    }
}

/// Everything one spectrum snapshot asks of the engine
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResponse {
    pub bands: FrequencyBands,
    pub forces: FrequencyBands,
    pub impulses: Vec<ForceImpulse>,
    pub target_color: Vec3,
    /// Multiplier on the base particle lifetime, when modulation is on
    pub lifetime_factor: Option<f32>,
    pub shake: Vec2,
}

/// Maps smoothed band strengths to impulses, colour and lifetime changes
#[derive(Debug, Clone)]
pub struct AudioForcing {
    config: AudioConfig,
    smoother: BandSmoother,
}

impl AudioForcing {
    pub fn new(config: AudioConfig) -> Self {
        let smoother = BandSmoother::new(config.smoothing);
        Self { config, smoother }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn smoothed(&self) -> FrequencyBands {
        self.smoother.value()
    }

    pub fn set_sensitivity(&mut self, sensitivity: FrequencyBands) {
        self.config.sensitivity = sensitivity;
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
    }

    /// `min(s^exponent * gain * max_velocity * sensitivity, max_force)` per band
    pub fn band_forces(&self, smoothed: FrequencyBands, max_velocity: f32) -> FrequencyBands {
        let force = |s: f32, response: &BandResponse, sensitivity: f32| {
            (s.max(0.0).powf(response.exponent) * response.gain * max_velocity * sensitivity)
                .min(self.config.max_force)
        };
        FrequencyBands::new(
            force(smoothed.low, &self.config.low, self.config.sensitivity.low),
            force(smoothed.mid, &self.config.mid, self.config.sensitivity.mid),
            force(smoothed.high, &self.config.high, self.config.sensitivity.high),
        )
    }

    /// Weighted sum of band colours
    pub fn target_color(&self, bands: FrequencyBands) -> Vec3 {
        self.config
            .band_colors
            .iter()
            .zip(bands.as_array())
            .fold(Vec3::ZERO, |acc, (color, weight)| acc + Vec3::from(*color) * weight)
    }

    /// Analyse one snapshot. `None` when the snapshot is unusable; smoothing state is then untouched.
    pub fn process<R: Rng>(
        &mut self,
        magnitudes: &[f32],
        sample_rate: Option<f32>,
        surface: (u32, u32),
        max_velocity: f32,
        rng: &mut R,
    ) -> Option<AudioResponse> {
        let sample = frequency_ranges(magnitudes, self.config.split, self.config.normalization, sample_rate)?;
        let bands = self.smoother.smooth(sample);
        let forces = self.band_forces(bands, max_velocity);
        let size = Vec2::new(surface.0 as f32, surface.1 as f32);

        let mut shake = Vec2::ZERO;
        let impulses = match self.config.topology {
            ForcingTopology::RandomPoints => random_point_impulses(forces, size, rng),
            ForcingTopology::Global => {
                let max_total = max_velocity * GLOBAL_FORCE_FACTOR;
                let total = (forces.low + forces.mid + forces.high).min(max_total);
                if total > 0.0 {
                    let direction = random_direction(rng);
                    let magnitude = total / max_total * MAX_SHAKE;
                    shake = Vec2::new(
                        (rng.gen::<f32>() - 0.5) * 2.0 * magnitude,
                        (rng.gen::<f32>() - 0.5) * 2.0 * magnitude,
                    );
                    vec![ForceImpulse::region(Vec2::ZERO, size, direction * total)]
                } else {
                    Vec::new()
                }
            }
            ForcingTopology::ThreeRegion => three_region_impulses(forces, size),
        };

        Some(AudioResponse {
            bands,
            forces,
            impulses,
            target_color: self.target_color(bands),
            lifetime_factor: self.config.modulate_lifetime.then_some(1.0 + bands.low),
            shake,
        })
    }
}

fn random_direction<R: Rng>(rng: &mut R) -> Vec2 {
    let angle = rng.gen::<f32>() * TAU;
    Vec2::new(angle.cos(), angle.sin())
}

fn random_point_impulses<R: Rng>(forces: FrequencyBands, size: Vec2, rng: &mut R) -> Vec<ForceImpulse> {
    const THICKNESS: [f32; 3] = [50.0, 30.0, 10.0];

    forces
        .as_array()
        .into_iter()
        .zip(THICKNESS)
        .filter(|(force, _)| *force > POINT_FORCE_THRESHOLD)
        .map(|(force, thickness)| {
            let position = Vec2::new(rng.gen::<f32>() * size.x, rng.gen::<f32>() * size.y);
            ForceImpulse {
                shape: ImpulseShape::point(position, thickness),
                vector: random_direction(rng) * force,
            }
        })
        .collect()
}

fn three_region_impulses(forces: FrequencyBands, size: Vec2) -> Vec<ForceImpulse> {
    let third = size.x / 3.0;
    let directions = [Vec2::NEG_Y, Vec2::X, Vec2::Y];

    forces
        .as_array()
        .into_iter()
        .zip(directions)
        .enumerate()
        .filter(|(_, (force, _))| *force > 0.0)
        .map(|(i, (force, direction))| {
            let min = Vec2::new(third * i as f32, 0.0);
            let max = Vec2::new(third * (i + 1) as f32, size.y);
            ForceImpulse::region(min, max, direction * force)
        })
        .collect()
}

/// Particle colour eased toward the audio target each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleColor {
    pub current: Vec3,
    pub target: Vec3,
    smoothing: f32,
}

impl ParticleColor {
    pub fn new(smoothing: f32) -> Self {
        let initial = Vec3::from(INITIAL_PARTICLE_COLOR);
        Self {
            current: initial,
            target: initial,
            smoothing,
        }
    }

    pub fn ease(&mut self) -> Vec3 {
        self.current += (self.target - self.current) * self.smoothing;
        self.current
    }
}
