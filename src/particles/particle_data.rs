use rand::Rng;

use crate::gpu::{FieldDescriptor, GpuError, GridField, NumericType};

/// Particle count for a surface: `min(ceil(width * height * density), max_particles)`
pub fn particle_count(width: u32, height: u32, density: f64, max_particles: u32) -> u32 {
    let raw = width as f64 * height as f64 * density;
    // Absorb representation error of decimal densities (e.g. 0.1) before rounding up
    let count = (raw - raw * 1e-12).ceil().max(0.0);
    count.min(max_particles as f64) as u32
}

/// Initial particle state ready for upload
#[derive(Debug, Clone)]
pub struct ParticleSeed {
    /// absolute.xy, displacement.zw
    pub positions: Vec<[f32; 4]>,
    pub ages: Vec<i16>,
}

impl ParticleSeed {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Uniformly random positions over the surface with zero displacement, and ages in `[0, lifetime)`
pub fn seed_particles<R: Rng>(count: u32, width: u32, height: u32, lifetime: u32, rng: &mut R) -> ParticleSeed {
    let mut positions = Vec::with_capacity(count as usize);
    let mut ages = Vec::with_capacity(count as usize);
    let lifetime = lifetime.clamp(1, i16::MAX as u32) as i16;

    for _ in 0..count {
        let x = rng.gen::<f32>() * width as f32;
        let y = rng.gen::<f32>() * height as f32;
        positions.push([x, y, 0.0, 0.0]);
        ages.push(rng.gen_range(0..lifetime));
    }

    ParticleSeed { positions, ages }
}

/// The three parallel particle fields, one element per particle. Elements
/// are packed row by row so no row is wider than the backend allows.
pub struct ParticleFields {
    /// Current position split as absolute + displacement
    pub positions: GridField<[f32; 4]>,

    /// Reseed target, written only at (re)seed time
    pub initial_positions: GridField<[f32; 4]>,

    /// Age in ticks
    pub ages: GridField<i16>,
}

impl ParticleFields {
    pub fn allocate(seed: &ParticleSeed, max_row_width: u32) -> Result<Self, GpuError> {
        let count = seed.len() as u32;
        let mut positions = GridField::allocate_1d(
            FieldDescriptor::new("position", NumericType::Float32)
                .double_buffered()
                .packed(max_row_width),
            count,
        )?;
        let mut initial_positions = GridField::allocate_1d(
            FieldDescriptor::new("initialPosition", NumericType::Float32).packed(max_row_width),
            count,
        )?;
        let mut ages = GridField::allocate_1d(
            FieldDescriptor::new("age", NumericType::Int16)
                .double_buffered()
                .packed(max_row_width),
            count,
        )?;

        positions.write(&seed.positions)?;
        initial_positions.write(&seed.positions)?;
        ages.write(&seed.ages)?;

        Ok(Self {
            positions,
            initial_positions,
            ages,
        })
    }

    /// Fresh fields with the same descriptors holding `seed`
    pub fn reseeded(&self, seed: &ParticleSeed) -> Result<Self, GpuError> {
        let count = seed.len() as u32;
        Ok(Self {
            positions: self.positions.reallocated_1d(count, Some(&seed.positions))?,
            initial_positions: self.initial_positions.reallocated_1d(count, Some(&seed.positions))?,
            ages: self.ages.reallocated_1d(count, Some(&seed.ages))?,
        })
    }

    pub fn count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn dispose(&mut self) -> Result<usize, GpuError> {
        self.positions.dispose()?;
        self.initial_positions.dispose()?;
        self.ages.dispose()?;
        Ok(3)
    }
}
