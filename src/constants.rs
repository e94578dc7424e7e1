// Fluid Engine Constants
//
// Reference values shared by the configuration defaults and the kernels.
// Runtime-tunable values live in `EngineConfig`; these are their defaults.

/// Fluid solver constants
pub mod fluid {
    /// Display pixels per velocity texel along each axis
    pub const VELOCITY_SCALE_FACTOR: u32 = 8;

    /// Jacobi relaxation iterations per frame
    pub const JACOBI_ITERATIONS: u32 = 3;

    /// Jacobi weights for the pressure Poisson solve
    pub const PRESSURE_ALPHA: f32 = -1.0;
    pub const PRESSURE_BETA: f32 = 0.25;

    /// Velocity multiplier applied by the damping modifier
    pub const DAMPING_FACTOR: f32 = 0.98;

    /// Circular boundary mask
    pub const BOUNDARY_BASE_RADIUS: f32 = 100.0;
    pub const BOUNDARY_SCALE: f32 = 50.0;
    pub const BOUNDARY_EDGE_WIDTH: f32 = 5.0;
}

/// Particle and trail constants
pub mod particles {
    pub const MAX_PARTICLES: u32 = 100_000;
    pub const PARTICLE_LIFETIME: u32 = 1000;
    pub const PARTICLE_DENSITY: f64 = 0.1;

    /// Sub-steps of particle advection per frame
    pub const RENDER_STEPS: u32 = 3;

    /// Squared displacement at which displacement folds into the absolute position
    pub const MERGE_THRESHOLD: f32 = 20.0;

    /// Fraction of the lifetime faded in at birth and out before expiry
    pub const FADE_FRACTION: f32 = 0.1;

    pub const TRAIL_LENGTH: f32 = 15.0;
}

/// Simulation parameter defaults
pub mod simulation {
    pub const MAX_VELOCITY: f32 = 30.0;
    pub const TOUCH_FORCE_SCALE: f32 = 2.0;
    pub const POINTER_THICKNESS: f32 = 30.0;
}

/// Audio forcing constants
pub mod audio {
    /// Byte-scale magnitude ceiling of a spectrum bin
    pub const MAX_MAGNITUDE: f32 = 255.0;

    pub const SMOOTHING_FACTOR: f32 = 0.5;
    pub const COLOR_SMOOTHING: f32 = 0.8;
    pub const MAX_FORCE: f32 = 50.0;

    /// Minimum band force that spawns a point impulse
    pub const POINT_FORCE_THRESHOLD: f32 = 5.0;

    /// Total force cap of global forcing, as a multiple of max velocity
    pub const GLOBAL_FORCE_FACTOR: f32 = 1.5;

    /// Largest shake offset in display pixels
    pub const MAX_SHAKE: f32 = 10.0;

    /// Frequency band edges in Hz
    pub const LOW_BAND_HZ: (f32, f32) = (20.0, 250.0);
    pub const MID_BAND_HZ: (f32, f32) = (250.0, 4000.0);
    pub const HIGH_BAND_HZ: (f32, f32) = (4000.0, 20000.0);
}

/// Presentation constants
pub mod render {
    pub const BACKGROUND: [f32; 3] = [0.1, 0.1, 0.2];
    pub const INITIAL_PARTICLE_COLOR: [f32; 3] = [0.0, 0.0, 1.0];
    pub const PRESSURE_SCALE: f32 = 0.5;
    pub const VECTOR_SPACING: u32 = 10;
    pub const VECTOR_SCALE: f32 = 2.5;
}
