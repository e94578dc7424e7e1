use crate::gpu::{FieldDescriptor, FilterMode, GpuError, GridField, NumericType, WrapMode};

/// Velocity grid size for a display surface: display size divided by the scale factor, rounded up
pub fn velocity_grid_size(display_width: u32, display_height: u32, scale_factor: u32) -> (u32, u32) {
    let scale = scale_factor.max(1);
    (
        (display_width + scale - 1) / scale,
        (display_height + scale - 1) / scale,
    )
}

/// Fluid solver constants consumed by the kernels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidConstants {
    /// Jacobi iterations per frame, fixed when the solver is built
    pub jacobi_iterations: u32,

    /// Jacobi weights
    pub pressure_alpha: f32,
    pub pressure_beta: f32,

    /// Velocity multiplier applied after projection, `None` when damping is off
    pub damping: Option<f32>,
}

impl Default for FluidConstants {
    fn default() -> Self {
        use crate::constants::fluid;
        Self {
            jacobi_iterations: fluid::JACOBI_ITERATIONS,
            pressure_alpha: fluid::PRESSURE_ALPHA,
            pressure_beta: fluid::PRESSURE_BETA,
            damping: None,
        }
    }
}

/// Grid fields owned by the fluid solver
pub struct FluidFields {
    /// Velocity in display pixels per frame (double-buffered, linear, wrapping)
    pub velocity: GridField<[f32; 2]>,

    /// Divergence of the advected velocity (written once per frame)
    pub divergence: GridField<f32>,

    /// Pressure (double-buffered, warm-started across frames)
    pub pressure: GridField<f32>,

    /// Display-resolution boundary mask, present when the boundary modifier is enabled
    pub boundary: Option<GridField<f32>>,
}

impl FluidFields {
    /// Allocate zeroed fields. `precision` is the declared float type of the solver grids.
    pub fn allocate(
        grid: (u32, u32),
        display: (u32, u32),
        precision: NumericType,
        with_boundary: bool,
    ) -> Result<Self, GpuError> {
        let velocity = GridField::allocate(
            FieldDescriptor::new("velocity", precision)
                .with_filter(FilterMode::Linear)
                .with_wrap(WrapMode::Repeat)
                .double_buffered(),
            grid.0,
            grid.1,
        )?;
        let divergence = GridField::allocate(
            FieldDescriptor::new("divergence", precision).with_wrap(WrapMode::Repeat),
            grid.0,
            grid.1,
        )?;
        let pressure = GridField::allocate(
            FieldDescriptor::new("pressure", precision)
                .with_wrap(WrapMode::Repeat)
                .double_buffered(),
            grid.0,
            grid.1,
        )?;
        let boundary = if with_boundary {
            Some(GridField::allocate(
                FieldDescriptor::new("boundary", NumericType::Float32).with_wrap(WrapMode::Repeat),
                display.0,
                display.1,
            )?)
        } else {
            None
        };

        Ok(Self {
            velocity,
            divergence,
            pressure,
            boundary,
        })
    }

    /// Fresh zeroed fields with the same descriptors at new sizes
    pub fn reallocated(&self, grid: (u32, u32), display: (u32, u32)) -> Result<Self, GpuError> {
        let boundary = match &self.boundary {
            Some(field) => Some(field.reallocated(display.0, display.1, None)?),
            None => None,
        };
        Ok(Self {
            velocity: self.velocity.reallocated(grid.0, grid.1, None)?,
            divergence: self.divergence.reallocated(grid.0, grid.1, None)?,
            pressure: self.pressure.reallocated(grid.0, grid.1, None)?,
            boundary,
        })
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.velocity.width(), self.velocity.height())
    }

    /// Release every field; returns how many were released
    pub fn dispose(&mut self) -> Result<usize, GpuError> {
        self.velocity.dispose()?;
        self.divergence.dispose()?;
        self.pressure.dispose()?;
        let mut released = 3;
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.dispose()?;
            released += 1;
        }
        Ok(released)
    }
}
