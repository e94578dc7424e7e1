/// Grid-based incompressible fluid solver.
///
/// Velocity lives on a grid downscaled from the display surface. Each frame
/// runs advection, divergence, a fixed number of Jacobi pressure iterations
/// and gradient subtraction, followed by the optional boundary and damping
/// modifiers.

pub mod boundary;
pub mod fluid_compute;
pub mod fluid_data;
pub mod pressure_solver;

pub use boundary::BoundaryMask;
pub use fluid_compute::{advect, apply_damping, compute_divergence, FluidCompute, FluidPipeline};
pub use fluid_data::{velocity_grid_size, FluidConstants, FluidFields};
pub use pressure_solver::PressureSolver;

#[cfg(test)]
mod tests;
