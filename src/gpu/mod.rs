//! Compute primitives: grid fields, kernels and backend capabilities.
//!
//! Kernels run as row-parallel passes on the host; dispatches within a frame
//! are issued strictly in order.

pub mod capabilities;
pub mod grid_field;
pub mod kernel;

pub use capabilities::{ComputeCapabilities, HostCapabilities, WgpuCapabilities};
pub use grid_field::{
    FieldDescriptor, FieldView, FilterMode, GridField, NumericType, PointBlend, Texel, WrapMode,
};
pub use kernel::{Kernel, KernelDescriptor, Uniform, UniformKind, UniformSpec};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("Out of memory allocating field '{name}' ({bytes} bytes)")]
    OutOfMemory { name: &'static str, bytes: u64 },

    #[error("Invalid dimensions for field '{name}': {width}x{height}")]
    InvalidDimensions {
        name: &'static str,
        width: u32,
        height: u32,
    },

    #[error("Field '{name}' size mismatch: expected {expected} texels, got {actual}")]
    SizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid field descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Field '{name}' is single-buffered and cannot be stepped in place")]
    SingleBuffered { name: &'static str },

    #[error("Field '{name}' used after dispose")]
    Disposed { name: &'static str },

    #[error("Kernel '{kernel}' has no uniform '{uniform}'")]
    UnknownUniform { kernel: &'static str, uniform: String },

    #[error("Kernel '{kernel}' uniform '{uniform}' is {expected:?}, got {actual:?}")]
    UniformKind {
        kernel: &'static str,
        uniform: String,
        expected: UniformKind,
        actual: UniformKind,
    },
}
