pub mod audio;
pub mod constants;
pub mod engine;
pub mod fluid;
pub mod forces;
pub mod gpu;
pub mod particles;
pub mod renderer;

pub use audio::{AudioConfig, FrequencyBands};
pub use engine::{
    Band, ConfigError, EngineConfig, EngineError, EngineInbox, FluidEngine, FrameStatus, Parameter, SurfaceDescriptor,
};
pub use forces::{ForceImpulse, ImpulseShape, PointerTracker};
pub use gpu::{ComputeCapabilities, GpuError, HostCapabilities, WgpuCapabilities};
pub use renderer::RenderMode;
