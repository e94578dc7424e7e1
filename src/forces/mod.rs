/// External forcing of the velocity field.
///
/// Impulses cover a capsule, an oriented rectangle or an axis-aligned region,
/// weighted by a `1 - r^2` falloff. The resulting velocity is rescaled so its
/// magnitude never exceeds the configured maximum.

pub mod pointer;
pub mod touch;

pub use pointer::PointerTracker;
pub use touch::{apply_impulse, clamp_magnitude, falloff, ForceImpulse, ForceInjector, ImpulseShape};
