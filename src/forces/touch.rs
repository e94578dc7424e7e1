//! Velocity impulses over a segment or rectangular region

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::simulation::{MAX_VELOCITY, TOUCH_FORCE_SCALE};
use crate::gpu::{GpuError, GridField, Kernel, KernelDescriptor, Uniform, UniformSpec};

pub const TOUCH: KernelDescriptor = KernelDescriptor {
    name: "touch",
    inputs: &["velocity"],
    uniforms: &[
        UniformSpec { name: "vector", default: Uniform::Vec2(Vec2::ZERO) },
        UniformSpec { name: "touch_force_scale", default: Uniform::Float(TOUCH_FORCE_SCALE) },
        UniformSpec { name: "max_velocity", default: Uniform::Float(MAX_VELOCITY) },
        UniformSpec { name: "dimensions", default: Uniform::Vec2(Vec2::ONE) },
    ],
};

/// Area an impulse covers, in display pixels with the origin at the bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImpulseShape {
    /// Capped ends form a capsule; uncapped ends an oriented rectangle
    Segment {
        p1: Vec2,
        p2: Vec2,
        thickness: f32,
        end_caps: bool,
    },
    /// Axis-aligned rectangle
    Region { min: Vec2, max: Vec2 },
}

impl ImpulseShape {
    /// A point impulse: degenerate capped segment
    pub fn point(position: Vec2, thickness: f32) -> Self {
        ImpulseShape::Segment {
            p1: position,
            p2: position,
            thickness,
            end_caps: true,
        }
    }

    /// Squared normalised radial distance of `p` from the shape's centre line,
    /// or `None` when `p` is outside the shape
    pub fn radius_sq(&self, p: Vec2) -> Option<f32> {
        match *self {
            ImpulseShape::Segment {
                p1,
                p2,
                thickness,
                end_caps,
            } => {
                let half = thickness * 0.5;
                if half <= 0.0 {
                    return None;
                }
                let axis = p2 - p1;
                let length_sq = axis.length_squared();

                if end_caps {
                    let t = if length_sq > 0.0 {
                        ((p - p1).dot(axis) / length_sq).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    let r = (p - (p1 + axis * t)).length() / half;
                    (r <= 1.0).then_some(r * r)
                } else {
                    if length_sq == 0.0 {
                        return None;
                    }
                    let length = length_sq.sqrt();
                    let direction = axis / length;
                    let local = p - (p1 + p2) * 0.5;
                    let u = local.dot(direction) / (length * 0.5);
                    let v = local.perp_dot(direction) / half;
                    (u.abs() <= 1.0 && v.abs() <= 1.0).then_some(u * u + v * v)
                }
            }
            ImpulseShape::Region { min, max } => {
                let half = (max - min) * 0.5;
                if half.x <= 0.0 || half.y <= 0.0 {
                    return None;
                }
                let local = (p - (min + max) * 0.5) / half;
                (local.x.abs() <= 1.0 && local.y.abs() <= 1.0).then_some(local.length_squared())
            }
        }
    }
}

/// A shape plus the velocity it pushes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceImpulse {
    pub shape: ImpulseShape,
    pub vector: Vec2,
}

impl ForceImpulse {
    pub fn segment(p1: Vec2, p2: Vec2, thickness: f32, vector: Vec2) -> Self {
        Self {
            shape: ImpulseShape::Segment {
                p1,
                p2,
                thickness,
                end_caps: true,
            },
            vector,
        }
    }

    pub fn region(min: Vec2, max: Vec2, vector: Vec2) -> Self {
        Self {
            shape: ImpulseShape::Region { min, max },
            vector,
        }
    }
}

/// Falloff weight for a squared normalised radius
#[inline]
pub fn falloff(radius_sq: f32) -> f32 {
    (1.0 - radius_sq).max(0.0)
}

/// Rescale `v` so its length does not exceed `max`, keeping direction
#[inline]
pub fn clamp_magnitude(v: Vec2, max: f32) -> Vec2 {
    let magnitude = v.length();
    if magnitude > max {
        v * (max / magnitude)
    } else {
        v
    }
}

/// Add a falloff-weighted impulse to every velocity texel the shape covers
pub fn apply_impulse(
    kernel: &Kernel,
    velocity: &mut GridField<[f32; 2]>,
    shape: &ImpulseShape,
) -> Result<(), GpuError> {
    let vector = kernel.vec2("vector")?;
    let scale = kernel.float("touch_force_scale")?;
    let max_velocity = kernel.float("max_velocity")?;
    let dimensions = kernel.vec2("dimensions")?;

    velocity.step_in_place(|state, x, y| {
        let v = state.texel(x as i64, y as i64);
        let p = state.texel_uv(x, y) * dimensions;
        match shape.radius_sq(p) {
            Some(radius_sq) => {
                let pushed = Vec2::from(v) + falloff(radius_sq) * vector * scale;
                clamp_magnitude(pushed, max_velocity).into()
            }
            None => v,
        }
    })
}

/// Owns the touch kernel and applies queued impulses
pub struct ForceInjector {
    touch: Kernel,
}

impl ForceInjector {
    pub fn new(touch_force_scale: f32, max_velocity: f32) -> Result<Self, GpuError> {
        let mut touch = Kernel::new(TOUCH);
        touch.set_uniform("touch_force_scale", Uniform::Float(touch_force_scale))?;
        touch.set_uniform("max_velocity", Uniform::Float(max_velocity))?;
        Ok(Self { touch })
    }

    pub fn set_force_scale(&mut self, scale: f32) -> Result<(), GpuError> {
        self.touch.set_uniform("touch_force_scale", Uniform::Float(scale))
    }

    pub fn set_max_velocity(&mut self, max_velocity: f32) -> Result<(), GpuError> {
        self.touch.set_uniform("max_velocity", Uniform::Float(max_velocity))
    }

    pub fn update_dimensions(&mut self, display: (u32, u32)) -> Result<(), GpuError> {
        let dimensions = Vec2::new(display.0 as f32, display.1 as f32);
        self.touch.set_uniform("dimensions", Uniform::Vec2(dimensions))
    }

    /// Apply impulses in order; each sees the result of the previous one
    pub fn apply(
        &mut self,
        velocity: &mut GridField<[f32; 2]>,
        impulses: &[ForceImpulse],
    ) -> Result<usize, GpuError> {
        for impulse in impulses {
            self.touch.set_uniform("vector", Uniform::Vec2(impulse.vector))?;
            apply_impulse(&self.touch, velocity, &impulse.shape)?;
        }
        if !impulses.is_empty() {
            log::debug!("[ForceInjector] Applied {} impulses", impulses.len());
        }
        Ok(impulses.len())
    }
}
