//! Kernels: per-element programs described as plain data plus a uniform table

use glam::{Vec2, Vec3};

use super::GpuError;

/// Semantic type of a uniform slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec3,
}

/// Current value of a uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
}

impl Uniform {
    pub fn kind(&self) -> UniformKind {
        match self {
            Uniform::Float(_) => UniformKind::Float,
            Uniform::Int(_) => UniformKind::Int,
            Uniform::Vec2(_) => UniformKind::Vec2,
            Uniform::Vec3(_) => UniformKind::Vec3,
        }
    }
}

/// Uniform declaration with its initial value
#[derive(Debug, Clone, Copy)]
pub struct UniformSpec {
    pub name: &'static str,
    pub default: Uniform,
}

/// Static description of a kernel: name, field input slots, uniforms
#[derive(Debug, Clone, Copy)]
pub struct KernelDescriptor {
    pub name: &'static str,
    /// Field inputs in slot order
    pub inputs: &'static [&'static str],
    pub uniforms: &'static [UniformSpec],
}

/// A kernel instance with mutable uniform values
#[derive(Debug, Clone)]
pub struct Kernel {
    descriptor: KernelDescriptor,
    values: Vec<Uniform>,
}

impl Kernel {
    pub fn new(descriptor: KernelDescriptor) -> Self {
        let values = descriptor.uniforms.iter().map(|spec| spec.default).collect();
        Self { descriptor, values }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &KernelDescriptor {
        &self.descriptor
    }

    /// Slot index of a named field input
    pub fn input_slot(&self, input: &str) -> Option<usize> {
        self.descriptor.inputs.iter().position(|name| *name == input)
    }

    /// Update a uniform. Unknown names and kind changes are rejected.
    pub fn set_uniform(&mut self, name: &str, value: Uniform) -> Result<(), GpuError> {
        let index = self.index_of(name)?;
        let expected = self.values[index].kind();
        if expected != value.kind() {
            return Err(GpuError::UniformKind {
                kernel: self.descriptor.name,
                uniform: name.to_string(),
                expected,
                actual: value.kind(),
            });
        }
        self.values[index] = value;
        Ok(())
    }

    pub fn uniform(&self, name: &str) -> Result<Uniform, GpuError> {
        Ok(self.values[self.index_of(name)?])
    }

    pub fn float(&self, name: &str) -> Result<f32, GpuError> {
        match self.uniform(name)? {
            Uniform::Float(v) => Ok(v),
            other => Err(self.kind_error(name, UniformKind::Float, other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i32, GpuError> {
        match self.uniform(name)? {
            Uniform::Int(v) => Ok(v),
            other => Err(self.kind_error(name, UniformKind::Int, other)),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<Vec2, GpuError> {
        match self.uniform(name)? {
            Uniform::Vec2(v) => Ok(v),
            other => Err(self.kind_error(name, UniformKind::Vec2, other)),
        }
    }

    pub fn vec3(&self, name: &str) -> Result<Vec3, GpuError> {
        match self.uniform(name)? {
            Uniform::Vec3(v) => Ok(v),
            other => Err(self.kind_error(name, UniformKind::Vec3, other)),
        }
    }

    fn index_of(&self, name: &str) -> Result<usize, GpuError> {
        self.descriptor
            .uniforms
            .iter()
            .position(|spec| spec.name == name)
            .ok_or_else(|| GpuError::UnknownUniform {
                kernel: self.descriptor.name,
                uniform: name.to_string(),
            })
    }

    fn kind_error(&self, name: &str, expected: UniformKind, actual: Uniform) -> GpuError {
        GpuError::UniformKind {
            kernel: self.descriptor.name,
            uniform: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }
}
