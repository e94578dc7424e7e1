//! Final composite onto the display surface: particle trails or a debug view

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::render::{
    BACKGROUND, INITIAL_PARTICLE_COLOR, PRESSURE_SCALE, VECTOR_SCALE, VECTOR_SPACING,
};
use crate::gpu::{
    FieldDescriptor, GpuError, GridField, Kernel, KernelDescriptor, NumericType, Uniform, UniformSpec,
};

/// What the display surface shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    #[default]
    Fluid,
    Pressure,
    Velocity,
}

impl RenderMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fluid" => Some(RenderMode::Fluid),
            "pressure" => Some(RenderMode::Pressure),
            "velocity" => Some(RenderMode::Velocity),
            _ => None,
        }
    }
}

pub const RENDER_TRAILS: KernelDescriptor = KernelDescriptor {
    name: "renderTrails",
    inputs: &["trailState"],
    uniforms: &[
        UniformSpec {
            name: "particle_color",
            default: Uniform::Vec3(Vec3::new(
                INITIAL_PARTICLE_COLOR[0],
                INITIAL_PARTICLE_COLOR[1],
                INITIAL_PARTICLE_COLOR[2],
            )),
        },
        UniformSpec {
            name: "background",
            default: Uniform::Vec3(Vec3::new(BACKGROUND[0], BACKGROUND[1], BACKGROUND[2])),
        },
    ],
};

/// Signed amplitude: negative blue, zero white, positive red
pub const RENDER_PRESSURE: KernelDescriptor = KernelDescriptor {
    name: "renderPressure",
    inputs: &["pressure"],
    uniforms: &[UniformSpec { name: "scale", default: Uniform::Float(PRESSURE_SCALE) }],
};

pub const RENDER_VELOCITY: KernelDescriptor = KernelDescriptor {
    name: "renderVelocity",
    inputs: &["velocity"],
    uniforms: &[
        UniformSpec { name: "spacing", default: Uniform::Int(VECTOR_SPACING as i32) },
        UniformSpec { name: "scale", default: Uniform::Float(VECTOR_SCALE) },
    ],
};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Allocate the RGBA display surface
pub fn allocate_display(width: u32, height: u32) -> Result<GridField<[f32; 4]>, GpuError> {
    GridField::allocate(FieldDescriptor::new("display", NumericType::Float32), width, height)
}

/// `mix(background, particle_color, trail^2)`
pub fn render_trails(
    kernel: &Kernel,
    trails: &GridField<f32>,
    display: &mut GridField<[f32; 4]>,
) -> Result<(), GpuError> {
    let color = kernel.vec3("particle_color")?;
    let background = kernel.vec3("background")?;
    let trails = trails.view()?;

    display.step(|x, y| {
        let t = trails.texel(x as i64, y as i64);
        let c = background.lerp(color, t * t);
        [c.x, c.y, c.z, 1.0]
    })?;
    Ok(())
}

/// Colour for a signed amplitude already scaled into roughly `[-1, 1]`
pub fn signed_amplitude_color(amplitude: f32) -> [f32; 4] {
    let t = amplitude.abs().min(1.0);
    let target = if amplitude > 0.0 {
        Vec3::new(1.0, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, 1.0)
    };
    let c = Vec3::ONE.lerp(target, t);
    [c.x, c.y, c.z, 1.0]
}

pub fn render_pressure(
    kernel: &Kernel,
    pressure: &GridField<f32>,
    display: &mut GridField<[f32; 4]>,
) -> Result<(), GpuError> {
    let scale = kernel.float("scale")?;
    let pressure = pressure.view()?;
    let size = display.dimensions();

    display.step(|x, y| {
        let uv = Vec2::new((x as f32 + 0.5) / size.x, (y as f32 + 0.5) / size.y);
        signed_amplitude_color(pressure.sample_nearest(uv) * scale)
    })?;
    Ok(())
}

/// Pixels covered by a line from `start` to `end`, clipped to the surface
fn rasterize_line(start: Vec2, end: Vec2, width: u32, height: u32, mask: &mut [bool]) {
    let delta = end - start;
    let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as u32;
    for s in 0..=steps {
        let p = start + delta * (s as f32 / steps as f32);
        let (x, y) = (p.x.floor(), p.y.floor());
        if x >= 0.0 && y >= 0.0 && (x as u32) < width && (y as u32) < height {
            mask[y as usize * width as usize + x as usize] = true;
        }
    }
}

/// White surface with a black glyph every `spacing` pixels along the local velocity
pub fn render_velocity(
    kernel: &Kernel,
    velocity: &GridField<[f32; 2]>,
    display: &mut GridField<[f32; 4]>,
) -> Result<(), GpuError> {
    let spacing = kernel.int("spacing")?.max(1) as u32;
    let scale = kernel.float("scale")?;
    let velocity = velocity.view()?;
    let (width, height) = (display.width(), display.height());
    let size = display.dimensions();

    let mut mask = vec![false; display.len()];
    for gy in (0..height).step_by(spacing as usize) {
        for gx in (0..width).step_by(spacing as usize) {
            let origin = Vec2::new(gx as f32, gy as f32) + spacing as f32 * 0.5;
            let v = Vec2::from(velocity.sample(origin / size));
            rasterize_line(origin, origin + v * scale, width, height, &mut mask);
        }
    }

    display.step(|x, y| {
        if mask[y as usize * width as usize + x as usize] {
            BLACK
        } else {
            WHITE
        }
    })?;
    Ok(())
}

/// Owns the composite kernels
pub struct Compositor {
    trails: Kernel,
    pressure: Kernel,
    velocity: Kernel,
}

impl Compositor {
    pub fn new(background: [f32; 3]) -> Result<Self, GpuError> {
        let mut trails = Kernel::new(RENDER_TRAILS);
        trails.set_uniform("background", Uniform::Vec3(Vec3::from(background)))?;

        Ok(Self {
            trails,
            pressure: Kernel::new(RENDER_PRESSURE),
            velocity: Kernel::new(RENDER_VELOCITY),
        })
    }

    pub fn set_particle_color(&mut self, color: Vec3) -> Result<(), GpuError> {
        self.trails.set_uniform("particle_color", Uniform::Vec3(color))
    }

    pub fn trails(&self, trails: &GridField<f32>, display: &mut GridField<[f32; 4]>) -> Result<(), GpuError> {
        render_trails(&self.trails, trails, display)
    }

    pub fn pressure(&self, pressure: &GridField<f32>, display: &mut GridField<[f32; 4]>) -> Result<(), GpuError> {
        render_pressure(&self.pressure, pressure, display)
    }

    pub fn velocity(
        &self,
        velocity: &GridField<[f32; 2]>,
        display: &mut GridField<[f32; 4]>,
    ) -> Result<(), GpuError> {
        render_velocity(&self.velocity, velocity, display)
    }
}
