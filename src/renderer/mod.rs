pub mod composite;
pub mod screenshot;

pub use composite::{
    allocate_display, render_pressure, render_trails, render_velocity, signed_amplitude_color, Compositor,
    RenderMode, RENDER_PRESSURE, RENDER_TRAILS, RENDER_VELOCITY,
};
pub use screenshot::{buffer_to_image, save_png, ColorBuffer};
