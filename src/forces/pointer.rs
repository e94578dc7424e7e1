use glam::Vec2;

use crate::constants::simulation::POINTER_THICKNESS;
use crate::forces::ForceImpulse;

/// Turns successive pointer positions into segment impulses.
///
/// Hosts report pointer coordinates with a top-left origin; impulses use the
/// simulation's bottom-left origin.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    surface_height: f32,
    thickness: f32,
    last_pos: Option<Vec2>,
}

impl PointerTracker {
    pub fn new(surface_height: u32) -> Self {
        Self {
            surface_height: surface_height as f32,
            thickness: POINTER_THICKNESS,
            last_pos: None,
        }
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn set_surface_height(&mut self, height: u32) {
        self.surface_height = height as f32;
        self.last_pos = None;
    }

    pub fn is_down(&self) -> bool {
        self.last_pos.is_some()
    }

    pub fn press(&mut self, x: f32, y: f32) {
        self.last_pos = Some(self.flip(x, y));
    }

    /// Segment from the previous position to this one, pushing along the motion
    pub fn move_to(&mut self, x: f32, y: f32) -> Option<ForceImpulse> {
        let current = self.flip(x, y);
        let last = self.last_pos?;
        self.last_pos = Some(current);
        let delta = current - last;
        if delta == Vec2::ZERO {
            return None;
        }
        Some(ForceImpulse::segment(last, current, self.thickness, delta))
    }

    pub fn release(&mut self) {
        self.last_pos = None;
    }

    fn flip(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, self.surface_height - y)
    }
}
