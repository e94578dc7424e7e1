use parking_lot::Mutex;
use std::sync::Arc;

use crate::forces::ForceImpulse;

/// A spectrum snapshot posted by an audio producer
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSnapshot {
    pub magnitudes: Vec<f32>,
    pub sample_rate: Option<f32>,
}

#[derive(Debug, Default)]
struct InboxState {
    resize: Option<(u32, u32)>,
    spectrum: Option<SpectrumSnapshot>,
    impulses: Vec<ForceImpulse>,
}

/// Everything posted since the last frame
#[derive(Debug, Default)]
pub struct InboxMessages {
    pub resize: Option<(u32, u32)>,
    pub spectrum: Option<SpectrumSnapshot>,
    pub impulses: Vec<ForceImpulse>,
}

/// Mailbox for producers running outside the frame callback.
///
/// Clones share one mailbox. The engine drains it at the start of each
/// frame, so resizes never land mid-frame. Only the latest resize and
/// spectrum survive; impulses queue in order.
#[derive(Debug, Clone, Default)]
pub struct EngineInbox {
    state: Arc<Mutex<InboxState>>,
}

impl EngineInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_resize(&self, width: u32, height: u32) {
        self.state.lock().resize = Some((width, height));
    }

    pub fn post_spectrum(&self, magnitudes: Vec<f32>, sample_rate: Option<f32>) {
        self.state.lock().spectrum = Some(SpectrumSnapshot { magnitudes, sample_rate });
    }

    pub fn post_impulse(&self, impulse: ForceImpulse) {
        self.state.lock().impulses.push(impulse);
    }

    pub fn drain(&self) -> InboxMessages {
        let mut state = self.state.lock();
        InboxMessages {
            resize: state.resize.take(),
            spectrum: state.spectrum.take(),
            impulses: std::mem::take(&mut state.impulses),
        }
    }
}
