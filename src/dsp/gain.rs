//! Where the signal chain gets its gain from.
//!
//! The chain only ever asks one question, "what is the gain right now?",
//! and asks it once per block. Anything that can answer that with a single
//! lock-free read can drive the chain: the plugin's nih-plug parameter
//! tree, or the standalone [`GainParameter`] cell below.

use std::sync::atomic::Ordering;

use atomic_float::AtomicF32;

/// Lowest allowed gain. At 0 the clipper outputs silence.
pub const GAIN_MIN: f32 = 0.0;
/// Highest allowed gain, deep into hard saturation.
pub const GAIN_MAX: f32 = 10000.0;
/// Automation and UI step size.
pub const GAIN_STEP: f32 = 0.5;
pub const GAIN_DEFAULT: f32 = 0.0;

/// A source for the current gain value.
///
/// Implementations must answer with a single atomic read: this is called
/// on the audio thread, so no locks and no allocation.
pub trait GainSource: Send + Sync {
    fn current_gain(&self) -> f32;
}

/// An owned, lock-free gain cell.
///
/// One thread (UI, automation, a test) writes, the audio thread reads.
/// Writes are fire-and-forget; the reader sees them on its next block.
#[derive(Debug)]
pub struct GainParameter {
    value: AtomicF32,
}

impl Default for GainParameter {
    fn default() -> Self {
        Self::new(GAIN_DEFAULT)
    }
}

impl GainParameter {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(clamp_gain(value)),
        }
    }

    /// Store a new gain, clamped to `[GAIN_MIN, GAIN_MAX]`. NaN is ignored.
    pub fn set(&self, value: f32) {
        if value.is_nan() {
            return;
        }
        self.value.store(clamp_gain(value), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Relaxed)
    }
}

impl GainSource for GainParameter {
    fn current_gain(&self) -> f32 {
        self.get()
    }
}

fn clamp_gain(value: f32) -> f32 {
    if value.is_nan() {
        GAIN_DEFAULT
    } else {
        value.clamp(GAIN_MIN, GAIN_MAX)
    }
}
