//! # Plugin Parameters
//!
//! There is exactly one knob: **Gain**, the linear multiplier applied to
//! the signal right before the `tanh` clipper.
//!
//! The parameter has a unique string ID (`#[id = "gain"]`) that the host
//! uses to save and recall presets and automation. Once published, never
//! change it or existing sessions will lose their setting. The
//! `#[derive(Params)]` macro also takes care of state persistence: the
//! host's saved state includes the Gain value and restores it on load.
//!
//! ## Why no smoothing?
//!
//! The signal chain reads the gain once per buffer and shapes the whole
//! buffer with that one value. A smoother would hand out a different value
//! per sample, which is exactly what the chain promises not to do.

use nih_plug::prelude::*;

use crate::dsp::gain::{GainSource, GAIN_DEFAULT, GAIN_MAX, GAIN_MIN, GAIN_STEP};

#[derive(Params)]
pub struct PluginParams {
    /// **Gain** — how hard the signal is driven into the clipper.
    ///
    /// - 0 = silence (tanh(0) = 0)
    /// - 1 = gentle saturation on loud peaks only
    /// - 10-100 = obvious distortion
    /// - 10000 = everything is a square wave
    ///
    /// Linear range 0 to 10000 in steps of 0.5, default 0. No unit: it is
    /// a plain multiplier, not decibels.
    #[id = "gain"]
    pub gain: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            gain: FloatParam::new(
                "Gain",
                GAIN_DEFAULT,
                FloatRange::Linear {
                    min: GAIN_MIN,
                    max: GAIN_MAX,
                },
            )
            .with_step_size(GAIN_STEP)
            .with_value_to_string(formatters::v2s_f32_rounded(1)),
        }
    }
}

/// `FloatParam::value()` is a single atomic load, so the parameter tree
/// can feed the signal chain directly.
impl GainSource for PluginParams {
    fn current_gain(&self) -> f32 {
        self.gain.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_defaults_to_zero() {
        let params = PluginParams::default();
        assert_eq!(params.current_gain(), 0.0);
        assert_eq!(params.gain.default_plain_value(), 0.0);
    }

    #[test]
    fn test_gain_range() {
        let params = PluginParams::default();
        assert_eq!(params.gain.preview_plain(0.0), GAIN_MIN);
        assert_eq!(params.gain.preview_plain(1.0), GAIN_MAX);
        assert_eq!(params.gain.name(), "Gain");
    }
}
