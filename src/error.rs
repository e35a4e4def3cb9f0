//! Configuration errors for the DSP core.
//!
//! These are only ever returned from `configure()` / `prepare()`, which
//! run on the host's main thread. The audio thread never sees an error:
//! misuse there (processing before preparing, too many channels) is a
//! programming mistake and panics instead.

use thiserror::Error;

/// Reasons a shelf filter stage can refuse a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// The sample rate must be a finite, positive number of Hz.
    #[error("invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: f32 },

    /// The cutoff must sit strictly between 0 Hz and Nyquist.
    #[error("cutoff {cutoff_hz} Hz is outside (0, {nyquist_hz}) Hz")]
    CutoffOutOfRange { cutoff_hz: f32, nyquist_hz: f32 },

    /// Q must be a finite, positive number. Q sets how wide the
    /// transition between the flat band and the shelf is; at 0 the
    /// coefficient formula divides by zero.
    #[error("invalid shelf Q: {q}")]
    InvalidQ { q: f32 },

    /// Linear gain factor that can't be used: negative or non-finite, or
    /// pointing the wrong way for the shelf kind (a cut above 1.0, a
    /// boost below 1.0).
    #[error("invalid shelf gain factor: {gain}")]
    InvalidGain { gain: f32 },

    /// `prepare()` was called on a stage that was never successfully
    /// configured, so there is no shelf shape to design coefficients
    /// from.
    #[error("filter stage must be configured before it is prepared")]
    NotConfigured,

    /// The host asked for a layout with no channels. The plugin only
    /// offers mono and stereo layouts, so this means a broken host.
    #[error("filter stage cannot be prepared for zero channels")]
    NoChannels,
}
