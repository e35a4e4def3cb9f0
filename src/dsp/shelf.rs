//! # High-Shelf Biquad Filter
//!
//! A shelving filter changes the level of everything above (high-shelf) or
//! below (low-shelf) a corner frequency by a fixed amount, and leaves the
//! rest of the spectrum alone. Unlike a lowpass, a high-shelf never goes
//! to silence: at DC its gain is exactly 1, and at Nyquist its gain is
//! exactly the shelf gain factor.
//!
//! This plugin uses two of them around the distortion stage:
//!
//! ```text
//! input ──► [boost shelf ×20 above 5 kHz] ──► tanh(x · gain) ──► [cut shelf ×0.05 above 5 kHz] ──► output
//! ```
//!
//! Boosting the highs before the clipper makes them clip harder, which
//! generates more high-order harmonics. The cut shelf afterwards pulls the
//! top end back down so the overall tone stays balanced.
//!
//! ## Coefficients
//!
//! With `A = sqrt(gain)`, `ω = 2π · cutoff / sample_rate` and
//! `β = sin(ω) · sqrt(A) / Q`:
//!
//! ```text
//! b0 =  A·((A+1) + (A−1)·cos ω + β)      a0 = (A+1) − (A−1)·cos ω + β
//! b1 = −2A·((A−1) + (A+1)·cos ω)         a1 = 2·((A−1) − (A+1)·cos ω)
//! b2 =  A·((A+1) + (A−1)·cos ω − β)      a2 = (A+1) − (A−1)·cos ω − β
//! ```
//!
//! Everything is divided through by `a0` so the recursion never has to.
//!
//! ## The Recursion (Transposed Direct Form II)
//!
//! ```text
//! y  = b0·x + s1
//! s1 = b1·x − a1·y + s2
//! s2 = b2·x − a2·y
//! ```
//!
//! Two state variables per channel instead of the four that Direct Form I
//! needs. When the shelf gain is 1.0 the numerator and denominator
//! coefficients come out identical, so the state stays exactly zero and
//! the filter is a bit-exact passthrough.

use std::f64::consts::PI;

use nih_plug::nih_debug_assert;

use crate::error::ConfigError;

/// Which way the shelf tilts the high end.
///
/// Both variants are the same high-shelf design. The kind picks the
/// default gain factor, names the stage in log output, and bounds the
/// gain it accepts: a `Cut` shelf may not amplify (gain above 1.0) and a
/// `Boost` shelf may not attenuate (gain below 1.0). Gain 1.0 is allowed
/// for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfKind {
    /// Attenuates everything above the cutoff.
    Cut,
    /// Amplifies everything above the cutoff.
    Boost,
}

impl ShelfKind {
    /// The linear gain factor this shelf uses in the stock signal chain.
    pub const fn default_gain(self) -> f32 {
        match self {
            ShelfKind::Cut => super::CUT_GAIN,
            ShelfKind::Boost => super::BOOST_GAIN,
        }
    }
}

/// The user-facing description of a shelf: everything except the sample
/// rate, which only becomes known when the host prepares us.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelfSettings {
    /// Cut or boost; must agree with `gain`.
    pub kind: ShelfKind,
    /// Corner frequency in Hz. Must sit strictly below Nyquist at every
    /// sample rate the stage is prepared for.
    pub cutoff_hz: f32,
    /// Slope of the transition band. Below ~0.707 the shelf rises
    /// monotonically with no bump at the corner.
    pub q: f32,
    /// Linear gain factor applied at Nyquist (not decibels).
    pub gain: f32,
}

impl ShelfSettings {
    /// The stock 5 kHz, Q 0.5 shelf for the given kind.
    pub const fn stock(kind: ShelfKind) -> Self {
        Self {
            kind,
            cutoff_hz: super::SHELF_CUTOFF_HZ,
            q: super::SHELF_Q,
            gain: kind.default_gain(),
        }
    }

    /// A shelf with a gain of 1.0, which leaves the signal untouched.
    pub const fn unity(kind: ShelfKind) -> Self {
        Self {
            gain: 1.0,
            ..Self::stock(kind)
        }
    }
}

/// Normalized biquad coefficients (`a0` already divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelfCoefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl ShelfCoefficients {
    /// Coefficients for a filter that outputs its input unchanged.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design a high-shelf for `settings` at `sample_rate`.
    ///
    /// The math runs in `f64` and is rounded to `f32` once at the end,
    /// which keeps the coefficients accurate for low cutoffs at high
    /// sample rates where `cos ω` gets very close to 1.
    pub fn high_shelf(settings: &ShelfSettings, sample_rate: f32) -> Result<Self, ConfigError> {
        validate(settings, sample_rate)?;

        let a = f64::from(settings.gain).sqrt();
        let a_minus_1 = a - 1.0;
        let a_plus_1 = a + 1.0;
        let omega = 2.0 * PI * f64::from(settings.cutoff_hz) / f64::from(sample_rate);
        let cos_omega = omega.cos();
        let beta = omega.sin() * a.sqrt() / f64::from(settings.q);
        let a_minus_1_cos = a_minus_1 * cos_omega;

        let b0 = a * (a_plus_1 + a_minus_1_cos + beta);
        let b1 = a * -2.0 * (a_minus_1 + a_plus_1 * cos_omega);
        let b2 = a * (a_plus_1 + a_minus_1_cos - beta);
        let a0 = a_plus_1 - a_minus_1_cos + beta;
        let a1 = 2.0 * (a_minus_1 - a_plus_1 * cos_omega);
        let a2 = a_plus_1 - a_minus_1_cos - beta;

        // Divide rather than multiply by 1/a0 so that identical numerator
        // and denominator terms normalize to identical values.
        Ok(Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        })
    }
}

fn validate(settings: &ShelfSettings, sample_rate: f32) -> Result<(), ConfigError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ConfigError::InvalidSampleRate { sample_rate });
    }

    let nyquist_hz = sample_rate / 2.0;
    // Written as a negated range check so NaN is rejected too.
    if !(settings.cutoff_hz > 0.0 && settings.cutoff_hz < nyquist_hz) {
        return Err(ConfigError::CutoffOutOfRange {
            cutoff_hz: settings.cutoff_hz,
            nyquist_hz,
        });
    }

    if !settings.q.is_finite() || settings.q <= 0.0 {
        return Err(ConfigError::InvalidQ { q: settings.q });
    }

    if !settings.gain.is_finite() || settings.gain < 0.0 {
        return Err(ConfigError::InvalidGain {
            gain: settings.gain,
        });
    }

    // A cut that boosts (or a boost that cuts) would silently flip the
    // pre-/de-emphasis pair around the clipper.
    let contradicts_kind = match settings.kind {
        ShelfKind::Cut => settings.gain > 1.0,
        ShelfKind::Boost => settings.gain < 1.0,
    };
    if contradicts_kind {
        return Err(ConfigError::InvalidGain {
            gain: settings.gain,
        });
    }

    Ok(())
}

/// Per-channel filter memory.
///
/// In transposed direct form the state holds partial sums rather than raw
/// past samples: `s1` is what the next output still owes to the past, `s2`
/// what the output after that owes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadState {
    s1: f32,
    s2: f32,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f32, c: &ShelfCoefficients) -> f32 {
        let output = c.b0 * input + self.s1;
        self.s1 = c.b1 * input - c.a1 * output + self.s2;
        self.s2 = c.b2 * input - c.a2 * output;
        output
    }

    fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// A high-shelf filter applied to every channel of a planar buffer, with
/// one independent [`BiquadState`] per channel.
///
/// Lifecycle: [`configure`](Self::configure) picks the shelf shape,
/// [`prepare`](Self::prepare) sizes the per-channel state for the host's
/// layout, and only then may [`process`](Self::process) run.
#[derive(Debug, Clone)]
pub struct ShelfFilterStage {
    /// The shelf shape. `None` until `configure()` succeeds; `prepare()`
    /// refuses to run without it.
    settings: Option<ShelfSettings>,

    /// Designed from `settings` at `sample_rate`. Identity until
    /// configured, so an unconfigured stage can never color the signal.
    coefficients: ShelfCoefficients,

    /// The rate `coefficients` were designed for. Set by `configure()`,
    /// replaced by the host's rate in `prepare()`.
    sample_rate: f32,

    /// Largest block the host promised in `prepare()`. Only used for a
    /// debug-build sanity check; the filter itself handles any length.
    max_block_size: usize,

    /// One state per channel, so stereo channels never bleed into each
    /// other. Empty until `prepare()`; afterwards its length is the
    /// prepared channel count.
    states: Vec<BiquadState>,
}

impl Default for ShelfFilterStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ShelfFilterStage {
    /// An unconfigured stage. It must be configured and prepared before
    /// it can process audio.
    pub fn new() -> Self {
        Self {
            settings: None,
            coefficients: ShelfCoefficients::IDENTITY,
            sample_rate: 0.0,
            max_block_size: 0,
            states: Vec::new(),
        }
    }

    /// Compute and store the coefficients for a high-shelf of the given
    /// kind. Invalid settings are rejected, never clamped, and leave the
    /// previous configuration in place.
    pub fn configure(
        &mut self,
        kind: ShelfKind,
        sample_rate: f32,
        cutoff_hz: f32,
        q: f32,
        gain: f32,
    ) -> Result<(), ConfigError> {
        self.configure_with(
            ShelfSettings {
                kind,
                cutoff_hz,
                q,
                gain,
            },
            sample_rate,
        )
    }

    /// [`configure`](Self::configure) from a prebuilt [`ShelfSettings`].
    pub fn configure_with(
        &mut self,
        settings: ShelfSettings,
        sample_rate: f32,
    ) -> Result<(), ConfigError> {
        self.coefficients = ShelfCoefficients::high_shelf(&settings, sample_rate)?;
        self.settings = Some(settings);
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Allocate fresh per-channel state for `num_channels` channels and
    /// redesign the coefficients for `sample_rate`.
    ///
    /// Calling this again discards all filter history, even if nothing
    /// changed. This is where allocation happens so `process()` never has
    /// to.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<(), ConfigError> {
        let (_, coefficients) = self.check_prepare(sample_rate, num_channels)?;

        self.coefficients = coefficients;
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.states = vec![BiquadState::default(); num_channels];

        Ok(())
    }

    /// Everything [`prepare`](Self::prepare) would check, without touching
    /// the stage. Returns the settings and the coefficients `prepare` would
    /// install, so callers preparing several stages together can validate
    /// all of them before committing any.
    pub fn check_prepare(
        &self,
        sample_rate: f32,
        num_channels: usize,
    ) -> Result<(ShelfSettings, ShelfCoefficients), ConfigError> {
        let settings = self.settings.ok_or(ConfigError::NotConfigured)?;
        if num_channels == 0 {
            return Err(ConfigError::NoChannels);
        }

        let coefficients = ShelfCoefficients::high_shelf(&settings, sample_rate)?;
        Ok((settings, coefficients))
    }

    /// Zero every channel's history without giving up the allocation.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
    }

    /// Filter `buffer` in place, channel by channel, each channel with its
    /// own state and strictly in sample order.
    ///
    /// # Panics
    ///
    /// If the stage has not been prepared, or if `buffer` has more
    /// channels than the stage was prepared for. Both can only happen when
    /// the host skips `initialize()` or changes layout without calling it.
    pub fn process(&mut self, buffer: &mut [&mut [f32]]) {
        assert!(
            !self.states.is_empty(),
            "shelf filter stage processed before prepare()"
        );
        assert!(
            buffer.len() <= self.states.len(),
            "buffer has {} channels but the shelf filter stage was prepared for {}",
            buffer.len(),
            self.states.len()
        );

        let coefficients = self.coefficients;
        for (channel, state) in buffer.iter_mut().zip(self.states.iter_mut()) {
            nih_debug_assert!(channel.len() <= self.max_block_size);
            for sample in channel.iter_mut() {
                *sample = state.process(*sample, &coefficients);
            }
        }
    }

    pub fn settings(&self) -> Option<&ShelfSettings> {
        self.settings.as_ref()
    }

    pub fn coefficients(&self) -> &ShelfCoefficients {
        &self.coefficients
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of channels the stage was prepared for, 0 if unprepared.
    pub fn num_channels(&self) -> usize {
        self.states.len()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
