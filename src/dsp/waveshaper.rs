//! # Tanh Soft Clipper
//!
//! The distortion itself: multiply by the gain, then squash through
//! `tanh`. Small signals pass almost linearly (`tanh(x) ≈ x` near zero),
//! loud ones bend smoothly toward ±1 instead of slamming into a hard
//! ceiling, which is what makes tanh sound "warm" next to a hard clipper.
//!
//! ```text
//!  1 ┤            ╭──────────
//!    │          ╭─╯
//!  0 ┤────────╭─╯
//!    │      ╭─╯
//! -1 ┤──────╯
//! ```
//!
//! There is no state here, so channels and samples can be shaped in any
//! order. The one rule is that a whole block is shaped with the same gain.

/// Shape one sample: `tanh(sample * gain)`.
///
/// Always finite for finite input, even when `sample * gain` overflows to
/// infinity, since `tanh(±∞) = ±1`.
#[inline]
pub fn apply(sample: f32, gain: f32) -> f32 {
    (sample * gain).tanh()
}

/// Shape a whole channel in place with a single gain value.
pub fn apply_block(channel: &mut [f32], gain: f32) {
    for sample in channel.iter_mut() {
        *sample = apply(*sample, gain);
    }
}
