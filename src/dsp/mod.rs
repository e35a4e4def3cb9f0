//! # DSP (Digital Signal Processing) Core
//!
//! Everything that touches audio samples, independent of the plugin host:
//!
//! - **`shelf`**: A second-order high-shelf filter run per channel. Two
//!   of them bracket the distortion: a boost before, a cut after.
//!
//! - **`waveshaper`**: The `tanh` soft clipper that does the actual
//!   distorting.
//!
//! - **`gain`**: The seam through which the live "Gain" value reaches the
//!   audio thread.
//!
//! - **`chain`**: Runs the three stages in order over one host buffer.

pub mod chain;
pub mod gain;
pub mod shelf;
pub mod waveshaper;

/// Corner frequency of both shelves.
pub const SHELF_CUTOFF_HZ: f32 = 5000.0;
/// Shelf slope. 0.5 is gentler than Butterworth and never overshoots.
pub const SHELF_Q: f32 = 0.5;
/// Linear gain of the pre-distortion boost shelf above the cutoff.
pub const BOOST_GAIN: f32 = 20.0;
/// Linear gain of the post-distortion cut shelf above the cutoff. Not the
/// exact inverse of `BOOST_GAIN`; the pair is tuned by ear.
pub const CUT_GAIN: f32 = 0.05;
/// Rate the shelves are designed at before the host tells us the real one.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

// The stock shelves are designed at `DEFAULT_SAMPLE_RATE` before the host
// reports its real rate, so they must be valid there.
const _: () = assert!(SHELF_CUTOFF_HZ > 0.0 && SHELF_CUTOFF_HZ < DEFAULT_SAMPLE_RATE / 2.0);
const _: () = assert!(SHELF_Q > 0.0);
const _: () = assert!(BOOST_GAIN >= 1.0 && CUT_GAIN >= 0.0 && CUT_GAIN <= 1.0);
