//! # The Signal Chain
//!
//! Runs the three stages over one host buffer, always in this order:
//!
//! ```text
//!  ┌─────────────┐    ┌────────────────┐    ┌─────────────┐
//!  │ boost shelf │ ─► │ tanh(x · gain) │ ─► │  cut shelf  │
//!  │ (all chans) │    │ (input chans)  │    │ (all chans) │
//!  └─────────────┘    └────────────────┘    └─────────────┘
//! ```
//!
//! Swapping or skipping a stage changes the sound, so the order is fixed
//! in `process()` rather than being configurable.

use std::sync::Arc;

use nih_plug::nih_log;

use super::gain::GainSource;
use super::shelf::{ShelfFilterStage, ShelfKind, ShelfSettings};
use super::waveshaper;
use super::DEFAULT_SAMPLE_RATE;
use crate::error::ConfigError;

/// Boost shelf → gain + tanh → cut shelf, over planar multi-channel audio.
///
/// The chain is a plain value: it knows nothing about the plugin host. The
/// gain comes from any [`GainSource`] handed to the constructor.
pub struct SignalChain<G: GainSource> {
    /// Shared with whoever writes the gain (the host's parameter tree in
    /// the plugin). Read exactly once per `process()` call.
    gain: Arc<G>,

    /// Pre-emphasis shelf, run over every channel before the clipper.
    boost: ShelfFilterStage,

    /// De-emphasis shelf, run over every channel after the clipper.
    cut: ShelfFilterStage,
}

impl<G: GainSource> SignalChain<G> {
    /// A chain with the stock shelves: ×20 boost and ×0.05 cut, both at
    /// 5 kHz with Q 0.5.
    pub fn new(gain: Arc<G>) -> Self {
        // The stock shelves are checked against `DEFAULT_SAMPLE_RATE` at
        // compile time in `dsp/mod.rs`, so this can't fail.
        Self::with_settings(
            gain,
            ShelfSettings::stock(ShelfKind::Boost),
            ShelfSettings::stock(ShelfKind::Cut),
        )
        .expect("stock shelf settings must be valid at the default sample rate")
    }

    /// A chain with custom shelf settings, designed at the default sample
    /// rate until [`prepare`](Self::prepare) supplies the real one.
    pub fn with_settings(
        gain: Arc<G>,
        boost: ShelfSettings,
        cut: ShelfSettings,
    ) -> Result<Self, ConfigError> {
        let mut boost_stage = ShelfFilterStage::new();
        boost_stage.configure_with(boost, DEFAULT_SAMPLE_RATE)?;
        let mut cut_stage = ShelfFilterStage::new();
        cut_stage.configure_with(cut, DEFAULT_SAMPLE_RATE)?;

        Ok(Self {
            gain,
            boost: boost_stage,
            cut: cut_stage,
        })
    }

    /// Size both filter stages for the host's configuration. Call this
    /// before the first `process()` and again whenever the sample rate or
    /// channel layout changes.
    ///
    /// Both stages are checked before either is touched: if the new
    /// configuration is invalid for one of them, neither changes and the
    /// chain keeps running with its previous configuration.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<(), ConfigError> {
        let (boost, _) = self.boost.check_prepare(sample_rate, num_channels)?;
        let (cut, _) = self.cut.check_prepare(sample_rate, num_channels)?;

        // Already validated above, so these only allocate and commit.
        self.boost.prepare(sample_rate, max_block_size, num_channels)?;
        self.cut.prepare(sample_rate, max_block_size, num_channels)?;

        for settings in [boost, cut] {
            nih_log!(
                "{:?} shelf prepared: {} Hz cutoff, Q {}, gain {} at {} Hz, {} channel(s)",
                settings.kind,
                settings.cutoff_hz,
                settings.q,
                settings.gain,
                sample_rate,
                num_channels
            );
        }

        Ok(())
    }

    /// Clear both filters' history. The chain stays ready to process.
    pub fn reset(&mut self) {
        self.boost.reset();
        self.cut.reset();
    }

    /// Process one block in place.
    ///
    /// `buffer` holds every output channel; only the first
    /// `input_channels` of them carry input audio. The rest are zeroed
    /// first, since hosts don't promise they're clean.
    ///
    /// # Panics
    ///
    /// If the chain hasn't been prepared, or `buffer` has more channels
    /// than it was prepared for.
    pub fn process(&mut self, buffer: &mut [&mut [f32]], input_channels: usize) {
        let input_channels = input_channels.min(buffer.len());

        // 1. Silence outputs that have no matching input.
        for channel in buffer[input_channels..].iter_mut() {
            channel.fill(0.0);
        }

        // 2. Pre-emphasis: push the highs up before they hit the clipper.
        self.boost.process(buffer);

        // 3. One read for the whole block, so every sample sees the same
        //    gain even if the knob moves mid-block.
        let gain = self.gain.current_gain();

        // 4. Distort.
        for channel in buffer[..input_channels].iter_mut() {
            waveshaper::apply_block(channel, gain);
        }

        // 5. De-emphasis: bring the highs back down.
        self.cut.process(buffer);
    }

    pub fn gain_source(&self) -> &Arc<G> {
        &self.gain
    }

    pub fn boost(&self) -> &ShelfFilterStage {
        &self.boost
    }

    pub fn cut(&self) -> &ShelfFilterStage {
        &self.cut
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;
    use crate::dsp::gain::GainParameter;

    fn unity_chain(gain: f32) -> SignalChain<GainParameter> {
        let mut chain = SignalChain::with_settings(
            Arc::new(GainParameter::new(gain)),
            ShelfSettings::unity(ShelfKind::Boost),
            ShelfSettings::unity(ShelfKind::Cut),
        )
        .unwrap();
        chain.prepare(44100.0, 1024, 2).unwrap();
        chain
    }

    fn stock_chain(gain: f32, num_channels: usize) -> SignalChain<GainParameter> {
        let mut chain = SignalChain::new(Arc::new(GainParameter::new(gain)));
        chain.prepare(44100.0, 1024, num_channels).unwrap();
        chain
    }

    /// With 0 dB shelves the chain reduces to the clipper alone:
    /// [1, 1, 1] at gain 1 comes out as tanh(1) everywhere.
    #[test]
    fn test_unity_shelves_isolate_waveshaper() {
        let mut chain = unity_chain(1.0);
        let mut block = [1.0_f32; 3];
        chain.process(&mut [block.as_mut_slice()], 1);

        let expected = 1.0_f32.tanh();
        for sample in block {
            assert!(
                (sample - expected).abs() < 1e-6,
                "Expected tanh(1) = {expected}, got {sample}"
            );
        }
    }

    /// Output channels past the input count are zeroed, and stay zero
    /// through both filters.
    #[test]
    fn test_extra_output_channels_are_silenced() {
        let mut chain = stock_chain(2.0, 2);
        let mut input = [0.5_f32; 16];
        let mut garbage = [0.7_f32; 16];
        chain.process(&mut [input.as_mut_slice(), garbage.as_mut_slice()], 1);

        assert!(garbage.iter().all(|s| *s == 0.0), "got {garbage:?}");
        assert!(input.iter().any(|s| *s != 0.0));
    }

    /// Zero gain turns anything into silence, shelves or not.
    #[test]
    fn test_zero_gain_is_silence() {
        let mut chain = stock_chain(0.0, 2);
        let mut left: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin()).collect();
        let mut right = left.clone();
        chain.process(&mut [left.as_mut_slice(), right.as_mut_slice()], 2);

        assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    }

    /// Even at maximum gain the output stays finite and close to the
    /// clipper's ±1 rails.
    #[test]
    fn test_stock_chain_output_is_finite() {
        let mut chain = stock_chain(10000.0, 1);
        let mut block: Vec<f32> = (0..512).map(|i| (i as f32 * 0.05).sin()).collect();
        chain.process(&mut [block.as_mut_slice()], 1);

        assert!(block.iter().all(|s| s.is_finite()));
        assert!(block.iter().all(|s| s.abs() < 2.0));
    }

    /// One 8-sample block equals two 4-sample blocks, bit for bit.
    #[test]
    fn test_block_size_invariance() {
        let input: [f32; 8] = [0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7, -0.8];

        let mut whole = input;
        stock_chain(3.0, 1).process(&mut [whole.as_mut_slice()], 1);

        let mut chain = stock_chain(3.0, 1);
        let mut first = [0.0_f32; 4];
        let mut second = [0.0_f32; 4];
        first.copy_from_slice(&input[..4]);
        second.copy_from_slice(&input[4..]);
        chain.process(&mut [first.as_mut_slice()], 1);
        chain.process(&mut [second.as_mut_slice()], 1);

        assert_eq!(&whole[..4], &first);
        assert_eq!(&whole[4..], &second);
    }

    /// After reset() the chain behaves exactly like a freshly prepared one.
    #[test]
    fn test_reset_matches_fresh_chain() {
        let mut used = stock_chain(5.0, 1);
        let mut noise: Vec<f32> = (0..256).map(|i| (i as f32 * 1.7).cos()).collect();
        used.process(&mut [noise.as_mut_slice()], 1);
        used.reset();

        let mut impulse_a = [0.0_f32; 32];
        impulse_a[0] = 1.0;
        let mut impulse_b = impulse_a;

        used.process(&mut [impulse_a.as_mut_slice()], 1);
        stock_chain(5.0, 1).process(&mut [impulse_b.as_mut_slice()], 1);
        assert_eq!(impulse_a, impulse_b);
    }

    /// A writer thread flips the gain as fast as it can while the audio
    /// side processes blocks. Every block must be shaped with exactly one
    /// of the two values, never a mix.
    #[test]
    fn test_gain_snapshot_is_consistent_per_block() {
        let mut chain = unity_chain(1.0);
        let gain = Arc::clone(chain.gain_source());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let gain = Arc::clone(&gain);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut flip = false;
                while !done.load(Ordering::Relaxed) {
                    gain.set(if flip { 2.0 } else { 1.0 });
                    flip = !flip;
                }
            })
        };

        let at_one = 0.5_f32.tanh();
        let at_two = 1.0_f32.tanh();
        for _ in 0..2000 {
            let mut block = [0.5_f32; 64];
            chain.process(&mut [block.as_mut_slice()], 1);

            let first = block[0];
            assert!(first == at_one || first == at_two, "unexpected sample {first}");
            assert!(block.iter().all(|s| *s == first), "mixed gains in one block");
        }

        done.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }

    #[test]
    fn test_prepare_sizes_both_stages() {
        let chain = stock_chain(1.0, 2);
        assert_eq!(chain.boost().num_channels(), 2);
        assert_eq!(chain.cut().num_channels(), 2);
        assert_eq!(chain.boost().settings().map(|s| s.gain), Some(20.0));
        assert_eq!(chain.cut().settings().map(|s| s.gain), Some(0.05));
    }

    /// The stock chain must equal boost → tanh → cut built by hand from
    /// standalone stages, bit for bit, and must not equal the reversed
    /// order. Skipping either shelf breaks the first check.
    #[test]
    fn test_stages_run_boost_then_clip_then_cut() {
        const GAIN: f32 = 3.0;
        let input: Vec<f32> = (0..256).map(|i| 0.3 * (i as f32 * 2.5).sin()).collect();

        let mut from_chain = input.clone();
        stock_chain(GAIN, 1).process(&mut [from_chain.as_mut_slice()], 1);

        let stage = |kind| {
            let mut stage = ShelfFilterStage::new();
            stage
                .configure_with(ShelfSettings::stock(kind), 44100.0)
                .unwrap();
            stage.prepare(44100.0, 1024, 1).unwrap();
            stage
        };

        let mut by_hand = input.clone();
        stage(ShelfKind::Boost).process(&mut [by_hand.as_mut_slice()]);
        waveshaper::apply_block(&mut by_hand, GAIN);
        stage(ShelfKind::Cut).process(&mut [by_hand.as_mut_slice()]);
        assert_eq!(from_chain, by_hand);

        let mut reversed = input.clone();
        stage(ShelfKind::Cut).process(&mut [reversed.as_mut_slice()]);
        waveshaper::apply_block(&mut reversed, GAIN);
        stage(ShelfKind::Boost).process(&mut [reversed.as_mut_slice()]);
        assert_ne!(from_chain, reversed);

        // Clip alone (both shelves skipped) is different again.
        let mut clip_only = input;
        waveshaper::apply_block(&mut clip_only, GAIN);
        assert_ne!(from_chain, clip_only);
    }

    /// If the new rate is fine for one shelf but not the other, neither
    /// stage changes: same channel count, same rate, still processable.
    #[test]
    fn test_failed_prepare_leaves_both_stages_untouched() {
        let low_boost = ShelfSettings {
            cutoff_hz: 1000.0,
            ..ShelfSettings::stock(ShelfKind::Boost)
        };
        let mut chain = SignalChain::with_settings(
            Arc::new(GainParameter::new(1.0)),
            low_boost,
            ShelfSettings::stock(ShelfKind::Cut),
        )
        .unwrap();
        chain.prepare(44100.0, 512, 1).unwrap();

        // 1 kHz boost is fine at 8 kHz; the 5 kHz cut is above Nyquist.
        assert!(matches!(
            chain.prepare(8000.0, 512, 2),
            Err(ConfigError::CutoffOutOfRange { .. })
        ));

        for stage in [chain.boost(), chain.cut()] {
            assert_eq!(stage.num_channels(), 1);
            assert_eq!(stage.sample_rate(), 44100.0);
        }

        let mut block = [0.5_f32; 16];
        chain.process(&mut [block.as_mut_slice()], 1);
        assert!(block.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_prepare_propagates_config_errors() {
        let mut chain = SignalChain::new(Arc::new(GainParameter::default()));
        assert!(matches!(
            chain.prepare(-1.0, 512, 2),
            Err(ConfigError::InvalidSampleRate { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "before prepare")]
    fn test_process_before_prepare_panics() {
        let mut chain = SignalChain::new(Arc::new(GainParameter::default()));
        let mut block = [0.0_f32; 8];
        chain.process(&mut [block.as_mut_slice()], 1);
    }
}
