//! # Shelf Drive — An AU/VST3/CLAP Distortion Plugin
//!
//! A single-knob `tanh` distortion built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). Outputs Audio Unit
//! (AUv2), VST3, and CLAP formats from a single codebase.
//!
//! ## Signal Flow
//!
//! ```text
//!             ┌──────────────────┐     ┌────────────────┐     ┌──────────────────┐
//! Input ────► │ High-shelf boost │ ──► │ tanh(x · gain) │ ──► │ High-shelf cut   │ ────► Output
//!             │ ×20 above 5 kHz  │     │  soft clipper  │     │ ×0.05 above 5 kHz│
//!             └──────────────────┘     └────────────────┘     └──────────────────┘
//!                 pre-emphasis              ▲                     de-emphasis
//!                                           │
//!                                      Gain knob
//! ```
//!
//! The boost/cut pair is a classic pre-/de-emphasis trick: the highs hit
//! the clipper harder than the lows, producing a brighter, fizzier
//! distortion, and the cut afterwards restores the overall tonal balance.
//!
//! All of the DSP lives in [`dsp`] as plain Rust types with no knowledge of
//! the host. This file is only the adapter between nih-plug's callbacks
//! and [`dsp::chain::SignalChain`].

pub mod dsp;
pub mod error;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::chain::SignalChain;
use nih_plug::prelude::*;
use params::PluginParams;

/// The main plugin struct.
///
/// ## Why is the gain shared but the chain not?
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and can
/// be written from any thread (the UI thread, the host's automation
/// thread). The signal chain holds its own clone of that `Arc` and reads
/// the gain with a single atomic load per buffer. The filter state inside
/// the chain is owned exclusively by the audio thread and only touched in
/// `process()`, so no locks are needed anywhere.
struct ShelfDrive {
    params: Arc<PluginParams>,

    /// Boost shelf → clipper → cut shelf. Filter state is allocated in
    /// `initialize()`, once the channel count is known.
    chain: SignalChain<PluginParams>,

    /// How many of the buffer's channels carry input audio. Any extra
    /// output channels are silenced by the chain.
    input_channels: usize,
}

impl Default for ShelfDrive {
    fn default() -> Self {
        let params = Arc::new(PluginParams::default());
        Self {
            chain: SignalChain::new(params.clone()),
            params,
            // Placeholder until initialize() sees the real layout.
            input_channels: 2,
        }
    }
}

impl Plugin for ShelfDrive {
    const NAME: &'static str = "Shelf Drive";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo and mono, with matching input and output. The host picks the
    // first layout that fits the track, so stereo goes first.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    // Not a MIDI effect; any MIDI on the track is ignored.
    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Off on purpose: with sample-accurate automation nih-plug splits the
    // buffer at every automation point, and the chain's one-gain-per-block
    // snapshot would turn into one-gain-per-fragment.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is first loaded, or when the sample rate or
    /// channel layout changes. This is where both shelf filters allocate
    /// their per-channel state and redesign their coefficients for the
    /// host's sample rate.
    ///
    /// Returning `false` tells the host we can't run with this
    /// configuration (e.g. a sample rate so low the 5 kHz shelf sits above
    /// Nyquist).
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let output_channels = audio_io_layout
            .main_output_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);
        self.input_channels = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(output_channels);

        match self.chain.prepare(
            buffer_config.sample_rate,
            buffer_config.max_buffer_size as usize,
            output_channels,
        ) {
            Ok(()) => true,
            Err(err) => {
                nih_log!(
                    "Rejecting {} Hz / {} channel configuration: {err}",
                    buffer_config.sample_rate,
                    output_channels
                );
                false
            }
        }
    }

    /// Called when playback stops or the plugin is bypassed. Clears both
    /// filters so the tail of the last play doesn't ring into the next.
    fn reset(&mut self) {
        self.chain.reset();
    }

    /// Boost, distort, cut. See [`SignalChain::process`] for the details.
    ///
    /// nih-plug already enables flush-to-zero on the audio thread, so
    /// decaying filter state can't fall into slow denormal arithmetic.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.chain.process(buffer.as_slice(), self.input_channels);

        // No reverb or delay, so nothing rings on after the input stops.
        ProcessStatus::Normal
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for ShelfDrive {
    const CLAP_ID: &'static str = "com.loveless-audio.shelf-drive";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A tanh distortion bracketed by high-shelf pre- and de-emphasis");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Distortion,
    ];
}

impl Vst3Plugin for ShelfDrive {
    // 16 ASCII bytes; must never change once released.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssShelfDrv001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Distortion];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as AUv2 for Logic Pro.

nih_export_clap!(ShelfDrive);
nih_export_vst3!(ShelfDrive);

clap_wrapper::export_auv2!();
