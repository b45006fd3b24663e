//! Block renderer for one receiver
//!
//! Holds a fixed number of pair slots. Per block it applies queued
//! commands, renders every active pair into the shared output buffers,
//! adds the diffuse field and finally applies per-speaker calibration for
//! speaker-based formats.

use std::sync::Arc;

use basedrop::Owned;

use super::command::RenderCommand;
use super::pair::{PairFactory, RenderPair};
use crate::buffer::{ChannelBuffers, FoaBlock};
use crate::config::RenderConfig;
use crate::diagnostics::Diagnostics;
use crate::error::ConfigResult;
use crate::geometry::SpeakerArrayGeometry;
use crate::panning::{EncoderContext, PanningEncoder, SpeakerPostProc};
use crate::types::Sample;

pub struct Renderer {
    pairs: Vec<Option<Owned<RenderPair>>>,
    /// Encoder used for the diffuse field only
    diffuse: PanningEncoder,
    post: Option<SpeakerPostProc>,
    channels: usize,
    /// Commands that addressed an empty or invalid slot
    ignored_commands: u64,
}

impl Renderer {
    /// Create a renderer with `max_pairs` slots and the factory that builds
    /// pairs for it, using the encoder selected in `config`
    pub fn new(
        config: &RenderConfig,
        geometry: Option<Arc<SpeakerArrayGeometry>>,
        max_pairs: usize,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<(Self, PairFactory)> {
        let mut context = EncoderContext::new(config);
        if let Some(geometry) = geometry {
            context = context.with_geometry(geometry);
        }
        let encoder = &config.encoder;
        let factory = PairFactory::new(config.clone(), context.clone())?;
        let channels = factory.channels();
        let diffuse = PanningEncoder::configure(channels, encoder, &context, diagnostics)?;
        let post = match (&context.geometry, encoder.needs_geometry()) {
            (Some(geometry), true) => Some(SpeakerPostProc::new(
                geometry,
                context.sample_rate,
                context.speed_of_sound,
            )),
            _ => None,
        };

        log::info!(
            "Renderer: {} with {} channels, {} pair slots",
            encoder.name(),
            channels,
            max_pairs
        );
        let renderer = Self {
            pairs: (0..max_pairs).map(|_| None).collect(),
            diffuse,
            post,
            channels,
            ignored_commands: 0,
        };
        Ok((renderer, factory))
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn max_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn pair(&self, slot: usize) -> Option<&RenderPair> {
        self.pairs.get(slot)?.as_deref()
    }

    pub fn active_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_some()).count()
    }

    /// Number of ignored commands since the last call
    pub fn take_ignored_commands(&mut self) -> u64 {
        std::mem::take(&mut self.ignored_commands)
    }

    /// Apply all pending commands
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<RenderCommand>) {
        while let Ok(cmd) = rx.pop() {
            self.apply(cmd);
        }
    }

    fn apply(&mut self, cmd: RenderCommand) {
        let Some(slot) = self.pairs.get_mut(cmd.slot()) else {
            self.ignored_commands += 1;
            return;
        };
        match cmd {
            RenderCommand::AddPair { pair, .. } => {
                if pair.channels() == self.channels {
                    // a replaced pair goes to the collector
                    *slot = Some(pair);
                } else {
                    self.ignored_commands += 1;
                }
            }
            RenderCommand::RemovePair { .. } => {
                if slot.take().is_none() {
                    self.ignored_commands += 1;
                }
            }
            RenderCommand::SetPosition { position, .. } => match slot {
                Some(pair) => pair.set_position(position),
                None => self.ignored_commands += 1,
            },
            RenderCommand::SetGain { gain, .. } => match slot {
                Some(pair) => pair.set_gain(gain),
                None => self.ignored_commands += 1,
            },
        }
    }

    /// Render one block
    ///
    /// `inputs` is indexed by each pair's input number; pairs whose input is
    /// missing are skipped. `outputs` is overwritten.
    pub fn process(
        &mut self,
        inputs: &[&[Sample]],
        diffuse: Option<&FoaBlock>,
        outputs: &mut ChannelBuffers,
    ) {
        debug_assert!(outputs.num_channels() >= self.channels);
        outputs.fill_silence();
        for pair in self.pairs.iter_mut().flatten() {
            if let Some(input) = inputs.get(pair.input()) {
                pair.process(input, outputs);
            }
        }
        if let Some(foa) = diffuse {
            self.diffuse.add_diffuse(foa, outputs);
        }
        if let Some(post) = &mut self.post {
            post.process(outputs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderConfig;
    use crate::engine::command_channel;
    use crate::types::Position;

    fn quad() -> (Renderer, PairFactory) {
        let mut diag = Diagnostics::new();
        let geometry = Arc::new(SpeakerArrayGeometry::ring(4, 1.0, &mut diag).unwrap());
        let config = RenderConfig {
            encoder: EncoderConfig::Vbap2d,
            ..Default::default()
        };
        Renderer::new(
            &config,
            Some(geometry),
            8,
            &mut diag,
        )
        .unwrap()
    }

    #[test]
    fn test_commands_manage_slots() {
        let (mut renderer, factory) = quad();
        let (mut tx, mut rx) = command_channel();
        let mut diag = Diagnostics::new();
        let pair = factory.build(0, Position::new(2.0, 0.0, 0.0), &mut diag).unwrap();

        assert!(tx.push(RenderCommand::add_pair(2, pair)).is_ok());
        assert!(tx.push(RenderCommand::SetGain { slot: 2, gain: 0.5 }).is_ok());
        assert!(tx.push(RenderCommand::SetGain { slot: 5, gain: 0.5 }).is_ok());
        assert!(tx.push(RenderCommand::RemovePair { slot: 42 }).is_ok());
        renderer.process_commands(&mut rx);

        assert_eq!(renderer.active_pairs(), 1);
        assert_eq!(renderer.pair(2).map(RenderPair::gain), Some(0.5));
        assert_eq!(renderer.take_ignored_commands(), 2);

        assert!(tx.push(RenderCommand::RemovePair { slot: 2 }).is_ok());
        renderer.process_commands(&mut rx);
        assert_eq!(renderer.active_pairs(), 0);
    }

    #[test]
    fn test_renders_front_source_to_front_speaker() {
        let (mut renderer, factory) = quad();
        let (mut tx, mut rx) = command_channel();
        let mut diag = Diagnostics::new();
        let pair = factory.build(0, Position::new(1.0, 0.0, 0.0), &mut diag).unwrap();
        assert!(tx.push(RenderCommand::add_pair(0, pair)).is_ok());
        renderer.process_commands(&mut rx);

        let input = vec![1.0; 256];
        let mut out = ChannelBuffers::new(4, 256);
        for _ in 0..4 {
            renderer.process(&[&input[..]], None, &mut out);
        }
        assert!((out.channel(0)[255] - 1.0).abs() < 1e-3);
        for ch in 1..4 {
            assert!(out.channel(ch)[255].abs() < 1e-6);
        }
    }

    #[test]
    fn test_encoder_selected_by_config() {
        let mut diag = Diagnostics::new();
        let (renderer, factory) =
            Renderer::new(&RenderConfig::default(), None, 2, &mut diag).unwrap();
        assert_eq!(renderer.channels(), 1);
        assert_eq!(factory.encoder_config(), &EncoderConfig::Omni);

        let config = RenderConfig {
            encoder: EncoderConfig::Ambisonic {
                order: 2,
                horizontal: false,
                convention: Default::default(),
            },
            ..Default::default()
        };
        let (renderer, _) = Renderer::new(&config, None, 2, &mut diag).unwrap();
        assert_eq!(renderer.channels(), 9);

        // speaker-based encoders need a layout
        let config = RenderConfig {
            encoder: EncoderConfig::Vbap2d,
            ..Default::default()
        };
        assert!(Renderer::new(&config, None, 2, &mut diag).is_err());
    }

    #[test]
    fn test_diffuse_field_reaches_outputs() {
        let (mut renderer, _) = quad();
        let mut foa = FoaBlock::new(256);
        foa.get_mut(crate::buffer::FoaChannel::W).fill(1.0);
        let mut out = ChannelBuffers::new(4, 256);
        renderer.process(&[], Some(&foa), &mut out);
        // first-order decode of W: sqrt(2) / N per speaker
        let expected = std::f32::consts::SQRT_2 / 4.0;
        for ch in 0..4 {
            assert!((out.channel(ch)[0] - expected).abs() < 1e-5);
        }
    }
}
