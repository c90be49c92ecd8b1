// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Transient synthesis graphs.
//!
//! Every triggered sound is an independent graph: a source (oscillator or
//! noise burst) through an optional filter into a gain envelope, with a fixed
//! frame budget. A graph renders its budget and then reports itself finished;
//! nothing outside the graph ever stops it.

use crate::audio::bus::VoiceSource;

use super::envelope::ParamCurve;
use super::filter::BiquadFilter;
use super::noise::NoiseBurst;
use super::oscillator::{Oscillator, Waveform};

/// The signal source at the head of a graph.
#[derive(Clone, Debug)]
enum SoundSource {
    Oscillator(Oscillator),
    Noise(NoiseBurst),
}

/// A self-terminating synthesis graph.
#[derive(Clone, Debug)]
pub struct SynthGraph {
    source: SoundSource,
    /// Sweeps the oscillator frequency over time. Ignored for noise sources.
    pitch_sweep: Option<ParamCurve>,
    filter: Option<BiquadFilter>,
    /// Sweeps the filter cutoff over time.
    cutoff_sweep: Option<ParamCurve>,
    gain: ParamCurve,
    frame: u64,
    duration_frames: u64,
}

fn frames(secs: f32, sample_rate: u32) -> u64 {
    (secs * sample_rate as f32).round() as u64
}

impl SynthGraph {
    /// A piano-like tone: triangle wave with a fast attack and a long
    /// exponential release. Rings for 1.5 seconds.
    pub fn sustained_tone(frequency: f32, sample_rate: u32) -> SynthGraph {
        let duration = frames(1.5, sample_rate);
        SynthGraph {
            source: SoundSource::Oscillator(Oscillator::new(
                Waveform::Triangle,
                frequency,
                sample_rate,
            )),
            pitch_sweep: None,
            filter: None,
            cutoff_sweep: None,
            gain: ParamCurve::new(0.0)
                .linear_ramp_to(1.0, frames(0.02, sample_rate))
                .exponential_ramp_to(0.001, duration),
            frame: 0,
            duration_frames: duration,
        }
    }

    /// A plucked synth tone: sawtooth through a low-pass filter whose cutoff
    /// opens from 500Hz to 2kHz, with a short percussive envelope. Lasts 0.8
    /// seconds.
    pub fn plucked_tone(frequency: f32, sample_rate: u32) -> SynthGraph {
        let duration = frames(0.8, sample_rate);
        SynthGraph {
            source: SoundSource::Oscillator(Oscillator::new(
                Waveform::Sawtooth,
                frequency,
                sample_rate,
            )),
            pitch_sweep: None,
            filter: Some(BiquadFilter::lowpass(500.0, sample_rate)),
            cutoff_sweep: Some(
                ParamCurve::new(500.0).linear_ramp_to(2000.0, frames(0.1, sample_rate)),
            ),
            gain: ParamCurve::new(0.0)
                .linear_ramp_to(0.5, frames(0.05, sample_rate))
                .exponential_ramp_to(0.001, duration),
            frame: 0,
            duration_frames: duration,
        }
    }

    /// A kick drum: sine wave swept from 150Hz down to nearly nothing, gain
    /// decaying to 1% of peak over half a second.
    pub fn kick(sample_rate: u32) -> SynthGraph {
        let duration = frames(0.5, sample_rate);
        SynthGraph {
            source: SoundSource::Oscillator(Oscillator::new(Waveform::Sine, 150.0, sample_rate)),
            pitch_sweep: Some(ParamCurve::new(150.0).exponential_ramp_to(0.01, duration)),
            filter: None,
            cutoff_sweep: None,
            gain: ParamCurve::new(1.0).exponential_ramp_to(0.01, duration),
            frame: 0,
            duration_frames: duration,
        }
    }

    /// A snare drum: a 0.2 second noise burst through a 1kHz high-pass, gain
    /// decaying to 1% of peak over the burst.
    pub fn snare(sample_rate: u32) -> SynthGraph {
        let burst = NoiseBurst::new(0.2, sample_rate);
        let duration = burst.len_frames();
        SynthGraph {
            source: SoundSource::Noise(burst),
            pitch_sweep: None,
            filter: Some(BiquadFilter::highpass(1000.0, sample_rate)),
            cutoff_sweep: None,
            gain: ParamCurve::new(0.8).exponential_ramp_to(0.008, duration),
            frame: 0,
            duration_frames: duration,
        }
    }

    /// A hi-hat: a 0.1 second noise burst through a 5kHz high-pass, gain
    /// decaying to 1% of peak within 50 milliseconds.
    pub fn hihat(sample_rate: u32) -> SynthGraph {
        let burst = NoiseBurst::new(0.1, sample_rate);
        let duration = burst.len_frames();
        SynthGraph {
            source: SoundSource::Noise(burst),
            pitch_sweep: None,
            filter: Some(BiquadFilter::highpass(5000.0, sample_rate)),
            cutoff_sweep: None,
            gain: ParamCurve::new(0.5).exponential_ramp_to(0.005, frames(0.05, sample_rate)),
            frame: 0,
            duration_frames: duration,
        }
    }

    /// The total number of frames this graph will render before expiring.
    #[cfg(test)]
    pub fn duration_frames(&self) -> u64 {
        self.duration_frames
    }
}

impl VoiceSource for SynthGraph {
    fn render(&mut self, out: &mut [f32]) -> usize {
        let remaining = (self.duration_frames - self.frame).min(out.len() as u64) as usize;
        for slot in out[..remaining].iter_mut() {
            let sample = match &mut self.source {
                SoundSource::Oscillator(osc) => {
                    if let Some(sweep) = self.pitch_sweep.as_mut() {
                        osc.set_frequency(sweep.next_value());
                    }
                    osc.next_sample()
                }
                SoundSource::Noise(noise) => noise.next_sample(),
            };

            let filtered = match self.filter.as_mut() {
                Some(filter) => {
                    if let Some(sweep) = self.cutoff_sweep.as_mut() {
                        filter.set_cutoff(sweep.next_value());
                    }
                    filter.process(sample)
                }
                None => sample,
            };

            *slot = filtered * self.gain.next_value();
        }
        self.frame += remaining as u64;
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    /// Renders a graph to completion in bus-sized blocks and returns all
    /// samples produced.
    fn render_all(graph: &mut SynthGraph) -> Vec<f32> {
        let mut rendered = Vec::new();
        let mut block = [0.0f32; 512];
        loop {
            let written = graph.render(&mut block);
            rendered.extend_from_slice(&block[..written]);
            if written < block.len() {
                return rendered;
            }
        }
    }

    #[test]
    fn test_graph_durations() {
        assert_eq!(
            SynthGraph::sustained_tone(261.62, SAMPLE_RATE).duration_frames(),
            66150
        );
        assert_eq!(
            SynthGraph::plucked_tone(261.62, SAMPLE_RATE).duration_frames(),
            35280
        );
        assert_eq!(SynthGraph::kick(SAMPLE_RATE).duration_frames(), 22050);
        assert_eq!(SynthGraph::snare(SAMPLE_RATE).duration_frames(), 8820);
        assert_eq!(SynthGraph::hihat(SAMPLE_RATE).duration_frames(), 4410);
    }

    #[test]
    fn test_graph_renders_exactly_its_budget() {
        let mut graph = SynthGraph::hihat(SAMPLE_RATE);
        let rendered = render_all(&mut graph);
        assert_eq!(rendered.len() as u64, graph.duration_frames());

        // A finished graph renders nothing further.
        let mut block = [0.0f32; 64];
        assert_eq!(graph.render(&mut block), 0);
    }

    #[test]
    fn test_sustained_tone_envelope_shape() {
        let graph = SynthGraph::sustained_tone(261.62, SAMPLE_RATE);
        assert_eq!(graph.gain.value_at(0), 0.0);
        let attack_end = 882; // 20ms
        assert!((graph.gain.value_at(attack_end) - 1.0).abs() < 1e-4);
        assert!((graph.gain.value_at(graph.duration_frames()) - 0.001).abs() < 1e-5);
    }

    #[test]
    fn test_plucked_tone_cutoff_sweep() {
        let graph = SynthGraph::plucked_tone(261.62, SAMPLE_RATE);
        let sweep = graph.cutoff_sweep.as_ref().unwrap();
        assert_eq!(sweep.value_at(0), 500.0);
        let sweep_end = 4410; // 100ms
        assert!((sweep.value_at(sweep_end) - 2000.0).abs() < 0.5);
        assert!((sweep.value_at(graph.duration_frames()) - 2000.0).abs() < 0.5);
    }

    #[test]
    fn test_percussion_decays_to_one_percent_of_peak() {
        for (graph, peak) in [
            (SynthGraph::kick(SAMPLE_RATE), 1.0f32),
            (SynthGraph::snare(SAMPLE_RATE), 0.8),
            (SynthGraph::hihat(SAMPLE_RATE), 0.5),
        ] {
            assert_eq!(graph.gain.value_at(0), peak);
            let end = graph.gain.value_at(graph.duration_frames());
            assert!(
                end <= peak * 0.01 + 1e-6,
                "gain {end} should be at most 1% of peak {peak}"
            );
        }
    }

    #[test]
    fn test_kick_pitch_sweeps_down() {
        let graph = SynthGraph::kick(SAMPLE_RATE);
        let sweep = graph.pitch_sweep.as_ref().unwrap();
        assert_eq!(sweep.value_at(0), 150.0);
        let mid = sweep.value_at(graph.duration_frames() / 2);
        assert!(mid < 150.0 && mid > 0.01);
        assert!((sweep.value_at(graph.duration_frames()) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_kick_ends_quiet() {
        let mut graph = SynthGraph::kick(SAMPLE_RATE);
        let rendered = render_all(&mut graph);

        let onset = &rendered[..rendered.len() / 10];
        let tail = &rendered[rendered.len() - rendered.len() / 20..];
        let onset_peak = onset.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let tail_peak = tail.iter().fold(0.0f32, |m, s| m.max(s.abs()));

        assert!(onset_peak > 0.1, "kick onset should be audible");
        assert!(
            tail_peak <= 0.011,
            "kick tail should be at most 1% of full gain, got {tail_peak}"
        );
    }

    #[test]
    fn test_graphs_do_not_clip() {
        for mut graph in [
            SynthGraph::sustained_tone(523.24, SAMPLE_RATE),
            SynthGraph::plucked_tone(130.81, SAMPLE_RATE),
            SynthGraph::kick(SAMPLE_RATE),
            SynthGraph::snare(SAMPLE_RATE),
            SynthGraph::hihat(SAMPLE_RATE),
        ] {
            for sample in render_all(&mut graph) {
                assert!(
                    sample.abs() <= 1.5,
                    "graph produced an out of range sample: {sample}"
                );
            }
        }
    }
}
