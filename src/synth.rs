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

//! The synthesis engine: maps triggers to sounds.
//!
//! Triggering is fire-and-forget. Each trigger builds a self-terminating
//! synthesis graph and hands it to the output bus over a channel, so the
//! caller never waits on the audio path and overlapping sounds pile up
//! freely. There is no way to stop a sound early; every graph carries its
//! own fixed lifetime.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::audio::VoiceSender;

pub mod envelope;
pub mod filter;
pub mod graph;
pub mod noise;
pub mod oscillator;

use graph::SynthGraph;

/// How melodic notes are voiced. Exactly one mode is active at a time; the
/// session owns the current choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    /// Sustained triangle tones with a long release.
    Piano,
    /// Plucked sawtooth tones through an opening low-pass filter.
    Synth,
    /// Keys trigger drum pads instead of notes.
    Drums,
}

impl FromStr for PerformanceMode {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "piano" => Ok(PerformanceMode::Piano),
            "synth" => Ok(PerformanceMode::Synth),
            "drums" => Ok(PerformanceMode::Drums),
            _ => Err(format!("unrecognized mode: {}", s).into()),
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceMode::Piano => write!(f, "piano"),
            PerformanceMode::Synth => write!(f, "synth"),
            PerformanceMode::Drums => write!(f, "drums"),
        }
    }
}

/// The percussion voices the drum pads can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PercussionVoice {
    Kick,
    Snare,
    HiHat,
}

impl fmt::Display for PercussionVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercussionVoice::Kick => write!(f, "kick"),
            PercussionVoice::Snare => write!(f, "snare"),
            PercussionVoice::HiHat => write!(f, "hihat"),
        }
    }
}

/// Builds synthesis graphs for triggers and dispatches them to the bus.
pub struct SynthEngine {
    /// Channel to the device's producer thread, which owns the bus.
    voice_tx: VoiceSender,
    sample_rate: u32,
}

impl SynthEngine {
    /// Creates an engine dispatching to the given voice channel.
    pub fn new(voice_tx: VoiceSender, sample_rate: u32) -> SynthEngine {
        SynthEngine {
            voice_tx,
            sample_rate,
        }
    }

    /// Triggers a melodic note. The frequency must be positive; anything
    /// else is logged and dropped. In drums mode melodic notes are silent,
    /// so the trigger is a no-op.
    pub fn trigger_note(&self, frequency: f32, mode: PerformanceMode) {
        if !frequency.is_finite() || frequency <= 0.0 {
            warn!(frequency, "Ignoring note trigger with invalid frequency");
            return;
        }

        let graph = match mode {
            PerformanceMode::Piano => SynthGraph::sustained_tone(frequency, self.sample_rate),
            PerformanceMode::Synth => SynthGraph::plucked_tone(frequency, self.sample_rate),
            PerformanceMode::Drums => {
                debug!(frequency, "No melodic voice in drums mode");
                return;
            }
        };

        debug!(frequency, mode = %mode, "Note triggered");
        self.dispatch(graph);
    }

    /// Triggers a percussion voice.
    pub fn trigger_pad(&self, voice: PercussionVoice) {
        let graph = match voice {
            PercussionVoice::Kick => SynthGraph::kick(self.sample_rate),
            PercussionVoice::Snare => SynthGraph::snare(self.sample_rate),
            PercussionVoice::HiHat => SynthGraph::hihat(self.sample_rate),
        };

        debug!(voice = %voice, "Pad triggered");
        self.dispatch(graph);
    }

    fn dispatch(&self, graph: SynthGraph) {
        // Sending never blocks; the channel is unbounded and the producer
        // thread drains it every block.
        if let Err(e) = self.voice_tx.send(Box::new(graph)) {
            error!(error = %e, "Failed to send voice to the bus");
        }
    }
}
