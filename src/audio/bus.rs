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

//! The shared output bus.
//!
//! Every live sound renders onto this bus. The bus sums whatever voices are
//! currently alive, applies the master gain, advances the engine's sample
//! clock, and feeds an optional recording tap. Voices drop off the bus the
//! moment they report themselves finished; the bus itself plays forever.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};

/// A mono sound that renders onto the bus.
pub trait VoiceSource: Send {
    /// Renders up to `out.len()` frames, returning the number written.
    /// Writing fewer frames than requested marks the voice finished.
    fn render(&mut self, out: &mut [f32]) -> usize;
}

/// Mixes all live voices into interleaved output blocks.
pub struct MixBus {
    /// Voices currently sounding. Only the device's producer thread renders,
    /// so this lock is effectively uncontended outside of triggers.
    voices: Mutex<Vec<Box<dyn VoiceSource>>>,
    num_channels: u16,
    sample_rate: u32,
    master_gain: f32,
    /// Frames rendered since the engine started.
    clock_frames: AtomicU64,
    /// When recording, rendered blocks are copied here post-master-gain.
    tap: RwLock<Option<Sender<Vec<f32>>>>,
}

impl MixBus {
    /// Creates a bus with the given channel layout and master gain.
    pub fn new(num_channels: u16, sample_rate: u32, master_gain: f32) -> MixBus {
        MixBus {
            voices: Mutex::new(Vec::new()),
            num_channels,
            sample_rate,
            master_gain,
            clock_frames: AtomicU64::new(0),
            tap: RwLock::new(None),
        }
    }

    /// Adds a voice to the bus. It starts sounding on the next mixed block
    /// and removes itself when its own timeline ends.
    pub fn add_voice(&self, voice: Box<dyn VoiceSource>) {
        self.voices.lock().push(voice);
    }

    /// The number of voices currently sounding.
    #[cfg(test)]
    pub fn active_voices(&self) -> usize {
        self.voices.lock().len()
    }

    /// Renders one interleaved block. Mono voices are summed into every
    /// output channel; finished voices are dropped along the way.
    pub fn mix_into(&self, out: &mut [f32]) {
        let channels = self.num_channels as usize;
        let frames = out.len() / channels;
        out.fill(0.0);

        let mut scratch = vec![0.0f32; frames];
        {
            let mut voices = self.voices.lock();
            voices.retain_mut(|voice| {
                let written = voice.render(&mut scratch[..frames]);
                for (frame, &sample) in scratch[..written].iter().enumerate() {
                    let base = frame * channels;
                    for slot in out[base..base + channels].iter_mut() {
                        *slot += sample;
                    }
                }
                written == frames
            });
        }

        for sample in out.iter_mut() {
            *sample *= self.master_gain;
        }

        self.clock_frames.fetch_add(frames as u64, Ordering::Relaxed);

        if let Some(tap) = self.tap.read().as_ref() {
            // The recorder owns the other end; if it has already gone away
            // the block is simply lost, which only happens during stop.
            let _ = tap.send(out.to_vec());
        }
    }

    /// Frames rendered since the engine started.
    pub fn current_frame(&self) -> u64 {
        self.clock_frames.load(Ordering::Relaxed)
    }

    /// Installs the recording tap. Replaces any existing tap.
    pub fn install_tap(&self, tap: Sender<Vec<f32>>) {
        *self.tap.write() = Some(tap);
    }

    /// Removes the recording tap, closing the channel to the recorder.
    pub fn remove_tap(&self) {
        *self.tap.write() = None;
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
