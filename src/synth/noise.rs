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

//! White-noise bursts for the snare and hi-hat voices.

use rand::Rng;

/// A fixed-length buffer of uniform white noise, generated once at trigger
/// time and played through exactly once. Produces silence after exhaustion.
#[derive(Clone, Debug)]
pub struct NoiseBurst {
    samples: Vec<f32>,
    position: usize,
}

impl NoiseBurst {
    /// Creates a burst lasting `duration_secs` at the given sample rate.
    pub fn new(duration_secs: f32, sample_rate: u32) -> NoiseBurst {
        let frames = (duration_secs * sample_rate as f32).round() as usize;
        let mut rng = rand::thread_rng();
        NoiseBurst {
            samples: (0..frames).map(|_| rng.gen_range(-1.0f32..1.0)).collect(),
            position: 0,
        }
    }

    /// Returns the next noise sample, or 0.0 once the burst is exhausted.
    pub fn next_sample(&mut self) -> f32 {
        match self.samples.get(self.position) {
            Some(&sample) => {
                self.position += 1;
                sample
            }
            None => 0.0,
        }
    }

    /// The total length of the burst in frames.
    pub fn len_frames(&self) -> u64 {
        self.samples.len() as u64
    }
}
