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

//! Band-limited waveform oscillator.

use std::f32::consts::PI;

/// The waveform shapes the synthesis recipes use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

/// A phase-accumulator oscillator. The sawtooth is anti-aliased with a
/// PolyBLEP correction at the phase wrap; sine and triangle have no hard
/// discontinuities and are computed directly.
///
/// The frequency can be retuned between samples, which the kick drum recipe
/// uses to sweep its pitch downward.
#[derive(Clone, Debug)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
    sample_rate: f32,
}

impl Oscillator {
    /// Creates an oscillator at the given frequency.
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: u32) -> Oscillator {
        Oscillator {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate: sample_rate as f32,
        }
    }

    /// Retunes the oscillator. Takes effect on the next sample; phase is
    /// preserved so sweeps stay continuous.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Generates the next sample in [-1, 1] (the sawtooth may overshoot
    /// slightly where the PolyBLEP correction applies).
    pub fn next_sample(&mut self) -> f32 {
        let inc = self.frequency / self.sample_rate;
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            Waveform::Sawtooth => {
                let naive = 2.0 * self.phase - 1.0;
                naive - poly_blep(self.phase, inc)
            }
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }
}

/// PolyBLEP correction for the sawtooth's wrap discontinuity. `t` is the
/// phase in [0, 1), `dt` the per-sample phase increment.
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
