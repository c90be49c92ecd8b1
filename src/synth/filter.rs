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

//! Second-order low-pass and high-pass filters.

use std::f32::consts::PI;

/// Butterworth response.
const DEFAULT_Q: f32 = 0.707;

#[derive(Clone, Copy, Debug, PartialEq)]
enum FilterKind {
    Lowpass,
    Highpass,
}

/// A biquad IIR filter in Direct Form II Transposed, with coefficients from
/// the Audio EQ Cookbook (Robert Bristow-Johnson).
///
/// The cutoff can be retuned between samples; coefficients are recomputed
/// lazily so a static cutoff costs nothing beyond the filter itself.
#[derive(Clone, Debug)]
pub struct BiquadFilter {
    kind: FilterKind,
    cutoff: f32,
    q: f32,
    sample_rate: f32,

    // Normalized coefficients.
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Delay state.
    z1: f32,
    z2: f32,

    dirty: bool,
}

impl BiquadFilter {
    /// Creates a low-pass filter with the given cutoff.
    pub fn lowpass(cutoff: f32, sample_rate: u32) -> BiquadFilter {
        Self::new(FilterKind::Lowpass, cutoff, sample_rate)
    }

    /// Creates a high-pass filter with the given cutoff.
    pub fn highpass(cutoff: f32, sample_rate: u32) -> BiquadFilter {
        Self::new(FilterKind::Highpass, cutoff, sample_rate)
    }

    fn new(kind: FilterKind, cutoff: f32, sample_rate: u32) -> BiquadFilter {
        let mut filter = BiquadFilter {
            kind,
            cutoff,
            q: DEFAULT_Q,
            sample_rate: sample_rate as f32,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            dirty: true,
        };
        filter.update_coefficients();
        filter
    }

    /// Moves the cutoff frequency. Coefficients are recomputed on the next
    /// processed sample, and only if the cutoff actually changed.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff != self.cutoff {
            self.cutoff = cutoff;
            self.dirty = true;
        }
    }

    /// Processes a single sample, preserving filter state across calls.
    pub fn process(&mut self, input: f32) -> f32 {
        if self.dirty {
            self.update_coefficients();
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    fn update_coefficients(&mut self) {
        let w0 = 2.0 * PI * self.cutoff / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * self.q);

        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;
        let (b0, b1, b2) = match self.kind {
            FilterKind::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterKind::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                (b0, -(1.0 + cos_w0), b0)
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
        self.dirty = false;
    }
}
