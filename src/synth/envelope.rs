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

//! Piecewise automation curves for synthesis parameters.

/// How a parameter approaches the value of an automation point from the
/// previous point.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Ramp {
    /// Hold the previous value, then jump at the point's frame.
    Set,
    /// Interpolate linearly from the previous point.
    Linear,
    /// Interpolate exponentially from the previous point. If the previous
    /// value is zero or the values differ in sign, the previous value is
    /// held and the parameter jumps at the point's frame instead.
    Exponential,
}

/// A single automation point.
#[derive(Clone, Copy, Debug)]
struct Point {
    frame: u64,
    value: f32,
    ramp: Ramp,
}

/// A parameter value automated over time, indexed by frames since the owning
/// graph started rendering.
///
/// Points are appended in ascending frame order by the builder methods. The
/// curve holds its last value indefinitely once the final point has passed,
/// so a short curve never terminates the sound it shapes.
#[derive(Clone, Debug)]
pub struct ParamCurve {
    points: Vec<Point>,
    frame: u64,
}

impl ParamCurve {
    /// Creates a curve holding `initial` at frame zero.
    pub fn new(initial: f32) -> ParamCurve {
        ParamCurve {
            points: vec![Point {
                frame: 0,
                value: initial,
                ramp: Ramp::Set,
            }],
            frame: 0,
        }
    }

    /// Sets the parameter to `value` at `frame`, holding the previous value
    /// until then.
    #[cfg(test)]
    pub fn set_value_at(self, value: f32, frame: u64) -> ParamCurve {
        self.push(value, frame, Ramp::Set)
    }

    /// Ramps linearly from the previous point to `value` at `frame`.
    pub fn linear_ramp_to(self, value: f32, frame: u64) -> ParamCurve {
        self.push(value, frame, Ramp::Linear)
    }

    /// Ramps exponentially from the previous point to `value` at `frame`.
    /// The target must be nonzero for the ramp to be well defined.
    pub fn exponential_ramp_to(self, value: f32, frame: u64) -> ParamCurve {
        self.push(value, frame, Ramp::Exponential)
    }

    fn push(mut self, value: f32, frame: u64, ramp: Ramp) -> ParamCurve {
        // Points must be appended in time order.
        debug_assert!(frame >= self.points.last().map_or(0, |p| p.frame));
        self.points.push(Point { frame, value, ramp });
        self
    }

    /// Returns the parameter value at an arbitrary frame.
    pub fn value_at(&self, frame: u64) -> f32 {
        // Find the first point still in the future; the segment between the
        // last elapsed point and that point governs the value.
        let upcoming = self.points.iter().position(|p| p.frame > frame);
        match upcoming {
            None => self.points[self.points.len() - 1].value,
            Some(0) => self.points[0].value,
            Some(i) => Self::interpolate(&self.points[i - 1], &self.points[i], frame),
        }
    }

    /// Returns the value at the current frame and advances by one frame.
    pub fn next_value(&mut self) -> f32 {
        let value = self.value_at(self.frame);
        self.frame += 1;
        value
    }

    fn interpolate(prev: &Point, next: &Point, frame: u64) -> f32 {
        if next.frame == prev.frame {
            return next.value;
        }
        let progress = (frame - prev.frame) as f32 / (next.frame - prev.frame) as f32;
        match next.ramp {
            Ramp::Set => prev.value,
            Ramp::Linear => prev.value + (next.value - prev.value) * progress,
            Ramp::Exponential => {
                if prev.value == 0.0 || (prev.value < 0.0) != (next.value < 0.0) {
                    // An exponential ramp cannot pass through or cross zero;
                    // hold the previous value and jump at the target frame.
                    prev.value
                } else {
                    prev.value * (next.value / prev.value).powf(progress)
                }
            }
        }
    }
}
