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
use serde::Deserialize;

use crate::notes;

/// A YAML representation of the note table tuning.
#[derive(Deserialize, Clone, Default)]
pub struct Tuning {
    /// The frequency of the lowest note in Hz (default: 130.81, which is C3).
    base_frequency: Option<f32>,

    /// The number of full octaves in the note table (default: 2).
    octaves: Option<u8>,
}

impl Tuning {
    /// Returns the frequency of the lowest note.
    pub fn base_frequency(&self) -> f32 {
        self.base_frequency.unwrap_or(notes::DEFAULT_BASE_FREQUENCY)
    }

    /// Returns the number of full octaves in the note table.
    pub fn octaves(&self) -> u8 {
        self.octaves.unwrap_or(notes::DEFAULT_OCTAVES)
    }
}
