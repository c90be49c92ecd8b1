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

//! The playable note and drum pad tables.
//!
//! Notes are generated from a twelve-tone equal-tempered scale. The default
//! table starts at C3 (130.81Hz) and spans two octaves plus a final C, 25
//! notes in all. The first 20 notes are bound to keyboard characters laid
//! out roughly like a piano; the topmost notes are playable only in theory,
//! which matches the instrument this is modeled on.

use std::fmt;

use crate::synth::PercussionVoice;

/// C3. The lowest note of the default table.
pub const DEFAULT_BASE_FREQUENCY: f32 = 130.81;

/// The default number of full octaves in the table.
pub const DEFAULT_OCTAVES: u8 = 2;

/// The octave label of the first note.
const START_OCTAVE: u8 = 3;

/// Pitch names within one octave, starting at C.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Keyboard characters bound to notes, in table order. White keys sit on the
/// home row, sharps on the row above.
const KEY_BINDINGS: &str = "awsedftgyhujkolp;[\\]";

/// Drum pad characters, bound in order to a kick/snare/hihat cycle.
const PAD_KEYS: &str = "asdfghjk";

/// A single playable note.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    name: &'static str,
    octave: u8,
    frequency: f32,
    key: Option<char>,
    black: bool,
}

impl Note {
    /// The pitch name without the octave, e.g. "C#".
    #[cfg(test)]
    pub fn name(&self) -> &str {
        self.name
    }

    /// The octave label.
    #[cfg(test)]
    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// The frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// The keyboard character bound to this note, if any.
    pub fn key(&self) -> Option<char> {
        self.key
    }

    /// Whether this note renders as a black key.
    pub fn is_black(&self) -> bool {
        self.black
    }
}

impl fmt::Display for Note {
    // Goes through f.pad so width specs line the key listing up in columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}{}", self.name, self.octave))
    }
}

/// The full table of playable notes.
#[derive(Clone, Debug)]
pub struct NoteTable {
    notes: Vec<Note>,
}

impl NoteTable {
    /// Builds a table of `octaves` full octaves plus a final octave-topping
    /// C, tuned in equal temperament from `base_frequency`.
    pub fn new(base_frequency: f32, octaves: u8) -> NoteTable {
        let count = octaves as usize * 12 + 1;
        let mut key_bindings = KEY_BINDINGS.chars();
        let notes = (0..count)
            .map(|i| {
                let name = NOTE_NAMES[i % 12];
                Note {
                    name,
                    octave: START_OCTAVE + (i / 12) as u8,
                    frequency: base_frequency * 2f32.powf(i as f32 / 12.0),
                    key: key_bindings.next(),
                    black: name.contains('#'),
                }
            })
            .collect();
        NoteTable { notes }
    }

    /// Finds the note bound to a keyboard character.
    pub fn for_key(&self, key: char) -> Option<&Note> {
        self.notes.iter().find(|note| note.key == Some(key))
    }

    /// All notes in ascending pitch order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

impl Default for NoteTable {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_FREQUENCY, DEFAULT_OCTAVES)
    }
}

/// A single drum pad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pad {
    key: char,
    voice: PercussionVoice,
}

impl Pad {
    /// The keyboard character bound to this pad.
    pub fn key(&self) -> char {
        self.key
    }

    /// The percussion voice this pad triggers.
    pub fn voice(&self) -> PercussionVoice {
        self.voice
    }
}

/// The drum pad layout: eight pads cycling through kick, snare, and hi-hat.
#[derive(Clone, Debug)]
pub struct PadTable {
    pads: Vec<Pad>,
}

impl PadTable {
    pub fn new() -> PadTable {
        let cycle = [
            PercussionVoice::Kick,
            PercussionVoice::Snare,
            PercussionVoice::HiHat,
        ];
        let pads = PAD_KEYS
            .chars()
            .zip(cycle.into_iter().cycle())
            .map(|(key, voice)| Pad { key, voice })
            .collect();
        PadTable { pads }
    }

    /// Finds the voice bound to a keyboard character.
    pub fn for_key(&self, key: char) -> Option<PercussionVoice> {
        self.pads
            .iter()
            .find(|pad| pad.key == key)
            .map(|pad| pad.voice)
    }

    /// All pads in layout order.
    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }
}

impl Default for PadTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_25_notes() {
        assert_eq!(NoteTable::default().notes().len(), 25);
    }

    #[test]
    fn test_frequencies_follow_equal_temperament() {
        let table = NoteTable::default();
        for (i, note) in table.notes().iter().enumerate() {
            let expected = DEFAULT_BASE_FREQUENCY * 2f32.powf(i as f32 / 12.0);
            assert!(
                (note.frequency() - expected).abs() < 1e-3,
                "note {i} should be {expected}Hz, got {}",
                note.frequency()
            );
        }

        // Spot checks against well-known pitches.
        let a3 = &table.notes()[9];
        assert_eq!(a3.name(), "A");
        assert!((a3.frequency() - 220.0).abs() < 0.01);
        let a4 = &table.notes()[21];
        assert!((a4.frequency() - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_frequencies_strictly_increase() {
        let table = NoteTable::default();
        for pair in table.notes().windows(2) {
            assert!(
                pair[1].frequency() > pair[0].frequency(),
                "{} should be higher than {}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_final_note_tops_the_octaves() {
        let table = NoteTable::default();
        let last = table.notes().last().unwrap();
        assert_eq!(last.name(), "C");
        assert_eq!(last.octave(), 5);
        assert!(!last.is_black());
        assert_eq!(last.key(), None);
        assert!((last.frequency() - DEFAULT_BASE_FREQUENCY * 4.0).abs() < 1e-2);
    }

    #[test]
    fn test_key_bindings_cover_first_20_notes() {
        let table = NoteTable::default();
        let bound: String = table.notes().iter().filter_map(|n| n.key()).collect();
        assert_eq!(bound, KEY_BINDINGS);
        for note in &table.notes()[20..] {
            assert_eq!(note.key(), None, "{note} should be unbound");
        }
    }

    #[test]
    fn test_note_display_pads_to_fixed_width() {
        let table = NoteTable::default();
        assert_eq!(format!("{}", table.notes()[0]), "C3");
        assert_eq!(format!("{:<4}", table.notes()[0]), "C3  ");
        assert_eq!(format!("{:<4}", table.notes()[1]), "C#3 ");
        assert_eq!(format!("{:>4}", table.notes()[24]), "  C5");
    }

    #[test]
    fn test_sharps_are_black() {
        let table = NoteTable::default();
        let black_count = table.notes().iter().filter(|n| n.is_black()).count();
        assert_eq!(black_count, 10);
        assert!(!table.notes()[0].is_black()); // C
        assert!(table.notes()[1].is_black()); // C#
    }

    #[test]
    fn test_for_key_lookup() {
        let table = NoteTable::default();
        let first = table.for_key('a').expect("'a' should be bound");
        assert_eq!(first.name(), "C");
        assert_eq!(first.octave(), 3);

        // 'w' is the first sharp.
        let sharp = table.for_key('w').expect("'w' should be bound");
        assert_eq!(sharp.name(), "C#");
        assert!(table.for_key('z').is_none());
    }

    #[test]
    fn test_pad_layout_cycles_voices() {
        let pads = PadTable::new();
        assert_eq!(pads.pads().len(), 8);
        let voices: Vec<PercussionVoice> = pads.pads().iter().map(|p| p.voice()).collect();
        assert_eq!(
            voices,
            vec![
                PercussionVoice::Kick,
                PercussionVoice::Snare,
                PercussionVoice::HiHat,
                PercussionVoice::Kick,
                PercussionVoice::Snare,
                PercussionVoice::HiHat,
                PercussionVoice::Kick,
                PercussionVoice::Snare,
            ]
        );
    }

    #[test]
    fn test_pad_lookup() {
        let pads = PadTable::new();
        assert_eq!(pads.for_key('a'), Some(PercussionVoice::Kick));
        assert_eq!(pads.for_key('d'), Some(PercussionVoice::HiHat));
        assert_eq!(pads.for_key('k'), Some(PercussionVoice::Snare));
        assert_eq!(pads.for_key('z'), None);
    }
}
