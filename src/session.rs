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

//! The live performance session.
//!
//! The session owns the current performance mode and the optional recording,
//! and routes key presses to the note table or the drum pads accordingly.
//! Changing the mode only affects future triggers; sounds already on the bus
//! keep playing to their natural end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::audio::bus::MixBus;
use crate::notes::{NoteTable, PadTable};
use crate::recorder::RecordingSession;
use crate::synth::{PerformanceMode, SynthEngine};

pub struct Session {
    engine: SynthEngine,
    notes: NoteTable,
    pads: PadTable,
    bus: Arc<MixBus>,
    mode: PerformanceMode,
    recording: Option<RecordingSession>,
    recordings_dir: PathBuf,
}

impl Session {
    /// Creates a session starting in the given mode.
    pub fn new(
        engine: SynthEngine,
        notes: NoteTable,
        pads: PadTable,
        bus: Arc<MixBus>,
        mode: PerformanceMode,
        recordings_dir: &Path,
    ) -> Session {
        Session {
            engine,
            notes,
            pads,
            bus,
            mode,
            recording: None,
            recordings_dir: recordings_dir.to_path_buf(),
        }
    }

    /// The current performance mode.
    pub fn mode(&self) -> PerformanceMode {
        self.mode
    }

    /// Whether a recording is in progress.
    #[cfg(test)]
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Routes a key press to whatever the current mode binds it to. Unbound
    /// keys are a quiet no-op.
    pub fn handle_key(&self, key: char) {
        match self.mode {
            PerformanceMode::Drums => match self.pads.for_key(key) {
                Some(voice) => self.engine.trigger_pad(voice),
                None => debug!(%key, "Key is not bound to a pad"),
            },
            mode => match self.notes.for_key(key) {
                Some(note) => self.engine.trigger_note(note.frequency(), mode),
                None => debug!(%key, "Key is not bound to a note"),
            },
        }
    }

    /// Switches the performance mode for future triggers.
    pub fn set_mode(&mut self, mode: PerformanceMode) {
        if self.mode != mode {
            info!(%mode, "Performance mode changed");
            self.mode = mode;
        }
    }

    /// Starts a recording, or stops and saves the one in progress. A failed
    /// save is logged; the performance keeps going either way.
    pub fn toggle_record(&mut self) {
        match self.recording.take() {
            Some(recording) => {
                if let Err(e) = recording.stop() {
                    error!(error = %e, "Failed to save recording");
                }
            }
            None => {
                self.recording = Some(RecordingSession::start(
                    self.bus.clone(),
                    &self.recordings_dir,
                ));
            }
        }
    }

    /// Ends the session, saving any recording still in progress.
    pub fn shutdown(&mut self) {
        if self.recording.is_some() {
            self.toggle_record();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::bus::VoiceSource;
    use crate::audio::VoiceReceiver;

    const SAMPLE_RATE: u32 = 44100;

    fn create_test_session(
        mode: PerformanceMode,
        dir: &Path,
    ) -> (Session, VoiceReceiver, Arc<MixBus>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let bus = Arc::new(MixBus::new(2, SAMPLE_RATE, 0.4));
        let session = Session::new(
            SynthEngine::new(tx, SAMPLE_RATE),
            NoteTable::default(),
            PadTable::default(),
            bus.clone(),
            mode,
            dir,
        );
        (session, rx, bus)
    }

    fn rendered_frames(voice: &mut Box<dyn VoiceSource>) -> usize {
        let mut block = [0.0f32; 512];
        let mut total = 0;
        loop {
            let written = voice.render(&mut block);
            total += written;
            if written < block.len() {
                return total;
            }
        }
    }

    #[test]
    fn test_keys_trigger_notes_in_melodic_modes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut session, rx, _) = create_test_session(PerformanceMode::Piano, dir.path());

        session.handle_key('a');
        let mut voice = rx.try_recv().expect("'a' should trigger a note");
        assert_eq!(rendered_frames(&mut voice), 66150);

        session.set_mode(PerformanceMode::Synth);
        session.handle_key('a');
        let mut voice = rx.try_recv().expect("'a' should trigger a note");
        assert_eq!(rendered_frames(&mut voice), 35280);
    }

    #[test]
    fn test_keys_trigger_pads_in_drums_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (session, rx, _) = create_test_session(PerformanceMode::Drums, dir.path());

        session.handle_key('a');
        let mut voice = rx.try_recv().expect("'a' should trigger the kick");
        assert_eq!(rendered_frames(&mut voice), 22050);

        // 'w' is a note key but not a pad key.
        session.handle_key('w');
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unbound_keys_are_no_ops() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (session, rx, _) = create_test_session(PerformanceMode::Piano, dir.path());

        session.handle_key('z');
        session.handle_key('0');
        session.handle_key(' ');
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mode_switch_leaves_live_voices_sounding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut session, rx, bus) = create_test_session(PerformanceMode::Piano, dir.path());

        session.handle_key('a');
        bus.add_voice(rx.try_recv().expect("note voice"));

        let mut out = [0.0f32; 1024];
        bus.mix_into(&mut out);
        assert_eq!(bus.active_voices(), 1);

        session.set_mode(PerformanceMode::Drums);
        bus.mix_into(&mut out);
        assert_eq!(bus.active_voices(), 1, "mode switch must not cut voices off");
        assert!(out.iter().any(|s| s.abs() > 0.0));
    }

    #[test]
    fn test_record_toggle_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut session, _rx, bus) = create_test_session(PerformanceMode::Piano, dir.path());
        assert!(!session.is_recording());

        session.toggle_record();
        assert!(session.is_recording());
        let mut out = [0.0f32; 1024];
        bus.mix_into(&mut out);

        session.toggle_record();
        assert!(!session.is_recording());

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("minikit-") && name.ends_with(".wav"));
    }

    #[test]
    fn test_shutdown_saves_recording_in_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut session, _rx, bus) = create_test_session(PerformanceMode::Piano, dir.path());

        session.toggle_record();
        let mut out = [0.0f32; 1024];
        bus.mix_into(&mut out);
        session.shutdown();

        assert!(!session.is_recording());
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);
    }
}
