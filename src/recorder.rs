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

//! Recording the bus mix to disk.
//!
//! A recording session taps the output bus and accumulates every rendered
//! block in memory, the way a performance take comfortably fits. Stopping
//! the session materializes a timestamped WAV file and consumes the session,
//! so a recording can only be stopped once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

use crate::audio::bus::MixBus;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to write recording: {0}")]
    Write(#[from] hound::Error),
    #[error("recording drain thread panicked")]
    DrainThread,
}

/// An in-progress recording of the bus mix.
pub struct RecordingSession {
    bus: Arc<MixBus>,
    dir: PathBuf,
    drain: JoinHandle<Vec<f32>>,
}

impl RecordingSession {
    /// Starts recording: installs a tap on the bus and begins draining the
    /// rendered blocks on a dedicated thread.
    pub fn start(bus: Arc<MixBus>, dir: &Path) -> RecordingSession {
        let (tap_tx, tap_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        bus.install_tap(tap_tx);

        // The drain runs until the tap is removed, which closes the channel.
        let drain = thread::spawn(move || {
            let mut samples: Vec<f32> = Vec::new();
            for block in tap_rx.iter() {
                samples.extend_from_slice(&block);
            }
            samples
        });

        info!(frame = bus.current_frame(), "Recording started");
        RecordingSession {
            bus,
            dir: dir.to_path_buf(),
            drain,
        }
    }

    /// Stops recording and writes everything captured to a timestamped WAV
    /// file, returning its path. A session that captured nothing still
    /// produces a valid, empty file.
    pub fn stop(self) -> Result<PathBuf, RecorderError> {
        self.bus.remove_tap();
        let samples = self.drain.join().map_err(|_| RecorderError::DrainThread)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = self.dir.join(format!("minikit-{}.wav", millis));

        let spec = hound::WavSpec {
            channels: self.bus.num_channels(),
            sample_rate: self.bus.sample_rate(),
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec)?;
        for sample in &samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;

        let frames = samples.len() as u64 / self.bus.num_channels() as u64;
        info!(
            path = %path.display(),
            seconds = frames as f64 / self.bus.sample_rate() as f64,
            "Recording saved"
        );
        Ok(path)
    }
}
