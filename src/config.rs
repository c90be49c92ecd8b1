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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use crate::synth::PerformanceMode;

mod audio;
mod tuning;

pub use audio::Audio;
pub use tuning::Tuning;

/// The default stream buffer size in frames.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

const DEFAULT_MASTER_GAIN: f32 = 0.4;
const DEFAULT_RECORDINGS_DIR: &str = ".";

/// Typed error for config load/parse failures so callers can distinguish
/// e.g. file-not-found from parse errors without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),
}

/// A YAML representation of the instrument configuration. Every field is
/// optional; an absent config file behaves the same as an empty one.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Instrument {
    /// The audio configuration.
    audio: Audio,

    /// The tuning of the note table.
    tuning: Tuning,

    /// The master gain applied to the mixed output (default: 0.4).
    master_gain: Option<f32>,

    /// The performance mode the session starts in (default: piano).
    mode: Option<PerformanceMode>,

    /// The directory recordings are saved into (default: the working directory).
    recordings: Option<PathBuf>,
}

impl Instrument {
    /// Parses the instrument configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Instrument, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Instrument>()?)
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns the note table tuning.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Returns the master gain applied to the mixed output.
    pub fn master_gain(&self) -> f32 {
        self.master_gain.unwrap_or(DEFAULT_MASTER_GAIN)
    }

    /// Returns the performance mode the session starts in.
    pub fn mode(&self) -> PerformanceMode {
        self.mode.unwrap_or(PerformanceMode::Piano)
    }

    /// Returns the directory recordings are saved into.
    pub fn recordings(&self) -> &Path {
        self.recordings
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_RECORDINGS_DIR))
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use config::{Config, File, FileFormat};

    use crate::synth::PerformanceMode;

    use super::Instrument;

    fn parse(yaml: &str) -> Instrument {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_full_config() {
        let instrument = parse(
            r#"
            audio:
              device: mock-device
              sample_rate: 48000
              buffer_size: 256
            tuning:
              base_frequency: 261.62
              octaves: 1
            master_gain: 0.5
            mode: drums
            recordings: /tmp/takes
        "#,
        );

        assert_eq!(instrument.audio().device(), "mock-device");
        assert_eq!(instrument.audio().sample_rate(), 48000);
        assert_eq!(instrument.audio().buffer_size(), 256);
        assert!((instrument.tuning().base_frequency() - 261.62).abs() < 1e-3);
        assert_eq!(instrument.tuning().octaves(), 1);
        assert!((instrument.master_gain() - 0.5).abs() < 1e-6);
        assert_eq!(instrument.mode(), PerformanceMode::Drums);
        assert_eq!(instrument.recordings(), Path::new("/tmp/takes"));
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let instrument = parse(
            r#"
            audio:
              device: mock-device
        "#,
        );

        assert_eq!(instrument.audio().device(), "mock-device");
        assert_eq!(instrument.audio().sample_rate(), 44100);
        assert_eq!(instrument.audio().buffer_size(), 512);
        assert!((instrument.tuning().base_frequency() - 130.81).abs() < 1e-3);
        assert_eq!(instrument.tuning().octaves(), 2);
        assert!((instrument.master_gain() - 0.4).abs() < 1e-6);
        assert_eq!(instrument.mode(), PerformanceMode::Piano);
        assert_eq!(instrument.recordings(), Path::new("."));
    }

    #[test]
    fn test_default_config() {
        let instrument = Instrument::default();
        assert_eq!(instrument.audio().device(), "default");
        assert_eq!(instrument.audio().sample_rate(), 44100);
        assert_eq!(instrument.mode(), PerformanceMode::Piano);
        assert_eq!(instrument.recordings(), Path::new("."));
    }

    #[test]
    fn test_malformed_config() {
        let result = Config::builder()
            .add_source(File::from_str("master_gain: loud", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<Instrument>();
        assert!(result.is_err());

        let result = Config::builder()
            .add_source(File::from_str("mode: theremin", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<Instrument>();
        assert!(result.is_err());
    }
}
