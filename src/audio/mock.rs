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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use tracing::{info, span, Level};

use crate::audio::bus::MixBus;
use crate::audio::VoiceReceiver;
use crate::cancel::CancelHandle;

/// Frames rendered per block, mirroring the default device block size.
const BLOCK_FRAMES: usize = 512;

/// A mock device. Renders the bus at real-time pace and discards the
/// samples, so everything above the device layer behaves as it would with
/// real hardware.
#[derive(Clone)]
pub struct Device {
    name: String,
    is_playing: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            is_playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true if the device is currently rendering.
    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Relaxed)
    }
}

impl crate::audio::Device for Device {
    fn start(
        &self,
        bus: Arc<MixBus>,
        voices: VoiceReceiver,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error>> {
        self.is_playing.store(true, Ordering::Relaxed);

        let name = self.name.clone();
        let is_playing = self.is_playing.clone();
        thread::spawn(move || {
            let span = span!(Level::INFO, "mock device");
            let _enter = span.enter();
            info!(device = name, "Mock audio output started");

            let block_samples = BLOCK_FRAMES * bus.num_channels() as usize;
            let block_duration =
                Duration::from_secs_f64(BLOCK_FRAMES as f64 / bus.sample_rate() as f64);
            let mut scratch = vec![0.0f32; block_samples];

            while !cancel_handle.is_cancelled() {
                while let Ok(voice) = voices.try_recv() {
                    bus.add_voice(voice);
                }

                bus.mix_into(&mut scratch);
                spin_sleep::sleep(block_duration);
            }

            is_playing.store(false, Ordering::Relaxed);
            info!(device = name, "Mock audio output stopped");
        });

        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
