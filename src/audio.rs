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
use std::{error::Error, fmt, sync::Arc};

use crate::cancel::CancelHandle;
use crate::config;

pub mod bus;
pub mod cpal;
pub mod mock;

/// Sends freshly triggered voices to the device's producer thread.
pub type VoiceSender = crossbeam_channel::Sender<Box<dyn bus::VoiceSource>>;

/// The device side of the voice channel.
pub type VoiceReceiver = crossbeam_channel::Receiver<Box<dyn bus::VoiceSource>>;

pub trait Device: fmt::Display + Send + Sync {
    /// Starts the continuous output stream. The device drains `voices` onto
    /// the bus and renders it until the cancel handle fires. Returns once
    /// the stream is running.
    fn start(
        &self,
        bus: Arc<bus::MixBus>,
        voices: VoiceReceiver,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the audio configuration. Device names
/// starting with "mock" resolve to a mock device that renders the bus
/// without any audio hardware.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}
