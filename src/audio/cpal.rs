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
    cell::UnsafeCell,
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::audio::bus::MixBus;
use crate::audio::{Device as AudioDevice, VoiceReceiver};
use crate::cancel::CancelHandle;
use crate::config;

/// Lock-free single-producer single-consumer ring of samples between the
/// mixing thread and the stream callback.
struct SampleRing {
    /// Cells are only ever touched by the single producer (between the
    /// write position and the read position) or the single consumer (the
    /// other way around); the atomic positions order all access.
    cells: Box<[UnsafeCell<f32>]>,
    /// Power of two, so positions wrap with a mask.
    capacity: usize,
    read_pos: AtomicUsize,
    write_pos: AtomicUsize,
}

unsafe impl Send for SampleRing {}
unsafe impl Sync for SampleRing {}

impl SampleRing {
    fn new(min_capacity: usize) -> SampleRing {
        let capacity = min_capacity.next_power_of_two();
        SampleRing {
            cells: (0..capacity).map(|_| UnsafeCell::new(0.0)).collect(),
            capacity,
            read_pos: AtomicUsize::new(0),
            write_pos: AtomicUsize::new(0),
        }
    }

    /// Samples available to read.
    #[inline]
    fn available(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        if write >= read {
            write - read
        } else {
            self.capacity - read + write
        }
    }

    /// Space available to write. One slot is always left open so a full
    /// ring is distinguishable from an empty one.
    #[inline]
    fn space(&self) -> usize {
        self.capacity - self.available() - 1
    }

    /// Writes as many samples as fit, returning how many were written.
    fn write(&self, samples: &[f32]) -> usize {
        let to_write = self.space().min(samples.len());
        let write = self.write_pos.load(Ordering::Acquire);
        let mask = self.capacity - 1;

        for (i, &sample) in samples[..to_write].iter().enumerate() {
            unsafe { *self.cells[(write + i) & mask].get() = sample };
        }

        self.write_pos
            .store((write + to_write) & mask, Ordering::Release);
        to_write
    }

    /// Reads as many samples as are available, returning how many were read.
    fn read(&self, out: &mut [f32]) -> usize {
        let to_read = self.available().min(out.len());
        let read = self.read_pos.load(Ordering::Acquire);
        let mask = self.capacity - 1;

        for (i, slot) in out[..to_read].iter_mut().enumerate() {
            *slot = unsafe { *self.cells[(read + i) & mask].get() };
        }

        self.read_pos
            .store((read + to_read) & mask, Ordering::Release);
        to_read
    }
}

/// A small wrapper around a cpal::Device. Runs the continuous output stream
/// the bus renders into.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// Frames mixed per block on the producer thread.
    buffer_size: usize,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// f32 streams read straight out of the ring.
fn create_f32_callback(
    ring: Arc<SampleRing>,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let read = ring.read(data);
        // Zero-fill any shortfall.
        data[read..].fill(0.0);
    }
}

/// Integer streams read into a scratch buffer and convert.
fn create_converting_callback<T: cpal::SizedSample + cpal::FromSample<f32>>(
    ring: Arc<SampleRing>,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        let mut scratch = vec![0.0f32; data.len()];
        let read = ring.read(&mut scratch);
        scratch[read..].fill(0.0);

        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal output devices.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Some(max_channels) = Self::max_output_channels(&device) else {
                    continue;
                };

                devices.push(Device {
                    name: device.name()?,
                    max_channels,
                    host_id,
                    device,
                    buffer_size: config::DEFAULT_BUFFER_SIZE,
                })
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// The widest output layout the device advertises, or None for devices
    /// with no output at all.
    fn max_output_channels(device: &cpal::Device) -> Option<u16> {
        let mut max_channels = 0;
        for output_config in device.supported_output_configs().ok()? {
            max_channels = max_channels.max(output_config.channels());
        }
        (max_channels > 0).then_some(max_channels)
    }

    /// Gets the cpal device described by the audio configuration. The name
    /// "default" resolves to the default host's default output device.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        if name == "default" {
            // Suppress noisy output here.
            let _shh_stdout = shh::stdout()?;
            let _shh_stderr = shh::stderr()?;

            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("host has no default output device")?;
            let max_channels = Self::max_output_channels(&device)
                .ok_or("default output device has no output channels")?;
            return Ok(Device {
                name: device.name()?,
                max_channels,
                host_id: host.id(),
                device,
                buffer_size: config.buffer_size(),
            });
        }

        match Device::list_cpal_devices()?
            .into_iter()
            .find(|device| device.name.trim() == name)
        {
            Some(mut device) => {
                device.buffer_size = config.buffer_size();
                Ok(device)
            }
            None => Err(format!("no device found with name {}", name).into()),
        }
    }
}

impl AudioDevice for Device {
    fn start(
        &self,
        bus: Arc<MixBus>,
        voices: VoiceReceiver,
        cancel_handle: CancelHandle,
    ) -> Result<(), Box<dyn Error>> {
        let num_channels = bus.num_channels();
        let sample_rate = bus.sample_rate();

        if self.max_channels < num_channels {
            return Err(format!(
                "{} channels requested, audio device {} only has {}",
                num_channels, self.name, self.max_channels
            )
            .into());
        }

        let sample_format = {
            // Suppress noisy output here.
            let _shh_stdout = shh::stdout()?;
            let _shh_stderr = shh::stderr()?;
            self.device.default_output_config()?.sample_format()
        };

        // Roughly 100ms of buffered audio between the bus and the stream.
        let ring_samples = (sample_rate as usize * num_channels as usize) / 10;
        let ring = Arc::new(SampleRing::new(ring_samples.max(1024)));
        let finished = Arc::new(AtomicBool::new(false));

        // Producer thread: drain new voices onto the bus and keep the ring
        // topped up one block at a time.
        {
            let bus = bus.clone();
            let ring = ring.clone();
            let cancel_handle = cancel_handle.clone();
            let finished = finished.clone();
            let block_samples = self.buffer_size * num_channels as usize;
            thread::spawn(move || {
                let mut scratch = vec![0.0f32; block_samples];
                while !cancel_handle.is_cancelled() {
                    while let Ok(voice) = voices.try_recv() {
                        bus.add_voice(voice);
                    }

                    if ring.space() >= block_samples {
                        bus.mix_into(&mut scratch);
                        ring.write(&scratch);
                    } else {
                        // Ring full, yield briefly.
                        thread::sleep(Duration::from_micros(500));
                    }
                }
                finished.store(true, Ordering::Relaxed);
                cancel_handle.notify();
            });
        }

        // Output thread: owns the cpal stream for its whole life and winds
        // down when the engine shuts down or the producer gives up.
        let device = self.device.clone();
        let device_name = self.name.clone();
        thread::spawn(move || {
            let stream_config = cpal::StreamConfig {
                channels: num_channels,
                sample_rate,
                buffer_size: cpal::BufferSize::Default,
            };

            let stream_result = match sample_format {
                cpal::SampleFormat::F32 => device.build_output_stream(
                    &stream_config,
                    create_f32_callback(ring),
                    |err| error!("cpal output stream error: {}", err),
                    None,
                ),
                cpal::SampleFormat::I16 => device.build_output_stream(
                    &stream_config,
                    create_converting_callback::<i16>(ring),
                    |err| error!("cpal output stream error: {}", err),
                    None,
                ),
                cpal::SampleFormat::I32 => device.build_output_stream(
                    &stream_config,
                    create_converting_callback::<i32>(ring),
                    |err| error!("cpal output stream error: {}", err),
                    None,
                ),
                other => {
                    error!(format = ?other, "Unsupported device sample format");
                    return;
                }
            };

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to create cpal stream: {}", e);
                    return;
                }
            };
            if let Err(e) = stream.play() {
                error!("Failed to start cpal stream: {}", e);
                return;
            }

            info!(device = device_name, "Audio output stream started");
            cancel_handle.wait(finished);
            info!(device = device_name, "Audio output stream stopped");
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_roundtrip() {
        let ring = SampleRing::new(16);
        assert_eq!(ring.available(), 0);

        let written = ring.write(&[0.1, 0.2, 0.3]);
        assert_eq!(written, 3);
        assert_eq!(ring.available(), 3);

        let mut out = [0.0f32; 3];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(out, [0.1, 0.2, 0.3]);
        assert_eq!(ring.available(), 0);
    }

    #[test]
    fn test_ring_wraps_around() {
        let ring = SampleRing::new(8);
        let mut out = [0.0f32; 8];

        // Push the positions close to the end of the ring, then wrap.
        for round in 0..5 {
            let base = round as f32;
            assert_eq!(ring.write(&[base, base + 0.5]), 2);
            assert_eq!(ring.read(&mut out[..2]), 2);
            assert_eq!(out[..2], [base, base + 0.5]);
        }
    }

    #[test]
    fn test_ring_rejects_overflow() {
        let ring = SampleRing::new(8);
        // Capacity 8 keeps one slot open, so at most 7 samples fit.
        let written = ring.write(&[1.0; 12]);
        assert_eq!(written, 7);
        assert_eq!(ring.space(), 0);

        let mut out = [0.0f32; 12];
        assert_eq!(ring.read(&mut out), 7);
        assert_eq!(out[..7], [1.0; 7]);
    }

    #[test]
    fn test_ring_empty_read() {
        let ring = SampleRing::new(8);
        let mut out = [1.0f32; 4];
        assert_eq!(ring.read(&mut out), 0);
        assert_eq!(out, [1.0; 4]); // untouched
    }
}
