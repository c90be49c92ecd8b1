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
mod audio;
mod cancel;
mod config;
mod controller;
mod notes;
mod recorder;
mod session;
mod synth;
mod testutil;

use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::bus::MixBus;
use crate::cancel::CancelHandle;
use crate::controller::{keyboard, Controller};
use crate::notes::{NoteTable, PadTable};
use crate::session::Session;
use crate::synth::SynthEngine;

/// The instrument mixes down to stereo regardless of what the device offers.
const NUM_CHANNELS: u16 = 2;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A tiny terminal instrument."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Prints the note and drum pad key bindings.
    Keymap {
        /// The path to the instrument config.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Starts the instrument.
    Play {
        /// The path to the instrument config.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// The audio device to play through. Overrides the config.
        #[arg(short, long)]
        device: Option<String>,
        /// The performance mode to start in (piano, synth, drums). Overrides the config.
        #[arg(short, long)]
        mode: Option<String>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<config::Instrument, config::ConfigError> {
    match path {
        Some(path) => config::Instrument::deserialize(&path),
        None => Ok(config::Instrument::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Keymap { config } => {
            let instrument = load_config(config)?;
            let tuning = instrument.tuning();
            let notes = NoteTable::new(tuning.base_frequency(), tuning.octaves());
            let pads = PadTable::new();

            println!("Notes (piano and synth modes):");
            for note in notes.notes() {
                let color = if note.is_black() { "black" } else { "white" };
                match note.key() {
                    Some(key) => {
                        println!("- {:<4} {:>8.2} Hz  {}  '{}'", note, note.frequency(), color, key)
                    }
                    None => println!("- {:<4} {:>8.2} Hz  {}", note, note.frequency(), color),
                }
            }

            println!("\nPads (drums mode):");
            for pad in pads.pads() {
                println!("- '{}': {}", pad.key(), pad.voice());
            }
        }
        Commands::Play {
            config,
            device,
            mode,
        } => {
            let instrument = load_config(config)?;
            let audio_config = match device {
                Some(device) => config::Audio::new(&device),
                None => instrument.audio().clone(),
            };
            let mode = match mode {
                Some(mode) => mode.parse()?,
                None => instrument.mode(),
            };

            let device = audio::get_device(&audio_config)?;
            let sample_rate = audio_config.sample_rate();
            let bus = Arc::new(MixBus::new(
                NUM_CHANNELS,
                sample_rate,
                instrument.master_gain(),
            ));
            let (voice_tx, voice_rx) = crossbeam_channel::unbounded();
            let cancel_handle = CancelHandle::new();
            device.start(bus.clone(), voice_rx, cancel_handle.clone())?;

            let tuning = instrument.tuning();
            let session = Session::new(
                SynthEngine::new(voice_tx, sample_rate),
                NoteTable::new(tuning.base_frequency(), tuning.octaves()),
                PadTable::new(),
                bus,
                mode,
                instrument.recordings(),
            );

            let driver = Arc::new(keyboard::Driver::new());
            Controller::new(session, cancel_handle, driver)?.join().await?;
        }
    }

    Ok(())
}
