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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, Level};

use crate::synth::PerformanceMode;

use super::Event;

const PIANO_MODE: char = '1';
const SYNTH_MODE: char = '2';
const DRUMS_MODE: char = '3';
const TOGGLE_RECORD: char = 'r';
const QUIT: char = 'q';

/// A controller that plays the instrument using the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads one line of input and emits an event for each character on it.
    /// Returns false once input is finished, either because the quit key was
    /// pressed or the input itself ended.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Keys ({}=piano, {}=synth, {}=drums, {}=record, {}=quit): ",
            PIANO_MODE, SYNTH_MODE, DRUMS_MODE, TOGGLE_RECORD, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        for key in input.chars().filter(|key| !key.is_whitespace()) {
            let event = match key {
                PIANO_MODE => Event::Mode(PerformanceMode::Piano),
                SYNTH_MODE => Event::Mode(PerformanceMode::Synth),
                DRUMS_MODE => Event::Mode(PerformanceMode::Drums),
                TOGGLE_RECORD => Event::ToggleRecord,
                QUIT => Event::Quit,
                key => Event::Key(key),
            };
            let quit = event == Event::Quit;
            events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if quit {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            loop {
                if !Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {
                    info!("Keyboard driver stopped.");
                    return Ok(());
                }
            }
        })
    }
}
