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
use std::error::Error;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, Level};

use crate::cancel::CancelHandle;
use crate::session::Session;
use crate::synth::PerformanceMode;

pub mod keyboard;

/// Controller events that will trigger behavior in the session.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// A performance key press. The session routes it to a note or a drum
    /// pad depending on the current mode.
    Key(char),

    /// Switches the performance mode. Sounds already playing are unaffected.
    Mode(PerformanceMode),

    /// Starts a recording, or stops and saves the one in progress.
    ToggleRecord,

    /// Ends the session, saving any recording still in progress.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Controls a performance session.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(
        session: Session,
        cancel_handle: CancelHandle,
        driver: Arc<dyn Driver>,
    ) -> Result<Controller, Box<dyn Error>> {
        Ok(Controller {
            handle: tokio::spawn(async move {
                Controller::trigger_events(session, cancel_handle, driver).await
            }),
        })
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Triggers session events by watching the driver and getting events from it.
    async fn trigger_events(
        mut session: Session,
        cancel_handle: CancelHandle,
        driver: Arc<dyn Driver>,
    ) {
        let span = span!(Level::INFO, "controller");
        let _enter = span.enter();

        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!(mode = %session.mode(), "Controller started.");

        loop {
            let Some(event) = events_rx.recv().await else {
                break;
            };

            info!(event = format!("{:?}", event), "Received event.");

            match event {
                Event::Key(key) => session.handle_key(key),
                Event::Mode(mode) => session.set_mode(mode),
                Event::ToggleRecord => session.toggle_record(),
                Event::Quit => break,
            }
        }

        info!("Controller closing.");
        session.shutdown();
        cancel_handle.cancel();
        if let Err(e) = join_handle.await {
            error!("Error waiting for event monitor to stop: {}", e);
        }
    }
}
