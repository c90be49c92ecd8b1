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
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc, Condvar, Mutex};

/// A shared shutdown flag for the running engine. The controller flips it
/// when the performer quits; the device threads watch it and wind down on
/// their own.
#[derive(Clone, Default)]
pub struct CancelHandle {
    stopped: Arc<Mutex<bool>>,
    waiters: Arc<Condvar>,
}

impl CancelHandle {
    pub fn new() -> CancelHandle {
        CancelHandle::default()
    }

    /// Returns true once shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.stopped.lock().expect("Error getting lock")
    }

    /// Parks the calling thread until shutdown is requested or `finished`
    /// becomes true. Device threads pass the flag their stream sets when it
    /// ends on its own, so either path releases the wait.
    pub fn wait(&self, finished: Arc<AtomicBool>) {
        let stopped = self.stopped.lock().expect("Error getting lock");
        let _unused = self
            .waiters
            .wait_while(stopped, |stopped| {
                !*stopped && !finished.load(Ordering::Relaxed)
            })
            .expect("Error getting lock");
    }

    /// Wakes every waiter so it can re-check its finished flag.
    pub fn notify(&self) {
        self.waiters.notify_all();
    }

    /// Requests shutdown. Later calls are no-ops.
    pub fn cancel(&self) {
        let mut stopped = self.stopped.lock().expect("Error getting lock");
        if !*stopped {
            *stopped = true;
            self.waiters.notify_all();
        }
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;

    // Models the output stream thread, which parks in wait until the
    // controller cancels the engine.
    #[test]
    fn test_quit_wakes_a_parked_stream_thread() {
        let cancel_handle = CancelHandle::new();
        let woke = Arc::new(AtomicBool::new(false));

        let stream = {
            let cancel_handle = cancel_handle.clone();
            let woke = woke.clone();
            thread::spawn(move || {
                cancel_handle.wait(Arc::new(AtomicBool::new(false)));
                woke.store(true, Ordering::Relaxed);
            })
        };

        assert!(!woke.load(Ordering::Relaxed));
        cancel_handle.cancel();
        stream.join().expect("stream thread panicked");
        assert!(woke.load(Ordering::Relaxed));
        assert!(cancel_handle.is_cancelled());
    }

    // Models a stream ending on its own: the producer sets the finished
    // flag and notifies, which releases the wait without a shutdown.
    #[test]
    fn test_finished_stream_releases_the_wait() {
        let cancel_handle = CancelHandle::new();
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let cancel_handle = cancel_handle.clone();
            let finished = finished.clone();
            thread::spawn(move || cancel_handle.wait(finished))
        };

        finished.store(true, Ordering::Relaxed);
        cancel_handle.notify();
        stream.join().expect("stream thread panicked");
        assert!(!cancel_handle.is_cancelled());
    }

    #[test]
    fn test_wait_returns_at_once_after_shutdown() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.is_cancelled());
        cancel_handle.cancel();
        cancel_handle.wait(Arc::new(AtomicBool::new(false)));
        assert!(cancel_handle.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let cancel_handle = CancelHandle::new();
        cancel_handle.cancel();
        cancel_handle.cancel();
        assert!(cancel_handle.is_cancelled());
    }
}
